//! Compiled text patterns shared by the classifier and the section detector.

use once_cell::sync::Lazy;
use regex::Regex;

pub static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap());

/// International or North American phone numbers with at least 10 digits.
pub static PHONE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:\+\d{1,3}[\s.-]?)?(?:\(\d{2,4}\)|\d{2,4})[\s.-]?\d{3,4}[\s.-]?\d{3,4}")
        .unwrap()
});

const MONTH: &str = r"(?:jan|feb|mar|apr|may|jun|jul|aug|sep|sept|oct|nov|dec)[a-z]*\.?";

/// `Jan 2020 - Present`, `03/2019 – 11/2021`, `2018 to 2020`.
pub static DATE_RANGE: Lazy<Regex> = Lazy::new(|| {
    let point = format!(r"(?:{MONTH}\s+\d{{4}}|\d{{1,2}}/\d{{4}}|\d{{4}})");
    Regex::new(&format!(
        r"(?i)\b(?P<start>{point})\s*(?:-|–|—|to)\s*(?P<end>{point}|present|current|now|ongoing)\b"
    ))
    .unwrap()
});

pub static NAMED_MONTH_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)\b(?P<month>{MONTH})\s+(?P<year>\d{{4}})\b")).unwrap()
});

pub static NUMERIC_MONTH_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?P<month>\d{1,2})/(?P<year>\d{4})\b").unwrap());

pub static YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(?:19|20)\d{2}\b").unwrap());

/// Course codes as printed on transcripts, e.g. `CS 101`, `MATH-2410`.
pub static COURSE_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Z]{2,4}[\s-]?\d{3,4}[A-Z]?\b").unwrap());

pub static SALUTATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:dear\b|to whom it may concern|hello hiring|greetings\b)").unwrap()
});

pub static CLOSING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*(?:sincerely|best regards|kind regards|warm regards|regards|respectfully|yours (?:truly|faithfully|sincerely)|thank you for your (?:time|consideration))\b",
    )
    .unwrap()
});

pub fn has_contact_pattern(text: &str) -> bool {
    EMAIL.is_match(text) || PHONE.is_match(text)
}
