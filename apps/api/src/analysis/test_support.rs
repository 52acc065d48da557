//! Fixture builders shared by analysis tests. DOCX files are assembled in memory.

use std::io::{Cursor, Write};

use zip::write::FileOptions;

use crate::analysis::extractor::text_from_plain;
use crate::analysis::models::{ContentType, ExtractedText, SectionKind};
use crate::roles::{RoleKeyword, RoleProfile};

pub enum Para<'a> {
    Plain(&'a str),
    Styled(&'a str, &'a str),
    Numbered(&'a str),
}

impl<'a> Para<'a> {
    pub fn plain(text: &'a str) -> Self {
        Para::Plain(text)
    }

    pub fn styled(style: &'a str, text: &'a str) -> Self {
        Para::Styled(style, text)
    }

    pub fn numbered(text: &'a str) -> Self {
        Para::Numbered(text)
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub fn document_xml(paragraphs: &[Para<'_>]) -> String {
    let mut body = String::new();
    for para in paragraphs {
        let (props, text) = match para {
            Para::Plain(text) => (String::new(), *text),
            Para::Styled(style, text) => (
                format!(r#"<w:pPr><w:pStyle w:val="{style}"/></w:pPr>"#),
                *text,
            ),
            Para::Numbered(text) => (
                r#"<w:pPr><w:numPr><w:ilvl w:val="0"/><w:numId w:val="1"/></w:numPr></w:pPr>"#
                    .to_string(),
                *text,
            ),
        };
        body.push_str(&format!(
            r#"<w:p>{props}<w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
            escape(text)
        ));
    }
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
    )
}

pub fn docx_bytes(paragraphs: &[Para<'_>]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default();
    writer
        .start_file("[Content_Types].xml", options)
        .unwrap();
    writer
        .write_all(br#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"/>"#)
        .unwrap();
    writer.start_file("word/document.xml", options).unwrap();
    writer
        .write_all(document_xml(paragraphs).as_bytes())
        .unwrap();
    writer.finish().unwrap().into_inner()
}

/// A clean DOCX resume with contact line, Summary, Experience, Education and Skills.
pub fn clean_resume_docx() -> Vec<u8> {
    docx_bytes(&[
        Para::styled("Title", "Jane Doe"),
        Para::plain("jane.doe@example.com | +1 (555) 123-4567 | Austin, TX"),
        Para::styled("Heading1", "Summary"),
        Para::plain("Backend engineer with 6 years building data platforms in Python and SQL."),
        Para::styled("Heading1", "Experience"),
        Para::plain("Senior Engineer, Acme Corp | Jan 2020 - Present"),
        Para::numbered("Led a team of 5 engineers delivering a streaming ingestion service"),
        Para::numbered("Cut query latency by 40% by redesigning SQL indexes"),
        Para::plain("Software Engineer, Initech | Jun 2017 - Dec 2019"),
        Para::numbered("Built Python ETL jobs processing 2M records per day"),
        Para::styled("Heading1", "Education"),
        Para::plain("B.S. Computer Science, State University, 2013 - 2017"),
        Para::styled("Heading1", "Skills"),
        Para::plain("Python, SQL, PostgreSQL, Airflow, Docker, Leadership"),
    ])
}

pub fn cover_letter_docx() -> Vec<u8> {
    docx_bytes(&[
        Para::plain("Jane Doe"),
        Para::plain("jane.doe@example.com"),
        Para::plain("Dear Hiring Manager,"),
        Para::plain("I am writing to apply for the Backend Developer position at Acme Corp, which I saw advertised on your careers page."),
        Para::plain("Over the past six years I have built data platforms in Python and SQL, and I would welcome the chance to bring that experience to your team."),
        Para::plain("Thank you for considering my application; I look forward to hearing from you soon."),
        Para::plain("Sincerely,"),
        Para::plain("Jane Doe"),
    ])
}

/// A single-page PDF with a valid xref table whose page draws `text` with font `/F1`.
/// With `define_font = false` the page resources omit `/F1`.
pub fn single_page_pdf(text: &str, define_font: bool) -> Vec<u8> {
    let content = format!("BT /F1 12 Tf 72 720 Td ({text}) Tj ET");
    let resources = if define_font {
        "<< /Font << /F1 5 0 R >> >>"
    } else {
        "<< >>"
    };
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Resources {resources} /Contents 4 0 R >>"
        ),
        format!(
            "<< /Length {} >>\nstream\n{content}\nendstream",
            content.len()
        ),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
    ];

    let mut pdf = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, object) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.extend_from_slice(format!("{} 0 obj\n{object}\nendobj\n", i + 1).as_bytes());
    }
    let xref = pdf.len();
    pdf.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes());
    for offset in offsets {
        pdf.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }
    pdf.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref}\n%%EOF\n",
            objects.len() + 1
        )
        .as_bytes(),
    );
    pdf
}

pub fn plain_text(text: &str) -> ExtractedText {
    text_from_plain(text, ContentType::Pdf)
}

pub fn keyword(keyword: &str, weight: f64, synonyms: &[&str]) -> RoleKeyword {
    RoleKeyword {
        keyword: keyword.to_string(),
        weight,
        synonyms: synonyms.iter().map(|s| s.to_string()).collect(),
    }
}

pub fn profile(keywords: Vec<RoleKeyword>) -> RoleProfile {
    RoleProfile {
        name: "Backend Developer".to_string(),
        category: "Software Development and Engineering".to_string(),
        description: "Builds server-side systems".to_string(),
        keywords,
        required_sections: vec![
            SectionKind::Contact,
            SectionKind::Experience,
            SectionKind::Education,
            SectionKind::Skills,
        ],
        seniority: None,
    }
}
