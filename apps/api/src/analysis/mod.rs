// Resume analysis engine.
// Pipeline: extractor → classifier → sections → keywords → scoring, wrapped by an
// `Analyzer` backend (heuristic or LLM) selected at startup.

pub mod analyzer;
pub mod classifier;
pub mod config;
pub mod extractor;
pub mod handlers;
pub mod keywords;
pub mod models;
pub mod patterns;
pub mod prompts;
pub mod scoring;
pub mod sections;

#[cfg(test)]
pub(crate) mod test_support;
