use clap::ValueEnum;

use crate::config::ExtractionConfig;
use crate::error::{ParseOutcome, Result};
use crate::markup::parse_markup;
use crate::models::Student;
use crate::payload::parse_payload;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InputFormat {
    Auto,
    Markup,
    Json,
}

impl InputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            InputFormat::Auto => "auto",
            InputFormat::Markup => "markup",
            InputFormat::Json => "json",
        }
    }
}

/// JSON exports open with an object or array; everything else is markup.
pub fn detect_format(input: &str) -> InputFormat {
    match input.trim_start().chars().next() {
        Some('{') | Some('[') => InputFormat::Json,
        _ => InputFormat::Markup,
    }
}

pub fn resolve_format(input: &str, format: InputFormat) -> InputFormat {
    match format {
        InputFormat::Auto => detect_format(input),
        other => other,
    }
}

pub fn parse_input(
    input: &str,
    format: InputFormat,
    config: &ExtractionConfig,
) -> Result<Vec<Student>> {
    match resolve_format(input, format) {
        InputFormat::Json => parse_payload(input),
        _ => parse_markup(input, config),
    }
}

pub fn parse_outcome(input: &str, format: InputFormat, config: &ExtractionConfig) -> ParseOutcome {
    ParseOutcome::from(parse_input(input, format, config))
}
