use serde::Serialize;
use thiserror::Error;

use crate::models::Student;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("no content was supplied")]
    EmptyInput,

    #[error("document is malformed: {0}")]
    MalformedDocument(String),

    #[error("no students were found in the document")]
    NoStudentsFound,
}

impl ParseError {
    /// Stable name used in the output envelope.
    pub fn kind(&self) -> &'static str {
        match self {
            ParseError::EmptyInput => "EmptyInputError",
            ParseError::MalformedDocument(_) => "MalformedDocumentError",
            ParseError::NoStudentsFound => "NoStudentsFoundError",
        }
    }
}

pub type Result<T> = std::result::Result<T, ParseError>;

/// Envelope handed to consumers: either the students or a typed failure.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ParseOutcome {
    Success {
        success: bool,
        students: Vec<Student>,
    },
    Failure {
        success: bool,
        error: &'static str,
        message: String,
    },
}

impl ParseOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ParseOutcome::Success { .. })
    }
}

impl From<Result<Vec<Student>>> for ParseOutcome {
    fn from(result: Result<Vec<Student>>) -> Self {
        match result {
            Ok(students) => ParseOutcome::Success {
                success: true,
                students,
            },
            Err(err) => ParseOutcome::Failure {
                success: false,
                error: err.kind(),
                message: err.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_envelope_carries_kind_and_message() {
        let outcome = ParseOutcome::from(Err(ParseError::EmptyInput));
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "EmptyInputError");
        assert_eq!(json["message"], "no content was supplied");
    }

    #[test]
    fn success_envelope_lists_students() {
        let outcome = ParseOutcome::from(Ok(vec![Student::new("Avery Lee", None)]));
        assert!(outcome.is_success());
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["students"][0]["name"], "Avery Lee");
        assert!(json["students"][0]["status"].is_null());
    }
}
