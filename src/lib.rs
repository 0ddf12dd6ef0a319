pub mod checkins;
pub mod config;
pub mod dates;
pub mod db;
pub mod dom;
pub mod error;
pub mod export;
pub mod ingest;
pub mod markup;
pub mod models;
pub mod payload;
pub mod report;
pub mod stats;
pub mod status;

pub use config::ExtractionConfig;
pub use error::{ParseError, ParseOutcome};
pub use ingest::{parse_input, parse_outcome, InputFormat};
pub use models::Student;
