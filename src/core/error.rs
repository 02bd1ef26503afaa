//! Defines the custom error types for the email-triage engine.

use std::io;
use thiserror::Error;
use url::ParseError as UrlParseError;

/// The primary error type for the validation engine.
#[derive(Error, Debug)]
pub enum AppError {
    /// Error occurring during configuration loading or validation.
    #[error("Configuration Error: {0}")]
    Config(String),

    /// Error initializing necessary components (e.g., the HTTP client).
    #[error("Initialization Error: {0}")]
    Initialization(String),

    /// Error related to file input/output operations.
    #[error("IO Error: {0}")]
    Io(#[from] io::Error),

    /// Error during JSON serialization or deserialization.
    #[error("JSON Error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error parsing a URL.
    #[error("URL Parsing Error: {0}")]
    UrlParse(#[from] UrlParseError),

    /// Error making HTTP requests via reqwest.
    #[error("HTTP Request Error: {0}")]
    Request(#[from] reqwest::Error),

    /// The verification endpoint answered with a non-success status.
    #[error("Verification endpoint rejected the request ({status}): {message}")]
    Endpoint {
        /// HTTP status code returned by the endpoint.
        status: u16,
        /// Message extracted from the response body, or the status reason.
        message: String,
    },

    /// The verification endpoint answered, but the body could not be understood.
    #[error("Malformed Endpoint Response: {0}")]
    MalformedResponse(String),

    /// Error writing CSV output.
    #[error("CSV Error: {0}")]
    Csv(#[from] csv::Error),

    /// Error reading or writing the result cache.
    #[error("Cache Error: {0}")]
    Cache(String),

    /// Error related to concurrency or task execution.
    #[error("Task Execution Error: {0}")]
    Task(String),

    /// An underlying error that doesn't fit other categories, using anyhow.
    #[error("Generic Error: {0}")]
    Generic(#[from] anyhow::Error),
}

impl From<csv::IntoInnerError<csv::Writer<Vec<u8>>>> for AppError {
    fn from(err: csv::IntoInnerError<csv::Writer<Vec<u8>>>) -> Self {
        AppError::Io(err.into_error())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
