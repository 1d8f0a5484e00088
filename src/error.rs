use std::path::PathBuf;
use thiserror::Error;

/// Eingabe hatte nicht genau zwei Felder
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Expected 2 comma separated fields (Name, ID Number), got {fields}")]
pub struct FormatError {
    pub fields: usize,
}

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Template file not found: {}", .0.display())]
    TemplateNotFound(PathBuf),

    #[error("Template has no pages: {}", .0.display())]
    EmptyTemplate(PathBuf),

    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum CertbotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    Format(#[from] FormatError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Telegram API error {code}: {description}")]
    Telegram { code: i64, description: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, CertbotError>;
