use thiserror::Error;

#[derive(Error, Debug)]
pub enum CaptionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Correction service error: {0}")]
    Correction(String),

    #[error("Script conversion error: {0}")]
    Conversion(String),

    #[error("File not found: {0}")]
    FileNotFound(String),
}

impl CaptionError {
    pub fn parse<S: Into<String>>(line: usize, message: S) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CaptionError>;
