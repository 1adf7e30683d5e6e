use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Output directory does not exist: {}", .0.display())]
    MissingDist(PathBuf),

    #[error("Cannot write file at {} - it's a directory", .0.display())]
    OutputIsDirectory(PathBuf),

    #[error("Navigation to {url} did not settle within {}s", .after.as_secs())]
    Timeout { url: String, after: Duration },

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Render error for {url}: {message}")]
    Render { url: String, message: String },
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
