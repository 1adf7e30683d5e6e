use crate::error::{Error, Result};
use crate::types::Route;
use std::fs;
use std::path::{Path, PathBuf};

/// Write a route's artifact, replacing any previous file.
///
/// Missing parent directories are created. A directory sitting at the target
/// path is reported as [`Error::OutputIsDirectory`] rather than removed.
pub fn write_artifact(path: &Path, contents: &str) -> Result<()> {
    if path.is_dir() {
        return Err(Error::OutputIsDirectory(path.to_path_buf()));
    }

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    fs::write(path, contents)?;
    Ok(())
}

/// A route that could not be written
#[derive(Debug, Clone)]
pub struct RouteFailure {
    pub route: String,
    pub message: String,
}

/// Outcome of one batch over the route list
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub written: Vec<PathBuf>,
    pub failed: Vec<RouteFailure>,
}

impl BatchReport {
    pub fn record_written(&mut self, route: &Route, path: PathBuf) {
        tracing::info!(route = %route, "Created static file: {}", path.display());
        self.written.push(path);
    }

    pub fn record_failure(&mut self, route: &Route, error: &Error) {
        tracing::error!(route = %route, "Error processing {}: {}", route, error);
        self.failed.push(RouteFailure {
            route: route.path().to_string(),
            message: error.to_string(),
        });
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_artifact_creates_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("en").join("index.html");

        write_artifact(&path, "<html></html>").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "<html></html>");
    }

    #[test]
    fn test_write_artifact_overwrites() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.html");
        fs::write(&path, "old content that is longer").unwrap();

        write_artifact(&path, "new").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
    }

    #[test]
    fn test_write_artifact_rejects_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("en").join("index.html");
        fs::create_dir_all(&path).unwrap();

        let result = write_artifact(&path, "x");
        assert!(matches!(result, Err(Error::OutputIsDirectory(_))));
        assert!(path.is_dir());
    }

    #[test]
    fn test_batch_report_records() {
        let locales = vec!["en".to_string()];
        let root = Route::new("/", "fr", &locales);
        let en = Route::new("/en", "fr", &locales);

        let mut report = BatchReport::default();
        report.record_written(&root, PathBuf::from("dist/index.html"));
        assert!(report.is_complete());

        report.record_failure(&en, &Error::Browser("crashed".into()));
        assert!(!report.is_complete());
        assert_eq!(report.written.len(), 1);
        assert_eq!(report.failed[0].route, "/en");
        assert!(report.failed[0].message.contains("crashed"));
    }
}
