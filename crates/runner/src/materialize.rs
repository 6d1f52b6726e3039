//! Writes script source to scratch files for execution

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use testforge_common::{Error, Framework, Language, Result};
use tokio::fs;
use tracing::{debug, warn};

/// Disambiguates files created within the same millisecond.
static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Import lines prepended to a script before it is handed to `framework`
pub fn boilerplate(framework: Framework) -> &'static str {
    match framework {
        Framework::Mocha => {
            "const { describe, it } = require('mocha');\nconst { expect } = require('chai');\n"
        }
        Framework::Jest => "const { test, expect } = require('@jest/globals');\n",
    }
}

/// Scratch directory that executable copies of scripts are written to
#[derive(Debug, Clone)]
pub struct Materializer {
    scratch_dir: PathBuf,
}

impl Materializer {
    pub fn new(scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            scratch_dir: scratch_dir.into(),
        }
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    /// Write `source` to a new uniquely named file and return its absolute path.
    ///
    /// Only JavaScript can be materialized.
    pub async fn materialize(
        &self,
        source: &str,
        language: Language,
        framework: Framework,
    ) -> Result<PathBuf> {
        if !language.is_executable() {
            return Err(Error::UnsupportedLanguage(language.to_string()));
        }

        fs::create_dir_all(&self.scratch_dir).await?;

        let dir = if self.scratch_dir.is_absolute() {
            self.scratch_dir.clone()
        } else {
            std::env::current_dir()?.join(&self.scratch_dir)
        };

        let filename = format!(
            "test_{}_{}.{}",
            chrono::Utc::now().timestamp_millis(),
            SEQUENCE.fetch_add(1, Ordering::Relaxed),
            language.file_extension()
        );
        let path = dir.join(filename);

        let mut contents = String::with_capacity(source.len() + 128);
        contents.push_str(boilerplate(framework));
        contents.push_str(source);

        fs::write(&path, contents).await?;
        debug!("Test file created at: {}", path.display());

        Ok(path)
    }
}

/// Remove a materialized file. A failed removal is logged, not returned: the
/// execution outcome has already been decided by then.
pub async fn cleanup(path: &Path) {
    match fs::remove_file(path).await {
        Ok(()) => debug!("Removed test file {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove test file {}: {}", path.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_mocha_boilerplate_is_prepended() {
        let tmp = TempDir::new().unwrap();
        let m = Materializer::new(tmp.path().join("scratch"));

        let path = m
            .materialize("it('runs', () => {});", Language::JavaScript, Framework::Mocha)
            .await
            .unwrap();

        assert!(path.is_absolute());
        assert_eq!(path.extension().unwrap(), "js");
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            written,
            "const { describe, it } = require('mocha');\nconst { expect } = require('chai');\nit('runs', () => {});"
        );
    }

    #[tokio::test]
    async fn test_jest_boilerplate_is_prepended() {
        let tmp = TempDir::new().unwrap();
        let m = Materializer::new(tmp.path());

        let path = m
            .materialize("test('x', () => {});", Language::JavaScript, Framework::Jest)
            .await
            .unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("const { test, expect } = require('@jest/globals');\n"));
        assert!(written.ends_with("test('x', () => {});"));
    }

    #[tokio::test]
    async fn test_file_names_are_unique() {
        let tmp = TempDir::new().unwrap();
        let m = Materializer::new(tmp.path());

        let a = m.materialize("a", Language::JavaScript, Framework::Jest).await.unwrap();
        let b = m.materialize("b", Language::JavaScript, Framework::Jest).await.unwrap();
        assert_ne!(a, b);
        let name = a.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("test_"));
    }

    #[tokio::test]
    async fn test_non_javascript_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let m = Materializer::new(tmp.path().join("scratch"));

        for language in [Language::Python, Language::Solidity] {
            let err = m.materialize("print(1)", language, Framework::Jest).await.unwrap_err();
            assert!(matches!(err, Error::UnsupportedLanguage(_)));
        }
        assert!(!tmp.path().join("scratch").exists());
    }

    #[tokio::test]
    async fn test_cleanup_tolerates_missing_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("never-written.js");
        cleanup(&path).await;

        std::fs::write(&path, "x").unwrap();
        cleanup(&path).await;
        assert!(!path.exists());
    }
}
