// Filesystem CorpusScanner implementation

use cnfsweep_core::application::worker::constants::DEFAULT_FORMULA_SUFFIX;
use cnfsweep_core::domain::InputIdentifier;
use cnfsweep_core::error::{AppError, Result};
use cnfsweep_core::port::CorpusScanner;
use std::path::Path;
use tracing::{debug, warn};

/// Finds formula files by suffix with a glob over the corpus root
///
/// Identifiers are the matched paths as produced by joining the root with the
/// relative file path (`formulas/0.cnf`), sorted lexicographically.
pub struct FsCorpusScanner {
    suffix: String,
}

impl FsCorpusScanner {
    /// # Errors
    /// - AppError::Validation if `suffix` is empty
    pub fn new(suffix: impl Into<String>) -> Result<Self> {
        let suffix = suffix.into();
        if suffix.is_empty() {
            return Err(AppError::Validation(
                "formula suffix must not be empty".to_string(),
            ));
        }
        Ok(Self { suffix })
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    fn pattern(&self, root: &Path, recursive: bool) -> String {
        // The root is taken literally; only the file part is a pattern
        let root = glob::Pattern::escape(&root.to_string_lossy());
        let file = format!("*{}", glob::Pattern::escape(&self.suffix));
        let sep = std::path::MAIN_SEPARATOR;

        if recursive {
            format!("{}{}**{}{}", root, sep, sep, file)
        } else {
            format!("{}{}{}", root, sep, file)
        }
    }
}

impl Default for FsCorpusScanner {
    fn default() -> Self {
        Self {
            suffix: DEFAULT_FORMULA_SUFFIX.to_string(),
        }
    }
}

impl CorpusScanner for FsCorpusScanner {
    fn scan(&self, root: &Path, recursive: bool) -> Result<Vec<InputIdentifier>> {
        if !root.is_dir() {
            return Err(AppError::InvalidRoot(root.to_path_buf()));
        }

        let pattern = self.pattern(root, recursive);
        let paths = glob::glob(&pattern)
            .map_err(|e| AppError::Validation(format!("invalid pattern '{}': {}", pattern, e)))?;

        let mut identifiers: Vec<InputIdentifier> = paths
            .filter_map(|entry| match entry {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!(path = %e.path().display(), error = %e.error(), "Skipping unreadable path");
                    None
                }
            })
            .filter(|path| path.is_file())
            .map(|path| path.to_string_lossy().into_owned())
            .collect();

        identifiers.sort();
        identifiers.dedup();

        debug!(
            root = %root.display(),
            recursive,
            pattern = %pattern,
            found = identifiers.len(),
            "Corpus scanned"
        );

        Ok(identifiers)
    }
}
