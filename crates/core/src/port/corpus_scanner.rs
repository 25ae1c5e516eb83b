// Corpus Scanner Port (Interface)

use crate::domain::InputIdentifier;
use crate::error::Result;
use std::path::Path;

/// Enumerates candidate formulas under a root directory
pub trait CorpusScanner: Send + Sync {
    /// List matching identifiers in a stable order
    ///
    /// # Errors
    /// - AppError::InvalidRoot if `root` is missing or not a directory
    ///
    /// An empty result is a normal outcome ("nothing to do").
    fn scan(&self, root: &Path, recursive: bool) -> Result<Vec<InputIdentifier>>;
}

pub mod mocks {
    use super::*;

    /// Scanner returning a fixed list regardless of root
    pub struct StaticCorpusScanner {
        identifiers: Vec<InputIdentifier>,
    }

    impl StaticCorpusScanner {
        pub fn new<I, S>(identifiers: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<InputIdentifier>,
        {
            Self {
                identifiers: identifiers.into_iter().map(Into::into).collect(),
            }
        }
    }

    impl CorpusScanner for StaticCorpusScanner {
        fn scan(&self, _root: &Path, _recursive: bool) -> Result<Vec<InputIdentifier>> {
            Ok(self.identifiers.clone())
        }
    }
}
