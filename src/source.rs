//! Immutable C source text fed to the metrics extractor and shape probe.

use crate::error::EvalError;
use std::fs;
use std::path::Path;

/// Source text of one generated file. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceText {
    text: String,
}

impl SourceText {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Decode raw bytes; invalid UTF-8 is reported against `path`.
    pub fn from_bytes(bytes: Vec<u8>, path: &Path) -> Result<Self, EvalError> {
        String::from_utf8(bytes)
            .map(Self::new)
            .map_err(|_| EvalError::InvalidEncoding {
                path: path.to_path_buf(),
            })
    }

    /// Read and decode a file from disk.
    pub fn read(path: &Path) -> Result<Self, EvalError> {
        let bytes = fs::read(path).map_err(|source| EvalError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(bytes, path)
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Lines split on `\n` or `\r\n`, without terminators.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.lines()
    }

    pub fn line_count(&self) -> usize {
        self.text.lines().count()
    }
}
