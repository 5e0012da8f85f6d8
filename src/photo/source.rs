//! Photo source abstraction.
//!
//! A [`PhotoSource`] turns a photo identifier into the file's bytes and
//! enumerates the identifiers it can serve. The registry works against this
//! trait so storage backends can be swapped without touching the decode
//! path.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::IoError;

// =============================================================================
// PhotoSource Trait
// =============================================================================

/// Trait for loading CR2 files by identifier.
#[async_trait]
pub trait PhotoSource: Send + Sync {
    /// Read the complete bytes of the photo with the given identifier.
    async fn read(&self, photo_id: &str) -> Result<Vec<u8>, IoError>;

    /// List the identifiers of all photos this source can serve.
    async fn list(&self) -> Result<Vec<String>, IoError>;
}

// =============================================================================
// DirectorySource
// =============================================================================

/// A photo source backed by a local directory of `.cr2` files.
///
/// Photo identifiers are plain file names inside the directory; anything
/// that looks like a path is rejected before touching the filesystem.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    /// Create a source rooted at the given directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory this source serves from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, photo_id: &str) -> Result<PathBuf, IoError> {
        if photo_id.is_empty()
            || photo_id.contains('/')
            || photo_id.contains('\\')
            || photo_id.contains("..")
        {
            return Err(IoError::InvalidId(photo_id.to_string()));
        }
        Ok(self.root.join(photo_id))
    }
}

/// Whether a file name carries the `.cr2` extension (case-insensitive).
///
/// A bare `".cr2"` has no extension in path terms and is rejected.
pub fn has_cr2_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("cr2"))
}

#[async_trait]
impl PhotoSource for DirectorySource {
    async fn read(&self, photo_id: &str) -> Result<Vec<u8>, IoError> {
        let path = self.resolve(photo_id)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(IoError::NotFound(photo_id.to_string()))
            }
            Err(err) => Err(IoError::Read(format!("{}: {}", path.display(), err))),
        }
    }

    async fn list(&self) -> Result<Vec<String>, IoError> {
        let mut dir = tokio::fs::read_dir(&self.root)
            .await
            .map_err(|err| IoError::Read(format!("{}: {}", self.root.display(), err)))?;

        let mut photos = Vec::new();
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|err| IoError::Read(format!("{}: {}", self.root.display(), err)))?
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            let is_file = entry
                .file_type()
                .await
                .map(|kind| kind.is_file())
                .unwrap_or(false);
            if is_file && has_cr2_extension(&name) {
                photos.push(name);
            }
        }
        photos.sort();
        Ok(photos)
    }
}

// =============================================================================
// Tests
// =============================================================================
