//! Photo sources and the decoded-photo registry.

mod registry;
mod source;

pub use registry::{PhotoRegistry, DEFAULT_PHOTO_CACHE_CAPACITY};
pub use source::{has_cr2_extension, DirectorySource, PhotoSource};
