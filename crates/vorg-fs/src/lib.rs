//! Filesystem layer for the virtual file organizer
//!
//! Provides normalized path handling, format-agnostic config loading,
//! atomic writes, advisory locking and link-artifact probing. Nothing in
//! this crate ever touches the content of an original file; it only reads
//! metadata and creates or removes secondary references.

pub mod artifact;
pub mod config;
pub mod constants;
pub mod error;
pub mod io;
pub mod lock;
pub mod path;

pub use artifact::{ArtifactKind, is_link_artifact, probe, remove_artifact, remove_empty_parents};
pub use config::ConfigStore;
pub use constants::VorgPath;
pub use error::{Error, Result};
pub use lock::ViewsLock;
pub use path::NormalizedPath;
