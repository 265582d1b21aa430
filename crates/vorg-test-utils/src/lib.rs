//! Shared test fixtures for the vorg workspace.
//!
//! Dev-dependency only. Provides a temporary catalog database laid out the
//! way the scanner creates it, real source files to link against, and a
//! rules file location.
//!
//! # Modules
//!
//! - [`catalog`]: [`TestCatalog`] fixture and the [`CatalogRow`] builder

pub mod catalog;

pub use catalog::{CatalogRow, FILES_SCHEMA, TestCatalog};
