//! ps-core: Core library for pathstore
//!
//! This crate provides folder semantics over flat object storage:
//! - PathStore, the folder-oriented facade (list, transfer, rename, delete)
//! - Configuration and profile management
//! - Path normalization helpers
//! - ObjectStore trait for the underlying store
//! - An in-memory ObjectStore for tests and offline use
//!
//! This crate is independent of any specific S3 SDK; the `ps-s3` crate
//! provides the AWS SDK backed implementation.

pub mod config;
pub mod content;
pub mod error;
pub mod memory;
pub mod path;
pub mod profile;
pub mod progress;
pub mod store;
pub mod traits;

pub use config::{Config, ConfigManager, Credentials, Defaults, StoreOptions};
pub use content::{FileContent, TextEncoding};
pub use error::{Error, Result};
pub use memory::MemoryStore;
pub use path::{RemotePath, parse_remote};
pub use profile::{Profile, ProfileManager};
pub use progress::{NoProgress, Progress, ProgressHandle, ProgressUnit, no_progress};
pub use store::{Listing, PathStore};
pub use traits::{BytesCallback, ListPage, ObjectInfo, ObjectStore};
