//! Resumable depth-first walk engine for rewalk.
//!
//! [`FileWalker`] visits a directory tree depth-first and hands every
//! directory and file to a [`WalkHandler`]. Its progress stack can be
//! captured as a [`Checkpoint`] at any point the walk stops; a walker
//! seeded with that checkpoint fast-forwards through the finished part of
//! the tree without calling the handler and picks up at the first location
//! that was still pending.
//!
//! ```no_run
//! use std::path::Path;
//!
//! use rewalk_walk::{FileWalker, HandlerError, ProgressEntry, ResourceId, WalkConfig, WalkHandler};
//!
//! struct Printer;
//!
//! impl WalkHandler for Printer {
//!     fn handle_directory(
//!         &mut self,
//!         path: &Path,
//!         _depth: usize,
//!         _parent: Option<&ProgressEntry>,
//!     ) -> Result<ResourceId, HandlerError> {
//!         println!("dir  {}", path.display());
//!         Ok(ResourceId::default())
//!     }
//!
//!     fn handle_file(
//!         &mut self,
//!         path: &Path,
//!         _depth: usize,
//!         _parent: Option<&ProgressEntry>,
//!     ) -> Result<ResourceId, HandlerError> {
//!         println!("file {}", path.display());
//!         Ok(ResourceId::default())
//!     }
//!
//!     fn handle_restricted_directory(
//!         &mut self,
//!         path: &Path,
//!         _depth: usize,
//!         _parent: Option<&ProgressEntry>,
//!     ) -> Result<ResourceId, HandlerError> {
//!         println!("restricted {}", path.display());
//!         Ok(ResourceId::default())
//!     }
//! }
//!
//! let mut walker = FileWalker::new(WalkConfig::new("/srv/data"), Printer);
//! if let Err(err) = walker.walk() {
//!     if err.is_resumable() {
//!         walker.checkpoint().save("walk.json")?;
//!     }
//! }
//! # Ok::<(), rewalk_walk::WalkError>(())
//! ```

mod fs;
mod handler;
#[cfg(test)]
mod memory;
mod recovery;
mod walker;

pub use fs::{EntryKind, FileSystem, OsFileSystem};
pub use handler::WalkHandler;
pub use recovery::{RecoveryRoad, RoadDecision};
pub use walker::FileWalker;

pub use rewalk_core::{
    Checkpoint, HandlerError, Locator, ProgressEntry, ProgressStack, ResourceId, WalkConfig,
    WalkError, WalkStats, WalkWarning, WarningKind,
};
pub use tokio_util::sync::CancellationToken;
