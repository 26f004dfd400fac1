//! Core types for rewalk.
//!
//! This crate provides the data model shared by the walk engine and its
//! callers: locators, progress entries, the progress stack, checkpoints,
//! configuration and errors.

mod checkpoint;
mod config;
mod error;
mod locator;
mod progress;
mod stats;

pub use checkpoint::{CHECKPOINT_VERSION, Checkpoint};
pub use config::{WalkConfig, WalkConfigBuilder};
pub use error::{HandlerError, WalkError, WalkWarning, WarningKind};
pub use locator::Locator;
pub use progress::{ProgressEntry, ProgressStack, ResourceId};
pub use stats::WalkStats;
