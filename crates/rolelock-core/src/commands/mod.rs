//! High-level commands for rolelock operations.
//!
//! These commands are the public API called by the CLI frontend.

pub mod check;
pub mod lock;
pub mod show;

pub use check::{CheckCommand, CheckReport, Freshness};
pub use lock::{LockCommand, LockOptions, LockReport};
pub use show::{ShowCommand, ShowReport};
