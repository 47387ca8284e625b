//! Directory monitoring.
//!
//! This module provides:
//! - [`DirectoryMonitor`], the single entry point for file-system changes
//! - Gitignore-style path filtering relative to the owning root
//! - Native watching with notify-rs and an initial directory scan
//! - Pluggable content sources for embedding and testing

mod events;
mod filter;
mod monitor;
mod native;
mod scanner;
mod source;
mod stats;

pub use events::{EventMeta, MonitorEvent, MonitorEventKind};
pub use filter::PathFilter;
pub use monitor::{DirectoryMonitor, EventSubscriber, SubscriberId};
pub use scanner::{scan_root, ScanOutcome};
pub use source::{ContentMetadata, ContentSource, FsContentSource, MemoryContentSource};
pub use stats::{ActivityEntry, MonitorStats, RECENT_ACTIVITY_CAPACITY};
