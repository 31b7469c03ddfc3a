//! Content Detector - debounced paragraph context extraction
//!
//! This crate watches a live document through a stream of edit events and,
//! once the user pauses typing, extracts the paragraph under the cursor plus a
//! bounded window of surrounding paragraphs.
//!
//! # Architecture
//!
//! Edits go through a trailing-edge debouncer. When it fires, the latest
//! content is segmented into paragraphs, the cursor is mapped onto one of
//! them, a context window is cut around it, and a snapshot is recorded in a
//! bounded history before the `ExtractionResult` is broadcast to subscribers.
//!
//! - [`segmenter`]: blank-line paragraph splitting with original offsets
//! - [`cursor`]: cursor offset to paragraph index
//! - [`window`]: context window around the focus paragraph
//! - [`debouncer`]: single-timer, last-write-wins debouncing
//! - [`history`]: bounded FIFO of content snapshots
//! - [`change_detector`]: the worker tying the stages together
//! - [`server`]: Unix socket front end for out-of-process editors

pub mod change_detector;
pub mod config;
pub mod cursor;
pub mod debouncer;
pub mod history;
pub mod protocol;
pub mod segmenter;
pub mod server;
pub mod types;
pub mod window;

// Re-export commonly used types
pub use change_detector::{extract, ContentChangeDetector, SourceHandle};
pub use config::{Config, DetectionConfig};
pub use cursor::locate;
pub use debouncer::ChangeDebouncer;
pub use history::{compute_hash, ContentHistory};
pub use protocol::{ClientMessage, ServerMessage};
pub use segmenter::segment;
pub use server::DetectorServer;
pub use types::{
    ContentSnapshot, DetectorError, DetectorState, EditEvent, ExtractionResult, Paragraph,
};
pub use window::build_window;
