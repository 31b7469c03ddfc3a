//! Core types used throughout the content detector.
//!
//! This module defines the data model shared by the pipeline stages: paragraph
//! spans, edit events coming from the editor, extraction results going out to
//! subscribers, and the error type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A paragraph of the source text
///
/// `text` is trimmed, while `start_offset..end_offset` covers the raw segment
/// between separators. Offsets are byte offsets into the source string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paragraph {
    pub text: String,
    pub start_offset: usize,
    pub end_offset: usize,
}

impl Paragraph {
    pub fn new(text: impl Into<String>, start_offset: usize, end_offset: usize) -> Self {
        Self {
            text: text.into(),
            start_offset,
            end_offset,
        }
    }

    /// Length of the raw span in the source text
    pub fn span_len(&self) -> usize {
        self.end_offset - self.start_offset
    }
}

/// A raw change notification from the editor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditEvent {
    /// Full document content after the edit
    pub content: String,
    /// Cursor position (byte offset). Signed so bad input can be rejected.
    pub cursor_offset: i64,
    /// When the edit happened (defaults to receipt time)
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl EditEvent {
    pub fn new(content: impl Into<String>, cursor_offset: i64) -> Self {
        Self {
            content: content.into(),
            cursor_offset,
            timestamp: Utc::now(),
        }
    }

    /// Decode an edit event from JSON
    ///
    /// Any decode failure (missing fields, non-string content, etc.) is
    /// reported as `InvalidInput`.
    pub fn from_json(json: &str) -> Result<Self, DetectorError> {
        let event: EditEvent = serde_json::from_str(json)
            .map_err(|e| DetectorError::InvalidInput(format!("malformed edit event: {}", e)))?;
        event.validate()?;
        Ok(event)
    }

    /// Check the event can be fed into the pipeline
    pub fn validate(&self) -> Result<(), DetectorError> {
        if self.cursor_offset < 0 {
            return Err(DetectorError::InvalidInput(format!(
                "cursor offset must not be negative (got {})",
                self.cursor_offset
            )));
        }
        Ok(())
    }

    /// Cursor offset as an index. Only meaningful after `validate`.
    pub fn cursor(&self) -> usize {
        self.cursor_offset.max(0) as usize
    }
}

/// Output of one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Every paragraph in the document
    pub paragraphs: Vec<Paragraph>,
    /// Paragraph containing the cursor, `None` for an empty document.
    /// Encoded as `-1` on the wire when absent.
    #[serde(with = "focus_index_wire")]
    pub focus_index: Option<usize>,
    /// Paragraphs surrounding the focus (contiguous, includes the focus)
    pub context_paragraphs: Vec<Paragraph>,
    pub total_paragraphs: usize,
    pub timestamp: DateTime<Utc>,
}

impl ExtractionResult {
    /// Result for a document with no paragraphs
    pub fn empty(timestamp: DateTime<Utc>) -> Self {
        Self {
            paragraphs: Vec::new(),
            focus_index: None,
            context_paragraphs: Vec::new(),
            total_paragraphs: 0,
            timestamp,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_paragraphs == 0
    }

    /// The paragraph the cursor is in
    pub fn focus_paragraph(&self) -> Option<&Paragraph> {
        self.focus_index.and_then(|i| self.paragraphs.get(i))
    }

    /// Context paragraphs joined by a blank line
    pub fn context_text(&self) -> String {
        self.context_paragraphs
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// An immutable copy of the content at one extraction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentSnapshot {
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Byte length of `content`
    pub length: usize,
    /// SHA-256 of `content` (hex)
    pub content_hash: String,
}

/// Observable lifecycle of a detector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectorState {
    /// Nothing scheduled
    Idle,
    /// An edit is waiting for the quiet period to elapse
    Pending,
    /// The pipeline is running. Set and cleared within a single worker step,
    /// so watchers rarely observe it.
    Extracting,
}

impl DetectorState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectorState::Idle => "idle",
            DetectorState::Pending => "pending",
            DetectorState::Extracting => "extracting",
        }
    }
}

/// Errors that can occur in the detector
#[derive(Debug, thiserror::Error)]
pub enum DetectorError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Timer support unavailable: {0}")]
    TimerUnavailable(String),

    #[error("Detector has shut down")]
    Closed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

mod focus_index_wire {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<usize>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(index) => serializer.serialize_u64(*index as u64),
            None => serializer.serialize_i64(-1),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<usize>, D::Error> {
        let raw = i64::deserialize(deserializer)?;
        Ok(usize::try_from(raw).ok())
    }
}
