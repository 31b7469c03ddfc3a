//! Wire messages exchanged with editors over the detector socket.
//!
//! One JSON object per line, discriminated by a `type` field.

use crate::types::{ContentSnapshot, DetectorError, EditEvent, ExtractionResult};
use serde::{Deserialize, Serialize};

/// Message sent by an editor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
    /// The document changed
    Edit(EditEvent),
    /// Drop the pending extraction
    Cancel,
    /// Ask for the recorded snapshots
    History,
}

impl ClientMessage {
    /// Parse and validate one line from the socket
    pub fn parse(line: &str) -> Result<Self, DetectorError> {
        let message: ClientMessage = serde_json::from_str(line)
            .map_err(|e| DetectorError::InvalidInput(format!("malformed message: {}", e)))?;
        if let ClientMessage::Edit(event) = &message {
            event.validate()?;
        }
        Ok(message)
    }
}

/// Message sent back to the editor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerMessage {
    Extraction(ExtractionResult),
    History { snapshots: Vec<ContentSnapshot> },
    Error { message: String },
}

impl ServerMessage {
    pub fn error(err: &DetectorError) -> Self {
        ServerMessage::Error {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_parse_edit() {
        let message =
            ClientMessage::parse(r#"{"type":"edit","content":"Hello\n\nWorld","cursor_offset":8}"#)
                .unwrap();
        match message {
            ClientMessage::Edit(event) => {
                assert_eq!(event.content, "Hello\n\nWorld");
                assert_eq!(event.cursor(), 8);
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_parse_edit_with_timestamp() {
        let message = ClientMessage::parse(
            r#"{"type":"edit","content":"x","cursor_offset":0,"timestamp":"2024-05-01T10:00:00Z"}"#,
        )
        .unwrap();
        let ClientMessage::Edit(event) = message else {
            panic!("expected edit");
        };
        assert_eq!(event.timestamp.to_rfc3339(), "2024-05-01T10:00:00+00:00");
    }

    #[test]
    fn test_parse_unit_messages() {
        assert_eq!(ClientMessage::parse(r#"{"type":"cancel"}"#).unwrap(), ClientMessage::Cancel);
        assert_eq!(ClientMessage::parse(r#"{"type":"history"}"#).unwrap(), ClientMessage::History);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        for line in [
            r#"{"type":"edit","content":"x","cursor_offset":-1}"#,
            r#"{"type":"edit","content":["x"],"cursor_offset":0}"#,
            r#"{"type":"unknown"}"#,
            "garbage",
        ] {
            let err = ClientMessage::parse(line).unwrap_err();
            assert!(matches!(err, DetectorError::InvalidInput(_)), "line: {}", line);
        }
    }

    #[test]
    fn test_server_messages_are_tagged() {
        let json = serde_json::to_value(ServerMessage::Extraction(ExtractionResult::empty(
            Utc::now(),
        )))
        .unwrap();
        assert_eq!(json["type"], "extraction");
        assert_eq!(json["focus_index"], -1);

        let json = serde_json::to_value(ServerMessage::error(&DetectorError::Closed)).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["message"], "Detector has shut down");

        let json = serde_json::to_value(ServerMessage::History { snapshots: vec![] }).unwrap();
        assert_eq!(json["type"], "history");
    }
}
