//! Wire protocol for streamed answers.
//!
//! A response is a sequence of newline-delimited frames, each `data: <json>`
//! with a `type` discriminator, terminated by a literal `data: [DONE]` frame.
//! The sentinel is emitted exactly once per response, on every path, so
//! consumers can always detect end-of-stream. An `error` event is terminal
//! content, not a protocol fault: consumers append its text to the displayed
//! output.

use serde::{Deserialize, Serialize};

/// Frame prefix carried by every event.
pub const FRAME_PREFIX: &str = "data: ";

/// Stream terminator, sent exactly once per response.
pub const DONE_FRAME: &str = "data: [DONE]\n\n";

/// A single event on the answer stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum StreamEvent {
    Start {
        #[serde(rename = "messageId")]
        message_id: String,
    },
    TextStart {
        id: String,
    },
    TextDelta {
        id: String,
        delta: String,
    },
    TextEnd {
        id: String,
    },
    Finish,
    Error {
        #[serde(rename = "errorText")]
        error_text: String,
    },
}

impl StreamEvent {
    /// Encode this event as a wire frame.
    pub fn to_frame(&self) -> String {
        // StreamEvent serialization cannot fail: no maps, no non-string keys.
        let json = serde_json::to_string(self).expect("stream event is always serializable");
        format!("{FRAME_PREFIX}{json}\n\n")
    }
}

/// One parsed frame from the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Event(StreamEvent),
    Done,
}

/// Decode a single wire frame, if it is one.
///
/// Returns `None` for lines that are not protocol frames (blank keep-alives)
/// or whose payload does not parse.
pub fn decode_frame(line: &str) -> Option<Frame> {
    let payload = line.trim().strip_prefix(FRAME_PREFIX.trim_end())?.trim();
    if payload == "[DONE]" {
        return Some(Frame::Done);
    }
    serde_json::from_str(payload).ok().map(Frame::Event)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_delta_wire_shape() {
        let event = StreamEvent::TextDelta {
            id: "blk-1".to_string(),
            delta: "hello".to_string(),
        };
        let frame = event.to_frame();
        assert_eq!(
            frame,
            "data: {\"type\":\"text-delta\",\"id\":\"blk-1\",\"delta\":\"hello\"}\n\n"
        );
    }

    #[test]
    fn test_error_uses_camel_case_field() {
        let event = StreamEvent::Error {
            error_text: "boom".to_string(),
        };
        let frame = event.to_frame();
        assert!(frame.contains("\"errorText\":\"boom\""));
        assert!(frame.contains("\"type\":\"error\""));
    }

    #[test]
    fn test_start_uses_camel_case_message_id() {
        let event = StreamEvent::Start {
            message_id: "msg-1".to_string(),
        };
        assert!(event.to_frame().contains("\"messageId\":\"msg-1\""));
    }

    #[test]
    fn test_decode_round_trip() {
        let event = StreamEvent::TextEnd {
            id: "blk-1".to_string(),
        };
        assert_eq!(
            decode_frame(&event.to_frame()),
            Some(Frame::Event(event))
        );
    }

    #[test]
    fn test_decode_sentinel() {
        assert_eq!(decode_frame(DONE_FRAME), Some(Frame::Done));
    }

    #[test]
    fn test_decode_ignores_non_frames() {
        assert_eq!(decode_frame(""), None);
        assert_eq!(decode_frame("event: ping"), None);
        assert_eq!(decode_frame("data: not-json"), None);
    }
}
