//! Reference-status codec: the structured claim a generated slide makes
//! about which span of the source window it covered.

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::slide::segments::{self, Segment};

/// The span of source text a slide reports having covered, given as its
/// literal starting and ending substrings, plus an optional flag saying
/// the window is exhausted. Models emit either shape.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SlideReferenceStatus {
    pub start: String,
    pub end: String,
    #[serde(rename = "isComplete")]
    pub is_complete: Option<bool>,
}

impl SlideReferenceStatus {
    /// Parse the status from a slide's note text.
    ///
    /// The *last* JSON-object segment wins: explanatory prose and earlier
    /// JSON-looking examples before it are ignored.
    pub fn from_note(note: &str) -> Result<SlideReferenceStatus> {
        let json = segments::to_segments(note)
            .into_iter()
            .rev()
            .find_map(|s| match s {
                Segment::Json(j) => Some(j),
                Segment::Text(_) => None,
            })
            .ok_or_else(|| {
                Error::Decode("note contains no JSON status object".to_string())
            })?;
        serde_json::from_str(&json)
            .map_err(|e| Error::Decode(format!("bad status object: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_flag() {
        let note = "Covers the setup.\n{\"start\": \"We begin\", \"end\": \"the end.\", \"isComplete\": true}";
        let status = SlideReferenceStatus::from_note(note).unwrap();
        assert_eq!(status.start, "We begin");
        assert_eq!(status.end, "the end.");
        assert_eq!(status.is_complete, Some(true));
    }

    #[test]
    fn test_parse_without_flag() {
        let note = "{\"start\": \"a\", \"end\": \"b\"}";
        let status = SlideReferenceStatus::from_note(note).unwrap();
        assert_eq!(status.is_complete, None);
    }

    #[test]
    fn test_last_object_wins() {
        let note = "For example {\"start\": \"x\", \"end\": \"y\", \"isComplete\": false} but actually:\n{\"start\": \"real start\", \"end\": \"real end\", \"isComplete\": true}";
        let status = SlideReferenceStatus::from_note(note).unwrap();
        assert_eq!(status.start, "real start");
        assert_eq!(status.is_complete, Some(true));
    }

    #[test]
    fn test_missing_json_fails() {
        let err = SlideReferenceStatus::from_note("just prose").unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn test_wrong_shape_fails() {
        let err = SlideReferenceStatus::from_note("{\"begin\": \"a\"}").unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }
}
