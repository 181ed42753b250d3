//! Extraction of embedded JSON objects from free-form note text.
//!
//! Models are asked to end their speaker notes with a JSON status object,
//! but they often wrap it in prose or emit earlier JSON-looking examples.
//! Segmentation finds every brace-balanced `{...}` span (arbitrary
//! nesting) and yields text and JSON segments in original order.

/// One piece of segmented note content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Json(String),
}

/// Split text into alternating plain-text and brace-balanced JSON-object
/// segments. Unbalanced braces stay part of the surrounding text.
pub fn to_segments(text: &str) -> Vec<Segment> {
    let stripped = text.trim();
    let mut segments = Vec::new();
    let mut last_end = 0;
    let mut search_from = 0;

    while let Some(open) = find_byte(stripped, search_from, b'{') {
        match balanced_end(stripped, open) {
            Some(close) => {
                let before = &stripped[last_end..open];
                if !before.is_empty() {
                    segments.push(Segment::Text(before.to_string()));
                }
                segments.push(Segment::Json(stripped[open..close].to_string()));
                last_end = close;
                search_from = close;
            }
            None => {
                search_from = open + 1;
            }
        }
    }

    if last_end < stripped.len() {
        let tail = stripped[last_end..].trim();
        if !tail.is_empty() {
            segments.push(Segment::Text(tail.to_string()));
        }
    }
    segments
}

fn find_byte(text: &str, from: usize, byte: u8) -> Option<usize> {
    text.as_bytes()[from..]
        .iter()
        .position(|&b| b == byte)
        .map(|i| from + i)
}

/// End offset (exclusive) of the balanced brace span opening at `open`.
fn balanced_end(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, b) in text.as_bytes().iter().enumerate().skip(open) {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_object() {
        let segments = to_segments("prefix {\"a\": {\"b\": 1}} suffix");
        assert_eq!(
            segments,
            vec![
                Segment::Text("prefix ".to_string()),
                Segment::Json("{\"a\": {\"b\": 1}}".to_string()),
                Segment::Text("suffix".to_string()),
            ]
        );
    }

    #[test]
    fn test_plain_text_only() {
        let segments = to_segments("no json here at all");
        assert_eq!(segments, vec![Segment::Text("no json here at all".to_string())]);
    }

    #[test]
    fn test_multiple_objects_keep_order() {
        let segments = to_segments("{\"a\": 1} and then {\"b\": 2}");
        assert_eq!(
            segments,
            vec![
                Segment::Json("{\"a\": 1}".to_string()),
                Segment::Text(" and then ".to_string()),
                Segment::Json("{\"b\": 2}".to_string()),
            ]
        );
    }

    #[test]
    fn test_unbalanced_brace_is_text() {
        let segments = to_segments("open { never closes");
        assert_eq!(
            segments,
            vec![Segment::Text("open { never closes".to_string())]
        );
    }

    #[test]
    fn test_multiline_object() {
        let text = "Some prose.\n{\n  \"start\": \"a\",\n  \"end\": \"b\"\n}";
        let segments = to_segments(text);
        assert_eq!(segments.len(), 2);
        assert!(matches!(&segments[1], Segment::Json(j) if j.contains("\"start\"")));
    }

    #[test]
    fn test_empty_input() {
        assert!(to_segments("").is_empty());
        assert!(to_segments("   \n ").is_empty());
    }
}
