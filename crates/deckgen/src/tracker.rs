//! Source tracker: the live window of source sections flattened into one
//! text buffer, plus the merged set of ranges that generated slides have
//! already referenced.

use crate::article::{self, Section};
use crate::error::{Error, Result};

/// A referenced span of the current window buffer. Offsets are byte
/// offsets into the flattened text and are only valid until the window
/// slides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRange {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

/// The only long-lived mutable state of a generation run: the current
/// window of sections and the ranges covered so far.
#[derive(Debug, Default)]
pub struct SourceTracker {
    sections: Vec<Section>,
    referenced_ranges: Vec<TextRange>,
    cached_text: Option<String>,
}

impl SourceTracker {
    pub fn new() -> SourceTracker {
        SourceTracker::default()
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn referenced_ranges(&self) -> &[TextRange] {
        &self.referenced_ranges
    }

    /// The window's sections flattened into one markdown buffer.
    pub fn source_text(&mut self) -> &str {
        if self.cached_text.is_none() {
            self.cached_text = Some(article::markdown_from_sections(&self.sections));
        }
        self.cached_text.as_deref().unwrap()
    }

    /// Record a referenced span by its literal text.
    ///
    /// The model's reported span is a best-effort hint: text not found
    /// verbatim in the buffer is silently ignored.
    pub fn add_reference(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let Some(start) = self.source_text().find(text) else {
            return;
        };
        self.referenced_ranges.push(TextRange {
            start,
            end: start + text.len(),
            text: text.to_string(),
        });
        self.merge_overlapping_ranges();
    }

    /// Slide the window: drop `removed_count` sections from the front and
    /// append `new_sections`. Stored ranges are re-based past the removed
    /// prefix; ranges that start inside it are discarded.
    pub fn update_sections(
        &mut self,
        removed_count: usize,
        new_sections: Vec<Section>,
    ) -> Result<()> {
        if removed_count > self.sections.len() {
            return Err(Error::InvalidOperation(format!(
                "cannot remove {removed_count} of {} sections",
                self.sections.len()
            )));
        }

        // Length of the removed prefix in the flattened buffer, including
        // the joiner that separated it from the surviving suffix.
        let removed_len = match removed_count {
            0 => 0,
            n if n == self.sections.len() => self.source_text().len(),
            n => article::markdown_from_sections(&self.sections[..n]).len() + 2,
        };

        self.referenced_ranges = self
            .referenced_ranges
            .iter()
            .filter(|r| r.start >= removed_len)
            .map(|r| TextRange {
                start: r.start - removed_len,
                end: r.end - removed_len,
                text: r.text.clone(),
            })
            .collect();

        self.sections.drain(..removed_count);
        self.sections.extend(new_sections);
        self.cached_text = None;
        Ok(())
    }

    /// Sort by start and fold every range that begins at or before the
    /// previous range's end into it, re-reading the covered text from the
    /// buffer.
    fn merge_overlapping_ranges(&mut self) {
        if self.referenced_ranges.is_empty() {
            return;
        }
        let source = self.source_text().to_string();

        let mut ranges = std::mem::take(&mut self.referenced_ranges);
        ranges.sort_by_key(|r| r.start);

        let mut merged: Vec<TextRange> = vec![ranges[0].clone()];
        for current in ranges.into_iter().skip(1) {
            let previous = merged.last_mut().unwrap();
            if current.start <= previous.end {
                if current.end > previous.end {
                    previous.end = current.end;
                    previous.text = source[previous.start..previous.end].to_string();
                }
            } else {
                merged.push(current);
            }
        }
        self.referenced_ranges = merged;
    }

    /// The window buffer with every referenced range wrapped in marker
    /// tags, for diagnostics and prompt conditioning.
    pub fn get_marked_source(&mut self) -> String {
        let source = self.source_text().to_string();
        if self.referenced_ranges.is_empty() {
            return source;
        }

        let mut result = String::new();
        let mut last_end = 0;
        for range in &self.referenced_ranges {
            result.push_str(&source[last_end..range.start]);
            result.push_str("<referenced>");
            result.push_str(&range.text);
            result.push_str("</referenced>");
            last_end = range.end;
        }
        result.push_str(&source[last_end..]);
        result
    }
}
