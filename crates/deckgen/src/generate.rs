//! Generation control loop: repeatedly prompt the chat collaborator for
//! the next slide, track how much of the source window it covered, and
//! advance the window until the article is exhausted.

use crate::article::{self, ResearchArticle, Section, SectionType};
use crate::chat::{with_retry, ChatClient, ChatMessage};
use crate::error::{Error, Result};
use crate::prompt;
use crate::slide::status::SlideReferenceStatus;
use crate::slide::MarkdownSlide;
use crate::tracker::SourceTracker;
use crate::window::sections_until_threshold;

/// How many characters of the window tail to search when the model omits
/// the completion flag.
const SOURCE_TAIL_CHARS: usize = 1000;
/// How much of the reported end span to search for.
const END_SPAN_CHARS: usize = 300;

/// A slide in the output deck. Dividers are presentational title-only
/// slides inserted at top-level section boundaries; only content slides
/// count toward the condensation bounds.
#[derive(Debug, Clone)]
pub enum DeckSlide {
    Content(MarkdownSlide),
    Divider(MarkdownSlide),
}

impl DeckSlide {
    pub fn slide(&self) -> &MarkdownSlide {
        match self {
            DeckSlide::Content(s) | DeckSlide::Divider(s) => s,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeneratorOptions {
    /// Character budget for one source window.
    pub min_window_chars: usize,
    /// Lookahead distance for absorbing a near top-level boundary.
    pub lookahead_chars: usize,
    /// Attempt budget per collaborator call, shared by provider failures
    /// and unparseable responses.
    pub max_attempts: u32,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        GeneratorOptions {
            min_window_chars: 2000,
            lookahead_chars: 750,
            max_attempts: 3,
        }
    }
}

/// One slide-generation run over one article. Owns all mutable state of
/// the run; process-wide state does not exist.
pub struct Generator<'a> {
    client: &'a dyn ChatClient,
    article: ResearchArticle,
    example_source: String,
    example_slide: String,
    options: GeneratorOptions,
}

impl<'a> Generator<'a> {
    pub fn new(
        client: &'a dyn ChatClient,
        article: ResearchArticle,
        example_source: impl Into<String>,
        example_slide: impl Into<String>,
        options: GeneratorOptions,
    ) -> Generator<'a> {
        Generator {
            client,
            article,
            example_source: example_source.into(),
            example_slide: example_slide.into(),
            options,
        }
    }

    /// Run the full generation loop and return the ordered deck.
    pub fn run(&self) -> Result<Vec<DeckSlide>> {
        let system = ChatMessage::system(prompt::SYSTEM_PROMPT);
        let mut deck = vec![DeckSlide::Content(self.overview_slide(&system)?)];

        let primaries = &self.article.primary_sections;
        let mut cursor = primaries
            .iter()
            .position(|s| s.matches_type(SectionType::Introduction))
            .unwrap_or(0);

        let min_chars = self.options.min_window_chars.max(1);
        let mut tracker = SourceTracker::new();
        let mut window = sections_until_threshold(
            &primaries[cursor..],
            min_chars,
            self.options.lookahead_chars,
        )
        .to_vec();
        tracker.update_sections(0, window.clone())?;

        let mut last_level1_title: Option<String> = None;
        while cursor < primaries.len() {
            push_dividers(&mut deck, &window, &mut last_level1_title)?;

            let messages = self.next_slide_messages(&system, &deck, &mut tracker)?;
            let (slide, status) = self.request_slide(&messages, true)?;
            let status = status.ok_or_else(|| {
                Error::Decode("content slide without reference status".to_string())
            })?;
            deck.push(DeckSlide::Content(slide));
            record_span(&mut tracker, &status);

            if window_exhausted(&status, tracker.source_text()) {
                cursor += window.len();
                window = sections_until_threshold(
                    &primaries[cursor..],
                    min_chars,
                    self.options.lookahead_chars,
                )
                .to_vec();
                let removed = tracker.sections().len();
                tracker.update_sections(removed, window.clone())?;
            }
        }

        Ok(deck)
    }

    fn overview_slide(&self, system: &ChatMessage) -> Result<MarkdownSlide> {
        let opening =
            article::markdown_from_sections(self.article.primary_opening_sections());
        let messages = vec![
            system.clone(),
            ChatMessage::user(prompt::overview_request_prompt(
                &self.example_source,
                &self.example_slide,
                &opening,
            )),
        ];
        let (slide, _) = self.request_slide(&messages, false)?;
        Ok(slide)
    }

    fn next_slide_messages(
        &self,
        system: &ChatMessage,
        deck: &[DeckSlide],
        tracker: &mut SourceTracker,
    ) -> Result<Vec<ChatMessage>> {
        let condensed = condense_slides(deck)?;
        Ok(vec![
            system.clone(),
            ChatMessage::user(prompt::source_context_prompt(tracker.source_text())),
            ChatMessage::user(prompt::slides_to_context_prompt(&condensed)),
            ChatMessage::user(prompt::NEXT_SLIDE_PROMPT),
        ])
    }

    /// One collaborator call plus structural parsing, under the shared
    /// retry budget: a provider failure and an unparseable response are
    /// both worth re-asking with the same prompt.
    fn request_slide(
        &self,
        messages: &[ChatMessage],
        require_status: bool,
    ) -> Result<(MarkdownSlide, Option<SlideReferenceStatus>)> {
        with_retry(self.options.max_attempts, || {
            let content = self.client.chat(messages)?;
            let slide = MarkdownSlide::from_markdown(&content)?;
            let status = match &slide.note {
                Some(note) if require_status => {
                    Some(SlideReferenceStatus::from_note(note)?)
                }
                Some(note) => SlideReferenceStatus::from_note(note).ok(),
                None if require_status => {
                    return Err(Error::Structure(
                        "slide response has no speaker note".to_string(),
                    ))
                }
                None => None,
            };
            Ok((slide, status))
        })
    }
}

/// Insert a title-only divider for each level-1 title newly entering the
/// window that differs from the last-seen one.
fn push_dividers(
    deck: &mut Vec<DeckSlide>,
    window: &[Section],
    last_level1_title: &mut Option<String>,
) -> Result<()> {
    for section in window {
        if section.level == 1
            && section.title.is_some()
            && *last_level1_title != section.title
        {
            last_level1_title.clone_from(&section.title);
            let divider = MarkdownSlide::from_markdown(&format!(
                "---\nlayout: center\n---\n\n# {}",
                section.title.as_deref().unwrap_or_default()
            ))?;
            deck.push(DeckSlide::Divider(divider));
        }
    }
    Ok(())
}

/// Whether the model's status says the current window is used up.
///
/// The explicit flag wins when present. Without it, the reported end
/// span (trailing periods stripped, last `END_SPAN_CHARS` chars) is
/// searched in the tail of the window text.
fn window_exhausted(status: &SlideReferenceStatus, source_text: &str) -> bool {
    match status.is_complete {
        Some(complete) => complete,
        None => {
            let stripped = last_chars(status.end.trim_matches('.'), END_SPAN_CHARS);
            let tail = last_chars(source_text, SOURCE_TAIL_CHARS);
            !stripped.is_empty() && tail.contains(stripped)
        }
    }
}

fn last_chars(text: &str, count: usize) -> &str {
    let total = text.chars().count();
    if total <= count {
        return text;
    }
    let skip = total - count;
    let (idx, _) = text.char_indices().nth(skip).unwrap_or((0, ' '));
    &text[idx..]
}

/// Best-effort: mark the span between the reported start and end
/// substrings as referenced. Spans that do not occur verbatim are
/// ignored, like any other unverifiable model claim.
fn record_span(tracker: &mut SourceTracker, status: &SlideReferenceStatus) {
    let source = tracker.source_text().to_string();
    let Some(start) = source.find(&status.start) else {
        return;
    };
    let Some(end_at) = source[start..].find(&status.end) else {
        return;
    };
    let end = start + end_at + status.end.len();
    tracker.add_reference(&source[start..end]);
}

/// Bound the prompt as the deck grows: full content only for the first
/// three and last three content slides, title-only placeholders in
/// between. Dividers always survive untouched.
pub fn condense_slides(deck: &[DeckSlide]) -> Result<Vec<MarkdownSlide>> {
    let content_indices: Vec<usize> = deck
        .iter()
        .enumerate()
        .filter(|(_, s)| matches!(s, DeckSlide::Content(_)))
        .map(|(i, _)| i)
        .collect();
    let count = content_indices.len();

    let mut condensed = Vec::with_capacity(deck.len());
    for (i, deck_slide) in deck.iter().enumerate() {
        match deck_slide {
            DeckSlide::Divider(slide) => condensed.push(slide.clone()),
            DeckSlide::Content(slide) => {
                let rank = content_indices
                    .iter()
                    .position(|&ci| ci == i)
                    .unwrap_or_default();
                if rank < 3 || rank + 3 >= count {
                    condensed.push(slide.clone());
                } else {
                    condensed.push(MarkdownSlide::from_markdown(&format!(
                        "# {}\n\n\\[Content omitted\\]",
                        slide.title
                    ))?);
                }
            }
        }
    }
    Ok(condensed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::article::sections_from_blocks;
    use crate::slide::render_deck;
    use std::cell::RefCell;

    const OVERVIEW_RESPONSE: &str = "# Paper Overview\n\n- What the paper is about\n\n<!--\nThis paper studies foo.\n-->";

    const COMPLETE_RESPONSE: &str = "# Findings\n\n- foo leads to baz\n\n<!--\nThe finding follows from the method.\n{\"start\": \"foo bar.\", \"end\": \"baz qux.\", \"isComplete\": true}\n-->";

    const INCOMPLETE_RESPONSE: &str = "# Setup\n\n- first half only\n\n<!--\nCovers the opening.\n{\"start\": \"foo bar.\", \"end\": \"foo bar.\", \"isComplete\": false}\n-->";

    struct StubClient {
        responses: RefCell<Vec<Result<String>>>,
        calls: RefCell<usize>,
    }

    impl StubClient {
        fn new(responses: Vec<Result<String>>) -> StubClient {
            StubClient {
                responses: RefCell::new(responses),
                calls: RefCell::new(0),
            }
        }
    }

    impl ChatClient for StubClient {
        fn chat(&self, _messages: &[ChatMessage]) -> Result<String> {
            *self.calls.borrow_mut() += 1;
            let mut responses = self.responses.borrow_mut();
            if responses.is_empty() {
                return Err(Error::Provider("stub exhausted".to_string()));
            }
            responses.remove(0)
        }
    }

    fn two_section_article() -> ResearchArticle {
        ResearchArticle::from_sections(
            sections_from_blocks(["1 Introduction\n\nfoo bar.", "2 Method\n\nbaz qux."])
                .unwrap(),
        )
    }

    fn generator<'a>(client: &'a StubClient, article: ResearchArticle) -> Generator<'a> {
        Generator::new(
            client,
            article,
            "EXAMPLE SOURCE",
            "# Example\n\n- slide",
            GeneratorOptions::default(),
        )
    }

    #[test]
    fn test_end_to_end_two_sections() {
        // Each level-1 section gets its own window, so the run is two
        // content calls plus the overview.
        let client = StubClient::new(vec![
            Ok(OVERVIEW_RESPONSE.to_string()),
            Ok(COMPLETE_RESPONSE.to_string()),
            Ok(COMPLETE_RESPONSE.to_string()),
        ]);
        let deck = generator(&client, two_section_article()).run().unwrap();

        assert_eq!(deck.len(), 5);
        assert!(matches!(deck[0], DeckSlide::Content(_)));
        assert!(matches!(deck[1], DeckSlide::Divider(_)));
        assert_eq!(deck[1].slide().title, "Introduction");
        assert!(matches!(deck[2], DeckSlide::Content(_)));
        assert_eq!(deck[3].slide().title, "Method");
        assert!(matches!(deck[4], DeckSlide::Content(_)));
        assert_eq!(*client.calls.borrow(), 3);

        let rendered = render_deck(
            &deck.iter().map(|s| s.slide().clone()).collect::<Vec<_>>(),
        );
        assert!(rendered.contains("# Paper Overview"));
        assert!(rendered.contains("layout: center"));
    }

    #[test]
    fn test_incomplete_status_keeps_window() {
        let client = StubClient::new(vec![
            Ok(OVERVIEW_RESPONSE.to_string()),
            Ok(INCOMPLETE_RESPONSE.to_string()),
            Ok(COMPLETE_RESPONSE.to_string()),
            Ok(COMPLETE_RESPONSE.to_string()),
        ]);
        let deck = generator(&client, two_section_article()).run().unwrap();

        // The first window takes two content calls; its divider is not
        // repeated on the second pass.
        let content = deck
            .iter()
            .filter(|s| matches!(s, DeckSlide::Content(_)))
            .count();
        let dividers = deck
            .iter()
            .filter(|s| matches!(s, DeckSlide::Divider(_)))
            .count();
        assert_eq!(content, 4);
        assert_eq!(dividers, 2);
        assert_eq!(*client.calls.borrow(), 4);
    }

    #[test]
    fn test_provider_error_is_retried() {
        let client = StubClient::new(vec![
            Err(Error::Provider("overloaded".to_string())),
            Ok(OVERVIEW_RESPONSE.to_string()),
            Ok(COMPLETE_RESPONSE.to_string()),
            Ok(COMPLETE_RESPONSE.to_string()),
        ]);
        let deck = generator(&client, two_section_article()).run().unwrap();
        assert_eq!(deck.len(), 5);
        assert_eq!(*client.calls.borrow(), 4);
    }

    #[test]
    fn test_malformed_response_is_retried_then_fatal() {
        let bad = "# No Note Here\n\n- just content";
        let client = StubClient::new(vec![
            Ok(OVERVIEW_RESPONSE.to_string()),
            Ok(bad.to_string()),
            Ok(bad.to_string()),
            Ok(bad.to_string()),
        ]);
        let err = generator(&client, two_section_article()).run().unwrap_err();
        assert!(matches!(err, Error::Structure(_)));
        // Overview plus the full attempt budget for the content call.
        assert_eq!(*client.calls.borrow(), 4);
    }

    #[test]
    fn test_missing_status_json_is_a_decode_error() {
        let no_json = "# T\n\n- x\n\n<!-- prose only, no status -->";
        let client = StubClient::new(vec![
            Ok(OVERVIEW_RESPONSE.to_string()),
            Ok(no_json.to_string()),
            Ok(no_json.to_string()),
            Ok(no_json.to_string()),
        ]);
        let err = generator(&client, two_section_article()).run().unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn test_tail_matching_fallback_without_flag() {
        // Statuses without isComplete: the end span sits at the window
        // tail, so the tolerant check advances the window each time.
        let first = "# Wrap Up\n\n- done\n\n<!--\nCloses the section.\n{\"start\": \"foo bar.\", \"end\": \"foo bar.\"}\n-->";
        let second = "# Wrap Up\n\n- done\n\n<!--\nCloses the section.\n{\"start\": \"baz qux.\", \"end\": \"baz qux.\"}\n-->";
        let client = StubClient::new(vec![
            Ok(OVERVIEW_RESPONSE.to_string()),
            Ok(first.to_string()),
            Ok(second.to_string()),
        ]);
        let deck = generator(&client, two_section_article()).run().unwrap();
        assert_eq!(deck.len(), 5);
    }

    #[test]
    fn test_condense_keeps_edges_and_dividers() {
        let mut deck = Vec::new();
        for i in 0..8 {
            let slide =
                MarkdownSlide::from_markdown(&format!("# Slide {i}\n\n- body {i}"))
                    .unwrap();
            deck.push(DeckSlide::Content(slide));
            if i == 2 {
                let divider =
                    MarkdownSlide::from_markdown("---\nlayout: center\n---\n\n# Part")
                        .unwrap();
                deck.push(DeckSlide::Divider(divider));
            }
        }
        let condensed = condense_slides(&deck).unwrap();
        assert_eq!(condensed.len(), deck.len());

        let rendered: Vec<String> = condensed.iter().map(|s| s.to_markdown()).collect();
        // First three and last three content slides keep their bodies.
        assert!(rendered[0].contains("body 0"));
        assert!(rendered[1].contains("body 1"));
        assert!(rendered[2].contains("body 2"));
        assert!(rendered[6].contains("body 5"));
        assert!(rendered[7].contains("body 6"));
        assert!(rendered[8].contains("body 7"));
        // Interior content slides collapse to placeholders.
        assert!(rendered[4].contains("Content omitted"));
        assert!(rendered[5].contains("Content omitted"));
        // The divider survives with its front matter.
        assert!(rendered[3].contains("layout: center"));
    }

    #[test]
    fn test_window_exhausted_flag_wins() {
        let status = SlideReferenceStatus {
            start: "a".to_string(),
            end: "zzz not in source".to_string(),
            is_complete: Some(true),
        };
        assert!(window_exhausted(&status, "some source text"));

        let status = SlideReferenceStatus {
            start: "a".to_string(),
            end: "text".to_string(),
            is_complete: Some(false),
        };
        assert!(!window_exhausted(&status, "some source text"));
    }

    #[test]
    fn test_window_exhausted_tail_fallback() {
        let status = SlideReferenceStatus {
            start: "a".to_string(),
            end: "the very end.".to_string(),
            is_complete: None,
        };
        assert!(window_exhausted(&status, "lots of text before the very end."));
        assert!(!window_exhausted(&status, "entirely different text"));
    }

    #[test]
    fn test_record_span_marks_tracker() {
        let mut tracker = SourceTracker::new();
        tracker
            .update_sections(
                0,
                sections_from_blocks(["1 Intro\n\nfoo bar baz."]).unwrap(),
            )
            .unwrap();
        let status = SlideReferenceStatus {
            start: "foo".to_string(),
            end: "baz.".to_string(),
            is_complete: Some(true),
        };
        record_span(&mut tracker, &status);
        assert_eq!(tracker.referenced_ranges().len(), 1);
        assert_eq!(tracker.referenced_ranges()[0].text, "foo bar baz.");
    }
}
