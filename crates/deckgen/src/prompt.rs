//! Prompt construction for the generation calls.
//!
//! Every prompt lives here so the wording the model sees has a single
//! source of truth and can be inspected by tests without a real client.

use crate::slide::{render_deck, MarkdownSlide};

/// Conversational system instruction for all calls.
pub const SYSTEM_PROMPT: &str = "Write the next reply in the conversation. \
    Use markdown for formatting when appropriate. Be concise yet helpful. \
    Offer direct answers when possible. Ask questions if needed. Explain \
    complex concepts with brief examples. Avoid repetition and strive to \
    add value with each response.";

/// The fixed instruction for every content-slide call, including the
/// required trailing JSON status block.
pub const NEXT_SLIDE_PROMPT: &str = r#"Write the single next slide. The slide content should be brief. The speaker notes should reference the slide content, not the slide itself, without adding introductory or concluding remarks. At the end of the speaker notes, write down:
1. The start and end of the range of text referenced (in JSON format)
2. A boolean indicating if this is basically the last available meaningful text to reference

JSON Format:
{
    "start": "Start of a sentence...",
    "end": "...end of a sentence.",
    "isComplete": true/false
}
Stop output after the JSON.
Following the text in chronological order. Do not skip any part."#;

pub fn triple_quote(content: &str) -> String {
    format!("\"\"\"\n{content}\n\"\"\"")
}

pub fn source_context_prompt(text: &str) -> String {
    format!("I have the following academic text:\n{}", triple_quote(text))
}

/// One worked example: a source excerpt and how it was turned into an
/// overview slide.
pub fn conversion_example_prompt(example_text: &str, example_slide: &str) -> String {
    format!(
        "{}\nFor reference, here's how it was converted into slide format:\n{}",
        source_context_prompt(example_text),
        triple_quote(example_slide)
    )
}

/// The first call of a run: convert the target's opening sections into a
/// high-level overview slide, steered by the example pair.
pub fn overview_request_prompt(example_text: &str, example_slide: &str, text: &str) -> String {
    format!(
        "{}\nPlease convert the following academic text into a concise, high-level \
         overview using a similar format. The slide content should be brief, and the \
         speaker notes should reference the slide content without adding introductory \
         or concluding remarks. Stop output after the JSON.\n{}",
        conversion_example_prompt(example_text, example_slide),
        triple_quote(text)
    )
}

/// Present the deck so far back to the model.
pub fn slides_to_context_prompt(slides: &[MarkdownSlide]) -> String {
    format!(
        "These are the current slides:\n{}",
        triple_quote(render_deck(slides).trim_end())
    )
}
