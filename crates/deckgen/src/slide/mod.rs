//! Structural document model for one presentation slide.
//!
//! A slide is optional front matter, exactly one title heading, a run of
//! paragraph/list content blocks, and an optional HTML-comment speaker
//! note as the last block. Slides are only constructed by parsing; a
//! response that does not match this shape fails with a structure error
//! instead of producing a half-formed slide.

pub mod segments;
pub mod status;

use crate::error::{Error, Result};

/// A classified content block inside a slide body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlideBlock {
    Paragraph(String),
    List { ordered: bool, items: Vec<String> },
}

/// One slide, parsed from markdown. Parse and render are mutual inverses:
/// `from_markdown(to_markdown(s)) == s` for any `s` this parser produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkdownSlide {
    /// Inner lines of a leading `---` fenced front-matter block.
    pub front_matter: Option<String>,
    /// Title heading text, without the `#` marker.
    pub title: String,
    pub main_contents: Vec<SlideBlock>,
    /// Inner text of the trailing HTML-comment speaker note.
    pub note: Option<String>,
}

impl MarkdownSlide {
    /// Parse slide markdown into the typed block shape.
    ///
    /// Leading and trailing horizontal-rule delimiter lines are stripped.
    /// Parsing stops at the note; blocks other than paragraphs, lists and
    /// the comment note are structural errors.
    pub fn from_markdown(markdown: &str) -> Result<MarkdownSlide> {
        let text = markdown.replace("\r\n", "\n");
        let mut lines: Vec<&str> = text.lines().collect();

        trim_blank_edges(&mut lines);
        let front_matter = take_front_matter(&mut lines);
        trim_delimiters(&mut lines);

        let mut cursor = Cursor { lines: &lines, pos: 0 };
        cursor.skip_blank();

        let title = match cursor.peek() {
            Some(line) if is_heading(line) => {
                let title = heading_text(line).to_string();
                cursor.advance();
                title
            }
            Some(line) => {
                return Err(Error::Structure(format!(
                    "expected title heading, found: {line:?}"
                )))
            }
            None => {
                return Err(Error::Structure(
                    "slide has no title heading".to_string(),
                ))
            }
        };

        let mut main_contents = Vec::new();
        let mut note = None;
        loop {
            cursor.skip_blank();
            let Some(line) = cursor.peek() else { break };

            if line.trim_start().starts_with("<!--") {
                note = Some(parse_comment(&mut cursor)?);
                // The note ends the slide; anything after is ignored.
                break;
            }
            if is_heading(line) {
                return Err(Error::Structure(
                    "more than one heading in slide".to_string(),
                ));
            }
            if is_dash_rule(line) {
                return Err(Error::Structure(
                    "unexpected horizontal rule in slide body".to_string(),
                ));
            }
            if let Some(kind) = forbidden_block(line) {
                return Err(Error::Structure(format!(
                    "unexpected {kind} block in slide body"
                )));
            }
            if line.trim_start().starts_with('<') {
                return Err(Error::Structure(
                    "unexpected non-comment html block".to_string(),
                ));
            }

            if bullet_item(line).is_some() {
                main_contents.push(parse_list(&mut cursor, false));
            } else if ordered_item(line).is_some() {
                main_contents.push(parse_list(&mut cursor, true));
            } else {
                main_contents.push(parse_paragraph(&mut cursor));
            }
        }

        Ok(MarkdownSlide {
            front_matter,
            title,
            main_contents,
            note,
        })
    }

    /// Canonical rendering: front matter, `# title`, body blocks, note,
    /// separated by blank lines. The same logical content always
    /// serializes identically.
    pub fn to_markdown(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        if let Some(fm) = &self.front_matter {
            parts.push(format!("---\n{fm}\n---"));
        }
        parts.push(format!("# {}", self.title));
        for block in &self.main_contents {
            parts.push(match block {
                SlideBlock::Paragraph(text) => text.clone(),
                SlideBlock::List { ordered, items } => items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| {
                        if *ordered {
                            format!("{}. {item}", i + 1)
                        } else {
                            format!("- {item}")
                        }
                    })
                    .collect::<Vec<_>>()
                    .join("\n"),
            });
        }
        if let Some(note) = &self.note {
            parts.push(format!("<!--\n{note}\n-->"));
        }
        parts.join("\n\n")
    }
}

/// Join slides into one deck document separated by horizontal rules.
///
/// A slide with front matter supplies its own leading `---`, so no extra
/// separator is inserted before it.
pub fn render_deck(slides: &[MarkdownSlide]) -> String {
    let mut parts = Vec::new();
    for (i, slide) in slides.iter().enumerate() {
        let body = slide.to_markdown();
        if i == 0 || slide.front_matter.is_some() {
            parts.push(body);
        } else {
            parts.push(format!("---\n\n{body}"));
        }
    }
    let mut deck = parts.join("\n\n");
    deck.push('\n');
    deck
}

struct Cursor<'a> {
    lines: &'a [&'a str],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<&'a str> {
        self.lines.get(self.pos).copied()
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn skip_blank(&mut self) {
        while self.peek().is_some_and(|l| l.trim().is_empty()) {
            self.advance();
        }
    }
}

fn trim_blank_edges(lines: &mut Vec<&str>) {
    while lines.first().is_some_and(|l| l.trim().is_empty()) {
        lines.remove(0);
    }
    while lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }
}

/// Strip leading and trailing `---` delimiter lines left over from deck
/// separators around the slide.
fn trim_delimiters(lines: &mut Vec<&str>) {
    while lines.first().is_some_and(|l| is_dash_rule(l)) {
        lines.remove(0);
        trim_blank_edges(lines);
    }
    while lines.last().is_some_and(|l| is_dash_rule(l)) {
        lines.pop();
        trim_blank_edges(lines);
    }
}

/// Extract a leading front-matter block.
///
/// Front matter is an opening `---` at the very start with a closing `---`
/// before any blank line; a lone `---` followed by a blank line is a deck
/// delimiter, not front matter.
fn take_front_matter(lines: &mut Vec<&str>) -> Option<String> {
    if !lines.first().is_some_and(|l| is_dash_rule(l)) {
        return None;
    }
    let mut end = None;
    for (i, line) in lines.iter().enumerate().skip(1) {
        if line.trim().is_empty() {
            break;
        }
        if is_dash_rule(line) {
            end = Some(i);
            break;
        }
    }
    let end = end?;
    if end == 1 {
        return None;
    }
    let inner = lines[1..end].join("\n");
    lines.drain(..=end);
    trim_blank_edges(lines);
    Some(inner)
}

fn is_dash_rule(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.len() >= 3 && trimmed.chars().all(|c| c == '-')
}

fn is_heading(line: &str) -> bool {
    let trimmed = line.trim_start();
    let hashes = trimmed.chars().take_while(|&c| c == '#').count();
    (1..=6).contains(&hashes) && trimmed[hashes..].starts_with(' ')
}

fn heading_text(line: &str) -> &str {
    line.trim_start().trim_start_matches('#').trim()
}

fn bullet_item(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    trimmed
        .strip_prefix("- ")
        .or_else(|| trimmed.strip_prefix("* "))
        .map(str::trim)
}

fn ordered_item(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    let digits = trimmed.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    let rest = &trimmed[digits..];
    rest.strip_prefix(". ")
        .or_else(|| rest.strip_prefix(") "))
        .map(str::trim)
}

/// Block openers the slide shape forbids outright.
fn forbidden_block(line: &str) -> Option<&'static str> {
    let trimmed = line.trim_start();
    if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
        Some("code fence")
    } else if trimmed.starts_with('>') {
        Some("blockquote")
    } else {
        None
    }
}

fn parse_list(cursor: &mut Cursor, ordered: bool) -> SlideBlock {
    let mut items = Vec::new();
    while let Some(line) = cursor.peek() {
        let item = if ordered {
            ordered_item(line)
        } else {
            bullet_item(line)
        };
        match item {
            Some(item) => {
                items.push(item.to_string());
                cursor.advance();
            }
            None => break,
        }
    }
    SlideBlock::List { ordered, items }
}

fn parse_paragraph(cursor: &mut Cursor) -> SlideBlock {
    let mut text_lines = Vec::new();
    while let Some(line) = cursor.peek() {
        // Headings and rules end the paragraph even without a blank line,
        // so the main loop can reject them.
        if line.trim().is_empty()
            || line.trim_start().starts_with("<!--")
            || bullet_item(line).is_some()
            || ordered_item(line).is_some()
            || is_heading(line)
            || is_dash_rule(line)
        {
            break;
        }
        text_lines.push(line.trim());
        cursor.advance();
    }
    SlideBlock::Paragraph(text_lines.join("\n"))
}

/// Consume an HTML comment and return its trimmed inner text.
fn parse_comment(cursor: &mut Cursor) -> Result<String> {
    let mut collected = String::new();
    let mut closed = false;
    while let Some(line) = cursor.peek() {
        collected.push_str(line);
        collected.push('\n');
        cursor.advance();
        if line.contains("-->") {
            closed = true;
            break;
        }
    }
    if !closed {
        return Err(Error::Structure("unterminated note comment".to_string()));
    }
    let inner = collected
        .trim_start()
        .strip_prefix("<!--")
        .and_then(|s| s.trim_end().strip_suffix("-->"))
        .ok_or_else(|| Error::Structure("malformed note comment".to_string()))?;
    Ok(inner.trim().to_string())
}
