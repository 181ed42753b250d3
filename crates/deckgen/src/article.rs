//! Section model: segmenting a source document into titled, leveled
//! sections and classifying them as primary article content vs.
//! supportive material (references, keywords, ...).

use regex::Regex;

use crate::error::{Error, Result};
use crate::fuzzy;

/// Well-known section titles, matched fuzzily against real headings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionType {
    Abstract,
    Introduction,
    CcsConcepts,
    Keywords,
    References,
    Acknowledgments,
}

impl SectionType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Abstract => "abstract",
            Self::Introduction => "introduction",
            Self::CcsConcepts => "ccs concepts",
            Self::Keywords => "keywords",
            Self::References => "references",
            Self::Acknowledgments => "acknowledgments",
        }
    }

    /// Types that mark supportive/boilerplate sections rather than
    /// presentable article content.
    pub fn supportive() -> &'static [SectionType] {
        &[
            Self::CcsConcepts,
            Self::Keywords,
            Self::References,
            Self::Acknowledgments,
        ]
    }
}

/// A titled, leveled chunk of the source document. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub level: u8,
    pub title: Option<String>,
    pub content: String,
}

impl Section {
    /// Split a raw text block into a title line and content body.
    ///
    /// The split happens at the first blank line. A leading numeric prefix
    /// in the title ("3.1 Design") determines the level: dot count plus
    /// one. Titles without a numeric prefix are level 1.
    pub fn from_text(text: &str) -> Result<Section> {
        let (title_line, content) = match text.split_once("\n\n") {
            Some((title, content)) => (title, content),
            None => (text, ""),
        };
        if title_line.trim().is_empty() {
            return Err(Error::Segmentation(
                "text has no separable title".to_string(),
            ));
        }

        let mut tokens = title_line.split_whitespace();
        let first = tokens.next().unwrap_or_default();
        let (level, clean_title) = if first.chars().any(|c| c.is_ascii_digit()) {
            let level = first.matches('.').count() as u8 + 1;
            (level, tokens.collect::<Vec<_>>().join(" "))
        } else {
            (1, title_line.trim().to_string())
        };

        Ok(Section {
            level,
            title: (!clean_title.is_empty()).then_some(clean_title),
            content: content.to_string(),
        })
    }

    /// Fuzzy title match against a well-known section type.
    /// Threshold 80 on the 0-100 partial-ratio scale; untitled sections
    /// match nothing.
    pub fn matches_type(&self, section_type: SectionType) -> bool {
        match &self.title {
            Some(title) => {
                fuzzy::partial_ratio(section_type.label(), &title.to_lowercase()) >= 80
            }
            None => false,
        }
    }

    pub fn to_markdown(&self) -> String {
        format!("# {}\n\n{}", self.title.as_deref().unwrap_or(""), self.content)
    }

    /// Character count of title plus content, the unit of the windowing
    /// budget.
    pub fn char_len(&self) -> usize {
        self.title.as_deref().unwrap_or("").chars().count() + self.content.chars().count()
    }
}

/// Render sections back into one markdown text block.
pub fn markdown_from_sections(sections: &[Section]) -> String {
    sections
        .iter()
        .map(Section::to_markdown)
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Split a markdown document into raw section blocks at ATX headings.
///
/// Heading text (without `#` markers) becomes the block's title line;
/// any text before the first heading forms its own block. Headings inside
/// fenced code blocks do not split.
pub fn raw_blocks_from_markdown(text: &str) -> Vec<String> {
    let text = text.replace("\r\n", "\n");
    let mut blocks: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_code_fence = false;

    for line in text.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_code_fence = !in_code_fence;
        }
        if !in_code_fence {
            if let Some(heading) = heading_text(line) {
                if !current.trim().is_empty() {
                    blocks.push(std::mem::take(&mut current));
                } else {
                    current.clear();
                }
                current.push_str(heading);
                current.push_str("\n\n");
                continue;
            }
        }
        current.push_str(line);
        current.push('\n');
    }
    if !current.trim().is_empty() {
        blocks.push(current);
    }

    let gap = Regex::new(r"\n{3,}").unwrap();
    blocks
        .iter()
        .map(|b| gap.replace_all(b.trim(), "\n\n").into_owned())
        .filter(|b| !b.is_empty())
        .collect()
}

/// The text of an ATX heading line, or `None` for any other line.
fn heading_text(line: &str) -> Option<&str> {
    let hashes = line.chars().take_while(|&c| c == '#').count();
    if hashes == 0 || hashes > 6 {
        return None;
    }
    let rest = &line[hashes..];
    if rest.is_empty() {
        return None;
    }
    rest.strip_prefix(' ').map(str::trim).filter(|t| !t.is_empty())
}

/// Parse a sequence of raw text blocks (document order) into sections.
pub fn sections_from_blocks<I, S>(blocks: I) -> Result<Vec<Section>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    blocks
        .into_iter()
        .filter(|b| !b.as_ref().trim().is_empty())
        .map(|b| Section::from_text(b.as_ref()))
        .collect()
}

/// An article partitioned into primary content and supportive material,
/// each in source-document order.
#[derive(Debug, Clone)]
pub struct ResearchArticle {
    pub primary_sections: Vec<Section>,
    pub supportive_sections: Vec<Section>,
}

impl ResearchArticle {
    /// Stable single-pass partition of sections via the fuzzy classifier.
    pub fn from_sections(sections: Vec<Section>) -> ResearchArticle {
        let mut primary = Vec::new();
        let mut supportive = Vec::new();
        for section in sections {
            let is_supportive = SectionType::supportive()
                .iter()
                .any(|&t| section.matches_type(t));
            if is_supportive {
                supportive.push(section);
            } else {
                primary.push(section);
            }
        }
        ResearchArticle {
            primary_sections: primary,
            supportive_sections: supportive,
        }
    }

    /// Primary sections from the start up to and including the first one
    /// matching "introduction"; all of them when none matches. Used to
    /// build the paper-overview excerpt for the first generation call.
    pub fn primary_opening_sections(&self) -> &[Section] {
        match self
            .primary_sections
            .iter()
            .position(|s| s.matches_type(SectionType::Introduction))
        {
            Some(i) => &self.primary_sections[..=i],
            None => &self.primary_sections,
        }
    }
}
