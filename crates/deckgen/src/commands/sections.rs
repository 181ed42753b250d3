use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use crate::article::{self, ResearchArticle, Section, SectionType};

/// Print the segmented sections of an article with their classification.
pub fn run(file: &Path) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let blocks = article::raw_blocks_from_markdown(&content);
    let sections = article::sections_from_blocks(&blocks)
        .with_context(|| format!("Failed to segment {}", file.display()))?;
    let total = sections.len();
    let article = ResearchArticle::from_sections(sections);

    println!(
        "{total} section(s): {} primary, {} supportive",
        article.primary_sections.len(),
        article.supportive_sections.len()
    );
    println!();

    println!("{}", "Primary".green().bold());
    for section in &article.primary_sections {
        print_section(section);
    }

    if !article.supportive_sections.is_empty() {
        println!();
        println!("{}", "Supportive".yellow().bold());
        for section in &article.supportive_sections {
            print_section(section);
        }
    }
    Ok(())
}

fn print_section(section: &Section) {
    let indent = "  ".repeat(section.level as usize);
    let title = section.title.as_deref().unwrap_or("(untitled)");
    let kind = classify(section)
        .map(|t| format!(" [{}]", t.label()))
        .unwrap_or_default();
    println!(
        "{indent}{} {}{} ({} chars)",
        format!("L{}", section.level).dimmed(),
        title.bold(),
        kind.dimmed(),
        section.char_len()
    );
}

fn classify(section: &Section) -> Option<SectionType> {
    [
        SectionType::Abstract,
        SectionType::Introduction,
        SectionType::CcsConcepts,
        SectionType::Keywords,
        SectionType::References,
        SectionType::Acknowledgments,
    ]
    .into_iter()
    .find(|&t| section.matches_type(t))
}
