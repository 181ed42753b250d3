//! Turn a research article rendered as markdown into a presentation
//! slide deck, one model call per slide.
//!
//! The pipeline: segment the article into sections ([`article`]), slice
//! the primary sections into bounded windows ([`window`]), prompt a chat
//! collaborator for one slide at a time ([`generate`]), and track which
//! spans of the source each slide covered ([`tracker`]) until the whole
//! article is consumed.

pub mod article;
pub mod chat;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod fuzzy;
pub mod generate;
pub mod prompt;
pub mod slide;
pub mod tracker;
pub mod window;

pub use error::{Error, Result};
