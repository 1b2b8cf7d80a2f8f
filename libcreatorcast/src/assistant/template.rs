//! Offline assistant built from fixed templates
//!
//! Deterministic and network-free, so it is the default backend and works
//! everywhere. Output quality is modest but always well-formed.

use async_trait::async_trait;

use crate::error::{CreatorcastError, Result};
use crate::types::{AnalyticsTotals, GenerationKind, Platform};

use super::{Generator, Summarizer};

#[derive(Debug, Default)]
pub struct TemplateAssistant;

impl TemplateAssistant {
    pub fn new() -> Self {
        Self
    }

    fn caption(idea: &str, platform: Platform) -> String {
        let tags = hashtags(idea);
        match platform {
            Platform::Twitter => format!("{} 🧵 {}", sentence(idea), tags),
            Platform::Linkedin => format!(
                "{}\n\nHere's what I learned along the way. What's your take?\n\n{}",
                sentence(idea),
                tags
            ),
            Platform::Instagram => format!("{} ✨\n.\n.\n{}", sentence(idea), tags),
            Platform::Tiktok => format!("{} 👀 Wait for it... {}", sentence(idea), tags),
            Platform::Youtube => format!(
                "{}\n\nLike and subscribe for more!\n\n{}",
                sentence(idea),
                tags
            ),
        }
    }

    fn script(idea: &str, platform: Platform) -> String {
        let length = match platform {
            Platform::Tiktok | Platform::Instagram => "30 seconds",
            Platform::Youtube => "3-5 minutes",
            Platform::Twitter | Platform::Linkedin => "60 seconds",
        };

        format!(
            "[HOOK]\nStop scrolling: {}\n\n\
             [MAIN POINTS]\n1. Why this matters\n2. How it works\n3. What you can do today\n\n\
             [CALL TO ACTION]\nFollow for more and tell me what you think in the comments.\n\n\
             Target length: {} ({})",
            sentence(idea),
            length,
            platform.display_name()
        )
    }
}

#[async_trait]
impl Generator for TemplateAssistant {
    async fn generate(&self, kind: GenerationKind, idea: &str, platform: Platform) -> Result<String> {
        if idea.trim().is_empty() {
            return Err(CreatorcastError::Generation(
                "Cannot generate from an empty idea".to_string(),
            ));
        }

        Ok(match kind {
            GenerationKind::Caption => Self::caption(idea, platform),
            GenerationKind::Script => Self::script(idea, platform),
        })
    }

    fn name(&self) -> &str {
        "template"
    }
}

#[async_trait]
impl Summarizer for TemplateAssistant {
    async fn summarize(&self, totals: &AnalyticsTotals) -> Result<String> {
        if totals.total_posts == 0 {
            return Ok(format!(
                "No posts were published from {}. Schedule a few drafts to start building momentum.",
                totals.period
            ));
        }

        let top_platform = totals
            .posts_by_platform
            .iter()
            .max_by_key(|(_, count)| **count)
            .map(|(platform, _)| platform.display_name())
            .unwrap_or("none");

        Ok(format!(
            "You published {} post{} from {}, reaching {} views with an average engagement of {:.2} per post. \
             {} was your most active platform. Keep posting consistently to grow these numbers.",
            totals.total_posts,
            if totals.total_posts == 1 { "" } else { "s" },
            totals.period,
            totals.total_views,
            totals.average_engagement,
            top_platform
        ))
    }
}

/// Idea as a sentence: trimmed, first letter capitalized, terminal punctuation
fn sentence(idea: &str) -> String {
    let idea = idea.trim();
    let mut chars = idea.chars();
    let mut out: String = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    };
    if !out.ends_with(['.', '!', '?']) {
        out.push('!');
    }
    out
}

/// Up to three hashtags from the longest words of the idea
fn hashtags(idea: &str) -> String {
    let mut words: Vec<String> = idea
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() > 3)
        .map(|w| w.to_lowercase())
        .collect();
    words.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    words.dedup();
    words.truncate(3);

    if words.is_empty() {
        "#content".to_string()
    } else {
        words
            .iter()
            .map(|w| format!("#{}", w))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
