//! Generative-text collaborators
//!
//! Two capabilities sit behind traits: [`Generator`] drafts captions and
//! scripts from an idea, [`Summarizer`] turns analytics totals into a short
//! narrative. Both are fallible and are never retried by their callers.

pub mod mock;
pub mod ollama;
pub mod template;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::{AssistantBackend, AssistantConfig};
use crate::error::Result;
use crate::types::{AnalyticsTotals, GenerationKind, Platform};

pub use mock::MockAssistant;
pub use ollama::OllamaAssistant;
pub use template::TemplateAssistant;

#[async_trait]
pub trait Generator: Send + Sync {
    /// Produce a caption or script for `idea` on `platform`
    ///
    /// Blank output is reported as a `Generation` error.
    async fn generate(&self, kind: GenerationKind, idea: &str, platform: Platform) -> Result<String>;

    fn name(&self) -> &str;
}

#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, totals: &AnalyticsTotals) -> Result<String>;
}

/// The generator and summarizer handed to the services
#[derive(Clone)]
pub struct AssistantBackends {
    pub generator: Arc<dyn Generator>,
    pub summarizer: Arc<dyn Summarizer>,
}

impl AssistantBackends {
    /// Build the configured backend
    pub fn from_config(config: &AssistantConfig) -> Result<Self> {
        match config.backend {
            AssistantBackend::Template => Ok(Self::shared(Arc::new(TemplateAssistant::new()))),
            AssistantBackend::Ollama => Ok(Self::shared(Arc::new(OllamaAssistant::new(config)?))),
        }
    }

    /// Use one backend for both capabilities
    pub fn shared<T>(assistant: Arc<T>) -> Self
    where
        T: Generator + Summarizer + 'static,
    {
        Self {
            generator: assistant.clone(),
            summarizer: assistant,
        }
    }
}

/// Prompt asking a language model for a caption or script
pub fn generation_prompt(kind: GenerationKind, idea: &str, platform: Platform) -> String {
    match kind {
        GenerationKind::Caption => format!(
            "Write an engaging {} caption for this content idea: \"{}\". \
             Keep it concise, match the platform's tone, and end with a few relevant hashtags. \
             Reply with the caption only.",
            platform.display_name(),
            idea.trim()
        ),
        GenerationKind::Script => format!(
            "Write a short video script for {} based on this content idea: \"{}\". \
             Structure it as a hook, main points and a call to action. \
             Reply with the script only.",
            platform.display_name(),
            idea.trim()
        ),
    }
}

/// Prompt asking a language model to narrate a weekly report
pub fn summary_prompt(totals: &AnalyticsTotals) -> String {
    let platforms = totals
        .posts_by_platform
        .iter()
        .map(|(platform, count)| format!("{} {}", platform.display_name(), count))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "Summarize this creator's social media performance for {} in two or three sentences \
         and suggest one improvement. Posts: {}. Views: {}. Likes: {}. Comments: {}. Shares: {}. \
         Average engagement per post: {:.2}. Posts by platform: {}.",
        totals.period,
        totals.total_posts,
        totals.total_views,
        totals.total_likes,
        totals.total_comments,
        totals.total_shares,
        totals.average_engagement,
        if platforms.is_empty() { "none" } else { platforms.as_str() }
    )
}
