//! Mock assistant for testing
//!
//! Returns canned text, optionally fails, and counts calls so tests can
//! assert that enrichment made exactly one generation attempt.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::error::{CreatorcastError, Result};
use crate::types::{AnalyticsTotals, GenerationKind, Platform};

use super::{Generator, Summarizer};

#[derive(Debug, Default)]
pub struct MockAssistant {
    fail_generation: bool,
    fail_summary: bool,
    generate_calls: Mutex<Vec<(GenerationKind, String, Platform)>>,
    summarize_calls: Mutex<usize>,
}

impl MockAssistant {
    /// An assistant that always succeeds
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `generate` call fails
    pub fn failing_generation() -> Self {
        Self {
            fail_generation: true,
            ..Default::default()
        }
    }

    /// Every `summarize` call fails
    pub fn failing_summary() -> Self {
        Self {
            fail_summary: true,
            ..Default::default()
        }
    }

    pub fn generate_call_count(&self) -> usize {
        self.generate_calls.lock().unwrap().len()
    }

    /// Arguments of every `generate` call, in order
    pub fn generate_calls(&self) -> Vec<(GenerationKind, String, Platform)> {
        self.generate_calls.lock().unwrap().clone()
    }

    pub fn summarize_call_count(&self) -> usize {
        *self.summarize_calls.lock().unwrap()
    }
}

#[async_trait]
impl Generator for MockAssistant {
    async fn generate(&self, kind: GenerationKind, idea: &str, platform: Platform) -> Result<String> {
        self.generate_calls
            .lock()
            .unwrap()
            .push((kind, idea.to_string(), platform));

        if self.fail_generation {
            return Err(CreatorcastError::Generation(
                "mock generation failure".to_string(),
            ));
        }

        Ok(format!("Generated {} for {} on {}", kind, idea, platform))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[async_trait]
impl Summarizer for MockAssistant {
    async fn summarize(&self, totals: &AnalyticsTotals) -> Result<String> {
        *self.summarize_calls.lock().unwrap() += 1;

        if self.fail_summary {
            return Err(CreatorcastError::Generation(
                "mock summary failure".to_string(),
            ));
        }

        Ok(format!(
            "{} posts, {} views",
            totals.total_posts, totals.total_views
        ))
    }
}
