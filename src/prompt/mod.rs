pub mod budget;
pub mod existence;
pub mod form;
pub mod profile;
pub mod safety;
pub mod segments;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::debug;

use crate::catalog::Catalog;
use existence::{classify_existence, ExistenceTemplates};
use form::{Form, FormField};
use profile::{resolve_style_profile, StyleProfile, StyleProfileTables};
use segments::{build_segments, BuildContext};

pub const DEFAULT_BUDGET: usize = 2800;
pub const CLOSE_UP_SHOT_KEY: &str = "特写 (Close-up)";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("Prompt budget must be a positive number of characters, got {0}")]
    InvalidBudget(usize),
}

fn tags(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub budget: usize,
    pub base_quality_tags: Vec<String>,
    pub close_up_bonus_tags: Vec<String>,
    pub base_negative_tags: Vec<String>,
    pub close_up_shot_key: String,
    pub style_profiles: StyleProfileTables,
    pub existence_templates: ExistenceTemplates,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            budget: DEFAULT_BUDGET,
            base_quality_tags: tags(&[
                "Masterpiece",
                "best quality",
                "ultra-detailed",
                "4k wallpaper",
                "intricate details",
                "professional lighting",
                "ray tracing",
            ]),
            close_up_bonus_tags: tags(&[
                "beautiful detailed eyes",
                "detailed eyelashes",
                "moist lips",
                "skin texture",
            ]),
            base_negative_tags: tags(&[
                "low quality",
                "bad anatomy",
                "worst quality",
                "text",
                "watermark",
                "blurry details",
                "mutated hands",
                "extra digits",
                "multiple people",
                "duplicate character",
                "extra person",
                "multiple characters",
                "split view",
                "inset portrait",
                "character repetition",
            ]),
            close_up_shot_key: CLOSE_UP_SHOT_KEY.to_string(),
            style_profiles: StyleProfileTables::builtin(),
            existence_templates: ExistenceTemplates::default(),
        }
    }
}

impl EngineConfig {
    pub fn with_budget(mut self, budget: usize) -> Self {
        self.budget = budget;
        self
    }
}

static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

pub fn normalize_whitespace(text: &str) -> String {
    WHITESPACE_RUN.replace_all(text, " ").trim().to_string()
}

#[derive(Debug, Clone)]
pub struct PromptEngine {
    config: EngineConfig,
}

impl PromptEngine {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        if config.budget == 0 {
            return Err(EngineError::InvalidBudget(config.budget));
        }
        Ok(PromptEngine { config })
    }

    pub fn budget(&self) -> usize {
        self.config.budget
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn style_profile(&self, form: &Form, catalog: &Catalog) -> StyleProfile {
        resolve_style_profile(
            form.selected(FormField::Style),
            catalog,
            &self.config.style_profiles,
        )
    }

    pub fn assemble(&self, form: &Form, catalog: &Catalog) -> String {
        let profile = self.style_profile(form, catalog);
        let existence = classify_existence(form, catalog);
        let clause = self.config.existence_templates.splice_clause(existence);

        let ctx = BuildContext {
            form,
            catalog,
            profile: &profile,
            existence_clause: &clause,
            config: &self.config,
        };
        let mut draft = build_segments(&ctx);
        for segment in &mut draft {
            segment.text = normalize_whitespace(&segment.text);
        }
        draft.retain(|segment| !segment.text.is_empty());

        let draft_len = budget::joined_len(&draft);
        let kept = budget::prune_to_budget(draft, self.config.budget);
        let prompt = normalize_whitespace(&budget::join(&kept));

        debug!(
            target: "prompt.engine",
            style_category = ?profile.category,
            existence = ?existence,
            draft_len,
            final_len = prompt.chars().count(),
            segments = kept.len(),
            "Assembled prompt"
        );
        prompt
    }
}
