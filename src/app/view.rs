use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::api::types::HistoryRecord;
use crate::app::state::AppState;
use crate::catalog::Catalog;
use crate::prompt::form::Form;
use crate::prompt::PromptEngine;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryItem {
    pub url: String,
    pub filename: String,
    pub prompt: String,
    pub metadata: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

pub fn normalize_history_item(record: &HistoryRecord) -> HistoryItem {
    fn filled(value: &Option<String>) -> Option<&str> {
        value.as_deref().filter(|text| !text.is_empty())
    }

    HistoryItem {
        url: filled(&record.url).unwrap_or("").to_string(),
        filename: filled(&record.filename).unwrap_or("").to_string(),
        prompt: filled(&record.prompt)
            .or_else(|| filled(&record.final_prompt))
            .unwrap_or("")
            .to_string(),
        metadata: record.metadata.clone().filter(|value| !value.is_null()),
        final_prompt: record.final_prompt.clone(),
        time: record.time.clone(),
        style: record.style.clone(),
        aspect_ratio: record.aspect_ratio.clone(),
        extra: record.extra.clone(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewModel {
    pub loading: bool,
    pub error_msg: String,
    pub history: Vec<HistoryItem>,
    pub final_prompt: String,
}

pub fn select_view_model(state: &AppState, engine: &PromptEngine, catalog: &Catalog) -> ViewModel {
    ViewModel {
        loading: state.loading,
        error_msg: state.error.clone(),
        history: state.history.iter().map(normalize_history_item).collect(),
        final_prompt: engine.assemble(&state.form, catalog),
    }
}

pub fn restore_form(record: &HistoryRecord) -> Option<Form> {
    record.metadata.as_ref().and_then(Form::from_metadata)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerateRefusal {
    #[error("A generation request is already running")]
    Busy,
    #[error("Please enter API Key")]
    MissingApiKey,
}

pub fn begin_generate(
    state: &AppState,
    api_key: Option<&str>,
    has_saved_key: bool,
) -> Result<(), GenerateRefusal> {
    if state.loading {
        return Err(GenerateRefusal::Busy);
    }
    let has_key = api_key.is_some_and(|key| !key.trim().is_empty());
    if !has_key && !has_saved_key {
        return Err(GenerateRefusal::MissingApiKey);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::form::FormField;
    use crate::prompt::EngineConfig;
    use serde_json::json;

    #[test]
    fn history_items_get_safe_defaults() {
        let record = HistoryRecord {
            final_prompt: Some("legacy prompt".to_string()),
            metadata: Some(Value::Null),
            ..HistoryRecord::default()
        };
        let item = normalize_history_item(&record);
        assert_eq!(item.url, "");
        assert_eq!(item.filename, "");
        assert_eq!(item.prompt, "legacy prompt");
        assert_eq!(item.metadata, None);
    }

    #[test]
    fn history_items_keep_every_record_field() {
        let record: HistoryRecord = serde_json::from_value(json!({
            "filename": "a.png",
            "url": "/outputs/a.png",
            "final_prompt": "full prompt",
            "aspect_ratio": "3:4",
            "style": "Mika Pikazo",
            "seed": 42,
            "model": "img-v2"
        }))
        .unwrap();
        let item = normalize_history_item(&record);
        assert_eq!(item.prompt, "full prompt");
        assert_eq!(item.aspect_ratio.as_deref(), Some("3:4"));

        let rendered = serde_json::to_value(&item).unwrap();
        assert_eq!(rendered["final_prompt"], "full prompt");
        assert_eq!(rendered["aspect_ratio"], "3:4");
        assert_eq!(rendered["seed"], 42);
        assert_eq!(rendered["model"], "img-v2");
        assert_eq!(rendered["metadata"], Value::Null);
        assert!(rendered.get("time").is_none());
    }

    #[test]
    fn view_model_tracks_form() {
        let engine = PromptEngine::new(EngineConfig::default()).unwrap();
        let catalog = Catalog::builtin().unwrap();
        let mut state = AppState::default();
        state.error = "HTTP 500\nboom".to_string();
        state.form.set(FormField::AspectRatio, "3:4");

        let view = select_view_model(&state, &engine, &catalog);
        assert_eq!(view.error_msg, "HTTP 500\nboom");
        assert!(view.final_prompt.contains("tall vertical 3:4 aspect ratio"));
        assert_eq!(view.final_prompt, engine.assemble(&state.form, &catalog));
    }

    #[test]
    fn restore_reads_metadata_and_skips_legacy_records() {
        let record = HistoryRecord {
            metadata: Some(json!({"scene": "深海 (Underwater)", "model": "x"})),
            ..HistoryRecord::default()
        };
        let form = restore_form(&record).unwrap();
        assert_eq!(form.get(FormField::Scene), Some("深海 (Underwater)"));
        assert_eq!(form.get(FormField::Style), None);

        assert_eq!(restore_form(&HistoryRecord::default()), None);
    }

    #[test]
    fn generate_guard_refuses_busy_or_keyless_sessions() {
        let mut state = AppState::default();
        assert_eq!(
            begin_generate(&state, None, false),
            Err(GenerateRefusal::MissingApiKey)
        );
        assert_eq!(begin_generate(&state, Some("  "), false).unwrap_err().to_string(), "Please enter API Key");
        assert_eq!(begin_generate(&state, None, true), Ok(()));
        assert_eq!(begin_generate(&state, Some("sk-test"), false), Ok(()));

        state.loading = true;
        assert_eq!(begin_generate(&state, Some("sk-test"), true), Err(GenerateRefusal::Busy));
    }
}
