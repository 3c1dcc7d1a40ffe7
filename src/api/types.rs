use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct InitResponse {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub history: Vec<HistoryRecord>,
    #[serde(default)]
    pub has_saved_key: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub remember_key: bool,
    pub prompt: String,
    pub style_tag: Option<String>,
    pub aspect_ratio: Option<String>,
    pub ref_image: Option<String>,
    pub metadata: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn init_response_tolerates_null_history() {
        let parsed: InitResponse =
            serde_json::from_value(json!({"history": null, "has_saved_key": true})).unwrap();
        assert!(parsed.history.is_empty());
        assert!(parsed.has_saved_key);

        let parsed: InitResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(parsed, InitResponse::default());
    }

    #[test]
    fn record_keeps_unknown_fields() {
        let record: HistoryRecord = serde_json::from_value(json!({
            "filename": "wf_1.png",
            "url": "/static/history/wf_1.png",
            "seed": 42
        }))
        .unwrap();
        assert_eq!(record.filename.as_deref(), Some("wf_1.png"));
        assert_eq!(record.extra.get("seed"), Some(&json!(42)));
        assert_eq!(serde_json::to_value(&record).unwrap()["seed"], json!(42));
    }

    #[test]
    fn payload_omits_absent_key_but_sends_null_image() {
        let payload = GeneratePayload {
            api_key: None,
            remember_key: true,
            prompt: "A scene".to_string(),
            style_tag: Some("none".to_string()),
            aspect_ratio: Some("16:9".to_string()),
            ref_image: None,
            metadata: json!({"style": "none"}),
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert!(value.get("api_key").is_none());
        assert_eq!(value["ref_image"], Value::Null);
        assert_eq!(value["remember_key"], json!(true));
    }
}
