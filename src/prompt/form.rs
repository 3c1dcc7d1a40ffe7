use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Form {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shot: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cup: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clothing: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accessory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weapon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pose: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    Style,
    AspectRatio,
    Shot,
    Body,
    Cup,
    Clothing,
    Accessory,
    Action,
    Scene,
    Effect,
    CustomText,
    Weapon,
    Pose,
}

impl FormField {
    pub const ALL: [FormField; 13] = [
        FormField::Style,
        FormField::AspectRatio,
        FormField::Shot,
        FormField::Body,
        FormField::Cup,
        FormField::Clothing,
        FormField::Accessory,
        FormField::Action,
        FormField::Scene,
        FormField::Effect,
        FormField::CustomText,
        FormField::Weapon,
        FormField::Pose,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FormField::Style => "style",
            FormField::AspectRatio => "aspectRatio",
            FormField::Shot => "shot",
            FormField::Body => "body",
            FormField::Cup => "cup",
            FormField::Clothing => "clothing",
            FormField::Accessory => "accessory",
            FormField::Action => "action",
            FormField::Scene => "scene",
            FormField::Effect => "effect",
            FormField::CustomText => "customText",
            FormField::Weapon => "weapon",
            FormField::Pose => "pose",
        }
    }

    pub fn flag(self) -> &'static str {
        match self {
            FormField::AspectRatio => "aspect-ratio",
            FormField::CustomText => "custom-text",
            other => other.name(),
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FormField {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim();
        FormField::ALL
            .into_iter()
            .find(|field| field.name() == wanted || field.flag() == wanted)
            .ok_or_else(|| format!("Unknown form field '{wanted}'"))
    }
}

impl Form {
    pub fn initial() -> Self {
        let mut form = Form::default();
        for field in FormField::ALL {
            if field != FormField::Weapon && field != FormField::Pose {
                form.set(field, "");
            }
        }
        form.set(FormField::Style, "none");
        form.set(FormField::AspectRatio, "16:9");
        form
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    fn slot(&self, field: FormField) -> &Option<String> {
        match field {
            FormField::Style => &self.style,
            FormField::AspectRatio => &self.aspect_ratio,
            FormField::Shot => &self.shot,
            FormField::Body => &self.body,
            FormField::Cup => &self.cup,
            FormField::Clothing => &self.clothing,
            FormField::Accessory => &self.accessory,
            FormField::Action => &self.action,
            FormField::Scene => &self.scene,
            FormField::Effect => &self.effect,
            FormField::CustomText => &self.custom_text,
            FormField::Weapon => &self.weapon,
            FormField::Pose => &self.pose,
        }
    }

    fn slot_mut(&mut self, field: FormField) -> &mut Option<String> {
        match field {
            FormField::Style => &mut self.style,
            FormField::AspectRatio => &mut self.aspect_ratio,
            FormField::Shot => &mut self.shot,
            FormField::Body => &mut self.body,
            FormField::Cup => &mut self.cup,
            FormField::Clothing => &mut self.clothing,
            FormField::Accessory => &mut self.accessory,
            FormField::Action => &mut self.action,
            FormField::Scene => &mut self.scene,
            FormField::Effect => &mut self.effect,
            FormField::CustomText => &mut self.custom_text,
            FormField::Weapon => &mut self.weapon,
            FormField::Pose => &mut self.pose,
        }
    }

    pub fn get(&self, field: FormField) -> Option<&str> {
        self.slot(field).as_deref()
    }

    pub fn selected(&self, field: FormField) -> Option<&str> {
        self.get(field).filter(|value| !value.is_empty())
    }

    pub fn set(&mut self, field: FormField, value: impl Into<String>) {
        *self.slot_mut(field) = Some(value.into());
    }

    pub fn apply_patch(&mut self, patch: &Form) {
        for field in FormField::ALL {
            if let Some(value) = patch.get(field) {
                self.set(field, value);
            }
        }
    }

    pub fn from_metadata(metadata: &Value) -> Option<Self> {
        let object = metadata.as_object()?;
        let mut form = Form::default();
        for field in FormField::ALL {
            if let Some(value) = object.get(field.name()).and_then(Value::as_str) {
                form.set(field, value);
            }
        }
        Some(form)
    }

    pub fn to_metadata(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
