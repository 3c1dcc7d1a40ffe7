use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::catalog::Catalog;
use crate::prompt::form::{Form, FormField};
use crate::prompt::profile::StyleProfile;
use crate::prompt::safety::rewrite_attire;
use crate::prompt::EngineConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionalClass {
    Custom,
    Effect,
    Scene,
    Action,
    None,
}

impl OptionalClass {
    pub fn is_prunable(self) -> bool {
        !matches!(self, OptionalClass::None)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub build_order: usize,
    pub optional_class: OptionalClass,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    StyleAndRatio,
    Shot,
    Subject,
    Attire,
    Action,
    Scene,
    Effect,
    Custom,
    Quality,
    Negative,
}

impl SegmentKind {
    pub const BUILD_ORDER: [SegmentKind; 10] = [
        SegmentKind::StyleAndRatio,
        SegmentKind::Shot,
        SegmentKind::Subject,
        SegmentKind::Attire,
        SegmentKind::Action,
        SegmentKind::Scene,
        SegmentKind::Effect,
        SegmentKind::Custom,
        SegmentKind::Quality,
        SegmentKind::Negative,
    ];

    pub fn optional_class(self) -> OptionalClass {
        match self {
            SegmentKind::Action => OptionalClass::Action,
            SegmentKind::Scene => OptionalClass::Scene,
            SegmentKind::Effect => OptionalClass::Effect,
            SegmentKind::Custom => OptionalClass::Custom,
            _ => OptionalClass::None,
        }
    }

    pub fn build(self, ctx: &BuildContext<'_>) -> Option<String> {
        match self {
            SegmentKind::StyleAndRatio => Some(build_style_and_ratio(ctx)),
            SegmentKind::Shot => build_shot(ctx),
            SegmentKind::Subject => Some(build_subject(ctx)),
            SegmentKind::Attire => build_attire(ctx),
            SegmentKind::Action => build_action(ctx),
            SegmentKind::Scene => build_scene(ctx),
            SegmentKind::Effect => build_effect(ctx),
            SegmentKind::Custom => build_custom(ctx),
            SegmentKind::Quality => Some(build_quality(ctx)),
            SegmentKind::Negative => Some(build_negative(ctx)),
        }
    }
}

pub struct BuildContext<'a> {
    pub form: &'a Form,
    pub catalog: &'a Catalog,
    pub profile: &'a StyleProfile,
    pub existence_clause: &'a str,
    pub config: &'a EngineConfig,
}

impl BuildContext<'_> {
    fn style_descriptor(&self) -> Option<&str> {
        self.form
            .selected(FormField::Style)
            .filter(|key| *key != "none")
            .and_then(|key| self.catalog.style_descriptor(key))
    }

    fn shot_text(&self) -> Option<&str> {
        self.catalog.shot(self.form.selected(FormField::Shot))
    }
}

pub fn build_segments(ctx: &BuildContext<'_>) -> Vec<Segment> {
    SegmentKind::BUILD_ORDER
        .iter()
        .enumerate()
        .filter_map(|(build_order, kind)| {
            kind.build(ctx).map(|text| Segment {
                build_order,
                optional_class: kind.optional_class(),
                text,
            })
        })
        .collect()
}

pub const TALL_VERTICAL_RATIO: &str = "tall vertical 3:4 aspect ratio";
pub const WIDE_CINEMATIC_RATIO: &str = "wide cinematic 16:9 aspect ratio";

fn build_style_and_ratio(ctx: &BuildContext<'_>) -> String {
    let ratio = if ctx.form.get(FormField::AspectRatio) == Some("3:4") {
        TALL_VERTICAL_RATIO
    } else {
        WIDE_CINEMATIC_RATIO
    };
    let visual_language = if ctx.profile.quality_override.is_some() {
        "visual rendering"
    } else {
        "anime-style visual rendering"
    };

    let mut base = format!("A scene depicted through a high-quality {visual_language}, with a {ratio}");
    if let Some(descriptor) = ctx.style_descriptor() {
        base.push_str(", rendered in a style heavily inspired by ");
        base.push_str(descriptor);
    }
    base.push('.');
    base
}

fn build_shot(ctx: &BuildContext<'_>) -> Option<String> {
    ctx.shot_text().map(|shot| format!("The image uses {shot}."))
}

fn build_subject(ctx: &BuildContext<'_>) -> String {
    let mut subject = String::from("The main subject is a female character");
    if !ctx.existence_clause.is_empty() {
        subject.push_str(", ");
        subject.push_str(ctx.existence_clause);
    }

    if let Some(shape) = ctx.catalog.shape_prompt(ctx.form.selected(FormField::Body)) {
        subject.push_str(" with a ");
        subject.push_str(shape);
    }

    if let Some(cup) = ctx.catalog.cup_prompt(ctx.form.selected(FormField::Cup)) {
        subject.push_str(". ");
        subject.push_str(cup);
    }

    if !subject.ends_with('.') {
        subject.push('.');
    }
    subject
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RealismHint {
    Pop,
    Anime,
    Realistic,
    Default,
}

impl RealismHint {
    pub fn sentence(self) -> &'static str {
        match self {
            RealismHint::Pop => "rendered with bold, clean shapes and high-detail stylized fabric patterns consistent with the art style",
            RealismHint::Anime => "rendered with high-detail anime-style fabric textures and clean, expressive folds",
            RealismHint::Realistic => "rendered with realistic fabric texture, natural folds, and physically coherent shading",
            RealismHint::Default => "rendered with maximum detail appropriate to the chosen art style",
        }
    }
}

static REALISM_BUCKETS: Lazy<Vec<(Regex, RealismHint)>> = Lazy::new(|| {
    [
        (r"(?i)mika pikazo|pop|geometric|graphic", RealismHint::Pop),
        (r"(?i)anime|illustration|digital painting", RealismHint::Anime),
        (r"(?i)realistic|cinematic|photoreal", RealismHint::Realistic),
    ]
    .into_iter()
    .map(|(pattern, hint)| (Regex::new(pattern).expect("valid realism pattern"), hint))
    .collect()
});

pub fn realism_hint(style_descriptor: &str) -> RealismHint {
    REALISM_BUCKETS
        .iter()
        .find(|(pattern, _)| pattern.is_match(style_descriptor))
        .map(|(_, hint)| *hint)
        .unwrap_or(RealismHint::Default)
}

fn build_attire(ctx: &BuildContext<'_>) -> Option<String> {
    let clothing_key = ctx.form.selected(FormField::Clothing);
    let accessory_key = ctx.form.selected(FormField::Accessory);
    if clothing_key.is_none() && accessory_key.is_none() {
        return None;
    }

    let hint = realism_hint(ctx.style_descriptor().unwrap_or(""));

    let mut attire = String::from("She is");
    match ctx.catalog.clothing_prompt(clothing_key) {
        Some(clothing) => {
            attire.push(' ');
            attire.push_str(&rewrite_attire(clothing));
        }
        None => attire.push_str(" wearing casual clothes"),
    }

    if let Some(accessory) = ctx
        .catalog
        .accessory(accessory_key)
        .map(str::trim)
        .filter(|accessory| !accessory.is_empty())
    {
        attire.push_str(", paired with ");
        attire.push_str(accessory);
    }

    Some(format!(
        "{attire}. Clothing textures and folds are {}.",
        hint.sentence()
    ))
}

static FULL_BODY_SHOT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)full-?body|head to toe|shoes and feet").expect("valid pattern"));

static FULL_BODY_REPLACEMENTS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"(?i)focus on fingers", "hands clearly visible"),
        (r"(?i)close-?up", "clear"),
        (r"(?i)macro", "clear"),
        (r"(?i)detailed fingers", "hands clearly visible"),
    ]
    .into_iter()
    .map(|(pattern, replacement)| {
        (
            Regex::new(pattern).expect("valid replacement pattern"),
            replacement,
        )
    })
    .collect()
});

pub fn is_full_body_shot(shot_text: &str) -> bool {
    FULL_BODY_SHOT.is_match(shot_text)
}

pub fn reconcile_with_full_body(action_text: &str) -> String {
    FULL_BODY_REPLACEMENTS
        .iter()
        .fold(action_text.to_string(), |text, (pattern, replacement)| {
            pattern.replace_all(&text, *replacement).into_owned()
        })
}

fn build_action(ctx: &BuildContext<'_>) -> Option<String> {
    let action = ctx.catalog.action(ctx.form.selected(FormField::Action))?;
    let action = if ctx.shot_text().is_some_and(is_full_body_shot) {
        reconcile_with_full_body(action)
    } else {
        action.to_string()
    };
    Some(format!("The character is performing a pose: {action}."))
}

fn build_scene(ctx: &BuildContext<'_>) -> Option<String> {
    ctx.catalog
        .scene(ctx.form.selected(FormField::Scene))
        .map(|scene| {
            format!("The background depicts {scene}, rendered in the aforementioned art style.")
        })
}

pub const SINGLE_SUBJECT_GUARDRAIL: &str =
    "Single character only, single view, no inset portrait, no duplicate character.";

static WET_SKIN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)wet|soaked|water droplets|sweating|shiny skin").expect("valid pattern")
});

fn build_effect(ctx: &BuildContext<'_>) -> Option<String> {
    let effect = ctx.catalog.effect(ctx.form.selected(FormField::Effect))?;
    let mut line = format!("The atmosphere is enhanced with {effect}.");
    if WET_SKIN.is_match(effect) {
        line.push(' ');
        line.push_str(SINGLE_SUBJECT_GUARDRAIL);
    }
    Some(line)
}

fn build_custom(ctx: &BuildContext<'_>) -> Option<String> {
    let text = ctx.form.get(FormField::CustomText)?.trim();
    if text.is_empty() {
        return None;
    }
    let text = text.trim_end_matches(['。', '.', '!', '?']);
    Some(format!("Additional details: {text}."))
}

fn build_quality(ctx: &BuildContext<'_>) -> String {
    let mut tags: Vec<&str> = match &ctx.profile.quality_override {
        Some(tags) => tags.iter().map(String::as_str).collect(),
        None => ctx
            .config
            .base_quality_tags
            .iter()
            .map(String::as_str)
            .collect(),
    };
    tags.extend(ctx.profile.extra_positive.iter().map(String::as_str));

    let is_close_up = ctx.form.get(FormField::Shot) == Some(ctx.config.close_up_shot_key.as_str());
    if ctx.profile.quality_override.is_none() && is_close_up {
        tags.extend(ctx.config.close_up_bonus_tags.iter().map(String::as_str));
    }

    format!("{}.", tags.join(", "))
}

pub fn dedup_case_insensitive<'a>(items: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| {
            let key = item.trim().to_lowercase();
            !key.is_empty() && seen.insert(key)
        })
        .collect()
}

fn build_negative(ctx: &BuildContext<'_>) -> String {
    let merged = ctx
        .config
        .base_negative_tags
        .iter()
        .chain(ctx.profile.negative_add.iter())
        .map(String::as_str);
    format!("Avoid: {}.", dedup_case_insensitive(merged).join(", "))
}
