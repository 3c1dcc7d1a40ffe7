use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, StyleTier};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleCategory {
    Tier(StyleTier),
    None,
    Unresolved,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryProfile {
    #[serde(default)]
    pub extra_positive: Vec<String>,
    #[serde(default)]
    pub negative_add: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExactProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_override: Option<Vec<String>>,
    #[serde(default)]
    pub extra_positive: Vec<String>,
    #[serde(default)]
    pub negative_add: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleProfileTables {
    #[serde(default)]
    pub category: HashMap<StyleTier, CategoryProfile>,
    #[serde(default)]
    pub exact: HashMap<String, ExactProfile>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleProfile {
    pub category: StyleCategory,
    pub extra_positive: Vec<String>,
    pub negative_add: Vec<String>,
    pub quality_override: Option<Vec<String>>,
}

fn phrases(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

impl StyleProfileTables {
    pub fn builtin() -> Self {
        let category = HashMap::from([
            (
                StyleTier::Unique,
                CategoryProfile {
                    extra_positive: phrases(&[
                        "highly stylized",
                        "strong art direction",
                        "clean composition",
                    ]),
                    negative_add: phrases(&["overexposed highlights", "washed out colors"]),
                },
            ),
            (
                StyleTier::Studio,
                CategoryProfile {
                    extra_positive: phrases(&[
                        "high production quality",
                        "key animation feel",
                        "consistent lineart",
                    ]),
                    negative_add: phrases(&["inconsistent line weight"]),
                },
            ),
            (
                StyleTier::Master,
                CategoryProfile {
                    extra_positive: phrases(&[
                        "authorial style fidelity",
                        "signature linework",
                        "era-accurate rendering",
                    ]),
                    negative_add: phrases(&["style mismatch"]),
                },
            ),
        ]);

        let exact = HashMap::from([
            (
                "像素风 (Pixel Art)".to_string(),
                ExactProfile {
                    quality_override: Some(phrases(&[
                        "pixel art",
                        "16-bit",
                        "limited palette",
                        "dithering",
                        "crisp pixels",
                    ])),
                    extra_positive: phrases(&[
                        "sprite-like readability",
                        "strong silhouette",
                        "no anti-aliasing",
                    ]),
                    negative_add: phrases(&[
                        "photorealistic",
                        "ray tracing",
                        "lens flare",
                        "depth of field",
                        "soft blur",
                        "high-res textures",
                    ]),
                },
            ),
            (
                "虚幻引擎5 (UE5 Render)".to_string(),
                ExactProfile {
                    quality_override: Some(phrases(&[
                        "8k",
                        "photorealistic",
                        "cinematic lighting",
                        "global illumination",
                        "high dynamic range",
                        "sharp focus",
                    ])),
                    extra_positive: phrases(&[
                        "photorealistic",
                        "cinematic lighting",
                        "sharp details",
                    ]),
                    negative_add: phrases(&["anime lineart", "cel shading", "flat colors"]),
                },
            ),
            (
                "水墨画 (Ink Wash)".to_string(),
                ExactProfile {
                    quality_override: Some(phrases(&[
                        "traditional ink wash painting",
                        "sumi-e",
                        "expressive brush strokes",
                        "paper texture",
                    ])),
                    extra_positive: phrases(&["minimalism", "negative space", "elegant composition"]),
                    negative_add: phrases(&[
                        "3d render",
                        "photorealistic skin",
                        "ray tracing",
                        "hard outlines",
                        "neon lights",
                    ]),
                },
            ),
            (
                "蒸汽波 (Vaporwave)".to_string(),
                ExactProfile {
                    quality_override: None,
                    extra_positive: phrases(&[
                        "vaporwave palette",
                        "retro glow",
                        "80s aesthetic",
                        "soft gradients",
                    ]),
                    negative_add: phrases(&["muddy colors", "color banding", "low contrast"]),
                },
            ),
            (
                "厚涂 (Impasto)".to_string(),
                ExactProfile {
                    quality_override: None,
                    extra_positive: phrases(&[
                        "visible brush strokes",
                        "paint texture",
                        "impasto thickness",
                    ]),
                    negative_add: phrases(&["flat shading", "smooth plastic skin"]),
                },
            ),
        ]);

        StyleProfileTables { category, exact }
    }
}

pub fn style_category(style_key: Option<&str>, catalog: &Catalog) -> StyleCategory {
    match style_key {
        None | Some("") | Some("none") => StyleCategory::None,
        Some(key) => catalog
            .style_tier(key)
            .map(StyleCategory::Tier)
            .unwrap_or(StyleCategory::Unresolved),
    }
}

pub fn resolve_style_profile(
    style_key: Option<&str>,
    catalog: &Catalog,
    tables: &StyleProfileTables,
) -> StyleProfile {
    let category = style_category(style_key, catalog);

    let category_rules = match category {
        StyleCategory::Tier(tier) => tables.category.get(&tier),
        StyleCategory::None | StyleCategory::Unresolved => None,
    };
    let exact_rules = style_key
        .filter(|key| !key.is_empty())
        .and_then(|key| tables.exact.get(key));

    let mut extra_positive = Vec::new();
    let mut negative_add = Vec::new();
    if let Some(rules) = category_rules {
        extra_positive.extend(rules.extra_positive.iter().cloned());
        negative_add.extend(rules.negative_add.iter().cloned());
    }
    if let Some(rules) = exact_rules {
        extra_positive.extend(rules.extra_positive.iter().cloned());
        negative_add.extend(rules.negative_add.iter().cloned());
    }

    StyleProfile {
        category,
        extra_positive,
        negative_add,
        quality_override: exact_rules.and_then(|rules| rules.quality_override.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Descriptor;

    fn catalog_with_unique(key: &str) -> Catalog {
        let mut catalog = Catalog::default();
        catalog
            .styles_unique
            .insert(key.to_string(), Descriptor::Text("retro pixel art".into()));
        catalog
    }

    #[test]
    fn category_and_exact_rules_are_concatenated_in_order() {
        let catalog = catalog_with_unique("像素风 (Pixel Art)");
        let tables = StyleProfileTables::builtin();
        let profile = resolve_style_profile(Some("像素风 (Pixel Art)"), &catalog, &tables);

        assert_eq!(profile.category, StyleCategory::Tier(StyleTier::Unique));
        assert_eq!(
            profile.extra_positive,
            phrases(&[
                "highly stylized",
                "strong art direction",
                "clean composition",
                "sprite-like readability",
                "strong silhouette",
                "no anti-aliasing",
            ])
        );
        assert_eq!(profile.negative_add[0], "overexposed highlights");
        assert_eq!(profile.negative_add[2], "photorealistic");
        assert_eq!(profile.quality_override.as_ref().map(Vec::len), Some(5));
    }

    #[test]
    fn exact_rules_apply_without_a_catalog_tier() {
        let tables = StyleProfileTables::builtin();
        let profile = resolve_style_profile(Some("厚涂 (Impasto)"), &Catalog::default(), &tables);

        assert_eq!(profile.category, StyleCategory::Unresolved);
        assert_eq!(profile.extra_positive.len(), 3);
        assert_eq!(profile.quality_override, None);
    }

    #[test]
    fn unknown_style_degrades_to_empty_profile() {
        let tables = StyleProfileTables::builtin();
        let profile = resolve_style_profile(Some("does not exist"), &Catalog::default(), &tables);

        assert_eq!(profile.category, StyleCategory::Unresolved);
        assert!(profile.extra_positive.is_empty());
        assert!(profile.negative_add.is_empty());
        assert!(profile.quality_override.is_none());
    }

    #[test]
    fn empty_and_none_keys_resolve_to_none_category() {
        let catalog = Catalog::default();
        assert_eq!(style_category(None, &catalog), StyleCategory::None);
        assert_eq!(style_category(Some(""), &catalog), StyleCategory::None);
        assert_eq!(style_category(Some("none"), &catalog), StyleCategory::None);
    }

    #[test]
    fn duplicate_phrases_across_levels_are_kept() {
        let catalog = catalog_with_unique("dup");
        let mut tables = StyleProfileTables::builtin();
        tables.exact.insert(
            "dup".to_string(),
            ExactProfile {
                quality_override: None,
                extra_positive: phrases(&["highly stylized"]),
                negative_add: phrases(&["washed out colors"]),
            },
        );
        let profile = resolve_style_profile(Some("dup"), &catalog, &tables);
        let stylized = profile
            .extra_positive
            .iter()
            .filter(|phrase| phrase.as_str() == "highly stylized")
            .count();
        assert_eq!(stylized, 2);
        assert_eq!(profile.negative_add.len(), 3);
    }
}
