use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const BUILTIN_CATALOG: &str = include_str!("../../data/catalog.yaml");

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid YAML catalog: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid JSON catalog: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported catalog format for {0} (expected .yaml, .yml or .json)")]
    UnsupportedFormat(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Descriptor {
    Text(String),
    Record {
        prompt: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
}

impl Descriptor {
    pub fn prompt(&self) -> &str {
        match self {
            Descriptor::Text(text) => text,
            Descriptor::Record { prompt, .. } => prompt,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledPrompt {
    #[serde(default)]
    pub label: String,
    pub prompt: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleTier {
    Unique,
    Studio,
    Master,
}

impl StyleTier {
    pub fn as_str(self) -> &'static str {
        match self {
            StyleTier::Unique => "unique",
            StyleTier::Studio => "studio",
            StyleTier::Master => "master",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogCategory {
    StylesMaster,
    StylesStudio,
    StylesUnique,
    Clothing,
    Accessories,
    Actions,
    Scenes,
    Effects,
    Shots,
    Shapes,
    Cups,
}

impl CatalogCategory {
    pub const ALL: [CatalogCategory; 11] = [
        CatalogCategory::StylesMaster,
        CatalogCategory::StylesStudio,
        CatalogCategory::StylesUnique,
        CatalogCategory::Clothing,
        CatalogCategory::Accessories,
        CatalogCategory::Actions,
        CatalogCategory::Scenes,
        CatalogCategory::Effects,
        CatalogCategory::Shots,
        CatalogCategory::Shapes,
        CatalogCategory::Cups,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CatalogCategory::StylesMaster => "styles_master",
            CatalogCategory::StylesStudio => "styles_studio",
            CatalogCategory::StylesUnique => "styles_unique",
            CatalogCategory::Clothing => "CLOTHING",
            CatalogCategory::Accessories => "accessories",
            CatalogCategory::Actions => "actions",
            CatalogCategory::Scenes => "scenes",
            CatalogCategory::Effects => "effects",
            CatalogCategory::Shots => "shots",
            CatalogCategory::Shapes => "SHAPES",
            CatalogCategory::Cups => "CUPS",
        }
    }
}

impl fmt::Display for CatalogCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CatalogCategory {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim();
        CatalogCategory::ALL
            .into_iter()
            .find(|category| category.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                let known = CatalogCategory::ALL
                    .iter()
                    .map(|category| category.name())
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("Unknown catalog category '{wanted}' (known: {known})")
            })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub styles_master: BTreeMap<String, Descriptor>,
    #[serde(default)]
    pub styles_studio: BTreeMap<String, Descriptor>,
    #[serde(default)]
    pub styles_unique: BTreeMap<String, Descriptor>,
    #[serde(default, rename = "CLOTHING")]
    pub clothing: BTreeMap<String, LabeledPrompt>,
    #[serde(default)]
    pub accessories: BTreeMap<String, String>,
    #[serde(default)]
    pub actions: BTreeMap<String, String>,
    #[serde(default)]
    pub scenes: BTreeMap<String, String>,
    #[serde(default)]
    pub effects: BTreeMap<String, String>,
    #[serde(default)]
    pub shots: BTreeMap<String, String>,
    #[serde(default, rename = "SHAPES")]
    pub shapes: BTreeMap<String, LabeledPrompt>,
    #[serde(default, rename = "CUPS")]
    pub cups: BTreeMap<String, LabeledPrompt>,
}

fn non_empty(value: &str) -> Option<&str> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

fn lookup<'a>(table: &'a BTreeMap<String, String>, key: Option<&str>) -> Option<&'a str> {
    table.get(key?).map(String::as_str).and_then(non_empty)
}

fn lookup_prompt<'a>(table: &'a BTreeMap<String, LabeledPrompt>, key: Option<&str>) -> Option<&'a str> {
    table
        .get(key?)
        .map(|entry| entry.prompt.as_str())
        .and_then(non_empty)
}

impl Catalog {
    pub fn builtin() -> Result<Self, CatalogError> {
        let catalog: Catalog = serde_yaml::from_str(BUILTIN_CATALOG)?;
        debug!("Loaded bundled catalog with {} entries", catalog.total_entries());
        Ok(catalog)
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let raw = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());
        let catalog: Catalog = match extension.as_deref() {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&raw)?,
            Some("json") => serde_json::from_str(&raw)?,
            _ => return Err(CatalogError::UnsupportedFormat(path.to_path_buf())),
        };

        info!(
            "Loaded catalog from {} ({} entries)",
            path.display(),
            catalog.total_entries()
        );
        Ok(catalog)
    }

    fn tier_table(&self, tier: StyleTier) -> &BTreeMap<String, Descriptor> {
        match tier {
            StyleTier::Unique => &self.styles_unique,
            StyleTier::Studio => &self.styles_studio,
            StyleTier::Master => &self.styles_master,
        }
    }

    pub fn style_tier(&self, key: &str) -> Option<StyleTier> {
        [StyleTier::Unique, StyleTier::Studio, StyleTier::Master]
            .into_iter()
            .find(|tier| self.tier_table(*tier).contains_key(key))
    }

    pub fn style_descriptor(&self, key: &str) -> Option<&str> {
        [StyleTier::Master, StyleTier::Studio, StyleTier::Unique]
            .into_iter()
            .filter_map(|tier| self.tier_table(tier).get(key))
            .map(Descriptor::prompt)
            .find(|prompt| !prompt.is_empty())
    }

    pub fn clothing_prompt(&self, key: Option<&str>) -> Option<&str> {
        lookup_prompt(&self.clothing, key)
    }

    pub fn accessory(&self, key: Option<&str>) -> Option<&str> {
        lookup(&self.accessories, key)
    }

    pub fn action(&self, key: Option<&str>) -> Option<&str> {
        lookup(&self.actions, key)
    }

    pub fn scene(&self, key: Option<&str>) -> Option<&str> {
        lookup(&self.scenes, key)
    }

    pub fn effect(&self, key: Option<&str>) -> Option<&str> {
        lookup(&self.effects, key)
    }

    pub fn shot(&self, key: Option<&str>) -> Option<&str> {
        lookup(&self.shots, key)
    }

    pub fn shape_prompt(&self, key: Option<&str>) -> Option<&str> {
        lookup_prompt(&self.shapes, key)
    }

    pub fn cup_prompt(&self, key: Option<&str>) -> Option<&str> {
        lookup_prompt(&self.cups, key)
    }

    pub fn len(&self, category: CatalogCategory) -> usize {
        match category {
            CatalogCategory::StylesMaster => self.styles_master.len(),
            CatalogCategory::StylesStudio => self.styles_studio.len(),
            CatalogCategory::StylesUnique => self.styles_unique.len(),
            CatalogCategory::Clothing => self.clothing.len(),
            CatalogCategory::Accessories => self.accessories.len(),
            CatalogCategory::Actions => self.actions.len(),
            CatalogCategory::Scenes => self.scenes.len(),
            CatalogCategory::Effects => self.effects.len(),
            CatalogCategory::Shots => self.shots.len(),
            CatalogCategory::Shapes => self.shapes.len(),
            CatalogCategory::Cups => self.cups.len(),
        }
    }

    pub fn total_entries(&self) -> usize {
        CatalogCategory::ALL
            .iter()
            .map(|category| self.len(*category))
            .sum()
    }

    pub fn labels(&self, category: CatalogCategory) -> Vec<(&str, &str)> {
        fn keys<V>(table: &BTreeMap<String, V>) -> Vec<(&str, &str)> {
            table.keys().map(|key| (key.as_str(), key.as_str())).collect()
        }
        fn labeled(table: &BTreeMap<String, LabeledPrompt>) -> Vec<(&str, &str)> {
            table
                .iter()
                .map(|(key, entry)| {
                    let label = if entry.label.is_empty() {
                        key.as_str()
                    } else {
                        entry.label.as_str()
                    };
                    (key.as_str(), label)
                })
                .collect()
        }

        match category {
            CatalogCategory::StylesMaster => keys(&self.styles_master),
            CatalogCategory::StylesStudio => keys(&self.styles_studio),
            CatalogCategory::StylesUnique => keys(&self.styles_unique),
            CatalogCategory::Clothing => labeled(&self.clothing),
            CatalogCategory::Accessories => keys(&self.accessories),
            CatalogCategory::Actions => keys(&self.actions),
            CatalogCategory::Scenes => keys(&self.scenes),
            CatalogCategory::Effects => keys(&self.effects),
            CatalogCategory::Shots => keys(&self.shots),
            CatalogCategory::Shapes => labeled(&self.shapes),
            CatalogCategory::Cups => labeled(&self.cups),
        }
    }

    pub fn integrity_report(&self) -> IntegrityReport {
        let counts = CatalogCategory::ALL
            .iter()
            .map(|category| (*category, self.len(*category)))
            .collect::<Vec<_>>();
        let empty = counts
            .iter()
            .filter(|(_, count)| *count == 0)
            .map(|(category, _)| *category)
            .collect();
        IntegrityReport { counts, empty }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrityReport {
    pub counts: Vec<(CatalogCategory, usize)>,
    pub empty: Vec<CatalogCategory>,
}

impl IntegrityReport {
    pub fn is_healthy(&self) -> bool {
        self.empty.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_has_every_category() {
        let catalog = Catalog::builtin().unwrap();
        let report = catalog.integrity_report();
        assert!(report.is_healthy(), "empty categories: {:?}", report.empty);
        assert_eq!(report.counts.len(), CatalogCategory::ALL.len());
    }

    #[test]
    fn style_descriptor_reads_text_and_record_entries() {
        let catalog = Catalog::builtin().unwrap();
        assert!(catalog
            .style_descriptor("Mika Pikazo")
            .unwrap()
            .contains("neon pop"));
        assert!(catalog
            .style_descriptor("像素风 (Pixel Art)")
            .unwrap()
            .contains("pixel art"));
        assert_eq!(catalog.style_descriptor("no such style"), None);
    }

    #[test]
    fn style_tier_prefers_unique_over_studio_over_master() {
        let mut catalog = Catalog::default();
        catalog
            .styles_master
            .insert("shared".into(), Descriptor::Text("master text".into()));
        catalog
            .styles_studio
            .insert("shared".into(), Descriptor::Text("studio text".into()));
        assert_eq!(catalog.style_tier("shared"), Some(StyleTier::Studio));
        assert_eq!(catalog.style_descriptor("shared"), Some("master text"));

        catalog
            .styles_unique
            .insert("shared".into(), Descriptor::Text("unique text".into()));
        assert_eq!(catalog.style_tier("shared"), Some(StyleTier::Unique));
    }

    #[test]
    fn empty_descriptors_do_not_resolve() {
        let mut catalog = Catalog::default();
        catalog.scenes.insert("blank".into(), String::new());
        assert_eq!(catalog.scene(Some("blank")), None);
        assert_eq!(catalog.scene(None), None);
        assert_eq!(catalog.scene(Some("missing")), None);
    }

    #[test]
    fn loads_json_override_and_rejects_unknown_extension() {
        let dir = std::env::temp_dir().join(format!("waifugen-catalog-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        let json_path = dir.join("catalog.json");
        fs::write(
            &json_path,
            r#"{"shots": {"wide": "a wide establishing shot"}, "CUPS": {"A": {"label": "A Cup", "prompt": "small"}}}"#,
        )
        .unwrap();
        let catalog = Catalog::load(&json_path).unwrap();
        assert_eq!(catalog.shot(Some("wide")), Some("a wide establishing shot"));
        assert_eq!(catalog.cup_prompt(Some("A")), Some("small"));
        assert_eq!(catalog.integrity_report().empty.len(), 9);

        let txt_path = dir.join("catalog.txt");
        fs::write(&txt_path, "shots: {}").unwrap();
        assert!(matches!(
            Catalog::load(&txt_path),
            Err(CatalogError::UnsupportedFormat(_))
        ));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn category_names_parse_case_insensitively() {
        assert_eq!("clothing".parse::<CatalogCategory>(), Ok(CatalogCategory::Clothing));
        assert_eq!("shots".parse::<CatalogCategory>(), Ok(CatalogCategory::Shots));
        assert!("weapons".parse::<CatalogCategory>().is_err());
    }
}
