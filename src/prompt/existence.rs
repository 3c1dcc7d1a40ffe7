use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::prompt::form::{Form, FormField};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExistenceTag {
    SymbolicCombatEntity,
    DesignedEntity,
    NaturalFantasyBeing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistenceTemplates {
    pub natural_fantasy_being: String,
    pub symbolic_combat_entity: String,
    pub designed_entity: String,
}

impl Default for ExistenceTemplates {
    fn default() -> Self {
        ExistenceTemplates {
            natural_fantasy_being: "a naturally existing being in this world, whose appearance and abilities are inherent rather than symbolic".to_string(),
            symbolic_combat_entity: "a symbolic combat entity whose attire and equipment follow stylized rules rather than real-world practicality".to_string(),
            designed_entity: "a deliberately designed entity whose appearance emphasizes visual impact and thematic coherence".to_string(),
        }
    }
}

impl ExistenceTemplates {
    pub fn clause(&self, tag: ExistenceTag) -> &str {
        match tag {
            ExistenceTag::NaturalFantasyBeing => &self.natural_fantasy_being,
            ExistenceTag::SymbolicCombatEntity => &self.symbolic_combat_entity,
            ExistenceTag::DesignedEntity => &self.designed_entity,
        }
    }

    pub fn splice_clause(&self, tag: ExistenceTag) -> String {
        let clause = self.clause(tag).trim();
        if clause.is_empty() || clause.ends_with(['.', ',', ';', ':', '!', '?']) {
            clause.to_string()
        } else {
            format!("{clause},")
        }
    }
}

fn term_pattern(alternatives: &str) -> Regex {
    Regex::new(&format!("(?i){alternatives}")).expect("existence term pattern is valid")
}

static FIREARM: Lazy<Regex> = Lazy::new(|| term_pattern("sniper|rifle|gun|firearm|weapon"));
static AIMING: Lazy<Regex> = Lazy::new(|| term_pattern("aim|aiming|snipe|combat|attack|shoot"));
static MELEE: Lazy<Regex> =
    Lazy::new(|| term_pattern("katana|scythe|blade|blades|sword|dual blades"));
static STRIKE_STANCE: Lazy<Regex> = Lazy::new(|| {
    term_pattern("ready to strike|iaido|mid-swing|slash|strike|wielding|menacing|combat|battle|stance")
});
static MINIMAL_CLOTHING: Lazy<Regex> =
    Lazy::new(|| term_pattern("bikini|swimsuit|micro|lingerie|minimal|exposed"));
static SMALL_ARMS: Lazy<Regex> = Lazy::new(|| term_pattern("sniper|rifle|gun|weapon"));
static HIGH_DESIGN: Lazy<Regex> =
    Lazy::new(|| term_pattern("high fashion|couture|concept|designed|visual design"));
static FANTASY: Lazy<Regex> = Lazy::new(|| {
    term_pattern("magic|spell|fantasy|animal ears|beast|demon|elf|fox ears|cat ears")
});

pub struct ExistenceRule {
    pub name: &'static str,
    requires: Vec<&'static Regex>,
    pub tag: ExistenceTag,
}

impl ExistenceRule {
    pub fn matches(&self, pool: &str) -> bool {
        self.requires.iter().all(|pattern| pattern.is_match(pool))
    }
}

pub static EXISTENCE_RULES: Lazy<Vec<ExistenceRule>> = Lazy::new(|| {
    vec![
        ExistenceRule {
            name: "firearm_with_aiming",
            requires: vec![&*FIREARM, &*AIMING],
            tag: ExistenceTag::SymbolicCombatEntity,
        },
        ExistenceRule {
            name: "melee_with_stance",
            requires: vec![&*MELEE, &*STRIKE_STANCE],
            tag: ExistenceTag::SymbolicCombatEntity,
        },
        ExistenceRule {
            name: "minimal_clothing_with_firearm",
            requires: vec![&*MINIMAL_CLOTHING, &*SMALL_ARMS],
            tag: ExistenceTag::SymbolicCombatEntity,
        },
        ExistenceRule {
            name: "high_design",
            requires: vec![&*HIGH_DESIGN],
            tag: ExistenceTag::DesignedEntity,
        },
        ExistenceRule {
            name: "fantasy_phenomenon",
            requires: vec![&*FANTASY],
            tag: ExistenceTag::NaturalFantasyBeing,
        },
        ExistenceRule {
            name: "default",
            requires: Vec::new(),
            tag: ExistenceTag::NaturalFantasyBeing,
        },
    ]
});

pub fn existence_pool(form: &Form, catalog: &Catalog) -> String {
    let parts = [
        form.get(FormField::Weapon).unwrap_or(""),
        form.get(FormField::Pose).unwrap_or(""),
        catalog
            .clothing_prompt(form.selected(FormField::Clothing))
            .unwrap_or(""),
        catalog.action(form.selected(FormField::Action)).unwrap_or(""),
        catalog.effect(form.selected(FormField::Effect)).unwrap_or(""),
    ];
    parts.join(" ").to_lowercase()
}

pub fn matching_rule(pool: &str) -> Option<&'static ExistenceRule> {
    EXISTENCE_RULES.iter().find(|rule| rule.matches(pool))
}

pub fn classify_pool(pool: &str) -> ExistenceTag {
    matching_rule(pool)
        .map(|rule| rule.tag)
        .unwrap_or(ExistenceTag::NaturalFantasyBeing)
}

pub fn classify_existence(form: &Form, catalog: &Catalog) -> ExistenceTag {
    classify_pool(&existence_pool(form, catalog))
}
