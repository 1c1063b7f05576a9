//! Digest presets: which pages to combine and how to overlap them.
//!
//! Presets are YAML. The built-in set is embedded at compile time from
//! `seed_data/presets.yml`; a user file with the same shape can replace it.

use std::collections::HashSet;

use serde::Deserialize;
use thiserror::Error;

use ebrokerdj_api::{Market, Side};

use crate::overlap::{Direction, OverlapMode, OverlapOptions, SortBy, DEFAULT_MIN_APPEAR};
use crate::validation;

/// Error types for preset loading.
#[derive(Error, Debug)]
pub enum PresetError {
    #[error("Failed to parse preset YAML: {0}")]
    YamlParse(#[from] serde_yml::Error),
    #[error("Duplicate preset name: {0}")]
    DuplicateName(String),
    #[error("Preset '{0}' has no sources")]
    Empty(String),
    #[error("Preset '{preset}' is invalid: {reason}")]
    Invalid { preset: String, reason: String },
    #[error("Unknown preset: {0}")]
    NotFound(String),
}

/// Top-level structure of a preset file.
#[derive(Deserialize, Debug)]
pub struct PresetFile {
    pub presets: Vec<Preset>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Preset {
    pub name: String,
    pub title: String,
    #[serde(default)]
    pub overlap: OverlapSettings,
    pub sources: Vec<SourceSpec>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct OverlapSettings {
    #[serde(default)]
    pub mode: OverlapMode,
    #[serde(default = "default_min_appear")]
    pub min_appear: usize,
    #[serde(default)]
    pub sort_by: SortBy,
}

impl Default for OverlapSettings {
    fn default() -> Self {
        Self {
            mode: OverlapMode::default(),
            min_appear: DEFAULT_MIN_APPEAR,
            sort_by: SortBy::default(),
        }
    }
}

fn default_min_appear() -> usize {
    DEFAULT_MIN_APPEAR
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct SourceSpec {
    pub label: String,
    #[serde(default)]
    pub direction: Direction,
    pub page: SourceKind,
}

/// The page a source is read from.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceKind {
    BrokerFlow {
        branch: String,
        sub_branch: String,
        #[serde(default)]
        side: Option<Side>,
    },
    TrustRank {
        #[serde(default)]
        market: Market,
    },
}

impl SourceKind {
    /// Ranking pages report lots, so their amounts are estimates.
    pub fn estimated(&self) -> bool {
        matches!(self, SourceKind::TrustRank { .. })
    }
}

impl Preset {
    /// Overlap options with one label per source.
    pub fn overlap_options(&self) -> OverlapOptions {
        OverlapOptions::default()
            .with_mode(self.overlap.mode)
            .with_min_appear(self.overlap.min_appear)
            .with_sort_by(self.overlap.sort_by)
            .with_labels(self.sources.iter().map(|s| s.label.clone()).collect())
    }

    fn validate(&self) -> Result<(), PresetError> {
        if self.sources.is_empty() {
            return Err(PresetError::Empty(self.name.clone()));
        }
        let invalid = |reason: String| PresetError::Invalid {
            preset: self.name.clone(),
            reason,
        };

        validation::validate_min_appear(self.overlap.min_appear).map_err(|e| invalid(e.to_string()))?;
        for source in &self.sources {
            if let SourceKind::BrokerFlow { branch, sub_branch, .. } = &source.page {
                validation::validate_branch_id(branch).map_err(|e| invalid(e.to_string()))?;
                validation::validate_branch_id(sub_branch).map_err(|e| invalid(e.to_string()))?;
            }
        }
        Ok(())
    }
}

/// Parse and validate presets from YAML content.
///
/// Names must be unique and every preset needs at least one source.
pub fn load_presets(yaml_content: &str) -> Result<Vec<Preset>, PresetError> {
    let file: PresetFile = serde_yml::from_str(yaml_content)?;

    let mut seen = HashSet::new();
    for preset in &file.presets {
        if !seen.insert(preset.name.clone()) {
            return Err(PresetError::DuplicateName(preset.name.clone()));
        }
        preset.validate()?;
    }
    Ok(file.presets)
}

/// Load the built-in presets embedded at compile time.
pub fn default_presets() -> Result<Vec<Preset>, PresetError> {
    let yaml_content = include_str!("../../seed_data/presets.yml");
    load_presets(yaml_content)
}

pub fn find_preset<'a>(presets: &'a [Preset], name: &str) -> Result<&'a Preset, PresetError> {
    presets
        .iter()
        .find(|p| p.name == name)
        .ok_or_else(|| PresetError::NotFound(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_presets_load() {
        let presets = default_presets().unwrap();
        let names: Vec<&str> = presets.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["ms-ubs-trust", "ubs-trust", "ms-trust", "fubon-xindian-trust"]
        );
        for preset in &presets {
            assert_eq!(preset.overlap.mode, OverlapMode::Max);
            assert_eq!(preset.overlap.sort_by, SortBy::Sum);
            assert!(preset.sources.iter().all(|s| s.direction == Direction::NetBuy));
            let estimated = preset.sources.iter().filter(|s| s.page.estimated()).count();
            assert_eq!(estimated, 2);
        }
    }

    #[test]
    fn builtin_broker_source_fields() {
        let presets = default_presets().unwrap();
        let fubon = find_preset(&presets, "fubon-xindian-trust").unwrap();
        assert_eq!(
            fubon.sources[0].page,
            SourceKind::BrokerFlow {
                branch: "9600".into(),
                sub_branch: "9661".into(),
                side: Some(Side::Buy),
            }
        );
        assert_eq!(fubon.sources[2].page, SourceKind::TrustRank { market: Market::Otc });
    }

    #[test]
    fn options_carry_labels() {
        let presets = default_presets().unwrap();
        let opts = find_preset(&presets, "ms-ubs-trust").unwrap().overlap_options();
        assert_eq!(opts.labels.len(), 4);
        assert_eq!(opts.labels[1], "新加坡商瑞銀");
        assert_eq!(opts.mode, OverlapMode::Max);
    }

    #[test]
    fn defaults_apply_when_omitted() {
        let yaml = r#"
presets:
  - name: solo
    title: solo
    sources:
      - label: a
        direction: sell
        page: { kind: broker_flow, branch: "1470", sub_branch: "1470" }
      - label: b
        page: { kind: trust_rank }
"#;
        let presets = load_presets(yaml).unwrap();
        let preset = &presets[0];
        assert_eq!(preset.overlap, OverlapSettings::default());
        assert_eq!(preset.sources[0].direction, Direction::NetSell);
        assert_eq!(
            preset.sources[0].page,
            SourceKind::BrokerFlow { branch: "1470".into(), sub_branch: "1470".into(), side: None }
        );
        assert_eq!(preset.sources[1].page, SourceKind::TrustRank { market: Market::Listed });
    }

    #[test]
    fn duplicate_names_rejected() {
        let yaml = r#"
presets:
  - name: dup
    title: a
    sources: [{ label: x, page: { kind: trust_rank } }]
  - name: dup
    title: b
    sources: [{ label: y, page: { kind: trust_rank } }]
"#;
        assert!(matches!(load_presets(yaml), Err(PresetError::DuplicateName(n)) if n == "dup"));
    }

    #[test]
    fn empty_sources_rejected() {
        let yaml = "presets:\n  - name: none\n    title: none\n    sources: []\n";
        assert!(matches!(load_presets(yaml), Err(PresetError::Empty(_))));
    }

    #[test]
    fn bad_branch_rejected() {
        let yaml = r#"
presets:
  - name: bad
    title: bad
    sources: [{ label: x, page: { kind: broker_flow, branch: "14 70", sub_branch: "1470" } }]
"#;
        assert!(matches!(load_presets(yaml), Err(PresetError::Invalid { .. })));
    }

    #[test]
    fn unknown_preset() {
        let presets = default_presets().unwrap();
        assert!(matches!(find_preset(&presets, "nope"), Err(PresetError::NotFound(_))));
    }

    #[test]
    fn malformed_yaml() {
        assert!(matches!(load_presets("presets: [ {"), Err(PresetError::YamlParse(_))));
    }
}
