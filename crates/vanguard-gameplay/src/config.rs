//! Gameplay configuration.
//!
//! Base stats, item definitions and the stomp detector, loaded from a RON
//! file.

use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};
use vanguard_common::ConfigError;

use crate::inventory::ItemData;
use crate::registry::StompDetector;
use crate::stats::BaseStats;

/// Gameplay configuration parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameplayConfig {
    /// Player base stats.
    pub base_stats: BaseStats,
    /// Item definitions.
    pub items: Vec<ItemData>,
    /// Detector published by stomp effects.
    pub stomp_detector: StompDetector,
}

impl GameplayConfig {
    /// Parses a config from RON text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed input.
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        ron::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Loads and validates a config file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or parsed, or fails validation.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let mut config = Self::from_ron_str(&text)?;
        config.validate()?;
        info!(
            "Loaded gameplay config from {} ({} items)",
            path.display(),
            config.items.len()
        );
        Ok(config)
    }

    /// Loads a config file, falling back to defaults on any error.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            info!("Gameplay config {} not found, using defaults", path.display());
            return Self::default();
        }
        match Self::load_from(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("Failed to load gameplay config: {e}");
                Self::default()
            },
        }
    }

    /// Saves the config as pretty RON.
    ///
    /// # Errors
    ///
    /// Fails if the config cannot be serialized or written.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let text = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;
        fs::write(path, text)?;
        info!("Saved gameplay config to {}", path.display());
        Ok(())
    }

    /// Clamps values to sensible ranges and rejects unusable definitions.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for duplicate item ids or effect
    /// tuning no effect can use.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        self.base_stats.clamp();

        self.stomp_detector.radius = self.stomp_detector.radius.max(0.0);
        self.stomp_detector.min_fall_speed = self.stomp_detector.min_fall_speed.max(0.0);
        self.stomp_detector.cooldown = self.stomp_detector.cooldown.max(0.0);

        let mut seen = AHashSet::new();
        for item in &mut self.items {
            if !seen.insert(item.id) {
                return Err(ConfigError::Invalid {
                    field: "items".to_string(),
                    reason: format!("duplicate item id {}", item.id.raw()),
                });
            }
            item.max_stacks = item.max_stacks.max(1);
            for effect in &item.effects {
                effect.params.validate().map_err(|e| ConfigError::Invalid {
                    field: format!("items[{}].effects", item.name),
                    reason: e.to_string(),
                })?;
            }
        }
        Ok(())
    }

    /// Item definition by name.
    #[must_use]
    pub fn item(&self, name: &str) -> Option<&ItemData> {
        self.items.iter().find(|i| i.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::{EffectParams, EffectSpec};
    use crate::dot::DotSpec;
    use tempfile::TempDir;
    use vanguard_common::ItemId;

    const SAMPLE: &str = r#"(
        base_stats: (health: 150.0, move_speed: 9.0),
        items: [
            (
                id: 1,
                name: "Vampire Fang",
                rarity: Uncommon,
                effects: [(params: HealOnDamage(FlatPerStack(amount_per_stack: 2.0)))],
            ),
            (
                id: 2,
                name: "Boots",
                stat_mods: [(stat: MoveSpeed, operator: Percentage, value: 0.1, duration: 10.0)],
            ),
        ],
    )"#;

    #[test]
    fn test_shipped_content_is_valid() {
        let mut config =
            GameplayConfig::from_ron_str(include_str!("../../../content/gameplay.ron"))
                .expect("parse shipped content");
        config.validate().expect("valid shipped content");
        assert_eq!(config.items.len(), 8);
        let boots = config.item("Anvil Boots").expect("boots");
        assert_eq!(boots.effects.len(), 2);
    }

    #[test]
    fn test_default_config() {
        let config = GameplayConfig::default();
        assert!(config.items.is_empty());
        assert_eq!(config.stomp_detector, StompDetector::default());
    }

    #[test]
    fn test_parse_sample() {
        let config = GameplayConfig::from_ron_str(SAMPLE).expect("parse sample");
        assert_eq!(config.base_stats.health, 150.0);
        assert_eq!(config.items.len(), 2);
        let boots = config.item("Boots").expect("boots");
        assert_eq!(boots.stat_mods[0].duration, 10.0);
        assert!(config.item("Missing").is_none());
    }

    #[test]
    fn test_config_save_load() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("nested").join("gameplay.ron");

        let mut config = GameplayConfig::from_ron_str(SAMPLE).expect("parse sample");
        config.stomp_detector.cooldown = 0.5;
        config.save_to(&path).expect("Failed to save config");

        let loaded = GameplayConfig::load_from(&path).expect("Failed to load config");
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_validation_clamps() {
        let mut config = GameplayConfig::default();
        config.base_stats.health = -5.0;
        config.stomp_detector.cooldown = -1.0;
        config.items.push(ItemData {
            max_stacks: 0,
            ..ItemData::default()
        });
        config.validate().expect("valid config");
        assert!(config.base_stats.health >= 1.0);
        assert_eq!(config.stomp_detector.cooldown, 0.0);
        assert_eq!(config.items[0].max_stacks, 1);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut config = GameplayConfig::default();
        config.items.push(ItemData::default());
        config.items.push(ItemData {
            id: ItemId::new(0),
            name: "Copy".to_string(),
            ..ItemData::default()
        });
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field, .. }) if field == "items"
        ));
    }

    #[test]
    fn test_bad_effect_rejected() {
        let mut config = GameplayConfig::default();
        config.items.push(ItemData {
            effects: vec![EffectSpec::permanent(EffectParams::DotOnHit(DotSpec {
                tick_interval: 0.0,
                ..DotSpec::default()
            }))],
            ..ItemData::default()
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let config = GameplayConfig::load_or_default("/nonexistent/path/gameplay.ron");
        assert_eq!(config, GameplayConfig::default());
        assert!(matches!(
            GameplayConfig::load_from("/nonexistent/path/gameplay.ron"),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_load_malformed_falls_back() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("broken.ron");
        fs::write(&path, "(items: [").expect("write file");
        assert_eq!(GameplayConfig::load_or_default(&path), GameplayConfig::default());
    }
}
