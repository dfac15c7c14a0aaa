//! Arena behavior attributes.
//!
//! The scripted arena exposes named attributes. The bridge reads two of them
//! once at startup to pick walking and turning gains.

use std::{collections::HashMap, path::Path};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::transform::GainPair;

pub const TURNING_GAIN_ATTR: &str = "turningGain";
pub const WALKING_GAIN_ATTR: &str = "walkingGain";

/// Host scripted arena behavior.
pub trait ArenaScript {
    /// Arena name, used when assigning the scene to viewers.
    fn name(&self) -> &str;
    /// Returns an attribute value, `None` when undefined.
    fn attribute(&self, name: &str) -> Option<&Value>;
}

/// Arena attributes loaded from a JSON object file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArenaAttributes {
    #[serde(default = "default_arena_name")]
    pub name: String,
    #[serde(default)]
    pub attributes: HashMap<String, Value>,
}

fn default_arena_name() -> String {
    "Arena".to_string()
}

impl Default for ArenaAttributes {
    fn default() -> Self {
        Self {
            name: default_arena_name(),
            attributes: HashMap::new(),
        }
    }
}

impl ArenaAttributes {
    pub fn from_json_str(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read arena script {}", path.display()))?;
        let arena = Self::from_json_str(&text)
            .with_context(|| format!("parse arena script {}", path.display()))?;
        debug!(arena = %arena.name, attributes = arena.attributes.len(), "Arena loaded");
        Ok(arena)
    }
}

impl ArenaScript for ArenaAttributes {
    fn name(&self) -> &str {
        &self.name
    }

    fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }
}

/// Reads a numeric attribute. Null, missing and non-numeric values count as
/// empty.
fn numeric_attribute(arena: &dyn ArenaScript, name: &str) -> Option<f32> {
    arena.attribute(name).and_then(Value::as_f64).map(|v| v as f32)
}

impl GainPair {
    /// Overrides `defaults` with whatever gains the arena defines.
    pub fn resolve(arena: &dyn ArenaScript, defaults: GainPair) -> GainPair {
        let gains = GainPair {
            walk: numeric_attribute(arena, WALKING_GAIN_ATTR).unwrap_or(defaults.walk),
            turn: numeric_attribute(arena, TURNING_GAIN_ATTR).unwrap_or(defaults.turn),
        };
        info!(
            arena = %arena.name(),
            turning = gains.turn,
            walking = gains.walk,
            "Resolved arena gains"
        );
        gains
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defined_gains_override_defaults() {
        let arena = ArenaAttributes::from_json_str(
            r#"{ "name": "Linear", "attributes": { "turningGain": 0.25, "walkingGain": 2 } }"#,
        )
        .unwrap();
        let gains = GainPair::resolve(&arena, GainPair::default());
        assert_eq!(gains, GainPair { walk: 2.0, turn: 0.25 });
        assert_eq!(arena.name(), "Linear");
    }

    #[test]
    fn empty_or_missing_gains_keep_defaults() {
        let arena = ArenaAttributes::from_json_str(
            r#"{ "attributes": { "turningGain": null, "walkingGain": "" } }"#,
        )
        .unwrap();
        let defaults = GainPair { walk: 0.7, turn: 1.3 };
        assert_eq!(GainPair::resolve(&arena, defaults), defaults);
        assert_eq!(arena.name(), "Arena");
    }
}
