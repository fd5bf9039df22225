//! On-disk network description.
//!
//! TOML tables for species, kinetic parameters, and reactions. Structural
//! fields (identifiers, names, constant flags, kinetic laws) are read-only for
//! the whole run; only `initial` and `value` fields are rewritten before each
//! solver invocation.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::SimError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeciesDef {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Boundary species hold their value; only non-constant species evolve.
    #[serde(default)]
    pub constant: bool,
    pub initial: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterDef {
    pub id: String,
    /// Owning reaction for local parameters; `None` for globals.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reaction: Option<String>,
    pub value: f64,
}

impl ParameterDef {
    /// Unique key: `"id"` for globals, `"reaction.id"` for locals.
    pub fn key(&self) -> String {
        match &self.reaction {
            Some(r) => format!("{r}.{}", self.id),
            None => self.id.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactionDef {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Rate expression, passed through to the solver uninterpreted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kinetic_law: Option<String>,
}

/// The full serializable network, in file order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkDescription {
    #[serde(default)]
    pub species: Vec<SpeciesDef>,
    #[serde(default)]
    pub parameters: Vec<ParameterDef>,
    #[serde(default)]
    pub reactions: Vec<ReactionDef>,
}

impl NetworkDescription {
    pub fn from_file(path: &Path) -> Result<Self, SimError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            SimError::Config(format!("cannot read network file '{}': {e}", path.display()))
        })?;
        let mut network: NetworkDescription = toml::from_str(&text).map_err(|e| {
            SimError::Config(format!("invalid network file '{}': {e}", path.display()))
        })?;
        network.fill_names();
        network.validate()?;
        Ok(network)
    }

    /// Serialize with current instance values for the solver.
    pub fn to_toml(&self) -> Result<String, SimError> {
        toml::to_string_pretty(self)
            .map_err(|e| SimError::Consistency(format!("network serialization failed: {e}")))
    }

    fn fill_names(&mut self) {
        for sp in &mut self.species {
            if sp.name.is_empty() {
                sp.name = sp.id.clone();
            }
        }
        for rx in &mut self.reactions {
            if rx.name.is_empty() {
                rx.name = rx.id.clone();
            }
        }
    }

    fn validate(&self) -> Result<(), SimError> {
        if self.species.is_empty() {
            return Err(SimError::Config("network declares no species".into()));
        }
        if self.reactions.is_empty() {
            return Err(SimError::Config("network declares no reactions".into()));
        }
        let mut seen = std::collections::HashSet::new();
        for sp in &self.species {
            if !seen.insert(sp.id.clone()) {
                return Err(SimError::Config(format!("duplicate species id '{}'", sp.id)));
            }
        }
        seen.clear();
        for rx in &self.reactions {
            if !seen.insert(rx.id.clone()) {
                return Err(SimError::Config(format!("duplicate reaction id '{}'", rx.id)));
            }
        }
        seen.clear();
        for p in &self.parameters {
            if !seen.insert(p.key()) {
                return Err(SimError::Config(format!("duplicate parameter '{}'", p.key())));
            }
            if let Some(r) = &p.reaction {
                if !self.reactions.iter().any(|rx| &rx.id == r) {
                    return Err(SimError::Config(format!(
                        "parameter '{}' references unknown reaction '{r}'",
                        p.id
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[[species]]
id = "Glc"
initial = 1.0

[[species]]
id = "Ext"
constant = true
initial = 5.0

[[parameters]]
id = "Vmax"
reaction = "vHk"
value = 2.0

[[parameters]]
id = "kGlobal"
value = 0.3

[[reactions]]
id = "vHk"
kinetic_law = "Vmax * Glc / (Km + Glc)"
"#;

    #[test]
    fn loads_and_round_trips() {
        let mut network: NetworkDescription = toml::from_str(SAMPLE).unwrap();
        network.fill_names();
        network.validate().unwrap();
        assert_eq!(network.species[0].name, "Glc");
        assert!(network.species[1].constant);
        assert_eq!(network.parameters[0].key(), "vHk.Vmax");
        assert_eq!(network.parameters[1].key(), "kGlobal");

        let text = network.to_toml().unwrap();
        let again: NetworkDescription = toml::from_str(&text).unwrap();
        assert_eq!(again.parameters[0].value, 2.0);
    }

    #[test]
    fn rejects_unknown_reaction_reference() {
        let mut network: NetworkDescription = toml::from_str(SAMPLE).unwrap();
        network.parameters[0].reaction = Some("vMissing".into());
        assert!(network.validate().is_err());
    }

    #[test]
    fn rejects_duplicate_parameter_keys() {
        let mut network: NetworkDescription = toml::from_str(SAMPLE).unwrap();
        let dup = network.parameters[1].clone();
        network.parameters.push(dup);
        assert!(network.validate().is_err());
    }
}
