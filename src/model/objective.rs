//! Objective-function file: the target reaction set for flux-based selection.
//!
//! Plain text, one header line followed by `reaction_id weight` rows. Every
//! identifier must resolve against the network's reaction table.

use std::path::Path;

use crate::SimError;

/// Ordered target set: `(reaction arena index, weight)`.
#[derive(Debug, Clone, Default)]
pub struct ObjectiveFunction {
    pub targets: Vec<(usize, f64)>,
}

impl ObjectiveFunction {
    /// Load and resolve against the reaction name→index map.
    pub fn from_file(
        path: &Path,
        reaction_index: &std::collections::HashMap<String, usize>,
    ) -> Result<Self, SimError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            SimError::Config(format!(
                "cannot read objective file '{}': {e}",
                path.display()
            ))
        })?;
        let mut targets = Vec::new();
        // First non-empty line is the header.
        for line in text.lines().skip_while(|l| l.trim().is_empty()).skip(1) {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let mut fields = line.split_whitespace();
            let id = fields.next().unwrap_or_default();
            let weight: f64 = fields
                .next()
                .ok_or_else(|| {
                    SimError::Config(format!("objective row '{line}' is missing a weight"))
                })?
                .parse()
                .map_err(|_| {
                    SimError::Config(format!("objective row '{line}' has a non-numeric weight"))
                })?;
            let index = *reaction_index.get(id).ok_or_else(|| {
                SimError::Config(format!("objective references unknown reaction '{id}'"))
            })?;
            targets.push((index, weight));
        }
        Ok(Self { targets })
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }
}
