//! Serializable view of a loaded policy for inspection and export.

use serde::{Deserialize, Serialize};

use super::info::PolicyInfo;
use super::store::{AlphaVector, AlphaVectorSet};
use ap_common::Result;

/// Full JSON-friendly dump of a policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyExport {
    pub info: PolicyInfo,
    pub vectors: Vec<AlphaVector>,
}

impl PolicyExport {
    pub fn new(set: &AlphaVectorSet, info: PolicyInfo) -> Self {
        PolicyExport {
            info,
            vectors: set.to_vectors(),
        }
    }

    /// Rebuild the vector set from an export.
    pub fn into_set(self) -> Result<AlphaVectorSet> {
        Ok(AlphaVectorSet::new(self.info.dimension, self.vectors)?.with_model(self.info.model))
    }

    /// Markdown table of the vectors, one row each.
    ///
    /// Coefficient lists longer than `max_coefficients` are elided.
    pub fn to_markdown(&self, max_coefficients: usize) -> String {
        let mut out = String::new();
        out.push_str("| # | action | obs | coefficients |\n");
        out.push_str("|---|--------|-----|--------------|\n");
        for (i, v) in self.vectors.iter().enumerate() {
            let obs = v
                .observable_state
                .map(|s| s.to_string())
                .unwrap_or_else(|| "-".to_string());
            let shown: Vec<String> = v
                .coefficients
                .iter()
                .take(max_coefficients)
                .map(|c| format!("{}", c))
                .collect();
            let mut coeffs = shown.join(" ");
            if v.coefficients.len() > max_coefficients {
                coeffs.push_str(&format!(" … (+{})", v.coefficients.len() - max_coefficients));
            }
            out.push_str(&format!("| {} | {} | {} | {} |\n", i, v.action, obs, coeffs));
        }
        out
    }
}
