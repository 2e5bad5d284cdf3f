//! Belief maintenance for discrete models.
//!
//! A belief is a probability vector over hidden states. After taking action
//! `a` and observing `o`, the discrete Bayes filter gives
//!
//!   b'(s') ∝ O(o | s', a) · Σ_s T(s' | s, a) · b(s)
//!
//! Actions use the same one-based numbering as
//! [`PolicyHandle::action`](crate::policy::PolicyHandle::action), so the
//! value returned by a query can be fed straight back into [`BeliefUpdater::update`].
//! Observations are zero-based, as in the model file.

use ap_common::{Error, Result};
use ap_math::{is_distribution, normalize, uniform, DEFAULT_MASS_TOLERANCE};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::trace;

use crate::logging::{event_names, Stage};
use crate::policy::ACTION_INDEX_OFFSET;

/// Maintains beliefs for one model.
pub trait BeliefUpdater: Send + Sync {
    /// Number of hidden states.
    fn dimension(&self) -> usize;

    /// Starting belief: `prior` normalized, or uniform when absent.
    fn initialize(&self, prior: Option<&[f64]>) -> Result<Vec<f64>>;

    /// Posterior after taking one-based `action` and seeing `observation`.
    fn update(&self, belief: &[f64], action: u32, observation: u32) -> Result<Vec<f64>>;
}

/// On-disk form of [`DiscreteDynamics`].
///
/// `transition[a][s][s']` and `observation[a][s'][o]`, with `a` zero-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DynamicsTables {
    pub transition: Vec<Vec<Vec<f64>>>,
    pub observation: Vec<Vec<Vec<f64>>>,
}

/// Validated transition and observation tables, stored flat.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscreteDynamics {
    states: usize,
    actions: usize,
    observations: usize,
    /// `[a][s][s']`
    transition: Vec<f64>,
    /// `[a][s'][o]`
    observation: Vec<f64>,
}

fn invalid(reason: String) -> Error {
    Error::BeliefUpdate(format!("invalid dynamics: {}", reason))
}

impl DiscreteDynamics {
    /// Validate and flatten the tables.
    ///
    /// Every action needs an `S × S` transition matrix and an `S × O`
    /// observation matrix whose rows are probability distributions.
    pub fn new(tables: DynamicsTables) -> Result<Self> {
        let actions = tables.transition.len();
        if actions == 0 {
            return Err(invalid("no actions".to_string()));
        }
        if tables.observation.len() != actions {
            return Err(invalid(format!(
                "{} transition matrices but {} observation matrices",
                actions,
                tables.observation.len()
            )));
        }
        let states = tables.transition[0].len();
        if states == 0 {
            return Err(invalid("no states".to_string()));
        }
        let observations = tables.observation[0].first().map_or(0, Vec::len);
        if observations == 0 {
            return Err(invalid("no observations".to_string()));
        }

        let mut transition = Vec::with_capacity(actions * states * states);
        let mut observation = Vec::with_capacity(actions * states * observations);

        for (a, matrix) in tables.transition.iter().enumerate() {
            check_matrix("transition", a, matrix, states, states)?;
            matrix.iter().for_each(|row| transition.extend_from_slice(row));
        }
        for (a, matrix) in tables.observation.iter().enumerate() {
            check_matrix("observation", a, matrix, states, observations)?;
            matrix.iter().for_each(|row| observation.extend_from_slice(row));
        }

        Ok(DiscreteDynamics {
            states,
            actions,
            observations,
            transition,
            observation,
        })
    }

    /// Load tables from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let tables: DynamicsTables = serde_json::from_str(&content)?;
        Self::new(tables)
    }

    pub fn states(&self) -> usize {
        self.states
    }

    pub fn actions(&self) -> usize {
        self.actions
    }

    pub fn observations(&self) -> usize {
        self.observations
    }

    /// `T(s' | s, a)` with zero-based `a`.
    pub fn transition(&self, a: usize, s: usize, s_next: usize) -> f64 {
        self.transition[(a * self.states + s) * self.states + s_next]
    }

    /// `O(o | s', a)` with zero-based `a`.
    pub fn observation(&self, a: usize, s_next: usize, o: usize) -> f64 {
        self.observation[(a * self.states + s_next) * self.observations + o]
    }

    /// Back to nested tables.
    pub fn to_tables(&self) -> DynamicsTables {
        let nest = |flat: &[f64], cols: usize| -> Vec<Vec<Vec<f64>>> {
            flat.chunks(self.states * cols)
                .map(|m| m.chunks(cols).map(<[f64]>::to_vec).collect())
                .collect()
        };
        DynamicsTables {
            transition: nest(&self.transition, self.states),
            observation: nest(&self.observation, self.observations),
        }
    }
}

fn check_matrix(
    kind: &str,
    action: usize,
    matrix: &[Vec<f64>],
    rows: usize,
    cols: usize,
) -> Result<()> {
    if matrix.len() != rows {
        return Err(invalid(format!(
            "{} matrix for action {} has {} rows, expected {}",
            kind,
            action,
            matrix.len(),
            rows
        )));
    }
    for (r, row) in matrix.iter().enumerate() {
        if row.len() != cols {
            return Err(invalid(format!(
                "{} row {} for action {} has {} entries, expected {}",
                kind,
                r,
                action,
                row.len(),
                cols
            )));
        }
        if !is_distribution(row, DEFAULT_MASS_TOLERANCE) {
            return Err(invalid(format!(
                "{} row {} for action {} is not a probability distribution",
                kind, r, action
            )));
        }
    }
    Ok(())
}

/// Bayes filter over [`DiscreteDynamics`].
#[derive(Debug, Clone)]
pub struct DiscreteUpdater {
    dynamics: std::sync::Arc<DiscreteDynamics>,
}

impl DiscreteUpdater {
    pub fn new(dynamics: std::sync::Arc<DiscreteDynamics>) -> Self {
        DiscreteUpdater { dynamics }
    }

    pub fn dynamics(&self) -> &DiscreteDynamics {
        &self.dynamics
    }

    fn check_belief(&self, belief: &[f64]) -> Result<()> {
        if belief.len() != self.dynamics.states {
            return Err(Error::Dimension {
                expected: self.dynamics.states,
                actual: belief.len(),
            });
        }
        Ok(())
    }
}

impl BeliefUpdater for DiscreteUpdater {
    fn dimension(&self) -> usize {
        self.dynamics.states
    }

    fn initialize(&self, prior: Option<&[f64]>) -> Result<Vec<f64>> {
        match prior {
            None => Ok(uniform(self.dynamics.states)),
            Some(p) => {
                self.check_belief(p)?;
                if p.iter().any(|v| !v.is_finite() || *v < 0.0) {
                    return Err(Error::BeliefUpdate(
                        "prior entries must be finite and non-negative".to_string(),
                    ));
                }
                normalize(p)
                    .ok_or_else(|| Error::BeliefUpdate("prior has zero total mass".to_string()))
            }
        }
    }

    fn update(&self, belief: &[f64], action: u32, observation: u32) -> Result<Vec<f64>> {
        self.check_belief(belief)?;
        let d = &*self.dynamics;

        let a = action
            .checked_sub(ACTION_INDEX_OFFSET)
            .map(|a| a as usize)
            .filter(|&a| a < d.actions)
            .ok_or_else(|| {
                Error::BeliefUpdate(format!(
                    "action {} is outside 1..={}",
                    action, d.actions
                ))
            })?;
        let o = observation as usize;
        if o >= d.observations {
            return Err(Error::BeliefUpdate(format!(
                "observation {} is outside 0..{}",
                observation, d.observations
            )));
        }

        let weighted: Vec<f64> = (0..d.states)
            .map(|s_next| {
                let predicted: f64 = belief
                    .iter()
                    .enumerate()
                    .map(|(s, b)| d.transition(a, s, s_next) * b)
                    .sum();
                d.observation(a, s_next, o) * predicted
            })
            .collect();

        let posterior = normalize(&weighted).ok_or_else(|| {
            Error::BeliefUpdate(format!(
                "observation {} has zero probability after action {}",
                observation, action
            ))
        })?;

        trace!(
            target: event_names::BELIEF_UPDATED,
            stage = %Stage::Update,
            action,
            observation,
            "belief updated"
        );
        Ok(posterior)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    /// Tiger problem: states (left, right), actions (listen, open-left,
    /// open-right), observations (hear-left, hear-right).
    fn tiger_tables() -> DynamicsTables {
        let stay = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        let reset = vec![vec![0.5, 0.5], vec![0.5, 0.5]];
        let hear = vec![vec![0.85, 0.15], vec![0.15, 0.85]];
        let blind = vec![vec![0.5, 0.5], vec![0.5, 0.5]];
        DynamicsTables {
            transition: vec![stay, reset.clone(), reset],
            observation: vec![hear, blind.clone(), blind],
        }
    }

    fn updater() -> DiscreteUpdater {
        DiscreteUpdater::new(Arc::new(DiscreteDynamics::new(tiger_tables()).unwrap()))
    }

    #[test]
    fn listen_shifts_belief() {
        let b = updater().update(&[0.5, 0.5], 1, 0).unwrap();
        assert!((b[0] - 0.85).abs() < 1e-12);
        assert!((b[1] - 0.15).abs() < 1e-12);
    }

    #[test]
    fn repeated_listening_compounds() {
        let u = updater();
        let b1 = u.update(&[0.5, 0.5], 1, 0).unwrap();
        let b2 = u.update(&b1, 1, 0).unwrap();
        let expected = 0.85 * 0.85 / (0.85 * 0.85 + 0.15 * 0.15);
        assert!((b2[0] - expected).abs() < 1e-12);
    }

    #[test]
    fn opening_resets() {
        let b = updater().update(&[0.9, 0.1], 2, 1).unwrap();
        assert!((b[0] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn action_zero_rejected() {
        let err = updater().update(&[0.5, 0.5], 0, 0).unwrap_err();
        assert!(matches!(err, Error::BeliefUpdate(_)));
        assert!(updater().update(&[0.5, 0.5], 4, 0).is_err());
    }

    #[test]
    fn observation_out_of_range() {
        assert!(updater().update(&[0.5, 0.5], 1, 2).is_err());
    }

    #[test]
    fn impossible_observation() {
        let mut tables = tiger_tables();
        tables.observation[0] = vec![vec![1.0, 0.0], vec![1.0, 0.0]];
        let u = DiscreteUpdater::new(Arc::new(DiscreteDynamics::new(tables).unwrap()));
        let err = u.update(&[0.5, 0.5], 1, 1).unwrap_err();
        assert!(err.to_string().contains("zero probability"));
    }

    #[test]
    fn wrong_belief_length() {
        let err = updater().update(&[1.0], 1, 0).unwrap_err();
        assert!(matches!(err, Error::Dimension { expected: 2, actual: 1 }));
    }

    #[test]
    fn initialize_defaults_to_uniform() {
        assert_eq!(updater().initialize(None).unwrap(), vec![0.5, 0.5]);
        assert_eq!(updater().initialize(Some(&[2.0, 6.0])).unwrap(), vec![0.25, 0.75]);
        assert!(updater().initialize(Some(&[0.0, 0.0])).is_err());
        assert!(updater().initialize(Some(&[-1.0, 2.0])).is_err());
    }

    #[test]
    fn rejects_bad_rows() {
        let mut tables = tiger_tables();
        tables.transition[1][0] = vec![0.5, 0.6];
        assert!(DiscreteDynamics::new(tables).is_err());

        let mut tables = tiger_tables();
        tables.observation[2][1] = vec![1.0];
        assert!(DiscreteDynamics::new(tables).is_err());

        let mut tables = tiger_tables();
        tables.observation.pop();
        assert!(DiscreteDynamics::new(tables).is_err());
    }

    #[test]
    fn tables_roundtrip() {
        let d = DiscreteDynamics::new(tiger_tables()).unwrap();
        assert_eq!(d.to_tables(), tiger_tables());
        assert_eq!(d.transition(0, 1, 1), 1.0);
        assert_eq!(d.observation(0, 0, 1), 0.15);
    }

    #[test]
    fn loads_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiger.dynamics.json");
        std::fs::write(&path, serde_json::to_string(&tiger_tables()).unwrap()).unwrap();
        let d = DiscreteDynamics::from_json_file(&path).unwrap();
        assert_eq!(d.states(), 2);
        assert_eq!(d.actions(), 3);
        assert_eq!(d.observations(), 2);

        std::fs::write(&path, "{\"transition\": [}").unwrap();
        assert!(matches!(
            DiscreteDynamics::from_json_file(&path).unwrap_err(),
            Error::Json(_)
        ));
    }
}
