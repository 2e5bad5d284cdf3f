//! Alpha-vector store.
//!
//! An [`AlphaVectorSet`] is the solver's value function in piecewise-linear
//! form: `N` coefficient vectors of length `S`, each tagged with the action
//! it recommends and, for observable-state policies, the fully observed
//! state it applies to. Coefficients are stored row-major in one buffer and
//! keep the order in which they were loaded, since tie-breaking during action
//! selection depends on that order.
//!
//! Sets are immutable once built. The only constructors are
//! [`AlphaVectorSet::new`] and the policy file readers, and both validate
//! every vector against the set's dimension.

use ap_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::handle::ACTION_INDEX_OFFSET;
use super::info::PolicyInfo;
use super::parser::parse_policy;

/// Location reported for sets built in memory.
const IN_MEMORY: &str = "<in-memory alpha vector set>";

/// One alpha vector with its tags, as handed to [`AlphaVectorSet::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlphaVector {
    /// Zero-based action index recommended where this vector is maximal.
    pub action: u32,
    /// Observable state this vector applies to, zero-based as written by the
    /// solver. `None` for plain POMDP policies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observable_state: Option<u32>,
    /// Coefficients, one per hidden state.
    pub coefficients: Vec<f64>,
}

impl AlphaVector {
    pub fn new(action: u32, coefficients: Vec<f64>) -> Self {
        AlphaVector {
            action,
            observable_state: None,
            coefficients,
        }
    }

    /// Tag the vector with an observable state.
    pub fn observed(mut self, state: u32) -> Self {
        self.observable_state = Some(state);
        self
    }
}

/// Borrowed view of one stored vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlphaVectorRef<'a> {
    /// Position in load order.
    pub index: usize,
    pub action: u32,
    pub observable_state: Option<u32>,
    pub coefficients: &'a [f64],
}

/// An immutable, validated set of alpha vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct AlphaVectorSet {
    dimension: usize,
    actions: Vec<u32>,
    /// Present only when every vector carries an observable-state tag.
    observable_states: Option<Vec<u32>>,
    coefficients: Vec<f64>,
    model: Option<String>,
}

impl AlphaVectorSet {
    /// Build a set from vectors in the given order.
    ///
    /// Every vector must have exactly `dimension` coefficients, and either
    /// all vectors carry an observable-state tag or none do. Actions must
    /// still fit in a `u32` once shifted to their one-based form.
    pub fn new(dimension: usize, vectors: Vec<AlphaVector>) -> Result<Self> {
        Self::build(dimension, vectors, IN_MEMORY)
    }

    /// A set with no vectors. Every query on it fails with
    /// [`Error::PolicyEmpty`].
    pub fn empty(dimension: usize) -> Self {
        AlphaVectorSet {
            dimension,
            actions: Vec::new(),
            observable_states: None,
            coefficients: Vec::new(),
            model: None,
        }
    }

    pub(crate) fn build(
        dimension: usize,
        vectors: Vec<AlphaVector>,
        location: &str,
    ) -> Result<Self> {
        let tagged = vectors.first().map(|v| v.observable_state.is_some());
        let mut actions = Vec::with_capacity(vectors.len());
        let mut states = Vec::with_capacity(vectors.len());
        let mut coefficients =
            Vec::with_capacity(vectors.iter().map(|v| v.coefficients.len()).sum());

        for (i, v) in vectors.into_iter().enumerate() {
            if v.coefficients.len() != dimension {
                return Err(Error::format(
                    location,
                    format!(
                        "vector {} has {} coefficients, expected {}",
                        i,
                        v.coefficients.len(),
                        dimension
                    ),
                ));
            }
            if v.action.checked_add(ACTION_INDEX_OFFSET).is_none() {
                return Err(Error::format(
                    location,
                    format!(
                        "vector {}: action {} has no one-based form",
                        i, v.action
                    ),
                ));
            }
            match (tagged, v.observable_state) {
                (Some(true), Some(s)) => states.push(s),
                (Some(false), None) => {}
                _ => {
                    return Err(Error::format(
                        location,
                        format!(
                            "vector {} disagrees with vector 0 on carrying an observable state",
                            i
                        ),
                    ))
                }
            }
            actions.push(v.action);
            coefficients.extend_from_slice(&v.coefficients);
        }

        Ok(AlphaVectorSet {
            dimension,
            actions,
            observable_states: (tagged == Some(true)).then_some(states),
            coefficients,
            model: None,
        })
    }

    /// Record the model name declared by the policy document.
    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    /// Parse a policy file.
    ///
    /// Fails with [`Error::Format`] if the file cannot be read or is not a
    /// well-formed policy document. Reading the file is the only side
    /// effect.
    pub fn load(path: &Path) -> Result<Self> {
        Self::load_with_info(path).map(|(set, _)| set)
    }

    /// Parse a policy file and describe where it came from.
    pub fn load_with_info(path: &Path) -> Result<(Self, PolicyInfo)> {
        let location = path.display().to_string();
        let bytes = std::fs::read(path)
            .map_err(|e| Error::format(&location, format!("cannot read file: {}", e)))?;
        let set = parse_policy(&decode(&bytes), &location)?;
        let info = PolicyInfo::describe(&set, Some(path), Some(&bytes));
        Ok((set, info))
    }

    /// Parse a policy document held in memory.
    pub fn from_xml_str(text: &str) -> Result<Self> {
        parse_policy(text, "<string>")
    }

    /// Number of coefficients per vector (`S`).
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of vectors (`N`).
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Whether vectors carry observable-state tags, which is what makes
    /// observed-state queries meaningful.
    pub fn supports_observed(&self) -> bool {
        self.observable_states.is_some()
    }

    /// Model name declared in the policy document, if any.
    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    /// Vector `index` in load order.
    pub fn get(&self, index: usize) -> Option<AlphaVectorRef<'_>> {
        let action = *self.actions.get(index)?;
        Some(AlphaVectorRef {
            index,
            action,
            observable_state: self.observable_state(index),
            coefficients: self.row(index),
        })
    }

    /// All vectors in load order.
    pub fn iter(&self) -> impl Iterator<Item = AlphaVectorRef<'_>> + '_ {
        (0..self.len()).filter_map(move |i| self.get(i))
    }

    /// Coefficient rows in load order.
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        (0..self.len()).map(move |i| self.row(i))
    }

    fn row(&self, index: usize) -> &[f64] {
        let start = index * self.dimension;
        &self.coefficients[start..start + self.dimension]
    }

    /// Zero-based action of vector `index`.
    pub fn action(&self, index: usize) -> Option<u32> {
        self.actions.get(index).copied()
    }

    /// Observable-state tag of vector `index`.
    pub fn observable_state(&self, index: usize) -> Option<u32> {
        self.observable_states.as_ref()?.get(index).copied()
    }

    /// Distinct actions in ascending order.
    pub fn distinct_actions(&self) -> Vec<u32> {
        let mut actions = self.actions.clone();
        actions.sort_unstable();
        actions.dedup();
        actions
    }

    /// Distinct observable states in ascending order; empty when untagged.
    pub fn observable_states(&self) -> Vec<u32> {
        let mut states = self.observable_states.clone().unwrap_or_default();
        states.sort_unstable();
        states.dedup();
        states
    }

    /// Owned copies of all vectors in load order.
    pub fn to_vectors(&self) -> Vec<AlphaVector> {
        self.iter()
            .map(|v| AlphaVector {
                action: v.action,
                observable_state: v.observable_state,
                coefficients: v.coefficients.to_vec(),
            })
            .collect()
    }
}

/// Decode policy file bytes.
///
/// Solver output declares ISO-8859-1; anything that is not valid UTF-8 is
/// read as Latin-1, where every byte is its own code point.
fn decode(bytes: &[u8]) -> String {
    let text = match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    };
    match text.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::PolicyHandle;
    use crate::Model;

    fn two_by_two() -> AlphaVectorSet {
        AlphaVectorSet::new(
            2,
            vec![
                AlphaVector::new(0, vec![1.0, 0.0]),
                AlphaVector::new(1, vec![0.0, 1.0]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn new_preserves_order_and_tags() {
        let set = two_by_two();
        assert_eq!(set.len(), 2);
        assert_eq!(set.dimension(), 2);
        assert!(!set.supports_observed());
        let v = set.get(1).unwrap();
        assert_eq!(v.index, 1);
        assert_eq!(v.action, 1);
        assert_eq!(v.coefficients, &[0.0, 1.0]);
        assert_eq!(v.observable_state, None);
        assert!(set.get(2).is_none());
    }

    #[test]
    fn new_rejects_wrong_length() {
        let err = AlphaVectorSet::new(
            2,
            vec![
                AlphaVector::new(0, vec![1.0, 0.0]),
                AlphaVector::new(1, vec![0.0, 1.0, 2.0]),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, Error::Format { .. }));
        assert!(err.to_string().contains("vector 1 has 3 coefficients"));
    }

    #[test]
    fn new_rejects_action_at_u32_max() {
        let err = AlphaVectorSet::new(1, vec![AlphaVector::new(u32::MAX, vec![1.0])]).unwrap_err();
        assert!(matches!(err, Error::Format { .. }));
        assert!(err.to_string().contains("no one-based form"));

        let set = AlphaVectorSet::new(1, vec![AlphaVector::new(u32::MAX - 1, vec![1.0])]).unwrap();
        let handle = PolicyHandle::from_set(Model::new("edge.pomdp"), set);
        assert_eq!(handle.action(&[1.0]).unwrap(), u32::MAX);
    }

    #[test]
    fn new_rejects_wrong_length_with_huge_dimension() {
        let err = AlphaVectorSet::new(usize::MAX, vec![AlphaVector::new(0, vec![1.0])]).unwrap_err();
        assert!(matches!(err, Error::Format { .. }));
    }

    #[test]
    fn new_rejects_mixed_tagging() {
        let err = AlphaVectorSet::new(
            1,
            vec![
                AlphaVector::new(0, vec![1.0]).observed(0),
                AlphaVector::new(1, vec![2.0]),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, Error::Format { .. }));
    }

    #[test]
    fn observable_sets_report_states() {
        let set = AlphaVectorSet::new(
            1,
            vec![
                AlphaVector::new(0, vec![1.0]).observed(3),
                AlphaVector::new(1, vec![2.0]).observed(1),
                AlphaVector::new(1, vec![0.5]).observed(3),
            ],
        )
        .unwrap();
        assert!(set.supports_observed());
        assert_eq!(set.observable_states(), vec![1, 3]);
        assert_eq!(set.observable_state(1), Some(1));
        assert_eq!(set.distinct_actions(), vec![0, 1]);
    }

    #[test]
    fn empty_set() {
        let set = AlphaVectorSet::empty(4);
        assert!(set.is_empty());
        assert_eq!(set.dimension(), 4);
        assert_eq!(set.iter().count(), 0);
        assert!(set.observable_states().is_empty());
    }

    #[test]
    fn rows_match_vectors() {
        let set = two_by_two();
        let rows: Vec<&[f64]> = set.rows().collect();
        assert_eq!(rows, vec![&[1.0, 0.0][..], &[0.0, 1.0][..]]);
    }

    #[test]
    fn zero_dimension_rows() {
        let set = AlphaVectorSet::new(
            0,
            vec![AlphaVector::new(0, vec![]), AlphaVector::new(1, vec![])],
        )
        .unwrap();
        assert_eq!(set.rows().count(), 2);
    }

    #[test]
    fn to_vectors_roundtrip() {
        let set = two_by_two();
        let rebuilt = AlphaVectorSet::new(2, set.to_vectors()).unwrap();
        assert_eq!(rebuilt, set);
    }

    #[test]
    fn latin1_bytes_decode() {
        assert_eq!(decode(&[0x61, 0xe9]), "a\u{e9}");
        assert_eq!(decode("\u{feff}<x/>".as_bytes()), "<x/>");
    }
}
