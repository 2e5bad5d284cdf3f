//! Policy handle: the query surface for a solved model.
//!
//! A [`PolicyHandle`] binds a [`Model`] to the alpha-vector set currently in
//! service. Queries clone an `Arc` to the set under a short read lock and do
//! their arithmetic without holding it, so concurrent queries never wait on
//! each other. [`PolicyHandle::rebind`] parses the replacement before taking
//! the write lock; a failed parse leaves the old set serving.
//!
//! Actions leave the handle one-based: the stored zero-based action plus
//! [`ACTION_INDEX_OFFSET`].

use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use ap_common::{Error, Result};
use tracing::{debug, info, warn};

use super::info::PolicyInfo;
use super::selector::{select, select_observed, Selection};
use super::store::AlphaVectorSet;
use crate::belief::DiscreteUpdater;
use crate::logging::{event_names, Stage};
use crate::model::Model;

/// Added to stored action indices when they cross the handle API.
pub const ACTION_INDEX_OFFSET: u32 = 1;

/// What a handle serves: the set and its provenance, swapped together.
#[derive(Debug, Clone)]
struct Served {
    set: Arc<AlphaVectorSet>,
    info: Arc<PolicyInfo>,
}

/// Thread-safe handle over the current policy of one model.
#[derive(Debug)]
pub struct PolicyHandle {
    model: Model,
    served: RwLock<Served>,
}

impl PolicyHandle {
    /// Load the policy file at `path` for `model`.
    pub fn load(model: Model, path: &Path) -> Result<Self> {
        let (set, info) = AlphaVectorSet::load_with_info(path)?;
        info!(
            target: event_names::POLICY_LOADED,
            stage = %Stage::Load,
            model = %model.name,
            path = %path.display(),
            vectors = set.len(),
            dimension = set.dimension(),
            observable = set.supports_observed(),
            "policy loaded"
        );
        Ok(Self::with_served(model, set, info))
    }

    /// Serve an in-memory set.
    pub fn from_set(model: Model, set: AlphaVectorSet) -> Self {
        let info = PolicyInfo::describe(&set, None, None);
        Self::with_served(model, set, info)
    }

    fn with_served(model: Model, set: AlphaVectorSet, info: PolicyInfo) -> Self {
        PolicyHandle {
            model,
            served: RwLock::new(Served {
                set: Arc::new(set),
                info: Arc::new(info),
            }),
        }
    }

    fn snapshot(&self) -> Served {
        // The guarded value is a pair of Arcs, which a panicking writer
        // cannot leave half-updated
        self.served
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// One-based action for `belief`.
    pub fn action(&self, belief: &[f64]) -> Result<u32> {
        self.select(belief).map(|s| s.action)
    }

    /// One-based action for `belief`, restricted to vectors for
    /// `observed_state`.
    ///
    /// Only meaningful when [`supports_observed`](Self::supports_observed)
    /// is true; otherwise fails with [`Error::Domain`].
    pub fn action_observed(&self, belief: &[f64], observed_state: u32) -> Result<u32> {
        self.select_observed(belief, observed_state).map(|s| s.action)
    }

    /// Maximum utility over all vectors at `belief`.
    pub fn value(&self, belief: &[f64]) -> Result<f64> {
        self.select(belief).map(|s| s.value)
    }

    /// Full selection with the action already one-based.
    pub fn select(&self, belief: &[f64]) -> Result<Selection> {
        let served = self.snapshot();
        let selection = select(&served.set, belief)?;
        Ok(self.answered(selection, None))
    }

    /// Full observed-state selection with the action already one-based.
    pub fn select_observed(&self, belief: &[f64], observed_state: u32) -> Result<Selection> {
        let served = self.snapshot();
        let selection = select_observed(&served.set, belief, observed_state)?;
        Ok(self.answered(selection, Some(observed_state)))
    }

    fn answered(&self, selection: Selection, observed_state: Option<u32>) -> Selection {
        // sets reject actions at u32::MAX, so the shift cannot overflow
        let external = Selection {
            action: selection.action + ACTION_INDEX_OFFSET,
            ..selection
        };
        debug!(
            target: event_names::QUERY_ANSWERED,
            stage = %Stage::Query,
            action = external.action,
            value = external.value,
            vector = external.vector_index,
            observed_state = ?observed_state,
            "query answered"
        );
        external
    }

    /// Whether the served set carries observable-state tags.
    pub fn supports_observed(&self) -> bool {
        self.snapshot().set.supports_observed()
    }

    /// Read-only snapshot of the served set.
    pub fn vectors(&self) -> Arc<AlphaVectorSet> {
        self.snapshot().set
    }

    /// Provenance of the served set.
    pub fn info(&self) -> Arc<PolicyInfo> {
        self.snapshot().info
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Replace the served set with the policy at `path`.
    ///
    /// Parsing happens before the swap. On failure the previous set stays in
    /// service and the parse error is returned.
    pub fn rebind(&self, path: &Path) -> Result<()> {
        let (set, info) = match AlphaVectorSet::load_with_info(path) {
            Ok(loaded) => loaded,
            Err(err) => {
                warn!(
                    target: event_names::POLICY_REBIND_FAILED,
                    stage = %Stage::Load,
                    path = %path.display(),
                    error = %err,
                    "rebind failed; previous policy still in service"
                );
                return Err(err);
            }
        };
        self.swap(set, info);
        Ok(())
    }

    /// Replace the served set with an in-memory one.
    pub fn rebind_set(&self, set: AlphaVectorSet) {
        let info = PolicyInfo::describe(&set, None, None);
        self.swap(set, info);
    }

    fn swap(&self, set: AlphaVectorSet, info: PolicyInfo) {
        let vectors = set.len();
        let next = Served {
            set: Arc::new(set),
            info: Arc::new(info),
        };
        let previous = {
            let mut guard = self.served.write().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *guard, next)
        };
        info!(
            target: event_names::POLICY_REBOUND,
            stage = %Stage::Load,
            model = %self.model.name,
            previous_vectors = previous.set.len(),
            vectors,
            "policy rebound"
        );
    }

    /// Belief updater for the bound model.
    ///
    /// Requires dynamics on the model whose state count matches the policy's
    /// dimension.
    pub fn updater(&self) -> Result<DiscreteUpdater> {
        let dynamics = self.model.dynamics().ok_or_else(|| {
            Error::UpdaterUnavailable(format!("model '{}' has no dynamics", self.model.name))
        })?;
        let dimension = self.snapshot().set.dimension();
        if dynamics.states() != dimension {
            return Err(Error::UpdaterUnavailable(format!(
                "model '{}' dynamics have {} states but the policy has {}",
                self.model.name,
                dynamics.states(),
                dimension
            )));
        }
        Ok(DiscreteUpdater::new(Arc::clone(dynamics)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::belief::{BeliefUpdater, DiscreteDynamics, DynamicsTables};
    use crate::policy::AlphaVector;

    fn identity_handle() -> PolicyHandle {
        let set = AlphaVectorSet::new(
            2,
            vec![
                AlphaVector::new(0, vec![1.0, 0.0]),
                AlphaVector::new(1, vec![0.0, 1.0]),
            ],
        )
        .unwrap();
        PolicyHandle::from_set(Model::new("identity.pomdp"), set)
    }

    fn two_state_dynamics() -> DiscreteDynamics {
        DiscreteDynamics::new(DynamicsTables {
            transition: vec![vec![vec![1.0, 0.0], vec![0.0, 1.0]]; 2],
            observation: vec![vec![vec![0.9, 0.1], vec![0.2, 0.8]]; 2],
        })
        .unwrap()
    }

    #[test]
    fn handle_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PolicyHandle>();
    }

    #[test]
    fn actions_are_one_based() {
        let handle = identity_handle();
        assert_eq!(handle.action(&[1.0, 0.0]).unwrap(), 1);
        assert_eq!(handle.action(&[0.0, 1.0]).unwrap(), 2);
        assert_eq!(handle.action(&[0.3, 0.7]).unwrap(), 2);
        assert!((handle.value(&[0.3, 0.7]).unwrap() - 0.7).abs() < 1e-12);
    }

    #[test]
    fn select_keeps_vector_index() {
        let s = identity_handle().select(&[0.9, 0.1]).unwrap();
        assert_eq!(s.action, 1);
        assert_eq!(s.vector_index, 0);
    }

    #[test]
    fn empty_policy_errors() {
        let handle = PolicyHandle::from_set(Model::new("e.pomdp"), AlphaVectorSet::empty(2));
        assert!(matches!(handle.action(&[0.5, 0.5]), Err(Error::PolicyEmpty)));
        assert!(matches!(handle.value(&[0.5, 0.5]), Err(Error::PolicyEmpty)));
    }

    #[test]
    fn observed_query_on_plain_policy_is_domain_error() {
        let handle = identity_handle();
        assert!(!handle.supports_observed());
        let err = handle.action_observed(&[0.5, 0.5], 0).unwrap_err();
        assert!(matches!(err, Error::Domain { .. }));
    }

    #[test]
    fn observed_query() {
        let set = AlphaVectorSet::new(
            1,
            vec![
                AlphaVector::new(3, vec![5.0]).observed(0),
                AlphaVector::new(4, vec![1.0]).observed(1),
            ],
        )
        .unwrap();
        let handle = PolicyHandle::from_set(Model::new("m.pomdpx"), set);
        assert!(handle.supports_observed());
        assert_eq!(handle.action_observed(&[1.0], 1).unwrap(), 5);
        assert_eq!(handle.action(&[1.0]).unwrap(), 4);
    }

    #[test]
    fn rebind_set_swaps_wholesale() {
        let handle = identity_handle();
        let before = handle.vectors();
        handle.rebind_set(
            AlphaVectorSet::new(2, vec![AlphaVector::new(7, vec![0.0, 0.0])]).unwrap(),
        );
        assert_eq!(handle.action(&[1.0, 0.0]).unwrap(), 8);
        assert_eq!(handle.vectors().len(), 1);
        // Old snapshot is untouched
        assert_eq!(before.len(), 2);
        assert_eq!(handle.info().vectors, 1);
    }

    #[test]
    fn failed_rebind_keeps_previous_set() {
        let handle = identity_handle();
        let err = handle
            .rebind(Path::new("/nonexistent/policy.out"))
            .unwrap_err();
        assert!(matches!(err, Error::Format { .. }));
        assert_eq!(handle.vectors().len(), 2);
        assert_eq!(handle.action(&[0.0, 1.0]).unwrap(), 2);
    }

    #[test]
    fn updater_requires_dynamics() {
        let err = identity_handle().updater().unwrap_err();
        assert!(matches!(err, Error::UpdaterUnavailable(_)));
    }

    #[test]
    fn updater_feeds_back_handle_actions() {
        let set = AlphaVectorSet::new(
            2,
            vec![
                AlphaVector::new(0, vec![1.0, 0.0]),
                AlphaVector::new(1, vec![0.0, 1.0]),
            ],
        )
        .unwrap();
        let model = Model::new("two.pomdp").with_dynamics(two_state_dynamics());
        let handle = PolicyHandle::from_set(model, set);
        let updater = handle.updater().unwrap();

        let belief = updater.initialize(None).unwrap();
        let action = handle.action(&belief).unwrap();
        let next = updater.update(&belief, action, 1).unwrap();
        assert!(next[1] > next[0]);
        assert_eq!(handle.action(&next).unwrap(), 2);
    }

    #[test]
    fn updater_dimension_must_match() {
        let set = AlphaVectorSet::new(3, vec![AlphaVector::new(0, vec![0.0; 3])]).unwrap();
        let model = Model::new("m.pomdp").with_dynamics(two_state_dynamics());
        let err = PolicyHandle::from_set(model, set).updater().unwrap_err();
        assert!(err.to_string().contains("2 states but the policy has 3"));
    }

    #[test]
    fn concurrent_queries_during_rebind() {
        let handle = identity_handle();
        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..500 {
                        let a = handle.action(&[0.0, 1.0]).unwrap();
                        assert!(a == 2 || a == 1);
                    }
                });
            }
            scope.spawn(|| {
                for i in 0..50 {
                    let winner = if i % 2 == 0 { 0 } else { 1 };
                    let mut vectors = vec![
                        AlphaVector::new(1, vec![0.0, 0.0]),
                        AlphaVector::new(1, vec![0.0, 0.0]),
                    ];
                    vectors[winner] = AlphaVector::new(0, vec![0.0, 5.0]);
                    handle.rebind_set(AlphaVectorSet::new(2, vectors).unwrap());
                }
            });
        });
        assert_eq!(handle.vectors().len(), 2);
    }
}
