//! Watch lifecycle tracking
//!
//! A component may declare interest in a resource type whose definition is
//! installed by a separate, asynchronous process. Instead of failing startup
//! on an absent watched type, each watched kind starts `pending` and is
//! promoted to `active` when a matching CustomResourceDefinition appears.
//! The promotion is one-directional: an active watch is never demoted.

use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

/// A (group, version, kind) tuple identifying a watched resource class
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WatchedKind {
    /// API group; empty for the core group
    pub group: String,
    pub version: String,
    pub kind: String,
}

impl WatchedKind {
    pub fn new(
        group: impl Into<String>,
        version: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            kind: kind.into(),
        }
    }

    /// The (group, served-version, kind) tuple a CRD defines
    pub fn from_crd(crd: &CustomResourceDefinition) -> Self {
        Self {
            group: crd.spec.group.clone(),
            version: served_version(crd),
            kind: crd.spec.names.kind.clone(),
        }
    }
}

impl fmt::Display for WatchedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.group.is_empty() {
            write!(f, "{}/{}", self.version, self.kind)
        } else {
            write!(f, "{}/{}/{}", self.group, self.version, self.kind)
        }
    }
}

/// Lifecycle state of a single watched kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    /// The resource type is not yet known to exist in the cluster
    Pending,
    /// A watch has been installed by the host framework
    Active,
}

/// Per-component watch lifecycle state
///
/// Guarded by its own lock, independent of the catalog lock: CRD promotion
/// events arrive concurrently with renders of unrelated components and must
/// not contend across component boundaries.
#[derive(Debug)]
pub struct WatchSet {
    states: Mutex<HashMap<WatchedKind, WatchState>>,
}

impl WatchSet {
    /// Create a watch set with every kind starting `pending`
    pub fn new(kinds: impl IntoIterator<Item = WatchedKind>) -> Self {
        Self {
            states: Mutex::new(
                kinds
                    .into_iter()
                    .map(|kind| (kind, WatchState::Pending))
                    .collect(),
            ),
        }
    }

    /// Whether any watched kind is still pending
    pub fn has_pending(&self) -> bool {
        self.lock()
            .values()
            .any(|state| *state == WatchState::Pending)
    }

    /// Current state of a watched kind, if it is declared at all
    pub fn state(&self, kind: &WatchedKind) -> Option<WatchState> {
        self.lock().get(kind).copied()
    }

    /// Whether this kind is declared and still pending
    pub fn is_pending(&self, kind: &WatchedKind) -> bool {
        self.state(kind) == Some(WatchState::Pending)
    }

    /// Whether a CRD's (group, served-version, kind) matches a pending watch
    ///
    /// Used to filter incoming CRD creation notifications; returns false for
    /// undeclared kinds and for kinds that are already active.
    pub fn matches_pending(&self, crd: &CustomResourceDefinition) -> bool {
        self.is_pending(&WatchedKind::from_crd(crd))
    }

    /// Promote a watched kind to `active`
    ///
    /// Idempotent: promoting an already-active kind is a no-op. Returns true
    /// only when the kind actually transitioned, so the caller knows whether
    /// to install the watch subscription and trigger a reconciliation.
    pub fn promote(&self, kind: &WatchedKind) -> bool {
        let mut states = self.lock();
        match states.get_mut(kind) {
            Some(state @ WatchState::Pending) => {
                *state = WatchState::Active;
                tracing::debug!(kind = %kind, "watch promoted to active");
                true
            }
            _ => false,
        }
    }

    /// Snapshot of kinds still pending, in a stable order
    pub fn pending(&self) -> Vec<WatchedKind> {
        let mut pending: Vec<WatchedKind> = self
            .lock()
            .iter()
            .filter(|(_, state)| **state == WatchState::Pending)
            .map(|(kind, _)| kind.clone())
            .collect();
        pending.sort();
        pending
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<WatchedKind, WatchState>> {
        self.states.lock().expect("watch state lock poisoned")
    }
}

/// Extract the served version from a CRD
///
/// First version marked served, falling back to the first listed version.
pub fn served_version(crd: &CustomResourceDefinition) -> String {
    crd.spec
        .versions
        .iter()
        .find(|v| v.served)
        .or_else(|| crd.spec.versions.first())
        .map(|v| v.name.clone())
        .unwrap_or_default()
}
