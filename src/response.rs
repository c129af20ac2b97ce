//! Resolve result wrapper with the coverage action taken

use crate::model::DateRange;

/// Which coverage action a resolve performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverageAction {
    /// The desired window was fully covered; no provider call was made.
    Hit,
    /// No record existed; the full window was fetched and stored.
    Created,
    /// The stored record was extended forward; only `fetched` was requested
    /// from the provider.
    Extended {
        /// The exact range passed to the provider.
        fetched: DateRange,
    },
    /// The desired window started before the stored one; the whole window
    /// was refetched and the old record atomically superseded.
    Replaced,
    /// Entity-list metric: fetched whole, no coverage tracking.
    Refetched,
}

/// A resolved series together with the coverage action that produced it.
///
/// Callers that only want the data use [`into_inner`](Resolved::into_inner);
/// the action is there for observability and for asserting cache behavior.
#[derive(Debug, Clone)]
pub struct Resolved<T> {
    data: T,
    /// The coverage action taken by this resolve.
    pub action: CoverageAction,
}

impl<T> Resolved<T> {
    /// Wraps data with the action that produced it.
    pub fn new(data: T, action: CoverageAction) -> Self {
        Self { data, action }
    }

    /// Returns `true` if the resolve was served without a provider call.
    pub fn is_hit(&self) -> bool {
        matches!(self.action, CoverageAction::Hit)
    }

    /// Borrows the resolved data.
    pub fn data(&self) -> &T {
        &self.data
    }

    /// Consumes the wrapper, returning the data.
    pub fn into_inner(self) -> T {
        self.data
    }
}
