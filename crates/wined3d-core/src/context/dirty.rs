use std::mem;

use tracing::warn;

use crate::state::table::representative;
use crate::state::{State, StateMask};

/// Representatives queued for re-application on one context.
///
/// The mask answers "already queued?" in O(1); the list keeps marking order for replay. A
/// representative is in the list at most once between two drains.
#[derive(Clone, Debug, Default)]
pub struct DirtyStates {
    mask: StateMask,
    list: Vec<State>,
}

impl DirtyStates {
    /// Queues the representative of `state`. Returns `false` for states without one and for
    /// representatives that are already queued.
    pub fn mark(&mut self, state: State) -> bool {
        if !state.is_valid() {
            warn!(%state, "ignoring dirty mark for out-of-range state");
            return false;
        }
        let Some(rep) = representative(state) else {
            return false;
        };
        if !self.mask.insert(rep) {
            return false;
        }
        self.list.push(rep);
        true
    }

    pub fn mark_all(&mut self) {
        for state in State::all() {
            self.mark(state);
        }
    }

    pub fn is_dirty(&self, state: State) -> bool {
        representative(state).is_some_and(|rep| self.mask.contains(rep))
    }

    pub fn pending(&self) -> &[State] {
        &self.list
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// Detaches the queue for draining. Bits stay set until [`Self::unmark`] is called for each
    /// drained representative.
    pub(crate) fn take_list(&mut self) -> Vec<State> {
        mem::take(&mut self.list)
    }

    /// Hands a drained, empty list back so its capacity is reused.
    pub(crate) fn recycle(&mut self, mut list: Vec<State>) {
        list.clear();
        if self.list.is_empty() {
            self.list = list;
        }
    }

    pub(crate) fn unmark(&mut self, rep: State) {
        self.mask.remove(rep);
    }
}
