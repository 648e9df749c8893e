/*!
The one place where the current session lives.

The engine functions are pure. A transport that receives votes concurrently
keeps the state in a [`SessionCell`], which applies one action at a time:
two ballots for the same turn cannot both see the same state.

```
use chart_picker::cell::SessionCell;
use chart_picker::{Action, Phase};
use rand::SeedableRng;

let cell = SessionCell::new(rand::rngs::StdRng::seed_from_u64(0));
assert_eq!(cell.snapshot().state.phase(), Phase::Idle);
// Nothing to undo while idle: the action is rejected, the state is kept.
assert!(cell.apply(&Action::UndoVote).is_err());
assert_eq!(cell.snapshot().state.phase(), Phase::Idle);
```
*/
use log::{debug, warn};
use rand::Rng;

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::config::*;

struct Inner<R> {
    state: SessionState,
    rng: R,
}

pub struct SessionCell<R> {
    inner: Mutex<Inner<R>>,
}

impl<R: Rng> SessionCell<R> {
    /// An idle session, drawing its random numbers from `rng`.
    pub fn new(rng: R) -> SessionCell<R> {
        SessionCell {
            inner: Mutex::new(Inner {
                state: crate::INITIAL_STATE,
                rng,
            }),
        }
    }

    // A panic while holding the lock cannot leave a half-applied state:
    // the state is only replaced by a complete result.
    fn lock(&self) -> MutexGuard<'_, Inner<R>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Applies the action to the current state. On success the state is
    /// replaced and the new snapshot is returned for broadcasting.
    pub fn apply(&self, action: &Action) -> PickerResult<Snapshot> {
        let mut guard = self.lock();
        let inner = &mut *guard;
        match crate::apply(&inner.state, action, &mut inner.rng) {
            Ok(state) => {
                debug!("SessionCell: {} -> {}", action.name(), state.phase());
                inner.state = state;
                Ok(crate::Snapshot::of(&inner.state))
            }
            Err(e) => {
                warn!("SessionCell: rejected {}: {}", action.name(), e);
                Err(e)
            }
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::of(&self.lock().state)
    }

    /// The odds of the next draw, while voting.
    pub fn odds(&self) -> Option<Vec<ChartOdds>> {
        match &self.lock().state {
            SessionState::Voting(voting) => Some(crate::draw_odds(voting)),
            _ => None,
        }
    }

    pub fn into_state(self) -> SessionState {
        self.inner
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .state
    }
}
