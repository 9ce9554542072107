//! Lifecycle hooks.

use crate::error::SimResult;
use crate::state::SimState;

/// Callbacks invoked by [`crate::Simulation`] at lifecycle points.
///
/// Every method defaults to a no-op. An error from a hook is returned from
/// the lifecycle call that triggered it; the state it was given has already
/// been committed.
pub trait SimHooks {
    /// After `init` or `reset` has set up the initial state.
    fn on_init(&mut self, _state: &SimState) -> SimResult<()> {
        Ok(())
    }

    /// After every committed step.
    fn on_update(&mut self, _state: &SimState) -> SimResult<()> {
        Ok(())
    }

    /// Once, on the step where the simulated time reaches the configured end.
    fn on_finished(&mut self, _state: &SimState) -> SimResult<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl SimHooks for NoHooks {}

/// Records the initial state and every committed state.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    initial: Option<SimState>,
    states: Vec<SimState>,
    finished: Option<SimState>,
}

impl Recorder {
    /// Reserve room for `steps` committed states.
    pub fn with_capacity(steps: usize) -> Self {
        Self {
            states: Vec::with_capacity(steps),
            ..Self::default()
        }
    }

    pub fn initial(&self) -> Option<&SimState> {
        self.initial.as_ref()
    }

    /// Committed states in step order.
    pub fn states(&self) -> &[SimState] {
        &self.states
    }

    /// The state on which the run finished, if it did.
    pub fn finished(&self) -> Option<&SimState> {
        self.finished.as_ref()
    }

    pub fn into_states(self) -> Vec<SimState> {
        self.states
    }
}

impl SimHooks for Recorder {
    fn on_init(&mut self, state: &SimState) -> SimResult<()> {
        self.initial = Some(*state);
        self.states.clear();
        self.finished = None;
        Ok(())
    }

    fn on_update(&mut self, state: &SimState) -> SimResult<()> {
        self.states.push(*state);
        Ok(())
    }

    fn on_finished(&mut self, state: &SimState) -> SimResult<()> {
        self.finished = Some(*state);
        Ok(())
    }
}
