//! State Machine Runtime
//!
//! A flat state machine keyed by `(state, event)`. Events with no matching
//! transition leave the machine where it is.
//!
//! The glass surface lifecycle is expressed with it:
//!
//! ```text
//! Detached --Attach--> Idle --Start--> Active
//!     ^                 |  ^             |
//!     +----Detach-------+  +----Stop-----+
//!     ^                                  |
//!     +-------------Detach---------------+
//! ```

use std::hash::Hash;

use rustc_hash::FxHashMap;

/// A transition table entry
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition<S, E> {
    pub from: S,
    pub event: E,
    pub to: S,
}

impl<S, E> Transition<S, E> {
    pub fn new(from: S, event: E, to: S) -> Self {
        Self { from, event, to }
    }
}

/// A state machine instance
#[derive(Clone, Debug)]
pub struct StateMachine<S, E> {
    current: S,
    table: FxHashMap<(S, E), S>,
}

impl<S, E> StateMachine<S, E>
where
    S: Copy + Eq + Hash + std::fmt::Debug,
    E: Copy + Eq + Hash + std::fmt::Debug,
{
    /// Create a state machine with an initial state and transitions
    pub fn new(initial: S, transitions: impl IntoIterator<Item = Transition<S, E>>) -> Self {
        let table = transitions
            .into_iter()
            .map(|t| ((t.from, t.event), t.to))
            .collect();
        Self {
            current: initial,
            table,
        }
    }

    pub fn current_state(&self) -> S {
        self.current
    }

    pub fn is_in(&self, state: S) -> bool {
        self.current == state
    }

    /// Check if an event can trigger a transition from the current state
    pub fn can_send(&self, event: E) -> bool {
        self.table.contains_key(&(self.current, event))
    }

    /// Send an event, returning the (possibly unchanged) current state
    pub fn send(&mut self, event: E) -> S {
        let from = self.current;
        let Some(&to) = self.table.get(&(from, event)) else {
            tracing::trace!("fsm: {:?} ignored in {:?}", event, from);
            return from;
        };

        self.current = to;
        tracing::debug!("fsm: {:?} --{:?}--> {:?}", from, event, to);
        to
    }
}

/// Lifecycle of an effect-bearing view
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SurfaceState {
    /// Not in a displayed hierarchy
    Detached,
    /// Attached, redrawn only on demand
    Idle,
    /// Attached and redrawn on every (rate-limited) frame tick
    Active,
}

/// Inputs to the surface lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SurfaceEvent {
    Attach,
    Detach,
    Start,
    Stop,
}

impl StateMachine<SurfaceState, SurfaceEvent> {
    /// The glass surface lifecycle, starting detached
    pub fn surface() -> Self {
        use SurfaceEvent::*;
        use SurfaceState::*;

        Self::new(
            Detached,
            [
                Transition::new(Detached, Attach, Idle),
                Transition::new(Idle, Start, Active),
                Transition::new(Idle, Detach, Detached),
                Transition::new(Active, Stop, Idle),
                Transition::new(Active, Detach, Detached),
            ],
        )
    }
}
