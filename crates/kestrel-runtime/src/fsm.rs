//! Actor lifecycle state machine
//!
//! TigerStyle: Explicit lifecycle states, total transition function.
//!
//! State transitions (every pair not listed is a no-op):
//! ```text
//!   Idle     --Start-->    Running
//!   Running  --Stop-->     Idle
//!   Running  --Complete--> Finished
//!   Running  --Fail-->     Error
//!   Finished --Start-->    Running
//!   Error    --Start-->    Running
//! ```

use tracing::debug;

/// Actor lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ActorState {
    /// Initial state; waiting for work
    #[default]
    Idle,
    /// Processing work
    Running,
    /// Work completed
    Finished,
    /// Work failed
    Error,
}

impl ActorState {
    /// Every state, in declaration order
    pub const ALL: [ActorState; 4] = [
        ActorState::Idle,
        ActorState::Running,
        ActorState::Finished,
        ActorState::Error,
    ];

    /// Successor state for `event`
    ///
    /// Every (state, event) pair is listed; there is no fallthrough arm, so
    /// adding a state or event fails to compile until the table is extended.
    pub fn transition(self, event: Event) -> ActorState {
        match (self, event) {
            (ActorState::Idle, Event::Start) => ActorState::Running,
            (ActorState::Idle, Event::Stop) => ActorState::Idle,
            (ActorState::Idle, Event::Complete) => ActorState::Idle,
            (ActorState::Idle, Event::Fail) => ActorState::Idle,

            (ActorState::Running, Event::Start) => ActorState::Running,
            (ActorState::Running, Event::Stop) => ActorState::Idle,
            (ActorState::Running, Event::Complete) => ActorState::Finished,
            (ActorState::Running, Event::Fail) => ActorState::Error,

            (ActorState::Finished, Event::Start) => ActorState::Running,
            (ActorState::Finished, Event::Stop) => ActorState::Finished,
            (ActorState::Finished, Event::Complete) => ActorState::Finished,
            (ActorState::Finished, Event::Fail) => ActorState::Finished,

            (ActorState::Error, Event::Start) => ActorState::Running,
            (ActorState::Error, Event::Stop) => ActorState::Error,
            (ActorState::Error, Event::Complete) => ActorState::Error,
            (ActorState::Error, Event::Fail) => ActorState::Error,
        }
    }
}

impl std::fmt::Display for ActorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActorState::Idle => write!(f, "idle"),
            ActorState::Running => write!(f, "running"),
            ActorState::Finished => write!(f, "finished"),
            ActorState::Error => write!(f, "error"),
        }
    }
}

/// Lifecycle event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    Start,
    Stop,
    Complete,
    Fail,
}

impl Event {
    /// Every event, in declaration order
    pub const ALL: [Event; 4] = [Event::Start, Event::Stop, Event::Complete, Event::Fail];
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Event::Start => write!(f, "start"),
            Event::Stop => write!(f, "stop"),
            Event::Complete => write!(f, "complete"),
            Event::Fail => write!(f, "fail"),
        }
    }
}

/// Finite state machine driving one actor's lifecycle
///
/// Mutated only through [`StateMachine::on_event`].
#[derive(Debug, Clone, Default)]
pub struct StateMachine {
    state: ActorState,
}

impl StateMachine {
    /// Create a state machine in `Idle`
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state
    pub fn state(&self) -> ActorState {
        self.state
    }

    /// Apply `event` and return the new state
    ///
    /// Never fails; no-op pairs leave the state unchanged.
    pub fn on_event(&mut self, event: Event) -> ActorState {
        let from = self.state;
        let to = from.transition(event);
        if from != to {
            debug!(from = %from, to = %to, event = %event, "State transition");
        }
        self.state = to;
        to
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_machine_starts_idle() {
        let fsm = StateMachine::new();
        assert_eq!(fsm.state(), ActorState::Idle);
        assert_eq!(ActorState::default(), ActorState::Idle);
    }

    #[test]
    fn test_transition_table_is_total() {
        use ActorState::*;
        use Event::*;

        let expected = [
            (Idle, [Running, Idle, Idle, Idle]),
            (Running, [Running, Idle, Finished, Error]),
            (Finished, [Running, Finished, Finished, Finished]),
            (Error, [Running, Error, Error, Error]),
        ];

        for (from, row) in expected {
            for (event, to) in [Start, Stop, Complete, Fail].into_iter().zip(row) {
                let mut fsm = StateMachine { state: from };
                assert_eq!(
                    fsm.on_event(event),
                    to,
                    "({}, {}) should lead to {}",
                    from,
                    event,
                    to
                );
                assert_eq!(fsm.state(), to);
            }
        }
    }

    #[test]
    fn test_no_op_pairs_leave_state_unchanged() {
        let mut no_ops = 0;
        for state in ActorState::ALL {
            for event in Event::ALL {
                let next = state.transition(event);
                assert!(ActorState::ALL.contains(&next));
                if next == state {
                    no_ops += 1;
                }
            }
        }
        // Running+Start plus three per non-Running state
        assert_eq!(no_ops, 10);
    }

    #[test]
    fn test_start_reenters_running_from_any_state() {
        for state in ActorState::ALL {
            assert_eq!(state.transition(Event::Start), ActorState::Running);
        }
    }

    #[test]
    fn test_lifecycle_sequence() {
        let mut fsm = StateMachine::new();
        assert_eq!(fsm.on_event(Event::Start), ActorState::Running);
        assert_eq!(fsm.on_event(Event::Fail), ActorState::Error);
        assert_eq!(fsm.on_event(Event::Complete), ActorState::Error);
        assert_eq!(fsm.on_event(Event::Start), ActorState::Running);
        assert_eq!(fsm.on_event(Event::Complete), ActorState::Finished);
        assert_eq!(fsm.on_event(Event::Stop), ActorState::Finished);
        assert_eq!(fsm.on_event(Event::Start), ActorState::Running);
        assert_eq!(fsm.on_event(Event::Stop), ActorState::Idle);
    }

    #[test]
    fn test_display() {
        assert_eq!(ActorState::Running.to_string(), "running");
        assert_eq!(Event::Complete.to_string(), "complete");
    }
}
