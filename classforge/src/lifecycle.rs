//! Entity lifecycle contract
//!
//! Every stateful class gets a `status` field over a closed state set and
//! exactly two guarded transitions:
//!
//! ```text
//! suspend:  ACTIVE    -> SUSPENDED
//! activate: SUSPENDED -> ACTIVE
//! ```
//!
//! Calling a transition from any other state is an error, never a no-op.
//! Authors may add domain states; the pair always operates on
//! ACTIVE/SUSPENDED.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Name of the synthesized status field
pub const STATUS_FIELD: &str = "status";

/// Name of the timestamp stamped by every transition
pub const UPDATED_AT_FIELD: &str = "updated_at";

/// A lifecycle state
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum State {
    Active,
    Suspended,
    /// Author-defined domain state, stored upper-case
    Custom(String),
}

impl State {
    pub fn as_str(&self) -> &str {
        match self {
            State::Active => "ACTIVE",
            State::Suspended => "SUSPENDED",
            State::Custom(name) => name,
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for State {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        Ok(match upper.as_str() {
            "ACTIVE" => State::Active,
            "SUSPENDED" => State::Suspended,
            _ => State::Custom(upper),
        })
    }
}

impl Serialize for State {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Error raised by a guarded transition
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    #[error("cannot {transition} from state {from}; expected {expected}")]
    InvalidTransition {
        transition: &'static str,
        from: State,
        expected: State,
    },

    #[error("unknown transition '{0}'")]
    UnknownTransition(String),
}

/// One guarded transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub name: &'static str,
    pub from: State,
    pub to: State,
    /// Name of the guard method in generated code
    pub guard: &'static str,
}

/// The suspend transition
pub const SUSPEND: &str = "suspend";
/// The activate transition
pub const ACTIVATE: &str = "activate";

/// State set and transitions of a stateful model
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateContract {
    /// Ordered state set, ACTIVE and SUSPENDED first
    pub states: Vec<State>,
    /// Always exactly suspend and activate
    pub transitions: Vec<Transition>,
}

impl Default for StateContract {
    fn default() -> Self {
        Self::new(&[])
    }
}

impl StateContract {
    /// Contract with the default states plus any author-defined ones
    pub fn new(extra_states: &[String]) -> Self {
        let mut states = vec![State::Active, State::Suspended];
        for extra in extra_states {
            let Ok(state) = extra.parse::<State>();
            if !states.contains(&state) {
                states.push(state);
            }
        }
        Self {
            states,
            transitions: vec![
                Transition {
                    name: SUSPEND,
                    from: State::Active,
                    to: State::Suspended,
                    guard: "isActive",
                },
                Transition {
                    name: ACTIVATE,
                    from: State::Suspended,
                    to: State::Active,
                    guard: "isSuspended",
                },
            ],
        }
    }

    /// State names in order, for enum columns
    pub fn state_names(&self) -> Vec<String> {
        self.states.iter().map(|s| s.to_string()).collect()
    }

    pub fn initial_state(&self) -> State {
        State::Active
    }

    pub fn transition(&self, name: &str) -> Option<&Transition> {
        self.transitions.iter().find(|t| t.name == name)
    }

    /// Apply a named transition
    pub fn apply(
        &self,
        name: &str,
        current: &State,
        at: DateTime<Utc>,
    ) -> Result<(State, DateTime<Utc>), LifecycleError> {
        match name {
            SUSPEND => suspend(current, at),
            ACTIVATE => activate(current, at),
            other => Err(LifecycleError::UnknownTransition(other.to_string())),
        }
    }
}

/// `ACTIVE -> SUSPENDED`, stamping `at`
pub fn suspend(
    current: &State,
    at: DateTime<Utc>,
) -> Result<(State, DateTime<Utc>), LifecycleError> {
    if *current != State::Active {
        return Err(LifecycleError::InvalidTransition {
            transition: SUSPEND,
            from: current.clone(),
            expected: State::Active,
        });
    }
    Ok((State::Suspended, at))
}

/// `SUSPENDED -> ACTIVE`, stamping `at`
pub fn activate(
    current: &State,
    at: DateTime<Utc>,
) -> Result<(State, DateTime<Utc>), LifecycleError> {
    if *current != State::Suspended {
        return Err(LifecycleError::InvalidTransition {
            transition: ACTIVATE,
            from: current.clone(),
            expected: State::Suspended,
        });
    }
    Ok((State::Active, at))
}

/// The lifecycle part of an entity record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lifecycle {
    pub status: State,
    pub updated_at: DateTime<Utc>,
}

impl Lifecycle {
    pub fn new(created_at: DateTime<Utc>) -> Self {
        Self {
            status: State::Active,
            updated_at: created_at,
        }
    }

    pub fn suspend(&mut self, at: DateTime<Utc>) -> Result<(), LifecycleError> {
        let (status, updated_at) = suspend(&self.status, at)?;
        self.status = status;
        self.updated_at = updated_at;
        Ok(())
    }

    pub fn activate(&mut self, at: DateTime<Utc>) -> Result<(), LifecycleError> {
        let (status, updated_at) = activate(&self.status, at)?;
        self.status = status;
        self.updated_at = updated_at;
        Ok(())
    }
}
