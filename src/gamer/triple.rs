//! The (role, state, engine) triple.
//!
//! A triple only exists fully populated. Construction checks that role and
//! state were produced by the engine being installed, and state updates keep
//! that invariant.

use std::fmt;

use crate::machine::engine::StateMachine;
use crate::machine::error::StateMachineError;
use crate::machine::types::{MachineState, Role};

/// Current role, current state and the engine that produced both.
pub struct StateTriple {
    role: Role,
    state: MachineState,
    machine: Box<dyn StateMachine>,
}

impl StateTriple {
    /// Assemble a triple, rejecting values from another engine.
    pub fn new(
        role: Role,
        state: MachineState,
        machine: Box<dyn StateMachine>,
    ) -> Result<Self, StateMachineError> {
        StateMachineError::check_origin("role", machine.id(), role.origin())?;
        StateMachineError::check_origin("state", machine.id(), state.origin())?;
        Ok(Self { role, state, machine })
    }

    /// Role this gamer plays.
    pub fn role(&self) -> &Role {
        &self.role
    }

    /// Current state.
    pub fn state(&self) -> &MachineState {
        &self.state
    }

    /// Installed engine.
    pub fn machine(&self) -> &dyn StateMachine {
        self.machine.as_ref()
    }

    pub(crate) fn machine_mut(&mut self) -> &mut dyn StateMachine {
        self.machine.as_mut()
    }

    /// Replace the state with its successor from the same engine.
    pub(crate) fn set_state(&mut self, state: MachineState) -> Result<(), StateMachineError> {
        StateMachineError::check_origin("state", self.machine.id(), state.origin())?;
        self.state = state;
        Ok(())
    }

    /// True if role and state both belong to the installed engine.
    pub fn is_consistent(&self) -> bool {
        let id = self.machine.id();
        self.role.origin() == id && self.state.origin() == id
    }
}

impl fmt::Debug for StateTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateTriple")
            .field("role", &self.role)
            .field("state", &self.state)
            .field("machine", &format_args!("{}#{}", self.machine.name(), self.machine.id()))
            .finish()
    }
}
