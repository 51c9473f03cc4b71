//! Per-cycle scan state machine.
//!
//! Every detection walks the machine from `Idle` back to `Idle`. The scanner
//! drives it as the cycle progresses, so the transition history shows how
//! each recent tap was handled.
//!
//! # Valid Transitions
//!
//! - Idle → TargetDetected → ExchangeAttempt
//! - ExchangeAttempt → SelectOk → ReadOk → CustomIdentifierAvailable → Resolved
//! - ExchangeAttempt / SelectOk / ReadOk → Fallback → Resolved
//! - Resolved → DedupCheck → Suppressed → Idle
//! - DedupCheck → Accepted → Submit → Idle
//!
//! # Examples
//!
//! ```
//! use classtap_scanner::state::{ScanState, ScanStateMachine};
//!
//! let mut machine = ScanStateMachine::new();
//! machine.transition_to(ScanState::TargetDetected).unwrap();
//! machine.transition_to(ScanState::ExchangeAttempt).unwrap();
//!
//! // A tap can't be resolved before the exchange has an outcome
//! assert!(machine.transition_to(ScanState::Resolved).is_err());
//! ```

use std::collections::VecDeque;
use std::fmt;

use classtap_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::engine::{ExchangeOutcome, ExchangeStage};

/// Maximum number of state transitions to keep in history.
///
/// A full accepted cycle is nine transitions, so this covers the last ten or
/// so taps.
const MAX_HISTORY_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanState {
    /// Polling for a target.
    Idle,

    TargetDetected,

    /// SELECT sent, waiting for the outcome.
    ExchangeAttempt,

    SelectOk,

    /// READ envelope valid; payload length not yet checked.
    ReadOk,

    CustomIdentifierAvailable,

    /// Falling back to the hardware UID.
    Fallback,

    Resolved,

    DedupCheck,

    /// Repeat of the last accepted tap within the cooldown.
    Suppressed,

    Accepted,

    /// Handing the scan to the submission gateway.
    Submit,
}

impl fmt::Display for ScanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state_str = match self {
            ScanState::Idle => "Idle",
            ScanState::TargetDetected => "TargetDetected",
            ScanState::ExchangeAttempt => "ExchangeAttempt",
            ScanState::SelectOk => "SelectOk",
            ScanState::ReadOk => "ReadOk",
            ScanState::CustomIdentifierAvailable => "CustomIdentifierAvailable",
            ScanState::Fallback => "Fallback",
            ScanState::Resolved => "Resolved",
            ScanState::DedupCheck => "DedupCheck",
            ScanState::Suppressed => "Suppressed",
            ScanState::Accepted => "Accepted",
            ScanState::Submit => "Submit",
        };
        write!(f, "{}", state_str)
    }
}

impl ScanState {
    /// Check if transition to target state is valid from this state.
    ///
    /// # Examples
    ///
    /// ```
    /// use classtap_scanner::state::ScanState;
    ///
    /// assert!(ScanState::SelectOk.can_transition_to(&ScanState::Fallback));
    /// assert!(!ScanState::Idle.can_transition_to(&ScanState::Resolved));
    /// ```
    pub fn can_transition_to(&self, target: &ScanState) -> bool {
        matches!(
            (self, target),
            // From Idle
            (ScanState::Idle, ScanState::TargetDetected)
            // From TargetDetected
            | (ScanState::TargetDetected, ScanState::ExchangeAttempt)
            // Exchange steps
            | (ScanState::ExchangeAttempt, ScanState::SelectOk | ScanState::Fallback)
            | (ScanState::SelectOk, ScanState::ReadOk | ScanState::Fallback)
            | (ScanState::ReadOk, ScanState::CustomIdentifierAvailable | ScanState::Fallback)
            // Resolution
            | (ScanState::CustomIdentifierAvailable | ScanState::Fallback, ScanState::Resolved)
            | (ScanState::Resolved, ScanState::DedupCheck)
            // Deduplication
            | (ScanState::DedupCheck, ScanState::Suppressed | ScanState::Accepted)
            | (ScanState::Accepted, ScanState::Submit)
            // Back to polling
            | (ScanState::Suppressed | ScanState::Submit, ScanState::Idle)
        )
    }

    /// States passed through after `ExchangeAttempt` for an exchange outcome.
    ///
    /// Ends in `CustomIdentifierAvailable` or `Fallback`, entered from the
    /// last step that succeeded.
    pub fn exchange_path(outcome: &ExchangeOutcome) -> &'static [ScanState] {
        match outcome {
            ExchangeOutcome::Custom(_) => &[
                ScanState::SelectOk,
                ScanState::ReadOk,
                ScanState::CustomIdentifierAvailable,
            ],
            ExchangeOutcome::Fallback(fallback) => match fallback.stage() {
                ExchangeStage::Select => &[ScanState::Fallback],
                ExchangeStage::Read if fallback.read_succeeded() => {
                    &[ScanState::SelectOk, ScanState::ReadOk, ScanState::Fallback]
                }
                ExchangeStage::Read => &[ScanState::SelectOk, ScanState::Fallback],
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateTransition {
    pub from: ScanState,
    pub to: ScanState,
}

impl StateTransition {
    pub fn new(from: ScanState, to: ScanState) -> Self {
        Self { from, to }
    }
}

/// State machine for one scan cycle, reused across cycles.
///
/// Not thread-safe; the scan loop owns it.
#[derive(Debug)]
pub struct ScanStateMachine {
    current_state: ScanState,
    history: VecDeque<StateTransition>,
}

impl ScanStateMachine {
    pub fn new() -> Self {
        Self {
            current_state: ScanState::Idle,
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
        }
    }

    pub fn current_state(&self) -> &ScanState {
        &self.current_state
    }

    /// Recent transitions, oldest first.
    pub fn history(&self) -> &VecDeque<StateTransition> {
        &self.history
    }

    /// Transition to a new state, validating the transition.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidStateTransition` if the transition is not valid
    /// from the current state. The machine is left unchanged.
    pub fn transition_to(&mut self, new_state: ScanState) -> Result<StateTransition> {
        if !self.current_state.can_transition_to(&new_state) {
            return Err(Error::InvalidStateTransition {
                from: self.current_state.to_string(),
                to: new_state.to_string(),
            });
        }

        let transition = StateTransition::new(self.current_state, new_state);
        self.perform_state_change(new_state, transition);
        Ok(transition)
    }

    /// Walk through several states in order, stopping at the first invalid one.
    ///
    /// # Errors
    ///
    /// Returns the first invalid transition.
    pub fn walk(&mut self, states: &[ScanState]) -> Result<()> {
        for state in states {
            self.transition_to(*state)?;
        }
        Ok(())
    }

    /// Force the machine back to Idle, regardless of current state.
    pub fn reset(&mut self) -> StateTransition {
        let transition = StateTransition::new(self.current_state, ScanState::Idle);
        self.perform_state_change(ScanState::Idle, transition);
        transition
    }

    fn perform_state_change(&mut self, new_state: ScanState, transition: StateTransition) {
        self.current_state = new_state;
        self.history.push_back(transition);
        if self.history.len() > MAX_HISTORY_SIZE {
            self.history.pop_front();
        }
    }
}

impl Default for ScanStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
