//! The resume protocol state machine.
//!
//! One [`ResumeMachine`] lives in every [`Bridge`](crate::Bridge).  It maps
//! native resume codes to [`Outcome`]s, remembers the last outcome and
//! guards [`Bridge::cut`](crate::Bridge::cut).

use crate::{BridgeError, code};

/// Result of one resume step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// The posted goals succeeded.
    Succeeded,
    /// The posted goals failed.
    Failed,
    /// The engine flushed output to a queue stream; the payload is the
    /// stream id.
    FlushIO,
    /// The engine waits for input on a queue stream; the payload is the
    /// stream id.
    WaitIO,
    /// The engine yielded a value.
    Yielded,
}

impl Outcome {
    /// Maps a native resume code.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            code::SUCCEED => Some(Outcome::Succeeded),
            code::FAIL => Some(Outcome::Failed),
            code::FLUSHIO => Some(Outcome::FlushIO),
            code::WAITIO => Some(Outcome::WaitIO),
            code::YIELD => Some(Outcome::Yielded),
            _ => None,
        }
    }

    /// Returns `true` if the transfer variable carries a payload for this
    /// outcome.
    #[inline]
    pub fn has_payload(self) -> bool {
        matches!(self, Outcome::FlushIO | Outcome::WaitIO | Outcome::Yielded)
    }
}

/// State of the resume protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResumeState {
    #[default]
    Idle,
    Resuming,
    Done(Outcome),
}

/// Tracks the resume protocol between calls.
#[derive(Debug, Default)]
pub struct ResumeMachine {
    state: ResumeState,
}

impl ResumeMachine {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn state(&self) -> ResumeState {
        self.state
    }

    /// Returns the outcome of the last completed resume, if any.
    #[inline]
    pub fn last_outcome(&self) -> Option<Outcome> {
        match self.state {
            ResumeState::Done(outcome) => Some(outcome),
            ResumeState::Idle | ResumeState::Resuming => None,
        }
    }

    /// Enters `Resuming`.  A finished step passes through `Idle` first.
    pub(crate) fn begin(&mut self) {
        if let ResumeState::Done(_) = self.state {
            self.state = ResumeState::Idle;
        }
        log::trace!("resume: {:?} -> Resuming", self.state);
        self.state = ResumeState::Resuming;
    }

    /// Records the native result of the step started by [`Self::begin`].
    pub(crate) fn finish(&mut self, code: i32) -> Result<Outcome, BridgeError> {
        match Outcome::from_code(code) {
            Some(outcome) => {
                self.state = ResumeState::Done(outcome);
                Ok(outcome)
            }
            None => {
                log::error!("resume returned unrecognized code {code}");
                self.state = ResumeState::Idle;
                Err(BridgeError::UnrecognizedResumeResult(code))
            }
        }
    }

    /// Fails unless the last step succeeded.
    pub(crate) fn check_cut(&self) -> Result<(), BridgeError> {
        match self.last_outcome() {
            Some(Outcome::Succeeded) => Ok(()),
            other => Err(BridgeError::IllegalCutState(other)),
        }
    }

    /// Forgets the last outcome (engine teardown).
    pub(crate) fn reset(&mut self) {
        self.state = ResumeState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_mapping() {
        assert_eq!(Outcome::from_code(code::SUCCEED), Some(Outcome::Succeeded));
        assert_eq!(Outcome::from_code(code::FAIL), Some(Outcome::Failed));
        assert_eq!(Outcome::from_code(code::FLUSHIO), Some(Outcome::FlushIO));
        assert_eq!(Outcome::from_code(code::WAITIO), Some(Outcome::WaitIO));
        assert_eq!(Outcome::from_code(code::YIELD), Some(Outcome::Yielded));
        assert_eq!(Outcome::from_code(code::THROW), None);
        assert_eq!(Outcome::from_code(code::RUNNING), None);
    }

    #[test]
    fn transitions() {
        let mut m = ResumeMachine::new();
        assert_eq!(m.state(), ResumeState::Idle);
        assert_eq!(m.last_outcome(), None);
        m.begin();
        assert_eq!(m.state(), ResumeState::Resuming);
        assert_eq!(m.finish(code::WAITIO).unwrap(), Outcome::WaitIO);
        assert_eq!(m.state(), ResumeState::Done(Outcome::WaitIO));
        m.begin();
        assert_eq!(m.last_outcome(), None);
        assert_eq!(m.finish(code::SUCCEED).unwrap(), Outcome::Succeeded);
        assert_eq!(m.last_outcome(), Some(Outcome::Succeeded));
    }

    #[test]
    fn unrecognized_code_returns_to_idle() {
        let mut m = ResumeMachine::new();
        m.begin();
        assert_eq!(
            m.finish(42),
            Err(BridgeError::UnrecognizedResumeResult(42))
        );
        assert_eq!(m.state(), ResumeState::Idle);
        assert!(m.check_cut().is_err());
    }

    #[test]
    fn cut_guard() {
        let mut m = ResumeMachine::new();
        assert_eq!(m.check_cut(), Err(BridgeError::IllegalCutState(None)));
        m.begin();
        m.finish(code::FAIL).unwrap();
        assert_eq!(
            m.check_cut(),
            Err(BridgeError::IllegalCutState(Some(Outcome::Failed)))
        );
        m.begin();
        m.finish(code::SUCCEED).unwrap();
        assert_eq!(m.check_cut(), Ok(()));
        m.reset();
        assert!(m.check_cut().is_err());
    }
}
