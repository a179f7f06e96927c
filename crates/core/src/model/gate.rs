use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum GateError {
    #[error("already finalized; no further edits are accepted")]
    Finalized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GateState {
    #[default]
    Open,
    Finalized,
}

/// Two-state lock guarding a session or attempt against further edits.
///
/// `Finalized` is terminal: there is no way back to `Open`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FinalizationGate {
    state: GateState,
}

impl FinalizationGate {
    #[must_use]
    pub fn open() -> Self {
        Self {
            state: GateState::Open,
        }
    }

    #[must_use]
    pub fn finalized() -> Self {
        Self {
            state: GateState::Finalized,
        }
    }

    /// Start open or closed depending on what the server reported.
    #[must_use]
    pub fn from_remote(finalized: bool) -> Self {
        if finalized {
            Self::finalized()
        } else {
            Self::open()
        }
    }

    #[must_use]
    pub fn state(&self) -> GateState {
        self.state
    }

    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.state == GateState::Finalized
    }

    /// # Errors
    ///
    /// Returns `GateError::Finalized` once the gate is closed.
    pub fn ensure_open(&self) -> Result<(), GateError> {
        match self.state {
            GateState::Open => Ok(()),
            GateState::Finalized => Err(GateError::Finalized),
        }
    }

    /// Close the gate. Call only after the remote finalize/submit succeeded.
    pub fn finalize(&mut self) {
        self.state = GateState::Finalized;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_open_and_finalizes_once() {
        let mut gate = FinalizationGate::open();
        assert!(gate.ensure_open().is_ok());

        gate.finalize();
        assert_eq!(gate.state(), GateState::Finalized);
        assert_eq!(gate.ensure_open(), Err(GateError::Finalized));

        gate.finalize();
        assert!(gate.is_finalized());
    }

    #[test]
    fn from_remote_respects_server_flag() {
        assert!(FinalizationGate::from_remote(true).is_finalized());
        assert!(!FinalizationGate::from_remote(false).is_finalized());
    }
}
