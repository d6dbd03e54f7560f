use crate::FaultCode;

/// Execution-state machine for host-observable control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum RunState {
    /// Ready to execute the next instruction.
    #[default]
    Running,
    /// `HLT` retired; no further progress until reset.
    Halted,
    /// Terminal fault is latched; no further progress until reset.
    FaultLatched(FaultCode),
}

impl RunState {
    /// Returns the currently latched fault, if any.
    #[must_use]
    pub const fn latched_fault(self) -> Option<FaultCode> {
        match self {
            Self::FaultLatched(cause) => Some(cause),
            Self::Running | Self::Halted => None,
        }
    }

    /// Returns `true` once the interrupt queue has overflowed.
    #[must_use]
    pub const fn on_fire(self) -> bool {
        matches!(self, Self::FaultLatched(FaultCode::InterruptQueueOverflow))
    }
}

#[cfg(test)]
mod tests {
    use super::RunState;
    use crate::FaultCode;

    #[test]
    fn run_state_default_is_running() {
        assert_eq!(RunState::default(), RunState::Running);
    }

    #[test]
    fn latched_fault_accessor_reports_only_fault_latched_variant() {
        assert_eq!(RunState::Running.latched_fault(), None);
        assert_eq!(RunState::Halted.latched_fault(), None);
        assert_eq!(
            RunState::FaultLatched(FaultCode::InterruptQueueOverflow).latched_fault(),
            Some(FaultCode::InterruptQueueOverflow)
        );
    }

    #[test]
    fn on_fire_tracks_queue_overflow_only() {
        assert!(RunState::FaultLatched(FaultCode::InterruptQueueOverflow).on_fire());
        assert!(!RunState::Halted.on_fire());
        assert!(!RunState::Running.on_fire());
    }
}
