//! Pure transition planning.
//!
//! Maps (state, command) to the action the worker must execute. No side
//! effects here, which keeps the transition table testable in isolation;
//! the worker owns resources and carries the actions out.

use crate::command::CaptureCommand;
use crate::state::CaptureState;

/// What the worker should do for a command in the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Action {
    /// Command is not valid in this state: log and drop
    Ignore,

    /// Acquire camera + estimator, enter countdown
    AcquireCamera,

    /// Decrement the countdown; start recording at zero
    CountdownTick,

    /// Buffer one sampling tick
    IngestSample,

    /// Stop sampling/recorder, finalize metrics, enter reviewing
    FinalizeRecording,

    /// Submit to the scoring collaborator
    BeginAnalysis,

    /// Apply (or reject) the scoring result
    ApplyAnalysis,

    /// Apply a coach reconciliation edit
    Reconcile,

    /// Package and persist the reconciled record
    BeginSave,

    /// Apply the save/fusion outcome
    ApplySave,

    /// Release everything and return to idle
    Reset,

    /// Stop the worker
    Shutdown,
}

/// The transition table.
pub(crate) fn plan(state: &CaptureState, command: &CaptureCommand) -> Action {
    use CaptureCommand as Cmd;
    use CaptureState as St;

    match command {
        // A second request while counting down (or any other non-idle
        // state) is a no-op.
        Cmd::RequestCapture => match state {
            St::Idle => Action::AcquireCamera,
            _ => Action::Ignore,
        },

        Cmd::CountdownTick { .. } => match state {
            St::Countdown(_) => Action::CountdownTick,
            _ => Action::Ignore,
        },

        Cmd::FrameSampled { .. } => match state {
            St::Recording => Action::IngestSample,
            _ => Action::Ignore,
        },

        // Explicit stop, the ceiling timer and stream exhaustion all
        // converge on the same finalization, guarded by the state so it
        // runs exactly once.
        Cmd::StopCapture | Cmd::RecordCeiling { .. } | Cmd::SamplingEnded { .. } => match state {
            St::Recording => Action::FinalizeRecording,
            _ => Action::Ignore,
        },

        // Analysis runs from reviewing, and again from reconciling when the
        // coach re-scores with a variation override.
        Cmd::Analyze => match state {
            St::Reviewing | St::Reconciling => Action::BeginAnalysis,
            _ => Action::Ignore,
        },

        Cmd::AnalysisDone { .. } => match state {
            St::Analyzing => Action::ApplyAnalysis,
            _ => Action::Ignore,
        },

        Cmd::SetKpiEditing { .. } | Cmd::SetKpiPass { .. } | Cmd::SetVariationOverride { .. } => {
            match state {
                St::Reconciling => Action::Reconcile,
                _ => Action::Ignore,
            }
        }

        Cmd::Save => match state {
            St::Reconciling => Action::BeginSave,
            _ => Action::Ignore,
        },

        Cmd::SaveDone { .. } => match state {
            St::Reconciling => Action::ApplySave,
            _ => Action::Ignore,
        },

        // Always available; from idle there is nothing to reset.
        Cmd::Retake => match state {
            St::Idle => Action::Ignore,
            _ => Action::Reset,
        },

        Cmd::Shutdown => Action::Shutdown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::FaultKind;

    fn all_states() -> Vec<CaptureState> {
        vec![
            CaptureState::Idle,
            CaptureState::Countdown(2),
            CaptureState::Recording,
            CaptureState::Reviewing,
            CaptureState::Analyzing,
            CaptureState::Reconciling,
            CaptureState::Saved,
            CaptureState::Error(FaultKind::CameraUnavailable),
        ]
    }

    #[test]
    fn test_request_capture_only_from_idle() {
        for state in all_states() {
            let action = plan(&state, &CaptureCommand::RequestCapture);
            if state == CaptureState::Idle {
                assert_eq!(action, Action::AcquireCamera);
            } else {
                assert_eq!(action, Action::Ignore, "state {state:?}");
            }
        }
    }

    #[test]
    fn test_stop_only_from_recording() {
        for state in all_states() {
            let action = plan(&state, &CaptureCommand::StopCapture);
            if state == CaptureState::Recording {
                assert_eq!(action, Action::FinalizeRecording);
            } else {
                assert_eq!(action, Action::Ignore, "state {state:?}");
            }
        }
    }

    #[test]
    fn test_ceiling_converges_on_finalization() {
        assert_eq!(
            plan(
                &CaptureState::Recording,
                &CaptureCommand::RecordCeiling { epoch: 0 }
            ),
            Action::FinalizeRecording
        );
        // Ceiling firing after an explicit stop finds reviewing and no-ops
        assert_eq!(
            plan(
                &CaptureState::Reviewing,
                &CaptureCommand::RecordCeiling { epoch: 0 }
            ),
            Action::Ignore
        );
    }

    #[test]
    fn test_analyze_from_reviewing_and_reconciling() {
        assert_eq!(
            plan(&CaptureState::Reviewing, &CaptureCommand::Analyze),
            Action::BeginAnalysis
        );
        assert_eq!(
            plan(&CaptureState::Reconciling, &CaptureCommand::Analyze),
            Action::BeginAnalysis
        );
        assert_eq!(
            plan(&CaptureState::Analyzing, &CaptureCommand::Analyze),
            Action::Ignore
        );
        assert_eq!(
            plan(&CaptureState::Idle, &CaptureCommand::Analyze),
            Action::Ignore
        );
    }

    #[test]
    fn test_save_only_from_reconciling() {
        for state in all_states() {
            let action = plan(&state, &CaptureCommand::Save);
            if state == CaptureState::Reconciling {
                assert_eq!(action, Action::BeginSave);
            } else {
                assert_eq!(action, Action::Ignore, "state {state:?}");
            }
        }
    }

    #[test]
    fn test_retake_always_resets_except_idle() {
        for state in all_states() {
            let action = plan(&state, &CaptureCommand::Retake);
            if state == CaptureState::Idle {
                assert_eq!(action, Action::Ignore);
            } else {
                assert_eq!(action, Action::Reset, "state {state:?}");
            }
        }
    }

    #[test]
    fn test_coach_edits_only_while_reconciling() {
        let cmd = CaptureCommand::SetKpiPass {
            key: "depth".into(),
            pass: false,
        };
        assert_eq!(plan(&CaptureState::Reconciling, &cmd), Action::Reconcile);
        assert_eq!(plan(&CaptureState::Reviewing, &cmd), Action::Ignore);
        assert_eq!(plan(&CaptureState::Idle, &cmd), Action::Ignore);
    }

    #[test]
    fn test_stale_analysis_result_in_wrong_state_ignored() {
        let cmd = CaptureCommand::AnalysisDone {
            epoch: 0,
            result: Err(contracts::ScreenError::analysis_failed("late")),
        };
        assert_eq!(plan(&CaptureState::Idle, &cmd), Action::Ignore);
        assert_eq!(plan(&CaptureState::Reviewing, &cmd), Action::Ignore);
    }
}
