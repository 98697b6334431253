use std::sync::Once;

use monitor_core::{
    update, AppState, ArtifactKind, Clock, Effect, JobPhase, JobStatus, Msg, RequestId,
    RunRequest, Severity, StartReply, TaskPhase,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(monitor_logging::initialize_for_tests);
}

fn login_required_state() -> AppState {
    let state = AppState::with_clock(Clock::new(|| "10:00:00".to_string()));
    let (state, effects) = update(
        state,
        Msg::StartRequested(RunRequest::new(20, 80, "ward_b")),
    );
    let request_id = match effects.as_slice() {
        [Effect::StartJob { request_id, .. }] => *request_id,
        other => panic!("expected a start effect, got {other:?}"),
    };
    let (state, effects) = update(
        state,
        Msg::StartResponded {
            request_id,
            result: Ok(StartReply::LoginRequired),
        },
    );
    assert!(effects.is_empty());
    state
}

/// Confirms the login and returns the serial of the save-session call.
fn confirm(state: AppState) -> (AppState, RequestId) {
    let (state, effects) = update(state, Msg::ConfirmSessionRequested);
    match effects.as_slice() {
        [Effect::SaveSession {
            request_id,
            request,
        }] => {
            assert_eq!(request, &RunRequest::new(20, 80, "ward_b"));
            (state, *request_id)
        }
        other => panic!("expected a save-session effect, got {other:?}"),
    }
}

#[test]
fn login_required_stashes_submitted_parameters() {
    init_logging();
    let state = login_required_state();

    assert_eq!(state.phase(), TaskPhase::LoginRequired);
    assert_eq!(
        state.login_request(),
        Some(&RunRequest::new(20, 80, "ward_b"))
    );
    assert!(state.handle().is_none());
    assert_eq!(
        state.console().iter().last().map(|e| e.severity),
        Some(Severity::Warning)
    );
}

#[test]
fn manual_login_launch_does_not_change_phase() {
    init_logging();
    let (state, effects) = update(login_required_state(), Msg::ManualLoginRequested);
    assert_eq!(
        effects,
        vec![Effect::LaunchLogin(RunRequest::new(20, 80, "ward_b"))]
    );

    let (state, _) = update(state, Msg::ManualLoginResponded(Ok(())));
    assert_eq!(state.phase(), TaskPhase::LoginRequired);
    assert_eq!(
        state.console().iter().last().map(|e| e.severity),
        Some(Severity::Success)
    );

    let (state, _) = update(state, Msg::ManualLoginResponded(Err("boom".to_string())));
    assert_eq!(state.phase(), TaskPhase::LoginRequired);
    assert_eq!(
        state.console().iter().last().map(|e| e.severity),
        Some(Severity::Error)
    );
}

#[test]
fn manual_login_outside_flow_is_ignored() {
    init_logging();
    let (state, effects) = update(AppState::new(), Msg::ManualLoginRequested);
    assert!(effects.is_empty());
    assert!(state.console().is_empty());
}

#[test]
fn confirm_session_creates_job_and_promotes_on_poll() {
    init_logging();
    let (state, request_id) = confirm(login_required_state());

    let (state, effects) = update(
        state,
        Msg::ConfirmSessionResponded {
            request_id,
            result: Ok("T7".to_string()),
        },
    );
    assert_eq!(
        effects,
        vec![
            Effect::StartPolling {
                job_id: "T7".to_string()
            },
            Effect::ListArtifacts(ArtifactKind::Sessions),
        ]
    );
    assert_eq!(state.phase(), TaskPhase::SavingSession);
    assert_eq!(state.handle().map(|h| h.phase), Some(JobPhase::SavingSession));
    assert!(state.login_request().is_none());
    // Cleared on job start; only the confirmation remains.
    assert_eq!(state.console().len(), 1);
    assert_eq!(state.view().progress_percent(), Some(10));

    let (state, effects) = update(
        state,
        Msg::StatusPolled {
            job_id: "T7".to_string(),
            result: Ok(JobStatus::new(JobPhase::Running)),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.phase(), TaskPhase::Running);
    assert_eq!(state.handle().map(|h| h.phase), Some(JobPhase::Running));
}

#[test]
fn failed_save_session_stays_in_login_flow() {
    init_logging();
    let (state, request_id) = confirm(login_required_state());
    let (state, effects) = update(
        state,
        Msg::ConfirmSessionResponded {
            request_id,
            result: Err("http status 500".to_string()),
        },
    );

    assert!(effects.is_empty());
    assert_eq!(state.phase(), TaskPhase::LoginRequired);
    assert!(state.login_request().is_some());
    assert!(!state.view().request_in_flight);
}

#[test]
fn dismissing_login_discards_request() {
    init_logging();
    let (state, effects) = update(login_required_state(), Msg::LoginDismissed);
    assert!(effects.is_empty());
    assert_eq!(state.phase(), TaskPhase::Idle);
    assert!(state.login_request().is_none());

    let (_, effects) = update(state, Msg::ConfirmSessionRequested);
    assert!(effects.is_empty());
}

#[test]
fn second_confirm_while_saving_warns() {
    init_logging();
    let (state, _) = confirm(login_required_state());
    let (state, effects) = update(state, Msg::ConfirmSessionRequested);

    assert!(effects.is_empty());
    assert_eq!(
        state.console().iter().last().map(|e| e.severity),
        Some(Severity::Warning)
    );
    assert_eq!(state.phase(), TaskPhase::LoginRequired);
}

#[test]
fn save_session_reply_after_reset_is_dropped() {
    init_logging();
    let (state, request_id) = confirm(login_required_state());
    let (state, _) = update(state, Msg::Reset);

    let (state, effects) = update(
        state,
        Msg::ConfirmSessionResponded {
            request_id,
            result: Ok("T7".to_string()),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.phase(), TaskPhase::Idle);
    assert!(state.handle().is_none());
}
