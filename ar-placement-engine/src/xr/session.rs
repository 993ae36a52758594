use bevy::prelude::*;

use crate::engine::scene::reticle::ReticleState;
use crate::xr::hit_test::HitTestSourcePhase;
use crate::xr::runtime::{
    HitTestSourceHandle, ReferenceSpaceKind, RequestId, SessionHandle, SessionMode, XrEvent,
    XrPoll, XrRuntime,
};

/// Session lifecycle, one full cycle per [`StartSessionEvent`].
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash, States)]
pub enum SessionState {
    /// No session exists; a start event begins a new cycle.
    #[default]
    Inactive,
    /// A session request is in flight with the platform.
    Requested,
    /// The session is live and frames may carry hit-test snapshots.
    Active,
}

/// Everything scoped to a single session.
///
/// `reset` is the only teardown path, so an end notification can never
/// leave a stale handle or a half-cleared negotiation behind.
#[derive(Resource, Default)]
pub struct XrSessionContext {
    pub session: Option<SessionHandle>,
    pub pending_session: Option<RequestId>,
    pub hit_test: HitTestSourcePhase,
}

impl XrSessionContext {
    /// Clear every session-scoped handle in one step.
    pub fn reset(&mut self) {
        self.session = None;
        self.pending_session = None;
        self.hit_test = HitTestSourcePhase::Unrequested;
    }

    /// Live hit-test source, if negotiation has completed.
    pub fn hit_test_source(&self) -> Option<HitTestSourceHandle> {
        match self.hit_test {
            HitTestSourcePhase::Ready(source) => Some(source),
            _ => None,
        }
    }

    /// True while a source request is in flight for this session.
    pub fn hit_test_pending(&self) -> bool {
        matches!(
            self.hit_test,
            HitTestSourcePhase::ViewerSpaceRequested(_) | HitTestSourcePhase::SourceRequested(_)
        )
    }
}

/// Ask the lifecycle manager to acquire an immersive AR session.
#[derive(Event, Default)]
pub struct StartSessionEvent;

/// The user triggered the primary "select" input.
#[derive(Event, Default)]
pub struct SelectEvent;

// Translate platform notifications into frame-synchronised events and tear
// session-scoped state down when the platform reports the session gone.
pub fn pump_xr_events(
    mut runtime: ResMut<XrRuntime>,
    mut context: ResMut<XrSessionContext>,
    mut reticle: ResMut<ReticleState>,
    mut next_state: ResMut<NextState<SessionState>>,
    mut select_events: EventWriter<SelectEvent>,
) {
    for event in runtime.0.drain_events() {
        match event {
            XrEvent::Select => {
                select_events.send(SelectEvent);
            }
            XrEvent::SessionEnded(session) => {
                if context.session != Some(session) {
                    // Late notification for a session already torn down.
                    continue;
                }
                info!("AR session ended, clearing session-scoped state");
                context.reset();
                reticle.visible = false;
                next_state.set(SessionState::Inactive);
            }
        }
    }
}

pub fn handle_start_session(
    mut events: EventReader<StartSessionEvent>,
    mut runtime: ResMut<XrRuntime>,
    mut context: ResMut<XrSessionContext>,
    state: Res<State<SessionState>>,
    mut next_state: ResMut<NextState<SessionState>>,
) {
    for _ in events.read() {
        // The pending-request check also covers a second start event arriving
        // before the state transition has been applied.
        if *state.get() != SessionState::Inactive || context.pending_session.is_some() {
            debug!("ignoring session start request, a session cycle is already underway");
            continue;
        }
        context.pending_session = Some(runtime.0.request_session(SessionMode::ImmersiveAr));
        next_state.set(SessionState::Requested);
    }
}

pub fn poll_session_request(
    mut runtime: ResMut<XrRuntime>,
    mut context: ResMut<XrSessionContext>,
    mut next_state: ResMut<NextState<SessionState>>,
) {
    let Some(request) = context.pending_session else {
        return;
    };

    match runtime.0.poll_session(request) {
        XrPoll::Pending => {}
        XrPoll::Ready(session) => {
            context.pending_session = None;
            context.session = Some(session);
            // Rendered content is expressed in a stationary local frame.
            runtime
                .0
                .set_reference_space_kind(session, ReferenceSpaceKind::Local);
            context.hit_test = HitTestSourcePhase::Unrequested;
            info!("AR session established");
            next_state.set(SessionState::Active);
        }
        XrPoll::Failed(err) => {
            context.pending_session = None;
            warn!("AR session unavailable: {err}");
            next_state.set(SessionState::Inactive);
        }
    }
}

/// Hand the session back to the platform on Escape (native preview only).
/// Teardown itself happens when the platform's end notification arrives.
#[cfg(not(target_arch = "wasm32"))]
pub fn end_session_on_escape(
    keyboard: Res<ButtonInput<KeyCode>>,
    context: Res<XrSessionContext>,
    mut runtime: ResMut<XrRuntime>,
) {
    if keyboard.just_pressed(KeyCode::Escape) {
        if let Some(session) = context.session {
            runtime.0.end_session(session);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xr::runtime::HitTestSourceHandle;

    #[test]
    fn reset_clears_all_session_scoped_state() {
        let mut context = XrSessionContext {
            session: Some(SessionHandle(7)),
            pending_session: Some(RequestId(3)),
            hit_test: HitTestSourcePhase::SourceRequested(RequestId(4)),
        };

        context.reset();

        assert_eq!(context.session, None);
        assert_eq!(context.pending_session, None);
        assert_eq!(context.hit_test, HitTestSourcePhase::Unrequested);
    }

    #[test]
    fn pending_flag_is_a_projection_of_the_phase() {
        let mut context = XrSessionContext::default();
        assert!(!context.hit_test_pending());

        context.hit_test = HitTestSourcePhase::ViewerSpaceRequested(RequestId(1));
        assert!(context.hit_test_pending());

        context.hit_test = HitTestSourcePhase::SourceRequested(RequestId(2));
        assert!(context.hit_test_pending());

        context.hit_test = HitTestSourcePhase::Ready(HitTestSourceHandle(5));
        assert!(!context.hit_test_pending());
        assert_eq!(context.hit_test_source(), Some(HitTestSourceHandle(5)));

        context.hit_test = HitTestSourcePhase::Failed;
        assert!(!context.hit_test_pending());
        assert_eq!(context.hit_test_source(), None);
    }
}
