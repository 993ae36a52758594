use std::any::Any;
use std::collections::{HashMap, VecDeque};

use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::xr::runtime::{
    HitTestSourceHandle, ReferenceSpaceHandle, ReferenceSpaceKind, RequestId, SessionHandle,
    SessionMode, XrError, XrEvent, XrFrame, XrPoll, XrRuntime, XrSystem,
};

/// Deterministic in-process XR backend.
///
/// Stands in for a real device during desktop preview and drives the test
/// scenarios: every negotiation step resolves after a configurable number
/// of polls, failures can be injected per step, and detected surfaces are
/// fed in from outside.
pub struct SimulatedXr {
    supported_modes: Vec<SessionMode>,
    session_latency: u32,
    space_latency: u32,
    source_latency: u32,
    fail_reference_space: bool,
    fail_hit_test_source: bool,
    next_id: u64,
    active_session: Option<SessionHandle>,
    reference_space_kind: Option<ReferenceSpaceKind>,
    pending: HashMap<RequestId, PendingRequest>,
    events: VecDeque<XrEvent>,
    surfaces: Vec<Mat4>,
    frame_index: u64,
    session_requests: u32,
    source_requests: u32,
}

#[derive(Debug, Clone, Copy)]
enum PendingRequest {
    Session { mode: SessionMode, remaining: u32 },
    ReferenceSpace { kind: ReferenceSpaceKind, remaining: u32 },
    HitTestSource { remaining: u32 },
}

impl Default for SimulatedXr {
    fn default() -> Self {
        Self {
            supported_modes: vec![SessionMode::ImmersiveAr, SessionMode::Inline],
            session_latency: 1,
            space_latency: 1,
            source_latency: 1,
            fail_reference_space: false,
            fail_hit_test_source: false,
            next_id: 1,
            active_session: None,
            reference_space_kind: None,
            pending: HashMap::new(),
            events: VecDeque::new(),
            surfaces: Vec::new(),
            frame_index: 0,
            session_requests: 0,
            source_requests: 0,
        }
    }
}

impl SimulatedXr {
    /// Number of `Pending` polls before each negotiation step resolves.
    pub fn with_latencies(session: u32, space: u32, source: u32) -> Self {
        Self {
            session_latency: session,
            space_latency: space,
            source_latency: source,
            ..Self::default()
        }
    }

    /// Runtime that rejects the immersive session mode outright.
    pub fn unsupported() -> Self {
        Self {
            supported_modes: vec![SessionMode::Inline],
            ..Self::default()
        }
    }

    /// Viewer-space requests fail once polled to completion.
    pub fn failing_reference_space() -> Self {
        Self {
            fail_reference_space: true,
            ..Self::default()
        }
    }

    /// Hit-test-source requests fail once polled to completion.
    pub fn failing_hit_test_source() -> Self {
        Self {
            fail_hit_test_source: true,
            ..Self::default()
        }
    }

    /// Replace the set of detected surfaces, best candidate first.
    pub fn set_surfaces(&mut self, surfaces: Vec<Mat4>) {
        self.surfaces = surfaces;
    }

    /// Queue a "select" input, delivered with the next event pump.
    pub fn trigger_select(&mut self) {
        self.events.push_back(XrEvent::Select);
    }

    /// End the live session the way a platform or user would.
    pub fn end_active_session(&mut self) {
        if let Some(session) = self.active_session.take() {
            self.finish_session(session);
        }
    }

    /// How many session requests the app has issued so far.
    pub fn session_request_count(&self) -> u32 {
        self.session_requests
    }

    /// How many hit-test-source requests the app has issued so far.
    pub fn source_request_count(&self) -> u32 {
        self.source_requests
    }

    // Session teardown on the platform side: in-flight negotiation tied to
    // the session is dropped, then the end notification is queued.
    fn finish_session(&mut self, session: SessionHandle) {
        self.reference_space_kind = None;
        self.pending.clear();
        self.events.push_back(XrEvent::SessionEnded(session));
    }

    fn allocate(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl XrSystem for SimulatedXr {
    fn request_session(&mut self, mode: SessionMode) -> RequestId {
        self.session_requests += 1;
        let id = RequestId(self.allocate());
        self.pending.insert(
            id,
            PendingRequest::Session {
                mode,
                remaining: self.session_latency,
            },
        );
        id
    }

    fn poll_session(&mut self, request: RequestId) -> XrPoll<SessionHandle> {
        let Some(entry) = self.pending.remove(&request) else {
            return XrPoll::Failed(XrError::UnknownRequest(request));
        };
        match entry {
            PendingRequest::Session { mode, remaining } => {
                if remaining > 0 {
                    self.pending.insert(
                        request,
                        PendingRequest::Session {
                            mode,
                            remaining: remaining - 1,
                        },
                    );
                    return XrPoll::Pending;
                }
                if !self.supported_modes.contains(&mode) {
                    return XrPoll::Failed(XrError::UnsupportedMode(mode));
                }
                let session = SessionHandle(self.allocate());
                self.active_session = Some(session);
                XrPoll::Ready(session)
            }
            other => {
                self.pending.insert(request, other);
                XrPoll::Failed(XrError::UnknownRequest(request))
            }
        }
    }

    fn set_reference_space_kind(&mut self, session: SessionHandle, kind: ReferenceSpaceKind) {
        if self.active_session == Some(session) {
            self.reference_space_kind = Some(kind);
        }
    }

    fn request_reference_space(
        &mut self,
        _session: SessionHandle,
        kind: ReferenceSpaceKind,
    ) -> RequestId {
        let id = RequestId(self.allocate());
        self.pending.insert(
            id,
            PendingRequest::ReferenceSpace {
                kind,
                remaining: self.space_latency,
            },
        );
        id
    }

    fn poll_reference_space(&mut self, request: RequestId) -> XrPoll<ReferenceSpaceHandle> {
        let Some(entry) = self.pending.remove(&request) else {
            return XrPoll::Failed(XrError::UnknownRequest(request));
        };
        match entry {
            PendingRequest::ReferenceSpace { kind, remaining } => {
                if remaining > 0 {
                    self.pending.insert(
                        request,
                        PendingRequest::ReferenceSpace {
                            kind,
                            remaining: remaining - 1,
                        },
                    );
                    return XrPoll::Pending;
                }
                if self.fail_reference_space {
                    return XrPoll::Failed(XrError::ReferenceSpaceUnavailable(kind));
                }
                XrPoll::Ready(ReferenceSpaceHandle(self.allocate()))
            }
            other => {
                self.pending.insert(request, other);
                XrPoll::Failed(XrError::UnknownRequest(request))
            }
        }
    }

    fn request_hit_test_source(
        &mut self,
        _session: SessionHandle,
        _space: ReferenceSpaceHandle,
    ) -> RequestId {
        self.source_requests += 1;
        let id = RequestId(self.allocate());
        self.pending.insert(
            id,
            PendingRequest::HitTestSource {
                remaining: self.source_latency,
            },
        );
        id
    }

    fn poll_hit_test_source(&mut self, request: RequestId) -> XrPoll<HitTestSourceHandle> {
        let Some(entry) = self.pending.remove(&request) else {
            return XrPoll::Failed(XrError::UnknownRequest(request));
        };
        match entry {
            PendingRequest::HitTestSource { remaining } => {
                if remaining > 0 {
                    self.pending.insert(
                        request,
                        PendingRequest::HitTestSource {
                            remaining: remaining - 1,
                        },
                    );
                    return XrPoll::Pending;
                }
                if self.fail_hit_test_source {
                    return XrPoll::Failed(XrError::HitTestUnavailable);
                }
                XrPoll::Ready(HitTestSourceHandle(self.allocate()))
            }
            other => {
                self.pending.insert(request, other);
                XrPoll::Failed(XrError::UnknownRequest(request))
            }
        }
    }

    fn begin_frame(&mut self, session: SessionHandle) -> Option<XrFrame> {
        if self.active_session != Some(session) {
            return None;
        }
        let frame = XrFrame {
            index: self.frame_index,
        };
        self.frame_index += 1;
        Some(frame)
    }

    fn hit_test(&self, _frame: &XrFrame, _source: HitTestSourceHandle) -> Vec<Mat4> {
        // Poses can only be resolved once a reference space is configured.
        if self.reference_space_kind.is_none() {
            return Vec::new();
        }
        self.surfaces.clone()
    }

    fn drain_events(&mut self) -> Vec<XrEvent> {
        self.events.drain(..).collect()
    }

    fn end_session(&mut self, session: SessionHandle) {
        if self.active_session == Some(session) {
            self.active_session = None;
            self.finish_session(session);
        }
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Desktop preview feed: raycast the cursor onto the flat ground plane and
/// hand the intersection to the simulated backend as the detected surface.
pub fn probe_simulated_surfaces(
    windows: Query<&Window, With<PrimaryWindow>>,
    cameras: Query<(&GlobalTransform, &Camera), With<Camera3d>>,
    mut runtime: ResMut<XrRuntime>,
) {
    let Some(sim) = runtime.0.as_any_mut().downcast_mut::<SimulatedXr>() else {
        return;
    };
    let Ok(window) = windows.single() else {
        return;
    };
    let Some(cursor_pos) = window.cursor_position() else {
        sim.set_surfaces(Vec::new());
        return;
    };
    let Ok((cam_xform, camera)) = cameras.single() else {
        return;
    };
    let Ok(ray) = camera.viewport_to_world(cam_xform, cursor_pos) else {
        return;
    };

    // Intersect with the y = 0 ground plane.
    let denom = ray.direction.y;
    if denom.abs() < 1e-6 {
        sim.set_surfaces(Vec::new());
        return;
    }
    let t = -ray.origin.y / denom;
    if t <= 0.0 {
        sim.set_surfaces(Vec::new());
        return;
    }
    let point = ray.origin + ray.direction * t;
    sim.set_surfaces(vec![Mat4::from_translation(point)]);
}

// Desktop stand-in for the controller "select" input, routed through the
// backend so it reaches the app the same way a device event would.
pub fn select_on_mouse_click(
    buttons: Res<ButtonInput<MouseButton>>,
    mut runtime: ResMut<XrRuntime>,
) {
    if !buttons.just_pressed(MouseButton::Left) {
        return;
    }
    if let Some(sim) = runtime.0.as_any_mut().downcast_mut::<SimulatedXr>() {
        sim.trigger_select();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_resolves_after_configured_polls() {
        let mut sim = SimulatedXr::with_latencies(2, 0, 0);
        let request = sim.request_session(SessionMode::ImmersiveAr);

        assert!(matches!(sim.poll_session(request), XrPoll::Pending));
        assert!(matches!(sim.poll_session(request), XrPoll::Pending));
        let XrPoll::Ready(session) = sim.poll_session(request) else {
            panic!("session should resolve on the third poll");
        };
        assert!(sim.begin_frame(session).is_some());
    }

    #[test]
    fn unsupported_mode_fails_the_session_request() {
        let mut sim = SimulatedXr::unsupported();
        let request = sim.request_session(SessionMode::ImmersiveAr);
        assert!(matches!(sim.poll_session(request), XrPoll::Pending));
        assert!(matches!(
            sim.poll_session(request),
            XrPoll::Failed(XrError::UnsupportedMode(SessionMode::ImmersiveAr))
        ));
        assert!(sim.begin_frame(SessionHandle(99)).is_none());
    }

    #[test]
    fn polling_an_unknown_request_is_an_error_not_a_panic() {
        let mut sim = SimulatedXr::default();
        assert!(matches!(
            sim.poll_session(RequestId(41)),
            XrPoll::Failed(XrError::UnknownRequest(RequestId(41)))
        ));
        assert!(matches!(
            sim.poll_hit_test_source(RequestId(42)),
            XrPoll::Failed(XrError::UnknownRequest(RequestId(42)))
        ));
    }

    #[test]
    fn ending_the_session_drops_in_flight_requests_and_notifies_once() {
        let mut sim = SimulatedXr::with_latencies(0, 0, 10);
        let request = sim.request_session(SessionMode::ImmersiveAr);
        let XrPoll::Ready(session) = sim.poll_session(request) else {
            panic!("zero-latency session should resolve immediately");
        };
        let space = ReferenceSpaceHandle(77);
        let source_request = sim.request_hit_test_source(session, space);

        sim.end_session(session);

        assert_eq!(sim.drain_events(), vec![XrEvent::SessionEnded(session)]);
        assert!(sim.drain_events().is_empty());
        assert!(sim.begin_frame(session).is_none());
        // The dropped negotiation can only answer "unknown" from now on.
        assert!(matches!(
            sim.poll_hit_test_source(source_request),
            XrPoll::Failed(XrError::UnknownRequest(_))
        ));
    }

    #[test]
    fn frames_carry_the_configured_surfaces_in_order() {
        let mut sim = SimulatedXr::with_latencies(0, 0, 0);
        let request = sim.request_session(SessionMode::ImmersiveAr);
        let XrPoll::Ready(session) = sim.poll_session(request) else {
            panic!("zero-latency session should resolve immediately");
        };
        sim.set_reference_space_kind(session, ReferenceSpaceKind::Local);
        let first = Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0));
        let second = Mat4::from_translation(Vec3::new(2.0, 0.0, 0.0));
        sim.set_surfaces(vec![first, second]);

        let frame = sim.begin_frame(session).unwrap();
        let hits = sim.hit_test(&frame, HitTestSourceHandle(1));
        assert_eq!(hits, vec![first, second]);
    }
}
