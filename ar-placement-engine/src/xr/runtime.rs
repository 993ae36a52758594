use std::any::Any;

use bevy::prelude::*;
use thiserror::Error;

/// Presentation modes a runtime can be asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionMode {
    /// Camera-backed augmented presentation.
    ImmersiveAr,
    /// Flat rendering into the normal viewport, no camera passthrough.
    Inline,
}

/// Coordinate frames a pose can be expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceSpaceKind {
    /// Head-locked frame, anchors the forward-looking hit-test ray.
    Viewer,
    /// Stationary frame near the session origin, used for rendered content.
    Local,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReferenceSpaceHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HitTestSourceHandle(pub u64);

/// Per-frame snapshot token. Only valid during the frame it was issued for.
#[derive(Debug, Clone, Copy)]
pub struct XrFrame {
    pub index: u64,
}

/// Outcome of polling a deferred runtime request.
#[derive(Debug, Clone)]
pub enum XrPoll<T> {
    /// Negotiation still in flight; poll again next frame.
    Pending,
    Ready(T),
    Failed(XrError),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum XrError {
    #[error("session mode {0:?} is not supported by this device")]
    UnsupportedMode(SessionMode),
    #[error("session request was declined")]
    SessionDenied,
    #[error("reference space {0:?} could not be established")]
    ReferenceSpaceUnavailable(ReferenceSpaceKind),
    #[error("hit-test source negotiation failed")]
    HitTestUnavailable,
    #[error("request {0:?} is unknown to the runtime")]
    UnknownRequest(RequestId),
}

/// Out-of-band notifications the platform surfaces between frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XrEvent {
    /// The session ended, whether by the user, the platform, or an error.
    SessionEnded(SessionHandle),
    /// The user triggered the primary "select" input.
    Select,
}

/// Platform AR interface.
///
/// Session, reference-space, and hit-test-source acquisition are deferred:
/// the caller holds a [`RequestId`] and polls once per frame until the
/// runtime answers `Ready` or `Failed`. Only the per-frame hit-test query
/// is synchronous.
pub trait XrSystem: Send + Sync + 'static {
    fn request_session(&mut self, mode: SessionMode) -> RequestId;
    fn poll_session(&mut self, request: RequestId) -> XrPoll<SessionHandle>;

    /// Configure the frame that hit poses are resolved against for the rest
    /// of the session. Takes effect before the next `begin_frame`.
    fn set_reference_space_kind(&mut self, session: SessionHandle, kind: ReferenceSpaceKind);

    fn request_reference_space(
        &mut self,
        session: SessionHandle,
        kind: ReferenceSpaceKind,
    ) -> RequestId;
    fn poll_reference_space(&mut self, request: RequestId) -> XrPoll<ReferenceSpaceHandle>;

    fn request_hit_test_source(
        &mut self,
        session: SessionHandle,
        space: ReferenceSpaceHandle,
    ) -> RequestId;
    fn poll_hit_test_source(&mut self, request: RequestId) -> XrPoll<HitTestSourceHandle>;

    /// Snapshot for the frame being presented, or `None` when the given
    /// session is not presenting (ended, stale handle, preview mode).
    fn begin_frame(&mut self, session: SessionHandle) -> Option<XrFrame>;

    /// Surface intersections for this frame, best candidate first, poses
    /// already resolved against the session's configured reference space.
    fn hit_test(&self, frame: &XrFrame, source: HitTestSourceHandle) -> Vec<Mat4>;

    fn drain_events(&mut self) -> Vec<XrEvent>;

    /// Ask the platform to end the session. Completion is reported through
    /// a `SessionEnded` event, never synchronously.
    fn end_session(&mut self, session: SessionHandle);

    /// Escape hatch so host-side tooling can reach a concrete backend.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// The platform backend the whole XR stack talks through.
#[derive(Resource)]
pub struct XrRuntime(pub Box<dyn XrSystem>);
