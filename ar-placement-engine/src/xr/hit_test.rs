use bevy::prelude::*;

use crate::engine::scene::reticle::ReticleState;
use crate::xr::runtime::{
    HitTestSourceHandle, ReferenceSpaceKind, RequestId, XrFrame, XrPoll, XrRuntime, XrSystem,
};
use crate::xr::session::XrSessionContext;

/// Negotiation progress for the session's hit-test source.
///
/// The phase itself is the duplicate-request guard: a request can only be
/// issued from `Unrequested`, and session teardown is the only way back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HitTestSourcePhase {
    /// Nothing requested yet; the first frame with a live session requests.
    #[default]
    Unrequested,
    /// Waiting on the viewer reference space.
    ViewerSpaceRequested(RequestId),
    /// Viewer space resolved; waiting on the hit-test source itself.
    SourceRequested(RequestId),
    /// Source live; frames can be queried.
    Ready(HitTestSourceHandle),
    /// Negotiation failed. Stays failed until a new session; the reticle
    /// simply never appears.
    Failed,
}

/// Snapshot handed to this frame's systems, `None` while not presenting.
#[derive(Resource, Default)]
pub struct ActiveXrFrame(pub Option<XrFrame>);

// Frame driver: fetch the platform snapshot before any per-frame XR work.
pub fn begin_xr_frame(
    mut runtime: ResMut<XrRuntime>,
    context: Res<XrSessionContext>,
    mut frame: ResMut<ActiveXrFrame>,
) {
    frame.0 = context
        .session
        .and_then(|session| runtime.0.begin_frame(session));
}

/// Per-frame hit-test step: lazily negotiate the source, then query the
/// frame and publish the result to [`ReticleState`].
///
/// Runs synchronously inside the frame schedule; platform failures are
/// logged and absorbed here, they never escape into the frame loop.
pub fn update_hit_test(
    mut runtime: ResMut<XrRuntime>,
    mut context: ResMut<XrSessionContext>,
    frame: Res<ActiveXrFrame>,
    mut reticle: ResMut<ReticleState>,
) {
    let Some(frame) = frame.0 else {
        // Not presenting (preview mode); leave the reticle as-is.
        return;
    };

    advance_source_negotiation(runtime.0.as_mut(), &mut context);

    match context.hit_test {
        HitTestSourcePhase::Ready(source) => {
            let hits = runtime.0.hit_test(&frame, source);
            match hits.first() {
                Some(pose) => {
                    reticle.pose = *pose;
                    reticle.visible = true;
                }
                None => reticle.visible = false,
            }
        }
        _ => reticle.visible = false,
    }
}

// Drive the two-phase negotiation. A resolved viewer space chains straight
// into the source request, so a source can become Ready and be queried
// within the same frame its negotiation completes.
fn advance_source_negotiation(runtime: &mut dyn XrSystem, context: &mut XrSessionContext) {
    let Some(session) = context.session else {
        return;
    };

    context.hit_test = match context.hit_test {
        HitTestSourcePhase::Unrequested => HitTestSourcePhase::ViewerSpaceRequested(
            runtime.request_reference_space(session, ReferenceSpaceKind::Viewer),
        ),
        HitTestSourcePhase::ViewerSpaceRequested(request) => {
            match runtime.poll_reference_space(request) {
                XrPoll::Pending => HitTestSourcePhase::ViewerSpaceRequested(request),
                XrPoll::Ready(space) => HitTestSourcePhase::SourceRequested(
                    runtime.request_hit_test_source(session, space),
                ),
                XrPoll::Failed(err) => {
                    warn!("viewer space unavailable: {err}");
                    HitTestSourcePhase::Failed
                }
            }
        }
        HitTestSourcePhase::SourceRequested(request) => {
            match runtime.poll_hit_test_source(request) {
                XrPoll::Pending => HitTestSourcePhase::SourceRequested(request),
                XrPoll::Ready(source) => {
                    info!("hit-test source ready");
                    HitTestSourcePhase::Ready(source)
                }
                XrPoll::Failed(err) => {
                    warn!("hit-test source unavailable: {err}");
                    HitTestSourcePhase::Failed
                }
            }
        }
        phase @ (HitTestSourcePhase::Ready(_) | HitTestSourcePhase::Failed) => phase,
    };
}
