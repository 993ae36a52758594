//! AR session plumbing: platform interface, session lifecycle, and the
//! per-frame hit-test pipeline.
//!
//! ## Per-frame order
//!
//! ```text
//! pump_xr_events          platform queue -> SelectEvent / teardown
//!   handle_start_session  StartSessionEvent -> deferred session request
//!     poll_session_request
//!       begin_xr_frame    frame driver: snapshot or None (preview)
//!         update_hit_test lazy source negotiation + surface query
//! ```
//!
//! Placement and the reticle mirror run after `update_hit_test`, so what
//! is drawn and what a select commits always reflect this frame's query.

/// Frame driver and hit-test pipeline writing the reticle state.
pub mod hit_test;

/// Platform AR interface: deferred negotiation, frames, events.
pub mod runtime;

/// Session lifecycle state machine and session-scoped context.
pub mod session;

/// Deterministic backend for desktop preview and tests.
pub mod simulated;

use bevy::prelude::*;

use crate::engine::scene::reticle::ReticleState;
use hit_test::{ActiveXrFrame, begin_xr_frame, update_hit_test};
use session::{
    SelectEvent, SessionState, StartSessionEvent, XrSessionContext, handle_start_session,
    poll_session_request, pump_xr_events,
};

// Registers the session state machine, frame driver, and hit-test pipeline.
// Expects an `XrRuntime` resource to be inserted by the host.
pub struct XrPlugin;

impl Plugin for XrPlugin {
    fn build(&self, app: &mut App) {
        app.init_state::<SessionState>()
            .init_resource::<XrSessionContext>()
            .init_resource::<ActiveXrFrame>()
            .init_resource::<ReticleState>()
            .add_event::<StartSessionEvent>()
            .add_event::<SelectEvent>()
            .add_systems(
                Update,
                (
                    pump_xr_events,
                    handle_start_session,
                    poll_session_request,
                    begin_xr_frame,
                    update_hit_test,
                )
                    .chain(),
            );
    }
}
