use bevy::prelude::*;

/// Vertical field of view of the AR preview camera, degrees.
pub const VIEWER_FOV_DEGREES: f32 = 70.0;
pub const VIEWER_NEAR: f32 = 0.01;
pub const VIEWER_FAR: f32 = 20.0;

/// Seated viewer eye position, looking toward the scene origin.
pub const VIEWER_START: Vec3 = Vec3::new(0.0, 1.6, 2.0);
