/// Flat ring marker dimensions, metres.
pub const RETICLE_INNER_RADIUS: f32 = 0.15;
pub const RETICLE_OUTER_RADIUS: f32 = 0.2;
pub const RETICLE_SEGMENTS: u32 = 32;
