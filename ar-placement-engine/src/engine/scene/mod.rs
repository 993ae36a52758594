//! Scene-level entities the AR view renders around the placeable model.

/// Reticle marker entity and the state mirror written by hit testing.
pub mod reticle;
