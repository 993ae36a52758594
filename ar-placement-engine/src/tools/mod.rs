//! Interactive tools layered on the AR view.

/// Surface placement tool committing the placeable model to the reticle pose.
pub mod placement;
