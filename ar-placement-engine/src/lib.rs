//! AR surface placement: point the device at a surface, watch the reticle
//! snap to it, place a model from the shop catalogue with "select".

pub mod engine;
pub mod tools;
pub mod xr;

pub use engine::core::app_setup::create_app;
