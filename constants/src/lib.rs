pub mod camera;
pub mod path;
pub mod reticle;
