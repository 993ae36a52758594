use bevy::prelude::*;
#[derive(Resource, Default)]
pub struct LoadingProgress {
    pub catalog_loaded: bool,
    pub model_requested: bool,
    pub model_ready: bool,
}
