use bevy::asset::LoadState;
use bevy::prelude::*;

use constants::path::{CATALOG_FILE, RELATIVE_ASSET_PATH};

use crate::engine::loading::catalog::ModelCatalog;
use crate::engine::loading::progress::LoadingProgress;
use crate::tools::placement::Placeable;

#[derive(Resource, Default)]
pub struct ModelLoader {
    catalog: Option<Handle<ModelCatalog>>,
    scene: Option<Handle<Scene>>,
}

/// Which catalogue entry the user asked to preview.
#[derive(Resource, Default)]
pub struct SelectedModel(pub usize);

// Start the loading process
pub fn start_catalog_load(mut model_loader: ResMut<ModelLoader>, asset_server: Res<AssetServer>) {
    let catalog_path = format!("{}/{}", RELATIVE_ASSET_PATH, CATALOG_FILE);
    model_loader.catalog = Some(asset_server.load(&catalog_path));
}

// Resolve the catalogue once the JSON asset is in
pub fn load_catalog_system(
    mut loading_progress: ResMut<LoadingProgress>,
    model_loader: Res<ModelLoader>,
    catalogs: Res<Assets<ModelCatalog>>,
) {
    if loading_progress.catalog_loaded {
        return;
    }

    if let Some(ref handle) = model_loader.catalog {
        if let Some(catalog) = catalogs.get(handle) {
            println!("✓ Model catalogue loaded ({} entries)", catalog.models.len());
            loading_progress.catalog_loaded = true;
        }
    }
}

// Kick off the glTF scene load for the selected catalogue entry
pub fn load_model_system(
    mut loading_progress: ResMut<LoadingProgress>,
    mut model_loader: ResMut<ModelLoader>,
    catalogs: Res<Assets<ModelCatalog>>,
    selected: Res<SelectedModel>,
    asset_server: Res<AssetServer>,
) {
    if !loading_progress.catalog_loaded || loading_progress.model_requested {
        return;
    }

    let Some(catalog) = model_loader.catalog.as_ref().and_then(|h| catalogs.get(h)) else {
        return;
    };
    let Some(entry) = catalog.get(selected.0) else {
        warn!("catalogue has no entry at index {}", selected.0);
        loading_progress.model_requested = true;
        return;
    };

    let scene_path = format!("{}/{}#Scene0", RELATIVE_ASSET_PATH, entry.file);
    info!("loading model '{}' from {scene_path}", entry.name);
    model_loader.scene = Some(asset_server.load(&scene_path));
    loading_progress.model_requested = true;
}

// Spawn the hidden placeable once its scene has finished loading. A failed
// load still marks the stage done so the app reaches Running without a
// model to place; selects then stay no-ops.
pub fn spawn_placeable_when_ready(
    mut loading_progress: ResMut<LoadingProgress>,
    mut model_loader: ResMut<ModelLoader>,
    asset_server: Res<AssetServer>,
    mut commands: Commands,
) {
    if loading_progress.model_ready || !loading_progress.model_requested {
        return;
    }

    let Some(handle) = model_loader.scene.clone() else {
        loading_progress.model_ready = true;
        return;
    };

    match asset_server.get_load_state(&handle) {
        Some(LoadState::Loaded) => {
            commands.spawn((
                SceneRoot(handle),
                Transform::default(),
                Visibility::Hidden,
                Placeable,
                Name::new("placeable_model"),
            ));
            println!("✓ Model loaded, waiting for surface placement");
            loading_progress.model_ready = true;
        }
        Some(LoadState::Failed(err)) => {
            error!("model load failed: {err}");
            model_loader.scene = None;
            loading_progress.model_ready = true;
        }
        _ => {}
    }
}
