use bevy::asset::AssetMetaCheck;
use bevy::diagnostic::FrameTimeDiagnosticsPlugin;
use bevy::prelude::*;
use bevy_common_assets::json::JsonAssetPlugin;

use constants::camera::{VIEWER_FAR, VIEWER_FOV_DEGREES, VIEWER_NEAR, VIEWER_START};

use crate::engine::core::app_state::{AppState, LoadingText, transition_to_running};
use crate::engine::core::window_config::create_window_config;
use crate::engine::loading::catalog::ModelCatalog;
use crate::engine::loading::model_loader::{
    ModelLoader, SelectedModel, load_catalog_system, load_model_system, spawn_placeable_when_ready,
    start_catalog_load,
};
use crate::engine::loading::progress::LoadingProgress;
use crate::engine::scene::reticle::{spawn_reticle, sync_reticle};
use crate::tools::placement::PlacementPlugin;
use crate::xr::XrPlugin;
use crate::xr::hit_test::update_hit_test;
use crate::xr::runtime::XrRuntime;
use crate::xr::session::{StartSessionEvent, pump_xr_events};
use crate::xr::simulated::{SimulatedXr, probe_simulated_surfaces, select_on_mouse_click};

#[cfg(not(target_arch = "wasm32"))]
use crate::engine::core::app_state::FpsText;
#[cfg(not(target_arch = "wasm32"))]
use crate::xr::session::end_session_on_escape;
#[cfg(not(target_arch = "wasm32"))]
use bevy::diagnostic::DiagnosticsStore;

pub fn create_app() -> App {
    let mut app = App::new();

    app.add_plugins(create_default_plugins())
        .init_state::<AppState>()
        .add_plugins(FrameTimeDiagnosticsPlugin::default())
        // Registers ModelCatalog as a loadable asset type from JSON files.
        .add_plugins(JsonAssetPlugin::<ModelCatalog>::new(&["json"]))
        .insert_resource(XrRuntime(Box::new(SimulatedXr::default())))
        .add_plugins(XrPlugin)
        .add_plugins(PlacementPlugin);

    // Initialise resources early
    app.init_resource::<LoadingProgress>()
        .init_resource::<ModelLoader>()
        .init_resource::<SelectedModel>();

    // State-based system scheduling
    app.add_systems(Startup, (setup, start_catalog_load, request_ar_session).chain())
        .add_systems(
            Update,
            (
                // Loading phase systems
                load_catalog_system,
                load_model_system,
                spawn_placeable_when_ready,
                transition_to_running,
                update_loading_text,
            )
                .chain()
                .run_if(in_state(AppState::Loading)),
        )
        .add_systems(OnEnter(AppState::Running), hide_loading_text);

    // Simulated-device feeds and the reticle mirror, ordered around the
    // XR chain so this frame's probe and query line up.
    app.add_systems(
        Update,
        (
            probe_simulated_surfaces.before(update_hit_test),
            select_on_mouse_click.before(pump_xr_events),
            sync_reticle.after(update_hit_test),
        ),
    );

    #[cfg(not(target_arch = "wasm32"))]
    {
        app.add_systems(Update, (fps_text_update_system, end_session_on_escape));
    }

    app
}

// The simulated runtime needs no user-activation gesture, so the session
// request goes out at startup, concurrently with the model load.
fn request_ar_session(mut start_events: EventWriter<StartSessionEvent>) {
    start_events.send(StartSessionEvent);
}

// Startup system that only handles basic scene initialisation
fn setup(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    spawn_lighting(&mut commands);
    spawn_viewer_camera(&mut commands);
    spawn_reticle(&mut commands, &mut meshes, &mut materials);

    #[cfg(not(target_arch = "wasm32"))]
    {
        create_native_overlays(&mut commands);
    }
}

fn spawn_lighting(commands: &mut Commands) {
    // Soft fill so the unlit faces of the model still read in preview.
    commands.insert_resource(AmbientLight {
        color: Color::srgb(0.9, 0.9, 1.0),
        brightness: 300.0,
        ..default()
    });
    commands.spawn((
        DirectionalLight {
            shadows_enabled: false,
            ..default()
        },
        Transform::from_rotation(Quat::from_euler(
            EulerRot::ZYX,
            0.0,
            1.0,
            -std::f32::consts::FRAC_PI_4,
        )),
    ));
}

fn spawn_viewer_camera(commands: &mut Commands) {
    commands.spawn((
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            fov: VIEWER_FOV_DEGREES.to_radians(),
            near: VIEWER_NEAR,
            far: VIEWER_FAR,
            ..default()
        }),
        Transform::from_translation(VIEWER_START).looking_at(Vec3::ZERO, Vec3::Y),
    ));
}

#[cfg(not(target_arch = "wasm32"))]
fn create_native_overlays(commands: &mut Commands) {
    commands
        .spawn(Node {
            width: Val::Percent(100.0),
            height: Val::Percent(100.0),
            ..default()
        })
        .with_children(|parent| {
            parent.spawn((
                Text::new("FPS: "),
                TextFont {
                    font_size: 16.0,
                    ..default()
                },
                TextColor(Color::srgb(1., 0., 0.)),
                Node {
                    position_type: PositionType::Absolute,
                    bottom: Val::Px(12.0),
                    right: Val::Px(12.0),
                    ..default()
                },
                FpsText,
            ));
            parent.spawn((
                Text::new("Loading catalogue..."),
                TextFont {
                    font_size: 20.0,
                    ..default()
                },
                TextColor(Color::WHITE),
                Node {
                    position_type: PositionType::Absolute,
                    bottom: Val::Px(48.0),
                    right: Val::Px(12.0),
                    ..default()
                },
                LoadingText,
            ));
        });
}

fn update_loading_text(
    loading_progress: Res<LoadingProgress>,
    mut query: Query<&mut Text, With<LoadingText>>,
) {
    for mut text in &mut query {
        text.0 = if !loading_progress.catalog_loaded {
            String::from("Loading catalogue...")
        } else if !loading_progress.model_ready {
            String::from("Loading model...")
        } else {
            String::new()
        };
    }
}

fn hide_loading_text(mut query: Query<&mut Visibility, With<LoadingText>>) {
    for mut visibility in &mut query {
        *visibility = Visibility::Hidden;
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn fps_text_update_system(
    diagnostics: Res<DiagnosticsStore>,
    mut query: Query<&mut Text, With<FpsText>>,
) {
    for mut text in &mut query {
        if let Some(fps) = diagnostics.get(&FrameTimeDiagnosticsPlugin::FPS) {
            if let Some(value) = fps.smoothed() {
                text.0 = format!("FPS: {value:.1}");
            }
        }
    }
}

fn create_default_plugins() -> impl PluginGroup {
    let window_config = WindowPlugin {
        primary_window: Some(create_window_config()),
        ..default()
    };

    let asset_config = AssetPlugin {
        meta_check: AssetMetaCheck::Never,
        ..default()
    };

    DefaultPlugins.set(window_config).set(asset_config)
}
