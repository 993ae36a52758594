use bevy::math::primitives::Annulus;
use bevy::prelude::*;

use constants::reticle::{RETICLE_INNER_RADIUS, RETICLE_OUTER_RADIUS, RETICLE_SEGMENTS};

/// Pose and visibility of the surface marker, written once per frame by the
/// hit-test pipeline.
///
/// `pose` is only meaningful while `visible` is true; readers must treat it
/// as stale otherwise.
#[derive(Resource, Default)]
pub struct ReticleState {
    pub pose: Mat4,
    pub visible: bool,
}

#[derive(Component)]
pub struct Reticle;

// Flat ring marker, rotated into the XZ plane so it lies on surfaces.
pub fn spawn_reticle(
    commands: &mut Commands,
    meshes: &mut ResMut<Assets<Mesh>>,
    materials: &mut ResMut<Assets<StandardMaterial>>,
) {
    let ring = Mesh::from(
        Annulus::new(RETICLE_INNER_RADIUS, RETICLE_OUTER_RADIUS)
            .mesh()
            .resolution(RETICLE_SEGMENTS),
    )
    .rotated_by(Quat::from_rotation_x(-std::f32::consts::FRAC_PI_2));

    commands.spawn((
        Mesh3d(meshes.add(ring)),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::WHITE,
            unlit: true,
            ..default()
        })),
        Transform::IDENTITY,
        Visibility::Hidden,
        Reticle,
        Name::new("reticle"),
    ));
}

// Mirror the authoritative state onto the rendered marker.
pub fn sync_reticle(
    reticle: Res<ReticleState>,
    mut query: Query<(&mut Transform, &mut Visibility), With<Reticle>>,
) {
    for (mut transform, mut visibility) in &mut query {
        if reticle.visible {
            *transform = Transform::from_matrix(reticle.pose);
            *visibility = Visibility::Visible;
        } else {
            *visibility = Visibility::Hidden;
        }
    }
}
