use bevy::prelude::*;

use crate::engine::scene::reticle::ReticleState;
use crate::xr::hit_test::update_hit_test;
use crate::xr::session::SelectEvent;

/// Marker for the user-positioned model. Spawned hidden once its scene
/// finishes loading; only a select with a visible reticle reveals it.
#[derive(Component)]
pub struct Placeable;

// Commit the reticle pose to the placeable on each "select".
//
// Deliberately a no-op when nothing is loaded or no surface is marked:
// pressing select with nothing to place must not error or mutate state.
// Repeated selects re-commit the latest pose, which is how the user moves
// an already-placed model.
pub fn handle_select_events(
    mut events: EventReader<SelectEvent>,
    reticle: Res<ReticleState>,
    mut placeables: Query<(&mut Transform, &mut Visibility), With<Placeable>>,
) {
    for _ in events.read() {
        let Ok((mut transform, mut visibility)) = placeables.single_mut() else {
            continue;
        };
        if !reticle.visible {
            continue;
        }
        *transform = Transform::from_matrix(reticle.pose);
        *visibility = Visibility::Visible;
        info!("placeable committed to the marked surface");
    }
}

// Registers the placement tool. Runs after hit testing so a select commits
// this frame's reticle pose, not the previous frame's.
pub struct PlacementPlugin;

impl Plugin for PlacementPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, handle_select_events.after(update_hit_test));
    }
}
