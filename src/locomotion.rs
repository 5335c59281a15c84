//! Walking NPCs along polylines.

mod path;

use bevy::prelude::*;

use crate::{
    NpcSystems,
    dialog::fire_hook,
    npc::{NpcAnimator, NpcState},
};
pub use path::{FollowPathData, InterpolationPolicy, PathFollow, PathStep, catmull_rom};

pub(crate) struct LocomotionPlugin;

impl Plugin for LocomotionPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<WalkingNpcs>().add_systems(
            Update,
            walk_npcs.in_set(NpcSystems::Update),
        );
    }
}

/// NPCs that have been given a path, in the order they got one. Walking
/// happens in this order every frame.
#[derive(Resource, Debug, Clone, Default)]
pub struct WalkingNpcs(Vec<Entity>);

impl WalkingNpcs {
    pub(crate) fn register(&mut self, npc: Entity) {
        if !self.0.contains(&npc) {
            self.0.push(npc);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

pub(crate) fn walk_npcs(
    mut commands: Commands,
    time: Res<Time>,
    mut walking: ResMut<WalkingNpcs>,
    mut npcs: Query<(
        &mut PathFollow,
        &mut Transform,
        &mut NpcState,
        &mut NpcAnimator,
    )>,
) {
    walking.0.retain(|npc| npcs.contains(*npc));

    let dt = time.delta_secs();
    for npc in walking.iter() {
        let Ok((mut path, mut transform, mut state, mut animator)) = npcs.get_mut(npc) else {
            continue;
        };
        if *state != NpcState::Following {
            continue;
        }

        let step = path.step(dt);
        transform.translation = step.position;
        if let Some(target) = step.look_at {
            transform.look_at(target, Vec3::Y);
        }
        if let Some(hook) = &path.on_reached_point {
            for _ in 0..step.reached {
                fire_hook(&mut commands, hook, npc);
            }
        }
        if step.finished {
            debug!("{npc} finished its path");
            *state = NpcState::Standing;
            if animator.walking.is_some() {
                animator.play_idle(&mut commands, npc);
            }
            if let Some(hook) = &path.on_finish {
                fire_hook(&mut commands, hook, npc);
            }
        }
    }
}
