use bevy::prelude::*;

/// Marks the entity NPCs turn towards, usually the player camera.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct FaceUserTarget;

/// Turns an NPC to face the [`FaceUserTarget`] while it's being talked to.
#[derive(Component, Debug, Clone)]
pub struct FaceUser {
    pub active: bool,
    /// Fraction of the remaining turn covered per second.
    pub turning_speed: f32,
}

impl FaceUser {
    pub fn new(turning_speed: f32) -> Self {
        Self {
            active: false,
            turning_speed,
        }
    }
}

/// Rotation about the Y axis only that points `from` at `target`. `None` when
/// the target sits straight above or below.
pub(crate) fn yaw_towards(from: Vec3, target: Vec3) -> Option<Quat> {
    let flat = Vec3::new(target.x, from.y, target.z);
    if flat.distance_squared(from) < 1e-6 {
        return None;
    }
    Some(Transform::from_translation(from).looking_at(flat, Vec3::Y).rotation)
}

pub(super) fn face_user(
    time: Res<Time>,
    targets: Query<&GlobalTransform, With<FaceUserTarget>>,
    npcs: Query<(&FaceUser, &mut Transform), Without<FaceUserTarget>>,
) {
    let Ok(target) = targets.single() else {
        return;
    };
    let target = target.translation();
    for (face, mut transform) in npcs {
        if !face.active {
            continue;
        }
        let Some(wanted) = yaw_towards(transform.translation, target) else {
            continue;
        };
        let t = (time.delta_secs() * face.turning_speed).min(1.0);
        transform.rotation = transform.rotation.slerp(wanted, t);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaw_ignores_height_difference() {
        let rotation = yaw_towards(Vec3::ZERO, Vec3::new(0.0, 5.0, -3.0)).unwrap();
        let forward = rotation * Vec3::NEG_Z;
        assert!(forward.abs_diff_eq(Vec3::NEG_Z, 1e-5));
    }

    #[test]
    fn target_straight_above_has_no_yaw() {
        assert!(yaw_towards(Vec3::ZERO, Vec3::Y * 2.0).is_none());
    }
}
