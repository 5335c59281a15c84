use bevy::{platform::collections::HashMap, prelude::*, ui::FocusPolicy};

use super::theme;
use crate::dialog::{BubbleDialog, BubbleTypewriter};

/// Bubble sizes are authored in world units; this turns them into pixels.
const PIXELS_PER_UNIT: f32 = 200.0;
const TEXT_SCALE: f32 = 18.0;

struct BubbleNodes {
    root: Entity,
    text: Entity,
}

#[derive(Resource, Default)]
pub(super) struct BubbleUiState {
    nodes: HashMap<Entity, BubbleNodes>,
}

#[derive(Component)]
pub(super) struct BubbleUiRoot;

/// Projects every open speech bubble above its NPC.
pub(super) fn sync_bubble_ui(
    mut commands: Commands,
    mut state: ResMut<BubbleUiState>,
    writer: Res<BubbleTypewriter>,
    bubbles: Query<(Entity, &BubbleDialog, &GlobalTransform)>,
    cameras: Query<(&Camera, &GlobalTransform), With<Camera3d>>,
    mut nodes: Query<&mut Node, With<BubbleUiRoot>>,
    mut texts: Query<(&mut Text, &mut TextFont)>,
) {
    let camera = cameras.iter().find(|(camera, _)| camera.is_active);

    let mut seen = Vec::new();
    for (owner, bubble, transform) in &bubbles {
        let Some(layout) = bubble.layout(&writer, owner) else {
            continue;
        };
        let Some((camera, camera_transform)) = camera else {
            continue;
        };
        let anchor = transform.translation() + Vec3::Y * layout.height;
        let Ok(screen_pos) = camera.world_to_viewport(camera_transform, anchor) else {
            continue;
        };
        seen.push(owner);

        let size = layout.size.panel_size() * PIXELS_PER_UNIT;
        let offset = (layout.size.container_offset() + layout.text_offset) * PIXELS_PER_UNIT;
        let left = screen_pos.x + offset.x - size.x / 2.0;
        let top = screen_pos.y - offset.y - size.y;

        let nodes_for = state
            .nodes
            .entry(owner)
            .or_insert_with(|| spawn_bubble(&mut commands, owner));
        if let Ok(mut node) = nodes.get_mut(nodes_for.root) {
            node.left = Val::Px(left);
            node.top = Val::Px(top);
            node.width = Val::Px(size.x);
            node.min_height = Val::Px(size.y);
        }
        if let Ok((mut text, mut font)) = texts.get_mut(nodes_for.text) {
            if text.0 != layout.text {
                text.0.clone_from(&layout.text);
            }
            font.font_size = layout.font_size * TEXT_SCALE;
        }
    }

    state.nodes.retain(|owner, bubble_nodes| {
        let keep = seen.contains(owner);
        if !keep {
            commands.entity(bubble_nodes.root).despawn();
        }
        keep
    });
}

fn spawn_bubble(commands: &mut Commands, owner: Entity) -> BubbleNodes {
    let mut text = Entity::PLACEHOLDER;
    let root = commands
        .spawn((
            Name::new(format!("Speech Bubble {owner}")),
            BubbleUiRoot,
            Node {
                position_type: PositionType::Absolute,
                padding: UiRect::all(Val::Px(8.0)),
                border: UiRect::all(Val::Px(2.0)),
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                ..default()
            },
            BackgroundColor(theme::BUBBLE_BG),
            theme::border(true),
            FocusPolicy::Pass,
            GlobalZIndex(100),
        ))
        .with_children(|bubble| {
            text = bubble
                .spawn((
                    Text::default(),
                    TextFont::default(),
                    TextColor(theme::TEXT_DARK),
                ))
                .id();
        })
        .id();
    BubbleNodes { root, text }
}
