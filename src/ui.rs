// dialog window and speech bubble rendering with bevy_ui

mod bubble;
mod dialog_window;
mod theme;

use bevy::prelude::*;

use crate::NpcSystems;

pub(crate) struct NpcUiPlugin;

impl Plugin for NpcUiPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<dialog_window::DialogWindowState>()
            .init_resource::<bubble::BubbleUiState>()
            .add_systems(
                Update,
                (
                    dialog_window::handle_dialog_buttons.in_set(NpcSystems::RecordInput),
                    (dialog_window::sync_dialog_window, bubble::sync_bubble_ui)
                        .in_set(NpcSystems::Present),
                ),
            );
    }
}
