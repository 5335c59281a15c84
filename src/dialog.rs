//! Dialog sessions: the on-screen dialog window and per-NPC speech bubbles.

pub mod bubble;
pub mod layout;
pub mod screen;
mod systems;

use bevy::prelude::*;

use crate::{NpcSystems, script::{ButtonSlot, Hook}};

pub use bubble::{BubbleDialog, BubbleStore, BubbleTypewriter};
pub use layout::{BubbleLayout, BubbleSize, PlacedButton, PlacedImage, ScreenLayout};
pub use screen::ScreenDialog;

pub(crate) struct DialogPlugin;

impl Plugin for DialogPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ScreenDialog>()
            .init_resource::<BubbleTypewriter>()
            .add_message::<DialogInput>()
            .add_message::<NpcHookTriggered>()
            .add_message::<DialogAudioRequest>()
            .add_systems(
                Update,
                (
                    systems::forward_dialog_input.in_set(NpcSystems::RecordInput),
                    (systems::tick_screen_dialog, systems::tick_bubbles)
                        .in_set(NpcSystems::Update),
                    (
                        systems::apply_screen_effects,
                        systems::apply_bubble_effects,
                    )
                        .chain()
                        .in_set(NpcSystems::Present),
                ),
            );
    }
}

/// Player input aimed at the dialog window.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogInput {
    /// Primary button (E / gamepad south): next, or the first answer.
    Confirm,
    /// Secondary button (F / gamepad east): the second answer, or skip.
    Cancel,
    /// Mouse click on the window.
    Pointer,
    /// Click on an answer button.
    Button(ButtonSlot),
    /// Click on the skip button.
    Skip,
}

/// A named hook fired by a dialog transition.
#[derive(Message, Debug, Clone, PartialEq, Eq)]
pub struct NpcHookTriggered {
    pub hook: String,
    pub npc: Entity,
}

/// Sound the host should play for a freshly shown entry.
#[derive(Message, Debug, Clone, PartialEq, Eq)]
pub struct DialogAudioRequest {
    pub path: String,
    pub npc: Entity,
}

/// Things a dialog session did that the outside world may need to act on,
/// in the order they happened.
#[derive(Debug, Clone, PartialEq)]
pub enum DialogEffect {
    Hook(Hook),
    /// Entry `index` was put on display.
    Shown(usize),
    /// The current entry's text is fully visible.
    Revealed,
    Closed,
}

pub(crate) fn fire_hook(commands: &mut Commands, hook: &Hook, npc: Entity) {
    match hook {
        Hook::Named(name) => {
            debug!("{npc} fired hook '{name}'");
            commands.write_message(NpcHookTriggered {
                hook: name.clone(),
                npc,
            });
        }
        Hook::Run(run) => run(commands, npc),
    }
}
