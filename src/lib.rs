// Support configuring Bevy lints within code.
#![cfg_attr(bevy_lint, feature(register_tool), register_tool(bevy))]

//! Talking, walking NPCs for Bevy.
//!
//! Add [`NpcPlugin`] next to `DefaultPlugins` and `EnhancedInputPlugin`, spawn
//! an entity with [`input::dialog_controls`], then spawn NPCs with an [`Npc`]
//! component and talk to them through [`NpcCommand`] messages.

pub mod delay;
pub mod dialog;
pub mod input;
pub mod locomotion;
pub mod npc;
pub mod script;
pub mod settings;
pub mod typewriter;
mod ui;

use bevy::prelude::*;

pub use dialog::{
    BubbleDialog, BubbleTypewriter, DialogAudioRequest, DialogEffect, DialogInput,
    NpcHookTriggered, ScreenDialog,
};
pub use locomotion::{FollowPathData, InterpolationPolicy, PathFollow, WalkingNpcs};
pub use npc::{
    ActivateButton, FaceUser, FaceUserTarget, Npc, NpcAction, NpcAnimationRequest, NpcCommand,
    NpcCommandsExt, NpcState, NpcStatus, NpcTrigger, ScriptSource, TriggerKind,
};
pub use script::{ButtonEntry, DialogEntry, DialogRef, Hook, Script, ScriptLibrary};
pub use settings::NpcSettings;
pub use typewriter::Typewriter;

/// Everything: dialog logic, `*.script.ron` loading, input bindings and UI.
pub struct NpcPlugin;

impl Plugin for NpcPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins((
            NpcCorePlugin,
            script::ScriptAssetPlugin,
            input::NpcInputPlugin,
            ui::NpcUiPlugin,
        ));
    }
}

/// Dialog sessions, locomotion and NPC behaviour without any rendering,
/// input or asset loading. Runs on `MinimalPlugins`.
pub struct NpcCorePlugin;

impl Plugin for NpcCorePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<NpcSettings>()
            .configure_sets(
                Update,
                (
                    NpcSystems::TickTimers,
                    NpcSystems::RecordInput,
                    NpcSystems::Update,
                    NpcSystems::Present,
                )
                    .chain(),
            )
            .add_plugins((
                script::ScriptPlugin,
                dialog::DialogPlugin,
                locomotion::LocomotionPlugin,
                npc::NpcBehaviourPlugin,
            ));
    }
}

/// High-level groups of systems in the `Update` schedule, run in order.
#[derive(SystemSet, Debug, Clone, Copy, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum NpcSystems {
    /// Tick NPC delays.
    TickTimers,
    /// Turn triggers and player input into commands.
    RecordInput,
    /// Run commands, dialog sessions and walking.
    Update,
    /// Publish effects and draw the UI.
    Present,
}
