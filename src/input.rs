use bevy::{picking::pointer::PointerButton, prelude::*};
use bevy_enhanced_input::prelude::*;

use crate::{
    dialog::{DialogInput, ScreenDialog},
    npc::{ActivateButton, Npc, NpcTrigger, TriggerKind},
};

/// Keyboard, gamepad and mouse bindings for talking to NPCs.
///
/// Needs `EnhancedInputPlugin` and an entity spawned with [`dialog_controls`].
/// Clicking NPCs goes through Bevy picking, so their meshes must be pickable.
pub(crate) struct NpcInputPlugin;

impl Plugin for NpcInputPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<HoveredNpc>()
            .add_input_context::<DialogControls>()
            .add_observer(apply_confirm)
            .add_observer(apply_cancel)
            .add_observer(apply_pointer)
            .add_observer(hover_npc)
            .add_observer(unhover_npc)
            .add_observer(click_npc);
    }
}

pub fn dialog_controls() -> impl Bundle {
    (
        DialogControls,
        actions!(DialogControls[
            (
                Action::<ConfirmAction>::new(),
                bindings![KeyCode::KeyE, GamepadButton::South],
            ),
            (
                Action::<CancelAction>::new(),
                bindings![KeyCode::KeyF, GamepadButton::East],
            ),
            (
                Action::<PointerAction>::new(),
                bindings![MouseButton::Left],
            ),
        ]),
    )
}

#[derive(Component)]
pub struct DialogControls;

#[derive(Debug, InputAction)]
#[action_output(bool)]
pub struct ConfirmAction;

#[derive(Debug, InputAction)]
#[action_output(bool)]
pub struct CancelAction;

#[derive(Debug, InputAction)]
#[action_output(bool)]
pub struct PointerAction;

/// The NPC under the cursor, if any.
#[derive(Resource, Debug, Default)]
pub struct HoveredNpc(pub Option<Entity>);

/// The primary button talks to the hovered NPC, or drives the open dialog.
fn apply_confirm(
    _action: On<Start<ConfirmAction>>,
    mut cmd: Commands,
    screen: Res<ScreenDialog>,
    hovered: Res<HoveredNpc>,
) {
    if screen.is_open() {
        cmd.write_message(DialogInput::Confirm);
        return;
    }
    if let Some(npc) = hovered.0 {
        cmd.write_message(NpcTrigger {
            npc,
            kind: TriggerKind::Clicked(ActivateButton::Primary),
        });
    }
}

fn apply_cancel(_action: On<Start<CancelAction>>, mut cmd: Commands, screen: Res<ScreenDialog>) {
    if screen.is_open() {
        cmd.write_message(DialogInput::Cancel);
    }
}

fn apply_pointer(_action: On<Start<PointerAction>>, mut cmd: Commands, screen: Res<ScreenDialog>) {
    if screen.is_open() {
        cmd.write_message(DialogInput::Pointer);
    }
}

fn hover_npc(over: On<Pointer<Over>>, npcs: Query<(), With<Npc>>, mut hovered: ResMut<HoveredNpc>) {
    if npcs.contains(over.entity) {
        hovered.0 = Some(over.entity);
    }
}

fn unhover_npc(out: On<Pointer<Out>>, npcs: Query<(), With<Npc>>, mut hovered: ResMut<HoveredNpc>) {
    if npcs.contains(out.entity) && hovered.0 == Some(out.entity) {
        hovered.0 = None;
    }
}

fn click_npc(
    click: On<Pointer<Click>>,
    npcs: Query<(), With<Npc>>,
    screen: Res<ScreenDialog>,
    mut triggers: MessageWriter<NpcTrigger>,
) {
    if click.button != PointerButton::Primary || screen.is_open() || !npcs.contains(click.entity) {
        return;
    }
    triggers.write(NpcTrigger {
        npc: click.entity,
        kind: TriggerKind::Clicked(ActivateButton::Pointer),
    });
}
