use bevy::prelude::*;

use super::{
    BubbleDialog, BubbleTypewriter, DialogAudioRequest, DialogEffect, DialogInput, ScreenDialog,
    fire_hook,
};
use crate::{
    npc::{Npc, NpcState},
    settings::NpcSettings,
};

pub(super) fn forward_dialog_input(
    mut inputs: MessageReader<DialogInput>,
    mut screen: ResMut<ScreenDialog>,
    time: Res<Time>,
) {
    let now = time.elapsed_secs_f64();
    for input in inputs.read() {
        screen.input(*input, now);
    }
}

pub(super) fn tick_screen_dialog(mut screen: ResMut<ScreenDialog>, time: Res<Time>) {
    screen.tick(time.delta_secs());
}

pub(super) fn tick_bubbles(
    mut writer: ResMut<BubbleTypewriter>,
    mut bubbles: Query<&mut BubbleDialog>,
    settings: Res<NpcSettings>,
    time: Res<Time>,
) {
    writer.tick(&mut bubbles, time.delta_secs(), &settings);
}

pub(super) fn apply_screen_effects(
    mut commands: Commands,
    mut screen: ResMut<ScreenDialog>,
    mut npcs: Query<(&Npc, &mut NpcState)>,
    mut audio: MessageWriter<DialogAudioRequest>,
) {
    for (owner, effect) in screen.drain_effects() {
        match effect {
            DialogEffect::Hook(hook) => fire_hook(&mut commands, &hook, owner),
            DialogEffect::Shown(index) => {
                let sound = screen
                    .entry_at(index)
                    .and_then(|entry| entry.audio.clone())
                    .or_else(|| {
                        npcs.get(owner)
                            .ok()
                            .and_then(|(npc, _)| npc.dialog_sound.clone())
                    });
                if let Some(path) = sound {
                    audio.write(DialogAudioRequest { path, npc: owner });
                }
            }
            DialogEffect::Revealed => {}
            DialogEffect::Closed => {
                if screen.is_open_for(owner) {
                    continue;
                }
                if let Ok((_, mut state)) = npcs.get_mut(owner)
                    && *state == NpcState::Talking
                {
                    *state = NpcState::Standing;
                }
            }
        }
    }
}

pub(super) fn apply_bubble_effects(
    mut commands: Commands,
    mut bubbles: Query<(Entity, &mut BubbleDialog, Option<&Npc>)>,
    mut audio: MessageWriter<DialogAudioRequest>,
) {
    for (owner, mut bubble, npc) in &mut bubbles {
        for effect in bubble.drain_effects() {
            match effect {
                DialogEffect::Hook(hook) => fire_hook(&mut commands, &hook, owner),
                DialogEffect::Shown(index) => {
                    let sound = bubble
                        .script()
                        .and_then(|script| script.get(index))
                        .and_then(|entry| entry.audio.clone())
                        .or_else(|| npc.and_then(|npc| npc.dialog_sound.clone()));
                    if let Some(path) = sound {
                        audio.write(DialogAudioRequest { path, npc: owner });
                    }
                }
                DialogEffect::Revealed | DialogEffect::Closed => {}
            }
        }
    }
}
