use bevy::prelude::*;

use super::{
    ActivateButton, FaceUser, Npc, NpcAction, NpcAnimator, NpcCommand, NpcDelay, NpcDelays,
    NpcState, NpcStatus, NpcTrigger, TriggerKind,
};
use crate::{
    dialog::{BubbleDialog, BubbleTypewriter, ScreenDialog, fire_hook},
    locomotion::{PathFollow, WalkingNpcs},
    script::ScriptLibrary,
    settings::NpcSettings,
};

/// Turns proximity and click triggers into NPC commands.
pub(super) fn handle_npc_triggers(
    mut triggers: MessageReader<NpcTrigger>,
    mut npc_commands: MessageWriter<NpcCommand>,
    npcs: Query<(&Npc, &NpcStatus)>,
    screen: Res<ScreenDialog>,
) {
    for trigger in triggers.read() {
        let Ok((npc, status)) = npcs.get(trigger.npc) else {
            continue;
        };
        let action = match trigger.kind {
            TriggerKind::CameraEnter => {
                if npc.only_external_trigger
                    || npc.only_click_trigger
                    || npc.only_e_trigger
                    || status.in_cooldown
                    || screen.is_open_for(trigger.npc)
                {
                    continue;
                }
                NpcAction::Activate
            }
            TriggerKind::CameraExit => {
                if npc.continue_on_walk_away {
                    continue;
                }
                NpcAction::WalkAway
            }
            TriggerKind::Clicked(button) => {
                let expected = if npc.only_click_trigger {
                    ActivateButton::Pointer
                } else {
                    ActivateButton::Primary
                };
                if npc.only_external_trigger || button != expected {
                    continue;
                }
                NpcAction::Activate
            }
        };
        trace!("{} triggered {:?}", trigger.npc, trigger.kind);
        npc_commands.write(NpcCommand::new(trigger.npc, action));
    }
}

pub(super) fn handle_npc_commands(
    mut commands: Commands,
    mut reader: MessageReader<NpcCommand>,
    time: Res<Time>,
    settings: Res<NpcSettings>,
    library: Res<ScriptLibrary>,
    mut screen: ResMut<ScreenDialog>,
    mut bubble_writer: ResMut<BubbleTypewriter>,
    mut walking: ResMut<WalkingNpcs>,
    mut npcs: Query<(
        &Npc,
        &mut NpcState,
        &mut NpcStatus,
        &mut NpcDelays,
        &mut NpcAnimator,
        &mut Transform,
        Option<&mut PathFollow>,
        Option<&mut FaceUser>,
    )>,
    mut bubbles: Query<&mut BubbleDialog>,
) {
    for NpcCommand { npc, action } in reader.read() {
        let npc = *npc;
        let Ok((config, mut state, mut status, mut delays, mut animator, mut transform, path, face)) =
            npcs.get_mut(npc)
        else {
            warn!("{npc} is not an NPC, dropping {action:?}");
            continue;
        };

        match action {
            NpcAction::Activate => {
                if let Some(mut face) = face {
                    face.active = true;
                }
                status.in_cooldown = true;
                delays
                    .0
                    .schedule(
                        NpcDelay::Cooldown,
                        config
                            .cool_down_duration
                            .unwrap_or(settings.cool_down_duration),
                        (),
                    );
                if let Some(hook) = &config.on_activate {
                    fire_hook(&mut commands, hook, npc);
                }
            }
            NpcAction::WalkAway => {
                if *state == NpcState::Following {
                    continue;
                }
                end_interaction(npc, &mut state, face, &mut screen, &mut bubbles);
                if let Some(hook) = &config.on_walk_away {
                    fire_hook(&mut commands, hook, npc);
                }
            }
            NpcAction::EndInteraction => {
                end_interaction(npc, &mut state, face, &mut screen, &mut bubbles);
            }
            NpcAction::Talk {
                script,
                start,
                duration,
            } => {
                if config.no_ui {
                    warn!("{npc} has no dialog window, use a speech bubble instead");
                    continue;
                }
                let Some(script) = script.resolve(&library) else {
                    continue;
                };
                status.introduced = true;
                delays.0.cancel(NpcDelay::DialogClose);
                if let Ok(mut bubble) = bubbles.get_mut(npc) {
                    bubble.close();
                }
                let opened = screen.open(
                    script,
                    start,
                    npc,
                    config.portrait.clone(),
                    time.elapsed_secs_f64(),
                );
                if opened {
                    *state = NpcState::Talking;
                    if let Some(secs) = duration {
                        delays.0.schedule(NpcDelay::DialogClose, *secs, ());
                    }
                }
            }
            NpcAction::TalkBubble { script, start } => {
                if !bubbles.contains(npc) {
                    debug!("giving {npc} a speech bubble");
                    commands
                        .entity(npc)
                        .insert(BubbleDialog::new(
                            config.bubble_height.unwrap_or(settings.bubble_height),
                        ));
                    commands.write_message(NpcCommand::new(npc, action.clone()));
                    continue;
                }
                let Some(script) = script.resolve(&library) else {
                    continue;
                };
                bubble_writer.open(&mut bubbles, npc, script, start, &settings);
            }
            NpcAction::CloseBubble { end_all } => {
                if *end_all {
                    bubble_writer.close_end_all(&mut bubbles, npc);
                } else if let Ok(mut bubble) = bubbles.get_mut(npc) {
                    bubble.close();
                }
            }
            NpcAction::FollowPath(data) => {
                let walking_speed = config.walking_speed.unwrap_or(settings.walking_speed);
                let look_at = match path {
                    Some(mut path) => path.configure(
                        data.as_ref(),
                        transform.translation,
                        walking_speed,
                        settings.rejoin_epsilon_sq,
                    ),
                    None => {
                        let Some(data) = data else {
                            warn!("{npc} has no path to resume");
                            continue;
                        };
                        let mut path = PathFollow::new(Vec::new());
                        let look_at = path.configure(
                            Some(data),
                            transform.translation,
                            walking_speed,
                            settings.rejoin_epsilon_sq,
                        );
                        if look_at.is_some() {
                            commands.entity(npc).insert(path);
                            walking.register(npc);
                        }
                        look_at
                    }
                };
                let Some(look_at) = look_at else {
                    continue;
                };
                if let Some(mut face) = face {
                    face.active = false;
                }
                transform.look_at(look_at, Vec3::Y);
                if animator.walking.is_some() {
                    delays.0.cancel(NpcDelay::AnimationEnd);
                    animator.play_walking(&mut commands, npc);
                }
                *state = NpcState::Following;
            }
            NpcAction::StopWalking(resume_after) => {
                *state = NpcState::Standing;
                if animator.walking.is_some() {
                    animator.play_idle(&mut commands, npc);
                }
                match resume_after {
                    Some(secs) => delays.0.schedule(NpcDelay::WalkResume, *secs, ()),
                    None => {
                        delays.0.cancel(NpcDelay::WalkResume);
                    }
                }
            }
            NpcAction::PlayAnimation {
                clip,
                no_loop,
                duration,
            } => {
                delays.0.cancel(NpcDelay::AnimationEnd);
                animator.play(&mut commands, npc, clip, !no_loop);
                if *no_loop && let Some(secs) = duration {
                    delays.0.schedule(NpcDelay::AnimationEnd, *secs, ());
                }
            }
            NpcAction::ChangeIdleAnim { clip, play } => {
                animator.idle = clip.clone();
                if *play {
                    animator.play_idle(&mut commands, npc);
                }
            }
        }
    }
}

fn end_interaction(
    npc: Entity,
    state: &mut NpcState,
    face: Option<Mut<FaceUser>>,
    screen: &mut ScreenDialog,
    bubbles: &mut Query<&mut BubbleDialog>,
) {
    if let Some(mut face) = face {
        face.active = false;
    }
    if screen.is_open_for(npc) {
        screen.close();
    }
    if let Ok(mut bubble) = bubbles.get_mut(npc) {
        bubble.close();
    }
    if *state == NpcState::Talking {
        *state = NpcState::Standing;
    }
}

pub(super) fn tick_npc_delays(
    mut commands: Commands,
    time: Res<Time>,
    mut screen: ResMut<ScreenDialog>,
    mut npcs: Query<(
        Entity,
        &mut NpcDelays,
        &mut NpcStatus,
        &mut NpcState,
        &mut NpcAnimator,
        Has<PathFollow>,
    )>,
) {
    let dt = time.delta_secs();
    for (npc, mut delays, mut status, mut state, mut animator, has_path) in &mut npcs {
        if delays.0.is_empty() {
            continue;
        }
        for (delay, ()) in delays.0.tick(dt) {
            match delay {
                NpcDelay::Cooldown => status.in_cooldown = false,
                NpcDelay::AnimationEnd => animator.play_idle(&mut commands, npc),
                NpcDelay::DialogClose => {
                    if screen.is_open_for(npc) {
                        screen.close();
                    }
                }
                NpcDelay::WalkResume => {
                    if screen.is_open_for(npc) || !has_path {
                        continue;
                    }
                    delays.0.cancel(NpcDelay::AnimationEnd);
                    animator.play_walking(&mut commands, npc);
                    *state = NpcState::Following;
                }
            }
        }
    }
}
