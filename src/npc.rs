//! Talking, walking NPCs.
//!
//! Spawn an entity with [`Npc`] and drive it with [`NpcCommand`] messages (or
//! the [`NpcCommandsExt`] shortcuts). Proximity and click detection are left
//! to the host, which reports them as [`NpcTrigger`] messages.

mod commands;
pub mod face_user;

use std::sync::Arc;

use bevy::{
    ecs::{lifecycle::HookContext, world::DeferredWorld},
    prelude::*,
};

use crate::{
    NpcSystems,
    delay::DelayScheduler,
    dialog::BubbleDialog,
    locomotion::{FollowPathData, walk_npcs},
    script::{DialogRef, Hook, ImageData, Script, ScriptLibrary},
    settings::NpcSettings,
};
pub use face_user::{FaceUser, FaceUserTarget};

pub(crate) struct NpcBehaviourPlugin;

impl Plugin for NpcBehaviourPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<NpcCommand>()
            .add_message::<NpcTrigger>()
            .add_message::<NpcAnimationRequest>()
            .add_systems(
                Update,
                (
                    commands::tick_npc_delays.in_set(NpcSystems::TickTimers),
                    commands::handle_npc_triggers.in_set(NpcSystems::RecordInput),
                    commands::handle_npc_commands
                        .in_set(NpcSystems::Update)
                        .before(walk_npcs),
                    face_user::face_user.in_set(NpcSystems::Update),
                ),
            );
    }
}

/// What an NPC is doing. Only `Following` NPCs are moved along their path.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NpcState {
    #[default]
    Standing,
    Talking,
    Following,
}

#[derive(Component, Debug, Clone, Default)]
pub struct NpcStatus {
    /// Set on activation; triggers are ignored until the cooldown runs out.
    pub in_cooldown: bool,
    /// Set once the NPC has talked through the dialog window.
    pub introduced: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NpcDelay {
    Cooldown,
    AnimationEnd,
    DialogClose,
    WalkResume,
}

#[derive(Component, Debug, Clone, Default)]
pub struct NpcDelays(pub DelayScheduler<NpcDelay, ()>);

/// Animation bookkeeping. Playback itself is up to the host, which listens
/// for [`NpcAnimationRequest`].
#[derive(Component, Debug, Clone, Default)]
pub struct NpcAnimator {
    pub idle: String,
    pub walking: Option<String>,
    pub current: Option<String>,
}

impl NpcAnimator {
    pub(crate) fn play(&mut self, commands: &mut Commands, npc: Entity, clip: &str, looping: bool) {
        self.current = Some(clip.to_string());
        commands.write_message(NpcAnimationRequest {
            npc,
            clip: clip.to_string(),
            looping,
        });
    }

    pub(crate) fn play_idle(&mut self, commands: &mut Commands, npc: Entity) {
        let idle = self.idle.clone();
        self.play(commands, npc, &idle, true);
    }

    pub(crate) fn play_walking(&mut self, commands: &mut Commands, npc: Entity) {
        if let Some(walking) = self.walking.clone() {
            self.play(commands, npc, &walking, true);
        }
    }
}

/// Ask the host to play an animation clip on an NPC.
#[derive(Message, Debug, Clone, PartialEq, Eq)]
pub struct NpcAnimationRequest {
    pub npc: Entity,
    pub clip: String,
    pub looping: bool,
}

/// An NPC and how it behaves.
#[derive(Component, Debug, Clone)]
#[component(on_add=Self::on_add_hook)]
#[require(NpcState, NpcStatus, NpcDelays, NpcAnimator, Transform)]
pub struct Npc {
    /// Portrait shown in the dialog window when an entry has none.
    pub portrait: Option<ImageData>,
    /// Radius of the host's trigger volume, in metres.
    pub react_distance: f32,
    pub idle_anim: String,
    pub face_user: bool,
    pub turning_speed: f32,
    /// Only [`NpcCommand`]s activate this NPC, never triggers.
    pub only_external_trigger: bool,
    /// Only a mouse click activates this NPC.
    pub only_click_trigger: bool,
    /// Only the primary action button activates this NPC.
    pub only_e_trigger: bool,
    pub on_walk_away: Option<Hook>,
    /// Keep talking when the player walks out of range.
    pub continue_on_walk_away: bool,
    pub dark_ui: bool,
    /// Seconds after activation before triggers work again. Falls back to
    /// [`NpcSettings::cool_down_duration`].
    pub cool_down_duration: Option<f32>,
    pub hover_text: String,
    pub dialog_sound: Option<String>,
    pub walking_anim: Option<String>,
    /// Metres per second when a path gives neither speed nor duration.
    pub walking_speed: Option<f32>,
    /// Path walked in a loop from spawn.
    pub path: Option<Vec<Vec3>>,
    pub text_bubble: bool,
    pub bubble_height: Option<f32>,
    /// Never open the dialog window for this NPC.
    pub no_ui: bool,
    pub on_activate: Option<Hook>,
}

impl Default for Npc {
    fn default() -> Self {
        Self {
            portrait: None,
            react_distance: 6.0,
            idle_anim: "Idle".to_string(),
            face_user: false,
            turning_speed: 2.0,
            only_external_trigger: false,
            only_click_trigger: false,
            only_e_trigger: false,
            on_walk_away: None,
            continue_on_walk_away: false,
            dark_ui: false,
            cool_down_duration: None,
            hover_text: "Talk".to_string(),
            dialog_sound: None,
            walking_anim: None,
            walking_speed: None,
            path: None,
            text_bubble: false,
            bubble_height: None,
            no_ui: false,
            on_activate: None,
        }
    }
}

impl Npc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn portrait(mut self, portrait: ImageData) -> Self {
        self.portrait = Some(portrait);
        self
    }

    pub fn idle_anim(mut self, clip: impl Into<String>) -> Self {
        self.idle_anim = clip.into();
        self
    }

    pub fn walking_anim(mut self, clip: impl Into<String>) -> Self {
        self.walking_anim = Some(clip.into());
        self
    }

    pub fn walking_speed(mut self, speed: f32) -> Self {
        self.walking_speed = Some(speed);
        self
    }

    pub fn face_user(mut self, turning_speed: f32) -> Self {
        self.face_user = true;
        self.turning_speed = turning_speed;
        self
    }

    pub fn cool_down(mut self, secs: f32) -> Self {
        self.cool_down_duration = Some(secs);
        self
    }

    pub fn dialog_sound(mut self, path: impl Into<String>) -> Self {
        self.dialog_sound = Some(path.into());
        self
    }

    pub fn path(mut self, points: impl Into<Vec<Vec3>>) -> Self {
        self.path = Some(points.into());
        self
    }

    pub fn text_bubble(mut self) -> Self {
        self.text_bubble = true;
        self
    }

    pub fn bubble_height(mut self, height: f32) -> Self {
        self.bubble_height = Some(height);
        self
    }

    pub fn no_ui(mut self) -> Self {
        self.no_ui = true;
        self
    }

    pub fn on_activate(mut self, hook: impl Into<Hook>) -> Self {
        self.on_activate = Some(hook.into());
        self
    }

    pub fn on_walk_away(mut self, hook: impl Into<Hook>) -> Self {
        self.on_walk_away = Some(hook.into());
        self
    }

    fn on_add_hook(mut world: DeferredWorld, hook: HookContext) {
        let Some(npc) = world.get::<Self>(hook.entity).cloned() else {
            return;
        };
        let bubble_height = npc.bubble_height.unwrap_or_else(|| {
            world
                .get_resource::<NpcSettings>()
                .map_or(NpcSettings::default().bubble_height, |settings| {
                    settings.bubble_height
                })
        });
        let mut commands = world.commands();
        let mut entity = commands.entity(hook.entity);
        entity.insert(NpcAnimator {
            idle: npc.idle_anim.clone(),
            walking: npc.walking_anim.clone(),
            current: None,
        });
        if npc.text_bubble {
            entity.insert(BubbleDialog::new(bubble_height));
        }
        if npc.face_user {
            entity.insert(FaceUser::new(npc.turning_speed));
        }
        if let Some(path) = npc.path {
            commands.write_message(NpcCommand::new(
                hook.entity,
                NpcAction::FollowPath(Some(FollowPathData::new(path).looping(true))),
            ));
        }
    }
}

/// A script given inline, or the id of one in [`ScriptLibrary`].
#[derive(Debug, Clone)]
pub enum ScriptSource {
    Inline(Arc<Script>),
    Library(String),
}

impl ScriptSource {
    pub(crate) fn resolve(&self, library: &ScriptLibrary) -> Option<Arc<Script>> {
        match self {
            Self::Inline(script) => Some(script.clone()),
            Self::Library(id) => {
                let script = library.get(id);
                if script.is_none() {
                    warn!("no script with id '{id}' in the script library");
                }
                script
            }
        }
    }
}

impl From<Script> for ScriptSource {
    fn from(value: Script) -> Self {
        Self::Inline(Arc::new(value))
    }
}

impl From<Arc<Script>> for ScriptSource {
    fn from(value: Arc<Script>) -> Self {
        Self::Inline(value)
    }
}

impl From<&str> for ScriptSource {
    fn from(value: &str) -> Self {
        Self::Library(value.to_string())
    }
}

#[derive(Debug, Clone)]
pub enum NpcAction {
    /// Face the player, start the cooldown and run `on_activate`.
    Activate,
    /// The player left; ends the interaction unless the NPC is walking.
    WalkAway,
    /// Stop facing the player and close the NPC's dialogs.
    EndInteraction,
    /// Open the dialog window. With a duration it closes by itself.
    Talk {
        script: ScriptSource,
        start: DialogRef,
        duration: Option<f32>,
    },
    /// Open the NPC's speech bubble.
    TalkBubble { script: ScriptSource, start: DialogRef },
    /// Hide the speech bubble; `end_all` also stops its conversation.
    CloseBubble { end_all: bool },
    /// Walk a path; `None` resumes the previous one.
    FollowPath(Option<FollowPathData>),
    /// Stop walking, optionally resuming after the given seconds.
    StopWalking(Option<f32>),
    PlayAnimation {
        clip: String,
        no_loop: bool,
        duration: Option<f32>,
    },
    ChangeIdleAnim { clip: String, play: bool },
}

#[derive(Message, Debug, Clone)]
pub struct NpcCommand {
    pub npc: Entity,
    pub action: NpcAction,
}

impl NpcCommand {
    pub fn new(npc: Entity, action: NpcAction) -> Self {
        Self { npc, action }
    }
}

/// Which button activated an NPC by clicking it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivateButton {
    Pointer,
    Primary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerKind {
    CameraEnter,
    CameraExit,
    Clicked(ActivateButton),
}

/// The player got close, left, or clicked an NPC.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct NpcTrigger {
    pub npc: Entity,
    pub kind: TriggerKind,
}

pub trait NpcCommandsExt {
    fn npc(&mut self, npc: Entity, action: NpcAction);
    fn npc_talk(&mut self, npc: Entity, script: impl Into<ScriptSource>, start: impl Into<DialogRef>);
    fn npc_talk_bubble(
        &mut self,
        npc: Entity,
        script: impl Into<ScriptSource>,
        start: impl Into<DialogRef>,
    );
    fn npc_follow_path(&mut self, npc: Entity, data: FollowPathData);
}

impl NpcCommandsExt for Commands<'_, '_> {
    fn npc(&mut self, npc: Entity, action: NpcAction) {
        self.write_message(NpcCommand::new(npc, action));
    }

    fn npc_talk(&mut self, npc: Entity, script: impl Into<ScriptSource>, start: impl Into<DialogRef>) {
        self.npc(
            npc,
            NpcAction::Talk {
                script: script.into(),
                start: start.into(),
                duration: None,
            },
        );
    }

    fn npc_talk_bubble(
        &mut self,
        npc: Entity,
        script: impl Into<ScriptSource>,
        start: impl Into<DialogRef>,
    ) {
        self.npc(
            npc,
            NpcAction::TalkBubble {
                script: script.into(),
                start: start.into(),
            },
        );
    }

    fn npc_follow_path(&mut self, npc: Entity, data: FollowPathData) {
        self.npc(npc, NpcAction::FollowPath(Some(data)));
    }
}
