//! Speech bubbles above NPCs.
//!
//! Every NPC has its own [`BubbleDialog`], but they all share one
//! [`BubbleTypewriter`]: only one bubble reveals text at a time. Opening a
//! bubble while another owns the typewriter finishes the other conversation
//! first, firing all of its remaining hooks.

use std::{collections::HashMap, sync::Arc};

use bevy::prelude::*;

use super::{DialogEffect, layout::BubbleLayout};
use crate::{
    delay::duration_from_secs,
    script::{
        DialogRef, Hook, Script,
        navigator::{self, Advance},
    },
    settings::NpcSettings,
    typewriter::Typewriter,
};

/// Per-NPC speech bubble.
#[derive(Component, Debug, Clone)]
pub struct BubbleDialog {
    script: Option<Arc<Script>>,
    active: usize,
    open: bool,
    /// Height above the NPC, in metres.
    pub height: f32,
    effects: Vec<DialogEffect>,
}

impl BubbleDialog {
    pub fn new(height: f32) -> Self {
        Self {
            script: None,
            active: 0,
            open: false,
            height,
            effects: Vec::new(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn script(&self) -> Option<&Arc<Script>> {
        self.script.as_ref()
    }

    /// Hides the bubble. The shared typewriter keeps running the hidden
    /// conversation, so later hooks still fire.
    pub fn close(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;
        self.effects.push(DialogEffect::Closed);
    }

    pub fn drain_effects(&mut self) -> Vec<DialogEffect> {
        std::mem::take(&mut self.effects)
    }

    pub fn layout(&self, writer: &BubbleTypewriter, owner: Entity) -> Option<BubbleLayout> {
        if !self.open {
            return None;
        }
        let entry = self.script.as_ref()?.get(self.active)?;
        let mut layout = BubbleLayout::for_entry(entry, self.height);
        layout.text = if writer.owner == Some(owner) {
            writer.typewriter.visible_text()
        } else {
            entry.text.clone()
        };
        Some(layout)
    }

    fn push_hooks(&mut self, fired: Vec<Hook>) {
        self.effects.extend(fired.into_iter().map(DialogEffect::Hook));
    }

    /// Runs the rest of the conversation without showing it.
    fn force_complete(&mut self) {
        let Some(script) = self.script.clone() else {
            return;
        };
        let mut fired = Vec::new();
        navigator::run_to_end(&script, self.active, &mut fired);
        self.push_hooks(fired);
        self.close();
    }
}

/// Lookup of bubbles by owning NPC.
pub trait BubbleStore {
    fn with_bubble<R>(&mut self, owner: Entity, f: impl FnOnce(&mut BubbleDialog) -> R) -> Option<R>;
}

impl BubbleStore for Query<'_, '_, &mut BubbleDialog> {
    fn with_bubble<R>(&mut self, owner: Entity, f: impl FnOnce(&mut BubbleDialog) -> R) -> Option<R> {
        let mut bubble = self.get_mut(owner).ok()?;
        Some(f(&mut bubble))
    }
}

impl BubbleStore for HashMap<Entity, BubbleDialog> {
    fn with_bubble<R>(&mut self, owner: Entity, f: impl FnOnce(&mut BubbleDialog) -> R) -> Option<R> {
        self.get_mut(&owner).map(f)
    }
}

#[derive(Debug, Clone, Default)]
enum Phase {
    #[default]
    Idle,
    Revealing,
    Holding(Timer),
}

/// The typewriter all speech bubbles share.
#[derive(Resource, Debug, Clone, Default)]
pub struct BubbleTypewriter {
    typewriter: Typewriter,
    owner: Option<Entity>,
    entry: usize,
    phase: Phase,
    time_on: f32,
}

impl BubbleTypewriter {
    pub fn owner(&self) -> Option<Entity> {
        self.owner
    }

    /// Whether a conversation is currently typing or holding its text.
    pub fn is_active(&self) -> bool {
        !matches!(self.phase, Phase::Idle)
    }

    pub fn visible_text(&self) -> String {
        self.typewriter.visible_text()
    }

    /// Opens `owner`'s bubble on `start`. Returns `false` when nothing was
    /// opened: the entry doesn't exist, the NPC has no bubble, or that exact
    /// entry is already being revealed for the same NPC.
    pub fn open(
        &mut self,
        bubbles: &mut impl BubbleStore,
        owner: Entity,
        script: Arc<Script>,
        start: &DialogRef,
        settings: &NpcSettings,
    ) -> bool {
        let index = navigator::resolve(&script, start);
        if index >= script.len() {
            warn!(
                "bubble entry {index} is out of range for a script of {} entries",
                script.len()
            );
            return false;
        }
        if self.is_active() && self.owner == Some(owner) && self.entry == index {
            return false;
        }

        let opened = bubbles.with_bubble(owner, |bubble| {
            bubble.script = Some(script.clone());
            bubble.active = index;
            bubble.open = true;
            bubble.effects.push(DialogEffect::Shown(index));
        });
        if opened.is_none() {
            warn!("{owner} has no speech bubble");
            return false;
        }

        if let Some(previous) = self.owner
            && previous != owner
            && self.is_active()
        {
            debug!("{owner} takes the speech bubble typewriter from {previous}");
            bubbles.with_bubble(previous, BubbleDialog::force_complete);
        }

        self.start(bubbles, owner, &script, index, settings);
        true
    }

    /// Closes `owner`'s bubble and, if it owns the typewriter, stops its
    /// conversation so no further hooks fire.
    pub fn close_end_all(&mut self, bubbles: &mut impl BubbleStore, owner: Entity) {
        if self.owner == Some(owner) {
            self.release();
        }
        bubbles.with_bubble(owner, BubbleDialog::close);
    }

    pub fn tick(&mut self, bubbles: &mut impl BubbleStore, dt: f32, settings: &NpcSettings) {
        let Some(owner) = self.owner else {
            return;
        };
        match &mut self.phase {
            Phase::Idle => {}
            Phase::Revealing => {
                if self.typewriter.tick(dt) {
                    self.hold(bubbles, owner);
                }
            }
            Phase::Holding(timer) => {
                timer.tick(duration_from_secs(dt));
                if timer.is_finished() {
                    self.advance(bubbles, owner, settings);
                }
            }
        }
    }

    fn start(
        &mut self,
        bubbles: &mut impl BubbleStore,
        owner: Entity,
        script: &Script,
        index: usize,
        settings: &NpcSettings,
    ) {
        let Some(entry) = script.get(index) else {
            self.release();
            return;
        };
        self.owner = Some(owner);
        self.entry = index;
        self.time_on = settings.time_on(entry.time_on);
        self.phase = Phase::Revealing;
        if self
            .typewriter
            .start(&entry.text, settings.type_speed(entry.type_speed))
        {
            self.hold(bubbles, owner);
        }
    }

    fn hold(&mut self, bubbles: &mut impl BubbleStore, owner: Entity) {
        self.phase = Phase::Holding(Timer::new(
            duration_from_secs(self.time_on),
            TimerMode::Once,
        ));
        bubbles.with_bubble(owner, |bubble| bubble.effects.push(DialogEffect::Revealed));
    }

    fn advance(&mut self, bubbles: &mut impl BubbleStore, owner: Entity, settings: &NpcSettings) {
        let entry = self.entry;
        let step = bubbles.with_bubble(owner, |bubble| {
            let script = bubble.script.clone()?;
            let mut fired = Vec::new();
            let advance = navigator::step(&script, entry, &mut fired);
            bubble.push_hooks(fired);
            match advance {
                Advance::Moved(index) if index < script.len() => {
                    bubble.active = index;
                    if bubble.open {
                        bubble.effects.push(DialogEffect::Shown(index));
                    }
                    Some((script, index))
                }
                _ => {
                    bubble.close();
                    None
                }
            }
        });
        match step.flatten() {
            Some((script, index)) => self.start(bubbles, owner, &script, index, settings),
            None => self.release(),
        }
    }

    fn release(&mut self) {
        self.owner = None;
        self.phase = Phase::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::DialogEntry;

    struct Fixture {
        bubbles: HashMap<Entity, BubbleDialog>,
        writer: BubbleTypewriter,
        settings: NpcSettings,
        a: Entity,
        b: Entity,
    }

    impl Fixture {
        fn new() -> Self {
            let mut world = World::new();
            let a = world.spawn_empty().id();
            let b = world.spawn_empty().id();
            Self {
                bubbles: HashMap::from([(a, BubbleDialog::new(2.0)), (b, BubbleDialog::new(2.0))]),
                writer: BubbleTypewriter::default(),
                settings: NpcSettings::default(),
                a,
                b,
            }
        }

        fn open(&mut self, owner: Entity, script: &Arc<Script>) -> bool {
            self.writer.open(
                &mut self.bubbles,
                owner,
                script.clone(),
                &DialogRef::Index(0),
                &self.settings,
            )
        }

        fn tick(&mut self, dt: f32) {
            self.writer.tick(&mut self.bubbles, dt, &self.settings);
        }

        fn hooks(&mut self, owner: Entity) -> Vec<String> {
            self.bubbles
                .get_mut(&owner)
                .unwrap()
                .drain_effects()
                .into_iter()
                .filter_map(|effect| match effect {
                    DialogEffect::Hook(hook) => hook.name().map(str::to_string),
                    _ => None,
                })
                .collect()
        }

        fn bubble(&self, owner: Entity) -> &BubbleDialog {
            &self.bubbles[&owner]
        }
    }

    fn chatter(prefix: &str) -> Arc<Script> {
        Script::new()
            .entry(DialogEntry::new(format!("{prefix}1")).on_next(format!("{prefix}1").as_str()))
            .entry(DialogEntry::new(format!("{prefix}2")).on_next(format!("{prefix}2").as_str()))
            .entry(
                DialogEntry::new(format!("{prefix}3"))
                    .end()
                    .on_next(format!("{prefix}3").as_str()),
            )
            .into_shared()
    }

    #[test]
    fn holds_revealed_text_then_moves_on() {
        let mut fx = Fixture::new();
        let script = Script::new()
            .entry(DialogEntry::new("hi").type_speed(0.0).time_on(1.0).on_next("hi"))
            .entry(DialogEntry::new("bye").type_speed(0.0).end())
            .into_shared();
        assert!(fx.open(fx.a, &script));

        fx.tick(0.5);
        assert_eq!(fx.bubble(fx.a).active_index(), 0);
        fx.tick(0.5);
        assert_eq!(fx.bubble(fx.a).active_index(), 1);
        assert_eq!(fx.hooks(fx.a), vec!["hi"]);

        fx.tick(3.0);
        assert!(!fx.bubble(fx.a).is_open());
        assert!(!fx.writer.is_active());
    }

    #[test]
    fn takeover_finishes_previous_conversation_first() {
        let mut fx = Fixture::new();
        let (a, b) = (fx.a, fx.b);
        fx.open(a, &chatter("a"));
        fx.tick(0.05);
        fx.hooks(a);

        assert!(fx.open(b, &chatter("b")));
        assert_eq!(fx.hooks(a), vec!["a1", "a2", "a3"]);
        assert!(!fx.bubble(a).is_open());
        assert!(fx.bubble(b).is_open());
        assert_eq!(fx.writer.owner(), Some(b));
        assert!(fx.hooks(b).is_empty());
    }

    #[test]
    fn reopening_the_same_entry_is_ignored_while_revealing() {
        let mut fx = Fixture::new();
        let script = chatter("a");
        assert!(fx.open(fx.a, &script));
        fx.tick(0.02);
        let visible = fx.writer.visible_text();
        assert!(!fx.open(fx.a, &script));
        assert_eq!(fx.writer.visible_text(), visible);
    }

    #[test]
    fn hidden_bubble_keeps_cascading() {
        let mut fx = Fixture::new();
        let a = fx.a;
        let script = Script::new()
            .entry(DialogEntry::new("x").type_speed(0.0).time_on(1.0).on_next("x"))
            .entry(DialogEntry::new("y").type_speed(0.0).time_on(1.0).end().on_next("y"))
            .into_shared();
        fx.open(a, &script);
        fx.bubbles.get_mut(&a).unwrap().close();

        fx.tick(1.0);
        fx.tick(1.0);
        assert_eq!(fx.hooks(a), vec!["x", "y"]);
        assert!(!fx.writer.is_active());
    }

    #[test]
    fn hidden_bubble_stops_announcing_entries() {
        let mut fx = Fixture::new();
        let a = fx.a;
        let script = Script::new()
            .entry(DialogEntry::new("x").type_speed(0.0).time_on(0.2))
            .entry(DialogEntry::new("y").type_speed(0.0).time_on(0.2))
            .entry(DialogEntry::new("z").type_speed(0.0).end())
            .into_shared();
        fx.open(a, &script);
        fx.bubbles.get_mut(&a).unwrap().close();
        fx.bubbles.get_mut(&a).unwrap().drain_effects();

        fx.tick(0.2);
        fx.tick(0.2);
        assert_eq!(fx.bubble(a).active_index(), 2);
        let shown = fx
            .bubbles
            .get_mut(&a)
            .unwrap()
            .drain_effects()
            .into_iter()
            .filter(|effect| matches!(effect, DialogEffect::Shown(_)))
            .count();
        assert_eq!(shown, 0);
    }

    #[test]
    fn endless_hold_time_never_advances() {
        let mut fx = Fixture::new();
        let script = Script::new()
            .entry(DialogEntry::new("x").type_speed(0.0).time_on(f32::INFINITY))
            .entry(DialogEntry::new("y").end())
            .into_shared();
        assert!(fx.open(fx.a, &script));
        fx.tick(1.0e6);
        assert_eq!(fx.bubble(fx.a).active_index(), 0);
        assert!(fx.writer.is_active());
    }

    #[test]
    fn close_end_all_stops_the_cascade() {
        let mut fx = Fixture::new();
        let a = fx.a;
        let script = Script::new()
            .entry(DialogEntry::new("x").type_speed(0.0).time_on(1.0).on_next("x"))
            .entry(DialogEntry::new("y").end())
            .into_shared();
        fx.open(a, &script);
        fx.writer.close_end_all(&mut fx.bubbles, a);

        fx.tick(5.0);
        assert!(fx.hooks(a).is_empty());
        assert!(!fx.bubble(a).is_open());
        assert_eq!(fx.writer.owner(), None);
    }
}
