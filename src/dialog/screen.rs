use std::sync::Arc;

use bevy::prelude::*;

use super::{DialogEffect, DialogInput, layout::ScreenLayout};
use crate::{
    delay::DelayScheduler,
    script::{
        DialogEntry, DialogRef, Hook, ImageData, Script,
        navigator::{self, Advance, ButtonSlot, SkipOutcome},
    },
    settings::NpcSettings,
    typewriter::Typewriter,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScreenDelay {
    ShowButtons,
}

/// The one on-screen dialog window.
///
/// Pure state machine: it never spawns UI. Systems feed it inputs and time,
/// then drain [`DialogEffect`]s and read [`ScreenDialog::layout`].
#[derive(Resource)]
pub struct ScreenDialog {
    script: Option<Arc<Script>>,
    owner: Option<Entity>,
    default_portrait: Option<ImageData>,
    active: usize,
    open: bool,
    question: bool,
    fixed: bool,
    last_confirm: f64,
    buttons_visible: bool,
    typewriter: Typewriter,
    delays: DelayScheduler<ScreenDelay, ()>,
    effects: Vec<(Entity, DialogEffect)>,
    default_type_speed: f32,
    debounce_secs: f64,
    buttons_delay: f32,
    ui_scale: f32,
}

impl FromWorld for ScreenDialog {
    fn from_world(world: &mut World) -> Self {
        let settings = world
            .get_resource::<NpcSettings>()
            .cloned()
            .unwrap_or_default();
        Self::new(&settings)
    }
}

impl ScreenDialog {
    pub fn new(settings: &NpcSettings) -> Self {
        Self {
            script: None,
            owner: None,
            default_portrait: None,
            active: 0,
            open: false,
            question: false,
            fixed: false,
            last_confirm: f64::NEG_INFINITY,
            buttons_visible: false,
            typewriter: Typewriter::new(),
            delays: DelayScheduler::new(),
            effects: Vec::new(),
            default_type_speed: settings.default_type_speed,
            debounce_secs: settings.input_debounce_secs as f64,
            buttons_delay: settings.question_buttons_delay,
            ui_scale: settings.ui_scale,
        }
    }

    /// Opens the window on `start` for `owner`. `now` is the elapsed app time
    /// in seconds and starts the input debounce window.
    pub fn open(
        &mut self,
        script: Arc<Script>,
        start: &DialogRef,
        owner: Entity,
        default_portrait: Option<ImageData>,
        now: f64,
    ) -> bool {
        let index = navigator::resolve(&script, start);
        if index >= script.len() {
            warn!(
                "dialog entry {index} is out of range for a script of {} entries",
                script.len()
            );
            return false;
        }

        if self.open && self.owner != Some(owner) {
            self.close();
        }
        self.script = Some(script);
        self.owner = Some(owner);
        self.default_portrait = default_portrait;
        self.open = true;
        self.last_confirm = now;
        self.show(index);
        true
    }

    pub fn input(&mut self, input: DialogInput, now: f64) {
        if !self.open {
            return;
        }

        if let DialogInput::Button(slot) = input {
            if self.question && self.buttons_visible {
                self.branch(slot, now);
            }
            return;
        }

        if now - self.last_confirm < self.debounce_secs {
            return;
        }

        if input == DialogInput::Skip {
            if self.entry().is_some_and(|entry| entry.skipable) && !self.fixed {
                self.skip(now);
            }
            return;
        }

        if !self.typewriter.is_revealed() {
            self.rush();
            return;
        }

        match input {
            DialogInput::Confirm if self.question => self.branch(ButtonSlot::Confirm, now),
            DialogInput::Confirm if !self.fixed => self.next(now),
            DialogInput::Cancel if self.question => self.branch(ButtonSlot::Cancel, now),
            DialogInput::Cancel if !self.fixed => {
                if self.entry().is_some_and(|entry| entry.skipable) {
                    self.skip(now);
                }
            }
            DialogInput::Pointer if !self.question && !self.fixed => self.next(now),
            _ => {}
        }
    }

    /// Leaves the current entry the linear way. While text is still being
    /// typed this only finishes the text.
    pub fn next(&mut self, now: f64) {
        if !self.open {
            return;
        }
        if !self.typewriter.is_revealed() {
            self.rush();
            return;
        }
        self.last_confirm = now;
        let Some(script) = self.script.clone() else {
            return;
        };
        let mut fired = Vec::new();
        let advance = navigator::next(&script, self.active, &mut fired);
        self.apply(advance, fired);
    }

    /// Takes question button `slot`; ignored when the entry has fewer buttons.
    pub fn branch(&mut self, slot: ButtonSlot, now: f64) {
        if !self.open {
            return;
        }
        self.last_confirm = now;
        let Some(script) = self.script.clone() else {
            return;
        };
        let mut fired = Vec::new();
        let advance = navigator::branch(&script, self.active, slot, &mut fired);
        self.apply(advance, fired);
    }

    /// Skips every skipable entry from here on. Lands on the first entry
    /// that can't be skipped, or closes on a skipable end of dialog.
    pub fn skip(&mut self, now: f64) {
        if !self.open {
            return;
        }
        self.last_confirm = now;
        let Some(script) = self.script.clone() else {
            return;
        };
        let mut fired = Vec::new();
        let outcome = navigator::skip_run(
            &script,
            self.active,
            |entry| entry.skipable && !entry.is_question,
            &mut fired,
        );
        self.push_hooks(fired);
        match outcome {
            SkipOutcome::Stopped(index) => self.show(index),
            SkipOutcome::End => self.close(),
        }
    }

    pub fn rush(&mut self) {
        if self.typewriter.rush() {
            self.emit(DialogEffect::Revealed);
        }
    }

    /// Hides the window. Nothing further fires for the closed conversation.
    pub fn close(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;
        self.buttons_visible = false;
        self.delays.clear();
        self.emit(DialogEffect::Closed);
    }

    pub fn tick(&mut self, dt: f32) {
        if !self.open {
            return;
        }
        if self.typewriter.tick(dt) {
            self.emit(DialogEffect::Revealed);
        }
        for (delay, ()) in self.delays.tick(dt) {
            match delay {
                ScreenDelay::ShowButtons => self.buttons_visible = true,
            }
        }
    }

    /// Effects since the last drain, each tagged with the NPC it belongs to.
    pub fn drain_effects(&mut self) -> Vec<(Entity, DialogEffect)> {
        std::mem::take(&mut self.effects)
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_question(&self) -> bool {
        self.question
    }

    pub fn is_revealed(&self) -> bool {
        self.typewriter.is_revealed()
    }

    pub fn buttons_visible(&self) -> bool {
        self.buttons_visible
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    /// NPC the window was last opened for.
    pub fn owner(&self) -> Option<Entity> {
        self.owner
    }

    pub fn is_open_for(&self, owner: Entity) -> bool {
        self.open && self.owner == Some(owner)
    }

    pub fn entry(&self) -> Option<&DialogEntry> {
        self.entry_at(self.active)
    }

    pub fn entry_at(&self, index: usize) -> Option<&DialogEntry> {
        self.script.as_ref()?.get(index)
    }

    pub fn visible_text(&self) -> String {
        self.typewriter.visible_text()
    }

    pub fn layout(&self) -> Option<ScreenLayout> {
        if !self.open {
            return None;
        }
        let entry = self.entry()?;
        let mut layout =
            ScreenLayout::for_entry(entry, self.default_portrait.as_ref(), self.ui_scale);
        layout.text = self.typewriter.visible_text();
        layout.buttons_visible = self.buttons_visible;
        Some(layout)
    }

    fn apply(&mut self, advance: Advance, fired: Vec<Hook>) {
        self.push_hooks(fired);
        match advance {
            Advance::Stay => {}
            Advance::Moved(index) => self.show(index),
            Advance::End => self.close(),
        }
    }

    fn show(&mut self, index: usize) {
        let Some(entry) = self.script.as_ref().and_then(|script| script.get(index)) else {
            warn!("dialog entry {index} is out of range, closing the dialog window");
            self.close();
            return;
        };

        let text = entry.text.clone();
        let speed = entry.type_speed.unwrap_or(self.default_type_speed);
        self.question = entry.is_question;
        self.fixed = entry.is_fixed_screen;
        self.active = index;
        self.buttons_visible = false;
        self.delays.cancel(ScreenDelay::ShowButtons);
        if self.question {
            self.delays
                .schedule(ScreenDelay::ShowButtons, self.buttons_delay, ());
        }

        self.emit(DialogEffect::Shown(index));
        if self.typewriter.start(&text, speed) {
            self.emit(DialogEffect::Revealed);
        }
    }

    fn push_hooks(&mut self, fired: Vec<Hook>) {
        for hook in fired {
            self.emit(DialogEffect::Hook(hook));
        }
    }

    fn emit(&mut self, effect: DialogEffect) {
        if let Some(owner) = self.owner {
            self.effects.push((owner, effect));
        }
    }
}
