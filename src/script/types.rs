use std::{fmt, sync::Arc};

use bevy::prelude::*;
use serde::{Deserialize, Deserializer};

/// Closure hook run in-line with the dialog transition that fired it.
pub type HookFn = Arc<dyn Fn(&mut Commands, Entity) + Send + Sync>;

/// Something to do when a dialog transition happens.
///
/// In RON a hook is written as a plain string and surfaces as an
/// [`NpcHookTriggered`](crate::dialog::NpcHookTriggered) message; code can
/// attach a closure instead.
#[derive(Clone)]
pub enum Hook {
    Named(String),
    Run(HookFn),
}

impl Hook {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    pub fn run(f: impl Fn(&mut Commands, Entity) + Send + Sync + 'static) -> Self {
        Self::Run(Arc::new(f))
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Named(name) => Some(name),
            Self::Run(_) => None,
        }
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.debug_tuple("Named").field(name).finish(),
            Self::Run(_) => f.write_str("Run(..)"),
        }
    }
}

impl PartialEq for Hook {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Named(a), Self::Named(b)) => a == b,
            (Self::Run(a), Self::Run(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<&str> for Hook {
    fn from(value: &str) -> Self {
        Self::named(value)
    }
}

impl<'de> Deserialize<'de> for Hook {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::Named)
    }
}

/// Jump target: an entry index, or the `name` of an entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum DialogRef {
    Index(usize),
    Name(String),
}

impl Default for DialogRef {
    fn default() -> Self {
        Self::Index(0)
    }
}

impl From<usize> for DialogRef {
    fn from(value: usize) -> Self {
        Self::Index(value)
    }
}

impl From<&str> for DialogRef {
    fn from(value: &str) -> Self {
        Self::Name(value.to_string())
    }
}

impl From<String> for DialogRef {
    fn from(value: String) -> Self {
        Self::Name(value)
    }
}

/// Crop rectangle inside an image's source texture, in pixels.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSection {
    pub source_width: f32,
    pub source_height: f32,
    #[serde(default)]
    pub source_left: f32,
    #[serde(default)]
    pub source_top: f32,
}

impl ImageSection {
    pub fn rect(&self) -> Rect {
        Rect::new(
            self.source_left,
            self.source_top,
            self.source_left + self.source_width,
            self.source_top + self.source_height,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageData {
    pub path: String,
    pub offset_x: Option<f32>,
    pub offset_y: Option<f32>,
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub section: Option<ImageSection>,
}

impl ImageData {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..default()
        }
    }

    pub fn size(mut self, width: f32, height: f32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn offset(mut self, x: f32, y: f32) -> Self {
        self.offset_x = Some(x);
        self.offset_y = Some(y);
        self
    }

    pub fn section(mut self, section: ImageSection) -> Self {
        self.section = Some(section);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ButtonEntry {
    pub label: String,
    pub go_to_dialog: DialogRef,
    pub triggered_actions: Option<Hook>,
    pub font_size: Option<f32>,
    pub offset_x: Option<f32>,
    pub offset_y: Option<f32>,
}

impl ButtonEntry {
    pub fn new(label: impl Into<String>, go_to_dialog: impl Into<DialogRef>) -> Self {
        Self {
            label: label.into(),
            go_to_dialog: go_to_dialog.into(),
            ..default()
        }
    }

    pub fn action(mut self, hook: impl Into<Hook>) -> Self {
        self.triggered_actions = Some(hook.into());
        self
    }

    pub fn font_size(mut self, size: f32) -> Self {
        self.font_size = Some(size);
        self
    }
}

/// One line of a conversation.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DialogEntry {
    pub text: String,
    pub name: Option<String>,
    pub font_size: Option<f32>,
    pub offset_x: Option<f32>,
    pub offset_y: Option<f32>,
    /// Characters per second; zero or less shows the text at once.
    pub type_speed: Option<f32>,
    pub is_question: bool,
    pub is_fixed_screen: bool,
    pub is_end_of_dialog: bool,
    pub skipable: bool,
    /// Bubble only: seconds the revealed text stays up before moving on.
    pub time_on: Option<f32>,
    pub triggered_by_next: Option<Hook>,
    pub audio: Option<String>,
    pub portrait: Option<ImageData>,
    pub image: Option<ImageData>,
    pub buttons: Vec<ButtonEntry>,
}

impl DialogEntry {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..default()
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn type_speed(mut self, chars_per_second: f32) -> Self {
        self.type_speed = Some(chars_per_second);
        self
    }

    pub fn time_on(mut self, secs: f32) -> Self {
        self.time_on = Some(secs);
        self
    }

    pub fn question(mut self) -> Self {
        self.is_question = true;
        self
    }

    pub fn fixed_screen(mut self) -> Self {
        self.is_fixed_screen = true;
        self
    }

    pub fn end(mut self) -> Self {
        self.is_end_of_dialog = true;
        self
    }

    pub fn skipable(mut self) -> Self {
        self.skipable = true;
        self
    }

    pub fn on_next(mut self, hook: impl Into<Hook>) -> Self {
        self.triggered_by_next = Some(hook.into());
        self
    }

    pub fn audio(mut self, path: impl Into<String>) -> Self {
        self.audio = Some(path.into());
        self
    }

    pub fn portrait(mut self, portrait: ImageData) -> Self {
        self.portrait = Some(portrait);
        self
    }

    pub fn image(mut self, image: ImageData) -> Self {
        self.image = Some(image);
        self
    }

    pub fn button(mut self, button: ButtonEntry) -> Self {
        self.buttons.push(button);
        self
    }
}

/// An ordered conversation. Sessions hold scripts behind an `Arc` and never
/// mutate them.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(transparent)]
pub struct Script {
    pub entries: Vec<DialogEntry>,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry(mut self, entry: DialogEntry) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn get(&self, index: usize) -> Option<&DialogEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl From<Vec<DialogEntry>> for Script {
    fn from(entries: Vec<DialogEntry>) -> Self {
        Self { entries }
    }
}
