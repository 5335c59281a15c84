//! Where things go on the dialog window and in speech bubbles.
//!
//! Screen positions are pixel offsets from the centre of the dialog panel,
//! y pointing up. Bubble sizes are in world units.

use bevy::prelude::*;

use crate::script::{ButtonSlot, DialogEntry, ImageData};

const PORTRAIT_POS: Vec2 = Vec2::new(-350.0, 0.0);
const IMAGE_POS: Vec2 = Vec2::new(350.0, 50.0);
const IMAGE_SIZE: f32 = 256.0;

const TEXT_SIZE: f32 = 24.0;
const TEXT_Y: f32 = 10.0;
const TEXT_RAISE_ONE_ROW: f32 = 24.0;
const TEXT_RAISE_TWO_ROWS: f32 = 50.0;

const BUTTON_TEXT_SIZE: f32 = 20.0;
pub const BUTTON_SIZE: Vec2 = Vec2::new(174.0, 46.0);
const BUTTON_X: [f32; 4] = [150.0, -80.0, -80.0, 150.0];
const BUTTON_Y_ONE_ROW: f32 = -65.0;
const BUTTON_Y_TWO_ROWS: f32 = -20.0;
const BUTTON_Y_SECOND_ROW: f32 = -80.0;

const SKIP_POS: Vec2 = Vec2::new(-300.0, -100.0);
const CLICK_ICON_POS: Vec2 = Vec2::new(340.0, -80.0);
pub const CLICK_ICON_SIZE: f32 = 26.0;

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedImage {
    pub path: String,
    pub position: Vec2,
    pub size: Vec2,
    /// Crop rectangle in source texture pixels.
    pub section: Option<Rect>,
}

impl PlacedImage {
    fn place(image: &ImageData, base: Vec2, scale: f32) -> Self {
        let offset = Vec2::new(image.offset_x.unwrap_or(0.0), image.offset_y.unwrap_or(0.0));
        Self {
            path: image.path.clone(),
            position: base * scale + offset * scale,
            size: Vec2::new(
                image.width.unwrap_or(IMAGE_SIZE),
                image.height.unwrap_or(IMAGE_SIZE),
            ) * scale,
            section: image.section.as_ref().map(|section| section.rect()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedButton {
    pub slot: ButtonSlot,
    pub label: String,
    pub position: Vec2,
    pub font_size: f32,
}

/// Everything the dialog window shows for the current entry.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScreenLayout {
    pub text: String,
    pub font_size: f32,
    pub text_offset: Vec2,
    pub portrait: Option<PlacedImage>,
    pub image: Option<PlacedImage>,
    pub buttons: Vec<PlacedButton>,
    pub buttons_visible: bool,
    pub skip_visible: bool,
    pub skip_position: Vec2,
    pub click_icon_visible: bool,
    pub click_icon_position: Vec2,
}

impl ScreenLayout {
    /// Lays out `entry`. The entry's own portrait wins over `default_portrait`.
    pub fn for_entry(entry: &DialogEntry, default_portrait: Option<&ImageData>, scale: f32) -> Self {
        let button_count = entry.buttons.len().min(4);
        let two_rows = button_count >= 3;

        let mut text_y = TEXT_Y + entry.offset_y.unwrap_or(0.0);
        if two_rows {
            text_y += TEXT_RAISE_TWO_ROWS;
        } else if button_count >= 1 {
            text_y += TEXT_RAISE_ONE_ROW;
        }

        let buttons = if entry.is_question {
            entry
                .buttons
                .iter()
                .zip(ButtonSlot::ALL)
                .map(|(button, slot)| {
                    let base_y = match slot {
                        ButtonSlot::Confirm | ButtonSlot::Cancel if two_rows => BUTTON_Y_TWO_ROWS,
                        ButtonSlot::Confirm | ButtonSlot::Cancel => BUTTON_Y_ONE_ROW,
                        ButtonSlot::Third | ButtonSlot::Fourth => BUTTON_Y_SECOND_ROW,
                    };
                    let base = Vec2::new(BUTTON_X[slot.index()], base_y);
                    let offset = Vec2::new(
                        button.offset_x.unwrap_or(0.0),
                        button.offset_y.unwrap_or(0.0),
                    );
                    PlacedButton {
                        slot,
                        label: button.label.clone(),
                        position: (base + offset) * scale,
                        font_size: button.font_size.unwrap_or(BUTTON_TEXT_SIZE) * scale,
                    }
                })
                .collect()
        } else {
            Vec::new()
        };

        let linear = !entry.is_question && !entry.is_fixed_screen;

        Self {
            text: String::new(),
            font_size: entry.font_size.unwrap_or(TEXT_SIZE) * scale,
            text_offset: Vec2::new(entry.offset_x.unwrap_or(0.0) * scale, text_y * scale),
            portrait: entry
                .portrait
                .as_ref()
                .or(default_portrait)
                .map(|portrait| PlacedImage::place(portrait, PORTRAIT_POS, scale)),
            image: entry
                .image
                .as_ref()
                .map(|image| PlacedImage::place(image, IMAGE_POS, scale)),
            buttons,
            buttons_visible: false,
            skip_visible: linear && entry.skipable,
            skip_position: SKIP_POS * scale,
            click_icon_visible: linear,
            click_icon_position: CLICK_ICON_POS * scale,
        }
    }
}

/// Speech bubble size class, picked from the entry's text length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BubbleSize {
    Short,
    Normal,
    Long,
    Huge,
}

impl BubbleSize {
    pub fn for_text(text: &str) -> Self {
        match text.chars().count() {
            0..8 => Self::Short,
            8..25 => Self::Normal,
            25..50 => Self::Long,
            _ => Self::Huge,
        }
    }

    pub fn panel_size(self) -> Vec2 {
        let pixels = match self {
            Self::Short => Vec2::new(116.0, 84.0),
            Self::Normal => Vec2::new(286.0, 84.0),
            Self::Long => Vec2::new(497.0, 153.0),
            Self::Huge => Vec2::new(497.0, 239.0),
        };
        pixels * 0.005
    }

    pub fn container_offset(self) -> Vec2 {
        match self {
            Self::Short => Vec2::new(-0.1, -0.2),
            Self::Normal => Vec2::new(-0.5, -0.2),
            Self::Long => Vec2::new(-0.8, 0.0),
            Self::Huge => Vec2::new(-0.8, 0.2),
        }
    }

    pub fn text_width(self) -> f32 {
        match self {
            Self::Short => 0.7,
            Self::Normal => 1.5,
            Self::Long | Self::Huge => 2.0,
        }
    }
}

/// Everything a speech bubble shows.
#[derive(Debug, Clone, PartialEq)]
pub struct BubbleLayout {
    pub text: String,
    pub size: BubbleSize,
    pub font_size: f32,
    pub text_offset: Vec2,
    /// Height above the NPC's origin, in metres.
    pub height: f32,
}

impl BubbleLayout {
    pub fn for_entry(entry: &DialogEntry, height: f32) -> Self {
        Self {
            text: String::new(),
            size: BubbleSize::for_text(&entry.text),
            font_size: entry.font_size.unwrap_or(1.0),
            text_offset: Vec2::new(entry.offset_x.unwrap_or(0.0), entry.offset_y.unwrap_or(0.0)),
            height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::{ButtonEntry, ImageSection};

    const SCALE: f32 = 0.75;

    fn question(buttons: usize) -> DialogEntry {
        let mut entry = DialogEntry::new("?").question();
        for i in 0..buttons {
            entry = entry.button(ButtonEntry::new(format!("b{i}"), 0usize));
        }
        entry
    }

    #[test]
    fn two_buttons_sit_on_one_row() {
        let layout = ScreenLayout::for_entry(&question(2), None, SCALE);
        assert_eq!(layout.text_offset.y, (10.0 + 24.0) * SCALE);
        assert_eq!(layout.buttons[0].position, Vec2::new(150.0, -65.0) * SCALE);
        assert_eq!(layout.buttons[1].position, Vec2::new(-80.0, -65.0) * SCALE);
        assert!(!layout.click_icon_visible);
        assert!(!layout.skip_visible);
    }

    #[test]
    fn four_buttons_use_two_rows() {
        let layout = ScreenLayout::for_entry(&question(4), None, SCALE);
        assert_eq!(layout.text_offset.y, (10.0 + 50.0) * SCALE);
        let positions: Vec<Vec2> = layout.buttons.iter().map(|b| b.position / SCALE).collect();
        assert_eq!(
            positions,
            vec![
                Vec2::new(150.0, -20.0),
                Vec2::new(-80.0, -20.0),
                Vec2::new(-80.0, -80.0),
                Vec2::new(150.0, -80.0),
            ]
        );
    }

    #[test]
    fn linear_entry_shows_click_icon_and_optional_skip() {
        let plain = ScreenLayout::for_entry(&DialogEntry::new("hi"), None, SCALE);
        assert!(plain.click_icon_visible);
        assert!(!plain.skip_visible);
        assert!(plain.buttons.is_empty());

        let skipable = ScreenLayout::for_entry(&DialogEntry::new("hi").skipable(), None, SCALE);
        assert!(skipable.skip_visible);

        let fixed = ScreenLayout::for_entry(&DialogEntry::new("hi").fixed_screen().skipable(), None, SCALE);
        assert!(!fixed.click_icon_visible);
        assert!(!fixed.skip_visible);
    }

    #[test]
    fn entry_portrait_overrides_default() {
        let default = ImageData::new("default.png");
        let layout = ScreenLayout::for_entry(&DialogEntry::new("hi"), Some(&default), SCALE);
        let portrait = layout.portrait.unwrap();
        assert_eq!(portrait.path, "default.png");
        assert_eq!(portrait.size, Vec2::splat(256.0 * SCALE));

        let entry = DialogEntry::new("hi").portrait(
            ImageData::new("own.png")
                .offset(10.0, 0.0)
                .section(ImageSection {
                    source_width: 32.0,
                    source_height: 16.0,
                    source_left: 8.0,
                    source_top: 0.0,
                }),
        );
        let portrait = ScreenLayout::for_entry(&entry, Some(&default), SCALE)
            .portrait
            .unwrap();
        assert_eq!(portrait.path, "own.png");
        assert_eq!(portrait.position, Vec2::new(-340.0, 0.0) * SCALE);
        assert_eq!(portrait.section, Some(Rect::new(8.0, 0.0, 40.0, 16.0)));
    }

    #[test]
    fn bubble_size_classes_follow_text_length() {
        assert_eq!(BubbleSize::for_text("hey"), BubbleSize::Short);
        assert_eq!(BubbleSize::for_text("12345678"), BubbleSize::Normal);
        assert_eq!(BubbleSize::for_text(&"x".repeat(25)), BubbleSize::Long);
        assert_eq!(BubbleSize::for_text(&"x".repeat(50)), BubbleSize::Huge);
        assert_eq!(BubbleSize::Short.panel_size(), Vec2::new(116.0, 84.0) * 0.005);
    }
}
