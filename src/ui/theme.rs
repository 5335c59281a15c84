use bevy::prelude::*;

pub(super) const PANEL_WIDTH: f32 = 920.0;
pub(super) const PANEL_HEIGHT: f32 = 260.0;

pub(super) const PANEL_BG: Color = Color::srgb(0.70, 0.70, 0.66);
pub(super) const PANEL_BG_DARK: Color = Color::srgb(0.08, 0.09, 0.12);
pub(super) const TEXT_DARK: Color = Color::srgb(0.05, 0.05, 0.05);
pub(super) const TEXT_LIGHT: Color = Color::srgb(0.93, 0.94, 0.91);
pub(super) const BUTTON_BG: Color = Color::srgb(0.73, 0.73, 0.69);
pub(super) const BUTTON_HOVER: Color = Color::srgb(0.82, 0.82, 0.79);
pub(super) const BUBBLE_BG: Color = Color::srgba(0.97, 0.97, 0.94, 0.92);
pub(super) const BORDER_LIGHT: Color = Color::srgb(0.92, 0.92, 0.88);
pub(super) const BORDER_DARK: Color = Color::srgb(0.18, 0.18, 0.18);

pub(super) fn border(raised: bool) -> BorderColor {
    let (top_left, bottom_right) = if raised {
        (BORDER_LIGHT, BORDER_DARK)
    } else {
        (BORDER_DARK, BORDER_LIGHT)
    };
    BorderColor {
        top: top_left,
        left: top_left,
        right: bottom_right,
        bottom: bottom_right,
    }
}

pub(super) fn panel_colors(dark: bool) -> (Color, Color) {
    if dark {
        (PANEL_BG_DARK, TEXT_LIGHT)
    } else {
        (PANEL_BG, TEXT_DARK)
    }
}
