use bevy::{prelude::*, ui::FocusPolicy};

use super::theme;
use crate::{
    dialog::{
        DialogInput, PlacedImage, ScreenDialog, ScreenLayout,
        layout::{BUTTON_SIZE, CLICK_ICON_SIZE},
    },
    npc::Npc,
    script::ButtonSlot,
    settings::NpcSettings,
};

#[derive(Component)]
pub(super) struct DialogWindowRoot;

#[derive(Component)]
pub(super) struct DialogWindowText;

#[derive(Component, Debug, Clone, Copy)]
pub(super) struct DialogAnswerButton(ButtonSlot);

#[derive(Component)]
pub(super) struct DialogSkipButton;

/// The layout the window was last built from, minus its text.
#[derive(Resource, Default)]
pub(super) struct DialogWindowState {
    built: Option<ScreenLayout>,
}

/// Rebuilds the window when the entry changes and streams the typed text
/// into it every frame.
pub(super) fn sync_dialog_window(
    mut commands: Commands,
    mut state: ResMut<DialogWindowState>,
    screen: Res<ScreenDialog>,
    settings: Res<NpcSettings>,
    assets: Res<AssetServer>,
    npcs: Query<&Npc>,
    roots: Query<Entity, With<DialogWindowRoot>>,
    mut texts: Query<&mut Text, With<DialogWindowText>>,
) {
    let layout = screen.layout();
    let structure = layout.clone().map(|layout| ScreenLayout {
        text: String::new(),
        ..layout
    });

    if structure != state.built {
        for root in &roots {
            commands.entity(root).despawn();
        }
        if let Some(layout) = &layout {
            let dark = screen
                .owner()
                .and_then(|owner| npcs.get(owner).ok())
                .is_some_and(|npc| npc.dark_ui);
            spawn_dialog_window(&mut commands, &assets, layout, settings.ui_scale, dark);
        }
        state.built = structure;
        return;
    }

    let Some(layout) = layout else {
        return;
    };
    for mut text in &mut texts {
        if text.0 != layout.text {
            text.0.clone_from(&layout.text);
        }
    }
}

pub(super) fn handle_dialog_buttons(
    mut buttons: Query<
        (
            &Interaction,
            &mut BackgroundColor,
            Option<&DialogAnswerButton>,
            Has<DialogSkipButton>,
        ),
        Changed<Interaction>,
    >,
    mut inputs: MessageWriter<DialogInput>,
) {
    for (interaction, mut background, answer, skip) in &mut buttons {
        match *interaction {
            Interaction::Pressed => {
                *background = BackgroundColor(theme::BUTTON_BG);
                if let Some(DialogAnswerButton(slot)) = answer {
                    inputs.write(DialogInput::Button(*slot));
                } else if skip {
                    inputs.write(DialogInput::Skip);
                }
            }
            Interaction::Hovered => *background = BackgroundColor(theme::BUTTON_HOVER),
            Interaction::None => *background = BackgroundColor(theme::BUTTON_BG),
        }
    }
}

/// A node of `size` centred on `position`, relative to the panel centre.
fn placed(position: Vec2, size: Vec2) -> Node {
    Node {
        position_type: PositionType::Absolute,
        left: Val::Px(position.x - size.x / 2.0),
        top: Val::Px(-position.y - size.y / 2.0),
        width: Val::Px(size.x),
        height: Val::Px(size.y),
        justify_content: JustifyContent::Center,
        align_items: AlignItems::Center,
        ..default()
    }
}

fn image_node(assets: &AssetServer, image: &PlacedImage) -> impl Bundle {
    (
        placed(image.position, image.size),
        ImageNode {
            image: assets.load(image.path.clone()),
            rect: image.section,
            ..default()
        },
    )
}

fn spawn_dialog_window(
    commands: &mut Commands,
    assets: &AssetServer,
    layout: &ScreenLayout,
    scale: f32,
    dark: bool,
) {
    let (panel_bg, text_color) = theme::panel_colors(dark);
    let text_width = 560.0 * scale;

    commands
        .spawn((
            Name::new("Dialog Window"),
            DialogWindowRoot,
            Node {
                position_type: PositionType::Absolute,
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                justify_content: JustifyContent::Center,
                align_items: AlignItems::End,
                padding: UiRect::bottom(Val::Px(16.0)),
                ..default()
            },
            FocusPolicy::Pass,
            GlobalZIndex(120),
        ))
        .with_children(|overlay| {
            overlay
                .spawn((
                    Node {
                        width: Val::Px(theme::PANEL_WIDTH * scale),
                        height: Val::Px(theme::PANEL_HEIGHT * scale),
                        border: UiRect::all(Val::Px(3.0)),
                        justify_content: JustifyContent::Center,
                        align_items: AlignItems::Center,
                        ..default()
                    },
                    BackgroundColor(panel_bg),
                    theme::border(true),
                ))
                .with_children(|panel| {
                    panel
                        .spawn(Node {
                            width: Val::Px(0.0),
                            height: Val::Px(0.0),
                            ..default()
                        })
                        .with_children(|centre| {
                            if let Some(portrait) = &layout.portrait {
                                centre.spawn(image_node(assets, portrait));
                            }
                            if let Some(image) = &layout.image {
                                centre.spawn(image_node(assets, image));
                            }

                            centre.spawn((
                                DialogWindowText,
                                Node {
                                    position_type: PositionType::Absolute,
                                    left: Val::Px(layout.text_offset.x - text_width / 2.0),
                                    top: Val::Px(-layout.text_offset.y - layout.font_size),
                                    width: Val::Px(text_width),
                                    ..default()
                                },
                                Text::new(layout.text.clone()),
                                TextFont {
                                    font_size: layout.font_size,
                                    ..default()
                                },
                                TextColor(text_color),
                            ));

                            for button in &layout.buttons {
                                centre
                                    .spawn((
                                        Button,
                                        DialogAnswerButton(button.slot),
                                        Node {
                                            display: if layout.buttons_visible {
                                                Display::Flex
                                            } else {
                                                Display::None
                                            },
                                            border: UiRect::all(Val::Px(2.0)),
                                            ..placed(button.position, BUTTON_SIZE * scale)
                                        },
                                        BackgroundColor(theme::BUTTON_BG),
                                        theme::border(true),
                                    ))
                                    .with_child((
                                        Text::new(button.label.clone()),
                                        TextFont {
                                            font_size: button.font_size,
                                            ..default()
                                        },
                                        TextColor(theme::TEXT_DARK),
                                    ));
                            }

                            if layout.skip_visible {
                                centre
                                    .spawn((
                                        Button,
                                        DialogSkipButton,
                                        Node {
                                            border: UiRect::all(Val::Px(2.0)),
                                            ..placed(layout.skip_position, BUTTON_SIZE * scale * 0.6)
                                        },
                                        BackgroundColor(theme::BUTTON_BG),
                                        theme::border(true),
                                    ))
                                    .with_child((
                                        Text::new("skip"),
                                        TextFont {
                                            font_size: 16.0 * scale,
                                            ..default()
                                        },
                                        TextColor(theme::TEXT_DARK),
                                    ));
                            }

                            if layout.click_icon_visible {
                                centre.spawn((
                                    placed(
                                        layout.click_icon_position,
                                        Vec2::splat(CLICK_ICON_SIZE * scale),
                                    ),
                                    Text::new(">"),
                                    TextFont {
                                        font_size: CLICK_ICON_SIZE * scale,
                                        ..default()
                                    },
                                    TextColor(text_color),
                                ));
                            }
                        });
                });
        });
}
