use bevy::{asset::LoadState, prelude::*};
use components::{GameOverOverlay, GameOverTextComponent, RestartButton, ScoreTextComponent};
use resources::UiFontResource;
use snake::SnakeGameSnapshot;
use snake_plugin::{
    events::{FoodAteEvent, GameOverEvent, RestartEvent},
    SnakePlugin,
};

pub mod configuration;
pub mod snake;
mod snake_plugin;

pub use configuration::{ConfigurationError, GameConfiguration};

const FONT_PATH: &str = "fonts/DejaVuSans-Bold.ttf";

const BUTTON_COLOR: Color = Color::YELLOW;
const HOVERED_BUTTON_COLOR: Color = Color::GOLD;

/// Expects a [`snake::SnakeGame`] resource to be inserted before it is added.
pub struct MainPlugin;
impl Plugin for MainPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(ClearColor(Color::BLACK))
            .add_plugin(SnakePlugin)
            .add_startup_system(setup)
            .add_system(show_game_over_splash.after("play"))
            .add_system(hide_game_over_splash.after("restart"))
            .add_system(increment_score.after("play"))
            .add_system(try_again_button.before("restart"))
            .add_system(report_missing_font);
    }
}

fn show_game_over_splash(
    mut game_over_event_reader: EventReader<GameOverEvent>,
    snapshot: Res<SnakeGameSnapshot>,
    mut overlay_query: Query<
        (&mut Style, &mut Visibility),
        (With<GameOverOverlay>, Without<ScoreTextComponent>),
    >,
    mut score_query: Query<&mut Visibility, With<ScoreTextComponent>>,
    mut game_over_text_query: Query<&mut Text, With<GameOverTextComponent>>,
) {
    let collision = match game_over_event_reader.iter().last() {
        Some(event) => &event.collision,
        None => return,
    };

    warn!("Game over! {}", collision);

    if let Ok(mut text) = game_over_text_query.get_single_mut() {
        text.sections[0].value = game_over_message(snapshot.score);
    }

    set_overlay_visible(true, &mut overlay_query);
    for mut visibility in &mut score_query {
        visibility.is_visible = false;
    }
}

fn hide_game_over_splash(
    mut restart_event_reader: EventReader<RestartEvent>,
    snapshot: Res<SnakeGameSnapshot>,
    mut overlay_query: Query<
        (&mut Style, &mut Visibility),
        (With<GameOverOverlay>, Without<ScoreTextComponent>),
    >,
    mut score_query: Query<(&mut Visibility, &mut Text), With<ScoreTextComponent>>,
) {
    if restart_event_reader.iter().count() == 0 {
        return;
    }

    info!("Try again!");

    set_overlay_visible(false, &mut overlay_query);
    for (mut visibility, mut text) in &mut score_query {
        visibility.is_visible = true;
        text.sections[0].value = score_message(snapshot.score);
    }
}

fn increment_score(
    mut food_ate_event_reader: EventReader<FoodAteEvent>,
    snapshot: Res<SnakeGameSnapshot>,
    mut score_component_query: Query<&mut Text, With<ScoreTextComponent>>,
) {
    if food_ate_event_reader.iter().count() == 0 {
        return;
    }

    if let Ok(mut score_text) = score_component_query.get_single_mut() {
        score_text.sections[0].value = score_message(snapshot.score);
    }
}

fn try_again_button(
    mut interaction_query: Query<
        (&Interaction, &mut UiColor),
        (Changed<Interaction>, With<RestartButton>),
    >,
    mut restart_event_writer: EventWriter<RestartEvent>,
) {
    for (interaction, mut color) in &mut interaction_query {
        match *interaction {
            Interaction::Clicked => restart_event_writer.send(RestartEvent),
            Interaction::Hovered => *color = HOVERED_BUTTON_COLOR.into(),
            Interaction::None => *color = BUTTON_COLOR.into(),
        }
    }
}

fn report_missing_font(asset_server: Res<AssetServer>, mut font: ResMut<UiFontResource>) {
    if font.reported {
        return;
    }

    match asset_server.get_load_state(&font.handle) {
        LoadState::Loaded => font.reported = true,
        LoadState::Failed => {
            warn!("Unable to load font {}, texts will not be displayed", FONT_PATH);
            font.reported = true;
        }
        _ => {}
    }
}

fn set_overlay_visible(
    visible: bool,
    overlay_query: &mut Query<
        (&mut Style, &mut Visibility),
        (With<GameOverOverlay>, Without<ScoreTextComponent>),
    >,
) {
    for (mut style, mut visibility) in overlay_query.iter_mut() {
        style.display = if visible { Display::Flex } else { Display::None };
        visibility.is_visible = visible;
    }
}

fn score_message(score: usize) -> String {
    format!("Score: {}", score)
}

fn game_over_message(score: usize) -> String {
    format!("Game Over\n{}", score_message(score))
}

fn setup(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    snapshot: Res<SnakeGameSnapshot>,
) {
    let font: Handle<Font> = asset_server.load(FONT_PATH);
    commands.insert_resource(UiFontResource {
        handle: font.clone(),
        reported: false,
    });

    // set up the camera
    let camera = Camera2dBundle::default();
    commands.spawn_bundle(camera);

    commands
        .spawn_bundle(
            TextBundle::from_section(
                score_message(snapshot.score),
                TextStyle {
                    font: font.clone(),
                    font_size: 16.,
                    color: Color::WHITE,
                },
            )
            .with_text_alignment(TextAlignment::TOP_LEFT)
            .with_style(Style {
                align_self: AlignSelf::FlexEnd,
                position_type: PositionType::Absolute,
                position: UiRect {
                    top: Val::Px(5.0),
                    left: Val::Px(10.0),
                    ..default()
                },
                ..default()
            }),
        )
        .insert(ScoreTextComponent);

    spawn_game_over_screen(&mut commands, font);
}

fn spawn_game_over_screen(commands: &mut Commands, font: Handle<Font>) {
    let hidden = Visibility { is_visible: false };

    commands
        .spawn_bundle(NodeBundle {
            style: Style {
                size: Size::new(Val::Percent(100.0), Val::Percent(100.0)),
                position_type: PositionType::Absolute,
                // children are laid out bottom-up otherwise
                flex_direction: FlexDirection::ColumnReverse,
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                display: Display::None,
                ..default()
            },
            color: Color::NONE.into(),
            visibility: hidden.clone(),
            ..default()
        })
        .insert(GameOverOverlay)
        .with_children(|parent| {
            parent
                .spawn_bundle(
                    TextBundle::from_section(
                        game_over_message(0),
                        TextStyle {
                            font: font.clone(),
                            font_size: 18.0,
                            color: Color::RED,
                        },
                    )
                    .with_text_alignment(TextAlignment::CENTER)
                    .with_style(Style {
                        align_self: AlignSelf::Center,
                        ..default()
                    }),
                )
                .insert(GameOverTextComponent)
                .insert(GameOverOverlay)
                .insert(hidden.clone());

            parent
                .spawn_bundle(ButtonBundle {
                    style: Style {
                        size: Size::new(Val::Px(100.0), Val::Px(30.0)),
                        margin: UiRect {
                            top: Val::Px(20.0),
                            ..default()
                        },
                        justify_content: JustifyContent::Center,
                        align_items: AlignItems::Center,
                        ..default()
                    },
                    color: BUTTON_COLOR.into(),
                    visibility: hidden.clone(),
                    ..default()
                })
                .insert(RestartButton)
                .insert(GameOverOverlay)
                .with_children(|button| {
                    button
                        .spawn_bundle(TextBundle::from_section(
                            "Try Again",
                            TextStyle {
                                font,
                                font_size: 14.0,
                                color: Color::BLACK,
                            },
                        ))
                        .insert(GameOverOverlay)
                        .insert(hidden);
                });
        });
}

mod components {
    use bevy::prelude::Component;

    #[derive(Component)]
    pub struct ScoreTextComponent;

    /// Everything shown only once the game is over.
    #[derive(Component)]
    pub struct GameOverOverlay;

    #[derive(Component)]
    pub struct GameOverTextComponent;

    #[derive(Component)]
    pub struct RestartButton;
}

mod resources {
    use bevy::{prelude::Handle, text::Font};

    pub struct UiFontResource {
        pub handle: Handle<Font>,
        pub reported: bool,
    }
}
