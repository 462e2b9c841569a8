use bevy::{
    input::{keyboard::KeyboardInput, ButtonState},
    prelude::*,
};

use crate::snake::{Direction, Position, SnakeGame, SnakeGameSnapshot, Tick};

use self::{
    components::*,
    events::{FoodAteEvent, GameOverEvent, GameTick, RestartEvent},
    resources::{DrawConfigurationResource, GameTimerResource},
};

const FOOD_Z: f32 = 0.;
// Snake can overlap with foods,
// so should be bigger
const SNAKE_Z: f32 = 1.;

pub(crate) const HEAD_COLOR: Color = Color::GREEN;
pub(crate) const BODY_COLOR: Color = Color::WHITE;
pub(crate) const FOOD_COLOR: Color = Color::RED;

pub struct SnakePlugin;

impl Plugin for SnakePlugin {
    fn build(&self, app: &mut App) {
        let snake_game = app.world.resource::<SnakeGame>();
        let configuration = snake_game.configuration();

        let cell_size = configuration.tile_size as f32;
        let draw_configuration = DrawConfigurationResource {
            cell_size,
            half_cell: cell_size / 2.,
            origin: (
                -configuration.board_width as f32 / 2.,
                configuration.board_height as f32 / 2.,
            ),
        };
        let timer = Timer::new(configuration.tick_delay, true);
        let snapshot = snake_game.snapshot();

        app.insert_resource(snapshot)
            .insert_resource(draw_configuration)
            .insert_resource(GameTimerResource(timer))
            .init_resource::<SnakeSprites>()
            .add_event::<GameOverEvent>()
            .add_event::<FoodAteEvent>()
            .add_event::<GameTick>()
            .add_event::<RestartEvent>()
            .add_startup_system(draw_food)
            .add_startup_system(draw_snake)
            .add_system(game_tick.before("play"))
            .add_system(change_direction.before("play"))
            .add_system(restart_game.label("restart").before("play"))
            .add_system(play.label("play"))
            .add_system(update_snake_head.after("play"))
            .add_system(update_snake_body.after("play"))
            .add_system(update_food.after("play"))
            .add_system(game_over.after("play"));
    }
}

fn game_tick(
    time: Res<Time>,
    mut game_timers: ResMut<GameTimerResource>,
    mut tick_event_writer: EventWriter<GameTick>,
) {
    let game_timers = &mut game_timers.0;
    if !game_timers.tick(time.delta()).just_finished() {
        return;
    }

    debug!("tick!");

    tick_event_writer.send(GameTick);
}

fn play(
    mut tick_event: EventReader<GameTick>,
    mut snake_game: ResMut<SnakeGame>,
    mut snapshot: ResMut<SnakeGameSnapshot>,
    mut game_over_event_writer: EventWriter<GameOverEvent>,
) {
    if tick_event.iter().count() == 0 {
        return;
    }

    let tick = snake_game.advance();
    match &tick {
        Tick::Idle => return,
        Tick::GameOver(collision) => {
            game_over_event_writer.send(GameOverEvent {
                collision: collision.clone(),
            });
        }
        Tick::Moved | Tick::Ate => {}
    }

    *snapshot = snake_game.snapshot_after(&tick);
}

fn restart_game(
    mut restart_event_reader: EventReader<RestartEvent>,
    mut snake_game: ResMut<SnakeGame>,
    mut snapshot: ResMut<SnakeGameSnapshot>,
    mut game_timers: ResMut<GameTimerResource>,
) {
    if restart_event_reader.iter().count() == 0 {
        return;
    }

    snake_game.reset();
    *snapshot = snake_game.snapshot();

    let game_timers = &mut game_timers.0;
    game_timers.reset();
    game_timers.unpause();
}

fn update_snake_head(
    draw_configuration: Res<DrawConfigurationResource>,
    snapshot: Res<SnakeGameSnapshot>,
    mut head_snake_query: Query<&mut Transform, With<HeadSnakeComponent>>,
) {
    if !snapshot.is_changed() {
        return;
    }

    let position = match snapshot.snake.first() {
        Some(position) => position,
        None => return,
    };
    if let Ok(mut transform) = head_snake_query.get_single_mut() {
        move_to(&mut transform, position, &draw_configuration);
    }
}

fn update_snake_body(
    mut commands: Commands,
    sprites: Res<SnakeSprites>,
    draw_configuration: Res<DrawConfigurationResource>,
    snapshot: Res<SnakeGameSnapshot>,
    mut body_snake_query: Query<(Entity, &mut Transform), With<BodySnakeComponent>>,
) {
    if !snapshot.is_changed() {
        return;
    }

    let mut bodies = body_snake_query.iter_mut();
    for snake_body_position in snapshot.snake.iter().skip(1) {
        match bodies.next() {
            Some(mut e) => {
                move_to(&mut e.1, snake_body_position, &draw_configuration);
            }
            None => {
                spawn_snake_body(
                    &mut commands,
                    &sprites,
                    snake_body_position,
                    &draw_configuration,
                );
            }
        }
    }

    // A restart leaves more pieces than needed
    bodies.for_each(|p| {
        commands.entity(p.0).despawn();
    });
}

fn update_food(
    draw_configuration: Res<DrawConfigurationResource>,
    snapshot: Res<SnakeGameSnapshot>,
    mut food_query: Query<&mut Transform, With<FoodComponent>>,
    mut food_ate_event_writer: EventWriter<FoodAteEvent>,
) {
    if !snapshot.is_changed() {
        return;
    }

    if let Ok(mut food_position) = food_query.get_single_mut() {
        move_to(&mut food_position, &snapshot.food, &draw_configuration);
    }

    if snapshot.food_ate {
        food_ate_event_writer.send(FoodAteEvent);
    }
}

fn change_direction(
    mut keyboard_input_events: EventReader<KeyboardInput>,
    mut snake_game: ResMut<SnakeGame>,
) {
    let directions = keyboard_input_events
        .iter()
        .filter(|ki| ki.state == ButtonState::Pressed)
        .filter_map(|ki| ki.key_code)
        .filter_map(|kc| match kc {
            KeyCode::Up => Some(Direction::Up),
            KeyCode::Down => Some(Direction::Down),
            KeyCode::Left => Some(Direction::Left),
            KeyCode::Right => Some(Direction::Right),
            _ => None,
        });

    for direction in directions {
        snake_game.set_direction(direction);
    }
}

fn game_over(
    mut game_over_event_reader: EventReader<GameOverEvent>,
    mut game_timers: ResMut<GameTimerResource>,
) {
    if game_over_event_reader.iter().count() == 0 {
        return;
    }

    let game_timers = &mut game_timers.0;
    game_timers.pause();
}

fn draw_snake(
    mut commands: Commands,
    sprites: Res<SnakeSprites>,
    draw_configuration: Res<DrawConfigurationResource>,
    snapshot: Res<SnakeGameSnapshot>,
) {
    for (i, position) in snapshot.snake.iter().enumerate() {
        let is_head = i == 0;

        if is_head {
            let mut snake_head = sprites.snake_head();

            move_to(&mut snake_head.transform, position, &draw_configuration);
            snake_head.transform.translation.z = SNAKE_Z;

            commands.spawn_bundle(snake_head).insert(HeadSnakeComponent);
        } else {
            spawn_snake_body(&mut commands, &sprites, position, &draw_configuration);
        };
    }
}

fn draw_food(
    mut commands: Commands,
    sprites: Res<SnakeSprites>,
    draw_configuration: Res<DrawConfigurationResource>,
    snapshot: Res<SnakeGameSnapshot>,
) {
    let mut food = sprites.food();
    move_to(&mut food.transform, &snapshot.food, &draw_configuration);
    food.transform.translation.z = FOOD_Z;

    commands.spawn_bundle(food).insert(FoodComponent);
}

fn spawn_snake_body(
    commands: &mut Commands,
    sprites: &SnakeSprites,
    position: &Position,
    draw_configuration: &DrawConfigurationResource,
) {
    let mut sprite = sprites.snake_body();
    move_to(&mut sprite.transform, position, draw_configuration);
    sprite.transform.translation.z = SNAKE_Z;

    commands.spawn_bundle(sprite).insert(BodySnakeComponent);
}

/// Game positions are pixels from the top left corner, y going down;
/// the camera has its origin in the middle of the window, y going up.
fn move_to(
    transform: &mut Transform,
    to: &Position,
    draw_configuration: &DrawConfigurationResource,
) {
    transform.translation.x =
        draw_configuration.origin.0 + to.x as f32 + draw_configuration.half_cell;
    transform.translation.y =
        draw_configuration.origin.1 - to.y as f32 - draw_configuration.half_cell;
}

/// Plain coloured squares, one per cell.
pub struct SnakeSprites {
    snake_head: SpriteBundle,
    snake_body: SpriteBundle,
    food: SpriteBundle,
}
impl SnakeSprites {
    pub fn snake_body(&self) -> SpriteBundle {
        self.snake_body.clone()
    }
    pub fn snake_head(&self) -> SpriteBundle {
        self.snake_head.clone()
    }
    pub fn food(&self) -> SpriteBundle {
        self.food.clone()
    }
}
impl FromWorld for SnakeSprites {
    fn from_world(world: &mut World) -> Self {
        let draw_configuration = world.resource::<DrawConfigurationResource>();

        SnakeSprites {
            snake_head: plain_sprite(HEAD_COLOR, draw_configuration),
            snake_body: plain_sprite(BODY_COLOR, draw_configuration),
            food: plain_sprite(FOOD_COLOR, draw_configuration),
        }
    }
}

fn plain_sprite(color: Color, draw_configuration: &DrawConfigurationResource) -> SpriteBundle {
    let cell_size = draw_configuration.cell_size;
    SpriteBundle {
        sprite: Sprite {
            color,
            custom_size: Some(Vec2::new(cell_size, cell_size)),
            ..default()
        },
        ..default()
    }
}

pub(crate) mod resources {
    use bevy::time::Timer;

    #[derive(Clone)]
    pub struct DrawConfigurationResource {
        pub half_cell: f32,
        pub cell_size: f32,
        // top left corner of the board in world coordinates
        pub origin: (f32, f32),
    }

    pub struct GameTimerResource(pub Timer);
}

pub mod events {
    use crate::snake::Collision;

    pub struct GameTick;

    pub struct GameOverEvent {
        pub collision: Collision,
    }
    pub struct FoodAteEvent;

    /// Sent by the "Try Again" button.
    pub struct RestartEvent;
}

pub(crate) mod components {
    use bevy::prelude::Component;

    #[derive(Component)]
    pub struct HeadSnakeComponent;

    #[derive(Component)]
    pub struct BodySnakeComponent;

    #[derive(Component)]
    pub struct FoodComponent;
}
