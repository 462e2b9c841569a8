use bevy::prelude::*;

use tile_snake::{snake::SnakeGame, ConfigurationError, GameConfiguration, MainPlugin};

fn main() -> Result<(), ConfigurationError> {
    let configuration = GameConfiguration::default();
    let window = WindowDescriptor {
        title: "Snake".to_string(),
        width: configuration.board_width as f32,
        height: configuration.board_height as f32,
        resizable: false,
        ..default()
    };
    let snake_game = SnakeGame::new(configuration)?;

    App::new()
        .insert_resource(window)
        .insert_resource(snake_game)
        .add_plugins(DefaultPlugins)
        .add_plugin(MainPlugin)
        .run();

    Ok(())
}
