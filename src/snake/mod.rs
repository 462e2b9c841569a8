mod common;
mod game;

pub use common::{Direction, Position};
pub use game::{Collision, LayoutError, SnakeGame, SnakeGameSnapshot, Tick};
