use std::time::Duration;

use thiserror::Error;

use crate::snake::Position;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("Tile size must be greater than zero")]
    ZeroTileSize,
    #[error("Board {width}x{height} is not a positive multiple of tile size {tile_size}")]
    UnalignedBoard {
        width: i32,
        height: i32,
        tile_size: i32,
    },
    #[error("Tick delay must be greater than zero")]
    ZeroTickDelay,
    #[error("Snake needs at least one body part")]
    EmptySnake,
    #[error("Start position {0:?} is not on the board grid")]
    InvalidStart(Position),
    #[error("Initial snake of length {length} does not fit on the board from {start:?}")]
    SnakeDoesNotFit { start: Position, length: usize },
}

/// Everything that used to be a hard-coded constant of the game.
///
/// Dimensions are in pixels; `start` is the pixel position of the head
/// after a reset, the rest of the body trails leftwards from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameConfiguration {
    pub tile_size: i32,
    pub board_width: i32,
    pub board_height: i32,
    pub tick_delay: Duration,
    pub initial_length: usize,
    pub start: Position,
}

impl Default for GameConfiguration {
    fn default() -> Self {
        Self {
            tile_size: 10,
            board_width: 500,
            board_height: 500,
            tick_delay: Duration::from_millis(150),
            initial_length: 3,
            start: Position::new(50, 50),
        }
    }
}

impl GameConfiguration {
    pub fn columns(&self) -> i32 {
        self.board_width / self.tile_size
    }

    pub fn rows(&self) -> i32 {
        self.board_height / self.tile_size
    }

    /// Upper bound of the snake length: every cell of the board.
    pub fn all_tiles(&self) -> usize {
        self.columns() as usize * self.rows() as usize
    }

    pub fn contains(&self, position: &Position) -> bool {
        position.x >= 0
            && position.y >= 0
            && position.x < self.board_width
            && position.y < self.board_height
    }

    pub fn is_aligned(&self, position: &Position) -> bool {
        position.x % self.tile_size == 0 && position.y % self.tile_size == 0
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.validate_board()?;

        if self.initial_length == 0 {
            return Err(ConfigurationError::EmptySnake);
        }

        if !self.contains(&self.start) || !self.is_aligned(&self.start) {
            return Err(ConfigurationError::InvalidStart(self.start.clone()));
        }

        // the tail is laid out to the left of the head
        let tail_x = i32::try_from(self.initial_length - 1)
            .ok()
            .and_then(|length| length.checked_mul(self.tile_size))
            .and_then(|offset| self.start.x.checked_sub(offset));
        if !matches!(tail_x, Some(x) if x >= 0) {
            return Err(ConfigurationError::SnakeDoesNotFit {
                start: self.start.clone(),
                length: self.initial_length,
            });
        }

        Ok(())
    }

    /// Checks the tile, board and clock settings, leaving the snake aside.
    pub fn validate_board(&self) -> Result<(), ConfigurationError> {
        if self.tile_size <= 0 {
            return Err(ConfigurationError::ZeroTileSize);
        }

        if self.board_width <= 0
            || self.board_height <= 0
            || self.board_width % self.tile_size != 0
            || self.board_height % self.tile_size != 0
        {
            return Err(ConfigurationError::UnalignedBoard {
                width: self.board_width,
                height: self.board_height,
                tile_size: self.tile_size,
            });
        }

        if self.tick_delay.is_zero() {
            return Err(ConfigurationError::ZeroTickDelay);
        }

        Ok(())
    }
}
