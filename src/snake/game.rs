use std::{collections::VecDeque, num::ParseIntError, str::FromStr};

use super::common::{Direction, Position};
use crate::configuration::{ConfigurationError, GameConfiguration};
use thiserror::Error;
use tracing::{debug, info};

/// How many random cells are tried before scanning the board for a free one.
const FOOD_ATTEMPTS: usize = 32;

/// Segments closer to the head than this index cannot be bitten.
const COLLISION_EXEMPT_SEGMENTS: usize = 4;

/// Why a game ended. Recorded on the game, never returned as an error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Collision {
    #[error("Snake hit the wall at {0:?}")]
    Wall(Position),
    #[error("Snake is eating itself at {0:?}")]
    Body(Position),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tick {
    /// The game is over, nothing moved.
    Idle,
    Moved,
    Ate,
    GameOver(Collision),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum LayoutError {
    #[error("Layout is missing the {0} line")]
    MissingLine(&'static str),
    #[error("Expected a comma separated pair, got {0:?}")]
    InvalidPair(String),
    #[error("Invalid number in layout: {0}")]
    InvalidNumber(#[from] ParseIntError),
    #[error("Unknown direction {0:?}")]
    UnknownDirection(String),
    #[error("{0:?} is outside the board")]
    OutOfBoard(Position),
    #[error("Layout value {0} is too large")]
    TooLarge(i32),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

#[derive(Debug)]
pub struct SnakeGame {
    configuration: GameConfiguration,
    // restored on reset
    initial_snake: VecDeque<Position>,
    initial_direction: Direction,
    snake: VecDeque<Position>,
    // requested by the player, applied on the next tick
    direction: Direction,
    // the direction of the last move
    heading: Direction,
    food: Position,
    score: usize,
    running: bool,
    game_over_cause: Option<Collision>,
}

impl SnakeGame {
    pub fn new(configuration: GameConfiguration) -> Result<Self, ConfigurationError> {
        configuration.validate()?;

        let tile_size = configuration.tile_size;
        let start = &configuration.start;
        // validation guarantees the whole body fits on the board
        let initial_snake = (0..configuration.initial_length as i32)
            .map(|i| Position::new(start.x - i * tile_size, start.y))
            .collect();

        let mut game = Self {
            configuration,
            initial_snake,
            initial_direction: Direction::Right,
            snake: VecDeque::new(),
            direction: Direction::Right,
            heading: Direction::Right,
            food: Position::new(0, 0),
            score: 0,
            running: false,
            game_over_cause: None,
        };
        game.reset();

        Ok(game)
    }

    /// Puts the game back in its initial state: the starting snake (a short
    /// one heading right for a configured game), no score and a fresh food.
    pub fn reset(&mut self) {
        self.snake = self.initial_snake.clone();
        self.direction = self.initial_direction;
        self.heading = self.initial_direction;
        self.score = 0;
        self.running = true;
        self.game_over_cause = None;
        self.food = self.create_new_food();

        info!("new game started, food at {:?}", self.food);
    }

    /// Requests a new direction for the next tick.
    ///
    /// Reversing into the neck is ignored: the request is rejected if it is
    /// opposite to either the pending direction or the last move.
    pub fn set_direction(&mut self, direction: Direction) -> bool {
        if !self.direction.allows(&direction) || !self.heading.allows(&direction) {
            debug!("ignored direction {:?} while heading {:?}", direction, self.heading);
            return false;
        }

        self.direction = direction;
        true
    }

    /// Moves the snake one tile, then resolves collisions, then food.
    pub fn advance(&mut self) -> Tick {
        if !self.running {
            return Tick::Idle;
        }

        let new_head = self
            .head()
            .step(&self.direction, self.configuration.tile_size);
        self.heading = self.direction;

        debug!("head moves to {:?}", new_head);

        if !self.configuration.contains(&new_head) {
            return self.game_over(Collision::Wall(new_head));
        }

        self.snake.push_front(new_head.clone());
        let tail = self.snake.pop_back();

        if self.on_snake_body(&new_head) {
            return self.game_over(Collision::Body(new_head));
        }

        if new_head == self.food {
            // growing means keeping the tail this tick
            if let Some(tail) = tail {
                self.snake.push_back(tail);
            }
            self.score += 1;
            self.food = self.create_new_food();
            return Tick::Ate;
        }

        Tick::Moved
    }

    pub fn snapshot(&self) -> SnakeGameSnapshot {
        self.snapshot_with_food_ate(false)
    }

    /// Snapshot to publish after the given tick.
    pub fn snapshot_after(&self, tick: &Tick) -> SnakeGameSnapshot {
        self.snapshot_with_food_ate(matches!(tick, Tick::Ate))
    }

    pub fn configuration(&self) -> &GameConfiguration {
        &self.configuration
    }

    pub fn snake(&self) -> &VecDeque<Position> {
        &self.snake
    }

    pub fn head(&self) -> &Position {
        // never empty: initial_length is validated to be positive
        &self.snake[0]
    }

    pub fn body_parts(&self) -> usize {
        self.snake.len()
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn food(&self) -> &Position {
        &self.food
    }

    pub fn score(&self) -> usize {
        self.score
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn game_over_cause(&self) -> Option<&Collision> {
        self.game_over_cause.as_ref()
    }

    fn game_over(&mut self, cause: Collision) -> Tick {
        info!("game over: {}, score {}", cause, self.score);

        self.running = false;
        self.game_over_cause = Some(cause.clone());

        Tick::GameOver(cause)
    }

    fn snapshot_with_food_ate(&self, food_ate: bool) -> SnakeGameSnapshot {
        SnakeGameSnapshot {
            snake: self.snake.iter().cloned().collect(),
            food: self.food.clone(),
            score: self.score,
            running: self.running,
            food_ate,
        }
    }

    fn on_snake(&self, position: &Position) -> bool {
        self.snake.contains(position)
    }

    fn on_snake_body(&self, position: &Position) -> bool {
        self.snake
            .iter()
            .skip(COLLISION_EXEMPT_SEGMENTS)
            .any(|p| p == position)
    }

    fn random_cell(&self) -> Position {
        let tile_size = self.configuration.tile_size;
        let x = fastrand::i32(0..self.configuration.columns());
        let y = fastrand::i32(0..self.configuration.rows());
        Position::new(x * tile_size, y * tile_size)
    }

    fn create_new_food(&self) -> Position {
        if self.snake.len() >= self.configuration.all_tiles() {
            debug!("board is full, food goes anywhere");
            return self.random_cell();
        }

        for _ in 0..FOOD_ATTEMPTS {
            let position = self.random_cell();

            debug!("position generated {:?}", position);

            if !self.on_snake(&position) {
                return position;
            }
        }

        let tile_size = self.configuration.tile_size;
        let columns = self.configuration.columns();
        let free: Vec<Position> = (0..self.configuration.rows())
            .flat_map(|y| (0..columns).map(move |x| Position::new(x * tile_size, y * tile_size)))
            .filter(|position| !self.on_snake(position))
            .collect();

        match free.len() {
            0 => self.random_cell(),
            len => free[fastrand::usize(..len)].clone(),
        }
    }
}

/// Builds a game from a compact layout, all coordinates in tiles:
///
/// ```text
/// columns,rows,tile_size
/// food_x,food_y
/// head_x,head_y;x,y;...
/// Right
/// ```
///
/// The direction line is optional and defaults to `Right`.
impl FromStr for SnakeGame {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut lines = s.lines().map(str::trim).filter(|l| !l.is_empty());

        let dimension = lines.next().ok_or(LayoutError::MissingLine("dimension"))?;
        let (columns, rest) = split_pair(dimension)?;
        let (rows, tile_size) = split_pair(rest)?;
        let (columns, rows, tile_size): (i32, i32, i32) =
            (columns.parse()?, rows.parse()?, tile_size.parse()?);

        let food = lines.next().ok_or(LayoutError::MissingLine("food"))?;
        let food = parse_position(food, tile_size)?;

        let snake = lines.next().ok_or(LayoutError::MissingLine("snake"))?;
        let snake = snake
            .split(';')
            .map(|t| parse_position(t, tile_size))
            .collect::<Result<VecDeque<_>, _>>()?;

        let direction = match lines.next() {
            None => Direction::Right,
            Some(d) => parse_direction(d)?,
        };

        let head = snake.front().cloned().unwrap_or_else(|| Position::new(0, 0));
        let configuration = GameConfiguration {
            tile_size,
            board_width: scale(columns, tile_size)?,
            board_height: scale(rows, tile_size)?,
            initial_length: snake.len(),
            start: head,
            ..GameConfiguration::default()
        };
        // the body may bend any way, segments are checked one by one below
        configuration.validate_board()?;

        if let Some(outside) = snake
            .iter()
            .chain(std::iter::once(&food))
            .find(|p| !configuration.contains(p))
        {
            return Err(LayoutError::OutOfBoard(outside.clone()));
        }

        Ok(Self {
            configuration,
            initial_snake: snake.clone(),
            initial_direction: direction,
            snake,
            direction,
            heading: direction,
            food,
            score: 0,
            running: true,
            game_over_cause: None,
        })
    }
}

fn split_pair(s: &str) -> Result<(&str, &str), LayoutError> {
    s.split_once(',')
        .map(|(a, b)| (a.trim(), b.trim()))
        .ok_or_else(|| LayoutError::InvalidPair(s.to_string()))
}

fn parse_position(s: &str, tile_size: i32) -> Result<Position, LayoutError> {
    let (x, y) = split_pair(s)?;
    let (x, y): (i32, i32) = (x.parse()?, y.parse()?);
    Ok(Position::new(scale(x, tile_size)?, scale(y, tile_size)?))
}

fn scale(tiles: i32, tile_size: i32) -> Result<i32, LayoutError> {
    tiles
        .checked_mul(tile_size)
        .ok_or(LayoutError::TooLarge(tiles))
}

fn parse_direction(s: &str) -> Result<Direction, LayoutError> {
    match s {
        "Up" => Ok(Direction::Up),
        "Down" => Ok(Direction::Down),
        "Left" => Ok(Direction::Left),
        "Right" => Ok(Direction::Right),
        _ => Err(LayoutError::UnknownDirection(s.to_string())),
    }
}

/// What the renderer needs to draw a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnakeGameSnapshot {
    pub snake: Vec<Position>,
    pub food: Position,
    pub score: usize,
    pub running: bool,
    pub food_ate: bool,
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use crate::{
        configuration::GameConfiguration,
        snake::{
            common::{Direction, Position},
            game::{Collision, LayoutError, Tick},
        },
    };

    use super::SnakeGame;

    #[test]
    fn test_snake_should_move_changing_direction() {
        let mut game = create_game();

        assert_eq!(game.advance(), Tick::Moved);
        assert_eq!(game.head(), &Position::new(50, 20));
        assert_eq!(game.body_parts(), 3);

        assert!(game.set_direction(Direction::Up));
        assert_eq!(game.advance(), Tick::Moved);
        assert_eq!(game.head(), &Position::new(50, 10));
        assert_eq!(game.snake()[1], Position::new(50, 20));
        assert_eq!(game.body_parts(), 3);

        assert!(game.set_direction(Direction::Left));
        game.advance();
        assert_eq!(game.head(), &Position::new(40, 10));

        assert!(game.set_direction(Direction::Down));
        game.advance();
        assert_eq!(game.head(), &Position::new(40, 20));
        assert_eq!(
            game.snake(),
            &VecDeque::from(vec![
                Position::new(40, 20),
                Position::new(40, 10),
                Position::new(50, 10)
            ])
        );
        assert!(game.is_running());
    }

    #[test]
    fn test_snake_eats_increasing_length() {
        let mut game = create_game();

        assert_eq!(game.advance(), Tick::Moved);
        assert_eq!(game.advance(), Tick::Moved);
        assert_eq!(game.score(), 0);

        let tick = game.advance();
        assert_eq!(tick, Tick::Ate);
        assert_eq!(game.score(), 1);
        assert_eq!(
            game.snake(),
            &VecDeque::from(vec![
                Position::new(70, 20),
                Position::new(60, 20),
                Position::new(50, 20),
                Position::new(40, 20)
            ])
        );
        assert!(!game.snake().contains(game.food()));
        assert!(game.snapshot_after(&tick).food_ate);

        // the next move keeps the new length, unless the new food is right ahead
        let food_ahead = game.food() == &Position::new(80, 20);
        let tick = game.advance();
        assert_eq!(game.head(), &Position::new(80, 20));
        assert_eq!(game.body_parts(), 4 + food_ahead as usize);
        assert_eq!(game.snapshot_after(&tick).food_ate, food_ahead);
    }

    #[test]
    fn test_opposite_directions_are_rejected() {
        let mut game = create_game();

        // Right -> Left
        assert!(!game.set_direction(Direction::Left));
        assert_eq!(game.direction(), Direction::Right);

        // a quick Up then Left inside one tick cannot turn back
        assert!(game.set_direction(Direction::Up));
        assert!(!game.set_direction(Direction::Down));
        assert!(!game.set_direction(Direction::Left));
        assert_eq!(game.direction(), Direction::Up);
        game.advance();

        // Up -> Down
        assert!(!game.set_direction(Direction::Down));
        assert_eq!(game.direction(), Direction::Up);

        // Left -> Right
        assert!(game.set_direction(Direction::Left));
        game.advance();
        assert!(!game.set_direction(Direction::Right));
        assert_eq!(game.direction(), Direction::Left);

        // Down -> Up
        assert!(game.set_direction(Direction::Down));
        game.advance();
        assert!(!game.set_direction(Direction::Up));
        assert_eq!(game.direction(), Direction::Down);
    }

    #[test]
    fn test_snake_should_move_till_wall() {
        let mut game: SnakeGame = r#"
10,10,10
0,0
9,5;8,5;7,5"#
            .parse()
            .unwrap();

        assert_eq!(game.head(), &Position::new(90, 50));

        let tick = game.advance();
        assert_eq!(tick, Tick::GameOver(Collision::Wall(Position::new(100, 50))));
        assert!(!game.is_running());
        assert_eq!(
            game.game_over_cause(),
            Some(&Collision::Wall(Position::new(100, 50)))
        );
        // the snake stays where it was before hitting the wall
        assert_eq!(game.head(), &Position::new(90, 50));
    }

    #[test]
    fn test_snake_hits_top_wall() {
        let mut game: SnakeGame = r#"
10,10,10
0,9
4,0;4,1;4,2
Up"#
        .parse()
        .unwrap();

        assert_eq!(
            game.advance(),
            Tick::GameOver(Collision::Wall(Position::new(40, -10)))
        );
    }

    #[test]
    fn test_game_over_freezes_the_game() {
        let mut game: SnakeGame = r#"
10,10,10
0,0
9,5;8,5;7,5"#
            .parse()
            .unwrap();
        game.advance();
        let frozen = game.snapshot();
        assert!(!frozen.running);

        for _ in 0..5 {
            assert!(game.set_direction(Direction::Up));
            assert_eq!(game.advance(), Tick::Idle);
        }
        assert_eq!(game.snapshot(), frozen);
    }

    #[test]
    fn test_snake_bites_its_body() {
        let mut game: SnakeGame = r#"
10,10,10
0,0
8,5;8,6;7,6;7,5;7,4;8,4;9,4
Up"#
        .parse()
        .unwrap();

        assert_eq!(
            game.advance(),
            Tick::GameOver(Collision::Body(Position::new(80, 40)))
        );
        assert!(!game.is_running());
    }

    #[test]
    fn test_snake_can_follow_its_tail() {
        // the head enters the cell the tail leaves in the same tick
        let mut game: SnakeGame = r#"
10,10,10
0,0
8,5;8,6;7,6;7,5;7,4;8,4
Up"#
        .parse()
        .unwrap();

        assert_eq!(game.advance(), Tick::Moved);
        assert!(game.is_running());
        assert_eq!(game.head(), &Position::new(80, 40));
    }

    #[test]
    fn test_fresh_snake_never_collides_with_itself() {
        let mut game = create_game();

        for direction in [Direction::Up, Direction::Left, Direction::Down, Direction::Right] {
            assert!(game.set_direction(direction));
            assert_eq!(game.advance(), Tick::Moved);
            assert!(game.is_running());
        }
    }

    #[test]
    fn test_reset_after_game_over() {
        let mut game = SnakeGame::new(small_configuration()).unwrap();

        game.set_direction(Direction::Up);
        while game.is_running() {
            game.advance();
        }
        assert!(game.game_over_cause().is_some());

        game.reset();

        assert_eq!(game.body_parts(), 3);
        assert_eq!(game.score(), 0);
        assert_eq!(game.direction(), Direction::Right);
        assert!(game.is_running());
        assert_eq!(game.game_over_cause(), None);
        assert_eq!(
            game.snake(),
            &VecDeque::from(vec![
                Position::new(50, 50),
                Position::new(40, 50),
                Position::new(30, 50)
            ])
        );
        assert!(game.configuration().contains(game.food()));
        assert!(!game.snake().contains(game.food()));
    }

    #[test]
    fn test_food_is_placed_on_a_free_cell() {
        // four cells, three of them taken by the snake
        let configuration = GameConfiguration {
            board_width: 40,
            board_height: 10,
            start: Position::new(20, 0),
            ..GameConfiguration::default()
        };

        for seed in 0..20 {
            fastrand::seed(seed);
            let game = SnakeGame::new(configuration.clone()).unwrap();
            assert_eq!(game.food(), &Position::new(30, 0));
        }

        let mut game = SnakeGame::new(configuration).unwrap();
        assert_eq!(game.advance(), Tick::Ate);
        assert_eq!(game.body_parts(), 4);
        // board is full: food is still somewhere on it
        assert!(game.configuration().contains(game.food()));
        assert_eq!(
            game.advance(),
            Tick::GameOver(Collision::Wall(Position::new(40, 0)))
        );
    }

    #[test]
    fn test_length_only_changes_when_eating() {
        let mut game = SnakeGame::new(small_configuration()).unwrap();
        let directions = [Direction::Down, Direction::Left, Direction::Up, Direction::Right];

        let mut length = game.body_parts();
        let mut score = game.score();
        for step in 0..40 {
            if step % 3 == 0 {
                game.set_direction(directions[(step / 3) % directions.len()]);
            }
            match game.advance() {
                Tick::Moved => assert_eq!(game.body_parts(), length),
                Tick::Ate => {
                    assert_eq!(game.body_parts(), length + 1);
                    assert_eq!(game.score(), score + 1);
                }
                Tick::GameOver(_) | Tick::Idle => break,
            }
            length = game.body_parts();
            score = game.score();
        }
    }

    #[test]
    fn test_invalid_configuration_is_refused() {
        let configuration = GameConfiguration {
            initial_length: 0,
            ..GameConfiguration::default()
        };

        assert!(SnakeGame::new(configuration).is_err());
    }

    #[test]
    fn test_vertical_layout_is_accepted() {
        let mut game: SnakeGame = "10,10,10\n0,0\n1,5;1,6;1,7;1,8\nUp".parse().unwrap();

        assert_eq!(game.body_parts(), 4);
        assert_eq!(game.direction(), Direction::Up);
        assert_eq!(game.advance(), Tick::Moved);
        assert_eq!(game.head(), &Position::new(10, 40));

        // a reset brings the layout back
        game.reset();
        assert_eq!(
            game.snake(),
            &VecDeque::from(vec![
                Position::new(10, 50),
                Position::new(10, 60),
                Position::new(10, 70),
                Position::new(10, 80)
            ])
        );
        assert_eq!(game.direction(), Direction::Up);
    }

    #[test]
    fn test_oversized_layouts_are_refused() {
        let huge_board = "100000,10,100000\n0,0\n0,0".parse::<SnakeGame>();
        assert_eq!(huge_board.err(), Some(LayoutError::TooLarge(100000)));

        let huge_position = "10,10,10\n300000000,0\n4,2;3,2".parse::<SnakeGame>();
        assert_eq!(
            huge_position.err(),
            Some(LayoutError::TooLarge(300000000))
        );
    }

    #[test]
    fn test_invalid_layouts() {
        let missing_food = "10,10,10".parse::<SnakeGame>();
        assert_eq!(missing_food.err(), Some(LayoutError::MissingLine("food")));

        let bad_pair = "10,10,10\n5\n4,2".parse::<SnakeGame>();
        assert_eq!(bad_pair.err(), Some(LayoutError::InvalidPair("5".to_string())));

        let bad_direction = "10,10,10\n1,1\n4,2;3,2\nBackwards".parse::<SnakeGame>();
        assert_eq!(
            bad_direction.err(),
            Some(LayoutError::UnknownDirection("Backwards".to_string()))
        );

        let outside = "10,10,10\n12,1\n4,2;3,2".parse::<SnakeGame>();
        assert_eq!(
            outside.err(),
            Some(LayoutError::OutOfBoard(Position::new(120, 10)))
        );

        assert!(matches!(
            "10,x,10\n1,1\n4,2".parse::<SnakeGame>(),
            Err(LayoutError::InvalidNumber(_))
        ));
    }

    fn small_configuration() -> GameConfiguration {
        GameConfiguration {
            board_width: 100,
            board_height: 100,
            ..GameConfiguration::default()
        }
    }

    fn create_game() -> SnakeGame {
        let s = r#"
10,10,10
7,2
4,2;3,2;2,2"#;
        s.parse().unwrap()
    }
}
