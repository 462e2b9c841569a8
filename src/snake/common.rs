#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The neighbour cell `tile_size` pixels away in the given direction.
    pub fn step(&self, direction: &Direction, tile_size: i32) -> Self {
        let (dx, dy) = direction.offset();
        Self {
            x: self.x + dx * tile_size,
            y: self.y + dy * tile_size,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Left,
    Right,
    Down,
}

impl Direction {
    pub fn allows(&self, direction: &Self) -> bool {
        !matches!(
            (self, direction),
            (Direction::Up, Direction::Down)
                | (Direction::Left, Direction::Right)
                | (Direction::Right, Direction::Left)
                | (Direction::Down, Direction::Up)
        )
    }

    // y grows downward, as on the canvas
    fn offset(&self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}
