use crate::error::EngineError;
use crate::round::Bounds;
use crate::Coords;
use Direction::*;

/// Hard ceiling on the number of body segments a snake can hold.
pub const SNAKE_MAX_LENGTH: usize = 100;

/// Position held by every slot past the live length. Always off the grid.
pub const PARKED: Coords = (-10, -10);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn delta(self) -> Coords {
        match self {
            Up => (0, -1),
            Down => (0, 1),
            Left => (-1, 0),
            Right => (1, 0),
        }
    }

    pub fn reverse(self) -> Direction {
        match self {
            Up => Down,
            Down => Up,
            Left => Right,
            Right => Left,
        }
    }
}

/// A snake whose body lives in a fixed array. Index 0 is the head; slots at
/// `len..` are parked and never take part in collisions or rendering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snake {
    body: [Coords; SNAKE_MAX_LENGTH],
    len: usize,
    direction: Option<Direction>,
    score: u32,
}

impl Snake {
    pub fn new(at: Coords) -> Self {
        let mut snake =
            Snake { body: [PARKED; SNAKE_MAX_LENGTH], len: 1, direction: None, score: 0 };
        snake.spawn(at);
        snake
    }

    pub fn spawn(&mut self, at: Coords) {
        self.body = [PARKED; SNAKE_MAX_LENGTH];
        self.body[0] = at;
        self.len = 1;
        self.direction = None;
        self.score = 0;
    }

    /// Live segments, head first.
    pub fn body(&self) -> &[Coords] {
        &self.body[..self.len]
    }

    pub fn head(&self) -> Coords {
        self.body[0]
    }

    pub fn direction(&self) -> Option<Direction> {
        self.direction
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn add_point(&mut self) {
        self.score += 1;
    }

    /// Where the head lands on the next `advance`. Equal to the head while the
    /// snake has not moved yet.
    pub fn next_head(&self) -> Coords {
        let (dx, dy) = self.direction.map_or((0, 0), Direction::delta);
        let (x, y) = self.head();
        (x + dx, y + dy)
    }

    /// Returns whether the request was accepted. Reversing onto the neck is
    /// refused; anything goes before the first move.
    pub fn turn(&mut self, requested: Direction) -> bool {
        match self.direction {
            Some(current) if current.reverse() == requested => false,
            _ => {
                self.direction = Some(requested);
                true
            }
        }
    }

    pub fn advance(&mut self, grow: bool) -> Result<(), EngineError> {
        if self.direction.is_none() {
            return Ok(());
        }

        let mut i = self.len - 1;
        if grow {
            if self.len == SNAKE_MAX_LENGTH {
                return Err(EngineError::CapacityExceeded { capacity: SNAKE_MAX_LENGTH });
            }
            i = self.len;
            self.len += 1;
        }

        while i > 0 {
            self.body[i] = self.body[i - 1];
            i -= 1;
        }

        self.body[0] = self.next_head();
        Ok(())
    }

    pub fn detect_collision(&self, bounds: Bounds) -> bool {
        let head = self.head();
        !bounds.contains(head) || self.body[1..self.len].contains(&head)
    }

    pub fn occupies(&self, pos: Coords) -> bool {
        self.body().contains(&pos)
    }
}
