use crate::round::Bounds;
use crate::Coords;

use rand::{seq::IteratorRandom, Rng};

/// Random draws attempted before falling back to scanning the free cells.
const RANDOM_ATTEMPTS: usize = 64;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Food {
    Active(Coords),
    /// Caught (or never placed); a new cell must be picked.
    Pending,
}

impl Food {
    pub fn position(&self) -> Option<Coords> {
        match self {
            Food::Active(pos) => Some(*pos),
            Food::Pending => None,
        }
    }
}

pub struct FoodSpawner<R> {
    rng: R,
}

impl<R: Rng> FoodSpawner<R> {
    pub fn new(rng: R) -> Self {
        FoodSpawner { rng }
    }

    /// Picks a uniformly random cell inside `bounds` for which `occupied`
    /// is false. `None` when every cell is taken.
    pub fn place<F>(&mut self, bounds: Bounds, occupied: F) -> Option<Coords>
    where
        F: Fn(Coords) -> bool,
    {
        if !bounds.is_valid() {
            return None;
        }

        for _ in 0..RANDOM_ATTEMPTS {
            let pos = (self.rng.gen_range(0..bounds.width), self.rng.gen_range(0..bounds.height));
            if !occupied(pos) {
                return Some(pos);
            }
        }

        // Crowded board, pick among what is left
        bounds.cells().filter(|pos| !occupied(*pos)).choose(&mut self.rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn spawner(seed: u64) -> FoodSpawner<StdRng> {
        FoodSpawner::new(StdRng::seed_from_u64(seed))
    }

    #[test]
    fn stays_inside_bounds() {
        let mut spawner = spawner(7);
        let bounds = Bounds::new(4, 3);

        for _ in 0..500 {
            let pos = spawner.place(bounds, |_| false).unwrap();
            assert!(bounds.contains(pos));
        }
    }

    #[test]
    fn never_lands_on_occupied_cells() {
        let mut spawner = spawner(42);
        let bounds = Bounds::new(5, 5);
        let taken = |(x, y): Coords| x < 4 || y < 4;

        for _ in 0..100 {
            assert_eq!(spawner.place(bounds, taken), Some((4, 4)));
        }
    }

    #[test]
    fn full_board_yields_nothing() {
        let mut spawner = spawner(1);

        assert_eq!(spawner.place(Bounds::new(3, 3), |_| true), None);
    }

    #[test]
    fn invalid_bounds_yield_nothing() {
        let mut spawner = spawner(1);

        assert_eq!(spawner.place(Bounds::new(0, 10), |_| false), None);
        assert_eq!(spawner.place(Bounds::new(10, -2), |_| false), None);
    }
}
