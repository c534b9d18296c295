use std::time::Duration;

use crate::error::EngineError;
use crate::food::{Food, FoodSpawner};
use crate::difficulty::DifficultyRamp;
use crate::snake::{Direction, Snake, SNAKE_MAX_LENGTH};
use crate::Coords;

use rand::{rngs::ThreadRng, Rng};
use tracing::{debug, info, warn};

/// Playable area reported by the terminal. Cells run over `[0, width) x [0, height)`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Bounds {
    pub width: i32,
    pub height: i32,
}

impl Bounds {
    pub fn new(width: i32, height: i32) -> Self {
        Bounds { width, height }
    }

    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    pub fn contains(&self, (x, y): Coords) -> bool {
        (0..self.width).contains(&x) && (0..self.height).contains(&y)
    }

    pub fn cells(self) -> impl Iterator<Item = Coords> {
        (0..self.height).flat_map(move |y| (0..self.width).map(move |x| (x, y)))
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Player {
    One,
    Two,
}

impl Player {
    fn from_index(i: usize) -> Player {
        if i == 0 { Player::One } else { Player::Two }
    }

    pub fn index(self) -> usize {
        match self {
            Player::One => 0,
            Player::Two => 1,
        }
    }

    pub fn number(self) -> usize {
        self.index() + 1
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Mode {
    Single,
    Dual,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RoundState {
    Running,
    PlayerWon(Player),
    /// Single player crash, or a draw: both players crashing or both
    /// reaching the win score on the same tick.
    GameOver,
}

impl RoundState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RoundState::Running)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RoundConfig {
    pub mode: Mode,
    pub win_score: u32,
    pub start_interval: Duration,
    pub min_interval: Duration,
    /// Whether a head entering the other snake counts as a crash.
    pub solid_opponents: bool,
}

impl Default for RoundConfig {
    fn default() -> Self {
        RoundConfig {
            mode: Mode::Single,
            win_score: 20,
            start_interval: Duration::from_millis(150),
            min_interval: Duration::from_millis(50),
            solid_opponents: false,
        }
    }
}

impl RoundConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.win_score == 0 {
            return Err(EngineError::InvalidConfig("win score must be at least 1".into()));
        }
        // A winner ends up with 1 + win_score segments
        if self.win_score as usize >= SNAKE_MAX_LENGTH {
            return Err(EngineError::InvalidConfig(format!(
                "win score must be below the snake capacity of {}",
                SNAKE_MAX_LENGTH
            )));
        }
        if self.min_interval.is_zero() {
            return Err(EngineError::InvalidConfig("minimum interval must be positive".into()));
        }
        if self.min_interval > self.start_interval {
            return Err(EngineError::InvalidConfig(
                "minimum interval must not exceed the start interval".into(),
            ));
        }
        Ok(())
    }
}

/// Requested direction per player for one tick; `None` keeps the current heading.
pub type Intents = [Option<Direction>; 2];

pub struct SnakeView<'a> {
    pub player: Player,
    pub body: &'a [Coords],
    pub score: u32,
    pub direction: Option<Direction>,
}

/// Everything the renderer needs to draw one frame.
pub struct Snapshot<'a> {
    pub bounds: Bounds,
    pub snakes: Vec<SnakeView<'a>>,
    pub food: Option<Coords>,
    pub interval: Duration,
    pub win_score: u32,
    pub state: RoundState,
    pub tick: u64,
}

pub struct Round<R = ThreadRng> {
    config: RoundConfig,
    snakes: Vec<Snake>,
    food: Food,
    spawner: FoodSpawner<R>,
    ramp: DifficultyRamp,
    interval: Duration,
    bounds: Bounds,
    state: RoundState,
    tick: u64,
}

impl Round<ThreadRng> {
    pub fn new(config: RoundConfig, bounds: Bounds) -> Result<Self, EngineError> {
        Round::with_rng(config, bounds, rand::thread_rng())
    }
}

impl<R: Rng> Round<R> {
    pub fn with_rng(config: RoundConfig, bounds: Bounds, rng: R) -> Result<Self, EngineError> {
        config.validate()?;
        if !bounds.is_valid() {
            return Err(EngineError::InvalidBounds { width: bounds.width, height: bounds.height });
        }

        let mid_y = bounds.height / 2;
        let snakes = match config.mode {
            Mode::Single => vec![Snake::new((bounds.width / 2, mid_y))],
            Mode::Dual => vec![
                Snake::new((bounds.width / 3, mid_y)),
                Snake::new((bounds.width * 2 / 3, mid_y)),
            ],
        };

        let ramp =
            DifficultyRamp::new(config.start_interval, config.min_interval, config.win_score);
        let mut round = Round {
            config,
            snakes,
            food: Food::Pending,
            spawner: FoodSpawner::new(rng),
            ramp,
            interval: ramp.start(),
            bounds,
            state: RoundState::Running,
            tick: 0,
        };
        round.respawn_food();

        info!(mode = ?config.mode, win_score = config.win_score, ?bounds, "round started");
        Ok(round)
    }

    pub fn state(&self) -> RoundState {
        self.state
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn food(&self) -> Food {
        self.food
    }

    pub fn snake(&self, player: Player) -> Option<&Snake> {
        self.snakes.get(player.index())
    }

    /// Runs one simulation step. Terminal rounds are left untouched, and
    /// invalid bounds skip the tick with an error the caller may ignore.
    pub fn tick(&mut self, bounds: Bounds, intents: Intents) -> Result<RoundState, EngineError> {
        if self.state.is_terminal() {
            return Ok(self.state);
        }
        if !bounds.is_valid() {
            return Err(EngineError::InvalidBounds { width: bounds.width, height: bounds.height });
        }
        self.bounds = bounds;
        self.tick += 1;

        for (i, (snake, intent)) in self.snakes.iter_mut().zip(intents).enumerate() {
            if let Some(dir) = intent {
                if !snake.turn(dir) {
                    debug!(player = i + 1, ?dir, "reverse turn rejected");
                }
            }
        }

        let food = self.food.position();
        let mut respawn = food.map_or(true, |pos| !bounds.contains(pos));
        let mut grow = [false; 2];

        for (i, snake) in self.snakes.iter_mut().enumerate() {
            if snake.direction().is_some() && Some(snake.next_head()) == food {
                grow[i] = true;
                respawn = true;
                snake.add_point();
                self.interval = self.ramp.step(self.interval);
                info!(
                    player = i + 1,
                    score = snake.score(),
                    interval = ?self.interval,
                    "food captured"
                );
            }
        }

        for (snake, grow) in self.snakes.iter_mut().zip(grow) {
            snake.advance(grow)?;
        }

        let crashed: Vec<bool> = (0..self.snakes.len()).map(|i| self.crashed(i)).collect();

        if respawn {
            self.respawn_food();
        }

        let win_score = self.config.win_score;
        let won: Vec<bool> = self.snakes.iter().map(|s| s.score() >= win_score).collect();
        self.state = match (won.as_slice(), crashed.as_slice()) {
            ([true, true], _) => {
                warn!(tick = self.tick, "both snakes reached the win score, round is a draw");
                RoundState::GameOver
            }
            ([true, ..], _) => RoundState::PlayerWon(Player::One),
            ([_, true], _) => RoundState::PlayerWon(Player::Two),
            (_, [true]) => RoundState::GameOver,
            (_, [true, true]) => {
                warn!(tick = self.tick, "both snakes crashed on the same tick, round is a draw");
                RoundState::GameOver
            }
            (_, [true, false]) => RoundState::PlayerWon(Player::Two),
            (_, [false, true]) => RoundState::PlayerWon(Player::One),
            _ => RoundState::Running,
        };

        if self.state.is_terminal() {
            info!(state = ?self.state, tick = self.tick, "round finished");
        }
        Ok(self.state)
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        let snakes = self
            .snakes
            .iter()
            .enumerate()
            .map(|(i, snake)| SnakeView {
                player: Player::from_index(i),
                body: snake.body(),
                score: snake.score(),
                direction: snake.direction(),
            })
            .collect();

        Snapshot {
            bounds: self.bounds,
            snakes,
            food: self.food.position(),
            interval: self.interval,
            win_score: self.config.win_score,
            state: self.state,
            tick: self.tick,
        }
    }

    ///////////////////////////////////////////////////////////////////////////

    fn crashed(&self, i: usize) -> bool {
        let snake = &self.snakes[i];
        if snake.detect_collision(self.bounds) {
            return true;
        }

        self.config.solid_opponents
            && self
                .snakes
                .iter()
                .enumerate()
                .any(|(j, other)| j != i && other.occupies(snake.head()))
    }

    fn respawn_food(&mut self) {
        let snakes = &self.snakes;
        let occupied = |pos| snakes.iter().any(|s| s.occupies(pos));

        self.food = match self.spawner.place(self.bounds, occupied) {
            Some(pos) => {
                debug!(?pos, "food placed");
                Food::Active(pos)
            }
            None => {
                warn!(bounds = ?self.bounds, "no free cell for food");
                Food::Pending
            }
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snake::Direction::*;
    use rand::{rngs::StdRng, SeedableRng};

    const NO_INPUT: Intents = [None, None];

    fn round(config: RoundConfig, bounds: Bounds) -> Round<StdRng> {
        let mut round = Round::with_rng(config, bounds, StdRng::seed_from_u64(3)).unwrap();
        // Out of the way of every scripted path below
        round.food = Food::Active((0, bounds.height - 1));
        round
    }

    fn single(win_score: u32, bounds: Bounds) -> Round<StdRng> {
        round(RoundConfig { win_score, ..RoundConfig::default() }, bounds)
    }

    fn dual(win_score: u32, solid_opponents: bool, bounds: Bounds) -> Round<StdRng> {
        let config =
            RoundConfig { mode: Mode::Dual, win_score, solid_opponents, ..RoundConfig::default() };
        round(config, bounds)
    }

    fn head(round: &Round<StdRng>, player: Player) -> Coords {
        round.snake(player).unwrap().head()
    }

    #[test]
    fn spawns_players_across_the_grid() {
        let single = single(10, Bounds::new(10, 10));
        assert_eq!(head(&single, Player::One), (5, 5));
        assert!(single.snake(Player::Two).is_none());

        let dual = dual(10, false, Bounds::new(12, 10));
        assert_eq!(head(&dual, Player::One), (4, 5));
        assert_eq!(head(&dual, Player::Two), (8, 5));
    }

    #[test]
    fn initial_food_avoids_the_snake() {
        for seed in 0..50 {
            let config = RoundConfig::default();
            let rng = StdRng::seed_from_u64(seed);
            let round = Round::with_rng(config, Bounds::new(2, 1), rng).unwrap();
            assert_eq!(round.food(), Food::Active((0, 0)));
        }
    }

    #[test]
    fn three_plain_ticks() {
        let bounds = Bounds::new(10, 10);
        let mut round = single(10, bounds);

        round.tick(bounds, [Some(Right), None]).unwrap();
        round.tick(bounds, NO_INPUT).unwrap();
        let state = round.tick(bounds, NO_INPUT).unwrap();

        assert_eq!(state, RoundState::Running);
        assert_eq!(head(&round, Player::One), (8, 5));
        assert_eq!(round.snake(Player::One).unwrap().body().len(), 1);
    }

    #[test]
    fn snake_waits_for_first_input() {
        let bounds = Bounds::new(10, 10);
        let mut round = single(10, bounds);

        for _ in 0..5 {
            assert_eq!(round.tick(bounds, NO_INPUT).unwrap(), RoundState::Running);
        }
        assert_eq!(head(&round, Player::One), (5, 5));
    }

    #[test]
    fn capture_grows_scores_and_respawns() {
        let bounds = Bounds::new(10, 10);
        let mut round = single(10, bounds);
        round.food = Food::Active((6, 5));

        round.tick(bounds, [Some(Right), None]).unwrap();

        let snake = round.snake(Player::One).unwrap();
        assert_eq!(snake.score(), 1);
        assert_eq!(snake.body(), &[(6, 5), (5, 5)]);

        let food = round.food().position().unwrap();
        assert!(bounds.contains(food));
        assert!(!snake.occupies(food));
    }

    #[test]
    fn capture_speeds_up_the_shared_interval() {
        let bounds = Bounds::new(10, 10);
        let mut round = dual(10, false, bounds);
        let start = round.interval();
        round.food = Food::Active((4, 5));

        round.tick(bounds, [Some(Right), None]).unwrap();

        assert_eq!(round.snake(Player::One).unwrap().score(), 1);
        assert_eq!(round.interval(), round.ramp.step(start));
        assert!(round.interval() < start);
    }

    #[test]
    fn both_players_can_share_a_capture() {
        let bounds = Bounds::new(12, 10);
        let mut round = dual(10, false, bounds);

        round.tick(bounds, [Some(Right), Some(Left)]).unwrap();
        assert_eq!(head(&round, Player::One), (5, 5));
        assert_eq!(head(&round, Player::Two), (7, 5));

        round.food = Food::Active((6, 5));
        round.tick(bounds, NO_INPUT).unwrap();

        assert_eq!(round.snake(Player::One).unwrap().score(), 1);
        assert_eq!(round.snake(Player::Two).unwrap().score(), 1);
        let food = round.food().position().unwrap();
        assert!(!round.snakes.iter().any(|s| s.occupies(food)));
    }

    #[test]
    fn reaching_win_score_ends_the_round() {
        let bounds = Bounds::new(30, 10);
        let mut round = single(10, bounds);
        round.tick(bounds, [Some(Right), None]).unwrap();

        for i in 1..=10 {
            let next = round.snake(Player::One).unwrap().next_head();
            round.food = Food::Active(next);
            let state = round.tick(bounds, NO_INPUT).unwrap();
            if i < 10 {
                assert_eq!(state, RoundState::Running);
            } else {
                assert_eq!(state, RoundState::PlayerWon(Player::One));
            }
        }

        let head_at_win = head(&round, Player::One);
        assert_eq!(round.tick(bounds, NO_INPUT).unwrap(), RoundState::PlayerWon(Player::One));
        assert_eq!(head(&round, Player::One), head_at_win);
    }

    #[test]
    fn single_player_wall_hit_is_game_over() {
        let bounds = Bounds::new(10, 10);
        let mut round = single(10, bounds);

        round.tick(bounds, [Some(Left), None]).unwrap();
        for _ in 0..4 {
            assert_eq!(round.tick(bounds, NO_INPUT).unwrap(), RoundState::Running);
        }
        assert_eq!(head(&round, Player::One), (0, 5));

        assert_eq!(round.tick(bounds, NO_INPUT).unwrap(), RoundState::GameOver);
        assert_eq!(head(&round, Player::One), (-1, 5));
    }

    #[test]
    fn crash_hands_the_win_to_the_other_player() {
        let bounds = Bounds::new(12, 10);
        let mut round = dual(10, false, bounds);

        // Player two runs off the right edge first
        round.tick(bounds, [Some(Up), Some(Right)]).unwrap();
        round.tick(bounds, NO_INPUT).unwrap();
        round.tick(bounds, NO_INPUT).unwrap();
        assert_eq!(round.tick(bounds, NO_INPUT).unwrap(), RoundState::PlayerWon(Player::One));
        assert_eq!(head(&round, Player::Two), (12, 5));
    }

    #[test]
    fn simultaneous_crash_is_a_draw() {
        let bounds = Bounds::new(12, 10);
        let mut round = dual(10, false, bounds);

        let narrowed = Bounds::new(3, 10);
        assert_eq!(round.tick(narrowed, [Some(Right), Some(Right)]).unwrap(), RoundState::GameOver);
    }

    #[test]
    fn shared_winning_capture_is_a_draw() {
        let bounds = Bounds::new(12, 10);
        let mut round = dual(1, false, bounds);
        let start = round.interval();

        round.tick(bounds, [Some(Right), Some(Left)]).unwrap();
        assert_eq!(head(&round, Player::One), (5, 5));
        assert_eq!(head(&round, Player::Two), (7, 5));

        round.food = Food::Active((6, 5));
        let state = round.tick(bounds, NO_INPUT).unwrap();

        assert_eq!(state, RoundState::GameOver);
        assert_eq!(round.snake(Player::One).unwrap().score(), 1);
        assert_eq!(round.snake(Player::Two).unwrap().score(), 1);
        assert_eq!(round.interval(), round.ramp.step(round.ramp.step(start)));
    }

    #[test]
    fn win_beats_a_same_tick_crash() {
        let bounds = Bounds::new(12, 10);
        let mut round = dual(1, false, bounds);
        round.food = Food::Active((5, 5));

        let state = round.tick(Bounds::new(9, 10), [Some(Right), Some(Right)]).unwrap();

        assert_eq!(head(&round, Player::Two), (9, 5));
        assert_eq!(state, RoundState::PlayerWon(Player::One));
    }

    #[test]
    fn opponents_pass_through_each_other_by_default() {
        let bounds = Bounds::new(12, 10);
        let mut round = dual(10, false, bounds);

        round.tick(bounds, [Some(Right), None]).unwrap();
        for _ in 0..3 {
            assert_eq!(round.tick(bounds, NO_INPUT).unwrap(), RoundState::Running);
        }
        assert_eq!(head(&round, Player::One), head(&round, Player::Two));
    }

    #[test]
    fn solid_opponent_body_is_a_wall() {
        let bounds = Bounds::new(12, 10);
        let mut round = dual(10, true, bounds);

        // Player two heads up and keeps eating, so its tail stays on (8,5)
        round.food = Food::Active((8, 4));
        round.tick(bounds, [Some(Right), Some(Up)]).unwrap();
        for _ in 0..2 {
            let next = round.snake(Player::Two).unwrap().next_head();
            round.food = Food::Active(next);
            assert_eq!(round.tick(bounds, NO_INPUT).unwrap(), RoundState::Running);
        }

        let next = round.snake(Player::Two).unwrap().next_head();
        round.food = Food::Active(next);
        assert_eq!(round.tick(bounds, NO_INPUT).unwrap(), RoundState::PlayerWon(Player::Two));
        assert_eq!(head(&round, Player::One), (8, 5));
        assert!(round.snake(Player::Two).unwrap().occupies((8, 5)));
    }

    #[test]
    fn solid_head_on_is_a_draw() {
        let bounds = Bounds::new(12, 10);
        let mut round = dual(10, true, bounds);

        assert_eq!(round.tick(bounds, [Some(Right), Some(Left)]).unwrap(), RoundState::Running);
        assert_eq!(round.tick(bounds, NO_INPUT).unwrap(), RoundState::GameOver);
        assert_eq!(head(&round, Player::One), head(&round, Player::Two));
    }

    #[test]
    fn invalid_bounds_skip_the_tick() {
        let bounds = Bounds::new(10, 10);
        let mut round = single(10, bounds);
        round.tick(bounds, [Some(Right), None]).unwrap();

        let err = round.tick(Bounds::new(0, 10), NO_INPUT).unwrap_err();
        assert_eq!(err, EngineError::InvalidBounds { width: 0, height: 10 });
        assert!(err.is_recoverable());
        assert_eq!(head(&round, Player::One), (6, 5));
        assert_eq!(round.state(), RoundState::Running);

        round.tick(bounds, NO_INPUT).unwrap();
        assert_eq!(head(&round, Player::One), (7, 5));
    }

    #[test]
    fn food_outside_shrunk_bounds_is_replaced() {
        let bounds = Bounds::new(10, 10);
        let mut round = single(10, bounds);
        round.food = Food::Active((9, 9));

        let smaller = Bounds::new(7, 7);
        round.tick(smaller, NO_INPUT).unwrap();

        assert!(smaller.contains(round.food().position().unwrap()));
    }

    #[test]
    fn shrinking_onto_the_head_is_a_crash() {
        let mut round = single(10, Bounds::new(10, 10));
        round.tick(Bounds::new(10, 10), [Some(Down), None]).unwrap();

        assert_eq!(round.tick(Bounds::new(10, 6), NO_INPUT).unwrap(), RoundState::GameOver);
    }

    #[test]
    fn rejects_bad_configuration() {
        let base = RoundConfig::default();
        let bounds = Bounds::new(10, 10);

        for config in [
            RoundConfig { win_score: 0, ..base },
            RoundConfig { win_score: SNAKE_MAX_LENGTH as u32, ..base },
            RoundConfig { min_interval: Duration::ZERO, ..base },
            RoundConfig { min_interval: Duration::from_millis(500), ..base },
        ] {
            assert!(matches!(Round::new(config, bounds), Err(EngineError::InvalidConfig(_))));
        }

        let max_win = RoundConfig { win_score: SNAKE_MAX_LENGTH as u32 - 1, ..base };
        assert!(Round::new(max_win, bounds).is_ok());
        let flat = Round::new(base, Bounds::new(10, 0));
        assert!(matches!(flat, Err(EngineError::InvalidBounds { .. })));
    }

    #[test]
    fn snapshot_reflects_the_round() {
        let bounds = Bounds::new(12, 10);
        let mut round = dual(10, false, bounds);
        round.tick(bounds, [Some(Up), Some(Down)]).unwrap();

        let snapshot = round.snapshot();
        assert_eq!(snapshot.bounds, bounds);
        assert_eq!(snapshot.snakes.len(), 2);
        assert_eq!(snapshot.snakes[0].body, &[(4, 4)]);
        assert_eq!(snapshot.snakes[1].body, &[(8, 6)]);
        assert_eq!(snapshot.snakes[1].player, Player::Two);
        assert_eq!(snapshot.food, Some((0, 9)));
        assert_eq!(snapshot.tick, 1);
        assert_eq!(snapshot.state, RoundState::Running);
    }
}
