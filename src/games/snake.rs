use std::collections::VecDeque;
use std::time::{Duration, Instant};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use ratatui::style::Color;

use crate::engine::input::GameKey;
use crate::engine::physics::Cell;
use crate::engine::rewards::RewardTable;
use crate::engine::scheduler::Pacing;
use crate::engine::session::SessionCore;
use crate::engine::{GameConfig, Minigame, Phase};

const COLS: i16 = 30;
const ROWS: i16 = 20;
const CELL: f32 = 20.0;
const WIDTH: f32 = COLS as f32 * CELL;
const HEIGHT: f32 = ROWS as f32 * CELL;

// Simulation cadence, independent of the render rate.
const TICK: Duration = Duration::from_millis(150);
const FOOD_POINTS: u32 = 10;

const REWARDS: RewardTable = RewardTable::new(&[(100, 2), (50, 1)]);

pub struct SnakeGame {
    core: SessionCore,
    body: VecDeque<Cell>,
    dir: (i16, i16),
    pending_dir: Option<(i16, i16)>,
    food: Cell,
    rng: SmallRng,
}

impl SnakeGame {
    pub fn new(cfg: GameConfig) -> Self {
        let core = SessionCore::new(cfg, WIDTH, HEIGHT, Pacing::Fixed(TICK), REWARDS);
        let game = Self {
            core,
            body: VecDeque::from([Cell::new(10, 10)]),
            dir: (0, 0),
            pending_dir: None,
            food: Cell::new(15, 15),
            rng: SmallRng::from_entropy(),
        };
        game.draw();
        game
    }

    /// Queue a turn unless it runs along the axis already in motion, which
    /// would let the snake reverse onto itself. A stationary snake accepts
    /// any first direction. At most one queued turn takes effect per tick,
    /// so two quick presses cannot chain into a reversal either.
    fn queue_turn(&mut self, key: GameKey) {
        let turn = match key {
            GameKey::Up => (0, -1),
            GameKey::Down => (0, 1),
            GameKey::Left => (-1, 0),
            GameKey::Right => (1, 0),
            _ => return,
        };
        let legal = if turn.0 != 0 { self.dir.0 == 0 } else { self.dir.1 == 0 };
        if legal {
            self.pending_dir = Some(turn);
        }
    }

    fn place_food(&mut self) -> Cell {
        // Rejection-sample until the cell is unoccupied.
        loop {
            let cell = Cell::new(self.rng.gen_range(0..COLS), self.rng.gen_range(0..ROWS));
            if !self.body.contains(&cell) {
                return cell;
            }
        }
    }

    fn tick(&mut self, now: Instant) {
        for key in self.core.input.take_hits() {
            self.queue_turn(key);
        }
        if let Some(dir) = self.pending_dir.take() {
            self.dir = dir;
        }
        if self.dir == (0, 0) {
            // Waiting for the first turn.
            return;
        }

        let head = self.body[0];
        let next = head.shifted(self.dir.0, self.dir.1);
        if !next.in_grid(COLS, ROWS) || self.body.contains(&next) {
            self.core.finish(now);
            return;
        }

        self.body.push_front(next);
        if next == self.food {
            self.core.award(FOOD_POINTS);
            self.food = self.place_food();
        } else {
            self.body.pop_back();
        }
    }

    fn draw(&self) {
        let mut s = self.core.target.frame();
        s.clear();
        for cell in &self.body {
            s.fill_rect(
                cell.x as f32 * CELL,
                cell.y as f32 * CELL,
                CELL - 2.0,
                CELL - 2.0,
                Color::Green,
            );
        }
        s.fill_rect(
            self.food.x as f32 * CELL,
            self.food.y as f32 * CELL,
            CELL - 2.0,
            CELL - 2.0,
            Color::Red,
        );
        s.label(8.0, 8.0, format!("SCORE {}", self.core.score()), Color::Green);
        if self.core.phase() == Phase::Ended {
            s.label(WIDTH / 2.0 - 50.0, HEIGHT / 2.0, "GAME OVER", Color::Red);
        }
    }
}

impl Minigame for SnakeGame {
    fn start(&mut self, now: Instant) {
        self.core.begin(now);
    }

    fn advance(&mut self, now: Instant) {
        if self.core.is_cleaned() {
            return;
        }
        for _ in 0..self.core.due_ticks(now) {
            if !self.core.is_running() {
                break;
            }
            self.tick(now);
        }
        self.core.service_end(now);
        self.draw();
    }

    fn cleanup(&mut self) {
        self.core.cleanup();
    }

    fn phase(&self) -> Phase {
        self.core.phase()
    }

    fn score(&self) -> u32 {
        self.core.score()
    }
}
