use std::time::Instant;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use ratatui::style::Color;

use crate::engine::input::GameKey;
use crate::engine::physics::Rect2;
use crate::engine::rewards::RewardTable;
use crate::engine::scheduler::Pacing;
use crate::engine::session::SessionCore;
use crate::engine::{GameConfig, GameError, Minigame, Phase};

const WIDTH: f32 = 400.0;
const HEIGHT: f32 = 600.0;
const LANES: u8 = 5;
const LANE_W: f32 = WIDTH / LANES as f32;

const CAR_W: f32 = 40.0;
const CAR_H: f32 = 50.0;
const CAR_Y: f32 = HEIGHT - 100.0;
const CAR_SPEED: f32 = 5.0;

const NOTE_H: f32 = 40.0;
const BLOCK_SIZE: f32 = 40.0;
const NOTE_POINTS: u32 = 50;

const DEFAULT_BASELINE_OFFSET: f32 = 100.0;
// Vertical tolerance around the baseline within which a lane press counts.
const HIT_WINDOW: f32 = 30.0;
// Every missed note pulls the baseline toward the car by this much.
const MISS_PENALTY: f32 = 10.0;

const SPAWN_INTERVAL: u32 = 30;
const NOTE_CHANCE: f64 = 0.3;
const BLOCK_CHANCE: f64 = 0.2;

// Notes travel spawn-to-baseline in a fixed number of beats at the current
// tempo, so the pixel speed depends on bpm and the live baseline offset.
const FALL_BEATS: f32 = 4.0;
const TICKS_PER_SECOND: f32 = 60.0;
const DEFAULT_BPM: u32 = 120;

const LANE_COLORS: [Color; LANES as usize] = [
    Color::Green,
    Color::Red,
    Color::Yellow,
    Color::Blue,
    Color::Rgb(255, 170, 0),
];

const REWARDS: RewardTable = RewardTable::new(&[(1000, 3), (500, 2), (200, 1)]);

enum FallerKind {
    Note { lane: u8, hit: bool },
    Block,
}

struct Faller {
    rect: Rect2,
    kind: FallerKind,
}

impl Faller {
    fn is_spent_note(&self) -> bool {
        matches!(self.kind, FallerKind::Note { hit: true, .. })
    }

    fn is_fatal_to(&self, car: &Rect2) -> bool {
        self.rect.intersects(car)
            && match self.kind {
                FallerKind::Block => true,
                FallerKind::Note { hit, .. } => !hit,
            }
    }
}

pub struct RhythmRunner {
    core: SessionCore,
    car_x: f32,
    fallers: Vec<Faller>,
    baseline_offset: f32,
    fall_speed: f32,
    spawn_timer: u32,
    bpm: u32,
    rng: SmallRng,
}

impl RhythmRunner {
    pub fn new(cfg: GameConfig) -> Result<Self, GameError> {
        Self::with_tempo(cfg, DEFAULT_BPM)
    }

    pub fn with_tempo(cfg: GameConfig, bpm: u32) -> Result<Self, GameError> {
        // Guard before any speed computation: a zero tempo divides by zero.
        if bpm == 0 {
            return Err(GameError::InvalidConfig("tempo must be positive".into()));
        }
        let core = SessionCore::new(cfg, WIDTH, HEIGHT, Pacing::FrameLocked, REWARDS);
        let mut game = Self {
            core,
            car_x: (WIDTH - CAR_W) / 2.0,
            fallers: Vec::new(),
            baseline_offset: DEFAULT_BASELINE_OFFSET,
            fall_speed: 0.0,
            spawn_timer: 0,
            bpm,
            rng: SmallRng::from_entropy(),
        };
        game.fall_speed = game.computed_fall_speed();
        game.draw();
        Ok(game)
    }

    fn computed_fall_speed(&self) -> f32 {
        let beats_per_second = self.bpm as f32 / 60.0;
        let travel_secs = FALL_BEATS / beats_per_second;
        (HEIGHT - self.baseline_offset) / (travel_secs * TICKS_PER_SECOND)
    }

    fn baseline_y(&self) -> f32 {
        CAR_Y - self.baseline_offset + NOTE_H / 2.0
    }

    fn car_rect(&self) -> Rect2 {
        Rect2::new(self.car_x, CAR_Y, CAR_W, CAR_H)
    }

    /// Score the closest un-hit note in this lane if it sits inside the hit
    /// window. A note can be scored at most once.
    fn strike(&mut self, lane: u8) {
        let baseline = self.baseline_y();
        for faller in &mut self.fallers {
            if let FallerKind::Note { lane: note_lane, hit } = &mut faller.kind {
                if *note_lane == lane && !*hit && (faller.rect.center_y() - baseline).abs() < HIT_WINDOW {
                    *hit = true;
                    self.core.award(NOTE_POINTS);
                    break;
                }
            }
        }
    }

    /// Reset score, entities and baseline without leaving the session.
    fn restart(&mut self) {
        self.fallers.clear();
        self.spawn_timer = 0;
        self.car_x = (WIDTH - CAR_W) / 2.0;
        self.baseline_offset = DEFAULT_BASELINE_OFFSET;
        self.fall_speed = self.computed_fall_speed();
        self.core.reset_score();
    }

    fn spawn_wave(&mut self) {
        if self.rng.gen_bool(NOTE_CHANCE) {
            let lane = self.rng.gen_range(0..LANES);
            self.fallers.push(Faller {
                rect: Rect2::new(lane as f32 * LANE_W, -NOTE_H, LANE_W, NOTE_H),
                kind: FallerKind::Note { lane, hit: false },
            });
        }
        if self.rng.gen_bool(BLOCK_CHANCE) {
            let lane = self.rng.gen_range(0..LANES);
            self.fallers.push(Faller {
                rect: Rect2::new(
                    lane as f32 * LANE_W + (LANE_W - BLOCK_SIZE) / 2.0,
                    -BLOCK_SIZE,
                    BLOCK_SIZE,
                    BLOCK_SIZE,
                ),
                kind: FallerKind::Block,
            });
        }
    }

    fn tick(&mut self, now: Instant) {
        for key in self.core.input.take_hits() {
            match key {
                GameKey::Lane(lane) => self.strike(lane),
                GameKey::Restart => {
                    self.restart();
                    return;
                }
                _ => {}
            }
        }

        if self.core.input.is_pressed(GameKey::Left) {
            self.car_x = (self.car_x - CAR_SPEED).max(0.0);
        }
        if self.core.input.is_pressed(GameKey::Right) {
            self.car_x = (self.car_x + CAR_SPEED).min(WIDTH - CAR_W);
        }

        self.spawn_timer += 1;
        if self.spawn_timer > SPAWN_INTERVAL {
            self.spawn_wave();
            self.spawn_timer = 0;
        }

        for faller in &mut self.fallers {
            faller.rect.y += self.fall_speed;
        }
        self.fallers
            .retain(|f| f.rect.y < HEIGHT && !f.is_spent_note());

        let car = self.car_rect();
        if self.fallers.iter().any(|f| f.is_fatal_to(&car)) {
            self.core.finish(now);
            return;
        }

        // Notes that drift past the baseline un-hit are spent and tighten
        // the hit window, which also speeds the fall back up.
        let baseline = self.baseline_y();
        let mut missed = 0u32;
        for faller in &mut self.fallers {
            if let FallerKind::Note { hit, .. } = &mut faller.kind {
                if !*hit && faller.rect.y > baseline {
                    *hit = true;
                    missed += 1;
                }
            }
        }
        if missed > 0 {
            self.baseline_offset = (self.baseline_offset - MISS_PENALTY * missed as f32).max(0.0);
            self.fall_speed = self.computed_fall_speed();
        }

        // Survival pays one point per tick.
        self.core.award(1);
    }

    fn draw(&self) {
        let mut s = self.core.target.frame();
        s.clear();
        for lane in 1..LANES {
            s.vline(lane as f32 * LANE_W, Color::Rgb(50, 50, 50));
        }
        s.hline(self.baseline_y(), Color::White);
        for faller in &self.fallers {
            let r = faller.rect;
            match faller.kind {
                FallerKind::Note { lane, .. } => {
                    s.fill_rect(r.x, r.y, r.w, r.h, LANE_COLORS[lane as usize]);
                    s.frame_rect(r.x, r.y, r.w, r.h, Color::White);
                    s.label(r.x + r.w / 2.0, r.y + r.h / 2.0, (lane + 1).to_string(), Color::White);
                }
                FallerKind::Block => {
                    s.fill_rect(r.x, r.y, r.w, r.h, Color::Rgb(102, 102, 102));
                }
            }
        }
        s.fill_rect(self.car_x, CAR_Y, CAR_W, CAR_H, Color::Green);
        s.fill_rect(self.car_x + 5.0, CAR_Y + 5.0, 30.0, 10.0, Color::White);
        s.fill_rect(self.car_x + 5.0, CAR_Y + 35.0, 30.0, 10.0, Color::White);
        s.label(10.0, 20.0, format!("SCORE {}", self.core.score()), Color::Green);
        if self.core.phase() == Phase::Ended {
            s.label(WIDTH / 2.0 - 60.0, HEIGHT / 2.0 - 40.0, "GAME OVER", Color::Red);
            s.label(
                WIDTH / 2.0 - 70.0,
                HEIGHT / 2.0,
                format!("FINAL SCORE {}", self.core.score()),
                Color::Green,
            );
        }
    }
}

impl Minigame for RhythmRunner {
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

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::engine::input::InputBus;
    use crate::engine::session::END_OF_GAME_DELAY;
    use crate::engine::testkit;

    fn game(bus: &InputBus) -> (RhythmRunner, testkit::Probe) {
        let (cfg, probe) = testkit::config(bus);
        let mut game = RhythmRunner::new(cfg).expect("default tempo is valid");
        game.rng = SmallRng::seed_from_u64(9);
        (game, probe)
    }

    fn push_note(game: &mut RhythmRunner, lane: u8, center_offset: f32) {
        let y = game.baseline_y() + center_offset - NOTE_H / 2.0;
        game.fallers.push(Faller {
            rect: Rect2::new(lane as f32 * LANE_W, y, LANE_W, NOTE_H),
            kind: FallerKind::Note { lane, hit: false },
        });
    }

    fn frames(game: &mut RhythmRunner, t0: Instant, start: u64, n: u64) -> Instant {
        let mut now = t0;
        for i in start..start + n {
            now = t0 + Duration::from_millis(16 * (i + 1));
            game.advance(now);
        }
        now
    }

    #[test]
    fn zero_tempo_is_a_fatal_construction_error() {
        let bus = InputBus::new();
        let (cfg, _probe) = testkit::config(&bus);
        assert!(matches!(
            RhythmRunner::with_tempo(cfg, 0),
            Err(GameError::InvalidConfig(_))
        ));
    }

    #[test]
    fn fall_speed_follows_the_tempo_formula() {
        let bus = InputBus::new();
        let (game, _probe) = game(&bus);
        // (600 - 100) / ((4 / 2) * 60)
        assert!((game.fall_speed - 500.0 / 120.0).abs() < 1e-4);
    }

    #[test]
    fn passive_score_is_one_per_surviving_tick() {
        let bus = InputBus::new();
        let (mut game, probe) = game(&bus);
        let t0 = Instant::now();
        game.start(t0);
        // Stay under the spawn cadence so nothing else scores or collides.
        frames(&mut game, t0, 0, 10);
        assert_eq!(game.score(), 10);
        assert_eq!(probe.scores.borrow().len(), 10);
    }

    // Scenario: a lane-2 note 10px from the baseline scores exactly once.
    #[test]
    fn a_note_is_scored_at_most_once() {
        let bus = InputBus::new();
        let (mut game, _probe) = game(&bus);
        let t0 = Instant::now();
        game.start(t0);
        push_note(&mut game, 2, -10.0);
        bus.key_down(GameKey::Lane(2));
        bus.key_up(GameKey::Lane(2));
        frames(&mut game, t0, 0, 1);
        assert_eq!(game.score(), NOTE_POINTS + 1); // +1 passive
        bus.key_down(GameKey::Lane(2));
        bus.key_up(GameKey::Lane(2));
        frames(&mut game, t0, 1, 1);
        assert_eq!(game.score(), NOTE_POINTS + 2);
    }

    #[test]
    fn a_press_outside_the_window_scores_nothing() {
        let bus = InputBus::new();
        let (mut game, _probe) = game(&bus);
        let t0 = Instant::now();
        game.start(t0);
        let fall_speed = game.fall_speed;
        push_note(&mut game, 1, -(HIT_WINDOW + fall_speed + 5.0));
        bus.key_down(GameKey::Lane(1));
        frames(&mut game, t0, 0, 1);
        assert_eq!(game.score(), 1); // passive only
    }

    #[test]
    fn a_press_in_the_wrong_lane_scores_nothing() {
        let bus = InputBus::new();
        let (mut game, _probe) = game(&bus);
        let t0 = Instant::now();
        game.start(t0);
        push_note(&mut game, 2, -10.0);
        bus.key_down(GameKey::Lane(3));
        frames(&mut game, t0, 0, 1);
        assert_eq!(game.score(), 1);
    }

    #[test]
    fn a_missed_note_tightens_the_baseline_and_speeds_the_fall() {
        let bus = InputBus::new();
        let (mut game, _probe) = game(&bus);
        let t0 = Instant::now();
        game.start(t0);
        let slow = game.fall_speed;
        // Note center just past the baseline; top is already below it.
        push_note(&mut game, 0, NOTE_H);
        frames(&mut game, t0, 0, 1);
        assert_eq!(game.baseline_offset, DEFAULT_BASELINE_OFFSET - MISS_PENALTY);
        assert!(game.fall_speed > slow);
    }

    #[test]
    fn the_baseline_offset_floors_at_zero() {
        let bus = InputBus::new();
        let (mut game, _probe) = game(&bus);
        let t0 = Instant::now();
        game.start(t0);
        let mut last = game.baseline_offset;
        for i in 0..15 {
            push_note(&mut game, 0, NOTE_H);
            frames(&mut game, t0, i, 1);
            assert!(game.baseline_offset <= last);
            last = game.baseline_offset;
        }
        assert_eq!(game.baseline_offset, 0.0);
    }

    #[test]
    fn driving_into_a_block_ends_the_game() {
        let bus = InputBus::new();
        let (mut game, probe) = game(&bus);
        let t0 = Instant::now();
        game.start(t0);
        frames(&mut game, t0, 0, 3);
        game.fallers.push(Faller {
            rect: Rect2::new(game.car_x, CAR_Y - game.fall_speed, BLOCK_SIZE, BLOCK_SIZE),
            kind: FallerKind::Block,
        });
        let died_at = frames(&mut game, t0, 3, 1);
        assert_eq!(game.phase(), Phase::Ended);
        // No passive point on the death tick.
        assert_eq!(game.score(), 3);
        game.advance(died_at + END_OF_GAME_DELAY);
        game.advance(died_at + END_OF_GAME_DELAY + Duration::from_secs(1));
        assert_eq!(*probe.ended.borrow(), vec![(3, 0)]);
    }

    #[test]
    fn touching_an_unhit_note_is_fatal_but_a_hit_note_is_not() {
        let car = Rect2::new(100.0, CAR_Y, CAR_W, CAR_H);
        let live = Faller {
            rect: Rect2::new(90.0, CAR_Y, LANE_W, NOTE_H),
            kind: FallerKind::Note { lane: 1, hit: false },
        };
        let spent = Faller {
            rect: Rect2::new(90.0, CAR_Y, LANE_W, NOTE_H),
            kind: FallerKind::Note { lane: 1, hit: true },
        };
        assert!(live.is_fatal_to(&car));
        assert!(!spent.is_fatal_to(&car));
    }

    #[test]
    fn steering_clamps_to_the_playfield() {
        let bus = InputBus::new();
        let (mut game, _probe) = game(&bus);
        let t0 = Instant::now();
        game.start(t0);
        bus.key_down(GameKey::Left);
        frames(&mut game, t0, 0, 40);
        assert_eq!(game.car_x, 0.0);
        bus.key_up(GameKey::Left);
        bus.key_down(GameKey::Right);
        frames(&mut game, t0, 40, 80);
        assert_eq!(game.car_x, WIDTH - CAR_W);
    }

    #[test]
    fn restart_resets_state_without_leaving_the_session() {
        let bus = InputBus::new();
        let (mut game, probe) = game(&bus);
        let t0 = Instant::now();
        game.start(t0);
        push_note(&mut game, 0, NOTE_H); // will be missed, shrinking the offset
        frames(&mut game, t0, 0, 5);
        assert!(game.score() > 0);
        assert!(game.baseline_offset < DEFAULT_BASELINE_OFFSET);
        bus.key_down(GameKey::Restart);
        frames(&mut game, t0, 5, 1);
        assert_eq!(game.score(), 0);
        assert_eq!(probe.scores.borrow().last(), Some(&0));
        assert_eq!(game.baseline_offset, DEFAULT_BASELINE_OFFSET);
        assert!(game.fallers.is_empty());
        assert_eq!(game.phase(), Phase::Running);
        // Scoring resumes from zero afterwards.
        frames(&mut game, t0, 6, 2);
        assert_eq!(game.score(), 2);
    }

    #[test]
    fn spawned_entities_stay_lane_aligned() {
        let bus = InputBus::new();
        let (mut game, _probe) = game(&bus);
        for _ in 0..500 {
            game.spawn_wave();
        }
        assert!(!game.fallers.is_empty());
        for faller in &game.fallers {
            match faller.kind {
                FallerKind::Note { lane, .. } => {
                    assert!(lane < LANES);
                    assert_eq!(faller.rect.x, lane as f32 * LANE_W);
                }
                FallerKind::Block => {
                    assert!(faller.rect.x >= 0.0 && faller.rect.x + BLOCK_SIZE <= WIDTH);
                }
            }
        }
    }

    #[test]
    fn cleanup_twice_leaves_no_dangling_listeners() {
        let bus = InputBus::new();
        let (mut game, probe) = game(&bus);
        let t0 = Instant::now();
        game.start(t0);
        game.advance(t0);
        game.cleanup();
        game.cleanup();
        bus.key_down(GameKey::Left);
        let x = game.car_x;
        game.advance(t0 + Duration::from_secs(1));
        assert_eq!(game.car_x, x);
        assert!(probe.target.view().is_blank());
    }
}
