use std::time::Instant;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use ratatui::style::Color;

use crate::engine::input::GameKey;
use crate::engine::physics::{wall_bounce, Rect2};
use crate::engine::rewards::RewardTable;
use crate::engine::scheduler::Pacing;
use crate::engine::session::SessionCore;
use crate::engine::{GameConfig, Minigame, Phase};

const WIDTH: f32 = 800.0;
const HEIGHT: f32 = 400.0;

const PADDLE_W: f32 = 15.0;
const PADDLE_H: f32 = 80.0;
const PLAYER_X: f32 = 50.0;
const AI_X: f32 = 735.0;
const PLAYER_SPEED: f32 = 8.0;
const AI_SPEED: f32 = 5.0;
// The AI only corrects when the ball is this far from its paddle center.
const AI_DEAD_ZONE: f32 = 35.0;

const BALL_SIZE: f32 = 15.0;
const SERVE_DX: f32 = 4.0;
const WIN_SCORE: u32 = 5;

const REWARDS: RewardTable = RewardTable::new(&[(WIN_SCORE, 1)]);

pub struct PongGame {
    core: SessionCore,
    paddle_y: f32,
    ai_y: f32,
    ball: Rect2,
    ball_dx: f32,
    ball_dy: f32,
    ai_score: u32,
    rng: SmallRng,
}

impl PongGame {
    pub fn new(cfg: GameConfig) -> Self {
        let core = SessionCore::new(cfg, WIDTH, HEIGHT, Pacing::FrameLocked, REWARDS);
        let game = Self {
            core,
            paddle_y: (HEIGHT - PADDLE_H) / 2.0,
            ai_y: (HEIGHT - PADDLE_H) / 2.0,
            ball: Rect2::new(WIDTH / 2.0, HEIGHT / 2.0 + 100.0, BALL_SIZE, BALL_SIZE),
            ball_dx: SERVE_DX,
            ball_dy: 3.0,
            ai_score: 0,
            rng: SmallRng::from_entropy(),
        };
        game.draw();
        game
    }

    fn player_rect(&self) -> Rect2 {
        Rect2::new(PLAYER_X, self.paddle_y, PADDLE_W, PADDLE_H)
    }

    fn ai_rect(&self) -> Rect2 {
        Rect2::new(AI_X, self.ai_y, PADDLE_W, PADDLE_H)
    }

    /// Reverse the ball and nudge its vertical speed so rallies never settle
    /// into a deterministic loop.
    fn deflect(&mut self) {
        self.ball_dx = -self.ball_dx;
        self.ball_dy += self.rng.gen_range(-1.0..=1.0);
    }

    fn serve(&mut self) {
        self.ball.x = WIDTH / 2.0;
        self.ball.y = HEIGHT / 2.0;
        self.ball_dx = if self.rng.gen_bool(0.5) { SERVE_DX } else { -SERVE_DX };
        self.ball_dy = self.rng.gen_range(-3.0..=3.0);
    }

    fn tick(&mut self, now: Instant) {
        // Pong is held-keys only; discard stale hit events.
        self.core.input.take_hits();

        if self.core.input.is_pressed(GameKey::Up) {
            self.paddle_y = (self.paddle_y - PLAYER_SPEED).max(0.0);
        }
        if self.core.input.is_pressed(GameKey::Down) {
            self.paddle_y = (self.paddle_y + PLAYER_SPEED).min(HEIGHT - PADDLE_H);
        }

        let ai_center = self.ai_y + PADDLE_H / 2.0;
        if ai_center < self.ball.y - AI_DEAD_ZONE {
            self.ai_y += AI_SPEED;
        } else if ai_center > self.ball.y + AI_DEAD_ZONE {
            self.ai_y -= AI_SPEED;
        }
        self.ai_y = self.ai_y.clamp(0.0, HEIGHT - PADDLE_H);

        self.ball.x += self.ball_dx;
        self.ball.y += self.ball_dy;
        if let Some(dy) = wall_bounce(self.ball.y, BALL_SIZE, self.ball_dy, HEIGHT) {
            self.ball_dy = dy;
        }

        // A paddle only returns a ball that is moving toward it.
        if self.ball_dx < 0.0 && self.ball.intersects(&self.player_rect()) {
            self.deflect();
        } else if self.ball_dx > 0.0 && self.ball.intersects(&self.ai_rect()) {
            self.deflect();
        }

        if self.ball.x < 0.0 {
            self.ai_score += 1;
            self.serve();
            if self.ai_score >= WIN_SCORE {
                self.core.finish(now);
            }
        } else if self.ball.x > WIDTH {
            self.core.award(1);
            self.serve();
            if self.core.score() >= WIN_SCORE {
                self.core.finish(now);
            }
        }
    }

    fn draw(&self) {
        let mut s = self.core.target.frame();
        s.clear();
        s.vline(WIDTH / 2.0, Color::Rgb(0, 100, 0));
        s.fill_rect(PLAYER_X, self.paddle_y, PADDLE_W, PADDLE_H, Color::Green);
        s.fill_rect(AI_X, self.ai_y, PADDLE_W, PADDLE_H, Color::Green);
        s.fill_rect(self.ball.x, self.ball.y, BALL_SIZE, BALL_SIZE, Color::White);
        s.label(WIDTH / 4.0, 20.0, self.core.score().to_string(), Color::Green);
        s.label(3.0 * WIDTH / 4.0, 20.0, self.ai_score.to_string(), Color::Green);
        if self.core.phase() == Phase::Ended {
            if self.core.score() >= WIN_SCORE {
                s.label(WIDTH / 2.0 - 60.0, HEIGHT / 2.0, "YOU WIN!", Color::Green);
            } else {
                s.label(WIDTH / 2.0 - 60.0, HEIGHT / 2.0, "GAME OVER", Color::Red);
            }
        }
    }
}

impl Minigame for PongGame {
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
