pub mod input;
pub mod physics;
pub mod rewards;
pub mod scheduler;
pub mod session;
pub mod surface;

use std::time::Instant;

use thiserror::Error;

use crate::engine::input::InputBus;
use crate::engine::surface::RenderTarget;

/// Fired synchronously inside `update` the instant the score changes.
pub type ScoreCallback = Box<dyn FnMut(u32)>;
/// Fired exactly once per session: `(final_score, tokens_earned)`.
pub type EndCallback = Box<dyn FnMut(u32, u32)>;

/// Everything the hub hands a game at construction.
pub struct GameConfig {
    /// Slot the game allocates its fixed-size surface into.
    pub target: RenderTarget,
    /// Process-wide input source; the game attaches a scoped port to it.
    pub input: InputBus,
    pub player_name: String,
    pub on_score_change: ScoreCallback,
    pub on_game_end: EndCallback,
}

/// Session lifecycle state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
    Ended,
}

#[derive(Debug, Error)]
pub enum GameError {
    #[error("no game registered under id `{0}`")]
    UnknownGame(String),
    #[error("invalid game configuration: {0}")]
    InvalidConfig(String),
}

/// The lifecycle contract every mini-game implements.
///
/// Construction happens through each game's own `new(GameConfig)` (fallible
/// where the configuration can be degenerate); the registry wraps those in a
/// uniform constructor fn. After construction the host may call `start` once,
/// then chains `advance` from its render clock until `on_game_end` has fired,
/// and finally calls `cleanup` before returning to the menu.
pub trait Minigame {
    /// Begin simulating. Optional: games of the auto-start kind are already
    /// running when construction returns and keep the default no-op.
    fn start(&mut self, _now: Instant) {}

    /// Pumped by the host's render clock. The game's own scheduler decides
    /// how many `update` ticks run before it redraws; the host never invokes
    /// update or draw directly. Also services the pending end-of-game delay.
    fn advance(&mut self, now: Instant);

    /// Idempotent teardown: stops scheduled work, releases the input port,
    /// clears the render surface. Safe to call on a session that never
    /// started or already ended.
    fn cleanup(&mut self);

    fn phase(&self) -> Phase;

    fn score(&self) -> u32;
}
