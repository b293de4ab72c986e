use std::time::{Duration, Instant};

use tracing::debug;

use crate::engine::input::InputPort;
use crate::engine::rewards::RewardTable;
use crate::engine::scheduler::{Pacing, Scheduler};
use crate::engine::surface::RenderTarget;
use crate::engine::{EndCallback, GameConfig, Phase, ScoreCallback};

/// Presentation delay between a session entering its terminal state and the
/// end-of-game callback firing. Long enough for the end-of-round screen to
/// render before control returns to the hub.
pub const END_OF_GAME_DELAY: Duration = Duration::from_secs(3);

/// The per-play session state every game embeds: render target, input port,
/// score, lifecycle phase, scheduler, reward table and the two host
/// callbacks. Created at construction, torn down by `cleanup`, never
/// persisted.
pub struct SessionCore {
    pub target: RenderTarget,
    pub input: InputPort,
    pub player_name: String,
    score: u32,
    phase: Phase,
    scheduler: Scheduler,
    rewards: RewardTable,
    ended_at: Option<Instant>,
    end_fired: bool,
    cleaned: bool,
    on_score_change: ScoreCallback,
    on_game_end: EndCallback,
}

impl SessionCore {
    pub fn new(
        cfg: GameConfig,
        width: f32,
        height: f32,
        pacing: Pacing,
        rewards: RewardTable,
    ) -> Self {
        cfg.target.allocate(width, height);
        let input = cfg.input.attach();
        Self {
            target: cfg.target,
            input,
            player_name: cfg.player_name,
            score: 0,
            phase: Phase::Idle,
            scheduler: Scheduler::new(pacing),
            rewards,
            ended_at: None,
            end_fired: false,
            cleaned: false,
            on_score_change: cfg.on_score_change,
            on_game_end: cfg.on_game_end,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }

    pub fn is_cleaned(&self) -> bool {
        self.cleaned
    }

    /// Idle -> Running; arms the scheduler.
    pub fn begin(&mut self, now: Instant) {
        if self.phase != Phase::Idle || self.cleaned {
            return;
        }
        self.phase = Phase::Running;
        self.scheduler.arm(now);
        debug!(player = %self.player_name, "session running");
    }

    pub fn due_ticks(&mut self, now: Instant) -> u32 {
        if self.phase != Phase::Running {
            return 0;
        }
        self.scheduler.due_ticks(now)
    }

    /// Add points and notify the host synchronously. Ignored outside Running.
    pub fn award(&mut self, points: u32) {
        if self.phase != Phase::Running {
            return;
        }
        self.score += points;
        (self.on_score_change)(self.score);
    }

    /// Explicit restart support: drops the score back to zero mid-session.
    pub fn reset_score(&mut self) {
        self.score = 0;
        (self.on_score_change)(0);
    }

    /// Running -> Ended; arms the end-of-game presentation delay.
    pub fn finish(&mut self, now: Instant) {
        if self.phase != Phase::Running {
            return;
        }
        self.phase = Phase::Ended;
        self.ended_at = Some(now);
        debug!(score = self.score, "session entered terminal state");
    }

    /// Fire the end-of-game callback once the delay has elapsed. Exactly
    /// once per session; never cancelled, even by cleanup-free hosts that
    /// keep pumping after the callback.
    pub fn service_end(&mut self, now: Instant) {
        if self.end_fired {
            return;
        }
        let Some(ended_at) = self.ended_at else {
            return;
        };
        if now >= ended_at + END_OF_GAME_DELAY {
            self.end_fired = true;
            let tokens = self.rewards.tokens_for(self.score);
            debug!(score = self.score, tokens, "end-of-game callback");
            (self.on_game_end)(self.score, tokens);
        }
    }

    /// Idempotent teardown: halts the scheduler, releases the input port,
    /// wipes the surface. Safe on a session that never started.
    pub fn cleanup(&mut self) {
        if self.cleaned {
            return;
        }
        self.cleaned = true;
        self.scheduler.halt();
        self.input.release();
        self.target.wipe();
        debug!(player = %self.player_name, "session cleaned up");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::input::{GameKey, InputBus};
    use crate::engine::testkit;

    fn core(bus: &InputBus) -> (SessionCore, testkit::Probe) {
        let (cfg, probe) = testkit::config(bus);
        let core = SessionCore::new(
            cfg,
            100.0,
            100.0,
            Pacing::FrameLocked,
            RewardTable::new(&[(50, 1)]),
        );
        (core, probe)
    }

    #[test]
    fn construction_sizes_the_surface_without_starting() {
        let bus = InputBus::new();
        let (core, probe) = core(&bus);
        assert_eq!(core.phase(), Phase::Idle);
        assert_eq!(probe.target.view().width(), 100.0);
    }

    #[test]
    fn award_notifies_synchronously_and_only_while_running() {
        let bus = InputBus::new();
        let (mut core, probe) = core(&bus);
        core.award(10); // idle: ignored
        assert_eq!(core.score(), 0);
        core.begin(Instant::now());
        core.award(10);
        core.award(5);
        assert_eq!(core.score(), 15);
        assert_eq!(*probe.scores.borrow(), vec![10, 15]);
    }

    #[test]
    fn end_callback_fires_once_after_the_delay() {
        let bus = InputBus::new();
        let (mut core, probe) = core(&bus);
        let t0 = Instant::now();
        core.begin(t0);
        core.award(60);
        core.finish(t0);
        core.service_end(t0);
        core.service_end(t0 + Duration::from_secs(2));
        assert!(probe.ended.borrow().is_empty());
        core.service_end(t0 + END_OF_GAME_DELAY);
        core.service_end(t0 + Duration::from_secs(10));
        core.service_end(t0 + Duration::from_secs(20));
        assert_eq!(*probe.ended.borrow(), vec![(60, 1)]);
    }

    #[test]
    fn finish_is_latched() {
        let bus = InputBus::new();
        let (mut core, _probe) = core(&bus);
        let t0 = Instant::now();
        core.begin(t0);
        core.finish(t0);
        core.finish(t0 + Duration::from_secs(1));
        assert_eq!(core.phase(), Phase::Ended);
        // No ticks are due once terminal.
        assert_eq!(core.due_ticks(t0 + Duration::from_secs(2)), 0);
    }

    #[test]
    fn cleanup_is_idempotent_and_releases_the_port() {
        let bus = InputBus::new();
        let (mut core, probe) = core(&bus);
        core.begin(Instant::now());
        core.cleanup();
        core.cleanup();
        bus.key_down(GameKey::Up);
        assert!(!core.input.is_pressed(GameKey::Up));
        assert!(probe.target.view().is_blank());
    }

    #[test]
    fn cleanup_on_a_never_started_session_is_safe() {
        let bus = InputBus::new();
        let (mut core, _probe) = core(&bus);
        core.cleanup();
        assert_eq!(core.phase(), Phase::Idle);
        // begin after cleanup is refused
        core.begin(Instant::now());
        assert_eq!(core.phase(), Phase::Idle);
    }
}
