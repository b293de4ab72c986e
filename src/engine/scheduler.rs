use std::time::{Duration, Instant};

/// A stalled fixed-delay loop catches up at most this many ticks per pump
/// before dropping the backlog.
const MAX_CATCHUP_TICKS: u32 = 4;

/// How a game's loop is paced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pacing {
    /// One tick per host frame (the host's render clock, ~60 fps).
    FrameLocked,
    /// Fixed-delay ticking, independent of the render rate.
    Fixed(Duration),
}

/// Decides how many update ticks are due each time the host pumps the
/// session. Armed by `start`, halted by `cleanup`.
#[derive(Debug)]
pub struct Scheduler {
    pacing: Pacing,
    next_due: Option<Instant>,
}

impl Scheduler {
    pub fn new(pacing: Pacing) -> Self {
        Self {
            pacing,
            next_due: None,
        }
    }

    pub fn arm(&mut self, now: Instant) {
        self.next_due = Some(match self.pacing {
            Pacing::FrameLocked => now,
            Pacing::Fixed(step) => now + step,
        });
    }

    pub fn halt(&mut self) {
        self.next_due = None;
    }

    pub fn due_ticks(&mut self, now: Instant) -> u32 {
        let Some(mut due) = self.next_due else {
            return 0;
        };
        match self.pacing {
            Pacing::FrameLocked => 1,
            Pacing::Fixed(step) => {
                let mut ticks = 0;
                while now >= due && ticks < MAX_CATCHUP_TICKS {
                    ticks += 1;
                    due += step;
                }
                if now >= due {
                    // Too far behind; drop the backlog rather than spiral.
                    due = now + step;
                }
                self.next_due = Some(due);
                ticks
            }
        }
    }
}
