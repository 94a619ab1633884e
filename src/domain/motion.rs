/// Resumable tasks advanced by elapsed time.
///
/// A hop and the post-death pause both span several ticks. Each is a
/// small struct holding what is left to do; the controller drives it
/// and decides at every yield point whether to keep going.

use super::rules::MoveDir;

/// One hop from a cell to its neighbour, split into equal sub-steps.
///
/// The first sub-step lands one interval after the hop starts, the last
/// one lands at `duration`.
#[derive(Clone, Debug)]
pub struct MoveTween {
    pub dir: MoveDir,
    /// Row the hop ends on. The final sub-step snaps y here.
    pub target_y: f32,
    steps_total: u32,
    steps_left: u32,
    interval: f32,
    wait: f32,
}

impl MoveTween {
    pub fn new(dir: MoveDir, start_y: f32, duration: f32, substeps: u32) -> Self {
        let steps = substeps.max(1);
        let interval = duration / steps as f32;
        let (_, dy) = dir.delta();
        MoveTween {
            dir,
            target_y: start_y + dy as f32,
            steps_total: steps,
            steps_left: steps,
            interval,
            wait: interval,
        }
    }

    /// Let `dt` pass. Returns how many sub-steps came due.
    pub fn advance(&mut self, dt: f32) -> u32 {
        let mut due = 0;
        self.wait -= dt;
        while self.wait <= 0.0 && due < self.steps_left {
            due += 1;
            self.wait += self.interval;
        }
        due
    }

    /// Offset applied by one sub-step.
    pub fn step_offset(&self) -> (f32, f32) {
        let (dx, dy) = self.dir.delta();
        let n = self.steps_total as f32;
        (dx as f32 / n, dy as f32 / n)
    }

    /// Record one applied sub-step. Returns true when it was the last.
    pub fn consume_step(&mut self) -> bool {
        if self.steps_left > 0 {
            self.steps_left -= 1;
        }
        self.steps_left == 0
    }

    pub fn is_done(&self) -> bool {
        self.steps_left == 0
    }
}

/// Countdown before a dead player comes back.
#[derive(Clone, Debug)]
pub struct RespawnTimer {
    pub remaining: f32,
}

impl RespawnTimer {
    pub fn new(delay: f32) -> Self {
        RespawnTimer { remaining: delay }
    }

    /// Let `dt` pass. Returns true once the delay has run out.
    pub fn tick(&mut self, dt: f32) -> bool {
        self.remaining -= dt;
        self.remaining <= 0.0
    }
}
