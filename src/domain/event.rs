/// Notifications the player controller pushes during a tick.
///
/// The controller never calls out directly. Whoever hosts it drains the
/// list and routes each event (see `sim::event::dispatch`).

use super::rules::{Cue, DeathType};

#[derive(Clone, Debug, PartialEq)]
pub enum PlayerEvent {
    /// A vertical hop started toward `row`; `dir` is +1 or -1.
    RowAdvance { row: i32, dir: i32 },
    Respawned,
    Victory { bonus: u32 },
    GameOver,
    Died(DeathType),
    ScoreChanged(u32),
    LifeIcon { index: usize, on: bool },
    TimeBar(f32),
    Cue(Cue),
}
