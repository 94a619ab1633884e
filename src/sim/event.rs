/// Routing of controller notifications.
///
/// `dispatch` sends each `PlayerEvent` to the session (game flow) or the
/// presentation sink (score text, life icons, time bar, audio).

use crate::domain::rules::Cue;

pub use crate::domain::event::PlayerEvent;

/// Game-flow hooks owned by whoever hosts the controller.
pub trait GameSession {
    fn on_row_advance(&mut self, row: i32, dir: i32);
    fn on_respawn(&mut self);
    fn on_victory(&mut self);
    fn on_game_over(&mut self);
}

/// One-way presentation hooks. Nothing is ever read back.
pub trait PresentationSink {
    fn display_score(&mut self, score: u32);
    fn set_life_icon_active(&mut self, index: usize, on: bool);
    fn set_time_bar_ratio(&mut self, ratio: f32);
    fn play_cue(&mut self, cue: Cue);
}

pub fn dispatch(
    events: &[PlayerEvent],
    session: &mut impl GameSession,
    sink: &mut impl PresentationSink,
) {
    for event in events {
        match *event {
            PlayerEvent::RowAdvance { row, dir } => session.on_row_advance(row, dir),
            PlayerEvent::Respawned => session.on_respawn(),
            PlayerEvent::Victory { .. } => {
                sink.play_cue(Cue::Victory);
                session.on_victory();
            }
            PlayerEvent::GameOver => {
                sink.play_cue(Cue::GameOver);
                session.on_game_over();
            }
            PlayerEvent::Died(_) => {} // cue already emitted alongside
            PlayerEvent::ScoreChanged(score) => sink.display_score(score),
            PlayerEvent::LifeIcon { index, on } => sink.set_life_icon_active(index, on),
            PlayerEvent::TimeBar(ratio) => sink.set_time_bar_ratio(ratio),
            PlayerEvent::Cue(cue) => sink.play_cue(cue),
        }
    }
}
