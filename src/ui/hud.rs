/// Heads-up display state: the presentation sink the controller talks to.
///
/// Holds only what was last announced (score text, life icons, time bar)
/// and forwards cues to the sound engine. The renderer reads it back;
/// the controller never does.

use crate::domain::rules::Cue;
use crate::sim::event::PresentationSink;

use super::sound::SoundEngine;

pub struct Hud {
    pub score: u32,
    pub life_icons: Vec<bool>,
    pub time_ratio: f32,
    sound: Option<SoundEngine>,
}

impl Hud {
    pub fn new(total_lives: i32, sound: Option<SoundEngine>) -> Self {
        Hud {
            score: 0,
            life_icons: vec![true; total_lives.max(0) as usize],
            time_ratio: 1.0,
            sound,
        }
    }
}

impl PresentationSink for Hud {
    fn display_score(&mut self, score: u32) {
        self.score = score;
    }

    fn set_life_icon_active(&mut self, index: usize, on: bool) {
        // Icons past the configured count have nothing to show.
        if let Some(icon) = self.life_icons.get_mut(index) {
            *icon = on;
        }
    }

    fn set_time_bar_ratio(&mut self, ratio: f32) {
        self.time_ratio = ratio.clamp(0.0, 1.0);
    }

    fn play_cue(&mut self, cue: Cue) {
        if let Some(sound) = self.sound.as_mut() {
            sound.play_cue(cue);
        }
    }
}
