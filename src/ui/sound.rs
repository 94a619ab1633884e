/// Sound engine: procedural 8-bit style cues via rodio.
///
/// Every cue is generated as an in-memory WAV buffer at init time.
/// The most recent cue plays on the "voice" sink; a hop is skipped while
/// that voice is still sounding, so hop spam never drowns out a death.
///
/// Compile with `--no-default-features` or without the "sound" feature
/// to disable audio entirely (the stub SoundEngine does nothing).

use crate::domain::rules::Cue;

#[cfg(feature = "sound")]
mod inner {
    use std::f32::consts::PI;
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};
    use tracing::debug;

    use super::Cue;

    const SAMPLE_RATE: u32 = 22050;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        voice: Option<Sink>,
        sfx_hop: Arc<Vec<u8>>,
        sfx_splat: Arc<Vec<u8>>,
        sfx_splash: Arc<Vec<u8>>,
        sfx_chomp: Arc<Vec<u8>>,
        sfx_victory: Arc<Vec<u8>>,
        sfx_game_over: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = OutputStream::try_default().ok()?;

            Some(SoundEngine {
                _stream: stream,
                handle,
                voice: None,
                sfx_hop: Arc::new(make_wav(&gen_hop())),
                sfx_splat: Arc::new(make_wav(&gen_splat())),
                sfx_splash: Arc::new(make_wav(&gen_splash())),
                sfx_chomp: Arc::new(make_wav(&gen_chomp())),
                sfx_victory: Arc::new(make_wav(&gen_victory())),
                sfx_game_over: Arc::new(make_wav(&gen_game_over())),
            })
        }

        pub fn play_cue(&mut self, cue: Cue) {
            if cue == Cue::Hop && self.voice.as_ref().is_some_and(|v| !v.empty()) {
                return;
            }
            let buf = match cue {
                Cue::Hop => &self.sfx_hop,
                Cue::DeathCollision => &self.sfx_splat,
                Cue::DeathDrowning => &self.sfx_splash,
                Cue::Chomp => &self.sfx_chomp,
                Cue::Victory => &self.sfx_victory,
                Cue::GameOver => &self.sfx_game_over,
            };
            let Ok(sink) = Sink::try_new(&self.handle) else { return };
            match rodio::Decoder::new(Cursor::new(buf.as_ref().clone())) {
                Ok(src) => sink.append(src),
                Err(e) => {
                    debug!(?cue, error = %e, "cue decode failed");
                    return;
                }
            }
            // the previous voice finishes on its own
            if let Some(old) = self.voice.replace(sink) {
                old.detach();
            }
        }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators — all produce Vec<f32> mono samples
    // ════════════════════════════════════════════════════════════

    fn frames(duration: f32) -> usize {
        (SAMPLE_RATE as f32 * duration) as usize
    }

    /// Hop: quick upward chirp
    fn gen_hop() -> Vec<f32> {
        let n = frames(0.06);
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = 500.0 + t * 500.0;
                let ti = i as f32 / SAMPLE_RATE as f32;
                (ti * freq * 2.0 * PI).sin() * (1.0 - t) * 0.2
            })
            .collect()
    }

    /// Collision: low noise crunch
    fn gen_splat() -> Vec<f32> {
        let n = frames(0.25);
        let mut rng: u32 = 4242;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let thud = (ti * 90.0 * 2.0 * PI).sin();
                rng = rng.wrapping_mul(1103515245).wrapping_add(12345);
                let noise = (rng as f32 / u32::MAX as f32) * 2.0 - 1.0;
                (thud * 0.5 + noise * 0.5) * (1.0 - t).powf(1.5) * 0.35
            })
            .collect()
    }

    /// Drowning: wobbling tone sinking away
    fn gen_splash() -> Vec<f32> {
        let n = frames(0.45);
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let wobble = (ti * 18.0 * 2.0 * PI).sin() * 60.0;
                let freq = 420.0 - t * 300.0 + wobble;
                (ti * freq * 2.0 * PI).sin() * (1.0 - t) * 0.3
            })
            .collect()
    }

    /// Chomp: three hard low bites
    fn gen_chomp() -> Vec<f32> {
        let bite = frames(0.07);
        let gap = frames(0.03);
        let mut samples = Vec::with_capacity(3 * (bite + gap));
        for _ in 0..3 {
            for i in 0..bite {
                let t = i as f32 / bite as f32;
                let ti = i as f32 / SAMPLE_RATE as f32;
                // square wave for the snap
                let wave = if (ti * 140.0 * 2.0 * PI).sin() >= 0.0 { 1.0 } else { -1.0 };
                samples.push(wave * (1.0 - t) * 0.25);
            }
            samples.extend(std::iter::repeat(0.0).take(gap));
        }
        samples
    }

    /// Victory: ascending fanfare with a held top note
    fn gen_victory() -> Vec<f32> {
        let mut samples = notes(&[523.0, 659.0, 784.0, 1047.0], 0.1);
        let n = frames(0.25);
        for i in 0..n {
            let ti = i as f32 / SAMPLE_RATE as f32;
            let env = 1.0 - (i as f32 / n as f32);
            samples.push((ti * 1047.0 * 2.0 * PI).sin() * env * 0.3);
        }
        samples
    }

    /// Game over: slow descending line, faded out
    fn gen_game_over() -> Vec<f32> {
        let mut samples = notes(&[392.0, 330.0, 262.0, 196.0], 0.18);
        let fade_len = samples.len() / 3;
        let total = samples.len();
        for (k, s) in samples[total - fade_len..].iter_mut().enumerate() {
            *s *= 1.0 - k as f32 / fade_len as f32;
        }
        samples
    }

    fn notes(freqs: &[f32], note_dur: f32) -> Vec<f32> {
        let n = frames(note_dur);
        let mut samples = Vec::with_capacity(freqs.len() * n);
        for &freq in freqs {
            for i in 0..n {
                let ti = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32) * 0.3;
                let wave = (ti * freq * 2.0 * PI).sin() * 0.7
                    + (ti * freq * 2.0 * 2.0 * PI).sin() * 0.3;
                samples.push(wave * env * 0.3);
            }
        }
        samples
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder — wraps f32 samples into a 16-bit PCM buffer
    // ════════════════════════════════════════════════════════════

    fn make_wav(samples: &[f32]) -> Vec<u8> {
        let bits_per_sample: u16 = 16;
        let byte_rate = SAMPLE_RATE * bits_per_sample as u32 / 8;
        let block_align = bits_per_sample / 8;
        let data_size = samples.len() as u32 * 2;

        let mut buf = Vec::with_capacity(44 + data_size as usize);

        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&(36 + data_size).to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&1u16.to_le_bytes()); // mono
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());
        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }
        buf
    }

}

// ════════════════════════════════════════════════════════════
//  Public API — compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play_cue(&mut self, _cue: Cue) {}
}
