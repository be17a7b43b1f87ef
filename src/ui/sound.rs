/// Sound engine: procedural 8-bit style effects via rodio.
///
/// All sounds are synthesized into in-memory WAV buffers at init time and
/// played fire-and-forget through a detached Sink.
///
/// Without the "sound" feature the stub SoundEngine does nothing.

use conmaze::sim::event::GameEvent;

/// Effects the game can play.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Sfx {
    Key,
    Door,
    Teleport,
    Broken,
    Bump,
    Victory,
    Blip,
}

impl Sfx {
    pub const ALL: [Sfx; 7] = [
        Sfx::Key, Sfx::Door, Sfx::Teleport, Sfx::Broken, Sfx::Bump, Sfx::Victory, Sfx::Blip,
    ];

    /// Sound for a move event. Plain steps are silent; one door sound covers
    /// all doors a key opens.
    pub fn for_event(event: &GameEvent) -> Option<Sfx> {
        match event {
            GameEvent::KeyCollected { doors: 0, .. } => Some(Sfx::Key),
            GameEvent::KeyCollected { .. } => Some(Sfx::Door),
            GameEvent::Teleported { .. } => Some(Sfx::Teleport),
            GameEvent::PassageBroken { .. } => Some(Sfx::Broken),
            GameEvent::Bumped { .. } => Some(Sfx::Bump),
            GameEvent::GoalReached { .. } => Some(Sfx::Victory),
            GameEvent::Moved { .. } | GameEvent::DoorUnlocked { .. } => None,
        }
    }
}

// ════════════════════════════════════════════════════════════
//  Waveform generators (mono f32 samples)
// ════════════════════════════════════════════════════════════

#[cfg_attr(not(feature = "sound"), allow(dead_code))]
mod synth {
    use super::Sfx;
    use std::f32::consts::PI;

    pub const SAMPLE_RATE: u32 = 22050;

    fn samples_for(duration: f32) -> usize {
        (SAMPLE_RATE as f32 * duration) as usize
    }

    /// Sine plus a touch of harmonics, per-note linear decay.
    fn notes(freqs: &[f32], note_dur: f32, volume: f32) -> Vec<f32> {
        let mut out = Vec::new();
        for &freq in freqs {
            let n = samples_for(note_dur);
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32).powf(0.5);
                let wave = (t * freq * 2.0 * PI).sin() * 0.7
                    + (t * freq * 3.0 * 2.0 * PI).sin() * 0.3;
                out.push(wave * env * volume);
            }
        }
        out
    }

    /// Pitch glide from `f0` to `f1`.
    fn sweep(f0: f32, f1: f32, duration: f32, volume: f32) -> Vec<f32> {
        let n = samples_for(duration);
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = f0 + (f1 - f0) * t;
                phase += freq / SAMPLE_RATE as f32;
                (phase * 2.0 * PI).sin() * (1.0 - t).powf(0.6) * volume
            })
            .collect()
    }

    /// Low thud: descending tone mixed with LCG noise.
    fn thud() -> Vec<f32> {
        let n = samples_for(0.07);
        let mut rng: u32 = 12345;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let tone = (ti * (160.0 - t * 60.0) * 2.0 * PI).sin();
                rng = rng.wrapping_mul(1103515245).wrapping_add(12345);
                let noise = (rng as f32 / u32::MAX as f32) * 2.0 - 1.0;
                (tone * 0.7 + noise * 0.3) * (1.0 - t) * 0.25
            })
            .collect()
    }

    pub fn generate(sfx: Sfx) -> Vec<f32> {
        match sfx {
            Sfx::Key => notes(&[1047.0, 1319.0, 1568.0], 0.045, 0.25), // C6 E6 G6
            Sfx::Door => {
                let mut s = notes(&[1047.0, 1568.0], 0.045, 0.25);
                s.extend(sweep(220.0, 440.0, 0.12, 0.25));
                s
            }
            Sfx::Teleport => sweep(300.0, 1400.0, 0.18, 0.22),
            Sfx::Broken => notes(&[440.0, 370.0, 311.0, 261.0], 0.09, 0.3), // A4 F#4 Eb4 C4
            Sfx::Bump => thud(),
            Sfx::Victory => {
                let mut s = notes(&[523.0, 659.0, 784.0, 1047.0], 0.1, 0.3); // C5 E5 G5 C6
                s.extend(sweep(1047.0, 1047.0, 0.25, 0.3));
                s
            }
            Sfx::Blip => notes(&[880.0], 0.035, 0.2),
        }
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder: 16-bit mono PCM
    // ════════════════════════════════════════════════════════════

    pub fn make_wav(samples: &[f32]) -> Vec<u8> {
        let num_channels: u16 = 1;
        let bits_per_sample: u16 = 16;
        let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
        let block_align = num_channels * bits_per_sample / 8;
        let data_size = samples.len() as u32 * 2;
        let file_size = 36 + data_size;

        let mut buf = Vec::with_capacity(44 + data_size as usize);

        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&file_size.to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&num_channels.to_le_bytes());
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

#[cfg(feature = "sound")]
mod inner {
    use std::collections::HashMap;
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    use super::{synth, Sfx};

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        buffers: HashMap<Sfx, Arc<Vec<u8>>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    log::warn!("No audio output, playing silently: {}", e);
                    return None;
                }
            };
            let buffers = Sfx::ALL
                .iter()
                .map(|&sfx| (sfx, Arc::new(synth::make_wav(&synth::generate(sfx)))))
                .collect();
            Some(SoundEngine { _stream: stream, handle, buffers })
        }

        pub fn play(&self, sfx: Sfx) {
            let Some(buf) = self.buffers.get(&sfx) else { return };
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach();
                }
            }
        }
    }
}

// ════════════════════════════════════════════════════════════
//  Public API (no-ops when the sound feature is off)
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play(&self, _sfx: Sfx) {}
}
