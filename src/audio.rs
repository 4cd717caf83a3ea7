//! Audio: synthesized sound effects and a looping chiptune via rodio.
//!
//! Every sound is generated at runtime, so no audio assets ship with the
//! binary. Without an output device the player degrades to a silent no-op.

use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, OutputStreamHandle, Sink};
use std::time::Duration;

const SAMPLE_RATE: u32 = 44_100;

/// Background melody, square wave, one entry per note.
const MELODY_NOTES_HZ: [f32; 13] = [
    659.0, 494.0, 523.0, 587.0, 523.0, 494.0, 440.0, 440.0, 523.0, 659.0, 587.0, 523.0, 494.0,
];
const NOTE_FRAMES: u64 = SAMPLE_RATE as u64 * 3 / 10;
const ATTACK_FRAMES: u64 = SAMPLE_RATE as u64 / 100;
const RELEASE_FRAMES: u64 = SAMPLE_RATE as u64 / 40;
const MELODY_GAIN: f32 = 0.1;

/// Game moments that come with a sound effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEvent {
    Move,
    Rotate,
    Drop,
    LineClear,
    GameOver,
}

impl SoundEvent {
    /// Effect parameters: waveform, frequency, duration in seconds, gain.
    fn tone(&self) -> (Waveform, f32, f32, f32) {
        match self {
            Self::Move => (Waveform::Sine, 200.0, 0.05, 0.15),
            Self::Rotate => (Waveform::Sine, 400.0, 0.08, 0.15),
            Self::Drop => (Waveform::Square, 150.0, 0.10, 0.15),
            Self::LineClear => (Waveform::Sine, 800.0, 0.30, 0.20),
            Self::GameOver => (Waveform::Saw, 100.0, 0.50, 0.20),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Waveform {
    Sine,
    Square,
    Saw,
}

/// Render one effect tone: the waveform under an exponential fade from
/// `gain` down to 0.01, which keeps the tail from clicking.
fn render_tone(wave: Waveform, freq_hz: f32, secs: f32, gain: f32) -> Vec<f32> {
    let total = (SAMPLE_RATE as f32 * secs) as usize;
    (0..total)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            let phase = (t * freq_hz).fract();
            let raw = match wave {
                Waveform::Sine => (2.0 * std::f32::consts::PI * freq_hz * t).sin(),
                Waveform::Square => {
                    if phase < 0.5 {
                        1.0
                    } else {
                        -1.0
                    }
                }
                Waveform::Saw => 2.0 * phase - 1.0,
            };
            raw * gain * (0.01 / gain).powf(t / secs)
        })
        .collect()
}

/// Note playing at an absolute frame position.
fn note_index(frame: u64) -> usize {
    ((frame / NOTE_FRAMES) % MELODY_NOTES_HZ.len() as u64) as usize
}

/// Endless square-wave rendition of the melody. Each note gets a short
/// attack and release ramp so note changes stay click-free.
#[derive(Debug, Clone)]
struct MelodyLoop {
    frame: u64,
}

impl MelodyLoop {
    fn new() -> Self {
        Self { frame: 0 }
    }
}

impl Iterator for MelodyLoop {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        let freq_hz = MELODY_NOTES_HZ[note_index(self.frame)];
        let pos = self.frame % NOTE_FRAMES;
        let t = pos as f32 / SAMPLE_RATE as f32;
        let square = if (t * freq_hz).fract() < 0.5 { 1.0 } else { -1.0 };

        let release_start = NOTE_FRAMES - RELEASE_FRAMES;
        let env = if pos < ATTACK_FRAMES {
            pos as f32 / ATTACK_FRAMES as f32
        } else if pos >= release_start {
            (NOTE_FRAMES - pos) as f32 / RELEASE_FRAMES as f32
        } else {
            1.0
        };

        self.frame = self.frame.wrapping_add(1);
        Some(square * MELODY_GAIN * env)
    }
}

impl rodio::Source for MelodyLoop {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}

/// Sound output for the app. Construction never fails: when no output
/// device can be opened every call turns into a no-op.
pub struct AudioPlayer {
    output: Option<(OutputStream, OutputStreamHandle)>,
    bgm: Option<Sink>,
    pub sfx_enabled: bool,
    pub bgm_enabled: bool,
}

impl AudioPlayer {
    pub fn new(sfx_enabled: bool, bgm_enabled: bool) -> Self {
        Self {
            output: OutputStream::try_default().ok(),
            bgm: None,
            sfx_enabled,
            bgm_enabled,
        }
    }

    /// Fire the effect for a game moment on its own detached sink, so
    /// overlapping effects mix instead of cutting each other off.
    pub fn notify(&self, event: SoundEvent) {
        if !self.sfx_enabled {
            return;
        }
        let Some((_, handle)) = self.output.as_ref() else {
            return;
        };
        let Ok(sink) = Sink::try_new(handle) else {
            return;
        };
        let (wave, freq_hz, secs, gain) = event.tone();
        sink.append(SamplesBuffer::new(
            1,
            SAMPLE_RATE,
            render_tone(wave, freq_hz, secs, gain),
        ));
        sink.detach();
    }

    /// Start the background track from its first note. Restarting while it
    /// already plays rewinds it.
    pub fn start_bgm(&mut self) {
        self.stop_bgm();
        if !self.bgm_enabled {
            return;
        }
        let Some((_, handle)) = self.output.as_ref() else {
            return;
        };
        let Ok(sink) = Sink::try_new(handle) else {
            return;
        };
        sink.append(MelodyLoop::new());
        self.bgm = Some(sink);
    }

    /// Cut the background track immediately.
    pub fn stop_bgm(&mut self) {
        if let Some(sink) = self.bgm.take() {
            sink.stop();
        }
    }
}
