use core::f32::consts::TAU;

use framehost::SoundBuffer;

/// Peak amplitude, well under `i16::MAX` to leave headroom.
pub const TONE_VOLUME: i16 = 3000;
/// Lowest frequency the synthesizer will play. Anything at or below zero is
/// raised to this.
pub const MIN_TONE_HZ: i32 = 1;

/// Sine oscillator whose phase runs on across refills.
///
/// The phase is never wrapped. `libm` keeps the output identical across
/// targets for the same sequence of calls.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct ToneSynth {
    phase: f32,
}

impl ToneSynth {
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Samples per cycle, integer division, at least one.
    pub fn wave_period(samples_per_second: u32, tone_hz: i32) -> u32 {
        let tone_hz = tone_hz.max(MIN_TONE_HZ) as u32;
        (samples_per_second / tone_hz).max(1)
    }

    /// Writes `sample_count` identical left/right pairs.
    pub fn output(&mut self, buffer: &mut SoundBuffer, tone_hz: i32) {
        if tone_hz < MIN_TONE_HZ {
            log::trace!("tone {tone_hz} Hz raised to {MIN_TONE_HZ} Hz");
        }
        let wave_period = Self::wave_period(buffer.samples_per_second(), tone_hz);
        let step = TAU / wave_period as f32;
        for frame in buffer.frames_mut() {
            let value = libm::roundf(libm::sinf(self.phase) * TONE_VOLUME as f32) as i16;
            frame[0] = value;
            frame[1] = value;
            self.phase += step;
        }
    }
}
