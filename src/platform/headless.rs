//! Offscreen backend: no window and no audio device, frames are stepped by the
//! caller. Used by tests and by batch runs that capture output to disk.

use crate::debug::debug_time;
use crate::{
    Audio, Config, Host, Input, Memory, PixelBuffer, Platform, PlatformError, SoundBuffer,
    SoundFn, UpdateFn,
};

pub struct Headless<T, H> {
    config: Config,
    memory: Memory<T>,
    host: H,
    pixels: Vec<u8>,
    samples: Vec<i16>,
    frame: u64,
}

/// Output of one stepped frame.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub index: u64,
    pub width: usize,
    pub height: usize,
    pub pitch: usize,
    pub samples_per_second: u32,
    pub pixels: &'a [u8],
    /// Interleaved stereo.
    pub samples: &'a [i16],
}

impl Frame<'_> {
    pub fn pixel(&self, x: usize, y: usize) -> u32 {
        let at = y * self.pitch + x * crate::BYTES_PER_PIXEL;
        u32::from_le_bytes([
            self.pixels[at],
            self.pixels[at + 1],
            self.pixels[at + 2],
            self.pixels[at + 3],
        ])
    }
}

impl<T, H: Host> Headless<T, H> {
    pub fn new(config: Config, memory: Memory<T>, host: H) -> Result<Self, PlatformError> {
        super::validate(&config)?;
        let pixels = vec![0; config.pitch() * config.height];
        let samples = vec![0; config.samples_per_frame() * SoundBuffer::CHANNELS];
        log::debug!(
            "headless {}x{} @ {} fps, {} samples per frame",
            config.width,
            config.height,
            config.frames_per_second,
            config.samples_per_frame()
        );
        Ok(Self {
            config,
            memory,
            host,
            pixels,
            samples,
            frame: 0,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn memory(&self) -> &Memory<T> {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut Memory<T> {
        &mut self.memory
    }

    pub fn frames_run(&self) -> u64 {
        self.frame
    }

    /// Runs one update followed by one audio refill.
    pub fn step(
        &mut self,
        input: &Input,
        update_and_render: UpdateFn<T>,
        get_sound_samples: SoundFn<T>,
    ) -> Result<Frame<'_>, PlatformError> {
        let (elapsed, result) = debug_time(|| -> Result<(), PlatformError> {
            let buffer = PixelBuffer::new(
                &mut self.pixels,
                self.config.width,
                self.config.height,
                self.config.pitch(),
            )?;
            update_and_render(Platform {
                memory: &mut self.memory,
                input,
                buffer,
                host: &mut self.host,
                delta: self.config.frame_seconds(),
            });

            let buffer = SoundBuffer::new(
                &mut self.samples,
                self.config.samples_per_second,
                self.config.samples_per_frame(),
            )?;
            get_sound_samples(Audio {
                memory: &mut self.memory,
                buffer,
            });
            Ok(())
        });
        result?;
        log::trace!("frame {} took {:?}", self.frame, elapsed);

        self.frame += 1;
        Ok(self.last_frame())
    }

    /// Output of the most recent step, blank before the first one.
    pub fn last_frame(&self) -> Frame<'_> {
        Frame {
            index: self.frame.saturating_sub(1),
            width: self.config.width,
            height: self.config.height,
            pitch: self.config.pitch(),
            samples_per_second: self.config.samples_per_second,
            pixels: &self.pixels,
            samples: &self.samples,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NullHost;

    #[derive(Default)]
    struct Fill {
        shade: u8,
        audio_calls: u32,
    }

    fn fill(platform: Platform<Fill>) {
        let Platform {
            memory, mut buffer, ..
        } = platform;
        memory.permanent.shade = memory.permanent.shade.wrapping_add(1);
        for row in buffer.rows_mut() {
            row.fill(memory.permanent.shade);
        }
    }

    fn ramp(audio: Audio<Fill>) {
        let Audio { memory, mut buffer } = audio;
        memory.permanent.audio_calls += 1;
        for (i, frame) in buffer.frames_mut().enumerate() {
            frame[0] = i as i16;
            frame[1] = i as i16;
        }
    }

    fn small() -> Config {
        Config::default()
            .with_size(3, 2)
            .with_samples_per_second(300)
            .with_frames_per_second(30)
    }

    #[test]
    fn step_runs_update_then_sound() {
        let mut headless = Headless::new(small(), Memory::<Fill>::new(), NullHost).unwrap();
        let frame = headless.step(&Input::default(), fill, ramp).unwrap();
        assert_eq!(frame.index, 0);
        assert_eq!(frame.pixels, &[1; 24]);
        assert_eq!(frame.samples, &[0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7, 8, 8, 9, 9]);

        headless.step(&Input::default(), fill, ramp).unwrap();
        assert_eq!(headless.frames_run(), 2);
        let last = headless.last_frame();
        assert_eq!(last.index, 1);
        assert_eq!(last.pixels, &[2; 24]);
        assert_eq!(headless.memory().permanent.audio_calls, 2);
        assert_eq!(headless.memory().permanent.shade, 2);
    }

    #[test]
    fn rejects_empty_window() {
        let result = Headless::new(small().with_size(0, 0), Memory::<Fill>::new(), NullHost);
        assert!(matches!(result, Err(PlatformError::Config(_))));
    }
}
