pub const BYTES_PER_PIXEL: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BufferError {
    #[error("pitch {pitch} is smaller than a row of {width} pixels")]
    PitchTooSmall { width: usize, pitch: usize },
    #[error("pixel memory holds {len} bytes, {required} required")]
    PixelMemoryTooSmall { len: usize, required: usize },
    #[error("sound memory holds {len} samples, {required} required")]
    SoundMemoryTooSmall { len: usize, required: usize },
    #[error("sample rate must be non-zero")]
    ZeroSampleRate,
}

/// Host-owned offscreen bitmap, 4 bytes per pixel.
///
/// Pixels are little-endian `u32`s laid out as `0x00RRGGBB`, so blue is the
/// first byte in memory and green the second. Rows start every `pitch` bytes;
/// anything between `width * 4` and `pitch` is padding. The last row needs no
/// padding after it.
#[derive(Debug)]
pub struct PixelBuffer<'a> {
    memory: &'a mut [u8],
    width: usize,
    height: usize,
    pitch: usize,
}

impl<'a> PixelBuffer<'a> {
    pub fn new(
        memory: &'a mut [u8],
        width: usize,
        height: usize,
        pitch: usize,
    ) -> Result<Self, BufferError> {
        if pitch < width * BYTES_PER_PIXEL {
            return Err(BufferError::PitchTooSmall { width, pitch });
        }
        let required = match height {
            0 => 0,
            _ => (height - 1) * pitch + width * BYTES_PER_PIXEL,
        };
        if memory.len() < required {
            return Err(BufferError::PixelMemoryTooSmall {
                len: memory.len(),
                required,
            });
        }
        Ok(Self {
            memory,
            width,
            height,
            pitch,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pitch(&self) -> usize {
        self.pitch
    }

    /// Visible pixels of each row, top to bottom, as 4-byte chunks.
    pub fn rows_mut(&mut self) -> impl Iterator<Item = &mut [u8]> + '_ {
        let visible = self.width * BYTES_PER_PIXEL;
        self.memory
            .chunks_mut(self.pitch.max(1))
            .take(self.height)
            .map(move |row| &mut row[..visible])
    }

    pub fn pixel(&self, x: usize, y: usize) -> u32 {
        let at = y * self.pitch + x * BYTES_PER_PIXEL;
        let bytes = &self.memory[at..at + BYTES_PER_PIXEL];
        u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }
}

/// Host-owned interleaved stereo 16-bit sample region for one refill.
#[derive(Debug)]
pub struct SoundBuffer<'a> {
    samples_per_second: u32,
    sample_count: usize,
    samples: &'a mut [i16],
}

impl<'a> SoundBuffer<'a> {
    pub const CHANNELS: usize = 2;

    pub fn new(
        samples: &'a mut [i16],
        samples_per_second: u32,
        sample_count: usize,
    ) -> Result<Self, BufferError> {
        if samples_per_second == 0 {
            return Err(BufferError::ZeroSampleRate);
        }
        let required = sample_count * Self::CHANNELS;
        if samples.len() < required {
            return Err(BufferError::SoundMemoryTooSmall {
                len: samples.len(),
                required,
            });
        }
        Ok(Self {
            samples_per_second,
            sample_count,
            samples,
        })
    }

    pub fn samples_per_second(&self) -> u32 {
        self.samples_per_second
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    /// `[left, right]` pairs, `sample_count` of them.
    pub fn frames_mut(&mut self) -> impl Iterator<Item = &mut [i16]> + '_ {
        self.samples[..self.sample_count * Self::CHANNELS].chunks_exact_mut(Self::CHANNELS)
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples[..self.sample_count * Self::CHANNELS]
    }
}
