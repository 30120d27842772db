mod buffer;
pub mod debug;
mod host;
mod input;
pub mod platform;

pub use buffer::{BYTES_PER_PIXEL, BufferError, PixelBuffer, SoundBuffer};
pub use host::{FileContents, FileError, Host, NullHost, StdFileHost};
pub use input::{
    ButtonState, ControllerInput, Input, KEYBOARD_CONTROLLER, KeyCode, MAX_CONTROLLERS,
};

/// Permanent storage handed to the application every frame.
///
/// The host allocates it once, zeroed (`T::default()`), and keeps it at a
/// stable address for the whole process. The application owns the meaning of
/// `is_initialized`: it reads the flag on entry and sets it once it has set up
/// `permanent`.
#[derive(Debug, Default)]
pub struct Memory<T> {
    pub is_initialized: bool,
    pub permanent: T,
}

impl<T: Default> Memory<T> {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Everything the application sees during one update.
pub struct Platform<'a, T> {
    pub memory: &'a mut Memory<T>,
    pub input: &'a Input,
    pub buffer: PixelBuffer<'a>,
    pub host: &'a mut dyn Host,
    pub delta: f32,
}

/// Everything the application sees during one audio refill.
pub struct Audio<'a, T> {
    pub memory: &'a mut Memory<T>,
    pub buffer: SoundBuffer<'a>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub title: String,
    pub width: usize,
    pub height: usize,
    pub samples_per_second: u32,
    pub frames_per_second: u32,
    /// Stop after this many frames. `None` runs until the window closes.
    pub frame_limit: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            title: String::from("framehost app"),
            width: 600,
            height: 600,
            samples_per_second: 48_000,
            frames_per_second: 30,
            frame_limit: None,
        }
    }
}

impl Config {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_size(mut self, width: usize, height: usize) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_samples_per_second(mut self, samples_per_second: u32) -> Self {
        self.samples_per_second = samples_per_second;
        self
    }

    pub fn with_frames_per_second(mut self, frames_per_second: u32) -> Self {
        self.frames_per_second = frames_per_second;
        self
    }

    pub fn with_frame_limit(mut self, frames: u64) -> Self {
        self.frame_limit = Some(frames);
        self
    }

    pub fn pitch(&self) -> usize {
        self.width * BYTES_PER_PIXEL
    }

    /// Stereo frames the application must produce each video frame.
    pub fn samples_per_frame(&self) -> usize {
        (self.samples_per_second / self.frames_per_second.max(1)) as usize
    }

    pub fn frame_seconds(&self) -> f32 {
        1.0 / self.frames_per_second.max(1) as f32
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("unsupported target platform: {0}")]
    Unsupported(&'static str),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Buffer(#[from] BufferError),
}

pub type UpdateFn<T> = fn(Platform<T>);
pub type SoundFn<T> = fn(Audio<T>);

pub struct App<T: 'static> {
    memory: Memory<T>,
    config: Config,
}

impl<T: 'static> App<T> {
    pub fn new(state: T) -> Self {
        Self {
            memory: Memory {
                is_initialized: false,
                permanent: state,
            },
            config: Config::default(),
        }
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn run(
        self,
        update_and_render: UpdateFn<T>,
        get_sound_samples: SoundFn<T>,
    ) -> Result<(), PlatformError> {
        platform::validate(&self.config)?;

        #[cfg(target_os = "macos")]
        let Self { memory, config } = match self.config.frame_limit {
            None => {
                platform::appkit::run(self.config, self.memory, update_and_render, get_sound_samples);
                return Ok(());
            }
            Some(_) => self,
        };
        #[cfg(not(target_os = "macos"))]
        let Self { memory, config } = self;

        let Some(frames) = config.frame_limit else {
            return Err(PlatformError::Unsupported(
                "no windowing backend for this target, set a frame limit to run headless",
            ));
        };

        let mut headless =
            platform::headless::Headless::new(config, memory, StdFileHost::default())?;
        let mut input = Input::default();
        for _ in 0..frames {
            headless.step(&input, update_and_render, get_sound_samples)?;
            input = input.next_frame();
        }
        log::info!("headless run finished after {frames} frames");
        Ok(())
    }
}
