#[cfg(target_os = "macos")]
pub mod appkit;
pub mod headless;

use crate::{Config, PlatformError};

pub(crate) fn validate(config: &Config) -> Result<(), PlatformError> {
    if config.width == 0 || config.height == 0 {
        return Err(PlatformError::Config(format!(
            "window must not be empty, got {}x{}",
            config.width, config.height
        )));
    }
    if config.frames_per_second == 0 {
        return Err(PlatformError::Config("frame rate must be non-zero".into()));
    }
    if config.samples_per_second < config.frames_per_second {
        return Err(PlatformError::Config(format!(
            "{} Hz cannot fill {} frames per second",
            config.samples_per_second, config.frames_per_second
        )));
    }
    Ok(())
}
