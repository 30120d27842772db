//! Scrolling blue/green gradient and a sine tone, steered by the controllers.
//!
//! The host calls [`update_and_render`] once per frame and
//! [`get_sound_samples`] once per audio refill, both against the same
//! [`GameMemory`] block.

mod render;
mod sound;

pub use render::{pack, render_weird_gradient, wrap_channel};
pub use sound::{MIN_TONE_HZ, TONE_VOLUME, ToneSynth};

use framehost::{Audio, ControllerInput, Platform};

pub const DEFAULT_TONE_HZ: i32 = 256;
/// Blue offset per frame at full horizontal stick.
pub const STICK_X_SPEED: f32 = 4.0;
/// Tone swing around [`DEFAULT_TONE_HZ`] at full vertical stick.
pub const STICK_Y_SPEED: f32 = 128.0;

#[cfg(feature = "self-test")]
const SELF_TEST_OUTPUT: &str = "test.out";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AppState {
    pub tone_hz: i32,
    pub blue_offset: i32,
    pub green_offset: i32,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            tone_hz: DEFAULT_TONE_HZ,
            blue_offset: 0,
            green_offset: 0,
        }
    }

    /// Offsets wrap on overflow; the tone is not clamped here.
    pub fn apply_controller(&mut self, controller: &ControllerInput) {
        if controller.is_analog {
            let dx = (STICK_X_SPEED * controller.stick_average_x) as i32;
            self.blue_offset = self.blue_offset.wrapping_add(dx);
            let dy = (STICK_Y_SPEED * controller.stick_average_y) as i32;
            self.tone_hz = DEFAULT_TONE_HZ.wrapping_add(dy);
        } else {
            if controller.move_left.ended_down {
                self.blue_offset = self.blue_offset.wrapping_sub(1);
            }
            if controller.move_right.ended_down {
                self.blue_offset = self.blue_offset.wrapping_add(1);
            }
        }

        if controller.action_down.ended_down {
            self.green_offset = self.green_offset.wrapping_add(1);
        }
    }
}

/// Contents of the host's permanent storage.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct GameMemory {
    pub state: AppState,
    /// Survives re-initialization.
    pub synth: ToneSynth,
}

pub fn update_and_render(
    Platform {
        memory,
        input,
        mut buffer,
        host,
        ..
    }: Platform<GameMemory>,
) {
    if !memory.is_initialized {
        #[cfg(feature = "self-test")]
        echo_own_source(host);
        #[cfg(not(feature = "self-test"))]
        let _ = host;

        memory.permanent.state = AppState::new();
        memory.is_initialized = true;
        log::debug!("initialized: {:?}", memory.permanent.state);
    }

    let state = &mut memory.permanent.state;
    for controller in &input.controllers {
        state.apply_controller(controller);
    }

    render_weird_gradient(&mut buffer, state.blue_offset, state.green_offset);
}

pub fn get_sound_samples(Audio { memory, mut buffer }: Audio<GameMemory>) {
    let GameMemory { state, synth } = &mut memory.permanent;
    synth.output(&mut buffer, state.tone_hz);
}

/// Reads this file through the host and writes it back out. Failures are
/// logged and otherwise ignored.
#[cfg(feature = "self-test")]
fn echo_own_source(host: &mut dyn framehost::Host) {
    use std::path::Path;

    let source = Path::new(file!());
    match host.read_entire_file(source) {
        Ok(contents) => {
            if let Err(err) = host.write_entire_file(Path::new(SELF_TEST_OUTPUT), contents.as_bytes())
            {
                log::debug!("self-test write failed: {err}");
            }
            host.free_file_memory(contents);
        }
        Err(err) => log::debug!("self-test read failed: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use framehost::{
        FileContents, FileError, Host, Input, MAX_CONTROLLERS, Memory, NullHost, PixelBuffer,
        SoundBuffer,
    };

    use super::*;

    const WIDTH: usize = 16;
    const HEIGHT: usize = 8;

    #[derive(Default)]
    struct RecordingHost {
        source: Option<Vec<u8>>,
        reads: Vec<PathBuf>,
        writes: Vec<(PathBuf, Vec<u8>)>,
        freed: usize,
    }

    impl Host for RecordingHost {
        fn read_entire_file(&mut self, path: &Path) -> Result<FileContents, FileError> {
            self.reads.push(path.to_path_buf());
            self.source
                .clone()
                .map(FileContents::new)
                .ok_or_else(|| FileError::NotFound(path.to_path_buf()))
        }

        fn write_entire_file(&mut self, path: &Path, bytes: &[u8]) -> Result<(), FileError> {
            self.writes.push((path.to_path_buf(), bytes.to_vec()));
            Ok(())
        }

        fn free_file_memory(&mut self, contents: FileContents) {
            self.freed += 1;
            drop(contents);
        }
    }

    fn frame(memory: &mut Memory<GameMemory>, input: &Input, host: &mut dyn Host) -> Vec<u8> {
        let mut pixels = vec![0; WIDTH * HEIGHT * 4];
        update_and_render(Platform {
            memory,
            input,
            buffer: PixelBuffer::new(&mut pixels, WIDTH, HEIGHT, WIDTH * 4).unwrap(),
            host,
            delta: 1.0 / 30.0,
        });
        pixels
    }

    fn run_frames(memory: &mut Memory<GameMemory>, input: &Input, frames: usize) {
        for _ in 0..frames {
            frame(memory, input, &mut NullHost);
        }
    }

    fn initialized() -> Memory<GameMemory> {
        let mut memory = Memory::new();
        frame(&mut memory, &Input::default(), &mut NullHost);
        memory
    }

    fn keyboard(setup: impl FnOnce(&mut ControllerInput)) -> Input {
        let mut input = Input::default();
        setup(input.keyboard_mut());
        input
    }

    #[test]
    fn first_frame_sets_defaults() {
        let memory = initialized();
        assert!(memory.is_initialized);
        assert_eq!(memory.permanent.state, AppState::new());
        assert_eq!(memory.permanent.state.tone_hz, 256);
    }

    #[test]
    fn reinitialization_discards_state() {
        let mut memory = initialized();
        let held = keyboard(|k| {
            k.move_right.ended_down = true;
            k.action_down.ended_down = true;
        });
        run_frames(&mut memory, &held, 5);
        memory.permanent.state.tone_hz = 999;
        let phase_before = memory.permanent.synth;

        memory.is_initialized = false;
        frame(&mut memory, &Input::default(), &mut NullHost);
        assert_eq!(memory.permanent.state, AppState::new());
        assert_eq!(memory.permanent.synth, phase_before);

        memory.is_initialized = false;
        frame(&mut memory, &Input::default(), &mut NullHost);
        assert_eq!(memory.permanent.state, AppState::new());
    }

    #[test]
    fn move_right_and_left_step_blue_offset() {
        let mut memory = initialized();
        run_frames(&mut memory, &keyboard(|k| k.move_right.ended_down = true), 7);
        assert_eq!(memory.permanent.state.blue_offset, 7);

        run_frames(&mut memory, &keyboard(|k| k.move_left.ended_down = true), 10);
        assert_eq!(memory.permanent.state.blue_offset, -3);

        let both = keyboard(|k| {
            k.move_left.ended_down = true;
            k.move_right.ended_down = true;
        });
        run_frames(&mut memory, &both, 4);
        assert_eq!(memory.permanent.state.blue_offset, -3);
    }

    #[test]
    fn action_steps_green_offset() {
        let mut memory = initialized();
        run_frames(&mut memory, &keyboard(|k| k.action_down.ended_down = true), 12);
        assert_eq!(memory.permanent.state.green_offset, 12);
        assert_eq!(memory.permanent.state.blue_offset, 0);
    }

    #[test]
    fn every_controller_slot_contributes() {
        let mut memory = initialized();
        let mut input = Input::default();
        for controller in input.controllers.iter_mut() {
            controller.move_right.ended_down = true;
        }
        run_frames(&mut memory, &input, 1);
        assert_eq!(memory.permanent.state.blue_offset, MAX_CONTROLLERS as i32);
    }

    #[test]
    fn analog_stick_scrolls_and_bends_tone() {
        let mut memory = initialized();
        let mut input = Input::default();
        let pad = input.controller_mut(1);
        pad.is_analog = true;
        pad.stick_average_x = 1.0;
        pad.stick_average_y = 0.5;
        // digital buttons on an analog pad are ignored for movement
        pad.move_left.ended_down = true;

        run_frames(&mut memory, &input, 1);
        assert_eq!(memory.permanent.state.blue_offset, 4);
        assert_eq!(memory.permanent.state.tone_hz, 320);

        input.controller_mut(1).stick_average_x = -0.3;
        input.controller_mut(1).stick_average_y = -3.0;
        run_frames(&mut memory, &input, 1);
        assert_eq!(memory.permanent.state.blue_offset, 3);
        assert_eq!(memory.permanent.state.tone_hz, 256 - 384);
    }

    #[test]
    fn offsets_wrap_instead_of_overflowing() {
        let mut memory = initialized();
        memory.permanent.state.blue_offset = i32::MAX;
        run_frames(&mut memory, &keyboard(|k| k.move_right.ended_down = true), 1);
        assert_eq!(memory.permanent.state.blue_offset, i32::MIN);
    }

    #[test]
    fn render_follows_offsets() {
        let mut memory = initialized();
        memory.permanent.state.blue_offset = 250;
        memory.permanent.state.green_offset = -2;
        let pixels = frame(&mut memory, &Input::default(), &mut NullHost);

        for y in 0..HEIGHT {
            for x in 0..WIDTH {
                let at = (y * WIDTH + x) * 4;
                let blue = (x as i32 + 250).rem_euclid(256) as u8;
                let green = (y as i32 - 2).rem_euclid(256) as u8;
                assert_eq!(&pixels[at..at + 4], &[blue, green, 0, 0]);
            }
        }
    }

    #[test]
    fn render_is_idempotent_without_input() {
        let mut memory = initialized();
        memory.permanent.state.blue_offset = 17;
        let first = frame(&mut memory, &Input::default(), &mut NullHost);
        let second = frame(&mut memory, &Input::default(), &mut NullHost);
        assert_eq!(first, second);
    }

    #[test]
    fn sound_uses_current_tone() {
        let mut memory = initialized();
        let mut samples = vec![0; 187 * 2 * 2];
        get_sound_samples(Audio {
            memory: &mut memory,
            buffer: SoundBuffer::new(&mut samples, 48_000, 187 * 2).unwrap(),
        });
        assert!(memory.permanent.synth.phase() > 0.0);
        for pair in samples.chunks_exact(2) {
            assert_eq!(pair[0], pair[1]);
            assert!(pair[0].abs() <= TONE_VOLUME);
        }
        assert!((samples[2 * 187] as i32 - samples[0] as i32).abs() <= 2);
    }

    #[cfg(feature = "self-test")]
    #[test]
    fn self_test_echoes_source_once() {
        let mut host = RecordingHost {
            source: Some(b"fn main() {}".to_vec()),
            ..Default::default()
        };
        let mut memory = Memory::new();
        frame(&mut memory, &Input::default(), &mut host);
        frame(&mut memory, &Input::default(), &mut host);

        assert_eq!(host.reads, vec![PathBuf::from(file!())]);
        assert_eq!(
            host.writes,
            vec![(PathBuf::from(SELF_TEST_OUTPUT), b"fn main() {}".to_vec())]
        );
        assert_eq!(host.freed, 1);
    }

    #[cfg(feature = "self-test")]
    #[test]
    fn self_test_read_failure_is_ignored() {
        let mut host = RecordingHost::default();
        let mut memory = Memory::new();
        frame(&mut memory, &Input::default(), &mut host);

        assert_eq!(host.reads.len(), 1);
        assert!(host.writes.is_empty());
        assert_eq!(host.freed, 0);
        assert!(memory.is_initialized);
        assert_eq!(memory.permanent.state, AppState::new());
    }
}
