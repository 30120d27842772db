use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use framehost::platform::headless::{Frame, Headless};
use framehost::{App, Config, ControllerInput, Host, Input, Memory, StdFileHost};
use tonegrad::{GameMemory, get_sound_samples, update_and_render};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "tonegrad")]
#[command(about = "Scrolling gradient and sine tone", long_about = None)]
struct Args {
    /// Open a window instead of running headless
    #[arg(long)]
    window: bool,

    /// Frames to run headless
    #[arg(long, default_value_t = 60)]
    frames: u64,

    #[arg(long, default_value_t = 600)]
    width: usize,

    #[arg(long, default_value_t = 600)]
    height: usize,

    #[arg(long, value_name = "HZ", default_value_t = 48_000)]
    sample_rate: u32,

    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Keyboard button held for the whole run (repeatable)
    #[arg(long, value_enum)]
    hold: Vec<Button>,

    /// Horizontal stick on controller 1, makes it analog
    #[arg(long, allow_negative_numbers = true)]
    stick_x: Option<f32>,

    /// Vertical stick on controller 1, makes it analog
    #[arg(long, allow_negative_numbers = true)]
    stick_y: Option<f32>,

    /// Save the last frame as PNG
    #[arg(long, value_name = "PATH")]
    png: Option<PathBuf>,

    /// Save all audio as 16-bit stereo WAV
    #[arg(long, value_name = "PATH")]
    wav: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Button {
    Left,
    Right,
    Up,
    Down,
    Action,
}

impl Button {
    fn press(self, controller: &mut ControllerInput) {
        let button = match self {
            Button::Left => &mut controller.move_left,
            Button::Right => &mut controller.move_right,
            Button::Up => &mut controller.move_up,
            Button::Down => &mut controller.move_down,
            Button::Action => &mut controller.action_down,
        };
        button.process(true);
    }
}

impl Args {
    fn config(&self) -> Config {
        Config::default()
            .with_title("tonegrad")
            .with_size(self.width, self.height)
            .with_samples_per_second(self.sample_rate)
            .with_frames_per_second(self.fps)
    }

    fn input(&self) -> Input {
        let mut input = Input::default();
        let keyboard = input.keyboard_mut();
        keyboard.is_connected = true;
        for button in &self.hold {
            button.press(keyboard);
        }
        self.poll_stick(&mut input);
        input
    }

    /// Sticks are re-polled every frame, so the CLI values are written again
    /// after each `next_frame`.
    fn poll_stick(&self, input: &mut Input) {
        if self.stick_x.is_none() && self.stick_y.is_none() {
            return;
        }
        let pad = input.controller_mut(1);
        pad.is_connected = true;
        pad.is_analog = true;
        pad.stick_average_x = self.stick_x.unwrap_or(0.0).clamp(-1.0, 1.0);
        pad.stick_average_y = self.stick_y.unwrap_or(0.0).clamp(-1.0, 1.0);
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    if args.window {
        App::new(GameMemory::default())
            .with_config(args.config())
            .run(update_and_render, get_sound_samples)
            .context("windowed run failed")?;
        return Ok(());
    }

    run_headless(&args)
}

fn run_headless(args: &Args) -> Result<()> {
    let config = args.config();
    let mut wav = match &args.wav {
        Some(path) => {
            let spec = hound::WavSpec {
                channels: 2,
                sample_rate: config.samples_per_second,
                bits_per_sample: 16,
                sample_format: hound::SampleFormat::Int,
            };
            let writer = hound::WavWriter::create(path, spec)
                .with_context(|| format!("creating {}", path.display()))?;
            Some(writer)
        }
        None => None,
    };

    let mut headless = Headless::new(config, Memory::<GameMemory>::new(), StdFileHost::default())?;
    drive(args, &mut headless, |frame| {
        if let Some(wav) = wav.as_mut() {
            for &sample in frame.samples {
                wav.write_sample(sample)?;
            }
        }
        Ok(())
    })?;

    if let Some(wav) = wav {
        wav.finalize().context("finalizing wav")?;
    }
    if let Some(path) = &args.png
        && headless.frames_run() > 0
    {
        to_rgb(&headless.last_frame())
            .save(path)
            .with_context(|| format!("saving {}", path.display()))?;
        tracing::info!("last frame written to {}", path.display());
    }

    let state = headless.memory().permanent.state;
    tracing::info!(
        frames = headless.frames_run(),
        tone_hz = state.tone_hz,
        blue_offset = state.blue_offset,
        green_offset = state.green_offset,
        "headless run done"
    );
    Ok(())
}

/// Steps `args.frames` frames with the CLI input held throughout.
fn drive<H: Host>(
    args: &Args,
    headless: &mut Headless<GameMemory, H>,
    mut on_frame: impl FnMut(&Frame) -> Result<()>,
) -> Result<()> {
    let mut input = args.input();
    for _ in 0..args.frames {
        let frame = headless.step(&input, update_and_render, get_sound_samples)?;
        on_frame(&frame)?;
        input = input.next_frame();
        args.poll_stick(&mut input);
    }
    Ok(())
}

fn to_rgb(frame: &Frame) -> image::RgbImage {
    image::RgbImage::from_fn(frame.width as u32, frame.height as u32, |x, y| {
        let [blue, green, red, _] = frame.pixel(x as usize, y as usize).to_le_bytes();
        image::Rgb([red, green, blue])
    })
}
