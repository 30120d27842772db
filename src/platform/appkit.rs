use std::cell::RefCell;
use std::ffi::c_void;
use std::ptr::{NonNull, null_mut};
use std::sync::atomic::{AtomicU64, Ordering};

use objc2::rc::Retained;
use objc2::runtime::ProtocolObject;
use objc2::{AnyThread, DefinedClass, MainThreadOnly, define_class, msg_send};
use objc2_app_kit::{
    NSApplication, NSApplicationActivationPolicy, NSApplicationDelegate,
    NSApplicationTerminateReply, NSBackingStoreType, NSBitmapImageRep, NSColorSpaceName, NSEvent,
    NSImage, NSView, NSWindow, NSWindowDelegate, NSWindowStyleMask,
};
use objc2_audio_toolbox::{
    AURenderCallbackStruct, AudioComponentDescription, AudioComponentFindNext,
    AudioComponentInstance, AudioComponentInstanceNew, AudioOutputUnitStart, AudioOutputUnitStop,
    AudioUnitInitialize, AudioUnitRenderActionFlags, AudioUnitSetProperty,
    kAudioUnitManufacturer_Apple, kAudioUnitProperty_SetRenderCallback,
    kAudioUnitProperty_StreamFormat, kAudioUnitScope_Global, kAudioUnitScope_Input,
    kAudioUnitSubType_DefaultOutput, kAudioUnitType_Output,
};
use objc2_core_audio_types::{
    AudioBufferList, AudioStreamBasicDescription, AudioTimeStamp, kAudioFormatLinearPCM,
    kLinearPCMFormatFlagIsSignedInteger,
};
use objc2_foundation::{
    MainThreadMarker, NSNotification, NSObject, NSObjectProtocol, NSPoint, NSRect, NSSize,
    NSString, NSTimer,
};

use crate::debug::FrameTimer;
use crate::{
    Audio, Config, Input, KeyCode, Memory, PixelBuffer, Platform, PlatformError, SoundBuffer,
    SoundFn, StdFileHost, UpdateFn,
};

const CHANNELS: usize = SoundBuffer::CHANNELS;

pub fn run<T: 'static>(
    config: Config,
    memory: Memory<T>,
    update_and_render: UpdateFn<T>,
    get_sound_samples: SoundFn<T>,
) {
    let frame = frame_closure(&config, memory, update_and_render, get_sound_samples);
    let app = init_app(&config, frame);
    if let Err(err) = init_audio(config.samples_per_second) {
        log::error!("audio disabled: {err}");
    }
    unsafe { app.finishLaunching() };
    app.run();
}

/// One frame's worth of host-owned buffers.
struct FrameRequest<'a> {
    input: &'a Input,
    pixels: &'a mut [u8],
    samples: &'a mut [i16],
    sample_count: usize,
    delta: f32,
}

type FrameFn = Box<dyn FnMut(FrameRequest<'_>) -> Result<(), PlatformError>>;

fn frame_closure<T: 'static>(
    config: &Config,
    mut memory: Memory<T>,
    update_and_render: UpdateFn<T>,
    get_sound_samples: SoundFn<T>,
) -> FrameFn {
    let (width, height, pitch) = (config.width, config.height, config.pitch());
    let samples_per_second = config.samples_per_second;
    let mut host = StdFileHost::default();

    Box::new(move |request: FrameRequest<'_>| {
        update_and_render(Platform {
            memory: &mut memory,
            input: request.input,
            buffer: PixelBuffer::new(request.pixels, width, height, pitch)?,
            host: &mut host,
            delta: request.delta,
        });
        if request.sample_count > 0 {
            get_sound_samples(Audio {
                memory: &mut memory,
                buffer: SoundBuffer::new(request.samples, samples_per_second, request.sample_count)?,
            });
        }
        Ok(())
    })
}

#[derive(Debug, Clone)]
struct AppDelegateIvars {
    #[expect(unused)]
    window: Retained<NSWindow>,
    _timer: Retained<NSTimer>,
}

define_class!(
    #[unsafe(super = NSObject)]
    #[thread_kind = MainThreadOnly]
    #[ivars = AppDelegateIvars]
    struct Delegate;

    unsafe impl NSObjectProtocol for Delegate {}

    unsafe impl NSApplicationDelegate for Delegate {
        #[unsafe(method(applicationDidFinishLaunching:))]
        fn did_finish_launching(&self, _notification: &NSNotification) {
            log::debug!("application finished launching");
            start_audio();
            NSApplication::main(MainThreadMarker::from(self));
        }

        #[unsafe(method(applicationShouldTerminate:))]
        unsafe fn application_should_terminate(
            &self,
            _sender: &NSApplication,
        ) -> NSApplicationTerminateReply {
            stop_audio();
            NSApplicationTerminateReply::TerminateNow
        }

        #[unsafe(method(applicationShouldTerminateAfterLastWindowClosed:))]
        unsafe fn application_should_terminate_after_last_window_closed(
            &self,
            _sender: &NSApplication,
        ) -> bool {
            true
        }
    }

    unsafe impl NSWindowDelegate for Delegate {
        #[unsafe(method(windowWillClose:))]
        fn window_will_close(&self, _notification: &NSNotification) {
            unsafe { NSApplication::sharedApplication(self.mtm()).terminate(None) };
        }
    }
);

impl Delegate {
    fn new(
        mtm: MainThreadMarker,
        window: Retained<NSWindow>,
        view: &Retained<GameView>,
        frame_seconds: f64,
    ) -> Retained<Self> {
        let _timer = unsafe {
            NSTimer::scheduledTimerWithTimeInterval_target_selector_userInfo_repeats(
                frame_seconds,
                view,
                objc2::sel!(update:),
                None,
                true,
            )
        };
        let this = Self::alloc(mtm).set_ivars(AppDelegateIvars { window, _timer });
        unsafe { msg_send![super(this), init] }
    }
}

struct GameViewIvars {
    title: String,
    width: usize,
    height: usize,
    samples_per_frame: usize,
    pixels: RefCell<Vec<u8>>,
    display: RefCell<Vec<u8>>,
    samples: RefCell<Vec<i16>>,
    input: RefCell<Input>,
    frame: RefCell<FrameFn>,
    timer: RefCell<FrameTimer>,
    window: Retained<NSWindow>,
}

define_class!(
    #[unsafe(super = NSView)]
    #[thread_kind = MainThreadOnly]
    #[ivars = GameViewIvars]
    struct GameView;

    unsafe impl NSObjectProtocol for GameView {}

    impl GameView {
        #[unsafe(method(drawRect:))]
        fn draw_rect(&self, rect: NSRect) {
            let ivars = self.ivars();
            let Ok(display) = ivars.display.try_borrow() else {
                return;
            };

            let image_rep = unsafe {
                let planes: [*const u8; 1] = [display.as_ptr()];
                NSBitmapImageRep::initWithBitmapDataPlanes_pixelsWide_pixelsHigh_bitsPerSample_samplesPerPixel_hasAlpha_isPlanar_colorSpaceName_bytesPerRow_bitsPerPixel(
                    NSBitmapImageRep::alloc(),
                    planes.as_ptr() as *mut _,
                    ivars.width as isize,
                    ivars.height as isize,
                    8,
                    4,
                    true,
                    false,
                    &*NSColorSpaceName::from_str("NSCalibratedRGBColorSpace"),
                    ivars.width as isize * 4,
                    32,
                )
            };

            if let Some(image_rep) = image_rep {
                unsafe {
                    let size = NSSize::new(ivars.width as f64, ivars.height as f64);
                    let image = NSImage::initWithSize(NSImage::alloc(), size);
                    image.addRepresentation(&image_rep);
                    image.drawInRect(rect);
                }
            }
        }

        #[unsafe(method(update:))]
        fn update(&self, _timer: &NSTimer) {
            update(self, self.ivars());
        }

        #[unsafe(method(acceptsFirstResponder))]
        fn accepts_first_responder(&self) -> bool {
            true
        }

        #[unsafe(method(keyDown:))]
        fn key_down(&self, event: &NSEvent) {
            self.key_event(event, true);
        }

        #[unsafe(method(keyUp:))]
        fn key_up(&self, event: &NSEvent) {
            self.key_event(event, false);
        }
    }
);

impl GameView {
    fn new(
        mtm: MainThreadMarker,
        window: Retained<NSWindow>,
        config: &Config,
        frame: FrameFn,
    ) -> Retained<Self> {
        let mut input = Input::default();
        input.keyboard_mut().is_connected = true;

        let ivars = GameViewIvars {
            title: config.title.clone(),
            width: config.width,
            height: config.height,
            samples_per_frame: config.samples_per_frame(),
            pixels: RefCell::new(vec![0; config.pitch() * config.height]),
            display: RefCell::new(vec![255; config.width * config.height * 4]),
            samples: RefCell::new(vec![0; config.samples_per_frame() * CHANNELS]),
            input: RefCell::new(input),
            frame: RefCell::new(frame),
            timer: RefCell::new(FrameTimer::default()),
            window,
        };
        let this = Self::alloc(mtm).set_ivars(ivars);
        unsafe { msg_send![super(this), init] }
    }

    fn key_event(&self, event: &NSEvent, pressed: bool) {
        let (code, repeat) = unsafe { (key_code(event.keyCode()), event.isARepeat()) };
        if repeat {
            return;
        }
        let mut input = self.ivars().input.borrow_mut();
        if !input.keyboard_mut().process_key(code, pressed) {
            log::trace!("unmapped key {code:?}");
        }
    }
}

fn init_app(config: &Config, frame: FrameFn) -> Retained<NSApplication> {
    let mtm = MainThreadMarker::new().expect("AppKit must run on the main thread");
    let app = NSApplication::sharedApplication(mtm);

    let window = unsafe {
        NSWindow::initWithContentRect_styleMask_backing_defer(
            NSWindow::alloc(mtm),
            NSRect::new(
                NSPoint::new(0.0, 0.0),
                NSSize::new(config.width as f64, config.height as f64),
            ),
            NSWindowStyleMask::Titled
                | NSWindowStyleMask::Closable
                | NSWindowStyleMask::Miniaturizable,
            NSBackingStoreType::Buffered,
            false,
        )
    };
    unsafe { window.setReleasedWhenClosed(false) };

    window.setTitle(&NSString::from_str(&config.title));
    window.center();
    window.makeKeyAndOrderFront(None);

    let custom_view = GameView::new(mtm, window.clone(), config, frame);
    window.makeFirstResponder(Some(&custom_view));
    let delegate = Delegate::new(
        mtm,
        window.clone(),
        &custom_view,
        config.frame_seconds() as f64,
    );
    window.setContentView(Some(&*custom_view.into_super()));
    window.setDelegate(Some(ProtocolObject::from_ref(&*delegate)));
    app.setDelegate(Some(ProtocolObject::from_ref(&*delegate)));
    app.setActivationPolicy(NSApplicationActivationPolicy::Regular);
    // Required when launching unbundled (as is done with Cargo).
    #[expect(deprecated)]
    app.activateIgnoringOtherApps(true);
    app
}

fn update(view: &GameView, ivars: &GameViewIvars) {
    let delta = {
        let mut timer = ivars.timer.borrow_mut();
        let delta = timer.tick();
        let title = format!("{} - {:.2}", ivars.title, timer.fps());
        ivars.window.setTitle(&NSString::from_str(&title));
        delta
    };

    let indices = AUDIO_SAMPLES_INDICES.load(Ordering::Acquire);
    let write_index = (indices >> 32) as usize;
    let read_index = (indices & u32::MAX as u64) as usize;
    let free = if write_index >= read_index {
        read_index + AUDIO_SAMPLES_LEN - write_index - CHANNELS
    } else {
        read_index - write_index - CHANNELS
    };
    let sample_count = (free / CHANNELS).min(ivars.samples_per_frame);

    let mut input = ivars.input.borrow_mut();
    let mut pixels = ivars.pixels.borrow_mut();
    let mut samples = ivars.samples.borrow_mut();
    let mut frame = ivars.frame.borrow_mut();
    let result = frame(FrameRequest {
        input: &input,
        pixels: &mut pixels,
        samples: &mut samples,
        sample_count,
        delta,
    });
    if let Err(err) = result {
        log::error!("frame skipped: {err}");
        return;
    }
    *input = input.next_frame();

    // 0x00RRGGBB little-endian to RGBA bytes
    let mut display = ivars.display.borrow_mut();
    let row_bytes = ivars.width * 4;
    for (src_row, dst_row) in pixels
        .chunks_exact(row_bytes)
        .zip(display.chunks_exact_mut(row_bytes))
    {
        for (src, dst) in src_row.chunks_exact(4).zip(dst_row.chunks_exact_mut(4)) {
            dst.copy_from_slice(&[src[2], src[1], src[0], 255]);
        }
    }
    unsafe { view.setNeedsDisplay(true) };

    let written = sample_count * CHANNELS;
    unsafe {
        let ring = &raw mut AUDIO_SAMPLES;
        let mut index = write_index;
        for sample in &samples[..written] {
            (*ring)[index] = *sample;
            index = (index + 1) % AUDIO_SAMPLES_LEN;
        }
    }

    let _ = AUDIO_SAMPLES_INDICES.fetch_update(Ordering::Release, Ordering::Acquire, |current| {
        let current_read_index = current & u32::MAX as u64;
        let new_write_index = ((write_index + written) % AUDIO_SAMPLES_LEN) as u64;
        Some((new_write_index << 32) | current_read_index)
    });
}

fn key_code(code: u16) -> KeyCode {
    // https://gist.github.com/eegrok/949034
    match code {
        0x00 => KeyCode::KeyA,
        0x01 => KeyCode::KeyS,
        0x02 => KeyCode::KeyD,
        0x0C => KeyCode::KeyQ,
        0x0D => KeyCode::KeyW,
        0x0E => KeyCode::KeyE,
        0x24 => KeyCode::Return,
        0x31 => KeyCode::Spacebar,
        0x35 => KeyCode::Escape,
        0x7B => KeyCode::LeftArrow,
        0x7C => KeyCode::RightArrow,
        0x7D => KeyCode::DownArrow,
        0x7E => KeyCode::UpArrow,
        _ => KeyCode::Unknown,
    }
}

static mut AUDIO_UNIT: AudioComponentInstance = null_mut();

const AUDIO_SAMPLES_LEN: usize = 1 << 15;
static mut AUDIO_SAMPLES: [i16; AUDIO_SAMPLES_LEN] = [0; AUDIO_SAMPLES_LEN];
// write index is packed into top 32 bits, read index in bottom 32 bits
static AUDIO_SAMPLES_INDICES: AtomicU64 = AtomicU64::new(0);

fn start_audio() {
    unsafe {
        if !AUDIO_UNIT.is_null() {
            let result = AudioOutputUnitStart(AUDIO_UNIT);
            if result != 0 {
                log::error!("AudioOutputUnitStart failed: {result}");
            }
        }
    }
}

fn stop_audio() {
    unsafe {
        if !AUDIO_UNIT.is_null() {
            AudioOutputUnitStop(AUDIO_UNIT);
        }
    }
}

fn init_audio(samples_per_second: u32) -> Result<(), String> {
    let mut unit = null_mut();
    let desc = AudioComponentDescription {
        componentType: kAudioUnitType_Output,
        componentSubType: kAudioUnitSubType_DefaultOutput,
        componentManufacturer: kAudioUnitManufacturer_Apple,
        componentFlags: 0,
        componentFlagsMask: 0,
    };

    let stream_desc = AudioStreamBasicDescription {
        mSampleRate: samples_per_second as f64,
        mFormatID: kAudioFormatLinearPCM,
        mFormatFlags: kLinearPCMFormatFlagIsSignedInteger,
        mBytesPerPacket: 4,
        mFramesPerPacket: 1,
        mBytesPerFrame: 4,
        mChannelsPerFrame: CHANNELS as u32,
        mBitsPerChannel: 16,
        mReserved: 0,
    };
    let callback = AURenderCallbackStruct {
        inputProc: Some(audio_callback),
        inputProcRefCon: null_mut(),
    };

    unsafe {
        let component = AudioComponentFindNext(null_mut(), NonNull::from(&desc));
        if component.is_null() {
            return Err("no default output component".into());
        }
        check(
            AudioComponentInstanceNew(component, NonNull::from(&mut unit)),
            "AudioComponentInstanceNew",
        )?;
        set_property(unit, kAudioUnitProperty_StreamFormat, &stream_desc)?;
        set_property(unit, kAudioUnitProperty_SetRenderCallback, &callback)?;
        check(AudioUnitInitialize(unit), "AudioUnitInitialize")?;
        AUDIO_UNIT = unit;
    }
    log::info!("audio: {samples_per_second} Hz, {CHANNELS} channels, 16-bit");
    return Ok(());

    fn check(status: i32, what: &str) -> Result<(), String> {
        if status == 0 {
            Ok(())
        } else {
            Err(format!("{what} failed: {status}"))
        }
    }

    fn set_property<T>(unit: AudioComponentInstance, prop: u32, value: &T) -> Result<(), String> {
        let status = unsafe {
            AudioUnitSetProperty(
                unit,
                prop,
                kAudioUnitScope_Input,
                kAudioUnitScope_Global,
                value as *const _ as *const c_void,
                std::mem::size_of::<T>() as u32,
            )
        };
        check(status, "AudioUnitSetProperty")
    }
}

unsafe extern "C-unwind" fn audio_callback(
    _ref_con: NonNull<c_void>,
    _action_flags: NonNull<AudioUnitRenderActionFlags>,
    _time_stamp: NonNull<AudioTimeStamp>,
    _bus: u32,
    frames: u32,
    data: *mut AudioBufferList,
) -> i32 {
    let frames = frames as usize;
    unsafe {
        let len = (*data).mBuffers[0].mDataByteSize as usize / 2;
        let samples = (*data).mBuffers[0].mData as *mut i16;
        let data = core::slice::from_raw_parts_mut(samples, len);

        let indices = AUDIO_SAMPLES_INDICES.load(Ordering::Acquire);
        let write_index = (indices >> 32) as usize;
        let read_index = (indices & u32::MAX as u64) as usize;

        let available_samples = if write_index >= read_index {
            write_index - read_index
        } else {
            write_index + AUDIO_SAMPLES_LEN - read_index
        };
        let samples_to_read = available_samples.min(frames * CHANNELS);
        let frames_to_read = samples_to_read / CHANNELS;

        let ring = &raw const AUDIO_SAMPLES;
        let mut index = read_index;
        for frame in data.chunks_mut(CHANNELS).take(frames_to_read) {
            frame[0] = (*ring)[index];
            frame[1] = (*ring)[index + 1];
            index = (index + CHANNELS) % AUDIO_SAMPLES_LEN;
        }

        if frames_to_read < frames {
            log::warn!("audio underrun {} frames", frames - frames_to_read);
            data[frames_to_read * CHANNELS..].fill(0);
        }

        let _ = AUDIO_SAMPLES_INDICES.fetch_update(
            Ordering::Release,
            Ordering::Acquire,
            |current| {
                let current_write_index = current >> 32;
                let new_read_index = (read_index + frames_to_read * CHANNELS) % AUDIO_SAMPLES_LEN;
                Some((current_write_index << 32) | new_read_index as u64)
            },
        );
    }
    0
}
