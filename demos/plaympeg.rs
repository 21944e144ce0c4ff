use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, anyhow};
use clap::Parser;
use sdl2::event::{Event, WindowEvent};
use sdl2::keyboard::{Mod, Scancode};
use sdl2::pixels::PixelFormatEnum;
use sdl2::rect::Rect;
use sdl2::video::FullscreenType;

use smpeg::{AudioOutput, Frame, FrameSlot, Info, Mpeg, MpegStream, Status, StreamKind};

const SKIP_SECONDS: f32 = 5.0;

/// Play an MPEG-1 file.
#[derive(Debug, Parser)]
#[command(name = "plaympeg")]
struct Args {
    /// Play MPEG in fullscreen mode
    #[arg(long)]
    fullscreen: bool,
    /// Don't play audio stream
    #[arg(long)]
    noaudio: bool,
    /// Don't play video stream
    #[arg(long)]
    novideo: bool,
    file: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Quit,
    ToggleFullscreen,
    TogglePause,
    SkipForward,
}

fn action_for_key(scancode: Scancode, keymod: Mod) -> Option<Action> {
    match scancode {
        Scancode::Escape | Scancode::Q => Some(Action::Quit),
        Scancode::Return if keymod.intersects(Mod::LALTMOD | Mod::RALTMOD) => {
            Some(Action::ToggleFullscreen)
        }
        Scancode::Space => Some(Action::TogglePause),
        Scancode::Right => Some(Action::SkipForward),
        _ => None,
    }
}

/// Forwards transport actions to the stream. Returns false for actions that
/// are not transport controls.
fn transport<S: MpegStream>(stream: &mut S, action: Action) -> Result<bool, S::Error> {
    match action {
        Action::TogglePause => stream.pause()?,
        Action::SkipForward => stream.skip(SKIP_SECONDS)?,
        Action::Quit | Action::ToggleFullscreen => return Ok(false),
    }
    Ok(true)
}

fn print_summary(info: &Info) {
    match info.kind() {
        StreamKind::System => println!("MPEG system stream (audio/video)"),
        StreamKind::Audio => println!("MPEG audio stream"),
        StreamKind::Video => println!("MPEG video stream"),
        StreamKind::Empty => {}
    }
    if info.has_video {
        println!("Video {}x{} resolution", info.width, info.height);
    }
    if info.has_audio {
        println!("Audio {}", info.audio_string);
    }
    println!("Size: {}", info.total_size);
    println!("Total time: {:.2}s", info.total_time);
}

fn window_title(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "plaympeg".to_owned())
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let sdl = sdl2::init().map_err(|e| anyhow!(e)).context("initialising SDL")?;
    let video = sdl.video().map_err(|e| anyhow!(e)).context("initialising video")?;

    let mut use_audio = !args.noaudio;
    let mut use_video = !args.novideo;

    let _audio = if use_audio {
        match sdl.audio() {
            Ok(audio) => Some(audio),
            Err(e) => {
                log::warn!("audio unavailable: {e}");
                use_audio = false;
                None
            }
        }
    } else {
        None
    };

    let output = if use_audio {
        AudioOutput::Sdl
    } else {
        AudioOutput::Pull
    };
    let mut mpeg = Mpeg::new(&args.file, output)
        .with_context(|| format!("opening {}", args.file.display()))?;
    mpeg.enable_audio(use_audio);
    mpeg.enable_video(use_video);

    let info = mpeg.info();
    print_summary(&info);

    use_video = use_video && info.has_video;
    let video = if use_video {
        Some(video)
    } else {
        drop(video);
        None
    };

    let mut screen = match &video {
        Some(video) => {
            let mut builder = video.window(&window_title(&args.file), info.width, info.height);
            builder.position_centered().resizable();
            if args.fullscreen {
                builder.fullscreen();
            }
            let canvas = builder.build()?.into_canvas().build()?;
            Some(canvas)
        }
        None => None,
    };
    let texture_creator = screen.as_ref().map(|canvas| canvas.texture_creator());
    let mut texture = match &texture_creator {
        Some(creator) => {
            let padded = info.padded_size();
            Some(creator.create_texture_streaming(PixelFormatEnum::YV12, padded.width, padded.height)?)
        }
        None => None,
    };

    let slot = Arc::new(FrameSlot::new());
    if screen.is_some() {
        let sink = Arc::clone(&slot);
        mpeg.set_display(move |frame| {
            sink.publish(frame);
        })?;
    }

    mpeg.play()?;

    let mut events = sdl.event_pump().map_err(|e| anyhow!(e))?;
    let mut fullscreen = args.fullscreen;
    let mut last_seen = 0;
    let source_rect = Rect::new(0, 0, info.width, info.height);

    'running: loop {
        for event in events.poll_iter() {
            match event {
                Event::Quit { .. } => break 'running,
                Event::Window {
                    win_event: WindowEvent::SizeChanged(..),
                    ..
                } => {
                    if let Some(canvas) = screen.as_mut() {
                        canvas.set_viewport(None);
                    }
                }
                Event::KeyDown {
                    scancode: Some(scancode),
                    keymod,
                    ..
                } => match action_for_key(scancode, keymod) {
                    Some(Action::Quit) => break 'running,
                    Some(Action::ToggleFullscreen) => {
                        if let Some(canvas) = screen.as_mut() {
                            fullscreen = !fullscreen;
                            let mode = if fullscreen {
                                FullscreenType::True
                            } else {
                                FullscreenType::Off
                            };
                            canvas.window_mut().set_fullscreen(mode).map_err(|e| anyhow!(e))?;
                        }
                    }
                    Some(action) => {
                        transport(&mut mpeg, action)?;
                    }
                    None => {}
                },
                _ => {}
            }
        }

        if let (Some(canvas), Some(texture)) = (screen.as_mut(), texture.as_mut())
            && let Some((seen, frame)) = slot.take_latest(last_seen)
        {
            last_seen = seen;
            texture.update(None, frame.data(), frame.pitch())?;
            slot.recycle(frame);

            canvas.copy(texture, source_rect, None).map_err(|e| anyhow!(e))?;
            canvas.present();
            continue;
        }

        if screen.is_none() && mpeg.status() != Status::Playing {
            break;
        }
        thread::sleep(Duration::from_millis(1));
    }

    if let Some(e) = mpeg.error() {
        log::error!("stream error: {e}");
    }
    drop(mpeg);
    Ok(())
}
