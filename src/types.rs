use arrayvec::ArrayString;

/// Capacity of the audio description carried in [`Info`], matching the
/// native `char[80]` field.
pub const AUDIO_STRING_CAPACITY: usize = 80;

/// Block-based codecs store frames rounded up to whole macroblocks.
pub const MACROBLOCK_SIZE: u32 = 16;

/// Pixel formats delivered by the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum PixelFormat {
    /// Planar 4:2:0: a full-size Y plane followed by quarter-size V and U planes.
    Yv12,
}

/// Pixel dimensions of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Size { width, height }
    }

    /// Rounds both dimensions up to the next multiple of [`MACROBLOCK_SIZE`].
    pub const fn macroblock_aligned(self) -> Self {
        Size {
            width: align_to_macroblock(self.width),
            height: align_to_macroblock(self.height),
        }
    }
}

const fn align_to_macroblock(v: u32) -> u32 {
    (v + MACROBLOCK_SIZE - 1) & !(MACROBLOCK_SIZE - 1)
}

/// Playback status of an open stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Error,
    Stopped,
    Playing,
}

impl Status {
    /// Maps the native `SMPEGstatus` value. Anything unrecognised is an error.
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            0 => Status::Stopped,
            1 => Status::Playing,
            _ => Status::Error,
        }
    }
}

/// Where decoded audio goes once a stream is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AudioOutput {
    /// The decoder opens the SDL audio device and plays audio itself.
    #[default]
    Sdl,
    /// The caller pulls PCM with `play_audio` and manages output.
    Pull,
}

impl AudioOutput {
    #[cfg_attr(not(feature = "smpeg"), allow(dead_code))]
    pub(crate) fn sdl_audio(self) -> bool {
        matches!(self, AudioOutput::Sdl)
    }
}

/// Playback volume in percent, always within `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Volume(u8);

impl Volume {
    pub const MIN: Volume = Volume(0);
    pub const MAX: Volume = Volume(100);

    /// Clamps `percent` into the supported range.
    pub fn clamped(percent: i32) -> Self {
        Volume(percent.clamp(0, 100) as u8)
    }

    pub fn percent(self) -> u8 {
        self.0
    }
}

impl From<i32> for Volume {
    fn from(percent: i32) -> Self {
        Volume::clamped(percent)
    }
}

/// Audio format description exchanged with the decoder, mirroring `SDL_AudioSpec`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AudioSpec {
    /// Samples per second.
    pub freq: i32,
    /// SDL `AUDIO_*` sample format code.
    pub format: u16,
    pub channels: u8,
    /// Buffer size in sample frames.
    pub samples: u16,
}

/// What kind of MPEG stream was opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    /// Multiplexed audio and video.
    System,
    Audio,
    Video,
    Empty,
}

/// Snapshot of stream state at the moment it was queried.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Info {
    pub has_audio: bool,
    pub has_video: bool,
    pub width: u32,
    pub height: u32,
    pub current_frame: u32,
    pub current_fps: f64,
    /// Human readable audio format, e.g. "MPEG-1 Layer 2 224kbit/s 44100Hz stereo".
    pub audio_string: ArrayString<AUDIO_STRING_CAPACITY>,
    pub audio_current_frame: u32,
    /// Byte offset of the read position.
    pub current_offset: u32,
    pub total_size: u32,
    /// Seconds.
    pub current_time: f64,
    /// Seconds.
    pub total_time: f64,
}

impl Info {
    pub fn kind(&self) -> StreamKind {
        match (self.has_audio, self.has_video) {
            (true, true) => StreamKind::System,
            (true, false) => StreamKind::Audio,
            (false, true) => StreamKind::Video,
            (false, false) => StreamKind::Empty,
        }
    }

    /// Nominal video dimensions.
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Dimensions of the decoded image buffers.
    pub fn padded_size(&self) -> Size {
        self.size().macroblock_aligned()
    }
}

/// Copies a NUL-terminated C string out of a fixed buffer, truncating at the
/// capacity and replacing invalid UTF-8.
#[cfg_attr(not(feature = "smpeg"), allow(dead_code))]
pub(crate) fn fixed_c_string<const CAP: usize>(raw: &[u8]) -> ArrayString<CAP> {
    let len = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    let text = String::from_utf8_lossy(&raw[..len]);
    let mut out = ArrayString::new();
    for ch in text.chars() {
        if out.try_push(ch).is_err() {
            break;
        }
    }
    out
}
