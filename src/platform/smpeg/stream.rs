use std::ffi::{CStr, CString, c_int, c_void};
use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};
#[cfg(unix)]
use std::os::fd::{AsRawFd, BorrowedFd};
use std::path::Path;
use std::ptr::{self, NonNull};
use std::sync::{Mutex, PoisonError};

use sdl2::rwops::RWops;
use sdl2::sys::SDL_AudioSpec;

use crate::error::{Error, NativeError};
use crate::platform::smpeg::frame::SmpegFrame;
use crate::platform::smpeg::sys;
use crate::stream::MpegStream;
use crate::types::{AudioOutput, AudioSpec, Info, Status, Volume, fixed_c_string};

type DisplayCallback = Box<dyn FnMut(&SmpegFrame<'_>) + Send + 'static>;

/// The callback as shared with the decoder. smpeg calls it from its decode
/// thread and from whichever thread calls `SMPEG_renderFrame`, so every
/// invocation goes through the mutex.
type SharedDisplay = Mutex<DisplayCallback>;

fn leak_display(callback: DisplayCallback) -> NonNull<SharedDisplay> {
    NonNull::from(Box::leak(Box::new(Mutex::new(callback))))
}

/// SAFETY: `display` must come from `leak_display` and no trampoline call may
/// still be running or start afterwards.
unsafe fn free_display(display: NonNull<SharedDisplay>) {
    drop(unsafe { Box::from_raw(display.as_ptr()) });
}

/// Stores `callback` in `display` unless one is already registered or the
/// decoder has failed. Nothing is leaked on the error paths.
fn claim_display(
    display: &mut Option<NonNull<SharedDisplay>>,
    failure: Option<NativeError>,
    callback: DisplayCallback,
) -> Result<NonNull<SharedDisplay>, Error> {
    if display.is_some() {
        return Err(Error::DisplayAlreadySet);
    }
    if let Some(e) = failure {
        return Err(Error::Stream(e));
    }
    Ok(*display.insert(leak_display(callback)))
}

/// Keeps alive whatever the decoder reads from.
enum Source<'src> {
    /// The decoder opened the file itself.
    Native,
    Memory { _data: Box<[u8]> },
    RWops { _src: RWops<'src> },
}

/// An open smpeg2 decoder.
///
/// Dropping it stops playback and releases the native handle, then the frame
/// callback and the source. `'src` bounds borrowed sources such as a file
/// descriptor or an `RWops` over borrowed memory.
pub struct Mpeg<'src> {
    raw: NonNull<sys::SMPEG>,
    display: Option<NonNull<SharedDisplay>>,
    _source: Source<'src>,
    _borrow: PhantomData<&'src ()>,
}

fn c_bool(value: bool) -> c_int {
    c_int::from(value)
}

unsafe extern "C" fn display_trampoline(data: *mut c_void, frame: *mut sys::SMPEG_Frame) {
    if data.is_null() || frame.is_null() {
        return;
    }
    // SAFETY: `data` is the callback leaked in `set_display`; it is freed only
    // after `SMPEG_delete` has joined the decoder threads. `frame` is valid for
    // the duration of this call.
    let display = unsafe { &*(data as *const SharedDisplay) };
    let frame = unsafe { SmpegFrame::from_raw(&*frame) };

    let mut callback = display.lock().unwrap_or_else(PoisonError::into_inner);
    if panic::catch_unwind(AssertUnwindSafe(|| (*callback)(&frame))).is_err() {
        log::warn!("display callback panicked, frame dropped");
    }
}

impl Mpeg<'static> {
    /// Opens an MPEG file by path.
    pub fn new(path: impl AsRef<Path>, audio: AudioOutput) -> Result<Self, Error> {
        let path = path.as_ref();
        let c_path =
            CString::new(path.as_os_str().as_encoded_bytes()).map_err(|_| Error::InvalidPath)?;

        log::debug!("opening {}", path.display());
        let raw = unsafe { sys::SMPEG_new(c_path.as_ptr(), ptr::null_mut(), c_bool(audio.sdl_audio())) };
        Mpeg::from_opened(raw, Source::Native)
    }

    /// Opens an MPEG stream from an in-memory buffer. The buffer is owned by
    /// the handle for as long as the decoder may read it.
    pub fn from_data(data: impl Into<Box<[u8]>>, audio: AudioOutput) -> Result<Self, Error> {
        let mut data = data.into();
        let size = c_int::try_from(data.len()).map_err(|_| Error::SourceTooLarge(data.len()))?;

        log::debug!("opening {size} byte buffer");
        let raw = unsafe {
            sys::SMPEG_new_data(
                data.as_mut_ptr().cast(),
                size,
                ptr::null_mut(),
                c_bool(audio.sdl_audio()),
            )
        };
        Mpeg::from_opened(raw, Source::Memory { _data: data })
    }
}

impl<'src> Mpeg<'src> {
    /// Opens an MPEG stream from an open file descriptor. The descriptor is
    /// read from its current position and must stay open while decoding.
    #[cfg(unix)]
    pub fn from_fd(fd: BorrowedFd<'src>, audio: AudioOutput) -> Result<Self, Error> {
        log::debug!("opening descriptor {}", fd.as_raw_fd());
        let raw = unsafe {
            sys::SMPEG_new_descr(fd.as_raw_fd(), ptr::null_mut(), c_bool(audio.sdl_audio()))
        };
        Mpeg::from_opened(raw, Source::Native)
    }

    /// Opens an MPEG stream from any SDL `RWops`. The handle keeps `src`
    /// alive and closes it after the decoder is gone.
    pub fn from_rwops(src: RWops<'src>, audio: AudioOutput) -> Result<Self, Error> {
        log::debug!("opening RWops source");
        let raw = unsafe {
            sys::SMPEG_new_rwops(src.raw(), ptr::null_mut(), 0, c_bool(audio.sdl_audio()))
        };
        Mpeg::from_opened(raw, Source::RWops { _src: src })
    }

    fn from_opened(raw: *mut sys::SMPEG, source: Source<'src>) -> Result<Self, Error> {
        let raw = NonNull::new(raw)
            .ok_or_else(|| Error::Open(NativeError::new("decoder returned no handle")))?;
        let mpeg = Mpeg {
            raw,
            display: None,
            _source: source,
            _borrow: PhantomData,
        };

        // A handle is returned even when parsing failed; dropping it here
        // releases it.
        if let Some(e) = mpeg.error() {
            return Err(Error::Open(e));
        }
        Ok(mpeg)
    }

    fn as_ptr(&self) -> *mut sys::SMPEG {
        self.raw.as_ptr()
    }

    /// The decoder's fatal error, if one has occurred.
    pub fn error(&self) -> Option<NativeError> {
        let msg = unsafe { sys::SMPEG_error(self.as_ptr()) };
        if msg.is_null() {
            return None;
        }
        let text = unsafe { CStr::from_ptr(msg) }.to_string_lossy();
        Some(NativeError::new(text))
    }

    fn check(&self) -> Result<(), Error> {
        match self.error() {
            Some(e) => Err(Error::Stream(e)),
            None => Ok(()),
        }
    }

    /// The audio format that best matches the stream, or `None` if there is
    /// no audio to play.
    pub fn wanted_spec(&self) -> Option<AudioSpec> {
        // SAFETY: all-zero is a valid SDL_AudioSpec (no callback, null userdata).
        let mut spec: SDL_AudioSpec = unsafe { std::mem::zeroed() };
        let found = unsafe { sys::SMPEG_wantedSpec(self.as_ptr(), &mut spec) };
        (found != 0).then(|| AudioSpec {
            freq: spec.freq,
            format: spec.format,
            channels: spec.channels,
            samples: spec.samples,
        })
    }

    /// Fills `buf` with decoded PCM, shaped for use inside an SDL audio
    /// callback. Unlike `play_audio` the byte count is not reported.
    pub fn play_audio_sdl(&mut self, buf: &mut [u8]) {
        if buf.is_empty() {
            return;
        }
        let len = c_int::try_from(buf.len()).unwrap_or(c_int::MAX);
        unsafe { sys::SMPEG_playAudioSDL(self.as_ptr().cast(), buf.as_mut_ptr(), len) };
    }

    /// Tells the decoder which format the audio device was actually opened with.
    pub fn actual_spec(&mut self, actual: &AudioSpec) {
        let mut spec: SDL_AudioSpec = unsafe { std::mem::zeroed() };
        spec.freq = actual.freq;
        spec.format = actual.format;
        spec.channels = actual.channels;
        spec.samples = actual.samples;
        unsafe { sys::SMPEG_actualSpec(self.as_ptr(), &mut spec) };
    }
}

impl<'src> MpegStream for Mpeg<'src> {
    type Frame<'a>
        = SmpegFrame<'a>
    where
        Self: 'a;
    type Error = Error;

    fn info(&self) -> Info {
        let mut raw = std::mem::MaybeUninit::<sys::SMPEG_Info>::zeroed();
        unsafe { sys::SMPEG_getinfo(self.as_ptr(), raw.as_mut_ptr()) };
        // SAFETY: zeroed is a valid SMPEG_Info and getinfo only fills it in.
        let raw = unsafe { raw.assume_init() };

        let audio_string = raw.audio_string.map(|c| c as u8);
        Info {
            has_audio: raw.has_audio != 0,
            has_video: raw.has_video != 0,
            width: raw.width.max(0) as u32,
            height: raw.height.max(0) as u32,
            current_frame: raw.current_frame.max(0) as u32,
            current_fps: raw.current_fps,
            audio_string: fixed_c_string(&audio_string),
            audio_current_frame: raw.audio_current_frame.max(0) as u32,
            current_offset: raw.current_offset,
            total_size: raw.total_size,
            current_time: raw.current_time,
            total_time: raw.total_time,
        }
    }

    fn status(&self) -> Status {
        Status::from_raw(unsafe { sys::SMPEG_status(self.as_ptr()) })
    }

    fn enable_audio(&mut self, enable: bool) {
        unsafe { sys::SMPEG_enableaudio(self.as_ptr(), c_bool(enable)) };
    }

    fn enable_video(&mut self, enable: bool) {
        unsafe { sys::SMPEG_enablevideo(self.as_ptr(), c_bool(enable)) };
    }

    fn set_volume(&mut self, percent: i32) -> Volume {
        let volume = Volume::clamped(percent);
        unsafe { sys::SMPEG_setvolume(self.as_ptr(), c_int::from(volume.percent())) };
        volume
    }

    fn set_display<F>(&mut self, callback: F) -> Result<(), Self::Error>
    where
        F: FnMut(&SmpegFrame<'_>) + Send + 'static,
    {
        let failure = self.error();
        let data = claim_display(&mut self.display, failure, Box::new(callback))?;

        // smpeg's SDL lock is not used; the callback mutex serialises calls.
        unsafe {
            sys::SMPEG_setdisplay(
                self.as_ptr(),
                Some(display_trampoline),
                data.as_ptr().cast(),
                ptr::null_mut(),
            )
        };
        Ok(())
    }

    fn set_loop(&mut self, repeat: bool) -> Result<(), Self::Error> {
        unsafe { sys::SMPEG_loop(self.as_ptr(), c_bool(repeat)) };
        self.check()
    }

    fn play(&mut self) -> Result<(), Self::Error> {
        unsafe { sys::SMPEG_play(self.as_ptr()) };
        self.check()
    }

    fn pause(&mut self) -> Result<(), Self::Error> {
        unsafe { sys::SMPEG_pause(self.as_ptr()) };
        self.check()
    }

    fn stop(&mut self) -> Result<(), Self::Error> {
        unsafe { sys::SMPEG_stop(self.as_ptr()) };
        self.check()
    }

    fn rewind(&mut self) -> Result<(), Self::Error> {
        unsafe { sys::SMPEG_rewind(self.as_ptr()) };
        self.check()
    }

    fn seek(&mut self, bytes: i32) -> Result<(), Self::Error> {
        unsafe { sys::SMPEG_seek(self.as_ptr(), bytes) };
        self.check()
    }

    fn skip(&mut self, seconds: f32) -> Result<(), Self::Error> {
        unsafe { sys::SMPEG_skip(self.as_ptr(), seconds) };
        self.check()
    }

    fn render_frame(&mut self, frame_number: i32) -> Result<(), Self::Error> {
        unsafe { sys::SMPEG_renderFrame(self.as_ptr(), frame_number) };
        self.check()
    }

    fn render_final(&mut self) -> Result<(), Self::Error> {
        unsafe { sys::SMPEG_renderFinal(self.as_ptr()) };
        self.check()
    }

    fn play_audio(&mut self, buf: &mut [u8]) -> usize {
        let len = c_int::try_from(buf.len()).unwrap_or(c_int::MAX);
        let written = unsafe { sys::SMPEG_playAudio(self.as_ptr(), buf.as_mut_ptr(), len) };
        written.max(0) as usize
    }
}

impl Drop for Mpeg<'_> {
    fn drop(&mut self) {
        unsafe { sys::SMPEG_delete(self.as_ptr()) };
        if let Some(display) = self.display.take() {
            // SAFETY: leaked in `set_display`; the decoder threads are gone.
            unsafe { free_display(display) };
        }
        log::debug!("decoder released");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    use super::*;
    use crate::frame::{Frame, yv12_len};
    use crate::types::Size;

    fn raw_frame(buf: &mut [u8]) -> sys::SMPEG_Frame {
        sys::SMPEG_Frame {
            w: 16,
            h: 16,
            image_width: 16,
            image_height: 16,
            image: buf.as_mut_ptr(),
        }
    }

    #[test]
    fn callback_never_runs_concurrently() {
        let busy = Arc::new(AtomicBool::new(false));
        let calls = Arc::new(AtomicUsize::new(0));
        let overlapped = Arc::new(AtomicBool::new(false));

        let display = {
            let (busy, calls, overlapped) =
                (Arc::clone(&busy), Arc::clone(&calls), Arc::clone(&overlapped));
            leak_display(Box::new(move |frame: &SmpegFrame<'_>| {
                if busy.swap(true, Ordering::SeqCst) {
                    overlapped.store(true, Ordering::SeqCst);
                }
                assert_eq!(frame.image_size(), Size::new(16, 16));
                thread::sleep(Duration::from_millis(1));
                calls.fetch_add(1, Ordering::SeqCst);
                busy.store(false, Ordering::SeqCst);
            }))
        };
        let data = display.as_ptr() as usize;

        let workers: Vec<_> = (0..2)
            .map(|_| {
                thread::spawn(move || {
                    let mut buf = vec![0u8; yv12_len(Size::new(16, 16))];
                    let mut frame = raw_frame(&mut buf);
                    for _ in 0..20 {
                        unsafe { display_trampoline(data as *mut c_void, &mut frame) };
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }
        unsafe { free_display(display) };

        assert!(!overlapped.load(Ordering::SeqCst), "callback ran on two threads at once");
        assert_eq!(calls.load(Ordering::SeqCst), 40);
    }

    #[test]
    fn panicking_callback_does_not_unwind_into_the_decoder() {
        let calls = Arc::new(AtomicUsize::new(0));
        let display = {
            let calls = Arc::clone(&calls);
            leak_display(Box::new(move |_: &SmpegFrame<'_>| {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    panic!("bad frame");
                }
            }))
        };

        let mut buf = vec![0u8; yv12_len(Size::new(16, 16))];
        let mut frame = raw_frame(&mut buf);
        unsafe {
            display_trampoline(display.as_ptr().cast(), &mut frame);
            display_trampoline(display.as_ptr().cast(), &mut frame);
        }
        unsafe { free_display(display) };

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn null_arguments_are_ignored() {
        let mut buf = vec![0u8; yv12_len(Size::new(16, 16))];
        let mut frame = raw_frame(&mut buf);
        unsafe {
            display_trampoline(ptr::null_mut(), &mut frame);
            display_trampoline(NonNull::<c_void>::dangling().as_ptr(), ptr::null_mut());
        }
    }

    #[test]
    fn failed_decoder_does_not_register_a_callback() {
        let mut display = None;
        let result = claim_display(
            &mut display,
            Some(NativeError::new("corrupt stream")),
            Box::new(|_: &SmpegFrame<'_>| {}),
        );

        match result {
            Err(Error::Stream(e)) => assert_eq!(e.message(), "corrupt stream"),
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(display.is_none());
    }

    #[test]
    fn second_callback_is_refused() {
        let mut display = None;
        let first = claim_display(&mut display, None, Box::new(|_: &SmpegFrame<'_>| {})).unwrap();
        assert_eq!(display, Some(first));

        let second = claim_display(&mut display, None, Box::new(|_: &SmpegFrame<'_>| {}));
        assert!(matches!(second, Err(Error::DisplayAlreadySet)));
        assert_eq!(display, Some(first));

        unsafe { free_display(first) };
    }
}
