use crate::frame::Frame;
use crate::types::{Info, Status, Volume};

/// Transport and query operations on an open MPEG stream.
///
/// Transport calls return once the request has been handed to the decoder;
/// they fail only if the decoder reports a fatal stream error afterwards.
pub trait MpegStream {
    type Frame<'a>: Frame
    where
        Self: 'a;
    type Error: std::error::Error;

    fn info(&self) -> Info;
    fn status(&self) -> Status;

    fn enable_audio(&mut self, enable: bool);
    fn enable_video(&mut self, enable: bool);

    /// Sets the volume, clamped to `0..=100`, and returns what was applied.
    fn set_volume(&mut self, percent: i32) -> Volume;

    /// Registers the frame callback. It is invoked on a decoder thread for
    /// every completed video frame; the frame is only valid for the call.
    fn set_display<F>(&mut self, callback: F) -> Result<(), Self::Error>
    where
        F: FnMut(&Self::Frame<'_>) + Send + 'static;

    fn set_loop(&mut self, repeat: bool) -> Result<(), Self::Error>;
    fn play(&mut self) -> Result<(), Self::Error>;
    /// Toggles between paused and playing.
    fn pause(&mut self) -> Result<(), Self::Error>;
    fn stop(&mut self) -> Result<(), Self::Error>;
    fn rewind(&mut self) -> Result<(), Self::Error>;
    /// Seeks to a byte offset in the source.
    fn seek(&mut self, bytes: i32) -> Result<(), Self::Error>;
    fn skip(&mut self, seconds: f32) -> Result<(), Self::Error>;
    fn render_frame(&mut self, frame_number: i32) -> Result<(), Self::Error>;
    fn render_final(&mut self) -> Result<(), Self::Error>;

    /// Fills `buf` with decoded PCM and returns the number of bytes written.
    fn play_audio(&mut self, buf: &mut [u8]) -> usize;
}
