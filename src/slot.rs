use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::frame::{Frame, VideoFrame};

/// Hands the newest decoded frame from the decoder thread to a render loop.
///
/// The producer copies each frame into a recycled buffer before taking the
/// lock, so the lock is only held to swap the buffer in and bump the delivery
/// counter. Frames the consumer never took are overwritten.
#[derive(Debug, Default)]
pub struct FrameSlot {
    inner: Mutex<SlotState>,
}

#[derive(Debug, Default)]
struct SlotState {
    latest: Option<VideoFrame>,
    delivered: u64,
    spare: Option<Vec<u8>>,
}

impl FrameSlot {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SlotState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publishes a copy of `frame` and returns the new delivery count.
    pub fn publish<F: Frame + ?Sized>(&self, frame: &F) -> u64 {
        let buffer = self.lock().spare.take().unwrap_or_default();
        let mut owned = VideoFrame::with_buffer(buffer);
        owned.copy_from(frame);

        let mut state = self.lock();
        if let Some(stale) = state.latest.replace(owned)
            && state.spare.is_none()
        {
            state.spare = Some(stale.into_buffer());
        }
        state.delivered += 1;
        log::trace!("published frame {}", state.delivered);
        state.delivered
    }

    /// Number of frames published so far.
    pub fn delivered(&self) -> u64 {
        self.lock().delivered
    }

    /// Takes the newest frame if one was published after `last_seen`.
    ///
    /// Returns the delivery count the frame corresponds to; pass it back as
    /// `last_seen` on the next call.
    pub fn take_latest(&self, last_seen: u64) -> Option<(u64, VideoFrame)> {
        let mut state = self.lock();
        if state.delivered <= last_seen {
            return None;
        }
        let delivered = state.delivered;
        state.latest.take().map(|frame| (delivered, frame))
    }

    /// Returns a consumed frame's buffer so the producer can reuse it.
    pub fn recycle(&self, frame: VideoFrame) {
        let mut state = self.lock();
        if state.spare.is_none() {
            state.spare = Some(frame.into_buffer());
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;
    use crate::frame::tests::TestFrame;
    use crate::frame::yv12_len;
    use crate::types::Size;

    fn publish_filled(slot: &FrameSlot, width: u32, fill: u8) -> u64 {
        let image_size = Size::new(width, 16).macroblock_aligned();
        let data = vec![fill; yv12_len(image_size)];
        slot.publish(&TestFrame {
            size: Size::new(width, 16),
            image_size,
            data: &data,
        })
    }

    #[test]
    fn counter_increases_with_each_publish() {
        let slot = FrameSlot::new();
        assert_eq!(slot.delivered(), 0);
        assert_eq!(publish_filled(&slot, 16, 1), 1);
        assert_eq!(publish_filled(&slot, 16, 2), 2);
        assert_eq!(slot.delivered(), 2);
    }

    #[test]
    fn take_only_returns_newer_frames() {
        let slot = FrameSlot::new();
        assert!(slot.take_latest(0).is_none());

        publish_filled(&slot, 16, 1);
        publish_filled(&slot, 32, 2);

        let (seen, frame) = slot.take_latest(0).expect("frame available");
        assert_eq!(seen, 2);
        assert_eq!(frame.size().width, 32);
        assert!(frame.data().iter().all(|&b| b == 2));

        assert!(slot.take_latest(seen).is_none());
        slot.recycle(frame);

        publish_filled(&slot, 16, 3);
        let (seen, frame) = slot.take_latest(seen).expect("frame available");
        assert_eq!(seen, 3);
        assert!(frame.data().iter().all(|&b| b == 3));
    }

    #[test]
    fn recycled_buffer_is_reused() {
        let slot = FrameSlot::new();
        publish_filled(&slot, 16, 1);
        let (_, frame) = slot.take_latest(0).expect("frame available");
        let ptr = frame.data().as_ptr();
        slot.recycle(frame);

        publish_filled(&slot, 16, 2);
        let (_, frame) = slot.take_latest(1).expect("frame available");
        assert_eq!(frame.data().as_ptr(), ptr);
    }

    #[test]
    fn concurrent_reader_never_sees_torn_frame() {
        const FRAMES: u32 = 500;

        let slot = Arc::new(FrameSlot::new());
        let producer = {
            let slot = Arc::clone(&slot);
            thread::spawn(move || {
                for i in 1..=FRAMES {
                    // Width and fill byte are derived from the same index so a
                    // mixed frame shows up as a mismatch.
                    publish_filled(&slot, 16 * (1 + i % 4), (i % 251) as u8);
                }
            })
        };

        let mut last_seen = 0;
        let mut observed = 0;
        while last_seen < u64::from(FRAMES) {
            if let Some((seen, frame)) = slot.take_latest(last_seen) {
                assert!(seen > last_seen);
                let i = seen as u32;
                assert_eq!(frame.size().width, 16 * (1 + i % 4));
                assert_eq!(frame.data().len(), yv12_len(frame.image_size()));
                assert!(frame.data().iter().all(|&b| b == (i % 251) as u8));
                last_seen = seen;
                observed += 1;
                slot.recycle(frame);
            } else {
                thread::yield_now();
            }
        }

        producer.join().expect("producer panicked");
        assert!(observed >= 1);
        assert_eq!(slot.delivered(), u64::from(FRAMES));
    }
}
