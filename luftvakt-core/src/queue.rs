//! ## luftvakt-core::queue
//! **Intake queue using crossbeam's segmented queue for lock-free multi-producer handling**
//!
//! Capture sources push frames as they arrive; the analysis worker sweeps the
//! whole backlog in one non-blocking `drain`.

use crossbeam::queue::SegQueue;
use thiserror::Error;

use crate::error::CoreError;
use crate::frame::CapturedFrame;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("Frame queue capacity exceeded")]
    QueueFull,
}

pub struct FrameQueue {
    queue: SegQueue<CapturedFrame>,
    capacity: usize,
}

impl FrameQueue {
    /// Create new frame queue with fixed capacity
    pub fn with_capacity(capacity: usize) -> Result<Self, CoreError> {
        if capacity == 0 {
            return Err(CoreError::InvalidCapacity(capacity));
        }
        Ok(Self {
            queue: SegQueue::new(),
            capacity,
        })
    }

    /// Appends a frame unless the queue is at capacity.
    ///
    /// The capacity is a soft bound: the length check and the push are not
    /// one atomic step, so each concurrent producer may overshoot it by one
    /// frame.
    pub fn frame_enqueue(&self, frame: CapturedFrame) -> Result<(), QueueError> {
        if self.queue.len() >= self.capacity {
            return Err(QueueError::QueueFull);
        }
        self.queue.push(frame);
        Ok(())
    }

    /// Removes up to `max_count` frames in arrival order. Never blocks.
    pub fn drain(&self, max_count: usize) -> Vec<CapturedFrame> {
        let mut frames = Vec::with_capacity(max_count.min(self.queue.len()));
        while frames.len() < max_count {
            match self.queue.pop() {
                Some(frame) => frames.push(frame),
                None => break,
            }
        }
        frames
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::LinkType;
    use std::sync::Arc;

    fn test_frame(seq: u64) -> CapturedFrame {
        CapturedFrame::new(seq, vec![seq as u8], LinkType::Ieee80211)
    }

    #[test]
    fn rejects_zero_capacity() {
        assert!(matches!(
            FrameQueue::with_capacity(0),
            Err(CoreError::InvalidCapacity(0))
        ));
    }

    #[test]
    fn drain_preserves_arrival_order() {
        let queue = FrameQueue::with_capacity(1000).unwrap();
        for i in 0..1000 {
            queue.frame_enqueue(test_frame(i)).unwrap();
        }

        let frames = queue.drain(usize::MAX);
        assert_eq!(frames.len(), 1000);
        for (i, frame) in frames.iter().enumerate() {
            assert_eq!(frame.timestamp, i as u64);
        }
        assert!(queue.is_empty());
    }

    #[test]
    fn drain_respects_max_count() {
        let queue = FrameQueue::with_capacity(16).unwrap();
        for i in 0..5 {
            queue.frame_enqueue(test_frame(i)).unwrap();
        }
        let first = queue.drain(3);
        assert_eq!(first.len(), 3);
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.drain(10)[0].timestamp, 3);
    }

    #[test]
    fn drain_on_empty_queue_returns_nothing() {
        let queue = FrameQueue::with_capacity(4).unwrap();
        assert!(queue.drain(usize::MAX).is_empty());
    }

    #[test]
    fn signals_queue_full() {
        let queue = FrameQueue::with_capacity(2).unwrap();
        queue.frame_enqueue(test_frame(1)).unwrap();
        queue.frame_enqueue(test_frame(2)).unwrap();
        assert_eq!(
            queue.frame_enqueue(test_frame(3)),
            Err(QueueError::QueueFull)
        );
    }

    #[test]
    fn concurrent_producers() {
        let queue = Arc::new(FrameQueue::with_capacity(4096).unwrap());
        let handles: Vec<_> = (0..4)
            .map(|p| {
                let queue = Arc::clone(&queue);
                std::thread::spawn(move || {
                    for i in 0..100 {
                        queue.frame_enqueue(test_frame(p * 1000 + i)).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(queue.drain(usize::MAX).len(), 400);
    }

    #[test]
    fn racing_producers_overshoot_by_at_most_one_each() {
        const PRODUCERS: u64 = 4;
        const CAPACITY: usize = 64;
        let queue = FrameQueue::with_capacity(CAPACITY).unwrap();

        std::thread::scope(|scope| {
            for p in 0..PRODUCERS {
                let queue = &queue;
                scope.spawn(move || {
                    for i in 0..1000 {
                        let _ = queue.frame_enqueue(test_frame(p * 1000 + i));
                    }
                });
            }
        });

        assert!(queue.len() >= CAPACITY);
        assert!(queue.len() <= CAPACITY + PRODUCERS as usize - 1);
    }
}
