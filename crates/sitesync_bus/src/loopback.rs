//! In-process duplex channel used to exercise the bus in tests.

use crate::error::BusResult;
use crate::{ContextBus, MessagePort};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

type FrameQueue = Arc<Mutex<VecDeque<String>>>;

/// Two paired frame queues, one per direction.
///
/// Frames are not dispatched eagerly; a host pumps each side, which
/// mirrors real transports where delivery happens on the receiving
/// context's event loop.
#[derive(Default)]
pub struct LoopbackChannel {
    to_editor: FrameQueue,
    to_canvas: FrameQueue,
}

impl LoopbackChannel {
    /// Creates a channel with both queues empty.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the editor side's outbound port. Frames posted through
    /// it land in the canvas queue.
    pub fn editor_port(&self) -> LoopbackPort {
        LoopbackPort {
            queue: Arc::clone(&self.to_canvas),
        }
    }

    /// Returns the canvas side's outbound port. Frames posted through
    /// it land in the editor queue.
    pub fn canvas_port(&self) -> LoopbackPort {
        LoopbackPort {
            queue: Arc::clone(&self.to_editor),
        }
    }

    /// Delivers every queued canvas-bound frame to `bus`, in order.
    ///
    /// Returns how many frames were delivered.
    pub fn pump_canvas(&self, bus: &ContextBus) -> BusResult<usize> {
        Self::pump(&self.to_canvas, bus)
    }

    /// Delivers every queued editor-bound frame to `bus`, in order.
    pub fn pump_editor(&self, bus: &ContextBus) -> BusResult<usize> {
        Self::pump(&self.to_editor, bus)
    }

    fn pump(queue: &FrameQueue, bus: &ContextBus) -> BusResult<usize> {
        let mut delivered = 0;
        loop {
            // Pop outside deliver so a handler can publish back
            // through the channel without deadlocking.
            let frame = queue.lock().pop_front();
            match frame {
                Some(frame) => {
                    bus.deliver(&frame)?;
                    delivered += 1;
                }
                None => return Ok(delivered),
            }
        }
    }
}

/// One direction's sending half of a [`LoopbackChannel`].
#[derive(Clone)]
pub struct LoopbackPort {
    queue: FrameQueue,
}

impl MessagePort for LoopbackPort {
    fn post(&self, frame: &str) -> BusResult<()> {
        self.queue.lock().push_back(frame.to_owned());
        Ok(())
    }
}
