//! Hand-over of received frames from the radio's interrupt context to the MAC.

use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, channel::Channel};
use heapless::Vec;

use crate::{consts::MAX_PHY_PACKET_SIZE, time::Instant};

/// Number of frames that can wait for the next [`tick`](crate::mac::Mac154::tick).
pub const RX_QUEUE_DEPTH: usize = 8;

/// A frame as the radio received it, without FCS.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct RawFrame {
    pub data: Vec<u8, MAX_PHY_PACKET_SIZE>,
    pub link_quality: u8,
    pub timestamp: Instant,
}

/// A bounded queue the radio driver pushes received frames into.
///
/// Safe to use from an interrupt handler. Place it in a `static` and give the
/// MAC a reference to it:
///
/// ```
/// use lr_wpan_mac154::rx_queue::RxQueue;
///
/// static RX_QUEUE: RxQueue = RxQueue::new();
/// ```
pub struct RxQueue {
    channel: Channel<CriticalSectionRawMutex, RawFrame, RX_QUEUE_DEPTH>,
}

impl RxQueue {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
        }
    }

    /// Queue a received frame.
    ///
    /// Returns false when the frame was dropped because it is too long or the queue is full.
    pub fn push(&self, data: &[u8], link_quality: u8, timestamp: Instant) -> bool {
        let Ok(data) = Vec::from_slice(data) else {
            warn!("Dropping received frame of {} bytes", data.len());
            return false;
        };

        match self.channel.try_send(RawFrame {
            data,
            link_quality,
            timestamp,
        }) {
            Ok(()) => true,
            Err(_) => {
                warn!("RX queue full, dropping frame");
                false
            }
        }
    }

    pub(crate) fn pop(&self) -> Option<RawFrame> {
        self.channel.try_receive().ok()
    }

    pub(crate) fn clear(&self) {
        while self.pop().is_some() {}
    }

    pub fn len(&self) -> usize {
        self.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }
}

impl Default for RxQueue {
    fn default() -> Self {
        Self::new()
    }
}
