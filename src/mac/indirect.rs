//! Frames a coordinator holds until their destination asks for them with a data request.

use heapless::Vec;

use super::state::{FrameBuffer, FRAME_PENDING_BIT};
use crate::{
    time::Instant,
    wire::{Address, ExtendedAddress},
};

pub const INDIRECT_QUEUE_DEPTH: usize = 8;

/// What to report when the transaction is sent or expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndirectKind {
    Data { msdu_handle: u8 },
    AssociationResponse { device: ExtendedAddress },
    Disassociation { device: Address },
}

#[derive(Debug, Clone)]
pub struct IndirectTransaction {
    pub destination: Address,
    pub frame: FrameBuffer,
    pub ack_request: bool,
    pub kind: IndirectKind,
    pub expires_at: Instant,
}

pub struct IndirectQueue {
    transactions: Vec<IndirectTransaction, INDIRECT_QUEUE_DEPTH>,
}

impl IndirectQueue {
    pub const fn new() -> Self {
        Self {
            transactions: Vec::new(),
        }
    }

    /// Store a transaction. Gives it back when the queue is full.
    pub fn push(&mut self, transaction: IndirectTransaction) -> Result<(), IndirectTransaction> {
        self.transactions.push(transaction)
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn has_pending_for(&self, requester: &Address) -> bool {
        self.transactions
            .iter()
            .any(|transaction| same_device(&transaction.destination, requester))
    }

    /// Take the oldest transaction for the requester.
    ///
    /// The frame pending bit of the frame is set when more transactions for the same device remain.
    pub fn take_for(&mut self, requester: &Address) -> Option<IndirectTransaction> {
        let index = self
            .transactions
            .iter()
            .position(|transaction| same_device(&transaction.destination, requester))?;

        let mut transaction = self.transactions.remove(index);

        if self.has_pending_for(requester) {
            if let Some(frame_control) = transaction.frame.first_mut() {
                *frame_control |= FRAME_PENDING_BIT;
            }
        }

        Some(transaction)
    }

    /// Drop the data transaction with the given handle. Returns false if there was none.
    pub fn purge(&mut self, msdu_handle: u8) -> bool {
        let Some(index) = self.transactions.iter().position(|transaction| {
            transaction.kind == IndirectKind::Data { msdu_handle }
        }) else {
            return false;
        };

        self.transactions.remove(index);
        true
    }

    pub fn take_expired(&mut self, now: Instant) -> Option<IndirectTransaction> {
        let index = self
            .transactions
            .iter()
            .position(|transaction| transaction.expires_at.has_passed(now))?;

        Some(self.transactions.remove(index))
    }

    pub fn clear(&mut self) {
        self.transactions.clear();
    }
}

/// Addresses match on the device address alone; the PAN id of a data request source is often compressed away.
fn same_device(a: &Address, b: &Address) -> bool {
    match (a, b) {
        (Address::Short(_, a), Address::Short(_, b)) => a == b,
        (Address::Extended(_, a), Address::Extended(_, b)) => a == b,
        _ => false,
    }
}
