//! Outstanding MLME procedures.
//!
//! Every procedure class has one slot. A slot moves
//! `Idle -> Armed -> (AwaitingResponse ->) Completed` and a new request is only
//! accepted when the slot isn't busy.

use super::mlme_scan::ScanProcess;
use crate::{
    time::Instant,
    wire::Address,
};

#[derive(Debug, Default)]
pub enum Pending<C> {
    #[default]
    Idle,
    /// Started; frames are being sent or a local timer is running.
    Armed(C),
    /// Waiting for a frame from another device until the deadline.
    AwaitingResponse { context: C, deadline: Instant },
    /// The confirm went out.
    Completed,
}

impl<C> Pending<C> {
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Armed(_) | Self::AwaitingResponse { .. })
    }

    pub fn is_awaiting_response(&self) -> bool {
        matches!(self, Self::AwaitingResponse { .. })
    }

    /// Start the procedure. Gives the context back if one is already running.
    pub fn arm(&mut self, context: C) -> Result<(), C> {
        if self.is_busy() {
            return Err(context);
        }

        *self = Self::Armed(context);
        Ok(())
    }

    /// Wait for the response until the deadline. Only valid while armed.
    pub fn await_response(&mut self, deadline: Instant) {
        match core::mem::take(self) {
            Self::Armed(context) => *self = Self::AwaitingResponse { context, deadline },
            other => *self = other,
        }
    }

    /// End the procedure, handing back its context if it was running.
    pub fn complete(&mut self) -> Option<C> {
        match core::mem::replace(self, Self::Completed) {
            Self::Armed(context) | Self::AwaitingResponse { context, .. } => Some(context),
            other => {
                *self = other;
                None
            }
        }
    }

    /// End the procedure if its response deadline has passed.
    pub fn take_expired(&mut self, now: Instant) -> Option<C> {
        match self {
            Self::AwaitingResponse { deadline, .. } if deadline.has_passed(now) => self.complete(),
            _ => None,
        }
    }

    pub fn context(&self) -> Option<&C> {
        match self {
            Self::Armed(context) | Self::AwaitingResponse { context, .. } => Some(context),
            _ => None,
        }
    }

    pub fn context_mut(&mut self) -> Option<&mut C> {
        match self {
            Self::Armed(context) | Self::AwaitingResponse { context, .. } => Some(context),
            _ => None,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::Idle;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssociateProcess {
    pub coord_address: Address,
    /// Set once the association request is acknowledged: when to ask for the response.
    pub extract_at: Option<Instant>,
}

pub struct PendingTable {
    pub associate: Pending<AssociateProcess>,
    /// The device the notification is for.
    pub disassociate: Pending<Address>,
    /// The coordinator being polled.
    pub poll: Pending<Address>,
    pub scan: Pending<ScanProcess>,
    /// A start request waiting for its realignment broadcast.
    pub realignment: Pending<()>,
}

impl PendingTable {
    pub fn new() -> Self {
        Self {
            associate: Pending::Idle,
            disassociate: Pending::Idle,
            poll: Pending::Idle,
            scan: Pending::Idle,
            realignment: Pending::Idle,
        }
    }

    /// Is any procedure waiting for a frame from another device?
    pub fn expects_frames(&self) -> bool {
        self.associate.is_busy()
            || self.poll.is_awaiting_response()
            || self.scan.is_busy()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::time::Duration;

    #[test]
    fn lifecycle() {
        let mut pending = Pending::<u8>::Idle;
        assert!(!pending.is_busy());

        pending.arm(1).unwrap();
        assert_eq!(pending.arm(2), Err(2));
        assert_eq!(pending.context(), Some(&1));

        let deadline = Instant::from_symbols(100);
        pending.await_response(deadline);
        assert!(pending.is_awaiting_response());

        assert_eq!(pending.take_expired(Instant::from_symbols(deadline.symbols() - 1)), None);
        assert_eq!(pending.take_expired(deadline), Some(1));
        assert!(matches!(pending, Pending::Completed));
        assert!(!pending.is_busy());

        // A completed slot can be armed again
        pending.arm(3).unwrap();
        assert_eq!(pending.complete(), Some(3));
        assert_eq!(pending.complete(), None);
    }

    #[test]
    fn await_needs_armed() {
        let mut pending = Pending::<u8>::Idle;
        pending.await_response(Instant::from_symbols(1));
        assert!(matches!(pending, Pending::Idle));
    }
}
