//! Delivery of confirms, indications and received data to the host.

use alloc::vec::Vec;

use arraydeque::{ArrayDeque, Wrapping};

use crate::{
    chci::{Data, Event},
    registry::Registry,
    rx_queue::RawFrame,
    sap::data::DataIndication,
};

/// Messages the host hasn't picked up yet.
pub const HOST_OUTBOX_DEPTH: usize = 16;

/// A CHCI message on its way to the host.
///
/// Events and data indications have overlapping opcodes, so the path is part of the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostMessage {
    Event(Vec<u8>),
    Data(Vec<u8>),
}

impl HostMessage {
    pub fn bytes(&self) -> &[u8] {
        match self {
            HostMessage::Event(bytes) | HostMessage::Data(bytes) => bytes,
        }
    }
}

/// The registered handlers plus the outbox for the messages they decline.
pub struct HostLink<'a> {
    pub registry: Registry<'a>,
    outbox: ArrayDeque<HostMessage, HOST_OUTBOX_DEPTH, Wrapping>,
}

impl<'a> HostLink<'a> {
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            outbox: ArrayDeque::new(),
        }
    }

    /// Send a confirm or indication to the host.
    pub fn event(&mut self, event: impl Into<Event>) {
        let event = event.into();
        let code = event.code();

        let message = match event.encode() {
            Ok(message) => message,
            Err(e) => {
                error!("Could not encode event {:?}: {}", code, e);
                return;
            }
        };

        trace!("Event {:?} to the host", code);

        match self.registry.event(&message) {
            Some(true) => {}
            Some(false) => self.queue(HostMessage::Event(message)),
            None => warn!("No event handler, dropping {:?}", code),
        }
    }

    /// Send received data to the host.
    pub fn data_indication(&mut self, indication: DataIndication) {
        let message = match Data::Indication(indication).encode() {
            Ok(message) => message,
            Err(e) => {
                error!("Could not encode a data indication: {}", e);
                return;
            }
        };

        match self.registry.data(&message) {
            Some(true) => {}
            Some(false) => self.queue(HostMessage::Data(message)),
            None => warn!("No data handler, dropping a data indication"),
        }
    }

    pub fn raw_frame(&mut self, frame: &RawFrame) {
        self.registry.raw_frame(frame);
    }

    fn queue(&mut self, message: HostMessage) {
        if self.outbox.push_back(message).is_some() {
            warn!("Host outbox full, dropped the oldest message");
        }
    }

    pub fn take_message(&mut self) -> Option<HostMessage> {
        self.outbox.pop_front()
    }

    pub fn clear_outbox(&mut self) {
        self.outbox.clear();
    }
}

#[cfg(test)]
mod tests {
    use alloc::{rc::Rc, vec};
    use core::cell::RefCell;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::sap::{reset::ResetConfirm, Status};

    fn reset_confirm() -> ResetConfirm {
        ResetConfirm {
            status: Status::Success,
        }
    }

    #[test]
    fn unregistered_drops() {
        let mut host = HostLink::new();
        host.event(reset_confirm());
        assert_eq!(host.take_message(), None);
    }

    #[test]
    fn declined_goes_to_outbox() {
        let seen = Rc::new(RefCell::new(Vec::new()));

        let mut host = HostLink::new();
        let log = seen.clone();
        host.registry.register_event_handler(move |message: &[u8]| {
            log.borrow_mut().push(message.to_vec());
            false
        });

        host.event(reset_confirm());

        let expected = vec![0x88, 0x01, 0x00, 0x00];
        assert_eq!(seen.borrow().as_slice(), &[expected.clone()]);
        assert_eq!(host.take_message(), Some(HostMessage::Event(expected)));
        assert_eq!(host.take_message(), None);
    }

    #[test]
    fn handled_stays_out_of_outbox() {
        let mut host = HostLink::new();
        host.registry.register_event_handler(|_: &[u8]| true);

        host.event(reset_confirm());
        assert_eq!(host.take_message(), None);
    }

    #[test]
    fn outbox_drops_oldest() {
        let mut host = HostLink::new();
        host.registry.register_event_handler(|_: &[u8]| false);

        for _ in 0..HOST_OUTBOX_DEPTH {
            host.event(reset_confirm());
        }
        host.event(ResetConfirm {
            status: Status::PhyError,
        });

        let mut count = 0;
        let mut last = None;
        while let Some(message) = host.take_message() {
            count += 1;
            last = Some(message);
        }

        assert_eq!(count, HOST_OUTBOX_DEPTH);
        assert_eq!(last, Some(HostMessage::Event(vec![0x88, 0x01, 0x00, 0xFF])));
    }
}
