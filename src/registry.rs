//! The three single-slot handler registrations of a MAC instance.
//!
//! Registering a handler replaces whatever was in the slot before. The
//! returned [`Registration`] can later revoke it, as long as it wasn't
//! replaced in the meantime.

use alloc::boxed::Box;

use crate::rx_queue::RawFrame;

/// Sees every received frame before the MAC processes it.
///
/// Runs in the context that calls [`tick`](crate::mac::Mac154::tick), not in
/// the radio's interrupt, but it should still be quick.
pub trait RawFrameHandler {
    fn on_raw_frame(&mut self, frame: &RawFrame);
}

impl<F: FnMut(&RawFrame)> RawFrameHandler for F {
    fn on_raw_frame(&mut self, frame: &RawFrame) {
        self(frame)
    }
}

/// Intercepts data indications. Gets the complete CHCI message.
///
/// Return true when the message was handled and must not be queued for the host.
pub trait DataHandler {
    fn on_data(&mut self, message: &[u8]) -> bool;
}

impl<F: FnMut(&[u8]) -> bool> DataHandler for F {
    fn on_data(&mut self, message: &[u8]) -> bool {
        self(message)
    }
}

/// Intercepts confirms and indications. Gets the complete CHCI message.
///
/// Return true when the message was handled and must not be queued for the host.
pub trait EventHandler {
    fn on_event(&mut self, message: &[u8]) -> bool;
}

impl<F: FnMut(&[u8]) -> bool> EventHandler for F {
    fn on_event(&mut self, message: &[u8]) -> bool {
        self(message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum HandlerKind {
    RawFrame,
    Data,
    Event,
}

/// Proof of a registration, used to revoke it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct Registration {
    kind: HandlerKind,
    generation: u32,
}

impl Registration {
    pub fn kind(&self) -> HandlerKind {
        self.kind
    }
}

struct Slot<H: ?Sized> {
    generation: u32,
    handler: Option<Box<H>>,
}

impl<H: ?Sized> Slot<H> {
    const fn new() -> Self {
        Self {
            generation: 0,
            handler: None,
        }
    }

    fn replace(&mut self, handler: Box<H>) -> u32 {
        self.generation = self.generation.wrapping_add(1);
        self.handler = Some(handler);
        self.generation
    }

    fn revoke(&mut self, generation: u32) -> bool {
        if self.handler.is_some() && self.generation == generation {
            self.handler = None;
            true
        } else {
            false
        }
    }
}

pub struct Registry<'a> {
    raw_frame: Slot<dyn RawFrameHandler + 'a>,
    data: Slot<dyn DataHandler + 'a>,
    event: Slot<dyn EventHandler + 'a>,
}

impl<'a> Registry<'a> {
    pub const fn new() -> Self {
        Self {
            raw_frame: Slot::new(),
            data: Slot::new(),
            event: Slot::new(),
        }
    }

    pub fn register_raw_frame_handler(
        &mut self,
        handler: impl RawFrameHandler + 'a,
    ) -> Registration {
        Registration {
            kind: HandlerKind::RawFrame,
            generation: self.raw_frame.replace(Box::new(handler)),
        }
    }

    pub fn register_data_handler(&mut self, handler: impl DataHandler + 'a) -> Registration {
        Registration {
            kind: HandlerKind::Data,
            generation: self.data.replace(Box::new(handler)),
        }
    }

    pub fn register_event_handler(&mut self, handler: impl EventHandler + 'a) -> Registration {
        Registration {
            kind: HandlerKind::Event,
            generation: self.event.replace(Box::new(handler)),
        }
    }

    /// Remove the handler if it is still the one the registration was made for.
    pub fn revoke(&mut self, registration: Registration) -> bool {
        match registration.kind {
            HandlerKind::RawFrame => self.raw_frame.revoke(registration.generation),
            HandlerKind::Data => self.data.revoke(registration.generation),
            HandlerKind::Event => self.event.revoke(registration.generation),
        }
    }

    pub fn is_registered(&self, kind: HandlerKind) -> bool {
        match kind {
            HandlerKind::RawFrame => self.raw_frame.handler.is_some(),
            HandlerKind::Data => self.data.handler.is_some(),
            HandlerKind::Event => self.event.handler.is_some(),
        }
    }

    /// Drop all handlers.
    pub fn clear(&mut self) {
        self.raw_frame.handler = None;
        self.data.handler = None;
        self.event.handler = None;
    }

    pub fn raw_frame(&mut self, frame: &RawFrame) {
        if let Some(handler) = self.raw_frame.handler.as_mut() {
            handler.on_raw_frame(frame);
        }
    }

    /// Returns `None` when no data handler is registered.
    pub fn data(&mut self, message: &[u8]) -> Option<bool> {
        self.data
            .handler
            .as_mut()
            .map(|handler| handler.on_data(message))
    }

    /// Returns `None` when no event handler is registered.
    pub fn event(&mut self, message: &[u8]) -> Option<bool> {
        self.event
            .handler
            .as_mut()
            .map(|handler| handler.on_event(message))
    }
}

impl Default for Registry<'_> {
    fn default() -> Self {
        Self::new()
    }
}
