#![cfg_attr(not(any(test, feature = "std")), no_std)]

//! An IEEE 802.15.4 MAC engine for a 2.4 GHz O-QPSK transceiver.
//!
//! The host talks to the MAC through CHCI messages: commands and data
//! requests go in through [`mac::Mac154::invoke_cmd_handler`] and
//! [`mac::Mac154::invoke_data_handler`], confirms and indications come out
//! through the handlers registered on the engine. The radio driver plugs in
//! with the [`radio::Radio`] trait and hands received frames over with an
//! [`rx_queue::RxQueue`].

extern crate alloc;

// This must go FIRST so that all the other modules see its macros.
mod fmt;

pub mod chci;
pub mod consts;
pub mod mac;
pub mod pib;
pub mod radio;
pub mod registry;
pub mod rx_queue;
pub mod sap;
#[cfg(feature = "test_helpers")]
pub mod test_helpers;
pub mod time;

pub use ieee802154::mac as wire;
