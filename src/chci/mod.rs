//! The CHCI framing between the host and the MAC.
//!
//! Every message is a three byte header (opcode and little-endian payload
//! length) followed by exactly that many payload bytes. Commands and data
//! requests travel from the host to the MAC, events and data indications the
//! other way.

use alloc::{vec, vec::Vec};
use core::fmt::Display;

use byte::{BytesExt, TryRead, TryWrite, LE};

mod command;
mod data;
mod event;

pub use command::Command;
pub use data::Data;
pub use event::Event;

/// Size of the header in front of every message.
pub const HEADER_LEN: usize = 3;

/// Largest payload the MAC ever produces: a scan confirm with a full list of PAN descriptors.
pub const MAX_PAYLOAD_LEN: usize = 8
    + crate::sap::scan::MAX_PAN_DESCRIPTORS * crate::sap::PAN_DESCRIPTOR_LEN;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct ChciHeader {
    pub code: u8,
    /// The exact length of the payload that follows.
    pub len: u16,
}

impl ChciHeader {
    pub fn new(code: u8, len: usize) -> Self {
        Self {
            code,
            len: len as u16,
        }
    }

    /// Split a complete message into its header and payload.
    pub fn split(message: &[u8]) -> Result<(Self, &[u8]), ChciError> {
        let header: Self = message
            .read(&mut 0)
            .map_err(|_| ChciError::LengthMismatch {
                expected: HEADER_LEN,
                actual: message.len(),
            })?;

        let payload = &message[HEADER_LEN..];
        header.check_len(payload)?;

        Ok((header, payload))
    }

    pub fn check_len(&self, payload: &[u8]) -> Result<(), ChciError> {
        if self.len as usize == payload.len() {
            Ok(())
        } else {
            Err(ChciError::LengthMismatch {
                expected: self.len as usize,
                actual: payload.len(),
            })
        }
    }
}

impl TryRead<'_> for ChciHeader {
    fn try_read(bytes: &[u8], _ctx: ()) -> byte::Result<(Self, usize)> {
        let offset = &mut 0;
        let header = Self {
            code: bytes.read(offset)?,
            len: bytes.read_with(offset, LE)?,
        };
        Ok((header, *offset))
    }
}

impl TryWrite for ChciHeader {
    fn try_write(self, bytes: &mut [u8], _ctx: ()) -> byte::Result<usize> {
        let offset = &mut 0;
        bytes.write(offset, self.code)?;
        bytes.write_with(offset, self.len, LE)?;
        Ok(*offset)
    }
}

/// Opcodes of the messages the host sends to control the MAC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[repr(u8)]
pub enum CommandCode {
    AssociateRequest = 0x01,
    AssociateResponse = 0x02,
    DisassociateRequest = 0x03,
    GetRequest = 0x04,
    OrphanResponse = 0x05,
    ResetRequest = 0x06,
    RxEnableRequest = 0x07,
    ScanRequest = 0x08,
    SetRequest = 0x09,
    StartRequest = 0x0A,
    PollRequest = 0x0B,
    PurgeRequest = 0x0C,
}

impl TryFrom<u8> for CommandCode {
    type Error = ChciError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0x01 => Self::AssociateRequest,
            0x02 => Self::AssociateResponse,
            0x03 => Self::DisassociateRequest,
            0x04 => Self::GetRequest,
            0x05 => Self::OrphanResponse,
            0x06 => Self::ResetRequest,
            0x07 => Self::RxEnableRequest,
            0x08 => Self::ScanRequest,
            0x09 => Self::SetRequest,
            0x0A => Self::StartRequest,
            0x0B => Self::PollRequest,
            0x0C => Self::PurgeRequest,
            other => return Err(ChciError::UnknownOpcode(other)),
        })
    }
}

/// Opcodes of the confirms and indications the MAC sends to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[repr(u8)]
pub enum EventCode {
    AssociateConfirm = 0x81,
    AssociateIndication = 0x82,
    DisassociateConfirm = 0x83,
    DisassociateIndication = 0x84,
    BeaconNotifyIndication = 0x85,
    GetConfirm = 0x86,
    OrphanIndication = 0x87,
    ResetConfirm = 0x88,
    RxEnableConfirm = 0x89,
    ScanConfirm = 0x8A,
    CommStatusIndication = 0x8B,
    SetConfirm = 0x8C,
    StartConfirm = 0x8D,
    PollConfirm = 0x8E,
    PurgeConfirm = 0x8F,
    DataConfirm = 0x90,
    PollIndication = 0x91,
}

impl TryFrom<u8> for EventCode {
    type Error = ChciError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0x81 => Self::AssociateConfirm,
            0x82 => Self::AssociateIndication,
            0x83 => Self::DisassociateConfirm,
            0x84 => Self::DisassociateIndication,
            0x85 => Self::BeaconNotifyIndication,
            0x86 => Self::GetConfirm,
            0x87 => Self::OrphanIndication,
            0x88 => Self::ResetConfirm,
            0x89 => Self::RxEnableConfirm,
            0x8A => Self::ScanConfirm,
            0x8B => Self::CommStatusIndication,
            0x8C => Self::SetConfirm,
            0x8D => Self::StartConfirm,
            0x8E => Self::PollConfirm,
            0x8F => Self::PurgeConfirm,
            0x90 => Self::DataConfirm,
            0x91 => Self::PollIndication,
            other => return Err(ChciError::UnknownOpcode(other)),
        })
    }
}

/// Opcodes of the data path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[repr(u8)]
pub enum DataCode {
    DataRequest = 0x01,
    DataIndication = 0x81,
}

impl TryFrom<u8> for DataCode {
    type Error = ChciError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x01 => Ok(Self::DataRequest),
            0x81 => Ok(Self::DataIndication),
            other => Err(ChciError::UnknownOpcode(other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum ChciError {
    /// The opcode isn't part of the table for this direction.
    UnknownOpcode(u8),
    /// The header doesn't describe the bytes that came with it.
    LengthMismatch { expected: usize, actual: usize },
    /// The payload of a known opcode could not be parsed or written.
    Malformed(u8),
}

impl Display for ChciError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ChciError::UnknownOpcode(code) => write!(f, "unknown opcode 0x{code:02X}"),
            ChciError::LengthMismatch { expected, actual } => {
                write!(f, "expected {expected} payload bytes, got {actual}")
            }
            ChciError::Malformed(code) => write!(f, "malformed payload for opcode 0x{code:02X}"),
        }
    }
}

impl core::error::Error for ChciError {}

/// Parse a payload that has to be consumed completely.
fn decode_payload<'a, T: TryRead<'a>>(code: u8, payload: &'a [u8]) -> Result<T, ChciError> {
    let offset = &mut 0;
    let value = payload
        .read::<T>(offset)
        .map_err(|_| ChciError::Malformed(code))?;

    if *offset != payload.len() {
        return Err(ChciError::Malformed(code));
    }

    Ok(value)
}

/// Write a header and payload into a fresh message buffer.
fn encode_message<T: TryWrite>(code: u8, payload: T) -> Result<Vec<u8>, ChciError> {
    let mut buffer = vec![0; HEADER_LEN + MAX_PAYLOAD_LEN];

    let len = payload
        .try_write(&mut buffer[HEADER_LEN..], ())
        .map_err(|_| ChciError::Malformed(code))?;
    ChciHeader::new(code, len)
        .try_write(&mut buffer[..HEADER_LEN], ())
        .map_err(|_| ChciError::Malformed(code))?;

    buffer.truncate(HEADER_LEN + len);
    Ok(buffer)
}
