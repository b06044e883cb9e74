//! The MLME and MCPS service primitives exchanged with the host.
//!
//! Every primitive knows how to read and write itself as a CHCI payload
//! with [`byte::TryRead`] and [`byte::TryWrite`]. All multi-byte fields are
//! little-endian.

use byte::{BytesExt, TryRead, TryWrite, LE};

use crate::{
    time::Instant,
    wire::{beacon::SuperframeSpecification, Address, ExtendedAddress, PanId, ShortAddress},
};

pub mod associate;
pub mod beacon_notify;
pub mod comm_status;
pub mod data;
pub mod disassociate;
pub mod get;
pub mod orphan;
pub mod poll;
pub mod purge;
pub mod reset;
pub mod rx_enable;
pub mod scan;
pub mod set;
pub mod start;

/// Result codes reported in confirms and comm-status indications.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[repr(u8)]
pub enum Status {
    #[default]
    Success = 0x00,
    PanAtCapacity = 0x01,
    PanAccessDenied = 0x02,
    ChannelAccessFailure = 0xE1,
    Denied = 0xE2,
    FrameTooLong = 0xE5,
    InvalidHandle = 0xE7,
    InvalidParameter = 0xE8,
    NoAck = 0xE9,
    NoBeacon = 0xEA,
    NoData = 0xEB,
    NoShortAddress = 0xEC,
    TransactionExpired = 0xF0,
    TransactionOverflow = 0xF1,
    UnsupportedAttribute = 0xF4,
    LimitReached = 0xFA,
    ReadOnly = 0xFB,
    ScanInProgress = 0xFC,
    /// Vendor specific: a procedure of the same class is still running.
    DuplicateRequest = 0xFE,
    /// Vendor specific: the radio driver reported an error.
    PhyError = 0xFF,
}

impl Status {
    pub fn is_success(&self) -> bool {
        *self == Status::Success
    }
}

impl From<Status> for u8 {
    fn from(value: Status) -> Self {
        value as u8
    }
}

impl TryFrom<u8> for Status {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0x00 => Status::Success,
            0x01 => Status::PanAtCapacity,
            0x02 => Status::PanAccessDenied,
            0xE1 => Status::ChannelAccessFailure,
            0xE2 => Status::Denied,
            0xE5 => Status::FrameTooLong,
            0xE7 => Status::InvalidHandle,
            0xE8 => Status::InvalidParameter,
            0xE9 => Status::NoAck,
            0xEA => Status::NoBeacon,
            0xEB => Status::NoData,
            0xEC => Status::NoShortAddress,
            0xF0 => Status::TransactionExpired,
            0xF1 => Status::TransactionOverflow,
            0xF4 => Status::UnsupportedAttribute,
            0xFA => Status::LimitReached,
            0xFB => Status::ReadOnly,
            0xFC => Status::ScanInProgress,
            0xFE => Status::DuplicateRequest,
            0xFF => Status::PhyError,
            other => return Err(other),
        })
    }
}

impl TryRead<'_> for Status {
    fn try_read(bytes: &[u8], _ctx: ()) -> byte::Result<(Self, usize)> {
        let raw: u8 = bytes.read(&mut 0)?;
        let status = Status::try_from(raw).map_err(|_| byte::Error::BadInput {
            err: "Unknown status code",
        })?;
        Ok((status, 1))
    }
}

impl TryWrite for Status {
    fn try_write(self, bytes: &mut [u8], _ctx: ()) -> byte::Result<usize> {
        bytes.write(&mut 0, u8::from(self))?;
        Ok(1)
    }
}

/// The description of a PAN found during a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanDescriptor {
    /// The address of the coordinator as specified in the received beacon frame.
    pub coord_address: Address,
    /// The current channel number occupied by the network.
    pub channel_number: u8,
    /// The current channel page occupied by the network.
    pub channel_page: u8,
    /// The superframe specification as specified in the received beacon frame.
    pub super_frame_spec: SuperframeSpecification,
    /// TRUE if the beacon is from the PAN coordinator that is accepting GTS requests.
    pub gts_permit: bool,
    /// The LQI at which the network beacon was received.
    pub link_quality: u8,
    /// The time at which the beacon frame was received
    pub timestamp: Instant,
}

/// Length of a PAN descriptor on the wire.
pub const PAN_DESCRIPTOR_LEN: usize = ADDRESS_LEN + 1 + 1 + 2 + 1 + 1 + 4;

impl TryRead<'_> for PanDescriptor {
    fn try_read(bytes: &[u8], _ctx: ()) -> byte::Result<(Self, usize)> {
        let offset = &mut 0;
        let coord_address = read_address(bytes, offset)?.ok_or(byte::Error::BadInput {
            err: "PAN descriptor without coordinator address",
        })?;
        let descriptor = Self {
            coord_address,
            channel_number: bytes.read(offset)?,
            channel_page: bytes.read(offset)?,
            super_frame_spec: bytes.read(offset)?,
            gts_permit: read_bool(bytes, offset)?,
            link_quality: bytes.read(offset)?,
            timestamp: Instant::from_symbols(bytes.read_with::<u32>(offset, LE)? as u64),
        };
        Ok((descriptor, *offset))
    }
}

impl TryWrite for PanDescriptor {
    fn try_write(self, bytes: &mut [u8], _ctx: ()) -> byte::Result<usize> {
        let offset = &mut 0;
        write_address(bytes, offset, Some(self.coord_address))?;
        bytes.write(offset, self.channel_number)?;
        bytes.write(offset, self.channel_page)?;
        bytes.write(offset, self.super_frame_spec)?;
        bytes.write(offset, self.gts_permit as u8)?;
        bytes.write(offset, self.link_quality)?;
        bytes.write_with(offset, self.timestamp.timestamp(), LE)?;
        Ok(*offset)
    }
}

/// Length of an address field on the wire: mode, PAN id and a 64-bit address slot.
pub const ADDRESS_LEN: usize = 11;

pub const ADDRESS_MODE_NONE: u8 = 0;
pub const ADDRESS_MODE_SHORT: u8 = 2;
pub const ADDRESS_MODE_EXTENDED: u8 = 3;

pub(crate) fn read_address(bytes: &[u8], offset: &mut usize) -> byte::Result<Option<Address>> {
    let mode: u8 = bytes.read(offset)?;
    let pan_id = PanId(bytes.read_with::<u16>(offset, LE)?);
    let raw: u64 = bytes.read_with(offset, LE)?;

    match mode {
        ADDRESS_MODE_NONE => Ok(None),
        ADDRESS_MODE_SHORT if raw <= u16::MAX as u64 => {
            Ok(Some(Address::Short(pan_id, ShortAddress(raw as u16))))
        }
        ADDRESS_MODE_EXTENDED => Ok(Some(Address::Extended(pan_id, ExtendedAddress(raw)))),
        _ => Err(byte::Error::BadInput {
            err: "Invalid address mode",
        }),
    }
}

pub(crate) fn write_address(
    bytes: &mut [u8],
    offset: &mut usize,
    address: Option<Address>,
) -> byte::Result<()> {
    let (mode, pan_id, raw) = match address {
        None => (ADDRESS_MODE_NONE, 0, 0),
        Some(Address::Short(pan_id, short)) => (ADDRESS_MODE_SHORT, pan_id.0, short.0 as u64),
        Some(Address::Extended(pan_id, extended)) => {
            (ADDRESS_MODE_EXTENDED, pan_id.0, extended.0)
        }
    };

    bytes.write(offset, mode)?;
    bytes.write_with(offset, pan_id, LE)?;
    bytes.write_with(offset, raw, LE)?;
    Ok(())
}

pub(crate) fn read_bool(bytes: &[u8], offset: &mut usize) -> byte::Result<bool> {
    match bytes.read::<u8>(offset)? {
        0 => Ok(false),
        1 => Ok(true),
        _ => Err(byte::Error::BadInput {
            err: "Invalid boolean",
        }),
    }
}

/// Size of the fixed payload, checked before any field is read.
pub(crate) fn check_exact_len(bytes: &[u8], len: usize) -> byte::Result<()> {
    if bytes.len() == len {
        Ok(())
    } else if bytes.len() < len {
        Err(byte::Error::Incomplete)
    } else {
        Err(byte::Error::BadInput {
            err: "Trailing bytes",
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::wire::beacon::{BeaconOrder, SuperframeOrder};

    #[test]
    fn address_layout() {
        let mut buffer = [0u8; ADDRESS_LEN];
        write_address(
            &mut buffer,
            &mut 0,
            Some(Address::Short(PanId(0x1234), ShortAddress(0xABCD))),
        )
        .unwrap();

        assert_eq!(
            buffer,
            [0x02, 0x34, 0x12, 0xCD, 0xAB, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]
        );
        assert_eq!(
            read_address(&buffer, &mut 0).unwrap(),
            Some(Address::Short(PanId(0x1234), ShortAddress(0xABCD)))
        );
    }

    #[test]
    fn bad_address_mode() {
        let buffer = [0x01, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        assert!(read_address(&buffer, &mut 0).is_err());
    }

    #[test]
    fn pan_descriptor_layout() {
        let descriptor = PanDescriptor {
            coord_address: Address::Extended(PanId(0x0102), ExtendedAddress(0x1122334455667788)),
            channel_number: 15,
            channel_page: 0,
            super_frame_spec: SuperframeSpecification {
                beacon_order: BeaconOrder::OnDemand,
                superframe_order: SuperframeOrder::Inactive,
                final_cap_slot: 0,
                battery_life_extension: false,
                pan_coordinator: true,
                association_permit: true,
            },
            gts_permit: false,
            link_quality: 200,
            timestamp: Instant::from_symbols(1234),
        };

        let mut buffer = [0u8; PAN_DESCRIPTOR_LEN];
        buffer.write(&mut 0, descriptor.clone()).unwrap();

        assert_eq!(buffer[11], 15);
        assert_eq!(&buffer[13..15], &[0xFF, 0xC0]);
        assert_eq!(buffer.read::<PanDescriptor>(&mut 0).unwrap(), descriptor);
    }

    #[test]
    fn status_codes() {
        assert_eq!(u8::from(Status::NoAck), 0xE9);
        assert_eq!(Status::try_from(0xEB), Ok(Status::NoData));
        assert_eq!(Status::try_from(0x42), Err(0x42));
    }
}
