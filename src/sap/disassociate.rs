use byte::{BytesExt, TryRead, TryWrite, LE};

use super::{check_exact_len, read_address, read_bool, write_address, Status, ADDRESS_LEN};
use crate::wire::{command::DisassociationReason, Address, ExtendedAddress};

/// The MLME-DISASSOCIATE.request primitive is used by an associated device to notify the coordinator of
/// its intent to leave the PAN. It is also used by the coordinator to instruct an associated device to leave the
/// PAN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisassociateRequest {
    /// The address of the device to which to send the disassociation notification command.
    pub device_address: Option<Address>,
    /// The reason for the disassociation.
    pub disassociate_reason: DisassociationReason,
    /// TRUE if the disassociation notification command is to be sent indirectly.
    pub tx_indirect: bool,
}

impl TryRead<'_> for DisassociateRequest {
    fn try_read(bytes: &[u8], _ctx: ()) -> byte::Result<(Self, usize)> {
        check_exact_len(bytes, ADDRESS_LEN + 2)?;
        let offset = &mut 0;
        let request = Self {
            device_address: read_address(bytes, offset)?,
            disassociate_reason: reason_from_byte(bytes.read(offset)?).ok_or(
                byte::Error::BadInput {
                    err: "Unknown disassociation reason",
                },
            )?,
            tx_indirect: read_bool(bytes, offset)?,
        };
        Ok((request, *offset))
    }
}

impl TryWrite for DisassociateRequest {
    fn try_write(self, bytes: &mut [u8], _ctx: ()) -> byte::Result<usize> {
        let offset = &mut 0;
        write_address(bytes, offset, self.device_address)?;
        bytes.write(offset, reason_to_byte(&self.disassociate_reason))?;
        bytes.write(offset, self.tx_indirect as u8)?;
        Ok(*offset)
    }
}

/// The MLME-DISASSOCIATE.indication primitive is used to indicate the reception of a disassociation
/// notification command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisassociateIndication {
    /// The address of the device requesting disassociation.
    pub device_address: ExtendedAddress,
    /// The reason for the disassociation.
    pub disassociate_reason: DisassociationReason,
}

impl TryRead<'_> for DisassociateIndication {
    fn try_read(bytes: &[u8], _ctx: ()) -> byte::Result<(Self, usize)> {
        check_exact_len(bytes, 9)?;
        let offset = &mut 0;
        let indication = Self {
            device_address: ExtendedAddress(bytes.read_with(offset, LE)?),
            disassociate_reason: reason_from_byte(bytes.read(offset)?).ok_or(
                byte::Error::BadInput {
                    err: "Unknown disassociation reason",
                },
            )?,
        };
        Ok((indication, *offset))
    }
}

impl TryWrite for DisassociateIndication {
    fn try_write(self, bytes: &mut [u8], _ctx: ()) -> byte::Result<usize> {
        let offset = &mut 0;
        bytes.write_with(offset, self.device_address.0, LE)?;
        bytes.write(offset, reason_to_byte(&self.disassociate_reason))?;
        Ok(*offset)
    }
}

/// The MLME-DISASSOCIATE.confirm primitive is used to send the status of the request to the next higher layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisassociateConfirm {
    pub status: Status,
    /// The address of the device that has either requested disassociation or been instructed to disassociate by
    /// its coordinator.
    pub device_address: Option<Address>,
}

impl TryRead<'_> for DisassociateConfirm {
    fn try_read(bytes: &[u8], _ctx: ()) -> byte::Result<(Self, usize)> {
        check_exact_len(bytes, 1 + ADDRESS_LEN)?;
        let offset = &mut 0;
        let confirm = Self {
            status: bytes.read(offset)?,
            device_address: read_address(bytes, offset)?,
        };
        Ok((confirm, *offset))
    }
}

impl TryWrite for DisassociateConfirm {
    fn try_write(self, bytes: &mut [u8], _ctx: ()) -> byte::Result<usize> {
        let offset = &mut 0;
        bytes.write(offset, self.status)?;
        write_address(bytes, offset, self.device_address)?;
        Ok(*offset)
    }
}

pub fn reason_to_byte(reason: &DisassociationReason) -> u8 {
    match reason {
        DisassociationReason::CoordinatorLeave => 1,
        DisassociationReason::DeviceLeave => 2,
        #[allow(unreachable_patterns)]
        _ => 2,
    }
}

pub fn reason_from_byte(byte: u8) -> Option<DisassociationReason> {
    match byte {
        1 => Some(DisassociationReason::CoordinatorLeave),
        2 => Some(DisassociationReason::DeviceLeave),
        _ => None,
    }
}
