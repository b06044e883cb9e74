use byte::{BytesExt, TryRead, TryWrite, LE};

use super::{check_exact_len, read_address, write_address, Status, ADDRESS_LEN};
use crate::wire::{
    command::{AssociationStatus, CapabilityInformation},
    Address, ExtendedAddress, ShortAddress,
};

/// The MLME-ASSOCIATE.request primitive is used by a device to request an association with a coordinator.
///
/// On receipt of the MLME-ASSOCIATE.request primitive, the MLME of an unassociated device first updates
/// the appropriate PHY and MAC PIB attributes and then generates an association request command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociateRequest {
    /// The channel number on which to attempt association.
    pub channel_number: u8,
    /// The channel page on which to attempt association.
    pub channel_page: u8,
    /// - The coordinator addressing mode for this primitive and subsequent MPDU.
    /// - The identifier of the PAN with which to associate.
    /// - The address of the coordinator with which to associate.
    pub coord_address: Option<Address>,
    /// Specifies the operational capabilities of the associating device.
    pub capability_information: CapabilityInformation,
}

impl TryRead<'_> for AssociateRequest {
    fn try_read(bytes: &[u8], _ctx: ()) -> byte::Result<(Self, usize)> {
        check_exact_len(bytes, 3 + ADDRESS_LEN)?;
        let offset = &mut 0;
        let request = Self {
            channel_number: bytes.read(offset)?,
            channel_page: bytes.read(offset)?,
            coord_address: read_address(bytes, offset)?,
            capability_information: capability_from_byte(bytes.read(offset)?),
        };
        Ok((request, *offset))
    }
}

impl TryWrite for AssociateRequest {
    fn try_write(self, bytes: &mut [u8], _ctx: ()) -> byte::Result<usize> {
        let offset = &mut 0;
        bytes.write(offset, self.channel_number)?;
        bytes.write(offset, self.channel_page)?;
        write_address(bytes, offset, self.coord_address)?;
        bytes.write(offset, capability_to_byte(&self.capability_information))?;
        Ok(*offset)
    }
}

/// The MLME-ASSOCIATE.indication primitive is used to indicate the reception of an association request
/// command.
///
/// When the next higher layer of a coordinator receives the MLME-ASSOCIATE.indication primitive, the
/// coordinator determines whether to accept or reject the unassociated device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociateIndication {
    /// The address of the device requesting association.
    pub device_address: ExtendedAddress,
    /// The operational capabilities of the device requesting association.
    pub capability_information: CapabilityInformation,
}

impl TryRead<'_> for AssociateIndication {
    fn try_read(bytes: &[u8], _ctx: ()) -> byte::Result<(Self, usize)> {
        check_exact_len(bytes, 9)?;
        let offset = &mut 0;
        let indication = Self {
            device_address: ExtendedAddress(bytes.read_with(offset, LE)?),
            capability_information: capability_from_byte(bytes.read(offset)?),
        };
        Ok((indication, *offset))
    }
}

impl TryWrite for AssociateIndication {
    fn try_write(self, bytes: &mut [u8], _ctx: ()) -> byte::Result<usize> {
        let offset = &mut 0;
        bytes.write_with(offset, self.device_address.0, LE)?;
        bytes.write(offset, capability_to_byte(&self.capability_information))?;
        Ok(*offset)
    }
}

/// The MLME-ASSOCIATE.response primitive is used to initiate a response to an MLME-
/// ASSOCIATE.indication primitive.
///
/// The coordinator queues an association response command for the device, which picks it up
/// with a data request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociateResponse {
    /// The address of the device requesting association.
    pub device_address: ExtendedAddress,
    /// The short device address allocated by the
    /// coordinator on successful association. This
    /// parameter is set to 0xffff if the association
    /// was unsuccessful.
    pub assoc_short_address: ShortAddress,
    /// The status of the association attempt.
    pub status: AssociationStatus,
}

impl TryRead<'_> for AssociateResponse {
    fn try_read(bytes: &[u8], _ctx: ()) -> byte::Result<(Self, usize)> {
        check_exact_len(bytes, 11)?;
        let offset = &mut 0;
        let response = Self {
            device_address: ExtendedAddress(bytes.read_with(offset, LE)?),
            assoc_short_address: ShortAddress(bytes.read_with(offset, LE)?),
            status: association_status_from_byte(bytes.read(offset)?).ok_or(
                byte::Error::BadInput {
                    err: "Unknown association status",
                },
            )?,
        };
        Ok((response, *offset))
    }
}

impl TryWrite for AssociateResponse {
    fn try_write(self, bytes: &mut [u8], _ctx: ()) -> byte::Result<usize> {
        let offset = &mut 0;
        bytes.write_with(offset, self.device_address.0, LE)?;
        bytes.write_with(offset, self.assoc_short_address.0, LE)?;
        bytes.write(offset, association_status_to_byte(&self.status))?;
        Ok(*offset)
    }
}

/// The MLME-ASSOCIATE.confirm primitive is used to inform the next higher layer of the initiating device
/// whether its request to associate was successful or unsuccessful.
///
/// If the association request was successful, then the status parameter will be set to SUCCESS. Otherwise, the
/// status parameter will be set to indicate the type of failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociateConfirm {
    /// The short device address allocated by the
    /// coordinator on successful association. This
    /// parameter is set to 0xffff if the association
    /// was unsuccessful.
    pub assoc_short_address: ShortAddress,
    pub status: Status,
}

impl TryRead<'_> for AssociateConfirm {
    fn try_read(bytes: &[u8], _ctx: ()) -> byte::Result<(Self, usize)> {
        check_exact_len(bytes, 3)?;
        let offset = &mut 0;
        let confirm = Self {
            assoc_short_address: ShortAddress(bytes.read_with(offset, LE)?),
            status: bytes.read(offset)?,
        };
        Ok((confirm, *offset))
    }
}

impl TryWrite for AssociateConfirm {
    fn try_write(self, bytes: &mut [u8], _ctx: ()) -> byte::Result<usize> {
        let offset = &mut 0;
        bytes.write_with(offset, self.assoc_short_address.0, LE)?;
        bytes.write(offset, self.status)?;
        Ok(*offset)
    }
}

const DEVICE_TYPE: u8 = 0b0000_0010;
const POWER_SOURCE: u8 = 0b0000_0100;
const RECEIVER_ON_WHEN_IDLE: u8 = 0b0000_1000;
const SECURITY_CAPABILITY: u8 = 0b0100_0000;
const ALLOCATE_ADDRESS: u8 = 0b1000_0000;

/// The capability information field as laid out in the association request command.
pub fn capability_to_byte(capability: &CapabilityInformation) -> u8 {
    let mut byte = 0;
    if capability.full_function_device {
        byte |= DEVICE_TYPE;
    }
    if capability.mains_power {
        byte |= POWER_SOURCE;
    }
    if capability.idle_receive {
        byte |= RECEIVER_ON_WHEN_IDLE;
    }
    if capability.frame_protection {
        byte |= SECURITY_CAPABILITY;
    }
    if capability.allocate_address {
        byte |= ALLOCATE_ADDRESS;
    }
    byte
}

pub fn capability_from_byte(byte: u8) -> CapabilityInformation {
    CapabilityInformation {
        full_function_device: byte & DEVICE_TYPE != 0,
        mains_power: byte & POWER_SOURCE != 0,
        idle_receive: byte & RECEIVER_ON_WHEN_IDLE != 0,
        frame_protection: byte & SECURITY_CAPABILITY != 0,
        allocate_address: byte & ALLOCATE_ADDRESS != 0,
    }
}

pub fn association_status_to_byte(status: &AssociationStatus) -> u8 {
    match status {
        AssociationStatus::Successful => 0x00,
        AssociationStatus::NetworkAtCapacity => 0x01,
        AssociationStatus::AccessDenied => 0x02,
        #[allow(unreachable_patterns)]
        _ => 0x02,
    }
}

pub fn association_status_from_byte(byte: u8) -> Option<AssociationStatus> {
    match byte {
        0x00 => Some(AssociationStatus::Successful),
        0x01 => Some(AssociationStatus::NetworkAtCapacity),
        0x02 => Some(AssociationStatus::AccessDenied),
        _ => None,
    }
}

impl From<AssociationStatus> for Status {
    fn from(value: AssociationStatus) -> Self {
        match value {
            AssociationStatus::Successful => Status::Success,
            AssociationStatus::NetworkAtCapacity => Status::PanAtCapacity,
            #[allow(unreachable_patterns)]
            _ => Status::PanAccessDenied,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::wire::PanId;

    #[test]
    fn capability_bits() {
        let capability = CapabilityInformation {
            full_function_device: true,
            mains_power: false,
            idle_receive: true,
            frame_protection: false,
            allocate_address: true,
        };
        assert_eq!(capability_to_byte(&capability), 0x8A);
        assert_eq!(capability_from_byte(0x8A), capability);
    }

    #[test]
    fn request_payload() {
        let payload = [
            0x0F, 0x00, 0x02, 0x34, 0x12, 0x00, 0x00, 0, 0, 0, 0, 0, 0, 0x80,
        ];
        let request: AssociateRequest = payload.read(&mut 0).unwrap();

        assert_eq!(request.channel_number, 15);
        assert_eq!(
            request.coord_address,
            Some(Address::Short(PanId(0x1234), ShortAddress(0)))
        );
        assert!(request.capability_information.allocate_address);
    }

    #[test]
    fn response_with_unknown_status_is_rejected() {
        let payload = [1, 2, 3, 4, 5, 6, 7, 8, 0x01, 0x00, 0x07];
        assert!(payload.read::<AssociateResponse>(&mut 0).is_err());
    }
}
