use byte::{BytesExt, TryRead, TryWrite, LE};

use super::{check_exact_len, read_bool, Status};
use crate::wire::PanId;

/// The MLME-START.request primitive is used by the PAN coordinator to initiate a new PAN or to begin using a
/// new configuration. This primitive is also used by a device already associated with an existing PAN to begin
/// using a new configuration.
///
/// Only nonbeacon-enabled PANs are supported: both orders have to be 15.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartRequest {
    /// The PAN identifier to be used by the device.
    pub pan_id: PanId,
    /// The channel number to use.
    pub channel_number: u8,
    /// The channel page to use.
    pub channel_page: u8,
    /// Indicates the frequency with which the beacon is transmitted.
    pub beacon_order: u8,
    /// The length of the active portion of the superframe, including the beacon frame.
    pub superframe_order: u8,
    /// If this value is TRUE, the device will become the PAN coordinator of a new PAN. If this value is
    /// FALSE, the device will begin using a new configuration on the PAN with which it is associated.
    pub pan_coordinator: bool,
    /// TRUE if a coordinator realignment command is to be transmitted prior to changing the superframe
    /// configuration or FALSE otherwise.
    pub coord_realignment: bool,
}

impl TryRead<'_> for StartRequest {
    fn try_read(bytes: &[u8], _ctx: ()) -> byte::Result<(Self, usize)> {
        check_exact_len(bytes, 8)?;
        let offset = &mut 0;
        let request = Self {
            pan_id: PanId(bytes.read_with(offset, LE)?),
            channel_number: bytes.read(offset)?,
            channel_page: bytes.read(offset)?,
            beacon_order: bytes.read(offset)?,
            superframe_order: bytes.read(offset)?,
            pan_coordinator: read_bool(bytes, offset)?,
            coord_realignment: read_bool(bytes, offset)?,
        };
        Ok((request, *offset))
    }
}

impl TryWrite for StartRequest {
    fn try_write(self, bytes: &mut [u8], _ctx: ()) -> byte::Result<usize> {
        let offset = &mut 0;
        bytes.write_with(offset, self.pan_id.0, LE)?;
        bytes.write(offset, self.channel_number)?;
        bytes.write(offset, self.channel_page)?;
        bytes.write(offset, self.beacon_order)?;
        bytes.write(offset, self.superframe_order)?;
        bytes.write(offset, self.pan_coordinator as u8)?;
        bytes.write(offset, self.coord_realignment as u8)?;
        Ok(*offset)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartConfirm {
    pub status: Status,
}

impl TryRead<'_> for StartConfirm {
    fn try_read(bytes: &[u8], _ctx: ()) -> byte::Result<(Self, usize)> {
        check_exact_len(bytes, 1)?;
        Ok((
            Self {
                status: bytes.read(&mut 0)?,
            },
            1,
        ))
    }
}

impl TryWrite for StartConfirm {
    fn try_write(self, bytes: &mut [u8], _ctx: ()) -> byte::Result<usize> {
        bytes.write(&mut 0, self.status)?;
        Ok(1)
    }
}
