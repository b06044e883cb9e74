use arrayvec::ArrayVec;
use byte::{ctx::Bytes, BytesExt, TryRead, TryWrite};

use super::PanDescriptor;
use crate::consts::MAX_BEACON_PAYLOAD_LENGTH;

/// The MLME-BEACON-NOTIFY.indication primitive is used to send parameters contained within a beacon
/// frame received by the MAC sublayer to the next higher layer when either macAutoRequest is set to FALSE
/// or when the beacon frame contains one or more octets of payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeaconNotifyIndication {
    /// The beacon sequence number.
    pub bsn: u8,
    /// The PAN descriptor for the received beacon.
    pub pan_descriptor: PanDescriptor,
    /// The beacon payload to be transferred from the MAC sublayer entity to the next higher layer.
    pub sdu: ArrayVec<u8, MAX_BEACON_PAYLOAD_LENGTH>,
}

impl TryRead<'_> for BeaconNotifyIndication {
    fn try_read(bytes: &[u8], _ctx: ()) -> byte::Result<(Self, usize)> {
        let offset = &mut 0;
        let bsn = bytes.read(offset)?;
        let pan_descriptor = bytes.read(offset)?;
        let sdu_length: u8 = bytes.read(offset)?;
        let sdu: &[u8] = bytes.read_with(offset, Bytes::Len(sdu_length as usize))?;
        let indication = Self {
            bsn,
            pan_descriptor,
            sdu: ArrayVec::try_from(sdu).map_err(|_| byte::Error::BadInput {
                err: "Beacon payload too long",
            })?,
        };
        Ok((indication, *offset))
    }
}

impl TryWrite for BeaconNotifyIndication {
    fn try_write(self, bytes: &mut [u8], _ctx: ()) -> byte::Result<usize> {
        let offset = &mut 0;
        bytes.write(offset, self.bsn)?;
        bytes.write(offset, self.pan_descriptor)?;
        bytes.write(offset, self.sdu.len() as u8)?;
        bytes.write(offset, self.sdu.as_slice())?;
        Ok(*offset)
    }
}
