use byte::{BytesExt, TryRead, TryWrite, LE};

use super::{check_exact_len, read_address, write_address, Status, ADDRESS_LEN};
use crate::wire::{Address, PanId};

/// The MLME-COMM-STATUS.indication primitive allows the MLME to indicate a communications status.
///
/// Generated at a coordinator after the transmission of an association response or coordinator
/// realignment that was started by a response primitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommStatusIndication {
    /// The identifier of the PAN of the device from which the frame was received or to which the frame was
    /// being sent.
    pub pan_id: PanId,
    pub src_address: Option<Address>,
    pub dst_address: Option<Address>,
    pub status: Status,
}

impl TryRead<'_> for CommStatusIndication {
    fn try_read(bytes: &[u8], _ctx: ()) -> byte::Result<(Self, usize)> {
        check_exact_len(bytes, 3 + 2 * ADDRESS_LEN)?;
        let offset = &mut 0;
        let indication = Self {
            pan_id: PanId(bytes.read_with(offset, LE)?),
            src_address: read_address(bytes, offset)?,
            dst_address: read_address(bytes, offset)?,
            status: bytes.read(offset)?,
        };
        Ok((indication, *offset))
    }
}

impl TryWrite for CommStatusIndication {
    fn try_write(self, bytes: &mut [u8], _ctx: ()) -> byte::Result<usize> {
        let offset = &mut 0;
        bytes.write_with(offset, self.pan_id.0, LE)?;
        write_address(bytes, offset, self.src_address)?;
        write_address(bytes, offset, self.dst_address)?;
        bytes.write(offset, self.status)?;
        Ok(*offset)
    }
}
