use byte::{BytesExt, TryRead, TryWrite, LE};

use super::{check_exact_len, read_bool};
use crate::wire::{ExtendedAddress, ShortAddress};

/// The MLME-ORPHAN.indication primitive is generated by the MLME of a coordinator and issued to its next
/// higher layer on receipt of an orphan notification command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrphanIndication {
    /// The address of the orphaned device.
    pub orphan_address: ExtendedAddress,
}

impl TryRead<'_> for OrphanIndication {
    fn try_read(bytes: &[u8], _ctx: ()) -> byte::Result<(Self, usize)> {
        check_exact_len(bytes, 8)?;
        let indication = Self {
            orphan_address: ExtendedAddress(bytes.read_with(&mut 0, LE)?),
        };
        Ok((indication, 8))
    }
}

impl TryWrite for OrphanIndication {
    fn try_write(self, bytes: &mut [u8], _ctx: ()) -> byte::Result<usize> {
        bytes.write_with(&mut 0, self.orphan_address.0, LE)?;
        Ok(8)
    }
}

/// The MLME-ORPHAN.response primitive allows the next higher layer of a coordinator to respond to the
/// MLME-ORPHAN.indication primitive.
///
/// If `associated_member` is TRUE, the orphaned device is sent a coordinator realignment command and
/// the outcome is reported with MLME-COMM-STATUS.indication. Otherwise nothing is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrphanResponse {
    /// The address of the orphaned device.
    pub orphan_address: ExtendedAddress,
    /// The short address allocated to the orphaned device if it is associated with this coordinator.
    pub short_address: ShortAddress,
    /// TRUE if the orphaned device is associated with this coordinator or FALSE otherwise.
    pub associated_member: bool,
}

impl TryRead<'_> for OrphanResponse {
    fn try_read(bytes: &[u8], _ctx: ()) -> byte::Result<(Self, usize)> {
        check_exact_len(bytes, 11)?;
        let offset = &mut 0;
        let response = Self {
            orphan_address: ExtendedAddress(bytes.read_with(offset, LE)?),
            short_address: ShortAddress(bytes.read_with(offset, LE)?),
            associated_member: read_bool(bytes, offset)?,
        };
        Ok((response, *offset))
    }
}

impl TryWrite for OrphanResponse {
    fn try_write(self, bytes: &mut [u8], _ctx: ()) -> byte::Result<usize> {
        let offset = &mut 0;
        bytes.write_with(offset, self.orphan_address.0, LE)?;
        bytes.write_with(offset, self.short_address.0, LE)?;
        bytes.write(offset, self.associated_member as u8)?;
        Ok(*offset)
    }
}
