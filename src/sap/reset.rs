use byte::{BytesExt, TryRead, TryWrite};

use super::{check_exact_len, read_bool, Status};

/// The MLME-RESET.request primitive is used by the next higher layer to request a reset of the MAC sublayer
/// to its initial conditions.
///
/// Running procedures are abandoned without confirms, both transmit queues are emptied and the
/// receiver is switched off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetRequest {
    /// If TRUE, the MAC sublayer is reset, and all MAC PIB attributes are set to their default values. If
    /// FALSE, the MAC sublayer is reset, but all MAC PIB attributes retain their values prior to the
    /// generation of the MLME-RESET.request primitive.
    pub set_default_pib: bool,
}

impl TryRead<'_> for ResetRequest {
    fn try_read(bytes: &[u8], _ctx: ()) -> byte::Result<(Self, usize)> {
        check_exact_len(bytes, 1)?;
        Ok((
            Self {
                set_default_pib: read_bool(bytes, &mut 0)?,
            },
            1,
        ))
    }
}

impl TryWrite for ResetRequest {
    fn try_write(self, bytes: &mut [u8], _ctx: ()) -> byte::Result<usize> {
        bytes.write(&mut 0, self.set_default_pib as u8)?;
        Ok(1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetConfirm {
    pub status: Status,
}

impl TryRead<'_> for ResetConfirm {
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

impl TryWrite for ResetConfirm {
    fn try_write(self, bytes: &mut [u8], _ctx: ()) -> byte::Result<usize> {
        bytes.write(&mut 0, self.status)?;
        Ok(1)
    }
}
