use byte::{BytesExt, TryRead, TryWrite};

use super::{check_exact_len, Status};

/// The MCPS-PURGE.request primitive allows the next higher layer to purge an MSDU from the transaction
/// queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurgeRequest {
    /// The handle of the MSDU to be purged from the transaction queue.
    pub msdu_handle: u8,
}

impl TryRead<'_> for PurgeRequest {
    fn try_read(bytes: &[u8], _ctx: ()) -> byte::Result<(Self, usize)> {
        check_exact_len(bytes, 1)?;
        Ok((
            Self {
                msdu_handle: bytes.read(&mut 0)?,
            },
            1,
        ))
    }
}

impl TryWrite for PurgeRequest {
    fn try_write(self, bytes: &mut [u8], _ctx: ()) -> byte::Result<usize> {
        bytes.write(&mut 0, self.msdu_handle)?;
        Ok(1)
    }
}

/// The MCPS-PURGE.confirm primitive allows the MAC sublayer to notify the next higher layer of the success
/// of its request to purge an MSDU from the transaction queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurgeConfirm {
    pub msdu_handle: u8,
    /// SUCCESS or INVALID_HANDLE
    pub status: Status,
}

impl TryRead<'_> for PurgeConfirm {
    fn try_read(bytes: &[u8], _ctx: ()) -> byte::Result<(Self, usize)> {
        check_exact_len(bytes, 2)?;
        let offset = &mut 0;
        let confirm = Self {
            msdu_handle: bytes.read(offset)?,
            status: bytes.read(offset)?,
        };
        Ok((confirm, *offset))
    }
}

impl TryWrite for PurgeConfirm {
    fn try_write(self, bytes: &mut [u8], _ctx: ()) -> byte::Result<usize> {
        let offset = &mut 0;
        bytes.write(offset, self.msdu_handle)?;
        bytes.write(offset, self.status)?;
        Ok(*offset)
    }
}
