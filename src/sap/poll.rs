use byte::{BytesExt, TryRead, TryWrite};

use super::{check_exact_len, read_address, write_address, Status, ADDRESS_LEN};
use crate::wire::Address;

/// The MLME-POLL.request primitive prompts the device to request data from the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollRequest {
    /// The address of the coordinator to which the poll is intended.
    pub coord_address: Option<Address>,
}

impl TryRead<'_> for PollRequest {
    fn try_read(bytes: &[u8], _ctx: ()) -> byte::Result<(Self, usize)> {
        check_exact_len(bytes, ADDRESS_LEN)?;
        let offset = &mut 0;
        let request = Self {
            coord_address: read_address(bytes, offset)?,
        };
        Ok((request, *offset))
    }
}

impl TryWrite for PollRequest {
    fn try_write(self, bytes: &mut [u8], _ctx: ()) -> byte::Result<usize> {
        let offset = &mut 0;
        write_address(bytes, offset, self.coord_address)?;
        Ok(*offset)
    }
}

/// The MLME-POLL.confirm primitive reports the results of a request to poll the coordinator for data.
///
/// SUCCESS means data was extracted, NO_DATA that the coordinator had nothing pending
/// or the frame never arrived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfirm {
    pub status: Status,
}

impl TryRead<'_> for PollConfirm {
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

impl TryWrite for PollConfirm {
    fn try_write(self, bytes: &mut [u8], _ctx: ()) -> byte::Result<usize> {
        bytes.write(&mut 0, self.status)?;
        Ok(1)
    }
}

/// Issued on the polling device when a poll extracted a data frame from the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollIndication {
    /// Source of the extracted frame.
    pub src_address: Option<Address>,
    /// Length of the extracted MSDU.
    pub data_length: u8,
}

impl TryRead<'_> for PollIndication {
    fn try_read(bytes: &[u8], _ctx: ()) -> byte::Result<(Self, usize)> {
        check_exact_len(bytes, ADDRESS_LEN + 1)?;
        let offset = &mut 0;
        let indication = Self {
            src_address: read_address(bytes, offset)?,
            data_length: bytes.read(offset)?,
        };
        Ok((indication, *offset))
    }
}

impl TryWrite for PollIndication {
    fn try_write(self, bytes: &mut [u8], _ctx: ()) -> byte::Result<usize> {
        let offset = &mut 0;
        write_address(bytes, offset, self.src_address)?;
        bytes.write(offset, self.data_length)?;
        Ok(*offset)
    }
}
