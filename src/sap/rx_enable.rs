use byte::{BytesExt, TryRead, TryWrite, LE};

use super::{check_exact_len, Status};

/// Open a receive window.
pub const RX_START: u8 = 0x01;
/// Close the receive window.
pub const RX_STOP: u8 = 0x02;

/// The MLME-RX-ENABLE.request primitive allows the next higher layer to request that the receiver is
/// enabled for a finite period of time.
///
/// The flags are kept raw: combinations the MLME doesn't accept are answered with INVALID_PARAMETER.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RxEnableRequest {
    /// A combination of [`RX_START`] and [`RX_STOP`]. Stop is applied before start.
    pub flags: u8,
    /// The number of symbols for which the receiver is to be enabled.
    ///
    /// If this parameter is equal to 0, the receiver is disabled.
    pub rx_on_duration: u32,
}

impl TryRead<'_> for RxEnableRequest {
    fn try_read(bytes: &[u8], _ctx: ()) -> byte::Result<(Self, usize)> {
        check_exact_len(bytes, 5)?;
        let offset = &mut 0;
        let request = Self {
            flags: bytes.read(offset)?,
            rx_on_duration: bytes.read_with(offset, LE)?,
        };
        Ok((request, *offset))
    }
}

impl TryWrite for RxEnableRequest {
    fn try_write(self, bytes: &mut [u8], _ctx: ()) -> byte::Result<usize> {
        let offset = &mut 0;
        bytes.write(offset, self.flags)?;
        bytes.write_with(offset, self.rx_on_duration, LE)?;
        Ok(*offset)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RxEnableConfirm {
    pub status: Status,
}

impl TryRead<'_> for RxEnableConfirm {
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

impl TryWrite for RxEnableConfirm {
    fn try_write(self, bytes: &mut [u8], _ctx: ()) -> byte::Result<usize> {
        bytes.write(&mut 0, self.status)?;
        Ok(1)
    }
}
