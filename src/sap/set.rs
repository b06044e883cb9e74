use byte::{ctx::Bytes, BytesExt, TryRead, TryWrite};

use super::{check_exact_len, Status};
use crate::pib::{PibBytes, PibValue};

/// The MLME-SET.request primitive attempts to write the given value to the indicated MAC PIB attribute.
///
/// The value is kept as the raw bytes from the host; the MLME decodes them once it knows the attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetRequest {
    pub pib_attribute: u8,
    pub pib_attribute_value: PibBytes,
}

impl From<PibValue> for SetRequest {
    fn from(value: PibValue) -> Self {
        Self {
            pib_attribute: value.attribute().into(),
            pib_attribute_value: value.encode(),
        }
    }
}

impl TryRead<'_> for SetRequest {
    fn try_read(bytes: &[u8], _ctx: ()) -> byte::Result<(Self, usize)> {
        let offset = &mut 0;
        let pib_attribute = bytes.read(offset)?;
        let value: &[u8] = bytes.read_with(offset, Bytes::Len(bytes.len() - *offset))?;
        let request = Self {
            pib_attribute,
            pib_attribute_value: PibBytes::try_from(value).map_err(|_| byte::Error::BadInput {
                err: "Attribute value too long",
            })?,
        };
        Ok((request, *offset))
    }
}

impl TryWrite for SetRequest {
    fn try_write(self, bytes: &mut [u8], _ctx: ()) -> byte::Result<usize> {
        let offset = &mut 0;
        bytes.write(offset, self.pib_attribute)?;
        bytes.write(offset, self.pib_attribute_value.as_slice())?;
        Ok(*offset)
    }
}

/// The MLME-SET.confirm primitive reports the results of an attempt to write a value to a PIB attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetConfirm {
    pub status: Status,
    pub pib_attribute: u8,
}

impl TryRead<'_> for SetConfirm {
    fn try_read(bytes: &[u8], _ctx: ()) -> byte::Result<(Self, usize)> {
        check_exact_len(bytes, 2)?;
        let offset = &mut 0;
        let confirm = Self {
            status: bytes.read(offset)?,
            pib_attribute: bytes.read(offset)?,
        };
        Ok((confirm, *offset))
    }
}

impl TryWrite for SetConfirm {
    fn try_write(self, bytes: &mut [u8], _ctx: ()) -> byte::Result<usize> {
        let offset = &mut 0;
        bytes.write(offset, self.status)?;
        bytes.write(offset, self.pib_attribute)?;
        Ok(*offset)
    }
}
