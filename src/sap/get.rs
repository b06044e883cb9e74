use byte::{ctx::Bytes, BytesExt, TryRead, TryWrite};

use super::{check_exact_len, Status};
use crate::pib::{PibAttribute, PibBytes, PibValue};

/// The MLME-GET.request primitive requests information about a given PIB attribute.
///
/// The attribute is carried as its raw identifier so that unknown identifiers still reach the MLME,
/// which answers them with UNSUPPORTED_ATTRIBUTE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetRequest {
    pub pib_attribute: u8,
}

impl From<PibAttribute> for GetRequest {
    fn from(value: PibAttribute) -> Self {
        Self {
            pib_attribute: value.into(),
        }
    }
}

impl TryRead<'_> for GetRequest {
    fn try_read(bytes: &[u8], _ctx: ()) -> byte::Result<(Self, usize)> {
        check_exact_len(bytes, 1)?;
        Ok((
            Self {
                pib_attribute: bytes.read(&mut 0)?,
            },
            1,
        ))
    }
}

impl TryWrite for GetRequest {
    fn try_write(self, bytes: &mut [u8], _ctx: ()) -> byte::Result<usize> {
        bytes.write(&mut 0, self.pib_attribute)?;
        Ok(1)
    }
}

/// The MLME-GET.confirm primitive reports the results of an information request from the PIB.
///
/// When an error code of UNSUPPORTED_ATTRIBUTE is returned, the value will be empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetConfirm {
    pub status: Status,
    pub pib_attribute: u8,
    pub value: PibBytes,
}

impl GetConfirm {
    /// The typed value, if the attribute is known and the read succeeded.
    pub fn pib_value(&self) -> Option<PibValue> {
        if !self.status.is_success() {
            return None;
        }

        let attribute = PibAttribute::try_from(self.pib_attribute).ok()?;
        PibValue::decode(attribute, &self.value).ok()
    }
}

impl TryRead<'_> for GetConfirm {
    fn try_read(bytes: &[u8], _ctx: ()) -> byte::Result<(Self, usize)> {
        let offset = &mut 0;
        let status = bytes.read(offset)?;
        let pib_attribute = bytes.read(offset)?;
        let value: &[u8] = bytes.read_with(offset, Bytes::Len(bytes.len() - *offset))?;
        let confirm = Self {
            status,
            pib_attribute,
            value: PibBytes::try_from(value).map_err(|_| byte::Error::BadInput {
                err: "Attribute value too long",
            })?,
        };
        Ok((confirm, *offset))
    }
}

impl TryWrite for GetConfirm {
    fn try_write(self, bytes: &mut [u8], _ctx: ()) -> byte::Result<usize> {
        let offset = &mut 0;
        bytes.write(offset, self.status)?;
        bytes.write(offset, self.pib_attribute)?;
        bytes.write(offset, self.value.as_slice())?;
        Ok(*offset)
    }
}
