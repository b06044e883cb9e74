use alloc::vec::Vec;

use super::{decode_payload, encode_message, ChciError, ChciHeader, DataCode};
use crate::sap::data::{DataIndication, DataRequest};

/// A message on the data path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Data {
    Request(DataRequest),
    Indication(DataIndication),
}

impl Data {
    pub fn code(&self) -> DataCode {
        match self {
            Data::Request(_) => DataCode::DataRequest,
            Data::Indication(_) => DataCode::DataIndication,
        }
    }

    pub fn decode(header: &ChciHeader, payload: &[u8]) -> Result<Self, ChciError> {
        header.check_len(payload)?;

        match DataCode::try_from(header.code)? {
            DataCode::DataRequest => Ok(Self::Request(decode_payload(header.code, payload)?)),
            DataCode::DataIndication => {
                Ok(Self::Indication(decode_payload(header.code, payload)?))
            }
        }
    }

    pub fn from_message(message: &[u8]) -> Result<Self, ChciError> {
        let (header, payload) = ChciHeader::split(message)?;
        Self::decode(&header, payload)
    }

    pub fn encode(self) -> Result<Vec<u8>, ChciError> {
        let code = self.code() as u8;

        match self {
            Data::Request(request) => encode_message(code, request),
            Data::Indication(indication) => encode_message(code, indication),
        }
    }
}

impl From<DataRequest> for Data {
    fn from(v: DataRequest) -> Self {
        Self::Request(v)
    }
}

impl From<DataIndication> for Data {
    fn from(v: DataIndication) -> Self {
        Self::Indication(v)
    }
}
