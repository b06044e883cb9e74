use alloc::vec::Vec;

use super::{decode_payload, encode_message, ChciError, ChciHeader, EventCode};
use crate::sap::{
    associate::{AssociateConfirm, AssociateIndication},
    beacon_notify::BeaconNotifyIndication,
    comm_status::CommStatusIndication,
    data::DataConfirm,
    disassociate::{DisassociateConfirm, DisassociateIndication},
    get::GetConfirm,
    orphan::OrphanIndication,
    poll::{PollConfirm, PollIndication},
    purge::PurgeConfirm,
    reset::ResetConfirm,
    rx_enable::RxEnableConfirm,
    scan::ScanConfirm,
    set::SetConfirm,
    start::StartConfirm,
};

/// A confirm or indication for the host.
///
/// Data confirms travel with the events; only data indications use the data path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    AssociateConfirm(AssociateConfirm),
    AssociateIndication(AssociateIndication),
    DisassociateConfirm(DisassociateConfirm),
    DisassociateIndication(DisassociateIndication),
    BeaconNotifyIndication(BeaconNotifyIndication),
    GetConfirm(GetConfirm),
    OrphanIndication(OrphanIndication),
    ResetConfirm(ResetConfirm),
    RxEnableConfirm(RxEnableConfirm),
    ScanConfirm(ScanConfirm),
    CommStatusIndication(CommStatusIndication),
    SetConfirm(SetConfirm),
    StartConfirm(StartConfirm),
    PollConfirm(PollConfirm),
    PurgeConfirm(PurgeConfirm),
    DataConfirm(DataConfirm),
    PollIndication(PollIndication),
}

impl Event {
    pub fn code(&self) -> EventCode {
        match self {
            Event::AssociateConfirm(_) => EventCode::AssociateConfirm,
            Event::AssociateIndication(_) => EventCode::AssociateIndication,
            Event::DisassociateConfirm(_) => EventCode::DisassociateConfirm,
            Event::DisassociateIndication(_) => EventCode::DisassociateIndication,
            Event::BeaconNotifyIndication(_) => EventCode::BeaconNotifyIndication,
            Event::GetConfirm(_) => EventCode::GetConfirm,
            Event::OrphanIndication(_) => EventCode::OrphanIndication,
            Event::ResetConfirm(_) => EventCode::ResetConfirm,
            Event::RxEnableConfirm(_) => EventCode::RxEnableConfirm,
            Event::ScanConfirm(_) => EventCode::ScanConfirm,
            Event::CommStatusIndication(_) => EventCode::CommStatusIndication,
            Event::SetConfirm(_) => EventCode::SetConfirm,
            Event::StartConfirm(_) => EventCode::StartConfirm,
            Event::PollConfirm(_) => EventCode::PollConfirm,
            Event::PurgeConfirm(_) => EventCode::PurgeConfirm,
            Event::DataConfirm(_) => EventCode::DataConfirm,
            Event::PollIndication(_) => EventCode::PollIndication,
        }
    }

    pub fn decode(header: &ChciHeader, payload: &[u8]) -> Result<Self, ChciError> {
        header.check_len(payload)?;

        let c = header.code;
        let event = match EventCode::try_from(c)? {
            EventCode::AssociateConfirm => Self::AssociateConfirm(decode_payload(c, payload)?),
            EventCode::AssociateIndication => {
                Self::AssociateIndication(decode_payload(c, payload)?)
            }
            EventCode::DisassociateConfirm => {
                Self::DisassociateConfirm(decode_payload(c, payload)?)
            }
            EventCode::DisassociateIndication => {
                Self::DisassociateIndication(decode_payload(c, payload)?)
            }
            EventCode::BeaconNotifyIndication => {
                Self::BeaconNotifyIndication(decode_payload(c, payload)?)
            }
            EventCode::GetConfirm => Self::GetConfirm(decode_payload(c, payload)?),
            EventCode::OrphanIndication => Self::OrphanIndication(decode_payload(c, payload)?),
            EventCode::ResetConfirm => Self::ResetConfirm(decode_payload(c, payload)?),
            EventCode::RxEnableConfirm => Self::RxEnableConfirm(decode_payload(c, payload)?),
            EventCode::ScanConfirm => Self::ScanConfirm(decode_payload(c, payload)?),
            EventCode::CommStatusIndication => {
                Self::CommStatusIndication(decode_payload(c, payload)?)
            }
            EventCode::SetConfirm => Self::SetConfirm(decode_payload(c, payload)?),
            EventCode::StartConfirm => Self::StartConfirm(decode_payload(c, payload)?),
            EventCode::PollConfirm => Self::PollConfirm(decode_payload(c, payload)?),
            EventCode::PurgeConfirm => Self::PurgeConfirm(decode_payload(c, payload)?),
            EventCode::DataConfirm => Self::DataConfirm(decode_payload(c, payload)?),
            EventCode::PollIndication => Self::PollIndication(decode_payload(c, payload)?),
        };

        Ok(event)
    }

    /// Parse a complete message, header included.
    pub fn from_message(message: &[u8]) -> Result<Self, ChciError> {
        let (header, payload) = ChciHeader::split(message)?;
        Self::decode(&header, payload)
    }

    pub fn encode(self) -> Result<Vec<u8>, ChciError> {
        let code = self.code() as u8;

        match self {
            Event::AssociateConfirm(v) => encode_message(code, v),
            Event::AssociateIndication(v) => encode_message(code, v),
            Event::DisassociateConfirm(v) => encode_message(code, v),
            Event::DisassociateIndication(v) => encode_message(code, v),
            Event::BeaconNotifyIndication(v) => encode_message(code, v),
            Event::GetConfirm(v) => encode_message(code, v),
            Event::OrphanIndication(v) => encode_message(code, v),
            Event::ResetConfirm(v) => encode_message(code, v),
            Event::RxEnableConfirm(v) => encode_message(code, v),
            Event::ScanConfirm(v) => encode_message(code, v),
            Event::CommStatusIndication(v) => encode_message(code, v),
            Event::SetConfirm(v) => encode_message(code, v),
            Event::StartConfirm(v) => encode_message(code, v),
            Event::PollConfirm(v) => encode_message(code, v),
            Event::PurgeConfirm(v) => encode_message(code, v),
            Event::DataConfirm(v) => encode_message(code, v),
            Event::PollIndication(v) => encode_message(code, v),
        }
    }
}

impl From<AssociateConfirm> for Event {
    fn from(v: AssociateConfirm) -> Self {
        Self::AssociateConfirm(v)
    }
}

impl From<AssociateIndication> for Event {
    fn from(v: AssociateIndication) -> Self {
        Self::AssociateIndication(v)
    }
}

impl From<DisassociateConfirm> for Event {
    fn from(v: DisassociateConfirm) -> Self {
        Self::DisassociateConfirm(v)
    }
}

impl From<DisassociateIndication> for Event {
    fn from(v: DisassociateIndication) -> Self {
        Self::DisassociateIndication(v)
    }
}

impl From<BeaconNotifyIndication> for Event {
    fn from(v: BeaconNotifyIndication) -> Self {
        Self::BeaconNotifyIndication(v)
    }
}

impl From<GetConfirm> for Event {
    fn from(v: GetConfirm) -> Self {
        Self::GetConfirm(v)
    }
}

impl From<OrphanIndication> for Event {
    fn from(v: OrphanIndication) -> Self {
        Self::OrphanIndication(v)
    }
}

impl From<ResetConfirm> for Event {
    fn from(v: ResetConfirm) -> Self {
        Self::ResetConfirm(v)
    }
}

impl From<RxEnableConfirm> for Event {
    fn from(v: RxEnableConfirm) -> Self {
        Self::RxEnableConfirm(v)
    }
}

impl From<ScanConfirm> for Event {
    fn from(v: ScanConfirm) -> Self {
        Self::ScanConfirm(v)
    }
}

impl From<CommStatusIndication> for Event {
    fn from(v: CommStatusIndication) -> Self {
        Self::CommStatusIndication(v)
    }
}

impl From<SetConfirm> for Event {
    fn from(v: SetConfirm) -> Self {
        Self::SetConfirm(v)
    }
}

impl From<StartConfirm> for Event {
    fn from(v: StartConfirm) -> Self {
        Self::StartConfirm(v)
    }
}

impl From<PollConfirm> for Event {
    fn from(v: PollConfirm) -> Self {
        Self::PollConfirm(v)
    }
}

impl From<PurgeConfirm> for Event {
    fn from(v: PurgeConfirm) -> Self {
        Self::PurgeConfirm(v)
    }
}

impl From<DataConfirm> for Event {
    fn from(v: DataConfirm) -> Self {
        Self::DataConfirm(v)
    }
}

impl From<PollIndication> for Event {
    fn from(v: PollIndication) -> Self {
        Self::PollIndication(v)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{sap::Status, time::Instant};

    #[test]
    fn data_confirm_message() {
        let message = Event::from(DataConfirm {
            msdu_handle: 9,
            status: Status::NoAck,
            timestamp: Instant::from_symbols(0x0102_0304),
        })
        .encode()
        .unwrap();

        assert_eq!(
            message,
            [0x90, 0x06, 0x00, 0x09, 0xE9, 0x04, 0x03, 0x02, 0x01]
        );
    }

    #[test]
    fn purge_confirm_from_message() {
        assert_eq!(
            Event::from_message(&[0x8F, 0x02, 0x00, 0x05, 0xE7]),
            Ok(Event::PurgeConfirm(PurgeConfirm {
                msdu_handle: 5,
                status: Status::InvalidHandle,
            }))
        );
        assert!(Event::from_message(&[0x8F, 0x02, 0x00, 0x05]).is_err());
    }
}
