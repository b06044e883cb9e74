use alloc::vec::Vec;

use super::{decode_payload, encode_message, ChciError, ChciHeader, CommandCode};
use crate::sap::{
    associate::{AssociateRequest, AssociateResponse},
    disassociate::DisassociateRequest,
    get::GetRequest,
    orphan::OrphanResponse,
    poll::PollRequest,
    purge::PurgeRequest,
    reset::ResetRequest,
    rx_enable::RxEnableRequest,
    scan::ScanRequest,
    set::SetRequest,
    start::StartRequest,
};

/// A management request from the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Associate(AssociateRequest),
    AssociateResponse(AssociateResponse),
    Disassociate(DisassociateRequest),
    Get(GetRequest),
    OrphanResponse(OrphanResponse),
    Reset(ResetRequest),
    RxEnable(RxEnableRequest),
    Scan(ScanRequest),
    Set(SetRequest),
    Start(StartRequest),
    Poll(PollRequest),
    Purge(PurgeRequest),
}

impl Command {
    pub fn code(&self) -> CommandCode {
        match self {
            Command::Associate(_) => CommandCode::AssociateRequest,
            Command::AssociateResponse(_) => CommandCode::AssociateResponse,
            Command::Disassociate(_) => CommandCode::DisassociateRequest,
            Command::Get(_) => CommandCode::GetRequest,
            Command::OrphanResponse(_) => CommandCode::OrphanResponse,
            Command::Reset(_) => CommandCode::ResetRequest,
            Command::RxEnable(_) => CommandCode::RxEnableRequest,
            Command::Scan(_) => CommandCode::ScanRequest,
            Command::Set(_) => CommandCode::SetRequest,
            Command::Start(_) => CommandCode::StartRequest,
            Command::Poll(_) => CommandCode::PollRequest,
            Command::Purge(_) => CommandCode::PurgeRequest,
        }
    }

    pub fn decode(header: &ChciHeader, payload: &[u8]) -> Result<Self, ChciError> {
        header.check_len(payload)?;

        let code = header.code;
        let command = match CommandCode::try_from(code)? {
            CommandCode::AssociateRequest => Self::Associate(decode_payload(code, payload)?),
            CommandCode::AssociateResponse => {
                Self::AssociateResponse(decode_payload(code, payload)?)
            }
            CommandCode::DisassociateRequest => Self::Disassociate(decode_payload(code, payload)?),
            CommandCode::GetRequest => Self::Get(decode_payload(code, payload)?),
            CommandCode::OrphanResponse => Self::OrphanResponse(decode_payload(code, payload)?),
            CommandCode::ResetRequest => Self::Reset(decode_payload(code, payload)?),
            CommandCode::RxEnableRequest => Self::RxEnable(decode_payload(code, payload)?),
            CommandCode::ScanRequest => Self::Scan(decode_payload(code, payload)?),
            CommandCode::SetRequest => Self::Set(decode_payload(code, payload)?),
            CommandCode::StartRequest => Self::Start(decode_payload(code, payload)?),
            CommandCode::PollRequest => Self::Poll(decode_payload(code, payload)?),
            CommandCode::PurgeRequest => Self::Purge(decode_payload(code, payload)?),
        };

        Ok(command)
    }

    /// The complete message, header included.
    pub fn encode(self) -> Result<Vec<u8>, ChciError> {
        let code = self.code() as u8;

        match self {
            Command::Associate(request) => encode_message(code, request),
            Command::AssociateResponse(response) => encode_message(code, response),
            Command::Disassociate(request) => encode_message(code, request),
            Command::Get(request) => encode_message(code, request),
            Command::OrphanResponse(response) => encode_message(code, response),
            Command::Reset(request) => encode_message(code, request),
            Command::RxEnable(request) => encode_message(code, request),
            Command::Scan(request) => encode_message(code, request),
            Command::Set(request) => encode_message(code, request),
            Command::Start(request) => encode_message(code, request),
            Command::Poll(request) => encode_message(code, request),
            Command::Purge(request) => encode_message(code, request),
        }
    }
}

impl From<AssociateRequest> for Command {
    fn from(v: AssociateRequest) -> Self {
        Self::Associate(v)
    }
}

impl From<AssociateResponse> for Command {
    fn from(v: AssociateResponse) -> Self {
        Self::AssociateResponse(v)
    }
}

impl From<DisassociateRequest> for Command {
    fn from(v: DisassociateRequest) -> Self {
        Self::Disassociate(v)
    }
}

impl From<GetRequest> for Command {
    fn from(v: GetRequest) -> Self {
        Self::Get(v)
    }
}

impl From<OrphanResponse> for Command {
    fn from(v: OrphanResponse) -> Self {
        Self::OrphanResponse(v)
    }
}

impl From<ResetRequest> for Command {
    fn from(v: ResetRequest) -> Self {
        Self::Reset(v)
    }
}

impl From<RxEnableRequest> for Command {
    fn from(v: RxEnableRequest) -> Self {
        Self::RxEnable(v)
    }
}

impl From<ScanRequest> for Command {
    fn from(v: ScanRequest) -> Self {
        Self::Scan(v)
    }
}

impl From<SetRequest> for Command {
    fn from(v: SetRequest) -> Self {
        Self::Set(v)
    }
}

impl From<StartRequest> for Command {
    fn from(v: StartRequest) -> Self {
        Self::Start(v)
    }
}

impl From<PollRequest> for Command {
    fn from(v: PollRequest) -> Self {
        Self::Poll(v)
    }
}

impl From<PurgeRequest> for Command {
    fn from(v: PurgeRequest) -> Self {
        Self::Purge(v)
    }
}
