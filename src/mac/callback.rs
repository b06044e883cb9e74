use super::{
    csma::TxOutcome, host::HostLink, indirect::IndirectKind, mcps_data, mlme_associate,
    mlme_disassociate, mlme_orphan, mlme_poll, mlme_scan, mlme_start, phy::Phy, state::MacState,
};
use crate::{
    pib::MacPib,
    radio::Radio,
    sap::start::StartRequest,
    time::Instant,
    wire::{Address, ExtendedAddress},
};

/// What to do once a frame has been sent, or given up on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendCallback {
    Data { msdu_handle: u8 },
    AssociateRequest,
    /// The data request that extracts the association response.
    AssociateDataRequest,
    AssociateResponse { device: ExtendedAddress },
    Disassociate { device: Address },
    Poll,
    OrphanRealignment { orphan: ExtendedAddress },
    Beacon,
    /// The changes are applied only after the realignment went out.
    CoordRealignment(StartRequest),
    ScanCommand { channel: u8 },
}

impl From<IndirectKind> for SendCallback {
    fn from(kind: IndirectKind) -> Self {
        match kind {
            IndirectKind::Data { msdu_handle } => SendCallback::Data { msdu_handle },
            IndirectKind::AssociationResponse { device } => SendCallback::AssociateResponse { device },
            IndirectKind::Disassociation { device } => SendCallback::Disassociate { device },
        }
    }
}

impl SendCallback {
    pub fn run<R: Radio>(
        self,
        outcome: TxOutcome,
        phy: &mut Phy<R>,
        mac_pib: &mut MacPib,
        mac_state: &mut MacState,
        host: &mut HostLink,
        now: Instant,
    ) {
        match self {
            SendCallback::Data { msdu_handle } => mcps_data::data_sent(outcome, msdu_handle, host),
            SendCallback::AssociateRequest => {
                mlme_associate::associate_request_sent(outcome, mac_pib, mac_state, host)
            }
            SendCallback::AssociateDataRequest => {
                mlme_associate::associate_data_request_sent(outcome, mac_pib, mac_state, host, now)
            }
            SendCallback::AssociateResponse { device } => {
                mlme_associate::associate_response_sent(outcome, mac_pib, host, device)
            }
            SendCallback::Disassociate { device } => {
                mlme_disassociate::disassociation_sent(outcome, mac_pib, mac_state, host, device)
            }
            SendCallback::Poll => mlme_poll::poll_sent(outcome, mac_pib, mac_state, host, now),
            SendCallback::OrphanRealignment { orphan } => {
                mlme_orphan::orphan_realignment_sent(outcome, mac_pib, host, orphan)
            }
            SendCallback::Beacon => {
                if !outcome.status.is_success() {
                    warn!("Could not send beacon: {:?}", outcome.status);
                }
            }
            SendCallback::CoordRealignment(request) => mlme_start::coord_realignment_sent_callback(
                outcome, phy, mac_pib, mac_state, host, request,
            ),
            SendCallback::ScanCommand { channel } => {
                if !outcome.status.is_success() {
                    mlme_scan::scan_command_failed(mac_state, channel, outcome.status);
                }
            }
        }
    }
}
