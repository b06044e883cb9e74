use super::{
    callback::SendCallback,
    csma::{SequenceNumbering, Transmission, TxOutcome},
    host::HostLink,
    indirect::{IndirectKind, IndirectTransaction},
    state::{frame_header, serialize_frame, FrameBuffer, MacState},
};
use crate::{
    pib::MacPib,
    rx_queue::RawFrame,
    sap::{
        data::{AddressMode, DataConfirm, DataIndication, DataRequest, Msdu},
        purge::{PurgeConfirm, PurgeRequest},
        Status,
    },
    time::Instant,
    wire::{Address, Frame, FrameContent, FrameType, ShortAddress},
};

pub fn process_data_request(
    mac_pib: &mut MacPib,
    mac_state: &mut MacState,
    host: &mut HostLink,
    request: DataRequest,
    now: Instant,
) {
    let msdu_handle = request.msdu_handle;

    let status = match queue_data_frame(mac_pib, mac_state, request, now) {
        Ok(()) => return,
        Err(status) => status,
    };

    debug!("Data request {} rejected: {:?}", msdu_handle, status);
    host.event(DataConfirm {
        msdu_handle,
        status,
        timestamp: now,
    });
}

fn queue_data_frame(
    mac_pib: &MacPib,
    mac_state: &mut MacState,
    request: DataRequest,
    now: Instant,
) -> Result<(), Status> {
    let source = match request.src_addr_mode {
        AddressMode::None => None,
        AddressMode::Short if mac_pib.has_usable_short_address() => {
            Some(Address::Short(mac_pib.pan_id, mac_pib.short_address))
        }
        AddressMode::Short => return Err(Status::InvalidParameter),
        AddressMode::Extended => Some(Address::Extended(mac_pib.pan_id, mac_pib.extended_address)),
    };

    if source.is_none() && request.dst_address.is_none() {
        return Err(Status::InvalidParameter);
    }

    // Broadcasts are never acknowledged
    let broadcast = matches!(
        request.dst_address,
        Some(Address::Short(_, ShortAddress::BROADCAST))
    );
    let ack_request = request.tx_options.ack && !broadcast && request.dst_address.is_some();

    let mut frame = serialize_frame(Frame {
        header: frame_header(FrameType::Data, ack_request, request.dst_address, source),
        content: FrameContent::Data,
        payload: &request.msdu,
        footer: [0, 0],
    })?;

    apply_fctl_override(mac_pib, &mut frame);

    let callback = SendCallback::Data {
        msdu_handle: request.msdu_handle,
    };

    match request.dst_address {
        Some(destination) if request.tx_options.indirect && mac_state.is_coordinator => {
            trace!("Holding data frame {} for its destination", request.msdu_handle);

            mac_state
                .indirect
                .push(IndirectTransaction {
                    destination,
                    frame,
                    ack_request,
                    kind: IndirectKind::Data {
                        msdu_handle: request.msdu_handle,
                    },
                    expires_at: now + mac_pib.transaction_persistence_time(),
                })
                .map_err(|_| Status::TransactionOverflow)
        }
        _ => mac_state
            .csma
            .enqueue(Transmission {
                frame,
                ack_request,
                sequence: SequenceNumbering::Dsn,
                callback,
            })
            .map_err(|_| Status::TransactionOverflow),
    }
}

/// A non-zero vsFctlOverride replaces the frame control field as given.
fn apply_fctl_override(mac_pib: &MacPib, frame: &mut FrameBuffer) {
    if mac_pib.fctl_override != 0 && frame.len() >= 2 {
        frame[..2].copy_from_slice(&mac_pib.fctl_override.to_le_bytes());
    }
}

pub fn data_sent(outcome: TxOutcome, msdu_handle: u8, host: &mut HostLink) {
    debug!("Data frame {} done: {:?}", msdu_handle, outcome.status);

    host.event(DataConfirm {
        msdu_handle,
        status: outcome.status,
        timestamp: outcome.timestamp,
    });
}

pub fn process_purge_request(mac_state: &mut MacState, host: &mut HostLink, request: PurgeRequest) {
    let status = if mac_state.indirect.purge(request.msdu_handle) {
        Status::Success
    } else {
        Status::InvalidHandle
    };

    host.event(PurgeConfirm {
        msdu_handle: request.msdu_handle,
        status,
    });
}

/// Hand a received data frame to the host.
pub fn data_received(host: &mut HostLink, frame: &Frame<'_>, raw_frame: &RawFrame) {
    let Ok(msdu) = Msdu::try_from(frame.payload) else {
        warn!("Dropping data frame with a {} byte payload", frame.payload.len());
        return;
    };

    host.data_indication(DataIndication {
        src_address: frame.header.source,
        dst_address: frame.header.destination,
        mpdu_link_quality: raw_frame.link_quality,
        dsn: frame.header.seq,
        timestamp: raw_frame.timestamp,
        msdu,
    });
}
