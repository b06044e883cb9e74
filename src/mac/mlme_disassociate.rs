use super::{
    callback::SendCallback,
    csma::{SequenceNumbering, Transmission, TxOutcome},
    host::HostLink,
    indirect::{IndirectKind, IndirectTransaction},
    state::{frame_header, serialize_frame, MacState},
};
use crate::{
    pib::MacPib,
    sap::{
        disassociate::{DisassociateConfirm, DisassociateIndication, DisassociateRequest},
        Status,
    },
    time::Instant,
    wire::{
        command::{Command, DisassociationReason},
        Address, Frame, FrameContent, FrameType,
    },
};

pub fn process_disassociate_request(
    mac_pib: &MacPib,
    mac_state: &mut MacState,
    host: &mut HostLink,
    request: DisassociateRequest,
    now: Instant,
) {
    let device = match request.device_address {
        Some(device) if device.pan_id() == mac_pib.pan_id => device,
        device_address => {
            host.event(DisassociateConfirm {
                status: Status::InvalidParameter,
                device_address,
            });
            return;
        }
    };

    if mac_state.pending.disassociate.arm(device).is_err() {
        host.event(DisassociateConfirm {
            status: Status::DuplicateRequest,
            device_address: Some(device),
        });
        return;
    }

    let notification = Frame {
        header: frame_header(
            FrameType::MacCommand,
            true,
            Some(device),
            Some(Address::Extended(mac_pib.pan_id, mac_pib.extended_address)),
        ),
        content: FrameContent::Command(Command::DisassociationNotification(
            request.disassociate_reason,
        )),
        payload: &[],
        footer: [0, 0],
    };

    let queued = serialize_frame(notification).and_then(|frame| {
        if request.tx_indirect && mac_state.is_coordinator {
            debug!("Holding disassociation notification for the device");

            mac_state
                .indirect
                .push(IndirectTransaction {
                    destination: device,
                    frame,
                    ack_request: true,
                    kind: IndirectKind::Disassociation { device },
                    expires_at: now + mac_pib.transaction_persistence_time(),
                })
                .map_err(|_| Status::TransactionOverflow)
        } else {
            debug!("Sending disassociation notification");

            mac_state
                .csma
                .enqueue(Transmission {
                    frame,
                    ack_request: true,
                    sequence: SequenceNumbering::Dsn,
                    callback: SendCallback::Disassociate { device },
                })
                .map_err(|_| Status::TransactionOverflow)
        }
    });

    if let Err(status) = queued {
        mac_state.pending.disassociate.complete();
        host.event(DisassociateConfirm {
            status,
            device_address: Some(device),
        });
    }
}

/// The notification went out, or was never picked up from the indirect queue.
pub fn disassociation_sent(
    outcome: TxOutcome,
    mac_pib: &mut MacPib,
    mac_state: &mut MacState,
    host: &mut HostLink,
    device: Address,
) {
    mac_state.pending.disassociate.complete();

    // A device that told its coordinator it leaves is gone, acknowledged or not
    if !mac_state.is_coordinator && matches!(outcome.status, Status::Success | Status::NoAck) {
        info!("Left the PAN");
        mac_pib.clear_association();
    }

    debug!("Disassociation done: {:?}", outcome.status);

    host.event(DisassociateConfirm {
        status: outcome.status,
        device_address: Some(device),
    });
}

pub fn disassociation_received(
    mac_pib: &mut MacPib,
    mac_state: &MacState,
    host: &mut HostLink,
    disassociate_reason: DisassociationReason,
    source: Option<Address>,
) {
    let Some(source @ Address::Extended(pan_id, device_address)) = source else {
        trace!("Disassociation notification without extended source");
        return;
    };

    if mac_state.is_coordinator {
        if pan_id != mac_pib.pan_id {
            trace!("Disassociation notification from another PAN");
            return;
        }
    } else {
        if !mac_pib.is_coordinator_address(source) {
            trace!("Disassociation notification not from our coordinator");
            return;
        }

        info!("The coordinator removed us from the PAN");
        mac_pib.clear_association();
    }

    host.event(DisassociateIndication {
        device_address,
        disassociate_reason,
    });
}
