use super::{
    callback::SendCallback,
    csma::{SequenceNumbering, Transmission, TxOutcome},
    host::HostLink,
    indirect::{IndirectKind, IndirectTransaction},
    mlme_poll::data_request_frame,
    pending::AssociateProcess,
    phy::Phy,
    state::{frame_header, serialize_frame, MacState},
};
use crate::{
    consts,
    pib::MacPib,
    radio::Radio,
    sap::{
        associate::{AssociateConfirm, AssociateIndication, AssociateRequest, AssociateResponse},
        comm_status::CommStatusIndication,
        Status,
    },
    time::Instant,
    wire::{
        command::{AssociationStatus, CapabilityInformation, Command},
        Address, ExtendedAddress, Frame, FrameContent, FrameType, PanId, ShortAddress,
    },
};

pub fn process_associate_request<R: Radio>(
    phy: &mut Phy<R>,
    mac_pib: &mut MacPib,
    mac_state: &mut MacState,
    host: &mut HostLink,
    request: AssociateRequest,
) {
    if mac_state.pending.associate.is_busy() {
        host.event(failed_confirm(Status::DuplicateRequest));
        return;
    }

    let coord_address = match request.coord_address {
        Some(address)
            if consts::channel_supported(request.channel_number) && request.channel_page == 0 =>
        {
            address
        }
        _ => {
            host.event(failed_confirm(Status::InvalidParameter));
            return;
        }
    };

    // Take the data from the request and reflect them into the pibs
    if let Err(e) = phy.update_phy_pib(|phy_pib| phy_pib.current_channel = request.channel_number) {
        error!("Could not update the phy pib for the associate request: {}", e);
        host.event(failed_confirm(Status::PhyError));
        return;
    }

    mac_pib.pan_id = coord_address.pan_id();
    match coord_address {
        Address::Short(_, short_address) => mac_pib.coord_short_address = short_address,
        Address::Extended(_, extended_address) => mac_pib.coord_extended_address = extended_address,
    }

    let associate_request_frame = Frame {
        header: frame_header(
            FrameType::MacCommand,
            true,
            Some(coord_address),
            Some(Address::Extended(PanId::broadcast(), mac_pib.extended_address)),
        ),
        content: FrameContent::Command(Command::AssociationRequest(request.capability_information)),
        payload: &[],
        footer: [0, 0],
    };

    debug!("Sending association request");

    let queued = serialize_frame(associate_request_frame).and_then(|frame| {
        mac_state
            .csma
            .enqueue(Transmission {
                frame,
                ack_request: true,
                sequence: SequenceNumbering::Dsn,
                callback: SendCallback::AssociateRequest,
            })
            .map_err(|_| Status::TransactionOverflow)
    });

    match queued {
        Ok(()) => {
            // Can't be busy, checked above
            let _ = mac_state.pending.associate.arm(AssociateProcess {
                coord_address,
                extract_at: None,
            });
        }
        Err(status) => {
            mac_pib.clear_association();
            host.event(failed_confirm(status));
        }
    }
}

fn failed_confirm(status: Status) -> AssociateConfirm {
    AssociateConfirm {
        assoc_short_address: ShortAddress::BROADCAST,
        status,
    }
}

/// End the association attempt without a response from the coordinator.
fn association_failed(mac_pib: &mut MacPib, mac_state: &mut MacState, host: &mut HostLink, status: Status) {
    mac_state.pending.associate.complete();
    mac_pib.clear_association();

    debug!("Association failed: {:?}", status);
    host.event(failed_confirm(status));
}

pub fn associate_request_sent(
    outcome: TxOutcome,
    mac_pib: &mut MacPib,
    mac_state: &mut MacState,
    host: &mut HostLink,
) {
    if !outcome.status.is_success() {
        association_failed(mac_pib, mac_state, host, outcome.status);
        return;
    }

    // The coordinator needs some time to decide, then we ask for the response
    if let Some(process) = mac_state.pending.associate.context_mut() {
        trace!("Association request acknowledged");
        process.extract_at = Some(outcome.timestamp + mac_pib.response_wait_time());
    }
}

/// Ask for the association response once the response wait time is over,
/// and give up when the response doesn't come.
pub fn advance_association(
    mac_pib: &mut MacPib,
    mac_state: &mut MacState,
    host: &mut HostLink,
    now: Instant,
) {
    if mac_state.pending.associate.take_expired(now).is_some() {
        mac_pib.clear_association();
        debug!("No association response received");
        host.event(failed_confirm(Status::NoData));
        return;
    }

    let Some(process) = mac_state.pending.associate.context_mut() else {
        return;
    };

    match process.extract_at {
        Some(extract_at) if extract_at.has_passed(now) => process.extract_at = None,
        _ => return,
    }

    let coord_address = process.coord_address;

    trace!("Requesting the association response");

    let queued = data_request_frame(mac_pib, coord_address).and_then(|frame| {
        mac_state
            .csma
            .enqueue(Transmission {
                frame,
                ack_request: true,
                sequence: SequenceNumbering::Dsn,
                callback: SendCallback::AssociateDataRequest,
            })
            .map_err(|_| Status::TransactionOverflow)
    });

    if let Err(status) = queued {
        association_failed(mac_pib, mac_state, host, status);
    }
}

pub fn associate_data_request_sent(
    outcome: TxOutcome,
    mac_pib: &mut MacPib,
    mac_state: &mut MacState,
    host: &mut HostLink,
    now: Instant,
) {
    match outcome.status {
        Status::Success if outcome.frame_pending => mac_state
            .pending
            .associate
            .await_response(now + mac_pib.max_frame_total_wait_time()),
        Status::Success => association_failed(mac_pib, mac_state, host, Status::NoData),
        status => association_failed(mac_pib, mac_state, host, status),
    }
}

/// The coordinator answered our association request.
pub fn association_response_received(
    mac_pib: &mut MacPib,
    mac_state: &mut MacState,
    host: &mut HostLink,
    assoc_short_address: ShortAddress,
    association_status: AssociationStatus,
    source: Option<Address>,
) {
    if !mac_state.pending.associate.is_busy() {
        trace!("Ignoring unexpected association response");
        return;
    }

    mac_state.pending.associate.complete();

    let status = Status::from(association_status);
    if status != Status::Success {
        mac_pib.clear_association();
        host.event(failed_confirm(status));
        return;
    }

    info!("Associated with short address {}", assoc_short_address.0);

    mac_pib.short_address = assoc_short_address;
    if let Some(Address::Extended(_, coord_extended_address)) = source {
        mac_pib.coord_extended_address = coord_extended_address;
    }
    mac_pib.associated_pan_coord = true;

    host.event(AssociateConfirm {
        assoc_short_address,
        status,
    });
}

/// A device asks to join our PAN.
pub fn association_request_received(
    mac_pib: &MacPib,
    mac_state: &MacState,
    host: &mut HostLink,
    capability_information: CapabilityInformation,
    source: Option<Address>,
) {
    if !mac_state.is_coordinator || !mac_pib.association_permit {
        trace!("Not accepting associations");
        return;
    }

    let Some(Address::Extended(_, device_address)) = source else {
        trace!("Association request without extended source");
        return;
    };

    host.event(AssociateIndication {
        device_address,
        capability_information,
    });
}

pub fn process_associate_response(
    mac_pib: &MacPib,
    mac_state: &mut MacState,
    host: &mut HostLink,
    response: AssociateResponse,
    now: Instant,
) {
    let device = response.device_address;

    if !mac_state.is_coordinator {
        host.event(association_comm_status(mac_pib, device, Status::InvalidParameter));
        return;
    }

    let destination = Address::Extended(mac_pib.pan_id, device);
    let association_response_frame = Frame {
        header: frame_header(
            FrameType::MacCommand,
            true,
            Some(destination),
            Some(Address::Extended(mac_pib.pan_id, mac_pib.extended_address)),
        ),
        content: FrameContent::Command(Command::AssociationResponse(
            response.assoc_short_address,
            response.status,
        )),
        payload: &[],
        footer: [0, 0],
    };

    let queued = serialize_frame(association_response_frame).and_then(|frame| {
        mac_state
            .indirect
            .push(IndirectTransaction {
                destination,
                frame,
                ack_request: true,
                kind: IndirectKind::AssociationResponse { device },
                expires_at: now + mac_pib.transaction_persistence_time(),
            })
            .map_err(|_| Status::TransactionOverflow)
    });

    match queued {
        Ok(()) => debug!("Holding association response for the device"),
        Err(status) => host.event(association_comm_status(mac_pib, device, status)),
    }
}

pub fn associate_response_sent(
    outcome: TxOutcome,
    mac_pib: &MacPib,
    host: &mut HostLink,
    device: ExtendedAddress,
) {
    host.event(association_comm_status(mac_pib, device, outcome.status));
}

/// The status of an association response, as reported on the coordinator.
pub fn association_comm_status(
    mac_pib: &MacPib,
    device: ExtendedAddress,
    status: Status,
) -> CommStatusIndication {
    CommStatusIndication {
        pan_id: mac_pib.pan_id,
        src_address: Some(Address::Extended(mac_pib.pan_id, mac_pib.extended_address)),
        dst_address: Some(Address::Extended(mac_pib.pan_id, device)),
        status,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::{
        chci::Event,
        sap::associate::capability_from_byte,
        test_helpers::aether::{Aether, AetherRadio},
        time::Duration,
    };

    struct Bench {
        aether: Aether,
        phy: Phy<AetherRadio>,
        pib: MacPib,
        state: MacState,
        host: HostLink<'static>,
    }

    impl Bench {
        fn new() -> Self {
            let mut aether = Aether::new();
            let pib = MacPib::new(ExtendedAddress(0xD0), &mut StdRng::seed_from_u64(9));
            let phy = Phy::new(aether.radio());
            let mut host = HostLink::new();
            host.registry.register_event_handler(|_: &[u8]| false);

            Self {
                aether,
                phy,
                pib,
                state: MacState::new(),
                host,
            }
        }

        fn events(&mut self) -> Vec<Event> {
            core::iter::from_fn(|| self.host.take_message())
                .map(|message| Event::from_message(message.bytes()).unwrap())
                .collect()
        }
    }

    fn request() -> AssociateRequest {
        AssociateRequest {
            channel_number: 15,
            channel_page: 0,
            coord_address: Some(Address::Short(PanId(0x4321), ShortAddress(0))),
            capability_information: capability_from_byte(0x80),
        }
    }

    fn acked(timestamp: u64, frame_pending: bool) -> TxOutcome {
        TxOutcome {
            status: Status::Success,
            frame_pending,
            timestamp: Instant::from_symbols(timestamp),
        }
    }

    #[test_log::test]
    fn request_reflects_into_the_pibs() {
        let mut bench = Bench::new();

        process_associate_request(&mut bench.phy, &mut bench.pib, &mut bench.state, &mut bench.host, request());

        assert_eq!(bench.phy.pib().current_channel, 15);
        assert_eq!(bench.pib.pan_id, PanId(0x4321));
        assert_eq!(bench.pib.coord_short_address, ShortAddress(0));
        assert!(bench.state.pending.associate.is_busy());
        assert!(!bench.state.csma.is_idle());

        process_associate_request(&mut bench.phy, &mut bench.pib, &mut bench.state, &mut bench.host, request());
        assert_eq!(
            bench.events(),
            [Event::AssociateConfirm(failed_confirm(Status::DuplicateRequest))]
        );
    }

    #[test_log::test]
    fn invalid_requests() {
        let mut bench = Bench::new();

        let mut no_coordinator = request();
        no_coordinator.coord_address = None;
        let mut bad_channel = request();
        bad_channel.channel_number = 27;

        process_associate_request(&mut bench.phy, &mut bench.pib, &mut bench.state, &mut bench.host, no_coordinator);
        process_associate_request(&mut bench.phy, &mut bench.pib, &mut bench.state, &mut bench.host, bad_channel);

        assert_eq!(
            bench.events(),
            [
                Event::AssociateConfirm(failed_confirm(Status::InvalidParameter)),
                Event::AssociateConfirm(failed_confirm(Status::InvalidParameter)),
            ]
        );
        assert!(!bench.state.pending.associate.is_busy());
    }

    #[test_log::test]
    fn response_never_comes() {
        let mut bench = Bench::new();
        process_associate_request(&mut bench.phy, &mut bench.pib, &mut bench.state, &mut bench.host, request());
        bench.state.csma.clear();

        associate_request_sent(acked(100, false), &mut bench.pib, &mut bench.state, &mut bench.host);

        // Nothing happens during the response wait time
        let extract_at = Instant::from_symbols(100) + bench.pib.response_wait_time();
        advance_association(&mut bench.pib, &mut bench.state, &mut bench.host, extract_at + Duration::ZERO);
        assert!(!bench.state.csma.is_idle(), "data request queued");
        bench.state.csma.clear();

        associate_data_request_sent(acked(extract_at.symbols(), true), &mut bench.pib, &mut bench.state, &mut bench.host, extract_at);
        assert!(bench.state.pending.associate.is_awaiting_response());

        let timeout_at = extract_at + bench.pib.max_frame_total_wait_time();
        advance_association(
            &mut bench.pib,
            &mut bench.state,
            &mut bench.host,
            timeout_at,
        );

        assert_eq!(bench.events(), [Event::AssociateConfirm(failed_confirm(Status::NoData))]);
        assert!(!bench.state.pending.associate.is_busy());
        assert_eq!(bench.pib.pan_id, PanId::broadcast());
    }

    #[test_log::test]
    fn accepted() {
        let mut bench = Bench::new();
        process_associate_request(&mut bench.phy, &mut bench.pib, &mut bench.state, &mut bench.host, request());
        associate_request_sent(acked(100, false), &mut bench.pib, &mut bench.state, &mut bench.host);

        association_response_received(
            &mut bench.pib,
            &mut bench.state,
            &mut bench.host,
            ShortAddress(0x0042),
            AssociationStatus::Successful,
            Some(Address::Extended(PanId(0x4321), ExtendedAddress(0xC0))),
        );

        assert_eq!(
            bench.events(),
            [Event::AssociateConfirm(AssociateConfirm {
                assoc_short_address: ShortAddress(0x0042),
                status: Status::Success,
            })]
        );
        assert_eq!(bench.pib.short_address, ShortAddress(0x0042));
        assert_eq!(bench.pib.coord_extended_address, ExtendedAddress(0xC0));
        assert!(bench.pib.associated_pan_coord);
        assert!(!bench.state.pending.associate.is_busy());
    }

    #[test_log::test]
    fn response_is_held_for_the_device() {
        let mut bench = Bench::new();
        bench.pib.pan_id = PanId(0x4321);
        let response = AssociateResponse {
            device_address: ExtendedAddress(0xD1),
            assoc_short_address: ShortAddress(7),
            status: AssociationStatus::Successful,
        };

        process_associate_response(&bench.pib, &mut bench.state, &mut bench.host, response.clone(), Instant::from_symbols(0));
        assert_eq!(
            bench.events(),
            [Event::CommStatusIndication(association_comm_status(
                &bench.pib,
                ExtendedAddress(0xD1),
                Status::InvalidParameter
            ))]
        );

        bench.state.is_coordinator = true;
        process_associate_response(&bench.pib, &mut bench.state, &mut bench.host, response, Instant::from_symbols(0));
        assert!(bench.events().is_empty());
        assert!(bench
            .state
            .indirect
            .has_pending_for(&Address::Extended(PanId::broadcast(), ExtendedAddress(0xD1))));
    }
}
