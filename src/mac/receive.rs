//! Everything that happens with a frame the radio received.

use super::{
    callback::SendCallback,
    csma::{SequenceNumbering, Transmission, TxOutcome},
    host::HostLink,
    mcps_data, mlme_associate, mlme_disassociate, mlme_orphan, mlme_poll, mlme_scan,
    phy::Phy,
    state::{frame_header, serialize_frame, MacState},
};
use crate::{
    fmt::Bytes,
    pib::MacPib,
    radio::Radio,
    rx_queue::RawFrame,
    sap::Status,
    time::Instant,
    wire::{
        beacon::{
            Beacon, BeaconOrder, GuaranteedTimeSlotInformation, PendingAddress,
            SuperframeOrder, SuperframeSpecification,
        },
        command::{Command, CoordinatorRealignmentData},
        Address, ExtendedAddress, Frame, FrameContent, FrameType, PanId, ShortAddress,
    },
};

pub fn process_raw_frame<R: Radio>(
    phy: &mut Phy<R>,
    mac_pib: &mut MacPib,
    mac_state: &mut MacState,
    host: &mut HostLink,
    raw_frame: &RawFrame,
    now: Instant,
) {
    trace!("Received {} at {}", Bytes(&raw_frame.data), raw_frame.timestamp);

    host.raw_frame(raw_frame);

    // Sniffer mode, the raw frame handler is all there is
    if mac_pib.raw_rx {
        return;
    }

    let Some(frame) = super::state::deserialize_frame(&raw_frame.data) else {
        return;
    };

    if mac_pib.promiscuous_mode {
        mcps_data::data_received(host, &frame, raw_frame);
        return;
    }

    if frame.header.frame_type == FrameType::Acknowledgement {
        if let Some((callback, outcome)) = mac_state
            .csma
            .ack_received(frame.header.seq, frame.header.frame_pending)
        {
            callback.run(outcome, phy, mac_pib, mac_state, host, now);
        }
        return;
    }

    if !accept_frame(mac_pib, mac_state, &frame) {
        trace!("Frame {} is not for us", frame.header.seq);
        return;
    }

    if frame.header.ack_request && !is_broadcast(frame.header.destination) {
        send_ack(phy, mac_state, &frame);
    }

    match &frame.content {
        FrameContent::Beacon(_) => {
            let channel = phy.pib().current_channel;
            mlme_scan::process_received_beacon(mac_pib, mac_state, host, &frame, raw_frame, channel);
        }
        FrameContent::Data => {
            mlme_poll::poll_data_received(mac_pib, mac_state, host, &frame);
            if !frame.payload.is_empty() {
                mcps_data::data_received(host, &frame, raw_frame);
            }
        }
        FrameContent::Command(command) => {
            process_command(phy, mac_pib, mac_state, host, command, frame.header.source, now)
        }
        _ => trace!("Ignoring unsupported frame content"),
    }
}

fn process_command<R: Radio>(
    phy: &mut Phy<R>,
    mac_pib: &mut MacPib,
    mac_state: &mut MacState,
    host: &mut HostLink,
    command: &Command,
    source: Option<Address>,
    now: Instant,
) {
    match command {
        Command::BeaconRequest => send_beacon(mac_pib, mac_state),
        Command::OrphanNotification => {
            mlme_orphan::orphan_notification_received(mac_state, host, source)
        }
        Command::DataRequest => {
            extract_pending(phy, mac_pib, mac_state, host, source, now)
        }
        Command::AssociationRequest(capability_information) => {
            mlme_associate::association_request_received(
                mac_pib,
                mac_state,
                host,
                *capability_information,
                source,
            )
        }
        Command::AssociationResponse(assoc_short_address, association_status) => {
            mlme_associate::association_response_received(
                mac_pib,
                mac_state,
                host,
                *assoc_short_address,
                *association_status,
                source,
            )
        }
        Command::DisassociationNotification(reason) => {
            mlme_disassociate::disassociation_received(mac_pib, mac_state, host, *reason, source)
        }
        Command::CoordinatorRealignment(realignment) => {
            if !mlme_scan::process_realignment(phy, mac_pib, mac_state, host, realignment, source) {
                follow_realignment(phy, mac_pib, mac_state, realignment, source);
            }
        }
        _ => trace!("Ignoring unsupported command"),
    }
}

/// Does the frame pass the address filter?
fn accept_frame(mac_pib: &MacPib, mac_state: &MacState, frame: &Frame<'_>) -> bool {
    let own_pan = |pan_id: PanId| pan_id == PanId::broadcast() || pan_id == mac_pib.pan_id;

    if frame.header.frame_type == FrameType::Beacon {
        return mac_pib.pan_id == PanId::broadcast()
            || frame
                .header
                .source
                .is_some_and(|source| source.pan_id() == mac_pib.pan_id);
    }

    match frame.header.destination {
        Some(Address::Short(pan_id, short_address)) => {
            own_pan(pan_id)
                && (short_address == ShortAddress::BROADCAST || short_address == mac_pib.short_address)
        }
        Some(Address::Extended(pan_id, extended_address)) => {
            own_pan(pan_id) && extended_address == mac_pib.extended_address
        }
        // Only a coordinator takes frames without a destination
        None => mac_state.is_coordinator,
    }
}

fn is_broadcast(destination: Option<Address>) -> bool {
    matches!(
        destination,
        Some(Address::Short(_, ShortAddress::BROADCAST))
    )
}

/// Acknowledge right away. The frame pending bit tells the requester of a data request to stay awake.
fn send_ack<R: Radio>(phy: &mut Phy<R>, mac_state: &MacState, frame: &Frame<'_>) {
    let frame_pending = matches!(frame.content, FrameContent::Command(Command::DataRequest))
        && mac_state.is_coordinator
        && frame
            .header
            .source
            .is_some_and(|source| mac_state.indirect.has_pending_for(&source));

    let mut header = frame_header(FrameType::Acknowledgement, false, None, None);
    header.frame_pending = frame_pending;
    header.seq = frame.header.seq;

    let Ok(ack) = serialize_frame(Frame {
        header,
        content: FrameContent::Acknowledgement,
        payload: &[],
        footer: [0, 0],
    }) else {
        return;
    };

    match phy.transmit(&ack) {
        Ok(_) => trace!("Acked frame {}", frame.header.seq),
        Err(e) => error!("Could not send ack: {}", e),
    }
}

/// Answer a beacon request. Only a coordinator sends beacons.
fn send_beacon(mac_pib: &mut MacPib, mac_state: &mut MacState) {
    if !mac_state.is_coordinator {
        return;
    }

    let source = if mac_pib.has_usable_short_address() {
        Address::Short(mac_pib.pan_id, mac_pib.short_address)
    } else {
        Address::Extended(mac_pib.pan_id, mac_pib.extended_address)
    };

    let beacon_frame = Frame {
        header: frame_header(FrameType::Beacon, false, None, Some(source)),
        content: FrameContent::Beacon(Beacon {
            superframe_spec: SuperframeSpecification {
                beacon_order: BeaconOrder::OnDemand,
                superframe_order: SuperframeOrder::Inactive,
                final_cap_slot: 15,
                battery_life_extension: false,
                pan_coordinator: mac_state.is_pan_coordinator,
                association_permit: mac_pib.association_permit,
            },
            guaranteed_time_slot_info: GuaranteedTimeSlotInformation::new(),
            pending_address: PendingAddress::new(),
        }),
        payload: mac_pib.beacon_payload(),
        footer: [0, 0],
    };

    let frame = match serialize_frame(beacon_frame) {
        Ok(frame) => frame,
        Err(status) => {
            warn!("Could not build beacon: {:?}", status);
            return;
        }
    };

    debug!("Answering beacon request");

    let queued = mac_state.csma.enqueue(Transmission {
        frame,
        ack_request: false,
        sequence: SequenceNumbering::Preassigned(mac_pib.bsn.take()),
        callback: SendCallback::Beacon,
    });

    if queued.is_err() {
        warn!("No room to send a beacon");
    }
}

/// A device asks for the frames we hold for it.
fn extract_pending<R: Radio>(
    phy: &mut Phy<R>,
    mac_pib: &mut MacPib,
    mac_state: &mut MacState,
    host: &mut HostLink,
    source: Option<Address>,
    now: Instant,
) {
    if !mac_state.is_coordinator {
        return;
    }

    let Some(transaction) = source.and_then(|source| mac_state.indirect.take_for(&source)) else {
        trace!("Nothing pending for the requester");
        return;
    };

    trace!("Sending a pending frame");

    let callback = SendCallback::from(transaction.kind);
    let queued = mac_state.csma.enqueue(Transmission {
        frame: transaction.frame,
        ack_request: transaction.ack_request,
        sequence: SequenceNumbering::Dsn,
        callback,
    });

    if let Err(transmission) = queued {
        let outcome = TxOutcome {
            status: Status::TransactionOverflow,
            frame_pending: false,
            timestamp: now,
        };
        transmission
            .callback
            .run(outcome, phy, mac_pib, mac_state, host, now);
    }
}

/// Our coordinator moved the PAN. Only applies to associated devices.
fn follow_realignment<R: Radio>(
    phy: &mut Phy<R>,
    mac_pib: &mut MacPib,
    mac_state: &MacState,
    realignment: &CoordinatorRealignmentData,
    source: Option<Address>,
) {
    let from_coordinator = match source {
        Some(Address::Extended(_, address)) => {
            address != ExtendedAddress(0) && address == mac_pib.coord_extended_address
        }
        Some(Address::Short(_, address)) => {
            mac_pib.has_usable_short_address() && address == mac_pib.coord_short_address
        }
        None => false,
    };

    if mac_state.is_coordinator || !from_coordinator {
        return;
    }

    info!("Following our coordinator to channel {}", realignment.channel);

    mac_pib.pan_id = realignment.pan_id;
    mac_pib.coord_short_address = realignment.coordinator_address;

    if let Err(e) = phy.update_phy_pib(|phy_pib| phy_pib.current_channel = realignment.channel) {
        error!("Could not switch to the realigned channel: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::{
        chci::Event,
        test_helpers::aether::{Aether, AetherRadio},
        wire::command::AssociationStatus,
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
            let phy = Phy::new(aether.radio());
            let mut pib = MacPib::new(ExtendedAddress(0xC0), &mut StdRng::seed_from_u64(6));
            pib.pan_id = PanId(0x1234);
            pib.short_address = ShortAddress(0);
            let mut host = HostLink::new();
            host.registry.register_event_handler(|_: &[u8]| false);
            host.registry.register_data_handler(|_: &[u8]| false);

            Self {
                aether,
                phy,
                pib,
                state: MacState::new(),
                host,
            }
        }

        fn receive(&mut self, frame: Frame<'_>) {
            let raw_frame = RawFrame {
                data: serialize_frame(frame).unwrap(),
                link_quality: 0xFF,
                timestamp: self.aether.now(),
            };
            let now = self.aether.now();
            process_raw_frame(&mut self.phy, &mut self.pib, &mut self.state, &mut self.host, &raw_frame, now);
        }

        fn events(&mut self) -> Vec<Event> {
            core::iter::from_fn(|| self.host.take_message())
                .filter_map(|message| Event::from_message(message.bytes()).ok())
                .collect()
        }
    }

    const DEVICE: Address = Address::Extended(PanId(0x1234), ExtendedAddress(0xD0));

    fn command(command: Command, destination: Option<Address>, ack_request: bool) -> Frame<'static> {
        Frame {
            header: frame_header(FrameType::MacCommand, ack_request, destination, Some(DEVICE)),
            content: FrameContent::Command(command),
            payload: &[],
            footer: [0, 0],
        }
    }

    #[test_log::test]
    fn filters_other_destinations() {
        let mut bench = Bench::new();

        let elsewhere = Address::Short(PanId(0x1234), ShortAddress(0x0042));
        bench.receive(Frame {
            header: frame_header(FrameType::Data, true, Some(elsewhere), Some(DEVICE)),
            content: FrameContent::Data,
            payload: b"not ours",
            footer: [0, 0],
        });

        assert!(bench.host.take_message().is_none());
        assert_eq!(bench.aether.frames_sent(), 0);
    }

    #[test_log::test]
    fn unicast_data_is_acked_and_delivered() {
        let mut bench = Bench::new();

        bench.receive(Frame {
            header: frame_header(
                FrameType::Data,
                true,
                Some(Address::Short(PanId(0x1234), ShortAddress(0))),
                Some(DEVICE),
            ),
            content: FrameContent::Data,
            payload: b"ours",
            footer: [0, 0],
        });

        let message = bench.host.take_message().unwrap();
        assert!(matches!(message, crate::mac::host::HostMessage::Data(_)));

        let frames = bench.aether.frames();
        assert_eq!(frames.len(), 1);
        // Ack frame control, no frame pending
        assert_eq!(&frames[0].data[..2], &[0x02, 0x00]);
    }

    #[test_log::test]
    fn promiscuous_takes_everything() {
        let mut bench = Bench::new();
        bench.pib.promiscuous_mode = true;

        bench.receive(Frame {
            header: frame_header(
                FrameType::Data,
                true,
                Some(Address::Short(PanId(0x5555), ShortAddress(0x0042))),
                Some(DEVICE),
            ),
            content: FrameContent::Data,
            payload: b"sniffed",
            footer: [0, 0],
        });

        assert!(bench.host.take_message().is_some());
        assert_eq!(bench.aether.frames_sent(), 0, "no acks in promiscuous mode");
    }

    #[test_log::test]
    fn coordinator_answers_beacon_requests() {
        let mut bench = Bench::new();
        let bsn = bench.pib.bsn.value();
        let broadcast = Some(Address::Short(PanId::broadcast(), ShortAddress::BROADCAST));

        bench.receive(command(Command::BeaconRequest, broadcast, false));
        assert!(bench.state.csma.is_idle());

        bench.state.is_coordinator = true;
        bench.receive(command(Command::BeaconRequest, broadcast, false));
        assert!(!bench.state.csma.is_idle());
        assert_eq!(bench.pib.bsn.value(), bsn.wrapping_add(1));
    }

    #[test_log::test]
    fn data_request_ack_announces_pending_frames() {
        let mut bench = Bench::new();
        bench.state.is_coordinator = true;
        let coordinator = Some(Address::Short(PanId(0x1234), ShortAddress(0)));

        mlme_associate::process_associate_response(
            &bench.pib,
            &mut bench.state,
            &mut bench.host,
            crate::sap::associate::AssociateResponse {
                device_address: ExtendedAddress(0xD0),
                assoc_short_address: ShortAddress(7),
                status: AssociationStatus::Successful,
            },
            Instant::from_symbols(0),
        );

        bench.receive(command(Command::DataRequest, coordinator, true));

        let frames = bench.aether.frames();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data[0] & crate::mac::state::FRAME_PENDING_BIT, crate::mac::state::FRAME_PENDING_BIT);
        assert!(bench.state.indirect.is_empty());
        assert!(!bench.state.csma.is_idle());
    }

    #[test_log::test]
    fn association_request_needs_permit() {
        let mut bench = Bench::new();
        bench.state.is_coordinator = true;
        let coordinator = Some(Address::Short(PanId(0x1234), ShortAddress(0)));
        let capability = crate::sap::associate::capability_from_byte(0x80);

        bench.receive(command(Command::AssociationRequest(capability), coordinator, true));
        assert!(bench.events().is_empty());

        bench.pib.association_permit = true;
        bench.receive(command(Command::AssociationRequest(capability), coordinator, true));
        assert_eq!(
            bench.events(),
            [Event::AssociateIndication(crate::sap::associate::AssociateIndication {
                device_address: ExtendedAddress(0xD0),
                capability_information: capability,
            })]
        );
    }
}
