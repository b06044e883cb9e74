use super::{
    callback::SendCallback,
    csma::{SequenceNumbering, Transmission, TxOutcome},
    host::HostLink,
    phy::Phy,
    state::{frame_header, serialize_frame, MacState},
};
use crate::{
    consts,
    pib::MacPib,
    radio::Radio,
    sap::{
        start::{StartConfirm, StartRequest},
        Status,
    },
    wire::{
        command::{Command, CoordinatorRealignmentData},
        Address, Frame, FrameContent, FrameType, PanId, ShortAddress,
    },
};

pub fn process_start_request<R: Radio>(
    phy: &mut Phy<R>,
    mac_pib: &mut MacPib,
    mac_state: &mut MacState,
    host: &mut HostLink,
    request: StartRequest,
) {
    // Only nonbeacon-enabled PANs
    if request.beacon_order != consts::NON_BEACON_ORDER
        || request.superframe_order != consts::NON_BEACON_ORDER
        || !consts::channel_supported(request.channel_number)
        || request.channel_page != 0
    {
        host.event(StartConfirm {
            status: Status::InvalidParameter,
        });
        return;
    }

    // Reject if the short address hasn't been set yet
    if mac_pib.short_address == ShortAddress::BROADCAST {
        host.event(StartConfirm {
            status: Status::NoShortAddress,
        });
        return;
    }

    if !request.coord_realignment {
        // We can apply the changes immediately
        apply_changes(phy, mac_pib, mac_state, host, request);
        return;
    }

    if mac_state.pending.realignment.arm(()).is_err() {
        host.event(StartConfirm {
            status: Status::DuplicateRequest,
        });
        return;
    }

    // We need to send a realignment message and only after that apply the changes.
    // This happens in the callback
    let coord_realignment_message = Frame {
        header: frame_header(
            FrameType::MacCommand,
            false,
            Some(Address::Short(PanId::broadcast(), ShortAddress::BROADCAST)),
            Some(Address::Extended(mac_pib.pan_id, mac_pib.extended_address)),
        ),
        content: FrameContent::Command(Command::CoordinatorRealignment(CoordinatorRealignmentData {
            pan_id: request.pan_id,
            coordinator_address: mac_pib.short_address,
            channel: request.channel_number,
            device_address: ShortAddress::BROADCAST,
            channel_page: None,
        })),
        payload: &[],
        footer: [0, 0],
    };

    debug!("Broadcasting coordinator realignment");

    let queued = serialize_frame(coord_realignment_message).and_then(|frame| {
        mac_state
            .csma
            .enqueue(Transmission {
                frame,
                ack_request: false,
                sequence: SequenceNumbering::Dsn,
                callback: SendCallback::CoordRealignment(request),
            })
            .map_err(|_| Status::TransactionOverflow)
    });

    if let Err(status) = queued {
        mac_state.pending.realignment.complete();
        host.event(StartConfirm { status });
    }
}

pub fn coord_realignment_sent_callback<R: Radio>(
    outcome: TxOutcome,
    phy: &mut Phy<R>,
    mac_pib: &mut MacPib,
    mac_state: &mut MacState,
    host: &mut HostLink,
    request: StartRequest,
) {
    mac_state.pending.realignment.complete();

    if outcome.status.is_success() {
        apply_changes(phy, mac_pib, mac_state, host, request);
    } else {
        host.event(StartConfirm {
            status: outcome.status,
        });
    }
}

fn apply_changes<R: Radio>(
    phy: &mut Phy<R>,
    mac_pib: &mut MacPib,
    mac_state: &mut MacState,
    host: &mut HostLink,
    request: StartRequest,
) {
    if let Err(e) = phy.update_phy_pib(|phy_pib| phy_pib.current_channel = request.channel_number) {
        error!("Updating the channel for the start request returned an error: {}", e);
        host.event(StartConfirm {
            status: Status::PhyError,
        });
        return;
    }

    mac_pib.pan_id = request.pan_id;
    mac_state.is_coordinator = true;
    mac_state.is_pan_coordinator = request.pan_coordinator;

    info!(
        "Started PAN {:#x} on channel {}",
        request.pan_id.0, request.channel_number
    );

    host.event(StartConfirm {
        status: Status::Success,
    });
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::{
        chci::Event,
        test_helpers::aether::{Aether, AetherRadio},
        time::Instant,
        wire::ExtendedAddress,
    };

    struct Bench {
        _aether: Aether,
        phy: Phy<AetherRadio>,
        pib: MacPib,
        state: MacState,
        host: HostLink<'static>,
    }

    impl Bench {
        fn new() -> Self {
            let mut aether = Aether::new();
            let phy = Phy::new(aether.radio());
            let pib = MacPib::new(ExtendedAddress(0xC0), &mut StdRng::seed_from_u64(2));
            let mut host = HostLink::new();
            host.registry.register_event_handler(|_: &[u8]| false);

            Self {
                _aether: aether,
                phy,
                pib,
                state: MacState::new(),
                host,
            }
        }

        fn start(&mut self, request: StartRequest) {
            process_start_request(&mut self.phy, &mut self.pib, &mut self.state, &mut self.host, request);
        }

        fn statuses(&mut self) -> Vec<Status> {
            core::iter::from_fn(|| self.host.take_message())
                .map(|message| match Event::from_message(message.bytes()) {
                    Ok(Event::StartConfirm(confirm)) => confirm.status,
                    other => panic!("expected a start confirm, got {other:?}"),
                })
                .collect()
        }
    }

    fn request(coord_realignment: bool) -> StartRequest {
        StartRequest {
            pan_id: PanId(0x0BAD),
            channel_number: 20,
            channel_page: 0,
            beacon_order: 15,
            superframe_order: 15,
            pan_coordinator: true,
            coord_realignment,
        }
    }

    #[test_log::test]
    fn needs_a_short_address() {
        let mut bench = Bench::new();

        bench.start(request(false));
        assert_eq!(bench.statuses(), [Status::NoShortAddress]);
        assert!(!bench.state.is_coordinator);

        bench.pib.short_address = ShortAddress(0);
        bench.start(request(false));
        assert_eq!(bench.statuses(), [Status::Success]);
        assert!(bench.state.is_coordinator);
        assert!(bench.state.is_pan_coordinator);
        assert_eq!(bench.pib.pan_id, PanId(0x0BAD));
        assert_eq!(bench.phy.pib().current_channel, 20);
    }

    #[test_log::test]
    fn beacon_enabled_pans_are_rejected() {
        let mut bench = Bench::new();
        bench.pib.short_address = ShortAddress(0);

        let mut beacon_enabled = request(false);
        beacon_enabled.beacon_order = 6;
        beacon_enabled.superframe_order = 4;
        bench.start(beacon_enabled);

        assert_eq!(bench.statuses(), [Status::InvalidParameter]);
    }

    #[test_log::test]
    fn realignment_goes_first() {
        let mut bench = Bench::new();
        bench.pib.short_address = ShortAddress(0);

        bench.start(request(true));
        assert!(bench.statuses().is_empty());
        assert!(!bench.state.csma.is_idle());
        assert_eq!(bench.pib.pan_id, PanId::broadcast());

        coord_realignment_sent_callback(
            TxOutcome {
                status: Status::ChannelAccessFailure,
                frame_pending: false,
                timestamp: Instant::from_symbols(0),
            },
            &mut bench.phy,
            &mut bench.pib,
            &mut bench.state,
            &mut bench.host,
            request(true),
        );
        assert_eq!(bench.statuses(), [Status::ChannelAccessFailure]);

        coord_realignment_sent_callback(
            TxOutcome {
                status: Status::Success,
                frame_pending: false,
                timestamp: Instant::from_symbols(0),
            },
            &mut bench.phy,
            &mut bench.pib,
            &mut bench.state,
            &mut bench.host,
            request(true),
        );
        assert_eq!(bench.statuses(), [Status::Success]);
        assert_eq!(bench.pib.pan_id, PanId(0x0BAD));
    }

    #[test_log::test]
    fn one_realignment_at_a_time() {
        let mut bench = Bench::new();
        bench.pib.short_address = ShortAddress(0);

        bench.start(request(true));
        bench.start(request(true));
        assert_eq!(bench.statuses(), [Status::DuplicateRequest]);

        // A start without realignment isn't held up
        bench.start(request(false));
        assert_eq!(bench.statuses(), [Status::Success]);

        coord_realignment_sent_callback(
            TxOutcome {
                status: Status::Success,
                frame_pending: false,
                timestamp: Instant::from_symbols(0),
            },
            &mut bench.phy,
            &mut bench.pib,
            &mut bench.state,
            &mut bench.host,
            request(true),
        );
        assert_eq!(bench.statuses(), [Status::Success]);
        assert!(!bench.state.pending.realignment.is_busy());

        bench.start(request(true));
        assert!(bench.statuses().is_empty());
        assert!(bench.state.pending.realignment.is_busy());
    }
}
