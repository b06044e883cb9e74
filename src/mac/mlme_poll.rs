use super::{
    callback::SendCallback,
    csma::{SequenceNumbering, Transmission, TxOutcome},
    host::HostLink,
    state::{frame_header, serialize_frame, FrameBuffer, MacState},
};
use crate::{
    pib::MacPib,
    sap::{
        poll::{PollConfirm, PollIndication, PollRequest},
        Status,
    },
    time::Instant,
    wire::{command::Command, Address, Frame, FrameContent, FrameType},
};

/// Build the data request command that asks a coordinator for pending frames.
///
/// The short address is the source once the device has a usable one.
pub fn data_request_frame(mac_pib: &MacPib, coordinator: Address) -> Result<FrameBuffer, Status> {
    let source = if mac_pib.has_usable_short_address() {
        Address::Short(mac_pib.pan_id, mac_pib.short_address)
    } else {
        Address::Extended(mac_pib.pan_id, mac_pib.extended_address)
    };

    serialize_frame(Frame {
        header: frame_header(FrameType::MacCommand, true, Some(coordinator), Some(source)),
        content: FrameContent::Command(Command::DataRequest),
        payload: &[],
        footer: [0, 0],
    })
}

pub fn process_poll_request(
    mac_pib: &MacPib,
    mac_state: &mut MacState,
    host: &mut HostLink,
    request: PollRequest,
) {
    let Some(coordinator) = request.coord_address else {
        host.event(PollConfirm {
            status: Status::InvalidParameter,
        });
        return;
    };

    if mac_state.pending.poll.arm(coordinator).is_err() {
        host.event(PollConfirm {
            status: Status::DuplicateRequest,
        });
        return;
    }

    debug!("Polling the coordinator");

    let queued = data_request_frame(mac_pib, coordinator).and_then(|frame| {
        mac_state
            .csma
            .enqueue(Transmission {
                frame,
                ack_request: true,
                sequence: SequenceNumbering::Dsn,
                callback: SendCallback::Poll,
            })
            .map_err(|_| Status::TransactionOverflow)
    });

    if let Err(status) = queued {
        mac_state.pending.poll.complete();
        host.event(PollConfirm { status });
    }
}

pub fn poll_sent(
    outcome: TxOutcome,
    mac_pib: &MacPib,
    mac_state: &mut MacState,
    host: &mut HostLink,
    now: Instant,
) {
    if outcome.status.is_success() && outcome.frame_pending {
        trace!("Coordinator has data for us");
        mac_state
            .pending
            .poll
            .await_response(now + mac_pib.max_frame_total_wait_time());
        return;
    }

    mac_state.pending.poll.complete();

    let status = match outcome.status {
        Status::Success => Status::NoData,
        status => status,
    };
    debug!("Poll done: {:?}", status);
    host.event(PollConfirm { status });
}

/// Ends the poll when the coordinator never sent the data it announced.
pub fn expire_poll(mac_state: &mut MacState, host: &mut HostLink, now: Instant) {
    if mac_state.pending.poll.take_expired(now).is_some() {
        debug!("Poll timed out");
        host.event(PollConfirm {
            status: Status::NoData,
        });
    }
}

/// A data frame came in. Ends a poll that was waiting for it.
pub fn poll_data_received(
    mac_pib: &MacPib,
    mac_state: &mut MacState,
    host: &mut HostLink,
    frame: &Frame<'_>,
) {
    if !mac_state.pending.poll.is_awaiting_response() {
        return;
    }

    // Only the polled coordinator can answer
    let polled = mac_state.pending.poll.context().copied();
    let from_coordinator = frame.header.source.is_some_and(|source| {
        Some(source) == polled || mac_pib.is_coordinator_address(source)
    });
    if !from_coordinator {
        trace!("Data frame isn't from the polled coordinator");
        return;
    }

    mac_state.pending.poll.complete();

    let status = if frame.payload.is_empty() {
        Status::NoData
    } else {
        Status::Success
    };

    host.event(PollConfirm { status });

    if status == Status::Success {
        host.event(PollIndication {
            src_address: frame.header.source,
            data_length: frame.payload.len() as u8,
        });
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::{
        chci::Event,
        time::Duration,
        wire::{ExtendedAddress, PanId, ShortAddress},
    };

    fn setup() -> (MacPib, MacState, HostLink<'static>) {
        let pib = MacPib::new(ExtendedAddress(0xAA), &mut StdRng::seed_from_u64(5));
        let mut host = HostLink::new();
        host.registry.register_event_handler(|_: &[u8]| false);

        (pib, MacState::new(), host)
    }

    fn events(host: &mut HostLink) -> Vec<Event> {
        core::iter::from_fn(|| host.take_message())
            .map(|message| Event::from_message(message.bytes()).unwrap())
            .collect()
    }

    fn outcome(status: Status, frame_pending: bool) -> TxOutcome {
        TxOutcome {
            status,
            frame_pending,
            timestamp: Instant::from_symbols(10),
        }
    }

    const COORDINATOR: Address = Address::Short(PanId(0x1234), ShortAddress(0));

    #[test]
    fn source_address_choice() {
        let (mut pib, _, _) = setup();
        pib.pan_id = PanId(0x1234);

        let frame = data_request_frame(&pib, COORDINATOR).unwrap();
        let frame = crate::mac::state::deserialize_frame(&frame).unwrap();
        assert_eq!(frame.header.source, Some(Address::Extended(PanId(0x1234), ExtendedAddress(0xAA))));
        assert!(frame.header.ack_request);

        pib.short_address = ShortAddress(5);
        let frame = data_request_frame(&pib, COORDINATOR).unwrap();
        let frame = crate::mac::state::deserialize_frame(&frame).unwrap();
        assert_eq!(frame.header.source, Some(Address::Short(PanId(0x1234), ShortAddress(5))));
    }

    #[test]
    fn nothing_pending() {
        let (pib, mut state, mut host) = setup();

        process_poll_request(&pib, &mut state, &mut host, PollRequest { coord_address: Some(COORDINATOR) });
        process_poll_request(&pib, &mut state, &mut host, PollRequest { coord_address: Some(COORDINATOR) });
        assert_eq!(
            events(&mut host),
            [Event::PollConfirm(PollConfirm { status: Status::DuplicateRequest })]
        );

        poll_sent(outcome(Status::Success, false), &pib, &mut state, &mut host, Instant::from_symbols(10));
        assert_eq!(events(&mut host), [Event::PollConfirm(PollConfirm { status: Status::NoData })]);
        assert!(!state.pending.poll.is_busy());
    }

    #[test]
    fn announced_data_never_arrives() {
        let (pib, mut state, mut host) = setup();
        let now = Instant::from_symbols(10);

        process_poll_request(&pib, &mut state, &mut host, PollRequest { coord_address: Some(COORDINATOR) });
        poll_sent(outcome(Status::Success, true), &pib, &mut state, &mut host, now);
        assert!(state.pending.poll.is_awaiting_response());

        expire_poll(&mut state, &mut host, now + Duration::from_symbols(1));
        assert!(events(&mut host).is_empty());

        expire_poll(&mut state, &mut host, now + pib.max_frame_total_wait_time());
        assert_eq!(events(&mut host), [Event::PollConfirm(PollConfirm { status: Status::NoData })]);
    }

    #[test]
    fn data_arrives() {
        let (pib, mut state, mut host) = setup();

        process_poll_request(&pib, &mut state, &mut host, PollRequest { coord_address: Some(COORDINATOR) });
        poll_sent(outcome(Status::Success, true), &pib, &mut state, &mut host, Instant::from_symbols(10));

        let frame = Frame {
            header: frame_header(FrameType::Data, false, None, Some(COORDINATOR)),
            content: FrameContent::Data,
            payload: b"abc",
            footer: [0, 0],
        };
        poll_data_received(&pib, &mut state, &mut host, &frame);

        assert_eq!(
            events(&mut host),
            [
                Event::PollConfirm(PollConfirm { status: Status::Success }),
                Event::PollIndication(PollIndication {
                    src_address: Some(COORDINATOR),
                    data_length: 3
                }),
            ]
        );
    }

    #[test]
    fn data_from_someone_else() {
        let (mut pib, mut state, mut host) = setup();
        pib.pan_id = PanId(0x1234);
        pib.coord_extended_address = ExtendedAddress(0xC0);

        process_poll_request(&pib, &mut state, &mut host, PollRequest { coord_address: Some(COORDINATOR) });
        poll_sent(outcome(Status::Success, true), &pib, &mut state, &mut host, Instant::from_symbols(10));

        let data_from = |source| Frame {
            header: frame_header(FrameType::Data, false, None, Some(source)),
            content: FrameContent::Data,
            payload: b"abc",
            footer: [0, 0],
        };

        // Another device in the same PAN
        poll_data_received(&pib, &mut state, &mut host, &data_from(Address::Short(PanId(0x1234), ShortAddress(7))));
        assert!(events(&mut host).is_empty());
        assert!(state.pending.poll.is_awaiting_response());

        // The coordinator, by its extended address
        let coordinator = Address::Extended(PanId(0x1234), ExtendedAddress(0xC0));
        poll_data_received(&pib, &mut state, &mut host, &data_from(coordinator));
        assert_eq!(
            events(&mut host),
            [
                Event::PollConfirm(PollConfirm { status: Status::Success }),
                Event::PollIndication(PollIndication {
                    src_address: Some(coordinator),
                    data_length: 3
                }),
            ]
        );
    }

    #[test]
    fn failed_transmission() {
        let (pib, mut state, mut host) = setup();

        process_poll_request(&pib, &mut state, &mut host, PollRequest { coord_address: None });
        process_poll_request(&pib, &mut state, &mut host, PollRequest { coord_address: Some(COORDINATOR) });
        poll_sent(outcome(Status::NoAck, false), &pib, &mut state, &mut host, Instant::from_symbols(10));

        assert_eq!(
            events(&mut host),
            [
                Event::PollConfirm(PollConfirm { status: Status::InvalidParameter }),
                Event::PollConfirm(PollConfirm { status: Status::NoAck }),
            ]
        );
    }
}
