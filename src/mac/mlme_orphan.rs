use super::{
    callback::SendCallback,
    csma::{SequenceNumbering, Transmission, TxOutcome},
    host::HostLink,
    state::{frame_header, serialize_frame, MacState},
};
use crate::{
    pib::MacPib,
    sap::{
        comm_status::CommStatusIndication,
        orphan::{OrphanIndication, OrphanResponse},
        Status,
    },
    wire::{
        command::{Command, CoordinatorRealignmentData},
        Address, ExtendedAddress, Frame, FrameContent, FrameType, PanId,
    },
};

/// Answer an orphan indication. Only an associated member gets a coordinator realignment.
pub fn process_orphan_response(
    mac_pib: &MacPib,
    mac_state: &mut MacState,
    host: &mut HostLink,
    response: OrphanResponse,
    current_channel: u8,
) {
    if !response.associated_member {
        trace!("Orphan is not ours");
        return;
    }

    let orphan = response.orphan_address;

    if !mac_state.is_coordinator {
        host.event(orphan_comm_status(mac_pib, orphan, Status::InvalidParameter));
        return;
    }

    let realignment = Frame {
        header: frame_header(
            FrameType::MacCommand,
            true,
            Some(Address::Extended(PanId::broadcast(), orphan)),
            Some(Address::Extended(mac_pib.pan_id, mac_pib.extended_address)),
        ),
        content: FrameContent::Command(Command::CoordinatorRealignment(
            CoordinatorRealignmentData {
                pan_id: mac_pib.pan_id,
                coordinator_address: mac_pib.short_address,
                channel: current_channel,
                device_address: response.short_address,
                channel_page: None,
            },
        )),
        payload: &[],
        footer: [0, 0],
    };

    let queued = serialize_frame(realignment).and_then(|frame| {
        mac_state
            .csma
            .enqueue(Transmission {
                frame,
                ack_request: true,
                sequence: SequenceNumbering::Dsn,
                callback: SendCallback::OrphanRealignment { orphan },
            })
            .map_err(|_| Status::TransactionOverflow)
    });

    match queued {
        Ok(()) => debug!("Realigning orphan to short address {}", response.short_address.0),
        Err(status) => host.event(orphan_comm_status(mac_pib, orphan, status)),
    }
}

pub fn orphan_realignment_sent(
    outcome: TxOutcome,
    mac_pib: &MacPib,
    host: &mut HostLink,
    orphan: ExtendedAddress,
) {
    host.event(orphan_comm_status(mac_pib, orphan, outcome.status));
}

fn orphan_comm_status(mac_pib: &MacPib, orphan: ExtendedAddress, status: Status) -> CommStatusIndication {
    CommStatusIndication {
        pan_id: mac_pib.pan_id,
        src_address: Some(Address::Extended(mac_pib.pan_id, mac_pib.extended_address)),
        dst_address: Some(Address::Extended(PanId::broadcast(), orphan)),
        status,
    }
}

/// A device lost its coordinator and asks whether we are it.
pub fn orphan_notification_received(mac_state: &MacState, host: &mut HostLink, source: Option<Address>) {
    if !mac_state.is_coordinator {
        return;
    }

    let Some(Address::Extended(_, orphan_address)) = source else {
        trace!("Orphan notification without extended source");
        return;
    };

    host.event(OrphanIndication { orphan_address });
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::{chci::Event, time::Instant, wire::ShortAddress};

    fn setup() -> (MacPib, MacState, HostLink<'static>) {
        let mut pib = MacPib::new(ExtendedAddress(0xC0), &mut StdRng::seed_from_u64(3));
        pib.pan_id = PanId(0x1234);
        pib.short_address = ShortAddress(0);
        let mut state = MacState::new();
        state.is_coordinator = true;
        let mut host = HostLink::new();
        host.registry.register_event_handler(|_: &[u8]| false);

        (pib, state, host)
    }

    fn events(host: &mut HostLink) -> Vec<Event> {
        core::iter::from_fn(|| host.take_message())
            .map(|message| Event::from_message(message.bytes()).unwrap())
            .collect()
    }

    #[test_log::test]
    fn declined_orphan_gets_nothing() {
        let (pib, mut state, mut host) = setup();

        process_orphan_response(
            &pib,
            &mut state,
            &mut host,
            OrphanResponse {
                orphan_address: ExtendedAddress(0xD0),
                short_address: ShortAddress(5),
                associated_member: false,
            },
            20,
        );

        assert!(events(&mut host).is_empty());
        assert!(state.csma.is_idle());
    }

    #[test_log::test]
    fn member_is_realigned() {
        let (pib, mut state, mut host) = setup();

        process_orphan_response(
            &pib,
            &mut state,
            &mut host,
            OrphanResponse {
                orphan_address: ExtendedAddress(0xD0),
                short_address: ShortAddress(5),
                associated_member: true,
            },
            20,
        );
        assert!(!state.csma.is_idle());

        orphan_realignment_sent(
            TxOutcome {
                status: Status::Success,
                frame_pending: false,
                timestamp: Instant::from_symbols(50),
            },
            &pib,
            &mut host,
            ExtendedAddress(0xD0),
        );

        assert_eq!(
            events(&mut host),
            [Event::CommStatusIndication(CommStatusIndication {
                pan_id: PanId(0x1234),
                src_address: Some(Address::Extended(PanId(0x1234), ExtendedAddress(0xC0))),
                dst_address: Some(Address::Extended(PanId::broadcast(), ExtendedAddress(0xD0))),
                status: Status::Success,
            })]
        );
    }

    #[test_log::test]
    fn notification_raises_indication() {
        let (_, mut state, mut host) = setup();
        let orphan = Some(Address::Extended(PanId::broadcast(), ExtendedAddress(0xD0)));

        orphan_notification_received(&state, &mut host, orphan);
        state.is_coordinator = false;
        orphan_notification_received(&state, &mut host, orphan);

        assert_eq!(
            events(&mut host),
            [Event::OrphanIndication(OrphanIndication {
                orphan_address: ExtendedAddress(0xD0)
            })]
        );
    }
}
