use std::fs::File;

use lr_wpan_mac154::{
    chci::Event,
    pib::{PibAttribute, PibValue},
    sap::{
        comm_status::CommStatusIndication,
        get::GetRequest,
        orphan::{OrphanIndication, OrphanResponse},
        reset::{ResetConfirm, ResetRequest},
        scan::{ScanConfirm, ScanRequest, ScanType},
        set::SetRequest,
        start::StartRequest,
        Status,
    },
    test_helpers::run::{run_mac_engine_multi, run_mac_engine_simple, Node, Runner},
    time::Duration,
    wire::{command::Command, Address, ExtendedAddress, Frame, FrameContent, PanId, ShortAddress},
};
use pretty_assertions::assert_eq;
use test_log::test;

const PAN: PanId = PanId(0x0BAD);
const CHANNEL: u8 = 15;
/// Orphan scans dwell macResponseWaitTime (30720 symbols) on every channel.
const SCAN_TIMEOUT: Duration = Duration::from_symbols(100_000);

fn channels(channels: &[u8]) -> u32 {
    channels.iter().fold(0, |mask, channel| mask | 1 << channel)
}

fn scan(node: &mut Node, scan_type: ScanType, scan_channels: u32) {
    assert!(node.command(ScanRequest {
        scan_type,
        scan_channels,
        scan_duration: 1,
        channel_page: 0,
    }));
}

fn scan_confirm(runner: &mut Runner, index: usize) -> ScanConfirm {
    match runner.wait_for_event(index, SCAN_TIMEOUT, |event| {
        matches!(event, Event::ScanConfirm(_))
    }) {
        Some(Event::ScanConfirm(confirm)) => confirm,
        other => panic!("expected a scan confirm, got {other:?}"),
    }
}

/// Node 0 coordinates a PAN on [CHANNEL].
fn coordinator(count: usize) -> Runner {
    let mut runner = run_mac_engine_multi(count);
    let node = &mut runner.nodes[0];
    node.mac.pib_mut().short_address = ShortAddress(0);

    assert!(node.command(StartRequest {
        pan_id: PAN,
        channel_number: CHANNEL,
        channel_page: 0,
        beacon_order: 15,
        superframe_order: 15,
        pan_coordinator: true,
        coord_realignment: false,
    }));
    node.take_events();

    runner.tick();
    runner
}

#[test]
fn passive_scan_of_an_empty_aether() {
    let mut runner = run_mac_engine_simple();
    runner.nodes[0].mac.pib_mut().pan_id = PanId(0x0042);

    scan(&mut runner.nodes[0], ScanType::Passive, channels(&[11, 12, 13]));
    let confirm = scan_confirm(&mut runner, 0);

    assert_eq!(confirm.status, Status::Success);
    assert_eq!(confirm.scan_type, ScanType::Passive);
    assert!(confirm.pan_descriptor_list.is_empty());
    assert_eq!(confirm.unscanned_channels, 0);

    // Restored after the scan
    assert_eq!(runner.nodes[0].mac.pib().pan_id, PanId(0x0042));
    assert_eq!(runner.nodes[0].mac.phy_pib().current_channel, 11);
    assert_eq!(runner.aether.frames_sent(), 0);
}

#[test]
fn active_scan_finds_the_coordinator() {
    let mut runner = coordinator(2);

    scan(&mut runner.nodes[1], ScanType::Active, channels(&[14, 15, 16]));
    let confirm = scan_confirm(&mut runner, 1);

    assert_eq!(confirm.status, Status::Success);
    assert_eq!(confirm.unscanned_channels, 0);
    assert_eq!(confirm.pan_descriptor_list.len(), 1);

    let descriptor = &confirm.pan_descriptor_list[0];
    assert_eq!(descriptor.coord_address, Address::Short(PAN, ShortAddress(0)));
    assert_eq!(descriptor.channel_number, CHANNEL);
    assert!(descriptor.super_frame_spec.pan_coordinator);
    assert!(!descriptor.super_frame_spec.association_permit);

    // No payload and macAutoRequest set, so no notifications
    assert!(runner.nodes[1].take_events().is_empty());
    assert_eq!(runner.nodes[1].mac.pib().pan_id, PanId::broadcast());
}

#[test]
fn active_scan_on_the_air() {
    let mut runner = coordinator(3);
    runner.nodes[1].mac.pib_mut().short_address = ShortAddress(1);
    assert!(runner.nodes[1].command(StartRequest {
        pan_id: PanId(0x0C0C),
        channel_number: CHANNEL,
        channel_page: 0,
        beacon_order: 15,
        superframe_order: 15,
        pan_coordinator: true,
        coord_realignment: false,
    }));

    let path = std::env::temp_dir().join(format!("scan-active-{}.pcap", std::process::id()));
    runner.aether.start_trace(File::create(&path).unwrap());

    scan(&mut runner.nodes[2], ScanType::Active, channels(&[CHANNEL]));
    let confirm = scan_confirm(&mut runner, 2);
    runner.aether.stop_trace();

    let mut frames = runner.aether.parse_trace(File::open(&path).unwrap());

    assert!(matches!(
        frames.next(),
        Some(Frame {
            content: FrameContent::Command(Command::BeaconRequest),
            ..
        })
    ));
    let beacons: Vec<_> = frames.collect();
    assert_eq!(beacons.len(), 2);
    assert!(beacons
        .iter()
        .all(|frame| matches!(frame.content, FrameContent::Beacon(_))));

    assert_eq!(confirm.status, Status::Success);
    let mut pans: Vec<_> = confirm
        .pan_descriptor_list
        .iter()
        .map(|descriptor| descriptor.coord_address.pan_id())
        .collect();
    pans.sort_by_key(|pan| pan.0);
    assert_eq!(pans, [PAN, PanId(0x0C0C)]);

    let _ = std::fs::remove_file(&path);
}

#[test]
fn beacon_payload_is_notified() {
    let mut runner = coordinator(2);

    let payload = PibValue::MacBeaconPayload([0xC0, 0xFF, 0xEE].into_iter().collect());
    assert!(runner.nodes[0].command(SetRequest {
        pib_attribute: payload.attribute().into(),
        pib_attribute_value: payload.encode(),
    }));

    scan(&mut runner.nodes[1], ScanType::Active, channels(&[CHANNEL]));
    let notify = runner
        .wait_for_event(1, SCAN_TIMEOUT, |event| {
            matches!(event, Event::BeaconNotifyIndication(_))
        })
        .unwrap();

    let Event::BeaconNotifyIndication(indication) = notify else {
        unreachable!()
    };
    assert_eq!(indication.sdu.as_slice(), &[0xC0, 0xFF, 0xEE]);
    assert_eq!(indication.pan_descriptor.coord_address, Address::Short(PAN, ShortAddress(0)));

    // The beacon is recorded as well
    assert_eq!(scan_confirm(&mut runner, 1).pan_descriptor_list.len(), 1);
}

#[test]
fn energy_detect_scan() {
    let mut runner = run_mac_engine_simple();
    runner.aether.set_channel_energy(20, 0x33);
    runner.aether.set_channel_energy(22, 0xA0);

    scan(&mut runner.nodes[0], ScanType::Ed, channels(&[20, 21, 22]));
    let confirm = scan_confirm(&mut runner, 0);

    assert_eq!(confirm.status, Status::Success);
    assert_eq!(confirm.energy_detect_list.as_slice(), &[0x33, 0x00, 0xA0]);
    assert!(confirm.pan_descriptor_list.is_empty());
}

#[test]
fn unsupported_channels() {
    let mut runner = run_mac_engine_simple();

    scan(&mut runner.nodes[0], ScanType::Passive, channels(&[10, 11]));
    assert_eq!(
        runner.nodes[0].take_events(),
        [Event::ScanConfirm(ScanConfirm::new(
            Status::InvalidParameter,
            ScanType::Passive,
            0
        ))]
    );
}

#[test]
fn one_scan_at_a_time() {
    let mut runner = run_mac_engine_simple();

    scan(&mut runner.nodes[0], ScanType::Passive, channels(&[11]));
    scan(&mut runner.nodes[0], ScanType::Active, channels(&[12]));

    assert_eq!(
        runner.nodes[0].take_events(),
        [Event::ScanConfirm(ScanConfirm::new(
            Status::ScanInProgress,
            ScanType::Active,
            0
        ))]
    );

    // The first scan still finishes normally
    assert_eq!(scan_confirm(&mut runner, 0).status, Status::Success);
}

fn get(node: &mut Node, attribute: PibAttribute) -> Option<PibValue> {
    assert!(node.command(GetRequest {
        pib_attribute: attribute.into(),
    }));

    match node.take_events().as_slice() {
        [Event::GetConfirm(confirm)] if confirm.status == Status::Success => confirm.pib_value(),
        other => panic!("expected a get confirm, got {other:?}"),
    }
}

#[test]
fn reset_during_a_scan_keeps_the_pib() {
    let mut runner = run_mac_engine_simple();
    let node = &mut runner.nodes[0];

    let pan_id = PibValue::MacPanId(PanId(0x1234));
    assert!(node.command(SetRequest {
        pib_attribute: pan_id.attribute().into(),
        pib_attribute_value: pan_id.encode(),
    }));
    node.take_events();

    scan(node, ScanType::Active, channels(&[14, 15]));
    assert_eq!(node.mac.pib().pan_id, PanId::broadcast());
    assert_eq!(node.mac.phy_pib().current_channel, 14);

    assert!(node.command(ResetRequest {
        set_default_pib: false,
    }));
    assert_eq!(
        node.take_events(),
        [Event::ResetConfirm(ResetConfirm {
            status: Status::Success
        })]
    );

    assert_eq!(get(node, PibAttribute::MacPanId), Some(PibValue::MacPanId(PanId(0x1234))));
    assert_eq!(
        get(node, PibAttribute::PhyCurrentChannel),
        Some(PibValue::PhyCurrentChannel(11))
    );

    // The scan is gone for good
    runner.run_for(SCAN_TIMEOUT);
    assert!(runner.nodes[0].take_events().is_empty());
    assert_eq!(runner.aether.frames_sent(), 0);
}

#[test]
fn orphan_is_realigned() {
    let mut runner = coordinator(2);

    scan(&mut runner.nodes[1], ScanType::Orphan, channels(&[CHANNEL]));

    let indication = runner.wait_for_event(0, Duration::from_symbols(5_000), |event| {
        matches!(event, Event::OrphanIndication(_))
    });
    assert_eq!(
        indication,
        Some(Event::OrphanIndication(OrphanIndication {
            orphan_address: ExtendedAddress(2),
        }))
    );

    assert!(runner.nodes[0].command(OrphanResponse {
        orphan_address: ExtendedAddress(2),
        short_address: ShortAddress(0x0007),
        associated_member: true,
    }));

    let confirm = scan_confirm(&mut runner, 1);
    assert_eq!(confirm.status, Status::Success);
    assert_eq!(confirm.scan_type, ScanType::Orphan);

    let device = runner.nodes[1].mac.pib();
    assert_eq!(device.pan_id, PAN);
    assert_eq!(device.short_address, ShortAddress(0x0007));
    assert_eq!(device.coord_short_address, ShortAddress(0));
    assert_eq!(device.coord_extended_address, ExtendedAddress(1));
    assert_eq!(runner.nodes[1].mac.phy_pib().current_channel, CHANNEL);

    let status = runner.wait_for_event(0, Duration::from_symbols(5_000), |event| {
        matches!(event, Event::CommStatusIndication(_))
    });
    assert_eq!(
        status,
        Some(Event::CommStatusIndication(CommStatusIndication {
            pan_id: PAN,
            src_address: Some(Address::Extended(PAN, ExtendedAddress(1))),
            dst_address: Some(Address::Extended(PanId::broadcast(), ExtendedAddress(2))),
            status: Status::Success,
        }))
    );
}

#[test]
fn orphan_without_coordinator() {
    let mut runner = run_mac_engine_simple();

    scan(&mut runner.nodes[0], ScanType::Orphan, channels(&[11, 12]));
    let confirm = scan_confirm(&mut runner, 0);

    assert_eq!(confirm.status, Status::NoBeacon);
    // Two orphan notifications
    assert_eq!(runner.aether.frames_sent(), 2);
}
