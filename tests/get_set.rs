use lr_wpan_mac154::{
    chci::Event,
    pib::{PibAttribute, PibBytes, PibValue},
    sap::{
        get::{GetConfirm, GetRequest},
        set::{SetConfirm, SetRequest},
        Status,
    },
    test_helpers::run::{run_mac_engine_simple, Node},
    wire::{ExtendedAddress, PanId, ShortAddress},
};
use pretty_assertions::assert_eq;
use test_log::test;

fn get(node: &mut Node, attribute: PibAttribute) -> GetConfirm {
    get_raw(node, attribute.into())
}

fn get_raw(node: &mut Node, pib_attribute: u8) -> GetConfirm {
    assert!(node.command(GetRequest { pib_attribute }));

    match node.take_events().as_slice() {
        [Event::GetConfirm(confirm)] => confirm.clone(),
        other => panic!("expected a get confirm, got {other:?}"),
    }
}

fn set(node: &mut Node, value: PibValue) -> Status {
    let pib_attribute = value.attribute().into();
    assert!(node.command(SetRequest {
        pib_attribute,
        pib_attribute_value: value.encode(),
    }));

    match node.take_events().as_slice() {
        [Event::SetConfirm(confirm)] => {
            assert_eq!(confirm.pib_attribute, pib_attribute);
            confirm.status
        }
        other => panic!("expected a set confirm, got {other:?}"),
    }
}

#[test]
fn get_defaults() {
    let mut runner = run_mac_engine_simple();
    let node = &mut runner.nodes[0];

    let confirm = get(node, PibAttribute::MacAutoRequest);
    assert_eq!(confirm.status, Status::Success);
    assert_eq!(confirm.value.as_slice(), &[1]);

    let confirm = get(node, PibAttribute::MacMaxFrameTotalWaitTime);
    assert_eq!(confirm.value.as_slice(), &1986u16.to_le_bytes());

    let confirm = get(node, PibAttribute::PhyCurrentChannel);
    assert_eq!(confirm.value.as_slice(), &[11]);

    let confirm = get(node, PibAttribute::VsExtendedAddress);
    assert_eq!(confirm.value.as_slice(), &1u64.to_le_bytes());
}

#[test]
fn get_unknown_attribute() {
    let mut runner = run_mac_engine_simple();

    assert_eq!(
        get_raw(&mut runner.nodes[0], 0x99),
        GetConfirm {
            status: Status::UnsupportedAttribute,
            pib_attribute: 0x99,
            value: PibBytes::new(),
        }
    );
}

#[test]
fn read_after_write() {
    let mut runner = run_mac_engine_simple();
    let node = &mut runner.nodes[0];

    let values = [
        PibValue::PhyCurrentChannel(20),
        PibValue::PhyTransmitPower(-10),
        PibValue::MacAssociationPermit(true),
        PibValue::MacBeaconPayload([1, 2, 3].into_iter().collect()),
        PibValue::MacCoordExtendedAddress(ExtendedAddress(0x0102_0304_0506_0708)),
        PibValue::MacCoordShortAddress(ShortAddress(0x1234)),
        PibValue::MacMaxBe(8),
        PibValue::MacMinBe(0),
        PibValue::MacMaxCsmaBackoffs(5),
        PibValue::MacMaxFrameRetries(7),
        PibValue::MacPanId(PanId(0xBEEF)),
        PibValue::MacShortAddress(ShortAddress(0x0001)),
        PibValue::MacResponseWaitTime(64),
        PibValue::MacTransactionPersistenceTime(0x10),
        PibValue::MacSecurityEnabled(true),
        PibValue::VsDeviceType(3),
    ];

    for value in values {
        assert_eq!(set(node, value.clone()), Status::Success, "{value:?}");
        let confirm = get(node, value.attribute());
        assert_eq!(confirm.status, Status::Success);
        assert_eq!(confirm.value, value.encode(), "{value:?}");
    }

    assert_eq!(node.mac.phy_pib().current_channel, 20);
    assert_eq!(node.mac.pib().beacon_payload(), &[1, 2, 3]);
}

#[test]
fn out_of_range_is_rejected() {
    let mut runner = run_mac_engine_simple();
    let node = &mut runner.nodes[0];

    assert_eq!(set(node, PibValue::MacMaxBe(9)), Status::InvalidParameter);
    // Above macMaxBE, which is 5
    assert_eq!(set(node, PibValue::MacMinBe(6)), Status::InvalidParameter);
    assert_eq!(set(node, PibValue::MacMaxCsmaBackoffs(6)), Status::InvalidParameter);
    assert_eq!(set(node, PibValue::MacMaxFrameRetries(8)), Status::InvalidParameter);
    assert_eq!(set(node, PibValue::PhyCurrentChannel(27)), Status::InvalidParameter);
    assert_eq!(set(node, PibValue::MacResponseWaitTime(1)), Status::InvalidParameter);

    // Nothing changed
    assert_eq!(get(node, PibAttribute::MacMaxBe).value.as_slice(), &[5]);
    assert_eq!(get(node, PibAttribute::MacMinBe).value.as_slice(), &[3]);
    assert_eq!(get(node, PibAttribute::MacMaxCsmaBackoffs).value.as_slice(), &[4]);
    assert_eq!(get(node, PibAttribute::PhyCurrentChannel).value.as_slice(), &[11]);
}

#[test]
fn read_only_attributes() {
    let mut runner = run_mac_engine_simple();
    let node = &mut runner.nodes[0];

    assert_eq!(set(node, PibValue::MacDsn(1)), Status::ReadOnly);
    assert_eq!(set(node, PibValue::MacBsn(1)), Status::ReadOnly);
    assert_eq!(
        set(node, PibValue::VsExtendedAddress(ExtendedAddress(5))),
        Status::ReadOnly
    );

    node.mac.set_ext_addr(ExtendedAddress(0x0011_2233_4455_6677));
    assert_eq!(
        get(node, PibAttribute::VsExtendedAddress).value.as_slice(),
        &0x0011_2233_4455_6677u64.to_le_bytes()
    );
}

#[test]
fn wrong_value_size() {
    let mut runner = run_mac_engine_simple();
    let node = &mut runner.nodes[0];

    assert!(node.command(SetRequest {
        pib_attribute: PibAttribute::MacPanId.into(),
        pib_attribute_value: [0x34].into_iter().collect(),
    }));

    assert_eq!(
        node.take_events(),
        [Event::SetConfirm(SetConfirm {
            status: Status::InvalidParameter,
            pib_attribute: PibAttribute::MacPanId.into(),
        })]
    );
}
