use super::{host::HostLink, phy::Phy};
use crate::{
    pib::{MacPibWrite, PibAttribute, PibBytes, PibValue},
    radio::Radio,
    sap::{
        set::{SetConfirm, SetRequest},
        Status,
    },
};

pub fn process_set_request<R: Radio>(
    phy: &mut Phy<R>,
    mac_pib_write: &mut MacPibWrite,
    host: &mut HostLink,
    request: SetRequest,
) {
    let pib_attribute = request.pib_attribute;

    let status = set_pib_value(phy, mac_pib_write, pib_attribute, &request.pib_attribute_value)
        .unwrap_or_else(|status| status);

    debug!("Set attribute {:#x}: {:?}", pib_attribute, status);

    host.event(SetConfirm {
        status,
        pib_attribute,
    });
}

fn set_pib_value<R: Radio>(
    phy: &mut Phy<R>,
    mac_pib_write: &mut MacPibWrite,
    pib_attribute: u8,
    pib_value: &PibBytes,
) -> Result<Status, Status> {
    let attribute = PibAttribute::try_from(pib_attribute)?;
    let pib_value = PibValue::decode(attribute, pib_value)?;

    if attribute.is_phy() {
        let status = phy
            .update_phy_pib(|phy_pib| phy_pib.try_set(attribute, &pib_value))
            .map_err(|e| {
                error!("Could not apply the phy pib: {}", e);
                Status::PhyError
            })?;

        return status.ok_or(Status::UnsupportedAttribute);
    }

    mac_pib_write
        .try_set(attribute, &pib_value)
        .ok_or(Status::UnsupportedAttribute)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::{
        chci::Event,
        pib::MacPib,
        test_helpers::aether::{Aether, AetherRadio},
        wire::ExtendedAddress,
    };

    fn set(phy: &mut Phy<AetherRadio>, pib: &mut MacPib, attribute: u8, value: &[u8]) -> Status {
        let mut host = HostLink::new();
        host.registry.register_event_handler(|_: &[u8]| false);

        process_set_request(
            phy,
            pib,
            &mut host,
            SetRequest {
                pib_attribute: attribute,
                pib_attribute_value: PibBytes::try_from(value).unwrap(),
            },
        );

        let message = host.take_message().unwrap();
        match Event::from_message(message.bytes()) {
            Ok(Event::SetConfirm(confirm)) => {
                assert_eq!(confirm.pib_attribute, attribute);
                confirm.status
            }
            other => panic!("expected a set confirm, got {other:?}"),
        }
    }

    #[test_log::test]
    fn statuses() {
        let mut aether = Aether::new();
        let mut phy = Phy::new(aether.radio());
        let mut pib = MacPib::new(ExtendedAddress(1), &mut StdRng::seed_from_u64(1));

        assert_eq!(set(&mut phy, &mut pib, 0x00, &[20]), Status::Success);
        assert_eq!(phy.pib().current_channel, 20);
        assert_eq!(set(&mut phy, &mut pib, 0x00, &[27]), Status::InvalidParameter);

        assert_eq!(set(&mut phy, &mut pib, 0x53, &[0x34, 0x12]), Status::Success);
        assert_eq!(pib.short_address.0, 0x1234);
        assert_eq!(set(&mut phy, &mut pib, 0x53, &[0x34]), Status::InvalidParameter);

        assert_eq!(set(&mut phy, &mut pib, 0x49, &[3]), Status::ReadOnly);
        assert_eq!(set(&mut phy, &mut pib, 0x80, &[0; 8]), Status::ReadOnly);
        assert_eq!(set(&mut phy, &mut pib, 0x7E, &[0]), Status::UnsupportedAttribute);

        assert_eq!(set(&mut phy, &mut pib, 0x59, &[8]), Status::InvalidParameter);
        assert_eq!(pib.max_frame_retries, 3);
    }
}
