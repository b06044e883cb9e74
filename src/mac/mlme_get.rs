use super::{host::HostLink, phy::Phy};
use crate::{
    pib::{MacPib, PibAttribute, PibBytes, PibValue},
    radio::Radio,
    sap::{
        get::{GetConfirm, GetRequest},
        Status,
    },
};

pub fn process_get_request<R: Radio>(
    phy: &Phy<R>,
    mac_pib: &MacPib,
    host: &mut HostLink,
    request: GetRequest,
) {
    let pib_attribute = request.pib_attribute;

    match get_pib_value(phy, mac_pib, pib_attribute) {
        Ok(value) => host.event(GetConfirm {
            status: Status::Success,
            pib_attribute,
            value: value.encode(),
        }),
        Err(status) => host.event(GetConfirm {
            status,
            pib_attribute,
            value: PibBytes::new(),
        }),
    }
}

fn get_pib_value<R: Radio>(
    phy: &Phy<R>,
    mac_pib: &MacPib,
    pib_attribute: u8,
) -> Result<PibValue, Status> {
    let attribute = PibAttribute::try_from(pib_attribute)?;

    if let Some(val) = phy.pib().get(attribute) {
        return Ok(val);
    }

    if let Some(val) = mac_pib.get(attribute) {
        return Ok(val);
    }

    Err(Status::UnsupportedAttribute)
}
