use rand_core::RngCore;

use super::{host::HostLink, mlme_scan::abandon_scan, phy::Phy, state::MacState};
use crate::{
    pib::MacPib,
    radio::Radio,
    sap::{
        reset::{ResetConfirm, ResetRequest},
        Status,
    },
};

/// Drop everything in flight and go back to the power-on state.
///
/// Running procedures are abandoned without a confirm.
pub fn process_reset_request<R: Radio>(
    phy: &mut Phy<R>,
    mac_pib: &mut MacPib,
    mac_state: &mut MacState,
    host: &mut HostLink,
    rng: &mut impl RngCore,
    request: ResetRequest,
) {
    // A scan borrows the pan id and channel, which survive a reset without defaults
    abandon_scan(phy, mac_pib, mac_state);

    if request.set_default_pib {
        if let Err(e) = phy.reset() {
            error!("Radio reset returned an error: {}", e);
        }

        mac_pib.reset(rng);
    }

    *mac_state = MacState::new();

    debug!("MAC reset, default pib: {}", request.set_default_pib);

    host.event(ResetConfirm {
        status: Status::Success,
    });
}
