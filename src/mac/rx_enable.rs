use crate::{
    sap::{
        rx_enable::{RX_START, RX_STOP},
        Status,
    },
    time::{Duration, Instant},
};

/// Keeps track of the explicit receive window opened with an RX enable request.
///
/// The receiver is on when `rxOnWhenIdle` is set or the window is open. When the
/// window closes the receiver falls back to `rxOnWhenIdle`.
#[derive(Debug, Default)]
pub struct RxEnableScheduler {
    window_end: Option<Instant>,
}

impl RxEnableScheduler {
    pub const fn new() -> Self {
        Self { window_end: None }
    }

    /// Handle the flags of an RX enable request.
    ///
    /// Stop is applied before start, so both flags together restart the window.
    /// A start with a zero duration only closes the window.
    pub fn request(&mut self, flags: u8, rx_on_duration: u32, now: Instant) -> Status {
        if flags == 0 || flags & !(RX_START | RX_STOP) != 0 {
            return Status::InvalidParameter;
        }

        if flags & RX_STOP != 0 {
            self.window_end = None;
        }

        if flags & RX_START != 0 {
            self.window_end = match rx_on_duration {
                0 => None,
                symbols => Some(now + Duration::from_symbols(symbols as u64)),
            };
        }

        debug!("Receive window until {:?}", self.window_end);

        Status::Success
    }

    pub fn is_window_active(&self, now: Instant) -> bool {
        self.window_end.is_some_and(|end| !end.has_passed(now))
    }

    /// Close the window once its time is up.
    pub fn expire(&mut self, now: Instant) {
        if self.window_end.is_some_and(|end| end.has_passed(now)) {
            trace!("Receive window closed");
            self.window_end = None;
        }
    }

    pub fn clear(&mut self) {
        self.window_end = None;
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn window() {
        let mut scheduler = RxEnableScheduler::new();
        let now = Instant::from_symbols(1000);

        assert_eq!(scheduler.request(RX_START, 100, now), Status::Success);
        assert!(scheduler.is_window_active(now));
        assert!(scheduler.is_window_active(now + Duration::from_symbols(99)));
        assert!(!scheduler.is_window_active(now + Duration::from_symbols(100)));

        scheduler.expire(now + Duration::from_symbols(100));
        assert!(!scheduler.is_window_active(now));
    }

    #[test]
    fn stop_then_start() {
        let mut scheduler = RxEnableScheduler::new();
        let now = Instant::from_symbols(0);

        scheduler.request(RX_START, 10, now);
        assert_eq!(scheduler.request(RX_STOP, 0, now), Status::Success);
        assert!(!scheduler.is_window_active(now));

        let later = now + Duration::from_symbols(5);
        assert_eq!(scheduler.request(RX_STOP | RX_START, 10, later), Status::Success);
        assert!(scheduler.is_window_active(later + Duration::from_symbols(9)));

        assert_eq!(scheduler.request(RX_START, 0, later), Status::Success);
        assert!(!scheduler.is_window_active(later));
    }

    #[test]
    fn bad_flags() {
        let mut scheduler = RxEnableScheduler::new();
        let now = Instant::from_symbols(0);

        assert_eq!(scheduler.request(0, 10, now), Status::InvalidParameter);
        assert_eq!(scheduler.request(0x05, 10, now), Status::InvalidParameter);
        assert!(!scheduler.is_window_active(now));
    }
}
