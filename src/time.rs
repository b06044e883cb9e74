use core::{
    fmt::Display,
    ops::{Add, AddAssign, Mul, Sub},
};

use crate::consts::{BASE_SUPERFRAME_DURATION, UNIT_BACKOFF_PERIOD};

/// The length of a single symbol of the 2.4 GHz O-QPSK PHY in microseconds.
pub const MICROS_PER_SYMBOL: u64 = 16;

/// An instant of time on the radio's symbol clock.
///
/// Every tick is one symbol period (16 us). Arithmetic saturates instead of
/// wrapping, so a deadline far in the future simply never expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct Instant {
    symbols: u64,
}

impl Instant {
    pub const fn from_symbols(symbols: u64) -> Self {
        Self { symbols }
    }

    pub const fn symbols(&self) -> u64 {
        self.symbols
    }

    /// The low 32 bits of the symbol counter, as carried in CHCI timestamps.
    pub const fn timestamp(&self) -> u32 {
        self.symbols as u32
    }

    #[must_use]
    pub const fn duration_since(&self, earlier: Self) -> Duration {
        Duration::from_symbols(self.symbols.saturating_sub(earlier.symbols))
    }

    #[must_use]
    pub const fn checked_add_duration(self, duration: Duration) -> Option<Self> {
        match self.symbols.checked_add(duration.symbols) {
            Some(symbols) => Some(Self { symbols }),
            None => None,
        }
    }

    /// Has this deadline been reached at `now`?
    pub fn has_passed(&self, now: Instant) -> bool {
        now >= *self
    }
}

impl Display for Instant {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "@{}", self.symbols)
    }
}

impl Add<Duration> for Instant {
    type Output = Instant;

    fn add(self, rhs: Duration) -> Self::Output {
        Self {
            symbols: self.symbols.saturating_add(rhs.symbols),
        }
    }
}

impl AddAssign<Duration> for Instant {
    fn add_assign(&mut self, rhs: Duration) {
        *self = *self + rhs;
    }
}

impl Sub<Instant> for Instant {
    type Output = Duration;

    fn sub(self, rhs: Instant) -> Self::Output {
        self.duration_since(rhs)
    }
}

/// A span of time in symbol periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct Duration {
    symbols: u64,
}

impl Display for Duration {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let micros = self.micros();
        write!(f, "{}.{:03} ms", micros / 1000, micros % 1000)
    }
}

impl Duration {
    pub const ZERO: Self = Self::from_symbols(0);

    pub const fn from_symbols(symbols: u64) -> Self {
        Self { symbols }
    }

    pub const fn from_backoff_periods(periods: u64) -> Self {
        Self::from_symbols(periods * UNIT_BACKOFF_PERIOD as u64)
    }

    /// A multiple of `aBaseSuperframeDuration`, the unit of
    /// `macResponseWaitTime` and `macTransactionPersistenceTime`.
    pub const fn from_base_superframes(count: u64) -> Self {
        Self::from_symbols(count * BASE_SUPERFRAME_DURATION as u64)
    }

    pub const fn symbols(&self) -> u64 {
        self.symbols
    }

    pub const fn micros(&self) -> u64 {
        self.symbols * MICROS_PER_SYMBOL
    }

    #[cfg(feature = "std")]
    pub fn into_std(self) -> std::time::Duration {
        self.into()
    }
}

impl Add for Duration {
    type Output = Duration;

    fn add(self, rhs: Duration) -> Self::Output {
        Self {
            symbols: self.symbols.saturating_add(rhs.symbols),
        }
    }
}

impl AddAssign for Duration {
    fn add_assign(&mut self, rhs: Duration) {
        *self = *self + rhs;
    }
}

impl Mul<u64> for Duration {
    type Output = Duration;

    fn mul(self, rhs: u64) -> Self::Output {
        Self {
            symbols: self.symbols.saturating_mul(rhs),
        }
    }
}

#[cfg(feature = "std")]
impl From<Duration> for std::time::Duration {
    fn from(value: Duration) -> Self {
        std::time::Duration::from_micros(value.micros())
    }
}
