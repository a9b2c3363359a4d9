//! # pdes-types::time
//!
//! Defines the representation of simulated time and the machinery that maps
//! user-facing time strings ("1 ns", "2GHz") onto the core cycle count.
//! All simulation time is discrete: a `SimTime` counts core cycles, where
//! one core cycle is the finest base unit of the run (1 ps by default).
//!
//! The accepted grammar for time strings is `WS* INT WS* UNIT WS*` where
//! `INT` is a nonempty string of decimal digits and `UNIT` is one of
//! `fs ps ns us ms s Hz kHz MHz GHz` (case-sensitive). Frequency units are
//! converted to the equivalent period.

use crate::errors::SimError;
use fxhash::FxHashMap;
use serde::{Deserialize, Serialize};

/// The fundamental unit of time in the simulation, measured in core cycles.
pub type SimTime = u64;

/// The start of simulation time.
pub const SIM_EPOCH: SimTime = 0;

/// The maximum representable simulation time.
pub const MAX_SIM_TIME: SimTime = u64::MAX;

/// Performs a checked addition on `SimTime`, returning an error on overflow.
pub fn checked_add(base: SimTime, offset: SimTime) -> Result<SimTime, SimError> {
    base.checked_add(offset)
        .ok_or(SimError::TimeOverflow { base, offset })
}

const FEMTO_PER: &[(&str, u128)] = &[
    ("fs", 1),
    ("ps", 1_000),
    ("ns", 1_000_000),
    ("us", 1_000_000_000),
    ("ms", 1_000_000_000_000),
    ("s", 1_000_000_000_000_000),
];

const HZ_MULT: &[(&str, u128)] = &[
    ("Hz", 1),
    ("kHz", 1_000),
    ("MHz", 1_000_000),
    ("GHz", 1_000_000_000),
];

const FEMTO_PER_SECOND: u128 = 1_000_000_000_000_000;

/// Parses a time or frequency string into a period in femtoseconds.
fn parse_period_fs(spec: &str) -> Result<u128, SimError> {
    let trimmed = spec.trim();
    let digits_end = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let (digits, unit) = trimmed.split_at(digits_end);
    let unit = unit.trim();

    if digits.is_empty() {
        return Err(SimError::bad_time(spec, "missing integer value"));
    }
    let value: u128 = digits
        .parse()
        .map_err(|_| SimError::bad_time(spec, "value does not fit in an integer"))?;
    if value == 0 {
        return Err(SimError::bad_time(spec, "value must be positive"));
    }

    if let Some((_, fs)) = FEMTO_PER.iter().find(|(u, _)| *u == unit) {
        return value
            .checked_mul(*fs)
            .ok_or_else(|| SimError::bad_time(spec, "period overflows"));
    }
    if let Some((_, mult)) = HZ_MULT.iter().find(|(u, _)| *u == unit) {
        let hz = value
            .checked_mul(*mult)
            .ok_or_else(|| SimError::bad_time(spec, "frequency overflows"))?;
        if hz > FEMTO_PER_SECOND || FEMTO_PER_SECOND % hz != 0 {
            return Err(SimError::bad_time(
                spec,
                "frequency has no whole-femtosecond period",
            ));
        }
        return Ok(FEMTO_PER_SECOND / hz);
    }
    Err(SimError::bad_time(spec, format!("unknown unit '{unit}'")))
}

/// Converts between a user-facing time base and core cycles.
///
/// A converter is a plain factor: `to_core(n) == n * factor` and
/// `from_core(t) == t / factor` (integer division, truncating). Converters
/// are interned by the [`TimeLord`] and are valid for the whole run.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeConverter {
    factor: u64,
}

impl TimeConverter {
    /// Number of core cycles in one unit of this base.
    pub fn factor(&self) -> u64 {
        self.factor
    }

    /// Converts a count in this base to core cycles. Saturates on overflow.
    pub fn to_core(&self, n: SimTime) -> SimTime {
        n.saturating_mul(self.factor)
    }

    /// Converts core cycles to a count in this base, truncating.
    pub fn from_core(&self, t: SimTime) -> SimTime {
        t / self.factor
    }
}

/// Owns the core time base of a run and interns one [`TimeConverter`] per
/// distinct base string.
///
/// The lord is created once at simulation start from the configured core
/// base and handed by reference wherever time strings are parsed; equal
/// strings always resolve to the same converter within one run.
#[derive(Debug, Clone)]
pub struct TimeLord {
    core_fs: u128,
    cache: FxHashMap<String, TimeConverter>,
    nano: Option<TimeConverter>,
    micro: Option<TimeConverter>,
    milli: Option<TimeConverter>,
}

impl TimeLord {
    /// Establishes the core base from a time string such as `"1 ps"`.
    pub fn new(core_base: &str) -> Result<Self, SimError> {
        let core_fs = parse_period_fs(core_base)?;
        let derived = |fs: u128| {
            (fs % core_fs == 0 && fs / core_fs > 0).then(|| TimeConverter {
                factor: (fs / core_fs) as u64,
            })
        };
        Ok(Self {
            core_fs,
            cache: FxHashMap::default(),
            nano: derived(1_000_000),
            micro: derived(1_000_000_000),
            milli: derived(1_000_000_000_000),
        })
    }

    /// Returns the interned converter for a time or frequency string.
    ///
    /// Fails with `InvalidTimeBase` when the string does not parse, names a
    /// zero period, or names a period not evenly representable in core
    /// cycles.
    pub fn get_time_converter(&mut self, spec: &str) -> Result<TimeConverter, SimError> {
        if let Some(tc) = self.cache.get(spec) {
            return Ok(*tc);
        }
        let period_fs = parse_period_fs(spec)?;
        if period_fs % self.core_fs != 0 {
            return Err(SimError::bad_time(
                spec,
                "period is not a whole number of core cycles",
            ));
        }
        let factor = period_fs / self.core_fs;
        if factor == 0 {
            return Err(SimError::bad_time(spec, "period is finer than the core base"));
        }
        let factor = u64::try_from(factor)
            .map_err(|_| SimError::bad_time(spec, "period overflows the core cycle count"))?;
        let tc = TimeConverter { factor };
        self.cache.insert(spec.to_string(), tc);
        Ok(tc)
    }

    /// Pre-derived 1 ns converter, when the core base divides it.
    pub fn nano(&self) -> Result<TimeConverter, SimError> {
        self.nano
            .ok_or_else(|| SimError::bad_time("1 ns", "not representable in the core base"))
    }

    /// Pre-derived 1 us converter, when the core base divides it.
    pub fn micro(&self) -> Result<TimeConverter, SimError> {
        self.micro
            .ok_or_else(|| SimError::bad_time("1 us", "not representable in the core base"))
    }

    /// Pre-derived 1 ms converter, when the core base divides it.
    pub fn milli(&self) -> Result<TimeConverter, SimError> {
        self.milli
            .ok_or_else(|| SimError::bad_time("1 ms", "not representable in the core base"))
    }
}
