//! Mode selection state machine.
//!
//! [`select_mode`] maps the previous index, the classified press and the
//! config to the next index without side effects. [`apply_press`] wraps it
//! with the bookkeeping that survives power-off (fast-press tally, lock).
//! [`stepdown_target`] decides where battery or thermal protection goes next.

use crate::config::Config;
use crate::modes::ModeTable;
use crate::state::DeviceState;
use crate::types::PressClass;

/// The part of the solid range a config can navigate, and in which direction.
///
/// Positions are `start`, `start ± step`, ... up to the far boundary. The
/// window excludes the moon level when moon mode is disabled and the top two
/// steps in muggle mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NavWindow {
    low: u8,
    high: u8,
    step: u8,
    reversed: bool,
}

impl NavWindow {
    pub fn new(table: &ModeTable, config: Config) -> Self {
        let step = config.step();
        let mut low = table.solid_low();
        let mut high = table.solid_high();

        if config.moon_mode_disabled() && low.saturating_add(step) <= high {
            low += step;
        }
        if config.muggle_mode() {
            high = high.saturating_sub(step.saturating_mul(2)).max(low);
        }

        Self {
            low,
            high,
            step,
            reversed: config.direction_reversed(),
        }
    }

    /// Dimmest index in the window.
    #[inline]
    pub fn low(&self) -> u8 {
        self.low
    }

    /// Brightest index in the window.
    #[inline]
    pub fn high(&self) -> u8 {
        self.high
    }

    #[inline]
    pub fn step(&self) -> u8 {
        self.step
    }

    /// Where a reset lands: the dimmest level, or the brightest when reversed.
    #[inline]
    pub fn start(&self) -> u8 {
        if self.reversed { self.high } else { self.low }
    }

    /// Last position reachable from `start` before wrapping.
    pub fn far_end(&self) -> u8 {
        let span = (self.positions() - 1) * self.step;
        if self.reversed { self.high - span } else { self.low + span }
    }

    /// Number of distinct positions in one short-press cycle.
    pub fn positions(&self) -> u8 {
        (self.high - self.low) / self.step + 1
    }

    /// Moves an arbitrary index onto the nearest position at or before it
    /// (as seen from `start`), clamping into the window first.
    pub fn snap(&self, index: u8) -> u8 {
        let index = index.clamp(self.low, self.high);
        let start = self.start();
        let offset = index.abs_diff(start) / self.step * self.step;
        if self.reversed { start - offset } else { start + offset }
    }

    /// One step away from `start`, wrapping back to `start` past the far boundary.
    pub fn advance(&self, from: u8) -> u8 {
        let current = self.snap(from);
        let next = if self.reversed {
            current.checked_sub(self.step).filter(|&n| n >= self.low)
        } else {
            current.checked_add(self.step).filter(|&n| n <= self.high)
        };
        next.unwrap_or(self.start())
    }

    /// One step toward `start`, or `None` if already there.
    pub fn retreat(&self, from: u8) -> Option<u8> {
        let current = self.snap(from);
        if current == self.start() {
            return None;
        }
        Some(if self.reversed {
            current + self.step
        } else {
            current - self.step
        })
    }
}

/// Outcome of a protection step-down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Stepdown {
    /// Continue at this dimmer solid index.
    To(u8),

    /// Already at the dimmest level: persist index 0 and power down.
    Shutdown,
}

/// Resolves a medium press to a long press when medium presses are disabled.
#[inline]
pub fn effective_press(press: PressClass, config: Config) -> PressClass {
    match press {
        PressClass::Medium if config.medium_press_disabled() => PressClass::Long,
        other => other,
    }
}

/// Computes the next mode index. Pure: no counters, no lock handling.
///
/// * `Long` - back to the window start, or stay (clamped) with memory enabled
/// * `Short` - one step forward, wrapping at the far boundary; from a hidden
///   mode, back to the start
/// * `Medium` - one step backward; from the start into the first hidden mode;
///   through the hidden modes and from the last one back to the start
pub fn select_mode(table: &ModeTable, prev_index: u8, press: PressClass, config: Config) -> u8 {
    let window = NavWindow::new(table, config);
    let prev = table.clamp(prev_index);
    let prev_is_solid = table.mode(prev).is_solid();

    match effective_press(press, config) {
        PressClass::Long => {
            if !config.memory_enabled() {
                window.start()
            } else if prev_is_solid {
                window.snap(prev)
            } else {
                prev
            }
        }
        PressClass::Short => {
            if prev_is_solid {
                window.advance(prev)
            } else {
                window.start()
            }
        }
        PressClass::Medium => {
            if !prev_is_solid {
                let next = prev + 1;
                if table.hidden_range().contains(&next) {
                    next
                } else {
                    window.start()
                }
            } else {
                match window.retreat(prev) {
                    Some(index) => index,
                    None if table.has_hidden() => table.hidden_range().start,
                    None => window.far_end(),
                }
            }
        }
    }
}

/// Applies a boot-time press to the device state and returns the new index.
///
/// A long press clears the fast-press tally and the lock. While locked (and
/// lock mode is enabled) short and medium presses change nothing. Otherwise a
/// medium press clears the tally and a short press adds to it.
pub fn apply_press(state: &mut DeviceState<'_>, table: &ModeTable, press: PressClass) -> u8 {
    let config = state.config;
    let press = effective_press(press, config);
    let locked = config.lock_mode_enabled() && state.retained.locked;

    match press {
        PressClass::Long => {
            state.retained.fast_presses = 0;
            state.retained.locked = false;
        }
        _ if locked => {
            state.mode_index = table.clamp(state.mode_index);
            return state.mode_index;
        }
        PressClass::Medium => state.retained.fast_presses = 0,
        PressClass::Short => state.retained.record_fast_press(),
    }

    state.mode_index = select_mode(table, state.mode_index, press, config);
    state.mode_index
}

/// Finds the next dimmer solid mode for battery or thermal protection.
///
/// Scans downward from `current`, skipping hidden modes, and steps one level
/// below the first solid mode found. At the dimmest level there is nowhere
/// left to go.
pub fn stepdown_target(table: &ModeTable, current: u8) -> Stepdown {
    let mut index = table.clamp(current);
    while index > table.solid_low() && table.mode(index).is_hidden() {
        index -= 1;
    }

    if index <= table.solid_low() {
        Stepdown::Shutdown
    } else {
        Stepdown::To(index - 1)
    }
}
