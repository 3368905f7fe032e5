#![cfg_attr(not(feature = "std"), no_std)]
#![doc = include_str!("../README.md")]

//! # Core Concepts
//!
//! - **`Flashlight`**: Boots the light from the off-time reading and runs the control loop
//! - **`StateStore`**: Wear-leveled mode index plus fixed config and thermal cells in EEPROM
//! - **`ModeTable`**: Solid brightness levels followed by hidden special modes
//! - **`Config`**: User option flags, edited through the fast-press config menu
//! - **`PressClass`**: Long, medium or short press, derived from the off-time capacitor
//! - **`select_mode`**: Pure transition function from (previous index, press, config) to the next index
//! - **`DeviceState`** / **`RetainedState`**: All mutable state, including what survives a short power-off
//! - **`LightOutput`**, **`Sensors`**, **`PowerControl`**: Traits to implement for your board
//! - **`Calibration`** / **`EepromLayout`**: Per-board thresholds and EEPROM placement
//!
//! Every mode change is persisted by erasing the previous cell before writing
//! the next one, so losing power mid-write degrades to mode 0 and never to an
//! ambiguous state.

#[macro_use]
mod fmt;

pub mod calibration;
pub mod config;
pub mod driver;
pub mod effects;
pub mod hal;
pub mod modes;
pub mod select;
pub mod state;
pub mod store;
pub mod types;

pub use calibration::{BatteryThresholds, Calibration, CalibrationError, EepromLayout, LayoutError};
pub use config::Config;
pub use driver::{BootOutcome, DriverError, DriverState, Flashlight, TickOutcome};
pub use hal::{Board, LightOutput, PowerControl, PwmPair, Sensors};
pub use modes::{MAX_MODES, ModeTable, ModeTableBuilder};
pub use select::{NavWindow, Stepdown, apply_press, select_mode, stepdown_target};
pub use state::{DeviceState, ModeState, RetainedState};
pub use store::{ERASED, StateStore};
pub use types::{Mode, ModeKind, ModeTableError, PressClass, Special};
