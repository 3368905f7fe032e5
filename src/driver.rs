//! Flashlight driver with boot-time mode selection and the protection loop.
//!
//! Provides [`Flashlight`], which owns the board, the state store and the mode
//! table. [`Flashlight::boot`] turns the off-time reading into a new persisted
//! mode; [`Flashlight::tick`] runs one iteration of the control loop.

use crate::calibration::{Calibration, CalibrationError};
use crate::config::Config;
use crate::effects::{self, MENU_PAUSE_MS, TICK_MS};
use crate::hal::{Board, LightOutput, PowerControl, Sensors};
use crate::modes::ModeTable;
use crate::select::{self, Stepdown};
use crate::state::{DeviceState, ModeState, RetainedState};
use crate::store::{ERASED, StateStore};
use crate::types::{ModeKind, PressClass, Special};
use embedded_hal::delay::DelayNs;
use embedded_storage::Storage;

/// The lifecycle state of a driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriverState {
    /// Created, not booted yet. Output untouched.
    Idle,
    /// Booted; the control loop may tick.
    Running,
    /// Emergency shutdown happened. Only a power cycle recovers.
    Shutdown,
}

/// Result of [`Flashlight::boot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BootOutcome {
    /// A mode was selected and persisted.
    Started {
        /// How the off-time reading was classified.
        press: PressClass,
        /// The selected and persisted mode index.
        mode_index: u8,
    },

    /// The battery was too low to start.
    Shutdown,
}

/// Result of [`Flashlight::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TickOutcome {
    /// Keep ticking.
    Continue,

    /// Protection ran out of lower modes and powered the light down.
    Shutdown,
}

/// Errors that can occur during driver operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriverError {
    /// Operation called from an invalid state.
    InvalidState {
        /// The state the operation requires
        expected: &'static str,
        /// The actual current state
        actual: DriverState,
    },

    /// The calibration is unusable.
    Calibration(CalibrationError),
}

impl core::fmt::Display for DriverError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            DriverError::InvalidState { expected, actual } => {
                write!(
                    f,
                    "invalid state: expected {}, but driver is in {:?}",
                    expected, actual
                )
            }
            DriverError::Calibration(err) => {
                write!(f, "calibration error: {}", err)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DriverError {}

impl From<CalibrationError> for DriverError {
    fn from(err: CalibrationError) -> Self {
        DriverError::Calibration(err)
    }
}

/// Off-time flashlight driver.
///
/// Single-threaded by construction: the driver takes the board, the store and
/// the retained RAM block by value or exclusive reference, so nothing else can
/// touch the persisted state while it runs.
///
/// # Type Parameters
/// * `'r` - Lifetime of the retained (`.noinit`) state
/// * `S` - Byte-addressable storage (EEPROM)
/// * `O` - Output channels
/// * `A` - Analog sensors
/// * `D` - Busy-wait delay
/// * `P` - Power control
pub struct Flashlight<'r, S: Storage, O, A, D, P> {
    board: Board<O, A, D, P>,
    store: StateStore<S>,
    table: ModeTable,
    calibration: Calibration,
    state: DeviceState<'r>,
    status: DriverState,
}

impl<'r, S, O, A, D, P> Flashlight<'r, S, O, A, D, P>
where
    S: Storage,
    O: LightOutput,
    A: Sensors,
    D: DelayNs,
    P: PowerControl,
{
    /// Creates an idle driver. Nothing is read or written until [`boot`](Self::boot).
    pub fn new(
        board: Board<O, A, D, P>,
        store: StateStore<S>,
        table: ModeTable,
        calibration: Calibration,
        retained: &'r mut RetainedState,
    ) -> Self {
        Self {
            board,
            store,
            table,
            calibration,
            state: DeviceState::new(Config::DEFAULT, retained),
            status: DriverState::Idle,
        }
    }

    /// Boots the light: classifies the press, selects and persists the mode.
    ///
    /// The off-time capacitor is read before anything else so its charge is
    /// measured as early as possible. A nearly empty battery blinks a warning;
    /// a critically low one shuts down without touching the stored state.
    ///
    /// Must be called from `Idle` state.
    pub fn boot(&mut self) -> Result<BootOutcome, DriverError> {
        if self.status != DriverState::Idle {
            return Err(DriverError::InvalidState {
                expected: "Idle",
                actual: self.status,
            });
        }
        self.calibration.validate()?;

        let signal = self.board.sensors.read_offtime_signal();

        let voltage = self.board.sensors.read_battery_level();
        if voltage < self.calibration.battery.adc_0 {
            warn!("boot: low battery {=u8}", voltage);
            effects::low_battery_warning(&mut self.board.output, &mut self.board.delay);
            if voltage < self.calibration.battery.adc_crit {
                self.emergency_shutdown();
                return Ok(BootOutcome::Shutdown);
            }
        }

        let mut config = self.store.read_config();
        if config.needs_reset() {
            info!("boot: loading default config");
            config = Config::DEFAULT;
            self.persist_config(config);
        }
        self.state.config = config;

        self.state.max_temp = match self.store.read_max_temp() {
            0 | ERASED => self.calibration.default_max_temp,
            max_temp => max_temp,
        };

        self.state.mode_index = self.table.clamp(self.store.read());

        let press = PressClass::classify(signal, &self.calibration);
        let mode_index = select::apply_press(&mut self.state, &self.table, press);
        self.persist_mode(mode_index);

        info!(
            "boot: signal {=u8} -> {}, mode {=u8}",
            signal, press, mode_index
        );

        self.status = DriverState::Running;
        Ok(BootOutcome::Started { press, mode_index })
    }

    /// Runs one control-loop iteration, roughly one second of output.
    ///
    /// Samples the battery (and temperature), steps down after a sustained
    /// low reading, opens the config menu after a burst of fast presses and
    /// renders the current mode.
    ///
    /// Must be called from `Running` state.
    pub fn tick(&mut self) -> Result<TickOutcome, DriverError> {
        if self.status != DriverState::Running {
            return Err(DriverError::InvalidState {
                expected: "Running",
                actual: self.status,
            });
        }

        let voltage = self.board.sensors.read_battery_level();
        if !self.state.calibrating && self.protect(voltage) == TickOutcome::Shutdown {
            return Ok(TickOutcome::Shutdown);
        }

        self.render(voltage);

        // The user has stopped fast-pressing by now.
        self.state.retained.fast_presses = 0;
        Ok(TickOutcome::Continue)
    }

    /// Boots and ticks until shutdown.
    ///
    /// On hardware [`PowerControl::power_down`] never returns, so neither does this.
    pub fn run(&mut self) -> Result<(), DriverError> {
        if self.boot()? == BootOutcome::Shutdown {
            return Ok(());
        }
        while self.tick()? == TickOutcome::Continue {}
        Ok(())
    }

    /// Counts low-battery / overheat ticks and steps down once enough accumulate.
    fn protect(&mut self, voltage: u8) -> TickOutcome {
        let overheated = self
            .board
            .sensors
            .read_temperature()
            .is_some_and(|temp| temp >= self.state.max_temp);

        if voltage < self.calibration.battery.adc_low || overheated {
            self.state.lowbatt_ticks = self.state.lowbatt_ticks.saturating_add(1);
        } else {
            self.state.lowbatt_ticks = 0;
        }

        if self.state.lowbatt_ticks < self.calibration.stepdown_ticks {
            return TickOutcome::Continue;
        }
        self.state.lowbatt_ticks = 0;

        match select::stepdown_target(&self.table, self.state.mode_index) {
            Stepdown::To(index) => {
                info!(
                    "protect: voltage {=u8}, stepping down to {=u8}",
                    voltage, index
                );
                self.state.mode_index = index;
                self.persist_mode(index);
                let mode = self.table.mode(index);
                self.board.output.set_output(mode.primary, mode.secondary);
                TickOutcome::Continue
            }
            Stepdown::Shutdown => {
                warn!("protect: voltage {=u8} at lowest mode, shutting down", voltage);
                self.state.mode_index = 0;
                self.persist_mode(0);
                self.emergency_shutdown();
                TickOutcome::Shutdown
            }
        }
    }

    /// Walks every config option: shows its number, toggles it, buzzes and
    /// toggles it back. Power-cycling during the buzz keeps the toggle.
    fn config_menu(&mut self) {
        info!("config: menu entered");
        self.board.delay.delay_ms(TICK_MS);
        self.state.retained.fast_presses = 0;
        self.state.mode_index = 0;

        for (ordinal, option) in (1u8..).zip(Config::MENU) {
            effects::count_out(&mut self.board.output, &mut self.board.delay, ordinal);
            self.board.delay.delay_ms(MENU_PAUSE_MS);

            self.state.config.toggle(option);
            self.persist_config(self.state.config);

            effects::confirm_buzz(&mut self.board.output, &mut self.board.delay);

            self.state.config.toggle(option);
            self.persist_config(self.state.config);

            self.board.delay.delay_ms(TICK_MS);
        }
    }

    /// Temperature calibration is reachable when the board has a sensor or
    /// the table lists it as a hidden mode.
    fn thermal_calibration_available(&mut self) -> bool {
        self.board.sensors.read_temperature().is_some()
            || self
                .table
                .iter()
                .any(|mode| mode.kind == ModeKind::Hidden(Special::TempCalibration))
    }

    fn render(&mut self, voltage: u8) {
        let limit = self.calibration.fast_press_limit;

        match self.state.mode_state(&self.table, limit) {
            ModeState::ConfigEdit => {
                self.config_menu();
                // Sitting through the whole menu is the calibration gesture.
                if self.thermal_calibration_available() {
                    self.start_temperature_calibration();
                    self.record_temperature();
                } else {
                    self.render_solid(self.state.mode_index);
                }
            }
            ModeState::Calibrating => self.record_temperature(),
            ModeState::Solid(index) | ModeState::Hidden(index, Special::Turbo) => {
                self.render_solid(index);
            }
            ModeState::Hidden(_, Special::Strobe) => {
                effects::strobe(&mut self.board.output, &mut self.board.delay);
            }
            ModeState::Hidden(_, Special::Beacon) => {
                effects::beacon(&mut self.board.output, &mut self.board.delay);
                self.engage_lock();
                self.board.delay.delay_ms(TICK_MS);
            }
            ModeState::Hidden(_, Special::BatteryCheck) => {
                let blinks = self.calibration.battery.readout_blinks(voltage);
                effects::count_out(&mut self.board.output, &mut self.board.delay, blinks);
                self.board.delay.delay_ms(TICK_MS);
            }
            ModeState::Hidden(_, Special::Sos) => {
                effects::sos(&mut self.board.output, &mut self.board.delay);
            }
            ModeState::Hidden(_, Special::TempCalibration) => {
                self.start_temperature_calibration();
                self.record_temperature();
            }
        }
    }

    /// Steady output, with the turbo timeout and lock-in.
    fn render_solid(&mut self, mut index: u8) {
        self.state.ticks = self.state.ticks.saturating_add(1);

        let timed_out = self.state.ticks > u16::from(self.calibration.turbo_timeout);
        if self.table.mode(index).is_turbo() && timed_out {
            index = self.table.turbo_stepdown();
            info!("turbo: timeout, stepping down to {=u8}", index);
            self.state.mode_index = index;
            self.persist_mode(index);
        }

        let mode = self.table.mode(index);
        self.board.output.set_output(mode.primary, mode.secondary);
        self.engage_lock();
        self.board.delay.delay_ms(TICK_MS);
    }

    fn engage_lock(&mut self) {
        if self.state.config.lock_mode_enabled() && !self.state.retained.locked {
            self.board.delay.delay_ms(self.calibration.lock_delay_ms);
            self.state.retained.locked = true;
            debug!("lock: engaged");
        }
    }

    /// Blinks five times, clears the ceiling and goes to full output.
    /// Protection stays suspended from here until power is removed.
    fn start_temperature_calibration(&mut self) {
        info!("thermal: calibration started");
        effects::count_out(&mut self.board.output, &mut self.board.delay, 5);
        self.state.max_temp = u8::MAX;
        self.persist_max_temp(u8::MAX);
        self.board.delay.delay_ms(2 * TICK_MS);
        self.board.output.set_output(u8::MAX, 0);
        self.state.calibrating = true;
    }

    /// Records the current temperature as the new ceiling.
    fn record_temperature(&mut self) {
        if let Some(temp) = self.board.sensors.read_temperature() {
            trace!("thermal: ceiling {=u8}", temp);
            self.state.max_temp = temp;
            self.persist_max_temp(temp);
        }
        self.board.delay.delay_ms(TICK_MS);
    }

    fn emergency_shutdown(&mut self) {
        self.board.output.set_output(0, 0);
        self.board.power.power_down();
        self.status = DriverState::Shutdown;
    }

    fn persist_mode(&mut self, index: u8) {
        if self.store.write(index).is_err() {
            warn!("store: writing mode {=u8} failed", index);
        }
    }

    fn persist_config(&mut self, config: Config) {
        if self.store.write_config(config).is_err() {
            warn!("store: writing config {} failed", config);
        }
    }

    fn persist_max_temp(&mut self, max_temp: u8) {
        if self.store.write_max_temp(max_temp).is_err() {
            warn!("store: writing thermal ceiling {=u8} failed", max_temp);
        }
    }

    /// Returns the lifecycle state.
    pub fn status(&self) -> DriverState {
        self.status
    }

    /// Returns the current mode index.
    pub fn mode_index(&self) -> u8 {
        self.state.mode_index
    }

    /// Returns the config in effect.
    pub fn config(&self) -> Config {
        self.state.config
    }

    /// Returns the full device state.
    pub fn device_state(&self) -> &DeviceState<'r> {
        &self.state
    }

    /// Returns the mode table.
    pub fn table(&self) -> &ModeTable {
        &self.table
    }

    /// Returns the board.
    pub fn board(&self) -> &Board<O, A, D, P> {
        &self.board
    }

    /// Returns the state store.
    pub fn store(&self) -> &StateStore<S> {
        &self.store
    }

    /// Releases the board and the store.
    pub fn release(self) -> (Board<O, A, D, P>, StateStore<S>) {
        (self.board, self.store)
    }
}
