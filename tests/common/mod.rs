//! Shared test infrastructure for offtime-driver integration tests

#![allow(dead_code)] // Items used across multiple test files; Rust analyzes per-file

use embedded_hal::delay::DelayNs;
use embedded_storage::{ReadStorage, Storage};
use heapless::{Deque, Vec};
use offtime_driver::{
    Board, Calibration, EepromLayout, Flashlight, LightOutput, ModeTable, PowerControl,
    RetainedState, Sensors, StateStore,
};

// ============================================================================
// Mock Output
// ============================================================================

/// Mock output that records every level change
pub struct MockOutput {
    current: (u8, u8),
    history: Vec<(u8, u8), 2048>,
}

impl MockOutput {
    pub fn new() -> Self {
        Self {
            current: (0, 0),
            history: Vec::new(),
        }
    }

    pub fn current(&self) -> (u8, u8) {
        self.current
    }

    pub fn history(&self) -> &[(u8, u8)] {
        &self.history
    }

    /// Number of times the primary channel was switched on to `level`
    pub fn pulses(&self, level: u8) -> usize {
        self.history.iter().filter(|&&(p, _)| p == level).count()
    }
}

impl LightOutput for MockOutput {
    fn set_output(&mut self, primary: u8, secondary: u8) {
        self.current = (primary, secondary);
        let _ = self.history.push((primary, secondary));
    }
}

// ============================================================================
// Mock Sensors
// ============================================================================

/// Scripted sensors
///
/// Battery readings are consumed in order; the last one repeats forever.
pub struct MockSensors {
    offtime: u8,
    battery: Deque<u8, 64>,
    temperature: Option<u8>,
    battery_reads: usize,
}

impl MockSensors {
    pub fn new(offtime: u8) -> Self {
        let mut battery = Deque::new();
        let _ = battery.push_back(150);
        Self {
            offtime,
            battery,
            temperature: None,
            battery_reads: 0,
        }
    }

    pub fn with_battery(mut self, readings: &[u8]) -> Self {
        self.battery.clear();
        for &reading in readings {
            let _ = self.battery.push_back(reading);
        }
        self
    }

    pub fn with_temperature(mut self, temperature: u8) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn battery_reads(&self) -> usize {
        self.battery_reads
    }
}

impl Sensors for MockSensors {
    fn read_offtime_signal(&mut self) -> u8 {
        self.offtime
    }

    fn read_battery_level(&mut self) -> u8 {
        self.battery_reads += 1;
        if self.battery.len() > 1 {
            self.battery.pop_front().unwrap_or(0)
        } else {
            self.battery.front().copied().unwrap_or(0)
        }
    }

    fn read_temperature(&mut self) -> Option<u8> {
        self.temperature
    }
}

// ============================================================================
// Mock Delay
// ============================================================================

/// Delay that only adds up the requested time
#[derive(Default)]
pub struct MockDelay {
    elapsed_ns: u64,
}

impl MockDelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ns / 1_000_000
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.elapsed_ns += u64::from(ns);
    }
}

// ============================================================================
// Mock Power Control
// ============================================================================

/// Counts power-down requests
#[derive(Default)]
pub struct MockPower {
    power_downs: usize,
}

impl MockPower {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn power_downs(&self) -> usize {
        self.power_downs
    }
}

impl PowerControl for MockPower {
    fn power_down(&mut self) {
        self.power_downs += 1;
    }
}

// ============================================================================
// Mock EEPROM
// ============================================================================

pub const EEPROM_SIZE: usize = 63;

/// Raised once the write budget is spent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerLost;

/// RAM-backed EEPROM matching the ATtiny13 layout
///
/// With a write budget set, writes past the budget are dropped, as if the
/// power had gone away in the middle of the sequence.
#[derive(Clone)]
pub struct MockEeprom {
    cells: [u8; EEPROM_SIZE],
    writes: [u32; EEPROM_SIZE],
    budget: Option<usize>,
}

impl MockEeprom {
    /// A factory-fresh part: every cell erased.
    pub fn blank() -> Self {
        Self {
            cells: [0xFF; EEPROM_SIZE],
            writes: [0; EEPROM_SIZE],
            budget: None,
        }
    }

    /// A part that has already booted once with the given config bits.
    pub fn configured(config: offtime_driver::Config) -> Self {
        let mut eeprom = Self::blank();
        eeprom.cells[EepromLayout::ATTINY13.config_cell() as usize] = config.to_cell();
        eeprom
    }

    pub fn with_cell(mut self, address: usize, value: u8) -> Self {
        self.cells[address] = value;
        self
    }

    /// Allows `writes` more successful writes, then drops everything.
    pub fn with_write_budget(mut self, writes: usize) -> Self {
        self.budget = Some(writes);
        self
    }

    /// Power is back: writes succeed again.
    pub fn restore_power(mut self) -> Self {
        self.budget = None;
        self
    }

    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    pub fn cell(&self, address: usize) -> u8 {
        self.cells[address]
    }

    pub fn write_count(&self, address: usize) -> u32 {
        self.writes[address]
    }

    /// Cells of the rotating mode region that are not erased.
    pub fn live_mode_cells(&self) -> usize {
        let region = EepromLayout::ATTINY13.mode_cells() as usize;
        self.cells[..region].iter().filter(|&&c| c != 0xFF).count()
    }
}

impl ReadStorage for MockEeprom {
    type Error = PowerLost;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        let start = offset as usize;
        bytes.copy_from_slice(&self.cells[start..start + bytes.len()]);
        Ok(())
    }

    fn capacity(&self) -> usize {
        EEPROM_SIZE
    }
}

impl Storage for MockEeprom {
    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        if let Some(budget) = self.budget.as_mut() {
            if *budget == 0 {
                return Err(PowerLost);
            }
            *budget -= 1;
        }

        let start = offset as usize;
        self.cells[start..start + bytes.len()].copy_from_slice(bytes);
        for count in &mut self.writes[start..start + bytes.len()] {
            *count += 1;
        }
        Ok(())
    }
}

// ============================================================================
// Test Helper Functions
// ============================================================================

pub type TestLight<'r> = Flashlight<'r, MockEeprom, MockOutput, MockSensors, MockDelay, MockPower>;

/// Driver on the ATtiny13 layout with the default table and calibration
pub fn light<'r>(
    eeprom: MockEeprom,
    sensors: MockSensors,
    retained: &'r mut RetainedState,
) -> TestLight<'r> {
    light_with(eeprom, sensors, Calibration::default(), retained)
}

pub fn light_with<'r>(
    eeprom: MockEeprom,
    sensors: MockSensors,
    calibration: Calibration,
    retained: &'r mut RetainedState,
) -> TestLight<'r> {
    let board = Board {
        output: MockOutput::new(),
        sensors,
        delay: MockDelay::new(),
        power: MockPower::new(),
    };
    let store = StateStore::new(eeprom, EepromLayout::ATTINY13);
    Flashlight::new(
        board,
        store,
        ModeTable::default(),
        calibration,
        retained,
    )
}

/// Boots a fresh driver with the given off-time reading and hands back the
/// EEPROM, as if the user switched the light off right away.
pub fn press(eeprom: MockEeprom, offtime: u8, retained: &mut RetainedState) -> (u8, MockEeprom) {
    let mut light = light(eeprom, MockSensors::new(offtime), retained);
    let mode = match light.boot() {
        Ok(offtime_driver::BootOutcome::Started { mode_index, .. }) => mode_index,
        other => panic!("unexpected boot result: {:?}", other),
    };
    let (_, store) = light.release();
    (mode, store.release())
}

/// Off-time readings for each press class under the default calibration.
pub const LONG: u8 = 20;
pub const MEDIUM: u8 = 200;
pub const SHORT: u8 = 250;
