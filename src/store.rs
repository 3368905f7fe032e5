//! Wear-leveled persistence of the mode index and config.
//!
//! The mode index lives in a rotating region of single-byte cells. At most
//! one cell is live at a time and holds the complement of the index; every
//! other cell is erased (0xFF). A write erases the live cell, advances the
//! cursor and only then writes the new value, so a power loss in between
//! leaves no live cell and the next boot falls back to index 0. There is
//! never a window where two cells disagree.
//!
//! Index 0 complements to 0xFF, which is indistinguishable from an erased
//! cell. Writing 0 therefore leaves the region empty, and reading an empty
//! region yields 0, so the two cases resolve to the same answer.

use crate::calibration::EepromLayout;
use crate::config::Config;
use embedded_storage::Storage;

/// Value of an erased EEPROM cell.
pub const ERASED: u8 = 0xFF;

/// Non-volatile state store on top of a byte-addressable storage device.
pub struct StateStore<S: Storage> {
    storage: S,
    layout: EepromLayout,
    cursor: u16,
}

impl<S: Storage> StateStore<S> {
    /// Wraps a storage device. The cursor starts on the last mode cell, so the
    /// first write to a blank device lands on cell 0.
    pub fn new(storage: S, layout: EepromLayout) -> Self {
        let cursor = layout.mode_cells() - 1;
        Self {
            storage,
            layout,
            cursor,
        }
    }

    /// Restores the persisted mode index.
    ///
    /// Scans the mode region from cell 0 upward and returns the complement of
    /// the first cell that is not erased, leaving the cursor on that cell.
    /// Returns 0 if every cell is erased. Unreadable cells count as erased.
    pub fn read(&mut self) -> u8 {
        for pos in 0..self.layout.mode_cells() {
            let index = !self.read_cell(pos);
            if index != 0 {
                self.cursor = pos;
                trace!("store: mode {=u8} at cell {=u16}", index, pos);
                return index;
            }
        }

        debug!("store: mode region empty");
        0
    }

    /// Persists a mode index on the next cell of the rotating region.
    ///
    /// Erases the live cell, advances the cursor (wrapping at the end of the
    /// region) and writes the complement of `index` there.
    pub fn write(&mut self, index: u8) -> Result<(), S::Error> {
        self.write_cell(self.cursor, ERASED)?;
        self.cursor = (self.cursor + 1) % self.layout.mode_cells();
        self.write_cell(self.cursor, !index)
    }

    /// Position of the live cell (or the cell that will be erased by the next write).
    #[inline]
    pub fn cursor(&self) -> u16 {
        self.cursor
    }

    /// Restores the user config. An erased cell yields an empty set, which
    /// reports [`Config::needs_reset`].
    pub fn read_config(&mut self) -> Config {
        Config::from_cell(self.read_cell(self.layout.config_cell()))
    }

    /// Persists the user config in its fixed cell.
    pub fn write_config(&mut self, config: Config) -> Result<(), S::Error> {
        self.write_cell(self.layout.config_cell(), config.to_cell())
    }

    /// Restores the raw thermal ceiling. 0 or [`ERASED`] means never calibrated.
    pub fn read_max_temp(&mut self) -> u8 {
        self.read_cell(self.layout.max_temp_cell())
    }

    /// Persists the thermal ceiling.
    pub fn write_max_temp(&mut self, max_temp: u8) -> Result<(), S::Error> {
        self.write_cell(self.layout.max_temp_cell(), max_temp)
    }

    /// Returns a reference to the underlying storage.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Releases the underlying storage.
    pub fn release(self) -> S {
        self.storage
    }

    fn read_cell(&mut self, address: u16) -> u8 {
        let mut byte = [ERASED];
        if self.storage.read(address as u32, &mut byte).is_err() {
            warn!("store: read of cell {=u16} failed", address);
            return ERASED;
        }
        byte[0]
    }

    fn write_cell(&mut self, address: u16, value: u8) -> Result<(), S::Error> {
        self.storage.write(address as u32, &[value])
    }
}
