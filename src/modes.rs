use crate::types::{Mode, ModeKind, ModeTableError, Special};
use core::ops::Range;
use heapless::Vec;

/// Maximum number of entries in a mode table.
pub const MAX_MODES: usize = 16;

/// The ordered set of output modes available to the driver.
///
/// Solid modes come first, ordered from dimmest to brightest, followed by the
/// hidden modes. The table is immutable once built; the driver only ever
/// moves an index over it. Each entry carries its [`ModeKind`], so callers
/// never infer a mode's kind from where its index falls.
///
/// Both mode groups share the same solid levels: the primary group visits
/// every level, the secondary group every other level (see
/// [`Config::step`](crate::Config::step)).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeTable {
    modes: Vec<Mode, MAX_MODES>,
    solid_count: u8,
}

impl ModeTable {
    /// Creates a new table builder.
    pub fn builder() -> ModeTableBuilder {
        ModeTableBuilder::new()
    }

    /// Number of entries, solid and hidden.
    #[inline]
    pub fn mode_count(&self) -> u8 {
        self.modes.len() as u8
    }

    /// Index of the dimmest solid mode.
    #[inline]
    pub fn solid_low(&self) -> u8 {
        0
    }

    /// Index of the brightest solid mode.
    #[inline]
    pub fn solid_high(&self) -> u8 {
        self.solid_count - 1
    }

    /// Indices of the hidden modes. Empty if the table has none.
    #[inline]
    pub fn hidden_range(&self) -> Range<u8> {
        self.solid_count..self.mode_count()
    }

    /// Returns true if the table contains hidden modes.
    #[inline]
    pub fn has_hidden(&self) -> bool {
        !self.hidden_range().is_empty()
    }

    /// Clamps an index into `[0, mode_count)`.
    #[inline]
    pub fn clamp(&self, index: u8) -> u8 {
        index.min(self.mode_count() - 1)
    }

    /// Returns the entry at `index`, clamped into range.
    #[inline]
    pub fn mode(&self, index: u8) -> Mode {
        self.modes[self.clamp(index) as usize]
    }

    /// Returns the kind of the entry at `index`, clamped into range.
    #[inline]
    pub fn kind(&self, index: u8) -> ModeKind {
        self.mode(index).kind
    }

    /// Target of the turbo timeout: the second-brightest solid mode.
    #[inline]
    pub fn turbo_stepdown(&self) -> u8 {
        self.solid_high().saturating_sub(1).max(self.solid_low())
    }

    /// Iterates over all entries in index order.
    pub fn iter(&self) -> impl Iterator<Item = &Mode> {
        self.modes.iter()
    }
}

impl Default for ModeTable {
    /// The FET+1 layout: eight solid levels then turbo, strobe, battery check,
    /// beacon and SOS.
    fn default() -> Self {
        let builder = SOLID_DEFAULTS
            .iter()
            .try_fold(ModeTable::builder(), |b, &(primary, secondary)| {
                b.solid(primary, secondary)
            })
            .and_then(|b| b.hidden(Special::Turbo))
            .and_then(|b| b.hidden(Special::Strobe))
            .and_then(|b| b.hidden(Special::BatteryCheck))
            .and_then(|b| b.hidden(Special::Beacon))
            .and_then(|b| b.hidden(Special::Sos));

        match builder.and_then(ModeTableBuilder::build) {
            Ok(table) => table,
            Err(_) => unreachable!("default mode table fits in MAX_MODES"),
        }
    }
}

/// Default solid levels as (FET, 7135) channel pairs.
const SOLID_DEFAULTS: [(u8, u8); 8] = [
    (0, 3),
    (0, 20),
    (0, 60),
    (0, 110),
    (0, 255),
    (20, 255),
    (90, 255),
    (255, 0),
];

/// Builder for constructing validated mode tables.
///
/// Solid and hidden modes may be added in any order; the built table always
/// places the solid modes first.
#[derive(Debug, Default)]
pub struct ModeTableBuilder {
    solid: Vec<Mode, MAX_MODES>,
    hidden: Vec<Mode, MAX_MODES>,
}

impl ModeTableBuilder {
    /// Creates a new empty builder.
    pub fn new() -> Self {
        Self {
            solid: Vec::new(),
            hidden: Vec::new(),
        }
    }

    /// Adds a solid level. Add them from dimmest to brightest.
    ///
    /// # Errors
    /// * `CapacityExceeded` - the table already holds [`MAX_MODES`] entries
    pub fn solid(mut self, primary: u8, secondary: u8) -> Result<Self, ModeTableError> {
        self.check_capacity()?;
        self.solid
            .push(Mode::solid(primary, secondary))
            .map_err(|_| ModeTableError::CapacityExceeded)?;
        Ok(self)
    }

    /// Adds a hidden mode.
    ///
    /// # Errors
    /// * `CapacityExceeded` - the table already holds [`MAX_MODES`] entries
    pub fn hidden(mut self, special: Special) -> Result<Self, ModeTableError> {
        self.check_capacity()?;
        self.hidden
            .push(Mode::hidden(special))
            .map_err(|_| ModeTableError::CapacityExceeded)?;
        Ok(self)
    }

    fn check_capacity(&self) -> Result<(), ModeTableError> {
        if self.solid.len() + self.hidden.len() >= MAX_MODES {
            return Err(ModeTableError::CapacityExceeded);
        }
        Ok(())
    }

    /// Builds and validates the table.
    ///
    /// # Errors
    /// * `NoSolidModes` - no solid levels were added
    pub fn build(self) -> Result<ModeTable, ModeTableError> {
        if self.solid.is_empty() {
            return Err(ModeTableError::NoSolidModes);
        }

        let solid_count = self.solid.len() as u8;
        let mut modes = self.solid;
        for mode in self.hidden {
            modes
                .push(mode)
                .map_err(|_| ModeTableError::CapacityExceeded)?;
        }

        Ok(ModeTable { modes, solid_count })
    }
}
