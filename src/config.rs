//! User configuration persisted in its own EEPROM cell.

use bitflags::bitflags;

bitflags! {
    /// User-selectable behavior flags.
    ///
    /// Stored as the one's complement of [`Config::bits`] so that an erased
    /// cell (0xFF) reads back as an empty set, which lacks
    /// [`Config::INITIALIZED`] and therefore triggers a default-load.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Config: u8 {
        /// Use the secondary mode group (every other solid level).
        const MODE_GROUP = 1 << 0;
        /// A long press keeps the previous mode instead of restarting.
        const MEMORY = 1 << 1;
        /// Navigation starts at the brightest solid level.
        const REVERSED = 1 << 2;
        /// A medium press is handled like a long press.
        const MEDIUM_PRESS_DISABLED = 1 << 3;
        /// Lock the current mode after a few seconds of use.
        const LOCK_MODE = 1 << 4;
        /// Skip the lowest solid level.
        const MOON_DISABLED = 1 << 5;
        /// Never select the top two steps of the group.
        const MUGGLE = 1 << 6;
        /// Set once the config has been loaded or wiped.
        const INITIALIZED = 1 << 7;
    }
}

impl Config {
    /// Configuration written on first boot or after a reset.
    pub const DEFAULT: Config = Config::INITIALIZED;

    /// Options in the order the config menu presents them.
    ///
    /// The last entry is [`Config::INITIALIZED`]; leaving it cleared makes
    /// the next boot wipe the config back to [`Config::DEFAULT`].
    pub const MENU: [Config; 8] = [
        Config::MODE_GROUP,
        Config::MEMORY,
        Config::REVERSED,
        Config::MEDIUM_PRESS_DISABLED,
        Config::LOCK_MODE,
        Config::MOON_DISABLED,
        Config::MUGGLE,
        Config::INITIALIZED,
    ];

    /// Decodes the raw byte read from the config cell.
    #[inline]
    pub const fn from_cell(cell: u8) -> Self {
        Config::from_bits_retain(!cell)
    }

    /// Encodes the config for the config cell.
    #[inline]
    pub const fn to_cell(self) -> u8 {
        !self.bits()
    }

    /// True if this value must be replaced with [`Config::DEFAULT`].
    #[inline]
    pub const fn needs_reset(self) -> bool {
        !self.contains(Config::INITIALIZED)
    }

    /// Solid-mode step width for the selected group.
    #[inline]
    pub const fn step(self) -> u8 {
        if self.contains(Config::MODE_GROUP) { 2 } else { 1 }
    }

    /// A long press keeps the last mode instead of resetting.
    pub const fn memory_enabled(self) -> bool {
        self.contains(Config::MEMORY)
    }

    /// Resets land on the brightest level and short presses walk downward.
    pub const fn direction_reversed(self) -> bool {
        self.contains(Config::REVERSED)
    }

    /// Medium presses are treated as long presses.
    pub const fn medium_press_disabled(self) -> bool {
        self.contains(Config::MEDIUM_PRESS_DISABLED)
    }

    /// A mode held for the lock delay survives short and medium presses.
    pub const fn lock_mode_enabled(self) -> bool {
        self.contains(Config::LOCK_MODE)
    }

    /// The dimmest solid level is left out of the cycle.
    pub const fn moon_mode_disabled(self) -> bool {
        self.contains(Config::MOON_DISABLED)
    }

    /// The two brightest steps are left out of the cycle.
    pub const fn muggle_mode(self) -> bool {
        self.contains(Config::MUGGLE)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::DEFAULT
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Config {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Config({=u8:#04x})", self.bits())
    }
}
