//! Hardware abstraction traits.
//!
//! The driver core needs three narrow things from the board: the two analog
//! readings, the two output channels and a way to power down. Busy-wait delays
//! come from [`embedded_hal::delay::DelayNs`].

use embedded_hal::pwm::SetDutyCycle;

/// Trait for abstracting the two LED driver channels.
///
/// Implement this for your hardware (PWM compare registers, etc.). Handle any
/// hardware errors internally - this method cannot fail.
pub trait LightOutput {
    /// Sets both channels. 0 is off, 255 is maximum.
    fn set_output(&mut self, primary: u8, secondary: u8);
}

/// Trait for abstracting the analog inputs.
pub trait Sensors {
    /// Reads the off-time capacitor. Higher values mean a shorter off-time.
    ///
    /// Called first thing at boot, before the capacitor is recharged.
    fn read_offtime_signal(&mut self) -> u8;

    /// Reads the battery voltage as a raw ADC value.
    fn read_battery_level(&mut self) -> u8;

    /// Reads the MCU temperature, if the board supports it.
    fn read_temperature(&mut self) -> Option<u8> {
        None
    }
}

/// Trait for entering the deepest sleep state.
pub trait PowerControl {
    /// Powers down as much of the MCU as possible.
    ///
    /// On hardware this does not return until the next power cycle.
    fn power_down(&mut self);
}

/// Everything the driver needs from the board, bundled.
pub struct Board<O, A, D, P> {
    pub output: O,
    pub sensors: A,
    pub delay: D,
    pub power: P,
}

/// [`LightOutput`] over two PWM channels.
///
/// Levels are scaled from 0..=255 onto each channel's duty range.
pub struct PwmPair<A, B> {
    primary: A,
    secondary: B,
}

impl<A: SetDutyCycle, B: SetDutyCycle> PwmPair<A, B> {
    pub fn new(primary: A, secondary: B) -> Self {
        Self { primary, secondary }
    }

    /// Releases the channels.
    pub fn release(self) -> (A, B) {
        (self.primary, self.secondary)
    }
}

impl<A: SetDutyCycle, B: SetDutyCycle> LightOutput for PwmPair<A, B> {
    fn set_output(&mut self, primary: u8, secondary: u8) {
        let max = u16::from(u8::MAX);
        if self
            .primary
            .set_duty_cycle_fraction(u16::from(primary), max)
            .is_err()
        {
            warn!("pwm: primary channel rejected duty {=u8}", primary);
        }
        if self
            .secondary
            .set_duty_cycle_fraction(u16::from(secondary), max)
            .is_err()
        {
            warn!("pwm: secondary channel rejected duty {=u8}", secondary);
        }
    }
}
