//! Blink patterns used for feedback and the hidden modes.
//!
//! All timing is busy-wait; there is nothing to cancel. A pattern runs to
//! completion or until the power goes away.

use crate::hal::LightOutput;
use embedded_hal::delay::DelayNs;

/// Length of one control-loop hold.
pub const TICK_MS: u32 = 1000;

/// Pause between showing a config option and toggling it.
pub const MENU_PAUSE_MS: u32 = 500;

/// Gap between the short and long groups of an SOS.
pub const SOS_GAP_MS: u32 = 200;

/// Blinks `count` times on the primary channel.
///
/// Each blink is on for `speed` × 10 ms and off for twice that.
pub fn blink<O: LightOutput, D: DelayNs>(
    output: &mut O,
    delay: &mut D,
    count: u8,
    speed: u8,
    level: u8,
) {
    let on_ms = u32::from(speed) * 10;
    for _ in 0..count {
        output.set_output(level, 0);
        delay.delay_ms(on_ms);
        output.set_output(0, 0);
        delay.delay_ms(on_ms * 2);
    }
}

/// Three quick blinks shown at boot when the battery is nearly empty.
pub fn low_battery_warning<O: LightOutput, D: DelayNs>(output: &mut O, delay: &mut D) {
    blink(output, delay, 3, 5, 30);
}

/// Readout blinks: battery level or config option ordinal.
pub fn count_out<O: LightOutput, D: DelayNs>(output: &mut O, delay: &mut D, count: u8) {
    blink(output, delay, count, 12, 30);
}

/// Fast buzz during which power-cycling keeps a config option toggled.
pub fn confirm_buzz<O: LightOutput, D: DelayNs>(output: &mut O, delay: &mut D) {
    blink(output, delay, 48, 1, 20);
}

/// One 10Hz strobe burst.
pub fn strobe<O: LightOutput, D: DelayNs>(output: &mut O, delay: &mut D) {
    blink(output, delay, 4, 2, u8::MAX);
}

/// Strobe burst, then a steady secondary-channel hold. The hold is left to
/// the caller so it can engage the lock first.
pub fn beacon<O: LightOutput, D: DelayNs>(output: &mut O, delay: &mut D) {
    strobe(output, delay);
    output.set_output(0, u8::MAX);
}

/// One full SOS followed by a tick-long pause.
pub fn sos<O: LightOutput, D: DelayNs>(output: &mut O, delay: &mut D) {
    blink(output, delay, 3, 10, u8::MAX);
    delay.delay_ms(SOS_GAP_MS);
    blink(output, delay, 3, 20, u8::MAX);
    blink(output, delay, 3, 10, u8::MAX);
    delay.delay_ms(TICK_MS);
}
