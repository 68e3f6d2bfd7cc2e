//! # Peripheral Capabilities
//!
//! The lamp core never touches registers. Each task owns exactly one of the
//! drivers below for its whole lifetime and drops it when the task ends, so
//! whatever the implementation releases in `Drop` is released on every exit
//! path, including the idle-timeout shortcut.
//!
//! Board support implements these traits; tests implement them with
//! scripted mocks. Any `smart-leds` writer becomes a [`LedStrip`] through
//! [`SmartLedStrip`].
#![allow(async_fn_in_trait)]

use core::fmt::Debug;
use core::iter;

use smart_leds::{brightness, SmartLedsWriteAsync};

use crate::*;

/// Counts rising edges on the button input.
pub trait EdgeCounter {
    /// Edges seen since the counter was acquired. Never decreases.
    fn count(&mut self) -> u32;
}

/// Net detent count of a quadrature rotary encoder.
pub trait IncrementalEncoder {
    /// Signed detents since the last reset; positive is clockwise.
    fn position(&mut self) -> i32;
    /// Overwrites the detent count, usually with zero.
    fn set_position(&mut self, position: i32);
}

/// A fixed-length addressable LED strip that shows every change at once.
pub trait LedStrip {
    type Error: Debug;

    /// Scales everything shown from now on. `brightness` is in [0.0, 1.0].
    async fn set_brightness(&mut self, brightness: f32) -> Result<(), Self::Error>;
    /// Sets every pixel to `color` at the current brightness.
    async fn fill(&mut self, color: RGB8) -> Result<(), Self::Error>;
}

/// A [`LedStrip`] of `pixels` identical pixels on a `smart-leds` writer.
///
/// Every change rewrites the whole strip with [`smart_leds::brightness`]
/// applied to the current color.
pub struct SmartLedStrip<W> {
    writer: W,
    pixels: usize,
    color: RGB8,
    level: u8,
}

impl<W> SmartLedStrip<W>
where
    W: SmartLedsWriteAsync<Color = RGB8>,
    W::Error: Debug,
{
    /// Wraps `writer`. Nothing is written until the first change.
    ///
    /// # Arguments
    ///
    /// * `writer` - Driver for the strip's data line
    /// * `pixels` - Number of pixels on the strip
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let ws = Ws2812::new(board.pwm0, board.p0, buffer);
    /// let strip = SmartLedStrip::new(ws, PIXEL_COUNT);
    /// ```
    pub fn new(writer: W, pixels: usize) -> Self {
        Self {
            writer,
            pixels,
            color: RGB8::default(),
            level: u8::MAX,
        }
    }

    async fn show(&mut self) -> Result<(), W::Error> {
        let frame = iter::repeat(self.color).take(self.pixels);
        self.writer.write(brightness(frame, self.level)).await
    }
}

/// Maps a [0.0, 1.0] brightness onto the 0..=255 scale of
/// [`smart_leds::brightness`].
fn level_of(brightness: f32) -> u8 {
    (brightness.clamp(0.0, 1.0) * f32::from(u8::MAX)) as u8
}

impl<W> LedStrip for SmartLedStrip<W>
where
    W: SmartLedsWriteAsync<Color = RGB8>,
    W::Error: Debug,
{
    type Error = W::Error;

    async fn set_brightness(&mut self, brightness: f32) -> Result<(), W::Error> {
        self.level = level_of(brightness);
        self.show().await
    }

    async fn fill(&mut self, color: RGB8) -> Result<(), W::Error> {
        self.color = color;
        self.show().await
    }
}

/// Level that wakes the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerLevel {
    Low,
    High,
}

/// Pull resistor applied to the wake pin while asleep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pull {
    None,
    Up,
    Down,
}

/// A pin-level wake source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinAlarm {
    /// Port pin number as the board numbers it.
    pub pin: u8,
    pub level: TriggerLevel,
    pub pull: Pull,
}

/// Deep sleep with pin wake-up. Waking restarts the firmware from reset.
pub trait SleepController {
    /// True if this boot is a wake from deep sleep rather than a power-on.
    fn woke_from_alarm(&self) -> bool;
    fn arm_pin_alarm(&mut self, alarm: PinAlarm);
    /// Enters deep sleep. Control never comes back.
    fn deep_sleep(self) -> !;
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embassy_futures::block_on;

    /// Keeps every frame written to it.
    #[derive(Default)]
    struct Frames(Vec<Vec<RGB8>>);

    impl SmartLedsWriteAsync for Frames {
        type Error = Infallible;
        type Color = RGB8;

        async fn write<T, I>(&mut self, iterator: T) -> Result<(), Infallible>
        where
            T: IntoIterator<Item = I>,
            I: Into<Self::Color>,
        {
            self.0.push(iterator.into_iter().map(Into::into).collect());
            Ok(())
        }
    }

    #[test]
    fn every_change_rewrites_the_whole_strip() {
        let mut strip = SmartLedStrip::new(Frames::default(), 3);
        block_on(strip.fill(RGB8::new(10, 200, 255))).unwrap();
        block_on(strip.set_brightness(0.5)).unwrap();
        block_on(strip.set_brightness(0.0)).unwrap();

        let frames = &strip.writer.0;
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0], [RGB8::new(10, 200, 255); 3]);
        assert_eq!(frames[1], [RGB8::new(5, 100, 127); 3]);
        assert_eq!(frames[2], [RGB8::new(0, 0, 0); 3]);
    }

    #[test]
    fn brightness_is_clamped_before_scaling() {
        assert_eq!(level_of(1.0), 255);
        assert_eq!(level_of(3.0), 255);
        assert_eq!(level_of(0.5), 127);
        assert_eq!(level_of(-1.0), 0);
    }
}
