//! # RGB Strip Display Module
//!
//! The display task mirrors the shared state onto the LED strip. It never
//! writes shared state.
//!
//! ## Frames
//!
//! - **Steady**: the whole strip shows `color` at `brightness`, refreshed
//!   every [`TICK`].
//! - **Blink**: the active channel just changed. The strip goes black, then
//!   shows that channel alone at [`INDICATOR_LEVEL`], held for
//!   [`BLINK_HOLD`].
//! - **Off**: shutdown was requested. Brightness drops to zero and the
//!   strip driver is released.
//!
//! The first frame is always a blink, because nothing has been rendered yet.
use crate::*;

/// What a single [`RgbDisplay::step`] put on the strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame {
    Steady,
    Blink(Channel),
    Off,
}

impl Frame {
    /// How long the frame stays up before the next tick.
    pub fn hold(self) -> Duration {
        match self {
            Frame::Steady | Frame::Off => TICK,
            Frame::Blink(_) => BLINK_HOLD,
        }
    }
}

/// Display task: owns the LED strip for its whole life.
pub struct RgbDisplay<'a, M: RawMutex, S: LedStrip> {
    lamp: &'a SharedLamp<M>,
    strip: S,
    /// Channel shown by the last blink; `None` until the first frame.
    rendered: Option<Channel>,
}

impl<'a, M: RawMutex, S: LedStrip> RgbDisplay<'a, M, S> {
    /// Creates the display task. The strip stays dark until the first
    /// [`RgbDisplay::step`].
    ///
    /// # Arguments
    ///
    /// * `lamp` - Shared state for this session
    /// * `strip` - LED strip the task owns until it finishes
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let strip = SmartLedStrip::new(Ws2812::new(board.pwm0, board.p0, buffer), 7);
    /// let display = RgbDisplay::new(&lamp, strip);
    /// display.run().await?;
    /// ```
    pub fn new(lamp: &'a SharedLamp<M>, strip: S) -> Self {
        Self {
            lamp,
            strip,
            rendered: None,
        }
    }

    /// Renders one frame from the current shared state.
    ///
    /// # Errors
    ///
    /// Whatever the strip driver reports; the display has no fallback.
    pub async fn step(&mut self) -> Result<Frame, S::Error> {
        let state = self.lamp.get();
        if state.shutdown_requested() {
            self.strip.set_brightness(0.0).await?;
            return Ok(Frame::Off);
        }
        self.strip.set_brightness(state.brightness).await?;
        if self.rendered == Some(state.active_channel) {
            self.strip.fill(state.color).await?;
            return Ok(Frame::Steady);
        }
        self.rendered = Some(state.active_channel);
        self.strip.fill(RGB8::default()).await?;
        self.strip.fill(state.active_channel.indicator()).await?;
        Ok(Frame::Blink(state.active_channel))
    }

    /// Main display loop. Returns after the off frame, dropping the strip.
    pub async fn run(mut self) -> Result<(), S::Error> {
        loop {
            let frame = self.step().await?;
            if frame == Frame::Off {
                break;
            }
            Timer::after(frame.hold()).await;
        }
        drop(self.strip);
        rprintln!("RGB: cleaned up strip");
        Ok(())
    }
}
