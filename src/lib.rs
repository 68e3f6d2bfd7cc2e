//! # Timer Lamp
//!
//! Behavioral core of a rotary-encoder timer lamp. While the lamp pulses,
//! each encoder detent adds [`TIME_PER_DETENT`] to a pending countdown. The
//! first button press starts the countdown; later presses pick which color
//! channel the encoder edits. When the countdown expires (or nobody presses
//! the button within [`IDLE_TIMEOUT`]) the strip goes dark and the device is
//! put into deep sleep, armed to wake on the next press.
//!
//! Three cooperative tasks share one [`SharedLamp`]:
//!
//! - [`Ui`]: the button task
//! - [`Knob`]: the encoder task
//! - [`RgbDisplay`]: the LED strip task
//!
//! [`run`] joins them, and [`power::shut_down`] takes over once they finish.
//! Hardware is reached only through the traits in [`drivers`].
#![cfg_attr(not(test), no_std)]

pub mod drivers;
pub mod knob;
pub mod lamp;
pub mod power;
pub mod rgb;
pub mod state;
pub mod ui;

pub use drivers::{
    EdgeCounter, IncrementalEncoder, LedStrip, PinAlarm, Pull, SleepController, SmartLedStrip,
    TriggerLevel,
};
pub use knob::{Knob, KnobEvent};
pub use lamp::run;
pub use rgb::{Frame, RgbDisplay};
pub use state::{Channel, LampState, SharedLamp};
pub use ui::{Ui, UiEvent};

pub use embassy_time::{Duration, Instant, Timer};
pub use smart_leds::RGB8;

use embassy_sync::blocking_mutex::raw::RawMutex;
use rtt_target::rprintln;

/// Time without a button press after which the lamp gives up and sleeps.
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(30);
/// Countdown length added per encoder detent, in seconds.
pub const TIME_PER_DETENT: u64 = 5;
/// Channel intensity change per encoder detent.
pub const COLOR_STEP_PER_DETENT: i32 = 3;
/// Sampling period shared by all three tasks.
pub const TICK: Duration = Duration::from_millis(40);
/// How long the display holds the channel indicator after a selection.
pub const BLINK_HOLD: Duration = Duration::from_millis(500);
/// Lamp color at power-on.
pub const INITIAL_COLOR: RGB8 = RGB8 { r: 10, g: 10, b: 10 };
/// Intensity of the selected channel in the indicator blink.
pub const INDICATOR_LEVEL: u8 = 20;
