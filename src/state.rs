//! Shared lamp state and the arithmetic the tasks apply to it.
use core::cell::Cell;

use embassy_sync::blocking_mutex::Mutex;
use num_traits::float::FloatCore;

use crate::*;

/// Color channel the encoder currently edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Red,
    Green,
    Blue,
}

impl Channel {
    /// Maps a button edge count onto a channel: Red, Green, Blue, Red, ...
    pub fn from_count(count: u32) -> Self {
        match count % 3 {
            0 => Channel::Red,
            1 => Channel::Green,
            _ => Channel::Blue,
        }
    }

    /// The dim single-channel color shown when this channel is selected.
    pub fn indicator(self) -> RGB8 {
        let mut color = RGB8::default();
        *channel_mut(&mut color, self) = INDICATOR_LEVEL;
        color
    }
}

fn channel_mut(color: &mut RGB8, channel: Channel) -> &mut u8 {
    match channel {
        Channel::Red => &mut color.r,
        Channel::Green => &mut color.g,
        Channel::Blue => &mut color.b,
    }
}

/// Adds `delta` to a channel value, saturating at 0 and 255.
pub fn adjust_channel(value: u8, delta: i32) -> u8 {
    i32::from(value).saturating_add(delta).clamp(0, 255) as u8
}

/// Triangle wave with a one second period: 1.0 on the whole second, 0.0
/// on the half second.
pub fn pulse_brightness(now: Instant) -> f32 {
    let phase = (now.as_micros() % 1_000_000) as f32 / 1_000_000.0;
    (FloatCore::abs(phase - 0.5) * 2.0).clamp(0.0, 1.0)
}

/// Moves `anchor` by [`TIME_PER_DETENT`] per detent of `position`.
///
/// Negative positions move the instant backwards, saturating at the zero
/// instant.
pub fn offset_by_detents(anchor: Instant, position: i32) -> Instant {
    let span = Duration::from_secs(TIME_PER_DETENT * u64::from(position.unsigned_abs()));
    if position >= 0 {
        anchor.checked_add(span).unwrap_or(Instant::MAX)
    } else {
        anchor.checked_sub(span).unwrap_or(Instant::MIN)
    }
}

/// Snapshot of everything the three tasks share.
///
/// The button task writes `brightness`, `active_channel` and both latches;
/// the encoder task writes `deadline` and `color`; the display task only
/// reads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LampState {
    pub color: RGB8,
    /// Output scale in [0.0, 1.0].
    pub brightness: f32,
    pub active_channel: Channel,
    /// End of the countdown. Only authoritative once the countdown started.
    pub deadline: Instant,
    /// Give up waiting for a first press after this instant.
    pub input_deadline: Instant,
    countdown_started: bool,
    shutdown_requested: bool,
}

impl LampState {
    /// Power-on state for a session that begins at `now`.
    pub fn new(now: Instant) -> Self {
        Self {
            color: INITIAL_COLOR,
            brightness: 1.0,
            active_channel: Channel::Red,
            deadline: now,
            input_deadline: now + IDLE_TIMEOUT,
            countdown_started: false,
            shutdown_requested: false,
        }
    }

    /// True once the first press has started the countdown. Never goes
    /// back to false.
    pub fn countdown_started(&self) -> bool {
        self.countdown_started
    }

    /// True once the session is over, for whatever reason. Every task
    /// finishes after seeing it. Never goes back to false.
    pub fn shutdown_requested(&self) -> bool {
        self.shutdown_requested
    }

    /// Latches the countdown on. There is no way back.
    pub fn start_countdown(&mut self) {
        self.countdown_started = true;
    }

    /// Latches shutdown on. There is no way back.
    pub fn request_shutdown(&mut self) {
        self.shutdown_requested = true;
    }

    /// Sets the strip brightness, clamped to [0.0, 1.0].
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use timer_lamp::{Instant, LampState};
    /// let mut state = LampState::new(Instant::from_secs(0));
    /// state.set_brightness(1.7);
    /// assert_eq!(state.brightness, 1.0);
    /// ```
    pub fn set_brightness(&mut self, brightness: f32) {
        self.brightness = brightness.clamp(0.0, 1.0);
    }

    /// Adds `delta` to the active channel of `color`, saturating.
    pub fn adjust_active_channel(&mut self, delta: i32) {
        let value = channel_mut(&mut self.color, self.active_channel);
        *value = adjust_channel(*value, delta);
    }
}

/// The single [`LampState`] shared by reference between all tasks.
///
/// Each access copies the state in or out under `M`, so no borrow is ever
/// held across an `.await`.
pub struct SharedLamp<M: RawMutex> {
    state: Mutex<M, Cell<LampState>>,
}

impl<M: RawMutex> SharedLamp<M> {
    /// Wraps the power-on state for sharing between the tasks.
    ///
    /// # Arguments
    ///
    /// * `state` - Initial state, normally [`LampState::new`] at boot
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let lamp = SharedLamp::<ThreadModeRawMutex>::new(LampState::new(Instant::now()));
    /// timer_lamp::run(&lamp, button, encoder, strip).await?;
    /// ```
    pub fn new(state: LampState) -> Self {
        Self {
            state: Mutex::new(Cell::new(state)),
        }
    }

    /// A copy of the current state.
    pub fn get(&self) -> LampState {
        self.state.lock(|state| state.get())
    }

    /// Applies `update` to the state and returns whatever it returns.
    pub fn update<R>(&self, update: impl FnOnce(&mut LampState) -> R) -> R {
        self.state.lock(|cell| {
            let mut state = cell.get();
            let result = update(&mut state);
            cell.set(state);
            result
        })
    }
}
