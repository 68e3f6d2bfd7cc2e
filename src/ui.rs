//! # User Interface Module
//!
//! The button task. It drives the lamp through three phases:
//!
//! - **Idle wait**: pulse the lamp until the first press, or give up once
//!   the idle timeout passes and request shutdown without a countdown.
//! - **Color cycle**: the countdown is running; every new press selects the
//!   next channel for the encoder to edit.
//! - **Done**: the countdown expired and shutdown has been requested.
//!
//! ## Control Scheme
//!
//! Edge counts are kept for the whole session, and the press that starts
//! the countdown is count 1. Channels follow `count % 3`, so the starting
//! press already selects green:
//!
//! ```text
//! count:   1      2     3    4
//! channel: Green  Blue  Red  Green
//! ```
use crate::*;

/// Phase of the button task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    IdleWait,
    /// Countdown running; `seen` is the last edge count acted on.
    ColorCycle { seen: u32 },
    Done,
}

/// What a single [`Ui::step`] did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UiEvent {
    /// Still waiting for a first press; brightness set to this level.
    Pulse(f32),
    /// First press seen: countdown latched, brightness at full, and the
    /// starting press selected this channel.
    CountdownStarted(Channel),
    /// A later press selected a new channel.
    ChannelSelected(Channel),
    /// Countdown running, nothing new.
    Waiting,
    /// Nobody pressed the button in time; shutdown requested.
    IdleTimeout,
    /// The countdown reached its deadline; shutdown requested.
    CountdownExpired,
    /// The task already finished.
    Finished,
}

impl UiEvent {
    fn is_final(self) -> bool {
        matches!(
            self,
            UiEvent::IdleTimeout | UiEvent::CountdownExpired | UiEvent::Finished
        )
    }
}

/// Button task: owns the edge counter and writes `brightness`,
/// `active_channel` and both latches of the shared state.
pub struct Ui<'a, M: RawMutex, C: EdgeCounter> {
    lamp: &'a SharedLamp<M>,
    button: C,
    phase: Phase,
}

impl<'a, M: RawMutex, C: EdgeCounter> Ui<'a, M, C> {
    /// Creates the button task around an already acquired edge counter.
    ///
    /// # Arguments
    ///
    /// * `lamp` - Shared state for this session
    /// * `button` - Rising-edge counter bound to the button pin
    pub fn new(lamp: &'a SharedLamp<M>, button: C) -> Self {
        Self {
            lamp,
            button,
            phase: Phase::IdleWait,
        }
    }

    /// Runs one tick of the button state machine at time `now`.
    ///
    /// # Idle Wait
    ///
    /// A non-zero edge count starts the countdown. Otherwise, once `now` is
    /// past `input_deadline`, shutdown is requested and the countdown never
    /// starts. Otherwise brightness follows [`state::pulse_brightness`].
    ///
    /// # Color Cycle
    ///
    /// Once `now` reaches the deadline shutdown is requested. Before that,
    /// any edge count above the last one acted on selects
    /// `Channel::from_count(count)`.
    ///
    /// The tick that starts the countdown does not look at the deadline: the
    /// encoder task commits the real one on its next tick.
    ///
    /// A shutdown requested elsewhere (a failed strip) ends the task from
    /// either phase.
    pub fn step(&mut self, now: Instant) -> UiEvent {
        if self.phase != Phase::Done && self.lamp.get().shutdown_requested() {
            self.phase = Phase::Done;
        }
        match self.phase {
            Phase::IdleWait => {
                let count = self.button.count();
                if count > 0 {
                    let channel = Channel::from_count(count);
                    self.lamp.update(|state| {
                        state.start_countdown();
                        state.set_brightness(1.0);
                        state.active_channel = channel;
                    });
                    self.phase = Phase::ColorCycle { seen: count };
                    return UiEvent::CountdownStarted(channel);
                }
                if now > self.lamp.get().input_deadline {
                    self.lamp.update(LampState::request_shutdown);
                    self.phase = Phase::Done;
                    return UiEvent::IdleTimeout;
                }
                let level = state::pulse_brightness(now);
                self.lamp.update(|state| state.set_brightness(level));
                UiEvent::Pulse(level)
            }
            Phase::ColorCycle { seen } => {
                if now >= self.lamp.get().deadline {
                    self.lamp.update(LampState::request_shutdown);
                    self.phase = Phase::Done;
                    return UiEvent::CountdownExpired;
                }
                let count = self.button.count();
                if count > seen {
                    let channel = Channel::from_count(count);
                    self.lamp.update(|state| state.active_channel = channel);
                    self.phase = Phase::ColorCycle { seen: count };
                    return UiEvent::ChannelSelected(channel);
                }
                UiEvent::Waiting
            }
            Phase::Done => UiEvent::Finished,
        }
    }

    /// Main button loop, one [`Ui::step`] every [`TICK`].
    ///
    /// Returns once shutdown has been requested, releasing the edge counter.
    pub async fn run(mut self) {
        loop {
            let event = self.step(Instant::now());
            match event {
                UiEvent::CountdownStarted(channel) => {
                    rprintln!("UI: countdown started, editing {:?}", channel);
                }
                UiEvent::ChannelSelected(channel) => rprintln!("UI: new color {:?}", channel),
                UiEvent::IdleTimeout => rprintln!("UI: no press before timeout"),
                UiEvent::CountdownExpired => rprintln!("UI: countdown finished"),
                _ => {}
            }
            if event.is_final() {
                break;
            }
            Timer::after(TICK).await;
        }
        rprintln!("UI: cleaned up button");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;

    struct Presses<'c>(&'c Cell<u32>);

    impl EdgeCounter for Presses<'_> {
        fn count(&mut self) -> u32 {
            self.0.get()
        }
    }

    fn lamp() -> SharedLamp<NoopRawMutex> {
        SharedLamp::new(LampState::new(Instant::from_secs(0)))
    }

    #[test]
    fn pulses_until_pressed() {
        let lamp = lamp();
        let presses = Cell::new(0);
        let mut ui = Ui::new(&lamp, Presses(&presses));
        assert_eq!(ui.step(Instant::from_millis(500)), UiEvent::Pulse(0.0));
        assert_eq!(lamp.get().brightness, 0.0);
        assert_eq!(ui.step(Instant::from_millis(1_000)), UiEvent::Pulse(1.0));
        assert!(!lamp.get().countdown_started());
    }

    #[test]
    fn idle_timeout_skips_countdown() {
        let lamp = lamp();
        let presses = Cell::new(0);
        let mut ui = Ui::new(&lamp, Presses(&presses));
        assert!(matches!(ui.step(Instant::from_secs(30)), UiEvent::Pulse(_)));
        assert_eq!(ui.step(Instant::from_millis(30_040)), UiEvent::IdleTimeout);
        let state = lamp.get();
        assert!(state.shutdown_requested());
        assert!(!state.countdown_started());

        // A late press changes nothing.
        presses.set(1);
        assert_eq!(ui.step(Instant::from_secs(31)), UiEvent::Finished);
        assert!(!lamp.get().countdown_started());
    }

    #[test]
    fn first_press_starts_countdown_at_full_brightness() {
        let lamp = lamp();
        let presses = Cell::new(0);
        let mut ui = Ui::new(&lamp, Presses(&presses));
        ui.step(Instant::from_millis(1_500));
        assert_eq!(lamp.get().brightness, 0.0);

        presses.set(1);
        assert_eq!(
            ui.step(Instant::from_secs(2)),
            UiEvent::CountdownStarted(Channel::Green)
        );
        let state = lamp.get();
        assert!(state.countdown_started());
        assert_eq!(state.brightness, 1.0);
        assert_eq!(state.active_channel, Channel::Green);
    }

    #[test]
    fn presses_cycle_channels() {
        let lamp = lamp();
        lamp.update(|state| state.deadline = Instant::from_secs(60));
        let presses = Cell::new(1);
        let mut ui = Ui::new(&lamp, Presses(&presses));
        ui.step(Instant::from_secs(1));

        let mut seen = vec![lamp.get().active_channel];
        for count in 2..=4 {
            presses.set(count);
            ui.step(Instant::from_secs(2));
            seen.push(lamp.get().active_channel);
        }
        assert_eq!(
            seen,
            [Channel::Green, Channel::Blue, Channel::Red, Channel::Green]
        );
        assert_eq!(ui.step(Instant::from_secs(3)), UiEvent::Waiting);
    }

    #[test]
    fn two_presses_in_one_tick_land_on_the_latest_count() {
        let lamp = lamp();
        lamp.update(|state| state.deadline = Instant::from_secs(60));
        let presses = Cell::new(1);
        let mut ui = Ui::new(&lamp, Presses(&presses));
        ui.step(Instant::from_secs(1));
        presses.set(3);
        assert_eq!(
            ui.step(Instant::from_secs(2)),
            UiEvent::ChannelSelected(Channel::Red)
        );
    }

    #[test]
    fn countdown_ends_exactly_at_deadline() {
        let lamp = lamp();
        let presses = Cell::new(1);
        let mut ui = Ui::new(&lamp, Presses(&presses));
        ui.step(Instant::from_secs(2));
        lamp.update(|state| state.deadline = Instant::from_secs(22));

        assert_eq!(ui.step(Instant::from_millis(21_999)), UiEvent::Waiting);
        assert_eq!(ui.step(Instant::from_secs(22)), UiEvent::CountdownExpired);
        let state = lamp.get();
        assert!(state.shutdown_requested());
        assert!(state.countdown_started());
        assert_eq!(ui.step(Instant::from_secs(23)), UiEvent::Finished);
    }

    #[test]
    fn shutdown_from_elsewhere_ends_either_phase() {
        let idle = lamp();
        let presses = Cell::new(0);
        let mut ui = Ui::new(&idle, Presses(&presses));
        ui.step(Instant::from_secs(1));
        idle.update(LampState::request_shutdown);
        assert_eq!(ui.step(Instant::from_secs(2)), UiEvent::Finished);
        assert!(!idle.get().countdown_started());

        let counting = lamp();
        counting.update(|state| state.deadline = Instant::from_secs(60));
        let mut ui = Ui::new(&counting, Presses(&presses));
        presses.set(1);
        ui.step(Instant::from_secs(1));
        counting.update(LampState::request_shutdown);
        presses.set(2);
        assert_eq!(ui.step(Instant::from_secs(2)), UiEvent::Finished);
        assert_eq!(counting.get().active_channel, Channel::Green);
    }
}
