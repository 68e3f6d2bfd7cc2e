//! # Knob Input Module
//!
//! The encoder task. Before the countdown starts, the knob sets how long the
//! countdown will be; afterwards it edits the channel the button selected.
//!
//! ## Duration Preview
//!
//! While waiting for the first press the deadline previews live as
//! `input_deadline + 5 s * position`. It is anchored at the idle timeout
//! instant, not at `now`. When the countdown starts the deadline is
//! recommitted as `now + 5 s * position` and the encoder is zeroed.
//!
//! ## Color Editing
//!
//! Each tick any accumulated detents move the active channel by
//! [`COLOR_STEP_PER_DETENT`] per detent, saturating at 0 and 255, and the
//! encoder is zeroed again.
use crate::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    DurationSet,
    ColorAdjust,
    Done,
}

/// What a single [`Knob::step`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnobEvent {
    /// Countdown not started; deadline previewed from this many detents.
    Previewed(i32),
    /// Countdown started; deadline committed this many seconds from now.
    CountdownSet { seconds: i64 },
    /// The active channel moved; this is the new color.
    ColorAdjusted(RGB8),
    /// Nothing turned.
    Unchanged,
    /// Shutdown observed; the task is over.
    Finished,
}

/// Encoder task: owns the encoder and writes `deadline` and `color`.
pub struct Knob<'a, M: RawMutex, E: IncrementalEncoder> {
    lamp: &'a SharedLamp<M>,
    encoder: E,
    phase: Phase,
}

impl<'a, M: RawMutex, E: IncrementalEncoder> Knob<'a, M, E> {
    /// Creates the encoder task in the duration-setting phase.
    ///
    /// # Arguments
    ///
    /// * `lamp` - Shared state for this session
    /// * `encoder` - Rotary encoder, read as signed detents
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let encoder = QdecEncoder::new(&steps, ENCODER_DIVISOR);
    /// let knob = Knob::new(&lamp, encoder);
    /// knob.run().await;
    /// ```
    pub fn new(lamp: &'a SharedLamp<M>, encoder: E) -> Self {
        Self {
            lamp,
            encoder,
            phase: Phase::DurationSet,
        }
    }

    /// Runs one tick of the encoder state machine at time `now`.
    ///
    /// Shutdown ends the task from either phase, so an idle timeout that
    /// never starts the countdown still lets this task finish.
    pub fn step(&mut self, now: Instant) -> KnobEvent {
        let snapshot = self.lamp.get();
        if self.phase == Phase::Done || snapshot.shutdown_requested() {
            self.phase = Phase::Done;
            return KnobEvent::Finished;
        }
        match self.phase {
            Phase::DurationSet => {
                let position = self.encoder.position();
                if !snapshot.countdown_started() {
                    let deadline = state::offset_by_detents(snapshot.input_deadline, position);
                    self.lamp.update(|state| state.deadline = deadline);
                    return KnobEvent::Previewed(position);
                }
                let deadline = state::offset_by_detents(now, position);
                self.lamp.update(|state| state.deadline = deadline);
                self.encoder.set_position(0);
                self.phase = Phase::ColorAdjust;
                KnobEvent::CountdownSet {
                    seconds: i64::from(position) * TIME_PER_DETENT as i64,
                }
            }
            Phase::ColorAdjust => {
                let position = self.encoder.position();
                if position == 0 {
                    return KnobEvent::Unchanged;
                }
                let color = self.lamp.update(|state| {
                    state.adjust_active_channel(position.saturating_mul(COLOR_STEP_PER_DETENT));
                    state.color
                });
                self.encoder.set_position(0);
                KnobEvent::ColorAdjusted(color)
            }
            Phase::Done => KnobEvent::Finished,
        }
    }

    /// Main encoder loop, one [`Knob::step`] every [`TICK`]. Returns once
    /// shutdown is observed, releasing the encoder.
    pub async fn run(mut self) {
        loop {
            match self.step(Instant::now()) {
                KnobEvent::CountdownSet { seconds } => {
                    rprintln!("Knob: timer set for {} seconds", seconds);
                }
                KnobEvent::ColorAdjusted(color) => {
                    rprintln!("Knob: color {} {} {}", color.r, color.g, color.b);
                }
                KnobEvent::Finished => break,
                _ => {}
            }
            Timer::after(TICK).await;
        }
        rprintln!("Knob: cleaned up encoder");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;

    struct Detents<'c>(&'c Cell<i32>);

    impl IncrementalEncoder for Detents<'_> {
        fn position(&mut self) -> i32 {
            self.0.get()
        }

        fn set_position(&mut self, position: i32) {
            self.0.set(position);
        }
    }

    fn lamp() -> SharedLamp<NoopRawMutex> {
        SharedLamp::new(LampState::new(Instant::from_secs(0)))
    }

    #[test]
    fn preview_is_anchored_at_idle_timeout() {
        let lamp = lamp();
        let detents = Cell::new(4);
        let mut knob = Knob::new(&lamp, Detents(&detents));
        assert_eq!(knob.step(Instant::from_secs(1)), KnobEvent::Previewed(4));
        assert_eq!(lamp.get().deadline, Instant::from_secs(50));

        // The anchor does not move with time.
        assert_eq!(knob.step(Instant::from_secs(9)), KnobEvent::Previewed(4));
        assert_eq!(lamp.get().deadline, Instant::from_secs(50));

        detents.set(-3);
        knob.step(Instant::from_secs(10));
        assert_eq!(lamp.get().deadline, Instant::from_secs(15));
        assert_eq!(detents.get(), -3);
    }

    #[test]
    fn start_commits_deadline_from_now_and_zeroes() {
        let lamp = lamp();
        let detents = Cell::new(4);
        let mut knob = Knob::new(&lamp, Detents(&detents));
        knob.step(Instant::from_secs(1));

        lamp.update(LampState::start_countdown);
        assert_eq!(
            knob.step(Instant::from_secs(2)),
            KnobEvent::CountdownSet { seconds: 20 }
        );
        assert_eq!(lamp.get().deadline, Instant::from_secs(22));
        assert_eq!(detents.get(), 0);
    }

    #[test]
    fn turns_adjust_the_active_channel() {
        let lamp = lamp();
        let detents = Cell::new(0);
        let mut knob = Knob::new(&lamp, Detents(&detents));
        lamp.update(|state| {
            state.start_countdown();
            state.active_channel = Channel::Blue;
            state.color = RGB8::new(10, 10, 200);
        });
        knob.step(Instant::from_secs(1));
        assert_eq!(knob.step(Instant::from_secs(2)), KnobEvent::Unchanged);

        detents.set(-30);
        assert_eq!(
            knob.step(Instant::from_secs(3)),
            KnobEvent::ColorAdjusted(RGB8::new(10, 10, 110))
        );
        assert_eq!(detents.get(), 0);

        detents.set(-70);
        knob.step(Instant::from_secs(3));
        assert_eq!(lamp.get().color, RGB8::new(10, 10, 0));

        lamp.update(|state| state.active_channel = Channel::Red);
        detents.set(2);
        knob.step(Instant::from_secs(4));
        assert_eq!(lamp.get().color, RGB8::new(16, 10, 0));

        detents.set(100);
        knob.step(Instant::from_secs(5));
        assert_eq!(lamp.get().color, RGB8::new(255, 10, 0));
    }

    #[test]
    fn shutdown_ends_either_phase() {
        let lamp = lamp();
        let detents = Cell::new(2);
        let mut knob = Knob::new(&lamp, Detents(&detents));
        knob.step(Instant::from_secs(1));
        let previewed = lamp.get().deadline;

        lamp.update(LampState::request_shutdown);
        assert_eq!(knob.step(Instant::from_secs(31)), KnobEvent::Finished);
        assert_eq!(lamp.get().deadline, previewed);
        assert_eq!(detents.get(), 2);
        assert_eq!(knob.step(Instant::from_secs(32)), KnobEvent::Finished);
    }
}
