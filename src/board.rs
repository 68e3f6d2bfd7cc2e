//! # micro:bit v2 Drivers
//!
//! nRF52833 implementations of the lamp's peripheral traits:
//!
//! - [`ButtonEdges`]: debounced releases of button A, counted by
//!   [`pump_button`] on GPIOTE
//! - [`QdecEncoder`]: detents from the QDEC peripheral, pumped by
//!   [`pump_qdec`]
//! - [`NrfSleep`]: System OFF with a GPIO sense wake-up
//!
//! The LED strip is `embassy-nrf-ws2812-pwm` behind
//! [`timer_lamp::SmartLedStrip`], set up in `main`.
use core::cell::Cell;

use embassy_time::{Duration, Timer};
use microbit_bsp::{
    embassy_nrf::{pac, peripherals::QDEC, qdec::Qdec},
    Button,
};
use timer_lamp::{EdgeCounter, IncrementalEncoder, PinAlarm, Pull, SleepController, TriggerLevel};

/// Contact settle time after each button transition.
const DEBOUNCE: Duration = Duration::from_millis(20);

/// Counts button releases (rising edges of the pulled-up input) into
/// `edges`. Runs until dropped, which releases the pin.
///
/// A press already held when the pump starts (the press that woke the
/// board) is not counted when it is released.
pub async fn pump_button(mut button: Button, edges: &Cell<u32>) -> ! {
    if button.is_low() {
        button.wait_for_high().await;
        Timer::after(DEBOUNCE).await;
    }
    loop {
        button.wait_for_low().await;
        Timer::after(DEBOUNCE).await;
        button.wait_for_high().await;
        edges.set(edges.get().saturating_add(1));
        Timer::after(DEBOUNCE).await;
    }
}

/// Edge count view of the cell kept by [`pump_button`].
pub struct ButtonEdges<'a> {
    edges: &'a Cell<u32>,
}

impl<'a> ButtonEdges<'a> {
    pub fn new(edges: &'a Cell<u32>) -> Self {
        Self { edges }
    }
}

impl EdgeCounter for ButtonEdges<'_> {
    fn count(&mut self) -> u32 {
        self.edges.get()
    }
}

/// Forwards every QDEC report into `steps`. Runs until dropped, which
/// releases the peripheral.
pub async fn pump_qdec(mut qdec: Qdec<'static, QDEC>, steps: &Cell<i32>) -> ! {
    loop {
        let delta = qdec.read().await;
        steps.set(steps.get().saturating_add(i32::from(delta)));
    }
}

/// Detent view of the raw step count kept by [`pump_qdec`].
pub struct QdecEncoder<'a> {
    steps: &'a Cell<i32>,
    divisor: i32,
}

impl<'a> QdecEncoder<'a> {
    pub fn new(steps: &'a Cell<i32>, divisor: i32) -> Self {
        Self { steps, divisor }
    }
}

impl IncrementalEncoder for QdecEncoder<'_> {
    fn position(&mut self) -> i32 {
        self.steps.get() / self.divisor
    }

    fn set_position(&mut self, position: i32) {
        self.steps.set(position.saturating_mul(self.divisor));
    }
}

/// Hardware the board support crate does not hand out.
///
/// This is the only `unsafe` in the firmware. Each accessor is sound
/// because the chip has one core and, at the point it is called, nothing
/// else owns the peripheral:
///
/// - [`Unowned::qdec`] is called once, at startup.
/// - [`Unowned::power`] touches RESETREAS at startup and SYSTEMOFF after
///   the session.
/// - [`Unowned::port0`] is used only after every GPIO driver is dropped.
pub struct Unowned;

impl Unowned {
    pub fn qdec() -> QDEC {
        // SAFETY: see above.
        unsafe { QDEC::steal() }
    }

    fn power() -> &'static pac::power::RegisterBlock {
        // SAFETY: see above.
        unsafe { &*pac::POWER::ptr() }
    }

    fn port0() -> &'static pac::p0::RegisterBlock {
        // SAFETY: see above.
        unsafe { &*pac::P0::ptr() }
    }
}

/// System OFF power control.
pub struct NrfSleep {
    woke: bool,
}

impl NrfSleep {
    /// Reads and clears the reset reason.
    pub fn new() -> Self {
        let power = Unowned::power();
        let woke = power.resetreas.read().off().is_detected();
        power.resetreas.write(|w| w.off().set_bit());
        Self { woke }
    }
}

impl SleepController for NrfSleep {
    fn woke_from_alarm(&self) -> bool {
        self.woke
    }

    fn arm_pin_alarm(&mut self, alarm: PinAlarm) {
        Unowned::port0().pin_cnf[usize::from(alarm.pin)].write(|w| {
            let w = w.dir().input().input().connect();
            let w = match alarm.pull {
                Pull::None => w.pull().disabled(),
                Pull::Up => w.pull().pullup(),
                Pull::Down => w.pull().pulldown(),
            };
            match alarm.level {
                TriggerLevel::Low => w.sense().low(),
                TriggerLevel::High => w.sense().high(),
            }
        });
    }

    fn deep_sleep(self) -> ! {
        Unowned::power().systemoff.write(|w| w.systemoff().enter());
        loop {
            cortex_m::asm::wfe();
        }
    }
}
