#![no_std]
#![no_main]

mod board;

use core::cell::Cell;
use core::convert::Infallible;
use core::fmt::Debug;

use panic_rtt_target as _;
use rtt_target::{rprintln, rtt_init_print};

use embassy_executor::Spawner;
use embassy_futures::select::{select3, Either3};
use embassy_nrf_ws2812_pwm::Ws2812;
use embassy_sync::blocking_mutex::raw::ThreadModeRawMutex;
use microbit_bsp::{
    embassy_nrf::{bind_interrupts, peripherals, qdec},
    Microbit,
};
use static_cell::StaticCell;
use timer_lamp::{power, Instant, LampState, SharedLamp, SleepController, SmartLedStrip};

use board::{ButtonEdges, NrfSleep, QdecEncoder, Unowned};

/// Pixels on the strip wired to edge pin P0.
pub const PIXEL_COUNT: usize = 7;
/// Button A is P0.14.
pub const BUTTON_PIN: u8 = 14;
/// Quadrature steps per mechanical detent.
pub const ENCODER_DIVISOR: i32 = 2;

/// One PWM word per bit of GRB data.
const STRIP_WORDS: usize = PIXEL_COUNT * 24;
static STRIP_BUFFER: StaticCell<[u16; STRIP_WORDS]> = StaticCell::new();

bind_interrupts!(struct Irqs {
    QDEC => qdec::InterruptHandler<peripherals::QDEC>;
});

#[embassy_executor::main]
async fn main(_spawner: Spawner) -> ! {
    rtt_init_print!();
    let err = inner_main().await.unwrap_err();
    panic!("{:?}", err);
}

/// Runs one session and sleeps. Returns only if the LED strip fails.
async fn inner_main() -> Result<Infallible, impl Debug> {
    let board = Microbit::default();
    let sleep = NrfSleep::new();
    rprintln!("Alarm wake up: {}", sleep.woke_from_alarm());

    let presses = Cell::new(0);
    let button = ButtonEdges::new(&presses);

    let mut qdec_config = qdec::Config::default();
    qdec_config.debounce = true;
    let qdec = qdec::Qdec::new(Unowned::qdec(), Irqs, board.p1, board.p2, qdec_config);
    let steps = Cell::new(0);
    let encoder = QdecEncoder::new(&steps, ENCODER_DIVISOR);

    let buffer = STRIP_BUFFER.init([0; STRIP_WORDS]);
    let strip = SmartLedStrip::new(Ws2812::new(board.pwm0, board.p0, buffer), PIXEL_COUNT);

    let lamp = SharedLamp::<ThreadModeRawMutex>::new(LampState::new(Instant::now()));
    let session = timer_lamp::run(&lamp, button, encoder, strip);
    let encoder_pump = board::pump_qdec(qdec, &steps);
    let button_pump = board::pump_button(board.btn_a, &presses);
    match select3(session, encoder_pump, button_pump).await {
        Either3::First(Ok(())) => {}
        Either3::First(Err(err)) => return Err(err),
        Either3::Second(never) | Either3::Third(never) => match never {},
    }

    rprintln!("Power: sleeping until button A is pressed");
    power::shut_down(sleep, BUTTON_PIN)
}
