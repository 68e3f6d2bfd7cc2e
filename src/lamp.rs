//! Top-level session runner.
use embassy_futures::join::join3;

use crate::*;

/// Runs one power-on session: the button, encoder and display tasks
/// interleaved on the current executor until all three have finished.
///
/// Each driver is moved into the task that owns it and dropped when that
/// task ends. The caller hands over to [`power::shut_down`] afterwards.
///
/// # Errors
///
/// A strip failure stops the display. Shutdown is then latched so the other
/// two tasks wind down within a tick, and the error is returned once they
/// have.
pub async fn run<M, C, E, S>(
    lamp: &SharedLamp<M>,
    button: C,
    encoder: E,
    strip: S,
) -> Result<(), S::Error>
where
    M: RawMutex,
    C: EdgeCounter,
    E: IncrementalEncoder,
    S: LedStrip,
{
    let ui = Ui::new(lamp, button);
    let knob = Knob::new(lamp, encoder);
    let display = async {
        let shown = RgbDisplay::new(lamp, strip).run().await;
        if shown.is_err() {
            lamp.update(LampState::request_shutdown);
        }
        shown
    };
    let ((), (), shown) = join3(ui.run(), knob.run(), display).await;
    shown
}
