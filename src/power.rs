//! Power controller: the last thing a session does.
use crate::*;

/// Arms a wake alarm on `button_pin` (low level, pulled up) and enters
/// deep sleep. The next press restarts the firmware from reset.
pub fn shut_down<P: SleepController>(mut sleep: P, button_pin: u8) -> ! {
    sleep.arm_pin_alarm(wake_alarm(button_pin));
    sleep.deep_sleep()
}

/// The alarm a pressed, pulled-up button raises.
pub fn wake_alarm(button_pin: u8) -> PinAlarm {
    PinAlarm {
        pin: button_pin,
        level: TriggerLevel::Low,
        pull: Pull::Up,
    }
}
