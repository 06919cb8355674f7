//! Flash timer of a symbol

use ig_event_system::Signal;
use std::cell::Cell;

/// On/off flash signal computed from a duty cycle and a period.
///
/// The timer is advanced with [`FlashState::update`]. `changed` fires only
/// when the computed value actually flips.
///
/// | Duty cycle | Period | Result |
/// |---|---|---|
/// | 0 | any | always off |
/// | 100 | any | always on |
/// | 1..=99 | <= 0 | always off |
/// | 1..=99 | > 0 | on for the first `duty`% of every period |
#[derive(Debug)]
pub struct FlashState {
    duty_cycle: Cell<u8>,
    period: Cell<f64>,
    time_now: Cell<f64>,
    on: Cell<bool>,
    /// Emitted with the new value on every on/off transition
    pub changed: Signal<bool>,
}

impl FlashState {
    /// A steady (non-flashing) state that is always on.
    pub fn new() -> Self {
        Self {
            duty_cycle: Cell::new(100),
            period: Cell::new(0.0),
            time_now: Cell::new(0.0),
            on: Cell::new(true),
            changed: Signal::new(),
        }
    }

    pub fn duty_cycle(&self) -> u8 {
        self.duty_cycle.get()
    }

    /// Sets the duty cycle percentage, clamped to 100.
    pub fn set_duty_cycle(&self, percentage: u8) {
        self.duty_cycle.set(percentage.min(100));
        self.evaluate();
    }

    pub fn period(&self) -> f64 {
        self.period.get()
    }

    /// Sets the period in seconds, clamped to be non-negative.
    pub fn set_period(&self, seconds: f64) {
        self.period.set(if seconds.is_finite() { seconds.max(0.0) } else { 0.0 });
        self.evaluate();
    }

    pub fn time(&self) -> f64 {
        self.time_now.get()
    }

    /// Restarts the sequence at the beginning of a period.
    pub fn reset_sequence(&self) {
        self.time_now.set(0.0);
        self.evaluate();
    }

    /// Advances the timer by `dt` seconds.
    pub fn update(&self, dt: f64) {
        self.time_now.set(self.time_now.get() + dt.max(0.0));
        self.evaluate();
    }

    /// Current on/off value.
    pub fn is_on(&self) -> bool {
        self.on.get()
    }

    /// Whether the settings produce an alternating signal at all.
    pub fn is_flashing(&self) -> bool {
        let duty = self.duty_cycle.get();
        duty > 0 && duty < 100 && self.period.get() > 0.0
    }

    fn compute(&self) -> bool {
        let duty = self.duty_cycle.get();
        let period = self.period.get();
        if duty == 0 {
            return false;
        }
        if duty >= 100 {
            return true;
        }
        if period <= 0.0 {
            return false;
        }
        let fraction = (self.time_now.get() / period).fract();
        fraction < f64::from(duty) / 100.0
    }

    fn evaluate(&self) {
        let on = self.compute();
        if on != self.on.get() {
            self.on.set(on);
            self.changed.emit(&on);
        }
    }
}

impl Default for FlashState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ig_event_system::ReceiverId;
    use std::rc::Rc;

    fn counting(flash: &FlashState) -> Rc<Cell<u32>> {
        let count = Rc::new(Cell::new(0));
        let sink = count.clone();
        flash
            .changed
            .connect(ReceiverId::new(), move |_| sink.set(sink.get() + 1));
        count
    }

    #[test]
    fn emits_two_edges_per_period() {
        let flash = FlashState::new();
        flash.set_duty_cycle(50);
        flash.set_period(1.0);
        let changes = counting(&flash);

        for _ in 0..1025 {
            flash.update(0.01);
        }

        // 10.25 seconds: on->off at every x.5 and off->on at every whole second
        assert_eq!(changes.get(), 20);
        assert!(flash.is_flashing());
    }

    #[test]
    fn steady_settings_never_flip() {
        let flash = FlashState::new();
        let changes = counting(&flash);
        for _ in 0..500 {
            flash.update(0.01);
        }
        assert_eq!(changes.get(), 0);
        assert!(flash.is_on());
        assert!(!flash.is_flashing());
    }

    #[test]
    fn degenerate_settings() {
        let flash = FlashState::new();
        flash.set_duty_cycle(0);
        assert!(!flash.is_on());

        flash.set_duty_cycle(150);
        assert_eq!(flash.duty_cycle(), 100);
        assert!(flash.is_on());

        flash.set_duty_cycle(30);
        flash.set_period(-4.0);
        assert_eq!(flash.period(), 0.0);
        assert!(!flash.is_on());
        assert!(!flash.is_flashing());
    }

    #[test]
    fn reset_restarts_the_period() {
        let flash = FlashState::new();
        flash.set_duty_cycle(25);
        flash.set_period(2.0);
        flash.update(1.0);
        assert!(!flash.is_on());

        flash.reset_sequence();
        assert_eq!(flash.time(), 0.0);
        assert!(flash.is_on());
    }
}
