//! Gesture decoding from raw line samples
//!
//! The decoder is pure: it sees a sample and a timestamp and reports at most
//! one gesture. Timed gestures (long press, double click) are resolved by the
//! [`InputHandler`](crate::input::InputHandler) on top of this.

use ampctl_core::Level;
use std::time::{Duration, Instant};
use tracing::trace;

/// Gesture produced by one input wake-up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    /// Button went down
    Press,
    /// Button came back up
    Release,
    /// Encoder moved one detent (`+1` clockwise, `-1` counter-clockwise)
    Rotate(i32),
}

/// Quadrature step for a `(previous << 2) | current` transition
fn quadrature_step(transition: u8) -> i32 {
    match transition {
        0b1101 | 0b0100 | 0b0010 | 0b1011 => -1,
        0b1110 | 0b0111 | 0b0001 | 0b1000 => 1,
        _ => 0,
    }
}

fn encoder_code(a: Level, b: Level) -> u8 {
    (a.bit() << 1) | b.bit()
}

/// Turns button and encoder samples into gestures
#[derive(Debug, Clone)]
pub struct GestureDecoder {
    debounce: Duration,
    button_held: bool,
    last_accepted: Option<Instant>,
    settle_at: Option<Instant>,
    code: u8,
}

impl GestureDecoder {
    /// Create a decoder seeded with the line levels sampled at startup
    ///
    /// Seeding means the first edge notification after arming, which the
    /// kernel reports even without a transition, decodes to nothing.
    pub fn new(debounce: Duration, button: Level, encoder_a: Level, encoder_b: Level) -> Self {
        Self {
            debounce,
            button_held: button == Level::Low,
            last_accepted: None,
            settle_at: None,
            code: encoder_code(encoder_a, encoder_b),
        }
    }

    /// Whether the button is currently considered held
    pub fn button_held(&self) -> bool {
        self.button_held
    }

    /// When the button must be sampled again
    ///
    /// Set while a dropped sample disagrees with the accepted state: the last
    /// edge of a short tap can land inside the debounce interval, and no
    /// further edge will follow it. Sampling the line at this deadline and
    /// feeding the result to [`button`](Self::button) catches up.
    pub fn settle_deadline(&self) -> Option<Instant> {
        self.settle_at
    }

    /// Feed a button sample taken at `now`
    ///
    /// The line is pulled low while the button is pressed. Samples arriving
    /// within the debounce interval of the last accepted one are dropped.
    pub fn button(&mut self, level: Level, now: Instant) -> Option<Gesture> {
        if let Some(last) = self.last_accepted {
            if now.saturating_duration_since(last) < self.debounce {
                if (level == Level::Low) != self.button_held {
                    self.settle_at = Some(last + self.debounce);
                }
                trace!(?level, "Button bounce dropped");
                return None;
            }
        }
        self.last_accepted = Some(now);
        self.settle_at = None;

        let pressed = level == Level::Low;
        if pressed == self.button_held {
            return None;
        }
        self.button_held = pressed;

        Some(if pressed {
            Gesture::Press
        } else {
            Gesture::Release
        })
    }

    /// Feed an encoder sample
    pub fn encoder(&mut self, a: Level, b: Level) -> Option<Gesture> {
        let code = encoder_code(a, b);
        if code == self.code {
            return None;
        }
        let transition = (self.code << 2) | code;
        self.code = code;

        match quadrature_step(transition) {
            0 => {
                trace!(transition, "Encoder noise dropped");
                None
            }
            step => Some(Gesture::Rotate(step)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Level::{High, Low};

    const DEBOUNCE: Duration = Duration::from_millis(50);

    fn decoder() -> GestureDecoder {
        GestureDecoder::new(DEBOUNCE, High, Low, Low)
    }

    fn feed(decoder: &mut GestureDecoder, codes: &[(Level, Level)]) -> Vec<Gesture> {
        codes
            .iter()
            .filter_map(|&(a, b)| decoder.encoder(a, b))
            .collect()
    }

    #[test]
    fn test_press_and_release() {
        let mut decoder = decoder();
        let t0 = Instant::now();

        assert_eq!(decoder.button(Low, t0), Some(Gesture::Press));
        assert!(decoder.button_held());
        assert_eq!(decoder.button(High, t0 + DEBOUNCE), Some(Gesture::Release));
        assert!(!decoder.button_held());
    }

    #[test]
    fn test_bounce_inside_interval_is_dropped() {
        let mut decoder = decoder();
        let t0 = Instant::now();

        assert_eq!(decoder.button(Low, t0), Some(Gesture::Press));
        assert_eq!(decoder.button(High, t0 + Duration::from_millis(10)), None);
        assert_eq!(decoder.button(Low, t0 + Duration::from_millis(20)), None);
        assert!(decoder.button_held());
    }

    #[test]
    fn test_debounce_measures_from_last_accepted_sample() {
        let mut decoder = decoder();
        let t0 = Instant::now();

        decoder.button(Low, t0);
        decoder.button(High, t0 + Duration::from_millis(30));
        assert_eq!(
            decoder.button(High, t0 + Duration::from_millis(55)),
            Some(Gesture::Release)
        );
    }

    #[test]
    fn test_repeated_level_is_not_a_transition() {
        let mut decoder = decoder();
        let t0 = Instant::now();

        assert_eq!(decoder.button(High, t0), None);
        assert_eq!(decoder.button(Low, t0 + DEBOUNCE), Some(Gesture::Press));
        assert_eq!(decoder.button(Low, t0 + DEBOUNCE * 2), None);
    }

    #[test]
    fn test_dropped_release_asks_for_a_resample() {
        let mut decoder = decoder();
        let t0 = Instant::now();

        assert_eq!(decoder.button(Low, t0), Some(Gesture::Press));
        assert_eq!(decoder.settle_deadline(), None);

        assert_eq!(decoder.button(High, t0 + Duration::from_millis(30)), None);
        let deadline = decoder.settle_deadline().unwrap();
        assert_eq!(deadline, t0 + DEBOUNCE);

        assert_eq!(decoder.button(High, deadline), Some(Gesture::Release));
        assert!(!decoder.button_held());
        assert_eq!(decoder.settle_deadline(), None);

        // the next press is seen again
        assert_eq!(
            decoder.button(Low, t0 + Duration::from_secs(1)),
            Some(Gesture::Press)
        );
    }

    #[test]
    fn test_bounce_back_to_accepted_level_settles_to_nothing() {
        let mut decoder = decoder();
        let t0 = Instant::now();

        decoder.button(Low, t0);
        decoder.button(High, t0 + Duration::from_millis(10));
        let deadline = decoder.settle_deadline().unwrap();

        assert_eq!(decoder.button(Low, deadline), None);
        assert!(decoder.button_held());
        assert_eq!(decoder.settle_deadline(), None);
    }

    #[test]
    fn test_seeded_level_is_not_a_press() {
        let mut decoder = GestureDecoder::new(DEBOUNCE, Low, Low, Low);
        assert!(decoder.button_held());
        assert_eq!(decoder.button(Low, Instant::now()), None);
    }

    #[test]
    fn test_clockwise_sequence() {
        let mut decoder = decoder();
        let steps = feed(
            &mut decoder,
            &[(Low, High), (High, High), (High, Low), (Low, Low)],
        );
        assert_eq!(steps, vec![Gesture::Rotate(1); 4]);
    }

    #[test]
    fn test_counter_clockwise_sequence() {
        let mut decoder = decoder();
        let steps = feed(
            &mut decoder,
            &[(High, Low), (High, High), (Low, High), (Low, Low)],
        );
        assert_eq!(steps, vec![Gesture::Rotate(-1); 4]);
    }

    #[test]
    fn test_repeated_code_is_ignored() {
        let mut decoder = decoder();
        assert_eq!(decoder.encoder(Low, High), Some(Gesture::Rotate(1)));
        assert_eq!(decoder.encoder(Low, High), None);
    }

    #[test]
    fn test_double_step_is_noise() {
        let mut decoder = decoder();
        // 00 -> 11 skips a phase: direction unknown
        assert_eq!(decoder.encoder(High, High), None);
        // the code still advances, so the next valid step decodes
        assert_eq!(decoder.encoder(High, Low), Some(Gesture::Rotate(1)));
    }

    #[test]
    fn test_lookup_table_is_balanced() {
        let plus = (0u8..16).filter(|&t| quadrature_step(t) == 1).count();
        let minus = (0u8..16).filter(|&t| quadrature_step(t) == -1).count();
        assert_eq!((plus, minus), (4, 4));
    }
}
