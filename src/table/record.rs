use serde::Serialize;
use std::fmt;

/// A lap time as read off the scoreboard.
///
/// Fields are stored as recognized; seconds above 59 or milliseconds above
/// 999 are not rejected and simply add up in the total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct LapTime {
    pub minutes: u32,
    pub seconds: u32,
    pub millis: u32,
}

impl LapTime {
    pub fn new(minutes: u32, seconds: u32, millis: u32) -> Self {
        Self {
            minutes,
            seconds,
            millis,
        }
    }

    pub fn total_millis(&self) -> u64 {
        self.minutes as u64 * 60_000 + self.seconds as u64 * 1_000 + self.millis as u64
    }

    pub fn as_secs_f64(&self) -> f64 {
        self.total_millis() as f64 / 1000.0
    }
}

/// Formats the normalized total as `m:ss.mmm`.
impl fmt::Display for LapTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.total_millis();
        write!(
            f,
            "{}:{:02}.{:03}",
            total / 60_000,
            (total / 1_000) % 60,
            total % 1_000
        )
    }
}

/// One driver's time for one lap of one heat.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LapRecord {
    pub heat: String,
    pub driver: String,
    pub kart: String,
    /// 1-based
    pub lap: u32,
    pub time: LapTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_millis() {
        let time = LapTime::new(1, 23, 456);
        assert_eq!(time.total_millis(), 83_456);
        assert!((time.as_secs_f64() - 83.456).abs() < 1e-9);
    }

    #[test]
    fn test_display_normalizes() {
        assert_eq!(LapTime::new(1, 0, 0).to_string(), "1:00.000");
        assert_eq!(LapTime::new(0, 23, 45).to_string(), "0:23.045");
        assert_eq!(LapTime::new(0, 75, 0).to_string(), "1:15.000");
    }
}
