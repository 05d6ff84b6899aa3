use serde::Serialize;

/// WPM sampled at `t` seconds into a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimeSeriesPoint {
    pub t: f64,
    pub wpm: f64,
}

impl TimeSeriesPoint {
    pub fn new(t: f64, wpm: f64) -> Self {
        Self { t, wpm }
    }
}

impl From<(f64, f64)> for TimeSeriesPoint {
    fn from(v: (f64, f64)) -> Self {
        TimeSeriesPoint { t: v.0, wpm: v.1 }
    }
}

impl From<TimeSeriesPoint> for (f64, f64) {
    fn from(p: TimeSeriesPoint) -> Self {
        (p.t, p.wpm)
    }
}

/// Per-second WPM samples; at most one point per whole elapsed second.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WpmHistory {
    points: Vec<TimeSeriesPoint>,
}

impl WpmHistory {
    /// Record `wpm` if `elapsed_secs` has crossed a second not yet sampled.
    pub fn sample(&mut self, elapsed_secs: f64, wpm: f64) -> bool {
        let second = elapsed_secs.floor();
        if second < 1.0 {
            return false;
        }
        if self.points.last().is_some_and(|p| p.t >= second) {
            return false;
        }
        self.points.push(TimeSeriesPoint::new(second, wpm));
        true
    }

    pub fn points(&self) -> &[TimeSeriesPoint] {
        &self.points
    }

    pub fn into_points(self) -> Vec<TimeSeriesPoint> {
        self.points
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tuple_conversions() {
        let p: TimeSeriesPoint = (2.0, 40.0).into();
        assert_eq!(p, TimeSeriesPoint::new(2.0, 40.0));
        assert_eq!(<(f64, f64)>::from(p), (2.0, 40.0));
    }

    #[test]
    fn samples_once_per_whole_second() {
        let mut history = WpmHistory::default();

        assert!(!history.sample(0.4, 10.0));
        assert!(history.sample(1.0, 20.0));
        assert!(!history.sample(1.7, 25.0));
        assert!(history.sample(3.2, 30.0));

        let seconds: Vec<f64> = history.points().iter().map(|p| p.t).collect();
        assert_eq!(seconds, vec![1.0, 3.0]);
    }
}
