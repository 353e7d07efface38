// Smoother - dense, clipped per-channel curves for one window
use crate::application::spline::{interp, InterpolatingSpline};
use crate::domain::curve::DenseCurve;
use crate::domain::record::Record;
use chrono::{DateTime, Duration, Utc};

pub const DEFAULT_DENSE_SAMPLE_FLOOR: usize = 200;

/// Dense points generated per distinct timestamp once that exceeds the floor.
const SAMPLES_PER_UNIQUE_TIMESTAMP: usize = 20;

/// Width of the two-point grid used when a window has a single distinct
/// timestamp.
const DEGENERATE_EPSILON_NS: i64 = 1_000;

/// Closed value range applied to every smoothed sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipRange {
    pub min: f64,
    pub max: f64,
}

impl ClipRange {
    pub fn new(min: f64, max: f64) -> Self {
        assert!(min < max, "clip range [{}, {}] is empty", min, max);
        Self { min, max }
    }

    pub fn apply(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

impl Default for ClipRange {
    fn default() -> Self {
        Self {
            min: -10.0,
            max: 100.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Smoother {
    dense_sample_floor: usize,
    clip: ClipRange,
}

impl Default for Smoother {
    fn default() -> Self {
        Self::new(DEFAULT_DENSE_SAMPLE_FLOOR, ClipRange::default())
    }
}

impl Smoother {
    pub fn new(dense_sample_floor: usize, clip: ClipRange) -> Self {
        assert!(dense_sample_floor >= 2, "dense grid needs at least two points");
        Self {
            dense_sample_floor,
            clip,
        }
    }

    pub fn clip(&self) -> ClipRange {
        self.clip
    }

    /// Smooths a time-ordered window into a dense curve per channel.
    ///
    /// Duplicate timestamps collapse to one abscissa, taking the later
    /// record's value. Windows with fewer than two distinct timestamps skip
    /// fitting and repeat the first record's values on a two-point grid.
    pub fn smooth(&self, channels: &[String], window: &[Record]) -> DenseCurve {
        assert!(!window.is_empty(), "cannot smooth an empty window");
        assert!(!channels.is_empty(), "cannot smooth without channels");
        debug_assert!(window.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));

        let origin = window[0].timestamp;
        let xs: Vec<f64> = window
            .iter()
            .map(|r| seconds_since(origin, r.timestamp))
            .collect();
        let mut unique = xs.clone();
        unique.dedup();

        if unique.len() < 2 {
            return self.degenerate(channels, &window[0]);
        }

        let count = dense_sample_count(self.dense_sample_floor, unique.len());
        let grid = linspace(unique[0], unique[unique.len() - 1], count);
        let degree = adaptive_degree(unique.len());

        let values: Vec<Vec<f64>> = (0..channels.len())
            .map(|channel| {
                let raw: Vec<f64> = window.iter().map(|r| r.values[channel]).collect();
                let on_unique: Vec<f64> = unique.iter().map(|&u| interp(u, &xs, &raw)).collect();
                let spline = InterpolatingSpline::fit(&unique, &on_unique, degree);
                grid.iter()
                    .map(|&x| self.clip.apply(spline.evaluate(x)))
                    .collect()
            })
            .collect();

        let timestamps: Vec<DateTime<Utc>> =
            grid.iter().map(|&x| origin + seconds_to_duration(x)).collect();

        DenseCurve::new(timestamps, channels.to_vec(), values)
    }

    fn degenerate(&self, channels: &[String], first: &Record) -> DenseCurve {
        let timestamps = vec![
            first.timestamp,
            first.timestamp + Duration::nanoseconds(DEGENERATE_EPSILON_NS),
        ];
        let values: Vec<Vec<f64>> = first
            .values
            .iter()
            .map(|&v| {
                let clipped = self.clip.apply(v);
                vec![clipped, clipped]
            })
            .collect();

        DenseCurve::new(timestamps, channels.to_vec(), values)
    }
}

/// Spline degree for `unique` distinct timestamps: cubic from four upward,
/// lower below that. Callers must guard `unique >= 2`.
pub fn adaptive_degree(unique: usize) -> usize {
    assert!(unique >= 2, "a curve needs two distinct abscissas");
    (unique - 1).min(3)
}

pub fn dense_sample_count(floor: usize, unique: usize) -> usize {
    floor.max(SAMPLES_PER_UNIQUE_TIMESTAMP * unique)
}

fn linspace(start: f64, stop: f64, count: usize) -> Vec<f64> {
    let step = (stop - start) / (count - 1) as f64;
    let mut points: Vec<f64> = (0..count).map(|i| start + step * i as f64).collect();
    points[count - 1] = stop;
    points
}

fn seconds_since(origin: DateTime<Utc>, timestamp: DateTime<Utc>) -> f64 {
    let delta = timestamp - origin;
    match delta.num_nanoseconds() {
        Some(ns) => ns as f64 * 1e-9,
        None => delta.num_milliseconds() as f64 * 1e-3,
    }
}

fn seconds_to_duration(seconds: f64) -> Duration {
    Duration::nanoseconds((seconds * 1e9).round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_650_618_000 + secs, 0).unwrap()
    }

    fn channels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn records(rows: &[(i64, &[f64])]) -> Vec<Record> {
        rows.iter()
            .map(|(t, v)| Record::new(at(*t), v.to_vec()))
            .collect()
    }

    #[test]
    fn test_adaptive_degree() {
        assert_eq!(adaptive_degree(2), 1);
        assert_eq!(adaptive_degree(3), 2);
        assert_eq!(adaptive_degree(4), 3);
        assert_eq!(adaptive_degree(40), 3);
    }

    #[test]
    fn test_dense_sample_count_grows_with_unique_timestamps() {
        assert_eq!(dense_sample_count(200, 3), 200);
        assert_eq!(dense_sample_count(200, 10), 200);
        assert_eq!(dense_sample_count(200, 12), 240);
    }

    #[test]
    fn test_single_record_yields_two_point_grid() {
        let smoother = Smoother::default();
        let window = records(&[(0, &[5.0, 150.0, -40.0])]);

        let curve = smoother.smooth(&channels(&["A", "B", "C"]), &window);

        assert_eq!(curve.len(), 2);
        assert_eq!(curve.timestamps[0], at(0));
        assert!(curve.timestamps[1] > curve.timestamps[0]);
        assert_eq!(curve.channel("A"), Some(&[5.0, 5.0][..]));
        assert_eq!(curve.channel("B"), Some(&[100.0, 100.0][..]));
        assert_eq!(curve.channel("C"), Some(&[-10.0, -10.0][..]));
    }

    #[test]
    fn test_window_of_one_distinct_timestamp_uses_first_record() {
        let smoother = Smoother::default();
        let window = records(&[(0, &[10.0]), (0, &[30.0])]);

        let curve = smoother.smooth(&channels(&["A"]), &window);

        assert_eq!(curve.len(), 2);
        assert_eq!(curve.values[0], vec![10.0, 10.0]);
    }

    #[test]
    fn test_growth_window_clips_overshoot_at_final_point() {
        let smoother = Smoother::default();
        let window = records(&[(0, &[5.0]), (1, &[50.0]), (2, &[120.0])]);

        let curve = smoother.smooth(&channels(&["A"]), &window);
        let a = curve.channel("A").unwrap();

        assert_eq!(curve.len(), 200);
        assert_eq!(curve.timestamps[0], at(0));
        assert_eq!(curve.timestamps[199], at(2));
        assert!((a[0] - 5.0).abs() < 1e-9);
        assert_eq!(a[199], 100.0);
    }

    #[test]
    fn test_duplicate_timestamp_takes_later_value() {
        let smoother = Smoother::default();
        let window = records(&[(0, &[10.0]), (0, &[30.0]), (1, &[50.0])]);

        let curve = smoother.smooth(&channels(&["A"]), &window);
        let a = curve.channel("A").unwrap();

        // Two distinct timestamps, so a straight line from 30 to 50.
        assert_eq!(curve.len(), 200);
        assert!((a[0] - 30.0).abs() < 1e-9);
        assert!((a[199] - 50.0).abs() < 1e-9);
        assert!((a[100] - (30.0 + 20.0 * 100.0 / 199.0)).abs() < 1e-9);
    }

    #[test]
    fn test_outputs_always_within_clip_range() {
        let smoother = Smoother::default();
        let names = channels(&["A", "B"]);

        for len in 1..15 {
            let window: Vec<Record> = (0..len)
                .map(|i| {
                    let x = i as f64;
                    Record::new(
                        at(i as i64 / 2 + i as i64),
                        vec![(x * 1.7).sin() * 400.0, 90.0 + (x * 0.9).cos() * 30.0],
                    )
                })
                .collect();

            let curve = smoother.smooth(&names, &window);
            for series in &curve.values {
                assert_eq!(series.len(), curve.len());
                assert!(series.iter().all(|v| (-10.0..=100.0).contains(v)));
            }
        }
    }

    #[test]
    fn test_custom_clip_and_floor() {
        let smoother = Smoother::new(50, ClipRange::new(0.0, 10.0));
        let window = records(&[(0, &[-5.0]), (1, &[5.0]), (2, &[25.0]), (3, &[6.0])]);

        let curve = smoother.smooth(&channels(&["A"]), &window);

        assert_eq!(curve.len(), 80);
        assert!(curve.values[0].iter().all(|v| (0.0..=10.0).contains(v)));
        assert_eq!(curve.values[0][0], 0.0);
    }

    #[test]
    fn test_smoothing_is_deterministic() {
        let smoother = Smoother::default();
        let names = channels(&["A", "B"]);
        let window = records(&[
            (0, &[1.0, 2.0]),
            (1, &[7.0, 3.0]),
            (3, &[4.0, 9.0]),
            (4, &[12.0, 1.0]),
            (6, &[3.0, 5.0]),
        ]);

        assert_eq!(smoother.smooth(&names, &window), smoother.smooth(&names, &window));
    }

    #[test]
    fn test_sub_second_timestamps_are_preserved() {
        let smoother = Smoother::default();
        let base = at(0);
        let window = vec![
            Record::new(base, vec![1.0]),
            Record::new(base + Duration::milliseconds(250), vec![2.0]),
        ];

        let curve = smoother.smooth(&channels(&["A"]), &window);

        assert_eq!(curve.timestamps[199], base + Duration::milliseconds(250));
    }
}
