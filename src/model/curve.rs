use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One sampled pitch value. `Gap` means nothing was recorded at that tick, which is not the same
/// thing as an explicit deviation of `0.0`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub enum Sample {
    Value(f64),
    Gap,
}

impl Sample {
    pub fn value(self) -> Option<f64> {
        match self {
            Sample::Value(v) => Some(v),
            Sample::Gap => None,
        }
    }

    pub fn is_gap(self) -> bool {
        matches!(self, Sample::Gap)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct PitchPoint {
    pub tick: i64,
    pub sample: Sample,
}

impl PitchPoint {
    pub fn new(tick: i64, value: f64) -> Self {
        Self {
            tick,
            sample: Sample::Value(value),
        }
    }

    pub fn gap(tick: i64) -> Self {
        Self {
            tick,
            sample: Sample::Gap,
        }
    }
}

/// A gap-free point, used by every stage that runs after gaps have been dropped.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub tick: i64,
    pub value: f64,
}

impl Point {
    pub fn new(tick: i64, value: f64) -> Self {
        Self { tick, value }
    }
}

impl From<(i64, f64)> for Point {
    fn from((tick, value): (i64, f64)) -> Self {
        Self { tick, value }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PitchCurve {
    points: Vec<PitchPoint>,
    absolute: bool,
}

impl PitchCurve {
    /// Builds a curve ordered by tick, averaging the values of samples that share a tick.
    pub fn new(points: Vec<PitchPoint>, absolute: bool) -> Self {
        Self {
            points: merge_duplicate_ticks(points),
            absolute,
        }
    }

    pub fn from_values(values: impl IntoIterator<Item = (i64, f64)>, absolute: bool) -> Self {
        let points = values
            .into_iter()
            .map(|(tick, value)| PitchPoint::new(tick, value))
            .collect();

        Self::new(points, absolute)
    }

    pub(crate) fn from_sorted(points: Vec<PitchPoint>, absolute: bool) -> Self {
        Self { points, absolute }
    }

    pub fn points(&self) -> &[PitchPoint] {
        &self.points
    }

    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// The recorded points, with gaps left out.
    pub fn values(&self) -> Vec<Point> {
        self.points
            .iter()
            .filter_map(|p| p.sample.value().map(|v| Point::new(p.tick, v)))
            .collect()
    }
}

/// Groups samples by tick and averages the recorded values of each group. A tick whose samples
/// are all gaps stays a gap.
pub fn merge_duplicate_ticks(points: Vec<PitchPoint>) -> Vec<PitchPoint> {
    let mut grouped: BTreeMap<i64, (f64, usize)> = BTreeMap::new();

    for p in points {
        let entry = grouped.entry(p.tick).or_insert((0.0, 0));
        if let Sample::Value(v) = p.sample {
            entry.0 += v;
            entry.1 += 1;
        }
    }

    grouped
        .into_iter()
        .map(|(tick, (sum, count))| {
            if count == 0 {
                PitchPoint::gap(tick)
            } else {
                PitchPoint::new(tick, sum / count as f64)
            }
        })
        .collect()
}

/// Same as [`merge_duplicate_ticks`] for gap-free points.
pub fn merge_points(points: &[Point]) -> Vec<Point> {
    merge_duplicate_ticks(
        points
            .iter()
            .map(|p| PitchPoint::new(p.tick, p.value))
            .collect(),
    )
    .into_iter()
    .filter_map(|p| p.sample.value().map(|v| Point::new(p.tick, v)))
    .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn duplicate_ticks_are_averaged() {
        let curve = PitchCurve::new(
            vec![
                PitchPoint::new(10, 1.0),
                PitchPoint::new(0, 4.0),
                PitchPoint::new(10, 2.0),
                PitchPoint::gap(10),
            ],
            false,
        );

        assert_eq!(
            curve.points(),
            &[PitchPoint::new(0, 4.0), PitchPoint::new(10, 1.5)]
        );
    }

    #[test]
    fn all_gap_tick_stays_gap() {
        let curve = PitchCurve::new(vec![PitchPoint::gap(5), PitchPoint::gap(5)], true);
        assert_eq!(curve.points(), &[PitchPoint::gap(5)]);
        assert!(curve.values().is_empty());
    }

    #[test]
    fn explicit_zero_is_not_a_gap() {
        let curve = PitchCurve::from_values([(0, 0.0), (4, 1.0)], false);
        assert_eq!(curve.values(), vec![Point::new(0, 0.0), Point::new(4, 1.0)]);
    }
}
