use crate::model::curve::Point;

/// Drops every point whose value equals the last kept one. The first point always stays.
pub fn collapse_adjacent(points: &[Point]) -> Vec<Point> {
    let mut result: Vec<Point> = Vec::with_capacity(points.len());

    for p in points {
        if result.last().is_none_or(|last| last.value != p.value) {
            result.push(*p);
        }
    }

    result
}

/// Thins out runs of equal values, keeping the first and the last point of each run. Unlike
/// [`collapse_adjacent`] the closing point of a run survives, so a renderer that interpolates
/// between points still holds the value until the run ends.
pub fn collapse_runs(points: &[Point]) -> Vec<Point> {
    let mut keep = vec![true; points.len()];
    let mut repeated: Option<f64> = None;

    for i in 1..points.len() {
        let (prev, current) = (points[i - 1].value, points[i].value);

        match repeated {
            None if prev == current => repeated = Some(current),
            None => {}
            Some(value) if value == current => keep[i - 1] = false,
            Some(_) => repeated = None,
        }
    }

    points
        .iter()
        .zip(keep)
        .filter_map(|(p, keep)| keep.then_some(*p))
        .collect()
}
