use cable_core::linspace;
use cable_skeleton::Path;
use log::debug;

/// Distance from the end of each path to the begin of the next.
///
/// Empty paths contribute a zero gap on either side.
pub fn gap_lengths(paths: &[Path]) -> Vec<f32> {
    paths
        .windows(2)
        .map(|w| match (w[0].end(), w[1].begin()) {
            (Some(a), Some(b)) => a.distance(b),
            _ => 0.0,
        })
        .collect()
}

/// Normalized arc-length parameter for every sample of an ordered chain.
///
/// Each path spans `length / full_length` of `[0, 1]` and the gap to the
/// next path is skipped over unsampled. Returns `None` for an empty chain or
/// one with no measurable length.
pub fn merged_parametrization(paths: &[Path]) -> Option<Vec<f32>> {
    if paths.is_empty() {
        return None;
    }

    let gaps = gap_lengths(paths);
    let full_length: f32 = paths.iter().map(|p| p.length).sum::<f32>() + gaps.iter().sum::<f32>();
    if full_length <= 0.0 || !full_length.is_finite() {
        debug!("merged_parametrization: degenerate full length {full_length}");
        return None;
    }

    let mut t = Vec::with_capacity(paths.iter().map(Path::num_points).sum());
    let mut curr = 0.0_f32;
    for (k, p) in paths.iter().enumerate() {
        let span = p.length / full_length;
        t.extend(linspace(curr, curr + span, p.num_points()));
        curr += span + gaps.get(k).copied().unwrap_or(0.0) / full_length;
    }
    Some(t)
}

#[cfg(test)]
mod tests {
    use cable_core::Point2f;
    use cable_skeleton::Path;

    use super::{gap_lengths, merged_parametrization};

    fn horizontal(x0: usize, x1: usize) -> Path {
        Path::from_points((x0..=x1).map(|x| Point2f::new(x as f32, 0.0)).collect())
    }

    #[test]
    fn gaps_consume_parameter_without_samples() {
        let paths = [horizontal(0, 3), horizontal(5, 10)];
        let t = merged_parametrization(&paths).expect("non-degenerate chain");

        assert_eq!(t.len(), 10);
        assert!(t.windows(2).all(|w| w[1] > w[0]));
        assert_eq!(t[0], 0.0);
        assert!((t[9] - 1.0).abs() < 1e-6);
        assert!((t[3] - 0.3).abs() < 1e-6);
        assert!((t[4] - 0.5).abs() < 1e-6);
        assert!((t[4] - t[3] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn gap_lengths_between_neighbors() {
        let paths = [horizontal(0, 3), horizontal(5, 10), Path::default(), horizontal(12, 14)];
        assert_eq!(gap_lengths(&paths), vec![2.0, 0.0, 0.0]);
        assert!(gap_lengths(&paths[..1]).is_empty());
    }

    #[test]
    fn degenerate_chains_have_no_parametrization() {
        assert_eq!(merged_parametrization(&[]), None);

        let dot = Path::from_points(vec![Point2f::new(4.0, 4.0)]);
        assert_eq!(merged_parametrization(&[dot.clone(), dot]), None);
    }

    #[test]
    fn single_path_spans_unit_interval() {
        let t = merged_parametrization(&[horizontal(0, 4)]).expect("length 4");
        assert_eq!(t, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
    }
}
