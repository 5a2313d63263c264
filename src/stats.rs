//! Numeric helpers shared by the metrics and the chart geometry: binning,
//! quartiles, kernel density estimation and least-squares fits

use std::fmt;

/// Half-open numeric interval rendered as "low-high" with one decimal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub low: f64,
    pub high: f64,
}

impl Interval {
    pub fn midpoint(&self) -> f64 {
        (self.low + self.high) / 2.0
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // a lowest edge nudged just below zero still reads as 0.0
        let tidy = |v: f64| if v.abs() < 0.05 { 0.0 } else { v };
        write!(f, "{:.1}-{:.1}", tidy(self.low), tidy(self.high))
    }
}

/// Equal-width bins over a closed range
///
/// Intervals are closed on the right; the lowest edge is included in the first bin.
#[derive(Debug, Clone, PartialEq)]
pub struct EqualWidthBins {
    edges: Vec<f64>,
}

impl EqualWidthBins {
    /// Bins spanning `low..=high`; a degenerate range is widened slightly
    pub fn new(low: f64, high: f64, bins: usize) -> Self {
        let bins = bins.max(1);
        let (low, high) = if (high - low).abs() < f64::EPSILON {
            let pad = if low == 0.0 { 0.001 } else { low.abs() * 0.001 };
            (low - pad, high + pad)
        } else {
            (low.min(high), low.max(high))
        };
        let width = (high - low) / bins as f64;
        let mut edges: Vec<f64> = (0..bins).map(|i| low + width * i as f64).collect();
        edges.push(high);
        Self { edges }
    }

    /// Bins spanning the observed range of `values`, lowest edge nudged down by
    /// 0.1% of the range so the minimum falls inside the first bin
    pub fn from_values(values: &[f64], bins: usize) -> Option<Self> {
        let (min, max) = min_max(values)?;
        let mut binned = Self::new(min, max, bins);
        if max > min {
            binned.edges[0] -= (max - min) * 0.001;
        }
        Some(binned)
    }

    pub fn len(&self) -> usize {
        self.edges.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    pub fn width(&self) -> f64 {
        (self.edges[self.edges.len() - 1] - self.edges[0]) / self.len() as f64
    }

    pub fn intervals(&self) -> Vec<Interval> {
        self.edges
            .windows(2)
            .map(|pair| Interval {
                low: pair[0],
                high: pair[1],
            })
            .collect()
    }

    /// Bin holding `value`, `None` outside the range or for NaN
    pub fn index_of(&self, value: f64) -> Option<usize> {
        let first = self.edges[0];
        let last = self.edges[self.edges.len() - 1];
        if value.is_nan() || value < first || value > last {
            return None;
        }
        let idx = self.edges[1..].partition_point(|edge| *edge < value);
        Some(idx.min(self.len() - 1))
    }

    /// Count of values per bin
    pub fn counts(&self, values: &[f64]) -> Vec<usize> {
        let mut counts = vec![0; self.len()];
        for idx in values.iter().filter_map(|v| self.index_of(*v)) {
            counts[idx] += 1;
        }
        counts
    }
}

pub fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    let mut finite = values.iter().copied().filter(|v| v.is_finite());
    let first = finite.next()?;
    Some(finite.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Sample standard deviation (n - 1 denominator)
pub fn std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values)?;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt())
}

/// Linear-interpolated quantile of already sorted values
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

pub fn sorted_finite(values: &[f64]) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

/// Five-number summary with 1.5 IQR whiskers
#[derive(Debug, Clone, PartialEq)]
pub struct Quartiles {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    /// Lowest value within q1 - 1.5 IQR
    pub lower_whisker: f64,
    /// Highest value within q3 + 1.5 IQR
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
}

impl Quartiles {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let sorted = sorted_finite(values);
        let q1 = quantile_sorted(&sorted, 0.25)?;
        let median = quantile_sorted(&sorted, 0.5)?;
        let q3 = quantile_sorted(&sorted, 0.75)?;
        let iqr = q3 - q1;
        let (low_fence, high_fence) = (q1 - 1.5 * iqr, q3 + 1.5 * iqr);

        let inside = sorted
            .iter()
            .copied()
            .filter(|v| *v >= low_fence && *v <= high_fence);
        let lower_whisker = inside.clone().fold(f64::INFINITY, f64::min);
        let upper_whisker = inside.fold(f64::NEG_INFINITY, f64::max);
        let outliers = sorted
            .iter()
            .copied()
            .filter(|v| *v < low_fence || *v > high_fence)
            .collect();

        Some(Self {
            q1,
            median,
            q3,
            lower_whisker,
            upper_whisker,
            outliers,
        })
    }
}

pub fn linspace(start: f64, end: f64, points: usize) -> Vec<f64> {
    match points {
        0 => Vec::new(),
        1 => vec![start],
        n => {
            let step = (end - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}

/// Gaussian kernel density estimate with Scott's rule bandwidth
#[derive(Debug, Clone)]
pub struct GaussianKde {
    samples: Vec<f64>,
    bandwidth: f64,
}

impl GaussianKde {
    /// Needs at least two samples with non-zero spread
    pub fn fit(values: &[f64]) -> Option<Self> {
        let samples = sorted_finite(values);
        let std = std_dev(&samples)?;
        if std <= 0.0 {
            return None;
        }
        let bandwidth = std * (samples.len() as f64).powf(-0.2);
        Some(Self { samples, bandwidth })
    }

    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Support padded by three bandwidths on each side, clipped to the data
    /// range when `clip` is given
    pub fn support(&self, clip: Option<(f64, f64)>) -> (f64, f64) {
        let lo = self.samples[0] - 3.0 * self.bandwidth;
        let hi = self.samples[self.samples.len() - 1] + 3.0 * self.bandwidth;
        match clip {
            Some((min, max)) => (lo.max(min), hi.min(max)),
            None => (lo, hi),
        }
    }

    pub fn density(&self, x: f64) -> f64 {
        let norm = 1.0 / ((2.0 * std::f64::consts::PI).sqrt() * self.bandwidth);
        let sum: f64 = self
            .samples
            .iter()
            .map(|s| {
                let z = (x - s) / self.bandwidth;
                (-0.5 * z * z).exp()
            })
            .sum();
        norm * sum / self.samples.len() as f64
    }

    pub fn evaluate(&self, grid: &[f64]) -> Vec<f64> {
        grid.iter().map(|x| self.density(*x)).collect()
    }
}

/// Least-squares line y = slope * x + intercept
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LineFit {
    /// `None` when fewer than two points or all x values coincide
    pub fn fit(points: &[(f64, f64)]) -> Option<Self> {
        if points.len() < 2 {
            return None;
        }
        let n = points.len() as f64;
        let mean_x = points.iter().map(|p| p.0).sum::<f64>() / n;
        let mean_y = points.iter().map(|p| p.1).sum::<f64>() / n;
        let sxx: f64 = points.iter().map(|p| (p.0 - mean_x).powi(2)).sum();
        if sxx == 0.0 {
            return None;
        }
        let sxy: f64 = points.iter().map(|p| (p.0 - mean_x) * (p.1 - mean_y)).sum();
        let slope = sxy / sxx;
        Some(Self {
            slope,
            intercept: mean_y - slope * mean_x,
        })
    }

    pub fn at(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_unit_interval_labels() {
        let bins = EqualWidthBins::new(0.0, 1.0, 5);
        let labels: Vec<String> = bins.intervals().iter().map(|i| i.to_string()).collect();
        assert_eq!(labels, vec!["0.0-0.2", "0.2-0.4", "0.4-0.6", "0.6-0.8", "0.8-1.0"]);

        let nudged = EqualWidthBins::from_values(&[0.0, 0.5, 1.0], 2).unwrap();
        assert_eq!(nudged.intervals()[0].to_string(), "0.0-0.5");
    }

    #[test]
    fn test_bins_are_right_closed_with_lowest_edge_included() {
        let bins = EqualWidthBins::new(0.0, 1.0, 10);
        assert_eq!(bins.index_of(0.0), Some(0));
        assert_eq!(bins.index_of(0.1), Some(0));
        assert_eq!(bins.index_of(0.15), Some(1));
        assert_eq!(bins.index_of(1.0), Some(9));
        assert_eq!(bins.index_of(1.01), None);
        assert_eq!(bins.index_of(f64::NAN), None);
        assert_eq!(bins.counts(&[0.05, 0.95, 1.0, 0.5]).iter().sum::<usize>(), 4);
    }

    #[test]
    fn test_bins_from_values_cover_minimum() {
        let values = [96.0, 150.0, 200.0, 310.0];
        let bins = EqualWidthBins::from_values(&values, 6).unwrap();
        assert_eq!(bins.len(), 6);
        assert!(values.iter().all(|v| bins.index_of(*v).is_some()));
        assert_eq!(bins.index_of(96.0), Some(0));
        assert_eq!(bins.index_of(310.0), Some(5));
        assert!(EqualWidthBins::from_values(&[], 3).is_none());
    }

    #[test]
    fn test_quartiles_and_outliers() {
        let q = Quartiles::from_values(&[1.0, 2.0, 3.0, 4.0, 5.0, 100.0]).unwrap();
        assert_relative_eq!(q.median, 3.5);
        assert_relative_eq!(q.q1, 2.25);
        assert_relative_eq!(q.q3, 4.75);
        assert_eq!(q.outliers, vec![100.0]);
        assert_relative_eq!(q.upper_whisker, 5.0);
        assert_relative_eq!(q.lower_whisker, 1.0);
    }

    #[test]
    fn test_kde_integrates_to_one() {
        let kde = GaussianKde::fit(&[0.1, 0.2, 0.25, 0.6, 0.7, 0.9]).unwrap();
        let (lo, hi) = kde.support(None);
        let grid = linspace(lo, hi, 2001);
        let step = grid[1] - grid[0];
        let area: f64 = kde.evaluate(&grid).iter().sum::<f64>() * step;
        assert_relative_eq!(area, 1.0, epsilon = 1e-2);
        assert!(GaussianKde::fit(&[0.5, 0.5]).is_none());
    }

    #[test]
    fn test_line_fit() {
        let fit = LineFit::fit(&[(0.0, 1.0), (1.0, 3.0), (2.0, 5.0)]).unwrap();
        assert_relative_eq!(fit.slope, 2.0);
        assert_relative_eq!(fit.intercept, 1.0);
        assert!(LineFit::fit(&[(1.0, 1.0), (1.0, 2.0)]).is_none());
    }
}
