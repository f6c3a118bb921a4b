//! Statistical helpers over columns with missing values

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Round to a fixed number of decimal places
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Mean of the present values; `None` when nothing is present
pub fn mean(values: &[Option<f64>]) -> Option<f64> {
    let (sum, count) = values
        .iter()
        .flatten()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Share of rows flagged 1 among rows flagged exactly 0 or 1. Missing and
/// out-of-domain flags count toward neither side.
pub fn binary_rate(flags: &[Option<f64>]) -> Option<f64> {
    let (positive, total) = flags
        .iter()
        .flatten()
        .fold((0usize, 0usize), |(positive, total), &flag| {
            if flag == 1.0 {
                (positive + 1, total + 1)
            } else if flag == 0.0 {
                (positive, total + 1)
            } else {
                (positive, total)
            }
        });
    if total == 0 {
        None
    } else {
        Some(positive as f64 / total as f64)
    }
}

/// Mean of `values` grouped by the binary flag in `groups`. Rows whose flag
/// is missing or not 0/1 are ignored; groups without rows are left out.
pub fn mean_by_flag(values: &[Option<f64>], groups: &[Option<f64>]) -> BTreeMap<u8, f64> {
    let mut acc: BTreeMap<u8, (f64, usize)> = BTreeMap::new();
    for (value, flag) in values.iter().zip(groups) {
        let (Some(value), Some(flag)) = (value, flag) else {
            continue;
        };
        let key = match *flag {
            f if f == 0.0 => 0,
            f if f == 1.0 => 1,
            _ => continue,
        };
        let entry = acc.entry(key).or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
    }
    acc.into_iter()
        .map(|(key, (sum, count))| (key, sum / count as f64))
        .collect()
}

/// Count rows per integral value, keys ascending. Non-integral values are
/// outside the domain and not counted.
pub fn integer_histogram(values: &[Option<f64>]) -> BTreeMap<i64, u64> {
    let mut histogram = BTreeMap::new();
    for value in values.iter().flatten() {
        if value.fract() == 0.0 {
            *histogram.entry(*value as i64).or_insert(0) += 1;
        }
    }
    histogram
}

/// Count rows per distinct present value
pub fn value_counts(values: &[Option<String>]) -> HashMap<&str, u64> {
    let mut counts = HashMap::new();
    for value in values.iter().flatten() {
        *counts.entry(value.as_str()).or_insert(0) += 1;
    }
    counts
}

/// The `n` most frequent values, most frequent first, ties by value ascending
pub fn top_n(values: &[Option<String>], n: usize) -> Vec<(String, u64)> {
    let mut ranked: Vec<(&str, u64)> = value_counts(values).into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked
        .into_iter()
        .take(n)
        .map(|(value, count)| (value.to_string(), count))
        .collect()
}

/// Satisfaction level buckets: low = [0, 0.3], mid = (0.3, 0.6],
/// high = (0.6, 1.0]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SatisfactionBins {
    pub low: u64,
    pub mid: u64,
    pub high: u64,
}

impl SatisfactionBins {
    pub const LOW_UPPER: f64 = 0.3;
    pub const MID_UPPER: f64 = 0.6;

    /// Bucket every present value in [0, 1]
    pub fn from_values(values: &[Option<f64>]) -> Self {
        let mut bins = Self::default();
        for &value in values.iter().flatten() {
            bins.add(value);
        }
        bins
    }

    /// Returns false when the value lies outside [0, 1]
    pub fn add(&mut self, value: f64) -> bool {
        if !(0.0..=1.0).contains(&value) {
            return false;
        }
        if value <= Self::LOW_UPPER {
            self.low += 1;
        } else if value <= Self::MID_UPPER {
            self.mid += 1;
        } else {
            self.high += 1;
        }
        true
    }

    pub fn total(&self) -> u64 {
        self.low + self.mid + self.high
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn some(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().copied().map(Some).collect()
    }

    fn text(values: &[&str]) -> Vec<Option<String>> {
        values.iter().map(|v| Some(v.to_string())).collect()
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(2.0 / 3.0, 4), 0.6667);
        assert_eq!(round_to(201.456, 2), 201.46);
        assert_eq!(round_to(0.0, 4), 0.0);
    }

    #[test]
    fn test_mean_skips_missing() {
        assert_eq!(mean(&[Some(1.0), None, Some(3.0)]), Some(2.0));
        assert_eq!(mean(&[None, None]), None);
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn test_binary_rate_ignores_out_of_domain_flags() {
        let flags = vec![Some(1.0), Some(2.0), Some(0.0), None, Some(-1.0)];
        assert_eq!(binary_rate(&flags), Some(0.5));
        assert_eq!(binary_rate(&[Some(3.0), None]), None);
        assert_eq!(binary_rate(&[]), None);
    }

    #[test]
    fn test_mean_by_flag() {
        let hours = some(&[100.0, 200.0, 300.0, 400.0]);
        let left = vec![Some(1.0), Some(0.0), Some(1.0), None];
        let grouped = mean_by_flag(&hours, &left);

        assert_eq!(grouped.get(&1), Some(&200.0));
        assert_eq!(grouped.get(&0), Some(&200.0));
        assert_eq!(grouped.len(), 2);
    }

    #[test]
    fn test_integer_histogram() {
        let histogram = integer_histogram(&some(&[2.0, 2.0, 3.0, 5.0]));
        assert_eq!(histogram, BTreeMap::from([(2, 2), (3, 1), (5, 1)]));
        assert_eq!(histogram.keys().copied().collect::<Vec<_>>(), vec![2, 3, 5]);

        let with_noise = integer_histogram(&[Some(4.0), Some(4.5), None]);
        assert_eq!(with_noise, BTreeMap::from([(4, 1)]));
    }

    #[test]
    fn test_top_n_orders_by_count_then_name() {
        let departments = text(&["sales", "it", "sales", "hr", "it", "rd", "mgmt", "ops", "sales"]);
        let top = top_n(&departments, 5);

        assert_eq!(top.len(), 5);
        assert_eq!(top[0], ("sales".to_string(), 3));
        assert_eq!(top[1], ("it".to_string(), 2));
        assert_eq!(top[2], ("hr".to_string(), 1));
        assert_eq!(top[3], ("mgmt".to_string(), 1));
        assert_eq!(top[4], ("ops".to_string(), 1));
    }

    #[test]
    fn test_satisfaction_bin_edges() {
        let bins = SatisfactionBins::from_values(&some(&[0.0, 0.3, 0.31, 0.6, 0.61, 1.0]));
        assert_eq!(bins, SatisfactionBins { low: 2, mid: 2, high: 2 });
    }

    #[test]
    fn test_satisfaction_bins_skip_out_of_range() {
        let mut bins = SatisfactionBins::default();
        assert!(!bins.add(-0.1));
        assert!(!bins.add(1.5));
        assert!(!bins.add(f64::NAN));
        assert_eq!(bins.total(), 0);
    }

    #[test]
    fn test_empty_bins_still_reported() {
        let bins = SatisfactionBins::from_values(&some(&[0.9]));
        let json = serde_json::to_value(bins).unwrap();
        assert_eq!(json, serde_json::json!({"low": 0, "mid": 0, "high": 1}));
    }
}
