// Chart data for the stats view. Pure functions, no I/O.
use crate::models::Repository;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use std::collections::HashMap;

/// A labelled half-open range `[min, max)`; `max = None` is unbounded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub label: &'static str,
    pub min: u32,
    pub max: Option<u32>,
}

impl Range {
    const fn new(label: &'static str, min: u32, max: Option<u32>) -> Self {
        Self { label, min, max }
    }

    pub fn contains(&self, value: u32) -> bool {
        value >= self.min && self.max.map_or(true, |max| value < max)
    }
}

pub const STAR_RANGES: [Range; 5] = [
    Range::new("0-100", 0, Some(100)),
    Range::new("100-1K", 100, Some(1_000)),
    Range::new("1K-10K", 1_000, Some(10_000)),
    Range::new("10K-100K", 10_000, Some(100_000)),
    Range::new("100K+", 100_000, None),
];

pub const ISSUE_RANGES: [Range; 5] = [
    Range::new("0-50", 0, Some(50)),
    Range::new("50-200", 50, Some(200)),
    Range::new("200-500", 200, Some(500)),
    Range::new("500-1K", 500, Some(1_000)),
    Range::new("1K+", 1_000, None),
];

/// Months covered by the activity trend
pub const ACTIVITY_MONTHS: usize = 12;

/// Bars shown in the watcher chart
pub const TOP_WATCHED: usize = 10;

/// One bar or slice of a chart
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    pub label: String,
    pub count: u64,
}

impl Bucket {
    fn new(label: impl Into<String>, count: u64) -> Self {
        Self {
            label: label.into(),
            count,
        }
    }
}

/// Everything the stats view draws
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoStats {
    pub total: usize,
    pub languages: Vec<Bucket>,
    pub stars: Vec<Bucket>,
    pub issues: Vec<Bucket>,
    pub activity: Vec<Bucket>,
    pub watchers: Vec<Bucket>,
}

impl RepoStats {
    /// `None` for an empty snapshot - the view renders "no data"
    pub fn compute(repos: &[Repository], language_top_n: usize, now: DateTime<Utc>) -> Option<Self> {
        if repos.is_empty() {
            return None;
        }

        Some(Self {
            total: repos.len(),
            languages: language_distribution(repos, language_top_n),
            stars: bucket_counts(repos.iter().map(|r| r.stars), &STAR_RANGES),
            issues: bucket_counts(repos.iter().map(|r| r.open_issues), &ISSUE_RANGES),
            activity: monthly_activity(repos, now),
            watchers: top_watched(repos, TOP_WATCHED),
        })
    }
}

/// Repositories per language, most common first, unknown languages left out.
/// Ties keep the order in which languages first appear.
pub fn language_distribution(repos: &[Repository], top_n: usize) -> Vec<Bucket> {
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, u64> = HashMap::new();

    for lang in repos.iter().filter_map(|r| r.language.as_deref()) {
        let count = counts.entry(lang).or_insert(0);
        if *count == 0 {
            order.push(lang);
        }
        *count += 1;
    }

    let mut buckets: Vec<Bucket> = order
        .into_iter()
        .map(|lang| Bucket::new(lang, counts[lang]))
        .collect();

    // Stable sort keeps first-seen order among equal counts
    buckets.sort_by(|a, b| b.count.cmp(&a.count));
    buckets.truncate(top_n);
    buckets
}

/// Count values into the given ranges, in range order
pub fn bucket_counts(values: impl IntoIterator<Item = u32>, ranges: &[Range]) -> Vec<Bucket> {
    let mut counts = vec![0u64; ranges.len()];
    for value in values {
        if let Some(idx) = ranges.iter().position(|r| r.contains(value)) {
            counts[idx] += 1;
        }
    }

    ranges
        .iter()
        .zip(counts)
        .map(|(range, count)| Bucket::new(range.label, count))
        .collect()
}

/// Updates per calendar month over the trailing twelve months, oldest
/// first, labelled like `Jan 25`
pub fn monthly_activity(repos: &[Repository], now: DateTime<Utc>) -> Vec<Bucket> {
    let months = trailing_months(now, ACTIVITY_MONTHS);

    months
        .iter()
        .map(|&(year, month)| {
            let count = repos
                .iter()
                .filter(|r| r.updated_at.year() == year && r.updated_at.month() == month)
                .count() as u64;
            Bucket::new(month_label(year, month), count)
        })
        .collect()
}

/// Most watched repositories, highest first
pub fn top_watched(repos: &[Repository], limit: usize) -> Vec<Bucket> {
    let mut sorted: Vec<&Repository> = repos.iter().collect();
    sorted.sort_by(|a, b| b.watchers.cmp(&a.watchers));

    sorted
        .into_iter()
        .take(limit)
        .map(|r| Bucket::new(r.name.clone(), r.watchers as u64))
        .collect()
}

/// `(year, month)` pairs ending with the month of `now`
fn trailing_months(now: DateTime<Utc>, count: usize) -> Vec<(i32, u32)> {
    let mut year = now.year();
    let mut month = now.month();
    let mut months = Vec::with_capacity(count);

    for _ in 0..count {
        months.push((year, month));
        if month == 1 {
            month = 12;
            year -= 1;
        } else {
            month -= 1;
        }
    }

    months.reverse();
    months
}

fn month_label(year: i32, month: u32) -> String {
    NaiveDate::from_ymd_opt(year, month, 1)
        .map(|d| d.format("%b %y").to_string())
        .unwrap_or_else(|| format!("{:02}/{}", month, year))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::repo;
    use chrono::TimeZone;

    fn with_language(id: u64, lang: Option<&str>) -> Repository {
        let mut r = repo(id, "r");
        r.language = lang.map(str::to_string);
        r
    }

    #[test]
    fn test_language_distribution_excludes_null() {
        let repos = vec![
            with_language(1, Some("Go")),
            with_language(2, Some("Go")),
            with_language(3, Some("Rust")),
            with_language(4, None),
        ];

        let dist = language_distribution(&repos, 8);
        assert_eq!(dist, vec![Bucket::new("Go", 2), Bucket::new("Rust", 1)]);
    }

    #[test]
    fn test_language_distribution_top_n_and_ties() {
        let repos = vec![
            with_language(1, Some("C")),
            with_language(2, Some("Zig")),
            with_language(3, Some("Zig")),
            with_language(4, Some("Ada")),
        ];

        let dist = language_distribution(&repos, 2);
        assert_eq!(dist, vec![Bucket::new("Zig", 2), Bucket::new("C", 1)]);
    }

    #[test]
    fn test_star_buckets() {
        let counts: Vec<u64> = bucket_counts([50, 150, 15_000], &STAR_RANGES)
            .into_iter()
            .map(|b| b.count)
            .collect();
        assert_eq!(counts, vec![1, 1, 0, 1, 0]);
    }

    #[test]
    fn test_bucket_edges_are_lower_inclusive() {
        let counts: Vec<u64> = bucket_counts([0, 100, 99_999, 100_000, u32::MAX], &STAR_RANGES)
            .into_iter()
            .map(|b| b.count)
            .collect();
        assert_eq!(counts, vec![1, 1, 0, 1, 2]);
    }

    #[test]
    fn test_issue_buckets() {
        let labels: Vec<String> = bucket_counts(std::iter::empty(), &ISSUE_RANGES)
            .into_iter()
            .map(|b| b.label)
            .collect();
        assert_eq!(labels, vec!["0-50", "50-200", "200-500", "500-1K", "1K+"]);

        let counts: Vec<u64> = bucket_counts([10, 49, 50, 700, 5_000], &ISSUE_RANGES)
            .into_iter()
            .map(|b| b.count)
            .collect();
        assert_eq!(counts, vec![2, 1, 0, 1, 1]);
    }

    #[test]
    fn test_monthly_activity_window() {
        let now = Utc.with_ymd_and_hms(2025, 3, 20, 12, 0, 0).unwrap();
        let mut recent = repo(1, "a");
        recent.updated_at = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let mut last_year = repo(2, "b");
        last_year.updated_at = Utc.with_ymd_and_hms(2024, 4, 30, 23, 0, 0).unwrap();
        let mut too_old = repo(3, "c");
        too_old.updated_at = Utc.with_ymd_and_hms(2024, 3, 31, 0, 0, 0).unwrap();

        let activity = monthly_activity(&[recent, last_year, too_old], now);

        assert_eq!(activity.len(), 12);
        assert_eq!(activity[0].label, "Apr 24");
        assert_eq!(activity[0].count, 1);
        assert_eq!(activity[11].label, "Mar 25");
        assert_eq!(activity[11].count, 1);
        assert_eq!(activity.iter().map(|b| b.count).sum::<u64>(), 2);
    }

    #[test]
    fn test_trailing_months_crosses_year() {
        let now = Utc.with_ymd_and_hms(2025, 1, 5, 0, 0, 0).unwrap();
        let months = trailing_months(now, 3);
        assert_eq!(months, vec![(2024, 11), (2024, 12), (2025, 1)]);
    }

    #[test]
    fn test_top_watched() {
        let mut a = repo(1, "a");
        a.watchers = 5;
        let mut b = repo(2, "b");
        b.watchers = 50;
        let top = top_watched(&[a, b], 1);
        assert_eq!(top, vec![Bucket::new("b", 50)]);
    }

    #[test]
    fn test_empty_input_is_no_data() {
        assert!(RepoStats::compute(&[], 8, Utc::now()).is_none());
    }

    #[test]
    fn test_compute_totals() {
        let stats = RepoStats::compute(&[repo(1, "a"), repo(2, "b")], 8, Utc::now()).unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.stars[0].count, 2);
        assert!(stats.languages.is_empty());
        assert_eq!(stats.activity.len(), ACTIVITY_MONTHS);
    }
}
