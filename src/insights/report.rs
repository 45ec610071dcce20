// Weekly and monthly activity reports.
// Buckets issues by creation date and renders counts as text and CSV.

use std::collections::BTreeMap;
use std::io::{self, Write};

use chrono::{DateTime, Datelike, NaiveDate, Utc};

use crate::github::Issue;

/// Issue counts keyed by period, sorted by key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Buckets {
    counts: BTreeMap<String, usize>,
}

impl Buckets {
    pub fn get(&self, key: &str) -> Option<usize> {
        self.counts.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.counts.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Total number of issues across all buckets.
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Header row of keys followed by a row of counts.
    pub fn to_csv(&self) -> String {
        let keys: Vec<&str> = self.counts.keys().map(String::as_str).collect();
        let counts: Vec<String> = self.counts.values().map(usize::to_string).collect();
        format!("{}\n{}\n", keys.join(","), counts.join(","))
    }

    fn seed(&mut self, key: String) {
        self.counts.entry(key).or_insert(0);
    }

    fn add(&mut self, key: String) {
        *self.counts.entry(key).or_insert(0) += 1;
    }
}

/// ISO week key, e.g. `2024-07`.
pub fn week_key(created_at: DateTime<Utc>) -> String {
    let week = created_at.iso_week();
    format!("{}-{:02}", week.year(), week.week())
}

/// Month key, e.g. `2024-03`.
pub fn month_key(year: i32, month: u32) -> String {
    format!("{}-{:02}", year, month)
}

/// Count issues per ISO week. Only weeks with issues appear.
pub fn weekly(issues: &[Issue]) -> Buckets {
    let mut buckets = Buckets::default();
    for issue in issues {
        buckets.add(week_key(issue.created_at));
    }
    buckets
}

/// Count issues per month, with every month from `since` through `today`
/// present even when empty.
pub fn monthly(since: NaiveDate, today: NaiveDate, issues: &[Issue]) -> Buckets {
    let mut buckets = Buckets::default();

    let (mut year, mut month) = (since.year(), since.month());
    while (year, month) <= (today.year(), today.month()) {
        buckets.seed(month_key(year, month));
        if month == 12 {
            year += 1;
            month = 1;
        } else {
            month += 1;
        }
    }

    for issue in issues {
        buckets.add(month_key(issue.created_at.year(), issue.created_at.month()));
    }
    buckets
}

fn write_csv_block(out: &mut impl Write, buckets: &Buckets) -> io::Result<()> {
    writeln!(out, "--- CSV:")?;
    write!(out, "{}", buckets.to_csv())?;
    writeln!(out, "---")
}

/// Print per-week counts followed by a CSV block.
pub fn render_weekly(out: &mut impl Write, issues: &[Issue]) -> io::Result<()> {
    let buckets = weekly(issues);
    for (key, count) in buckets.iter() {
        writeln!(out, "Week {}: {} issues created", key, count)?;
    }
    write_csv_block(out, &buckets)
}

/// Print a CSV block of per-month counts, optionally preceded by every
/// issue title tagged with its month.
pub fn render_monthly(
    out: &mut impl Write,
    since: NaiveDate,
    today: NaiveDate,
    issues: &[Issue],
    print_titles: bool,
) -> io::Result<()> {
    if print_titles {
        for issue in issues {
            let key = month_key(issue.created_at.year(), issue.created_at.month());
            writeln!(out, "{} -- {}", key, issue.title)?;
        }
    }
    write_csv_block(out, &monthly(since, today, issues))
}
