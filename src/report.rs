//! Chart data derived from [`ConversationStats`] and the interface the
//! rendering backends implement.

use anyhow::Result;
use chrono::{DateTime, Duration, Timelike, Utc};
use chrono_tz::Tz;

use crate::types::ConversationStats;

pub mod plain;

pub use plain::PlainReporter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Count,
    Average,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarEntry {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarSeries {
    pub title: &'static str,
    pub kind: ValueKind,
    pub entries: Vec<BarEntry>,
}

impl BarSeries {
    fn new(title: &'static str, kind: ValueKind) -> Self {
        Self {
            title,
            kind,
            entries: Vec::new(),
        }
    }

    fn push(&mut self, label: impl Into<String>, value: f64) {
        self.entries.push(BarEntry {
            label: label.into(),
            value,
        });
    }

    pub fn max_value(&self) -> f64 {
        self.entries.iter().map(|e| e.value).fold(0.0, f64::max)
    }

    #[cfg(test)]
    pub fn value_of(&self, label: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|e| e.label == label)
            .map(|e| e.value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimelineSeries {
    pub participant: String,
    pub counts: Vec<u64>,
}

/// Per-participant message histograms over equal-width time bins.
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    pub title: &'static str,
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
    pub bins: usize,
    pub series: Vec<TimelineSeries>,
}

impl Timeline {
    pub fn bin_width(&self) -> Duration {
        if self.bins == 0 {
            return Duration::zero();
        }
        (self.end - self.start) / self.bins as i32
    }

    pub fn bin_start(&self, bin: usize) -> DateTime<Tz> {
        self.start + self.bin_width() * bin as i32
    }

    pub fn max_count(&self) -> u64 {
        self.series
            .iter()
            .flat_map(|s| s.counts.iter().copied())
            .max()
            .unwrap_or(0)
    }
}

/// Coarse local-time buckets. Hours outside the first three ranges, which in
/// practice means 18 to 23, all land in `Night`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeOfDay {
    pub const ALL: [TimeOfDay; 4] = [
        TimeOfDay::Morning,
        TimeOfDay::Afternoon,
        TimeOfDay::Evening,
        TimeOfDay::Night,
    ];

    pub fn from_hour(hour: u32) -> Self {
        match hour {
            0..6 => TimeOfDay::Morning,
            6..12 => TimeOfDay::Afternoon,
            12..18 => TimeOfDay::Evening,
            _ => TimeOfDay::Night,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TimeOfDay::Morning => "Morning",
            TimeOfDay::Afternoon => "Afternoon",
            TimeOfDay::Evening => "Evening",
            TimeOfDay::Night => "Night",
        }
    }
}

pub fn message_counts(stats: &ConversationStats) -> BarSeries {
    let mut chart = BarSeries::new("Number of Messages Sent", ValueKind::Count);
    for (participant, count) in &stats.messages_per_participant {
        chart.push(participant, *count as f64);
    }
    chart
}

pub fn average_words(stats: &ConversationStats) -> BarSeries {
    let mut chart = BarSeries::new("Average Word Count", ValueKind::Average);
    for (participant, counts) in &stats.word_counts {
        if counts.is_empty() {
            continue;
        }
        let total: usize = counts.iter().sum();
        chart.push(participant, total as f64 / counts.len() as f64);
    }
    chart
}

pub fn time_of_day(stats: &ConversationStats, tz: Tz) -> BarSeries {
    let mut buckets = [0u64; 4];
    for time in stats.timestamps.values().flatten() {
        let bucket = TimeOfDay::from_hour(time.with_timezone(&tz).hour());
        buckets[bucket as usize] += 1;
    }

    let mut chart = BarSeries::new("Messages by Time of Day", ValueKind::Count);
    for (bucket, count) in TimeOfDay::ALL.iter().zip(buckets) {
        chart.push(bucket.label(), count as f64);
    }
    chart
}

/// The `n` most used words. Equal counts keep the alphabetical order of the
/// underlying map.
pub fn top_words(stats: &ConversationStats, n: usize) -> BarSeries {
    let mut words: Vec<(&String, u64)> = stats
        .word_frequency
        .iter()
        .map(|(word, count)| (word, *count))
        .collect();
    words.sort_by(|a, b| b.1.cmp(&a.1));
    words.truncate(n);

    let mut chart = BarSeries::new("Most Common Words", ValueKind::Count);
    for (word, count) in words {
        chart.push(word, count as f64);
    }
    chart
}

/// Histogram each participant's timestamps over `bins` equal slices of the
/// conversation's overall time span. Returns `None` when nothing was counted.
pub fn timeline(stats: &ConversationStats, bins: usize, tz: Tz) -> Option<Timeline> {
    let (start, end) = stats.time_span()?;
    let bins = bins.max(1);
    let span_ms = (end - start).num_milliseconds() as f64;

    let bin_of = |t: &DateTime<Utc>| -> usize {
        if span_ms <= 0.0 {
            return 0;
        }
        let offset = (*t - start).num_milliseconds() as f64;
        ((offset * bins as f64 / span_ms) as usize).min(bins - 1)
    };

    let series = stats
        .timestamps
        .iter()
        .map(|(participant, times)| {
            let mut counts = vec![0u64; bins];
            for t in times {
                counts[bin_of(t)] += 1;
            }
            TimelineSeries {
                participant: participant.clone(),
                counts,
            }
        })
        .collect();

    Some(Timeline {
        title: "# of Messages Over Time",
        start: start.with_timezone(&tz),
        end: end.with_timezone(&tz),
        bins,
        series,
    })
}

#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub histogram_bins: usize,
    pub top_words: usize,
    pub timezone: Tz,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            histogram_bins: 100,
            top_words: 10,
            timezone: Tz::UTC,
        }
    }
}

/// A rendering backend with one entry point per chart kind.
pub trait Reporter {
    fn message_counts(&mut self, chart: &BarSeries) -> Result<()>;

    /// Called with `None` when the conversation has no valid messages.
    fn timeline(&mut self, chart: Option<&Timeline>) -> Result<()>;

    fn average_words(&mut self, chart: &BarSeries) -> Result<()>;

    fn time_of_day(&mut self, chart: &BarSeries) -> Result<()>;

    fn top_words(&mut self, chart: &BarSeries) -> Result<()>;

    /// Called once after every chart has been handed over.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Derive every chart for one conversation and hand them to `reporter`.
pub fn render_report(
    reporter: &mut dyn Reporter,
    stats: &ConversationStats,
    options: &ReportOptions,
) -> Result<()> {
    reporter.message_counts(&message_counts(stats))?;
    reporter.timeline(timeline(stats, options.histogram_bins, options.timezone).as_ref())?;
    reporter.average_words(&average_words(stats))?;
    reporter.time_of_day(&time_of_day(stats, options.timezone))?;
    reporter.top_words(&top_words(stats, options.top_words))?;
    reporter.finish()
}
