use std::io::Write;

use anyhow::Result;

use super::{BarSeries, Reporter, Timeline, ValueKind};
use crate::utils::{NumberFormatOptions, format_decimal, format_number, truncate_label};

const MAX_LABEL_WIDTH: usize = 24;
const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Writes each chart as text: horizontal bars for the bar charts and one
/// sparkline per participant for the timeline.
pub struct PlainReporter<W: Write> {
    out: W,
    format_options: NumberFormatOptions,
    bar_width: usize,
}

impl<W: Write> PlainReporter<W> {
    pub fn new(out: W, format_options: NumberFormatOptions) -> Self {
        Self {
            out,
            format_options,
            bar_width: 40,
        }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn heading(&mut self, title: &str) -> Result<()> {
        writeln!(self.out, "{title}")?;
        writeln!(self.out, "{}", "─".repeat(title.chars().count()))?;
        Ok(())
    }

    fn format_value(&self, value: f64, kind: ValueKind) -> String {
        match kind {
            ValueKind::Count => format_number(value as u64, &self.format_options),
            ValueKind::Average => format_decimal(value, &self.format_options),
        }
    }

    fn bar_chart(&mut self, chart: &BarSeries) -> Result<()> {
        self.heading(chart.title)?;

        if chart.entries.is_empty() {
            writeln!(self.out, "(no data)")?;
            writeln!(self.out)?;
            return Ok(());
        }

        let label_width = chart
            .entries
            .iter()
            .map(|e| e.label.chars().count())
            .max()
            .unwrap_or(0)
            .min(MAX_LABEL_WIDTH);
        let max = chart.max_value();

        for entry in &chart.entries {
            let filled = if max > 0.0 {
                let len = (entry.value / max * self.bar_width as f64).round() as usize;
                if entry.value > 0.0 { len.max(1) } else { 0 }
            } else {
                0
            };
            let label = truncate_label(&entry.label, MAX_LABEL_WIDTH);
            writeln!(
                self.out,
                "{label:<label_width$} {} {}",
                "█".repeat(filled),
                self.format_value(entry.value, chart.kind)
            )?;
        }
        writeln!(self.out)?;
        Ok(())
    }
}

impl<W: Write> Reporter for PlainReporter<W> {
    fn message_counts(&mut self, chart: &BarSeries) -> Result<()> {
        self.bar_chart(chart)
    }

    fn timeline(&mut self, chart: Option<&Timeline>) -> Result<()> {
        let Some(chart) = chart else {
            self.heading("# of Messages Over Time")?;
            writeln!(self.out, "(no data)")?;
            writeln!(self.out)?;
            return Ok(());
        };

        self.heading(chart.title)?;
        writeln!(
            self.out,
            "{} → {} ({} bins)",
            chart.start.format("%Y-%m-%d %H:%M"),
            chart.end.format("%Y-%m-%d %H:%M"),
            chart.bins
        )?;

        let max = chart.max_count();
        let label_width = chart
            .series
            .iter()
            .map(|s| s.participant.chars().count())
            .max()
            .unwrap_or(0)
            .min(MAX_LABEL_WIDTH);

        for series in &chart.series {
            let line: String = series
                .counts
                .iter()
                .map(|&count| {
                    if count == 0 || max == 0 {
                        ' '
                    } else {
                        let level = (count * (SPARK_LEVELS.len() as u64 - 1)).div_ceil(max);
                        SPARK_LEVELS[level as usize]
                    }
                })
                .collect();
            let label = truncate_label(&series.participant, MAX_LABEL_WIDTH);
            writeln!(self.out, "{label:<label_width$} │{line}│")?;
        }
        writeln!(self.out)?;
        Ok(())
    }

    fn average_words(&mut self, chart: &BarSeries) -> Result<()> {
        self.bar_chart(chart)
    }

    fn time_of_day(&mut self, chart: &BarSeries) -> Result<()> {
        self.bar_chart(chart)
    }

    fn top_words(&mut self, chart: &BarSeries) -> Result<()> {
        self.bar_chart(chart)
    }

    fn finish(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{BarEntry, TimelineSeries};
    use chrono::TimeZone;
    use chrono_tz::Tz;

    fn render(f: impl FnOnce(&mut PlainReporter<Vec<u8>>) -> Result<()>) -> String {
        let mut reporter = PlainReporter::new(Vec::new(), NumberFormatOptions::default());
        f(&mut reporter).unwrap();
        String::from_utf8(reporter.into_inner()).unwrap()
    }

    #[test]
    fn bar_chart_scales_to_the_largest_value() {
        let chart = BarSeries {
            title: "Number of Messages Sent",
            kind: ValueKind::Count,
            entries: vec![
                BarEntry {
                    label: "Ana".into(),
                    value: 40.0,
                },
                BarEntry {
                    label: "Benedict".into(),
                    value: 10.0,
                },
                BarEntry {
                    label: "Cy".into(),
                    value: 0.0,
                },
            ],
        };

        let out = render(|r| r.message_counts(&chart));
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines[0], "Number of Messages Sent");
        assert_eq!(lines[2], format!("Ana      {} 40", "█".repeat(40)));
        assert_eq!(lines[3], format!("Benedict {} 10", "█".repeat(10)));
        assert_eq!(lines[4], "Cy        0");
    }

    #[test]
    fn averages_use_decimal_places() {
        let chart = BarSeries {
            title: "Average Word Count",
            kind: ValueKind::Average,
            entries: vec![BarEntry {
                label: "Ana".into(),
                value: 2.5,
            }],
        };

        let out = render(|r| r.average_words(&chart));
        assert!(out.contains("2.50"), "{out}");
    }

    #[test]
    fn empty_chart_says_so() {
        let chart = BarSeries {
            title: "Most Common Words",
            kind: ValueKind::Count,
            entries: vec![],
        };

        let out = render(|r| r.top_words(&chart));
        assert!(out.contains("(no data)"));
        let out = render(|r| r.timeline(None));
        assert!(out.contains("(no data)"));
    }

    #[test]
    fn timeline_draws_one_sparkline_per_participant() {
        let start = Tz::UTC.with_ymd_and_hms(2020, 5, 1, 8, 0, 0).unwrap();
        let chart = Timeline {
            title: "# of Messages Over Time",
            start,
            end: Tz::UTC.with_ymd_and_hms(2020, 5, 2, 8, 0, 0).unwrap(),
            bins: 4,
            series: vec![
                TimelineSeries {
                    participant: "Ana".into(),
                    counts: vec![7, 0, 1, 7],
                },
                TimelineSeries {
                    participant: "Ben".into(),
                    counts: vec![0, 0, 0, 0],
                },
            ],
        };

        let out = render(|r| r.timeline(Some(&chart)));

        assert!(out.contains("2020-05-01 08:00 → 2020-05-02 08:00 (4 bins)"));
        assert!(out.contains("Ana │█ ▂█│"), "{out}");
        assert!(out.contains("Ben │    │"), "{out}");
    }
}
