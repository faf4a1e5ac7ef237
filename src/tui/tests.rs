use crate::report::{self, BarEntry, ReportOptions, TimelineSeries};
use crate::tui::{App, ChartPage, TuiReporter};
use crate::types::ConversationStats;
use crate::utils::NumberFormatOptions;
use chrono::{TimeZone, Utc};
use chrono_tz::Tz;
use crossterm::event::KeyCode;
use ratatui::Terminal;
use ratatui::backend::TestBackend;

// ============================================================================
// HELPERS
// ============================================================================

fn sample_stats() -> ConversationStats {
    let t = |h| Utc.with_ymd_and_hms(2022, 6, 1, h, 0, 0).unwrap();
    let mut stats = ConversationStats {
        conversation_id: "hikingclub_x1".to_string(),
        ..ConversationStats::default()
    };
    stats.messages_per_participant.insert("Ana".into(), 3);
    stats.messages_per_participant.insert("Ben".into(), 1);
    stats
        .timestamps
        .insert("Ana".into(), vec![t(1), t(9), t(20)]);
    stats.timestamps.insert("Ben".into(), vec![t(13)]);
    stats.word_counts.insert("Ana".into(), vec![2, 4, 3]);
    stats.word_counts.insert("Ben".into(), vec![1]);
    stats.word_frequency.insert("trailhead".into(), 4);
    stats.word_frequency.insert("summit".into(), 2);
    stats
}

fn sample_app() -> App {
    let mut reporter = TuiReporter::new(
        "hikingclub_x1".to_string(),
        NumberFormatOptions::default(),
    );
    let stats = sample_stats();
    let options = ReportOptions {
        histogram_bins: 24,
        top_words: 10,
        timezone: Tz::UTC,
    };

    // Feed the reporter directly so `finish` (which opens a real terminal)
    // is never reached.
    use crate::report::Reporter;
    reporter
        .message_counts(&report::message_counts(&stats))
        .unwrap();
    reporter
        .timeline(report::timeline(&stats, options.histogram_bins, options.timezone).as_ref())
        .unwrap();
    reporter
        .average_words(&report::average_words(&stats))
        .unwrap();
    reporter
        .time_of_day(&report::time_of_day(&stats, options.timezone))
        .unwrap();
    reporter
        .top_words(&report::top_words(&stats, options.top_words))
        .unwrap();
    reporter.into_app()
}

fn render(app: &App) -> String {
    let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
    terminal.draw(|frame| app.draw(frame)).unwrap();

    let buffer = terminal.backend().buffer();
    let width = buffer.area.width as usize;
    buffer
        .content
        .chunks(width)
        .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

// ============================================================================
// KEY HANDLING
// ============================================================================

#[test]
fn reporter_collects_five_pages() {
    let app = sample_app();

    assert_eq!(app.pages.len(), 5);
    assert!(matches!(app.pages[0], ChartPage::Bars { tab: "Messages", .. }));
    assert!(matches!(app.pages[1], ChartPage::Timeline(Some(_))));
    assert!(matches!(app.pages[4], ChartPage::Bars { tab: "Top Words", .. }));
}

#[test]
fn arrows_cycle_through_pages() {
    let mut app = sample_app();

    assert!(!app.handle_key(KeyCode::Right));
    assert_eq!(app.selected, 1);
    assert!(!app.handle_key(KeyCode::Left));
    assert!(!app.handle_key(KeyCode::Left));
    assert_eq!(app.selected, 4);
    assert!(!app.handle_key(KeyCode::Tab));
    assert_eq!(app.selected, 0);
}

#[test]
fn digits_jump_and_out_of_range_digits_are_ignored() {
    let mut app = sample_app();

    app.handle_key(KeyCode::Char('4'));
    assert_eq!(app.selected, 3);
    app.handle_key(KeyCode::Char('9'));
    assert_eq!(app.selected, 3);
}

#[test]
fn q_and_esc_quit() {
    let mut app = sample_app();
    assert!(app.handle_key(KeyCode::Char('q')));
    assert!(app.handle_key(KeyCode::Esc));
}

#[test]
fn keys_on_empty_app_do_not_panic() {
    let mut app = App::new("empty".into(), vec![], NumberFormatOptions::default());
    assert!(!app.handle_key(KeyCode::Right));
    assert!(!app.handle_key(KeyCode::Left));
    assert_eq!(app.selected, 0);
    let screen = render(&app);
    assert!(screen.contains("No data"));
}

// ============================================================================
// RENDERING
// ============================================================================

#[test]
fn renders_tabs_and_message_chart() {
    let app = sample_app();
    let screen = render(&app);

    assert!(screen.contains("hikingclub_x1"));
    assert!(screen.contains("Messages"));
    assert!(screen.contains("Over Time"));
    assert!(screen.contains("Top Words"));
    assert!(screen.contains("Number of Messages Sent"));
    assert!(screen.contains("Ana"));
    assert!(screen.contains("Ben"));
    assert!(screen.contains("q quit"));
}

#[test]
fn renders_timeline_page() {
    let mut app = sample_app();
    app.handle_key(KeyCode::Char('2'));
    let screen = render(&app);

    assert!(screen.contains("# of Messages Over Time"));
    assert!(screen.contains("2022-06-01"));
    assert!(screen.contains("Messages"));
}

#[test]
fn renders_time_of_day_page() {
    let mut app = sample_app();
    app.handle_key(KeyCode::Char('4'));
    let screen = render(&app);

    assert!(screen.contains("Messages by Time of Day"));
    for label in ["Morning", "Afternoon", "Evening", "Night"] {
        assert!(screen.contains(label), "missing {label}");
    }
}

#[test]
fn empty_bar_chart_renders_placeholder() {
    let app = App::new(
        "quiet".into(),
        vec![ChartPage::Bars {
            tab: "Top Words",
            chart: report::top_words(&ConversationStats::default(), 10),
        }],
        NumberFormatOptions::default(),
    );
    let screen = render(&app);

    assert!(screen.contains("Most Common Words"));
    assert!(screen.contains("No data"));
}

#[test]
fn timeline_without_data_renders_placeholder() {
    let app = App::new(
        "quiet".into(),
        vec![ChartPage::Timeline(None)],
        NumberFormatOptions::default(),
    );
    assert!(render(&app).contains("No data"));
}

#[test]
fn long_participant_names_are_truncated() {
    let chart = report::BarSeries {
        title: "Number of Messages Sent",
        kind: report::ValueKind::Count,
        entries: vec![BarEntry {
            label: "Bartholomew Maximilian Featherstonehaugh".into(),
            value: 3.0,
        }],
    };
    let app = App::new(
        "names".into(),
        vec![ChartPage::Bars {
            tab: "Messages",
            chart,
        }],
        NumberFormatOptions::default(),
    );
    let screen = render(&app);

    assert!(screen.contains("Bartholomew Maximil…"));
    assert!(!screen.contains("Featherstonehaugh"));
}

#[test]
fn timeline_series_share_one_chart() {
    let start = Tz::UTC.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
    let timeline = report::Timeline {
        title: "# of Messages Over Time",
        start,
        end: Tz::UTC.with_ymd_and_hms(2023, 3, 1, 0, 0, 0).unwrap(),
        bins: 3,
        series: vec![
            TimelineSeries {
                participant: "Ana".into(),
                counts: vec![1, 5, 2],
            },
            TimelineSeries {
                participant: "Ben".into(),
                counts: vec![0, 2, 9],
            },
        ],
    };
    let app = App::new(
        "series".into(),
        vec![ChartPage::Timeline(Some(timeline))],
        NumberFormatOptions::default(),
    );
    let screen = render(&app);

    assert!(screen.contains("2023-01-01"));
    assert!(screen.contains("2023-03-01"));
    assert!(screen.contains('9'));
}
