use std::io;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::Line;
use ratatui::widgets::{
    Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Dataset, GraphType, Paragraph, Tabs,
};
use ratatui::{Frame, Terminal};

use crate::report::{BarSeries, Reporter, Timeline, ValueKind};
use crate::utils::{NumberFormatOptions, format_decimal, format_number, truncate_label};

const SERIES_COLORS: [Color; 7] = [
    Color::Blue,
    Color::Red,
    Color::Cyan,
    Color::Magenta,
    Color::Yellow,
    Color::Green,
    Color::White,
];

const MAX_LABEL_WIDTH: usize = 20;

#[derive(Debug, Clone)]
pub enum ChartPage {
    Bars { tab: &'static str, chart: BarSeries },
    Timeline(Option<Timeline>),
}

impl ChartPage {
    fn tab_title(&self) -> &'static str {
        match self {
            ChartPage::Bars { tab, .. } => *tab,
            ChartPage::Timeline(_) => "Over Time",
        }
    }
}

/// State of the interactive chart viewer.
pub struct App {
    pub title: String,
    pub pages: Vec<ChartPage>,
    pub selected: usize,
    format_options: NumberFormatOptions,
}

impl App {
    pub fn new(title: String, pages: Vec<ChartPage>, format_options: NumberFormatOptions) -> Self {
        Self {
            title,
            pages,
            selected: 0,
            format_options,
        }
    }

    /// Apply a key press. Returns true when the viewer should close.
    pub fn handle_key(&mut self, code: KeyCode) -> bool {
        let count = self.pages.len();
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Right | KeyCode::Tab | KeyCode::Char('l') if count > 0 => {
                self.selected = (self.selected + 1) % count;
            }
            KeyCode::Left | KeyCode::BackTab | KeyCode::Char('h') if count > 0 => {
                self.selected = (self.selected + count - 1) % count;
            }
            KeyCode::Char(c @ '1'..='9') => {
                let index = c as usize - '1' as usize;
                if index < count {
                    self.selected = index;
                }
            }
            _ => {}
        }
        false
    }

    pub fn draw(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(frame.area());

        let tabs = Tabs::new(self.pages.iter().map(ChartPage::tab_title))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(self.title.clone()),
            )
            .select(self.selected)
            .highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            );
        frame.render_widget(tabs, chunks[0]);

        match self.pages.get(self.selected) {
            Some(ChartPage::Bars { chart, .. }) => self.draw_bars(frame, chunks[1], chart),
            Some(ChartPage::Timeline(Some(chart))) => self.draw_timeline(frame, chunks[1], chart),
            Some(ChartPage::Timeline(None)) | None => {
                let empty = Paragraph::new("No data").block(Block::default().borders(Borders::ALL));
                frame.render_widget(empty, chunks[1]);
            }
        }

        let help = Paragraph::new("←/→ switch chart • 1-5 jump • q quit")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(help, chunks[2]);
    }

    fn draw_bars(&self, frame: &mut Frame, area: Rect, chart: &BarSeries) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(chart.title);

        if chart.entries.is_empty() {
            frame.render_widget(Paragraph::new("No data").block(block), area);
            return;
        }

        let bars: Vec<Bar> = chart
            .entries
            .iter()
            .map(|entry| {
                let (value, text) = match chart.kind {
                    ValueKind::Count => (
                        entry.value as u64,
                        format_number(entry.value as u64, &self.format_options),
                    ),
                    // Bars only take integers; scale so fractions still show.
                    ValueKind::Average => (
                        (entry.value * 100.0).round() as u64,
                        format_decimal(entry.value, &self.format_options),
                    ),
                };
                Bar::default()
                    .value(value)
                    .label(Line::from(truncate_label(&entry.label, MAX_LABEL_WIDTH)))
                    .text_value(text)
            })
            .collect();

        let widget = BarChart::default()
            .block(block)
            .direction(Direction::Horizontal)
            .bar_width(1)
            .bar_gap(0)
            .bar_style(Style::default().fg(Color::Red))
            .value_style(Style::default().fg(Color::Black).bg(Color::Red))
            .data(BarGroup::default().bars(&bars));
        frame.render_widget(widget, area);
    }

    fn draw_timeline(&self, frame: &mut Frame, area: Rect, chart: &Timeline) {
        let points: Vec<Vec<(f64, f64)>> = chart
            .series
            .iter()
            .map(|series| {
                series
                    .counts
                    .iter()
                    .enumerate()
                    .map(|(bin, count)| (bin as f64, *count as f64))
                    .collect()
            })
            .collect();

        let datasets: Vec<Dataset> = chart
            .series
            .iter()
            .zip(&points)
            .enumerate()
            .map(|(i, (series, data))| {
                Dataset::default()
                    .name(truncate_label(&series.participant, MAX_LABEL_WIDTH))
                    .marker(Marker::Braille)
                    .graph_type(GraphType::Line)
                    .style(Style::default().fg(SERIES_COLORS[i % SERIES_COLORS.len()]))
                    .data(data)
            })
            .collect();

        let max = chart.max_count().max(1);
        let x_labels = vec![
            chart.start.format("%Y-%m-%d").to_string(),
            chart.bin_start(chart.bins / 2).format("%Y-%m-%d").to_string(),
            chart.end.format("%Y-%m-%d").to_string(),
        ];
        let y_labels = vec![
            "0".to_string(),
            format_number(max, &self.format_options),
        ];

        let widget = Chart::new(datasets)
            .block(Block::default().borders(Borders::ALL).title(chart.title))
            .x_axis(
                Axis::default()
                    .title("Time")
                    .bounds([0.0, chart.bins.saturating_sub(1).max(1) as f64])
                    .labels(x_labels),
            )
            .y_axis(
                Axis::default()
                    .title("Messages")
                    .bounds([0.0, max as f64])
                    .labels(y_labels),
            );
        frame.render_widget(widget, area);
    }
}

/// Collects the charts of one conversation and shows them in an interactive
/// terminal view once all of them have arrived.
pub struct TuiReporter {
    title: String,
    pages: Vec<ChartPage>,
    format_options: NumberFormatOptions,
}

impl TuiReporter {
    pub fn new(title: String, format_options: NumberFormatOptions) -> Self {
        Self {
            title,
            pages: Vec::new(),
            format_options,
        }
    }

    #[cfg(test)]
    pub fn into_app(self) -> App {
        App::new(self.title, self.pages, self.format_options)
    }
}

impl Reporter for TuiReporter {
    fn message_counts(&mut self, chart: &BarSeries) -> Result<()> {
        self.pages.push(ChartPage::Bars {
            tab: "Messages",
            chart: chart.clone(),
        });
        Ok(())
    }

    fn timeline(&mut self, chart: Option<&Timeline>) -> Result<()> {
        self.pages.push(ChartPage::Timeline(chart.cloned()));
        Ok(())
    }

    fn average_words(&mut self, chart: &BarSeries) -> Result<()> {
        self.pages.push(ChartPage::Bars {
            tab: "Words/Message",
            chart: chart.clone(),
        });
        Ok(())
    }

    fn time_of_day(&mut self, chart: &BarSeries) -> Result<()> {
        self.pages.push(ChartPage::Bars {
            tab: "Time of Day",
            chart: chart.clone(),
        });
        Ok(())
    }

    fn top_words(&mut self, chart: &BarSeries) -> Result<()> {
        self.pages.push(ChartPage::Bars {
            tab: "Top Words",
            chart: chart.clone(),
        });
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        let app = App::new(
            self.title.clone(),
            std::mem::take(&mut self.pages),
            self.format_options.clone(),
        );
        run_tui(app)
    }
}

pub fn run_tui(mut app: App) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let result = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|frame| app.draw(frame))?;

        if let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
            && app.handle_key(key.code)
        {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests;
