use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        Axis, Block, Borders, Cell, Chart, Dataset, GraphType, Paragraph, Row, Table, TableState,
    },
    Frame, Terminal,
};
use std::collections::BTreeSet;
use std::io;

use track_record_dashboard::{
    aggregate, charts, filter, ranking, FilterCriteria, FlagColumn, MetricsSummary,
    NumericColumn, Record, RecordStore, SortDirection, SupplementaryTable, TriState,
    DEFAULT_HISTOGRAM_BINS,
};

const RANKING_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Dataset,
    Filters,
    Metrics,
    Charts,
    Rankings,
    Reference,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Dataset => Page::Filters,
            Page::Filters => Page::Metrics,
            Page::Metrics => Page::Charts,
            Page::Charts => Page::Rankings,
            Page::Rankings => Page::Reference,
            Page::Reference => Page::Dataset,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Dataset => Page::Reference,
            Page::Filters => Page::Dataset,
            Page::Metrics => Page::Filters,
            Page::Charts => Page::Metrics,
            Page::Rankings => Page::Charts,
            Page::Reference => Page::Rankings,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Dataset => "Dataset",
            Page::Filters => "Filters",
            Page::Metrics => "Metrics",
            Page::Charts => "Charts",
            Page::Rankings => "Rankings",
            Page::Reference => "Reference",
        }
    }
}

/// Which multi-select list has focus on the Filters page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterPanel {
    Sex,
    Discipline,
    Nationality,
}

impl FilterPanel {
    fn index(self) -> usize {
        match self {
            FilterPanel::Sex => 0,
            FilterPanel::Discipline => 1,
            FilterPanel::Nationality => 2,
        }
    }

    fn next(self) -> Self {
        match self {
            FilterPanel::Sex => FilterPanel::Discipline,
            FilterPanel::Discipline => FilterPanel::Nationality,
            FilterPanel::Nationality => FilterPanel::Sex,
        }
    }

    fn previous(self) -> Self {
        match self {
            FilterPanel::Sex => FilterPanel::Nationality,
            FilterPanel::Discipline => FilterPanel::Sex,
            FilterPanel::Nationality => FilterPanel::Discipline,
        }
    }
}

pub struct App {
    store: RecordStore,
    reference_tables: Vec<SupplementaryTable>,
    sex_options: Vec<String>,
    discipline_options: Vec<String>,
    nationality_options: Vec<String>,

    pub criteria: FilterCriteria,
    pub filtered: Vec<Record>,
    pub summary: MetricsSummary,

    pub current_page: Page,
    pub table_state: TableState,
    pub focused_panel: FilterPanel,
    pub panel_cursor: [usize; 3],
    pub search_mode: bool,
    pub reference_index: usize,
    pub reference_state: TableState,
}

impl App {
    pub fn new(store: RecordStore, reference_tables: Vec<SupplementaryTable>) -> Self {
        let criteria = FilterCriteria::all_of(&store);
        let sex_options = store.sex_options();
        let discipline_options = store.discipline_options();
        let nationality_options = store.nationality_options();
        let summary = aggregate::summary(&store, &[]);

        let mut app = App {
            store,
            reference_tables,
            sex_options,
            discipline_options,
            nationality_options,
            criteria,
            filtered: Vec::new(),
            summary,
            current_page: Page::Dataset,
            table_state: TableState::default(),
            focused_panel: FilterPanel::Sex,
            panel_cursor: [0; 3],
            search_mode: false,
            reference_index: 0,
            reference_state: TableState::default(),
        };
        app.recompute();
        app
    }

    /// Recompute the derived views from scratch. Called after every
    /// criteria change; there is no caching between interactions.
    pub fn recompute(&mut self) {
        let subset = filter(&self.store, &self.criteria);
        self.summary = aggregate::summary(&self.store, &subset);
        self.filtered = subset.into_iter().cloned().collect();

        if self.filtered.is_empty() {
            self.table_state.select(None);
        } else {
            self.table_state.select(Some(0));
        }
    }

    /// Live subset as references, for the chart and ranking builders
    fn subset(&self) -> Vec<&Record> {
        self.filtered.iter().collect()
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.previous();
    }

    fn panel_options(&self, panel: FilterPanel) -> &[String] {
        match panel {
            FilterPanel::Sex => &self.sex_options,
            FilterPanel::Discipline => &self.discipline_options,
            FilterPanel::Nationality => &self.nationality_options,
        }
    }

    fn panel_selection(&mut self, panel: FilterPanel) -> &mut BTreeSet<String> {
        match panel {
            FilterPanel::Sex => &mut self.criteria.sexes,
            FilterPanel::Discipline => &mut self.criteria.disciplines,
            FilterPanel::Nationality => &mut self.criteria.nationalities,
        }
    }

    pub fn cursor_down(&mut self) {
        let panel = self.focused_panel;
        let len = self.panel_options(panel).len();
        if len == 0 {
            return;
        }
        let cursor = &mut self.panel_cursor[panel.index()];
        *cursor = if *cursor + 1 >= len { 0 } else { *cursor + 1 };
    }

    pub fn cursor_up(&mut self) {
        let panel = self.focused_panel;
        let len = self.panel_options(panel).len();
        if len == 0 {
            return;
        }
        let cursor = &mut self.panel_cursor[panel.index()];
        *cursor = if *cursor == 0 { len - 1 } else { *cursor - 1 };
    }

    /// Toggle membership of the highlighted option in its selection set
    pub fn toggle_highlighted(&mut self) {
        let panel = self.focused_panel;
        let cursor = self.panel_cursor[panel.index()];
        let Some(option) = self.panel_options(panel).get(cursor).cloned() else {
            return;
        };

        let selection = self.panel_selection(panel);
        if !selection.remove(&option) {
            selection.insert(option);
        }
        self.recompute();
    }

    /// Cycle a flag filter: off -> true only -> false only -> off
    pub fn cycle_predicted_filter(&mut self) {
        cycle_flag(&mut self.criteria.predicted_flag_values);
        self.recompute();
    }

    pub fn cycle_actual_filter(&mut self) {
        cycle_flag(&mut self.criteria.actual_flag_values);
        self.recompute();
    }

    /// Back to the initial state: everything selected, no search, no flags
    pub fn clear_filters(&mut self) {
        self.criteria = FilterCriteria::all_of(&self.store);
        self.recompute();
    }

    pub fn push_search_char(&mut self, c: char) {
        self.criteria
            .name_substring
            .get_or_insert_with(String::new)
            .push(c);
        self.recompute();
    }

    pub fn pop_search_char(&mut self) {
        if let Some(needle) = self.criteria.name_substring.as_mut() {
            needle.pop();
            if needle.is_empty() {
                self.criteria.name_substring = None;
            }
        }
        self.recompute();
    }

    pub fn next_row(&mut self) {
        move_selection(&mut self.table_state, self.filtered.len(), 1);
    }

    pub fn previous_row(&mut self) {
        move_selection(&mut self.table_state, self.filtered.len(), -1);
    }

    pub fn page_down(&mut self) {
        move_selection(&mut self.table_state, self.filtered.len(), 20);
    }

    pub fn page_up(&mut self) {
        move_selection(&mut self.table_state, self.filtered.len(), -20);
    }

    pub fn next_reference_table(&mut self) {
        if self.reference_tables.is_empty() {
            return;
        }
        self.reference_index = (self.reference_index + 1) % self.reference_tables.len();
        self.reference_state.select(Some(0));
    }

    pub fn previous_reference_table(&mut self) {
        if self.reference_tables.is_empty() {
            return;
        }
        self.reference_index = if self.reference_index == 0 {
            self.reference_tables.len() - 1
        } else {
            self.reference_index - 1
        };
        self.reference_state.select(Some(0));
    }
}

fn cycle_flag(current: &mut Option<BTreeSet<bool>>) {
    *current = match current.take() {
        None => Some([true].into_iter().collect()),
        Some(set) if set.contains(&true) => Some([false].into_iter().collect()),
        Some(_) => None,
    };
}

fn move_selection(state: &mut TableState, len: usize, delta: isize) {
    if len == 0 {
        state.select(None);
        return;
    }
    let current = state.selected().unwrap_or(0) as isize;
    let next = (current + delta).clamp(0, len as isize - 1) as usize;
    state.select(Some(next));
}

fn flag_filter_label(filter: &Option<BTreeSet<bool>>) -> &'static str {
    match filter {
        None => "off",
        Some(set) if set.contains(&true) => "Yes only",
        Some(_) => "No only",
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {err:?}");
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            // Search input grabs the keyboard until Enter/Esc
            if app.search_mode {
                match key.code {
                    KeyCode::Enter | KeyCode::Esc => app.search_mode = false,
                    KeyCode::Backspace => app.pop_search_char(),
                    KeyCode::Char(c) => app.push_search_char(c),
                    _ => {}
                }
                continue;
            }

            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Tab => app.next_page(),
                KeyCode::BackTab => app.previous_page(),
                KeyCode::Char('/') => app.search_mode = true,
                KeyCode::Char('c') => app.clear_filters(),
                KeyCode::Char('p') => app.cycle_predicted_filter(),
                KeyCode::Char('a') => app.cycle_actual_filter(),
                KeyCode::Left | KeyCode::Char('h') if app.current_page == Page::Filters => {
                    app.focused_panel = app.focused_panel.previous();
                }
                KeyCode::Right | KeyCode::Char('l') if app.current_page == Page::Filters => {
                    app.focused_panel = app.focused_panel.next();
                }
                KeyCode::Char(' ') if app.current_page == Page::Filters => {
                    app.toggle_highlighted();
                }
                KeyCode::Char('n') if app.current_page == Page::Reference => {
                    app.next_reference_table();
                }
                KeyCode::Char('b') if app.current_page == Page::Reference => {
                    app.previous_reference_table();
                }
                KeyCode::Down | KeyCode::Char('j') => match app.current_page {
                    Page::Filters => app.cursor_down(),
                    _ => app.next_row(),
                },
                KeyCode::Up | KeyCode::Char('k') => match app.current_page {
                    Page::Filters => app.cursor_up(),
                    _ => app.previous_row(),
                },
                KeyCode::PageDown => app.page_down(),
                KeyCode::PageUp => app.page_up(),
                KeyCode::Home => app.table_state.select(Some(0)),
                KeyCode::End => {
                    if !app.filtered.is_empty() {
                        app.table_state.select(Some(app.filtered.len() - 1));
                    }
                }
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.current_page {
        Page::Dataset => render_dataset(f, chunks[1], app),
        Page::Filters => render_filters(f, chunks[1], app),
        Page::Metrics => render_metrics(f, chunks[1], app),
        Page::Charts => render_charts(f, chunks[1], app),
        Page::Rankings => render_rankings(f, chunks[1], app),
        Page::Reference => render_reference(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let pages = [
        Page::Dataset,
        Page::Filters,
        Page::Metrics,
        Page::Charts,
        Page::Rankings,
        Page::Reference,
    ];

    let mut tab_spans = vec![];
    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(page.title(), style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Records: {}/{}", app.filtered.len(), app.store.len()),
        Style::default().fg(Color::White),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Track Record Comparison Dashboard "),
    );

    f.render_widget(header, area);
}

fn render_dataset(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = [
        "Competitor",
        "Sex",
        "Discipline",
        "Nat",
        "Mark",
        "P(WR)",
        "Pred WR",
        "Act WR",
        "Act NR",
        "Act PB",
    ]
    .iter()
    .map(|h| {
        Cell::from(*h).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = app.filtered.iter().map(|record| {
        let cells = vec![
            Cell::from(truncate(record.competitor.as_deref().unwrap_or("-"), 24)),
            Cell::from(record.sex.clone()),
            Cell::from(truncate(&record.discipline, 16)),
            Cell::from(record.nationality.clone()),
            Cell::from(format_number(record.mark_numeric, 2)),
            Cell::from(format_number(record.probability_world_record_breaker, 4)),
            flag_cell(record.predicted_world_record_breaker),
            flag_cell(record.actual_world_record_breaker),
            flag_cell(record.actual_national_record_breaker),
            flag_cell(record.actual_personal_best_breaker),
        ];
        Row::new(cells).height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(26),
            Constraint::Length(6),
            Constraint::Length(18),
            Constraint::Length(5),
            Constraint::Length(9),
            Constraint::Length(8),
            Constraint::Length(8),
            Constraint::Length(8),
            Constraint::Length(8),
            Constraint::Length(8),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Filtered Dataset "),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.table_state);
}

fn render_filters(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(0)])
        .split(area);

    // Search string and flag filter state
    let search = app.criteria.name_substring.as_deref().unwrap_or("");
    let summary_lines = vec![
        Line::from(vec![
            Span::styled("Name search: ", Style::default().fg(Color::Yellow)),
            Span::raw(if search.is_empty() { "(none)" } else { search }),
        ]),
        Line::from(vec![
            Span::styled("Predicted WR filter: ", Style::default().fg(Color::Yellow)),
            Span::raw(flag_filter_label(&app.criteria.predicted_flag_values)),
            Span::raw("   "),
            Span::styled("Actual WR filter: ", Style::default().fg(Color::Yellow)),
            Span::raw(flag_filter_label(&app.criteria.actual_flag_values)),
        ]),
    ];
    let summary = Paragraph::new(summary_lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Active Criteria "),
    );
    f.render_widget(summary, chunks[0]);

    let panels = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(25),
            Constraint::Percentage(40),
            Constraint::Percentage(35),
        ])
        .split(chunks[1]);

    render_filter_panel(f, panels[0], app, FilterPanel::Sex, " Sex ");
    render_filter_panel(f, panels[1], app, FilterPanel::Discipline, " Discipline ");
    render_filter_panel(
        f,
        panels[2],
        app,
        FilterPanel::Nationality,
        " Nationality (empty = all) ",
    );
}

fn render_filter_panel(f: &mut Frame, area: Rect, app: &App, panel: FilterPanel, title: &str) {
    let focused = app.focused_panel == panel;
    let cursor = app.panel_cursor[panel.index()];

    let selection = match panel {
        FilterPanel::Sex => &app.criteria.sexes,
        FilterPanel::Discipline => &app.criteria.disciplines,
        FilterPanel::Nationality => &app.criteria.nationalities,
    };

    let visible = area.height.saturating_sub(2) as usize;
    let offset = cursor.saturating_sub(visible.saturating_sub(1));

    let lines: Vec<Line> = app
        .panel_options(panel)
        .iter()
        .enumerate()
        .skip(offset)
        .take(visible)
        .map(|(i, option)| {
            let marker = if selection.contains(option) { "[x]" } else { "[ ]" };
            let style = if focused && i == cursor {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else if selection.contains(option) {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::Gray)
            };
            Line::from(Span::styled(format!("{marker} {option}"), style))
        })
        .collect();

    let border_style = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::White)
    };

    let panel_widget = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(title),
    );
    f.render_widget(panel_widget, area);
}

fn render_metrics(f: &mut Frame, area: Rect, app: &App) {
    let s = &app.summary;

    let optional_count = |value: Option<usize>| match value {
        Some(count) => count.to_string(),
        None => "N/A".to_string(),
    };

    let content = vec![
        Line::from(""),
        metric_line("Total Records", s.total_records.to_string()),
        metric_line("Average Mark", s.mean_mark.format(2)),
        metric_line("Average Probability (World Record)", s.mean_probability.format(4)),
        Line::from(""),
        metric_line(
            "Predicted World Record Breakers",
            s.predicted_world_record_breakers.to_string(),
        ),
        metric_line(
            "Actual World Record Breakers",
            s.actual_world_record_breakers.to_string(),
        ),
        metric_line(
            "World Record Prediction Accuracy",
            format!("{}%", s.world_record_accuracy.format(1)),
        ),
        Line::from(""),
        metric_line(
            "Predicted National Record Breakers",
            optional_count(s.predicted_national_record_breakers),
        ),
        metric_line(
            "Actual National Record Breakers",
            optional_count(s.actual_national_record_breakers),
        ),
        metric_line(
            "Predicted Personal Best Breakers",
            optional_count(s.predicted_personal_best_breakers),
        ),
        metric_line(
            "Actual Personal Best Breakers",
            optional_count(s.actual_personal_best_breakers),
        ),
    ];

    let metrics = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Key Metrics "),
    );
    f.render_widget(metrics, area);
}

fn metric_line(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!("  {label:<38}"),
            Style::default().fg(Color::Gray),
        ),
        Span::styled(
            value,
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ),
    ])
}

fn render_charts(f: &mut Frame, area: Rect, app: &App) {
    let subset = app.subset();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(30),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Min(7),
        ])
        .split(area);

    render_probability_histogram(f, chunks[0], &subset);
    render_discipline_bars(f, chunks[1], &subset);
    render_mark_probability_scatter(f, chunks[2], &subset);
    render_distributions(f, chunks[3], &subset);
}

/// Probability histogram as horizontal text bars
fn render_probability_histogram(f: &mut Frame, area: Rect, subset: &[&Record]) {
    let bins = charts::histogram(subset, NumericColumn::Probability, DEFAULT_HISTOGRAM_BINS);
    let max_count = bins.iter().map(|b| b.count).max().unwrap_or(0);

    let mut lines = Vec::new();
    for bin in &bins {
        let bar_width = if max_count == 0 {
            0
        } else {
            bin.count * 40 / max_count
        };
        lines.push(Line::from(vec![
            Span::styled(
                format!("  {:.2}-{:.2} ", bin.lower, bin.upper),
                Style::default().fg(Color::Gray),
            ),
            Span::styled("█".repeat(bar_width), Style::default().fg(Color::Cyan)),
            Span::raw(format!(" {}", bin.count)),
        ]));
    }
    if lines.is_empty() {
        lines.push(Line::from("  (no data)"));
    }

    let widget = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" World Record Probability Distribution "),
    );
    f.render_widget(widget, area);
}

/// Per-discipline predicted-breaker counts as grouped text bars
fn render_discipline_bars(f: &mut Frame, area: Rect, subset: &[&Record]) {
    let counts = charts::counts_by_discipline(subset, FlagColumn::PredictedWorldRecord);
    let max_count = counts.iter().map(|c| c.count).max().unwrap_or(0);

    let mut lines = Vec::new();
    for entry in &counts {
        let bar_width = if max_count == 0 {
            0
        } else {
            entry.count * 30 / max_count
        };
        lines.push(Line::from(vec![
            Span::styled(
                format!(
                    "  {:<18} {:<8} ",
                    truncate(&entry.discipline, 18),
                    entry.value.label()
                ),
                Style::default().fg(Color::Gray),
            ),
            Span::styled("█".repeat(bar_width), Style::default().fg(flag_color(entry.value))),
            Span::raw(format!(" {}", entry.count)),
        ]));
    }
    if lines.is_empty() {
        lines.push(Line::from("  (no data)"));
    }

    let widget = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Predicted World Record Breakers by Discipline "),
    );
    f.render_widget(widget, area);
}

/// Mark-vs-probability scatter, colored by actual world-record outcome
fn render_mark_probability_scatter(f: &mut Frame, area: Rect, subset: &[&Record]) {
    let points = charts::scatter(
        subset,
        NumericColumn::Mark,
        NumericColumn::Probability,
        FlagColumn::ActualWorldRecord,
    );

    let series = |flag: TriState| -> Vec<(f64, f64)> {
        points
            .iter()
            .filter(|p| p.flag == flag)
            .map(|p| (p.x, p.y))
            .collect()
    };
    let yes = series(TriState::Yes);
    let no = series(TriState::No);
    let unknown = series(TriState::Unknown);

    let (x_min, x_max) = axis_bounds(points.iter().map(|p| p.x));
    let (y_min, y_max) = axis_bounds(points.iter().map(|p| p.y));

    let datasets = vec![
        scatter_dataset("Actual WR: Yes", Color::Green, &yes),
        scatter_dataset("Actual WR: No", Color::Red, &no),
        scatter_dataset("Actual WR: Unknown", Color::DarkGray, &unknown),
    ];

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Mark vs Probability (Actual World Breaker) "),
        )
        .x_axis(
            Axis::default()
                .title("mark_numeric")
                .style(Style::default().fg(Color::Gray))
                .bounds([x_min, x_max])
                .labels(vec![
                    Span::raw(format!("{x_min:.2}")),
                    Span::raw(format!("{x_max:.2}")),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("P(WR)")
                .style(Style::default().fg(Color::Gray))
                .bounds([y_min, y_max])
                .labels(vec![
                    Span::raw(format!("{y_min:.2}")),
                    Span::raw(format!("{y_max:.2}")),
                ]),
        );
    f.render_widget(chart, area);
}

fn scatter_dataset<'a>(name: &'a str, color: Color, data: &'a [(f64, f64)]) -> Dataset<'a> {
    Dataset::default()
        .name(name)
        .marker(symbols::Marker::Dot)
        .graph_type(GraphType::Scatter)
        .style(Style::default().fg(color))
        .data(data)
}

/// Data bounds with a fallback for empty or degenerate ranges
fn axis_bounds(values: impl Iterator<Item = f64> + Clone) -> (f64, f64) {
    let min = values.clone().fold(f64::INFINITY, f64::min);
    let max = values.fold(f64::NEG_INFINITY, f64::max);
    if min > max {
        (0.0, 1.0)
    } else if min == max {
        (min - 0.5, max + 0.5)
    } else {
        (min, max)
    }
}

/// Flag distributions plus the predicted-vs-actual comparison counts
fn render_distributions(f: &mut Frame, area: Rect, subset: &[&Record]) {
    let mut lines = Vec::new();
    for (label, column) in [
        ("Actual World Record", FlagColumn::ActualWorldRecord),
        ("Actual National Record", FlagColumn::ActualNationalRecord),
        ("Actual Personal Best", FlagColumn::ActualPersonalBest),
    ] {
        let d = charts::flag_distribution(subset, column);
        lines.push(Line::from(vec![
            Span::styled(format!("  {label:<24}"), Style::default().fg(Color::Gray)),
            Span::styled(format!("Yes {:<6}", d.yes), Style::default().fg(Color::Green)),
            Span::styled(format!("No {:<6}", d.no), Style::default().fg(Color::Red)),
            Span::styled(
                format!("Unknown {}", d.unknown),
                Style::default().fg(Color::DarkGray),
            ),
        ]));
    }

    // Predicted vs actual world-record melt (known values only)
    lines.push(Line::from(""));
    let slices = charts::predicted_vs_actual(
        subset,
        FlagColumn::PredictedWorldRecord,
        FlagColumn::ActualWorldRecord,
    );
    let mut melt_spans = vec![Span::styled(
        "  Predicted vs Actual (WR) ",
        Style::default().fg(Color::Gray),
    )];
    if slices.is_empty() {
        melt_spans.push(Span::raw("(no known values)"));
    }
    for slice in &slices {
        let short = if slice.series == FlagColumn::PredictedWorldRecord.header() {
            "Pred"
        } else {
            "Act"
        };
        let value = if slice.value { "Yes" } else { "No" };
        melt_spans.push(Span::styled(
            format!("{short} {value}: {}  ", slice.count),
            Style::default().fg(if slice.value { Color::Green } else { Color::Red }),
        ));
    }
    lines.push(Line::from(melt_spans));

    let widget = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Breaker Distributions "),
    );
    f.render_widget(widget, area);
}

fn flag_color(value: TriState) -> Color {
    match value {
        TriState::Yes => Color::Green,
        TriState::No => Color::Red,
        TriState::Unknown => Color::DarkGray,
    }
}

fn render_rankings(f: &mut Frame, area: Rect, app: &App) {
    let subset = app.subset();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(34),
            Constraint::Percentage(33),
            Constraint::Percentage(33),
        ])
        .split(area);

    // Probability: higher is more notable. Mark: ascending, assuming
    // time-based disciplines where lower is better.
    let top_predicted = ranking::top_n(
        &subset,
        NumericColumn::Probability,
        SortDirection::Descending,
        RANKING_SIZE,
        FlagColumn::PredictedWorldRecord,
    );
    render_ranking_table(
        f,
        chunks[0],
        " Top Predicted World Record Breakers ",
        &top_predicted,
        NumericColumn::Probability,
    );

    let top_national = ranking::top_n(
        &subset,
        NumericColumn::Mark,
        SortDirection::Ascending,
        RANKING_SIZE,
        FlagColumn::ActualNationalRecord,
    );
    render_ranking_table(
        f,
        chunks[1],
        " Top Actual National Record Breakers ",
        &top_national,
        NumericColumn::Mark,
    );

    let top_personal = ranking::top_n(
        &subset,
        NumericColumn::Mark,
        SortDirection::Ascending,
        RANKING_SIZE,
        FlagColumn::ActualPersonalBest,
    );
    render_ranking_table(
        f,
        chunks[2],
        " Top Actual Personal Best Breakers ",
        &top_personal,
        NumericColumn::Mark,
    );
}

fn render_ranking_table(
    f: &mut Frame,
    area: Rect,
    title: &str,
    rows: &[&Record],
    value_column: NumericColumn,
) {
    // Built with into_iter: the array holds a non-const function call, so
    // borrowing it through .iter() would drop it while the cells live on
    let header_cells = ["#", "Competitor", "Discipline", "Nat", value_column.header()]
        .into_iter()
        .map(|h| {
            Cell::from(h).style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        });
    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let body = rows.iter().enumerate().map(|(i, record)| {
        let decimals = match value_column {
            NumericColumn::Mark => 2,
            NumericColumn::Probability => 4,
        };
        Row::new(vec![
            Cell::from(format!("{}", i + 1)),
            Cell::from(truncate(record.competitor.as_deref().unwrap_or("-"), 24)),
            Cell::from(truncate(&record.discipline, 16)),
            Cell::from(record.nationality.clone()),
            Cell::from(format_number(value_column.of(record), decimals)),
        ])
        .height(1)
    });

    let table = Table::new(
        body,
        [
            Constraint::Length(4),
            Constraint::Length(26),
            Constraint::Length(18),
            Constraint::Length(5),
            Constraint::Length(34),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(title.to_string()),
    );

    f.render_widget(table, area);
}

fn render_reference(f: &mut Frame, area: Rect, app: &mut App) {
    let Some(table) = app.reference_tables.get(app.reference_index) else {
        let empty = Paragraph::new("No reference tables loaded")
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(empty, area);
        return;
    };

    let header_cells = table.headers.iter().map(|h| {
        Cell::from(h.clone()).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });
    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = table
        .rows
        .iter()
        .map(|row| Row::new(row.iter().map(|cell| Cell::from(truncate(cell, 22)))).height(1));

    let widths = vec![Constraint::Length(24); table.headers.len()];
    let title = format!(
        " {} ({}/{}) ",
        table.title,
        app.reference_index + 1,
        app.reference_tables.len()
    );

    let widget = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(title),
        )
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        );

    f.render_stateful_widget(widget, area, &mut app.reference_state);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let mut status_spans = vec![];

    if app.search_mode {
        status_spans.push(Span::styled(
            format!(
                " Search: {}_ ",
                app.criteria.name_substring.as_deref().unwrap_or("")
            ),
            Style::default().fg(Color::Green),
        ));
        status_spans.push(Span::raw("| "));
        status_spans.push(Span::styled("Enter/Esc", Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(" Done"));
    } else {
        status_spans.push(Span::styled("Tab", Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(" Page | "));
        status_spans.push(Span::styled("/", Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(" Search | "));
        status_spans.push(Span::styled("p", Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw("/"));
        status_spans.push(Span::styled("a", Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(" Pred/Actual filter | "));
        status_spans.push(Span::styled("c", Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(" Clear | "));
        if app.current_page == Page::Filters {
            status_spans.push(Span::styled("Space", Style::default().fg(Color::Yellow)));
            status_spans.push(Span::raw(" Toggle | "));
            status_spans.push(Span::styled("←/→", Style::default().fg(Color::Yellow)));
            status_spans.push(Span::raw(" Panel | "));
        }
        if app.current_page == Page::Reference {
            status_spans.push(Span::styled("n", Style::default().fg(Color::Yellow)));
            status_spans.push(Span::raw("/"));
            status_spans.push(Span::styled("b", Style::default().fg(Color::Yellow)));
            status_spans.push(Span::raw(" Table | "));
        }
        status_spans.push(Span::styled("↑/↓", Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(" Nav | "));
        status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
        status_spans.push(Span::raw(" Quit"));
    }

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn flag_cell(value: TriState) -> Cell<'static> {
    Cell::from(value.label()).style(Style::default().fg(flag_color(value)))
}

fn format_number(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) => format!("{v:.decimals$}"),
        None => "-".to_string(),
    }
}

/// Shorten to at most `max_len` characters, counting chars rather than
/// bytes so accented names never split inside a multi-byte character.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;

    const HEADER: &str = "competitor,Sex,Discipline,Nationality,mark_numeric,\
Probability_World_Record_Breaker,Predicted_World_Record_Breaker,\
World_Record_Correct,Actual_World_Record_Breaker,\
Actual_National_Record_Breaker,Actual_Personal_Best_Breaker";

    fn test_app() -> App {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.csv");
        std::fs::write(
            &path,
            format!(
                "{HEADER}\n\
                 Élodie Durand,Women,100m,FRA,10.71,0.88,Yes,Yes,Yes,Yes,Yes\n\
                 Ann Carter,Women,200m,USA,21.90,0.35,No,Yes,No,Yes,No\n\
                 Brooke Li,Women,100m,CHN,10.95,0.10,No,Unknown,Unknown,No,Yes\n"
            ),
        )
        .unwrap();
        let store = RecordStore::load(&[&path]).unwrap();

        let tables = vec![SupplementaryTable {
            title: "Women's World Record Breakers".to_string(),
            headers: vec!["competitor".to_string(), "mark_numeric".to_string()],
            rows: vec![vec!["Élodie Durand".to_string(), "10.71".to_string()]],
        }];
        App::new(store, tables)
    }

    fn render_page(app: &mut App, page: Page) -> String {
        app.current_page = page;
        let backend = TestBackend::new(120, 40);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| ui(f, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_truncate_counts_chars_not_bytes() {
        let name = "aaaaaaaaaaaaaaaaaaaaé competitor";
        let shortened = truncate(name, 21);
        assert!(shortened.ends_with("..."));
        assert!(shortened.chars().count() <= 21);

        // Accented name short enough to keep whole
        assert_eq!(truncate("Élodie", 24), "Élodie");
    }

    #[test]
    fn test_every_page_renders() {
        let mut app = test_app();
        for page in [
            Page::Dataset,
            Page::Filters,
            Page::Metrics,
            Page::Charts,
            Page::Rankings,
            Page::Reference,
        ] {
            let text = render_page(&mut app, page);
            assert!(!text.trim().is_empty(), "{} page drew nothing", page.title());
        }
    }

    #[test]
    fn test_rankings_page_lists_flagged_competitors() {
        let mut app = test_app();
        let text = render_page(&mut app, Page::Rankings);

        assert!(text.contains("Top Predicted World Record Breakers"));
        // Only Élodie carries the predicted world-record flag
        assert!(text.contains("Élodie Durand"));
        // Ann holds a national record, so the middle table lists her too
        assert!(text.contains("Ann Carter"));
    }

    #[test]
    fn test_charts_page_shows_per_discipline_counts() {
        let mut app = test_app();
        let text = render_page(&mut app, Page::Charts);

        assert!(text.contains("World Record Probability Distribution"));
        assert!(text.contains("Predicted World Record Breakers by Discipline"));
        // One 100m Yes, one 100m No, one 200m No in the fixture
        assert!(text.contains("100m"));
        assert!(text.contains("200m"));
        assert!(text.contains("Mark vs Probability"));
        assert!(text.contains("Predicted vs Actual"));
    }
}
