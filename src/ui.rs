use crate::config::Permission;
use crate::hearts::HeartField;
use crate::model::Namespace;
use crate::notify;
use crate::predict::Prediction;
use crate::render::{self, Fragment};
use crate::tracker::{SubmitError, Tracker};
use crate::widgets::{Accordion, ContactForm};
use anyhow::Result;
use chrono::Utc;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::{Alignment, Color, Modifier, Rect, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Terminal;
use std::io::{stdout, Stdout};
use std::time::{Duration, Instant};

const FRAME: Duration = Duration::from_millis(60);
const FORM_HELP: &str = concat!(
    "Tab/Shift-Tab move • Enter save (newline in multi-line fields) • ",
    "Ctrl+S save • Esc cancel"
);

pub async fn run(tracker: Tracker) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let mut app = App::new(tracker);
    let result = app.event_loop(&mut terminal).await;
    teardown_terminal(&mut terminal)?;
    result
}

struct App {
    tracker: Tracker,
    tab: Tab,
    mode: Mode,
    status: String,
    last_save: Instant,
    prediction: Option<Prediction>,
    hearts: HeartField,
    faq: Accordion,
    faq_idx: usize,
}

enum Mode {
    Normal,
    Editing(Form),
    Confirm(Confirmation),
    Alert {
        message: String,
        resume: Option<Form>,
    },
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum Confirmation {
    Clear(Namespace),
    EnableNotifications,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Tab {
    Tracker,
    Journal,
    Reminders,
    Faq,
    Contact,
}

const TABS: [Tab; 5] = [Tab::Tracker, Tab::Journal, Tab::Reminders, Tab::Faq, Tab::Contact];

impl Tab {
    fn label(&self) -> &'static str {
        match self {
            Tab::Tracker => "Tracker",
            Tab::Journal => "Journal",
            Tab::Reminders => "Reminders",
            Tab::Faq => "FAQ",
            Tab::Contact => "Contact",
        }
    }

    fn index(&self) -> usize {
        TABS.iter().position(|t| t == self).unwrap_or(0)
    }

    fn shifted(&self, delta: isize) -> Tab {
        let len = TABS.len() as isize;
        let idx = (self.index() as isize + delta).rem_euclid(len);
        TABS[idx as usize]
    }
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum FormKind {
    Cycle,
    Journal,
    Reminder,
    Contact,
}

struct FormEntry {
    label: &'static str,
    value: FieldValue,
    multiline: bool,
}

struct Form {
    kind: FormKind,
    fields: Vec<FormEntry>,
    active: usize,
}

#[derive(Clone)]
struct FieldValue {
    value: String,
    cursor: usize,
}

impl FieldValue {
    fn new(value: &str) -> Self {
        FieldValue {
            value: value.to_string(),
            cursor: value.len(),
        }
    }

    fn move_left(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor = prev_char(self.cursor, &self.value);
    }

    fn move_right(&mut self) {
        if self.cursor >= self.value.len() {
            return;
        }
        self.cursor = next_char(self.cursor, &self.value);
    }

    fn move_up(&mut self) {
        let (line_starts, line_idx, col) = line_state(&self.value, self.cursor);
        if line_idx == 0 {
            return;
        }
        let target_start = line_starts[line_idx - 1];
        self.cursor = index_at_col(&self.value, target_start, col);
    }

    fn move_down(&mut self) {
        let (line_starts, line_idx, col) = line_state(&self.value, self.cursor);
        if line_idx + 1 >= line_starts.len() {
            return;
        }
        let target_start = line_starts[line_idx + 1];
        self.cursor = index_at_col(&self.value, target_start, col);
    }

    fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let prev = prev_char(self.cursor, &self.value);
        self.value.drain(prev..self.cursor);
        self.cursor = prev;
    }

    fn insert_char(&mut self, ch: char) {
        self.value.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
    }

    fn with_caret(&self) -> String {
        let mut text = self.value.clone();
        text.insert_str(self.cursor, "▌");
        text
    }
}

impl Form {
    fn new(kind: FormKind) -> Self {
        let entry = |label, multiline| FormEntry {
            label,
            value: FieldValue::new(""),
            multiline,
        };
        let fields = match kind {
            FormKind::Cycle => vec![
                entry("Last period start (YYYY-MM-DD)", false),
                entry("Average cycle length (days)", false),
                entry("Period length (days)", false),
            ],
            FormKind::Journal => vec![entry("Title", false), entry("Body", true)],
            FormKind::Reminder => vec![
                entry("Reminder", false),
                entry("When (YYYY-MM-DD HH:MM)", false),
            ],
            FormKind::Contact => vec![
                entry("Name", false),
                entry("Email", false),
                entry("Message", true),
            ],
        };
        Form {
            kind,
            fields,
            active: 0,
        }
    }

    fn title(&self) -> &'static str {
        match self.kind {
            FormKind::Cycle => "Log Cycle",
            FormKind::Journal => "New Journal Entry",
            FormKind::Reminder => "New Reminder",
            FormKind::Contact => "Contact Us",
        }
    }

    fn value(&self, idx: usize) -> &str {
        self.fields
            .get(idx)
            .map(|f| f.value.value.as_str())
            .unwrap_or_default()
    }

    fn next_field(&mut self) {
        self.active = (self.active + 1) % self.fields.len();
    }

    fn prev_field(&mut self) {
        self.active = (self.active + self.fields.len() - 1) % self.fields.len();
    }

    fn active_entry_mut(&mut self) -> &mut FormEntry {
        &mut self.fields[self.active]
    }
}

impl App {
    fn new(tracker: Tracker) -> Self {
        let status = format!(
            "Loaded {} store from {}",
            tracker.location().scope.label(),
            tracker.location().dir.display()
        );
        App {
            tracker,
            tab: Tab::Tracker,
            mode: Mode::Normal,
            status,
            last_save: Instant::now(),
            prediction: None,
            hearts: HeartField::default(),
            faq: Accordion::default(),
            faq_idx: 0,
        }
    }

    /// Draws, then yields to the runtime for one frame so reminder timers can
    /// fire, then drains whatever keys arrived meanwhile.
    async fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    ) -> Result<()> {
        let mut frames = tokio::time::interval(FRAME);
        loop {
            terminal.draw(|f| self.draw(f))?;
            frames.tick().await;
            self.hearts.tick();
            while event::poll(Duration::ZERO)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key).await? {
                        return Ok(());
                    }
                }
            }
        }
    }

    async fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        match self.mode {
            Mode::Normal => self.handle_normal_key(key),
            Mode::Editing(_) => self.handle_form_key(key),
            Mode::Confirm(confirmation) => self.handle_confirm_key(confirmation, key).await,
            Mode::Alert { .. } => {
                self.handle_alert_key(key);
                Ok(false)
            }
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Tab | KeyCode::Right => self.set_tab(self.tab.shifted(1)),
            KeyCode::BackTab | KeyCode::Left => self.set_tab(self.tab.shifted(-1)),
            KeyCode::Char('p') => {
                self.mode = Mode::Confirm(Confirmation::EnableNotifications);
            }
            _ => match self.tab {
                Tab::Tracker => self.handle_tracker_key(key),
                Tab::Journal => self.handle_list_key(key, FormKind::Journal, Namespace::Journal),
                Tab::Reminders => {
                    self.handle_list_key(key, FormKind::Reminder, Namespace::Reminders)
                }
                Tab::Faq => self.handle_faq_key(key),
                Tab::Contact => {
                    if matches!(key.code, KeyCode::Char('n') | KeyCode::Enter) {
                        self.open_form(FormKind::Contact);
                    }
                }
            },
        }
        Ok(false)
    }

    fn handle_tracker_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('n') => self.open_form(FormKind::Cycle),
            KeyCode::Char('c') => self.mode = Mode::Confirm(Confirmation::Clear(Namespace::Cycles)),
            KeyCode::Char('3') => self.remind_before(3),
            KeyCode::Char('1') => self.remind_before(1),
            _ => {}
        }
    }

    fn handle_list_key(&mut self, key: KeyEvent, form: FormKind, namespace: Namespace) {
        match key.code {
            KeyCode::Char('n') => self.open_form(form),
            KeyCode::Char('c') => self.mode = Mode::Confirm(Confirmation::Clear(namespace)),
            _ => {}
        }
    }

    fn handle_faq_key(&mut self, key: KeyEvent) {
        let len = self.faq.items().len();
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.faq_idx = self.faq_idx.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => {
                self.faq_idx = (self.faq_idx + 1).min(len.saturating_sub(1))
            }
            KeyCode::Enter | KeyCode::Char(' ') => self.faq.toggle(self.faq_idx),
            _ => {}
        }
    }

    fn handle_form_key(&mut self, key: KeyEvent) -> Result<bool> {
        let Mode::Editing(mut form) = std::mem::replace(&mut self.mode, Mode::Normal) else {
            return Ok(false);
        };
        let control = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => {
                self.status = "Canceled".into();
                return Ok(false);
            }
            KeyCode::Tab => form.next_field(),
            KeyCode::BackTab => form.prev_field(),
            KeyCode::Left => form.active_entry_mut().value.move_left(),
            KeyCode::Right => form.active_entry_mut().value.move_right(),
            KeyCode::Up => form.active_entry_mut().value.move_up(),
            KeyCode::Down => form.active_entry_mut().value.move_down(),
            KeyCode::Char('s') if control => return self.submit(form),
            KeyCode::Enter => {
                if form.active_entry_mut().multiline && !control {
                    form.active_entry_mut().value.insert_char('\n');
                } else {
                    return self.submit(form);
                }
            }
            KeyCode::Backspace => form.active_entry_mut().value.backspace(),
            KeyCode::Char(c) => {
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
                {
                    form.active_entry_mut().value.insert_char(c);
                }
            }
            _ => {}
        }
        self.mode = Mode::Editing(form);
        Ok(false)
    }

    async fn handle_confirm_key(
        &mut self,
        confirmation: Confirmation,
        key: KeyEvent,
    ) -> Result<bool> {
        let accepted = match key.code {
            KeyCode::Char('y') | KeyCode::Enter => true,
            KeyCode::Char('n') | KeyCode::Esc => false,
            _ => return Ok(false),
        };
        self.mode = Mode::Normal;
        match confirmation {
            Confirmation::Clear(namespace) => {
                if !accepted {
                    self.status = "Clear canceled".into();
                    return Ok(false);
                }
                if let Err(err) = self.tracker.clear(namespace) {
                    self.status = format!("Clear failed: {:#}", err);
                    return Ok(false);
                }
                if namespace == Namespace::Cycles {
                    self.prediction = None;
                }
                self.saved(format!("Cleared {}", namespace.key()));
            }
            Confirmation::EnableNotifications => {
                let settings_path = self.tracker.location().settings_path();
                let outcome = notify::request_permission(
                    self.tracker.notifier().as_ref(),
                    &settings_path,
                    async move { Ok(accepted) },
                )
                .await;
                match outcome {
                    Ok(Permission::Granted) => self.status = "Notifications enabled".into(),
                    Ok(_) => self.alert(
                        "Notifications are disabled. Press p to enable them later.".into(),
                        None,
                    ),
                    Err(err) => self.alert(format!("{:#}", err), None),
                }
            }
        }
        Ok(false)
    }

    fn handle_alert_key(&mut self, key: KeyEvent) {
        if !matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
            return;
        }
        if let Mode::Alert { resume, .. } = std::mem::replace(&mut self.mode, Mode::Normal) {
            if let Some(form) = resume {
                self.mode = Mode::Editing(form);
            }
        }
    }

    fn submit(&mut self, form: Form) -> Result<bool> {
        let now = Utc::now();
        let result = match form.kind {
            FormKind::Cycle => self
                .tracker
                .submit_cycle(form.value(0), form.value(1), form.value(2), now)
                .map(|submission| {
                    self.prediction = Some(submission.prediction);
                    if submission.reminder_scheduled {
                        "Saved cycle; reminder set for the day before".to_string()
                    } else {
                        "Saved cycle".to_string()
                    }
                }),
            FormKind::Journal => self
                .tracker
                .submit_journal(form.value(0), form.value(1), now)
                .map(|_| "Saved journal entry".to_string()),
            FormKind::Reminder => self
                .tracker
                .submit_reminder(form.value(0), form.value(1), now)
                .map(|notice| notice.message().to_string()),
            FormKind::Contact => {
                let mut contact = ContactForm {
                    name: form.value(0).to_string(),
                    email: form.value(1).to_string(),
                    message: form.value(2).to_string(),
                };
                self.status = contact.submit().to_string();
                return Ok(false);
            }
        };
        match result {
            Ok(message) if form.kind == FormKind::Reminder => {
                self.last_save = Instant::now();
                self.alert(message, None);
            }
            Ok(message) => self.saved(message),
            Err(SubmitError::Invalid(err)) => self.alert(err.to_string(), Some(form)),
            Err(SubmitError::Store(err)) => {
                self.status = format!("Could not save: {:#}", err);
                self.mode = Mode::Editing(form);
            }
        }
        Ok(false)
    }

    fn remind_before(&mut self, days: u32) {
        match self.tracker.remind_before(days) {
            Ok(true) => self.alert(
                format!(
                    "Reminder scheduled for ~{} day(s) before the expected start.",
                    days
                ),
                None,
            ),
            Ok(false) => self.alert(
                "That time has already passed; nothing scheduled.".into(),
                None,
            ),
            Err(err) => self.alert(err.to_string(), None),
        }
    }

    fn open_form(&mut self, kind: FormKind) {
        self.mode = Mode::Editing(Form::new(kind));
        self.status = FORM_HELP.into();
    }

    fn alert(&mut self, message: String, resume: Option<Form>) {
        self.mode = Mode::Alert { message, resume };
    }

    fn saved(&mut self, message: impl Into<String>) {
        self.last_save = Instant::now();
        self.status = message.into();
    }

    fn set_tab(&mut self, tab: Tab) {
        if self.tab != tab {
            self.tab = tab;
            self.status = format!("Switched to {}", tab.label());
        }
    }

    fn draw(&mut self, f: &mut ratatui::Frame<'_>) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Min(8),
                Constraint::Length(4),
            ])
            .split(f.size());

        self.draw_header(f, layout[0]);
        match self.tab {
            Tab::Tracker => self.draw_tracker(f, layout[1]),
            Tab::Journal => {
                draw_fragments(f, layout[1], "Journal", &self.tracker.journal_fragments())
            }
            Tab::Reminders => draw_fragments(
                f,
                layout[1],
                "Reminders",
                &self.tracker.reminder_fragments(),
            ),
            Tab::Faq => self.draw_faq(f, layout[1]),
            Tab::Contact => self.draw_contact(f, layout[1]),
        }
        self.draw_footer(f, layout[2]);

        match &self.mode {
            Mode::Editing(form) => draw_form(f, form),
            Mode::Confirm(confirmation) => draw_confirm(f, *confirmation),
            Mode::Alert { message, .. } => draw_alert(f, message),
            Mode::Normal => {}
        }
    }

    fn draw_header(&mut self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let sky = Rect {
            height: area.height.saturating_sub(1),
            ..area
        };
        self.hearts.resize(sky.width, sky.height);
        let mut rows: Vec<Vec<Span<'static>>> = (0..sky.height)
            .map(|_| (0..sky.width).map(|_| Span::raw(" ")).collect())
            .collect();
        for (x, y, heart) in self.hearts.visible() {
            let (r, g, b) = heart.rgb();
            if let Some(cell) = rows
                .get_mut(y as usize)
                .and_then(|row| row.get_mut(x as usize))
            {
                *cell = Span::styled(
                    heart.glyph().to_string(),
                    Style::default().fg(Color::Rgb(r, g, b)),
                );
            }
        }
        let background = Paragraph::new(rows.into_iter().map(Line::from).collect::<Vec<_>>());
        f.render_widget(background, sky);

        let mut spans = vec![Span::styled(
            " bloom ",
            Style::default()
                .fg(Color::LightMagenta)
                .add_modifier(Modifier::BOLD),
        )];
        for tab in TABS {
            let style = if tab == self.tab {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::LightMagenta)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            spans.push(Span::raw(" "));
            spans.push(Span::styled(format!(" {} ", tab.label()), style));
        }
        spans.push(Span::raw(" "));
        let title = Line::from(spans);
        let width = (title.width() as u16).min(area.width);
        let title_area = Rect {
            x: area.x + (area.width - width) / 2,
            y: area.y + sky.height / 2,
            width,
            height: 1,
        };
        f.render_widget(Clear, title_area);
        f.render_widget(Paragraph::new(title), title_area);

        let rule = Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(Color::DarkGray));
        f.render_widget(
            rule,
            Rect {
                y: area.y + sky.height,
                height: 1,
                ..area
            },
        );
    }

    fn draw_tracker(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(area);

        let mut lines: Vec<Line> = match &self.prediction {
            Some(prediction) => render::render_prediction(prediction)
                .into_iter()
                .map(|l| Line::from(Span::styled(l, Style::default().fg(Color::LightMagenta))))
                .collect(),
            None => vec![Line::from(Span::styled(
                "Press n to log your last period",
                Style::default().fg(Color::Gray),
            ))],
        };
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled("Notifications: ", Style::default().fg(Color::Gray)),
            Span::styled(
                self.tracker.permission().label(),
                Style::default().fg(permission_color(self.tracker.permission())),
            ),
        ]));
        lines.push(Line::from(vec![
            Span::styled("Pending reminders: ", Style::default().fg(Color::Gray)),
            Span::raw(self.tracker.pending_count().to_string()),
        ]));
        let prediction = Paragraph::new(lines).wrap(Wrap { trim: true }).block(
            Block::default()
                .title(Span::styled(
                    "Prediction",
                    Style::default()
                        .fg(Color::LightMagenta)
                        .add_modifier(Modifier::BOLD),
                ))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::LightMagenta)),
        );
        f.render_widget(prediction, columns[0]);

        draw_fragments(f, columns[1], "Saved cycles", &self.tracker.cycle_fragments());
    }

    fn draw_faq(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let width = area.width.saturating_sub(4) as usize;
        let items = self
            .faq
            .items()
            .iter()
            .map(|item| {
                let marker = if item.open { "▾" } else { "▸" };
                let mut lines = vec![Line::from(Span::styled(
                    format!("{} {}", marker, item.question),
                    Style::default().add_modifier(Modifier::BOLD),
                ))];
                if item.open {
                    for chunk in wrap_words(item.answer, width.saturating_sub(2)) {
                        lines.push(Line::from(Span::styled(
                            format!("  {}", chunk),
                            Style::default().fg(Color::Gray),
                        )));
                    }
                }
                ListItem::new(lines)
            })
            .collect::<Vec<_>>();
        let mut state = ListState::default();
        state.select(Some(self.faq_idx));
        let list = List::new(items)
            .block(accent_block("Frequently asked questions"))
            .highlight_style(Style::default().fg(Color::LightMagenta));
        f.render_stateful_widget(list, area, &mut state);
    }

    fn draw_contact(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let body = vec![
            Line::from("Questions, ideas or kind words? Press n to write to us."),
            Line::from(""),
            Line::from(Span::styled(
                "Messages stay on this computer.",
                Style::default().fg(Color::DarkGray),
            )),
        ];
        let paragraph = Paragraph::new(body)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(accent_block("Contact"));
        f.render_widget(paragraph, area);
    }

    fn draw_footer(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Length(2)])
            .split(area);

        let help_bar = Paragraph::new(self.footer_help_line())
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
        f.render_widget(help_bar, rows[0]);

        let bottom = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
            .split(rows[1]);
        let status = Paragraph::new(self.status.clone())
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
        f.render_widget(status, bottom[0]);

        let saved = Paragraph::new(Span::styled(
            format!("saved {}", format_elapsed(self.last_save)),
            Style::default().fg(Color::Gray),
        ))
        .alignment(Alignment::Right)
        .block(
            Block::default()
                .borders(Borders::TOP)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
        f.render_widget(saved, bottom[1]);
    }

    fn footer_help_line(&self) -> Line<'static> {
        let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::LightMagenta));
        let mut spans = vec![
            key("Tab"),
            Span::raw(" switch  "),
            key("p"),
            Span::raw(" notifications  "),
        ];
        match self.tab {
            Tab::Tracker => spans.extend([
                key("n"),
                Span::raw(" log cycle  "),
                key("3/1"),
                Span::raw(" remind days before  "),
                key("c"),
                Span::raw(" clear  "),
            ]),
            Tab::Journal | Tab::Reminders => spans.extend([
                key("n"),
                Span::raw(" new  "),
                key("c"),
                Span::raw(" clear  "),
            ]),
            Tab::Faq => spans.extend([
                key("↑↓"),
                Span::raw(" select  "),
                key("Enter"),
                Span::raw(" open/close  "),
            ]),
            Tab::Contact => spans.extend([key("n"), Span::raw(" write  ")]),
        }
        spans.extend([key("q"), Span::raw(" quit")]);
        Line::from(spans)
    }
}

fn draw_fragments(f: &mut ratatui::Frame<'_>, area: Rect, title: &str, fragments: &[Fragment]) {
    let items = fragments
        .iter()
        .enumerate()
        .map(|(idx, fragment)| {
            let lines = fragment
                .lines
                .iter()
                .enumerate()
                .map(|(n, line)| {
                    let style = if n == 0 {
                        Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
                    } else {
                        Style::default().fg(Color::Gray)
                    };
                    Line::from(Span::styled(line.clone(), style))
                })
                .collect::<Vec<_>>();
            let mut item = ListItem::new(lines);
            if idx % 2 == 1 {
                item = item.style(Style::default().bg(Color::Rgb(28, 22, 30)));
            }
            item
        })
        .collect::<Vec<_>>();
    let list = List::new(items).block(accent_block(title));
    f.render_widget(list, area);
}

fn draw_form(f: &mut ratatui::Frame<'_>, form: &Form) {
    let area = centered_rect(70, 60, f.size());
    let mut lines = Vec::new();
    for (idx, entry) in form.fields.iter().enumerate() {
        lines.extend(field_lines(entry.label, &entry.value, idx == form.active));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Enter or Ctrl+S to save • Esc to cancel • Tab/Shift-Tab to move",
        Style::default().fg(Color::Gray),
    )));
    let dialog = Paragraph::new(lines)
        .block(
            Block::default()
                .title(Span::styled(
                    form.title(),
                    Style::default()
                        .fg(Color::LightMagenta)
                        .add_modifier(Modifier::BOLD),
                ))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::LightMagenta)),
        )
        .wrap(Wrap { trim: true });
    f.render_widget(Clear, area);
    f.render_widget(dialog, area);
}

fn draw_confirm(f: &mut ratatui::Frame<'_>, confirmation: Confirmation) {
    let area = centered_rect(50, 30, f.size());
    let (title, question, color) = match confirmation {
        Confirmation::Clear(namespace) => (
            "Confirm Clear",
            format!("Clear all saved {}? This cannot be undone.", namespace.key()),
            Color::LightRed,
        ),
        Confirmation::EnableNotifications => (
            "Notifications",
            "Allow bloom to show desktop notifications?".to_string(),
            Color::LightMagenta,
        ),
    };
    let body = vec![
        Line::from(Span::styled(
            question,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("Press y to confirm, n or Esc to cancel"),
    ];
    let dialog = Paragraph::new(body)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .title(Span::styled(
                    title,
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color)),
        );
    f.render_widget(Clear, area);
    f.render_widget(dialog, area);
}

fn draw_alert(f: &mut ratatui::Frame<'_>, message: &str) {
    let area = centered_rect(50, 25, f.size());
    let body = vec![
        Line::from(Span::styled(
            message.to_string(),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("Press Enter to continue"),
    ];
    let dialog = Paragraph::new(body)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow)),
        );
    f.render_widget(Clear, area);
    f.render_widget(dialog, area);
}

fn accent_block(title: &str) -> Block<'static> {
    Block::default()
        .title(Span::styled(
            title.to_string(),
            Style::default()
                .fg(Color::LightMagenta)
                .add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta))
}

fn permission_color(permission: Permission) -> Color {
    match permission {
        Permission::Granted => Color::LightGreen,
        Permission::Denied => Color::LightRed,
        Permission::Default => Color::Yellow,
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn teardown_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

fn field_lines(label: &str, field: &FieldValue, active: bool) -> Vec<Line<'static>> {
    let label_style = Style::default()
        .fg(Color::Gray)
        .add_modifier(Modifier::BOLD | Modifier::DIM);
    let value_style = Style::default().fg(if active { Color::LightMagenta } else { Color::White });
    let prefix = format!("{}: ", label);
    let spacer = " ".repeat(prefix.chars().count());
    let text = if active {
        field.with_caret()
    } else {
        field.value.clone()
    };
    text.split('\n')
        .enumerate()
        .map(|(idx, line)| {
            Line::from(vec![
                Span::styled(
                    if idx == 0 {
                        prefix.clone()
                    } else {
                        spacer.clone()
                    },
                    label_style,
                ),
                Span::styled(line.to_string(), value_style),
            ])
        })
        .collect()
}

fn wrap_words(text: &str, width: usize) -> Vec<String> {
    let width = width.max(10);
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn format_elapsed(last: Instant) -> String {
    let secs = last.elapsed().as_secs();
    if secs < 60 {
        format!("{}s ago", secs)
    } else if secs < 3600 {
        format!("{}m ago", secs / 60)
    } else {
        format!("{}h ago", secs / 3600)
    }
}

fn prev_char(cursor: usize, text: &str) -> usize {
    text[..cursor]
        .char_indices()
        .next_back()
        .map(|(idx, _)| idx)
        .unwrap_or(0)
}

fn next_char(cursor: usize, text: &str) -> usize {
    text[cursor..]
        .chars()
        .next()
        .map(|ch| cursor + ch.len_utf8())
        .unwrap_or(text.len())
}

fn line_state(text: &str, cursor: usize) -> (Vec<usize>, usize, usize) {
    let mut starts = vec![0];
    for (idx, ch) in text.char_indices() {
        if ch == '\n' {
            starts.push(idx + 1);
        }
    }
    let line_idx = starts
        .iter()
        .rposition(|start| *start <= cursor)
        .unwrap_or(0);
    let col = text[starts[line_idx]..cursor].chars().count();
    (starts, line_idx, col)
}

fn index_at_col(text: &str, start: usize, target_col: usize) -> usize {
    let slice = &text[start..];
    let limit = slice.find('\n').unwrap_or(slice.len());
    slice[..limit]
        .char_indices()
        .nth(target_col)
        .map(|(idx, _)| start + idx)
        .unwrap_or(start + limit)
}
