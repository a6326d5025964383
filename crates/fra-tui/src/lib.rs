// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod layout;

use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use fra_app::{
    AddModal, DeleteModal, DraftField, MenuAction, MenuCommand, Modal, NoticeLevel, PanelCommand,
    PanelEffect, PanelState, PriceBackend, PriceRecord, PriceRecordId, UpdateModal, format_date,
    format_optional_price,
};
use layout::{COLUMN_WIDTHS, ScreenLayout, centered_rect, scroll_offset};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

const TITLE: &str = "FRA base prices";
const ACTIONS_LABEL: &str = "actions";
const ACTIONS_TRIGGER: &str = "[...]";
const PRICE_INPUT_CHARS: &str = "0123456789.,$-";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    Command(PanelCommand),
}

/// What the cursor is over, as far as the action menu cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Hover {
    #[default]
    Elsewhere,
    Trigger(PriceRecordId),
    Menu,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum KeyOutcome {
    Ignored,
    Quit,
    Cursor,
    Dispatch(Vec<PanelCommand>),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct ViewData {
    cursor: usize,
    hover: Hover,
    screen: Rect,
}

impl ViewData {
    fn clamp_cursor(&mut self, len: usize) {
        self.cursor = self.cursor.min(len.saturating_sub(1));
    }

    fn layout(&self, state: &PanelState) -> ScreenLayout {
        ScreenLayout::new(self.screen, state.error().is_some())
    }
}

/// Runs the panel until the user quits. Network effects run on worker
/// threads against clones of `backend`; their results come back through
/// the internal channel as commands.
pub fn run_app<B>(state: &mut PanelState, backend: B) -> Result<()>
where
    B: PriceBackend + Clone + Send + 'static,
{
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen, EnableMouseCapture)
        .context("enter alternate screen")?;

    let term_backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(term_backend).context("create terminal")?;

    let mut view_data = ViewData::default();
    let (internal_tx, internal_rx) = mpsc::channel();

    dispatch(state, &backend, &internal_tx, PanelCommand::Mount);

    let mut result = Ok(());
    loop {
        process_internal_events(state, &mut view_data, &backend, &internal_tx, &internal_rx);

        if let Err(error) = terminal.draw(|frame| {
            view_data.screen = frame.area();
            render(frame, state, &view_data);
        }) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = match event::poll(Duration::from_millis(120)).context("poll event") {
            Ok(has_event) => has_event,
            Err(error) => {
                result = Err(error);
                break;
            }
        };
        if !has_event {
            continue;
        }
        match event::read().context("read event") {
            Ok(Event::Key(key)) if key.kind != KeyEventKind::Release => {
                match handle_key_event(state, &mut view_data, key) {
                    KeyOutcome::Quit => break,
                    KeyOutcome::Dispatch(commands) => {
                        for command in commands {
                            dispatch(state, &backend, &internal_tx, command);
                        }
                    }
                    KeyOutcome::Ignored | KeyOutcome::Cursor => {}
                }
            }
            Ok(Event::Mouse(mouse)) => {
                for command in handle_mouse_event(state, &mut view_data, mouse) {
                    dispatch(state, &backend, &internal_tx, command);
                }
            }
            Ok(_) => {}
            Err(error) => {
                result = Err(error);
                break;
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(
        io::stdout(),
        DisableMouseCapture,
        terminal::LeaveAlternateScreen
    )
    .context("leave alternate screen")?;
    result
}

fn process_internal_events<B>(
    state: &mut PanelState,
    view_data: &mut ViewData,
    backend: &B,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) where
    B: PriceBackend + Clone + Send + 'static,
{
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::Command(command) => dispatch(state, backend, tx, command),
        }
    }
    view_data.clamp_cursor(state.records().len());
}

fn dispatch<B>(
    state: &mut PanelState,
    backend: &B,
    tx: &Sender<InternalEvent>,
    command: PanelCommand,
) where
    B: PriceBackend + Clone + Send + 'static,
{
    for effect in state.dispatch(command) {
        spawn_effect(backend, tx, effect);
    }
}

fn spawn_effect<B>(backend: &B, tx: &Sender<InternalEvent>, effect: PanelEffect)
where
    B: PriceBackend + Clone + Send + 'static,
{
    let sender = tx.clone();
    if let Some((delay, command)) = effect.timer_command() {
        thread::spawn(move || {
            thread::sleep(delay);
            let _ = sender.send(InternalEvent::Command(command));
        });
        return;
    }

    let mut backend = backend.clone();
    debug!("spawning request worker");
    thread::spawn(move || {
        if let Some(command) = fra_app::execute(&mut backend, &effect)
            && sender.send(InternalEvent::Command(command)).is_err()
        {
            warn!("panel closed before request finished");
        }
    });
}

fn selected_record<'a>(state: &'a PanelState, view_data: &ViewData) -> Option<&'a PriceRecord> {
    state.records().get(view_data.cursor)
}

fn handle_key_event(state: &PanelState, view_data: &mut ViewData, key: KeyEvent) -> KeyOutcome {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return KeyOutcome::Quit;
    }

    match state.modal() {
        Modal::None => handle_table_key(state, view_data, key),
        Modal::Details(_) => match key.code {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => {
                KeyOutcome::Dispatch(vec![PanelCommand::CloseModal])
            }
            _ => KeyOutcome::Ignored,
        },
        Modal::Update(modal) => handle_price_form_key(&modal.draft, modal.focus, key)
            .unwrap_or(KeyOutcome::Ignored),
        Modal::Add(modal) => handle_add_key(modal, key),
        Modal::Delete(_) => match key.code {
            KeyCode::Char('y') | KeyCode::Enter => KeyOutcome::Dispatch(vec![PanelCommand::Submit]),
            KeyCode::Char('n') | KeyCode::Esc => {
                KeyOutcome::Dispatch(vec![PanelCommand::CloseModal])
            }
            _ => KeyOutcome::Ignored,
        },
    }
}

fn handle_table_key(state: &PanelState, view_data: &mut ViewData, key: KeyEvent) -> KeyOutcome {
    let len = state.records().len();
    let selected = selected_record(state, view_data).map(|record| record.id);

    if state.menu().open_record().is_some() {
        if let KeyCode::Char(ch) = key.code
            && let Some(action) = MenuAction::ALL
                .into_iter()
                .find(|action| action.hotkey() == ch)
        {
            return KeyOutcome::Dispatch(vec![PanelCommand::Menu(MenuCommand::Select(action))]);
        }
        if key.code == KeyCode::Esc {
            return KeyOutcome::Dispatch(vec![PanelCommand::Menu(MenuCommand::Dismiss)]);
        }
    }

    match key.code {
        KeyCode::Char('q') => KeyOutcome::Quit,
        KeyCode::Char('j') | KeyCode::Down => {
            if view_data.cursor + 1 < len {
                view_data.cursor += 1;
            }
            close_menu_after_move(state)
        }
        KeyCode::Char('k') | KeyCode::Up => {
            view_data.cursor = view_data.cursor.saturating_sub(1);
            close_menu_after_move(state)
        }
        KeyCode::Char('g') | KeyCode::Home => {
            view_data.cursor = 0;
            close_menu_after_move(state)
        }
        KeyCode::Char('G') | KeyCode::End => {
            view_data.cursor = len.saturating_sub(1);
            close_menu_after_move(state)
        }
        KeyCode::Enter => selected.map_or(KeyOutcome::Ignored, |id| {
            KeyOutcome::Dispatch(vec![PanelCommand::OpenDetails(id)])
        }),
        KeyCode::Char('m') => selected.map_or(KeyOutcome::Ignored, |id| {
            KeyOutcome::Dispatch(vec![PanelCommand::Menu(MenuCommand::Toggle(id))])
        }),
        KeyCode::Char('a') => KeyOutcome::Dispatch(vec![PanelCommand::OpenAdd]),
        KeyCode::Char('r') => KeyOutcome::Dispatch(vec![PanelCommand::Refresh]),
        _ => KeyOutcome::Ignored,
    }
}

fn close_menu_after_move(state: &PanelState) -> KeyOutcome {
    if state.menu().open_record().is_some() {
        KeyOutcome::Dispatch(vec![PanelCommand::Menu(MenuCommand::Dismiss)])
    } else {
        KeyOutcome::Cursor
    }
}

fn handle_add_key(modal: &AddModal, key: KeyEvent) -> KeyOutcome {
    let step: isize = match key.code {
        KeyCode::Left => -1,
        KeyCode::Right => 1,
        _ => {
            return handle_price_form_key(&modal.draft.prices, modal.focus, key)
                .unwrap_or(KeyOutcome::Ignored);
        }
    };
    if modal.choices.is_empty() {
        return KeyOutcome::Ignored;
    }
    let len = modal.choices.len() as isize;
    let current = modal
        .draft
        .property_type_id
        .and_then(|id| modal.choices.iter().position(|choice| choice.id == id));
    let next = match current {
        Some(index) => (index as isize + step).rem_euclid(len),
        None if step > 0 => 0,
        None => len - 1,
    };
    KeyOutcome::Dispatch(vec![PanelCommand::SelectPropertyType(Some(
        modal.choices[next as usize].id,
    ))])
}

fn handle_price_form_key(
    draft: &fra_app::PriceDraft,
    focus: DraftField,
    key: KeyEvent,
) -> Option<KeyOutcome> {
    let command = match key.code {
        KeyCode::Esc => PanelCommand::CloseModal,
        KeyCode::Enter => PanelCommand::Submit,
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Down | KeyCode::Up => {
            PanelCommand::FocusNextField
        }
        KeyCode::Backspace => {
            let mut text = draft.field(focus).to_owned();
            text.pop()?;
            PanelCommand::EditPrice { field: focus, text }
        }
        KeyCode::Char(ch) if PRICE_INPUT_CHARS.contains(ch) => {
            let mut text = draft.field(focus).to_owned();
            text.push(ch);
            PanelCommand::EditPrice { field: focus, text }
        }
        _ => return None,
    };
    Some(KeyOutcome::Dispatch(vec![command]))
}

fn handle_mouse_event(
    state: &PanelState,
    view_data: &mut ViewData,
    mouse: MouseEvent,
) -> Vec<PanelCommand> {
    if state.modal().is_open() {
        return Vec::new();
    }
    let layout = view_data.layout(state);
    let offset = scroll_offset(view_data.cursor, layout.visible_rows());
    let menu = open_menu_rect(state, view_data, &layout);

    match mouse.kind {
        MouseEventKind::Moved => {
            let next = hover_at(state, &layout, menu, offset, mouse.column, mouse.row);
            let previous = std::mem::replace(&mut view_data.hover, next);
            hover_commands(previous, next)
                .into_iter()
                .map(PanelCommand::Menu)
                .collect()
        }
        MouseEventKind::Down(MouseButton::Left) => {
            if let Some(menu) = menu
                && let Some(action) = ScreenLayout::menu_action_at(menu, mouse.column, mouse.row)
            {
                return vec![PanelCommand::Menu(MenuCommand::Select(action))];
            }
            let Some(index) = layout.row_at(offset, mouse.column, mouse.row) else {
                return Vec::new();
            };
            let Some(record) = state.records().get(index) else {
                return Vec::new();
            };
            view_data.cursor = index;
            if layout.in_actions_column(mouse.column) {
                vec![PanelCommand::Menu(MenuCommand::Toggle(record.id))]
            } else {
                Vec::new()
            }
        }
        _ => Vec::new(),
    }
}

fn open_menu_rect(state: &PanelState, view_data: &ViewData, layout: &ScreenLayout) -> Option<Rect> {
    let open = state.menu().open_record()?;
    let index = state.records().iter().position(|record| record.id == open)?;
    let offset = scroll_offset(view_data.cursor, layout.visible_rows());
    let visible_index = index.checked_sub(offset)?;
    if visible_index >= layout.visible_rows() {
        return None;
    }
    Some(layout.menu_rect(view_data.screen, visible_index))
}

fn hover_at(
    state: &PanelState,
    layout: &ScreenLayout,
    menu: Option<Rect>,
    offset: usize,
    column: u16,
    row: u16,
) -> Hover {
    if menu.is_some_and(|menu| layout::contains(menu, column, row)) {
        return Hover::Menu;
    }
    if !layout.in_actions_column(column) {
        return Hover::Elsewhere;
    }
    layout
        .row_at(offset, column, row)
        .and_then(|index| state.records().get(index))
        .map_or(Hover::Elsewhere, |record| Hover::Trigger(record.id))
}

/// Menu commands for the pointer moving from `previous` to `next`.
fn hover_commands(previous: Hover, next: Hover) -> Vec<MenuCommand> {
    if previous == next {
        return Vec::new();
    }
    let mut commands = Vec::with_capacity(2);
    match previous {
        Hover::Trigger(_) => commands.push(MenuCommand::LeaveTrigger),
        Hover::Menu => commands.push(MenuCommand::LeaveMenu),
        Hover::Elsewhere => {}
    }
    match next {
        Hover::Trigger(id) => commands.push(MenuCommand::EnterTrigger(id)),
        Hover::Menu => commands.push(MenuCommand::EnterMenu),
        Hover::Elsewhere => {}
    }
    commands
}

fn render(frame: &mut ratatui::Frame<'_>, state: &PanelState, view_data: &ViewData) {
    let layout = view_data.layout(state);

    let header = Paragraph::new(render_header_text(state))
        .block(Block::default().title(render_title(state)).borders(Borders::ALL));
    frame.render_widget(header, layout.header);

    if let Some(banner) = render_error_banner_text(state) {
        let widget = Paragraph::new(banner)
            .style(Style::default().fg(Color::Red))
            .block(Block::default().borders(Borders::ALL).title("error"));
        frame.render_widget(widget, layout.banner);
    }

    render_table(frame, &layout, state, view_data);

    let status_style = match state.notice().map(|notice| notice.level) {
        Some(NoticeLevel::Success) => Style::default().fg(Color::Green),
        Some(NoticeLevel::Error) => Style::default().fg(Color::Red),
        None => Style::default().fg(Color::Yellow),
    };
    let status = Paragraph::new(render_status_text(state))
        .style(status_style)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, layout.status);

    if let Some(menu) = open_menu_rect(state, view_data, &layout) {
        frame.render_widget(Clear, menu);
        let widget = Paragraph::new(render_menu_text()).block(
            Block::default()
                .borders(Borders::ALL)
                .style(Style::default().fg(Color::Cyan)),
        );
        frame.render_widget(widget, menu);
    }

    let (title, body, percent_y) = match state.modal() {
        Modal::None => return,
        Modal::Details(record) => ("details", render_details_text(record), 60),
        Modal::Update(modal) => ("update FRA base price", render_update_text(modal), 50),
        Modal::Add(modal) => ("add FRA base price", render_add_text(modal), 55),
        Modal::Delete(modal) => ("delete FRA base price", render_delete_text(modal), 40),
    };
    let area = centered_rect(60, percent_y, frame.area());
    frame.render_widget(Clear, area);
    let widget = Paragraph::new(body)
        .wrap(Wrap { trim: false })
        .block(Block::default().title(title).borders(Borders::ALL));
    frame.render_widget(widget, area);
}

fn render_table(
    frame: &mut ratatui::Frame<'_>,
    layout: &ScreenLayout,
    state: &PanelState,
    view_data: &ViewData,
) {
    let block = Block::default().borders(Borders::ALL);
    if state.records().is_empty() {
        let body = Paragraph::new(render_empty_text(state)).block(block);
        frame.render_widget(body, layout.table);
        return;
    }

    let offset = scroll_offset(view_data.cursor, layout.visible_rows());
    let header = Row::new(
        [
            "id",
            "property type",
            "non-intrusive",
            "intrusive",
            "created",
            "updated",
            ACTIONS_LABEL,
        ]
        .map(Cell::from),
    )
    .style(Style::default().add_modifier(Modifier::BOLD));

    let open = state.menu().open_record();
    let rows = state
        .records()
        .iter()
        .enumerate()
        .skip(offset)
        .take(layout.visible_rows())
        .map(|(index, record)| {
            let mut row = Row::new(table_row_cells(record).map(Cell::from));
            if index == view_data.cursor {
                row = row.style(Style::default().add_modifier(Modifier::REVERSED));
            } else if open == Some(record.id) {
                row = row.style(Style::default().fg(Color::Cyan));
            }
            row
        })
        .collect::<Vec<_>>();

    let table = Table::new(rows, COLUMN_WIDTHS).header(header).block(block);
    frame.render_widget(table, layout.table);
}

fn table_row_cells(record: &PriceRecord) -> [String; 7] {
    [
        record.id.to_string(),
        record.property_type_label(),
        format_optional_price(record.non_intrusive_price.as_ref()),
        format_optional_price(record.intrusive_price.as_ref()),
        format_date(record.created_at),
        format_date(record.updated_at),
        ACTIONS_TRIGGER.to_owned(),
    ]
}

fn render_title(state: &PanelState) -> String {
    if state.is_loading() {
        format!("{TITLE} (loading...)")
    } else {
        TITLE.to_owned()
    }
}

fn render_header_text(state: &PanelState) -> String {
    let caller = state.caller();
    let who = if caller.is_admin {
        "admin".to_owned()
    } else {
        caller
            .professional_id
            .map_or_else(|| "professional".to_owned(), |id| format!("professional #{id}"))
    };
    let count = state.records().len();
    let noun = if count == 1 { "price" } else { "prices" };
    format!("{who} | {count} {noun}")
}

fn render_error_banner_text(state: &PanelState) -> Option<String> {
    state
        .error()
        .map(|error| format!("{error} -- press r to retry"))
}

fn render_empty_text(state: &PanelState) -> String {
    if state.is_loading() {
        "loading FRA base prices...".to_owned()
    } else if state.error().is_some() {
        "no FRA base prices loaded".to_owned()
    } else {
        "no FRA base prices yet -- press a to add one".to_owned()
    }
}

fn render_status_text(state: &PanelState) -> String {
    if let Some(notice) = state.notice() {
        return notice.message.clone();
    }
    if state.is_loading() {
        return "loading...".to_owned();
    }
    if state.menu().open_record().is_some() {
        return MenuAction::ALL
            .iter()
            .map(|action| format!("{} {}", action.hotkey(), action.label()))
            .chain(std::iter::once("esc close".to_owned()))
            .collect::<Vec<_>>()
            .join(" · ");
    }
    "j/k move · enter details · m actions · a add · r refresh · q quit".to_owned()
}

fn render_menu_text() -> String {
    MenuAction::ALL
        .iter()
        .map(|action| format!("{}  {}", action.hotkey(), action.label()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_details_text(record: &PriceRecord) -> String {
    let user = |id: Option<fra_app::UserId>| id.map_or_else(|| "-".to_owned(), |id| format!("#{id}"));
    [
        format!("property type:        {}", record.property_type_label()),
        format!(
            "non-intrusive price:  {}",
            format_optional_price(record.non_intrusive_price.as_ref())
        ),
        format!(
            "intrusive price:      {}",
            format_optional_price(record.intrusive_price.as_ref())
        ),
        format!("professional:         #{}", record.professional_id),
        format!("created by:           {}", user(record.created_by)),
        format!("updated by:           {}", user(record.updated_by)),
        format!("created:              {}", format_date(record.created_at)),
        format!("updated:              {}", format_date(record.updated_at)),
        String::new(),
        "esc close".to_owned(),
    ]
    .join("\n")
}

fn render_price_fields(draft: &fra_app::PriceDraft, focus: DraftField) -> Vec<String> {
    [DraftField::NonIntrusive, DraftField::Intrusive]
        .into_iter()
        .map(|field| {
            let marker = if field == focus { ">" } else { " " };
            let caret = if field == focus { "_" } else { "" };
            format!("{marker} {}: {}{caret}", field.label(), draft.field(field))
        })
        .collect()
}

fn form_footer(submitting: bool, error: Option<&str>, hint: &str) -> Vec<String> {
    let mut lines = vec![String::new()];
    if let Some(error) = error {
        lines.push(format!("error: {error}"));
    }
    lines.push(if submitting {
        "saving...".to_owned()
    } else {
        hint.to_owned()
    });
    lines
}

fn render_update_text(modal: &UpdateModal) -> String {
    let mut lines = vec![
        format!("property type: {}", modal.record.property_type_label()),
        String::new(),
    ];
    lines.extend(render_price_fields(&modal.draft, modal.focus));
    lines.extend(form_footer(
        modal.submitting.is_some(),
        modal.error.as_deref(),
        "enter save · tab next field · esc cancel",
    ));
    lines.join("\n")
}

fn render_add_text(modal: &AddModal) -> String {
    let selected = modal
        .draft
        .property_type_id
        .and_then(|id| modal.choices.iter().find(|choice| choice.id == id));
    let property_type = match selected {
        Some(choice) => format!("< {} >", choice.name),
        None if modal.catalog_request.is_some() => "loading property types...".to_owned(),
        None if modal.choices.is_empty() => "(none available)".to_owned(),
        None => "< choose with ←/→ >".to_owned(),
    };
    let mut lines = vec![format!("property type: {property_type}"), String::new()];
    lines.extend(render_price_fields(&modal.draft.prices, modal.focus));
    lines.extend(form_footer(
        modal.submitting.is_some(),
        modal.error.as_deref(),
        "enter save · tab next field · ←/→ property type · esc cancel",
    ));
    lines.join("\n")
}

fn render_delete_text(modal: &DeleteModal) -> String {
    let record = &modal.record;
    let mut lines = vec![
        format!(
            "delete the {} price ({} / {})?",
            record.property_type_label(),
            format_optional_price(record.non_intrusive_price.as_ref()),
            format_optional_price(record.intrusive_price.as_ref())
        ),
        "this cannot be undone".to_owned(),
    ];
    lines.extend(form_footer(
        modal.submitting.is_some(),
        modal.error.as_deref(),
        "y delete · n cancel",
    ));
    lines.join("\n")
}
