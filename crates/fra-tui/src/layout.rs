// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Screen geometry shared by the renderer and mouse hit-testing.

use fra_app::MenuAction;
use ratatui::layout::{Constraint, Direction, Layout, Rect};

pub(crate) const ACTIONS_WIDTH: u16 = 9;
pub(crate) const MENU_WIDTH: u16 = 20;
pub(crate) const MENU_HEIGHT: u16 = MenuAction::ALL.len() as u16 + 2;

pub(crate) const COLUMN_WIDTHS: [Constraint; 7] = [
    Constraint::Length(5),
    Constraint::Fill(1),
    Constraint::Length(12),
    Constraint::Length(12),
    Constraint::Length(11),
    Constraint::Length(11),
    Constraint::Length(ACTIONS_WIDTH),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ScreenLayout {
    pub header: Rect,
    pub banner: Rect,
    pub table: Rect,
    pub status: Rect,
}

impl ScreenLayout {
    pub fn new(area: Rect, show_banner: bool) -> Self {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(if show_banner { 3 } else { 0 }),
                Constraint::Min(3),
                Constraint::Length(3),
            ])
            .split(area);
        Self {
            header: chunks[0],
            banner: chunks[1],
            table: chunks[2],
            status: chunks[3],
        }
    }

    /// Table area without its border.
    pub fn table_inner(&self) -> Rect {
        inner(self.table)
    }

    /// Number of data rows that fit below the header row.
    pub fn visible_rows(&self) -> usize {
        usize::from(self.table_inner().height.saturating_sub(1))
    }

    /// Record index under a screen cell, given the scroll offset.
    pub fn row_at(&self, offset: usize, column: u16, row: u16) -> Option<usize> {
        let inner = self.table_inner();
        let first = inner.y.saturating_add(1);
        if !contains(inner, column, row) || row < first {
            return None;
        }
        Some(offset + usize::from(row - first))
    }

    /// Whether a screen cell falls in the actions column.
    pub fn in_actions_column(&self, column: u16) -> bool {
        let inner = self.table_inner();
        column >= inner.right().saturating_sub(ACTIONS_WIDTH) && column < inner.right()
    }

    /// Popup rectangle for the menu of the record drawn at `visible_index`.
    pub fn menu_rect(&self, screen: Rect, visible_index: usize) -> Rect {
        let inner = self.table_inner();
        let row_y = inner
            .y
            .saturating_add(1)
            .saturating_add(u16::try_from(visible_index).unwrap_or(u16::MAX));
        let width = MENU_WIDTH.min(screen.width);
        let x = inner.right().saturating_sub(width);
        let below = row_y.saturating_add(1);
        let y = if below.saturating_add(MENU_HEIGHT) <= screen.bottom() {
            below
        } else {
            row_y.saturating_sub(MENU_HEIGHT)
        };
        Rect {
            x,
            y,
            width,
            height: MENU_HEIGHT.min(screen.height),
        }
    }

    /// Menu entry under a screen cell inside `menu`.
    pub fn menu_action_at(menu: Rect, column: u16, row: u16) -> Option<MenuAction> {
        let inner = inner(menu);
        if !contains(inner, column, row) {
            return None;
        }
        MenuAction::ALL
            .get(usize::from(row - inner.y))
            .copied()
    }
}

/// First record index drawn so that `cursor` stays visible.
pub(crate) fn scroll_offset(cursor: usize, visible_rows: usize) -> usize {
    if visible_rows == 0 {
        return cursor;
    }
    cursor.saturating_sub(visible_rows - 1)
}

pub(crate) fn contains(rect: Rect, column: u16, row: u16) -> bool {
    column >= rect.x && column < rect.right() && row >= rect.y && row < rect.bottom()
}

pub(crate) fn inner(area: Rect) -> Rect {
    Rect {
        x: area.x.saturating_add(1),
        y: area.y.saturating_add(1),
        width: area.width.saturating_sub(2),
        height: area.height.saturating_sub(2),
    }
}

pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
