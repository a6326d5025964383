// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::time::Duration;

use crate::PriceRecordId;

pub const MENU_CLOSE_DELAY: Duration = Duration::from_millis(400);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    ViewDetails,
    Update,
    Delete,
}

impl MenuAction {
    pub const ALL: [Self; 3] = [Self::ViewDetails, Self::Update, Self::Delete];

    pub const fn label(self) -> &'static str {
        match self {
            Self::ViewDetails => "view details",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    pub const fn hotkey(self) -> char {
        match self {
            Self::ViewDetails => 'v',
            Self::Update => 'e',
            Self::Delete => 'd',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuCommand {
    EnterTrigger(PriceRecordId),
    LeaveTrigger,
    EnterMenu,
    LeaveMenu,
    Toggle(PriceRecordId),
    Select(MenuAction),
    Dismiss,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuTransition {
    Unchanged,
    Opened(PriceRecordId),
    Closed,
    ScheduleClose { token: u64 },
    Selected {
        record: PriceRecordId,
        action: MenuAction,
    },
}

/// Hover-driven action menu shared by every row.
///
/// One slot holds the open record, so opening a row replaces whatever was
/// open. Leaving the trigger or the menu arms a single pending close; the
/// close only lands if its token is still the armed one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ActionMenu {
    open: Option<PriceRecordId>,
    pending_close: Option<u64>,
    next_token: u64,
}

impl ActionMenu {
    pub const fn open_record(&self) -> Option<PriceRecordId> {
        self.open
    }

    pub const fn close_pending(&self) -> bool {
        self.pending_close.is_some()
    }

    pub fn apply(&mut self, command: MenuCommand) -> MenuTransition {
        match command {
            MenuCommand::EnterTrigger(record) => {
                self.pending_close = None;
                self.open = Some(record);
                MenuTransition::Opened(record)
            }
            MenuCommand::EnterMenu => {
                self.pending_close = None;
                MenuTransition::Unchanged
            }
            MenuCommand::LeaveTrigger | MenuCommand::LeaveMenu => {
                if self.open.is_none() {
                    return MenuTransition::Unchanged;
                }
                let token = self.arm_close();
                MenuTransition::ScheduleClose { token }
            }
            MenuCommand::Toggle(record) => {
                self.pending_close = None;
                if self.open == Some(record) {
                    self.open = None;
                    MenuTransition::Closed
                } else {
                    self.open = Some(record);
                    MenuTransition::Opened(record)
                }
            }
            MenuCommand::Select(action) => {
                let Some(record) = self.open.take() else {
                    return MenuTransition::Unchanged;
                };
                self.pending_close = None;
                MenuTransition::Selected { record, action }
            }
            MenuCommand::Dismiss => {
                self.pending_close = None;
                if self.open.take().is_some() {
                    MenuTransition::Closed
                } else {
                    MenuTransition::Unchanged
                }
            }
        }
    }

    /// Fires a scheduled close. Stale or cancelled tokens are ignored.
    pub fn close_elapsed(&mut self, token: u64) -> bool {
        if self.pending_close != Some(token) {
            return false;
        }
        self.pending_close = None;
        self.open.take().is_some()
    }

    fn arm_close(&mut self) -> u64 {
        self.next_token = self.next_token.wrapping_add(1);
        self.pending_close = Some(self.next_token);
        self.next_token
    }
}
