// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::time::Duration;

use tracing::debug;

use crate::{
    AUTH_REQUIRED_MESSAGE, Acknowledgement, ActionMenu, AddDraft, Caller, CreatePriceInput,
    DeletePriceInput, DraftField, ListEnvelope, MENU_CLOSE_DELAY, MenuAction, MenuCommand,
    MenuTransition, PanelError, PriceDraft, PriceRecord, PriceRecordId, PropertyType,
    PropertyTypeId, UpdatePriceInput, visible_records,
};

pub const NOTICE_CLEAR_DELAY: Duration = Duration::from_secs(4);
pub const LIST_FAILED_MESSAGE: &str = "Failed to load FRA base prices";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Create,
    Update,
    Delete,
}

impl MutationKind {
    pub const fn success_message(self) -> &'static str {
        match self {
            Self::Create => "FRA base price added successfully",
            Self::Update => "FRA base price updated successfully",
            Self::Delete => "FRA base price deleted successfully",
        }
    }

    pub const fn fallback_message(self) -> &'static str {
        match self {
            Self::Create => "Failed to add FRA base price",
            Self::Update => "Failed to update FRA base price",
            Self::Delete => "Failed to delete FRA base price",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateModal {
    pub record: PriceRecord,
    pub draft: PriceDraft,
    pub focus: DraftField,
    pub submitting: Option<u64>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteModal {
    pub record: PriceRecord,
    pub submitting: Option<u64>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddModal {
    pub draft: AddDraft,
    pub focus: DraftField,
    pub choices: Vec<PropertyType>,
    /// Pending catalog request; `None` once choices have arrived.
    pub catalog_request: Option<u64>,
    pub submitting: Option<u64>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Modal {
    #[default]
    None,
    Details(PriceRecord),
    Update(UpdateModal),
    Delete(DeleteModal),
    Add(AddModal),
}

impl Modal {
    pub const fn is_open(&self) -> bool {
        !matches!(self, Self::None)
    }

    pub const fn submitting(&self) -> Option<u64> {
        match self {
            Self::Update(modal) => modal.submitting,
            Self::Delete(modal) => modal.submitting,
            Self::Add(modal) => modal.submitting,
            Self::None | Self::Details(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Update(modal) => modal.error.as_deref(),
            Self::Delete(modal) => modal.error.as_deref(),
            Self::Add(modal) => modal.error.as_deref(),
            Self::None | Self::Details(_) => None,
        }
    }

    const fn mutation_kind(&self) -> Option<MutationKind> {
        match self {
            Self::Update(_) => Some(MutationKind::Update),
            Self::Delete(_) => Some(MutationKind::Delete),
            Self::Add(_) => Some(MutationKind::Create),
            Self::None | Self::Details(_) => None,
        }
    }

    fn settle(&mut self, error: Option<String>) {
        match self {
            Self::Update(modal) => {
                modal.submitting = None;
                modal.error = error;
            }
            Self::Delete(modal) => {
                modal.submitting = None;
                modal.error = error;
            }
            Self::Add(modal) => {
                modal.submitting = None;
                modal.error = error;
            }
            Self::None | Self::Details(_) => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The stored record, when the server echoed one back.
    Created(Option<PriceRecord>),
    Updated(Option<PriceRecord>),
    Deleted(Acknowledgement),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelCommand {
    Mount,
    Refresh,
    ListLoaded {
        request: u64,
        envelope: ListEnvelope,
    },
    OpenDetails(PriceRecordId),
    OpenUpdate(PriceRecordId),
    OpenDelete(PriceRecordId),
    OpenAdd,
    CloseModal,
    EditPrice {
        field: DraftField,
        text: String,
    },
    FocusNextField,
    SelectPropertyType(Option<PropertyTypeId>),
    Submit,
    MutationFinished {
        request: u64,
        result: Result<MutationOutcome, PanelError>,
    },
    CatalogLoaded {
        request: u64,
        result: Result<Vec<PropertyType>, PanelError>,
    },
    Menu(MenuCommand),
    MenuCloseElapsed {
        token: u64,
    },
    ClearNotice {
        token: u64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelEffect {
    FetchList {
        request: u64,
        token: Option<String>,
    },
    Create {
        request: u64,
        input: CreatePriceInput,
    },
    Update {
        request: u64,
        input: UpdatePriceInput,
    },
    Delete {
        request: u64,
        input: DeletePriceInput,
    },
    FetchCatalog {
        request: u64,
        token: Option<String>,
    },
    ScheduleMenuClose {
        token: u64,
        delay: Duration,
    },
    ScheduleNoticeClear {
        token: u64,
        delay: Duration,
    },
}

impl PanelEffect {
    pub const fn is_network(&self) -> bool {
        !matches!(
            self,
            Self::ScheduleMenuClose { .. } | Self::ScheduleNoticeClear { .. }
        )
    }

    /// The command a timer effect posts once its delay has elapsed.
    pub fn timer_command(&self) -> Option<(Duration, PanelCommand)> {
        match *self {
            Self::ScheduleMenuClose { token, delay } => {
                Some((delay, PanelCommand::MenuCloseElapsed { token }))
            }
            Self::ScheduleNoticeClear { token, delay } => {
                Some((delay, PanelCommand::ClearNotice { token }))
            }
            _ => None,
        }
    }
}

/// Client-side view of the remote price records.
///
/// Every transition goes through [`PanelState::dispatch`], which mutates
/// local state and returns the effects the caller must run. Results come
/// back as further commands. The snapshot is only ever replaced by a list
/// response; mutations never patch it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PanelState {
    caller: Caller,
    loading: bool,
    error: Option<String>,
    records: Vec<PriceRecord>,
    modal: Modal,
    menu: ActionMenu,
    notice: Option<Notice>,
    next_request_id: u64,
    latest_list_request: Option<u64>,
    /// Newest list request whose records were applied.
    applied_list_request: u64,
    /// Newest list request applied at all, records or error.
    answered_list_request: u64,
    notice_token: u64,
}

impl PanelState {
    pub fn new(caller: Caller) -> Self {
        Self {
            caller,
            ..Self::default()
        }
    }

    pub const fn caller(&self) -> &Caller {
        &self.caller
    }

    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn records(&self) -> &[PriceRecord] {
        &self.records
    }

    pub fn record(&self, id: PriceRecordId) -> Option<&PriceRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    pub const fn modal(&self) -> &Modal {
        &self.modal
    }

    pub const fn menu(&self) -> &ActionMenu {
        &self.menu
    }

    pub const fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn dispatch(&mut self, command: PanelCommand) -> Vec<PanelEffect> {
        match command {
            PanelCommand::Mount | PanelCommand::Refresh => self.start_fetch(),
            PanelCommand::ListLoaded { request, envelope } => {
                self.apply_list(request, envelope);
                Vec::new()
            }
            PanelCommand::OpenDetails(id) => self.open_for(id, MenuAction::ViewDetails),
            PanelCommand::OpenUpdate(id) => self.open_for(id, MenuAction::Update),
            PanelCommand::OpenDelete(id) => self.open_for(id, MenuAction::Delete),
            PanelCommand::OpenAdd => self.open_add(),
            PanelCommand::CloseModal => {
                if self.modal.submitting().is_none() {
                    self.modal = Modal::None;
                }
                Vec::new()
            }
            PanelCommand::EditPrice { field, text } => {
                if let Some(draft) = self.editable_draft() {
                    *draft.field_mut(field) = text;
                }
                Vec::new()
            }
            PanelCommand::FocusNextField => {
                match &mut self.modal {
                    Modal::Update(modal) if modal.submitting.is_none() => {
                        modal.focus = modal.focus.next();
                    }
                    Modal::Add(modal) if modal.submitting.is_none() => {
                        modal.focus = modal.focus.next();
                    }
                    _ => {}
                }
                Vec::new()
            }
            PanelCommand::SelectPropertyType(property_type_id) => {
                if let Modal::Add(modal) = &mut self.modal
                    && modal.submitting.is_none()
                {
                    modal.draft.property_type_id = property_type_id;
                }
                Vec::new()
            }
            PanelCommand::Submit => self.submit(),
            PanelCommand::MutationFinished { request, result } => {
                self.finish_mutation(request, result)
            }
            PanelCommand::CatalogLoaded { request, result } => {
                self.apply_catalog(request, result);
                Vec::new()
            }
            PanelCommand::Menu(command) => self.apply_menu(command),
            PanelCommand::MenuCloseElapsed { token } => {
                self.menu.close_elapsed(token);
                Vec::new()
            }
            PanelCommand::ClearNotice { token } => {
                if token == self.notice_token {
                    self.notice = None;
                }
                Vec::new()
            }
        }
    }

    fn start_fetch(&mut self) -> Vec<PanelEffect> {
        let Some(token) = self.caller.token().map(str::to_owned) else {
            self.loading = false;
            self.error = Some(AUTH_REQUIRED_MESSAGE.to_owned());
            return Vec::new();
        };

        let request = self.next_request();
        debug!(request, "fetching price records");
        self.latest_list_request = Some(request);
        self.loading = true;
        vec![PanelEffect::FetchList {
            request,
            token: Some(token),
        }]
    }

    fn apply_list(&mut self, request: u64, envelope: ListEnvelope) {
        if self.latest_list_request == Some(request) {
            self.loading = false;
        }
        // An older success still beats a newer failure; an older failure
        // never overwrites anything newer.
        let succeeded = envelope.status && envelope.data.is_some();
        let newest = if succeeded {
            self.applied_list_request
        } else {
            self.answered_list_request
        };
        if request <= newest {
            debug!(
                request,
                applied = self.applied_list_request,
                answered = self.answered_list_request,
                "discarding stale list response"
            );
            return;
        }
        self.answered_list_request = self.answered_list_request.max(request);

        match envelope {
            ListEnvelope {
                status: true,
                data: Some(records),
                ..
            } => {
                self.applied_list_request = request;
                self.records = visible_records(records, &self.caller);
                self.error = None;
            }
            ListEnvelope { message, .. } => {
                self.records.clear();
                let message = message.trim();
                self.error = Some(if message.is_empty() {
                    LIST_FAILED_MESSAGE.to_owned()
                } else {
                    message.to_owned()
                });
            }
        }
    }

    fn open_for(&mut self, id: PriceRecordId, action: MenuAction) -> Vec<PanelEffect> {
        if self.modal.submitting().is_some() {
            return Vec::new();
        }
        let Some(record) = self.record(id).cloned() else {
            return Vec::new();
        };
        self.menu.apply(MenuCommand::Dismiss);
        self.modal = match action {
            MenuAction::ViewDetails => Modal::Details(record),
            MenuAction::Update => Modal::Update(UpdateModal {
                draft: PriceDraft::from_record(&record),
                record,
                focus: DraftField::NonIntrusive,
                submitting: None,
                error: None,
            }),
            MenuAction::Delete => Modal::Delete(DeleteModal {
                record,
                submitting: None,
                error: None,
            }),
        };
        Vec::new()
    }

    fn open_add(&mut self) -> Vec<PanelEffect> {
        if self.modal.submitting().is_some() {
            return Vec::new();
        }
        self.menu.apply(MenuCommand::Dismiss);
        let request = self.next_request();
        self.modal = Modal::Add(AddModal {
            draft: AddDraft::default(),
            focus: DraftField::NonIntrusive,
            choices: Vec::new(),
            catalog_request: Some(request),
            submitting: None,
            error: None,
        });
        vec![PanelEffect::FetchCatalog {
            request,
            token: self.caller.token().map(str::to_owned),
        }]
    }

    fn editable_draft(&mut self) -> Option<&mut PriceDraft> {
        match &mut self.modal {
            Modal::Update(modal) if modal.submitting.is_none() => Some(&mut modal.draft),
            Modal::Add(modal) if modal.submitting.is_none() => Some(&mut modal.draft.prices),
            _ => None,
        }
    }

    fn submit(&mut self) -> Vec<PanelEffect> {
        if self.modal.submitting().is_some() {
            return Vec::new();
        }

        let prepared = match &self.modal {
            Modal::Update(modal) => modal.draft.validate().map(|prices| {
                PreparedMutation::Update(modal.record.id, prices.non_intrusive, prices.intrusive)
            }),
            Modal::Add(modal) => modal.draft.validate().map(|(property_type_id, prices)| {
                PreparedMutation::Create(property_type_id, prices.non_intrusive, prices.intrusive)
            }),
            Modal::Delete(modal) => Ok(PreparedMutation::Delete(
                modal.record.id,
                self.caller
                    .is_admin
                    .then_some(modal.record.professional_id),
            )),
            Modal::None | Modal::Details(_) => return Vec::new(),
        };
        let prepared = match prepared {
            Ok(prepared) => prepared,
            Err(error) => return vec![self.notify(NoticeLevel::Error, error.message())],
        };
        let Some(token) = self.caller.token().map(str::to_owned) else {
            return vec![self.notify(NoticeLevel::Error, PanelError::AuthRequired.message())];
        };

        let request = self.next_request();
        let effect = match prepared {
            PreparedMutation::Create(property_type_id, non_intrusive_price, intrusive_price) => {
                PanelEffect::Create {
                    request,
                    input: CreatePriceInput {
                        token,
                        property_type_id,
                        non_intrusive_price,
                        intrusive_price,
                    },
                }
            }
            PreparedMutation::Update(id, non_intrusive_price, intrusive_price) => {
                PanelEffect::Update {
                    request,
                    input: UpdatePriceInput {
                        token,
                        id,
                        non_intrusive_price,
                        intrusive_price,
                    },
                }
            }
            PreparedMutation::Delete(id, professional_id) => PanelEffect::Delete {
                request,
                input: DeletePriceInput {
                    token,
                    id,
                    professional_id,
                },
            },
        };

        match &mut self.modal {
            Modal::Update(modal) => {
                modal.submitting = Some(request);
                modal.error = None;
            }
            Modal::Delete(modal) => {
                modal.submitting = Some(request);
                modal.error = None;
            }
            Modal::Add(modal) => {
                modal.submitting = Some(request);
                modal.error = None;
            }
            Modal::None | Modal::Details(_) => {}
        }
        vec![effect]
    }

    fn finish_mutation(
        &mut self,
        request: u64,
        result: Result<MutationOutcome, PanelError>,
    ) -> Vec<PanelEffect> {
        if self.modal.submitting() != Some(request) {
            debug!(request, "discarding mutation result for a closed modal");
            return Vec::new();
        }
        let Some(kind) = self.modal.mutation_kind() else {
            return Vec::new();
        };

        match result {
            Ok(_) => {
                self.modal = Modal::None;
                let mut effects = vec![self.notify(NoticeLevel::Success, kind.success_message())];
                debug!(request, ?kind, "mutation succeeded, refreshing snapshot");
                effects.extend(self.start_fetch());
                effects
            }
            Err(error) => {
                let message = error.message();
                let message = if message.trim().is_empty() {
                    kind.fallback_message().to_owned()
                } else {
                    message
                };
                self.modal.settle(Some(message.clone()));
                vec![self.notify(NoticeLevel::Error, message)]
            }
        }
    }

    fn apply_catalog(&mut self, request: u64, result: Result<Vec<PropertyType>, PanelError>) {
        let Modal::Add(modal) = &mut self.modal else {
            debug!(request, "discarding catalog for a closed add modal");
            return;
        };
        if modal.catalog_request != Some(request) {
            debug!(request, "discarding stale catalog response");
            return;
        }
        modal.catalog_request = None;
        modal.choices = match result {
            Ok(choices) => choices,
            Err(error) => {
                tracing::warn!(request, %error, "property type catalog unavailable");
                Vec::new()
            }
        };
    }

    fn apply_menu(&mut self, command: MenuCommand) -> Vec<PanelEffect> {
        match self.menu.apply(command) {
            MenuTransition::ScheduleClose { token } => vec![PanelEffect::ScheduleMenuClose {
                token,
                delay: MENU_CLOSE_DELAY,
            }],
            MenuTransition::Selected { record, action } => self.open_for(record, action),
            MenuTransition::Unchanged | MenuTransition::Opened(_) | MenuTransition::Closed => {
                Vec::new()
            }
        }
    }

    fn notify(&mut self, level: NoticeLevel, message: impl Into<String>) -> PanelEffect {
        self.notice = Some(Notice {
            level,
            message: message.into(),
        });
        self.notice_token = self.notice_token.wrapping_add(1);
        PanelEffect::ScheduleNoticeClear {
            token: self.notice_token,
            delay: NOTICE_CLEAR_DELAY,
        }
    }

    fn next_request(&mut self) -> u64 {
        self.next_request_id = self.next_request_id.saturating_add(1);
        self.next_request_id
    }
}

enum PreparedMutation {
    Create(PropertyTypeId, crate::Price, crate::Price),
    Update(PriceRecordId, crate::Price, crate::Price),
    Delete(PriceRecordId, Option<crate::ProfessionalId>),
}
