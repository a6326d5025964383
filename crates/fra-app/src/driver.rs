// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::VecDeque;

use crate::{
    Acknowledgement, CreatePriceInput, DeletePriceInput, ListEnvelope, MutationOutcome,
    PanelCommand, PanelEffect, PanelError, PanelState, PriceRecord, PropertyType,
    UpdatePriceInput,
};

/// Remote record store plus the property type catalog.
pub trait PriceBackend {
    /// Never fails; problems come back as an unsuccessful envelope.
    fn list(&mut self, token: Option<&str>) -> ListEnvelope;
    /// `Ok(None)` means the server confirmed the change without echoing
    /// the stored record.
    fn create(&mut self, input: &CreatePriceInput) -> Result<Option<PriceRecord>, PanelError>;
    fn update(&mut self, input: &UpdatePriceInput) -> Result<Option<PriceRecord>, PanelError>;
    fn delete(&mut self, input: &DeletePriceInput) -> Result<Acknowledgement, PanelError>;
    fn property_types(&mut self, token: Option<&str>) -> Result<Vec<PropertyType>, PanelError>;
}

/// Runs one network effect and returns the command carrying its result.
/// Timer effects are not run here and yield `None`.
pub fn execute<B: PriceBackend + ?Sized>(
    backend: &mut B,
    effect: &PanelEffect,
) -> Option<PanelCommand> {
    let command = match effect {
        PanelEffect::FetchList { request, token } => PanelCommand::ListLoaded {
            request: *request,
            envelope: backend.list(token.as_deref()),
        },
        PanelEffect::Create { request, input } => PanelCommand::MutationFinished {
            request: *request,
            result: backend.create(input).map(MutationOutcome::Created),
        },
        PanelEffect::Update { request, input } => PanelCommand::MutationFinished {
            request: *request,
            result: backend.update(input).map(MutationOutcome::Updated),
        },
        PanelEffect::Delete { request, input } => PanelCommand::MutationFinished {
            request: *request,
            result: backend.delete(input).map(MutationOutcome::Deleted),
        },
        PanelEffect::FetchCatalog { request, token } => PanelCommand::CatalogLoaded {
            request: *request,
            result: backend.property_types(token.as_deref()),
        },
        PanelEffect::ScheduleMenuClose { .. } | PanelEffect::ScheduleNoticeClear { .. } => {
            return None;
        }
    };
    Some(command)
}

/// Dispatches `command` and runs every resulting network effect to
/// completion, in order. Returns the timer effects left for the caller.
pub fn drive<B: PriceBackend + ?Sized>(
    state: &mut PanelState,
    backend: &mut B,
    command: PanelCommand,
) -> Vec<PanelEffect> {
    let mut queue = VecDeque::from([command]);
    let mut timers = Vec::new();
    while let Some(command) = queue.pop_front() {
        for effect in state.dispatch(command) {
            match execute(backend, &effect) {
                Some(next) => queue.push_back(next),
                None => timers.push(effect),
            }
        }
    }
    timers
}

#[cfg(test)]
mod tests {
    use super::{PriceBackend, drive};
    use crate::{
        Acknowledgement, Caller, CreatePriceInput, DeletePriceInput, DraftField, ListEnvelope,
        Modal, PanelCommand, PanelError, PanelState, Price, PriceRecord, PriceRecordId,
        ProfessionalId, PropertyType, PropertyTypeId, UpdatePriceInput,
    };

    #[derive(Debug, Default)]
    struct MemoryBackend {
        records: Vec<PriceRecord>,
        next_id: i64,
        calls: Vec<&'static str>,
        reject_with: Option<String>,
        terse: bool,
    }

    impl MemoryBackend {
        fn make(&mut self, property_type_id: PropertyTypeId, a: &Price, b: &Price) -> PriceRecord {
            self.next_id += 1;
            PriceRecord {
                id: PriceRecordId::new(self.next_id),
                professional_id: ProfessionalId::new(7),
                property_type_id,
                non_intrusive_price: Some(a.clone()),
                intrusive_price: Some(b.clone()),
                created_by: None,
                updated_by: None,
                created_at: None,
                updated_at: None,
                property_type: None,
            }
        }
    }

    impl PriceBackend for MemoryBackend {
        fn list(&mut self, _token: Option<&str>) -> ListEnvelope {
            self.calls.push("list");
            ListEnvelope {
                status: true,
                message: "ok".to_owned(),
                data: Some(self.records.clone()),
            }
        }

        fn create(
            &mut self,
            input: &CreatePriceInput,
        ) -> Result<Option<PriceRecord>, PanelError> {
            self.calls.push("create");
            if let Some(message) = self.reject_with.take() {
                return Err(PanelError::RemoteRejected(message));
            }
            let record = self.make(
                input.property_type_id,
                &input.non_intrusive_price,
                &input.intrusive_price,
            );
            self.records.push(record.clone());
            Ok((!self.terse).then_some(record))
        }

        fn update(
            &mut self,
            input: &UpdatePriceInput,
        ) -> Result<Option<PriceRecord>, PanelError> {
            self.calls.push("update");
            let record = self
                .records
                .iter_mut()
                .find(|record| record.id == input.id)
                .ok_or_else(|| PanelError::RemoteRejected("not found".to_owned()))?;
            record.non_intrusive_price = Some(input.non_intrusive_price.clone());
            record.intrusive_price = Some(input.intrusive_price.clone());
            Ok((!self.terse).then(|| record.clone()))
        }

        fn delete(&mut self, input: &DeletePriceInput) -> Result<Acknowledgement, PanelError> {
            self.calls.push("delete");
            self.records.retain(|record| record.id != input.id);
            Ok(Acknowledgement {
                status: true,
                message: "deleted".to_owned(),
            })
        }

        fn property_types(
            &mut self,
            _token: Option<&str>,
        ) -> Result<Vec<PropertyType>, PanelError> {
            self.calls.push("property_types");
            Ok(vec![PropertyType {
                id: PropertyTypeId::new(2),
                name: "House".to_owned(),
            }])
        }
    }

    fn caller() -> Caller {
        Caller {
            token: Some("secret".to_owned()),
            professional_id: Some(ProfessionalId::new(7)),
            is_admin: false,
        }
    }

    fn fill_add(state: &mut PanelState, backend: &mut MemoryBackend, a: &str, b: &str) {
        drive(state, backend, PanelCommand::OpenAdd);
        drive(state, backend, PanelCommand::SelectPropertyType(Some(PropertyTypeId::new(2))));
        drive(
            state,
            backend,
            PanelCommand::EditPrice {
                field: DraftField::NonIntrusive,
                text: a.to_owned(),
            },
        );
        drive(
            state,
            backend,
            PanelCommand::EditPrice {
                field: DraftField::Intrusive,
                text: b.to_owned(),
            },
        );
    }

    #[test]
    fn create_then_list_round_trips_prices() {
        let mut backend = MemoryBackend::default();
        let mut state = PanelState::new(caller());
        drive(&mut state, &mut backend, PanelCommand::Mount);
        assert!(state.records().is_empty());

        fill_add(&mut state, &mut backend, "1,250.5", "0");
        let timers = drive(&mut state, &mut backend, PanelCommand::Submit);
        assert!(!timers.is_empty(), "success notice schedules a clear");

        assert_eq!(state.modal(), &Modal::None);
        assert_eq!(state.records().len(), 1);
        let record = &state.records()[0];
        assert_eq!(
            record.non_intrusive_price,
            Some(Price::parse("1250.50").expect("valid"))
        );
        assert_eq!(record.intrusive_price.as_ref().map(Price::cents), Some(0));
        assert_eq!(
            backend.calls,
            vec!["list", "property_types", "create", "list"]
        );
    }

    #[test]
    fn delete_removes_record_from_next_snapshot() {
        let mut backend = MemoryBackend::default();
        let mut state = PanelState::new(caller());
        fill_add(&mut state, &mut backend, "10", "20");
        drive(&mut state, &mut backend, PanelCommand::Submit);
        fill_add(&mut state, &mut backend, "30", "40");
        drive(&mut state, &mut backend, PanelCommand::Submit);
        assert_eq!(state.records().len(), 2);

        let doomed = state.records()[0].id;
        drive(&mut state, &mut backend, PanelCommand::OpenDelete(doomed));
        drive(&mut state, &mut backend, PanelCommand::Submit);
        assert!(state.records().iter().all(|record| record.id != doomed));
        assert_eq!(state.records().len(), 1);
    }

    #[test]
    fn rejected_create_leaves_modal_open_without_refetch() {
        let mut backend = MemoryBackend {
            reject_with: Some("Price already exists for this property type".to_owned()),
            ..MemoryBackend::default()
        };
        let mut state = PanelState::new(caller());
        fill_add(&mut state, &mut backend, "10", "20");
        drive(&mut state, &mut backend, PanelCommand::Submit);

        assert_eq!(
            state.modal().error(),
            Some("Price already exists for this property type")
        );
        assert_eq!(backend.calls, vec!["property_types", "create"]);
    }

    #[test]
    fn update_refetches_authoritative_values() {
        let mut backend = MemoryBackend::default();
        let mut state = PanelState::new(caller());
        fill_add(&mut state, &mut backend, "10", "20");
        drive(&mut state, &mut backend, PanelCommand::Submit);
        let id = state.records()[0].id;

        drive(&mut state, &mut backend, PanelCommand::OpenUpdate(id));
        drive(
            &mut state,
            &mut backend,
            PanelCommand::EditPrice {
                field: DraftField::Intrusive,
                text: "99.99".to_owned(),
            },
        );
        drive(&mut state, &mut backend, PanelCommand::Submit);
        assert_eq!(
            state.records()[0].intrusive_price.as_ref().map(Price::cents),
            Some(9_999)
        );
    }

    #[test]
    fn acknowledged_create_without_record_closes_modal_and_refetches() {
        let mut backend = MemoryBackend {
            terse: true,
            ..MemoryBackend::default()
        };
        let mut state = PanelState::new(caller());
        fill_add(&mut state, &mut backend, "10", "20");
        drive(&mut state, &mut backend, PanelCommand::Submit);

        assert_eq!(state.modal(), &Modal::None);
        assert_eq!(state.records().len(), 1);
        assert_eq!(backend.calls, vec!["property_types", "create", "list"]);
    }
}
