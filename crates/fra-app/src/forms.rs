// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{
    PanelError, Price, PriceRecord, PriceRecordId, ProfessionalId, PropertyTypeId,
    ValidationError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftField {
    NonIntrusive,
    Intrusive,
}

impl DraftField {
    pub const fn label(self) -> &'static str {
        match self {
            Self::NonIntrusive => "non-intrusive price",
            Self::Intrusive => "intrusive price",
        }
    }

    pub const fn next(self) -> Self {
        match self {
            Self::NonIntrusive => Self::Intrusive,
            Self::Intrusive => Self::NonIntrusive,
        }
    }
}

/// Raw text of the two price fields as typed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PriceDraft {
    pub non_intrusive: String,
    pub intrusive: String,
}

impl PriceDraft {
    pub fn from_record(record: &PriceRecord) -> Self {
        Self {
            non_intrusive: record
                .non_intrusive_price
                .as_ref()
                .map(Price::input_text)
                .unwrap_or_default(),
            intrusive: record
                .intrusive_price
                .as_ref()
                .map(Price::input_text)
                .unwrap_or_default(),
        }
    }

    pub fn field(&self, field: DraftField) -> &str {
        match field {
            DraftField::NonIntrusive => &self.non_intrusive,
            DraftField::Intrusive => &self.intrusive,
        }
    }

    pub fn field_mut(&mut self, field: DraftField) -> &mut String {
        match field {
            DraftField::NonIntrusive => &mut self.non_intrusive,
            DraftField::Intrusive => &mut self.intrusive,
        }
    }

    pub fn validate(&self) -> Result<ValidatedPrices, PanelError> {
        Ok(ValidatedPrices {
            non_intrusive: parse_field(DraftField::NonIntrusive, &self.non_intrusive)?,
            intrusive: parse_field(DraftField::Intrusive, &self.intrusive)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedPrices {
    pub non_intrusive: Price,
    pub intrusive: Price,
}

/// Draft for a new record: both prices plus the chosen property type.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AddDraft {
    pub property_type_id: Option<PropertyTypeId>,
    pub prices: PriceDraft,
}

impl AddDraft {
    pub fn validate(&self) -> Result<(PropertyTypeId, ValidatedPrices), PanelError> {
        let prices = self.prices.validate()?;
        let property_type_id = self
            .property_type_id
            .filter(|id| id.get() > 0)
            .ok_or_else(|| {
                PanelError::ValidationFailed(format!(
                    "{} -- choose a property type and retry",
                    ValidationError::MissingPropertyType
                ))
            })?;
        Ok((property_type_id, prices))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePriceInput {
    pub token: String,
    pub property_type_id: PropertyTypeId,
    pub non_intrusive_price: Price,
    pub intrusive_price: Price,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatePriceInput {
    pub token: String,
    pub id: PriceRecordId,
    pub non_intrusive_price: Price,
    pub intrusive_price: Price,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletePriceInput {
    pub token: String,
    pub id: PriceRecordId,
    /// Sent only when an administrator deletes on a professional's behalf.
    pub professional_id: Option<ProfessionalId>,
}

fn parse_field(field: DraftField, raw: &str) -> Result<Price, PanelError> {
    Price::parse(raw).map_err(|error| {
        let hint = match error {
            ValidationError::NegativeMoney => "enter zero or a positive amount",
            _ => "enter an amount like 150.00",
        };
        PanelError::ValidationFailed(format!("{}: {error} -- {hint}", field.label()))
    })
}
