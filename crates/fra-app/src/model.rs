// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Deserializer, Serialize};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

use crate::ids::*;
use crate::price::{Price, lenient_price};

/// Read-only projection of the property type embedded by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyTypeRef {
    pub id: PropertyTypeId,
    pub name: String,
}

/// Catalog entry offered in the add form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyType {
    pub id: PropertyTypeId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PriceRecord {
    pub id: PriceRecordId,
    pub professional_id: ProfessionalId,
    pub property_type_id: PropertyTypeId,
    #[serde(
        rename = "non_intrusive_base_price",
        default,
        deserialize_with = "lenient_price"
    )]
    pub non_intrusive_price: Option<Price>,
    #[serde(
        rename = "intrusive_base_price",
        default,
        deserialize_with = "lenient_price"
    )]
    pub intrusive_price: Option<Price>,
    #[serde(default)]
    pub created_by: Option<UserId>,
    #[serde(default)]
    pub updated_by: Option<UserId>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<OffsetDateTime>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub updated_at: Option<OffsetDateTime>,
    #[serde(default)]
    pub property_type: Option<PropertyTypeRef>,
}

impl PriceRecord {
    pub fn property_type_label(&self) -> String {
        match &self.property_type {
            Some(property_type) if !property_type.name.trim().is_empty() => {
                property_type.name.clone()
            }
            _ => format!("#{}", self.property_type_id),
        }
    }
}

/// Response shape of the list endpoint, passed through as received.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListEnvelope {
    pub status: bool,
    pub message: String,
    pub data: Option<Vec<PriceRecord>>,
}

impl ListEnvelope {
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: false,
            message: message.into(),
            data: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct Acknowledgement {
    #[serde(default)]
    pub status: bool,
    #[serde(default)]
    pub message: String,
}

/// Identity of whoever drives the panel. Every field may be absent.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Caller {
    pub token: Option<String>,
    pub professional_id: Option<ProfessionalId>,
    pub is_admin: bool,
}

impl Caller {
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref().filter(|token| !token.trim().is_empty())
    }
}

/// Narrows a fetched set to the caller's own records.
///
/// Administrators see everything. A professional whose id is unknown, or
/// matches nothing, also sees the full set rather than an empty list.
pub fn visible_records(records: Vec<PriceRecord>, caller: &Caller) -> Vec<PriceRecord> {
    if caller.is_admin {
        return records;
    }
    let Some(professional_id) = caller.professional_id else {
        return records;
    };

    let owned = records
        .iter()
        .filter(|record| record.professional_id == professional_id)
        .cloned()
        .collect::<Vec<_>>();
    if owned.is_empty() {
        return records;
    }
    owned
}

pub fn format_date(value: Option<OffsetDateTime>) -> String {
    let Some(value) = value else {
        return "-".to_owned();
    };
    value
        .format(&format_description!(
            "[day padding:none] [month repr:short] [year]"
        ))
        .unwrap_or_else(|_| "-".to_owned())
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<OffsetDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_timestamp))
}

fn parse_timestamp(raw: &str) -> Option<OffsetDateTime> {
    let trimmed = raw.trim();
    if let Ok(parsed) = OffsetDateTime::parse(trimmed, &Rfc3339) {
        return Some(parsed);
    }
    PrimitiveDateTime::parse(
        trimmed,
        &format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    )
    .ok()
    .map(PrimitiveDateTime::assume_utc)
}

#[cfg(test)]
mod tests {
    use super::{Caller, PriceRecord, format_date, visible_records};
    use crate::{PriceRecordId, ProfessionalId, PropertyTypeId};
    use anyhow::Result;

    fn record_json(id: i64, professional_id: i64) -> String {
        format!(
            r#"{{"id":{id},"professional_id":{professional_id},"property_type_id":3,
                "non_intrusive_base_price":"120.00","intrusive_base_price":"180.50",
                "created_by":7,"updated_by":null,
                "created_at":"2026-01-15T10:30:00.000000Z","updated_at":"not a date",
                "property_type":{{"id":3,"name":"Flat"}}}}"#
        )
    }

    fn record(id: i64, professional_id: i64) -> Result<PriceRecord> {
        Ok(serde_json::from_str(&record_json(id, professional_id))?)
    }

    #[test]
    fn record_decodes_server_shape() -> Result<()> {
        let record = record(1, 42)?;
        assert_eq!(record.id, PriceRecordId::new(1));
        assert_eq!(record.professional_id, ProfessionalId::new(42));
        assert_eq!(record.property_type_id, PropertyTypeId::new(3));
        assert_eq!(record.non_intrusive_price.as_ref().map(|price| price.cents()), Some(12_000));
        assert_eq!(record.intrusive_price.as_ref().map(|price| price.cents()), Some(18_050));
        assert_eq!(record.updated_by, None);
        assert_eq!(format_date(record.created_at), "15 Jan 2026");
        assert_eq!(record.updated_at, None);
        assert_eq!(record.property_type_label(), "Flat");
        Ok(())
    }

    #[test]
    fn record_tolerates_missing_optional_fields() -> Result<()> {
        let record: PriceRecord = serde_json::from_str(
            r#"{"id":9,"professional_id":1,"property_type_id":4,
                "non_intrusive_base_price":10,"intrusive_base_price":"20"}"#,
        )?;
        assert_eq!(record.created_by, None);
        assert_eq!(record.created_at, None);
        assert_eq!(record.property_type_label(), "#4");
        Ok(())
    }

    #[test]
    fn record_keeps_going_when_a_price_is_missing_or_odd() -> Result<()> {
        let record: PriceRecord = serde_json::from_str(
            r#"{"id":9,"professional_id":1,"property_type_id":4,
                "non_intrusive_base_price":"150.000","intrusive_base_price":null}"#,
        )?;
        let non_intrusive = record.non_intrusive_price.expect("server decimal kept");
        assert_eq!(non_intrusive.as_str(), "150.000");
        assert_eq!(non_intrusive.cents(), 15_000);
        assert_eq!(record.intrusive_price, None);

        let record: PriceRecord = serde_json::from_str(
            r#"{"id":10,"professional_id":1,"property_type_id":4,
                "intrusive_base_price":"soon"}"#,
        )?;
        assert_eq!(record.non_intrusive_price, None);
        assert_eq!(record.intrusive_price, None);
        Ok(())
    }

    #[test]
    fn record_accepts_space_separated_timestamps() -> Result<()> {
        let record: PriceRecord = serde_json::from_str(
            r#"{"id":9,"professional_id":1,"property_type_id":4,
                "non_intrusive_base_price":"1","intrusive_base_price":"2",
                "created_at":"2025-03-02 08:00:00"}"#,
        )?;
        assert_eq!(format_date(record.created_at), "2 Mar 2025");
        Ok(())
    }

    #[test]
    fn professional_sees_only_own_records() -> Result<()> {
        let records = vec![record(1, 10)?, record(2, 20)?, record(3, 10)?];
        let caller = Caller {
            token: Some("t".to_owned()),
            professional_id: Some(ProfessionalId::new(10)),
            is_admin: false,
        };
        let visible = visible_records(records, &caller);
        let ids = visible.iter().map(|r| r.id.get()).collect::<Vec<_>>();
        assert_eq!(ids, vec![1, 3]);
        Ok(())
    }

    #[test]
    fn professional_without_matches_falls_back_to_full_set() -> Result<()> {
        let records = vec![record(1, 10)?, record(2, 20)?];
        let caller = Caller {
            token: Some("t".to_owned()),
            professional_id: Some(ProfessionalId::new(99)),
            is_admin: false,
        };
        assert_eq!(visible_records(records.clone(), &caller), records);
        Ok(())
    }

    #[test]
    fn admin_and_unknown_professional_see_everything() -> Result<()> {
        let records = vec![record(1, 10)?, record(2, 20)?];
        let admin = Caller {
            token: Some("t".to_owned()),
            professional_id: Some(ProfessionalId::new(10)),
            is_admin: true,
        };
        assert_eq!(visible_records(records.clone(), &admin).len(), 2);

        let unknown = Caller {
            token: Some("t".to_owned()),
            professional_id: None,
            is_admin: false,
        };
        assert_eq!(visible_records(records, &unknown).len(), 2);
        Ok(())
    }

    #[test]
    fn blank_token_counts_as_missing() {
        let caller = Caller {
            token: Some("   ".to_owned()),
            ..Caller::default()
        };
        assert_eq!(caller.token(), None);
        assert_eq!(format_date(None), "-");
    }
}
