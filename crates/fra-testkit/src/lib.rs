// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod server;

pub use server::{DEFAULT_PROFESSIONAL_ID, DEFAULT_TOKEN, MockServer, RecordedRequest};

use fra_app::Price;
use serde_json::{Value, json};
use time::format_description::FormatItem;
use time::macros::format_description;
use time::{Date, Duration, Month, OffsetDateTime, Time};

const PROPERTY_TYPES: [&str; 8] = [
    "Apartment",
    "Bungalow",
    "Detached House",
    "Semi-Detached House",
    "Terraced House",
    "Maisonette",
    "Commercial Unit",
    "Flat Above Shop",
];

const REFERENCE_YEAR: i32 = 2026;

/// Wire layout of timestamps as the backend writes them.
pub const SERVER_DATETIME: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureRecord {
    pub id: i64,
    pub professional_id: i64,
    pub property_type_id: i64,
    pub property_type_name: String,
    pub non_intrusive_cents: i64,
    pub intrusive_cents: i64,
    pub created_by: Option<i64>,
    pub updated_by: Option<i64>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl FixtureRecord {
    /// Renders the record the way the backend serializes it: prices as
    /// two-decimal strings and the property type embedded.
    pub fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "professional_id": self.professional_id,
            "property_type_id": self.property_type_id,
            "non_intrusive_base_price": cents_text(self.non_intrusive_cents),
            "intrusive_base_price": cents_text(self.intrusive_cents),
            "created_by": self.created_by,
            "updated_by": self.updated_by,
            "created_at": server_datetime(self.created_at),
            "updated_at": server_datetime(self.updated_at),
            "property_type": {
                "id": self.property_type_id,
                "name": self.property_type_name,
            },
        })
    }
}

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

#[derive(Debug, Clone)]
pub struct PriceFaker {
    rng: DeterministicRng,
    next_id: i64,
}

impl PriceFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            next_id: 1,
        }
    }

    /// A record owned by `professional_id` with a fresh id. Intrusive
    /// prices always exceed non-intrusive ones, like real price sheets.
    pub fn record(&mut self, professional_id: i64) -> FixtureRecord {
        let id = self.next_id;
        self.next_id += 1;

        let type_index = self.rng.int_n(PROPERTY_TYPES.len());
        let non_intrusive_cents = self.cents_between(9_000, 45_000);
        let intrusive_cents = non_intrusive_cents + self.cents_between(2_500, 30_000);
        let created_at = self.datetime_in_year(REFERENCE_YEAR);
        let updated_at = created_at + Duration::days(self.rng.int_n(30) as i64);

        FixtureRecord {
            id,
            professional_id,
            property_type_id: type_index as i64 + 1,
            property_type_name: PROPERTY_TYPES[type_index].to_owned(),
            non_intrusive_cents,
            intrusive_cents,
            created_by: Some(professional_id),
            updated_by: None,
            created_at,
            updated_at,
        }
    }

    fn cents_between(&mut self, min: i64, max: i64) -> i64 {
        let span = (max - min) / 50 + 1;
        // Whole quarters and halves read like hand-entered prices.
        min + (self.rng.int_n(span as usize) as i64) * 50
    }

    fn datetime_in_year(&mut self, year: i32) -> OffsetDateTime {
        let start = midnight_utc(year, Month::January, 1);
        start + Duration::minutes(self.rng.int_n(365 * 24 * 60) as i64)
    }
}

pub fn property_type_names() -> &'static [&'static str] {
    &PROPERTY_TYPES
}

/// The catalog the fake backend serves: ids are 1-based positions.
pub fn property_catalog() -> Vec<(i64, String)> {
    PROPERTY_TYPES
        .iter()
        .enumerate()
        .map(|(index, name)| (index as i64 + 1, (*name).to_owned()))
        .collect()
}

pub fn list_envelope_json(records: &[FixtureRecord]) -> Value {
    json!({
        "status": true,
        "message": "FRA base prices retrieved",
        "data": records.iter().map(FixtureRecord::to_json).collect::<Vec<_>>(),
    })
}

pub fn price(text: &str) -> Price {
    Price::parse(text).unwrap_or_else(|error| panic!("fixture price {text:?}: {error}"))
}

pub fn cents_text(cents: i64) -> String {
    format!("{}.{:02}", cents / 100, cents % 100)
}

pub fn server_datetime(value: OffsetDateTime) -> String {
    value
        .format(SERVER_DATETIME)
        .unwrap_or_else(|error| panic!("format fixture datetime: {error}"))
}

pub fn reference_now() -> OffsetDateTime {
    midnight_utc(REFERENCE_YEAR, Month::January, 15) + Duration::hours(9)
}

fn midnight_utc(year: i32, month: Month, day: u8) -> OffsetDateTime {
    let date = Date::from_calendar_date(year, month, day).expect("valid calendar date");
    date.with_time(Time::MIDNIGHT).assume_utc()
}

#[cfg(test)]
mod tests {
    use super::{PriceFaker, cents_text, property_catalog, reference_now, server_datetime};
    use fra_app::PriceRecord;

    #[test]
    fn faker_is_deterministic_per_seed() {
        let mut left = PriceFaker::new(42);
        let mut right = PriceFaker::new(42);
        for _ in 0..20 {
            assert_eq!(left.record(7), right.record(7));
        }
    }

    #[test]
    fn faker_ids_are_unique_and_prices_ordered() {
        let mut faker = PriceFaker::new(9);
        let records = (0..50).map(|_| faker.record(3)).collect::<Vec<_>>();
        for (index, record) in records.iter().enumerate() {
            assert_eq!(record.id, index as i64 + 1);
            assert!(record.intrusive_cents > record.non_intrusive_cents);
            assert!(record.non_intrusive_cents >= 9_000);
        }
    }

    #[test]
    fn fixture_json_decodes_as_price_record() {
        let fixture = PriceFaker::new(1).record(7);
        let record: PriceRecord =
            serde_json::from_value(fixture.to_json()).expect("fixture should decode");
        assert_eq!(record.id.get(), fixture.id);
        assert_eq!(
            record.non_intrusive_price.as_ref().map(|price| price.cents()),
            Some(fixture.non_intrusive_cents)
        );
        assert_eq!(
            record.intrusive_price.as_ref().map(|price| price.cents()),
            Some(fixture.intrusive_cents)
        );
        assert_eq!(record.property_type_label(), fixture.property_type_name);
        assert!(record.created_at.is_some());
    }

    #[test]
    fn helpers_match_backend_formats() {
        assert_eq!(cents_text(15_000), "150.00");
        assert_eq!(cents_text(7), "0.07");
        assert_eq!(server_datetime(reference_now()), "2026-01-15 09:00:00");
        assert_eq!(property_catalog()[0], (1, "Apartment".to_owned()));
    }
}
