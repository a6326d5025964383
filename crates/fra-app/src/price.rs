// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::de::{self, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

use crate::ValidationError;

/// A non-negative decimal amount.
///
/// The normalized decimal text is kept as entered (`"150.5"` stays
/// `"150.5"`) and is what goes over the wire. Comparison and display use
/// the cents value, so `"150.5"` and `"150.50"` are equal.
///
/// Typed input is limited to two fractional digits. Amounts read from the
/// server may carry any scale; their cents are rounded half up.
#[derive(Debug, Clone)]
pub struct Price {
    text: String,
    cents: i64,
}

impl Price {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        Self::read(input, Scale::Cents)
    }

    pub fn from_server(input: &str) -> Result<Self, ValidationError> {
        Self::read(input, Scale::Any)
    }

    fn read(input: &str, scale: Scale) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        let cents = parse_cents(trimmed, scale)?;
        let mut text = trimmed
            .trim_start_matches('$')
            .chars()
            .filter(|ch| *ch != ',')
            .collect::<String>();
        if text.starts_with('.') {
            text.insert(0, '0');
        }
        if text.ends_with('.') {
            text.pop();
        }
        Ok(Self { text, cents })
    }

    pub fn from_cents(cents: i64) -> Result<Self, ValidationError> {
        if cents < 0 {
            return Err(ValidationError::NegativeMoney);
        }
        Ok(Self {
            text: plain_cents(cents),
            cents,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Text for an input field: the stored text when a form would accept
    /// it, otherwise the rounded amount.
    pub fn input_text(&self) -> String {
        match parse_cents(&self.text, Scale::Cents) {
            Ok(_) => self.text.clone(),
            Err(_) => plain_cents(self.cents),
        }
    }

    pub const fn cents(&self) -> i64 {
        self.cents
    }

    pub fn display(&self) -> String {
        format_cents(self.cents)
    }
}

impl PartialEq for Price {
    fn eq(&self, other: &Self) -> bool {
        self.cents == other.cents
    }
}

impl Eq for Price {}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(PriceVisitor)
    }
}

struct PriceVisitor;

impl Visitor<'_> for PriceVisitor {
    type Value = Price;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a non-negative decimal as a string or number")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Price, E> {
        Price::from_server(value).map_err(|error| E::custom(format!("{error}: {value:?}")))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Price, E> {
        self.visit_str(&value.to_string())
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Price, E> {
        self.visit_str(&value.to_string())
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Price, E> {
        if !value.is_finite() {
            return Err(E::custom("price must be finite"));
        }
        self.visit_str(&value.to_string())
    }
}

/// Reads an optional server price. Null, missing and unreadable values all
/// become `None` rather than failing the surrounding record.
pub fn lenient_price<'de, D>(deserializer: D) -> Result<Option<Price>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(LenientPriceVisitor)
}

struct LenientPriceVisitor;

impl LenientPriceVisitor {
    fn keep<E>(parsed: Result<Price, E>, raw: &dyn fmt::Display) -> Option<Price> {
        match parsed {
            Ok(price) => Some(price),
            Err(_) => {
                tracing::warn!(value = %raw, "ignoring unreadable price");
                None
            }
        }
    }
}

impl<'de> Visitor<'de> for LenientPriceVisitor {
    type Value = Option<Price>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an optional price")
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(self)
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
        if value.trim().is_empty() {
            return Ok(None);
        }
        Ok(Self::keep(PriceVisitor.visit_str::<E>(value), &value))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
        Ok(Self::keep(PriceVisitor.visit_u64::<E>(value), &value))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
        Ok(Self::keep(PriceVisitor.visit_i64::<E>(value), &value))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Self::Value, E> {
        Ok(Self::keep(PriceVisitor.visit_f64::<E>(value), &value))
    }

    fn visit_bool<E: de::Error>(self, value: bool) -> Result<Self::Value, E> {
        Ok(Self::keep::<E>(Err(E::custom("boolean price")), &value))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(None)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
        Ok(None)
    }
}

pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let magnitude = cents.unsigned_abs();
    format!(
        "{sign}${}.{:02}",
        group_thousands(magnitude / 100),
        magnitude % 100
    )
}

pub fn format_optional_price(price: Option<&Price>) -> String {
    price.map_or_else(|| "-".to_owned(), Price::display)
}

fn plain_cents(cents: i64) -> String {
    format!("{}.{:02}", cents / 100, cents % 100)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scale {
    /// At most two fractional digits.
    Cents,
    /// Any number of fractional digits, rounded half up to cents.
    Any,
}

fn parse_cents(input: &str, scale: Scale) -> Result<i64, ValidationError> {
    let clean = input.replace(',', "");
    if clean.starts_with('-') {
        return Err(ValidationError::NegativeMoney);
    }

    let clean = clean.strip_prefix('$').unwrap_or(&clean);
    let (whole, fraction) = clean.split_once('.').unwrap_or((clean, ""));
    if whole.is_empty() && fraction.is_empty() {
        return Err(ValidationError::InvalidMoney);
    }
    if !all_digits(whole) || !all_digits(fraction) {
        return Err(ValidationError::InvalidMoney);
    }
    if scale == Scale::Cents && fraction.len() > 2 {
        return Err(ValidationError::InvalidMoney);
    }

    let whole = if whole.is_empty() {
        0
    } else {
        whole
            .parse::<i64>()
            .map_err(|_| ValidationError::InvalidMoney)?
    };
    whole
        .checked_mul(100)
        .and_then(|value| value.checked_add(fraction_cents(fraction)))
        .ok_or(ValidationError::InvalidMoney)
}

fn all_digits(text: &str) -> bool {
    text.bytes().all(|byte| byte.is_ascii_digit())
}

/// Cents from ASCII fraction digits, rounding on the third digit.
fn fraction_cents(fraction: &str) -> i64 {
    let digit = |index: usize| {
        fraction
            .as_bytes()
            .get(index)
            .map_or(0, |byte| i64::from(byte - b'0'))
    };
    let cents = digit(0) * 10 + digit(1);
    if digit(2) >= 5 { cents + 1 } else { cents }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            out.push(',');
        }
        out.push(digit);
    }
    out
}
