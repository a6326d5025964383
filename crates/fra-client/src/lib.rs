// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use fra_app::{
    Acknowledgement, CreatePriceInput, DeletePriceInput, ListEnvelope, MutationKind,
    PanelError, Price, PriceBackend, PriceRecord, PriceRecordId, ProfessionalId, PropertyType,
    PropertyTypeId, UpdatePriceInput,
};
use reqwest::StatusCode;
use reqwest::blocking::Client as HttpClient;
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_CATALOG_PATH: &str = "/property-types/get-all";

pub const LIST_PATH: &str = "/professional-fra-base-prices/get-all";
pub const STORE_PATH: &str = "/professional-fra-base-prices/store";
pub const UPDATE_PATH: &str = "/professional-fra-base-prices/update";
pub const DELETE_PATH: &str = "/professional-fra-base-prices/delete";

const UNEXPECTED_RESPONSE: &str = "unexpected response from server";

#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    catalog_path: String,
    timeout: Duration,
    http: HttpClient,
}

impl Client {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            bail!("api.base_url must not be empty");
        }
        let parsed = Url::parse(&base_url)
            .with_context(|| format!("api.base_url {base_url:?} is not a valid URL"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            bail!(
                "api.base_url {base_url:?} must use http or https, got {}",
                parsed.scheme()
            );
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            catalog_path: DEFAULT_CATALOG_PATH.to_owned(),
            timeout,
            http,
        })
    }

    pub fn with_catalog_path(mut self, path: &str) -> Self {
        let trimmed = path.trim();
        self.catalog_path = if trimmed.starts_with('/') {
            trimmed.to_owned()
        } else {
            format!("/{trimmed}")
        };
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn catalog_path(&self) -> &str {
        &self.catalog_path
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetches every record. Never fails: transport problems and bad
    /// bodies come back as an envelope with `status == false`.
    pub fn list(&self, token: Option<&str>) -> ListEnvelope {
        let url = match self.query_url(LIST_PATH, token) {
            Ok(url) => url,
            Err(error) => return ListEnvelope::failed(format!("{error:#}")),
        };

        let response = match self.http.get(url).send() {
            Ok(response) => response,
            Err(error) => {
                warn!(path = LIST_PATH, %error, "list request failed");
                return ListEnvelope::failed(self.transport_text(&error));
            }
        };
        let status = response.status();
        debug!(method = "GET", path = LIST_PATH, status = status.as_u16(), "response");
        match response.text() {
            Ok(body) => decode_list(status, &body),
            Err(error) => ListEnvelope::failed(self.transport_text(&error)),
        }
    }

    /// `Ok(None)` when the server confirmed the write without a readable
    /// record.
    pub fn create(&self, input: &CreatePriceInput) -> Result<Option<PriceRecord>, PanelError> {
        let body = StoreRequest {
            api_token: &input.token,
            property_type_id: input.property_type_id,
            non_intrusive_base_price: &input.non_intrusive_price,
            intrusive_base_price: &input.intrusive_price,
        };
        let envelope = self.post(STORE_PATH, &body, MutationKind::Create)?;
        Ok(record_from(envelope, MutationKind::Create))
    }

    pub fn update(&self, input: &UpdatePriceInput) -> Result<Option<PriceRecord>, PanelError> {
        let body = UpdateRequest {
            api_token: &input.token,
            id: input.id,
            non_intrusive_base_price: &input.non_intrusive_price,
            intrusive_base_price: &input.intrusive_price,
        };
        let envelope = self.post(UPDATE_PATH, &body, MutationKind::Update)?;
        Ok(record_from(envelope, MutationKind::Update))
    }

    pub fn delete(&self, input: &DeletePriceInput) -> Result<Acknowledgement, PanelError> {
        let body = DeleteRequest {
            api_token: &input.token,
            id: input.id,
            professional_id: input.professional_id,
        };
        let envelope = self.post(DELETE_PATH, &body, MutationKind::Delete)?;
        Ok(Acknowledgement {
            status: true,
            message: envelope.message().unwrap_or_default(),
        })
    }

    pub fn property_types(&self, token: Option<&str>) -> Result<Vec<PropertyType>, PanelError> {
        let url = self
            .query_url(&self.catalog_path, token)
            .map_err(|error| PanelError::TransportFailure(format!("{error:#}")))?;
        let response = self.http.get(url).send().map_err(|error| {
            warn!(path = %self.catalog_path, %error, "catalog request failed");
            PanelError::TransportFailure(self.transport_text(&error))
        })?;
        let status = response.status();
        debug!(method = "GET", path = %self.catalog_path, status = status.as_u16(), "response");
        let body = response
            .text()
            .map_err(|error| PanelError::TransportFailure(self.transport_text(&error)))?;
        decode_catalog(status, &body)
    }

    fn post<T: Serialize>(
        &self,
        path: &str,
        body: &T,
        kind: MutationKind,
    ) -> Result<RawEnvelope, PanelError> {
        let response = self
            .http
            .post(format!("{}{path}", self.base_url))
            .json(body)
            .send()
            .map_err(|error| {
                warn!(path, %error, "request failed");
                PanelError::TransportFailure(self.transport_text(&error))
            })?;
        let status = response.status();
        debug!(method = "POST", path, status = status.as_u16(), "response");
        let text = response
            .text()
            .map_err(|error| PanelError::TransportFailure(self.transport_text(&error)))?;
        let result = decode_mutation(status, &text, kind);
        if let Err(error) = &result {
            warn!(path, %error, "mutation failed");
        }
        result
    }

    fn query_url(&self, path: &str, token: Option<&str>) -> Result<Url> {
        let raw = format!("{}{path}", self.base_url);
        let url = match token {
            Some(token) => Url::parse_with_params(&raw, &[("api_token", token)]),
            None => Url::parse(&raw),
        };
        url.with_context(|| format!("build request URL for {path}"))
    }

    fn transport_text(&self, error: &reqwest::Error) -> String {
        if error.is_timeout() {
            return format!(
                "request to {} timed out after {}s",
                self.base_url,
                self.timeout.as_secs_f64()
            );
        }
        if error.is_connect() {
            return format!(
                "cannot reach {} -- check [api].base_url and your network ({error})",
                self.base_url
            );
        }
        error.to_string()
    }
}

impl PriceBackend for Client {
    fn list(&mut self, token: Option<&str>) -> ListEnvelope {
        Client::list(self, token)
    }

    fn create(&mut self, input: &CreatePriceInput) -> Result<Option<PriceRecord>, PanelError> {
        Client::create(self, input)
    }

    fn update(&mut self, input: &UpdatePriceInput) -> Result<Option<PriceRecord>, PanelError> {
        Client::update(self, input)
    }

    fn delete(&mut self, input: &DeletePriceInput) -> Result<Acknowledgement, PanelError> {
        Client::delete(self, input)
    }

    fn property_types(&mut self, token: Option<&str>) -> Result<Vec<PropertyType>, PanelError> {
        Client::property_types(self, token)
    }
}

fn decode_list(status: StatusCode, body: &str) -> ListEnvelope {
    let Ok(raw) = serde_json::from_str::<RawEnvelope>(body) else {
        return ListEnvelope::failed(http_fallback(status));
    };

    let message = raw.message().unwrap_or_default();
    let data = raw.data.and_then(decode_records);
    ListEnvelope {
        status: status.is_success() && raw.status,
        message: if message.is_empty() && !status.is_success() {
            http_fallback(status)
        } else {
            message
        },
        data,
    }
}

fn decode_mutation(
    status: StatusCode,
    body: &str,
    kind: MutationKind,
) -> Result<RawEnvelope, PanelError> {
    let parsed = serde_json::from_str::<RawEnvelope>(body);
    if !status.is_success() {
        let message = parsed
            .ok()
            .and_then(|raw| raw.message())
            .unwrap_or_else(|| format!("server returned {}", status.as_u16()));
        return Err(PanelError::TransportFailure(message));
    }

    let Ok(raw) = parsed else {
        return Err(PanelError::RemoteRejected(
            kind.fallback_message().to_owned(),
        ));
    };
    if !raw.status {
        return Err(PanelError::RemoteRejected(
            raw.message()
                .unwrap_or_else(|| kind.fallback_message().to_owned()),
        ));
    }
    Ok(raw)
}

fn decode_catalog(status: StatusCode, body: &str) -> Result<Vec<PropertyType>, PanelError> {
    let value = serde_json::from_str::<Value>(body).ok();
    if !status.is_success() {
        let message = value
            .and_then(|value| decode_value::<RawEnvelope>(value).ok())
            .and_then(|raw| raw.message())
            .unwrap_or_else(|| format!("server returned {}", status.as_u16()));
        return Err(PanelError::TransportFailure(message));
    }

    match value {
        Some(list @ Value::Array(_)) => decode_value(list)
            .map_err(|_| PanelError::RemoteRejected(UNEXPECTED_RESPONSE.to_owned())),
        Some(object @ Value::Object(_)) => {
            let raw = decode_value::<RawEnvelope>(object)
                .map_err(|_| PanelError::RemoteRejected(UNEXPECTED_RESPONSE.to_owned()))?;
            if !raw.status {
                return Err(PanelError::RemoteRejected(
                    raw.message()
                        .unwrap_or_else(|| UNEXPECTED_RESPONSE.to_owned()),
                ));
            }
            raw.data
                .map(decode_value)
                .transpose()
                .map_err(|_| PanelError::RemoteRejected(UNEXPECTED_RESPONSE.to_owned()))
                .map(Option::unwrap_or_default)
        }
        _ => Err(PanelError::RemoteRejected(UNEXPECTED_RESPONSE.to_owned())),
    }
}

/// Records that fail to decode are skipped; anything but a list is `None`.
fn decode_records(value: Value) -> Option<Vec<PriceRecord>> {
    let Value::Array(items) = value else {
        warn!("list data is not a record list");
        return None;
    };
    let records = items
        .into_iter()
        .filter_map(|item| {
            decode_value::<PriceRecord>(item)
                .inspect_err(|error| warn!(%error, "skipping unreadable price record"))
                .ok()
        })
        .collect();
    Some(records)
}

/// The write is already committed once `status` is true, so a missing or
/// unreadable record is logged rather than reported as a failure.
fn record_from(envelope: RawEnvelope, kind: MutationKind) -> Option<PriceRecord> {
    let value = envelope.data?;
    decode_value(value)
        .inspect_err(|error| warn!(?kind, %error, "server echoed an unreadable record"))
        .ok()
}

fn decode_value<T: DeserializeOwned>(value: Value) -> serde_json::Result<T> {
    serde_json::from_value(value)
}

fn http_fallback(status: StatusCode) -> String {
    if status.is_success() {
        UNEXPECTED_RESPONSE.to_owned()
    } else {
        format!("server returned {}", status.as_u16())
    }
}

/// Envelope shared by every endpoint. Fields are read loosely because the
/// backend is not consistent about types (`status` may be `1`, `error`
/// may be an object).
#[derive(Debug, Default, Deserialize)]
struct RawEnvelope {
    #[serde(default, deserialize_with = "truthy")]
    status: bool,
    #[serde(default)]
    message: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
    #[serde(default)]
    data: Option<Value>,
}

impl RawEnvelope {
    /// Server text in preference order: `message`, then `error`.
    fn message(&self) -> Option<String> {
        [self.message.as_ref(), self.error.as_ref()]
            .into_iter()
            .flatten()
            .find_map(|value| match value {
                Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_owned()),
                _ => None,
            })
    }
}

fn truthy<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(flag)) => flag,
        Some(Value::Number(number)) => number.as_i64().is_some_and(|n| n != 0),
        Some(Value::String(text)) => matches!(text.as_str(), "true" | "1"),
        _ => false,
    })
}

#[derive(Debug, Serialize)]
struct StoreRequest<'a> {
    api_token: &'a str,
    property_type_id: PropertyTypeId,
    non_intrusive_base_price: &'a Price,
    intrusive_base_price: &'a Price,
}

#[derive(Debug, Serialize)]
struct UpdateRequest<'a> {
    api_token: &'a str,
    id: PriceRecordId,
    non_intrusive_base_price: &'a Price,
    intrusive_base_price: &'a Price,
}

#[derive(Debug, Serialize)]
struct DeleteRequest<'a> {
    api_token: &'a str,
    id: PriceRecordId,
    #[serde(skip_serializing_if = "Option::is_none")]
    professional_id: Option<ProfessionalId>,
}
