// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! In-process stand-in for the FRA base price REST backend.

use crate::{FixtureRecord, PriceFaker, property_catalog, reference_now};
use anyhow::{Result, anyhow};
use fra_app::Price;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use time::Duration;
use tiny_http::{Header, Method, Request, Response, Server};
use url::Url;

pub const DEFAULT_TOKEN: &str = "test-token";
pub const DEFAULT_PROFESSIONAL_ID: i64 = 7;

const CATALOG_PATH: &str = "/property-types/get-all";

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub api_token: Option<String>,
    pub body: Option<Value>,
}

#[derive(Debug, Clone)]
enum Injected {
    Reject(String),
    Status(u16, Option<String>),
    Garbage,
}

#[derive(Debug)]
struct Backend {
    token: String,
    professional_id: i64,
    records: Vec<FixtureRecord>,
    catalog: Vec<(i64, String)>,
    next_id: i64,
    clock: i64,
    requests: Vec<RecordedRequest>,
    injected: Vec<Injected>,
}

pub struct MockServer {
    server: Arc<Server>,
    base_url: String,
    state: Arc<Mutex<Backend>>,
    handle: Option<JoinHandle<()>>,
}

impl MockServer {
    pub fn start() -> Result<Self> {
        Self::start_with(DEFAULT_TOKEN, DEFAULT_PROFESSIONAL_ID)
    }

    /// Starts a backend that accepts only `token` and stamps new records
    /// with `professional_id`.
    pub fn start_with(token: &str, professional_id: i64) -> Result<Self> {
        let server = Arc::new(
            Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?,
        );
        let base_url = format!("http://{}", server.server_addr());
        let state = Arc::new(Mutex::new(Backend {
            token: token.to_owned(),
            professional_id,
            records: Vec::new(),
            catalog: property_catalog(),
            next_id: 1,
            clock: 0,
            requests: Vec::new(),
            injected: Vec::new(),
        }));

        let handle = {
            let server = Arc::clone(&server);
            let state = Arc::clone(&state);
            thread::spawn(move || {
                for request in server.incoming_requests() {
                    serve(&state, request);
                }
            })
        };

        Ok(Self {
            server,
            base_url,
            state,
            handle: Some(handle),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn seed(&self, faker: &mut PriceFaker, professional_id: i64, count: usize) {
        let mut state = self.lock();
        for _ in 0..count {
            let mut record = faker.record(professional_id);
            record.id = state.next_id;
            state.next_id += 1;
            state.records.push(record);
        }
    }

    pub fn insert(&self, record: FixtureRecord) {
        let mut state = self.lock();
        state.next_id = state.next_id.max(record.id + 1);
        state.records.push(record);
    }

    pub fn records(&self) -> Vec<FixtureRecord> {
        self.lock().records.clone()
    }

    pub fn set_catalog(&self, catalog: Vec<(i64, String)>) {
        self.lock().catalog = catalog;
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock().requests.clone()
    }

    pub fn request_paths(&self) -> Vec<String> {
        self.lock()
            .requests
            .iter()
            .map(|request| request.path.clone())
            .collect()
    }

    /// Answers the next request with `200` and `{"status": false}`.
    pub fn reject_next(&self, message: &str) {
        self.lock().injected.push(Injected::Reject(message.to_owned()));
    }

    /// Answers the next request with an HTTP error status.
    pub fn fail_next(&self, status: u16, message: Option<&str>) {
        self.lock()
            .injected
            .push(Injected::Status(status, message.map(str::to_owned)));
    }

    /// Answers the next request with `200` and a body that is not JSON.
    pub fn garble_next(&self) {
        self.lock().injected.push(Injected::Garbage);
    }

    fn lock(&self) -> MutexGuard<'_, Backend> {
        lock(&self.state)
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn lock(state: &Mutex<Backend>) -> MutexGuard<'_, Backend> {
    state
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

fn serve(state: &Mutex<Backend>, mut request: Request) {
    let method = request.method().clone();
    let Ok(url) = Url::parse(&format!("http://localhost{}", request.url())) else {
        respond(request, 400, &json!({"status": false, "message": "bad url"}));
        return;
    };
    let mut raw = String::new();
    let _ = request.as_reader().read_to_string(&mut raw);
    let body = serde_json::from_str::<Value>(&raw).ok();

    let api_token = url
        .query_pairs()
        .find(|(key, _)| key == "api_token")
        .map(|(_, value)| value.into_owned())
        .or_else(|| {
            body.as_ref()
                .and_then(|body| body.get("api_token"))
                .and_then(Value::as_str)
                .map(str::to_owned)
        });

    let mut backend = lock(state);
    backend.requests.push(RecordedRequest {
        method: method.as_str().to_owned(),
        path: url.path().to_owned(),
        api_token: api_token.clone(),
        body: body.clone(),
    });

    if !backend.injected.is_empty() {
        let injected = backend.injected.remove(0);
        drop(backend);
        match injected {
            Injected::Reject(message) => {
                respond(request, 200, &json!({"status": false, "message": message}));
            }
            Injected::Status(status, Some(message)) => {
                respond(request, status, &json!({"status": false, "message": message}));
            }
            Injected::Status(status, None) => {
                let _ = request.respond(Response::from_string("").with_status_code(status));
            }
            Injected::Garbage => {
                let _ = request.respond(
                    Response::from_string("<html>maintenance</html>").with_status_code(200),
                );
            }
        }
        return;
    }

    if api_token.as_deref() != Some(backend.token.as_str()) {
        drop(backend);
        respond(request, 401, &json!({"message": "Unauthenticated."}));
        return;
    }

    let (status, payload) = match (method, url.path()) {
        (Method::Get, "/professional-fra-base-prices/get-all") => (
            200,
            json!({
                "status": true,
                "message": "FRA base prices retrieved",
                "data": backend.records.iter().map(FixtureRecord::to_json).collect::<Vec<_>>(),
            }),
        ),
        (Method::Post, "/professional-fra-base-prices/store") => {
            backend.store(body.as_ref().unwrap_or(&Value::Null))
        }
        (Method::Post, "/professional-fra-base-prices/update") => {
            backend.update(body.as_ref().unwrap_or(&Value::Null))
        }
        (Method::Post, "/professional-fra-base-prices/delete") => {
            backend.delete(body.as_ref().unwrap_or(&Value::Null))
        }
        (Method::Get, CATALOG_PATH) => (
            200,
            json!({
                "status": true,
                "data": backend
                    .catalog
                    .iter()
                    .map(|(id, name)| json!({"id": id, "name": name}))
                    .collect::<Vec<_>>(),
            }),
        ),
        _ => (404, json!({"status": false, "message": "route not found"})),
    };
    drop(backend);
    respond(request, status, &payload);
}

impl Backend {
    fn store(&mut self, body: &Value) -> (u16, Value) {
        let Some(type_id) = body.get("property_type_id").and_then(Value::as_i64) else {
            return invalid("The property type id field is required.");
        };
        let Some(type_name) = self
            .catalog
            .iter()
            .find(|(id, _)| *id == type_id)
            .map(|(_, name)| name.clone())
        else {
            return invalid("The selected property type id is invalid.");
        };
        let (Some(non_intrusive), Some(intrusive)) = (
            body_cents(body, "non_intrusive_base_price"),
            body_cents(body, "intrusive_base_price"),
        ) else {
            return invalid("The base price fields must be numbers.");
        };

        let now = self.tick();
        let record = FixtureRecord {
            id: self.next_id,
            professional_id: self.professional_id,
            property_type_id: type_id,
            property_type_name: type_name,
            non_intrusive_cents: non_intrusive,
            intrusive_cents: intrusive,
            created_by: Some(self.professional_id),
            updated_by: None,
            created_at: now,
            updated_at: now,
        };
        self.next_id += 1;
        let payload = record.to_json();
        self.records.push(record);
        (
            200,
            json!({"status": true, "message": "FRA base price created", "data": payload}),
        )
    }

    fn update(&mut self, body: &Value) -> (u16, Value) {
        let (Some(non_intrusive), Some(intrusive)) = (
            body_cents(body, "non_intrusive_base_price"),
            body_cents(body, "intrusive_base_price"),
        ) else {
            return invalid("The base price fields must be numbers.");
        };
        let id = body.get("id").and_then(Value::as_i64);
        let now = self.tick();
        let updater = self.professional_id;
        let Some(record) = self.records.iter_mut().find(|record| Some(record.id) == id) else {
            return (
                200,
                json!({"status": false, "message": "FRA base price not found"}),
            );
        };
        record.non_intrusive_cents = non_intrusive;
        record.intrusive_cents = intrusive;
        record.updated_by = Some(updater);
        record.updated_at = now;
        (
            200,
            json!({"status": true, "message": "FRA base price updated", "data": record.to_json()}),
        )
    }

    fn delete(&mut self, body: &Value) -> (u16, Value) {
        let id = body.get("id").and_then(Value::as_i64);
        let before = self.records.len();
        self.records.retain(|record| Some(record.id) != id);
        if self.records.len() == before {
            return (
                200,
                json!({"status": false, "message": "FRA base price not found"}),
            );
        }
        (
            200,
            json!({"status": true, "message": "FRA base price deleted"}),
        )
    }

    fn tick(&mut self) -> time::OffsetDateTime {
        self.clock += 1;
        reference_now() + Duration::minutes(self.clock)
    }
}

fn body_cents(body: &Value, key: &str) -> Option<i64> {
    let text = match body.get(key)? {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        _ => return None,
    };
    Price::parse(&text).ok().map(|price| price.cents())
}

fn invalid(message: &str) -> (u16, Value) {
    (422, json!({"status": false, "message": message}))
}

fn respond(request: Request, status: u16, payload: &Value) {
    let response = Response::from_string(payload.to_string())
        .with_status_code(status)
        .with_header(
            Header::from_bytes("Content-Type", "application/json")
                .expect("valid content type header"),
        );
    let _ = request.respond(response);
}
