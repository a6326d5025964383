// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use fra_app::{
    CreatePriceInput, DeletePriceInput, PanelError, PriceRecordId, ProfessionalId,
    PropertyTypeId, UpdatePriceInput,
};
use fra_client::Client;
use fra_testkit::{DEFAULT_TOKEN, MockServer, PriceFaker, price};
use serde_json::json;
use std::thread;
use std::time::Duration;
use tiny_http::{Response, Server};

fn client_for(server: &MockServer) -> Result<Client> {
    Client::new(server.base_url(), Duration::from_secs(2))
}

fn create_input(type_id: i64, non_intrusive: &str, intrusive: &str) -> CreatePriceInput {
    CreatePriceInput {
        token: DEFAULT_TOKEN.to_owned(),
        property_type_id: PropertyTypeId::new(type_id),
        non_intrusive_price: price(non_intrusive),
        intrusive_price: price(intrusive),
    }
}

#[test]
fn unreachable_backend_reports_actionable_transport_failure() -> Result<()> {
    let client = Client::new("http://127.0.0.1:1", Duration::from_millis(200))?;

    let envelope = client.list(Some(DEFAULT_TOKEN));
    assert!(!envelope.status);
    assert!(envelope.message.contains("127.0.0.1:1"));

    let error = client
        .create(&create_input(1, "10", "20"))
        .expect_err("create should fail");
    assert!(matches!(error, PanelError::TransportFailure(_)));
    assert!(error.reached_network());
    Ok(())
}

#[test]
fn list_sends_token_as_query_parameter() -> Result<()> {
    let server = MockServer::start()?;
    server.seed(&mut PriceFaker::new(11), 7, 3);
    let client = client_for(&server)?;

    let envelope = client.list(Some(DEFAULT_TOKEN));
    assert!(envelope.status);
    let records = envelope.data.expect("records expected");
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].id, PriceRecordId::new(1));

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "GET");
    assert_eq!(requests[0].path, "/professional-fra-base-prices/get-all");
    assert_eq!(requests[0].api_token.as_deref(), Some(DEFAULT_TOKEN));
    Ok(())
}

#[test]
fn list_with_wrong_token_is_not_success() -> Result<()> {
    let server = MockServer::start()?;
    let client = client_for(&server)?;

    let envelope = client.list(Some("stale"));
    assert!(!envelope.status);
    assert_eq!(envelope.message, "Unauthenticated.");
    assert!(envelope.data.is_none());
    Ok(())
}

#[test]
fn create_posts_prices_as_text_and_returns_record() -> Result<()> {
    let server = MockServer::start()?;
    let client = client_for(&server)?;

    let record = client
        .create(&create_input(2, "150", "200.5"))?
        .expect("store echoes the record");
    assert_eq!(record.non_intrusive_price, Some(price("150.00")));
    assert_eq!(record.intrusive_price, Some(price("200.50")));
    assert_eq!(record.professional_id, ProfessionalId::new(7));
    assert_eq!(record.property_type_label(), "Bungalow");

    let requests = server.requests();
    assert_eq!(requests[0].path, "/professional-fra-base-prices/store");
    assert_eq!(
        requests[0].body,
        Some(json!({
            "api_token": DEFAULT_TOKEN,
            "property_type_id": 2,
            "non_intrusive_base_price": "150",
            "intrusive_base_price": "200.5",
        }))
    );
    Ok(())
}

#[test]
fn update_sends_id_and_new_prices() -> Result<()> {
    let server = MockServer::start()?;
    server.seed(&mut PriceFaker::new(5), 7, 1);
    let client = client_for(&server)?;

    let record = client.update(&UpdatePriceInput {
        token: DEFAULT_TOKEN.to_owned(),
        id: PriceRecordId::new(1),
        non_intrusive_price: price("175"),
        intrusive_price: price("225"),
    })?
    .expect("update echoes the record");
    assert_eq!(record.non_intrusive_price, Some(price("175.00")));
    assert_eq!(server.records()[0].intrusive_cents, 22_500);

    let body = server.requests()[0].body.clone().expect("body expected");
    assert_eq!(body["id"], json!(1));
    assert_eq!(body["intrusive_base_price"], json!("225"));
    Ok(())
}

#[test]
fn delete_omits_professional_id_unless_supplied() -> Result<()> {
    let server = MockServer::start()?;
    server.seed(&mut PriceFaker::new(5), 7, 2);
    let client = client_for(&server)?;

    client.delete(&DeletePriceInput {
        token: DEFAULT_TOKEN.to_owned(),
        id: PriceRecordId::new(1),
        professional_id: None,
    })?;
    let ack = client.delete(&DeletePriceInput {
        token: DEFAULT_TOKEN.to_owned(),
        id: PriceRecordId::new(2),
        professional_id: Some(ProfessionalId::new(7)),
    })?;
    assert!(ack.status);
    assert_eq!(ack.message, "FRA base price deleted");
    assert!(server.records().is_empty());

    let requests = server.requests();
    let first = requests[0].body.clone().expect("body expected");
    let second = requests[1].body.clone().expect("body expected");
    assert!(first.get("professional_id").is_none());
    assert_eq!(second["professional_id"], json!(7));
    Ok(())
}

#[test]
fn delete_of_missing_record_is_remote_rejection() -> Result<()> {
    let server = MockServer::start()?;
    let client = client_for(&server)?;

    let error = client
        .delete(&DeletePriceInput {
            token: DEFAULT_TOKEN.to_owned(),
            id: PriceRecordId::new(99),
            professional_id: None,
        })
        .expect_err("delete should be rejected");
    assert_eq!(
        error,
        PanelError::RemoteRejected("FRA base price not found".to_owned())
    );
    Ok(())
}

#[test]
fn injected_failures_map_to_error_taxonomy() -> Result<()> {
    let server = MockServer::start()?;
    let client = client_for(&server)?;

    server.reject_next("Duplicate property type");
    let rejected = client
        .create(&create_input(1, "10", "20"))
        .expect_err("should be rejected");
    assert_eq!(
        rejected,
        PanelError::RemoteRejected("Duplicate property type".to_owned())
    );

    server.fail_next(500, None);
    let failed = client
        .create(&create_input(1, "10", "20"))
        .expect_err("should fail");
    assert_eq!(
        failed,
        PanelError::TransportFailure("server returned 500".to_owned())
    );

    server.garble_next();
    let garbled = client
        .create(&create_input(1, "10", "20"))
        .expect_err("should be rejected");
    assert_eq!(
        garbled,
        PanelError::RemoteRejected("Failed to add FRA base price".to_owned())
    );

    assert!(server.records().is_empty());
    Ok(())
}

#[test]
fn validation_error_status_carries_server_message() -> Result<()> {
    let server = MockServer::start()?;
    let client = client_for(&server)?;

    let error = client
        .create(&create_input(404, "10", "20"))
        .expect_err("unknown type should fail");
    assert_eq!(
        error,
        PanelError::TransportFailure("The selected property type id is invalid.".to_owned())
    );
    Ok(())
}

#[test]
fn property_types_come_from_catalog_path() -> Result<()> {
    let server = MockServer::start()?;
    server.set_catalog(vec![(3, "Studio".to_owned()), (4, "Loft".to_owned())]);
    let client = client_for(&server)?;

    let types = client.property_types(Some(DEFAULT_TOKEN))?;
    let names = types.iter().map(|t| t.name.as_str()).collect::<Vec<_>>();
    assert_eq!(names, vec!["Studio", "Loft"]);
    assert_eq!(types[0].id, PropertyTypeId::new(3));
    assert_eq!(server.request_paths(), vec!["/property-types/get-all"]);
    Ok(())
}

#[test]
fn property_types_accept_bare_list_on_custom_path() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(request.url(), "/lookups/property-types?api_token=abc");
        let response = Response::from_string(r#"[{"id":1,"name":"Flat"}]"#).with_status_code(200);
        request.respond(response).expect("response should succeed");
    });

    let client =
        Client::new(&addr, Duration::from_secs(1))?.with_catalog_path("/lookups/property-types");
    let types = client.property_types(Some("abc"))?;
    assert_eq!(types.len(), 1);
    assert_eq!(types[0].name, "Flat");

    handle.join().expect("server thread should join");
    Ok(())
}

fn serve_once(body: &'static str) -> Result<(String, thread::JoinHandle<()>)> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());
    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        let response = Response::from_string(body).with_status_code(200);
        request.respond(response).expect("response should succeed");
    });
    Ok((addr, handle))
}

#[test]
fn create_acknowledged_without_record_is_success() -> Result<()> {
    let (addr, handle) = serve_once(r#"{"status":true,"message":"Created"}"#)?;
    let client = Client::new(&addr, Duration::from_secs(1))?;

    let record = client.create(&create_input(1, "10", "20"))?;
    assert_eq!(record, None);

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn list_keeps_records_with_null_or_long_prices() -> Result<()> {
    let (addr, handle) = serve_once(
        r#"{"status":true,"message":"ok","data":[
            {"id":1,"professional_id":7,"property_type_id":1,
             "non_intrusive_base_price":"150.000","intrusive_base_price":"99.999"},
            {"id":2,"professional_id":7,"property_type_id":2,
             "non_intrusive_base_price":"80","intrusive_base_price":null}]}"#,
    )?;
    let client = Client::new(&addr, Duration::from_secs(1))?;

    let envelope = client.list(Some(DEFAULT_TOKEN));
    assert!(envelope.status);
    let records = envelope.data.expect("records expected");
    assert_eq!(records.len(), 2);
    assert_eq!(
        records[0].non_intrusive_price.as_ref().map(|p| p.as_str()),
        Some("150.000")
    );
    assert_eq!(
        records[0].intrusive_price.as_ref().map(|p| p.display()),
        Some("$100.00".to_owned())
    );
    assert_eq!(records[1].intrusive_price, None);

    handle.join().expect("server thread should join");
    Ok(())
}
