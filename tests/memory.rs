mod common;

use common::{auth_header, register_agent, test_client};
use rocket::http::{ContentType, Status};

#[test]
fn set_get_roundtrip() {
    let client = test_client();
    let (_, key) = register_agent(&client);

    let res = client
        .post("/v1/memory")
        .header(ContentType::JSON)
        .header(auth_header(&key))
        .body(r#"{"key":"greeting","value":"hello"}"#)
        .dispatch();
    assert_eq!(res.status(), Status::Ok);

    let res = client.get("/v1/memory/greeting").header(auth_header(&key)).dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["value"], "hello");
    assert_eq!(body["namespace"], "default");
}

#[test]
fn get_missing_key_is_not_found() {
    let client = test_client();
    let (_, key) = register_agent(&client);
    let res = client.get("/v1/memory/nope").header(auth_header(&key)).dispatch();
    assert_eq!(res.status(), Status::NotFound);
}

#[test]
fn ttl_below_minimum_is_rejected() {
    let client = test_client();
    let (_, key) = register_agent(&client);
    let res = client
        .post("/v1/memory")
        .header(ContentType::JSON)
        .header(auth_header(&key))
        .body(r#"{"key":"k","value":"v","ttl_seconds":5}"#)
        .dispatch();
    assert_eq!(res.status(), Status::BadRequest);
}

#[test]
fn delete_then_get_is_not_found() {
    let client = test_client();
    let (_, key) = register_agent(&client);
    client
        .post("/v1/memory")
        .header(ContentType::JSON)
        .header(auth_header(&key))
        .body(r#"{"key":"k","value":"v"}"#)
        .dispatch();

    let res = client.delete("/v1/memory/k").header(auth_header(&key)).dispatch();
    assert_eq!(res.status(), Status::Ok);

    let res = client.get("/v1/memory/k").header(auth_header(&key)).dispatch();
    assert_eq!(res.status(), Status::NotFound);
}

#[test]
fn tenant_isolation_private_memory() {
    let client = test_client();
    let (_, key_a) = register_agent(&client);
    let (_, key_b) = register_agent(&client);

    client
        .post("/v1/memory")
        .header(ContentType::JSON)
        .header(auth_header(&key_a))
        .body(r#"{"key":"secret","value":"mine"}"#)
        .dispatch();

    let res = client.get("/v1/memory/secret").header(auth_header(&key_b)).dispatch();
    assert_eq!(res.status(), Status::NotFound);
}

#[test]
fn list_filters_by_prefix() {
    let client = test_client();
    let (_, key) = register_agent(&client);
    for k in ["alpha-1", "alpha-2", "beta-1"] {
        client
            .post("/v1/memory")
            .header(ContentType::JSON)
            .header(auth_header(&key))
            .body(format!(r#"{{"key":"{k}","value":"v"}}"#))
            .dispatch();
    }

    let res = client.get("/v1/memory?prefix=alpha").header(auth_header(&key)).dispatch();
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["count"], 2);
}
