mod common;

use common::{auth_header, register_agent, test_client};
use rocket::http::{ContentType, Status};

#[test]
fn register_returns_agent_id_and_key_once() {
    let client = test_client();
    let res = client.post("/v1/register").header(ContentType::JSON).body("{}").dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    assert!(body["agent_id"].as_str().unwrap().starts_with("agent_"));
    assert!(body["api_key"].as_str().unwrap().starts_with("af_"));
}

#[test]
fn health_check_requires_no_auth() {
    let client = test_client();
    let res = client.get("/v1/health").dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["status"], "ok");
}

#[test]
fn heartbeat_requires_api_key() {
    let client = test_client();
    let res = client.post("/v1/heartbeat").header(ContentType::JSON).body("{}").dispatch();
    assert_eq!(res.status(), Status::Unauthorized);
}

#[test]
fn heartbeat_updates_status() {
    let client = test_client();
    let (_, key) = register_agent(&client);
    let res = client
        .post("/v1/heartbeat")
        .header(ContentType::JSON)
        .header(auth_header(&key))
        .body(r#"{"status":"busy"}"#)
        .dispatch();
    assert_eq!(res.status(), Status::Ok);
}

#[test]
fn invalid_api_key_is_unauthorized() {
    let client = test_client();
    let res = client
        .get("/v1/stats")
        .header(auth_header("af_not_a_real_key"))
        .dispatch();
    assert_eq!(res.status(), Status::Unauthorized);
}

#[test]
fn stats_reflects_owned_rows() {
    let client = test_client();
    let (_, key) = register_agent(&client);
    client
        .post("/v1/memory")
        .header(ContentType::JSON)
        .header(auth_header(&key))
        .body(r#"{"key":"a","value":"1"}"#)
        .dispatch();

    let res = client.get("/v1/stats").header(auth_header(&key)).dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["memory_keys"], 1);
}

#[test]
fn raw_api_key_never_reappears_after_registration() {
    let client = test_client();
    let res = client.post("/v1/register").header(ContentType::JSON).body("{}").dispatch();
    let body: serde_json::Value = res.into_json().unwrap();
    let api_key = body["api_key"].as_str().unwrap().to_string();
    let key = api_key.clone();

    let res = client.get("/v1/directory/me").header(auth_header(&key)).dispatch();
    let me: serde_json::Value = res.into_json().unwrap();
    assert!(!me.to_string().contains(&api_key));

    let res = client.get("/v1/stats").header(auth_header(&key)).dispatch();
    let stats: serde_json::Value = res.into_json().unwrap();
    assert!(!stats.to_string().contains(&api_key));
}

#[test]
fn rate_limit_exceeded_returns_429_with_retry_after() {
    use agentforge::config::Config;
    use agentforge::store::Store;
    use rocket::local::blocking::Client;

    let db_path = format!("/tmp/agentforge_test_{}.db", uuid::Uuid::new_v4().simple());
    let store = Store::new(&db_path);
    let config = Config { db_path, rate_limit_per_minute: 2, ..Config::default() };
    let client = Client::tracked(agentforge::rocket_with_store_and_config(store, config)).unwrap();
    let (_, key) = register_agent(&client);

    // First 2 requests succeed, matching the configured cap.
    for _ in 0..2 {
        let res = client.get("/v1/stats").header(auth_header(&key)).dispatch();
        assert_eq!(res.status(), Status::Ok);
    }
    let res = client.get("/v1/stats").header(auth_header(&key)).dispatch();
    assert_eq!(res.status(), Status::TooManyRequests);
    assert!(res.headers().get_one("Retry-After").is_some());
}
