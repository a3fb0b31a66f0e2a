mod common;

use common::{auth_header, register_agent, test_client};
use rocket::http::{ContentType, Status};

#[test]
fn cross_agent_relay_and_mark_read() {
    let client = test_client();
    let (agent_a, key_a) = register_agent(&client);
    let (agent_b, key_b) = register_agent(&client);

    let res = client
        .post("/v1/relay/send")
        .header(ContentType::JSON)
        .header(auth_header(&key_a))
        .body(format!(r#"{{"to_agent":"{agent_b}","payload":"hello"}}"#))
        .dispatch();
    assert_eq!(res.status(), Status::Ok);

    let res = client.get("/v1/relay/inbox?unread_only=true").header(auth_header(&key_b)).dispatch();
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["count"], 1);
    assert_eq!(body["messages"][0]["from_agent"], agent_a);
    assert_eq!(body["messages"][0]["payload"], "hello");
    let message_id = body["messages"][0]["message_id"].as_str().unwrap();

    let res = client.post(format!("/v1/relay/{message_id}/read")).header(auth_header(&key_b)).dispatch();
    assert_eq!(res.status(), Status::Ok);

    let res = client.get("/v1/relay/inbox?unread_only=true").header(auth_header(&key_b)).dispatch();
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["count"], 0);
}

#[test]
fn mark_read_twice_is_idempotent() {
    let client = test_client();
    let (_, key_a) = register_agent(&client);
    let (agent_b, key_b) = register_agent(&client);

    client
        .post("/v1/relay/send")
        .header(ContentType::JSON)
        .header(auth_header(&key_a))
        .body(format!(r#"{{"to_agent":"{agent_b}","payload":"hi"}}"#))
        .dispatch();

    let res = client.get("/v1/relay/inbox").header(auth_header(&key_b)).dispatch();
    let body: serde_json::Value = res.into_json().unwrap();
    let message_id = body["messages"][0]["message_id"].as_str().unwrap();

    for _ in 0..2 {
        let res = client.post(format!("/v1/relay/{message_id}/read")).header(auth_header(&key_b)).dispatch();
        assert_eq!(res.status(), Status::Ok);
    }
}

#[test]
fn send_to_unknown_recipient_is_not_found() {
    let client = test_client();
    let (_, key) = register_agent(&client);
    let res = client
        .post("/v1/relay/send")
        .header(ContentType::JSON)
        .header(auth_header(&key))
        .body(r#"{"to_agent":"agent_nonexistent","payload":"hi"}"#)
        .dispatch();
    assert_eq!(res.status(), Status::NotFound);
}

#[test]
fn channel_filter_scopes_inbox() {
    let client = test_client();
    let (_, key_a) = register_agent(&client);
    let (agent_b, key_b) = register_agent(&client);

    client
        .post("/v1/relay/send")
        .header(ContentType::JSON)
        .header(auth_header(&key_a))
        .body(format!(r#"{{"to_agent":"{agent_b}","payload":"a","channel":"alpha"}}"#))
        .dispatch();
    client
        .post("/v1/relay/send")
        .header(ContentType::JSON)
        .header(auth_header(&key_a))
        .body(format!(r#"{{"to_agent":"{agent_b}","payload":"b","channel":"beta"}}"#))
        .dispatch();

    let res = client.get("/v1/relay/inbox?channel=alpha").header(auth_header(&key_b)).dispatch();
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["count"], 1);
    assert_eq!(body["messages"][0]["payload"], "a");
}
