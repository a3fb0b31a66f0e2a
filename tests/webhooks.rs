mod common;

use common::{auth_header, register_agent, test_client};
use rocket::http::{ContentType, Status};
use std::io::{Read, Write};
use std::net::TcpListener;

#[test]
fn register_list_delete() {
    let client = test_client();
    let (_, key) = register_agent(&client);

    let res = client
        .post("/v1/webhooks")
        .header(ContentType::JSON)
        .header(auth_header(&key))
        .body(r#"{"url":"http://localhost:1/sink","event_types":["message.received"]}"#)
        .dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    let webhook_id = body["webhook_id"].as_str().unwrap().to_string();

    let res = client.get("/v1/webhooks").header(auth_header(&key)).dispatch();
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["count"], 1);

    let res = client.delete(format!("/v1/webhooks/{webhook_id}")).header(auth_header(&key)).dispatch();
    assert_eq!(res.status(), Status::Ok);
}

#[test]
fn unknown_event_type_is_rejected() {
    let client = test_client();
    let (_, key) = register_agent(&client);
    let res = client
        .post("/v1/webhooks")
        .header(ContentType::JSON)
        .header(auth_header(&key))
        .body(r#"{"url":"http://localhost:1/sink","event_types":["not.a.real.event"]}"#)
        .dispatch();
    assert_eq!(res.status(), Status::BadRequest);
}

/// Drives the fan-out scenario end to end (spec.md §8 scenario 6): a real
/// Rocket instance (so the liftoff-spawned dispatcher runs), a one-shot TCP
/// listener standing in for the subscriber, and an assertion that exactly
/// one POST with the matching event type arrives.
#[test]
fn webhook_fan_out_delivers_matching_event_only() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let url = format!("http://{addr}/hook");

    let received = std::thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut buf = [0u8; 4096];
        let n = stream.read(&mut buf).unwrap();
        let request = String::from_utf8_lossy(&buf[..n]).to_string();
        stream.write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n").ok();
        request
    });

    let client = test_client();
    let (agent_a, key_a) = register_agent(&client);
    let (agent_b, key_b) = register_agent(&client);

    client
        .post("/v1/webhooks")
        .header(ContentType::JSON)
        .header(auth_header(&key_b))
        .body(format!(r#"{{"url":"{url}","event_types":["message.received"]}}"#))
        .dispatch();

    client
        .post("/v1/relay/send")
        .header(ContentType::JSON)
        .header(auth_header(&key_a))
        .body(format!(r#"{{"to_agent":"{agent_b}","payload":"hello"}}"#))
        .dispatch();

    let request = received.join().unwrap();
    assert!(request.contains("POST /hook"));
    assert!(request.contains("message.received"));
    assert!(request.contains(&agent_a));
}
