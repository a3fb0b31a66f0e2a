mod common;

use common::{auth_header, register_agent, test_client};
use rocket::http::{ContentType, Status};

#[test]
fn private_by_default_not_listed() {
    let client = test_client();
    let (agent_id, _key) = register_agent(&client);
    let res = client.get("/v1/directory").dispatch();
    let body: serde_json::Value = res.into_json().unwrap();
    assert!(body["agents"].as_array().unwrap().iter().all(|a| a["agent_id"] != agent_id));
}

#[test]
fn opting_into_public_makes_agent_listed() {
    let client = test_client();
    let (agent_id, key) = register_agent(&client);
    let res = client
        .put("/v1/directory/me")
        .header(ContentType::JSON)
        .header(auth_header(&key))
        .body(r#"{"public":true,"capabilities":["search","translate"]}"#)
        .dispatch();
    assert_eq!(res.status(), Status::Ok);

    let res = client.get("/v1/directory").dispatch();
    let body: serde_json::Value = res.into_json().unwrap();
    assert!(body["agents"].as_array().unwrap().iter().any(|a| a["agent_id"] == agent_id));
}

#[test]
fn capability_filter_is_exact_match() {
    let client = test_client();
    let (agent_id, key) = register_agent(&client);
    client
        .put("/v1/directory/me")
        .header(ContentType::JSON)
        .header(auth_header(&key))
        .body(r#"{"public":true,"capabilities":["search"]}"#)
        .dispatch();

    let res = client.get("/v1/directory?capability=search").dispatch();
    let body: serde_json::Value = res.into_json().unwrap();
    assert!(body["agents"].as_array().unwrap().iter().any(|a| a["agent_id"] == agent_id));

    let res = client.get("/v1/directory?capability=translate").dispatch();
    let body: serde_json::Value = res.into_json().unwrap();
    assert!(body["agents"].as_array().unwrap().iter().all(|a| a["agent_id"] != agent_id));
}
