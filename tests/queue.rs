mod common;

use common::{auth_header, register_agent, test_client};
use rocket::http::{ContentType, Status};

#[test]
fn priority_claim_returns_highest_priority_first() {
    let client = test_client();
    let (_, key) = register_agent(&client);

    client
        .post("/v1/queue/submit")
        .header(ContentType::JSON)
        .header(auth_header(&key))
        .body(r#"{"payload":"low","priority":1}"#)
        .dispatch();
    client
        .post("/v1/queue/submit")
        .header(ContentType::JSON)
        .header(auth_header(&key))
        .body(r#"{"payload":"high","priority":10}"#)
        .dispatch();

    let res = client.post("/v1/queue/claim").header(auth_header(&key)).dispatch();
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["payload"], "high");
}

#[test]
fn retry_ladder_reaches_dead_letter_then_replay() {
    let client = test_client();
    let (_, key) = register_agent(&client);

    client
        .post("/v1/queue/submit")
        .header(ContentType::JSON)
        .header(auth_header(&key))
        .body(r#"{"payload":"flaky","max_attempts":2}"#)
        .dispatch();

    for _ in 0..2 {
        let res = client.post("/v1/queue/claim").header(auth_header(&key)).dispatch();
        let job: serde_json::Value = res.into_json().unwrap();
        let job_id = job["job_id"].as_str().unwrap();
        client
            .post(format!("/v1/queue/{job_id}/fail"))
            .header(ContentType::JSON)
            .header(auth_header(&key))
            .body(r#"{"reason":"boom"}"#)
            .dispatch();
    }

    let res = client.post("/v1/queue/claim").header(auth_header(&key)).dispatch();
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["status"], "empty");

    let res = client.get("/v1/queue/dead-letter").header(auth_header(&key)).dispatch();
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["count"], 1);
    let job_id = body["jobs"][0]["job_id"].as_str().unwrap();
    assert_eq!(body["jobs"][0]["status"], "dead");

    let res = client.post(format!("/v1/queue/{job_id}/replay")).header(auth_header(&key)).dispatch();
    assert_eq!(res.status(), Status::Ok);

    let res = client.get(format!("/v1/queue/{job_id}")).header(auth_header(&key)).dispatch();
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["status"], "pending");
    assert_eq!(body["attempts"], 0);
}

#[test]
fn complete_requires_claim_by_caller() {
    let client = test_client();
    let (_, key_a) = register_agent(&client);
    let (_, key_b) = register_agent(&client);

    client
        .post("/v1/queue/submit")
        .header(ContentType::JSON)
        .header(auth_header(&key_a))
        .body(r#"{"payload":"x"}"#)
        .dispatch();
    let res = client.post("/v1/queue/claim").header(auth_header(&key_a)).dispatch();
    let job: serde_json::Value = res.into_json().unwrap();
    let job_id = job["job_id"].as_str().unwrap();

    let res = client
        .post(format!("/v1/queue/{job_id}/complete"))
        .header(ContentType::JSON)
        .header(auth_header(&key_b))
        .body("{}")
        .dispatch();
    assert_eq!(res.status(), Status::NotFound);
}

#[test]
fn tenant_isolation_queue_list() {
    let client = test_client();
    let (_, key_a) = register_agent(&client);
    let (_, key_b) = register_agent(&client);

    client
        .post("/v1/queue/submit")
        .header(ContentType::JSON)
        .header(auth_header(&key_a))
        .body(r#"{"payload":"a-job"}"#)
        .dispatch();

    let res = client.get("/v1/queue").header(auth_header(&key_b)).dispatch();
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["count"], 0);
}

#[test]
fn claim_on_empty_queue_returns_empty_status() {
    let client = test_client();
    let (_, key) = register_agent(&client);
    let res = client.post("/v1/queue/claim").header(auth_header(&key)).dispatch();
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["status"], "empty");
}

/// Job uniqueness (spec.md §8 invariants): of many concurrent claim
/// attempts against a single pending job, exactly one observes it.
#[test]
fn concurrent_claims_never_return_the_same_job_twice() {
    use agentforge::models::SubmitJob;
    use agentforge::store::Store;
    use std::sync::Arc;

    let db_path = format!("/tmp/agentforge_test_{}.db", uuid::Uuid::new_v4().simple());
    let store = Arc::new(Store::new(&db_path));
    agentforge::queue::submit(
        &store,
        "agent_test",
        SubmitJob { payload: "x".to_string(), queue_name: "q".to_string(), priority: 0, max_attempts: 3 },
    )
    .unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = store.clone();
            std::thread::spawn(move || agentforge::queue::claim(&store, "agent_test", None, 300).unwrap())
        })
        .collect();

    let winners: Vec<_> = handles.into_iter().filter_map(|h| h.join().unwrap()).collect();
    assert_eq!(winners.len(), 1);
}
