mod common;

use common::{auth_header, register_agent, test_client};
use rocket::http::{ContentType, Status};

#[test]
fn create_list_toggle_delete() {
    let client = test_client();
    let (_, key) = register_agent(&client);

    let res = client
        .post("/v1/schedules")
        .header(ContentType::JSON)
        .header(auth_header(&key))
        .body(r#"{"cron_expr":"0 0 * * *","payload":"daily"}"#)
        .dispatch();
    assert_eq!(res.status(), Status::Ok);
    let task: serde_json::Value = res.into_json().unwrap();
    let task_id = task["task_id"].as_str().unwrap();
    assert!(task["enabled"].as_bool().unwrap());

    let res = client
        .put(format!("/v1/schedules/{task_id}"))
        .header(ContentType::JSON)
        .header(auth_header(&key))
        .body(r#"{"enabled":false}"#)
        .dispatch();
    assert_eq!(res.status(), Status::Ok);

    let res = client.get(format!("/v1/schedules/{task_id}")).header(auth_header(&key)).dispatch();
    let task: serde_json::Value = res.into_json().unwrap();
    assert!(!task["enabled"].as_bool().unwrap());

    let res = client.delete(format!("/v1/schedules/{task_id}")).header(auth_header(&key)).dispatch();
    assert_eq!(res.status(), Status::Ok);

    let res = client.get(format!("/v1/schedules/{task_id}")).header(auth_header(&key)).dispatch();
    assert_eq!(res.status(), Status::NotFound);
}

#[test]
fn invalid_cron_expression_is_bad_request() {
    let client = test_client();
    let (_, key) = register_agent(&client);
    let res = client
        .post("/v1/schedules")
        .header(ContentType::JSON)
        .header(auth_header(&key))
        .body(r#"{"cron_expr":"not a cron","payload":"x"}"#)
        .dispatch();
    assert_eq!(res.status(), Status::BadRequest);
}

/// Drives the scheduler tick directly against the store, since forcing
/// `next_run_at` into the past has no HTTP surface (spec.md §8 scenario 5).
#[test]
fn cron_enqueue_on_tick_matches_scenario() {
    use agentforge::events::EventBus;
    use agentforge::models::CreateSchedule;
    use agentforge::store::Store;
    use rusqlite::params;

    let db_path = format!("/tmp/agentforge_test_{}.db", uuid::Uuid::new_v4().simple());
    let store = Store::new(&db_path);
    let events = EventBus::new();

    let task = agentforge::scheduler::create(
        &store,
        "agent_test",
        CreateSchedule {
            cron_expr: "*/1 * * * *".to_string(),
            payload: "tick-payload".to_string(),
            queue_name: "tick-q".to_string(),
            priority: 5,
            max_attempts: 3,
        },
    )
    .unwrap();

    store
        .conn()
        .execute(
            "UPDATE scheduled_tasks SET next_run_at = '2000-01-01T00:00:00Z' WHERE task_id = ?1",
            params![task.task_id],
        )
        .unwrap();

    agentforge::scheduler::run_tick(&store, &events);

    let jobs = agentforge::queue::list(&store, "agent_test", Some("tick-q"), None).unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].payload, "tick-payload");
    assert_eq!(jobs[0].status, "pending");

    let refreshed = agentforge::scheduler::get(&store, "agent_test", &task.task_id).unwrap();
    assert!(refreshed.next_run_at.as_str() > "2000-01-01T00:00:00Z");
}
