use agentforge::config::Config;
use agentforge::store::Store;
use rocket::http::{ContentType, Header};
use rocket::local::blocking::Client;

/// Builds a Rocket test client around an isolated temp-file SQLite db,
/// mirroring the teacher's own `test_client()` helper shape.
#[allow(dead_code)]
pub fn test_client() -> Client {
    let db_path = format!("/tmp/agentforge_test_{}.db", uuid::Uuid::new_v4().simple());
    let store = Store::new(&db_path);
    let config = Config { db_path, rate_limit_per_minute: 300, ..Config::default() };
    let rocket = agentforge::rocket_with_store_and_config(store, config);
    Client::tracked(rocket).expect("valid rocket instance")
}

#[allow(dead_code)]
pub fn register_agent(client: &Client) -> (String, String) {
    let res = client.post("/v1/register").header(ContentType::JSON).body("{}").dispatch();
    let body: serde_json::Value = res.into_json().unwrap();
    (body["agent_id"].as_str().unwrap().to_string(), body["api_key"].as_str().unwrap().to_string())
}

#[allow(dead_code)]
pub fn auth_header(api_key: &str) -> Header<'static> {
    Header::new("X-API-Key", api_key.to_string())
}
