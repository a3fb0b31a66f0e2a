pub mod config;
pub mod directory;
pub mod error;
pub mod events;
pub mod identity;
pub mod memory;
pub mod models;
pub mod push;
pub mod queue;
pub mod relay;
pub mod routes;
pub mod scheduler;
pub mod shared_memory;
pub mod store;
pub mod webhooks;

use config::Config;
use events::EventBus;
use push::PushHub;
use std::sync::Arc;
use store::Store;

pub fn rocket() -> rocket::Rocket<rocket::Build> {
    rocket_with_config(Config::from_env())
}

pub fn rocket_with_config(config: Config) -> rocket::Rocket<rocket::Build> {
    let store = Store::new(&config.db_path);
    build_rocket(store, config)
}

/// Builds the app around an already-open store, for tests that want an
/// in-memory or temp-file database without going through `from_env`.
pub fn rocket_with_store_and_config(store: Store, config: Config) -> rocket::Rocket<rocket::Build> {
    build_rocket(store, config)
}

fn build_rocket(store: Store, config: Config) -> rocket::Rocket<rocket::Build> {
    let store = Arc::new(store);
    let events = Arc::new(EventBus::new());
    let hub = PushHub::default();

    let webhook_receiver = events.sender.subscribe();
    let webhook_db_path = config.db_path.clone();
    let webhook_timeout_secs = config.webhook_timeout_secs;

    let scheduler_store = store.clone();
    let scheduler_events = events.clone();
    let scheduler_tick_secs = config.scheduler_tick_secs;

    rocket::build()
        .manage(store)
        .manage(events)
        .manage(config)
        .manage(hub)
        .register("/", rocket::catchers![routes::too_many_requests, routes::not_found])
        .mount(
            "/",
            rocket::routes![
                routes::register,
                routes::heartbeat,
                routes::stats,
                routes::memory_set,
                routes::memory_get,
                routes::memory_list,
                routes::memory_delete,
                routes::shared_memory_set,
                routes::shared_memory_get,
                routes::shared_memory_list,
                routes::shared_memory_namespaces,
                routes::shared_memory_delete,
                routes::update_me,
                routes::get_me,
                routes::directory_list,
                routes::relay_send,
                routes::relay_inbox,
                routes::relay_mark_read,
                routes::queue_submit,
                routes::queue_claim,
                routes::queue_complete,
                routes::queue_fail,
                routes::queue_list,
                routes::queue_get,
                routes::queue_dead_letter,
                routes::queue_replay,
                routes::schedule_create,
                routes::schedule_list,
                routes::schedule_get,
                routes::schedule_toggle,
                routes::schedule_delete,
                routes::webhook_register,
                routes::webhook_list,
                routes::webhook_delete,
                routes::push_socket,
                routes::health,
            ],
        )
        .attach(rocket::fairing::AdHoc::on_liftoff("Webhook Dispatcher", move |_rocket| {
            Box::pin(async move {
                webhooks::spawn_dispatcher(webhook_receiver, webhook_db_path, webhook_timeout_secs);
                tracing::info!("webhook dispatcher started");
            })
        }))
        .attach(rocket::fairing::AdHoc::on_liftoff("Scheduler", move |_rocket| {
            Box::pin(async move {
                scheduler::spawn_scheduler_task(scheduler_store, scheduler_events, scheduler_tick_secs);
                tracing::info!("scheduler started");
            })
        }))
}
