use crate::config::Config;
use crate::events::EventBus;
use crate::push::{self, PushHub};
use crate::store::Store;
use rocket::{get, State};
use rocket_ws as ws;
use std::sync::Arc;

/// Authenticated by `api_key` query parameter rather than the `X-API-Key`
/// header, since socket handshakes carry no custom headers in this client
/// contract (spec.md §4.J/§4.K).
#[get("/v1/relay/ws?<api_key>")]
pub fn push_socket(
    ws: ws::WebSocket,
    api_key: &str,
    store: &State<Arc<Store>>,
    config: &State<Config>,
    events: &State<Arc<EventBus>>,
    hub: &State<PushHub>,
) -> ws::Channel<'static> {
    let agent_id = crate::identity::authenticate(store, config.rate_limit_per_minute, api_key).ok();
    let store = store.inner().clone();
    let events = events.inner().clone();
    let hub = hub.inner().clone();

    ws.channel(move |stream| {
        Box::pin(async move {
            let Some(agent_id) = agent_id else {
                return Ok(());
            };
            push::run_session(stream, hub, store, events, agent_id).await
        })
    })
}
