// Route module decomposition — each domain area in its own file.

mod directory;
mod identity;
mod memory;
mod push;
mod queue;
mod relay;
mod scheduler;
mod shared_memory;
mod system;
mod webhooks;

pub use directory::{directory_list, get_me, update_me};
pub use identity::{heartbeat, register, stats};
pub use memory::{memory_delete, memory_get, memory_list, memory_set};
pub use push::push_socket;
pub use queue::{
    queue_claim, queue_complete, queue_dead_letter, queue_fail, queue_get, queue_list, queue_replay, queue_submit,
};
pub use relay::{relay_inbox, relay_mark_read, relay_send};
pub use scheduler::{schedule_create, schedule_delete, schedule_get, schedule_list, schedule_toggle};
pub use shared_memory::{
    shared_memory_delete, shared_memory_get, shared_memory_list, shared_memory_namespaces, shared_memory_set,
};
pub use system::{health, not_found, too_many_requests};
pub use webhooks::{webhook_delete, webhook_list, webhook_register};

use crate::config::Config;
use crate::error::AppResult;
use crate::identity::ApiKeyHeader;
use crate::store::Store;
use rocket::State;
use std::sync::Arc;

/// Authenticates the request guard's presented key and applies the rate
/// limiter in one step; every authenticated route calls this first.
pub(crate) fn authed(store: &State<Arc<Store>>, config: &State<Config>, key: &ApiKeyHeader) -> AppResult<String> {
    crate::identity::authenticate(store, config.rate_limit_per_minute, &key.0)
}
