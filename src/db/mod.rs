//! Database layer: pool and the PostgreSQL user store.

mod pool;
mod users;

pub use pool::{create_pool, DbPool};
pub use users::PgUserStore;
