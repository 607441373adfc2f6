mod account;
mod cities;
mod error;

use axum::Router;
use std::sync::Arc;

use crate::auth::AuthBackend;
use crate::db::Database;

pub use account::AccountState;
pub use cities::CitiesState;
pub use error::ApiError;

/// Create the API router.
pub fn create_api_router(db: Database, auth: AuthBackend) -> Router {
    let account_state = account::AccountState {
        identities: Arc::new(db.users()),
        auth: auth.clone(),
    };

    let cities_state = cities::CitiesState {
        db: db.clone(),
        auth,
    };

    Router::new()
        .nest("/account", account::router(account_state))
        .nest("/v1/cities", cities::router(cities_state))
        .nest("/v2/cities", cities::router_v2(db))
}
