//! Cities API.
//!
//! v1 is guarded by the inline re-auth filter: callers send a bearer access
//! token plus `x-refresh-token`, and an expired access token is renewed in
//! place. v2 exposes a public, read-only name listing.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;
use tracing::info;

use super::error::{ApiError, ResultExt, parse_uuid};
use crate::auth::{ApiAuth, AuthBackend, require_fresh_credentials};
use crate::db::Database;
use crate::impl_has_auth_backend;

#[derive(Clone)]
pub struct CitiesState {
    pub db: Database,
    pub auth: AuthBackend,
}

impl_has_auth_backend!(CitiesState);

pub fn router(state: CitiesState) -> Router {
    let auth = state.auth.clone();
    Router::new()
        .route("/", get(list_cities).post(create_city))
        .route(
            "/{city_id}",
            get(get_city).put(update_city).delete(delete_city),
        )
        .with_state(state)
        .layer(middleware::from_fn_with_state(auth, require_fresh_credentials))
}

pub fn router_v2(db: Database) -> Router {
    Router::new().route("/", get(list_city_names)).with_state(db)
}

#[derive(Deserialize)]
struct CreateCityRequest {
    #[serde(default)]
    city_name: String,
}

#[derive(Deserialize)]
struct UpdateCityRequest {
    #[serde(default)]
    city_id: String,
    #[serde(default)]
    city_name: String,
}

fn validate_name(name: &str) -> Result<&str, ApiError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request("City name cannot be empty"));
    }
    Ok(name)
}

async fn list_cities(State(state): State<CitiesState>) -> Result<impl IntoResponse, ApiError> {
    let cities = state
        .db
        .cities()
        .list()
        .await
        .db_err("Failed to list cities")?;
    Ok(Json(cities))
}

async fn get_city(
    State(state): State<CitiesState>,
    Path(city_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let city_id = parse_uuid(&city_id)?;
    let city = state
        .db
        .cities()
        .get(&city_id)
        .await
        .db_err("Failed to get city")?
        .ok_or_else(|| ApiError::not_found("Invalid cityID"))?;
    Ok(Json(city))
}

async fn create_city(
    State(state): State<CitiesState>,
    ApiAuth(user): ApiAuth,
    Json(payload): Json<CreateCityRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = validate_name(&payload.city_name)?;
    let city_id = uuid::Uuid::new_v4().to_string();

    let city = state
        .db
        .cities()
        .create(&city_id, name)
        .await
        .db_err("Failed to create city")?;

    info!(user = %user.user_id, city = %city.city_id, "Created city");

    Ok((StatusCode::CREATED, Json(city)))
}

async fn update_city(
    State(state): State<CitiesState>,
    Path(city_id): Path<String>,
    Json(payload): Json<UpdateCityRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let city_id = parse_uuid(&city_id)?;
    if parse_uuid(&payload.city_id)? != city_id {
        return Err(ApiError::bad_request("City ID does not match"));
    }
    let name = validate_name(&payload.city_name)?;

    let updated = state
        .db
        .cities()
        .update(&city_id, name)
        .await
        .db_err("Failed to update city")?;

    if !updated {
        return Err(ApiError::not_found("Invalid cityID"));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_city(
    State(state): State<CitiesState>,
    ApiAuth(user): ApiAuth,
    Path(city_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let city_id = parse_uuid(&city_id)?;

    let deleted = state
        .db
        .cities()
        .delete(&city_id)
        .await
        .db_err("Failed to delete city")?;

    if !deleted {
        return Err(ApiError::not_found("Invalid cityID"));
    }

    info!(user = %user.user_id, city = %city_id, "Deleted city");

    Ok(StatusCode::NO_CONTENT)
}

async fn list_city_names(State(db): State<Database>) -> Result<impl IntoResponse, ApiError> {
    let names = db
        .cities()
        .list_names()
        .await
        .db_err("Failed to list city names")?;
    Ok(Json(names))
}
