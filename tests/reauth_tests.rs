mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use cities_manager::auth::{
    NEW_ACCESS_TOKEN_EXPIRES_HEADER, NEW_ACCESS_TOKEN_HEADER, NEW_REFRESH_TOKEN_EXPIRES_HEADER,
    NEW_REFRESH_TOKEN_HEADER, REFRESH_TOKEN_HEADER, UserDirectory,
};
use cities_manager::jwt::TokenCodec;
use common::{authed_request, create_test_app, now, str_field};
use serde_json::json;

const CITIES: &str = "/api/v1/cities";

#[tokio::test]
async fn test_fresh_token_passes_without_new_bundle() {
    let t = create_test_app().await;
    let session = t.register("alice@example.com").await;

    let response = t
        .send(authed_request(
            "GET",
            CITIES,
            str_field(&session, "access_token"),
            str_field(&session, "refresh_token"),
            None,
        ))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!([]));
    assert!(!response.headers.contains_key(NEW_ACCESS_TOKEN_HEADER));
    assert!(!response.headers.contains_key(NEW_REFRESH_TOKEN_EXPIRES_HEADER));

    // The stored refresh token is untouched
    let stored = t
        .db
        .users()
        .find_by_email("alice@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        stored.refresh_token.as_deref(),
        Some(str_field(&session, "refresh_token"))
    );
}

#[tokio::test]
async fn test_expired_token_refreshed_and_request_served() {
    let t = create_test_app().await;
    let session = t.register("alice@example.com").await;
    let refresh = str_field(&session, "refresh_token").to_string();
    let expired = t.expired_access_token("alice@example.com").await;

    let response = t
        .send(authed_request(
            "POST",
            CITIES,
            &expired,
            &refresh,
            Some(json!({"city_name": "Oslo"})),
        ))
        .await;

    // The handler ran exactly once and produced the body
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["city_name"], "Oslo");
    assert_eq!(t.db.cities().list().await.unwrap().len(), 1);

    let headers = &response.headers;
    let new_access = headers[NEW_ACCESS_TOKEN_HEADER].to_str().unwrap();
    let new_refresh = headers[NEW_REFRESH_TOKEN_HEADER].to_str().unwrap();
    let access_exp: u64 = headers[NEW_ACCESS_TOKEN_EXPIRES_HEADER]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    let refresh_exp: u64 = headers[NEW_REFRESH_TOKEN_EXPIRES_HEADER]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();

    assert_ne!(new_refresh, refresh);
    assert!(access_exp > now());
    assert!(refresh_exp > access_exp);

    let claims = TokenCodec::new(&t.settings)
        .decode(new_access, true)
        .unwrap();
    assert_eq!(claims.exp, access_exp);

    let stored = t
        .db
        .users()
        .find_by_email("alice@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.refresh_token.as_deref(), Some(new_refresh));
    assert_eq!(stored.refresh_token_expires_at, Some(refresh_exp));
}

#[tokio::test]
async fn test_refreshed_bundle_works_and_old_token_is_dead() {
    let t = create_test_app().await;
    let session = t.register("alice@example.com").await;
    let refresh = str_field(&session, "refresh_token").to_string();
    let expired = t.expired_access_token("alice@example.com").await;

    let first = t
        .send(authed_request("GET", CITIES, &expired, &refresh, None))
        .await;
    assert_eq!(first.status, StatusCode::OK);
    let new_access = first.headers[NEW_ACCESS_TOKEN_HEADER]
        .to_str()
        .unwrap()
        .to_string();
    let new_refresh = first.headers[NEW_REFRESH_TOKEN_HEADER]
        .to_str()
        .unwrap()
        .to_string();

    // Replaying the rotated-out refresh token is refused
    let replay = t
        .send(authed_request("GET", CITIES, &expired, &refresh, None))
        .await;
    assert_eq!(replay.status, StatusCode::UNAUTHORIZED);
    assert_eq!(replay.body["error"], "Unauthorized");

    // The new pair passes straight through
    let next = t
        .send(authed_request("GET", CITIES, &new_access, &new_refresh, None))
        .await;
    assert_eq!(next.status, StatusCode::OK);
    assert!(!next.headers.contains_key(NEW_ACCESS_TOKEN_HEADER));
}

#[tokio::test]
async fn test_expired_refresh_token_unauthorized() {
    let t = create_test_app().await;
    let session = t.register("alice@example.com").await;
    let refresh = str_field(&session, "refresh_token").to_string();

    let user = t
        .db
        .users()
        .find_by_email("alice@example.com")
        .await
        .unwrap()
        .unwrap();
    t.db.users()
        .store_refresh_token(&user.user_id, &refresh, now() - 1)
        .await
        .unwrap();

    let expired = t.expired_access_token("alice@example.com").await;
    let response = t
        .send(authed_request(
            "POST",
            CITIES,
            &expired,
            &refresh,
            Some(json!({"city_name": "Oslo"})),
        ))
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["error"], "Unauthorized");
    assert!(t.db.cities().list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_credentials_bad_request() {
    let t = create_test_app().await;
    let session = t.register("alice@example.com").await;
    let access = str_field(&session, "access_token");
    let refresh = str_field(&session, "refresh_token");

    let no_refresh = Request::builder()
        .uri(CITIES)
        .header(header::AUTHORIZATION, format!("Bearer {}", access))
        .body(Body::empty())
        .unwrap();
    assert_eq!(t.send(no_refresh).await.status, StatusCode::BAD_REQUEST);

    let no_access = Request::builder()
        .uri(CITIES)
        .header(REFRESH_TOKEN_HEADER, refresh)
        .body(Body::empty())
        .unwrap();
    assert_eq!(t.send(no_access).await.status, StatusCode::BAD_REQUEST);

    let wrong_scheme = Request::builder()
        .uri(CITIES)
        .header(header::AUTHORIZATION, format!("Basic {}", access))
        .header(REFRESH_TOKEN_HEADER, refresh)
        .body(Body::empty())
        .unwrap();
    assert_eq!(t.send(wrong_scheme).await.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unparsable_token_unauthorized() {
    let t = create_test_app().await;
    let session = t.register("alice@example.com").await;

    let response = t
        .send(authed_request(
            "GET",
            CITIES,
            "not.a.jwt",
            str_field(&session, "refresh_token"),
            None,
        ))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_other_users_refresh_token_rejected() {
    let t = create_test_app().await;
    t.register("alice@example.com").await;
    let bob = t.register("bob@example.com").await;
    let alice_expired = t.expired_access_token("alice@example.com").await;

    let response = t
        .send(authed_request(
            "GET",
            CITIES,
            &alice_expired,
            str_field(&bob, "refresh_token"),
            None,
        ))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_inside_skew_refreshed() {
    let t = create_test_app().await;
    let session = t.register("alice@example.com").await;
    let almost = t
        .access_token_expiring_at("alice@example.com", now() + 5)
        .await;

    let response = t
        .send(authed_request(
            "GET",
            CITIES,
            &almost,
            str_field(&session, "refresh_token"),
            None,
        ))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.headers.contains_key(NEW_ACCESS_TOKEN_HEADER));
}
