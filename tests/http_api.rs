mod common;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use common::{movie, quick_settings, suggestion, FakeCatalog, FakeGenerator};
use reelpick::app::{build_router, AppState};
use reelpick::models::MediaKind;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::util::ServiceExt;

fn app(generator: FakeGenerator, catalog: FakeCatalog, token: Option<&str>) -> Router {
    let state = AppState::new(
        Arc::new(generator),
        Arc::new(catalog),
        quick_settings(),
        "US".to_string(),
        token.map(str::to_string),
    );
    build_router(state)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn read_json(res: axum::response::Response) -> Value {
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_is_open_even_with_a_token() {
    let res = app(FakeGenerator::new(), FakeCatalog::new(), Some("s3cret"))
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn deck_returns_unswiped_cards_with_image_urls() {
    let generator = FakeGenerator::new().batch(vec![
        suggestion("Heat", 1995, "en"),
        suggestion("Alien", 1979, "en"),
        suggestion("Drive", 2011, "en"),
    ]);
    let catalog = FakeCatalog::new()
        .with("Heat", vec![movie(949, "Heat", 1995, "en")])
        .with("Alien", vec![movie(348, "Alien", 1979, "en")])
        .with("Drive", vec![movie(64690, "Drive", 2011, "en")]);

    let res = app(generator, catalog, None)
        .oneshot(post_json(
            "/deck",
            json!({ "contentKind": "movie", "languages": ["en"], "targetSize": 3 }),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = read_json(res).await;
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(items[0]["title"], "Heat");
    assert_eq!(items[0]["mediaKind"], "movie");
    assert_eq!(items[0]["swiped"], false);
    assert!(items[0]["posterUrl"]
        .as_str()
        .unwrap()
        .ends_with("/w500/poster-949.jpg"));
    assert_eq!(items[0]["languageLabel"], "English");
}

#[tokio::test]
async fn deck_rejects_malformed_language_codes() {
    let res = app(FakeGenerator::new(), FakeCatalog::new(), None)
        .oneshot(post_json("/deck", json!({ "languages": ["english"] })))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = read_json(res).await;
    assert!(body["error"].as_str().unwrap().contains("english"));
}

#[tokio::test]
async fn empty_deck_maps_to_not_found() {
    let generator = FakeGenerator::new()
        .batch(vec![suggestion("Nothing Here", 2000, "en")])
        .failing_batch("quota");

    let res = app(generator, FakeCatalog::new(), None)
        .oneshot(post_json("/deck", json!({ "targetSize": 1 })))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn final_pick_without_swipes_is_unprocessable() {
    let res = app(FakeGenerator::new(), FakeCatalog::new(), None)
        .oneshot(post_json("/final-pick", json!({ "liked": [], "disliked": [] })))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = read_json(res).await;
    assert!(body["error"].as_str().unwrap().contains("Swipe at least one"));
}

#[tokio::test]
async fn final_pick_for_liked_everything_returns_distinctive_source() {
    let liked = vec![
        movie(1, "Heat", 1995, "en"),
        common::record(MediaKind::Movie, 2, "Thief", "1981-03-27", "en", 40, 7.2),
    ];

    let res = app(FakeGenerator::new(), FakeCatalog::new(), None)
        .oneshot(post_json("/final-pick", json!({ "liked": liked })))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = read_json(res).await;
    assert_eq!(body["pick"]["title"], "Thief");
    assert_eq!(body["source"], "distinctive");
}

#[tokio::test]
async fn engine_routes_require_the_bearer_token_when_configured() {
    let router = app(FakeGenerator::new(), FakeCatalog::new(), Some("s3cret"));

    let denied = router
        .clone()
        .oneshot(post_json("/final-pick", json!({})))
        .await
        .unwrap();
    assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);

    let mut allowed = post_json("/final-pick", json!({}));
    allowed
        .headers_mut()
        .insert(header::AUTHORIZATION, "Bearer s3cret".parse().unwrap());
    let res = router.oneshot(allowed).await.unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn availability_lists_providers_for_the_region() {
    let catalog = FakeCatalog::new().with_providers(MediaKind::Series, 1396, &["Netflix"]);

    let res = app(FakeGenerator::new(), catalog, None)
        .oneshot(
            Request::get("/availability/tv/1396?region=gb")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = read_json(res).await;
    assert_eq!(body, json!({ "region": "GB", "providers": ["Netflix"] }));
}

#[tokio::test]
async fn availability_rejects_unknown_media_kinds_and_maps_catalog_errors() {
    let router = app(FakeGenerator::new(), FakeCatalog::new(), None);

    let bad_kind = router
        .clone()
        .oneshot(Request::get("/availability/book/1").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(bad_kind.status(), StatusCode::BAD_REQUEST);

    let missing = router
        .oneshot(Request::get("/availability/movie/1").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::BAD_GATEWAY);
}
