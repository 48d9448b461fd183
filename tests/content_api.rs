use std::time::Duration;

use httpmock::MockServer;
use mukoko_embed::{
    application::content::{ArticleQuery, ContentApi, ContentError},
    config::ContentApiSettings,
    domain::article::ArticleSort,
    infra::content_api::HttpContentApi,
};
use url::Url;

fn client_for(server: &MockServer) -> HttpContentApi {
    HttpContentApi::new(&ContentApiSettings {
        base_url: Url::parse(&server.base_url()).expect("mock url"),
        articles_path: "/api/articles".to_string(),
        timeout: Duration::from_secs(5),
    })
    .expect("client")
}

fn kenya_top() -> ArticleQuery {
    ArticleQuery {
        countries: vec!["KE".to_string()],
        limit: 3,
        sort: ArticleSort::Trending,
        category: None,
    }
}

#[tokio::test]
async fn articles_are_fetched_with_widget_filters() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method("GET")
                .path("/api/articles")
                .query_param("countries", "KE")
                .query_param("limit", "3")
                .query_param("sort", "trending");
            then.status(200)
                .header("content-type", "application/json")
                .body(
                    r#"{"articles":[
                        {"id":42,"title":"Rains return","source":"Daily Nation","category":"weather","published_at":"2026-10-16T08:00:00Z"},
                        {"id":"b-7","title":"Markets rally","image_url":"https://cdn.example.com/m.jpg"}
                    ],"total":2}"#,
                );
        })
        .await;

    let articles = client_for(&server)
        .get_articles(&kenya_top())
        .await
        .expect("articles");

    mock.assert_async().await;
    assert_eq!(articles.len(), 2);
    assert_eq!(articles[0].id, "42");
    assert_eq!(articles[0].source.as_deref(), Some("Daily Nation"));
    assert!(articles[0].published_at.is_some());
    assert_eq!(articles[1].id, "b-7");
    assert_eq!(
        articles[1].image_url.as_deref(),
        Some("https://cdn.example.com/m.jpg")
    );
}

#[tokio::test]
async fn missing_articles_field_is_an_empty_list() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method("GET").path("/api/articles");
            then.status(200)
                .header("content-type", "application/json")
                .body("{}");
        })
        .await;

    let articles = client_for(&server)
        .get_articles(&kenya_top())
        .await
        .expect("articles");
    assert!(articles.is_empty());
}

#[tokio::test]
async fn server_errors_carry_status_and_body() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method("GET").path("/api/articles");
            then.status(503).body("upstream unavailable");
        })
        .await;

    let err = client_for(&server)
        .get_articles(&kenya_top())
        .await
        .expect_err("503 should fail");

    match err {
        ContentError::Status { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "upstream unavailable");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn malformed_payload_is_a_decode_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method("GET").path("/api/articles");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"articles":[{"id":true}]}"#);
        })
        .await;

    let err = client_for(&server)
        .get_articles(&kenya_top())
        .await
        .expect_err("bad payload should fail");

    assert!(matches!(err, ContentError::Decode(_)), "{err:?}");
}

#[tokio::test]
async fn unreachable_api_is_a_transport_error() {
    let api = HttpContentApi::new(&ContentApiSettings {
        base_url: Url::parse("http://127.0.0.1:9").expect("url"),
        articles_path: "/api/articles".to_string(),
        timeout: Duration::from_secs(2),
    })
    .expect("client");

    let err = api
        .get_articles(&kenya_top())
        .await
        .expect_err("closed port should fail");

    assert!(matches!(err, ContentError::Transport(_)), "{err:?}");
}
