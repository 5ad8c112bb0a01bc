//! Thin HTTP surface over [`crate::api::extract`]. The router is exported so
//! a host can mount the handlers without owning the listening socket.

use axum::{
    Json, Router,
    extract::Query,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
};
use log::error;
use serde::Deserialize;
use serde_json::json;

use crate::{api, models::ExtractOutcome};

const INDEX_HTML: &str = r#"
    <h1>Video Link Extractor API</h1>
    <p>Use the /api/extract endpoint with a 'url' query parameter.</p>
    <p>Example: <a href="/api/extract?url=https://example.com">/api/extract?url=...</a></p>
"#;

pub fn router() -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/extract", get(extract))
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

#[derive(Deserialize)]
struct ExtractQuery {
    url: Option<String>,
}

async fn extract(Query(query): Query<ExtractQuery>) -> Response {
    let Some(url) = query.url else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "URL query parameter is required." })),
        )
            .into_response();
    };

    match api::extract(&url).await {
        Ok(outcome) if outcome.is_empty() => (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "No video links found.", "source": url })),
        )
            .into_response(),
        Ok(ExtractOutcome::Links(links)) => Json(json!({ "links": links })).into_response(),
        Ok(ExtractOutcome::Player(player)) => Json(player).into_response(),
        Err(err) => {
            error!("[server] extraction of {url} failed: {err:#}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Failed to extract video links.",
                    "details": err.to_string(),
                })),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;

    #[tokio::test]
    async fn should_serve_landing_page() {
        let res = router()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let body = res.into_body().collect().await.unwrap().to_bytes();
        assert!(std::str::from_utf8(&body).unwrap().contains("/api/extract"));
    }

    #[tokio::test]
    async fn should_report_not_found_when_no_links() {
        // nothing listens on port 1, so the probe fetch fails and the
        // transport failure is absorbed into the empty outcome
        let res = router()
            .oneshot(
                Request::builder()
                    .uri("/api/extract?url=http://127.0.0.1:1/video/1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);

        let body = res.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["message"], "No video links found.");
        assert_eq!(json["source"], "http://127.0.0.1:1/video/1");
    }

    #[test]
    fn should_shape_links_response_like_the_original() {
        use crate::models::ExtractedLink;

        let links = vec![
            ExtractedLink {
                quality: "480p".into(),
                link: "u1".into(),
            },
            ExtractedLink {
                quality: "720p".into(),
                link: "u2".into(),
            },
        ];
        assert_eq!(
            json!({ "links": links }),
            serde_json::json!({
                "links": [
                    { "quality": "480p", "link": "u1" },
                    { "quality": "720p", "link": "u2" },
                ]
            })
        );
    }

    #[tokio::test]
    async fn should_reject_missing_url() {
        let res = router()
            .oneshot(
                Request::builder()
                    .uri("/api/extract")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let body = res.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "URL query parameter is required.");
    }
}
