// tests/referral_boundary.rs
//
// Boundary behavior of the referral recommendation via the public
// /score/ahp endpoint: the threshold is strict, so a score of exactly 60
// must stay "unlikely" while 61 flips it.

use axum::{
    body::{self, Body},
    http::Request,
    Router,
};
use serde::Deserialize;
use serde_json::json;
use tower::ServiceExt as _;

use referral_suitability_analyzer::{api, AppState};

const BODY_LIMIT: usize = 256 * 1024;

#[derive(Debug, Deserialize)]
struct AhpOut {
    score: i32,
    recommended: bool,
}

fn test_router() -> Router {
    api::router(AppState::from_env())
}

/// Uniform scores pass through any normalized weight split unchanged,
/// which pins the AHP score exactly.
async fn call_uniform(score: f32) -> AhpOut {
    let payload = json!({
        "scores": { "clinical": score, "insurance": score, "personal": score }
    });
    let req = Request::builder()
        .method("POST")
        .uri("/score/ahp")
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .expect("build POST /score/ahp");

    let resp = test_router().oneshot(req).await.expect("oneshot");
    assert!(resp.status().is_success());
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    serde_json::from_slice(&bytes).expect("parse ahp json")
}

#[tokio::test]
async fn threshold_is_not_a_recommendation() {
    let out = call_uniform(60.0).await;
    assert_eq!(out.score, 60);
    assert!(!out.recommended, "exactly 60 must stay unlikely");
}

#[tokio::test]
async fn one_above_threshold_recommends() {
    let out = call_uniform(61.0).await;
    assert_eq!(out.score, 61);
    assert!(out.recommended);
}

#[tokio::test]
async fn recommendation_flips_exactly_once_across_the_band() {
    let mut last_recommended = false;
    for s in 55..=65 {
        let out = call_uniform(s as f32).await;
        assert_eq!(out.score, s, "uniform scores must pass through");
        assert_eq!(
            out.recommended,
            s > 60,
            "recommendation must flip strictly above 60, at score {s}"
        );
        if out.recommended {
            last_recommended = true;
        } else {
            assert!(
                !last_recommended,
                "recommendation must never flip back off as scores rise"
            );
        }
    }
}

#[tokio::test]
async fn half_up_rounding_feeds_the_threshold() {
    // 60.4 rounds down (no referral), 60.5 rounds half away from zero to
    // 61 (referral).
    let out = call_uniform(60.4).await;
    assert_eq!(out.score, 60);
    assert!(!out.recommended);

    let out = call_uniform(60.5).await;
    assert_eq!(out.score, 61);
    assert!(out.recommended);
}
