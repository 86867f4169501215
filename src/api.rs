// src/api.rs
//! HTTP surface: thin glue over the scoring core, the patient store, and
//! the AI adapter. Request scores are clamped to [0,100] here; the core
//! itself stays no-clamp.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::AppendHeaders,
    routing::{get, post},
    Json, Router,
};
use metrics::counter;
use tower_http::cors::CorsLayer;
use tracing::debug;

use crate::ai_adapter::{build_client_from_config, AiConfig, AssessmentContext, DynAiClient};
use crate::config::ServiceConfig;
use crate::extract;
use crate::history::{AssessmentRecord, ScoreHistory};
use crate::patients::{Patient, PatientInput, PatientStore, PatientUpdate};
use crate::scoring::{
    assess, compute_ahp, compute_fuzzy, normalize_weights, AhpResult, CriterionScores,
    CriterionWeights, FuzzyResult, Level, NormalizedWeights,
};

#[derive(Clone)]
pub struct AppState {
    pub ai: DynAiClient,
    pub patients: Arc<PatientStore>,
    pub history: Arc<ScoreHistory>,
}

impl AppState {
    pub fn from_env() -> Self {
        Self::from_config(&ServiceConfig::load())
    }

    pub fn from_config(cfg: &ServiceConfig) -> Self {
        let ai_cfg = AiConfig::load_or_disabled(&cfg.ai_config_path);
        Self {
            ai: build_client_from_config(&ai_cfg),
            patients: Arc::new(PatientStore::new()),
            history: Arc::new(ScoreHistory::with_capacity(cfg.history_capacity)),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/score", post(score))
        .route("/score/ahp", post(score_ahp))
        .route("/score/fuzzy", post(score_fuzzy))
        .route("/weights/normalize", post(weights_normalize))
        .route("/extract", post(extract_notes))
        .route("/patients", post(create_patient).get(list_patients))
        .route("/patients/search", get(search_patients))
        .route(
            "/patients/{id}",
            get(get_patient).put(update_patient).delete(delete_patient),
        )
        .route("/debug/history", get(debug_history))
        .route("/debug/last-score", get(debug_last_score))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

// ---- scoring ----

#[derive(serde::Deserialize)]
struct ScoreReq {
    scores: CriterionScores,
    #[serde(default)]
    weights: Option<CriterionWeights>,
    // Absent weights imply defaults; an explicit flag wins either way.
    #[serde(default)]
    use_default_weights: Option<bool>,
}

impl ScoreReq {
    fn normalized_weights(&self) -> NormalizedWeights {
        let use_defaults = self.use_default_weights.unwrap_or(self.weights.is_none());
        normalize_weights(&self.weights.unwrap_or_default(), use_defaults)
    }
}

#[derive(serde::Serialize)]
struct ScoreResp {
    ahp: AhpResult,
    fuzzy: FuzzyResult,
    weights: NormalizedWeights,
    reason: String,
    reason_source: &'static str,
}

async fn score(
    State(state): State<AppState>,
    Json(req): Json<ScoreReq>,
) -> (
    AppendHeaders<[(&'static str, &'static str); 1]>,
    Json<ScoreResp>,
) {
    counter!("score_requests_total").increment(1);

    let scores = req.scores.clamped();
    let weights = req.normalized_weights();
    let assessment = assess(&scores, &weights);
    state.history.push(&assessment);

    let ctx = AssessmentContext { scores, assessment };
    let (reason, reason_source, ai_used) = match state.ai.explain(&ctx).await {
        Some(r) => (r.reason, state.ai.provider_name(), true),
        None => {
            counter!("ai_reason_fallback_total").increment(1);
            (template_reason(&ctx), "template", false)
        }
    };
    debug!(
        ahp = assessment.ahp.score,
        fuzzy = assessment.fuzzy.score,
        ai_used,
        "scored referral request"
    );

    (
        AppendHeaders([("x-ai-used", if ai_used { "1" } else { "0" })]),
        Json(ScoreResp {
            ahp: assessment.ahp,
            fuzzy: assessment.fuzzy,
            weights,
            reason,
            reason_source,
        }),
    )
}

async fn score_ahp(State(_state): State<AppState>, Json(req): Json<ScoreReq>) -> Json<AhpResult> {
    counter!("score_requests_total").increment(1);
    let scores = req.scores.clamped();
    let weights = req.normalized_weights();
    Json(compute_ahp(&scores, &weights))
}

#[derive(serde::Deserialize)]
struct FuzzyReq {
    scores: CriterionScores,
}

async fn score_fuzzy(
    State(_state): State<AppState>,
    Json(req): Json<FuzzyReq>,
) -> Json<FuzzyResult> {
    counter!("score_requests_total").increment(1);
    Json(compute_fuzzy(&req.scores.clamped()))
}

#[derive(serde::Deserialize)]
struct NormalizeReq {
    #[serde(default)]
    weights: Option<CriterionWeights>,
    #[serde(default)]
    use_defaults: bool,
}

async fn weights_normalize(Json(req): Json<NormalizeReq>) -> Json<NormalizedWeights> {
    Json(normalize_weights(
        &req.weights.unwrap_or_default(),
        req.use_defaults,
    ))
}

/// Deterministic narrative when no AI provider answer is available.
fn template_reason(ctx: &AssessmentContext) -> String {
    let verdict = if ctx.assessment.ahp.recommended {
        "Referral is recommended."
    } else {
        "Referral is not recommended."
    };
    let fuzzy_high = ctx.assessment.fuzzy.level == Level::High;
    let agreement = if ctx.assessment.ahp.recommended == fuzzy_high {
        "Both methods point the same way."
    } else {
        "The two methods diverge; review the individual criteria."
    };
    format!(
        "{} The weighted score is {} out of 100 (referral above 60), while the rule-based \
         priority is {} ({:?}). {}",
        verdict,
        ctx.assessment.ahp.score,
        ctx.assessment.fuzzy.score,
        ctx.assessment.fuzzy.level,
        agreement
    )
}

// ---- extraction ----

#[derive(serde::Deserialize)]
struct ExtractReq {
    notes: String,
}

#[derive(serde::Serialize)]
struct ExtractResp {
    scores: CriterionScores,
    source: &'static str,
}

async fn extract_notes(
    State(state): State<AppState>,
    Json(req): Json<ExtractReq>,
) -> Json<ExtractResp> {
    counter!("extract_requests_total").increment(1);

    if let Some(ai) = state.ai.extract(&req.notes).await {
        let scores = CriterionScores::new(ai.clinical, ai.insurance, ai.personal).clamped();
        return Json(ExtractResp {
            scores,
            source: state.ai.provider_name(),
        });
    }

    Json(ExtractResp {
        scores: extract::extract_scores(&req.notes),
        source: "lexicon",
    })
}

// ---- patients ----

async fn create_patient(
    State(state): State<AppState>,
    Json(input): Json<PatientInput>,
) -> (StatusCode, Json<Patient>) {
    let patient = state.patients.add(input);
    (StatusCode::CREATED, Json(patient))
}

async fn list_patients(State(state): State<AppState>) -> Json<Vec<Patient>> {
    Json(state.patients.list())
}

async fn get_patient(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Patient>, StatusCode> {
    state.patients.get(id).map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn update_patient(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(update): Json<PatientUpdate>,
) -> Result<Json<Patient>, StatusCode> {
    state
        .patients
        .update(id, update)
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn delete_patient(State(state): State<AppState>, Path(id): Path<u64>) -> StatusCode {
    if state.patients.remove(id) {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn search_patients(
    State(state): State<AppState>,
    Query(q): Query<HashMap<String, String>>,
) -> Json<Vec<Patient>> {
    let name = q.get("name").cloned().unwrap_or_default();
    Json(state.patients.search_by_name(&name))
}

// ---- debug ----

async fn debug_history(State(state): State<AppState>) -> Json<Vec<AssessmentRecord>> {
    Json(state.history.snapshot_last_n(10))
}

async fn debug_last_score(State(state): State<AppState>) -> Json<Option<AssessmentRecord>> {
    Json(state.history.snapshot_last_n(1).pop())
}
