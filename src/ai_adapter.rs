// src/ai_adapter.rs
//! AI adapter: provider abstraction + file cache + daily limit.
//!
//! Two operations, both optional enrichments that never influence the
//! numeric results: `explain` turns an assessment into a short narrative,
//! `extract` turns free-text notes into the three criterion scores. A
//! provider returning `None` is not an error; callers fall back to the
//! deterministic template / lexicon paths.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::scoring::{Assessment, CriterionScores};

// ------------------------------------------------------------
// Public surface
// ------------------------------------------------------------

/// Everything the narrative generator gets to see.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct AssessmentContext {
    pub scores: CriterionScores,
    pub assessment: Assessment,
}

/// Short human-readable explanation returned by providers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AiReason {
    pub reason: String,
}

/// Scores a provider extracted from unstructured notes. May be out of
/// range; callers clamp before handing them to the scoring core.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AiScores {
    pub clinical: f32,
    pub insurance: f32,
    pub personal: f32,
}

/// Trait object used by handlers and tests.
#[async_trait]
pub trait AiClient: Send + Sync {
    /// Narrate why the assessment came out the way it did.
    async fn explain(&self, ctx: &AssessmentContext) -> Option<AiReason>;
    /// Extract the three criterion scores from free-text notes.
    async fn extract(&self, notes: &str) -> Option<AiScores>;
    /// Provider name for diagnostics/headers.
    fn provider_name(&self) -> &'static str;
}

pub type DynAiClient = Arc<dyn AiClient>;

/// Config loaded from `config/ai.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    pub enabled: bool,
    /// "openai" (other providers fall back to disabled)
    #[serde(default)]
    pub provider: String,
    #[serde(default = "default_daily_limit")]
    pub daily_limit: u32,
    /// "ENV" means: read from OPENAI_API_KEY.
    #[serde(default)]
    pub api_key: String,
}

fn default_daily_limit() -> u32 {
    20
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: String::new(),
            daily_limit: default_daily_limit(),
            api_key: String::new(),
        }
    }
}

impl AiConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let data = fs::read_to_string(path)?;
        let mut cfg: AiConfig = serde_json::from_str(&data)?;
        cfg.provider = cfg.provider.to_lowercase();
        if cfg.api_key.trim().eq_ignore_ascii_case("env") {
            cfg.api_key = std::env::var("OPENAI_API_KEY")
                .map_err(|_| anyhow::anyhow!("Missing OPENAI_API_KEY env var"))?;
        }
        Ok(cfg)
    }

    /// Best-effort load: missing or broken config means AI stays disabled.
    pub fn load_or_disabled<P: AsRef<Path>>(path: P) -> Self {
        match Self::load_from_file(path) {
            Ok(cfg) => {
                info!(
                    "AI cfg loaded: provider={}, enabled={}, key_len={}",
                    cfg.provider,
                    cfg.enabled,
                    cfg.api_key.len()
                );
                cfg
            }
            Err(e) => {
                warn!(error = %e, "AI config unavailable, running with AI disabled");
                Self::default()
            }
        }
    }
}

/// Factory: build a client according to config and environment.
///
/// * If `AI_TEST_MODE=mock`, returns a deterministic mock client.
/// * Else if `config.enabled == false`, returns a disabled client.
/// * Else builds the real provider wrapped with caching + daily limit.
pub fn build_client_from_config(config: &AiConfig) -> DynAiClient {
    if std::env::var("AI_TEST_MODE")
        .map(|v| v == "mock")
        .unwrap_or(false)
    {
        return Arc::new(MockClient::default());
    }

    if !config.enabled {
        return Arc::new(DisabledClient);
    }

    match config.provider.as_str() {
        "openai" => {
            let provider = OpenAiProvider::new(&config.api_key, None);
            Arc::new(CachingClient::new(
                provider,
                default_cache_dir(),
                config.daily_limit,
            ))
        }
        other => {
            warn!(provider = other, "unsupported AI provider, disabling");
            Arc::new(DisabledClient)
        }
    }
}

// ------------------------------------------------------------
// Provider abstraction + concrete providers
// ------------------------------------------------------------

/// Low-level provider: does a *real* remote call. Separated so the same
/// caching wrapper serves production and tests.
#[async_trait]
pub trait Provider: Send + Sync + 'static {
    async fn fetch_reason(&self, ctx: &AssessmentContext) -> Option<AiReason>;
    async fn fetch_scores(&self, notes: &str) -> Option<AiScores>;
    fn name(&self) -> &'static str;
}

/// OpenAI provider (Chat Completions API).
pub struct OpenAiProvider {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAiProvider {
    /// `model_override`: pass Some("gpt-4o-mini") to override; that is also
    /// the default.
    pub fn new(api_key: &str, model_override: Option<&str>) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("referral-suitability-analyzer/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(10))
            .build()
            .expect("reqwest client");
        Self {
            http,
            api_key: api_key.to_string(),
            model: model_override.unwrap_or("gpt-4o-mini").to_string(),
        }
    }

    async fn chat(&self, system: &str, user: &str) -> Option<String> {
        if self.api_key.is_empty() {
            return None;
        }

        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }
        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            temperature: f32,
            max_tokens: u32,
        }
        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: ChoiceMsg,
        }
        #[derive(Deserialize)]
        struct ChoiceMsg {
            content: String,
        }

        let req = Req {
            model: &self.model,
            messages: vec![
                Msg {
                    role: "system",
                    content: system,
                },
                Msg {
                    role: "user",
                    content: user,
                },
            ],
            temperature: 0.2,
            max_tokens: 200,
        };

        let resp = self
            .http
            .post("https://api.openai.com/v1/chat/completions")
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .ok()?;

        if !resp.status().is_success() {
            return None;
        }
        let body: Resp = resp.json().await.ok()?;
        body.choices.into_iter().next().map(|c| c.message.content)
    }
}

const EXPLAIN_SYSTEM: &str = "You are a healthcare assistant summarizing a referral assessment. \
Two algorithms were run: a weighted average (AHP, scores above 60 recommend referral) and a \
rule-based fuzzy priority. Write ONE short paragraph (<=400 ASCII chars) stating the \
recommendation, what the weighted score contributes, what the rule-based priority suggests, \
and whether the two agree. Plain prose, no emojis, output only the paragraph.";

const EXTRACT_SYSTEM: &str = "You are a medical assistant reading unstructured patient notes. \
Return STRICT JSON only: {\"clinical\":N,\"insurance\":N,\"personal\":N} where each N is 0-100. \
clinical = urgency of specialist referral, insurance = how little finances/coverage block a \
referral, personal = the patient's willingness. No other text.";

#[async_trait]
impl Provider for OpenAiProvider {
    async fn fetch_reason(&self, ctx: &AssessmentContext) -> Option<AiReason> {
        let user = format!(
            "Clinical {}, insurance {}, personal preference {}. AHP score {} ({}). \
             Fuzzy priority score {} (level {:?}).",
            ctx.scores.clinical,
            ctx.scores.insurance,
            ctx.scores.personal,
            ctx.assessment.ahp.score,
            if ctx.assessment.ahp.recommended {
                "referral recommended"
            } else {
                "referral not recommended"
            },
            ctx.assessment.fuzzy.score,
            ctx.assessment.fuzzy.level,
        );
        let content = self.chat(EXPLAIN_SYSTEM, &user).await?;
        let cleaned = sanitize_reason(&content);
        if cleaned.is_empty() {
            None
        } else {
            Some(AiReason { reason: cleaned })
        }
    }

    async fn fetch_scores(&self, notes: &str) -> Option<AiScores> {
        let content = self.chat(EXTRACT_SYSTEM, notes).await?;
        // Tolerate stray prose around the JSON object.
        let start = content.find('{')?;
        let end = content.rfind('}')?;
        serde_json::from_str::<AiScores>(&content[start..=end]).ok()
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

/// Returns `None` always; used when AI is disabled.
pub struct DisabledClient;

#[async_trait]
impl AiClient for DisabledClient {
    async fn explain(&self, _ctx: &AssessmentContext) -> Option<AiReason> {
        None
    }
    async fn extract(&self, _notes: &str) -> Option<AiScores> {
        None
    }
    fn provider_name(&self) -> &'static str {
        "disabled"
    }
}

/// Deterministic client for tests/local runs (`AI_TEST_MODE=mock`).
#[derive(Clone)]
pub struct MockClient {
    pub fixed_reason: AiReason,
    pub fixed_scores: AiScores,
}

impl Default for MockClient {
    fn default() -> Self {
        Self {
            fixed_reason: AiReason {
                reason: "Both methods agree on the assessment (mock)".to_string(),
            },
            fixed_scores: AiScores {
                clinical: 70.0,
                insurance: 60.0,
                personal: 55.0,
            },
        }
    }
}

#[async_trait]
impl AiClient for MockClient {
    async fn explain(&self, _ctx: &AssessmentContext) -> Option<AiReason> {
        Some(self.fixed_reason.clone())
    }
    async fn extract(&self, _notes: &str) -> Option<AiScores> {
        Some(self.fixed_scores)
    }
    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

// ------------------------------------------------------------
// Caching client wrapper (file cache + daily limit)
// ------------------------------------------------------------

/// Counter state is guarded by a `Mutex` to keep it simple and safe.
pub struct CachingClient<P: Provider> {
    inner: P,
    cache_dir: PathBuf,
    daily_limit_max: u32,
    counter: Mutex<DailyCounter>,
}

impl<P: Provider> CachingClient<P> {
    pub fn new(inner: P, cache_dir: PathBuf, daily_limit_max: u32) -> Self {
        let _ = fs::create_dir_all(&cache_dir); // best-effort
        let counter = Mutex::new(load_daily_counter(&cache_dir).unwrap_or_default());
        Self {
            inner,
            cache_dir,
            daily_limit_max,
            counter,
        }
    }

    /// Real API calls only increment the counter; cache hits do not.
    fn under_daily_limit(&self) -> bool {
        let mut g = self.counter.lock().expect("poisoned counter");
        if g.is_expired() {
            g.reset_to_today();
            let _ = save_daily_counter(&self.cache_dir, &g);
        }
        g.count < self.daily_limit_max
    }

    fn record_call(&self) {
        let mut g = self.counter.lock().expect("poisoned counter");
        g.count = g.count.saturating_add(1);
        let _ = save_daily_counter(&self.cache_dir, &g);
    }
}

#[async_trait]
impl<P: Provider> AiClient for CachingClient<P> {
    async fn explain(&self, ctx: &AssessmentContext) -> Option<AiReason> {
        let payload = serde_json::to_string(ctx).ok()?;
        let key = cache_key("explain", &payload);
        if let Some(hit) = read_cache_file::<AiReason>(&self.cache_dir, &key) {
            return Some(hit);
        }
        if !self.under_daily_limit() {
            return None;
        }
        let mut fresh = self.inner.fetch_reason(ctx).await?;
        fresh.reason = sanitize_reason(&fresh.reason);
        if fresh.reason.is_empty() {
            return None;
        }
        let _ = write_cache_file(&self.cache_dir, &key, &fresh);
        self.record_call();
        Some(fresh)
    }

    async fn extract(&self, notes: &str) -> Option<AiScores> {
        let key = cache_key("extract", notes);
        if let Some(hit) = read_cache_file::<AiScores>(&self.cache_dir, &key) {
            return Some(hit);
        }
        if !self.under_daily_limit() {
            return None;
        }
        let fresh = self.inner.fetch_scores(notes).await?;
        let _ = write_cache_file(&self.cache_dir, &key, &fresh);
        self.record_call();
        Some(fresh)
    }

    fn provider_name(&self) -> &'static str {
        self.inner.name()
    }
}

// ------------------------------------------------------------
// File cache helpers
// ------------------------------------------------------------

fn default_cache_dir() -> PathBuf {
    PathBuf::from("cache/ai")
}

fn cache_key(op: &str, input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(op.as_bytes());
    hasher.update(b":");
    hasher.update(input.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(32);
    for b in digest.iter().take(16) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

fn cache_path(dir: &Path, key: &str) -> PathBuf {
    dir.join(format!("{key}.json"))
}

fn read_cache_file<T: serde::de::DeserializeOwned>(dir: &Path, key: &str) -> Option<T> {
    let path = cache_path(dir, key);
    let mut file = fs::File::open(path).ok()?;
    let mut buf = String::new();
    file.read_to_string(&mut buf).ok()?;
    serde_json::from_str(&buf).ok()
}

fn write_cache_file<T: Serialize>(dir: &Path, key: &str, value: &T) -> io::Result<()> {
    let path = cache_path(dir, key);
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string());
    let mut f = fs::File::create(&tmp)?;
    f.write_all(json.as_bytes())?;
    fs::rename(tmp, path)?;
    Ok(())
}

// ------------------------------------------------------------
// Daily counter helpers
// ------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DailyCounter {
    date: String,
    count: u32,
}

impl Default for DailyCounter {
    fn default() -> Self {
        Self {
            date: today(),
            count: 0,
        }
    }
}

impl DailyCounter {
    fn is_expired(&self) -> bool {
        self.date != today()
    }
    fn reset_to_today(&mut self) {
        self.date = today();
        self.count = 0;
    }
}

fn today() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}

fn counter_path(dir: &Path) -> PathBuf {
    dir.join("daily_count.json")
}

fn load_daily_counter(dir: &Path) -> io::Result<DailyCounter> {
    let s = fs::read_to_string(counter_path(dir))?;
    let dc: DailyCounter =
        serde_json::from_str(&s).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    Ok(dc)
}

fn save_daily_counter(dir: &Path, dc: &DailyCounter) -> io::Result<()> {
    let p = counter_path(dir);
    let tmp = p.with_extension("json.tmp");
    let s = serde_json::to_string(dc).unwrap_or_else(|_| "{}".to_string());
    let mut f = fs::File::create(&tmp)?;
    f.write_all(s.as_bytes())?;
    fs::rename(tmp, p)?;
    Ok(())
}

// ------------------------------------------------------------
// Sanitization
// ------------------------------------------------------------

const MAX_REASON_LEN: usize = 400;

/// Ensure ASCII-only, single line, and <= `MAX_REASON_LEN` chars.
/// Collapses whitespace.
pub fn sanitize_reason(input: &str) -> String {
    let mut out = String::with_capacity(MAX_REASON_LEN);
    let mut prev_space = false;
    for ch in input.chars() {
        let c = match ch {
            '\r' | '\n' | '\t' => ' ',
            c if c.is_ascii() => c,
            _ => ' ',
        };
        if c == ' ' {
            if !prev_space && !out.is_empty() {
                out.push(' ');
            }
            prev_space = true;
        } else {
            out.push(c);
            prev_space = false;
        }
        if out.len() >= MAX_REASON_LEN {
            break;
        }
    }
    out.trim().to_string()
}
