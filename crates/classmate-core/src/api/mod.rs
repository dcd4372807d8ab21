//! HTTP client for the tutoring backend.
//!
//! One method per backend capability. The client only moves JSON; quiz
//! generation, retrieval and mastery inference all happen server-side.

mod types;

pub use types::{
    ChatResponse, ChatRole, ChatTurn, GeneratedQuiz, HintResponse, LearningChapter,
    LevelAssessment, ProfileSummary, QuestionAttempt, QuestionMastery, QuizMastery, QuizQuestion,
    QuizSubmission, RagSource,
};

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use crate::error::ApiError;
use crate::profile::{QuizResult, UserProfile};
use crate::storage::ApiConfig;
use types::{
    AssessmentRequest, ChapterRequest, ChatRequest, DiagnosticRequest, DiagnosticResponse,
    HintRequest, QuizRequest,
};

/// Reply used when the tutor cannot be reached.
pub const CHAT_FALLBACK: &str =
    "I'm sorry, I cannot connect to the tutor server right now. Please ensure the backend is running.";

pub struct BackendClient {
    base: Url,
    http_client: Client,
}

impl BackendClient {
    /// Create a client for the backend at `base_url`.
    ///
    /// # Errors
    /// Returns an error if `base_url` is not an absolute URL.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        // A trailing slash makes `join` append rather than replace the last segment.
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        let base = Url::parse(&normalized).map_err(|source| ApiError::InvalidBaseUrl {
            url: base_url.to_string(),
            source,
        })?;
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| ApiError::Request {
                endpoint: base.to_string(),
                source,
            })?;
        Ok(Self { base, http_client })
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        Self::new(&config.base_url, Duration::from_secs(config.timeout_secs))
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, ApiError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self
            .base
            .join(path)
            .map_err(|source| ApiError::InvalidBaseUrl {
                url: self.base.to_string(),
                source,
            })?;
        let endpoint = format!("/{path}");
        debug!(%url, "backend request");

        let request_error = |source| ApiError::Request {
            endpoint: endpoint.clone(),
            source,
        };

        let resp = self
            .http_client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(request_error)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                endpoint: endpoint.clone(),
                status: status.as_u16(),
                body,
            });
        }

        resp.json::<R>().await.map_err(request_error)
    }

    /// Ask the tutor. Never fails: an unreachable tutor yields
    /// [`CHAT_FALLBACK`] with no context.
    pub async fn chat(
        &self,
        message: &str,
        history: &[ChatTurn],
        profile: Option<&UserProfile>,
    ) -> ChatResponse {
        let body = ChatRequest {
            message,
            history,
            user_profile: profile.map(ProfileSummary::from),
        };
        match self.post("chat", &body).await {
            Ok(resp) => resp,
            Err(e) => {
                warn!(error = %e, "chat failed; using fallback reply");
                ChatResponse {
                    response: CHAT_FALLBACK.to_string(),
                    context: Vec::new(),
                }
            }
        }
    }

    /// Study material for a subtopic at the learner's difficulty.
    pub async fn generate_learning_chapter(
        &self,
        topic: &str,
        subtopic: &str,
        difficulty: &str,
    ) -> Result<LearningChapter, ApiError> {
        let body = ChapterRequest {
            topic,
            subtopic,
            difficulty,
        };
        self.post("generate_learning_chapter", &body).await
    }

    pub async fn generate_quiz(
        &self,
        topic: &str,
        subtopic: &str,
        num_questions: u32,
        difficulty: &str,
    ) -> Result<GeneratedQuiz, ApiError> {
        let body = QuizRequest {
            topic,
            subtopic,
            num_questions,
            difficulty,
        };
        self.post("generate_quiz", &body).await
    }

    /// Diagnostic quiz for onboarding. Empty when the backend fails.
    pub async fn generate_diagnostic_quiz(&self, grade: &str, num_questions: u32) -> Vec<QuizQuestion> {
        let body = DiagnosticRequest {
            grade,
            num_questions,
        };
        match self
            .post::<_, DiagnosticResponse>("generate_diagnostic_quiz", &body)
            .await
        {
            Ok(resp) => resp.quiz,
            Err(e) => {
                warn!(error = %e, "diagnostic generation failed");
                Vec::new()
            }
        }
    }

    pub async fn generate_hint(
        &self,
        question_text: &str,
        user_answer: &str,
        topic: &str,
        subtopic: &str,
    ) -> Result<HintResponse, ApiError> {
        let body = HintRequest {
            question_text,
            user_answer,
            topic,
            subtopic,
        };
        self.post("generate_hint", &body).await
    }

    /// Send per-question interaction data; the backend answers with mastery.
    pub async fn submit_quiz_result(&self, submission: &QuizSubmission) -> Result<QuizMastery, ApiError> {
        self.post("submit_quiz_ml", submission).await
    }

    pub async fn assess_user_level(
        &self,
        user_id: &str,
        quiz_history: &[QuizResult],
        topic_mastery: &BTreeMap<String, f64>,
    ) -> Result<LevelAssessment, ApiError> {
        let body = AssessmentRequest {
            user_id,
            quiz_history,
            topic_mastery,
        };
        self.post("assess_user_level", &body).await
    }
}
