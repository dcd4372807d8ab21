//! Request and response payloads for the tutoring backend.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::profile::{Difficulty, QuizResult, UserProfile};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
}

/// The slice of the learner profile the tutor sees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummary {
    pub grade: String,
    pub subject: String,
    pub difficulty_level: Difficulty,
}

impl From<&UserProfile> for ProfileSummary {
    fn from(p: &UserProfile) -> Self {
        Self {
            grade: p.grade.clone(),
            subject: p.subject.clone(),
            difficulty_level: p.difficulty_level,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub message: &'a str,
    pub history: &'a [ChatTurn],
    pub user_profile: Option<ProfileSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    #[serde(default)]
    pub context: Vec<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChapterRequest<'a> {
    pub topic: &'a str,
    pub subtopic: &'a str,
    pub difficulty: &'a str,
}

/// A generated study chapter for one subtopic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningChapter {
    pub title: String,
    /// Markdown body.
    pub content: String,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub references: Vec<serde_json::Value>,
    #[serde(default)]
    pub rag_sources: Vec<RagSource>,
}

#[derive(Debug, Serialize)]
pub(crate) struct QuizRequest<'a> {
    pub topic: &'a str,
    pub subtopic: &'a str,
    pub num_questions: u32,
    pub difficulty: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct DiagnosticRequest<'a> {
    pub grade: &'a str,
    pub num_questions: u32,
}

#[derive(Debug, Serialize)]
pub(crate) struct HintRequest<'a> {
    pub question_text: &'a str,
    pub user_answer: &'a str,
    pub topic: &'a str,
    pub subtopic: &'a str,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizQuestion {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(alias = "q")]
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(alias = "correctAnswer")]
    pub correct: String,
    #[serde(default)]
    pub topic: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagSource {
    pub id: String,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub subtopic: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub content_type: String,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub source: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedQuiz {
    pub quiz: Vec<QuizQuestion>,
    #[serde(default)]
    pub rag_sources: Vec<RagSource>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DiagnosticResponse {
    #[serde(default)]
    pub quiz: Vec<QuizQuestion>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HintResponse {
    pub hint: String,
    #[serde(default)]
    pub sources: Vec<RagSource>,
}

/// Per-question interaction data fed to the mastery model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionAttempt {
    pub question_id: u64,
    /// Seconds spent on the question.
    pub time_taken: f64,
    pub correct: bool,
    pub attempt_count: u32,
    pub hint_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizSubmission {
    /// Filled from the stored profile by hosts that have one.
    #[serde(default)]
    pub user_id: String,
    pub topic: String,
    pub subtopic: String,
    pub questions: Vec<QuestionAttempt>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionMastery {
    pub question_id: Option<u64>,
    pub mastery_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizMastery {
    pub topic: String,
    pub subtopic: String,
    #[serde(default)]
    pub question_mastery: Vec<QuestionMastery>,
    /// Percentage.
    pub overall_mastery: f64,
    #[serde(default)]
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct AssessmentRequest<'a> {
    pub user_id: &'a str,
    pub quiz_history: &'a [QuizResult],
    pub topic_mastery: &'a BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelAssessment {
    pub user_id: String,
    pub level: String,
    pub confidence: f64,
    pub avg_mastery: f64,
    #[serde(default)]
    pub ml_score: Option<f64>,
    pub recommendation: String,
    #[serde(default)]
    pub weak_topics: Vec<String>,
    #[serde(default)]
    pub strong_topics: Vec<String>,
}
