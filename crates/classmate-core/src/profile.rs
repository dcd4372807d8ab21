//! Learner profile shared by every page.
//!
//! Persisted as camelCase JSON under [`PROFILE_KEY`] through any
//! [`SessionStorage`]. Mastery values are percentages (0-100) returned by
//! the backend; nothing here computes them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::storage::SessionStorage;
use crate::topics;

pub const PROFILE_KEY: &str = "userProfile";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

impl std::str::FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

/// One finished quiz.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    pub date: String,
    /// Percentage score.
    pub score: f64,
    pub total_questions: u32,
    pub topics_covered: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub name: String,
    pub grade: String,
    pub subject: String,
    #[serde(default)]
    pub learning_style: String,
    #[serde(default)]
    pub is_onboarded: bool,
    #[serde(default)]
    pub difficulty_level: Difficulty,
    #[serde(default)]
    pub topic_mastery: BTreeMap<String, f64>,
    #[serde(default)]
    pub quiz_history: Vec<QuizResult>,
}

impl UserProfile {
    pub fn new(name: impl Into<String>, grade: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            grade: grade.into(),
            subject: "Calculus".into(),
            learning_style: "Visual".into(),
            is_onboarded: false,
            difficulty_level: Difficulty::Medium,
            topic_mastery: BTreeMap::new(),
            quiz_history: Vec::new(),
        }
    }

    /// Read the stored profile. A missing or unreadable entry is `None`.
    pub fn load<S: SessionStorage>(storage: &S) -> Option<Self> {
        match storage.get(PROFILE_KEY) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(profile) => Some(profile),
                Err(e) => {
                    tracing::warn!(error = %e, "ignoring unreadable stored profile");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read stored profile");
                None
            }
        }
    }

    pub fn save<S: SessionStorage>(&self, storage: &S) -> Result<()> {
        let json = serde_json::to_string(self)?;
        storage.set(PROFILE_KEY, &json)?;
        Ok(())
    }

    pub fn clear<S: SessionStorage>(storage: &S) -> Result<()> {
        storage.remove(PROFILE_KEY)?;
        Ok(())
    }

    /// The backend identifies learners by name.
    pub fn user_id(&self) -> &str {
        &self.name
    }

    /// Fold a quiz outcome into history and mastery.
    ///
    /// The subtopic takes `mastery` outright; its chapter keeps the best
    /// score seen across its subtopics.
    pub fn record_quiz_result(
        &mut self,
        subtopic: &str,
        mastery: f64,
        score_pct: f64,
        total_questions: u32,
        date: impl Into<String>,
    ) {
        let mastery = mastery.clamp(0.0, 100.0);
        self.topic_mastery.insert(subtopic.to_string(), mastery);
        if let Some(chapter) = topics::chapter_of(subtopic) {
            let entry = self.topic_mastery.entry(chapter.to_string()).or_insert(0.0);
            *entry = entry.max(mastery);
        }
        self.quiz_history.push(QuizResult {
            date: date.into(),
            score: score_pct,
            total_questions,
            topics_covered: vec![subtopic.to_string()],
        });
    }

    /// Mean of all mastery entries, 0 when there are none.
    pub fn average_mastery(&self) -> f64 {
        if self.topic_mastery.is_empty() {
            return 0.0;
        }
        self.topic_mastery.values().sum::<f64>() / self.topic_mastery.len() as f64
    }
}
