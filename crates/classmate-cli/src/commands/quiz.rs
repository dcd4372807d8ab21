use std::path::{Path, PathBuf};

use clap::Subcommand;
use classmate_core::api::QuizSubmission;
use classmate_core::{topics, Config, Difficulty, SessionDb, UserProfile};

use super::{backend, print_json, CmdResult};

#[derive(Subcommand)]
pub enum QuizAction {
    /// Generate a practice quiz for a subtopic
    Generate {
        /// Chapter, e.g. "Chapter 2: Limits"
        chapter: String,
        /// Subtopic within the chapter
        subtopic: String,
        #[arg(long, default_value = "5")]
        count: u32,
        /// Easy, Medium or Hard
        #[arg(long, default_value = "Medium")]
        difficulty: Difficulty,
    },
    /// Generate a study chapter for a subtopic
    Chapter {
        chapter: String,
        subtopic: String,
        /// Defaults to the stored profile's difficulty, else Medium
        #[arg(long)]
        difficulty: Option<Difficulty>,
    },
    /// Generate the onboarding diagnostic quiz
    Diagnostic {
        #[arg(long, default_value = "High School")]
        grade: String,
        #[arg(long, default_value = "10")]
        count: u32,
    },
    /// Ask for a hint on a question
    Hint {
        question: String,
        #[arg(long, default_value = "")]
        answer: String,
        #[arg(long, default_value = "")]
        topic: String,
        #[arg(long, default_value = "")]
        subtopic: String,
    },
    /// Submit per-question results (JSON file) and update mastery
    Submit {
        #[arg(long)]
        file: PathBuf,
    },
    /// List chapters and subtopics
    Topics,
}

pub async fn run(action: QuizAction, config: &Config) -> CmdResult {
    match action {
        QuizAction::Generate {
            chapter,
            subtopic,
            count,
            difficulty,
        } => {
            check_topic(&chapter, &subtopic)?;
            let quiz = backend(config)?
                .generate_quiz(&chapter, &subtopic, count, difficulty.as_str())
                .await?;
            print_json(&quiz)?;
        }
        QuizAction::Chapter {
            chapter,
            subtopic,
            difficulty,
        } => {
            check_topic(&chapter, &subtopic)?;
            let difficulty = match difficulty {
                Some(d) => d,
                None => UserProfile::load(&SessionDb::open()?)
                    .map(|p| p.difficulty_level)
                    .unwrap_or_default(),
            };
            let study = backend(config)?
                .generate_learning_chapter(&chapter, &subtopic, difficulty.as_str())
                .await?;
            print_json(&study)?;
        }
        QuizAction::Diagnostic { grade, count } => {
            let quiz = backend(config)?.generate_diagnostic_quiz(&grade, count).await;
            if quiz.is_empty() {
                return Err("backend returned no diagnostic questions".into());
            }
            print_json(&quiz)?;
        }
        QuizAction::Hint {
            question,
            answer,
            topic,
            subtopic,
        } => {
            let hint = backend(config)?
                .generate_hint(&question, &answer, &topic, &subtopic)
                .await?;
            print_json(&hint)?;
        }
        QuizAction::Submit { file } => submit(&file, config).await?,
        QuizAction::Topics => {
            for (chapter, subs) in topics::CALCULUS_TOPICS {
                println!("{chapter}");
                for sub in subs.iter() {
                    println!("  {sub}");
                }
            }
        }
    }
    Ok(())
}

/// Reject chapter/subtopic pairs outside the taxonomy before any request.
fn check_topic(chapter: &str, subtopic: &str) -> CmdResult {
    let known = topics::subtopics(chapter).ok_or_else(|| format!("unknown chapter: {chapter}"))?;
    if !known.iter().any(|s| *s == subtopic) {
        return Err(format!("unknown subtopic for {chapter}: {subtopic}").into());
    }
    Ok(())
}

async fn submit(file: &Path, config: &Config) -> CmdResult {
    let raw = std::fs::read_to_string(file)?;
    let mut submission: QuizSubmission = serde_json::from_str(&raw)?;
    if submission.questions.is_empty() {
        return Err("submission has no questions".into());
    }

    let db = SessionDb::open()?;
    let mut profile = UserProfile::load(&db);
    if let Some(p) = &profile {
        submission.user_id = p.user_id().to_string();
    }

    let mastery = backend(config)?.submit_quiz_result(&submission).await?;

    let total = submission.questions.len() as u32;
    let correct = submission.questions.iter().filter(|q| q.correct).count();
    let score = correct as f64 * 100.0 / total as f64;

    if let Some(p) = profile.as_mut() {
        let date = chrono::Local::now().format("%Y-%m-%d").to_string();
        p.record_quiz_result(&submission.subtopic, mastery.overall_mastery, score, total, date);
        p.save(&db)?;
        tracing::info!(subtopic = %submission.subtopic, mastery = mastery.overall_mastery, "profile updated");
    } else {
        tracing::warn!("no stored profile; mastery not recorded");
    }

    print_json(&mastery)?;
    Ok(())
}
