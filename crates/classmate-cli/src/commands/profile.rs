use clap::Subcommand;
use classmate_core::{Config, Difficulty, SessionDb, UserProfile};

use super::{backend, print_json, CmdResult};

#[derive(Subcommand)]
pub enum ProfileAction {
    /// Print the stored learner profile with its average mastery
    Show,
    /// Create (or replace) the learner profile
    Create {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "High School")]
        grade: String,
        /// Easy, Medium or Hard
        #[arg(long, default_value = "Medium")]
        difficulty: Difficulty,
        #[arg(long)]
        learning_style: Option<String>,
    },
    /// Delete the stored profile
    Reset,
    /// Ask the backend for an overall level assessment
    Assess,
}

fn require(db: &SessionDb) -> Result<UserProfile, Box<dyn std::error::Error>> {
    UserProfile::load(db).ok_or_else(|| "no profile; run `profile create` first".into())
}

pub async fn run(action: ProfileAction, config: &Config) -> CmdResult {
    let db = SessionDb::open()?;
    match action {
        ProfileAction::Show => {
            let profile = require(&db)?;
            let mut json = serde_json::to_value(&profile)?;
            json["averageMastery"] = serde_json::json!(profile.average_mastery());
            print_json(&json)?;
        }
        ProfileAction::Create {
            name,
            grade,
            difficulty,
            learning_style,
        } => {
            let mut profile = UserProfile::new(name, grade);
            profile.difficulty_level = difficulty;
            profile.is_onboarded = true;
            if let Some(style) = learning_style {
                profile.learning_style = style;
            }
            profile.save(&db)?;
            print_json(&profile)?;
        }
        ProfileAction::Reset => {
            UserProfile::clear(&db)?;
            println!("profile removed");
        }
        ProfileAction::Assess => {
            let profile = require(&db)?;
            let assessment = backend(config)?
                .assess_user_level(profile.user_id(), &profile.quiz_history, &profile.topic_mastery)
                .await?;
            print_json(&assessment)?;
        }
    }
    Ok(())
}
