use clap::Subcommand;
use classmate_core::api::{ChatRole, ChatTurn};
use classmate_core::{Config, SessionDb, SessionStorage, UserProfile};

use super::{backend, CmdResult};

const HISTORY_KEY: &str = "chatHistory";

#[derive(Subcommand)]
pub enum TutorAction {
    /// Send a message to the tutor
    Chat {
        message: String,
        /// Forget earlier turns before sending
        #[arg(long)]
        reset: bool,
    },
    /// Print the conversation so far
    History,
}

fn load_history(db: &SessionDb) -> Vec<ChatTurn> {
    match db.get(HISTORY_KEY) {
        Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "discarding unreadable chat history");
            Vec::new()
        }),
        Ok(None) => Vec::new(),
        Err(e) => {
            tracing::warn!(error = %e, "failed to read chat history");
            Vec::new()
        }
    }
}

pub async fn run(action: TutorAction, config: &Config) -> CmdResult {
    let db = SessionDb::open()?;
    match action {
        TutorAction::Chat { message, reset } => {
            let mut history = if reset {
                db.remove(HISTORY_KEY)?;
                Vec::new()
            } else {
                load_history(&db)
            };
            let profile = UserProfile::load(&db);
            let reply = backend(config)?
                .chat(&message, &history, profile.as_ref())
                .await;
            println!("{}", reply.response);

            history.push(ChatTurn {
                role: ChatRole::User,
                text: message,
            });
            history.push(ChatTurn {
                role: ChatRole::Model,
                text: reply.response,
            });
            db.set(HISTORY_KEY, &serde_json::to_string(&history)?)?;
        }
        TutorAction::History => {
            for turn in load_history(&db) {
                let who = match turn.role {
                    ChatRole::User => "you",
                    ChatRole::Model => "tutor",
                };
                println!("{who}: {}", turn.text);
            }
        }
    }
    Ok(())
}
