use clap::Subcommand;
use classmate_core::SessionDb;

use super::CmdResult;

#[derive(Subcommand)]
pub enum SessionAction {
    /// End the session: forget countdowns, profile and chat history
    End,
    /// List keys held in session storage
    Keys,
}

pub fn run(action: SessionAction) -> CmdResult {
    let db = SessionDb::open()?;
    match action {
        SessionAction::End => {
            let removed = db.clear()?;
            println!("session ended ({removed} entries cleared)");
        }
        SessionAction::Keys => {
            for key in db.keys()? {
                println!("{key}");
            }
        }
    }
    Ok(())
}
