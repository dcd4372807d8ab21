pub mod config;
pub mod profile;
pub mod quiz;
pub mod session;
pub mod timer;
pub mod tutor;

use classmate_core::{BackendClient, Config};

pub(crate) type CmdResult = Result<(), Box<dyn std::error::Error>>;

pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) fn backend(config: &Config) -> Result<BackendClient, Box<dyn std::error::Error>> {
    Ok(BackendClient::from_config(&config.api)?)
}
