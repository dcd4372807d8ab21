use std::io::Write;

use clap::{Args, Subcommand};
use classmate_core::storage::DisplayConfig;
use classmate_core::{
    spawn_countdown, Config, CountdownOptions, CountdownTimer, Event, MemoryStorage, SessionDb,
    SessionStorage, UrgencyTier,
};

use super::{print_json, CmdResult};

/// Which stored countdown a command addresses.
#[derive(Args)]
pub struct Target {
    /// Session storage key (defaults to timer.quiz_storage_key)
    #[arg(long)]
    key: Option<String>,
    /// Use the onboarding countdown (timer.diagnostic_storage_key)
    #[arg(long, conflicts_with = "key")]
    diagnostic: bool,
}

impl Target {
    fn storage_key(self, config: &Config) -> String {
        match self.key {
            Some(key) => key,
            None if self.diagnostic => config.timer.diagnostic_storage_key.clone(),
            None => config.timer.quiz_storage_key.clone(),
        }
    }
}

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start a countdown, or resume the one already stored under the key
    Start {
        /// Countdown length in seconds (defaults to timer.default_seconds)
        #[arg(long)]
        seconds: Option<u64>,
        #[command(flatten)]
        target: Target,
    },
    /// Print countdown state as JSON. Leaves session storage untouched.
    Status {
        #[arg(long)]
        seconds: Option<u64>,
        #[command(flatten)]
        target: Target,
    },
    /// Run the countdown in the foreground until it expires (Ctrl-C detaches).
    /// With timer.auto_start off, only a countdown already started is resumed.
    Watch {
        #[arg(long)]
        seconds: Option<u64>,
        #[command(flatten)]
        target: Target,
        /// Print events as JSON lines instead of a clock
        #[arg(long)]
        json: bool,
    },
    /// Stop the countdown and forget its progress
    Stop {
        #[command(flatten)]
        target: Target,
    },
}

fn options(config: &Config, seconds: Option<u64>, key: String) -> CountdownOptions {
    CountdownOptions::new(seconds.unwrap_or(config.timer.default_seconds))
        .storage_key(key)
        .auto_start(false)
}

fn notice(display: &DisplayConfig, tier: UrgencyTier) -> Option<&str> {
    match tier {
        UrgencyTier::Normal => None,
        UrgencyTier::Warning => Some(&display.warning_notice),
        UrgencyTier::Urgent => Some(&display.urgent_notice),
    }
}

pub async fn run(action: TimerAction, config: &Config) -> CmdResult {
    match action {
        TimerAction::Start { seconds, target } => {
            let db = SessionDb::open()?;
            let key = target.storage_key(config);
            let mut timer = CountdownTimer::with_system_clock(options(config, seconds, key), &db);
            if let Some(event) = timer.start() {
                print_json(&event)?;
            }
        }
        TimerAction::Status { seconds, target } => {
            let db = SessionDb::open()?;
            let key = target.storage_key(config);
            // Restore from a scratch copy so a spent or unreadable record
            // stays where it is.
            let scratch = MemoryStorage::new();
            if let Some(raw) = db.get(&key)? {
                scratch.set(&key, &raw)?;
            }
            let timer = CountdownTimer::with_system_clock(options(config, seconds, key), &scratch);
            let mut json = serde_json::to_value(timer.snapshot())?;
            json["active"] = serde_json::Value::Bool(timer.resumed());
            print_json(&json)?;
        }
        TimerAction::Stop { target } => {
            let db = SessionDb::open()?;
            let key = target.storage_key(config);
            let mut timer = CountdownTimer::with_system_clock(options(config, None, key), &db);
            if let Some(event) = timer.stop() {
                print_json(&event)?;
            }
        }
        TimerAction::Watch {
            seconds,
            target,
            json,
        } => watch(config, seconds, target.storage_key(config), json).await?,
    }
    Ok(())
}

async fn watch(config: &Config, seconds: Option<u64>, key: String, json: bool) -> CmdResult {
    let db = SessionDb::open()?;
    let opts = options(config, seconds, key.clone()).on_expire(|| {
        eprintln!("\x07Time is up!");
    });
    let timer = CountdownTimer::with_system_clock(opts, db);
    if !config.timer.auto_start && !timer.resumed() {
        return Err(format!(
            "no countdown running under {key:?} and timer.auto_start is off; run `timer start` first"
        )
        .into());
    }
    let display = config.display.clone();

    let mut handle = spawn_countdown(timer, move |t, event| {
        if json {
            if let Some(event) = event {
                if let Ok(line) = serde_json::to_string(&event) {
                    println!("{line}");
                }
            }
            return;
        }
        if matches!(event, Some(Event::CountdownStopped { .. })) {
            return;
        }
        let line = match notice(&display, t.urgency()) {
            Some(text) => format!("{} ({text})", t.formatted_time()),
            None => t.formatted_time(),
        };
        print!("\r{line:<24}");
        let _ = std::io::stdout().flush();
    });

    let finished = tokio::select! {
        timer = handle.wait() => timer,
        _ = tokio::signal::ctrl_c() => {
            tracing::debug!("interrupted; leaving countdown persisted");
            handle.cancel();
            handle.wait().await
        }
    };
    if !json {
        println!();
    }

    match finished {
        Some(timer) if timer.has_expired() => Ok(()),
        Some(timer) => {
            eprintln!(
                "detached at {}; run `timer watch` again to resume",
                timer.formatted_time()
            );
            Ok(())
        }
        None => Err("countdown task failed".into()),
    }
}
