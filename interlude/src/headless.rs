//! Headless wait simulation.
//!
//! Runs a companion around a simulated job and prints every event as one
//! JSON line, followed by the session summary.

use interlude_core::{
    ChannelObserver, Companion, CompanionConfig, CompanionEvent, CompanionHandle, ConfigError,
    ContentFile, PersistError,
};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum HeadlessError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Content file error: {0}")]
    Content(#[from] PersistError),

    #[error("Invalid argument {flag}: {value:?}")]
    InvalidArgument { flag: &'static str, value: String },
}

/// Options for a simulated wait.
#[derive(Debug, Clone)]
pub struct HeadlessOptions {
    pub config: CompanionConfig,
    /// Name reported for the simulated job.
    pub process_name: String,
    /// How long the simulated job runs.
    pub wait: Duration,
    /// Estimate handed to the companion, if any.
    pub estimate: Option<Duration>,
    /// Switch to this character halfway through.
    pub switch_character: Option<String>,
}

impl HeadlessOptions {
    pub fn new(config: CompanionConfig) -> Self {
        Self {
            config,
            process_name: "avatar generation".to_string(),
            wait: Duration::from_secs(20),
            estimate: None,
            switch_character: None,
        }
    }
}

/// Parse command line arguments on top of an environment-derived config.
pub fn parse_options_from_args(
    args: &[String],
    config: CompanionConfig,
) -> Result<HeadlessOptions, HeadlessError> {
    let mut options = HeadlessOptions::new(config);

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--character" => {
                if let Some(character) = args.get(i + 1) {
                    options.config.character = character.clone();
                    i += 1;
                }
            }
            "--seconds" => {
                if let Some(value) = args.get(i + 1) {
                    options.wait = parse_seconds("--seconds", value)?;
                    i += 1;
                }
            }
            "--estimate" => {
                if let Some(value) = args.get(i + 1) {
                    options.estimate = Some(parse_seconds("--estimate", value)?);
                    i += 1;
                }
            }
            "--process" => {
                if let Some(name) = args.get(i + 1) {
                    options.process_name = name.clone();
                    i += 1;
                }
            }
            "--content" => {
                if let Some(path) = args.get(i + 1) {
                    options.config.content_path = Some(path.into());
                    i += 1;
                }
            }
            "--switch-to" => {
                if let Some(character) = args.get(i + 1) {
                    options.switch_character = Some(character.clone());
                    i += 1;
                }
            }
            _ => {}
        }
        i += 1;
    }

    Ok(options)
}

fn parse_seconds(flag: &'static str, value: &str) -> Result<Duration, HeadlessError> {
    value
        .parse::<f64>()
        .ok()
        .and_then(|s| Duration::try_from_secs_f64(s).ok())
        .ok_or_else(|| HeadlessError::InvalidArgument {
            flag,
            value: value.to_string(),
        })
}

/// Run one simulated wait to completion.
pub async fn run_headless(options: HeadlessOptions) -> Result<(), HeadlessError> {
    let mut config = options.config.clone();
    let content = match config.content_path.clone() {
        Some(path) => {
            let file = ContentFile::load_json(&path).await?;
            info!(path = %path.display(), categories = ?file.content.categories(), "loaded content file");
            if let Some(phases) = file.phases.clone() {
                config = config.with_phases(phases);
            }
            Some(file.content)
        }
        None => None,
    };

    let (observer, mut events) = ChannelObserver::channel();
    let mut companion = Companion::new(config, observer);
    if let Some(content) = content {
        companion.load_content(content);
    }
    let handle = CompanionHandle::new(companion);

    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            print_event(&event);
        }
    });

    println!("=== Interlude Headless Mode ===");
    println!(
        "Waiting {:.1}s on {:?}",
        options.wait.as_secs_f64(),
        options.process_name
    );

    handle.start(options.process_name.clone(), options.estimate).await;

    match options.switch_character {
        Some(character) => {
            let half = options.wait / 2;
            tokio::time::sleep(half).await;
            info!(character = %character, "switching character");
            handle.set_character(character).await;
            tokio::time::sleep(options.wait - half).await;
        }
        None => tokio::time::sleep(options.wait).await,
    }

    let summary = handle.stop().await;

    // Dropping the handle drops the last sender, which ends the printer.
    drop(handle);
    if let Err(e) = printer.await {
        warn!(error = %e, "event printer ended abnormally");
    }

    match serde_json::to_string_pretty(&summary) {
        Ok(json) => println!("{json}"),
        Err(e) => warn!(error = %e, "failed to serialize summary"),
    }
    Ok(())
}

fn print_event(event: &CompanionEvent) {
    match serde_json::to_string(event) {
        Ok(line) => println!("{line}"),
        Err(e) => warn!(error = %e, "failed to serialize event"),
    }
}
