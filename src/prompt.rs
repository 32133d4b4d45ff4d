//! Interactive input seam
//!
//! All operator input goes through the [`Prompt`] trait so the deploy
//! pipeline can be driven by stdin in production and by preset answers in
//! tests. Flags and environment variables (see `cli.rs`) take precedence;
//! prompting only happens for values still unset.

use std::collections::VecDeque;
use std::io::{self, Write};

use anyhow::{Context, Result};

use crate::cli::DeployTarget;
use crate::error::ConfigError;

pub trait Prompt {
    /// Ask the operator a question. An empty answer falls back to `default`
    /// when one is given, otherwise the empty string is returned as-is.
    fn input(&mut self, message: &str, default: Option<&str>) -> Result<String>;
}

/// Reads answers from stdin
pub struct StdinPrompt;

impl Prompt for StdinPrompt {
    fn input(&mut self, message: &str, default: Option<&str>) -> Result<String> {
        match default {
            Some(d) => print!("{} [{}]: ", message, d),
            None => print!("{}: ", message),
        }
        io::stdout().flush().context("Failed to flush stdout")?;

        let mut line = String::new();
        io::stdin()
            .read_line(&mut line)
            .context("Failed to read from stdin")?;

        let answer = line.trim();
        if answer.is_empty() {
            Ok(default.unwrap_or_default().to_string())
        } else {
            Ok(answer.to_string())
        }
    }
}

/// Replays a fixed sequence of answers (tests and automation)
pub struct PresetPrompt {
    answers: VecDeque<String>,
}

impl PresetPrompt {
    pub fn new(answers: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
        }
    }
}

impl Prompt for PresetPrompt {
    fn input(&mut self, _message: &str, default: Option<&str>) -> Result<String> {
        let answer = self
            .answers
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("No preset answer left for prompt"))?;
        if answer.is_empty() {
            Ok(default.unwrap_or_default().to_string())
        } else {
            Ok(answer)
        }
    }
}

/// Present the three-way deploy menu and parse the choice.
///
/// An unrecognized choice is fatal, matching the script's exit-on-bad-input
/// behavior.
pub fn choose_target(prompt: &mut dyn Prompt) -> Result<DeployTarget> {
    println!("What would you like to deploy?");
    println!("  1) Backend and frontend");
    println!("  2) Backend only");
    println!("  3) Frontend only");

    let choice = prompt.input("Choice", Some("1"))?;
    parse_target_choice(&choice).map_err(Into::into)
}

pub fn parse_target_choice(choice: &str) -> Result<DeployTarget, ConfigError> {
    match choice.trim() {
        "1" => Ok(DeployTarget::Both),
        "2" => Ok(DeployTarget::Backend),
        "3" => Ok(DeployTarget::Frontend),
        other => Err(ConfigError::InvalidTarget {
            choice: other.to_string(),
        }),
    }
}
