//! `profiles`: list the profiles in the config file.

use crate::output::{self, OutputFormat};
use anyhow::Result;
use fluxgate_common::config::{ConfigFile, DEFAULT_PROFILE};
use owo_colors::OwoColorize;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Serialize, PartialEq)]
pub struct ProfileSummary {
    pub name: String,
    pub url: String,
    pub current: bool,
}

#[derive(Debug, Serialize)]
struct ProfilesOutput {
    config_path: String,
    profiles: Vec<ProfileSummary>,
}

pub fn summarize(file: &ConfigFile) -> Vec<ProfileSummary> {
    let current = file.current_profile.as_deref().unwrap_or(DEFAULT_PROFILE);
    file.profiles
        .iter()
        .map(|(name, profile)| ProfileSummary {
            name: name.clone(),
            url: profile.url.clone(),
            current: name == current,
        })
        .collect()
}

pub fn profiles(path: &Path, format: OutputFormat) -> Result<()> {
    let file = ConfigFile::read(path)?;
    let summaries = summarize(&file);

    if format.is_machine_readable() {
        output::print_success(
            format,
            ProfilesOutput {
                config_path: path.display().to_string(),
                profiles: summaries,
            },
        )?;
        return Ok(());
    }

    println!("{} {}", "[Config:".dimmed(), format!("{}]", path.display()).yellow());
    if summaries.is_empty() {
        println!("No profiles configured.");
        return Ok(());
    }
    for summary in summaries {
        let marker = if summary.current { "*" } else { " " };
        println!("{} {}  {}", marker.green().bold(), summary.name.bold(), summary.url.dimmed());
    }
    Ok(())
}
