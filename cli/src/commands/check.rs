// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use std::path::Path;

use anyhow::Result;
use colored::Colorize;

use arena_core::domain::catalog::BackendKind;
use arena_core::domain::chat::ChatBackend;
use arena_core::infrastructure::config::{resolve_api_key, ArenaConfig};
use arena_core::infrastructure::{gemini, moderation, openai_compat, rails};

/// Probe every configured endpoint and print a reachability report.
pub async fn run(config_path: Option<&Path>) -> Result<()> {
    let config = ArenaConfig::load(config_path)?;
    let mut failures = 0usize;

    let openai = openai_compat::OpenAiCompatClient::new(
        config.openai.endpoint.clone(),
        resolve_api_key(&config.openai.api_key)?,
        BackendKind::Gpt35Turbo.model_id().to_string(),
    );
    report("openai", openai.health_check().await.err(), &mut failures);

    let anyscale = openai_compat::OpenAiCompatClient::new(
        config.anyscale.endpoint.clone(),
        resolve_api_key(&config.anyscale.api_key)?,
        BackendKind::Llama70b.model_id().to_string(),
    );
    report("anyscale", anyscale.health_check().await.err(), &mut failures);

    let gemini = gemini::GeminiClient::new(
        config.gemini.endpoint.clone(),
        resolve_api_key(&config.gemini.api_key)?,
        BackendKind::GeminiPro.model_id().to_string(),
    );
    report("gemini", gemini.health_check().await.err(), &mut failures);

    let guard = moderation::GuardModelClient::new(
        config.guard.endpoint.clone(),
        resolve_api_key(&config.guard.api_key)?,
        config.guard.model.clone(),
    );
    report("guard model", guard.health_check().await.err(), &mut failures);

    let rails = rails::RailsClient::new(config.rails.endpoint.clone(), config.rails.config_id.clone());
    report("rails engine", rails.health_check().await.err(), &mut failures);

    if failures > 0 {
        anyhow::bail!("{failures} endpoint(s) unreachable");
    }
    println!("{}", "all endpoints reachable".green());
    Ok(())
}

fn report(name: &str, error: Option<impl std::fmt::Display>, failures: &mut usize) {
    match error {
        None => println!("  {} {}", "ok".green().bold(), name),
        Some(e) => {
            *failures += 1;
            println!("  {} {} ({})", "fail".red().bold(), name, e);
        }
    }
}
