// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Arena Configuration
//
// One YAML manifest covering the listen address, the provider endpoints,
// the guard model, the rails service, and the conversation store. API keys
// use the `env:VAR_NAME` indirection so manifests can be committed without
// secrets; resolution happens once at wiring time.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// HTTP listen address for the arena API.
    pub listen: String,

    /// OpenAI-compatible endpoint serving the GPT backend.
    pub openai: ProviderConfig,

    /// OpenAI-compatible gateway hosting the open models.
    pub anyscale: ProviderConfig,

    /// Google generateContent endpoint.
    pub gemini: ProviderConfig,

    /// Safety classifier completion endpoint.
    pub guard: GuardConfig,

    /// Rails generation service.
    pub rails: RailsConfig,

    /// External conversation store.
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub endpoint: String,
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RailsConfig {
    pub endpoint: String,
    pub config_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub base_url: String,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:8200".into(),
            openai: ProviderConfig {
                endpoint: "https://api.openai.com/v1".into(),
                api_key: "env:OPENAI_API_KEY".into(),
            },
            anyscale: ProviderConfig {
                endpoint: "https://api.endpoints.anyscale.com/v1".into(),
                api_key: "env:ANYSCALE_API_KEY".into(),
            },
            gemini: ProviderConfig {
                endpoint: "https://generativelanguage.googleapis.com".into(),
                api_key: "env:GOOGLE_API_KEY".into(),
            },
            guard: GuardConfig {
                endpoint: "https://api.endpoints.anyscale.com/v1".into(),
                api_key: "env:ANYSCALE_API_KEY".into(),
                model: "Meta-Llama/Llama-Guard-7b".into(),
            },
            rails: RailsConfig {
                endpoint: "http://127.0.0.1:8001".into(),
                config_id: "bank_support".into(),
            },
            store: StoreConfig {
                base_url: "env:ARENA_STORE_URL".into(),
            },
        }
    }
}

impl ArenaConfig {
    /// Load from an explicit manifest path, or fall back to defaults when
    /// no path is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        serde_yaml::from_str(&raw)
            .with_context(|| format!("failed to parse config {}", path.display()))
    }
}

/// Resolve a configured secret, supporting the `env:VAR_NAME` syntax.
pub fn resolve_api_key(key: &str) -> anyhow::Result<String> {
    match key.strip_prefix("env:") {
        Some(var_name) => std::env::var(var_name)
            .map_err(|_| anyhow::anyhow!("environment variable not set: {}", var_name)),
        None => Ok(key.to_string()),
    }
}
