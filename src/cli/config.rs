use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::generator::backend::{DEFAULT_API_KEY_ENV, DEFAULT_ENDPOINT, DEFAULT_MODEL};

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "form-builder",
    version,
    about = "Build and edit web-form JSON from natural-language requests"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Chat-completions API endpoint
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// Model name
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Path to config file (default: form-builder.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Interactive session: describe a form, then keep editing it
    Chat {
        /// Completion backend: http or mock
        #[arg(long, default_value = "http")]
        backend: String,

        /// Append a JSON line per round to this file
        #[arg(long)]
        trace: Option<String>,

        /// Mock backend only: file with one canned completion per line
        #[arg(long)]
        replay: Option<String>,
    },

    /// Reconcile a candidate form from a file, without calling a model
    Reconcile {
        /// Candidate form JSON (array of fields)
        #[arg(long)]
        input: String,

        /// Previously reconciled form whose ids count as already used
        #[arg(long)]
        previous: Option<String>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<String>,
    },
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `form-builder.yaml`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub trace: TraceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Name of the environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_one")]
    pub temperature: f32,

    #[serde(default = "default_one")]
    pub top_p: f32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            temperature: 1.0,
            top_p: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TraceConfig {
    pub path: Option<String>,
}

// Serde default helpers
fn default_endpoint() -> String { DEFAULT_ENDPOINT.to_string() }
fn default_model() -> String { DEFAULT_MODEL.to_string() }
fn default_api_key_env() -> String { DEFAULT_API_KEY_ENV.to_string() }
fn default_one() -> f32 { 1.0 }

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. Returns defaults if file is missing or malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or("form-builder.yaml");
    match std::fs::read_to_string(config_path) {
        Ok(content) => serde_yaml::from_str(&content).unwrap_or_default(),
        Err(_) => AppConfig::default(),
    }
}

// ============================================================================
// Resolution (CLI > config file > defaults)
// ============================================================================

/// Apply CLI overrides on top of the loaded config.
pub fn resolve_generator(
    config: &AppConfig,
    endpoint: Option<&str>,
    model: Option<&str>,
) -> GeneratorConfig {
    let mut resolved = config.generator.clone();
    if let Some(e) = endpoint {
        resolved.endpoint = e.to_string();
    }
    if let Some(m) = model {
        resolved.model = m.to_string();
    }
    resolved
}
