//! Process configuration: CLI flags layered over environment variables.

use clap::Parser;
use std::path::PathBuf;

/// Backend API for the Enterprise NotebookLM workspace.
#[derive(Parser, Debug)]
#[command(name = "notebook-server", version, about)]
pub struct Config {
    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 3001)]
    pub port: u16,

    /// Address to bind.
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0")]
    pub bind_addr: String,

    /// Directory for uploaded files and saved session transcripts.
    #[arg(long, env = "UPLOADS_DIR", default_value = "uploads")]
    pub uploads_dir: PathBuf,

    /// Gemini API key.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: String,

    /// Gemini model name.
    #[arg(long, env = "GEMINI_MODEL", default_value = "gemini-3-pro-preview")]
    pub gemini_model: String,
}
