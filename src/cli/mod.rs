use clap::{ Args as ClapArgs, Parser };
use std::time::Duration;

use crate::gateway::DEFAULT_CHAT_MODEL;
use crate::llm::LlmConfig;

#[derive(ClapArgs, Debug, Clone)]
pub struct OllamaArgs {
    /// Base URL of the Ollama runtime (e.g., http://localhost:11434)
    #[arg(long, env = "OLLAMA_BASE_URL")] // No default, let the client handle it if None
    pub ollama_base_url: Option<String>,

    /// Seconds Ollama may stay silent (connect or between reads) before a call
    /// fails. Unset means wait indefinitely.
    #[arg(long, env = "OLLAMA_TIMEOUT_SECS")]
    pub ollama_timeout_secs: Option<u64>,
}

impl OllamaArgs {
    pub fn llm_config(&self) -> LlmConfig {
        LlmConfig {
            base_url: self.ollama_base_url.clone().filter(|u| !u.trim().is_empty()),
            timeout: self.ollama_timeout_secs.map(Duration::from_secs),
        }
    }
}

#[derive(ClapArgs, Debug, Clone)]
pub struct TlsArgs {
    /// Optional path to the TLS certificate file (PEM format). Requires --tls-key-path.
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert_path: Option<String>,

    /// Optional path to the TLS private key file (PEM format). Requires --tls-cert-path.
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key_path: Option<String>,

    #[arg(long, env = "ENABLE_TLS", default_value = "false")]
    pub enable_tls: bool,
}

/// Chat gateway in front of a local Ollama runtime.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct GatewayArgs {
    /// Host address and port for the server to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "0.0.0.0:8000")]
    pub server_addr: String,

    /// Model used when a chat request does not name one.
    #[arg(long, env = "DEFAULT_MODEL", default_value = DEFAULT_CHAT_MODEL)]
    pub default_model: String,

    #[command(flatten)]
    pub ollama: OllamaArgs,

    #[command(flatten)]
    pub tls: TlsArgs,
}

/// Clone orchestrator serving named personas over Ollama.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct OrchestratorArgs {
    /// Host address and port for the server to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "0.0.0.0:8001")]
    pub server_addr: String,

    /// Directory holding loyalty-core.json and the clones/ directory.
    #[arg(long, env = "PRIMEX_CONFIG_DIR", default_value = "config")]
    pub config_dir: String,

    #[command(flatten)]
    pub ollama: OllamaArgs,

    #[command(flatten)]
    pub tls: TlsArgs,
}
