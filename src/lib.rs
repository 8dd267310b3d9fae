pub mod cli;
pub mod config;
pub mod error;
pub mod gateway;
pub mod llm;
pub mod models;
pub mod orchestrator;
pub mod server;

use cli::{ GatewayArgs, OrchestratorArgs };
use config::OrchestratorConfig;
use gateway::ChatGateway;
use log::info;
use orchestrator::CloneOrchestrator;
use server::{ gateway_api, orchestrator_api, tls_paths, Server };
use std::error::Error;
use std::sync::Arc;

pub async fn run_gateway(args: GatewayArgs) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Gateway Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!(
        "Ollama Base URL: {}",
        args.ollama.ollama_base_url.as_deref().unwrap_or(llm::DEFAULT_OLLAMA_URL)
    );
    info!("Default Model: {}", args.default_model);
    info!("Ollama Timeout: {:?}", args.ollama.ollama_timeout_secs);
    info!("TLS Enabled: {}", args.tls.enable_tls);
    info!("-----------------------------");

    let tls = tls_paths(args.tls.enable_tls, &args.tls.tls_cert_path, &args.tls.tls_key_path)?;
    let client = llm::chat::new_client(&args.ollama.llm_config())?;
    let gateway = Arc::new(ChatGateway::new(client, args.default_model.clone()));

    info!("Starting chat gateway on: {}", args.server_addr);
    Server::new(args.server_addr, tls).run(gateway_api::build_router(gateway)).await
}

pub async fn run_orchestrator(args: OrchestratorArgs) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Orchestrator Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("Config Directory: {}", args.config_dir);
    info!(
        "Ollama Base URL: {}",
        args.ollama.ollama_base_url.as_deref().unwrap_or(llm::DEFAULT_OLLAMA_URL)
    );
    info!("Ollama Timeout: {:?}", args.ollama.ollama_timeout_secs);
    info!("TLS Enabled: {}", args.tls.enable_tls);
    info!("----------------------------------");

    let tls = tls_paths(args.tls.enable_tls, &args.tls.tls_cert_path, &args.tls.tls_key_path)?;
    let config = Arc::new(OrchestratorConfig::load(&args.config_dir)?);
    info!(
        "Owner: {}, Clones: {:?}",
        config.loyalty().owner.as_deref().unwrap_or("Unknown"),
        config.clone_names()
    );

    let client = llm::chat::new_client(&args.ollama.llm_config())?;
    let orchestrator = Arc::new(CloneOrchestrator::new(client, config));

    info!("Starting clone orchestrator on: {}", args.server_addr);
    Server::new(args.server_addr, tls).run(orchestrator_api::build_router(orchestrator)).await
}
