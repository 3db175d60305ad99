pub mod app;
pub mod assistant;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod llm;
pub mod models;
pub mod server;
pub mod storage;

use app::AppState;
use cli::Args;
use log::info;
use server::Server;
use std::error::Error;
use std::sync::Arc;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Catalog Source: {}", args.catalog);
    info!("Storage Type: {}", args.storage_type);
    info!("Chat URL: {}", args.chat_url);
    info!("Chat Model: {}", args.chat_model);
    info!("Chat Credential: {}", if args.chat_api_key.is_empty() { "not set" } else { "set" });
    info!("Relay URL: {}", args.relay_url);
    info!("Prompts Path: {}", args.prompts_path.as_deref().unwrap_or("built-in"));
    info!("WebSocket Address: {}", args.server_addr);
    info!("HTTP Port: {}", args.http_port);
    info!("-------------------------");

    let state = Arc::new(AppState::new(&args).await?);
    let server = Server::new(
        args.server_addr.clone(),
        args.http_port,
        state,
        args.server_api_key.clone(),
    );
    server.run().await?;

    Ok(())
}
