use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Catalog Args ---
    /// Product catalog document: a file path or an http(s) URL
    #[arg(long, env = "CATALOG_SOURCE", default_value = "products.json")]
    pub catalog: String,

    // --- Selection Storage Args ---
    /// Durable storage backend for the product selection (file, redis, memory)
    #[arg(long, env = "STORAGE_TYPE", default_value = "file")]
    pub storage_type: String,

    /// Path of the JSON document used by the file storage backend.
    #[arg(long, env = "STORAGE_PATH", default_value = "data/local_storage.json")]
    pub storage_path: String,

    /// Redis endpoint used by the redis storage backend (e.g., redis://127.0.0.1:6379)
    #[arg(long, env = "STORAGE_REDIS_URL", default_value = "redis://127.0.0.1:6379")]
    pub storage_redis_url: String,

    /// Prefix for Redis storage keys.
    #[arg(long, env = "STORAGE_REDIS_PREFIX", default_value = "routine-advisor:")]
    pub storage_redis_prefix: String,

    // --- Chat Completion Args ---
    /// Chat completion endpoint used by the chat assistant
    #[arg(long, env = "CHAT_URL", default_value = "https://api.openai.com/v1/chat/completions")]
    pub chat_url: String,

    /// Bearer credential for the chat completion endpoint
    #[arg(long, env = "CHAT_API_KEY", default_value = "")]
    pub chat_api_key: String,

    /// Model name sent with every completion request (chat and routine)
    #[arg(long, env = "CHAT_MODEL", default_value = "gpt-4o")]
    pub chat_model: String,

    // --- Routine Relay Args ---
    /// Relay endpoint that forwards routine requests to the completion API.
    #[arg(long, env = "RELAY_URL", default_value = "http://127.0.0.1:8787/")]
    pub relay_url: String,

    /// Optional bearer credential for the relay. The relay normally holds the
    /// upstream secret itself, so nothing is attached unless this is set.
    #[arg(long, env = "RELAY_API_KEY")]
    pub relay_api_key: Option<String>,

    // --- General App Args ---
    /// Optional JSON file overriding the built-in prompts and messages.
    #[arg(long, env = "PROMPTS_PATH")]
    pub prompts_path: Option<String>,

    /// Enable debug logging/output
    #[arg(long, env = "DEBUG", default_value = "false")]
    pub debug: bool,

    /// Host address and port for the chat WebSocket server to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "127.0.0.1:4000")]
    pub server_addr: String,

    /// Port for the HTTP API serving catalog, selection and routine routes.
    #[arg(long, env = "HTTP_PORT", default_value = "4001")]
    pub http_port: u16,

    /// Optional API Key required for clients to connect to the WebSocket server. If set, clients must provide a signed timestamp.
    #[arg(long, env = "SERVER_API_KEY")]
    pub server_api_key: Option<String>,
}
