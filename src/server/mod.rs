pub mod api;
pub mod websocket;

use crate::app::AppState;
use std::error::Error;
use std::sync::Arc;

pub struct Server {
    addr: String,
    http_port: u16,
    state: Arc<AppState>,
    api_key: Option<String>,
}

impl Server {
    pub fn new(
        addr: String,
        http_port: u16,
        state: Arc<AppState>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            addr,
            http_port,
            state,
            api_key,
        }
    }

    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        api::start_http_server(self.http_port, self.state.clone()).await?;
        websocket::start_ws_server(&self.addr, self.state.clone(), self.api_key.clone()).await
    }
}
