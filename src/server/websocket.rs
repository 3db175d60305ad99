use crate::app::AppState;
use crate::assistant::chat::{ Resolution, Submission };
use crate::models::websocket::{ ClientMessage, ServerMessage };

use std::error::Error;
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::collections::HashMap;

use tokio::net::TcpListener;
use tokio::io::{ AsyncRead, AsyncWrite };

use tokio_tungstenite::{ accept_hdr_async, WebSocketStream };
use tokio_tungstenite::tungstenite::handshake::server::{ Request, Response, ErrorResponse };
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::protocol::Message;

use lazy_static::lazy_static;
use governor::{ RateLimiter, Quota, state::{ InMemoryState, NotKeyed }, clock::DefaultClock };

use hmac::{ Hmac, Mac };
use sha2::Sha256;
use chrono::Utc;
use url::form_urlencoded;

use log::{ info, warn, error, debug };
use futures::{ SinkExt, StreamExt };
use futures::stream::SplitSink;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

const MAX_MESSAGE_SIZE: usize = 64 * 1024;
const SIGNATURE_WINDOW_SECS: i64 = 300;

lazy_static! {
    static ref CONNECTION_LIMITER: RateLimiter<NotKeyed, InMemoryState, DefaultClock> =
        RateLimiter::direct(Quota::per_second(NonZeroU32::MIN.saturating_add(9)));
}

/// Checks `sig == hex(HMAC-SHA256(secret, ts))` and that `ts` is within the
/// allowed clock skew of `now`.
pub fn verify_signature(secret: &str, ts: &str, sig: &str, now: i64) -> Result<(), &'static str> {
    let ts_i: i64 = ts.parse().map_err(|_| "invalid timestamp")?;
    if (now - ts_i).abs() > SIGNATURE_WINDOW_SECS {
        return Err("timestamp out of range");
    }
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| "bad secret")?;
    mac.update(ts.as_bytes());
    let sig = hex::decode(sig).map_err(|_| "bad signature")?;
    mac.verify_slice(&sig).map_err(|_| "bad signature")
}

fn unauthorized(reason: &str) -> ErrorResponse {
    let mut res = ErrorResponse::new(Some(reason.to_string()));
    *res.status_mut() = StatusCode::UNAUTHORIZED;
    res
}

pub async fn start_ws_server(
    addr: &str,
    state: Arc<AppState>,
    api_key: Option<String>,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let listener = TcpListener::bind(addr).await?;
    info!("WS chat server listening on: {}", addr);
    serve(listener, state, api_key).await
}

pub async fn serve(
    listener: TcpListener,
    state: Arc<AppState>,
    api_key: Option<String>,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    loop {
        let (stream, peer) = listener.accept().await?;

        if CONNECTION_LIMITER.check().is_err() {
            warn!("Global connection rate limit exceeded for {}. Dropping connection.", peer);
            continue;
        }

        info!("Incoming connection from: {}", peer);
        let state_clone = Arc::clone(&state);
        let required_api_key = api_key.clone();

        tokio::spawn(async move {
            if let Err(e) = process_connection(peer, stream, state_clone, required_api_key).await {
                error!("Failed to process connection for {}: {}", peer, e);
            }
        });
    }
}

async fn process_connection<S>(
    peer: SocketAddr,
    stream: S,
    state: Arc<AppState>,
    required_api_key: Option<String>
) -> Result<(), Box<dyn Error + Send + Sync>>
    where S: AsyncRead + AsyncWrite + Unpin + Send + 'static
{
    let auth_callback = |req: &Request, response: Response| -> Result<Response, ErrorResponse> {
        let secret = match &required_api_key {
            Some(k) if !k.is_empty() => k,
            _ => return Ok(response),
        };

        let qs = req.uri().query().unwrap_or("");
        let params: HashMap<String, String> =
            form_urlencoded::parse(qs.as_bytes()).into_owned().collect();

        match (params.get("ts"), params.get("sig")) {
            (Some(ts), Some(sig)) => match verify_signature(secret, ts, sig, Utc::now().timestamp()) {
                Ok(()) => Ok(response),
                Err(reason) => {
                    warn!("Rejected handshake from {}: {}", peer, reason);
                    Err(unauthorized(reason))
                }
            },
            _ => Err(unauthorized("missing ts/sig")),
        }
    };

    let ws = accept_hdr_async(stream, auth_callback).await.map_err(|e| {
        error!("Handshake failed for {}: {}", peer, e);
        Box::new(e) as Box<dyn Error + Send + Sync>
    })?;
    handle_connection(peer, ws, state).await;
    Ok(())
}

async fn send<S>(
    tx: &mut SplitSink<WebSocketStream<S>, Message>,
    msg: &ServerMessage,
) -> Result<(), Box<dyn Error + Send + Sync>>
    where S: AsyncRead + AsyncWrite + Unpin
{
    let json = serde_json::to_string(msg)?;
    tx.send(Message::Text(json)).await?;
    Ok(())
}

/// One connection is one chat session: its conversation starts empty and is
/// dropped with the connection. Messages are handled in arrival order.
pub async fn handle_connection<S>(
    peer: SocketAddr,
    websocket: WebSocketStream<S>,
    state: Arc<AppState>
)
    where S: AsyncRead + AsyncWrite + Unpin
{
    let session_id = Uuid::new_v4();
    info!("New chat session {} for {}", session_id, peer);

    let (mut tx, mut rx) = websocket.split();
    let mut chat = state.new_chat();

    while let Some(msg) = rx.next().await {
        let message = match msg {
            Ok(m) => m,
            Err(e) => {
                error!("Error receiving message from {}: {}", peer, e);
                break;
            }
        };

        if message.len() > MAX_MESSAGE_SIZE {
            warn!("Message from {} exceeds size limit ({} > {})", peer, message.len(), MAX_MESSAGE_SIZE);
            let _ = send(&mut tx, &ServerMessage::Error { message: "Message too large".to_string() }).await;
            break;
        }

        let text = match message {
            Message::Text(text) => text,
            Message::Close(_) => {
                info!("Client {} closed session {}", peer, session_id);
                break;
            }
            _ => continue,
        };

        let content = match serde_json::from_str::<ClientMessage>(&text) {
            Ok(ClientMessage::Chat { content }) => content,
            Err(e) => {
                debug!("Invalid client message from {}: {}", peer, e);
                let reply = ServerMessage::Error { message: format!("Invalid message: {}", e) };
                if send(&mut tx, &reply).await.is_err() {
                    break;
                }
                continue;
            }
        };

        let result = match chat.submit(&content) {
            Submission::Ignored => Ok(()),
            Submission::Refused(notice) => send(&mut tx, &ServerMessage::Notice { content: notice }).await,
            Submission::Accepted { transcript, placeholder } => {
                let shown = send(&mut tx, &ServerMessage::Transcript {
                    lines: transcript,
                    timestamp: Utc::now().timestamp(),
                }).await;
                if let Err(e) = shown {
                    Err(e)
                } else if let Err(e) = send(&mut tx, &ServerMessage::Thinking { content: placeholder }).await {
                    Err(e)
                } else {
                    match chat.dispatch().await {
                        Resolution::Replied(lines) => send(&mut tx, &ServerMessage::Transcript {
                            lines,
                            timestamp: Utc::now().timestamp(),
                        }).await,
                        Resolution::Failed(notice) => send(&mut tx, &ServerMessage::Notice { content: notice }).await,
                    }
                }
            }
        };

        if let Err(e) = result {
            error!("Error sending to {}: {}", peer, e);
            break;
        }
    }

    info!("Chat session {} for {} ended", session_id, peer);
}
