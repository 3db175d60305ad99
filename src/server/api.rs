use crate::app::AppState;
use crate::catalog::browser::{ BrowserError, ProductCard };
use crate::catalog::CatalogError;
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use axum::{
    routing::{ get, post },
    Router,
    Json,
    extract::{ Path, Query, State },
    response::{ IntoResponse, Response },
    http::StatusCode,
};
use serde::{ Deserialize, Serialize };
use thiserror::Error;
use tower_http::cors::{ Any, CorsLayer };
use log::{ info, error };

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Product '{0}' not found")]
    NotFound(String),
    #[error(transparent)]
    Browser(#[from] BrowserError),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Browser(BrowserError::Catalog(CatalogError::Io { .. })) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Browser(BrowserError::Catalog(_)) => StatusCode::BAD_GATEWAY,
            ApiError::Browser(BrowserError::Storage(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        error!("API error: {}", self);
        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}

#[derive(Deserialize)]
pub struct CategoryQuery {
    pub category: Option<String>,
}

#[derive(Serialize)]
struct ProductsResponse {
    category: Option<String>,
    cards: Vec<ProductCard>,
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/products", get(products_handler))
        .route("/api/products/{id}/toggle", post(toggle_select_handler))
        .route("/api/products/{id}/description", post(toggle_description_handler))
        .route("/api/selection", get(selection_handler))
        .route("/api/selection/{id}", axum::routing::delete(remove_selected_handler))
        .route("/api/routine", get(routine_output_handler).post(generate_routine_handler))
        .layer(cors)
        .with_state(state)
}

pub async fn start_http_server(
    http_port: u16,
    state: Arc<AppState>,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let addr = format!("0.0.0.0:{}", http_port).parse::<SocketAddr>()?;
    info!("Starting HTTP API server on: http://{}", addr);

    let app = router(state);

    tokio::spawn(async move {
        match tokio::net::TcpListener::bind(addr).await {
            Ok(listener) => {
                if let Err(e) = axum::serve(listener, app.into_make_service()).await {
                    error!("HTTP server error: {}", e);
                }
            },
            Err(e) => {
                error!("Failed to bind HTTP server to {}: {}. Try a different port.", addr, e);
            }
        }
    });

    info!("HTTP server started");
    Ok(())
}

async fn products_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CategoryQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let response = match query.category {
        Some(category) => {
            let cards = state.change_category(&category).await?;
            ProductsResponse { category: Some(category), cards }
        }
        None => {
            let browser = state.browser.lock().await;
            ProductsResponse {
                category: browser.current_category().map(String::from),
                cards: browser.cards(),
            }
        }
    };
    Ok(Json(response))
}

async fn toggle_select_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let change = state.toggle_select(&id).await?;
    change.map(Json).ok_or(ApiError::NotFound(id))
}

async fn toggle_description_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let card = state.browser.lock().await.toggle_description(&id);
    card.map(Json).ok_or(ApiError::NotFound(id))
}

async fn selection_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.browser.lock().await.selection_panel())
}

async fn remove_selected_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let change = state.browser.lock().await.remove_selected(&id).await.map_err(BrowserError::from)?;
    Ok(Json(change))
}

async fn generate_routine_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.generate_routine().await)
}

async fn routine_output_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.routine_output().await)
}
