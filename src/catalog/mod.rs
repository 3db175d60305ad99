pub mod browser;

use log::{ debug, info };
use reqwest::Client as HttpClient;
use std::path::PathBuf;
use thiserror::Error;
use url::Url;
use crate::models::product::{ CatalogDocument, Product };

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog file '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to fetch catalog: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Catalog request to {url} returned status {status}")]
    Status {
        url: String,
        status: u16,
    },
    #[error("Failed to parse catalog document: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    File(PathBuf),
    Http(Url),
}

impl CatalogSource {
    pub fn parse(source: &str) -> Self {
        match Url::parse(source) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => CatalogSource::Http(url),
            _ => CatalogSource::File(PathBuf::from(source)),
        }
    }
}

/// Fetches the static catalog document. Every call goes back to the source:
/// nothing is cached, retried or timed out.
#[derive(Clone)]
pub struct CatalogLoader {
    source: CatalogSource,
    http: HttpClient,
}

impl CatalogLoader {
    pub fn new(source: CatalogSource) -> Self {
        Self { source, http: HttpClient::new() }
    }

    pub async fn load_products(&self) -> Result<Vec<Product>, CatalogError> {
        let body = match &self.source {
            CatalogSource::File(path) => {
                debug!("Reading catalog from {}", path.display());
                tokio::fs::read_to_string(path).await.map_err(|source| CatalogError::Io {
                    path: path.display().to_string(),
                    source,
                })?
            }
            CatalogSource::Http(url) => {
                debug!("Fetching catalog from {}", url);
                let resp = self.http.get(url.clone()).send().await?;
                if !resp.status().is_success() {
                    return Err(CatalogError::Status {
                        url: url.to_string(),
                        status: resp.status().as_u16(),
                    });
                }
                resp.text().await?
            }
        };
        let document: CatalogDocument = serde_json::from_str(&body)?;
        info!("Loaded {} product(s) from catalog", document.products.len());
        Ok(document.products)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use axum::{ routing::get, Router };
    use std::io::Write;

    pub(crate) const CATALOG_JSON: &str = r#"{
        "products": [
            { "id": 1, "name": "Hydrating Cleanser", "brand": "CeraVe", "category": "cleanser", "image": "c.jpg", "description": "Gentle daily cleanser." },
            { "id": 2, "name": "Revitalift Serum", "brand": "L'Oréal Paris", "category": "Skincare", "image": "s.jpg", "description": "Hyaluronic acid serum." },
            { "id": "3", "name": "Elvive Shampoo", "brand": "L'Oréal Paris", "category": "haircare", "image": "h.jpg", "description": "Repairing shampoo." },
            { "id": 4, "name": "Moisturizing Cream", "brand": "CeraVe", "category": "Skincare", "image": "m.jpg", "description": "Ceramide cream." }
        ]
    }"#;

    pub(crate) fn catalog_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CATALOG_JSON.as_bytes()).unwrap();
        file
    }

    #[test]
    fn source_parsing_distinguishes_urls_from_paths() {
        assert!(matches!(
            CatalogSource::parse("https://cdn.example.com/products.json"),
            CatalogSource::Http(_)
        ));
        assert_eq!(
            CatalogSource::parse("products.json"),
            CatalogSource::File(PathBuf::from("products.json"))
        );
        assert!(matches!(CatalogSource::parse("C:/data/products.json"), CatalogSource::File(_)));
    }

    #[tokio::test]
    async fn loads_products_field_from_file() {
        let file = catalog_file();
        let loader = CatalogLoader::new(CatalogSource::File(file.path().to_path_buf()));
        let products = loader.load_products().await.unwrap();
        assert_eq!(products.len(), 4);
        assert_eq!(products[2].id.as_key(), "3");
    }

    #[tokio::test]
    async fn missing_file_and_bad_json_are_errors() {
        let loader = CatalogLoader::new(CatalogSource::File(PathBuf::from("/nonexistent/products.json")));
        assert!(matches!(loader.load_products().await, Err(CatalogError::Io { .. })));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{\"items\": []}").unwrap();
        let loader = CatalogLoader::new(CatalogSource::File(file.path().to_path_buf()));
        assert!(matches!(loader.load_products().await, Err(CatalogError::Json(_))));
    }

    #[tokio::test]
    async fn fetches_over_http() {
        let app = Router::new().route("/products.json", get(|| async { CATALOG_JSON }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let source = CatalogSource::parse(&format!("http://{}/products.json", addr));
        let products = CatalogLoader::new(source).load_products().await.unwrap();
        assert_eq!(products.len(), 4);

        let missing = CatalogSource::parse(&format!("http://{}/missing.json", addr));
        assert!(matches!(
            CatalogLoader::new(missing).load_products().await,
            Err(CatalogError::Status { status: 404, .. })
        ));
    }
}
