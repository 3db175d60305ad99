use serde::{ Deserialize, Serialize };
use serde_json::{ Map, Value };
use std::fmt;
use std::hash::{ Hash, Hasher };

/// Catalog identifier. Catalogs mix numeric and string ids, so the original
/// representation is kept for serialization while comparisons go through the
/// stringified form.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProductId {
    Number(serde_json::Number),
    Text(String),
}

impl ProductId {
    pub fn as_key(&self) -> String {
        match self {
            ProductId::Number(n) => n.to_string(),
            ProductId::Text(s) => s.clone(),
        }
    }

    pub fn matches(&self, key: &str) -> bool {
        match self {
            ProductId::Number(n) => n.to_string() == key,
            ProductId::Text(s) => s == key,
        }
    }
}

impl PartialEq for ProductId {
    fn eq(&self, other: &Self) -> bool {
        self.as_key() == other.as_key()
    }
}

impl Eq for ProductId {}

impl Hash for ProductId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_key().hash(state);
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_key())
    }
}

impl From<&str> for ProductId {
    fn from(value: &str) -> Self {
        ProductId::Text(value.to_string())
    }
}

impl From<i64> for ProductId {
    fn from(value: i64) -> Self {
        ProductId::Number(value.into())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub description: String,
    /// Catalog fields this service does not interpret. Kept so a stored
    /// snapshot mirrors the catalog entry it was taken from.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CatalogDocument {
    pub products: Vec<Product>,
}
