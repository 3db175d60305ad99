use log::{ debug, info };
use serde::Serialize;
use std::collections::HashSet;
use thiserror::Error;
use crate::catalog::CatalogError;
use crate::models::product::{ Product, ProductId };
use crate::storage::{ SelectionStore, StorageError };

pub const SHOW_DESCRIPTION: &str = "Show Description";
pub const HIDE_DESCRIPTION: &str = "Hide Description";

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductCard {
    pub id: ProductId,
    pub name: String,
    pub brand: String,
    pub image: String,
    pub description: String,
    pub selected: bool,
    pub description_expanded: bool,
    pub toggle_label: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionItem {
    pub id: ProductId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SelectionPanel {
    Empty {
        message: String,
    },
    Items {
        items: Vec<SelectionItem>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionChange {
    /// Whether the product is selected after the change.
    pub selected: bool,
    /// Re-rendered cards for the active category, if one is active.
    pub cards: Option<Vec<ProductCard>>,
    pub panel: SelectionPanel,
}

/// Ordered product snapshots with unique ids. Insertion order is display order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    products: Vec<Product>,
}

impl Selection {
    pub fn from_products(products: Vec<Product>) -> Self {
        let mut selection = Self::default();
        for product in products {
            selection.insert(product);
        }
        selection
    }

    pub fn contains(&self, key: &str) -> bool {
        self.products.iter().any(|p| p.id.matches(key))
    }

    pub fn insert(&mut self, product: Product) -> bool {
        if self.contains(&product.id.as_key()) {
            return false;
        }
        self.products.push(product);
        true
    }

    pub fn remove(&mut self, key: &str) -> bool {
        let before = self.products.len();
        self.products.retain(|p| !p.id.matches(key));
        self.products.len() != before
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

/// Category filter, product cards and the selection panel. Owns the
/// in-memory selection and writes it through to the store on every change.
/// Catalog fetches happen outside; operations take the freshly loaded list.
pub struct CatalogBrowser {
    store: SelectionStore,
    selection: Selection,
    current_category: Option<String>,
    rendered: Vec<Product>,
    expanded: HashSet<String>,
    empty_message: String,
}

impl CatalogBrowser {
    pub fn new(store: SelectionStore, empty_message: impl Into<String>) -> Self {
        Self {
            store,
            selection: Selection::default(),
            current_category: None,
            rendered: Vec::new(),
            expanded: HashSet::new(),
            empty_message: empty_message.into(),
        }
    }

    pub async fn hydrate(&mut self) -> Result<SelectionPanel, StorageError> {
        let saved = self.store.load().await?;
        info!("Hydrated {} selected product(s) from storage", saved.len());
        self.selection = Selection::from_products(saved);
        Ok(self.selection_panel())
    }

    pub fn selection(&self) -> &[Product] {
        self.selection.products()
    }

    pub fn current_category(&self) -> Option<&str> {
        self.current_category.as_deref()
    }

    pub fn is_selected(&self, id: &ProductId) -> bool {
        self.selection.contains(&id.as_key())
    }

    /// Replaces the rendered card list. Description toggles reset to hidden.
    pub fn display_products(&mut self, products: Vec<Product>) -> Vec<ProductCard> {
        self.rendered = products;
        self.expanded.clear();
        self.cards()
    }

    pub fn cards(&self) -> Vec<ProductCard> {
        self.rendered.iter().map(|p| self.card_for(p)).collect()
    }

    fn card_for(&self, product: &Product) -> ProductCard {
        let description_expanded = self.expanded.contains(&product.id.as_key());
        ProductCard {
            id: product.id.clone(),
            name: product.name.clone(),
            brand: product.brand.clone(),
            image: product.image.clone(),
            description: product.description.clone(),
            selected: self.is_selected(&product.id),
            description_expanded,
            toggle_label: if description_expanded { HIDE_DESCRIPTION } else { SHOW_DESCRIPTION },
        }
    }

    fn filter_category(products: Vec<Product>, category: &str) -> Vec<Product> {
        products.into_iter().filter(|p| p.category == category).collect()
    }

    pub fn change_category(&mut self, category: &str, products: Vec<Product>) -> Vec<ProductCard> {
        self.current_category = Some(category.to_string());
        let filtered = Self::filter_category(products, category);
        debug!("Category '{}' has {} product(s)", category, filtered.len());
        self.display_products(filtered)
    }

    pub fn toggle_description(&mut self, id: &str) -> Option<ProductCard> {
        let product = self.rendered.iter().find(|p| p.id.matches(id))?;
        let key = product.id.as_key();
        if !self.expanded.remove(&key) {
            self.expanded.insert(key);
        }
        Some(self.card_for(product))
    }

    /// Selects or unselects a product by id. The id is resolved against a
    /// fresh catalog load so numeric and string forms both match. Unknown ids
    /// change nothing.
    pub async fn toggle_select(
        &mut self,
        id: &str,
        products: Vec<Product>,
    ) -> Result<Option<SelectionChange>, StorageError> {
        let Some(product) = products.iter().find(|p| p.id.matches(id)).cloned() else {
            debug!("Ignoring toggle for unknown product id '{}'", id);
            return Ok(None);
        };

        let mut next = self.selection.clone();
        let selected = if next.contains(id) {
            next.remove(id);
            false
        } else {
            next.insert(product);
            true
        };
        self.store.save(next.products()).await?;
        self.selection = next;
        info!("Product '{}' {}", id, if selected { "selected" } else { "unselected" });

        let cards = match self.current_category.clone() {
            Some(category) => Some(self.display_products(Self::filter_category(products, &category))),
            None => None,
        };

        Ok(Some(SelectionChange {
            selected,
            cards,
            panel: self.selection_panel(),
        }))
    }

    /// Removal from the selection panel. Rendered cards keep their
    /// description state and only lose the selected mark.
    pub async fn remove_selected(&mut self, id: &str) -> Result<SelectionChange, StorageError> {
        let mut next = self.selection.clone();
        next.remove(id);
        self.store.save(next.products()).await?;
        self.selection = next;

        Ok(SelectionChange {
            selected: false,
            cards: Some(self.cards()),
            panel: self.selection_panel(),
        })
    }

    pub fn selection_panel(&self) -> SelectionPanel {
        if self.selection.is_empty() {
            return SelectionPanel::Empty { message: self.empty_message.clone() };
        }
        SelectionPanel::Items {
            items: self.selection
                .products()
                .iter()
                .map(|p| SelectionItem { id: p.id.clone(), name: p.name.clone() })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::catalog_file;
    use crate::catalog::{ CatalogLoader, CatalogSource };
    use crate::storage::{ KeyValueStore, MemoryStorage, SELECTED_PRODUCTS_KEY };
    use std::sync::Arc;

    struct Fixture {
        _catalog: tempfile::NamedTempFile,
        loader: CatalogLoader,
        storage: Arc<MemoryStorage>,
        browser: CatalogBrowser,
    }

    impl Fixture {
        async fn products(&self) -> Vec<Product> {
            self.loader.load_products().await.unwrap()
        }

        async fn toggle(&mut self, id: &str) -> Option<SelectionChange> {
            let products = self.products().await;
            self.browser.toggle_select(id, products).await.unwrap()
        }

        async fn show(&mut self, category: &str) -> Vec<ProductCard> {
            let products = self.products().await;
            self.browser.change_category(category, products)
        }
    }

    fn fixture() -> Fixture {
        let catalog = catalog_file();
        let loader = CatalogLoader::new(CatalogSource::File(catalog.path().to_path_buf()));
        let storage = Arc::new(MemoryStorage::new());
        let browser = CatalogBrowser::new(SelectionStore::new(storage.clone()), "No products saved yet");
        Fixture { _catalog: catalog, loader, storage, browser }
    }

    #[tokio::test]
    async fn category_change_renders_exact_subset_with_selection_marks() {
        let mut fx = fixture();
        fx.toggle("4").await;

        let cards = fx.show("Skincare").await;
        let names: Vec<_> = cards.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Revitalift Serum", "Moisturizing Cream"]);
        assert!(!cards[0].selected);
        assert!(cards[1].selected);
        assert!(cards.iter().all(|c| !c.description_expanded && c.toggle_label == SHOW_DESCRIPTION));
        assert_eq!(fx.browser.current_category(), Some("Skincare"));
    }

    #[tokio::test]
    async fn select_then_unselect_restores_stored_bytes() {
        let mut fx = fixture();
        fx.toggle("1").await;
        let before = fx.storage.get_item(SELECTED_PRODUCTS_KEY).await.unwrap();

        let change = fx.toggle("2").await.unwrap();
        assert!(change.selected);
        let change = fx.toggle("2").await.unwrap();
        assert!(!change.selected);

        let after = fx.storage.get_item(SELECTED_PRODUCTS_KEY).await.unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn toggle_matches_string_and_numeric_ids() {
        let mut fx = fixture();
        let change = fx.toggle("3").await.unwrap();
        assert!(change.selected);
        assert!(change.cards.is_none());
        assert_eq!(
            change.panel,
            SelectionPanel::Items {
                items: vec![SelectionItem { id: ProductId::from("3"), name: "Elvive Shampoo".into() }],
            }
        );

        assert!(fx.toggle("999").await.is_none());
        assert_eq!(fx.browser.selection().len(), 1);
    }

    #[tokio::test]
    async fn selection_survives_reload_in_insertion_order() {
        let mut fx = fixture();
        for id in ["4", "1", "3"] {
            fx.toggle(id).await;
        }

        let mut reloaded = CatalogBrowser::new(SelectionStore::new(fx.storage.clone()), "No products saved yet");
        reloaded.hydrate().await.unwrap();
        let ids: Vec<_> = reloaded.selection().iter().map(|p| p.id.as_key()).collect();
        assert_eq!(ids, vec!["4", "1", "3"]);
    }

    #[tokio::test]
    async fn description_toggle_flips_label_and_resets_on_rerender() {
        let mut fx = fixture();
        fx.show("Skincare").await;

        let card = fx.browser.toggle_description("2").unwrap();
        assert!(card.description_expanded);
        assert_eq!(card.toggle_label, HIDE_DESCRIPTION);
        let card = fx.browser.toggle_description("2").unwrap();
        assert_eq!(card.toggle_label, SHOW_DESCRIPTION);

        fx.browser.toggle_description("2");
        let cards = fx.show("Skincare").await;
        assert!(cards.iter().all(|c| !c.description_expanded));
        assert!(fx.browser.toggle_description("3").is_none());
    }

    #[tokio::test]
    async fn removing_from_panel_unmarks_card_and_shows_empty_state() {
        let mut fx = fixture();
        fx.show("Skincare").await;
        fx.toggle("2").await;
        fx.browser.toggle_description("4");

        let change = fx.browser.remove_selected("2").await.unwrap();
        let cards = change.cards.unwrap();
        assert!(cards.iter().all(|c| !c.selected));
        assert!(cards[1].description_expanded);
        assert_eq!(change.panel, SelectionPanel::Empty { message: "No products saved yet".into() });
        assert_eq!(
            fx.storage.get_item(SELECTED_PRODUCTS_KEY).await.unwrap().as_deref(),
            Some("[]")
        );
    }

    #[test]
    fn selection_rejects_duplicate_ids() {
        let product: Product = serde_json::from_value(serde_json::json!({ "id": 5, "name": "A" })).unwrap();
        let same_as_text: Product = serde_json::from_value(serde_json::json!({ "id": "5", "name": "B" })).unwrap();
        let selection = Selection::from_products(vec![product, same_as_text]);
        assert_eq!(selection.products().len(), 1);
        assert_eq!(selection.products()[0].name, "A");
    }
}
