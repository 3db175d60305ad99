use log::info;
use std::error::Error;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::assistant::chat::ChatAssistant;
use crate::assistant::routine::{ RoutineGenerator, RoutineOutput };
use crate::catalog::browser::{ BrowserError, CatalogBrowser, ProductCard, SelectionChange };
use crate::catalog::{ CatalogLoader, CatalogSource };
use crate::cli::Args;
use crate::config::prompt::{ self, PromptConfig };
use crate::llm::chat::{ new_client, CompletionClient };
use crate::llm::LlmConfig;
use crate::models::chat::Conversation;
use crate::storage::{ initialize_storage, SelectionStore };

pub struct RoutineState {
    pub output: RoutineOutput,
    /// Replaced on every generation request; never shared with chat sessions.
    pub conversation: Conversation,
}

/// Everything the widget used to keep in page globals.
pub struct AppState {
    catalog: CatalogLoader,
    pub browser: Mutex<CatalogBrowser>,
    pub routine: Mutex<RoutineState>,
    routine_generator: RoutineGenerator,
    chat_client: Arc<dyn CompletionClient>,
    prompts: Arc<PromptConfig>,
}

impl AppState {
    pub fn from_parts(
        catalog: CatalogLoader,
        browser: CatalogBrowser,
        routine_client: Arc<dyn CompletionClient>,
        chat_client: Arc<dyn CompletionClient>,
        prompts: Arc<PromptConfig>,
    ) -> Self {
        Self {
            catalog,
            browser: Mutex::new(browser),
            routine: Mutex::new(RoutineState {
                output: RoutineOutput::Idle,
                conversation: Conversation::new(),
            }),
            routine_generator: RoutineGenerator::new(routine_client, Arc::clone(&prompts)),
            chat_client,
            prompts,
        }
    }

    pub async fn new(args: &Args) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let prompts = prompt::load_prompts_or_default(args.prompts_path.as_deref())?;

        let source = CatalogSource::parse(&args.catalog);
        info!("Catalog source: {:?}", source);
        let storage = initialize_storage(args)?;
        let mut browser = CatalogBrowser::new(SelectionStore::new(storage), prompts.empty_saved_message.clone());
        // A corrupt stored selection aborts startup.
        browser.hydrate().await?;

        let chat_config = LlmConfig::new(
            args.chat_url.clone(),
            Some(args.chat_api_key.clone()),
            args.chat_model.clone(),
        );
        let chat_client = new_client(&chat_config)?;
        info!("Chat client configured: URL={}, Model={}", chat_config.api_url, chat_config.model);

        let relay_config = LlmConfig::new(
            args.relay_url.clone(),
            args.relay_api_key.clone(),
            args.chat_model.clone(),
        );
        let routine_client = new_client(&relay_config)?;
        info!("Routine relay configured: URL={}", relay_config.api_url);

        Ok(Self::from_parts(CatalogLoader::new(source), browser, routine_client, chat_client, prompts))
    }

    /// Loads the catalog, then switches the browser to `category`. The browser
    /// lock is only taken once the fetch has finished.
    pub async fn change_category(&self, category: &str) -> Result<Vec<ProductCard>, BrowserError> {
        let products = self.catalog.load_products().await?;
        Ok(self.browser.lock().await.change_category(category, products))
    }

    pub async fn toggle_select(&self, id: &str) -> Result<Option<SelectionChange>, BrowserError> {
        let products = self.catalog.load_products().await?;
        let change = self.browser.lock().await.toggle_select(id, products).await?;
        Ok(change)
    }

    /// A fresh chat session with an empty conversation.
    pub fn new_chat(&self) -> ChatAssistant {
        ChatAssistant::new(Arc::clone(&self.chat_client), Arc::clone(&self.prompts))
    }

    pub async fn generate_routine(&self) -> RoutineOutput {
        let selection = self.browser.lock().await.selection().to_vec();
        if !selection.is_empty() {
            self.routine.lock().await.output = self.routine_generator.generating();
        }

        let routine = self.routine_generator.generate(&selection).await;

        let mut state = self.routine.lock().await;
        state.output = routine.output.clone();
        if let Some(conversation) = routine.conversation {
            state.conversation = conversation;
        }
        routine.output
    }

    pub async fn routine_output(&self) -> RoutineOutput {
        self.routine.lock().await.output.clone()
    }
}
