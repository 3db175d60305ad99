use serde::Deserialize;
use std::fs;
use std::sync::Arc;
use thiserror::Error;
use log::info;

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Failed to read prompts file '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse prompts file '{path}': {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
    #[error("Prompt template '{0}' is missing the {{product_list}} placeholder")]
    MissingPlaceholder(&'static str),
}

/// Persona, templates and user-facing strings. Any field left out of a
/// prompts file keeps its built-in value.
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct PromptConfig {
    pub routine_system_prompt: String,
    pub routine_request_template: String,
    pub allowed_topics: Vec<String>,
    pub refusal_message: String,
    pub failure_message: String,
    pub empty_selection_message: String,
    pub generating_message: String,
    pub thinking_message: String,
    pub empty_saved_message: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            routine_system_prompt: "You are a helpful skincare and beauty routine assistant."
                .to_string(),
            routine_request_template: "Here are my selected products:\n{product_list}\n\nPlease generate a simple routine using these products. Explain each step simply for a beginner."
                .to_string(),
            allowed_topics: [
                "skincare",
                "haircare",
                "makeup",
                "fragrance",
                "routine",
                "beauty",
                "product",
                "step",
                "how",
                "why",
                "when",
                "what",
            ]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            refusal_message: "Sorry, I can only answer questions about your routine or beauty topics like skincare, haircare, makeup, or fragrance."
                .to_string(),
            failure_message: "Sorry, something went wrong. Please try again.".to_string(),
            empty_selection_message: "Please select at least one product.".to_string(),
            generating_message: "Generating routine...".to_string(),
            thinking_message: "Thinking...".to_string(),
            empty_saved_message: "No products saved yet".to_string(),
        }
    }
}

impl PromptConfig {
    fn validate(&self) -> Result<(), PromptError> {
        if !self.routine_request_template.contains("{product_list}") {
            return Err(PromptError::MissingPlaceholder("routine_request_template"));
        }
        Ok(())
    }

    pub fn routine_request(&self, product_list: &str) -> String {
        self.routine_request_template.replace("{product_list}", product_list)
    }

    /// Network failures are shown to the user as `Error: <message>`.
    pub fn error_message(&self, err: &dyn std::fmt::Display) -> String {
        format!("Error: {}", err)
    }
}

pub fn load_prompts(path: &str) -> Result<Arc<PromptConfig>, PromptError> {
    let file_content = fs::read_to_string(path).map_err(|source| PromptError::Io {
        path: path.to_string(),
        source,
    })?;
    let config: PromptConfig = serde_json::from_str(&file_content).map_err(|source| PromptError::Json {
        path: path.to_string(),
        source,
    })?;
    config.validate()?;
    info!("Loaded prompt overrides from {}", path);
    Ok(Arc::new(config))
}

pub fn load_prompts_or_default(path: Option<&str>) -> Result<Arc<PromptConfig>, PromptError> {
    match path {
        Some(p) => load_prompts(p),
        None => Ok(Arc::new(PromptConfig::default())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_file_keeps_builtin_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{ "refusal_message": "Beauty questions only." }"#).unwrap();

        let config = load_prompts(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.refusal_message, "Beauty questions only.");
        assert_eq!(config.thinking_message, "Thinking...");
        assert_eq!(config.allowed_topics.len(), 12);
    }

    #[test]
    fn template_without_placeholder_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{ "routine_request_template": "make a routine" }"#).unwrap();
        assert!(matches!(
            load_prompts(file.path().to_str().unwrap()),
            Err(PromptError::MissingPlaceholder(_))
        ));
    }

    #[test]
    fn routine_request_inlines_product_list() {
        let config = PromptConfig::default();
        let text = config.routine_request("- Serum (L'Oréal)");
        assert!(text.starts_with("Here are my selected products:\n- Serum (L'Oréal)\n\nPlease generate"));
    }
}
