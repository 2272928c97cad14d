//! Model catalog and selection
//!
//! A fixed enumeration of selectable LLMs. Display names are what clients
//! see and send back; resolution turns one into a ready-to-use
//! [`ModelClientConfig`].

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info};
use voyage_common::{ApiKeys, Result, VoyageError, constants::{endpoints, models, providers}};

/// One entry of the model catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModelEntry {
    /// Stable key, also the provider's model identifier
    pub key: &'static str,
    pub provider: &'static str,
    pub model_id: &'static str,
    pub display_name: &'static str,
    pub endpoint: &'static str,
}

/// Selectable models; the first entry is the default
pub const AVAILABLE_MODELS: &[ModelEntry] = &[
    ModelEntry {
        key: models::GPT_4O_MINI,
        provider: providers::OPENAI,
        model_id: models::GPT_4O_MINI,
        display_name: "OpenAI GPT-4o Mini",
        endpoint: endpoints::OPENAI,
    },
    ModelEntry {
        key: models::GEMINI_2_0_FLASH,
        provider: providers::GEMINI,
        model_id: models::GEMINI_2_0_FLASH,
        display_name: "Google Gemini 2.0 Flash (Free)",
        endpoint: endpoints::GEMINI,
    },
];

/// Everything needed to call one model
#[derive(Clone, PartialEq, Serialize)]
pub struct ModelClientConfig {
    pub key: String,
    pub provider: String,
    pub endpoint: String,
    pub model_id: String,
    pub display_name: String,
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl ModelClientConfig {
    fn from_entry(entry: &ModelEntry, keys: &ApiKeys) -> Self {
        Self {
            key: entry.key.to_string(),
            provider: entry.provider.to_string(),
            endpoint: entry.endpoint.to_string(),
            model_id: entry.model_id.to_string(),
            display_name: entry.display_name.to_string(),
            api_key: keys.for_provider(entry.provider).map(str::to_string),
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

impl std::fmt::Debug for ModelClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelClientConfig")
            .field("key", &self.key)
            .field("provider", &self.provider)
            .field("endpoint", &self.endpoint)
            .field("model_id", &self.model_id)
            .field("display_name", &self.display_name)
            .field("api_key", &self.api_key.as_ref().map(|_| "<set>"))
            .finish()
    }
}

/// Resolves catalog names into client configurations
#[derive(Debug, Clone, Default)]
pub struct ModelProvider {
    keys: ApiKeys,
}

impl ModelProvider {
    pub fn new(keys: ApiKeys) -> Self {
        Self { keys }
    }

    /// The full catalog, in enumeration order
    pub fn entries(&self) -> &'static [ModelEntry] {
        AVAILABLE_MODELS
    }

    /// Display names, in enumeration order
    pub fn list_display_names(&self) -> Vec<&'static str> {
        AVAILABLE_MODELS.iter().map(|m| m.display_name).collect()
    }

    /// Resolve a display name (or model key) to a client configuration
    pub fn resolve(&self, name: &str) -> Result<ModelClientConfig> {
        let name = name.trim();
        AVAILABLE_MODELS
            .iter()
            .find(|m| m.display_name == name || m.key == name)
            .map(|entry| ModelClientConfig::from_entry(entry, &self.keys))
            .ok_or_else(|| {
                debug!("Rejected unknown model name: {}", name);
                VoyageError::unknown_model(name)
            })
    }

    pub fn default_model(&self) -> ModelClientConfig {
        ModelClientConfig::from_entry(&AVAILABLE_MODELS[0], &self.keys)
    }

    /// Whether a provider key is configured for the named model
    pub fn is_available(&self, name: &str) -> bool {
        self.resolve(name).map(|m| m.has_api_key()).unwrap_or(false)
    }
}

/// The process-wide current model, last writer wins.
///
/// Turns read it once at their start and carry the result explicitly, so a
/// change only affects turns that begin afterwards.
#[derive(Debug)]
pub struct ModelSelection {
    provider: ModelProvider,
    current: RwLock<ModelClientConfig>,
}

impl ModelSelection {
    /// Start with `initial` if given, otherwise the catalog default
    pub fn new(provider: ModelProvider, initial: Option<&str>) -> Result<Self> {
        let current = match initial {
            Some(name) => provider.resolve(name)?,
            None => provider.default_model(),
        };
        info!("Initial model: {} ({})", current.display_name, current.model_id);
        Ok(Self {
            provider,
            current: RwLock::new(current),
        })
    }

    pub fn provider(&self) -> &ModelProvider {
        &self.provider
    }

    pub async fn current(&self) -> ModelClientConfig {
        self.current.read().await.clone()
    }

    /// Switch the current model. An unknown name leaves it unchanged.
    pub async fn select(&self, name: &str) -> Result<ModelClientConfig> {
        let resolved = self.provider.resolve(name)?;
        let mut current = self.current.write().await;
        info!("Model changed: {} -> {}", current.display_name, resolved.display_name);
        *current = resolved.clone();
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> ApiKeys {
        ApiKeys {
            openai: Some("sk-test".to_string()),
            gemini: None,
            serper: None,
        }
    }

    #[test]
    fn test_list_display_names_in_order() {
        let provider = ModelProvider::default();
        assert_eq!(
            provider.list_display_names(),
            vec!["OpenAI GPT-4o Mini", "Google Gemini 2.0 Flash (Free)"]
        );
    }

    #[test]
    fn test_default_is_first_entry() {
        let provider = ModelProvider::default();
        assert_eq!(provider.default_model().key, AVAILABLE_MODELS[0].key);
    }

    #[test]
    fn test_resolve_by_display_name_and_key() {
        let provider = ModelProvider::new(keys());
        let by_name = provider.resolve("Google Gemini 2.0 Flash (Free)").unwrap();
        let by_key = provider.resolve("gemini-2.0-flash").unwrap();
        assert_eq!(by_name, by_key);
        assert_eq!(by_name.provider, "gemini");
        assert!(!by_name.has_api_key());

        let openai = provider.resolve("OpenAI GPT-4o Mini").unwrap();
        assert_eq!(openai.api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn test_resolve_unknown_model() {
        let provider = ModelProvider::default();
        let err = provider.resolve("not-a-model").unwrap_err();
        assert!(matches!(err, VoyageError::UnknownModel { ref name } if name == "not-a-model"));
    }

    #[test]
    fn test_availability_follows_keys() {
        let provider = ModelProvider::new(keys());
        assert!(provider.is_available("gpt-4o-mini"));
        assert!(!provider.is_available("gemini-2.0-flash"));
        assert!(!provider.is_available("not-a-model"));
    }

    #[test]
    fn test_debug_hides_api_key() {
        let provider = ModelProvider::new(keys());
        let rendered = format!("{:?}", provider.default_model());
        assert!(!rendered.contains("sk-test"));
    }

    #[tokio::test]
    async fn test_select_unknown_keeps_current() {
        let selection = ModelSelection::new(ModelProvider::default(), None).unwrap();
        let before = selection.current().await;

        let result = selection.select("not-a-model").await;
        assert!(matches!(result, Err(VoyageError::UnknownModel { .. })));
        assert_eq!(selection.current().await, before);
    }

    #[tokio::test]
    async fn test_select_switches_model() {
        let selection = ModelSelection::new(ModelProvider::default(), None).unwrap();
        selection.select("Google Gemini 2.0 Flash (Free)").await.unwrap();
        assert_eq!(selection.current().await.key, "gemini-2.0-flash");
    }

    #[test]
    fn test_initial_model_must_exist() {
        assert!(ModelSelection::new(ModelProvider::default(), Some("nope")).is_err());
        let selection = ModelSelection::new(ModelProvider::default(), Some("gemini-2.0-flash"));
        assert!(selection.is_ok());
    }
}
