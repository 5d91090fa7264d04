//! Server-driven component construction.
//!
//! The server describes components by type name and a JSON config. A
//! [`ComponentRegistry`] maps type names to factories building the matching
//! widget. Registries are plain values: create one per session (or share one
//! behind an `Arc`) and fill it with [`register_builtin_components`] plus any
//! host-specific factories.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use horizon_ux::prelude::*;
//! use horizon_ux::registry::{QuerySourceProvider, UiComboBox, UiContext};
//! use serde_json::{Value, json};
//!
//! struct Fruits;
//!
//! impl QuerySourceProvider for Fruits {
//!     fn query_source(&self, _component_id: &str) -> Option<SharedQuerySource<Value>> {
//!         let entries = vec![json!({"displayValue": "Apple"}), json!({"displayValue": "Banana"})];
//!         Some(Arc::new(StaticQuerySource::new(entries, |v: &Value| {
//!             v["displayValue"].as_str().unwrap_or_default().to_string()
//!         })))
//!     }
//! }
//!
//! let registry = ComponentRegistry::new();
//! register_builtin_components(&registry);
//!
//! let context = UiContext::new(Arc::new(DetachedPositioning), Arc::new(Fruits));
//! let component = registry
//!     .create("UiComboBox", json!({"id": "fruit", "placeholderText": "Fruit"}), &context)
//!     .unwrap();
//! assert_eq!(component.id(), "fruit");
//! assert!(component.as_any().downcast_ref::<UiComboBox>().is_some());
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use horizon_ux_core::logging::targets;
use parking_lot::RwLock;
use serde::Deserialize;
use serde_json::Value;

use crate::combo_box::ComboBox;
use crate::config::{ComboBoxConfig, ComboBoxOptions};
use crate::dropdown::ListDropDown;
use crate::error::{Error, Result};
use crate::positioning::PositioningService;
use crate::query::SharedQuerySource;

/// A widget built by a [`ComponentRegistry`].
pub trait Component: Send {
    /// The registered type name.
    fn component_type(&self) -> &'static str;

    /// The server-assigned id.
    fn id(&self) -> &str;

    /// Release the component's resources.
    fn destroy(&mut self);

    /// Downcast support.
    fn as_any(&self) -> &dyn Any;

    /// Mutable downcast support.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Supplies query sources for server-driven components, keyed by component
/// id. Usually backed by the session transport.
pub trait QuerySourceProvider: Send + Sync {
    /// The query source for `component_id`, if the host has one.
    fn query_source(&self, component_id: &str) -> Option<SharedQuerySource<Value>>;
}

/// Services handed to component factories.
#[derive(Clone)]
pub struct UiContext {
    /// Positioning for floating panels.
    pub positioning: Arc<dyn PositioningService>,
    /// Query sources for query-driven components.
    pub query_sources: Arc<dyn QuerySourceProvider>,
}

impl UiContext {
    /// Create a context.
    pub fn new(
        positioning: Arc<dyn PositioningService>,
        query_sources: Arc<dyn QuerySourceProvider>,
    ) -> Self {
        Self {
            positioning,
            query_sources,
        }
    }
}

impl fmt::Debug for UiContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UiContext").finish_non_exhaustive()
    }
}

/// Builds a component from its JSON config.
pub type ComponentFactory =
    Arc<dyn Fn(Value, &UiContext) -> Result<Box<dyn Component>> + Send + Sync>;

// ============================================================================
// Registry
// ============================================================================

/// Maps component type names to factories.
#[derive(Default)]
pub struct ComponentRegistry {
    factories: RwLock<HashMap<String, ComponentFactory>>,
}

impl ComponentRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `factory` under `name`, returning the factory it replaced.
    pub fn register<F>(&self, name: impl Into<String>, factory: F) -> Option<ComponentFactory>
    where
        F: Fn(Value, &UiContext) -> Result<Box<dyn Component>> + Send + Sync + 'static,
    {
        let name = name.into();
        tracing::debug!(target: targets::REGISTRY, component = %name, "component registered");
        self.factories.write().insert(name, Arc::new(factory))
    }

    /// Remove the factory registered under `name`.
    pub fn unregister(&self, name: &str) -> Option<ComponentFactory> {
        self.factories.write().remove(name)
    }

    /// Whether a factory is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.read().contains_key(name)
    }

    /// Registered type names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Build a component of type `name` from `config`.
    pub fn create(&self, name: &str, config: Value, context: &UiContext) -> Result<Box<dyn Component>> {
        // Release the lock before running the factory; factories may use the
        // registry themselves.
        let factory = self
            .factories
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| Error::unknown_component(name))?;
        tracing::trace!(target: targets::REGISTRY, component = name, "creating component");
        factory(config, context)
    }
}

impl fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("components", &self.names())
            .finish()
    }
}

/// Register the components shipped with this crate.
pub fn register_builtin_components(registry: &ComponentRegistry) {
    registry.register(UiComboBox::TYPE_NAME, |config, context| {
        UiComboBox::from_config(config, context).map(|combo| Box::new(combo) as Box<dyn Component>)
    });
}

// ============================================================================
// UiComboBox
// ============================================================================

fn default_display_field() -> String {
    "displayValue".to_string()
}

/// JSON config of a [`UiComboBox`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiComboBoxConfig {
    /// Server-assigned id.
    pub id: String,
    /// Entry field holding the editor text.
    #[serde(default = "default_display_field")]
    pub display_field: String,
    /// Commit typed text as free-text entries.
    #[serde(default)]
    pub allow_free_text: bool,
    /// Initially selected entry.
    #[serde(default)]
    pub value: Option<Value>,
    /// Widget options.
    #[serde(flatten)]
    pub options: ComboBoxOptions,
}

/// A combo box over JSON entries, built from server config.
pub struct UiComboBox {
    id: String,
    combo_box: ComboBox<Value>,
}

impl UiComboBox {
    /// Registered type name.
    pub const TYPE_NAME: &'static str = "UiComboBox";

    /// Build from a JSON config.
    pub fn from_config(config: Value, context: &UiContext) -> Result<Self> {
        let config: UiComboBoxConfig = serde_json::from_value(config)
            .map_err(|source| Error::invalid_config(Self::TYPE_NAME, source))?;
        let source = context
            .query_sources
            .query_source(&config.id)
            .ok_or_else(|| Error::MissingQuerySource {
                id: config.id.clone(),
            })?;

        let display_field = config.display_field.clone();
        let mut combo_config = ComboBoxConfig::new(move |entry: &Value| display_text(entry, &display_field))
            .with_options(config.options);
        if config.allow_free_text {
            combo_config = combo_config.with_free_text_entries();
        }

        let drop_down = ListDropDown::from_config(source, &combo_config);
        let mut combo_box = ComboBox::new(
            combo_config,
            Box::new(drop_down),
            Arc::clone(&context.positioning),
        );
        if config.value.is_some() {
            combo_box.set_value(config.value, false, None);
        }
        tracing::debug!(target: targets::REGISTRY, id = %config.id, "UiComboBox created");

        Ok(Self {
            id: config.id,
            combo_box,
        })
    }

    /// The wrapped combo box.
    pub fn combo_box(&self) -> &ComboBox<Value> {
        &self.combo_box
    }

    /// The wrapped combo box, mutably.
    pub fn combo_box_mut(&mut self) -> &mut ComboBox<Value> {
        &mut self.combo_box
    }
}

/// Editor text of a JSON entry: the display field if it is a string, the
/// entry itself if it is a string, its JSON text otherwise.
fn display_text(entry: &Value, display_field: &str) -> String {
    match entry.get(display_field) {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Null) | None => match entry {
            Value::String(text) => text.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        },
        Some(other) => other.to_string(),
    }
}

impl Component for UiComboBox {
    fn component_type(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn destroy(&mut self) {
        self.combo_box.destroy();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl fmt::Debug for UiComboBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UiComboBox")
            .field("id", &self.id)
            .field("combo_box", &self.combo_box)
            .finish()
    }
}

static_assertions::assert_impl_all!(ComponentRegistry: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::positioning::DetachedPositioning;
    use crate::query::StaticQuerySource;
    use serde_json::json;

    struct NoSources;

    impl QuerySourceProvider for NoSources {
        fn query_source(&self, _component_id: &str) -> Option<SharedQuerySource<Value>> {
            None
        }
    }

    struct EmptySources;

    impl QuerySourceProvider for EmptySources {
        fn query_source(&self, _component_id: &str) -> Option<SharedQuerySource<Value>> {
            Some(Arc::new(StaticQuerySource::new(Vec::new(), |v: &Value| v.to_string())))
        }
    }

    fn context(provider: Arc<dyn QuerySourceProvider>) -> UiContext {
        UiContext::new(Arc::new(DetachedPositioning), provider)
    }

    #[test]
    fn test_unknown_component() {
        let registry = ComponentRegistry::new();
        let result = registry.create("UiNothing", json!({}), &context(Arc::new(EmptySources)));
        assert!(matches!(result, Err(Error::UnknownComponent { name }) if name == "UiNothing"));
    }

    #[test]
    fn test_register_replace_unregister() {
        let registry = ComponentRegistry::new();
        register_builtin_components(&registry);
        assert!(registry.contains("UiComboBox"));
        assert_eq!(registry.names(), vec!["UiComboBox".to_string()]);

        let replaced = registry.register("UiComboBox", |config, context| {
            UiComboBox::from_config(config, context).map(|c| Box::new(c) as Box<dyn Component>)
        });
        assert!(replaced.is_some());
        assert!(registry.unregister("UiComboBox").is_some());
        assert!(!registry.contains("UiComboBox"));
    }

    #[test]
    fn test_invalid_config() {
        let registry = ComponentRegistry::new();
        register_builtin_components(&registry);
        let result = registry.create(
            "UiComboBox",
            json!({"id": "x", "autoComplete": "yes"}),
            &context(Arc::new(EmptySources)),
        );
        assert!(matches!(result, Err(Error::InvalidConfig { .. })));
    }

    #[test]
    fn test_missing_query_source() {
        let registry = ComponentRegistry::new();
        register_builtin_components(&registry);
        let result = registry.create("UiComboBox", json!({"id": "x"}), &context(Arc::new(NoSources)));
        assert!(matches!(result, Err(Error::MissingQuerySource { id }) if id == "x"));
    }

    #[test]
    fn test_combo_box_from_config() {
        let combo = UiComboBox::from_config(
            json!({
                "id": "city",
                "value": {"displayValue": "Berlin"},
                "showClearButton": true,
                "editingMode": "readonly",
            }),
            &context(Arc::new(EmptySources)),
        )
        .unwrap();

        assert_eq!(combo.id(), "city");
        assert_eq!(combo.component_type(), "UiComboBox");
        let inner = combo.combo_box();
        assert_eq!(inner.editor_text(), "Berlin");
        assert!(inner.is_clear_button_visible());
        assert_eq!(inner.editing_mode(), crate::config::EditingMode::Readonly);
    }

    #[test]
    fn test_display_text() {
        assert_eq!(display_text(&json!({"displayValue": "A"}), "displayValue"), "A");
        assert_eq!(display_text(&json!({"name": "B"}), "name"), "B");
        assert_eq!(display_text(&json!("plain"), "displayValue"), "plain");
        assert_eq!(display_text(&json!({"displayValue": 7}), "displayValue"), "7");
        assert_eq!(display_text(&Value::Null, "displayValue"), "");
    }
}
