//! Combo-box configuration.
//!
//! Configuration is split in two:
//!
//! - [`ComboBoxOptions`]: plain data, deserializable from the JSON the server
//!   sends (camelCase keys, every field optional).
//! - [`ComboBoxConfig`]: the options plus the host-supplied functions that
//!   project, parse, render and compare entries.
//!
//! Defaults are applied once when the config is built; afterwards options
//! only change through the combo box's setters.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::markup::escape_html;

/// Default markup shown in the dropdown while a query is running.
pub const DEFAULT_SPINNER_TEMPLATE: &str = r#"<div class="tr-default-spinner"><div class="spinner"></div><div>Fetching data...</div></div>"#;

// ============================================================================
// Editing Mode
// ============================================================================

/// How the user may interact with a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EditingMode {
    /// Fully editable.
    #[default]
    Editable,
    /// Editable only while the field holds focus.
    EditableIfFocused,
    /// Greyed out, no interaction.
    Disabled,
    /// Value visible, no changes.
    Readonly,
}

impl EditingMode {
    /// Whether the field accepts edits given its focus state.
    pub fn is_editable(self, focused: bool) -> bool {
        match self {
            EditingMode::Editable => true,
            EditingMode::EditableIfFocused => focused,
            EditingMode::Disabled | EditingMode::Readonly => false,
        }
    }

    /// The CSS class reflecting this mode.
    pub fn css_class(self) -> &'static str {
        match self {
            EditingMode::Editable => "editable",
            EditingMode::EditableIfFocused => "editable-if-focused",
            EditingMode::Disabled => "disabled",
            EditingMode::Readonly => "readonly",
        }
    }
}

// ============================================================================
// Options
// ============================================================================

/// Data-only combo-box options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ComboBoxOptions {
    /// Match highlighting is skipped when a query returns more entries than
    /// this. 0 disables it.
    pub text_highlighting_entry_limit: usize,
    /// Complete the editor text from the highlighted entry.
    pub auto_complete: bool,
    /// Delay before autocompletion, in milliseconds.
    pub auto_complete_delay: u64,
    /// Show the clear button while an entry is selected.
    pub show_clear_button: bool,
    /// Show the dropdown trigger.
    pub show_trigger: bool,
    /// Initial editing mode.
    pub editing_mode: EditingMode,
    /// Open the dropdown only once a query returned entries.
    pub show_drop_down_on_results_only: bool,
    /// Markup shown while a query is running.
    pub spinner_template: String,
    /// Highlight the first result of a text query.
    pub preselect_first_query_result: bool,
    /// Text shown when nothing is selected.
    pub placeholder_text: String,
}

impl Default for ComboBoxOptions {
    fn default() -> Self {
        Self {
            text_highlighting_entry_limit: 100,
            auto_complete: true,
            auto_complete_delay: 0,
            show_clear_button: false,
            show_trigger: true,
            editing_mode: EditingMode::Editable,
            show_drop_down_on_results_only: false,
            spinner_template: DEFAULT_SPINNER_TEMPLATE.to_string(),
            preselect_first_query_result: true,
            placeholder_text: String::new(),
        }
    }
}

impl ComboBoxOptions {
    /// The autocomplete delay as a [`Duration`].
    pub fn auto_complete_delay(&self) -> Duration {
        Duration::from_millis(self.auto_complete_delay)
    }

    /// Set the highlighting limit using builder pattern.
    pub fn with_text_highlighting_entry_limit(mut self, limit: usize) -> Self {
        self.text_highlighting_entry_limit = limit;
        self
    }

    /// Enable or disable autocompletion using builder pattern.
    pub fn with_auto_complete(mut self, auto_complete: bool) -> Self {
        self.auto_complete = auto_complete;
        self
    }

    /// Set the autocomplete delay using builder pattern.
    pub fn with_auto_complete_delay(mut self, delay: Duration) -> Self {
        self.auto_complete_delay = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Show the clear button using builder pattern.
    pub fn with_show_clear_button(mut self, show: bool) -> Self {
        self.show_clear_button = show;
        self
    }

    /// Show the trigger using builder pattern.
    pub fn with_show_trigger(mut self, show: bool) -> Self {
        self.show_trigger = show;
        self
    }

    /// Set the editing mode using builder pattern.
    pub fn with_editing_mode(mut self, mode: EditingMode) -> Self {
        self.editing_mode = mode;
        self
    }

    /// Open the dropdown on results only using builder pattern.
    pub fn with_show_drop_down_on_results_only(mut self, results_only: bool) -> Self {
        self.show_drop_down_on_results_only = results_only;
        self
    }

    /// Set the spinner markup using builder pattern.
    pub fn with_spinner_template(mut self, template: impl Into<String>) -> Self {
        self.spinner_template = template.into();
        self
    }

    /// Preselect the first query result using builder pattern.
    pub fn with_preselect_first_query_result(mut self, preselect: bool) -> Self {
        self.preselect_first_query_result = preselect;
        self
    }

    /// Set the placeholder using builder pattern.
    pub fn with_placeholder_text(mut self, text: impl Into<String>) -> Self {
        self.placeholder_text = text.into();
        self
    }
}

// ============================================================================
// Host Functions
// ============================================================================

/// Projects an entry to the text shown in the editor.
pub type TextProjection<E> = Arc<dyn Fn(&E) -> String + Send + Sync>;

/// Derives an entry from free text typed by the user.
pub type TextParser<E> = Arc<dyn Fn(&str) -> Option<E> + Send + Sync>;

/// Renders the selected entry (or its absence) to markup. `None` means
/// "nothing to show" and makes the widget fall back to its placeholder.
pub type SelectedEntryRendering<E> = Arc<dyn Fn(Option<&E>) -> Option<String> + Send + Sync>;

/// Renders a dropdown entry to markup.
pub type EntryRendering<E> = Arc<dyn Fn(&E) -> String + Send + Sync>;

/// Compares two entries for identity.
pub type EntryEquality<E> = Arc<dyn Fn(&E, &E) -> bool + Send + Sync>;

/// Entry types that can stand for text the user typed without picking a
/// candidate.
pub trait FreeTextEntry: Sized {
    /// Build an entry from free text. `text` is never empty.
    fn from_free_text(text: &str) -> Option<Self>;
}

impl FreeTextEntry for String {
    fn from_free_text(text: &str) -> Option<Self> {
        Some(text.to_string())
    }
}

impl FreeTextEntry for serde_json::Value {
    fn from_free_text(text: &str) -> Option<Self> {
        Some(serde_json::json!({
            "displayValue": text,
            "_isFreeTextEntry": true,
        }))
    }
}

/// Full combo-box configuration.
pub struct ComboBoxConfig<E> {
    /// Data-only options.
    pub options: ComboBoxOptions,
    entry_to_editor_text: TextProjection<E>,
    text_to_entry: TextParser<E>,
    selected_entry_rendering: Option<SelectedEntryRendering<E>>,
    entry_equality: Option<EntryEquality<E>>,
}

impl<E> Clone for ComboBoxConfig<E> {
    fn clone(&self) -> Self {
        Self {
            options: self.options.clone(),
            entry_to_editor_text: Arc::clone(&self.entry_to_editor_text),
            text_to_entry: Arc::clone(&self.text_to_entry),
            selected_entry_rendering: self.selected_entry_rendering.clone(),
            entry_equality: self.entry_equality.clone(),
        }
    }
}

impl<E> fmt::Debug for ComboBoxConfig<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComboBoxConfig")
            .field("options", &self.options)
            .field("custom_rendering", &self.selected_entry_rendering.is_some())
            .field("custom_equality", &self.entry_equality.is_some())
            .finish_non_exhaustive()
    }
}

impl<E: PartialEq + 'static> ComboBoxConfig<E> {
    /// Create a config from the editor text projection. Everything else
    /// starts at its default.
    pub fn new<F>(entry_to_editor_text: F) -> Self
    where
        F: Fn(&E) -> String + Send + Sync + 'static,
    {
        Self {
            options: ComboBoxOptions::default(),
            entry_to_editor_text: Arc::new(entry_to_editor_text),
            text_to_entry: Arc::new(|_: &str| None),
            selected_entry_rendering: None,
            entry_equality: None,
        }
    }

    /// Replace the options using builder pattern.
    pub fn with_options(mut self, options: ComboBoxOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the free-text parser using builder pattern.
    pub fn with_text_to_entry<F>(mut self, parser: F) -> Self
    where
        F: Fn(&str) -> Option<E> + Send + Sync + 'static,
    {
        self.text_to_entry = Arc::new(parser);
        self
    }

    /// Set the selected-entry renderer using builder pattern.
    pub fn with_selected_entry_rendering<F>(mut self, rendering: F) -> Self
    where
        F: Fn(Option<&E>) -> Option<String> + Send + Sync + 'static,
    {
        self.selected_entry_rendering = Some(Arc::new(rendering));
        self
    }

    /// Set the identity predicate using builder pattern.
    pub fn with_equality<F>(mut self, equality: F) -> Self
    where
        F: Fn(&E, &E) -> bool + Send + Sync + 'static,
    {
        self.entry_equality = Some(Arc::new(equality));
        self
    }

    /// Project an entry to editor text.
    pub fn entry_to_editor_text(&self, entry: &E) -> String {
        (self.entry_to_editor_text)(entry)
    }

    /// The projection as a shareable function.
    pub fn text_projection(&self) -> TextProjection<E> {
        Arc::clone(&self.entry_to_editor_text)
    }

    /// The custom identity predicate, if one was set.
    pub fn entry_equality(&self) -> Option<EntryEquality<E>> {
        self.entry_equality.clone()
    }

    /// Parse free text. Empty text never yields an entry.
    pub fn text_to_entry(&self, text: &str) -> Option<E> {
        if text.is_empty() {
            return None;
        }
        (self.text_to_entry)(text)
    }

    /// Render the selected entry. `None` requests the placeholder.
    pub fn render_selected_entry(&self, entry: Option<&E>) -> Option<String> {
        let markup = match &self.selected_entry_rendering {
            Some(rendering) => rendering(entry),
            None => entry.map(|entry| {
                format!(
                    r#"<div class="tr-combobox-entry">{}</div>"#,
                    escape_html(&self.entry_to_editor_text(entry))
                )
            }),
        };
        markup.filter(|markup| !markup.trim().is_empty())
    }

    /// Compare two optional entries with the identity predicate.
    pub fn entries_equal(&self, a: Option<&E>, b: Option<&E>) -> bool {
        match (a, b) {
            (None, None) => true,
            (Some(a), Some(b)) => match &self.entry_equality {
                Some(equality) => equality(a, b),
                None => a == b,
            },
            _ => false,
        }
    }
}

impl<E: FreeTextEntry + PartialEq + 'static> ComboBoxConfig<E> {
    /// Turn typed text into entries via [`FreeTextEntry`] using builder pattern.
    pub fn with_free_text_entries(self) -> Self {
        self.with_text_to_entry(E::from_free_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_options_defaults() {
        let options = ComboBoxOptions::default();
        assert_eq!(options.text_highlighting_entry_limit, 100);
        assert!(options.auto_complete);
        assert_eq!(options.auto_complete_delay(), Duration::ZERO);
        assert!(!options.show_clear_button);
        assert!(options.show_trigger);
        assert_eq!(options.editing_mode, EditingMode::Editable);
        assert!(!options.show_drop_down_on_results_only);
        assert_eq!(options.spinner_template, DEFAULT_SPINNER_TEMPLATE);
        assert!(options.preselect_first_query_result);
        assert_eq!(options.placeholder_text, "");
    }

    #[test]
    fn test_options_deserialize_partial_camel_case() {
        let options: ComboBoxOptions = serde_json::from_value(json!({
            "autoCompleteDelay": 250,
            "showClearButton": true,
            "editingMode": "editableIfFocused",
            "placeholderText": "Choose...",
        }))
        .unwrap();

        assert_eq!(options.auto_complete_delay(), Duration::from_millis(250));
        assert!(options.show_clear_button);
        assert_eq!(options.editing_mode, EditingMode::EditableIfFocused);
        assert_eq!(options.placeholder_text, "Choose...");
        assert!(options.show_trigger);
    }

    #[test]
    fn test_editing_mode() {
        assert!(EditingMode::Editable.is_editable(false));
        assert!(!EditingMode::EditableIfFocused.is_editable(false));
        assert!(EditingMode::EditableIfFocused.is_editable(true));
        assert!(!EditingMode::Readonly.is_editable(true));
        assert!(!EditingMode::Disabled.is_editable(true));
        assert_eq!(EditingMode::Readonly.css_class(), "readonly");
    }

    #[test]
    fn test_text_to_entry_defaults() {
        let config = ComboBoxConfig::<String>::new(|s| s.clone());
        assert_eq!(config.text_to_entry("abc"), None);

        let config = config.with_free_text_entries();
        assert_eq!(config.text_to_entry("abc"), Some("abc".to_string()));
        assert_eq!(config.text_to_entry(""), None);
    }

    #[test]
    fn test_json_free_text_marker() {
        let entry = serde_json::Value::from_free_text("Kiwi").unwrap();
        assert_eq!(entry, json!({"displayValue": "Kiwi", "_isFreeTextEntry": true}));
    }

    #[test]
    fn test_selected_entry_rendering() {
        let config = ComboBoxConfig::<String>::new(|s| s.clone());
        assert_eq!(
            config.render_selected_entry(Some(&"a&b".to_string())).as_deref(),
            Some(r#"<div class="tr-combobox-entry">a&amp;b</div>"#)
        );
        assert_eq!(config.render_selected_entry(None), None);

        let config = config.with_selected_entry_rendering(|_| Some("   ".to_string()));
        assert_eq!(config.render_selected_entry(Some(&"x".to_string())), None);
    }

    #[test]
    fn test_custom_equality() {
        let config = ComboBoxConfig::<String>::new(|s| s.clone())
            .with_equality(|a, b| a.eq_ignore_ascii_case(b));
        let a = "Apple".to_string();
        let b = "APPLE".to_string();
        assert!(config.entries_equal(Some(&a), Some(&b)));
        assert!(!config.entries_equal(Some(&a), None));
        assert!(config.entries_equal(None, None));
    }
}
