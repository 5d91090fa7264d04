//! Dropdown panels: the transient candidate list under a combo box.
//!
//! [`DropDownComponent`] is the contract the combo box drives. It owns the
//! visible candidates and the highlight, and reports highlight changes and
//! final picks through [`DropDownComponent::value_changed`].
//!
//! [`ListDropDown`] is the stock implementation: a flat list fed by a
//! [`QuerySource`](crate::query::QuerySource).

use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use horizon_ux_core::Signal;
use horizon_ux_core::logging::targets;

use crate::config::{
    ComboBoxConfig, DEFAULT_SPINNER_TEMPLATE, EntryEquality, EntryRendering, TextProjection,
};
use crate::events::{Key, KeyPressEvent};
use crate::markup;
use crate::query::{QueryFuture, QueryResult, SelectionDirection, SharedQuerySource};

/// Payload of [`DropDownComponent::value_changed`].
#[derive(Debug, Clone, PartialEq)]
pub struct DropDownValueChange<E> {
    /// The newly highlighted or picked entry.
    pub value: Option<E>,
    /// `true` when the user picked the entry (click), `false` for mere
    /// highlight movement.
    pub final_selection: bool,
}

/// A panel listing query candidates.
pub trait DropDownComponent<E>: Send {
    /// Start a lookup for `text`. The panel may show a loading state until
    /// [`apply_query_result`](Self::apply_query_result) is called.
    fn handle_query(&mut self, text: &str) -> QueryFuture<E>;

    /// Install the result of a lookup for `text` and highlight according to
    /// `direction`. A failed result counts as empty. Returns whether any
    /// entries are shown.
    fn apply_query_result(
        &mut self,
        text: &str,
        direction: SelectionDirection,
        result: QueryResult<E>,
    ) -> bool;

    /// Handle a navigation key. Returns whether the key was consumed.
    fn handle_keyboard_input(&mut self, event: &KeyPressEvent) -> bool;

    /// The highlighted entry.
    fn value(&self) -> Option<E>;

    /// Highlight `value` (or nothing).
    fn set_value(&mut self, value: Option<E>);

    /// Pick the entry at `index` as a final selection. Returns whether an
    /// entry exists there.
    fn select_entry_at(&mut self, index: usize) -> bool;

    /// Emitted when the highlight moves or the user picks an entry.
    fn value_changed(&self) -> &Signal<DropDownValueChange<E>>;

    /// Current panel markup.
    fn markup(&self) -> String;
}

// ============================================================================
// List Dropdown
// ============================================================================

/// Default number of rows moved by PageUp/PageDown.
const DEFAULT_PAGE_SIZE: usize = 10;

/// A flat list of candidates.
pub struct ListDropDown<E> {
    source: SharedQuerySource<E>,
    projection: TextProjection<E>,
    entry_rendering: Option<EntryRendering<E>>,
    equality: Option<EntryEquality<E>>,
    entries: Vec<E>,
    highlighted: Option<usize>,
    value: Option<E>,
    last_query: String,
    loading: bool,
    text_highlighting_entry_limit: usize,
    spinner_template: String,
    page_size: usize,
    value_changed: Signal<DropDownValueChange<E>>,
}

impl<E> ListDropDown<E>
where
    E: Clone + PartialEq + Send + Sync + 'static,
{
    /// Create a list fed by `source`; entries are matched and rendered on
    /// `projection(entry)`.
    pub fn new<F>(source: SharedQuerySource<E>, projection: F) -> Self
    where
        F: Fn(&E) -> String + Send + Sync + 'static,
    {
        Self::with_projection(source, Arc::new(projection))
    }

    /// Create a list sharing the combo box's projection, identity predicate,
    /// highlighting limit and spinner.
    pub fn from_config(source: SharedQuerySource<E>, config: &ComboBoxConfig<E>) -> Self {
        let mut list = Self::with_projection(source, config.text_projection());
        list.equality = config.entry_equality();
        list.with_text_highlighting_entry_limit(config.options.text_highlighting_entry_limit)
            .with_spinner_template(config.options.spinner_template.clone())
    }

    fn with_projection(source: SharedQuerySource<E>, projection: TextProjection<E>) -> Self {
        Self {
            source,
            projection,
            entry_rendering: None,
            equality: None,
            entries: Vec::new(),
            highlighted: None,
            value: None,
            last_query: String::new(),
            loading: false,
            text_highlighting_entry_limit: 100,
            spinner_template: DEFAULT_SPINNER_TEMPLATE.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            value_changed: Signal::new(),
        }
    }

    /// Render entries with a custom function using builder pattern.
    ///
    /// Custom renderings get no automatic match highlighting; use
    /// [`match_ranges`](Self::match_ranges) to add it.
    pub fn with_entry_rendering<F>(mut self, rendering: F) -> Self
    where
        F: Fn(&E) -> String + Send + Sync + 'static,
    {
        self.entry_rendering = Some(Arc::new(rendering));
        self
    }

    /// Match entries against the panel value with `equality` instead of
    /// `PartialEq`, using builder pattern.
    pub fn with_equality<F>(mut self, equality: F) -> Self
    where
        F: Fn(&E, &E) -> bool + Send + Sync + 'static,
    {
        self.equality = Some(Arc::new(equality));
        self
    }

    /// Set the highlighting limit using builder pattern.
    pub fn with_text_highlighting_entry_limit(mut self, limit: usize) -> Self {
        self.text_highlighting_entry_limit = limit;
        self
    }

    /// Set the spinner markup using builder pattern.
    pub fn with_spinner_template(mut self, template: impl Into<String>) -> Self {
        self.spinner_template = template.into();
        self
    }

    /// Set the PageUp/PageDown step using builder pattern.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// The listed entries.
    pub fn entries(&self) -> &[E] {
        &self.entries
    }

    /// Index of the highlighted entry.
    pub fn highlighted_index(&self) -> Option<usize> {
        self.highlighted
    }

    /// Whether a query is running.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Whether the current result list is small enough for match
    /// highlighting.
    pub fn is_highlighting_text(&self) -> bool {
        self.text_highlighting_entry_limit > 0
            && self.entries.len() <= self.text_highlighting_entry_limit
    }

    /// Char ranges of the last query inside the entry at `index`. Empty when
    /// the result list exceeds the highlighting limit.
    pub fn match_ranges(&self, index: usize) -> Vec<Range<usize>> {
        if !self.is_highlighting_text() {
            return Vec::new();
        }
        match self.entries.get(index) {
            Some(entry) => markup::match_ranges(&(self.projection)(entry), &self.last_query),
            None => Vec::new(),
        }
    }

    fn render_entry(&self, index: usize, entry: &E) -> String {
        match &self.entry_rendering {
            Some(rendering) => rendering(entry),
            None => markup::highlight(&(self.projection)(entry), &self.match_ranges(index)),
        }
    }

    fn same_entry(&self, a: &E, b: &E) -> bool {
        match &self.equality {
            Some(equality) => equality(a, b),
            None => a == b,
        }
    }

    fn highlight(&mut self, index: Option<usize>) {
        self.highlighted = index;
        self.value = index.and_then(|i| self.entries.get(i).cloned());
        self.value_changed.emit(DropDownValueChange {
            value: self.value.clone(),
            final_selection: false,
        });
    }

    fn step(&mut self, delta: isize, wrap: bool) -> bool {
        let len = self.entries.len();
        if len == 0 {
            return false;
        }
        let len = len as isize;
        let target = match self.highlighted {
            None if delta > 0 => 0,
            None => len - 1,
            Some(current) => {
                let next = current as isize + delta;
                if wrap {
                    next.rem_euclid(len)
                } else {
                    next.clamp(0, len - 1)
                }
            }
        };
        self.highlight(Some(target as usize));
        true
    }
}

impl<E> DropDownComponent<E> for ListDropDown<E>
where
    E: Clone + PartialEq + Send + Sync + 'static,
{
    fn handle_query(&mut self, text: &str) -> QueryFuture<E> {
        self.loading = true;
        tracing::trace!(target: targets::DROPDOWN, query = text, "query started");
        self.source.query(text)
    }

    fn apply_query_result(
        &mut self,
        text: &str,
        direction: SelectionDirection,
        result: QueryResult<E>,
    ) -> bool {
        self.loading = false;
        self.last_query = text.to_string();
        self.entries = result.unwrap_or_default();
        self.highlighted = match direction {
            SelectionDirection::Next if !self.entries.is_empty() => Some(0),
            SelectionDirection::Previous if !self.entries.is_empty() => Some(self.entries.len() - 1),
            _ => None,
        };
        self.value = self.highlighted.and_then(|i| self.entries.get(i).cloned());
        tracing::debug!(
            target: targets::DROPDOWN,
            query = text,
            results = self.entries.len(),
            highlighted = ?self.highlighted,
            "query result applied"
        );
        !self.entries.is_empty()
    }

    fn handle_keyboard_input(&mut self, event: &KeyPressEvent) -> bool {
        let page = self.page_size as isize;
        match event.key {
            Key::ArrowDown => self.step(1, true),
            Key::ArrowUp => self.step(-1, true),
            Key::PageDown => self.step(page, false),
            Key::PageUp => self.step(-page, false),
            Key::Home if !self.entries.is_empty() => {
                self.highlight(Some(0));
                true
            }
            Key::End if !self.entries.is_empty() => {
                self.highlight(Some(self.entries.len() - 1));
                true
            }
            _ => false,
        }
    }

    fn value(&self) -> Option<E> {
        self.value.clone()
    }

    fn set_value(&mut self, value: Option<E>) {
        self.highlighted = value
            .as_ref()
            .and_then(|v| self.entries.iter().position(|entry| self.same_entry(entry, v)));
        self.value = value;
    }

    fn select_entry_at(&mut self, index: usize) -> bool {
        let Some(entry) = self.entries.get(index).cloned() else {
            return false;
        };
        self.highlighted = Some(index);
        self.value = Some(entry.clone());
        tracing::debug!(target: targets::DROPDOWN, index, "entry picked");
        self.value_changed.emit(DropDownValueChange {
            value: Some(entry),
            final_selection: true,
        });
        true
    }

    fn value_changed(&self) -> &Signal<DropDownValueChange<E>> {
        &self.value_changed
    }

    fn markup(&self) -> String {
        if self.loading {
            return self.spinner_template.clone();
        }
        if self.entries.is_empty() {
            return r#"<div class="tr-list"></div>"#.to_string();
        }
        let mut out = String::from(r#"<div class="tr-list">"#);
        for (index, entry) in self.entries.iter().enumerate() {
            let class = if self.highlighted == Some(index) {
                "tr-list-entry tr-highlighted-entry"
            } else {
                "tr-list-entry"
            };
            out.push_str(&format!(
                r#"<div class="{class}" data-index="{index}">{}</div>"#,
                self.render_entry(index, entry)
            ));
        }
        out.push_str("</div>");
        out
    }
}

impl<E> fmt::Debug for ListDropDown<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListDropDown")
            .field("entries", &self.entries.len())
            .field("highlighted", &self.highlighted)
            .field("loading", &self.loading)
            .field("last_query", &self.last_query)
            .finish_non_exhaustive()
    }
}

static_assertions::assert_impl_all!(ListDropDown<String>: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QueryError;
    use crate::query::{MatchMode, StaticQuerySource};
    use futures_util::FutureExt;
    use parking_lot::Mutex;

    fn list(entries: &[&str]) -> ListDropDown<String> {
        let entries: Vec<String> = entries.iter().map(|s| s.to_string()).collect();
        let source = StaticQuerySource::new(entries, |s: &String| s.clone())
            .with_match_mode(MatchMode::Contains);
        ListDropDown::new(Arc::new(source), |s: &String| s.clone())
    }

    fn run_query(list: &mut ListDropDown<String>, text: &str, direction: SelectionDirection) -> bool {
        let result = list.handle_query(text).now_or_never().unwrap();
        list.apply_query_result(text, direction, result)
    }

    #[test]
    fn test_direction_controls_initial_highlight() {
        let mut list = list(&["Apple", "Apricot", "Avocado"]);

        assert!(run_query(&mut list, "a", SelectionDirection::Next));
        assert_eq!(list.value().as_deref(), Some("Apple"));

        run_query(&mut list, "a", SelectionDirection::Previous);
        assert_eq!(list.value().as_deref(), Some("Avocado"));

        run_query(&mut list, "a", SelectionDirection::None);
        assert_eq!(list.value(), None);
        assert_eq!(list.highlighted_index(), None);
    }

    #[test]
    fn test_failed_query_counts_as_empty() {
        let mut list = list(&["Apple"]);
        run_query(&mut list, "", SelectionDirection::Next);
        assert!(!list.apply_query_result(
            "x",
            SelectionDirection::Next,
            Err(QueryError::failed("boom"))
        ));
        assert!(list.entries().is_empty());
        assert_eq!(list.value(), None);
    }

    #[test]
    fn test_keyboard_navigation_wraps() {
        let mut list = list(&["item1", "item2", "item3"]);
        run_query(&mut list, "", SelectionDirection::None);

        assert!(list.handle_keyboard_input(&KeyPressEvent::key(Key::ArrowDown)));
        assert_eq!(list.highlighted_index(), Some(0));
        list.handle_keyboard_input(&KeyPressEvent::key(Key::ArrowDown));
        list.handle_keyboard_input(&KeyPressEvent::key(Key::ArrowDown));
        assert_eq!(list.highlighted_index(), Some(2));

        // Wraps to top
        list.handle_keyboard_input(&KeyPressEvent::key(Key::ArrowDown));
        assert_eq!(list.highlighted_index(), Some(0));

        // Wraps to bottom
        list.handle_keyboard_input(&KeyPressEvent::key(Key::ArrowUp));
        assert_eq!(list.highlighted_index(), Some(2));
        assert_eq!(list.value().as_deref(), Some("item3"));

        assert!(!list.handle_keyboard_input(&KeyPressEvent::key(Key::ArrowLeft)));
    }

    #[test]
    fn test_paging_and_home_end() {
        let names: Vec<String> = (0..10).map(|i| format!("item{i}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let mut list = list(&refs).with_page_size(3);
        run_query(&mut list, "", SelectionDirection::Next);

        list.handle_keyboard_input(&KeyPressEvent::key(Key::PageDown));
        assert_eq!(list.highlighted_index(), Some(3));
        list.handle_keyboard_input(&KeyPressEvent::key(Key::End));
        assert_eq!(list.highlighted_index(), Some(9));
        list.handle_keyboard_input(&KeyPressEvent::key(Key::PageDown));
        assert_eq!(list.highlighted_index(), Some(9));
        list.handle_keyboard_input(&KeyPressEvent::key(Key::Home));
        list.handle_keyboard_input(&KeyPressEvent::key(Key::PageUp));
        assert_eq!(list.highlighted_index(), Some(0));
    }

    #[test]
    fn test_navigation_on_empty_list_is_rejected() {
        let mut list = list(&[]);
        assert!(!list.handle_keyboard_input(&KeyPressEvent::key(Key::ArrowDown)));
        assert!(!list.handle_keyboard_input(&KeyPressEvent::key(Key::Home)));
    }

    #[test]
    fn test_value_changed_signals() {
        let mut list = list(&["a", "b"]);
        let changes = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&changes);
        list.value_changed().connect(move |change: &DropDownValueChange<String>| {
            sink.lock().push(change.clone());
        });

        run_query(&mut list, "", SelectionDirection::None);
        list.handle_keyboard_input(&KeyPressEvent::key(Key::ArrowDown));
        assert!(list.select_entry_at(1));
        assert!(!list.select_entry_at(5));

        let changes = changes.lock();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].value.as_deref(), Some("a"));
        assert!(!changes[0].final_selection);
        assert_eq!(changes[1].value.as_deref(), Some("b"));
        assert!(changes[1].final_selection);
    }

    #[test]
    fn test_set_value_highlights_listed_entry() {
        let mut list = list(&["a", "b"]);
        run_query(&mut list, "", SelectionDirection::None);

        list.set_value(Some("b".to_string()));
        assert_eq!(list.highlighted_index(), Some(1));

        list.set_value(Some("zzz".to_string()));
        assert_eq!(list.highlighted_index(), None);
        assert_eq!(list.value().as_deref(), Some("zzz"));
    }

    #[test]
    fn test_markup_spinner_and_highlighting() {
        let mut list = list(&["Apple", "Banana"]).with_spinner_template("<i>loading</i>");
        let pending = list.handle_query("an");
        assert!(list.is_loading());
        assert_eq!(list.markup(), "<i>loading</i>");

        let result = pending.now_or_never().unwrap();
        list.apply_query_result("an", SelectionDirection::Next, result);
        let markup = list.markup();
        assert!(markup.contains(r#"class="tr-list-entry tr-highlighted-entry" data-index="0""#));
        assert!(markup.contains(r#"B<span class="tr-highlighted-text">an</span>"#));
    }

    #[test]
    fn test_set_value_uses_custom_equality() {
        let mut list = list(&["Apple", "Banana"]).with_equality(|a, b| a.eq_ignore_ascii_case(b));
        run_query(&mut list, "", SelectionDirection::None);

        list.set_value(Some("BANANA".to_string()));
        assert_eq!(list.highlighted_index(), Some(1));
    }

    #[test]
    fn test_highlighting_limit() {
        let mut list = list(&["aa", "ab", "ba"]).with_text_highlighting_entry_limit(2);
        run_query(&mut list, "b", SelectionDirection::None);
        assert_eq!(list.entries().len(), 2);
        assert!(list.is_highlighting_text());
        assert_eq!(list.match_ranges(1), vec![0..1]);

        // Too many results to highlight any of them.
        run_query(&mut list, "a", SelectionDirection::None);
        assert_eq!(list.entries().len(), 3);
        assert!(!list.is_highlighting_text());
        assert!(list.match_ranges(0).is_empty());
        assert!(!list.markup().contains("tr-highlighted-text"));

        let mut list = list.with_text_highlighting_entry_limit(0);
        run_query(&mut list, "a", SelectionDirection::None);
        assert!(list.match_ranges(0).is_empty());
        assert!(!list.markup().contains("tr-highlighted-text"));
    }
}
