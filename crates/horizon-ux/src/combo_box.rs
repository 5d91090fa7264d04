//! Editable combo box with asynchronous querying and autocompletion.
//!
//! [`ComboBox`] is a headless interaction engine: it owns the editor text,
//! the selected entry, editor/dropdown visibility and the query pipeline,
//! and the host feeds it input events and time.
//!
//! # Driving the engine
//!
//! - Input: [`handle_key_press`](ComboBox::handle_key_press),
//!   [`handle_mouse_down`](ComboBox::handle_mouse_down),
//!   [`handle_focus_in`](ComboBox::handle_focus_in) and friends.
//! - Time: [`tick`](ComboBox::tick) fires due timers, polls running queries
//!   and processes dropdown notifications. Hosts with an async runtime can
//!   use [`poll_queries`](ComboBox::poll_queries) to be woken when a query
//!   resolves, and [`next_deadline`](ComboBox::next_deadline) to know when
//!   to tick next.
//! - Output: the signals on the struct, plus state getters such as
//!   [`editor_text`](ComboBox::editor_text) and
//!   [`css_classes`](ComboBox::css_classes).
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Instant;
//!
//! use horizon_ux::prelude::*;
//!
//! let fruits: Vec<String> = ["Apple", "Apricot", "Banana"].iter().map(|s| s.to_string()).collect();
//! let config = ComboBoxConfig::new(|s: &String| s.clone());
//! let source = Arc::new(StaticQuerySource::new(fruits, |s: &String| s.clone()));
//! let drop_down = ListDropDown::from_config(source, &config);
//! let mut combo = ComboBox::new(config, Box::new(drop_down), Arc::new(DetachedPositioning));
//!
//! combo.handle_focus_in();
//! combo.handle_key_press(&KeyPressEvent::text("A"));
//! combo.tick(Instant::now());
//!
//! // Autocompleted from the first candidate, completion selected.
//! assert_eq!(combo.editor_text(), "Apple");
//! assert_eq!(combo.editor_selection(), (1, 5));
//!
//! combo.handle_key_press(&KeyPressEvent::key(Key::Enter));
//! assert_eq!(combo.value().map(String::as_str), Some("Apple"));
//! ```

use std::fmt;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender};
use futures_util::future::BoxFuture;
use futures_util::stream::FuturesUnordered;
use futures_util::{FutureExt, StreamExt};
use horizon_ux_core::logging::targets;
use horizon_ux_core::{ConnectionId, PerfSpan, Signal, TimerId, TimerQueue};
use slotmap::SecondaryMap;

use crate::config::{ComboBoxConfig, ComboBoxOptions, EditingMode};
use crate::dropdown::{DropDownComponent, DropDownValueChange};
use crate::editor::EditorState;
use crate::events::{Key, KeyPressEvent};
use crate::markup::placeholder_markup;
use crate::positioning::{
    NodeId, OutsideClick, OutsideClickNotifier, PositioningAdapter, PositioningService,
};
use crate::query::{QueryResult, SelectionDirection};

/// Values a combo box can hold.
pub trait Entry: Clone + PartialEq + Send + Sync + 'static {}

impl<T: Clone + PartialEq + Send + Sync + 'static> Entry for T {}

// ============================================================================
// Public Types
// ============================================================================

/// The sub-elements of a combo box that receive pointer input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComboBoxPart {
    /// The inline text editor.
    Editor,
    /// The dropdown toggle.
    Trigger,
    /// The area rendering the selected entry while the editor is hidden.
    SelectedEntry,
    /// The button clearing the selection.
    ClearButton,
    /// The floating dropdown panel.
    DropDown,
}

/// Visibility state of a combo box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComboBoxState {
    /// The selected entry is rendered; the editor is hidden.
    EditorHidden,
    /// The editor is shown, the dropdown is closed.
    EditorVisibleDropDownClosed,
    /// The editor is shown with the dropdown open below it.
    EditorVisibleDropDownOpen,
}

/// What caused a selection change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputOrigin {
    /// A key press (Enter or Tab).
    Keyboard(Key),
    /// A pointer interaction (clear button, dropdown pick).
    Pointer,
    /// Focus left the widget with free text in the editor.
    Blur,
}

/// Payload of [`ComboBox::selected_entry_changed`].
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedEntryChange<E> {
    /// The new selection.
    pub entry: Option<E>,
    /// What caused the change; `None` for programmatic changes.
    pub origin: Option<InputOrigin>,
}

// ============================================================================
// Internal Types
// ============================================================================

/// How a deferred query picks its highlight direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DirectionRule {
    Fixed(SelectionDirection),
    /// `Next` if first-result preselection is on and the editor has text.
    PreselectIfText,
}

enum ScheduledAction<E> {
    Query {
        direction: DirectionRule,
        suppress_autocomplete: bool,
    },
    AutoComplete(E),
    ResetClickInsideFlag,
}

struct QueryCompletion<E> {
    sequence: u64,
    text: String,
    direction: SelectionDirection,
    suppress_autocomplete: bool,
    result: QueryResult<E>,
}

type DropDownMessage<E> = (u64, DropDownValueChange<E>);

// ============================================================================
// ComboBox
// ============================================================================

/// An editable selection widget with a query-driven dropdown.
///
/// # Signals
///
/// - `selected_entry_changed`: the committed selection changed
/// - `focus`: the widget gained focus
/// - `blur`: the widget lost focus
/// - `before_query`: a query for the given text is about to be issued
/// - `before_drop_down_opens`: the dropdown is about to open
pub struct ComboBox<E: Entry> {
    config: ComboBoxConfig<E>,
    editing_mode: EditingMode,

    editor: EditorState,
    editor_visible: bool,
    drop_down_open: bool,
    selected: Option<E>,
    selected_entry_markup: String,
    showing_placeholder: bool,
    clear_button_visible: bool,

    drop_down: Box<dyn DropDownComponent<E>>,
    drop_down_connection: ConnectionId,
    drop_down_epoch: u64,
    drop_down_tx: Sender<DropDownMessage<E>>,
    drop_down_rx: Receiver<DropDownMessage<E>>,

    positioning: PositioningAdapter,
    parent: Option<NodeId>,
    outside_click_rx: Receiver<OutsideClick>,

    /// Set by a mousedown inside the widget; a blur seen while set was
    /// caused by that click and is cancelled.
    blur_caused_by_click_inside: bool,

    timers: TimerQueue,
    scheduled: SecondaryMap<TimerId, ScheduledAction<E>>,
    pending_query_timer: Option<TimerId>,
    autocomplete_timer: Option<TimerId>,
    click_flag_timer: Option<TimerId>,
    last_tick: Instant,

    queries: FuturesUnordered<BoxFuture<'static, QueryCompletion<E>>>,
    /// Sequence number of the most recently issued query.
    query_sequence: u64,

    destroyed: bool,

    /// Signal emitted when the committed selection changes.
    pub selected_entry_changed: Signal<SelectedEntryChange<E>>,
    /// Signal emitted when the widget gains focus.
    pub focus: Signal<()>,
    /// Signal emitted when the widget loses focus.
    pub blur: Signal<()>,
    /// Signal emitted with the query text before each query.
    pub before_query: Signal<String>,
    /// Signal emitted before the dropdown opens.
    pub before_drop_down_opens: Signal<()>,
}

impl<E: Entry> ComboBox<E> {
    /// Create a combo box.
    ///
    /// The floating panel is created right away, anchored under no parent;
    /// call [`set_parent`](Self::set_parent) once the widget is attached.
    pub fn new(
        config: ComboBoxConfig<E>,
        drop_down: Box<dyn DropDownComponent<E>>,
        positioning: Arc<dyn PositioningService>,
    ) -> Self {
        let (drop_down_tx, drop_down_rx) = crossbeam_channel::unbounded();
        let (outside_click_tx, outside_click_rx) = crossbeam_channel::unbounded();
        let positioning =
            PositioningAdapter::new(positioning, None, OutsideClickNotifier::new(outside_click_tx));
        let drop_down_connection = connect_drop_down(drop_down.as_ref(), &drop_down_tx, 0);
        let editing_mode = config.options.editing_mode;

        let mut combo = Self {
            config,
            editing_mode,
            editor: EditorState::new(),
            editor_visible: false,
            drop_down_open: false,
            selected: None,
            selected_entry_markup: String::new(),
            showing_placeholder: false,
            clear_button_visible: false,
            drop_down,
            drop_down_connection,
            drop_down_epoch: 0,
            drop_down_tx,
            drop_down_rx,
            positioning,
            parent: None,
            outside_click_rx,
            blur_caused_by_click_inside: false,
            timers: TimerQueue::new(),
            scheduled: SecondaryMap::new(),
            pending_query_timer: None,
            autocomplete_timer: None,
            click_flag_timer: None,
            last_tick: Instant::now(),
            queries: FuturesUnordered::new(),
            query_sequence: 0,
            destroyed: false,
            selected_entry_changed: Signal::new(),
            focus: Signal::new(),
            blur: Signal::new(),
            before_query: Signal::new(),
            before_drop_down_opens: Signal::new(),
        };
        combo.render_selected_entry();
        combo.drop_down.set_value(None);
        combo
    }

    // =========================================================================
    // Value
    // =========================================================================

    /// The selected entry.
    pub fn value(&self) -> Option<&E> {
        self.selected.as_ref()
    }

    /// Commit `entry` as the selection.
    ///
    /// Re-renders the selected entry, resets the editor text to the entry's
    /// projection, syncs the dropdown and the clear button, and emits
    /// [`selected_entry_changed`](Self::selected_entry_changed) if the entry
    /// differs from the previous one and `fire_event_if_changed` is set.
    pub fn set_value(
        &mut self,
        entry: Option<E>,
        fire_event_if_changed: bool,
        origin: Option<InputOrigin>,
    ) {
        let changing = !self.config.entries_equal(entry.as_ref(), self.selected.as_ref());
        self.selected = entry;
        self.render_selected_entry();
        let text = self.projected_text();
        self.editor.set_text(text);
        self.drop_down.set_value(self.selected.clone());
        self.clear_button_visible = self.config.options.show_clear_button && self.selected.is_some();

        if changing {
            tracing::debug!(
                target: targets::COMBO_BOX,
                has_entry = self.selected.is_some(),
                ?origin,
                fire = fire_event_if_changed,
                "selected entry changed"
            );
        }
        if changing && fire_event_if_changed {
            self.selected_entry_changed.emit(SelectedEntryChange {
                entry: self.selected.clone(),
                origin,
            });
        }
        if self.drop_down_open {
            self.positioning.update();
        }
    }

    /// Markup of the selected entry, or the placeholder.
    pub fn selected_entry_markup(&self) -> &str {
        &self.selected_entry_markup
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// The options in effect.
    pub fn options(&self) -> &ComboBoxOptions {
        &self.config.options
    }

    /// The current editing mode.
    pub fn editing_mode(&self) -> EditingMode {
        self.editing_mode
    }

    /// Change the editing mode. Leaving an editable mode closes the dropdown.
    pub fn set_editing_mode(&mut self, mode: EditingMode) {
        self.editing_mode = mode;
        if !self.is_drop_down_needed() {
            self.close_drop_down();
        }
    }

    /// Show or hide the clear button. It is only ever visible while an entry
    /// is selected.
    pub fn set_show_clear_button(&mut self, show: bool) {
        self.config.options.show_clear_button = show;
        self.clear_button_visible = show && self.selected.is_some();
    }

    /// Show or hide the dropdown trigger.
    pub fn set_show_trigger(&mut self, show: bool) {
        self.config.options.show_trigger = show;
    }

    /// Change the placeholder. Updates the rendered placeholder in place.
    pub fn set_placeholder_text(&mut self, text: impl Into<String>) {
        self.config.options.placeholder_text = text.into();
        if self.showing_placeholder {
            self.selected_entry_markup = placeholder_markup(&self.config.options.placeholder_text);
        }
    }

    /// Whether the clear button is shown.
    pub fn is_clear_button_visible(&self) -> bool {
        self.clear_button_visible
    }

    /// Whether the trigger is shown.
    pub fn is_trigger_visible(&self) -> bool {
        self.config.options.show_trigger
    }

    // =========================================================================
    // Dropdown Component
    // =========================================================================

    /// The dropdown panel.
    pub fn drop_down(&self) -> &dyn DropDownComponent<E> {
        self.drop_down.as_ref()
    }

    /// The dropdown panel, mutably.
    pub fn drop_down_mut(&mut self) -> &mut dyn DropDownComponent<E> {
        self.drop_down.as_mut()
    }

    /// Replace the dropdown panel, returning the old one.
    ///
    /// Queries still running against the old panel are disregarded.
    pub fn set_drop_down_component(
        &mut self,
        drop_down: Box<dyn DropDownComponent<E>>,
    ) -> Box<dyn DropDownComponent<E>> {
        self.drop_down
            .value_changed()
            .disconnect(self.drop_down_connection);
        self.drop_down_epoch += 1;
        self.query_sequence += 1;
        self.drop_down_connection =
            connect_drop_down(drop_down.as_ref(), &self.drop_down_tx, self.drop_down_epoch);

        let old = std::mem::replace(&mut self.drop_down, drop_down);
        self.drop_down.set_value(self.selected.clone());
        tracing::debug!(target: targets::COMBO_BOX, epoch = self.drop_down_epoch, "dropdown component replaced");
        old
    }

    // =========================================================================
    // State
    // =========================================================================

    /// The editor text.
    pub fn editor_text(&self) -> &str {
        self.editor.text()
    }

    /// The editor selection as `(start, end)` char offsets.
    pub fn editor_selection(&self) -> (usize, usize) {
        self.editor.selection()
    }

    /// Whether the editor is shown.
    pub fn is_editor_visible(&self) -> bool {
        self.editor_visible
    }

    /// Whether the dropdown is open.
    pub fn is_drop_down_open(&self) -> bool {
        self.drop_down_open
    }

    /// Whether the widget holds focus.
    pub fn has_focus(&self) -> bool {
        self.editor.has_focus()
    }

    /// Whether [`destroy`](Self::destroy) was called.
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// The visibility state.
    pub fn state(&self) -> ComboBoxState {
        match (self.editor_visible, self.drop_down_open) {
            (false, _) => ComboBoxState::EditorHidden,
            (true, false) => ComboBoxState::EditorVisibleDropDownClosed,
            (true, true) => ComboBoxState::EditorVisibleDropDownOpen,
        }
    }

    /// CSS classes of the widget root.
    pub fn css_classes(&self) -> Vec<&'static str> {
        let mut classes = vec!["tr-combobox", "tr-input-wrapper", self.editing_mode.css_class()];
        if !self.editor_visible {
            classes.push("editor-hidden");
        }
        if self.drop_down_open {
            classes.push("open");
        }
        if self.editor.has_focus() {
            classes.push("focus");
        }
        classes
    }

    /// The parent node the widget is attached to.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Record that the widget now lives under `parent`. The floating panel
    /// is re-anchored the next time the dropdown opens.
    pub fn set_parent(&mut self, parent: Option<NodeId>) {
        self.parent = parent;
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Show the editor with its text selected.
    pub fn focus(&mut self) {
        self.show_editor();
        self.editor.select_all();
    }

    /// Open the dropdown, if the editing mode allows it.
    pub fn open_drop_down(&mut self) {
        if self.destroyed || !self.is_drop_down_needed() {
            return;
        }
        self.show_editor();
        self.positioning.ensure_anchored(self.parent);
        if !self.drop_down_open {
            self.before_drop_down_opens.emit(());
            self.positioning.update();
            self.drop_down_open = true;
            tracing::trace!(target: targets::COMBO_BOX, "dropdown opened");
        }
    }

    /// Close the dropdown.
    pub fn close_drop_down(&mut self) {
        if self.drop_down_open {
            tracing::trace!(target: targets::COMBO_BOX, "dropdown closed");
        }
        self.drop_down_open = false;
    }

    /// Tear the widget down: destroys the floating panel, cancels timers and
    /// disregards running queries. Later input is ignored.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.positioning.destroy();
        self.timers.clear();
        self.scheduled.clear();
        self.pending_query_timer = None;
        self.autocomplete_timer = None;
        self.click_flag_timer = None;
        self.queries.clear();
        self.drop_down
            .value_changed()
            .disconnect(self.drop_down_connection);
        self.drop_down_open = false;
        self.editor_visible = false;
        self.destroyed = true;
        tracing::debug!(target: targets::COMBO_BOX, "destroyed");
    }

    // =========================================================================
    // Focus Events
    // =========================================================================

    /// The editor gained focus.
    pub fn handle_focus_in(&mut self) {
        if self.destroyed {
            return;
        }
        let was_focused = self.editor.has_focus();
        self.editor.set_focused(true);
        if self.blur_caused_by_click_inside {
            // Refocus after a click inside the widget.
            if !was_focused {
                self.focus.emit(());
            }
            return;
        }
        self.focus.emit(());
        self.show_editor();
    }

    /// The editor lost focus.
    pub fn handle_focus_out(&mut self) {
        if self.destroyed {
            return;
        }
        if self.blur_caused_by_click_inside {
            tracing::trace!(target: targets::COMBO_BOX, "blur caused by click inside, keeping focus");
            return;
        }
        self.editor.set_focused(false);
        if self.editor_visible
            && let Some(entry) = self.free_text_entry()
        {
            self.set_value(Some(entry), true, Some(InputOrigin::Blur));
        }
        self.blur.emit(());
        self.hide_editor();
        self.close_drop_down();
        self.process_messages();
    }

    // =========================================================================
    // Pointer Events
    // =========================================================================

    /// A mouse button went down on `part`.
    pub fn handle_mouse_down(&mut self, part: ComboBoxPart) {
        if self.destroyed {
            return;
        }
        self.blur_caused_by_click_inside = true;
        if let Some(id) = self.click_flag_timer.take() {
            self.cancel(id);
        }
        self.click_flag_timer = Some(self.schedule(Duration::ZERO, ScheduledAction::ResetClickInsideFlag));

        match part {
            ComboBoxPart::Editor => {
                if self.accepts_pointer_edits() {
                    if !self.config.options.show_drop_down_on_results_only {
                        self.open_drop_down();
                    }
                    let text = self.editor.text_left_of_selection();
                    self.query(text, SelectionDirection::None, false);
                }
            }
            ComboBoxPart::Trigger => {
                if self.drop_down_open {
                    self.close_drop_down();
                    self.show_editor();
                } else if self.accepts_pointer_edits() {
                    self.show_editor();
                    self.editor.select_all();
                    self.drop_down.set_value(self.selected.clone());
                    self.open_drop_down();
                }
            }
            ComboBoxPart::ClearButton => {
                if self.clear_button_visible && self.accepts_pointer_edits() {
                    self.editor.clear();
                    self.set_value(None, true, Some(InputOrigin::Pointer));
                }
            }
            ComboBoxPart::SelectedEntry | ComboBoxPart::DropDown => {}
        }
        self.process_messages();
    }

    /// A mouse button went up over the widget.
    pub fn handle_mouse_up(&mut self) {
        self.refocus_after_click();
    }

    /// The pointer left the widget.
    pub fn handle_mouse_leave(&mut self) {
        self.refocus_after_click();
    }

    /// A click (down and up) landed on `part`.
    pub fn handle_click(&mut self, part: ComboBoxPart) {
        if self.destroyed || part != ComboBoxPart::SelectedEntry || !self.accepts_pointer_edits() {
            return;
        }
        self.show_editor();
        self.editor.select_all();
        if !self.config.options.show_drop_down_on_results_only {
            self.open_drop_down();
        }
        self.drop_down.set_value(self.selected.clone());
        self.process_messages();
    }

    /// The user clicked the dropdown entry at `index`.
    pub fn handle_drop_down_entry_click(&mut self, index: usize) {
        if self.destroyed {
            return;
        }
        self.drop_down.select_entry_at(index);
        self.process_messages();
    }

    // =========================================================================
    // Keyboard Events
    // =========================================================================

    /// Handle a key press in the editor, including its default editing
    /// action. Returns `false` if the key was ignored.
    #[tracing::instrument(skip_all, target = "horizon_ux::combo_box", level = "trace", fields(key = ?event.key))]
    pub fn handle_key_press(&mut self, event: &KeyPressEvent) -> bool {
        if self.destroyed || event.key.is_modifier() || !self.is_editable() {
            return false;
        }
        // Any keystroke invalidates a completion computed for older text.
        self.cancel_auto_complete();

        let handled = match event.key {
            Key::Tab | Key::Enter => self.handle_commit_key(event.key),
            Key::ArrowLeft | Key::ArrowRight => {
                if self.drop_down_open && self.drop_down.handle_keyboard_input(event) {
                    self.set_and_select_editor_value(self.drop_down.value());
                } else {
                    self.show_editor();
                    if event.key == Key::ArrowLeft {
                        self.editor.move_left();
                    } else {
                        self.editor.move_right();
                    }
                }
                true
            }
            Key::Backspace | Key::Delete => {
                if event.key == Key::Backspace {
                    self.editor.delete_backward();
                } else {
                    self.editor.delete_forward();
                }
                self.schedule_query(DirectionRule::Fixed(SelectionDirection::None), true);
                true
            }
            Key::ArrowUp | Key::ArrowDown => {
                if !self.editor_visible {
                    self.editor.select_all();
                    self.show_editor();
                }
                let direction = if event.key == Key::ArrowUp {
                    SelectionDirection::Previous
                } else {
                    SelectionDirection::Next
                };
                if !self.drop_down_open {
                    let text = self.editor.text_left_of_selection();
                    self.query(text, direction, false);
                    self.open_drop_down();
                } else if self.drop_down.handle_keyboard_input(event) {
                    self.set_and_select_editor_value(self.drop_down.value());
                }
                true
            }
            Key::PageUp | Key::PageDown => {
                let accepted = self.drop_down_open && self.drop_down.handle_keyboard_input(event);
                if accepted {
                    self.set_and_select_editor_value(self.drop_down.value());
                }
                accepted
            }
            Key::Home | Key::End => {
                self.show_editor();
                if event.key == Key::Home {
                    self.editor.move_home();
                } else {
                    self.editor.move_end();
                }
                true
            }
            Key::Escape => {
                if self.selected.is_some() || self.editor.is_empty() || !self.drop_down_open {
                    self.hide_editor();
                }
                self.close_drop_down();
                true
            }
            _ if event.is_printable() => {
                if !self.editor_visible {
                    self.show_editor();
                    self.editor.select_all();
                }
                if !self.config.options.show_drop_down_on_results_only {
                    self.open_drop_down();
                }
                self.editor.insert_text(&event.text);
                self.schedule_query(DirectionRule::PreselectIfText, false);
                true
            }
            _ => false,
        };

        self.process_messages();
        handled
    }

    fn handle_commit_key(&mut self, key: Key) -> bool {
        if !self.editor_visible {
            return false;
        }
        let highlighted = self.drop_down.value();
        let origin = Some(InputOrigin::Keyboard(key));
        match highlighted {
            Some(entry) if self.drop_down_open => self.set_value(Some(entry), true, origin),
            _ => {
                if let Some(entry) = self.free_text_entry() {
                    self.set_value(Some(entry), true, origin);
                }
            }
        }
        self.close_drop_down();
        self.hide_editor();
        true
    }

    // =========================================================================
    // Time and Queries
    // =========================================================================

    /// Fire timers due at `now`, apply resolved queries and process dropdown
    /// notifications until nothing more happens.
    ///
    /// Query futures are polled with a no-op waker; use
    /// [`poll_queries`](Self::poll_queries) to get woken instead.
    pub fn tick(&mut self, now: Instant) {
        let _perf = PerfSpan::new("combo_box_tick");
        self.last_tick = self.last_tick.max(now);
        let waker = futures_util::task::noop_waker_ref();
        let mut cx = Context::from_waker(waker);

        loop {
            let fired = self.fire_expired_timers(now);
            let resolved = self.poll_ready_queries(&mut cx);
            self.process_messages();
            if !fired && !resolved {
                break;
            }
        }
    }

    /// Poll running queries with the caller's waker and apply those that
    /// resolved. Ready once no query is running.
    pub fn poll_queries(&mut self, cx: &mut Context<'_>) -> Poll<()> {
        self.poll_ready_queries(cx);
        self.process_messages();
        if self.queries.is_empty() {
            Poll::Ready(())
        } else {
            Poll::Pending
        }
    }

    /// Whether queries are still running.
    pub fn has_pending_queries(&self) -> bool {
        !self.queries.is_empty()
    }

    /// When the next timer is due.
    pub fn next_deadline(&mut self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    fn fire_expired_timers(&mut self, now: Instant) -> bool {
        let expired = self.timers.process_expired(now);
        let fired = !expired.is_empty();
        for id in expired {
            let Some(action) = self.scheduled.remove(id) else {
                continue;
            };
            match action {
                ScheduledAction::Query {
                    direction,
                    suppress_autocomplete,
                } => {
                    self.pending_query_timer = None;
                    let direction = match direction {
                        DirectionRule::Fixed(direction) => direction,
                        DirectionRule::PreselectIfText => {
                            if self.config.options.preselect_first_query_result
                                && !self.editor.is_empty()
                            {
                                SelectionDirection::Next
                            } else {
                                SelectionDirection::None
                            }
                        }
                    };
                    let text = self.editor.text_left_of_selection();
                    self.query(text, direction, suppress_autocomplete);
                }
                ScheduledAction::AutoComplete(entry) => {
                    self.autocomplete_timer = None;
                    self.auto_complete(&entry);
                }
                ScheduledAction::ResetClickInsideFlag => {
                    self.click_flag_timer = None;
                    self.blur_caused_by_click_inside = false;
                }
            }
        }
        fired
    }

    fn poll_ready_queries(&mut self, cx: &mut Context<'_>) -> bool {
        let mut resolved = false;
        while let Poll::Ready(Some(completion)) = self.queries.poll_next_unpin(cx) {
            resolved = true;
            self.apply_query_completion(completion);
        }
        resolved
    }

    /// Issue a query to the dropdown panel.
    #[tracing::instrument(skip(self), target = "horizon_ux::query", level = "trace")]
    fn query(&mut self, text: String, direction: SelectionDirection, suppress_autocomplete: bool) {
        self.before_query.emit(text.clone());
        self.query_sequence += 1;
        let sequence = self.query_sequence;
        let pending = self.drop_down.handle_query(&text);
        self.queries.push(
            pending
                .map(move |result| QueryCompletion {
                    sequence,
                    text,
                    direction,
                    suppress_autocomplete,
                    result,
                })
                .boxed(),
        );
    }

    fn apply_query_completion(&mut self, completion: QueryCompletion<E>) {
        if completion.sequence != self.query_sequence {
            tracing::trace!(
                target: targets::QUERY,
                sequence = completion.sequence,
                latest = self.query_sequence,
                "discarding stale query result"
            );
            return;
        }
        if let Err(err) = &completion.result {
            tracing::warn!(target: targets::QUERY, query = %completion.text, error = %err, "query failed");
        }

        let has_results = self.drop_down.apply_query_result(
            &completion.text,
            completion.direction,
            completion.result,
        );
        if completion.direction != SelectionDirection::None {
            self.auto_complete_if_possible(completion.suppress_autocomplete);
        }
        if self.config.options.show_drop_down_on_results_only
            && has_results
            && self.editor.has_focus()
        {
            self.open_drop_down();
        }
    }

    // =========================================================================
    // Autocomplete
    // =========================================================================

    fn auto_complete_if_possible(&mut self, suppressed: bool) {
        if !self.config.options.auto_complete {
            return;
        }
        self.cancel_auto_complete();
        let Some(candidate) = self.drop_down.value() else {
            return;
        };
        if suppressed {
            return;
        }
        let delay = self.config.options.auto_complete_delay();
        if delay.is_zero() {
            self.auto_complete(&candidate);
        } else {
            self.autocomplete_timer = Some(self.schedule(delay, ScheduledAction::AutoComplete(candidate)));
        }
    }

    fn cancel_auto_complete(&mut self) {
        if let Some(id) = self.autocomplete_timer.take() {
            self.cancel(id);
        }
    }

    /// Append the candidate's remaining text if the typed text is a
    /// case-insensitive prefix of it, selecting the appended part.
    fn auto_complete(&mut self, candidate: &E) {
        if !self.editor_visible {
            return;
        }
        let typed = self.editor.text_left_of_selection();
        let candidate_text = self.config.entry_to_editor_text(candidate);
        if !starts_with_ignore_case(&candidate_text, &typed) {
            return;
        }
        let typed_len = typed.chars().count();
        let completed: String = typed
            .chars()
            .chain(candidate_text.chars().skip(typed_len))
            .collect();
        let completed_len = completed.chars().count();
        self.editor.set_text(completed);
        if self.editor.has_focus() {
            self.editor.set_selection_range(typed_len, completed_len);
        }
        tracing::trace!(target: targets::COMBO_BOX, typed = %typed, completion = %candidate_text, "autocompleted");
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn now(&self) -> Instant {
        Instant::now().max(self.last_tick)
    }

    fn schedule(&mut self, delay: Duration, action: ScheduledAction<E>) -> TimerId {
        let id = self.timers.start_one_shot(self.now(), delay);
        self.scheduled.insert(id, action);
        id
    }

    fn cancel(&mut self, id: TimerId) {
        self.scheduled.remove(id);
        if let Err(err) = self.timers.stop(id) {
            tracing::trace!(target: targets::COMBO_BOX, error = %err, "timer already gone");
        }
    }

    /// Defer a query until the current input mutation settled, replacing any
    /// deferred query still waiting.
    fn schedule_query(&mut self, direction: DirectionRule, suppress_autocomplete: bool) {
        if let Some(id) = self.pending_query_timer.take() {
            self.cancel(id);
        }
        let action = ScheduledAction::Query {
            direction,
            suppress_autocomplete,
        };
        self.pending_query_timer = Some(self.schedule(Duration::ZERO, action));
    }

    fn process_messages(&mut self) {
        while self.outside_click_rx.try_recv().is_ok() {
            tracing::trace!(target: targets::POSITIONING, "outside click");
            self.close_drop_down();
        }
        while let Ok((epoch, change)) = self.drop_down_rx.try_recv() {
            if epoch != self.drop_down_epoch || self.destroyed || !change.final_selection {
                continue;
            }
            self.set_value(change.value, true, Some(InputOrigin::Pointer));
            self.close_drop_down();
            self.hide_editor();
        }
    }

    fn refocus_after_click(&mut self) {
        if self.destroyed || !self.blur_caused_by_click_inside {
            return;
        }
        self.handle_focus_in();
        self.blur_caused_by_click_inside = false;
        if let Some(id) = self.click_flag_timer.take() {
            self.cancel(id);
        }
    }

    fn show_editor(&mut self) {
        self.editor_visible = true;
    }

    /// Hide the editor, which also closes the dropdown and resets the editor
    /// text to the selected entry.
    fn hide_editor(&mut self) {
        self.cancel_auto_complete();
        self.editor_visible = false;
        self.drop_down_open = false;
        let text = self.projected_text();
        self.editor.set_text(text);
    }

    fn set_and_select_editor_value(&mut self, value: Option<E>) {
        match value {
            Some(entry) => {
                let text = self.config.entry_to_editor_text(&entry);
                self.editor.set_text(text);
                self.editor.select_all();
            }
            None => self.editor.clear(),
        }
    }

    fn projected_text(&self) -> String {
        self.selected
            .as_ref()
            .map(|entry| self.config.entry_to_editor_text(entry))
            .unwrap_or_default()
    }

    fn render_selected_entry(&mut self) {
        match self.config.render_selected_entry(self.selected.as_ref()) {
            Some(markup) => {
                self.selected_entry_markup = markup;
                self.showing_placeholder = false;
            }
            None => {
                self.selected_entry_markup = placeholder_markup(&self.config.options.placeholder_text);
                self.showing_placeholder = true;
            }
        }
    }

    fn free_text_entry(&self) -> Option<E> {
        self.config.text_to_entry(&self.editor.text_left_of_selection())
    }

    fn is_editable(&self) -> bool {
        self.editing_mode.is_editable(self.editor.has_focus())
    }

    /// Pointer input on the widget focuses it, so focus-dependent modes count
    /// as editable here.
    fn accepts_pointer_edits(&self) -> bool {
        self.editing_mode.is_editable(true)
    }

    fn is_drop_down_needed(&self) -> bool {
        self.is_editable()
    }
}

fn connect_drop_down<E: Entry>(
    drop_down: &dyn DropDownComponent<E>,
    sender: &Sender<DropDownMessage<E>>,
    epoch: u64,
) -> ConnectionId {
    let sender = sender.clone();
    drop_down
        .value_changed()
        .connect(move |change: &DropDownValueChange<E>| {
            // The receiver lives as long as the combo box.
            let _ = sender.send((epoch, change.clone()));
        })
}

fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
    let mut text = text.chars().flat_map(char::to_lowercase);
    prefix
        .chars()
        .flat_map(char::to_lowercase)
        .all(|ch| text.next() == Some(ch))
}

impl<E: Entry> fmt::Debug for ComboBox<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComboBox")
            .field("state", &self.state())
            .field("editing_mode", &self.editing_mode)
            .field("editor", &self.editor)
            .field("has_value", &self.selected.is_some())
            .field("pending_queries", &self.queries.len())
            .field("active_timers", &self.timers.active_count())
            .field("destroyed", &self.destroyed)
            .finish_non_exhaustive()
    }
}

static_assertions::assert_impl_all!(ComboBox<String>: Send);
