//! Horizon UX - server-driven widget components.
//!
//! Widgets in this crate are headless interaction engines: they own widget
//! state (editor text, selection, visibility, CSS classes) and react to
//! input events the host delivers. Rendering and the transport to the
//! remote session belong to the host.
//!
//! The main component is the [`ComboBox`]: an editable selection widget
//! with asynchronous querying, keyboard navigation of a dropdown list,
//! autocompletion and free-text entry.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Instant;
//!
//! use horizon_ux::prelude::*;
//!
//! let cities: Vec<String> = ["Berlin", "Bern", "Bonn"].iter().map(|s| s.to_string()).collect();
//! let config = ComboBoxConfig::new(|s: &String| s.clone());
//! let source = Arc::new(StaticQuerySource::new(cities, |s: &String| s.clone()));
//! let drop_down = ListDropDown::from_config(source, &config);
//! let mut combo = ComboBox::new(config, Box::new(drop_down), Arc::new(DetachedPositioning));
//!
//! combo.selected_entry_changed.connect(|change| {
//!     println!("selected: {:?}", change.entry);
//! });
//!
//! combo.handle_focus_in();
//! combo.handle_key_press(&KeyPressEvent::key(Key::ArrowDown));
//! combo.tick(Instant::now());
//! combo.handle_key_press(&KeyPressEvent::key(Key::Enter));
//! assert_eq!(combo.value().map(String::as_str), Some("Berlin"));
//! ```

pub mod combo_box;
pub mod config;
pub mod dropdown;
pub mod editor;
mod error;
pub mod events;
pub mod markup;
pub mod positioning;
pub mod prelude;
pub mod query;
pub mod registry;

pub use combo_box::{ComboBox, ComboBoxPart, ComboBoxState, Entry, InputOrigin, SelectedEntryChange};
pub use config::{ComboBoxConfig, ComboBoxOptions, EditingMode, FreeTextEntry};
pub use dropdown::{DropDownComponent, DropDownValueChange, ListDropDown};
pub use error::{Error, QueryError, Result};
pub use events::{Key, KeyPressEvent, KeyboardModifiers};
pub use positioning::{DetachedPositioning, FloatingPanel, NodeId, PositioningService};
pub use query::{QuerySource, SelectionDirection, StaticQuerySource};
pub use registry::{ComponentRegistry, register_builtin_components};

pub use horizon_ux_core::{ConnectionId, Signal};
