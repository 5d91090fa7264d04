//! Prelude module for Horizon UX.
//!
//! ```ignore
//! use horizon_ux::prelude::*;
//! ```
//!
//! This provides access to:
//! - The combo box and its configuration
//! - Dropdown panels and query sources
//! - Input events
//! - Positioning and the component registry

// ============================================================================
// Signal/Slot System
// ============================================================================

pub use horizon_ux_core::{ConnectionId, Signal};

// ============================================================================
// Combo Box
// ============================================================================

pub use crate::combo_box::{
    ComboBox, ComboBoxPart, ComboBoxState, Entry, InputOrigin, SelectedEntryChange,
};
pub use crate::config::{ComboBoxConfig, ComboBoxOptions, EditingMode, FreeTextEntry};

// ============================================================================
// Dropdown and Queries
// ============================================================================

pub use crate::dropdown::{DropDownComponent, DropDownValueChange, ListDropDown};
pub use crate::query::{
    CaseSensitivity, MatchMode, QueryFuture, QueryResult, QuerySource, SelectionDirection,
    SharedQuerySource, StaticQuerySource,
};

// ============================================================================
// Input
// ============================================================================

pub use crate::events::{Key, KeyPressEvent, KeyboardModifiers};

// ============================================================================
// Positioning and Registry
// ============================================================================

pub use crate::positioning::{DetachedPositioning, FloatingPanel, NodeId, PositioningService};
pub use crate::registry::{ComponentRegistry, register_builtin_components};

// ============================================================================
// Errors
// ============================================================================

pub use crate::error::{Error, QueryError};
