//! Core systems for Horizon UX.
//!
//! This crate provides the foundational pieces shared by all Horizon UX
//! widgets:
//!
//! - **Signal/Slot System**: Type-safe notifications from widgets to hosts
//! - **Timers**: A deterministic one-shot timer queue driven by the host loop
//! - **Logging**: `tracing` targets and helpers for every subsystem
//!
//! # Signal Example
//!
//! ```
//! use horizon_ux_core::Signal;
//!
//! let value_changed = Signal::<i32>::new();
//! let conn_id = value_changed.connect(|value| {
//!     println!("Value changed to: {}", value);
//! });
//!
//! value_changed.emit(42);
//! value_changed.disconnect(conn_id);
//! ```
//!
//! # Timer Example
//!
//! ```
//! use horizon_ux_core::TimerQueue;
//! use std::time::{Duration, Instant};
//!
//! let mut timers = TimerQueue::new();
//! let now = Instant::now();
//! let id = timers.start_one_shot(now, Duration::from_millis(100));
//!
//! assert!(timers.process_expired(now).is_empty());
//! assert_eq!(timers.process_expired(now + Duration::from_millis(100)), vec![id]);
//! ```

mod error;
pub mod logging;
pub mod signal;
mod timer;

pub use error::{Result, TimerError, UxError};
pub use logging::PerfSpan;
pub use signal::{ConnectionId, Signal};
pub use timer::{TimerId, TimerQueue};
