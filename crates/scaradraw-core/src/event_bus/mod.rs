//! # Event Bus Module
//!
//! Publish/subscribe distribution of application events between decoupled
//! components:
//! - Publishers emit typed events without knowing subscribers
//! - Subscribers filter by category and receive events of interest
//! - Synchronous handlers and async `broadcast` receivers are both supported
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use scaradraw_core::event_bus::{AppEvent, EventBus, EventCategory, EventFilter, MotionEvent};
//!
//! let bus = Arc::new(EventBus::new());
//! let subscription = bus.subscribe(
//!     EventFilter::Categories(vec![EventCategory::Motion]),
//!     |event| {
//!         if let AppEvent::Motion(MotionEvent::Progress { completed, total }) = event {
//!             println!("{}/{}", completed, total);
//!         }
//!     },
//! );
//!
//! // hand `bus.clone()` to the sequencer, then later:
//! bus.unsubscribe(subscription);
//! ```

mod bus;
mod events;

pub use bus::*;
pub use events::*;
