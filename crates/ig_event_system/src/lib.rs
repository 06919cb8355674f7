//! # IG Event System
//!
//! Synchronous signal/slot notification used by the image generator's scene
//! model and plugins to observe state changes without callback interfaces.
//!
//! ## Core Features
//!
//! - **Typed Signals**: every [`Signal<A>`] carries one argument type
//! - **Receiver Identity**: subscriptions are keyed by [`ReceiverId`] so an
//!   object can drop exactly the connections it made
//! - **Re-entrancy**: slots may connect, disconnect or emit while an emission
//!   is in progress
//!
//! Everything here is single-threaded (`Rc` based). There is no queuing and no
//! cross-thread marshalling: `emit` calls every slot before it returns.
//!
//! ## Quick Start Example
//!
//! ```rust
//! use ig_event_system::{ReceiverId, Signal};
//!
//! let state_changed: Signal<&'static str> = Signal::new();
//! let me = ReceiverId::new();
//! let slot = state_changed.connect(me, |state| println!("state is now {state}"));
//!
//! state_changed.emit(&"active");
//! assert!(state_changed.disconnect(me, slot));
//! ```

pub mod signal;

pub use signal::{ReceiverId, Signal, SlotId};
