//! waterline-sync library.
//!
//! The stateful half of the console engine: change feed consumption,
//! the in-memory projection, transition execution, and notification
//! emission. All projection mutations are serialized behind a single
//! writer; readers always see a complete snapshot.

pub mod engine;
pub mod feed;
pub mod memory;
pub mod notify;
pub mod projection;
pub mod store;
pub mod transition;

pub use engine::Engine;
pub use feed::FeedListener;
pub use memory::MemoryStore;
pub use notify::NotificationEmitter;
pub use projection::ProjectionStore;
pub use store::{FeedMessage, FieldPatch, RawDoc, RemoteStore, StoreError, Subscription, SubscriptionId};
pub use transition::{TransitionEngine, TransitionError, TransitionReceipt};
