//! Derived-geometry batch cache.
//!
//! Converts source mesh attributes into draw batches on demand and keeps them
//! coherent while meshes are edited, re-evaluated and queried by external
//! tooling.
//!
//! ## Structure
//!
//! - [`flags`] - batch kinds and the requested/ready bit sets
//! - [`buffers`] - vertex/index buffer kinds and buffer lists
//! - [`requirements`] - declarative table of what each batch kind needs
//! - [`extract`] - buffer contents built from mesh data
//! - [`store`] - the three buffer lists of a cache
//! - [`invalidate`] - dirty categories and what they discard
//! - [`registry`] - custom batch subscriptions that outlive caches
//! - [`guard`] - drawability checks
//! - [`mesh_cache`] / [`system`] - per-mesh caches and the public API
//!
//! ## Pass
//!
//! ```text
//! get_batch(kind)      -> requested |= kind, handle returned immediately
//! create_requested()   -> validate cache, reconcile weight/UV state,
//!                         to_create = requested & !ready,
//!                         ensure buffers (UV cage, cage, final),
//!                         build batches or dummies, set ready bits,
//!                         sync custom batches into the original cache
//! dirty_tag(category)  -> discard buffers, clear dependent batches
//! ```

pub mod buffers;
pub mod extract;
pub mod flags;
pub mod guard;
pub mod invalidate;
pub mod mesh_cache;
pub mod registry;
pub mod requirements;
pub mod settings;
pub mod store;
pub mod system;

pub use buffers::{BufferListKind, BufferSlot, IboKind, VboKind};
pub use extract::{FaceSorted, MaterialRange, WeightState};
pub use flags::{BatchFlags, BatchKind};
pub use guard::{is_drawable, is_slot_drawable};
pub use invalidate::{DirtyCategory, DiscardReport};
pub use mesh_cache::MeshBatchCache;
pub use registry::{PreservationRegistry, StableKey, SubscriptionState};
pub use settings::CacheSettings;
pub use system::{DrawContext, MeshCacheSystem, PassReport};
