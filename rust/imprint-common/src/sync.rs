//! Cross-target sharing bound
//!
//! On native targets [ConditionalSync] stands for `Send + Sync`, so stores,
//! renderers and key sources can be shared by concurrent requests. On
//! `wasm32-unknown-unknown` it adds no bound at all.

#[allow(missing_docs)]
#[cfg(not(target_arch = "wasm32"))]
pub trait ConditionalSync: Send + Sync {}

#[cfg(not(target_arch = "wasm32"))]
impl<S> ConditionalSync for S where S: Send + Sync {}

#[allow(missing_docs)]
#[cfg(target_arch = "wasm32")]
pub trait ConditionalSync {}

#[cfg(target_arch = "wasm32")]
impl<S> ConditionalSync for S {}
