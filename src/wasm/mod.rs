//! JavaScript surface
//!
//! One [`WasmReorderList`] per rendered list. The host page supplies the
//! resource store as three callbacks and drives time by passing
//! `Date.now()` into every call that needs it.

pub mod bindings;
pub mod utils;

pub use bindings::WasmReorderList;
