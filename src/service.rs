//! Record-matching rules over the shared store.

pub mod attendance;
pub mod leave;
