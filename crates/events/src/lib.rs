//! Progress-notification boundary of the registry.
//!
//! Long-running batch operations publish [`ProgressEvent`]s through the
//! in-process [`ProgressBus`]; the push transport that delivers them to
//! clients lives outside this core and simply subscribes.

pub mod bus;

pub use bus::{JobPhase, ProgressBus, ProgressEvent};
