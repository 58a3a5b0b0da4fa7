//! Rewrites driven by the settled dependency analysis

mod devirtualization;

pub use devirtualization::{Devirtualization, DevirtualizationStats};
