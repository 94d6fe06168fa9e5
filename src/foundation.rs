//! Shared primitives: frame/canvas types, the crate error taxonomy and u8 blend math.

pub mod core;
pub mod error;
pub(crate) mod math;
