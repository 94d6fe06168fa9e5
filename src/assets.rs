//! Image acquisition: query generation, remote sources, the on-disk cache and the resolver.

pub mod cache;
pub mod catalog;
pub mod decode;
pub mod query;
pub mod resolver;
pub mod source;
