//! Built-in protocol layers.
//!
//! Each protocol follows the same shape: wire constants in `layout`, the
//! dissection routine in `parser`, and the immutable header plus its
//! mutable builder in the module root. Protocols plug into the framework
//! through the dispatch registry only; nothing in the core names them
//! outside the built-in registration table.

pub mod ethernet;
pub mod ipv4;
pub mod raw;
pub mod udp;
