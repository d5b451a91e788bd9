pub mod authorized;
pub mod client_ctx;

pub use authorized::{AdminOnly, AnyMember, Authorized};
pub use client_ctx::ClientCtx;
