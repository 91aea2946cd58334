//! Shared utilities (hex dumps, the audit log, and the optional async adapter).

#[cfg(feature = "cli")]
pub mod audit;
#[cfg(feature = "async")]
pub mod background;
pub mod hex;
