//! Authentication module for managing tokens and session lifecycle.
//!
//! This module provides:
//! - `TokenScope`: Pluggable storage for one scope of credentials
//! - `TokenVault`: The durable/session two-scope store the client reads
//! - `SessionEvents`: Hooks fired when a session ends and sign-in is needed
//!
//! Access tokens live in whichever scope matches the sign-in's remember
//! choice; refresh tokens are always durable.

pub mod events;
pub mod scope;
pub mod vault;

pub use events::{AuthEvent, ChannelEvents, NullEvents, SessionEvents};
pub use scope::{
    FileScope, KeyringScope, MemoryScope, TokenScope, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY,
};
pub use vault::TokenVault;
