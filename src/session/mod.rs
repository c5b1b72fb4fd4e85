//! Session establishment
//!
//! A session is the authenticated identity one crawl attempt fetches with:
//! the cookie set and the client identity string captured while the search
//! page was brought up, plus the total page count discovered there. Sessions
//! are owned by exactly one attempt and rebuilt from scratch on restart.

mod bootstrap;
mod types;

pub(crate) use bootstrap::egress_proxy;
pub use bootstrap::{BootstrapOutcome, HttpBootstrap, SessionBootstrap};
pub use types::{CookiePair, Session};
