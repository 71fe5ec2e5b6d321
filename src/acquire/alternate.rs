// src/acquire/alternate.rs
// =============================================================================
// The alternate acquisition channel.
//
// Some hosts can load a directory page through a route other than a plain
// HTTP request (an embedding browser, a proxy, a cache). That route is
// supplied by the caller as an AlternateChannel. The crawler never knows how
// it works; it only asks for markup and gets a string or a failure back.
//
// When no channel is installed, the alternate strategy fails with
// AcquireFailure::Unsupported.
// =============================================================================

use crate::error::AcquireFailure;
use async_trait::async_trait;
use std::time::Duration;
use url::Url;

#[async_trait]
pub trait AlternateChannel: Send + Sync {
    /// Returns the rendered markup of a directory page.
    ///
    /// `timeout` is the same per-acquisition deadline the crawler enforces;
    /// implementations may use it to bound their own work.
    async fn alternate_markup(&self, url: &Url, timeout: Duration) -> Result<String, AcquireFailure>;
}
