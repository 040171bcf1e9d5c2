//! Tower layers for the HTTP client middleware stack
//!
//! - [`UserAgentLayer`] - Adds User-Agent header to all requests
//! - [`CookieJarLayer`] - Carries session cookies between requests

mod cookie_jar;
mod user_agent;

pub use cookie_jar::{CookieJar, CookieJarLayer, CookieJarService};
pub use user_agent::{UserAgentLayer, UserAgentService};
