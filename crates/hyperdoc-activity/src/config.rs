//! Resolver tuning.

use serde::{Deserialize, Serialize};

fn default_max_concurrency() -> usize {
    8
}

fn default_page_size() -> u32 {
    30
}

/// Configuration for [`crate::ActivityResolver`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Events of one page resolved concurrently.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Page size used when a filter leaves it at zero.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            page_size: default_page_size(),
        }
    }
}

impl ResolverConfig {
    pub fn with_max_concurrency(mut self, n: usize) -> Self {
        self.max_concurrency = n;
        self
    }

    pub fn with_page_size(mut self, n: u32) -> Self {
        self.page_size = n;
        self
    }
}
