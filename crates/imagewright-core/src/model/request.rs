use serde::{Deserialize, Serialize};

/// One requested tag for one service.
///
/// Several requests may name the same service within a round; they are
/// merged by [`crate::merge_requests`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuildRequest {
    pub service: String,
    pub tag: String,
    /// Build a fresh image even if the tag already exists
    #[serde(default)]
    pub enforce: bool,
}

impl BuildRequest {
    pub fn new(service: impl Into<String>, tag: impl Into<String>, enforce: bool) -> Self {
        Self {
            service: service.into(),
            tag: tag.into(),
            enforce,
        }
    }
}
