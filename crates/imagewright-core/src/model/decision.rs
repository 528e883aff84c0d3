use serde::Serialize;
use std::collections::BTreeSet;

/// What has to happen for one service in this round
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub service: String,
    /// A fresh image has to be built before any tag is created
    pub must_build_new: bool,
    pub tags_to_create: BTreeSet<String>,
}

impl Decision {
    /// Build a new image and give it every tag in `tags`
    pub fn build_new(service: impl Into<String>, tags: BTreeSet<String>) -> Self {
        Self {
            service: service.into(),
            must_build_new: true,
            tags_to_create: tags,
        }
    }

    /// Attach `tags` to an image that already exists
    pub fn attach(service: impl Into<String>, tags: BTreeSet<String>) -> Self {
        Self {
            service: service.into(),
            must_build_new: false,
            tags_to_create: tags,
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tags = self
            .tags_to_create
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        if self.must_build_new {
            write!(f, "{}: build new image, tags [{}]", self.service, tags)
        } else {
            write!(f, "{}: tag existing image, tags [{}]", self.service, tags)
        }
    }
}
