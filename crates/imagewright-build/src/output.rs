//! ビルドツール出力の解析

use imagewright_core::{BuildpackImage, normalize_repository, split_repo_tag};
use std::collections::HashMap;

const BUILT_IMAGE_MARKER: &str = "Successfully built image";

/// Find the image reference reported by a buildpack build.
///
/// Both Gradle (`bootBuildImage`) and Maven (`spring-boot:build-image`)
/// print `Successfully built image '<repository>:<tag>'`.
pub fn parse_built_image(output: &str) -> Option<BuildpackImage> {
    let line = output.lines().find(|l| l.contains(BUILT_IMAGE_MARKER))?;
    let rest = &line[line.find(BUILT_IMAGE_MARKER)? + BUILT_IMAGE_MARKER.len()..];
    let start = rest.find('\'')? + 1;
    let end = start + rest[start..].find('\'')?;
    let reference = rest[start..end].trim();
    if reference.is_empty() {
        return None;
    }

    let (repository, tag) = split_repo_tag(reference);
    Some(BuildpackImage {
        repository: normalize_repository(&repository),
        tag,
    })
}

/// Parse `key: value` lines as printed by `gradle properties`.
///
/// Only the first `": "` separates key and value, so paths containing
/// colons survive.
pub fn parse_properties(output: &str) -> HashMap<String, String> {
    output
        .lines()
        .filter_map(|line| line.split_once(": "))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .filter(|(key, _)| !key.is_empty() && !key.contains(' '))
        .collect()
}
