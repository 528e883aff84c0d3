//! Point-in-time view of the images known to the registry

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub type TagSet = BTreeSet<String>;

const UNTAGGED: &str = "<none>";

/// One row of the registry's image listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: String,
    pub repo_tags: Vec<String>,
}

impl ImageRecord {
    pub fn new<I, S>(id: impl Into<String>, repo_tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            repo_tags: repo_tags.into_iter().map(Into::into).collect(),
        }
    }
}

/// `repository → image id → {tag}`
///
/// A snapshot is never updated after it has been taken. Ordered maps keep
/// "first found" lookups deterministic: ascending image id, then ascending tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImageSnapshot {
    images: BTreeMap<String, BTreeMap<String, TagSet>>,
}

impl ImageSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Group registry rows by repository. Dangling `<none>:<none>` entries are ignored.
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = ImageRecord>,
    {
        let mut images: BTreeMap<String, BTreeMap<String, TagSet>> = BTreeMap::new();

        for record in records {
            for repo_tag in &record.repo_tags {
                let (repository, tag) = split_repo_tag(repo_tag);
                if repository == UNTAGGED || tag == UNTAGGED {
                    continue;
                }
                images
                    .entry(normalize_repository(&repository))
                    .or_default()
                    .entry(record.id.clone())
                    .or_default()
                    .insert(tag);
            }
        }

        Self { images }
    }

    /// Add an image identity with its tags, consuming the snapshot.
    pub fn with_image<I, S>(mut self, repository: &str, image_id: &str, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.images
            .entry(normalize_repository(repository))
            .or_default()
            .entry(image_id.to_string())
            .or_default()
            .extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn contains(&self, repository: &str) -> bool {
        self.images.contains_key(repository)
    }

    pub fn identities(&self, repository: &str) -> Option<&BTreeMap<String, TagSet>> {
        self.images.get(repository)
    }

    /// Union of the tags across every identity of `repository`
    pub fn tags_of(&self, repository: &str) -> TagSet {
        self.images
            .get(repository)
            .map(|ids| ids.values().flatten().cloned().collect())
            .unwrap_or_default()
    }

    /// The identity of `repository` whose tag set contains `tag`
    pub fn identity_with_tag(&self, repository: &str, tag: &str) -> Option<&str> {
        self.images
            .get(repository)?
            .iter()
            .find(|(_, tags)| tags.contains(tag))
            .map(|(id, _)| id.as_str())
    }

    /// First tagged identity of `repository`, with its first tag
    pub fn first_tagged(&self, repository: &str) -> Option<(&str, &str)> {
        self.images
            .get(repository)?
            .iter()
            .find_map(|(id, tags)| tags.first().map(|tag| (id.as_str(), tag.as_str())))
    }

    pub fn repositories(&self) -> impl Iterator<Item = &String> {
        self.images.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeMap<String, TagSet>)> {
        self.images.iter()
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// Split `repository:tag`, treating a registry port as part of the repository.
///
/// # Examples
/// - `ghcr.io/org/app:v1.0` -> `("ghcr.io/org/app", "v1.0")`
/// - `localhost:5000/app` -> `("localhost:5000/app", "latest")`
pub fn split_repo_tag(repo_tag: &str) -> (String, String) {
    if let Some(pos) = repo_tag.rfind(':') {
        let potential_tag = &repo_tag[pos + 1..];
        let potential_repo = &repo_tag[..pos];

        if !potential_tag.contains('/') && !potential_tag.is_empty() {
            return (potential_repo.to_string(), potential_tag.to_string());
        }
    }

    (repo_tag.to_string(), "latest".to_string())
}

/// Docker Hub の短縮名に揃える
///
/// `docker.io/library/app` と `app` は同じリポジトリとして扱う。
pub fn normalize_repository(repository: &str) -> String {
    let lower = repository.trim().to_lowercase();
    let stripped = lower
        .strip_prefix("docker.io/")
        .or_else(|| lower.strip_prefix("index.docker.io/"))
        .unwrap_or(&lower);
    stripped
        .strip_prefix("library/")
        .unwrap_or(stripped)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_repo_tag_with_tag() {
        let (repo, tag) = split_repo_tag("ghcr.io/org/app:v1.0");
        assert_eq!(repo, "ghcr.io/org/app");
        assert_eq!(tag, "v1.0");
    }

    #[test]
    fn test_split_repo_tag_with_port() {
        let (repo, tag) = split_repo_tag("localhost:5000/app");
        assert_eq!(repo, "localhost:5000/app");
        assert_eq!(tag, "latest");

        let (repo, tag) = split_repo_tag("localhost:5000/app:dev");
        assert_eq!(repo, "localhost:5000/app");
        assert_eq!(tag, "dev");
    }

    #[test]
    fn test_normalize_repository() {
        assert_eq!(normalize_repository("docker.io/library/svc"), "svc");
        assert_eq!(normalize_repository("docker.io/acme/svc"), "acme/svc");
        assert_eq!(normalize_repository("Svc"), "svc");
        assert_eq!(normalize_repository("ghcr.io/acme/svc"), "ghcr.io/acme/svc");
    }

    #[test]
    fn test_from_records_groups_by_repository_and_identity() {
        let snapshot = ImageSnapshot::from_records(vec![
            ImageRecord::new("sha256:aaa", ["svc1:v1", "svc1:v2"]),
            ImageRecord::new("sha256:bbb", ["svc1:v3", "docker.io/library/svc2:latest"]),
            ImageRecord::new("sha256:ccc", ["<none>:<none>"]),
        ]);

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.identities("svc1").unwrap().len(), 2);
        assert_eq!(
            snapshot.tags_of("svc1"),
            ["v1", "v2", "v3"].iter().map(|t| t.to_string()).collect()
        );
        assert_eq!(snapshot.identity_with_tag("svc2", "latest"), Some("sha256:bbb"));
        assert!(!snapshot.contains("<none>"));
    }

    #[test]
    fn test_tag_lookup_spans_identities() {
        let snapshot = ImageSnapshot::empty()
            .with_image("svc", "id2", ["v2"])
            .with_image("svc", "id1", ["v1"]);

        assert_eq!(snapshot.identity_with_tag("svc", "v2"), Some("id2"));
        assert_eq!(snapshot.identity_with_tag("svc", "v9"), None);
        // 最初に見つかった identity を使う
        assert_eq!(snapshot.first_tagged("svc"), Some(("id1", "v1")));
    }

    #[test]
    fn test_first_tagged_skips_untagged_identity() {
        let snapshot = ImageSnapshot::empty()
            .with_image("svc", "id0", Vec::<String>::new())
            .with_image("svc", "id1", ["b", "a"]);

        assert_eq!(snapshot.first_tagged("svc"), Some(("id1", "a")));
        assert_eq!(snapshot.first_tagged("missing"), None);
    }
}
