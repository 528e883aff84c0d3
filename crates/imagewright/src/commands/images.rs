use crate::app::{self, AppOptions};
use colored::Colorize;
use imagewright_core::{ImageSnapshot, SnapshotProvider, normalize_repository};

/// 表示用に短縮したイメージ ID
fn short_id(id: &str) -> &str {
    let id = id.strip_prefix("sha256:").unwrap_or(id);
    &id[..id.len().min(12)]
}

pub async fn handle(
    options: &AppOptions,
    repository: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let settings = options.load_settings()?;
    let materializer = app::connect_docker(&settings).await?;
    let snapshot = SnapshotProvider::new(&materializer).take().await?;

    let filter = repository.map(normalize_repository);
    let view = match &filter {
        Some(repository) => snapshot
            .identities(repository)
            .map(|ids| {
                ids.iter().fold(ImageSnapshot::empty(), |acc, (id, tags)| {
                    acc.with_image(repository, id, tags.iter().cloned())
                })
            })
            .unwrap_or_default(),
        None => (*snapshot).clone(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    if view.is_empty() {
        println!("{}", "イメージはありません".dimmed());
        return Ok(());
    }

    for (repository, identities) in view.iter() {
        println!("{}", repository.cyan().bold());
        for (id, tags) in identities {
            let tags = tags.iter().map(String::as_str).collect::<Vec<_>>().join(", ");
            println!("  {}  {}", short_id(id).dimmed(), tags.green());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("sha256:0123456789abcdef0123"), "0123456789ab");
        assert_eq!(short_id("abc"), "abc");
    }
}
