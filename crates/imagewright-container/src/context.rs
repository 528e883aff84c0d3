//! ビルドコンテキストの作成

use crate::error::Result;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::path::Path;
use tar::Builder;

/// 警告を出すコンテキストサイズ
const MAX_CONTEXT_SIZE: usize = 500 * 1024 * 1024;

/// Archive `context_dir` as a tar.gz build context.
///
/// The descriptor is stored as `Dockerfile` at the archive root regardless of
/// its name on disk.
pub fn create_context(context_dir: &Path, dockerfile: &Path) -> Result<Vec<u8>> {
    tracing::debug!(context = %context_dir.display(), "Creating build context");

    let dockerfile_content = std::fs::read(dockerfile)?;
    let dockerfile_name = dockerfile.file_name();

    let mut archive_data = Vec::new();
    {
        let encoder = GzEncoder::new(&mut archive_data, Compression::default());
        let mut tar = Builder::new(encoder);

        for entry in std::fs::read_dir(context_dir)? {
            let entry = entry?;
            let name = entry.file_name();
            // 一時 Dockerfile は下で固定名として追加する
            if Some(name.as_os_str()) == dockerfile_name {
                continue;
            }
            let path = entry.path();
            if entry.file_type()?.is_dir() {
                tar.append_dir_all(&name, &path)?;
            } else {
                tar.append_path_with_name(&path, &name)?;
            }
        }

        let mut header = tar::Header::new_gnu();
        header.set_size(dockerfile_content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        tar.append_data(&mut header, "Dockerfile", &dockerfile_content[..])?;

        tar.into_inner()?.finish()?;
    }

    tracing::debug!(bytes = archive_data.len(), "Build context created");
    check_context_size(archive_data.len());

    Ok(archive_data)
}

fn check_context_size(size: usize) {
    if size > MAX_CONTEXT_SIZE {
        tracing::warn!(
            "ビルドコンテキストが大きすぎます（{}MB）。成果物ディレクトリの内容を確認してください。",
            size / 1024 / 1024
        );
    }
}
