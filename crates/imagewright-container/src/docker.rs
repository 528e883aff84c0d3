//! Docker Engine API 経由のイメージ操作

use crate::context::create_context;
use crate::error::{ContainerError, Result};
use async_trait::async_trait;
use bollard::Docker;
use bollard::query_parameters::{
    BuildImageOptionsBuilder, ListImagesOptions, RemoveImageOptions, TagImageOptionsBuilder,
};
use bytes::Bytes;
use futures_util::stream::StreamExt;
use http_body_util::{Either, Full};
use imagewright_core::{Descriptor, ImageMaterializer, ImageRecord, split_repo_tag};
use tracing::{debug, info};

/// Docker API のタイムアウト (秒)
const DOCKER_TIMEOUT_SECS: u64 = 120;

/// Connect to the daemon.
///
/// `host` accepts `unix://`, `tcp://` and `http://` addresses. Without a host
/// the local defaults apply (`DOCKER_HOST`, then the platform socket).
pub fn connect(host: Option<&str>) -> Result<Docker> {
    let docker = match host {
        None => Docker::connect_with_local_defaults(),
        Some(host) if host.starts_with("unix://") => {
            Docker::connect_with_socket(host, DOCKER_TIMEOUT_SECS, bollard::API_DEFAULT_VERSION)
        }
        Some(host) if host.starts_with("tcp://") || host.starts_with("http://") => {
            Docker::connect_with_http(host, DOCKER_TIMEOUT_SECS, bollard::API_DEFAULT_VERSION)
        }
        Some(other) => return Err(ContainerError::InvalidHost(other.to_string())),
    };
    docker.map_err(|e| ContainerError::DockerConnectionFailed(e.to_string()))
}

/// Image registry backed by the local Docker daemon
pub struct DockerMaterializer {
    docker: Docker,
}

impl DockerMaterializer {
    pub fn new(docker: Docker) -> Self {
        Self { docker }
    }

    pub fn connect(host: Option<&str>) -> Result<Self> {
        Ok(Self::new(connect(host)?))
    }

    /// Verify the daemon answers.
    pub async fn ping(&self) -> Result<()> {
        self.docker
            .ping()
            .await
            .map_err(|e| ContainerError::DockerConnectionFailed(e.to_string()))?;
        Ok(())
    }

    async fn images(&self) -> Result<Vec<ImageRecord>> {
        let summaries = self
            .docker
            .list_images(None::<ListImagesOptions>)
            .await?;
        Ok(summaries
            .into_iter()
            .map(|s| ImageRecord::new(s.id, s.repo_tags))
            .collect())
    }

    async fn tag(&self, image_id: &str, new_repo_tag: &str) -> Result<()> {
        let (repository, tag) = split_repo_tag(new_repo_tag);
        let options = TagImageOptionsBuilder::default()
            .repo(&repository)
            .tag(&tag)
            .build();
        self.docker.tag_image(image_id, Some(options)).await?;
        Ok(())
    }

    async fn build(&self, descriptor: &Descriptor, repo_tag: &str) -> Result<String> {
        let context_data = create_context(descriptor.context_dir(), descriptor.path())?;
        info!(image = %repo_tag, "Building image");

        let options = BuildImageOptionsBuilder::default()
            .dockerfile("Dockerfile")
            .t(repo_tag)
            .rm(true)
            .forcerm(true)
            .build();

        let body = Full::new(Bytes::from(context_data));
        let mut stream = self
            .docker
            .build_image(options, None, Some(Either::Left(body)));

        let mut image_id = None;
        while let Some(msg) = stream.next().await {
            let output = msg?;
            if let Some(line) = output.stream.as_deref() {
                let line = line.trim_end();
                if !line.is_empty() {
                    debug!(image = %repo_tag, "{}", line);
                }
            }
            if let Some(error) = output.error {
                return Err(ContainerError::BuildFailed(error));
            }
            if let Some(detail) = output.error_detail {
                return Err(ContainerError::BuildFailed(
                    detail
                        .message
                        .unwrap_or_else(|| "Unknown build error".to_string()),
                ));
            }
            if let Some(id) = output.aux.and_then(|aux| aux.id) {
                image_id = Some(id);
            }
        }

        let image_id = match image_id {
            Some(id) => id,
            None => self.inspect_id(repo_tag).await?,
        };
        info!(image = %repo_tag, id = %image_id, "Successfully built");
        Ok(image_id)
    }

    async fn inspect_id(&self, image: &str) -> Result<String> {
        let inspect = self.docker.inspect_image(image).await?;
        inspect.id.ok_or_else(|| ContainerError::ImageNotFound {
            image: image.to_string(),
        })
    }

    async fn remove(&self, repo_tag: &str) -> Result<()> {
        let removed = self
            .docker
            .remove_image(repo_tag, None::<RemoveImageOptions>, None)
            .await?;
        debug!(image = %repo_tag, entries = removed.len(), "Removed image tag");
        Ok(())
    }
}

#[async_trait]
impl ImageMaterializer for DockerMaterializer {
    async fn list_images(&self) -> imagewright_core::Result<Vec<ImageRecord>> {
        self.images().await.map_err(|e| e.into_registry("list"))
    }

    async fn add_tag(
        &self,
        image_id: &str,
        existing_repo_tag: &str,
        new_repo_tag: &str,
    ) -> imagewright_core::Result<()> {
        debug!(
            image_id = %image_id,
            from = %existing_repo_tag,
            to = %new_repo_tag,
            "Tagging image"
        );
        self.tag(image_id, new_repo_tag)
            .await
            .map_err(|e| e.into_registry("tag"))
    }

    async fn build_image_from_descriptor(
        &self,
        service: &str,
        descriptor: &Descriptor,
        tag: &str,
    ) -> imagewright_core::Result<String> {
        self.build(descriptor, &format!("{}:{}", service, tag))
            .await
            .map_err(|e| e.into_registry("build"))
    }

    async fn delete_image_tag(&self, repository: &str, tag: &str) -> imagewright_core::Result<()> {
        self.remove(&format!("{}:{}", repository, tag))
            .await
            .map_err(|e| e.into_registry("delete"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_host_scheme() {
        let result = connect(Some("ssh://builder@example.com"));
        assert!(matches!(result, Err(ContainerError::InvalidHost(_))));
    }

    #[test]
    fn test_tcp_host_is_accepted() {
        // 接続は遅延されるので、クライアントの作成だけなら Docker 不要
        assert!(connect(Some("tcp://127.0.0.1:2375")).is_ok());
    }

    #[tokio::test]
    #[ignore] // Docker接続が必要なため、通常のテストではスキップ
    async fn test_build_tag_and_delete() {
        use imagewright_core::PackagedArtifact;
        use std::io::Write;

        let materializer = DockerMaterializer::connect(None).unwrap();
        materializer.ping().await.unwrap();

        let dir = tempfile::tempdir().unwrap();
        let mut file = tempfile::Builder::new()
            .prefix("Dockerfile")
            .tempfile_in(dir.path())
            .unwrap();
        writeln!(file, "FROM alpine:latest\nCMD echo 'test'").unwrap();
        let artifact = PackagedArtifact::new(dir.path(), "unused.jar");
        let descriptor = Descriptor::new(file, artifact.dir.clone());

        let id = materializer
            .build_image_from_descriptor("imagewright-test", &descriptor, "latest")
            .await
            .unwrap();
        materializer
            .add_tag(&id, "imagewright-test:latest", "imagewright-test:v1")
            .await
            .unwrap();

        let images = materializer.list_images().await.unwrap();
        let record = images.iter().find(|r| r.id == id).unwrap();
        assert!(record.repo_tags.contains(&"imagewright-test:v1".to_string()));

        materializer
            .delete_image_tag("imagewright-test", "v1")
            .await
            .unwrap();
        materializer
            .delete_image_tag("imagewright-test", "latest")
            .await
            .unwrap();
    }
}
