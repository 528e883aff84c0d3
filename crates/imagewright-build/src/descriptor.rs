//! Dockerfile の生成
//!
//! パッケージ済み JAR からマルチステージの Dockerfile を Tera で描画し、
//! 成果物ディレクトリ内の一時ファイルに書き出す。

use crate::error::Result;
use imagewright_core::{Descriptor, DescriptorRenderer, PackagedArtifact};
use std::io::Write;
use std::path::Path;
use tera::{Context, Tera};
use tracing::debug;

pub const DEFAULT_BUILDER_IMAGE: &str = "eclipse-temurin:17.0.2_8-jdk-alpine";
pub const DEFAULT_RUNTIME_IMAGE: &str = "eclipse-temurin:17.0.2_8-jre-alpine";

const TEMPLATE_NAME: &str = "Dockerfile";

/// Layered Spring Boot image: the jar is exploded in a builder stage and its
/// layers are copied into the runtime stage.
pub const DEFAULT_TEMPLATE: &str = r#"FROM {{ builder_image }} as builder
WORKDIR application
COPY {{ artifact_file_name }} application.jar
RUN jar -xf application.jar

FROM {{ runtime_image }}
LABEL org.opencontainers.image.title="{{ service }}"
WORKDIR application
COPY --from=builder application/BOOT-INF/lib ./BOOT-INF/lib
COPY --from=builder application/META-INF ./META-INF
COPY --from=builder application/org ./org
COPY --from=builder application/BOOT-INF/classes ./BOOT-INF/classes
ENTRYPOINT ["java", "org.springframework.boot.loader.JarLauncher"]
"#;

/// Dockerfile renderer
pub struct DockerfileRenderer {
    tera: Tera,
    builder_image: String,
    runtime_image: String,
}

impl DockerfileRenderer {
    pub fn new() -> Result<Self> {
        Self::from_template(DEFAULT_TEMPLATE)
    }

    /// カスタムテンプレート文字列から作成
    pub fn from_template(template: &str) -> Result<Self> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        tera.add_raw_template(TEMPLATE_NAME, template)?;
        Ok(Self {
            tera,
            builder_image: DEFAULT_BUILDER_IMAGE.to_string(),
            runtime_image: DEFAULT_RUNTIME_IMAGE.to_string(),
        })
    }

    /// テンプレートファイルから作成
    pub fn from_template_file(path: &Path) -> Result<Self> {
        let template = std::fs::read_to_string(path)?;
        debug!(path = %path.display(), "Loaded Dockerfile template");
        Self::from_template(&template)
    }

    pub fn with_images(
        mut self,
        builder_image: Option<String>,
        runtime_image: Option<String>,
    ) -> Self {
        if let Some(image) = builder_image {
            self.builder_image = image;
        }
        if let Some(image) = runtime_image {
            self.runtime_image = image;
        }
        self
    }

    pub fn render_to_string(&self, service: &str, artifact: &PackagedArtifact) -> Result<String> {
        let mut context = Context::new();
        context.insert("service", service);
        context.insert("artifact_file_name", &artifact.file_name);
        context.insert("builder_image", &self.builder_image);
        context.insert("runtime_image", &self.runtime_image);
        Ok(self.tera.render(TEMPLATE_NAME, &context)?)
    }

    fn write_descriptor(&self, service: &str, artifact: &PackagedArtifact) -> Result<Descriptor> {
        let content = self.render_to_string(service, artifact)?;
        let mut file = tempfile::Builder::new()
            .prefix(TEMPLATE_NAME)
            .tempfile_in(&artifact.dir)?;
        file.write_all(content.as_bytes())?;
        file.flush()?;

        debug!(
            service = %service,
            path = %file.path().display(),
            "Rendered Dockerfile"
        );
        Ok(Descriptor::new(file, artifact.dir.clone()))
    }
}

impl DescriptorRenderer for DockerfileRenderer {
    fn render(
        &self,
        service: &str,
        artifact: &PackagedArtifact,
    ) -> imagewright_core::Result<Descriptor> {
        Ok(self.write_descriptor(service, artifact)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_render_default_template() {
        let renderer = DockerfileRenderer::new().unwrap();
        let artifact = PackagedArtifact::new("/tmp", "orders-1.0.jar");
        let content = renderer.render_to_string("orders", &artifact).unwrap();

        assert!(content.starts_with("FROM eclipse-temurin:17.0.2_8-jdk-alpine as builder"));
        assert!(content.contains("COPY orders-1.0.jar application.jar"));
        assert!(content.contains("FROM eclipse-temurin:17.0.2_8-jre-alpine\n"));
        assert!(content.contains("org.opencontainers.image.title=\"orders\""));
    }

    #[test]
    fn test_render_with_custom_images() {
        let renderer = DockerfileRenderer::new()
            .unwrap()
            .with_images(Some("maven:3-eclipse-temurin-21".into()), None);
        let artifact = PackagedArtifact::new("/tmp", "app.jar");
        let content = renderer.render_to_string("app", &artifact).unwrap();

        assert!(content.contains("FROM maven:3-eclipse-temurin-21 as builder"));
        assert!(content.contains(DEFAULT_RUNTIME_IMAGE));
    }

    #[test]
    fn test_custom_template() {
        let renderer =
            DockerfileRenderer::from_template("FROM {{ runtime_image }}\nADD {{ artifact_file_name }} /app.jar\n")
                .unwrap();
        let artifact = PackagedArtifact::new("/tmp", "a&b.jar");
        let content = renderer.render_to_string("app", &artifact).unwrap();
        assert_eq!(
            content,
            format!("FROM {}\nADD a&b.jar /app.jar\n", DEFAULT_RUNTIME_IMAGE)
        );
    }

    #[test]
    fn test_invalid_template() {
        assert!(DockerfileRenderer::from_template("FROM {{ unclosed").is_err());
    }

    #[test]
    fn test_descriptor_written_into_artifact_dir() {
        let dir = TempDir::new().unwrap();
        let renderer = DockerfileRenderer::new().unwrap();
        let artifact = PackagedArtifact::new(dir.path(), "app.jar");

        let descriptor = renderer.render("app", &artifact).unwrap();
        let path = descriptor.path().to_path_buf();

        assert_eq!(path.parent().unwrap(), dir.path());
        assert!(
            path.file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("Dockerfile")
        );
        assert_eq!(descriptor.context_dir(), dir.path());
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("COPY app.jar application.jar"));

        drop(descriptor);
        assert!(!path.exists());
    }

    #[test]
    fn test_missing_artifact_dir_is_error() {
        let renderer = DockerfileRenderer::new().unwrap();
        let artifact = PackagedArtifact::new("/nonexistent/imagewright/target", "app.jar");
        assert!(renderer.render("app", &artifact).is_err());
    }
}
