use async_trait::async_trait;
use imagewright_core::{
    Attempt, BuildAdapter, BuildpackImage, Descriptor, DescriptorRenderer, ImageMaterializer,
    ImageRecord, PackagedArtifact, Result,
};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Tracks how many callers are inside a section at once
#[derive(Default)]
pub struct Gauge {
    current: AtomicUsize,
    max: AtomicUsize,
}

impl Gauge {
    fn enter(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.max.fetch_max(now, Ordering::SeqCst);
    }

    fn leave(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn max(&self) -> usize {
        self.max.load(Ordering::SeqCst)
    }
}

/// Mutating registry calls, in the order they were made
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    AddTag {
        image_id: String,
        from: String,
        to: String,
    },
    Build {
        service: String,
        tag: String,
    },
    Delete {
        image: String,
    },
}

/// In-memory registry: image id → repo tags
#[derive(Default)]
pub struct FakeRegistry {
    images: Mutex<BTreeMap<String, BTreeSet<String>>>,
    calls: Mutex<Vec<Call>>,
    next_id: AtomicUsize,
    failing_tags: Mutex<HashSet<String>>,
    fail_deletes: Mutex<bool>,
    fail_builds: Mutex<bool>,
    list_delay: Mutex<Option<Duration>>,
    listings: AtomicUsize,
    /// Listings beyond this count fail
    listing_limit: Mutex<Option<usize>>,
    pub listing_gauge: Gauge,
}

impl FakeRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_image(self: Arc<Self>, id: &str, repo_tags: &[&str]) -> Arc<Self> {
        self.images
            .lock()
            .unwrap()
            .entry(id.to_string())
            .or_default()
            .extend(repo_tags.iter().map(|t| t.to_string()));
        self
    }

    /// Stores a new identity carrying `repo_tag`, moving the tag if it existed.
    pub fn store_new_image(&self, repo_tag: &str) -> String {
        let id = format!("sha256:new{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        let mut images = self.images.lock().unwrap();
        for tags in images.values_mut() {
            tags.remove(repo_tag);
        }
        images
            .entry(id.clone())
            .or_default()
            .insert(repo_tag.to_string());
        id
    }

    pub fn fail_tag(&self, repo_tag: &str) {
        self.failing_tags
            .lock()
            .unwrap()
            .insert(repo_tag.to_string());
    }

    pub fn fail_deletes(&self) {
        *self.fail_deletes.lock().unwrap() = true;
    }

    pub fn fail_builds(&self) {
        *self.fail_builds.lock().unwrap() = true;
    }

    pub fn slow_listing(&self, delay: Duration) {
        *self.list_delay.lock().unwrap() = Some(delay);
    }

    pub fn fail_listing_after(&self, successful: usize) {
        *self.listing_limit.lock().unwrap() = Some(successful);
    }

    pub fn listings(&self) -> usize {
        self.listings.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn tags_of(&self, id: &str) -> BTreeSet<String> {
        self.images
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn id_of(&self, repo_tag: &str) -> Option<String> {
        self.images
            .lock()
            .unwrap()
            .iter()
            .find(|(_, tags)| tags.contains(repo_tag))
            .map(|(id, _)| id.clone())
    }
}

#[async_trait]
impl ImageMaterializer for FakeRegistry {
    async fn list_images(&self) -> Result<Vec<ImageRecord>> {
        let nth = self.listings.fetch_add(1, Ordering::SeqCst);
        self.listing_gauge.enter();
        let delay = *self.list_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.listing_gauge.leave();

        if let Some(limit) = *self.listing_limit.lock().unwrap() {
            if nth >= limit {
                return Err(imagewright_core::Error::registry("list", "daemon unavailable"));
            }
        }
        Ok(self
            .images
            .lock()
            .unwrap()
            .iter()
            .map(|(id, tags)| ImageRecord::new(id.clone(), tags.iter().cloned()))
            .collect())
    }

    async fn add_tag(&self, image_id: &str, existing_repo_tag: &str, new_repo_tag: &str) -> Result<()> {
        self.calls.lock().unwrap().push(Call::AddTag {
            image_id: image_id.to_string(),
            from: existing_repo_tag.to_string(),
            to: new_repo_tag.to_string(),
        });
        if self.failing_tags.lock().unwrap().contains(new_repo_tag) {
            return Err(imagewright_core::Error::registry("tag", "refused"));
        }
        let mut images = self.images.lock().unwrap();
        for tags in images.values_mut() {
            tags.remove(new_repo_tag);
        }
        images
            .entry(image_id.to_string())
            .or_default()
            .insert(new_repo_tag.to_string());
        Ok(())
    }

    async fn build_image_from_descriptor(
        &self,
        service: &str,
        descriptor: &Descriptor,
        tag: &str,
    ) -> Result<String> {
        assert!(descriptor.path().exists());
        self.calls.lock().unwrap().push(Call::Build {
            service: service.to_string(),
            tag: tag.to_string(),
        });
        if *self.fail_builds.lock().unwrap() {
            return Err(imagewright_core::Error::registry("build", "daemon said no"));
        }
        Ok(self.store_new_image(&format!("{}:{}", service, tag)))
    }

    async fn delete_image_tag(&self, repository: &str, tag: &str) -> Result<()> {
        let image = format!("{}:{}", repository, tag);
        self.calls.lock().unwrap().push(Call::Delete {
            image: image.clone(),
        });
        if *self.fail_deletes.lock().unwrap() {
            return Err(imagewright_core::Error::registry("delete", "image in use"));
        }
        let mut images = self.images.lock().unwrap();
        for tags in images.values_mut() {
            tags.remove(&image);
        }
        images.retain(|_, tags| !tags.is_empty());
        Ok(())
    }
}

/// Scripted build tool
pub struct FakeBuildTool {
    registry: Arc<FakeRegistry>,
    services: BTreeSet<String>,
    buildpack: HashMap<String, Attempt<BuildpackImage>>,
    artifacts: HashMap<String, Attempt<PackagedArtifact>>,
    /// Buildpack builds that report success without storing an image
    ghosts: HashSet<String>,
    build_delay: Option<Duration>,
    pub build_gauge: Gauge,
}

impl FakeBuildTool {
    pub fn new(registry: Arc<FakeRegistry>, services: &[&str]) -> Self {
        Self {
            registry,
            services: services.iter().map(|s| s.to_string()).collect(),
            buildpack: HashMap::new(),
            artifacts: HashMap::new(),
            ghosts: HashSet::new(),
            build_delay: None,
            build_gauge: Gauge::default(),
        }
    }

    pub fn slow_builds(mut self, delay: Duration) -> Self {
        self.build_delay = Some(delay);
        self
    }

    pub fn buildpack(mut self, service: &str, repository: &str, tag: &str) -> Self {
        self.buildpack.insert(
            service.to_string(),
            Attempt::Success(BuildpackImage {
                repository: repository.to_string(),
                tag: tag.to_string(),
            }),
        );
        self
    }

    pub fn buildpack_fails(mut self, service: &str, reason: &str) -> Self {
        self.buildpack
            .insert(service.to_string(), Attempt::failed(reason));
        self
    }

    pub fn ghost_buildpack(mut self, service: &str, tag: &str) -> Self {
        self.ghosts.insert(service.to_string());
        self.buildpack(service, service, tag)
    }

    pub fn artifact(mut self, service: &str, dir: &std::path::Path) -> Self {
        self.artifacts.insert(
            service.to_string(),
            Attempt::Success(PackagedArtifact::new(dir, format!("{}.jar", service))),
        );
        self
    }

    pub fn artifact_fails(mut self, service: &str, reason: &str) -> Self {
        self.artifacts
            .insert(service.to_string(), Attempt::failed(reason));
        self
    }
}

#[async_trait]
impl BuildAdapter for FakeBuildTool {
    fn tool_name(&self) -> &str {
        "fake"
    }

    fn is_valid_service(&self, service: &str) -> bool {
        self.services.contains(&service.to_lowercase())
    }

    fn services(&self) -> Vec<String> {
        self.services.iter().cloned().collect()
    }

    async fn create_image_from_buildpack(&self, service: &str) -> Attempt<BuildpackImage> {
        self.build_gauge.enter();
        if let Some(delay) = self.build_delay {
            tokio::time::sleep(delay).await;
        }
        self.build_gauge.leave();

        let attempt = self
            .buildpack
            .get(service)
            .cloned()
            .unwrap_or(Attempt::NotApplicable);
        if let Attempt::Success(image) = &attempt {
            if !self.ghosts.contains(service) {
                self.registry
                    .store_new_image(&format!("{}:{}", image.repository, image.tag));
            }
        }
        attempt
    }

    async fn create_packaged_artifact(&self, service: &str) -> Attempt<PackagedArtifact> {
        self.artifacts
            .get(service)
            .cloned()
            .unwrap_or(Attempt::NotApplicable)
    }
}

/// Writes the artifact name into a temp file
pub struct FakeRenderer;

impl DescriptorRenderer for FakeRenderer {
    fn render(&self, _service: &str, artifact: &PackagedArtifact) -> Result<Descriptor> {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "COPY {} application.jar", artifact.file_name)?;
        Ok(Descriptor::new(file, artifact.dir.clone()))
    }
}
