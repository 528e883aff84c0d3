//! Gradle プロジェクト索引
//!
//! `settings.gradle(.kts)` からプロジェクト一覧を作り、`tasks --all` の
//! 出力で各プロジェクトのタスクを埋める。

use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// One Gradle project (root or subproject)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradleProject {
    pub name: String,
    /// Gradle path: `:` for the root project, `:a:b` for subprojects
    pub path: String,
    pub dir: PathBuf,
    pub tasks: BTreeSet<String>,
}

impl GradleProject {
    fn new(name: impl Into<String>, path: impl Into<String>, dir: PathBuf) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            dir,
            tasks: BTreeSet::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.path == ":"
    }

    /// Fully qualified task path, e.g. `:app:bootJar`
    pub fn task_path(&self, task: &str) -> String {
        if self.is_root() {
            format!(":{}", task)
        } else {
            format!("{}:{}", self.path, task)
        }
    }

    pub fn has_task(&self, task: &str) -> bool {
        self.tasks.contains(task)
    }
}

/// Projects keyed by lowercase name
#[derive(Debug, Clone, Default)]
pub struct GradleIndex {
    projects: BTreeMap<String, GradleProject>,
}

static ROOT_NAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"rootProject\.name\s*=\s*["']([^"']+)["']"#).expect("Invalid root name regex")
});

/// `include 'a', 'b'` の行、または複数行にまたがる `include(...)` ブロック
static INCLUDE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*include\b\s*(?:\(([^)]*)\)|(.*)$)").expect("Invalid include regex")
});

static QUOTED_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"["']([^"']+)["']"#).expect("Invalid quoted regex"));

/// `app:bootJar - Assembles an executable jar ...` → (`app:`, `bootJar`)
static TASK_LINE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^((?:[A-Za-z0-9_.\-]+:)*)([A-Za-z][A-Za-z0-9_\-]*)(?:\s+-\s.*)?$")
        .expect("Invalid task line regex")
});

impl GradleIndex {
    /// Build the project list from the settings script.
    ///
    /// Without settings the root directory is a single-project build.
    pub fn from_settings(root: &Path, settings: Option<&str>) -> Self {
        let root_name = settings
            .and_then(|s| ROOT_NAME_REGEX.captures(s))
            .map(|c| c[1].to_string())
            .or_else(|| {
                root.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
            })
            .unwrap_or_else(|| "root".to_string());

        let mut index = Self::default();
        index.insert(GradleProject::new(root_name, ":", root.to_path_buf()));

        for include in settings.map(parse_includes).unwrap_or_default() {
            let relative = include.trim_start_matches(':');
            if relative.is_empty() {
                continue;
            }
            let name = relative.rsplit(':').next().unwrap_or(relative);
            let dir = root.join(relative.replace(':', "/"));
            index.insert(GradleProject::new(name, format!(":{}", relative), dir));
        }

        index
    }

    fn insert(&mut self, project: GradleProject) {
        self.projects.insert(project.name.to_lowercase(), project);
    }

    /// Attach tasks listed by `gradle tasks --all`.
    ///
    /// Lines name tasks either unqualified (root project) or prefixed with the
    /// project path without its leading colon (`app:bootJar`).
    pub fn add_tasks(&mut self, output: &str) {
        for line in output.lines().map(str::trim_end) {
            let Some(captures) = TASK_LINE_REGEX.captures(line) else {
                continue;
            };
            let prefix = captures[1].trim_end_matches(':');
            let path = format!(":{}", prefix);
            let task = captures[2].to_string();

            // settings から読めなかったプロジェクトもタスク一覧から補う
            if !self.projects.values().any(|p| p.path == path) {
                let Some(root) = self.root_dir() else {
                    continue;
                };
                let name = prefix.rsplit(':').next().unwrap_or(prefix);
                let dir = root.join(prefix.replace(':', "/"));
                self.insert(GradleProject::new(name, path.clone(), dir));
            }
            if let Some(project) = self.projects.values_mut().find(|p| p.path == path) {
                project.tasks.insert(task);
            }
        }
    }

    fn root_dir(&self) -> Option<PathBuf> {
        self.projects
            .values()
            .find(|p| p.is_root())
            .map(|p| p.dir.clone())
    }

    pub fn get(&self, name: &str) -> Option<&GradleProject> {
        self.projects.get(&name.to_lowercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> Vec<String> {
        self.projects.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }
}

/// Collect the project paths named by `include` statements.
fn parse_includes(settings: &str) -> Vec<String> {
    INCLUDE_REGEX
        .captures_iter(settings)
        .flat_map(|statement| {
            let args = statement
                .get(1)
                .or_else(|| statement.get(2))
                .map_or("", |m| m.as_str());
            QUOTED_REGEX
                .captures_iter(args)
                .map(|c| c[1].to_string())
                .collect::<Vec<_>>()
        })
        .collect()
}
