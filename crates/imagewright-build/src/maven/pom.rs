//! pom.xml の最小限の読み取り
//!
//! 完全な XML 解析はせず、モジュール索引に必要な要素だけを拾う。

use regex::Regex;
use std::sync::LazyLock;

const SPRING_BOOT_PLUGIN: &str = "spring-boot-maven-plugin";

static PARENT_BLOCK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<parent>.*?</parent>").expect("Invalid parent regex"));

static COMMENT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("Invalid comment regex"));

static ARTIFACT_ID_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<artifactId>\s*([^<\s]+)\s*</artifactId>").expect("Invalid artifactId regex")
});

static MODULE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<module>\s*([^<]+?)\s*</module>").expect("Invalid module regex")
});

/// The parts of a POM the Maven adapter needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PomSummary {
    pub artifact_id: Option<String>,
    pub modules: Vec<String>,
    pub spring_boot_plugin: bool,
}

impl PomSummary {
    pub fn parse(content: &str) -> Self {
        let content = COMMENT_REGEX.replace_all(content, "");
        let own = PARENT_BLOCK_REGEX.replace(&content, "");

        Self {
            artifact_id: ARTIFACT_ID_REGEX
                .captures(&own)
                .map(|c| c[1].to_string()),
            modules: MODULE_REGEX
                .captures_iter(&own)
                .map(|c| c[1].to_string())
                .collect(),
            spring_boot_plugin: own.contains(SPRING_BOOT_PLUGIN),
        }
    }
}
