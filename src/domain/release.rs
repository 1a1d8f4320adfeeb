use serde::Deserialize;

const ARTIFACT_PREFIX: &str = "paper";
const ARTIFACT_EXTENSION: &str = ".jar";

/// Project-level release metadata: the version groups offered for install and
/// every concrete version that belongs to one of them.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct Catalog {
    #[serde(default)]
    pub version_groups: Vec<String>,
    #[serde(default)]
    pub versions: Vec<String>,
}

impl Catalog {
    /// Versions that belong to `group`, in catalog order.
    ///
    /// A version belongs to a group when it equals the group or continues it
    /// with a `.` or `-` separator, so `1.2` never claims `1.20.4`.
    pub fn versions_in(&self, group: &str) -> Vec<String> {
        self.versions
            .iter()
            .filter(|version| version_in_group(version, group))
            .cloned()
            .collect()
    }
}

fn version_in_group(version: &str, group: &str) -> bool {
    let Some(rest) = version.strip_prefix(group) else {
        return false;
    };
    rest.is_empty() || rest.starts_with('.') || rest.starts_with('-')
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct BuildList {
    #[serde(default)]
    pub builds: Vec<u32>,
}

impl BuildList {
    pub fn newest_first(&self) -> Vec<u32> {
        let mut builds = self.builds.clone();
        builds.reverse();
        builds
    }
}

pub fn artifact_file_name(version: &str, build: u32) -> String {
    format!("{ARTIFACT_PREFIX}-{version}-{build}{ARTIFACT_EXTENSION}")
}

pub fn is_artifact_file_name(name: &str) -> bool {
    name.starts_with(ARTIFACT_PREFIX) && name.ends_with(ARTIFACT_EXTENSION)
}

/// Profile directory name for an artifact: the file name without `.jar`.
pub fn profile_name(artifact: &str) -> &str {
    artifact.strip_suffix(ARTIFACT_EXTENSION).unwrap_or(artifact)
}
