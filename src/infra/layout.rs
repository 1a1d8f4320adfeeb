use crate::domain::{is_artifact_file_name, profile_name};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

const BIN_DIR: &str = "bin";
const PROFILES_DIR: &str = "profiles";
const DEFAULT_PROFILE: &str = "default";
const ARTIFACT_LINK: &str = "server.jar";

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("Directory '{0}' does not exist")]
    BinMissing(String),

    #[error("failed to read {path}: {source}")]
    Read { path: String, source: io::Error },

    #[error("artifact not installed: {0}")]
    ArtifactMissing(String),

    #[error("failed to create profile {path}: {source}")]
    CreateProfile { path: String, source: io::Error },

    #[error("failed to link {link} -> {target}: {source}")]
    Link {
        link: String,
        target: String,
        source: io::Error,
    },

    #[error("no active profile, select a version first")]
    NoActiveProfile,

    #[error("profile {profile} does not match server file {artifact}")]
    ProfileMismatch { profile: String, artifact: String },
}

/// Server directory layout:
///
/// ```text
/// <root>/bin/paper-<version>-<build>.jar   downloaded artifacts
/// <root>/profiles/<artifact stem>/          per-artifact working directories
/// <root>/default -> profiles/<stem>         the active profile
/// <root>/default/server.jar -> bin/<file>   the active artifact
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ServerLayout {
    root: PathBuf,
}

impl ServerLayout {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.root.join(BIN_DIR)
    }

    pub fn profiles_dir(&self) -> PathBuf {
        self.root.join(PROFILES_DIR)
    }

    pub fn default_profile(&self) -> PathBuf {
        self.root.join(DEFAULT_PROFILE)
    }

    pub fn artifact_link(&self) -> PathBuf {
        self.default_profile().join(ARTIFACT_LINK)
    }

    pub fn ensure(&self) -> io::Result<()> {
        fs::create_dir_all(&self.root)?;
        fs::create_dir_all(self.bin_dir())?;
        fs::create_dir_all(self.profiles_dir())?;
        Ok(())
    }

    pub fn list_installed(&self) -> Result<Vec<String>, LayoutError> {
        let bin = self.bin_dir();
        if !bin.is_dir() {
            return Err(LayoutError::BinMissing(bin.display().to_string()));
        }

        let read_error = |source: io::Error| LayoutError::Read {
            path: bin.display().to_string(),
            source,
        };
        let mut installed = Vec::new();
        for entry in fs::read_dir(&bin).map_err(read_error)? {
            let entry = entry.map_err(read_error)?;
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if is_artifact_file_name(&name) {
                installed.push(name);
            }
        }
        installed.sort();
        Ok(installed)
    }

    pub fn active_artifact(&self) -> Option<String> {
        link_target_name(&self.artifact_link())
    }

    pub fn active_profile(&self) -> Option<String> {
        link_target_name(&self.default_profile())
    }

    /// Makes `artifact` the active build: ensures its profile directory, points
    /// `default` at it and `default/server.jar` at the artifact. Re-applying the
    /// current selection leaves the same links in place.
    pub fn set_active(&self, artifact: &str) -> Result<String, LayoutError> {
        let source = self.bin_dir().join(artifact);
        if !source.is_file() {
            return Err(LayoutError::ArtifactMissing(artifact.to_string()));
        }

        let profile = self.profiles_dir().join(profile_name(artifact));
        fs::create_dir_all(&profile).map_err(|source| LayoutError::CreateProfile {
            path: profile.display().to_string(),
            source,
        })?;

        replace_symlink(&absolute(&profile), &self.default_profile())?;
        let link = self.artifact_link();
        replace_symlink(&absolute(&source), &link)?;

        info!(artifact, profile = %profile.display(), "active artifact updated");
        Ok(format!(
            "Symlink updated from {} -> {}",
            link.display(),
            source.display()
        ))
    }

    /// The active profile must belong to the active artifact, otherwise the
    /// server would run one build against another build's world data.
    pub fn check_profile(&self) -> Result<(), LayoutError> {
        let (Some(profile), Some(artifact)) = (self.active_profile(), self.active_artifact())
        else {
            return Err(LayoutError::NoActiveProfile);
        };
        if !artifact.contains(&profile) {
            return Err(LayoutError::ProfileMismatch { profile, artifact });
        }
        Ok(())
    }
}

fn link_target_name(link: &Path) -> Option<String> {
    let target = fs::read_link(link).ok()?;
    target
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

fn replace_symlink(target: &Path, link: &Path) -> Result<(), LayoutError> {
    let link_error = |source: io::Error| LayoutError::Link {
        link: link.display().to_string(),
        target: target.display().to_string(),
        source,
    };

    match fs::symlink_metadata(link) {
        Ok(meta) if meta.is_dir() => fs::remove_dir(link).map_err(link_error)?,
        Ok(_) => fs::remove_file(link).map_err(link_error)?,
        Err(error) if error.kind() == io::ErrorKind::NotFound => {}
        Err(error) => return Err(link_error(error)),
    }

    create_symlink(target, link).map_err(link_error)
}

#[cfg(unix)]
fn create_symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn create_symlink(target: &Path, link: &Path) -> io::Result<()> {
    if target.is_dir() {
        std::os::windows::fs::symlink_dir(target, link)
    } else {
        std::os::windows::fs::symlink_file(target, link)
    }
}
