//! Prometheus file_sd target files
//!
//! One `{package name}.json` file per package in a directory Prometheus
//! watches. The daemon owns these files outright, so they are overwritten
//! without any version check.

use crate::error::{TargetError, TargetResult};
use async_trait::async_trait;
use monsync_types::Target;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const TARGET_EXT: &str = ".json";

/// Scrape targets currently written for one package
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageTargets {
    pub dnp_name: String,
    pub targets: Vec<Target>,
}

/// Persists the scrape targets of each package.
#[async_trait]
pub trait TargetWriter: Send + Sync {
    /// Replace the targets of a package
    async fn write_targets(&self, dnp_name: &str, targets: &[Target]) -> TargetResult<()>;

    /// Remove the targets of a package. Absent targets are not an error.
    async fn delete_targets(&self, dnp_name: &str) -> TargetResult<()>;

    /// Everything currently written, ordered by package name
    async fn list_targets(&self) -> TargetResult<Vec<PackageTargets>>;
}

/// Writes one JSON file per package into a directory
#[derive(Debug, Clone)]
pub struct FileTargetWriter {
    dir: PathBuf,
}

impl FileTargetWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn target_path(&self, dnp_name: &str) -> TargetResult<PathBuf> {
        let valid = !dnp_name.is_empty()
            && !dnp_name.starts_with('.')
            && !dnp_name.contains(['/', '\\', '\0']);
        if !valid {
            return Err(TargetError::InvalidName(dnp_name.to_string()));
        }
        Ok(self.dir.join(format!("{}{}", dnp_name, TARGET_EXT)))
    }
}

#[async_trait]
impl TargetWriter for FileTargetWriter {
    async fn write_targets(&self, dnp_name: &str, targets: &[Target]) -> TargetResult<()> {
        let path = self.target_path(dnp_name)?;
        tokio::fs::create_dir_all(&self.dir).await?;

        let tmp = self.dir.join(format!(".{}{}.tmp", dnp_name, TARGET_EXT));
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(targets)?).await?;
        tokio::fs::rename(&tmp, &path).await?;

        tracing::debug!(package = %dnp_name, count = targets.len(), "Wrote scrape targets");
        Ok(())
    }

    async fn delete_targets(&self, dnp_name: &str) -> TargetResult<()> {
        let path = self.target_path(dnp_name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(package = %dnp_name, "Deleted scrape targets");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_targets(&self) -> TargetResult<Vec<PackageTargets>> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut listed = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let file_name = entry.file_name();
            let Some(dnp_name) = file_name
                .to_str()
                .filter(|name| !name.starts_with('.'))
                .and_then(|name| name.strip_suffix(TARGET_EXT))
            else {
                continue;
            };

            let bytes = tokio::fs::read(entry.path()).await?;
            match serde_json::from_slice(&bytes) {
                Ok(targets) => listed.push(PackageTargets {
                    dnp_name: dnp_name.to_string(),
                    targets,
                }),
                Err(e) => {
                    tracing::warn!(file = ?entry.path(), error = %e, "Skipping unreadable target file");
                }
            }
        }

        listed.sort_by(|a, b| a.dnp_name.cmp(&b.dnp_name));
        Ok(listed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prysm_targets() -> Vec<Target> {
        vec![Target::new(vec!["prysm.dappnode:8080".to_string()]).with_job("prysm")]
    }

    #[tokio::test]
    async fn test_write_and_list() {
        let dir = tempfile::tempdir().unwrap();
        let writer = FileTargetWriter::new(dir.path());

        writer
            .write_targets("prysm.dnp.dappnode.eth", &prysm_targets())
            .await
            .unwrap();

        let raw: serde_json::Value = serde_json::from_slice(
            &std::fs::read(dir.path().join("prysm.dnp.dappnode.eth.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(raw[0]["targets"][0], "prysm.dappnode:8080");
        assert_eq!(raw[0]["labels"]["job"], "prysm");

        let listed = writer.list_targets().await.unwrap();
        assert_eq!(
            listed,
            vec![PackageTargets {
                dnp_name: "prysm.dnp.dappnode.eth".to_string(),
                targets: prysm_targets(),
            }]
        );
    }

    #[tokio::test]
    async fn test_overwrite_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let writer = FileTargetWriter::new(dir.path());

        writer
            .write_targets("prysm.dnp.dappnode.eth", &prysm_targets())
            .await
            .unwrap();
        writer.write_targets("prysm.dnp.dappnode.eth", &[]).await.unwrap();

        let listed = writer.list_targets().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert!(listed[0].targets.is_empty());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let writer = FileTargetWriter::new(dir.path());

        writer
            .write_targets("prysm.dnp.dappnode.eth", &prysm_targets())
            .await
            .unwrap();
        writer.delete_targets("prysm.dnp.dappnode.eth").await.unwrap();
        writer.delete_targets("prysm.dnp.dappnode.eth").await.unwrap();

        assert!(writer.list_targets().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejects_unsafe_names() {
        let dir = tempfile::tempdir().unwrap();
        let writer = FileTargetWriter::new(dir.path());

        for name in ["", ".hidden", "../escape", "a/b", "a\\b"] {
            let err = writer.write_targets(name, &prysm_targets()).await.unwrap_err();
            assert!(matches!(err, TargetError::InvalidName(_)), "{name:?}");
        }
    }

    #[tokio::test]
    async fn test_list_missing_dir_and_skips_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        let writer = FileTargetWriter::new(dir.path().join("absent"));
        assert!(writer.list_targets().await.unwrap().is_empty());

        let writer = FileTargetWriter::new(dir.path());
        std::fs::write(dir.path().join("notes.txt"), "hello").unwrap();
        std::fs::write(dir.path().join("broken.json"), "{").unwrap();
        writer
            .write_targets("geth.dnp.dappnode.eth", &[Target::new(vec!["geth:6060".to_string()])])
            .await
            .unwrap();

        let names: Vec<_> = writer
            .list_targets()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.dnp_name)
            .collect();
        assert_eq!(names, ["geth.dnp.dappnode.eth"]);
    }
}
