use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::process::Command;

use super::{ProviderOutput, VersionControl};

/// Version control through the `git` executable.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: String,
}

impl GitCli {
    pub fn new() -> Self {
        Self {
            program: "git".to_string(),
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        // Never block waiting for credentials.
        cmd.env("GIT_TERMINAL_PROMPT", "0");
        cmd.kill_on_drop(true);
        cmd
    }
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VersionControl for GitCli {
    async fn clone_repo(&self, url: &str, branch: &str, dest: &Path) -> Result<ProviderOutput> {
        tracing::debug!("git clone {} ({}) into {}", url, branch, dest.display());

        let output = self
            .command()
            .args(["clone", "--depth", "1", "--branch", branch, "--"])
            .arg(url)
            .arg(dest)
            .output()
            .await
            .context("run git clone")?;

        Ok(ProviderOutput::from_process(&output))
    }

    async fn pull(&self, path: &Path) -> Result<ProviderOutput> {
        tracing::debug!("git pull in {}", path.display());

        let output = self
            .command()
            .arg("-C")
            .arg(path)
            .args(["pull", "--ff-only"])
            .output()
            .await
            .context("run git pull")?;

        Ok(ProviderOutput::from_process(&output))
    }

    async fn last_commit(&self, path: &Path) -> Result<Option<String>> {
        let output = self
            .command()
            .arg("-C")
            .arg(path)
            .args(["log", "-1", "--format=%h %s (%cr)"])
            .output()
            .await
            .context("run git log")?;

        if !output.status.success() {
            return Ok(None);
        }
        let line = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok((!line.is_empty()).then_some(line))
    }
}
