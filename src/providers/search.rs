use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;

use super::{ContentSearch, SearchMatch};

/// Content search through the `rg` (ripgrep) executable.
///
/// The query is matched literally, not as a regular expression. Output is read
/// line by line and the process is killed once `limit` matches are collected.
#[derive(Debug, Clone)]
pub struct RipgrepSearch {
    program: String,
}

impl RipgrepSearch {
    pub fn new() -> Self {
        Self {
            program: "rg".to_string(),
        }
    }
}

impl Default for RipgrepSearch {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentSearch for RipgrepSearch {
    async fn search(
        &self,
        dir: &Path,
        query: &str,
        include: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SearchMatch>> {
        let mut cmd = Command::new(&self.program);
        cmd.args([
            "--no-heading",
            "--line-number",
            "--null",
            "--color",
            "never",
            "--ignore-case",
            "--fixed-strings",
        ]);
        if let Some(glob) = include.filter(|g| !g.is_empty()) {
            cmd.args(["--glob", glob]);
        }
        cmd.arg("--").arg(query).arg(dir);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::debug!("rg '{}' in {} (limit {})", query, dir.display(), limit);
        let mut child = cmd.spawn().context("run rg")?;

        let stdout = child.stdout.take().context("rg stdout not captured")?;
        let mut stderr = child.stderr.take().context("rg stderr not captured")?;
        let stderr_task = tokio::spawn(async move {
            let mut text = String::new();
            let _ = stderr.read_to_string(&mut text).await;
            text
        });

        let (matches, complete) = collect_matches(BufReader::new(stdout), limit).await?;
        if !complete {
            // Enough lines; the rest of the output is not needed.
            let _ = child.kill().await;
            return Ok(matches);
        }

        let status = child.wait().await.context("wait for rg")?;
        let stderr = stderr_task.await.unwrap_or_default();
        // 1 means no matches; 2 means an error, possibly alongside partial results.
        match status.code() {
            Some(0) | Some(1) => Ok(matches),
            _ if !matches.is_empty() => Ok(matches),
            _ => anyhow::bail!("rg failed: {}", stderr.trim()),
        }
    }
}

/// Read `rg` output until it ends or `limit` matches are parsed.
///
/// The flag is false when reading stopped at the limit.
async fn collect_matches<R>(mut reader: R, limit: usize) -> Result<(Vec<SearchMatch>, bool)>
where
    R: AsyncBufRead + Unpin,
{
    let mut matches = Vec::new();
    let mut buf = Vec::new();
    while matches.len() < limit {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .await
            .context("read rg output")?;
        if read == 0 {
            return Ok((matches, true));
        }
        let line = String::from_utf8_lossy(&buf);
        if let Some(parsed) = parse_line(line.trim_end_matches(['\n', '\r'])) {
            matches.push(parsed);
        }
    }
    Ok((matches, false))
}

/// Parse `path\0line:text` as printed with `--null --line-number`.
fn parse_line(line: &str) -> Option<SearchMatch> {
    let (path, rest) = line.split_once('\0')?;
    let (number, text) = rest.split_once(':')?;
    Some(SearchMatch {
        path: PathBuf::from(path),
        line: number.parse().ok()?,
        text: text.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_null_separated_output() {
        let parsed = parse_line("/repo/docs/intro.md\u{0}12:Reactive: declarations").unwrap();
        assert_eq!(parsed.path, PathBuf::from("/repo/docs/intro.md"));
        assert_eq!(parsed.line, 12);
        assert_eq!(parsed.text, "Reactive: declarations");
    }

    #[tokio::test]
    async fn stops_reading_at_the_limit() {
        let output = b"/r/a.md\x001:one\n/r/a.md\x002:two\n/r/b.md\x007:three\n";

        let (matches, complete) = collect_matches(&output[..], 2).await.unwrap();

        assert!(!complete);
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[1].text, "two");
    }

    #[tokio::test]
    async fn reads_everything_below_the_limit() {
        let output = b"garbage\n/r/a.md\x003:only match\r\n";

        let (matches, complete) = collect_matches(&output[..], 50).await.unwrap();

        assert!(complete);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].line, 3);
        assert_eq!(matches[0].text, "only match");
    }

    #[test]
    fn skips_malformed_lines() {
        assert!(parse_line("no separators here").is_none());
        assert!(parse_line("/repo/a.md\u{0}not-a-number:text").is_none());
    }
}
