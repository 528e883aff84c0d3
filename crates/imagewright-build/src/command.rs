//! ビルドツールのプロセス実行
//!
//! 子プロセスは `kill_on_drop` で起動するため、呼び出し側の future が
//! キャンセルされるとビルドも止まる。タイムアウトは設けない。

use crate::error::{BuildToolError, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;
use tracing::{debug, info};

/// stderr はこの行数だけエラーメッセージに含める
const STDERR_TAIL_LINES: usize = 20;

#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub success: bool,
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<OsString>,
    current_dir: Option<PathBuf>,
}

impl ToolCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// ログ用のコマンド文字列
    pub fn display(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().map(|a| a.to_string_lossy().into_owned()));
        parts.join(" ")
    }

    /// 終了ステータスに関わらず出力を返す
    pub async fn output(&self) -> Result<CommandOutput> {
        let started = Instant::now();
        let mut cmd = tokio::process::Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }

        debug!(command = %self.display(), "Running build tool");
        let output = cmd.output().await.map_err(|source| BuildToolError::Spawn {
            command: self.display(),
            source,
        })?;

        info!(
            command = %self.display(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            success = output.status.success(),
            "Command finished"
        );

        Ok(CommandOutput {
            success: output.status.success(),
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    /// 非ゼロ終了をエラーとして返す
    pub async fn run(&self) -> Result<CommandOutput> {
        let output = self.output().await?;
        if output.success {
            return Ok(output);
        }

        Err(BuildToolError::CommandFailed {
            command: self.display(),
            status: output
                .status
                .map(|code| format!("exit code {}", code))
                .unwrap_or_else(|| "signal".to_string()),
            stderr: tail(&output.stderr, STDERR_TAIL_LINES),
        })
    }
}

fn tail(text: &str, lines: usize) -> String {
    let all: Vec<&str> = text.lines().collect();
    let start = all.len().saturating_sub(lines);
    all[start..].join("\n")
}
