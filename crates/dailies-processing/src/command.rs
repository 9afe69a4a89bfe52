//! External tool invocation.
//!
//! Argument vectors are built from an insertion-ordered option map. The
//! distinguished `o` key names the output file and always becomes the final
//! bare argument. The runner streams the tool's diagnostic output line by
//! line until the stream closes and the process has exited, enforces the
//! configured timeout, and surfaces non-zero exit statuses as errors.

use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use dailies_core::{MediaError, MediaResult};
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use tokio::process::{Child, Command};

/// How many trailing diagnostic lines to carry into a failure error.
const FAILURE_DETAIL_LINES: usize = 6;

/// Value of a single option flag. A list repeats the flag once per element,
/// which is how multiple `-i` inputs are expressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    Scalar(String),
    List(Vec<String>),
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Scalar(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        OptionValue::Scalar(value)
    }
}

impl From<u32> for OptionValue {
    fn from(value: u32) -> Self {
        OptionValue::Scalar(value.to_string())
    }
}

impl From<Vec<String>> for OptionValue {
    fn from(values: Vec<String>) -> Self {
        OptionValue::List(values)
    }
}

/// Insertion-ordered option map for one tool invocation.
///
/// Setting a flag that is already present replaces its value but keeps its
/// original position, so defaults can be overridden without reshuffling the
/// argument order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOptions {
    entries: Vec<(String, OptionValue)>,
}

impl CommandOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `flag` to `value`, replacing an earlier value in place.
    pub fn set(mut self, flag: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        let flag = flag.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(name, _)| *name == flag) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((flag, value)),
        }
        self
    }

    /// Applies every entry of `other` on top of this map.
    pub fn merge(mut self, other: CommandOptions) -> Self {
        for (flag, value) in other.entries {
            self = self.set(flag, value);
        }
        self
    }

    pub fn get(&self, flag: &str) -> Option<&OptionValue> {
        self.entries
            .iter()
            .find(|(name, _)| name == flag)
            .map(|(_, value)| value)
    }

    /// Expands the map into `-flag value` pairs in insertion order and
    /// splits off the output path. An absent or empty `o` yields no output.
    fn expand(&self) -> (Vec<String>, Option<String>) {
        let mut args = Vec::new();
        let mut output = None;
        for (flag, value) in &self.entries {
            if flag == "o" {
                if let OptionValue::Scalar(path) = value {
                    if !path.is_empty() {
                        output = Some(path.clone());
                    }
                }
                continue;
            }
            match value {
                OptionValue::Scalar(scalar) => {
                    args.push(format!("-{flag}"));
                    args.push(scalar.clone());
                }
                OptionValue::List(list) => {
                    for item in list {
                        args.push(format!("-{flag}"));
                        args.push(item.clone());
                    }
                }
            }
        }
        (args, output)
    }
}

/// Full argument vector for a transcode invocation. The thread-count hint
/// and the overwrite flag go after the mapped flags, the output path last.
pub fn transcode_args(options: &CommandOptions) -> Vec<String> {
    let (mut args, output) = options.expand();
    args.push("-threads".to_string());
    args.push(available_parallelism_hint().to_string());
    args.push("-y".to_string());
    if let Some(output) = output {
        args.push(output);
    }
    args
}

/// Argument vector for a probe invocation. No thread or overwrite hints;
/// probes read, they never write media.
pub fn probe_args(options: &CommandOptions) -> Vec<String> {
    let (mut args, output) = options.expand();
    if let Some(output) = output {
        args.push(output);
    }
    args
}

fn available_parallelism_hint() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Which stream the tool reports on: ffmpeg talks on stderr, ffprobe on
/// stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DiagnosticStream {
    Stdout,
    Stderr,
}

/// Spawns one external tool and collects its diagnostic lines.
#[derive(Debug, Clone)]
pub struct ToolRunner {
    tool_path: String,
    timeout: Duration,
}

impl ToolRunner {
    pub fn new(tool_path: impl Into<String>, timeout: Duration) -> Self {
        Self {
            tool_path: tool_path.into(),
            timeout,
        }
    }

    /// Runs a transcode invocation and returns the captured stderr lines.
    pub async fn run_transcode(&self, options: &CommandOptions) -> MediaResult<Vec<String>> {
        self.run(transcode_args(options), DiagnosticStream::Stderr)
            .await
    }

    /// Runs a probe invocation and returns the captured stdout lines.
    pub async fn run_probe(&self, options: &CommandOptions) -> MediaResult<Vec<String>> {
        self.run(probe_args(options), DiagnosticStream::Stdout)
            .await
    }

    #[tracing::instrument(skip(self, args), fields(process.executable.path = %self.tool_path))]
    async fn run(&self, args: Vec<String>, stream: DiagnosticStream) -> MediaResult<Vec<String>> {
        let start = std::time::Instant::now();
        tracing::debug!(args = ?args, "spawning external tool");

        let mut command = Command::new(&self.tool_path);
        command.args(&args).stdin(Stdio::null()).kill_on_drop(true);
        match stream {
            DiagnosticStream::Stdout => command.stdout(Stdio::piped()).stderr(Stdio::null()),
            DiagnosticStream::Stderr => command.stdout(Stdio::null()).stderr(Stdio::piped()),
        };
        let mut child = command.spawn()?;

        let outcome = tokio::time::timeout(self.timeout, drain_and_wait(&mut child, stream)).await;
        let (lines, status) = match outcome {
            Ok(result) => result?,
            Err(_) => {
                let _ = child.kill().await;
                tracing::warn!(
                    timeout_secs = self.timeout.as_secs(),
                    "external tool timed out"
                );
                return Err(MediaError::ProcessTimeout {
                    tool: tool_name(&self.tool_path),
                    elapsed: self.timeout,
                });
            }
        };

        if !status.success() {
            return Err(MediaError::ProcessFailed {
                tool: tool_name(&self.tool_path),
                status,
                detail: failure_detail(&lines),
            });
        }

        tracing::debug!(
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            lines = lines.len(),
            "external tool completed"
        );
        Ok(lines)
    }
}

/// Reads the diagnostic stream to end-of-stream, then waits for the exit
/// status. Both must be observed before the invocation counts as finished.
async fn drain_and_wait(
    child: &mut Child,
    stream: DiagnosticStream,
) -> std::io::Result<(Vec<String>, ExitStatus)> {
    let mut lines = Vec::new();
    match stream {
        DiagnosticStream::Stdout => {
            if let Some(stdout) = child.stdout.take() {
                let mut reader = BufReader::new(stdout).lines();
                while let Some(line) = reader.next_line().await? {
                    if !line.is_empty() {
                        lines.push(line);
                    }
                }
            }
        }
        DiagnosticStream::Stderr => {
            if let Some(stderr) = child.stderr.take() {
                let mut reader = BufReader::new(stderr).lines();
                while let Some(line) = reader.next_line().await? {
                    if !line.is_empty() {
                        lines.push(line);
                    }
                }
            }
        }
    }
    let status = child.wait().await?;
    Ok((lines, status))
}

fn failure_detail(lines: &[String]) -> String {
    let tail_start = lines.len().saturating_sub(FAILURE_DETAIL_LINES);
    lines[tail_start..].join("\n")
}

fn tool_name(tool_path: &str) -> String {
    Path::new(tool_path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| tool_path.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcode_args_keep_insertion_order() {
        let options = CommandOptions::new()
            .set("i", "in.mp4")
            .set("vframes", 1u32)
            .set("o", "out.png");
        let args = transcode_args(&options);

        let threads = available_parallelism_hint().to_string();
        assert_eq!(
            args,
            vec!["-i", "in.mp4", "-vframes", "1", "-threads", &threads, "-y", "out.png"]
        );
    }

    #[test]
    fn test_list_value_repeats_flag() {
        let options = CommandOptions::new()
            .set(
                "i",
                vec!["a.png".to_string(), "b.png".to_string(), "c.png".to_string()],
            )
            .set("o", "strip.png");
        let args = transcode_args(&options);

        assert_eq!(&args[..6], &["-i", "a.png", "-i", "b.png", "-i", "c.png"]);
        assert_eq!(args.last().map(String::as_str), Some("strip.png"));
    }

    #[test]
    fn test_probe_args_have_no_overwrite_or_thread_hints() {
        let options = CommandOptions::new().set("show_streams", "clip.mov");
        let args = probe_args(&options);

        assert_eq!(args, vec!["-show_streams", "clip.mov"]);
    }

    #[test]
    fn test_empty_output_key_yields_no_output_argument() {
        let options = CommandOptions::new().set("i", "in.mp4").set("o", "");
        let args = probe_args(&options);

        assert_eq!(args, vec!["-i", "in.mp4"]);
    }

    #[test]
    fn test_set_replaces_value_in_place() {
        let options = CommandOptions::new()
            .set("i", "in.mp4")
            .set("vcodec", "libvpx")
            .set("b:v", "2048k")
            .merge(CommandOptions::new().set("vcodec", "libx264"));
        let args = probe_args(&options);

        assert_eq!(
            args,
            vec!["-i", "in.mp4", "-vcodec", "libx264", "-b:v", "2048k"]
        );
    }

    #[tokio::test]
    async fn test_probe_run_captures_stdout_lines() {
        let runner = ToolRunner::new("/bin/sh", Duration::from_secs(10));
        let options = CommandOptions::new().set("c", "printf 'one\\n\\ntwo\\n'");

        let lines = runner.run_probe(&options).await.unwrap();

        assert_eq!(lines, vec!["one", "two"]);
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_surfaced_with_status() {
        let runner = ToolRunner::new("/bin/sh", Duration::from_secs(10));
        let options = CommandOptions::new().set("c", "exit 3");

        let result = runner.run_probe(&options).await;

        match result {
            Err(MediaError::ProcessFailed { tool, status, .. }) => {
                assert_eq!(tool, "sh");
                assert_eq!(status.code(), Some(3));
            }
            other => panic!("expected ProcessFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_failure_carries_trailing_diagnostics() {
        let runner = ToolRunner::new("/bin/sh", Duration::from_secs(10));
        let script = "echo 'stream mapping ok'; echo 'no decoder for codec'; exit 1";

        let result = runner
            .run(
                vec!["-c".to_string(), script.to_string()],
                DiagnosticStream::Stdout,
            )
            .await;

        match result {
            Err(MediaError::ProcessFailed { detail, .. }) => {
                assert!(detail.contains("no decoder for codec"));
            }
            other => panic!("expected ProcessFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_slow_tool_times_out_and_is_killed() {
        let runner = ToolRunner::new("/bin/sh", Duration::from_millis(200));
        let options = CommandOptions::new().set("c", "sleep 30");

        let result = runner.run_probe(&options).await;

        match result {
            Err(MediaError::ProcessTimeout { tool, elapsed }) => {
                assert_eq!(tool, "sh");
                assert_eq!(elapsed, Duration::from_millis(200));
            }
            other => panic!("expected ProcessTimeout, got {other:?}"),
        }
    }
}
