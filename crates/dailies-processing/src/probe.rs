//! Probe output parsing.
//!
//! `ffprobe -show_streams` reports one `[STREAM] ... [/STREAM]` block per
//! media stream, each a flat run of `key=value` lines. A small state machine
//! turns the line sequence into one attribute record per block, in report
//! order, and rejects reports whose final block never closes.

use std::collections::HashMap;
use std::path::Path;

use dailies_core::{MediaConfig, MediaError, MediaResult};
use serde::{Deserialize, Serialize};

use crate::command::{CommandOptions, ToolRunner};

const BLOCK_OPEN: &str = "[STREAM]";
const BLOCK_CLOSE: &str = "[/STREAM]";

/// Frame count assumed when the container declares none. Some codecs omit
/// `nb_frames`; four frames still gives distinct first, middle, and last
/// sample points.
pub const FALLBACK_FRAME_COUNT: u64 = 4;

/// Attributes of one media stream as reported by the prober.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamRecord {
    attributes: HashMap<String, String>,
}

impl StreamRecord {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn codec_type(&self) -> Option<&str> {
        self.get("codec_type")
    }

    /// Declared frame count, when the container reports a parseable one.
    pub fn nb_frames(&self) -> Option<u64> {
        self.get("nb_frames").and_then(|value| value.parse().ok())
    }
}

/// Parses prober output into one record per stream block.
///
/// Lines outside a block are ignored. Inside a block every line with a
/// `key=value` separator becomes an attribute; the split is on the first
/// `=`, so values may themselves contain the separator.
pub fn parse_stream_blocks(lines: &[String]) -> MediaResult<Vec<StreamRecord>> {
    let mut records = Vec::new();
    let mut lines = lines.iter();
    while let Some(line) = lines.next() {
        if line.trim() != BLOCK_OPEN {
            continue;
        }
        let mut record = StreamRecord::default();
        loop {
            let line = lines
                .next()
                .ok_or_else(|| {
                    MediaError::probe_parse(format!(
                        "stream block {} of the report never closes",
                        records.len() + 1
                    ))
                })?
                .trim();
            if line == BLOCK_CLOSE {
                break;
            }
            if let Some((key, value)) = line.split_once('=') {
                record
                    .attributes
                    .insert(key.trim().to_string(), value.to_string());
            }
        }
        records.push(record);
    }
    Ok(records)
}

/// Runs the prober and interprets its per-stream report.
#[derive(Debug, Clone)]
pub struct MediaProber {
    runner: ToolRunner,
}

impl MediaProber {
    pub fn new(config: &MediaConfig) -> Self {
        Self {
            runner: ToolRunner::new(config.ffprobe_path.clone(), config.process_timeout),
        }
    }

    /// All stream records for `path`, in prober report order.
    pub async fn stream_records(&self, path: &Path) -> MediaResult<Vec<StreamRecord>> {
        let options = CommandOptions::new().set("show_streams", path.display().to_string());
        let lines = self.runner.run_probe(&options).await?;
        parse_stream_blocks(&lines)
    }

    /// The record of the video stream. When the report carries several, the
    /// last one wins.
    pub async fn video_stream(&self, path: &Path) -> MediaResult<StreamRecord> {
        let records = self.stream_records(path).await?;
        records
            .into_iter()
            .filter(|record| record.codec_type() == Some("video"))
            .last()
            .ok_or_else(|| {
                MediaError::probe_parse(format!(
                    "no video stream reported for {}",
                    path.display()
                ))
            })
    }

    /// Frame count of the video stream, falling back to a small default
    /// when the container does not declare one.
    pub async fn video_frame_count(&self, path: &Path) -> MediaResult<u64> {
        let stream = self.video_stream(path).await?;
        match stream.nb_frames() {
            Some(count) => Ok(count),
            None => {
                tracing::warn!(
                    path = %path.display(),
                    fallback = FALLBACK_FRAME_COUNT,
                    "video stream declares no frame count"
                );
                Ok(FALLBACK_FRAME_COUNT)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|line| line.to_string()).collect()
    }

    #[test]
    fn test_parse_keeps_blocks_in_report_order() {
        let lines = report(&[
            "[STREAM]",
            "index=0",
            "codec_type=audio",
            "[/STREAM]",
            "[STREAM]",
            "index=1",
            "codec_type=video",
            "nb_frames=240",
            "[/STREAM]",
        ]);

        let records = parse_stream_blocks(&lines).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].codec_type(), Some("audio"));
        assert_eq!(records[1].codec_type(), Some("video"));
        assert_eq!(records[1].nb_frames(), Some(240));
    }

    #[test]
    fn test_lines_outside_blocks_are_ignored() {
        let lines = report(&[
            "ffprobe version 6.0",
            "Input #0, mov,mp4",
            "[STREAM]",
            "codec_type=video",
            "[/STREAM]",
            "trailer noise",
        ]);

        let records = parse_stream_blocks(&lines).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].codec_type(), Some("video"));
    }

    #[test]
    fn test_value_keeps_everything_after_first_separator() {
        let lines = report(&["[STREAM]", "tag:comment=a=b=c", "[/STREAM]"]);

        let records = parse_stream_blocks(&lines).unwrap();

        assert_eq!(records[0].get("tag:comment"), Some("a=b=c"));
    }

    #[test]
    fn test_unclosed_block_is_a_parse_error() {
        let lines = report(&[
            "[STREAM]",
            "codec_type=video",
            "[/STREAM]",
            "[STREAM]",
            "codec_type=audio",
        ]);

        let result = parse_stream_blocks(&lines);

        match result {
            Err(MediaError::ProbeParse(message)) => {
                assert!(message.contains("block 2"));
            }
            other => panic!("expected ProbeParse, got {other:?}"),
        }
    }

    #[test]
    fn test_unparseable_frame_count_reads_as_absent() {
        let lines = report(&["[STREAM]", "codec_type=video", "nb_frames=N/A", "[/STREAM]"]);

        let records = parse_stream_blocks(&lines).unwrap();

        assert_eq!(records[0].nb_frames(), None);
    }
}
