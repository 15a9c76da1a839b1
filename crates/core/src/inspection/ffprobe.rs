//! Inspection backed by ffprobe.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::job::{CreateJobRequest, Job, JobStore, JobUpdate};
use crate::media::{guess_mime_type, AudioStream, Track, VideoStream};
use crate::workspace::Workspace;

use super::config::{ChecksumType, InspectionConfig};
use super::error::InspectionError;
use super::traits::{InspectionService, INSPECTION_JOB_TYPE, INSPECT_OPERATION};

/// Runs ffprobe on workspace artifacts in background tasks.
pub struct FfprobeInspectionService {
    config: InspectionConfig,
    jobs: Arc<dyn JobStore>,
    workspace: Arc<dyn Workspace>,
    permits: Arc<Semaphore>,
}

impl FfprobeInspectionService {
    pub fn new(
        config: InspectionConfig,
        jobs: Arc<dyn JobStore>,
        workspace: Arc<dyn Workspace>,
    ) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_parallel.max(1)));
        Self {
            config,
            jobs,
            workspace,
            permits,
        }
    }

    async fn run(
        config: &InspectionConfig,
        workspace: &dyn Workspace,
        location: &str,
    ) -> Result<Track, InspectionError> {
        let path = workspace.fetch(location).await?;
        let output = Command::new(&config.ffprobe_path)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(&path)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    InspectionError::FfprobeNotFound {
                        path: config.ffprobe_path.clone(),
                    }
                } else {
                    InspectionError::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(InspectionError::FfprobeFailed(format!(
                "ffprobe failed: {}",
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        let mut track = parse_probe_output(location, &String::from_utf8_lossy(&output.stdout))?;
        if track.size_bytes.is_none() {
            track.size_bytes = Some(tokio::fs::metadata(&path).await?.len());
        }
        track.checksum = Some(checksum(&path, config.checksum, config.buffer_size).await?);
        Ok(track)
    }
}

#[async_trait]
impl InspectionService for FfprobeInspectionService {
    async fn inspect(&self, location: &str) -> Result<Job, InspectionError> {
        let job = self.jobs.create_job(
            CreateJobRequest::new(INSPECTION_JOB_TYPE, INSPECT_OPERATION)
                .with_arguments(vec![location.to_string()]),
        )?;
        info!("Inspection {} submitted for {}", job.id, location);

        let id = job.id.clone();
        let location = location.to_string();
        let config = self.config.clone();
        let jobs = Arc::clone(&self.jobs);
        let workspace = Arc::clone(&self.workspace);
        let permits = Arc::clone(&self.permits);

        tokio::spawn(async move {
            let Ok(_permit) = permits.acquire_owned().await else {
                return;
            };
            if let Err(e) = jobs.update_job(&id, JobUpdate::running()) {
                warn!("Inspection {} could not start: {}", id, e);
                return;
            }

            let update = match Self::run(&config, workspace.as_ref(), &location).await {
                Ok(track) => match serde_json::to_string(&track) {
                    Ok(payload) => JobUpdate::finished(payload),
                    Err(e) => JobUpdate::failed(e.to_string()),
                },
                Err(e) => {
                    warn!("Inspection {} of {} failed: {}", id, location, e);
                    JobUpdate::failed(e.to_string())
                }
            };
            if let Err(e) = jobs.update_job(&id, update) {
                warn!("Inspection {} result not recorded: {}", id, e);
            }
        });

        Ok(job)
    }
}

/// Builds a track description from `ffprobe -print_format json` output.
pub(crate) fn parse_probe_output(location: &str, output: &str) -> Result<Track, InspectionError> {
    #[derive(Deserialize)]
    struct ProbeOutput {
        format: ProbeFormat,
        #[serde(default)]
        streams: Vec<ProbeStream>,
    }

    #[derive(Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
        size: Option<String>,
    }

    #[derive(Deserialize)]
    struct ProbeStream {
        codec_type: String,
        codec_name: Option<String>,
        bit_rate: Option<String>,
        sample_rate: Option<String>,
        channels: Option<u8>,
        width: Option<u32>,
        height: Option<u32>,
        r_frame_rate: Option<String>,
    }

    let probe: ProbeOutput =
        serde_json::from_str(output).map_err(|e| InspectionError::Parse(e.to_string()))?;

    let mut track = Track::new(location);
    track.duration_ms = probe
        .format
        .duration
        .as_deref()
        .and_then(|d| d.parse::<f64>().ok())
        .map(|secs| (secs * 1000.0).round() as u64);
    track.size_bytes = probe.format.size.as_deref().and_then(|s| s.parse().ok());

    let extension = Path::new(location)
        .extension()
        .map(|e| e.to_string_lossy().to_string())
        .unwrap_or_default();
    track.mime_type = guess_mime_type(&extension).map(str::to_string);

    for stream in probe.streams {
        match stream.codec_type.as_str() {
            "video" => track.video.push(VideoStream {
                codec: stream.codec_name,
                frame_width: stream.width,
                frame_height: stream.height,
                frame_rate: stream.r_frame_rate.as_deref().and_then(parse_frame_rate),
            }),
            "audio" => track.audio.push(AudioStream {
                codec: stream.codec_name,
                channels: stream.channels,
                sample_rate: stream.sample_rate.as_deref().and_then(|r| r.parse().ok()),
                bitrate_kbps: stream
                    .bit_rate
                    .as_deref()
                    .and_then(|b| b.parse::<u32>().ok())
                    .map(|b| b / 1000),
            }),
            other => debug!("Ignoring {} stream in {}", other, location),
        }
    }

    Ok(track)
}

/// Parses rates like `24000/1001` or `30/1`.
fn parse_frame_rate(rate: &str) -> Option<f32> {
    let (num, den) = rate.split_once('/')?;
    let num = num.parse::<f32>().ok()?;
    let den = den.parse::<f32>().ok()?;
    (den > 0.0).then(|| num / den)
}

async fn checksum(
    path: &Path,
    checksum_type: ChecksumType,
    buffer_size: usize,
) -> Result<String, InspectionError> {
    let file = File::open(path).await?;
    let mut reader = BufReader::with_capacity(buffer_size, file);
    let mut buffer = vec![0u8; buffer_size.max(1)];

    match checksum_type {
        ChecksumType::Sha256 => {
            let mut hasher = Sha256::new();
            loop {
                let bytes_read = reader.read(&mut buffer).await?;
                if bytes_read == 0 {
                    break;
                }
                hasher.update(&buffer[..bytes_read]);
            }
            Ok(format!("{:x}", hasher.finalize()))
        }
        ChecksumType::Md5 => {
            let mut context = md5::Context::new();
            loop {
                let bytes_read = reader.read(&mut buffer).await?;
                if bytes_read == 0 {
                    break;
                }
                context.consume(&buffer[..bytes_read]);
            }
            Ok(format!("{:x}", context.compute()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{InMemoryJobStore, JobStatus};
    use crate::workspace::{FsWorkspace, WorkspaceConfig};
    use tempfile::TempDir;

    const PROBE: &str = r#"{
        "streams": [
            {"codec_type": "video", "codec_name": "h264", "width": 1920, "height": 1080, "r_frame_rate": "30000/1001"},
            {"codec_type": "audio", "codec_name": "aac", "channels": 2, "sample_rate": "48000", "bit_rate": "128000"},
            {"codec_type": "data"}
        ],
        "format": {"filename": "x.mp4", "format_name": "mov,mp4", "duration": "12.345600", "size": "1048576"}
    }"#;

    #[test]
    fn test_parse_probe_output() {
        let track = parse_probe_output("composer/abc.mp4", PROBE).unwrap();

        assert_eq!(track.location, "composer/abc.mp4");
        assert_eq!(track.mime_type.as_deref(), Some("video/mp4"));
        assert_eq!(track.duration_ms, Some(12346));
        assert_eq!(track.size_bytes, Some(1_048_576));
        assert_eq!(track.frame_height(), Some(1080));
        assert!((track.video[0].frame_rate.unwrap() - 29.97).abs() < 0.01);
        assert_eq!(track.audio[0].channels, Some(2));
        assert_eq!(track.audio[0].sample_rate, Some(48000));
        assert_eq!(track.audio[0].bitrate_kbps, Some(128));
    }

    #[test]
    fn test_parse_image_without_duration() {
        let output = r#"{"streams": [{"codec_type": "video", "width": 640, "height": 360}], "format": {}}"#;
        let track = parse_probe_output("composer/thumb.jpg", output).unwrap();
        assert_eq!(track.duration_ms, None);
        assert_eq!(track.mime_type.as_deref(), Some("image/jpeg"));
        assert!(track.has_video());
    }

    #[test]
    fn test_parse_invalid() {
        assert!(matches!(
            parse_probe_output("x", "not json"),
            Err(InspectionError::Parse(_))
        ));
    }

    #[test]
    fn test_parse_frame_rate() {
        assert_eq!(parse_frame_rate("30/1"), Some(30.0));
        assert_eq!(parse_frame_rate("0/0"), None);
        assert_eq!(parse_frame_rate("30"), None);
    }

    #[tokio::test]
    async fn test_checksums() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.bin");
        tokio::fs::write(&path, b"hello").await.unwrap();

        assert_eq!(
            checksum(&path, ChecksumType::Sha256, 2).await.unwrap(),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        assert_eq!(
            checksum(&path, ChecksumType::Md5, 2).await.unwrap(),
            "5d41402abc4b2a76b9719d911017c592"
        );
    }

    #[tokio::test]
    async fn test_missing_artifact_fails_job() {
        let dir = TempDir::new().unwrap();
        let jobs = Arc::new(InMemoryJobStore::new());
        let workspace = Arc::new(FsWorkspace::new(WorkspaceConfig::with_root(
            dir.path().to_path_buf(),
        )));
        let service =
            FfprobeInspectionService::new(InspectionConfig::default(), jobs.clone(), workspace);

        let job = service.inspect("composer/missing.mp4").await.unwrap();
        assert_eq!(job.job_type, INSPECTION_JOB_TYPE);
        assert_eq!(job.arguments, vec!["composer/missing.mp4"]);

        let mut status = job.status;
        for _ in 0..100 {
            status = jobs.get_job(&job.id).unwrap().status;
            if status.is_terminal() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(status, JobStatus::Failed);
    }
}
