//! Composer service: submits operation jobs and runs their execution routine.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::engine::{format_seconds, Engine, EngineFactory, LocalTrack, ParamMap};
use crate::inspection::InspectionService;
use crate::job::{CreateJobRequest, Job, JobFilter, JobStatus, JobStore, JobUpdate};
use crate::media::Track;
use crate::metrics;
use crate::profile::{EncodingProfile, ProfileRegistry};
use crate::workspace::{Workspace, WorkspaceError};

use super::barrier::InspectionBarrier;
use super::config::{ComposerConfig, DispatchMode};
use super::types::{ComposerError, ComposerRequest, ComposerStatus, JobHandle, COMPOSER_JOB_TYPE};

/// Entry point for composer operations.
///
/// Every `request_*` call records a queued job and returns at once. In pool
/// mode the job runs on an internal worker; in external mode a scheduler
/// later calls [`ComposerService::process`]. Both paths share the same
/// execution routine.
#[derive(Clone)]
pub struct ComposerService {
    inner: Arc<Inner>,
}

struct Inner {
    config: ComposerConfig,
    jobs: Arc<dyn JobStore>,
    workspace: Arc<dyn Workspace>,
    profiles: Arc<dyn ProfileRegistry>,
    engines: Arc<dyn EngineFactory>,
    barrier: InspectionBarrier,
    workers: Arc<Semaphore>,
    active: Mutex<HashSet<String>>,
    shutdown: CancellationToken,
}

impl ComposerService {
    pub fn new(
        config: ComposerConfig,
        jobs: Arc<dyn JobStore>,
        workspace: Arc<dyn Workspace>,
        profiles: Arc<dyn ProfileRegistry>,
        engines: Arc<dyn EngineFactory>,
        inspection: Arc<dyn InspectionService>,
    ) -> Self {
        let barrier = InspectionBarrier::new(
            inspection,
            Arc::clone(&jobs),
            config.poll_interval(),
            config.inspection_timeout(),
        );
        let workers = Arc::new(Semaphore::new(config.max_workers.max(1)));

        Self {
            inner: Arc::new(Inner {
                config,
                jobs,
                workspace,
                profiles,
                engines,
                barrier,
                workers,
                active: Mutex::new(HashSet::new()),
                shutdown: CancellationToken::new(),
            }),
        }
    }

    pub fn config(&self) -> &ComposerConfig {
        &self.inner.config
    }

    /// Encodes one track with a profile.
    pub async fn request_encode(
        &self,
        track: Track,
        profile_id: &str,
    ) -> Result<JobHandle, ComposerError> {
        self.submit(ComposerRequest::Encode {
            track,
            profile_id: profile_id.to_string(),
        })
    }

    /// Encodes a video and an audio track into one output.
    pub async fn request_mux(
        &self,
        video: Track,
        audio: Track,
        profile_id: &str,
    ) -> Result<JobHandle, ComposerError> {
        self.submit(ComposerRequest::Mux {
            video,
            audio,
            profile_id: profile_id.to_string(),
        })
    }

    pub async fn request_trim(
        &self,
        track: Track,
        profile_id: &str,
        start_ms: u64,
        duration_ms: u64,
    ) -> Result<JobHandle, ComposerError> {
        self.submit(ComposerRequest::Trim {
            track,
            profile_id: profile_id.to_string(),
            start_ms,
            duration_ms,
        })
    }

    /// Extracts a still image at `time_ms`.
    pub async fn request_image(
        &self,
        track: Track,
        profile_id: &str,
        time_ms: i64,
    ) -> Result<JobHandle, ComposerError> {
        self.submit(ComposerRequest::ExtractImage {
            track,
            profile_id: profile_id.to_string(),
            time_ms,
        })
    }

    /// Embeds caption tracks using the configured caption profile.
    pub async fn request_caption_embed(
        &self,
        media: Track,
        captions: Vec<Track>,
    ) -> Result<JobHandle, ComposerError> {
        self.submit(ComposerRequest::EmbedCaptions {
            media,
            captions,
            profile_id: self.inner.config.caption_profile.clone(),
        })
    }

    fn submit(&self, request: ComposerRequest) -> Result<JobHandle, ComposerError> {
        if self.inner.shutdown.is_cancelled() {
            return Err(ComposerError::Internal("composer is shutting down".to_string()));
        }

        let operation = request.operation();
        let job = self.inner.jobs.create_job(
            CreateJobRequest::new(COMPOSER_JOB_TYPE, operation.as_str())
                .with_arguments(request.to_arguments()?)
                .with_host(self.inner.config.host.clone()),
        )?;
        info!(
            "Queued {} job {} with profile {}",
            operation,
            job.id,
            request.profile_id()
        );

        let completion = match self.inner.config.dispatch {
            DispatchMode::Pool => {
                let service = self.clone();
                let id = job.id.clone();
                Some(tokio::spawn(async move {
                    let _permit = Arc::clone(&service.inner.workers)
                        .acquire_owned()
                        .await
                        .map_err(|_| ComposerError::Internal("worker pool closed".to_string()))?;
                    service.process(&id).await
                }))
            }
            DispatchMode::External => None,
        };

        Ok(JobHandle::new(job, completion))
    }

    /// Runs the execution routine for a queued job.
    ///
    /// Only queued composer jobs are taken; anything else is rejected without
    /// touching the record. Once the job is claimed as `Running`, a failure
    /// marks it `Failed` before the error is returned. A failure to record
    /// `Failed` is logged and the original error wins.
    pub async fn process(&self, job_id: &str) -> Result<Job, ComposerError> {
        let _guard = ActiveJob::enter(&self.inner.active, job_id)?;
        let job = self.claim(job_id)?;

        let operation = job.operation.clone();
        let started = Instant::now();
        let result = self.execute(job).await;
        metrics::JOB_DURATION
            .with_label_values(&[operation.as_str()])
            .observe(started.elapsed().as_secs_f64());

        match result {
            Ok(job) => {
                metrics::JOBS_TOTAL
                    .with_label_values(&[operation.as_str(), "finished"])
                    .inc();
                info!("Job {} finished", job_id);
                Ok(job)
            }
            Err(e) => {
                metrics::JOBS_TOTAL
                    .with_label_values(&[operation.as_str(), "failed"])
                    .inc();
                error!("Job {} failed: {}", job_id, e);
                if let Err(write_err) = self
                    .inner
                    .jobs
                    .update_job(job_id, JobUpdate::failed(e.to_string()))
                {
                    warn!("Could not record failure of job {}: {}", job_id, write_err);
                }
                Err(e)
            }
        }
    }

    /// Moves a queued composer job to `Running`. Nothing is written unless
    /// the job is a composer job in `Queued`.
    fn claim(&self, job_id: &str) -> Result<Job, ComposerError> {
        let job = self.inner.jobs.get_job(job_id)?;
        if job.job_type != COMPOSER_JOB_TYPE {
            return Err(ComposerError::NotExecutable {
                id: job.id,
                reason: format!("{} jobs are not run by the composer", job.job_type),
            });
        }
        if job.status != JobStatus::Queued {
            return Err(ComposerError::NotExecutable {
                id: job.id,
                reason: format!("job is {}", job.status),
            });
        }

        let job = self.inner.jobs.update_job(job_id, JobUpdate::running())?;
        info!("Job {} running {}", job.id, job.operation);
        Ok(job)
    }

    async fn execute(&self, job: Job) -> Result<Job, ComposerError> {
        if self.inner.shutdown.is_cancelled() {
            return Err(ComposerError::Internal("composer is shutting down".to_string()));
        }

        let request = ComposerRequest::from_job(&job)?;
        let produced = self.run_engine(&request).await?;

        let location = self.store_produced(&job.id, &produced).await?;

        let mut track = self
            .inner
            .barrier
            .verify(&location, &self.inner.shutdown)
            .await?;
        track.identifier = Some(Uuid::new_v4().to_string());
        if track.mime_type.is_none() {
            track.mime_type = self
                .inner
                .profiles
                .get_profile(request.profile_id())
                .and_then(|profile| profile.mime_type.clone());
        }
        let payload =
            serde_json::to_string(&track).map_err(|e| ComposerError::Internal(e.to_string()))?;

        Ok(self
            .inner
            .jobs
            .update_job(&job.id, JobUpdate::finished(payload))?)
    }

    /// Fetches the inputs, resolves profile and engine and runs the engine.
    async fn run_engine(&self, request: &ComposerRequest) -> Result<PathBuf, ComposerError> {
        let produced = match request {
            ComposerRequest::Encode { track, profile_id } => {
                let input = self.fetch_input(track).await?;
                let (profile, engine) = self.resolve(profile_id)?;
                engine.encode(&input, &profile, &ParamMap::new()).await?
            }
            ComposerRequest::Mux {
                video,
                audio,
                profile_id,
            } => {
                let video = self.fetch_input(video).await?;
                let audio = self.fetch_input(audio).await?;
                let (profile, engine) = self.resolve(profile_id)?;
                engine.mux(&audio, &video, &profile, &ParamMap::new()).await?
            }
            ComposerRequest::Trim {
                track,
                profile_id,
                start_ms,
                duration_ms,
            } => {
                let input = self.fetch_input(track).await?;
                let (profile, engine) = self.resolve(profile_id)?;
                engine
                    .trim(&input, &profile, *start_ms, *duration_ms, &ParamMap::new())
                    .await?
            }
            ComposerRequest::ExtractImage {
                track,
                profile_id,
                time_ms,
            } => {
                let input = self.fetch_input(track).await?;
                let (profile, engine) = self.resolve(profile_id)?;
                let time_ms = validate_image_time(track, *time_ms)?;

                let mut params = ParamMap::new();
                params.insert("time".to_string(), format_seconds(time_ms));
                engine.encode(&input, &profile, &params).await?
            }
            ComposerRequest::EmbedCaptions {
                media,
                captions,
                profile_id,
            } => {
                let media = LocalTrack::new(self.fetch_input(media).await?, media.clone());
                let mut local_captions = Vec::with_capacity(captions.len());
                for caption in captions {
                    local_captions.push(LocalTrack::new(
                        self.fetch_input(caption).await?,
                        caption.clone(),
                    ));
                }
                let (profile, engine) = self.resolve(profile_id)?;
                engine
                    .embed_captions(&media, &local_captions, &profile, &ParamMap::new())
                    .await?
            }
        };
        Ok(produced)
    }

    async fn fetch_input(&self, track: &Track) -> Result<PathBuf, ComposerError> {
        self.inner
            .workspace
            .fetch(&track.location)
            .await
            .map_err(|e| match e {
                WorkspaceError::NotFound { location } => ComposerError::InputNotFound(location),
                WorkspaceError::Io { location, source } => ComposerError::InputIo {
                    location,
                    reason: source.to_string(),
                },
            })
    }

    fn resolve(
        &self,
        profile_id: &str,
    ) -> Result<(Arc<EncodingProfile>, Arc<dyn Engine>), ComposerError> {
        let profile = self
            .inner
            .profiles
            .get_profile(profile_id)
            .ok_or_else(|| ComposerError::UnknownProfile(profile_id.to_string()))?;
        let engine = self
            .inner
            .engines
            .engine_for(&profile)
            .ok_or_else(|| ComposerError::NoEngineForProfile(profile_id.to_string()))?;
        Ok((profile, engine))
    }

    /// Stores the produced file as `<job id>.<ext>` and removes the local copy.
    async fn store_produced(&self, job_id: &str, produced: &Path) -> Result<String, ComposerError> {
        let name = match produced.extension() {
            Some(ext) => format!("{}.{}", job_id, ext.to_string_lossy()),
            None => job_id.to_string(),
        };

        let stored = self
            .inner
            .workspace
            .store(&self.inner.config.collection, &name, produced)
            .await;

        if let Err(e) = tokio::fs::remove_file(produced).await {
            warn!("Could not remove local file {}: {}", produced.display(), e);
        }

        let location = stored.map_err(|e| ComposerError::ArtifactStore(e.to_string()))?;
        info!("Stored job {} artifact at {}", job_id, location);
        Ok(location)
    }

    /// Reads a job record.
    pub fn get_job(&self, id: &str) -> Result<Job, ComposerError> {
        Ok(self.inner.jobs.get_job(id)?)
    }

    pub fn list_profiles(&self) -> Vec<Arc<EncodingProfile>> {
        self.inner.profiles.list_profiles()
    }

    pub fn get_profile(&self, id: &str) -> Result<Arc<EncodingProfile>, ComposerError> {
        self.inner
            .profiles
            .get_profile(id)
            .ok_or_else(|| ComposerError::UnknownProfile(id.to_string()))
    }

    /// Counts composer jobs, optionally by status and host.
    pub fn count_jobs(
        &self,
        status: Option<JobStatus>,
        host: Option<&str>,
    ) -> Result<usize, ComposerError> {
        let mut filter = JobFilter::new().with_type(COMPOSER_JOB_TYPE);
        if let Some(status) = status {
            filter = filter.with_status(status);
        }
        if let Some(host) = host {
            filter = filter.with_host(host);
        }
        Ok(self.inner.jobs.count_jobs(&filter)?)
    }

    pub fn status(&self) -> ComposerStatus {
        let mut active_jobs: Vec<String> = self
            .inner
            .active
            .lock()
            .map(|active| active.iter().cloned().collect())
            .unwrap_or_default();
        active_jobs.sort();

        ComposerStatus {
            dispatch: self.inner.config.dispatch,
            max_workers: self.inner.config.max_workers.max(1),
            available_workers: self.inner.workers.available_permits(),
            active_jobs,
            shutting_down: self.inner.shutdown.is_cancelled(),
        }
    }

    /// Rejects new requests and interrupts pending inspection waits. Jobs
    /// interrupted this way end `Failed`.
    pub fn shutdown(&self) {
        info!("Shutting down composer");
        self.inner.shutdown.cancel();
    }
}

/// Checks a still-image timestamp against the source track.
fn validate_image_time(track: &Track, time_ms: i64) -> Result<u64, ComposerError> {
    if !track.has_video() {
        return Err(ComposerError::InvalidParameter(format!(
            "{} has no video stream",
            track.location
        )));
    }
    let time = u64::try_from(time_ms).map_err(|_| {
        ComposerError::InvalidParameter(format!("negative image time {} ms", time_ms))
    })?;
    if let Some(duration) = track.duration_ms {
        if time > duration {
            return Err(ComposerError::InvalidParameter(format!(
                "image time {} ms is beyond the track duration of {} ms",
                time, duration
            )));
        }
    }
    Ok(time)
}

/// Marks a job id as executing for as long as the guard lives.
struct ActiveJob<'a> {
    active: &'a Mutex<HashSet<String>>,
    id: String,
}

impl<'a> ActiveJob<'a> {
    fn enter(active: &'a Mutex<HashSet<String>>, id: &str) -> Result<Self, ComposerError> {
        let mut set = active
            .lock()
            .map_err(|_| ComposerError::Internal("active job set poisoned".to_string()))?;
        if !set.insert(id.to_string()) {
            return Err(ComposerError::AlreadyRunning(id.to_string()));
        }
        Ok(Self {
            active,
            id: id.to_string(),
        })
    }
}

impl Drop for ActiveJob<'_> {
    fn drop(&mut self) {
        if let Ok(mut set) = self.active.lock() {
            set.remove(&self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::VideoStream;

    fn video(duration_ms: Option<u64>) -> Track {
        let mut track = Track::new("media/talk.mp4");
        track.duration_ms = duration_ms;
        track.video.push(VideoStream::default());
        track
    }

    #[test]
    fn test_validate_image_time() {
        let track = video(Some(3000));
        assert_eq!(validate_image_time(&track, 0).unwrap(), 0);
        assert_eq!(validate_image_time(&track, 3000).unwrap(), 3000);
        assert!(validate_image_time(&track, 3001).is_err());
        assert!(validate_image_time(&track, -1).is_err());

        let track = video(Some(0));
        assert!(validate_image_time(&track, 0).is_ok());
        assert!(validate_image_time(&track, 1).is_err());

        let track = video(None);
        assert!(validate_image_time(&track, 90_000).is_ok());
        assert!(validate_image_time(&track, -5).is_err());
    }

    #[test]
    fn test_image_requires_video() {
        let mut track = video(Some(3000));
        track.video.clear();
        assert!(matches!(
            validate_image_time(&track, 1000),
            Err(ComposerError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_active_job_guard() {
        let active = Mutex::new(HashSet::new());
        let guard = ActiveJob::enter(&active, "job-1").unwrap();
        assert!(matches!(
            ActiveJob::enter(&active, "job-1"),
            Err(ComposerError::AlreadyRunning(_))
        ));
        assert!(ActiveJob::enter(&active, "job-2").is_ok());
        drop(guard);
        assert!(ActiveJob::enter(&active, "job-1").is_ok());
    }
}
