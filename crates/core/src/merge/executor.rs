//! Merge job submission and status polling.
//!
//! A submitted merge either completes immediately or comes back
//! `in_progress`, in which case [`MergeExecutor`] polls the merge queue on a
//! fixed interval until the job reaches a terminal state, the optional
//! attempt cap is hit, or the shutdown signal fires.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};

use crate::api::MergeApi;
use crate::config::MergeConfig;
use crate::errors::MergeError;
use crate::merge::settings::MergeRequestPayload;
use crate::models::{MergeJob, MergeJobStatus};

pub struct MergeExecutor<'a, A: MergeApi + ?Sized> {
    api: &'a A,
    poll_interval: Duration,
    max_attempts: Option<u32>,
    log_dir: PathBuf,
    shutdown: Option<watch::Receiver<bool>>,
}

impl<'a, A: MergeApi + ?Sized> MergeExecutor<'a, A> {
    pub fn new(api: &'a A, config: &MergeConfig) -> Self {
        Self {
            api,
            poll_interval: config.poll_interval(),
            max_attempts: config.attempt_limit(),
            log_dir: config.log_dir.clone(),
            shutdown: None,
        }
    }

    /// Stop polling once `shutdown` turns `true`.
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Submit the merge and wait for it to finish.
    #[instrument(skip(self, payload), fields(base = %payload.base_branch, compare = %payload.compare_branch))]
    pub async fn execute(&mut self, payload: &MergeRequestPayload) -> Result<MergeJob, MergeError> {
        let job = self.api.submit_merge(payload).await?.job();
        info!(uid = %job.uid, status = %job.status, "merge submitted");

        match job.status {
            MergeJobStatus::Complete => Ok(job),
            MergeJobStatus::InProgress => self.wait_for_completion(&job.uid).await,
            MergeJobStatus::Failed => {
                error!(uid = %job.uid, "merge failed on submission");
                Err(MergeError::JobFailed {
                    uid: job.uid,
                    log_path: None,
                })
            }
            MergeJobStatus::Other(status) => Err(MergeError::UnexpectedStatus { uid: job.uid, status }),
        }
    }

    /// Poll the merge queue until the job reaches a terminal state.
    pub async fn wait_for_completion(&mut self, uid: &str) -> Result<MergeJob, MergeError> {
        let mut attempts: u32 = 0;
        loop {
            attempts += 1;
            let response = self.api.poll_merge_queue(uid).await?;
            let entry = response
                .queue
                .into_iter()
                .next()
                .ok_or_else(|| MergeError::NoQueue(uid.to_string()))?;

            debug!(uid, attempt = attempts, status = %entry.merge_details.status, "polled merge queue");

            match entry.merge_details.status {
                MergeJobStatus::Complete => {
                    info!(uid, attempts, "merge complete");
                    return Ok(MergeJob {
                        uid: uid.to_string(),
                        status: MergeJobStatus::Complete,
                    });
                }
                MergeJobStatus::InProgress => {}
                MergeJobStatus::Failed => {
                    let log_path = entry
                        .errors
                        .as_deref()
                        .and_then(|errors| self.write_error_log(uid, errors));
                    error!(uid, log = ?log_path, "merge failed");
                    return Err(MergeError::JobFailed {
                        uid: uid.to_string(),
                        log_path,
                    });
                }
                MergeJobStatus::Other(status) => {
                    return Err(MergeError::UnexpectedStatus {
                        uid: uid.to_string(),
                        status,
                    });
                }
            }

            if self.max_attempts.is_some_and(|max| attempts >= max) {
                return Err(MergeError::PollLimitReached {
                    uid: uid.to_string(),
                    attempts,
                });
            }
            if self.pause().await {
                warn!(uid, attempts, "merge polling cancelled");
                return Err(MergeError::Cancelled(uid.to_string()));
            }
        }
    }

    /// Sleep one poll interval. Returns `true` when shutdown was requested.
    async fn pause(&mut self) -> bool {
        let sleep = tokio::time::sleep(self.poll_interval);
        let Some(shutdown) = self.shutdown.as_mut() else {
            sleep.await;
            return false;
        };
        if *shutdown.borrow() {
            return true;
        }

        tokio::pin!(sleep);
        loop {
            tokio::select! {
                _ = &mut sleep => return false,
                changed = shutdown.changed() => match changed {
                    Ok(()) if *shutdown.borrow() => return true,
                    Ok(()) => {}
                    // Sender gone: nothing can cancel us any more.
                    Err(_) => {
                        (&mut sleep).await;
                        return false;
                    }
                },
            }
        }
    }

    /// Write the server's error list next to other merge logs. A log that
    /// cannot be written is reported but does not mask the job failure.
    fn write_error_log(&self, uid: &str, errors: &[Value]) -> Option<PathBuf> {
        match write_error_log(&self.log_dir, uid, errors) {
            Ok(path) => Some(path),
            Err(e) => {
                warn!(uid, error = %e, "failed to write merge error log");
                None
            }
        }
    }
}

/// Path of the error log for a failed merge job.
pub fn error_log_path(log_dir: &Path, uid: &str) -> PathBuf {
    log_dir.join(format!("merge-error-{}.log", uid))
}

fn write_error_log(log_dir: &Path, uid: &str, errors: &[Value]) -> Result<PathBuf, MergeError> {
    let file_error = |path: &Path, e: &dyn std::fmt::Display| MergeError::File {
        path: path.display().to_string(),
        detail: e.to_string(),
    };

    std::fs::create_dir_all(log_dir).map_err(|e| file_error(log_dir, &e))?;
    let path = error_log_path(log_dir, uid);
    let body = serde_json::to_string_pretty(errors).map_err(|e| file_error(&path, &e))?;
    let contents = format!(
        "merge uid: {}\nfailed at: {}\n\n{}\n",
        uid,
        chrono::Utc::now().to_rfc3339(),
        body
    );
    std::fs::write(&path, contents).map_err(|e| file_error(&path, &e))?;
    Ok(path)
}
