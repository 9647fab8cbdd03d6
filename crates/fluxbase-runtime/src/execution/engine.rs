use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use fluxbase_core::config::ExecutionConfig;
use fluxbase_core::{ExecutionError, ExecutionErrorKind, ExecutionKind, ExecutionRequest, ExecutionResult};
use tokio::process::Child;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::Semaphore;

use crate::env::EnvBuilder;
use crate::identity::{IdentityMinter, SigningKey};
use crate::wrapper::CodeWrapper;

use super::cancel::CancelSignal;
use super::config::GraceConfig;
use super::pumps::{pump_stderr, pump_stdout, FinalMarker};
use super::spawn::{build_command, send_sigterm};

enum ChildOutcome {
    Exited(std::io::Result<std::process::ExitStatus>),
    TimedOut,
    Cancelled,
}

/// Orchestrates identity minting, environment assembly, code wrapping,
/// and sandboxed spawning for a single execution (spec §4.E).
pub struct ExecutionEngine {
    config: ExecutionConfig,
    grace: GraceConfig,
    signing_key: SigningKey,
    minter: IdentityMinter,
    env_builder: EnvBuilder,
    wrapper: CodeWrapper,
    admission_timeout: Duration,
    semaphore: Arc<Semaphore>,
    client_semaphores: Mutex<HashMap<String, Arc<Semaphore>>>,
}

impl ExecutionEngine {
    pub fn new(config: ExecutionConfig, signing_key: SigningKey, base_url: impl Into<String>) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.max_concurrent_executions));
        let grace = GraceConfig::from(&config);
        let env_builder = EnvBuilder::new(base_url);
        Self {
            semaphore,
            client_semaphores: Mutex::new(HashMap::new()),
            admission_timeout: Duration::from_secs(5),
            grace,
            signing_key,
            minter: IdentityMinter::new(),
            env_builder,
            wrapper: CodeWrapper::new(),
            config,
        }
    }

    pub fn new_cancel_signal(&self) -> CancelSignal {
        CancelSignal::new()
    }

    fn client_semaphore(&self, key: &str) -> Arc<Semaphore> {
        let mut map = self.client_semaphores.lock().expect("client semaphore map poisoned");
        map.entry(key.to_string())
            .or_insert_with(|| Arc::new(Semaphore::new(self.config.max_concurrent_per_client)))
            .clone()
    }

    /// Runs one execution end to end. Never returns `Err` — every failure
    /// mode is reported inline in the returned [`ExecutionResult`] (spec
    /// §4.E, §7).
    pub async fn execute(
        &self,
        req: ExecutionRequest,
        source: &str,
        cancel: CancelSignal,
        progress: Option<UnboundedSender<serde_json::Value>>,
    ) -> ExecutionResult {
        let start = Instant::now();

        if let Err(kind) = req.validate_as_execution_error() {
            let message = req
                .validate()
                .err()
                .map(|e| e.to_string())
                .unwrap_or_else(|| "invalid request".to_string());
            return ExecutionResult::failure(ExecutionError::new(kind, message), start.elapsed());
        }

        let client_key = req.user_id.clone().unwrap_or_else(|| "anonymous".to_string());
        let client_sem = self.client_semaphore(&client_key);

        let _total_permit = match tokio::time::timeout(
            self.admission_timeout,
            Arc::clone(&self.semaphore).acquire_owned(),
        )
        .await
        {
            Ok(Ok(permit)) => permit,
            _ => {
                return ExecutionResult::failure(
                    ExecutionError::new(ExecutionErrorKind::Busy, "execution engine at capacity"),
                    start.elapsed(),
                )
            }
        };
        let _client_permit = match tokio::time::timeout(self.admission_timeout, client_sem.acquire_owned()).await
        {
            Ok(Ok(permit)) => permit,
            _ => {
                return ExecutionResult::failure(
                    ExecutionError::new(ExecutionErrorKind::Busy, "per-client concurrency limit reached"),
                    start.elapsed(),
                )
            }
        };

        self.run(req, source, cancel, progress, start).await
    }

    async fn run(
        &self,
        req: ExecutionRequest,
        source: &str,
        cancel: CancelSignal,
        progress: Option<UnboundedSender<serde_json::Value>>,
        start: Instant,
    ) -> ExecutionResult {
        let user_token = match self.minter.mint_user(&self.signing_key, &req, req.timeout) {
            Ok(token) => token,
            Err(e) => return ExecutionResult::failure(e, start.elapsed()),
        };
        let service_token = match self.minter.mint_service(&self.signing_key, &req, req.timeout) {
            Ok(token) => token,
            Err(e) => return ExecutionResult::failure(e, start.elapsed()),
        };

        let env = self.env_builder.build(&req, &user_token, &service_token, &[]);
        let wrapped = self.wrapper.wrap(source, &req, "javascript");

        let scratch_dir = PathBuf::from(&self.config.scratch_dir).join(req.id.to_string());
        if let Err(e) = tokio::fs::create_dir_all(&scratch_dir).await {
            return ExecutionResult::failure(
                ExecutionError::new(ExecutionErrorKind::Spawn, format!("scratch dir: {e}")),
                start.elapsed(),
            );
        }
        let script_path = scratch_dir.join("main.js");
        if let Err(e) = tokio::fs::write(&script_path, &wrapped).await {
            let _ = tokio::fs::remove_dir_all(&scratch_dir).await;
            return ExecutionResult::failure(
                ExecutionError::new(ExecutionErrorKind::Spawn, format!("wrapped source: {e}")),
                start.elapsed(),
            );
        }

        let mut cmd = build_command(
            &self.config.interpreter_path,
            &script_path,
            &scratch_dir,
            &env,
            req.memory_limit_mb,
        );

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                let _ = tokio::fs::remove_dir_all(&scratch_dir).await;
                return ExecutionResult::failure(
                    ExecutionError::new(ExecutionErrorKind::Spawn, e.to_string()),
                    start.elapsed(),
                );
            }
        };

        let pid = child.id();
        let stdout = child.stdout.take().expect("stdout piped at spawn");
        let stderr = child.stderr.take().expect("stderr piped at spawn");

        let max_output = match req.kind {
            ExecutionKind::Function => self.config.max_output_bytes_function,
            ExecutionKind::Job => self.config.max_output_bytes_job,
        };

        let stdout_task = tokio::spawn(pump_stdout(stdout, max_output, progress));
        let stderr_task = tokio::spawn(pump_stderr(stderr, max_output));

        let cancel_var_path = PathBuf::from(format!("/tmp/fluxbase-cancel-{}", req.id));
        let killed_by_us = Arc::new(AtomicBool::new(false));
        let deadline = req.timeout + self.grace.soft + self.grace.term;

        let outcome = tokio::select! {
            status = child.wait() => ChildOutcome::Exited(status),
            _ = tokio::time::sleep(deadline) => {
                self.cancel_then_kill(&mut child, pid, &cancel_var_path, &killed_by_us).await;
                ChildOutcome::TimedOut
            }
            _ = cancel.context().cancelled() => {
                self.cancel_then_kill(&mut child, pid, &cancel_var_path, &killed_by_us).await;
                ChildOutcome::Cancelled
            }
        };

        let stdout_outcome = stdout_task.await.ok();
        let stderr_outcome = stderr_task.await.ok();
        let _ = tokio::fs::remove_dir_all(&scratch_dir).await;
        let _ = tokio::fs::remove_file(&cancel_var_path).await;

        self.build_result(
            outcome,
            stdout_outcome,
            stderr_outcome,
            killed_by_us.load(Ordering::SeqCst),
            start.elapsed(),
        )
    }

    /// Soft-cancel (sentinel file), grace, terminate, grace, kill (spec
    /// §4.E step 7, §5 "notified via env/file... terminate... kill").
    async fn cancel_then_kill(
        &self,
        child: &mut Child,
        pid: Option<u32>,
        cancel_var_path: &std::path::Path,
        killed_by_us: &Arc<AtomicBool>,
    ) {
        let _ = tokio::fs::write(cancel_var_path, "1").await;

        if tokio::time::timeout(self.grace.soft, child.wait()).await.is_ok() {
            return;
        }

        if let Some(pid) = pid {
            send_sigterm(pid);
        }

        if tokio::time::timeout(self.grace.term, child.wait()).await.is_ok() {
            return;
        }

        killed_by_us.store(true, Ordering::SeqCst);
        let _ = child.start_kill();
        let _ = child.wait().await;
    }

    fn build_result(
        &self,
        outcome: ChildOutcome,
        stdout: Option<super::pumps::StdoutOutcome>,
        stderr: Option<super::pumps::StderrOutcome>,
        killed_by_us: bool,
        duration: Duration,
    ) -> ExecutionResult {
        let (raw_stdout, stdout_truncated, final_marker) = match stdout {
            Some(o) => (o.buffer, o.truncated, o.result),
            None => (String::new(), false, None),
        };
        let (stderr_classified, stderr_truncated) = match stderr {
            Some(o) => (o.lines, o.truncated),
            None => (Vec::new(), false),
        };

        let timed_out = matches!(outcome, ChildOutcome::TimedOut);

        let mut result = match outcome {
            ChildOutcome::TimedOut => ExecutionResult::failure(
                ExecutionError::new(ExecutionErrorKind::Timeout, "execution deadline exceeded"),
                duration,
            ),
            ChildOutcome::Cancelled => ExecutionResult::failure(
                ExecutionError::new(ExecutionErrorKind::Timeout, "execution cancelled"),
                duration,
            ),
            ChildOutcome::Exited(status) => self.result_from_exit(status, final_marker, killed_by_us, duration),
        };

        result.stdout = raw_stdout;
        result.stderr_classified = stderr_classified;
        result.timed_out = timed_out;
        result.truncated_stdout = stdout_truncated;
        result.truncated_stderr = stderr_truncated;
        result
    }

    fn result_from_exit(
        &self,
        status: std::io::Result<std::process::ExitStatus>,
        final_marker: Option<FinalMarker>,
        killed_by_us: bool,
        duration: Duration,
    ) -> ExecutionResult {
        if let Some(marker) = final_marker {
            return if marker.success {
                ExecutionResult::success(marker.value, duration)
            } else {
                let (message, details) = marker
                    .error
                    .map(|e| (e.message, e.stack))
                    .unwrap_or_else(|| ("unknown error".to_string(), None));
                let mut err = ExecutionError::new(ExecutionErrorKind::User, message);
                if let Some(details) = details {
                    err = err.with_details(details);
                }
                ExecutionResult::failure(err, duration)
            };
        }

        let status = match status {
            Ok(status) => status,
            Err(e) => {
                return ExecutionResult::failure(
                    ExecutionError::new(ExecutionErrorKind::RuntimeFailure, e.to_string()),
                    duration,
                )
            }
        };

        #[cfg(unix)]
        let killed_by_signal = {
            use std::os::unix::process::ExitStatusExt;
            status.signal().is_some()
        };
        #[cfg(not(unix))]
        let killed_by_signal = false;

        if killed_by_signal && !killed_by_us {
            let mut result = ExecutionResult::failure(
                ExecutionError::new(ExecutionErrorKind::Oom, "child terminated by the OS memory cap"),
                duration,
            );
            result.oom = true;
            return result;
        }

        if !status.success() {
            return ExecutionResult::failure(
                ExecutionError::new(
                    ExecutionErrorKind::RuntimeFailure,
                    format!("child exited with status {status}"),
                ),
                duration,
            );
        }

        ExecutionResult::failure(
            ExecutionError::new(
                ExecutionErrorKind::RuntimeFailure,
                "child exited successfully without a result marker",
            ),
            duration,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> ExecutionEngine {
        ExecutionEngine::new(
            ExecutionConfig::default(),
            SigningKey::new("test-secret"),
            "https://api.example.com",
        )
    }

    #[tokio::test]
    async fn rejects_invalid_requests_without_spawning() {
        let engine = engine();
        let req = ExecutionRequest::builder(ExecutionKind::Function, "  ").build();
        let result = engine
            .execute(req, "export function handler() {}", CancelSignal::new(), None)
            .await;
        assert!(!result.success);
        assert_eq!(result.error.unwrap().kind, ExecutionErrorKind::InvalidRequest);
    }

    #[test]
    fn client_semaphores_are_cached_by_key() {
        let engine = engine();
        let a = engine.client_semaphore("user-1");
        let b = engine.client_semaphore("user-1");
        assert!(Arc::ptr_eq(&a, &b));
    }
}
