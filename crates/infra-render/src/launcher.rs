// Poster renderer launcher - spawns the external map renderer and adapts
// its stdio into the supervisor's event stream.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use posterforge_core::port::{
    RenderError, RenderEvent, RenderExtent, RenderInvocation, RenderLauncher, RenderProcess,
};

/// Buffered events between the reader tasks and the supervisor.
const EVENT_CHANNEL_CAPACITY: usize = 64;
const STDERR_READ_BUF: usize = 4096;

#[cfg(unix)]
const SIGKILL_GRACE: std::time::Duration = std::time::Duration::from_secs(5);

/// How the renderer is invoked.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Interpreter or binary, e.g. "python3".
    pub command: String,
    /// Script handed to the command as its first argument.
    pub script: PathBuf,
    /// Working directory for the renderer.
    pub working_dir: PathBuf,
}

/// `RenderLauncher` backed by a real OS process.
pub struct PosterRenderLauncher {
    config: RendererConfig,
}

impl PosterRenderLauncher {
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    /// Renderer argv, excluding the interpreter. The contract:
    /// city/country/theme/output always, state only when present, and
    /// exactly one of a size preset or a distance.
    fn build_args(&self, invocation: &RenderInvocation) -> Vec<String> {
        let mut args = vec![
            self.config.script.to_string_lossy().into_owned(),
            "--city".to_string(),
            invocation.city.clone(),
            "--country".to_string(),
            invocation.country.clone(),
            "--theme".to_string(),
            invocation.theme.clone(),
            "--output".to_string(),
            invocation.output_path.clone(),
        ];

        if let Some(state) = &invocation.state {
            args.push("--state".to_string());
            args.push(state.clone());
        }

        match &invocation.extent {
            RenderExtent::Size(size) => {
                args.push("--size".to_string());
                args.push(size.clone());
            }
            RenderExtent::Distance(distance) => {
                args.push("--distance".to_string());
                args.push(distance.to_string());
            }
        }

        args
    }
}

#[async_trait]
impl RenderLauncher for PosterRenderLauncher {
    async fn launch(
        &self,
        invocation: &RenderInvocation,
    ) -> Result<Box<dyn RenderProcess>, RenderError> {
        let args = self.build_args(invocation);

        debug!(command = %self.config.command, args = ?args, "spawning renderer");

        let mut child = Command::new(&self.config.command)
            .args(&args)
            .current_dir(&self.config.working_dir)
            // Unbuffered output is required for live progress, and the
            // bar redraws would otherwise swamp the diagnostic stream.
            .env("PYTHONUNBUFFERED", "1")
            .env("TQDM_DISABLE", "1")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| RenderError::Spawn(e.to_string()))?;

        let pid = child.id().map(|id| id as i32);
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| RenderError::Io("renderer stdout not captured".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| RenderError::Io("renderer stderr not captured".to_string()))?;

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let stdout_tx = tx.clone();
        let stdout_task = tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if stdout_tx.send(RenderEvent::Stdout(line)).await.is_err() {
                    break;
                }
            }
        });

        let stderr_tx = tx.clone();
        let stderr_task = tokio::spawn(async move {
            // Chunked, not line-based: progress bars redraw with bare
            // carriage returns and may never emit a newline.
            let mut stderr = stderr;
            let mut buf = [0u8; STDERR_READ_BUF];
            loop {
                match stderr.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        let chunk = String::from_utf8_lossy(&buf[..n]).into_owned();
                        if stderr_tx.send(RenderEvent::Stderr(chunk)).await.is_err() {
                            break;
                        }
                    }
                }
            }
        });

        tokio::spawn(async move {
            // Drain both streams before reporting the exit so the
            // supervisor always sees complete output first.
            let _ = stdout_task.await;
            let _ = stderr_task.await;
            let code = match child.wait().await {
                Ok(status) => status.code(),
                Err(e) => {
                    warn!(error = %e, "failed to reap renderer");
                    None
                }
            };
            let _ = tx.send(RenderEvent::Exited(code)).await;
        });

        Ok(Box::new(SpawnedRenderProcess { pid, events: rx }))
    }
}

struct SpawnedRenderProcess {
    pid: Option<i32>,
    events: mpsc::Receiver<RenderEvent>,
}

#[async_trait]
impl RenderProcess for SpawnedRenderProcess {
    async fn next_event(&mut self) -> Option<RenderEvent> {
        self.events.recv().await
    }

    async fn terminate(&mut self) {
        let Some(pid) = self.pid.take() else {
            return;
        };
        terminate_by_pid(pid);
    }
}

/// SIGTERM first so the renderer can drop partial output, SIGKILL if it
/// lingers past the grace period.
#[cfg(unix)]
fn terminate_by_pid(pid: i32) {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    tracing::info!(pid = %pid, "terminating renderer");
    if let Err(e) = kill(Pid::from_raw(pid), Signal::SIGTERM) {
        warn!(pid = %pid, error = %e, "SIGTERM failed");
        return;
    }

    tokio::spawn(async move {
        tokio::time::sleep(SIGKILL_GRACE).await;
        // Signal 0 probes liveness without delivering anything.
        if kill(Pid::from_raw(pid), None::<Signal>).is_ok() {
            warn!(pid = %pid, "renderer survived SIGTERM, sending SIGKILL");
            let _ = kill(Pid::from_raw(pid), Signal::SIGKILL);
        }
    });
}

#[cfg(not(unix))]
fn terminate_by_pid(pid: i32) {
    // Elsewhere we rely on kill_on_drop tearing the process down when
    // the handle goes away.
    warn!(pid = %pid, "forced termination is only implemented on unix");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn launcher(command: &str, script: &str) -> PosterRenderLauncher {
        PosterRenderLauncher::new(RendererConfig {
            command: command.to_string(),
            script: PathBuf::from(script),
            working_dir: PathBuf::from("."),
        })
    }

    fn invocation(extent: RenderExtent) -> RenderInvocation {
        RenderInvocation {
            city: "Tokyo".to_string(),
            state: None,
            country: "Japan".to_string(),
            theme: "noir".to_string(),
            output_path: "/tmp/job-1.png".to_string(),
            extent,
        }
    }

    #[test]
    fn test_args_with_size_preset() {
        let launcher = launcher("python3", "render.py");
        let args = launcher.build_args(&invocation(RenderExtent::Size("city".to_string())));
        assert_eq!(
            args,
            vec![
                "render.py", "--city", "Tokyo", "--country", "Japan", "--theme", "noir",
                "--output", "/tmp/job-1.png", "--size", "city",
            ]
        );
        assert!(!args.contains(&"--distance".to_string()));
    }

    #[test]
    fn test_args_with_distance() {
        let launcher = launcher("python3", "render.py");
        let args = launcher.build_args(&invocation(RenderExtent::Distance(500)));
        assert!(args.ends_with(&["--distance".to_string(), "500".to_string()]));
        assert!(!args.contains(&"--size".to_string()));
    }

    #[test]
    fn test_args_include_state_only_when_present() {
        let launcher = launcher("python3", "render.py");
        let mut inv = invocation(RenderExtent::Size("city".to_string()));
        assert!(!launcher.build_args(&inv).contains(&"--state".to_string()));

        inv.state = Some("Kanto".to_string());
        let args = launcher.build_args(&inv);
        let pos = args.iter().position(|a| a == "--state").unwrap();
        assert_eq!(args[pos + 1], "Kanto");
    }

    #[tokio::test]
    async fn test_launch_streams_stdout_then_exit() {
        // `echo` prints the argv and exits 0: enough to exercise the
        // stream-then-exit ordering without a real renderer.
        let launcher = launcher("echo", "Rendering");
        let mut process = launcher
            .launch(&invocation(RenderExtent::Size("city".to_string())))
            .await
            .expect("launch echo");

        let mut saw_stdout = false;
        let mut exit_code = None;
        while let Some(event) = process.next_event().await {
            match event {
                RenderEvent::Stdout(line) => {
                    if line.contains("Rendering") && line.contains("--city") {
                        saw_stdout = true;
                    }
                }
                RenderEvent::Stderr(_) => {}
                RenderEvent::Exited(code) => exit_code = code,
            }
        }
        assert!(saw_stdout);
        assert_eq!(exit_code, Some(0));
    }

    #[tokio::test]
    async fn test_launch_missing_binary_is_spawn_error() {
        let launcher = launcher("posterforge-no-such-renderer", "render.py");
        let err = launcher
            .launch(&invocation(RenderExtent::Size("city".to_string())))
            .await
            .err()
            .expect("spawn must fail");
        assert!(matches!(err, RenderError::Spawn(_)));
    }
}
