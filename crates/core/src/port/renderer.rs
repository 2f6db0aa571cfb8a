// Renderer Process Port
// Abstraction over the external rendering process: the supervisor sees
// an event stream plus a kill switch, never a raw child handle.

use async_trait::async_trait;
use thiserror::Error;

/// Render extent: exactly one of a named size preset or an explicit
/// distance is ever passed to the renderer, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderExtent {
    Size(String),
    Distance(u32),
}

/// A fully resolved renderer invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderInvocation {
    pub city: String,
    pub state: Option<String>,
    pub country: String,
    pub theme: String,
    pub output_path: String,
    pub extent: RenderExtent,
}

/// One event from a running renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderEvent {
    /// A line from the primary (progress) output stream.
    Stdout(String),
    /// A raw chunk from the diagnostic stream. Chunks, not lines:
    /// progress bars redraw in place with bare carriage returns.
    Stderr(String),
    /// Process exit; the code is absent when the process died to a
    /// signal.
    Exited(Option<i32>),
}

/// Renderer launch/IO errors
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to start renderer: {0}")]
    Spawn(String),

    #[error("Renderer IO error: {0}")]
    Io(String),
}

/// Launches renderer processes.
#[async_trait]
pub trait RenderLauncher: Send + Sync {
    /// Start one render. The returned process is exclusively owned by
    /// the caller.
    async fn launch(
        &self,
        invocation: &RenderInvocation,
    ) -> Result<Box<dyn RenderProcess>, RenderError>;
}

/// A running renderer: a stream of output events plus termination.
#[async_trait]
pub trait RenderProcess: Send {
    /// Next output/exit event; `None` once the stream is exhausted.
    async fn next_event(&mut self) -> Option<RenderEvent>;

    /// Terminate the process. Best-effort: must tolerate a process that
    /// has already exited.
    async fn terminate(&mut self);
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// One step in a scripted renderer run.
    #[derive(Debug, Clone)]
    pub enum Step {
        Emit(RenderEvent),
        Sleep(Duration),
        /// Never produce another event: the process hangs.
        Stall,
    }

    /// Launcher that replays fixed scripts instead of spawning anything.
    /// Each `launch` consumes the next script in order.
    pub struct ScriptedLauncher {
        scripts: Mutex<VecDeque<Vec<Step>>>,
        invocations: Mutex<Vec<RenderInvocation>>,
        terminations: Arc<AtomicUsize>,
    }

    impl ScriptedLauncher {
        pub fn new(script: Vec<Step>) -> Self {
            Self::with_scripts(vec![script])
        }

        pub fn with_scripts(scripts: Vec<Vec<Step>>) -> Self {
            Self {
                scripts: Mutex::new(scripts.into_iter().collect()),
                invocations: Mutex::new(Vec::new()),
                terminations: Arc::new(AtomicUsize::new(0)),
            }
        }

        /// Invocations seen so far, in launch order.
        pub fn invocations(&self) -> Vec<RenderInvocation> {
            self.invocations.lock().unwrap().clone()
        }

        /// How many scripted processes were terminated.
        pub fn termination_count(&self) -> usize {
            self.terminations.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RenderLauncher for ScriptedLauncher {
        async fn launch(
            &self,
            invocation: &RenderInvocation,
        ) -> Result<Box<dyn RenderProcess>, RenderError> {
            self.invocations.lock().unwrap().push(invocation.clone());
            let steps = self
                .scripts
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| RenderError::Spawn("no script left for launch".to_string()))?;
            Ok(Box::new(ScriptedProcess {
                steps: steps.into(),
                terminations: Arc::clone(&self.terminations),
            }))
        }
    }

    pub struct ScriptedProcess {
        steps: VecDeque<Step>,
        terminations: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl RenderProcess for ScriptedProcess {
        async fn next_event(&mut self) -> Option<RenderEvent> {
            loop {
                match self.steps.pop_front() {
                    Some(Step::Emit(event)) => return Some(event),
                    Some(Step::Sleep(duration)) => tokio::time::sleep(duration).await,
                    Some(Step::Stall) => std::future::pending::<()>().await,
                    None => return None,
                }
            }
        }

        async fn terminate(&mut self) {
            self.terminations.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Launcher whose spawn always fails with the given reason.
    pub struct FailingLauncher {
        reason: String,
    }

    impl FailingLauncher {
        pub fn new(reason: impl Into<String>) -> Self {
            Self {
                reason: reason.into(),
            }
        }
    }

    #[async_trait]
    impl RenderLauncher for FailingLauncher {
        async fn launch(
            &self,
            _invocation: &RenderInvocation,
        ) -> Result<Box<dyn RenderProcess>, RenderError> {
            Err(RenderError::Spawn(self.reason.clone()))
        }
    }
}
