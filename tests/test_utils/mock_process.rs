//! Mock process spawner

use async_trait::async_trait;
use manlook::error::{Error, Result};
use manlook::process::{CommandSpec, ProcessHandle, ProcessSpawner, RawOutput};
use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone)]
enum Behavior {
    Exit(RawOutput),
    Hang,
    WaitError(String),
    FailSpawn(String),
}

/// What one spawned process will do
#[derive(Debug, Clone)]
pub struct Script {
    behavior: Behavior,
    delay: Duration,
}

impl Script {
    /// Exit with `code` after writing `stdout` and `stderr`
    pub fn exit(code: i32, stdout: &str, stderr: &str) -> Self {
        Self::from_behavior(Behavior::Exit(RawOutput {
            exit_code: code,
            stdout: stdout.as_bytes().to_vec(),
            stderr: stderr.as_bytes().to_vec(),
        }))
    }

    /// Never finish
    pub fn hang() -> Self {
        Self::from_behavior(Behavior::Hang)
    }

    /// Start, then fail while collecting output
    pub fn wait_error(message: &str) -> Self {
        Self::from_behavior(Behavior::WaitError(message.to_string()))
    }

    /// Refuse to start
    pub fn fail_spawn(reason: &str) -> Self {
        Self::from_behavior(Behavior::FailSpawn(reason.to_string()))
    }

    /// Delay the outcome by `delay`
    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn from_behavior(behavior: Behavior) -> Self {
        Self {
            behavior,
            delay: Duration::ZERO,
        }
    }
}

/// Spawner that plays back queued scripts, then repeats a fallback
pub struct MockSpawner {
    queue: Mutex<VecDeque<Script>>,
    fallback: Script,
    spawned: Mutex<Vec<CommandSpec>>,
    kills: Arc<AtomicUsize>,
}

impl MockSpawner {
    /// Every spawn follows `script`
    pub fn always(script: Script) -> Arc<Self> {
        Arc::new(Self {
            queue: Mutex::new(VecDeque::new()),
            fallback: script,
            spawned: Mutex::new(Vec::new()),
            kills: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Spawns follow `scripts` in order, then `fallback`
    pub fn sequence(scripts: Vec<Script>, fallback: Script) -> Arc<Self> {
        let spawner = Self::always(fallback);
        spawner.queue.lock().unwrap().extend(scripts);
        spawner
    }

    /// Commands spawned so far
    pub fn spawned(&self) -> Vec<CommandSpec> {
        self.spawned.lock().unwrap().clone()
    }

    pub fn spawn_count(&self) -> usize {
        self.spawned.lock().unwrap().len()
    }

    /// How many processes were killed
    pub fn kill_count(&self) -> usize {
        self.kills.load(Ordering::SeqCst)
    }
}

impl ProcessSpawner for MockSpawner {
    fn spawn(&self, spec: &CommandSpec) -> Result<Box<dyn ProcessHandle>> {
        let script = self
            .queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        if let Behavior::FailSpawn(reason) = &script.behavior {
            return Err(Error::ProcessCreationFailed {
                command: spec.to_string(),
                reason: reason.clone(),
            });
        }

        self.spawned.lock().unwrap().push(spec.clone());
        Ok(Box::new(MockProcess {
            script,
            kills: self.kills.clone(),
        }))
    }
}

struct MockProcess {
    script: Script,
    kills: Arc<AtomicUsize>,
}

#[async_trait]
impl ProcessHandle for MockProcess {
    fn id(&self) -> Option<u32> {
        None
    }

    async fn wait_with_output(&mut self) -> Result<RawOutput> {
        if !self.script.delay.is_zero() {
            tokio::time::sleep(self.script.delay).await;
        }

        match &self.script.behavior {
            Behavior::Exit(output) => Ok(output.clone()),
            Behavior::Hang => std::future::pending().await,
            Behavior::WaitError(message) => {
                Err(Error::Io(io::Error::new(io::ErrorKind::BrokenPipe, message.clone())))
            }
            Behavior::FailSpawn(_) => unreachable!("spawn failures never produce a process"),
        }
    }

    async fn kill(&mut self) -> Result<()> {
        self.kills.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
