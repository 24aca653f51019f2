//! A scripted in-memory runtime for tests.
//!
//! Units never run anything. Their behavior comes from a [`MockScript`] and, by default, a
//! unit's logs echo the snippet it was given, which makes cross-request contamination visible.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use execbox_utils::CODE_ENV_VAR;

use super::{RuntimeError, RuntimeResult, SandboxRuntime, UnitHandle, UnitSpec};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// How a mock unit finishes.
#[derive(Debug, Clone)]
pub enum MockExit {
    /// Exits immediately with the code
    Code(i64),

    /// Exits with the code after the delay
    After(Duration, i64),

    /// Never exits on its own
    Hang,

    /// Waiting fails
    Fail(String),
}

/// What a mock unit prints.
#[derive(Debug, Clone)]
pub enum MockLogs {
    /// The snippet the unit was given
    EchoCode,

    /// Fixed bytes
    Fixed(Vec<u8>),

    /// Log retrieval fails
    Fail(String),
}

/// The scripted behavior of every unit a [`MockRuntime`] creates.
#[derive(Debug, Clone)]
pub struct MockScript {
    /// Images the runtime pretends not to have
    pub missing_images: Vec<String>,

    /// Time `create` takes before the unit exists
    pub create_delay: Duration,

    /// Makes `create` fail with an API error
    pub create_error: Option<String>,

    /// Makes `start` fail with an API error
    pub start_error: Option<String>,

    /// How units finish
    pub exit: MockExit,

    /// What units print
    pub logs: MockLogs,

    /// Makes `kill` fail
    pub kill_error: Option<String>,

    /// Time `remove` takes before the unit is gone
    pub remove_delay: Duration,

    /// Makes `remove` fail
    pub remove_error: Option<String>,
}

/// An in-memory [`SandboxRuntime`] that records every call.
#[derive(Debug)]
pub struct MockRuntime {
    script: MockScript,
    units: Mutex<HashMap<String, UnitSpec>>,
    specs: Mutex<Vec<UnitSpec>>,
    next_id: AtomicUsize,
    creates: AtomicUsize,
    starts: AtomicUsize,
    kills: AtomicUsize,
    log_reads: AtomicUsize,
    removes: AtomicUsize,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl MockRuntime {
    /// Creates a runtime whose units behave as scripted.
    pub fn new(script: MockScript) -> Self {
        Self {
            script,
            units: Mutex::new(HashMap::new()),
            specs: Mutex::new(Vec::new()),
            next_id: AtomicUsize::new(1),
            creates: AtomicUsize::new(0),
            starts: AtomicUsize::new(0),
            kills: AtomicUsize::new(0),
            log_reads: AtomicUsize::new(0),
            removes: AtomicUsize::new(0),
        }
    }

    /// Number of successful `create` calls.
    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    /// Number of `start` calls.
    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    /// Number of `kill` calls.
    pub fn kills(&self) -> usize {
        self.kills.load(Ordering::SeqCst)
    }

    /// Number of `logs` calls.
    pub fn log_reads(&self) -> usize {
        self.log_reads.load(Ordering::SeqCst)
    }

    /// Number of `remove` calls, failed ones included.
    pub fn removes(&self) -> usize {
        self.removes.load(Ordering::SeqCst)
    }

    /// Number of units created and not yet removed.
    pub fn live_units(&self) -> usize {
        self.units.lock().map(|units| units.len()).unwrap_or(0)
    }

    /// Every spec passed to `create`, in call order.
    pub fn specs(&self) -> Vec<UnitSpec> {
        self.specs
            .lock()
            .map(|specs| specs.clone())
            .unwrap_or_default()
    }

    fn unit(&self, handle: &UnitHandle) -> RuntimeResult<UnitSpec> {
        self.units
            .lock()
            .map_err(|e| RuntimeError::Api(e.to_string()))?
            .get(handle.get_id())
            .cloned()
            .ok_or_else(|| RuntimeError::Api(format!("no such unit: {}", handle.get_id())))
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl Default for MockScript {
    fn default() -> Self {
        Self {
            missing_images: Vec::new(),
            create_delay: Duration::ZERO,
            create_error: None,
            start_error: None,
            exit: MockExit::Code(0),
            logs: MockLogs::EchoCode,
            kill_error: None,
            remove_delay: Duration::ZERO,
            remove_error: None,
        }
    }
}

impl Default for MockRuntime {
    fn default() -> Self {
        Self::new(MockScript::default())
    }
}

#[async_trait]
impl SandboxRuntime for MockRuntime {
    async fn create(&self, spec: &UnitSpec) -> RuntimeResult<UnitHandle> {
        if let Ok(mut specs) = self.specs.lock() {
            specs.push(spec.clone());
        }

        if self.script.missing_images.contains(spec.get_image()) {
            return Err(RuntimeError::ImageNotFound(spec.get_image().clone()));
        }

        if let Some(error) = &self.script.create_error {
            return Err(RuntimeError::Api(error.clone()));
        }

        if !self.script.create_delay.is_zero() {
            tokio::time::sleep(self.script.create_delay).await;
        }

        let id = format!("mock-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.units
            .lock()
            .map_err(|e| RuntimeError::Api(e.to_string()))?
            .insert(id.clone(), spec.clone());
        self.creates.fetch_add(1, Ordering::SeqCst);

        Ok(UnitHandle::new(id, spec))
    }

    async fn start(&self, handle: &UnitHandle) -> RuntimeResult<()> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        self.unit(handle)?;
        match &self.script.start_error {
            Some(error) => Err(RuntimeError::Api(error.clone())),
            None => Ok(()),
        }
    }

    async fn wait(&self, handle: &UnitHandle) -> RuntimeResult<i64> {
        self.unit(handle)?;
        match &self.script.exit {
            MockExit::Code(code) => Ok(*code),
            MockExit::After(delay, code) => {
                tokio::time::sleep(*delay).await;
                Ok(*code)
            }
            MockExit::Hang => std::future::pending().await,
            MockExit::Fail(error) => Err(RuntimeError::Wait(error.clone())),
        }
    }

    async fn kill(&self, handle: &UnitHandle) -> RuntimeResult<()> {
        self.kills.fetch_add(1, Ordering::SeqCst);
        self.unit(handle)?;
        match &self.script.kill_error {
            Some(error) => Err(RuntimeError::Api(error.clone())),
            None => Ok(()),
        }
    }

    async fn logs(&self, handle: &UnitHandle) -> RuntimeResult<Vec<u8>> {
        self.log_reads.fetch_add(1, Ordering::SeqCst);
        let spec = self.unit(handle)?;
        match &self.script.logs {
            MockLogs::EchoCode => Ok(spec
                .env_value(CODE_ENV_VAR)
                .unwrap_or_default()
                .as_bytes()
                .to_vec()),
            MockLogs::Fixed(bytes) => Ok(bytes.clone()),
            MockLogs::Fail(error) => Err(RuntimeError::Api(error.clone())),
        }
    }

    async fn remove(&self, handle: &UnitHandle) -> RuntimeResult<()> {
        self.removes.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = &self.script.remove_error {
            return Err(RuntimeError::Api(error.clone()));
        }

        if !self.script.remove_delay.is_zero() {
            tokio::time::sleep(self.script.remove_delay).await;
        }

        self.units
            .lock()
            .map_err(|e| RuntimeError::Api(e.to_string()))?
            .remove(handle.get_id());
        Ok(())
    }
}
