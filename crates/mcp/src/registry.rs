//! Idempotent tool registration.
//!
//! [`CapabilityRegistry::initialize_once`] hands every tool from its sources to
//! a [`ToolHost`] exactly once per registry, however often and from however
//! many tasks it is called.

use std::{
    collections::HashSet,
    sync::{
        Mutex,
        atomic::{AtomicU8, Ordering},
    },
};

use tracing::{debug, info, warn};

#[cfg(feature = "metrics")]
use bolmcp_metrics::{counter, labels, mcp as mcp_metrics};

use crate::tool::{RegisteredTool, ToolSource};

/// Why a descriptor was refused before reaching the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    MissingName,
    MissingSchema,
    /// The schema is not a JSON object with `"type": "object"`.
    InvalidSchema,
    MissingHandler,
}

impl RejectReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingName => "missing_name",
            Self::MissingSchema => "missing_schema",
            Self::InvalidSchema => "invalid_schema",
            Self::MissingHandler => "missing_handler",
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::MissingName => "descriptor has no name",
            Self::MissingSchema => "descriptor has no parameter schema",
            Self::InvalidSchema => "parameter schema is not an object schema",
            Self::MissingHandler => "descriptor has no handler",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    #[error("tool '{0}' is already registered")]
    Duplicate(String),
    #[error("host refused tool '{name}': {message}")]
    Host { name: String, message: String },
}

/// Whatever exposes registered tools to remote callers.
pub trait ToolHost: Send + Sync {
    fn register(&self, tool: RegisteredTool) -> Result<(), RegistrationError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryState {
    Uninitialized,
    Initializing,
    Initialized,
}

const UNINITIALIZED: u8 = 0;
const INITIALIZING: u8 = 1;
const INITIALIZED: u8 = 2;

/// What one registration pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationReport {
    /// In registration order.
    pub registered: Vec<String>,
    pub duplicates: Vec<String>,
    pub rejected: Vec<(String, RejectReason)>,
    /// Name and host error message.
    pub failed: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitOutcome {
    /// This call ran the registration pass.
    Initialized(RegistrationReport),
    /// Another call already ran it or is running it.
    AlreadyInitialized,
}

/// Owns the tool sources and the set of names already handed to the host.
pub struct CapabilityRegistry {
    state: AtomicU8,
    sources: Vec<ToolSource>,
    registered: Mutex<HashSet<String>>,
}

impl CapabilityRegistry {
    /// Sources are registered in the given order; on a name clash the
    /// earlier tool wins.
    pub fn new(sources: Vec<ToolSource>) -> Self {
        Self {
            state: AtomicU8::new(UNINITIALIZED),
            sources,
            registered: Mutex::new(HashSet::new()),
        }
    }

    pub fn state(&self) -> RegistryState {
        match self.state.load(Ordering::Acquire) {
            UNINITIALIZED => RegistryState::Uninitialized,
            INITIALIZING => RegistryState::Initializing,
            _ => RegistryState::Initialized,
        }
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.registered
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(name)
    }

    pub fn registered_count(&self) -> usize {
        self.registered
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// Register every tool with `host`, once.
    pub fn initialize_once(&self, host: &dyn ToolHost) -> InitOutcome {
        if self
            .state
            .compare_exchange(
                UNINITIALIZED,
                INITIALIZING,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            debug!("tool registry already initialized, skipping registration");
            return InitOutcome::AlreadyInitialized;
        }

        let total: usize = self.sources.iter().map(|s| s.tools.len()).sum();
        info!(
            sources = self.sources.len(),
            descriptors = total,
            "registering tools"
        );

        let report = self.register_all(host);
        self.state.store(INITIALIZED, Ordering::Release);

        info!(
            registered = report.registered.len(),
            duplicates = report.duplicates.len(),
            rejected = report.rejected.len(),
            failed = report.failed.len(),
            "tool registration finished"
        );
        InitOutcome::Initialized(report)
    }

    fn register_all(&self, host: &dyn ToolHost) -> RegistrationReport {
        let mut report = RegistrationReport::default();
        let mut registered = self.registered.lock().unwrap_or_else(|e| e.into_inner());

        for source in &self.sources {
            for descriptor in &source.tools {
                let name = descriptor.name.trim().to_string();

                if !name.is_empty() && registered.contains(&name) {
                    warn!(tool = %name, source = %source.name, "already registered, skipping");
                    skipped("duplicate");
                    report.duplicates.push(name);
                    continue;
                }

                let tool = match descriptor.clone().validate() {
                    Ok(tool) => tool,
                    Err(reason) => {
                        warn!(tool = %name, source = %source.name, %reason, "rejected tool descriptor");
                        skipped(reason.as_str());
                        report.rejected.push((name, reason));
                        continue;
                    },
                };

                match host.register(tool) {
                    Ok(()) => {
                        debug!(tool = %name, source = %source.name, "registered tool");
                        #[cfg(feature = "metrics")]
                        counter!(mcp_metrics::TOOLS_REGISTERED_TOTAL).increment(1);
                        registered.insert(name.clone());
                        report.registered.push(name);
                    },
                    Err(e) => {
                        warn!(tool = %name, source = %source.name, error = %e, "host failed to register tool");
                        skipped("host_error");
                        report.failed.push((name, e.to_string()));
                    },
                }
            }
        }

        report
    }
}

impl std::fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityRegistry")
            .field("state", &self.state())
            .field("sources", &self.sources.len())
            .field("registered", &self.registered_count())
            .finish()
    }
}

#[cfg(feature = "metrics")]
fn skipped(reason: &'static str) {
    counter!(mcp_metrics::TOOLS_SKIPPED_TOTAL, labels::REASON => reason).increment(1);
}

#[cfg(not(feature = "metrics"))]
fn skipped(_reason: &'static str) {}
