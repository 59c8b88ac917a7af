//! Premium credential gate.
//!
//! The HD tier runs on a model that needs a paid key. The gate remembers
//! whether such a key is believed to be selected and drives the hosting
//! environment's key picker when it is not. The environment capability is
//! optional: without one the gate never blocks and Standard generation keeps
//! working.

use crate::error::{PinProError, Result};
use async_trait::async_trait;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// A key chosen at runtime, shared between the picker and the providers.
#[derive(Debug, Clone, Default)]
pub struct KeySlot(Arc<RwLock<Option<String>>>);

impl KeySlot {
    /// Returns the selected key, if any.
    pub fn get(&self) -> Option<String> {
        self.0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Stores a selected key.
    pub fn set(&self, key: impl Into<String>) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = Some(key.into());
    }

    /// Forgets the selected key.
    pub fn clear(&self) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Whether a key is currently selected.
    pub fn is_set(&self) -> bool {
        self.0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

/// Credential capability offered by the hosting environment.
#[async_trait]
pub trait KeyEnvironment: Send + Sync {
    /// Whether a paid key is currently selected.
    async fn has_selected_api_key(&self) -> Result<bool>;

    /// Opens the interactive key picker.
    ///
    /// Returns nothing on success; the caller cannot confirm what was picked.
    async fn open_select_key(&self) -> Result<()>;

    /// Drops a key the provider rejected, so it is neither reported as
    /// selected nor sent again.
    fn forget_selected_key(&self) {}
}

/// Tracks whether a premium credential is believed to be active.
pub struct ApiKeyGate {
    environment: Option<Arc<dyn KeyEnvironment>>,
    credentialed: bool,
}

impl std::fmt::Debug for ApiKeyGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyGate")
            .field("has_environment", &self.environment.is_some())
            .field("credentialed", &self.credentialed)
            .finish()
    }
}

impl Default for ApiKeyGate {
    fn default() -> Self {
        Self::detached()
    }
}

impl ApiKeyGate {
    /// Creates a gate backed by an environment capability.
    pub fn new(environment: Arc<dyn KeyEnvironment>) -> Self {
        Self {
            environment: Some(environment),
            credentialed: false,
        }
    }

    /// Creates a gate with no environment capability.
    pub fn detached() -> Self {
        Self {
            environment: None,
            credentialed: false,
        }
    }

    /// Cached credential state.
    pub fn is_credentialed(&self) -> bool {
        self.credentialed
    }

    /// Asks the environment whether a premium key is selected.
    ///
    /// `None` means the environment cannot answer; the cached state is left
    /// alone in that case.
    pub async fn has_active_credential(&mut self) -> Option<bool> {
        let environment = self.environment.as_ref()?;
        match environment.has_selected_api_key().await {
            Ok(selected) => {
                self.credentialed = selected;
                Some(selected)
            }
            Err(e) => {
                tracing::debug!("key environment unavailable: {e}");
                None
            }
        }
    }

    /// Runs the interactive key picker.
    ///
    /// A picker that returns without error is taken as a successful
    /// selection even though the environment confirms nothing.
    pub async fn request_credential_selection(&mut self) -> Result<()> {
        let Some(environment) = self.environment.as_ref() else {
            tracing::debug!("no key environment; skipping key selection");
            return Ok(());
        };
        match environment.open_select_key().await {
            Ok(()) => {
                self.credentialed = true;
                tracing::info!("premium key selection completed");
                Ok(())
            }
            Err(e) => {
                tracing::warn!("key selection failed: {e}");
                Err(match e {
                    PinProError::GateInteraction(_) => e,
                    other => PinProError::GateInteraction(other.to_string()),
                })
            }
        }
    }

    /// Drops the credential after the provider rejected it, including the
    /// key held by the environment.
    pub fn invalidate(&mut self) {
        if self.credentialed {
            tracing::info!("premium credential rejected by provider; reselection required");
        }
        if let Some(environment) = &self.environment {
            environment.forget_selected_key();
        }
        self.credentialed = false;
    }
}

/// Key picker that prompts on the terminal and stores the answer in a
/// [`KeySlot`].
#[derive(Debug, Clone)]
pub struct TerminalKeyEnvironment {
    slot: KeySlot,
}

impl TerminalKeyEnvironment {
    /// Creates a picker writing into `slot`.
    pub fn new(slot: KeySlot) -> Self {
        Self { slot }
    }
}

#[async_trait]
impl KeyEnvironment for TerminalKeyEnvironment {
    async fn has_selected_api_key(&self) -> Result<bool> {
        Ok(self.slot.is_set())
    }

    async fn open_select_key(&self) -> Result<()> {
        let mut stderr = tokio::io::stderr();
        stderr
            .write_all(b"2K output needs a paid Gemini API key.\nPaste key: ")
            .await?;
        stderr.flush().await?;

        let mut line = String::new();
        let read = BufReader::new(tokio::io::stdin())
            .read_line(&mut line)
            .await?;
        let key = line.trim();
        if read == 0 || key.is_empty() {
            return Err(PinProError::GateInteraction("no key entered".into()));
        }
        self.slot.set(key);
        Ok(())
    }

    fn forget_selected_key(&self) {
        self.slot.clear();
    }
}
