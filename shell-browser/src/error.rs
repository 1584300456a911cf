//! Error types for the shell browser.
//!
//! Host collaborators report failures as [`HostError`] (an HRESULT-style code
//! plus message). Navigation surfaces one [`BrowserError`] per failed request;
//! host callbacks answer with [`CallbackError`] and never panic across the
//! interop boundary.

use std::fmt;

use thiserror::Error;

#[cfg(feature = "tracing")]
use tracing::{error, warn};

/// Result type for browser operations.
pub type BrowserResult<T> = Result<T, BrowserError>;

/// Result type for host callback contracts.
pub type CallbackResult<T> = Result<T, CallbackError>;

/// HRESULT-style status codes understood by host collaborators.
pub mod hresult {
    /// Success.
    pub const S_OK: i32 = 0;
    /// Method not implemented.
    pub const E_NOTIMPL: i32 = 0x8000_4001_u32 as i32;
    /// Interface not supported.
    pub const E_NOINTERFACE: i32 = 0x8000_4002_u32 as i32;
    /// Unspecified failure.
    pub const E_FAIL: i32 = 0x8000_4005_u32 as i32;
    /// Access denied.
    pub const E_ACCESSDENIED: i32 = 0x8007_0005_u32 as i32;
    /// One or more arguments are invalid.
    pub const E_INVALIDARG: i32 = 0x8007_0057_u32 as i32;
    /// The system cannot find the file specified.
    pub const E_FILE_NOT_FOUND: i32 = 0x8007_0002_u32 as i32;
    /// The device is not ready (e.g. a drive without media).
    pub const E_NOT_READY: i32 = 0x8007_0015_u32 as i32;
    /// The operation was cancelled by the user.
    pub const E_CANCELLED: i32 = 0x8007_04C7_u32 as i32;
}

/// Failure reported by a host collaborator (namespace provider or view factory).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("host call failed with 0x{code:08X}: {message}")]
pub struct HostError {
    code: i32,
    message: String,
}

impl HostError {
    /// Create an error from a raw status code.
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// The user declined an operation (e.g. a removable-media prompt).
    pub fn cancelled() -> Self {
        Self::new(hresult::E_CANCELLED, "the operation was cancelled by the user")
    }

    /// Access was denied.
    pub fn access_denied(message: impl Into<String>) -> Self {
        Self::new(hresult::E_ACCESSDENIED, message)
    }

    /// Unspecified failure.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::new(hresult::E_FAIL, message)
    }

    /// Raw status code.
    pub fn code(&self) -> i32 {
        self.code
    }

    /// Human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Whether this is the "cancelled by the user" class of failure.
    ///
    /// Such failures are absorbed by the view session rather than treated as
    /// faults.
    pub fn is_cancelled(&self) -> bool {
        self.code == hresult::E_CANCELLED
    }
}

/// A navigation target could not be resolved to a folder.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindError {
    /// The item does not exist.
    #[error("no such item: {0}")]
    NotFound(String),
    /// The namespace provider refused access.
    #[error("access denied: {0}")]
    AccessDenied(String),
    /// The item exists but cannot be browsed as a folder.
    #[error("not a folder: {0}")]
    NotAFolder(String),
    /// The item is temporarily unreachable (revoked device, offline share).
    #[error("item unavailable: {0}")]
    Unavailable(String),
    /// The provider failed with a host status code.
    #[error("namespace provider failed: {0}")]
    Host(#[from] HostError),
}

/// A display name could not be produced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    /// The item has no name in the requested style.
    #[error("no display name for {0}")]
    Unavailable(String),
    /// The provider failed with a host status code.
    #[error("display name query failed: {0}")]
    Host(#[from] HostError),
}

/// Stage of view construction that failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewStage {
    /// Creating the view instance for a folder.
    View,
    /// Creating the view's window inside the embedding control.
    Window,
    /// UI-activating the new view.
    Activation,
}

impl fmt::Display for ViewStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ViewStage::View => "view instance",
            ViewStage::Window => "view window",
            ViewStage::Activation => "view activation",
        })
    }
}

/// View construction failed; the partially built view has been torn down.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("failed to create {stage}: {source}")]
pub struct ViewCreationFault {
    /// Where construction stopped.
    pub stage: ViewStage,
    /// What the host reported.
    pub source: HostError,
}

impl ViewCreationFault {
    /// Create a fault for a construction stage.
    pub fn new(stage: ViewStage, source: HostError) -> Self {
        Self { stage, source }
    }
}

/// Errors returned by browser operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BrowserError {
    /// The target could not be bound to a folder.
    #[error("cannot bind navigation target: {0}")]
    Bind(#[from] BindError),
    /// A relative target could not be combined with the current folder.
    #[error("relative navigation unsupported: {reason}")]
    UnsupportedRelativeNavigation {
        /// Why the combination failed.
        reason: String,
    },
    /// The new view could not be built.
    #[error(transparent)]
    ViewCreation(#[from] ViewCreationFault),
    /// The operation needs a current folder and none has been committed yet.
    #[error("no folder has been navigated to yet")]
    NoCurrentFolder,
    /// The browser was closed, or its owning thread is gone.
    #[error("the browser's owning context has closed")]
    ContextClosed,
    /// A blocking hand-off was requested from the owning thread itself.
    #[error("cannot block on the owning context from within it")]
    OwningContextBusy,
    /// A display name could not be produced.
    #[error(transparent)]
    Name(#[from] NameError),
    /// A persisted setting could not be parsed.
    #[error("invalid setting {key}: {reason}")]
    Settings {
        /// Property key.
        key: String,
        /// Parse failure.
        reason: String,
    },
}

impl BrowserError {
    /// Create an unsupported-relative-navigation error.
    pub fn unsupported_relative(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        #[cfg(feature = "tracing")]
        warn!("Relative navigation unsupported: {}", reason);
        Self::UnsupportedRelativeNavigation { reason }
    }

    /// Create a settings error.
    pub fn settings(key: impl Into<String>, reason: impl Into<String>) -> Self {
        let key = key.into();
        let reason = reason.into();
        #[cfg(feature = "tracing")]
        warn!("Invalid setting {}: {}", key, reason);
        Self::Settings { key, reason }
    }

    /// Create a view creation error.
    pub fn view_creation(fault: ViewCreationFault) -> Self {
        #[cfg(feature = "tracing")]
        error!("View creation failed: {}", fault);
        Self::ViewCreation(fault)
    }
}

/// Answer to a host callback that could not be served.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackError {
    /// The contract is intentionally not implemented.
    #[error("not implemented")]
    NotImplemented,
    /// The requested capability is not offered.
    #[error("no such interface")]
    NoInterface,
    /// The arguments could not be interpreted.
    #[error("invalid argument")]
    InvalidArgument,
    /// The callback was understood but could not be served.
    #[error("callback failed")]
    Failed,
}

impl CallbackError {
    /// HRESULT-style code handed back to the host.
    pub fn hresult(self) -> i32 {
        match self {
            CallbackError::NotImplemented => hresult::E_NOTIMPL,
            CallbackError::NoInterface => hresult::E_NOINTERFACE,
            CallbackError::InvalidArgument => hresult::E_INVALIDARG,
            CallbackError::Failed => hresult::E_FAIL,
        }
    }
}
