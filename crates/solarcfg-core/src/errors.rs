use solarcfg_core_types::RequestId;
use thiserror::Error;

/// Result type alias using ReconcileError
pub type Result<T> = std::result::Result<T, ReconcileError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code used in structured log events
/// (`err_code`) and printed by the CLI next to failed commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Local validation
    InvalidFieldValue,
    InvalidEnumValue,
    UnknownField,
    ConstraintViolation,
    EditGateClosed,

    // Lifecycle
    NotLoaded,
    OperationInProgress,
    Unmounted,

    // Round-trips
    LoadFailed,
    SaveFailed,
    CascadeRefreshFailed,
    InvalidPayload,

    // Configuration
    Configuration,

    // Internal
    InvalidTransition,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidFieldValue => "ERR_INVALID_FIELD_VALUE",
            ExErrorKind::InvalidEnumValue => "ERR_INVALID_ENUM_VALUE",
            ExErrorKind::UnknownField => "ERR_UNKNOWN_FIELD",
            ExErrorKind::ConstraintViolation => "ERR_CONSTRAINT_VIOLATION",
            ExErrorKind::EditGateClosed => "ERR_EDIT_GATE_CLOSED",
            ExErrorKind::NotLoaded => "ERR_NOT_LOADED",
            ExErrorKind::OperationInProgress => "ERR_OPERATION_IN_PROGRESS",
            ExErrorKind::Unmounted => "ERR_UNMOUNTED",
            ExErrorKind::LoadFailed => "ERR_LOAD_FAILED",
            ExErrorKind::SaveFailed => "ERR_SAVE_FAILED",
            ExErrorKind::CascadeRefreshFailed => "ERR_CASCADE_REFRESH_FAILED",
            ExErrorKind::InvalidPayload => "ERR_INVALID_PAYLOAD",
            ExErrorKind::Configuration => "ERR_CONFIGURATION",
            ExErrorKind::InvalidTransition => "ERR_INVALID_TRANSITION",
        }
    }
}

/// Canonical structured error type
///
/// Carries a stable kind plus optional context for logging and CLI output.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    resource: Option<String>,
    field: Option<String>,
    status: Option<u16>,
    request_id: Option<RequestId>,
    message: String,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            resource: None,
            field: None,
            status: None,
            request_id: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add resource context
    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    /// Add field context
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Add HTTP status context
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Add request ID context
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn resource(&self) -> Option<&str> {
        self.resource.as_deref()
    }

    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(resource) = &self.resource {
            write!(f, " (resource: {})", resource)?;
        }
        if let Some(field) = &self.field {
            write!(f, " (field: {})", field)?;
        }
        if let Some(status) = self.status {
            write!(f, " (status: {})", status)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Failure reported by the transport collaborator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// No response was received (connectivity, timeout, DNS)
    #[error("{message}")]
    Network { message: String },

    /// The server answered with a failure status
    #[error("{status} {status_text}")]
    Http {
        status: u16,
        status_text: String,
        /// `error` string from a structured JSON body, if any
        server_message: Option<String>,
    },

    /// A success response whose body is not JSON
    #[error("invalid response body: {message}")]
    InvalidBody { message: String },
}

impl TransportError {
    pub fn network(message: impl Into<String>) -> Self {
        TransportError::Network {
            message: message.into(),
        }
    }

    pub fn invalid_body(message: impl Into<String>) -> Self {
        TransportError::InvalidBody {
            message: message.into(),
        }
    }

    pub fn http(status: u16, status_text: impl Into<String>) -> Self {
        TransportError::Http {
            status,
            status_text: status_text.into(),
            server_message: None,
        }
    }

    /// Attach the structured `body.error` message of an HTTP failure
    pub fn with_server_message(self, message: impl Into<String>) -> Self {
        match self {
            TransportError::Http {
                status,
                status_text,
                ..
            } => TransportError::Http {
                status,
                status_text,
                server_message: Some(message.into()),
            },
            other => other,
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, TransportError::Network { .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Http { status, .. } => Some(*status),
            TransportError::Network { .. } | TransportError::InvalidBody { .. } => None,
        }
    }

    pub fn server_message(&self) -> Option<&str> {
        match self {
            TransportError::Http { server_message, .. } => server_message.as_deref(),
            TransportError::Network { .. } | TransportError::InvalidBody { .. } => None,
        }
    }

    /// Text shown to the operator: the server's own message when present,
    /// otherwise the status line or the network failure.
    pub fn detail(&self) -> String {
        match self.server_message() {
            Some(message) => message.to_string(),
            None => self.to_string(),
        }
    }
}

/// Reconciliation error taxonomy
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReconcileError {
    // ===== Local validation =====
    /// Working value cannot be parsed as the field's declared kind
    #[error("Invalid value for {field}: {reason}")]
    InvalidFieldValue {
        field: String,
        raw: String,
        reason: String,
    },

    /// Enum value outside of the allowed set
    #[error("Invalid value for {field}: {value} is not one of [{}]", allowed.join(", "))]
    InvalidEnumValue {
        field: String,
        value: String,
        allowed: Vec<String>,
    },

    /// Field name absent from the resource schema
    #[error("Unknown field {field} for {resource}")]
    UnknownField { resource: String, field: String },

    /// Proposed state breaks a cross-field rule
    #[error("{detail}")]
    ConstraintViolation {
        resource: String,
        rule: String,
        detail: String,
    },

    /// Only gated fields differ and the gate is closed
    #[error("{reason}")]
    EditGateClosed {
        resource: String,
        reason: String,
        withheld: Vec<String>,
    },

    // ===== Lifecycle =====
    /// Resource has no confirmed snapshot yet
    #[error("{resource} has not been loaded")]
    NotLoaded { resource: String },

    /// A load or save of the same resource is still in flight
    #[error("An operation on {resource} is already in progress")]
    OperationInProgress { resource: String },

    /// The owning screen was unmounted; the response was dropped
    #[error("Screen unmounted; response for {resource} ignored")]
    Unmounted { resource: String },

    // ===== Round-trips =====
    /// Fetch failed
    #[error("Failed to load {resource}: {cause}")]
    LoadFailed {
        resource: String,
        cause: TransportError,
    },

    /// Submit failed; the working copy is untouched
    #[error("Failed to save {resource}: {}", cause.detail())]
    SaveFailed {
        resource: String,
        cause: TransportError,
    },

    /// Save landed but the dependent refresh did not
    #[error("{saved} saved, but refreshing {resource} failed: {cause}")]
    CascadeRefreshFailed {
        saved: String,
        resource: String,
        cause: TransportError,
    },

    /// Server answered with something that is not a configuration record
    #[error("Invalid payload for {resource}: {reason}")]
    InvalidPayload { resource: String, reason: String },

    // ===== Internal =====
    /// Cascade state machine misuse
    #[error("Invalid cascade transition: {event} while {from}")]
    InvalidTransition { from: String, event: String },
}

impl ReconcileError {
    pub fn kind(&self) -> ExErrorKind {
        match self {
            ReconcileError::InvalidFieldValue { .. } => ExErrorKind::InvalidFieldValue,
            ReconcileError::InvalidEnumValue { .. } => ExErrorKind::InvalidEnumValue,
            ReconcileError::UnknownField { .. } => ExErrorKind::UnknownField,
            ReconcileError::ConstraintViolation { .. } => ExErrorKind::ConstraintViolation,
            ReconcileError::EditGateClosed { .. } => ExErrorKind::EditGateClosed,
            ReconcileError::NotLoaded { .. } => ExErrorKind::NotLoaded,
            ReconcileError::OperationInProgress { .. } => ExErrorKind::OperationInProgress,
            ReconcileError::Unmounted { .. } => ExErrorKind::Unmounted,
            ReconcileError::LoadFailed { .. } => ExErrorKind::LoadFailed,
            ReconcileError::SaveFailed { .. } => ExErrorKind::SaveFailed,
            ReconcileError::CascadeRefreshFailed { .. } => ExErrorKind::CascadeRefreshFailed,
            ReconcileError::InvalidPayload { .. } => ExErrorKind::InvalidPayload,
            ReconcileError::InvalidTransition { .. } => ExErrorKind::InvalidTransition,
        }
    }

    /// Text of the error notification raised for this failure.
    ///
    /// `resource_label` names the form the operator acted on; it prefixes
    /// local validation failures, which carry only a field name.
    pub fn notification_text(&self, resource_label: &str) -> String {
        match self {
            ReconcileError::LoadFailed { cause, .. } => {
                format!("Failed to load configuration: {}", cause)
            }
            ReconcileError::SaveFailed { .. } | ReconcileError::CascadeRefreshFailed { .. } => {
                self.to_string()
            }
            other => format!("Failed to save {}: {}", resource_label, other),
        }
    }
}

impl From<ReconcileError> for ExError {
    fn from(err: ReconcileError) -> Self {
        let kind = err.kind();
        let message = err.to_string();
        let base = ExError::new(kind).with_message(message);
        match err {
            ReconcileError::InvalidFieldValue { field, .. }
            | ReconcileError::InvalidEnumValue { field, .. } => {
                base.with_op("coerce").with_field(field)
            }
            ReconcileError::UnknownField { resource, field } => {
                base.with_resource(resource).with_field(field)
            }
            ReconcileError::ConstraintViolation { resource, .. } => {
                base.with_op("validate").with_resource(resource)
            }
            ReconcileError::EditGateClosed { resource, .. }
            | ReconcileError::NotLoaded { resource }
            | ReconcileError::OperationInProgress { resource }
            | ReconcileError::InvalidPayload { resource, .. }
            | ReconcileError::Unmounted { resource } => base.with_resource(resource),
            ReconcileError::LoadFailed { resource, cause } => {
                with_status(base.with_op("load").with_resource(resource), &cause)
            }
            ReconcileError::SaveFailed { resource, cause } => {
                with_status(base.with_op("save").with_resource(resource), &cause)
            }
            ReconcileError::CascadeRefreshFailed {
                resource, cause, ..
            } => with_status(
                base.with_op("cascade_refresh").with_resource(resource),
                &cause,
            ),
            ReconcileError::InvalidTransition { .. } => base.with_op("cascade"),
        }
    }
}

fn with_status(err: ExError, cause: &TransportError) -> ExError {
    match cause.status() {
        Some(status) => err.with_status(status),
        None => err,
    }
}
