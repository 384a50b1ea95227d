use std::fmt;

/// Errors raised anywhere in the dashboard, from CSV import to chart output
///
/// Messages shown to end users are Italian, matching the rest of the dashboard.
#[derive(Debug)]
pub enum DashboardError {
    /// Transport-level failure (connection refused, timeout, TLS...)
    Http(String),

    /// The backend answered with a non-success status
    Status { code: u16, detail: String },

    /// A payload decoded but broke one of its invariants
    InvalidPayload { entity: &'static str, reason: String },

    /// A survey record in an import file is out of range
    InvalidRecord {
        file: String,
        line: u64,
        reason: String,
    },

    Io(std::io::Error),
    Csv(csv::Error),
    Json(serde_json::Error),
    Snapshot(String),
    Chart(String),
    Export(String),

    /// Missing or expired session
    Unauthorized,

    /// Credentials were checked and rejected, or editing is disabled
    Forbidden(String),

    NotFound(String),
    BadRequest(String),

    /// A load is already in flight for this view
    Busy,

    /// The owning view was torn down before the operation finished
    Cancelled,
}

pub type Result<T> = std::result::Result<T, DashboardError>;

impl DashboardError {
    pub fn invalid(entity: &'static str, reason: impl Into<String>) -> Self {
        DashboardError::InvalidPayload {
            entity,
            reason: reason.into(),
        }
    }

    /// HTTP status code used when the error crosses the server boundary
    pub fn status_code(&self) -> u16 {
        match self {
            DashboardError::BadRequest(_)
            | DashboardError::InvalidPayload { .. }
            | DashboardError::InvalidRecord { .. }
            | DashboardError::Csv(_) => 400,
            DashboardError::Unauthorized => 401,
            DashboardError::Forbidden(_) => 403,
            DashboardError::NotFound(_) => 404,
            DashboardError::Busy => 409,
            DashboardError::Status { code, .. } => *code,
            _ => 500,
        }
    }
}

impl fmt::Display for DashboardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DashboardError::Http(msg) => write!(f, "errore di rete: {}", msg),
            DashboardError::Status { code, detail } => {
                write!(f, "il server ha risposto {}: {}", code, detail)
            }
            DashboardError::InvalidPayload { entity, reason } => {
                write!(f, "dati non validi in {}: {}", entity, reason)
            }
            DashboardError::InvalidRecord { file, line, reason } => {
                write!(f, "{} riga {}: {}", file, line, reason)
            }
            DashboardError::Io(e) => write!(f, "errore di I/O: {}", e),
            DashboardError::Csv(e) => write!(f, "errore CSV: {}", e),
            DashboardError::Json(e) => write!(f, "errore JSON: {}", e),
            DashboardError::Snapshot(msg) => write!(f, "errore snapshot: {}", msg),
            DashboardError::Chart(msg) => write!(f, "errore nel disegno del grafico: {}", msg),
            DashboardError::Export(msg) => write!(f, "errore di esportazione: {}", msg),
            DashboardError::Unauthorized => write!(f, "sessione mancante o scaduta"),
            DashboardError::Forbidden(msg) => write!(f, "{}", msg),
            DashboardError::NotFound(msg) => write!(f, "{}", msg),
            DashboardError::BadRequest(msg) => write!(f, "{}", msg),
            DashboardError::Busy => write!(f, "caricamento già in corso"),
            DashboardError::Cancelled => write!(f, "operazione annullata"),
        }
    }
}

impl std::error::Error for DashboardError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DashboardError::Io(e) => Some(e),
            DashboardError::Csv(e) => Some(e),
            DashboardError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for DashboardError {
    fn from(e: std::io::Error) -> Self {
        DashboardError::Io(e)
    }
}

impl From<csv::Error> for DashboardError {
    fn from(e: csv::Error) -> Self {
        DashboardError::Csv(e)
    }
}

impl From<serde_json::Error> for DashboardError {
    fn from(e: serde_json::Error) -> Self {
        DashboardError::Json(e)
    }
}

impl From<bincode::Error> for DashboardError {
    fn from(e: bincode::Error) -> Self {
        DashboardError::Snapshot(e.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for DashboardError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        DashboardError::Export(e.to_string())
    }
}

impl<E: std::error::Error + Send + Sync> From<plotters::drawing::DrawingAreaErrorKind<E>>
    for DashboardError
{
    fn from(e: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        DashboardError::Chart(e.to_string())
    }
}

#[cfg(feature = "web")]
impl From<reqwest::Error> for DashboardError {
    fn from(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            DashboardError::Status {
                code: status.as_u16(),
                detail: e.to_string(),
            }
        } else if e.is_decode() {
            DashboardError::InvalidPayload {
                entity: "risposta",
                reason: e.to_string(),
            }
        } else {
            DashboardError::Http(e.to_string())
        }
    }
}
