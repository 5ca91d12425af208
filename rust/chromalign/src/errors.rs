use std::fmt::Display;

/// Errors that abort a unit of work before it produces any output.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: &'static str,
    },
    /// A raw data file shows up in more than one input peak list.
    DuplicateDataFile {
        file: String,
    },
    UnknownPeakModel {
        name: String,
    },
    /// Normalizing by total ion current needs the scans of every file.
    MissingScanSource {
        file: String,
    },
    Deserialization {
        msg: String,
    },
}

impl ConfigurationError {
    pub fn invalid(name: &'static str, value: impl Display, reason: &'static str) -> Self {
        Self::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }
}

impl Display for ConfigurationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidParameter {
                name,
                value,
                reason,
            } => write!(f, "Invalid value {} for parameter '{}': {}", value, name, reason),
            Self::DuplicateDataFile { file } => write!(
                f,
                "Cannot run alignment, because file {} is present in multiple peak lists",
                file
            ),
            Self::UnknownPeakModel { name } => write!(f, "Unknown peak filling model '{}'", name),
            Self::MissingScanSource { file } => {
                write!(f, "No scan source was provided for data file {}", file)
            }
            Self::Deserialization { msg } => write!(f, "Error parsing parameters: {}", msg),
        }
    }
}

impl From<serde_json::Error> for ConfigurationError {
    fn from(val: serde_json::Error) -> Self {
        ConfigurationError::Deserialization {
            msg: val.to_string(),
        }
    }
}

/// Failures reading or writing the underlying scan data store.
#[derive(Debug)]
pub enum DataAccessError {
    ScanNotFound {
        file: String,
        scan_number: u32,
    },
    Io {
        source: std::io::Error,
        context: String,
    },
    Store {
        file: String,
        msg: String,
    },
}

impl Display for DataAccessError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ScanNotFound { file, scan_number } => {
                write!(f, "Scan #{} not found in {}", scan_number, file)
            }
            Self::Io { source, context } => write!(f, "I/O error ({}): {}", context, source),
            Self::Store { file, msg } => write!(f, "Scan store error for {}: {}", file, msg),
        }
    }
}

#[derive(Debug)]
pub enum ChromAlignError {
    Configuration(ConfigurationError),
    DataAccess(DataAccessError),
    /// Cooperative stop requested through a [`crate::task::CancellationToken`].
    /// Not a failure, but no partial output may be published.
    Cancelled,
}

impl Display for ChromAlignError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration(e) => write!(f, "Configuration error: {}", e),
            Self::DataAccess(e) => write!(f, "Data access error: {}", e),
            Self::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl std::error::Error for ChromAlignError {}

impl ChromAlignError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<ConfigurationError> for ChromAlignError {
    fn from(e: ConfigurationError) -> Self {
        ChromAlignError::Configuration(e)
    }
}

impl From<DataAccessError> for ChromAlignError {
    fn from(e: DataAccessError) -> Self {
        ChromAlignError::DataAccess(e)
    }
}

impl From<std::io::Error> for DataAccessError {
    fn from(x: std::io::Error) -> Self {
        Self::Io {
            source: x,
            context: "".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ChromAlignError>;
