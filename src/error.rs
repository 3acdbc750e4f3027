use std::error::Error;
use std::fmt;
use std::io;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, CobbleError>;

/// Coarse category of a [`CobbleError`], used to decide what a failure means to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or truncated binary input
    Decode,
    /// A value that cannot be represented on the wire
    Encode,
    /// Transport or filesystem failure
    Io,
    /// The peer broke the protocol
    Protocol,
    /// Missing world files, lost session lock, malformed metadata
    WorldIntegrity,
    /// An owning task has gone away
    Shutdown,
    /// Unusable server configuration
    Config,
}

#[derive(Debug)]
pub enum CobbleError {
    IoError(io::Error),
    DecodeError(String),
    EncodeError(String),
    ProtocolError(String),
    NotADirectory(PathBuf),
    MissingLevelData(PathBuf),
    MissingSessionLock(PathBuf),
    MalformedLevelData {
        path: PathBuf,
        source: Box<CobbleError>,
    },
    LockLost { expected: i64, found: i64 },
    ConfigError(String),
    ChannelClosed(&'static str),
    Context {
        message: String,
        source: Box<CobbleError>,
    },
}

impl CobbleError {
    pub fn decode(message: impl Into<String>) -> Self {
        CobbleError::DecodeError(message.into())
    }

    pub fn encode(message: impl Into<String>) -> Self {
        CobbleError::EncodeError(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CobbleError::IoError(_) => ErrorKind::Io,
            CobbleError::DecodeError(_) => ErrorKind::Decode,
            CobbleError::EncodeError(_) => ErrorKind::Encode,
            CobbleError::ProtocolError(_) => ErrorKind::Protocol,
            CobbleError::NotADirectory(_)
            | CobbleError::MissingLevelData(_)
            | CobbleError::MissingSessionLock(_)
            | CobbleError::MalformedLevelData { .. }
            | CobbleError::LockLost { .. } => ErrorKind::WorldIntegrity,
            CobbleError::ConfigError(_) => ErrorKind::Config,
            CobbleError::ChannelClosed(_) => ErrorKind::Shutdown,
            CobbleError::Context { source, .. } => source.kind(),
        }
    }

    /// True when the error only means the input ended early. Frame decoders use this to wait
    /// for more bytes instead of failing the connection.
    pub fn is_incomplete(&self) -> bool {
        match self {
            CobbleError::IoError(err) => err.kind() == io::ErrorKind::UnexpectedEof,
            CobbleError::Context { source, .. } => source.is_incomplete(),
            _ => false,
        }
    }

    /// Innermost error of a context chain, looking through wrapped metadata failures.
    pub fn root_cause(&self) -> &CobbleError {
        match self {
            CobbleError::Context { source, .. }
            | CobbleError::MalformedLevelData { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

impl fmt::Display for CobbleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CobbleError::IoError(err) => write!(f, "IO error: {}", err),
            CobbleError::DecodeError(msg) => write!(f, "Decode error: {}", msg),
            CobbleError::EncodeError(msg) => write!(f, "Encode error: {}", msg),
            CobbleError::ProtocolError(msg) => write!(f, "Protocol error: {}", msg),
            CobbleError::NotADirectory(path) => {
                write!(f, "World path {} is not a directory", path.display())
            }
            CobbleError::MissingLevelData(path) => {
                write!(f, "World {} is missing level.dat", path.display())
            }
            CobbleError::MissingSessionLock(path) => {
                write!(f, "World {} is missing session.lock", path.display())
            }
            CobbleError::MalformedLevelData { path, source } => {
                write!(f, "Malformed level data in {}: {}", path.display(), source)
            }
            CobbleError::LockLost { expected, found } => write!(
                f,
                "Session lock lost: expected timestamp {}, found {}",
                expected, found
            ),
            CobbleError::ConfigError(msg) => write!(f, "Config error: {}", msg),
            CobbleError::ChannelClosed(owner) => write!(f, "{} is no longer running", owner),
            CobbleError::Context { message, source } => write!(f, "{}\n-> {}", message, source),
        }
    }
}

impl Error for CobbleError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CobbleError::IoError(err) => Some(err),
            CobbleError::Context { source, .. }
            | CobbleError::MalformedLevelData { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl From<io::Error> for CobbleError {
    fn from(err: io::Error) -> Self {
        CobbleError::IoError(err)
    }
}

impl From<serde_json::Error> for CobbleError {
    fn from(err: serde_json::Error) -> Self {
        CobbleError::ConfigError(err.to_string())
    }
}

/// Attaches a message to an error while keeping the original as its source.
pub trait ResultExt<T> {
    fn context(self, message: impl Into<String>) -> Result<T>;
}

impl<T, E: Into<CobbleError>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|err| CobbleError::Context {
            message: message.into(),
            source: Box::new(err.into()),
        })
    }
}
