//! Targets named on the command line or in manifests, the single-use
//! designated input stream, and the closed I/O failure classification.

use std::fmt;
use std::future::Future;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use thiserror::Error;
use tokio::io::AsyncRead;

/// Name that stands for the designated input stream.
pub const STDIN_SENTINEL: &str = "-";

pub type BoxReader = Box<dyn AsyncRead + Send + Unpin>;

/// A file path or the designated input stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Stdin,
    Path(PathBuf),
}

impl Target {
    /// A manifest target token, taken verbatim.
    pub fn parse(token: &str) -> Self {
        if token == STDIN_SENTINEL {
            Target::Stdin
        } else {
            Target::Path(PathBuf::from(token))
        }
    }

    /// A command-line argument; paths are normalized lexically.
    pub fn from_arg(arg: &str) -> Self {
        if arg == STDIN_SENTINEL {
            Target::Stdin
        } else {
            Target::Path(normalize(Path::new(arg)))
        }
    }

    pub fn is_stdin(&self) -> bool {
        matches!(self, Target::Stdin)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Stdin => f.write_str(STDIN_SENTINEL),
            Target::Path(p) => write!(f, "{}", p.display()),
        }
    }
}

/// Collapse `.` components, redundant separators, and `..` after a normal component.
fn normalize(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(comp),
            },
            _ => out.push(comp),
        }
    }
    if out.is_empty() {
        return PathBuf::from(".");
    }
    out.iter().collect()
}

/// Why a target could not be opened or read. Decided once, from the
/// `io::Error`, at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoKind {
    NotFound,
    PermissionDenied,
    IsADirectory,
    NotADirectory,
    /// The designated input stream was already taken by an earlier consumer.
    AlreadyConsumed,
    Other,
}

impl IoKind {
    pub fn classify(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => IoKind::NotFound,
            io::ErrorKind::PermissionDenied => IoKind::PermissionDenied,
            io::ErrorKind::IsADirectory => IoKind::IsADirectory,
            io::ErrorKind::NotADirectory => IoKind::NotADirectory,
            _ => IoKind::Other,
        }
    }

    /// Short error code printed in `FAILED <code>` lines.
    pub fn code(self) -> &'static str {
        match self {
            IoKind::NotFound => "ENOENT",
            IoKind::PermissionDenied => "EACCES",
            IoKind::IsADirectory => "EISDIR",
            IoKind::NotADirectory => "ENOTDIR",
            IoKind::AlreadyConsumed => "EINUSE",
            IoKind::Other => "EIO",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TargetError {
    pub kind: IoKind,
    message: String,
}

impl TargetError {
    pub fn from_io(err: &io::Error) -> Self {
        let kind = IoKind::classify(err);
        let message = match kind {
            IoKind::NotFound => "No such file or directory".to_string(),
            IoKind::PermissionDenied => "Permission denied".to_string(),
            IoKind::IsADirectory => "Is a directory".to_string(),
            IoKind::NotADirectory => "Not a directory".to_string(),
            IoKind::AlreadyConsumed | IoKind::Other => err.to_string(),
        };
        Self { kind, message }
    }

    pub fn already_consumed() -> Self {
        Self {
            kind: IoKind::AlreadyConsumed,
            message: "standard input was already consumed".to_string(),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self {
            kind: IoKind::Other,
            message: message.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }
}

impl From<io::Error> for TargetError {
    fn from(err: io::Error) -> Self {
        Self::from_io(&err)
    }
}

/// Take-once handle on the designated input stream.
pub struct SharedInput {
    reader: Mutex<Option<BoxReader>>,
}

impl SharedInput {
    pub fn stdin() -> Self {
        Self::from_reader(tokio::io::stdin())
    }

    pub fn from_reader<R>(reader: R) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        Self {
            reader: Mutex::new(Some(Box::new(reader))),
        }
    }

    /// Hand out the stream; every later call fails with `AlreadyConsumed`.
    pub fn take(&self) -> Result<BoxReader, TargetError> {
        self.reader
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or_else(TargetError::already_consumed)
    }
}

impl fmt::Debug for SharedInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedInput").finish_non_exhaustive()
    }
}

/// Opens named targets. The filesystem is the production source; tests
/// substitute in-memory or delayed sources.
pub trait TargetSource: Send + Sync + 'static {
    fn open(&self, path: &Path) -> impl Future<Output = io::Result<BoxReader>> + Send;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FsTargets;

impl TargetSource for FsTargets {
    fn open(&self, path: &Path) -> impl Future<Output = io::Result<BoxReader>> + Send {
        let path = path.to_path_buf();
        async move {
            let file = tokio::fs::File::open(&path).await?;
            Ok(Box::new(file) as BoxReader)
        }
    }
}

/// A target whose stream has been reserved in discovery order. The input
/// stream is taken at claim time; files are opened later, inside the task.
pub enum Claim {
    Ready(Result<BoxReader, TargetError>),
    Deferred(PathBuf),
}

impl fmt::Debug for Claim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Claim::Ready(Ok(_)) => f.write_str("Claim::Ready(Ok(..))"),
            Claim::Ready(Err(e)) => write!(f, "Claim::Ready(Err({e:?}))"),
            Claim::Deferred(p) => write!(f, "Claim::Deferred({})", p.display()),
        }
    }
}

/// Target source plus the shared input stream.
#[derive(Debug)]
pub struct Targets<S = FsTargets> {
    source: S,
    input: SharedInput,
}

impl Targets<FsTargets> {
    /// Real files and the process's standard input.
    pub fn system() -> Self {
        Self::new(FsTargets, SharedInput::stdin())
    }
}

impl<S: TargetSource> Targets<S> {
    pub fn new(source: S, input: SharedInput) -> Self {
        Self { source, input }
    }

    /// Reserve `target`. Claiming `-` a second time yields `AlreadyConsumed`.
    pub fn claim(&self, target: &Target) -> Claim {
        match target {
            Target::Stdin => Claim::Ready(self.input.take()),
            Target::Path(p) => Claim::Deferred(p.clone()),
        }
    }

    pub async fn open(&self, claim: Claim) -> Result<BoxReader, TargetError> {
        match claim {
            Claim::Ready(res) => res,
            Claim::Deferred(path) => self
                .source
                .open(&path)
                .await
                .map_err(|e| TargetError::from_io(&e)),
        }
    }
}
