use core::fmt::{Display, Formatter};

/// Every way an operation on a FAT12 volume can fail.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FsError {
    /// A parameter was empty, malformed or too small for the request.
    InvalidArgument,
    /// No entry carries the requested name.
    NotFound,
    /// The entry is a directory, a volume label or an empty file.
    IsDirectory,
    /// The boot sector or the allocation tables were refused at mount time.
    InvalidVolume,
    /// The entry owns no usable cluster chain.
    InvalidChain,
    /// The chain leaves the table, hits a reserved cluster or never terminates.
    CorruptChain,
    /// A seek landed outside `[0, size]`.
    OutOfRange,
    /// Only the root directory can be opened.
    NotSupported,
    /// The backing store could not serve the read.
    Unavailable,
}

impl Display for FsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            FsError::InvalidArgument => write!(f, "invalid argument"),
            FsError::NotFound => write!(f, "no such file"),
            FsError::IsDirectory => write!(f, "is a directory"),
            FsError::InvalidVolume => write!(f, "invalid FAT12 volume"),
            FsError::InvalidChain => write!(f, "invalid cluster chain"),
            FsError::CorruptChain => write!(f, "corrupt cluster chain"),
            FsError::OutOfRange => write!(f, "position out of range"),
            FsError::NotSupported => write!(f, "operation not supported"),
            FsError::Unavailable => write!(f, "backing store unavailable"),
        }
    }
}

pub type FsResult<T> = core::result::Result<T, FsError>;
