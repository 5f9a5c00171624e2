//! Error types for bcache statistics collection.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::units::ParseError;

/// A failure that invalidates one statistic or one backing device.
///
/// None of these abort a collection cycle; the collector logs them and
/// carries on with the remaining statistics.
#[derive(Debug, Error)]
pub enum CollectError {
    /// A sysfs attribute held text that is not a valid number.
    #[error("malformed value in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    /// The `dev` link of a backing device could not be resolved.
    #[error("cannot resolve backing device link {}: {source}", path.display())]
    DeviceLink {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl CollectError {
    /// Path of the sysfs file the error relates to.
    pub fn path(&self) -> &Path {
        match self {
            CollectError::Parse { path, .. } | CollectError::DeviceLink { path, .. } => path,
        }
    }
}
