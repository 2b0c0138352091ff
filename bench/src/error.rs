//! Error type shared by configuration, bootstrap and the backends.

use bench_core::id::IdError;
use thiserror::Error;

/// Boxed driver error carried as the source of a [`BenchError`].
pub type Source = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T, E = BenchError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BenchError {
    /// An environment value could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Opening a connection or client failed.
    #[error("failed to connect to {backend}")]
    Connect {
        backend: &'static str,
        #[source]
        source: Source,
    },

    /// The accounting engine could not be formatted, started or reached.
    #[error("engine startup failed: {0}")]
    Startup(String),

    /// Schema setup, clearing or inserting failed.
    #[error("{backend}: {step} failed")]
    Write {
        backend: &'static str,
        step: &'static str,
        #[source]
        source: Source,
    },

    /// A lookup failed.
    #[error("{backend}: {step} failed")]
    Read {
        backend: &'static str,
        step: &'static str,
        #[source]
        source: Source,
    },

    #[error(transparent)]
    Id(#[from] IdError),

    #[error("{backend} support is not compiled in (rebuild with `--features {feature}`)")]
    FeatureDisabled {
        backend: &'static str,
        feature: &'static str,
    },
}

impl BenchError {
    pub fn connect(backend: &'static str, source: impl Into<Source>) -> Self {
        BenchError::Connect {
            backend,
            source: source.into(),
        }
    }

    pub fn write(backend: &'static str, step: &'static str, source: impl Into<Source>) -> Self {
        BenchError::Write {
            backend,
            step,
            source: source.into(),
        }
    }

    pub fn read(backend: &'static str, step: &'static str, source: impl Into<Source>) -> Self {
        BenchError::Read {
            backend,
            step,
            source: source.into(),
        }
    }
}
