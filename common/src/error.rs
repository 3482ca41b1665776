use std::{io, path::PathBuf};

use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

/// Fallos al ejecutar una tarea. Todos terminan en un reporte `Error`,
/// nunca tiran abajo el proceso del worker.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("no se pudo leer la entrada {path}: {source}")]
    ReadInput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("falta el artefacto intermedio {0}")]
    MissingArtifact(PathBuf),

    #[error("artefacto intermedio malformado {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("error serializando bucket {bucket}: {source}")]
    Serialize {
        bucket: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("error de E/S en {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("tarea inválida: {0}")]
    InvalidTask(String),
}

impl EngineError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
