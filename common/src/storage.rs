//! Almacenamiento intermedio compartido.
//!
//! Los nombres de archivo son deterministas (`mr-<map>-<reduce>` y
//! `mr-out-<reduce>`) y toda escritura pasa por un archivo temporal que
//! después se renombra al nombre final, así un lector nunca ve un archivo
//! a medio escribir.

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use crate::error::{EngineError, EngineResult};
use crate::kv::KeyValue;
use crate::task::TaskIndex;

/// Nombre del artefacto que produce el map `map_index` para el bucket `reduce_index`.
pub fn intermediate_name(map_index: TaskIndex, reduce_index: TaskIndex) -> String {
    format!("mr-{}-{}", map_index, reduce_index)
}

/// Nombre del archivo final de la tarea reduce `reduce_index`.
pub fn output_name(reduce_index: TaskIndex) -> String {
    format!("mr-out-{}", reduce_index)
}

#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
    scratch_dir: Option<PathBuf>,
}

impl Storage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            scratch_dir: None,
        }
    }

    /// Directorio para los temporales. Tiene que estar en el mismo volumen
    /// que `root`, si no el rename deja de ser atómico.
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn intermediate_path(&self, map_index: TaskIndex, reduce_index: TaskIndex) -> PathBuf {
        self.root.join(intermediate_name(map_index, reduce_index))
    }

    pub fn output_path(&self, reduce_index: TaskIndex) -> PathBuf {
        self.root.join(output_name(reduce_index))
    }

    fn temp_dir_for(&self, dest: &Path) -> PathBuf {
        if let Some(dir) = &self.scratch_dir {
            return dir.clone();
        }
        match dest.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// Publica `bytes` en `dest`: escribe un temporal y lo renombra encima.
    /// Si dos workers publican lo mismo, gana el último rename y el
    /// contenido es idéntico.
    pub fn publish(&self, dest: &Path, bytes: &[u8]) -> EngineResult<()> {
        let dir = self.temp_dir_for(dest);
        let prefix = format!(
            "{}-",
            dest.file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "mr".to_string())
        );

        let mut tmp = tempfile::Builder::new()
            .prefix(&prefix)
            .tempfile_in(&dir)
            .map_err(|e| EngineError::io(&dir, e))?;

        tmp.write_all(bytes)
            .and_then(|_| tmp.flush())
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| EngineError::io(tmp.path(), e))?;

        tmp.persist(dest)
            .map_err(|e| EngineError::io(dest, e.error))?;
        Ok(())
    }

    /// Serializa los pares como un arreglo JSON y los publica.
    pub fn publish_pairs(&self, dest: &Path, bucket: usize, pairs: &[KeyValue]) -> EngineResult<()> {
        let bytes = serde_json::to_vec(pairs)
            .map_err(|source| EngineError::Serialize { bucket, source })?;
        self.publish(dest, &bytes)
    }

    /// Lee un artefacto intermedio. Que no exista es un error de la tarea.
    pub fn read_pairs(&self, path: &Path) -> EngineResult<Vec<KeyValue>> {
        let bytes = match fs::read(path) {
            Ok(b) => b,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(EngineError::MissingArtifact(path.to_path_buf()))
            }
            Err(e) => return Err(EngineError::io(path, e)),
        };

        serde_json::from_slice(&bytes).map_err(|source| EngineError::Malformed {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Borra un artefacto. Si ya no está (lo borró otro reduce duplicado)
    /// no es error.
    pub fn remove(&self, path: &Path) -> EngineResult<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(EngineError::io(path, e)),
        }
    }
}
