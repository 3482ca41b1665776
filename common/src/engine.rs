use std::{fs, path::PathBuf};

use crate::apps::MapReduceApp;
use crate::error::{EngineError, EngineResult};
use crate::kv::{bucket_for, KeyValue};
use crate::storage::Storage;
use crate::task::{Assignment, Phase, Task};

/* =========================
   Map
   ========================= */

/// Reparte los pares en `n_reduce` buckets según `ihash(key) % n_reduce`.
/// El orden dentro de cada bucket no importa.
pub fn partition(pairs: Vec<KeyValue>, n_reduce: usize) -> Vec<Vec<KeyValue>> {
    let mut buckets: Vec<Vec<KeyValue>> = vec![Vec::new(); n_reduce];
    for kv in pairs {
        let b = bucket_for(&kv.key, n_reduce);
        buckets[b].push(kv);
    }
    buckets
}

/// Ejecuta una tarea map completa:
///   1. lee el archivo de entrada entero
///   2. aplica `map`
///   3. particiona por bucket
///   4. publica `mr-<i>-<j>` para cada bucket, aunque esté vacío
///
/// Devuelve las rutas publicadas.
pub fn run_map<A>(app: &A, storage: &Storage, task: &Task) -> EngineResult<Vec<PathBuf>>
where
    A: MapReduceApp + ?Sized,
{
    if task.n_reduce == 0 {
        return Err(EngineError::InvalidTask("n_reduce = 0".to_string()));
    }

    let raw = fs::read(&task.file_name).map_err(|source| EngineError::ReadInput {
        path: PathBuf::from(&task.file_name),
        source,
    })?;
    let content = String::from_utf8_lossy(&raw);

    let pairs = app.map(&task.file_name, &content);
    let buckets = partition(pairs, task.n_reduce);

    let mut published = Vec::with_capacity(buckets.len());
    for (bucket, pairs) in buckets.iter().enumerate() {
        let dest = storage.intermediate_path(task.index, bucket);
        storage.publish_pairs(&dest, bucket, pairs)?;
        published.push(dest);
    }

    Ok(published)
}

/* =========================
   Reduce
   ========================= */

/// Ordena por clave y llama a `reduce` una vez por cada grupo de claves
/// iguales. Devuelve las líneas `"<key> <output>\n"` ya concatenadas.
pub fn merge_sorted<A>(app: &A, mut pairs: Vec<KeyValue>) -> String
where
    A: MapReduceApp + ?Sized,
{
    pairs.sort_by(|a, b| a.key.cmp(&b.key));

    let mut out = String::new();
    let mut i = 0;
    while i < pairs.len() {
        let mut j = i + 1;
        while j < pairs.len() && pairs[j].key == pairs[i].key {
            j += 1;
        }

        let values: Vec<String> = pairs[i..j].iter().map(|kv| kv.value.clone()).collect();
        let output = app.reduce(&pairs[i].key, &values);

        out.push_str(&pairs[i].key);
        out.push(' ');
        out.push_str(&output);
        out.push('\n');

        i = j;
    }
    out
}

/// Ejecuta una tarea reduce completa:
///   1. lee los `file_num` artefactos `mr-<m>-<j>`
///   2. ordena y agrupa por clave
///   3. publica `mr-out-<j>`
///   4. borra los artefactos consumidos
pub fn run_reduce<A>(app: &A, storage: &Storage, task: &Task) -> EngineResult<PathBuf>
where
    A: MapReduceApp + ?Sized,
{
    let inputs: Vec<PathBuf> = (0..task.file_num)
        .map(|m| storage.intermediate_path(m, task.index))
        .collect();

    let mut pairs = Vec::new();
    for path in &inputs {
        pairs.extend(storage.read_pairs(path)?);
    }

    let body = merge_sorted(app, pairs);
    let dest = storage.output_path(task.index);
    storage.publish(&dest, body.as_bytes())?;

    for path in &inputs {
        storage.remove(path)?;
    }

    Ok(dest)
}

/// Punto de entrada para el worker: despacha según la fase.
pub fn execute<A>(app: &A, storage: &Storage, assignment: &Assignment) -> EngineResult<()>
where
    A: MapReduceApp + ?Sized,
{
    match assignment.phase {
        Phase::Map => run_map(app, storage, &assignment.task).map(|_| ()),
        Phase::Reduce => run_reduce(app, storage, &assignment.task).map(|_| ()),
    }
}
