use clap::Parser;
use glob::glob;
use tracing::warn;

use crate::scheduler::DEFAULT_TASK_TIMEOUT;

#[derive(Parser, Debug)]
#[command(name = "master")]
#[command(about = "Coordinador de un job map/reduce")]
pub struct Args {
    /// Archivos o patrones glob de entrada (una tarea map por archivo)
    #[arg(value_name = "INPUT")]
    pub inputs: Vec<String>,

    /// Cantidad de buckets / tareas reduce
    #[arg(long, env = "MR_N_REDUCE", default_value_t = 10)]
    pub n_reduce: usize,

    #[arg(long, env = "MR_LISTEN_ADDR", default_value = "0.0.0.0:8080")]
    pub listen: String,

    /// Tiempo sin reporte tras el cual una tarea se reasigna
    #[arg(long, env = "MR_TASK_TIMEOUT_MS", default_value_t = DEFAULT_TASK_TIMEOUT.as_millis() as u64)]
    pub task_timeout_ms: u64,

    /// Cada cuánto se consulta si el job terminó
    #[arg(long, default_value_t = 1000)]
    pub done_poll_ms: u64,

    /// Cuánto seguir sirviendo después de terminar el job
    #[arg(long, default_value_t = 1000)]
    pub linger_ms: u64,
}

fn is_pattern(s: &str) -> bool {
    s.contains(['*', '?', '['])
}

/// Expande los patrones glob (ordenados, para que los índices de map sean
/// estables). Una ruta literal se deja tal cual aunque no exista: esa tarea
/// fallará en el worker.
pub fn expand_inputs(inputs: &[String]) -> anyhow::Result<Vec<String>> {
    let mut files = Vec::new();

    for input in inputs {
        if !is_pattern(input) {
            files.push(input.clone());
            continue;
        }

        let mut matched: Vec<String> = glob(input)?
            .flatten()
            .filter(|p| p.is_file())
            .map(|p| p.to_string_lossy().to_string())
            .collect();

        if matched.is_empty() {
            warn!("el patrón {} no encontró archivos", input);
        }
        matched.sort();
        files.append(&mut matched);
    }

    Ok(files)
}
