use std::{env, time::Duration};

use anyhow::Result;
use clap::{Parser, Subcommand};
use common::{DoneResponse, JobSnapshot};
use reqwest::Client;
use tokio::time::{sleep, Instant};

/// Igual que en el worker:
/// - En Docker: MASTER_URL=http://master:8080
/// - Local: default http://localhost:8080
fn master_base_url() -> String {
    env::var("MASTER_URL").unwrap_or_else(|_| "http://localhost:8080".to_string())
}

#[derive(Parser)]
#[command(name = "client")]
#[command(about = "CLI simple para seguir un job desde afuera")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Muestra fase y progreso del job
    Status,
    /// Imprime si el job terminó (exit code 1 si todavía no)
    Done,
    /// Espera hasta que el job termine
    Wait {
        /// Cada cuánto preguntar
        #[arg(long, default_value_t = 1000)]
        interval_ms: u64,

        /// Rendirse después de tantos segundos (0 = nunca)
        #[arg(long, default_value_t = 0)]
        timeout_secs: u64,
    },
}

fn describe(job: &JobSnapshot) -> String {
    let finished = job.total_tasks - job.remaining;
    format!(
        "fase {:?}: {}/{} tareas terminadas, {} en vuelo{}",
        job.phase,
        finished,
        job.total_tasks,
        job.running,
        if job.done { " (job completo)" } else { "" }
    )
}

async fn fetch_done(client: &Client, base_url: &str) -> Result<bool> {
    let url = format!("{}/api/v1/job/done", base_url);
    let resp: DoneResponse = client
        .get(&url)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    Ok(resp.done)
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    let client = Client::new();
    let base_url = master_base_url();

    match cli.command {
        Commands::Status => {
            let url = format!("{}/api/v1/job", base_url);
            let resp = client.get(&url).send().await?;
            if resp.status().is_success() {
                let job: JobSnapshot = resp.json().await?;
                println!("{}", describe(&job));
            } else {
                println!("Error consultando el job (status {})", resp.status());
            }
        }

        Commands::Done => {
            let done = fetch_done(&client, &base_url).await?;
            println!("{}", done);
            if !done {
                std::process::exit(1);
            }
        }

        Commands::Wait {
            interval_ms,
            timeout_secs,
        } => {
            let started = Instant::now();
            let interval = Duration::from_millis(interval_ms);

            loop {
                match fetch_done(&client, &base_url).await {
                    Ok(true) => {
                        println!("job completo");
                        break;
                    }
                    Ok(false) => {}
                    // el master puede no estar levantado todavía
                    Err(e) => eprintln!("no se pudo consultar el master: {e}"),
                }

                if timeout_secs > 0 && started.elapsed() >= Duration::from_secs(timeout_secs) {
                    eprintln!("timeout esperando el job");
                    std::process::exit(1);
                }
                sleep(interval).await;
            }
        }
    }

    Ok(())
}
