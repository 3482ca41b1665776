//! Recorridos completos coordinador + engine, con los "workers" simulados
//! en el mismo proceso.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use common::{engine, Assignment, Phase, Storage, TaskStatus, WordCount};
use tempfile::TempDir;

use crate::clock::manual::ManualClock;
use crate::scheduler::{Coordinator, ReportOutcome, DEFAULT_TASK_TIMEOUT};

fn write_inputs(dir: &Path, inputs: &[(&str, &str)]) -> Vec<String> {
    inputs
        .iter()
        .map(|(name, content)| {
            let path = dir.join(name);
            fs::write(&path, content).unwrap();
            path.to_string_lossy().to_string()
        })
        .collect()
}

fn run_and_report(c: &Coordinator, storage: &Storage, a: &Assignment) -> ReportOutcome {
    let status = match engine::execute(&WordCount, storage, a) {
        Ok(()) => TaskStatus::Done,
        Err(_) => TaskStatus::Error,
    };
    c.report_task(a.phase, a.task.index, status).unwrap()
}

fn output_lines(storage: &Storage, n_reduce: usize) -> BTreeSet<String> {
    (0..n_reduce)
        .flat_map(|j| {
            fs::read_to_string(storage.output_path(j))
                .unwrap()
                .lines()
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect()
}

fn leftover_intermediates(root: &Path) -> Vec<String> {
    fs::read_dir(root)
        .unwrap()
        .flatten()
        .map(|e| e.file_name().to_string_lossy().to_string())
        .filter(|n| n.starts_with("mr-") && !n.starts_with("mr-out-"))
        .collect()
}

#[test]
fn word_count_de_punta_a_punta() {
    let tmp = TempDir::new().unwrap();
    let work = tmp.path().join("work");
    fs::create_dir_all(&work).unwrap();
    let files = write_inputs(tmp.path(), &[("a.txt", "foo bar foo"), ("b.txt", "bar baz")]);
    let storage = Storage::new(&work);
    let c = Coordinator::new(files, 2, DEFAULT_TASK_TIMEOUT).unwrap();

    let mut reports = 0;
    while let Some(a) = c.request_task() {
        assert!(!c.done());
        if a.phase == Phase::Reduce {
            // barrera: todos los intermedios ya están publicados
            for m in 0..a.task.file_num {
                assert!(storage.intermediate_path(m, a.task.index).exists());
            }
        }
        run_and_report(&c, &storage, &a);
        reports += 1;
    }

    assert_eq!(reports, 4);
    assert!(c.done());
    assert!(storage.output_path(0).exists());
    assert!(storage.output_path(1).exists());

    let expected: BTreeSet<String> = ["bar 2", "baz 1", "foo 2"].iter().map(|s| s.to_string()).collect();
    assert_eq!(output_lines(&storage, 2), expected);

    // foo cae en el bucket 1; bar y baz en el 0
    assert_eq!(fs::read_to_string(storage.output_path(0)).unwrap(), "bar 2\nbaz 1\n");
    assert_eq!(fs::read_to_string(storage.output_path(1)).unwrap(), "foo 2\n");
    assert!(leftover_intermediates(&work).is_empty());
}

#[test]
fn duplicado_por_timeout_da_la_misma_salida_que_una_corrida() {
    let inputs = [("a.txt", "uno dos tres dos"), ("b.txt", "tres tres cuatro")];

    // corrida de referencia, sin fallas
    let clean = TempDir::new().unwrap();
    let clean_files = write_inputs(clean.path(), &inputs);
    let clean_storage = Storage::new(clean.path());
    let c = Coordinator::new(clean_files, 3, DEFAULT_TASK_TIMEOUT).unwrap();
    while let Some(a) = c.request_task() {
        run_and_report(&c, &clean_storage, &a);
    }
    assert!(c.done());

    // corrida con un worker lento: map 0 se reasigna por timeout y las dos
    // copias publican
    let tmp = TempDir::new().unwrap();
    let files = write_inputs(tmp.path(), &inputs);
    let storage = Storage::new(tmp.path());
    let clock = Arc::new(ManualClock::new());
    let c = Coordinator::with_clock(files, 3, DEFAULT_TASK_TIMEOUT, clock.clone()).unwrap();

    let slow = c.request_task().unwrap();
    clock.advance(DEFAULT_TASK_TIMEOUT + Duration::from_millis(500));
    let dup = c.request_task().unwrap();
    assert_eq!(dup.task.index, slow.task.index);
    assert_eq!(dup.task.status, TaskStatus::Running);

    assert_eq!(run_and_report(&c, &storage, &dup), ReportOutcome::Recorded);
    assert_eq!(run_and_report(&c, &storage, &slow), ReportOutcome::Duplicate);

    while let Some(a) = c.request_task() {
        run_and_report(&c, &storage, &a);
    }
    assert!(c.done());

    for j in 0..3 {
        assert_eq!(
            fs::read(storage.output_path(j)).unwrap(),
            fs::read(clean_storage.output_path(j)).unwrap(),
            "mr-out-{j} difiere"
        );
    }
}

#[test]
fn map_fallido_mantiene_el_job_abierto_hasta_que_sale_bien() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("tarde.txt");
    let storage = Storage::new(tmp.path());
    let c = Coordinator::new(
        vec![missing.to_string_lossy().to_string()],
        1,
        DEFAULT_TASK_TIMEOUT,
    )
    .unwrap();

    for _ in 0..3 {
        let a = c.request_task().unwrap();
        assert_eq!(a.phase, Phase::Map);
        assert_eq!(run_and_report(&c, &storage, &a), ReportOutcome::Recorded);
        assert!(!c.done());
    }

    fs::write(&missing, "hola hola").unwrap();
    while let Some(a) = c.request_task() {
        run_and_report(&c, &storage, &a);
    }

    assert!(c.done());
    assert_eq!(fs::read_to_string(storage.output_path(0)).unwrap(), "hola 2\n");
}

#[test]
fn reduce_duplicado_tras_borrado_no_rompe_el_job() {
    let tmp = TempDir::new().unwrap();
    let files = write_inputs(tmp.path(), &[("a.txt", "x y x")]);
    let storage = Storage::new(tmp.path());
    let clock = Arc::new(ManualClock::new());
    let c = Coordinator::with_clock(files, 1, DEFAULT_TASK_TIMEOUT, clock.clone()).unwrap();

    let m = c.request_task().unwrap();
    run_and_report(&c, &storage, &m);

    let r = c.request_task().unwrap();
    clock.advance(DEFAULT_TASK_TIMEOUT * 2);
    let r_dup = c.request_task().unwrap();
    assert_eq!(r.task.index, r_dup.task.index);

    assert_eq!(run_and_report(&c, &storage, &r_dup), ReportOutcome::JobFinished);
    // el original ya no encuentra los intermedios y reporta Error: se ignora
    assert_eq!(run_and_report(&c, &storage, &r), ReportOutcome::Duplicate);

    assert!(c.done());
    assert_eq!(fs::read_to_string(storage.output_path(0)).unwrap(), "x 2\ny 1\n");
}
