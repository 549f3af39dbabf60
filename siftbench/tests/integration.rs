//! Integration tests for Siftbench
//!
//! These tests verify the end-to-end behavior of the reporting pipeline:
//! running commands, flushing metadata blocks, and aggregating run
//! directories back into reports.

use chrono::TimeZone;
use siftbench::{
    ExecOptions, Job, JobId, JobPool, MetadataRecord, OnComplete, PoolError, RendererRegistry,
    ReportContext, ResultEmitter, ResultWriter, Target, WriteError, collect, decode, discover,
    run_command, run_dir_name,
};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

/// Parses `key=value` stdout lines into the metadata record
struct KeyValueTarget;

impl Target for KeyValueTarget {
    fn name(&self) -> &str {
        "kv"
    }

    fn report_result(
        &self,
        _ctx: &ReportContext,
        output: &str,
        _instance: &str,
        emitter: &mut ResultEmitter<'_>,
    ) -> Result<(), WriteError> {
        let record: MetadataRecord = output
            .lines()
            .filter_map(|line| line.split_once('='))
            .collect();
        emitter.emit(&record)?;
        Ok(())
    }
}

/// Thread-per-job pool: runs the command, writes its output to the
/// declared file, and fires the continuation once per job.
#[derive(Default)]
struct ThreadPool {
    handles: Mutex<Vec<JoinHandle<()>>>,
    next_id: AtomicU64,
}

impl ThreadPool {
    fn join_all(&self) {
        let handles: Vec<_> = self.handles.lock().unwrap().drain(..).collect();
        for handle in handles {
            handle.join().unwrap();
        }
    }
}

impl JobPool for ThreadPool {
    fn submit(
        &self,
        ctx: &ReportContext,
        command: &[String],
        env: &[(String, String)],
        outfile: &Path,
        on_complete: OnComplete,
        options: &ExecOptions,
    ) -> Result<Vec<JobId>, PoolError> {
        let ctx = ctx.clone();
        let command = command.to_vec();
        let env = env.to_vec();
        let outfile = outfile.to_path_buf();
        let options = options.clone();

        let handle = std::thread::spawn(move || {
            let captured = run_command(&ctx, &command, &env, &options)
                .map(|job| job.stdout.unwrap_or_default())
                .unwrap_or_default();
            std::fs::write(&outfile, &captured).unwrap();
            let mut job = Job {
                outfile: Some(outfile),
                ..Job::default()
            };
            on_complete(&mut job);
        });
        self.handles.lock().unwrap().push(handle);
        Ok(vec![JobId(self.next_id.fetch_add(1, Ordering::SeqCst))])
    }
}

fn test_ctx(root: &Path) -> ReportContext {
    ReportContext::new(root)
        .with_timestamp(chrono::Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap())
}

fn sh(script: &str) -> Vec<String> {
    vec!["sh".to_string(), "-c".to_string(), script.to_string()]
}

#[test]
fn synchronous_run_lands_in_the_runlog() {
    let root = tempfile::tempdir().unwrap();
    let ctx = test_ctx(root.path());
    let writer = ResultWriter::new(&ctx, Arc::new(KeyValueTarget), "baseline", "600.a").unwrap();

    writer
        .execute(
            &ctx,
            &sh("printf 'noise\\nruntime=4.2\\n'"),
            None,
            None,
            &ExecOptions::default(),
        )
        .unwrap();

    let runlog = std::fs::read_to_string(&ctx.paths.runlog).unwrap();
    let decoded = decode(&ctx.prefix, &runlog, "<runlog>");
    assert_eq!(decoded.record.get("target"), Some("kv"));
    assert_eq!(decoded.record.get("instance"), Some("baseline"));
    assert_eq!(decoded.record.get("runtime"), Some("4.2"));
    assert!(decoded.warnings.is_empty());
}

#[test]
fn pool_run_flushes_before_the_callback_sees_the_job() {
    let root = tempfile::tempdir().unwrap();
    let ctx = test_ctx(root.path());
    let writer = ResultWriter::new(&ctx, Arc::new(KeyValueTarget), "baseline", "600.a").unwrap();

    let flushed_first = Arc::new(AtomicBool::new(false));
    let flushed_in_cb = Arc::clone(&flushed_first);
    let prefix = ctx.prefix.clone();
    let on_success: OnComplete = Arc::new(move |job: &mut Job| {
        let annotation = job.annotation.as_ref().expect("job is annotated");
        assert_eq!(annotation.target, "kv");
        assert_eq!(annotation.instance, "baseline");
        // The block is already on disk when the caller's continuation runs.
        let content = std::fs::read_to_string(annotation.outfile.as_path()).unwrap();
        let decoded = decode(&prefix, &content, "<outfile>");
        flushed_in_cb.store(decoded.record.contains_key("runtime"), Ordering::SeqCst);
    });

    let pool = ThreadPool::default();
    writer
        .execute(
            &ctx,
            &sh("printf 'runtime=1.5\\n'"),
            Some(&pool),
            Some(on_success),
            &ExecOptions::default(),
        )
        .unwrap();
    pool.join_all();

    assert!(flushed_first.load(Ordering::SeqCst));

    let content = std::fs::read_to_string(writer.outfile()).unwrap();
    assert!(content.starts_with("runtime=1.5\n"));
    let decoded = decode(&ctx.prefix, &content, "<outfile>");
    assert_eq!(decoded.record.get("runtime"), Some("1.5"));
}

#[test]
fn concurrent_jobs_keep_their_result_files_separate() {
    let root = tempfile::tempdir().unwrap();
    let ctx = test_ctx(root.path());
    let pool = ThreadPool::default();

    let writer_a = ResultWriter::new(&ctx, Arc::new(KeyValueTarget), "a", "600.x").unwrap();
    let writer_b = ResultWriter::new(&ctx, Arc::new(KeyValueTarget), "b", "600.x").unwrap();

    writer_a
        .execute(
            &ctx,
            &sh("printf 'score=1\\n'"),
            Some(&pool),
            None,
            &ExecOptions::default(),
        )
        .unwrap();
    writer_b
        .execute(
            &ctx,
            &sh("printf 'score=2\\n'"),
            Some(&pool),
            None,
            &ExecOptions::default(),
        )
        .unwrap();
    pool.join_all();

    let content_a = std::fs::read_to_string(writer_a.outfile()).unwrap();
    let content_b = std::fs::read_to_string(writer_b.outfile()).unwrap();
    let decoded_a = decode(&ctx.prefix, &content_a, "<a>");
    let decoded_b = decode(&ctx.prefix, &content_b, "<b>");
    assert_eq!(decoded_a.record.get("score"), Some("1"));
    assert_eq!(decoded_a.record.get("instance"), Some("a"));
    assert_eq!(decoded_b.record.get("score"), Some("2"));
    assert_eq!(decoded_b.record.get("instance"), Some("b"));
}

#[test]
fn written_runs_round_trip_through_aggregation() {
    let root = tempfile::tempdir().unwrap();
    let ctx = test_ctx(root.path());
    let pool = ThreadPool::default();

    for (instance, script) in [("a", "printf 'runtime=1.5\\n'"), ("b", "printf 'runtime=2.5\\n'")]
    {
        let writer = ResultWriter::new(&ctx, Arc::new(KeyValueTarget), instance, "600.x").unwrap();
        writer
            .execute(&ctx, &sh(script), Some(&pool), None, &ExecOptions::default())
            .unwrap();
    }
    pool.join_all();

    let run_root = root.path().join(run_dir_name(&ctx.timestamp));
    let discovery = discover(&[run_root], "kv", &[]).unwrap();
    assert!(discovery.warnings.is_empty());
    assert_eq!(discovery.instance_dirs.len(), 2);

    let entries = collect(&ctx, &discovery.instance_dirs).unwrap();
    assert_eq!(entries.len(), 2);
    let runtimes: Vec<&str> = entries
        .iter()
        .filter_map(|e| e.metadata.get("runtime"))
        .collect();
    assert_eq!(runtimes, vec!["1.5", "2.5"]);

    let registry = RendererRegistry::default();
    let mut out = Vec::new();
    registry.render("json", &entries, &mut out).unwrap();
    let parsed: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(parsed.as_array().unwrap().len(), 2);
    assert_eq!(parsed[0]["metadata"]["target"], "kv");
}

#[test]
fn instance_filter_narrows_discovery() {
    let root = tempfile::tempdir().unwrap();
    let ctx = test_ctx(root.path());

    for instance in ["a", "b", "c"] {
        let writer = ResultWriter::new(&ctx, Arc::new(KeyValueTarget), instance, "600.x").unwrap();
        std::fs::write(writer.outfile(), "").unwrap();
    }

    let run_root = root.path().join(run_dir_name(&ctx.timestamp));
    let discovery = discover(&[run_root], "kv", &["b".to_string()]).unwrap();
    assert_eq!(discovery.instance_dirs.len(), 1);
    assert!(discovery.instance_dirs[0].ends_with("kv/b"));
}
