//! End-to-end pipeline tests: real directories, real threads. Results are compared as sets;
//! completion order is never asserted.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::sync::mpsc;
use std::time::Duration;
use std::{panic, thread};

use tagscan::{
    CollectSink, ConfigError, JsonRenderer, Outcome, ResultRecord, ScanOpts, ScanResult,
    TagSet, TextRenderer, XmlTagAnalyzer, looks_like_xml, run, scan_xml,
};

/// Path → variant name, keyed by file name.
fn variants<P>(sink: &CollectSink<P>) -> BTreeMap<String, &'static str> {
    sink.results()
        .map(|r| {
            let kind = match r {
                ScanResult::Success { .. } => "success",
                ScanResult::Empty { .. } => "empty",
                ScanResult::Failure { .. } => "failure",
            };
            (file_name(r.path()), kind)
        })
        .collect()
}

fn file_name(p: &Path) -> String {
    p.file_name().unwrap().to_string_lossy().into_owned()
}

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

/// a.xml has `<foo>`, b.xml is a bare declaration, c.txt is not XML.
fn scenario_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.xml", "<?xml version=\"1.0\"?>\n<foo>text</foo>\n");
    write(dir.path(), "b.xml", "<?xml version=\"1.0\"?>\n");
    write(dir.path(), "c.txt", "hello world\n");
    dir
}

#[test]
fn test_scenario_two_threads() {
    let dir = scenario_dir();
    let mut sink = CollectSink::default();
    let summary = scan_xml(dir.path(), &ScanOpts::with_threads(2), &mut sink).unwrap();

    assert_eq!(summary.dispatched, 2);
    assert_eq!(summary.reported(), 2);
    assert_eq!(sink.records.len(), 2);

    let mut found_a = false;
    let mut found_b = false;
    for result in sink.results() {
        match result {
            ScanResult::Success { path, payload } => {
                assert_eq!(file_name(path), "a.xml");
                let expected: TagSet = ["foo".to_string()].into_iter().collect();
                assert_eq!(payload, &expected);
                found_a = true;
            }
            ScanResult::Empty { path } => {
                assert_eq!(file_name(path), "b.xml");
                found_b = true;
            }
            ScanResult::Failure { path, message } => {
                panic!("unexpected failure for {}: {}", path.display(), message)
            }
        }
    }
    assert!(found_a && found_b);
    assert!(sink.results().all(|r| file_name(r.path()) != "c.txt"));
}

#[test]
fn test_tasks_are_absolute_paths() {
    let dir = scenario_dir();
    let mut sink = CollectSink::default();
    scan_xml(dir.path(), &ScanOpts::with_threads(2), &mut sink).unwrap();
    assert!(sink.results().all(|r| r.path().is_absolute()));
}

#[test]
fn test_completeness_many_files() {
    let dir = tempfile::tempdir().unwrap();
    for i in 0..200 {
        write(
            dir.path(),
            &format!("sub{}/f{}.xml", i % 7, i),
            &format!("<?xml version=\"1.0\"?><root><item{}/></root>", i % 3),
        );
    }
    let mut sink = CollectSink::default();
    let summary = scan_xml(dir.path(), &ScanOpts::with_threads(8), &mut sink).unwrap();

    assert_eq!(summary.dispatched, 200);
    assert_eq!(summary.successes, 200);
    assert_eq!(sink.records.len(), 200);
    let distinct: BTreeSet<&PathBuf> = sink.results().map(|r| r.path()).collect();
    assert_eq!(distinct.len(), 200);
}

#[test]
fn test_single_worker_drains() {
    let dir = tempfile::tempdir().unwrap();
    for i in 0..25 {
        write(dir.path(), &format!("f{i}.xml"), "<?xml version=\"1.0\"?><a><b/></a>");
    }
    let mut sink = CollectSink::default();
    let summary = scan_xml(dir.path(), &ScanOpts::with_threads(1), &mut sink).unwrap();
    assert_eq!(summary.reported(), 25);
    assert!(sink.records.iter().all(|r| r.worker == 1));
}

#[test]
fn test_worker_ordinals_in_range() {
    let dir = tempfile::tempdir().unwrap();
    for i in 0..40 {
        write(dir.path(), &format!("f{i}.xml"), "<?xml version=\"1.0\"?><a/>");
    }
    let mut sink = CollectSink::default();
    scan_xml(dir.path(), &ScanOpts::with_threads(4), &mut sink).unwrap();
    assert!(sink.records.iter().all(|r| (1..=4).contains(&r.worker)));
}

#[test]
fn test_content_filter_three_of_five() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "one.xml", "<?xml version=\"1.0\"?><x/>");
    write(dir.path(), "two.data", "<?xml version=\"1.0\"?><y/>");
    write(dir.path(), "deep/three", "<?xml version=\"1.0\"?><z/>");
    write(dir.path(), "four.xml", "<html></html>");
    write(dir.path(), "five.txt", "plain text");

    let mut sink = CollectSink::default();
    let summary = scan_xml(dir.path(), &ScanOpts::with_threads(3), &mut sink).unwrap();
    assert_eq!(summary.dispatched, 3);
    assert_eq!(sink.records.len(), 3);
    let names: BTreeSet<String> = sink.results().map(|r| file_name(r.path())).collect();
    let expected: BTreeSet<String> = ["one.xml", "two.data", "three"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(names, expected);
}

#[test]
fn test_short_files_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "tiny.xml", "<?x");
    write(dir.path(), "empty.xml", "");
    let accepted_everything = AtomicUsize::new(0);
    let accept = |_: &[u8]| {
        accepted_everything.fetch_add(1, Ordering::SeqCst);
        true
    };
    let mut sink = CollectSink::default();
    let summary = run(
        dir.path(),
        &XmlTagAnalyzer,
        accept,
        &ScanOpts::with_threads(2),
        &mut sink,
    )
    .unwrap();
    assert_eq!(summary.dispatched, 0);
    assert_eq!(accepted_everything.load(Ordering::SeqCst), 0);
}

#[test]
fn test_malformed_xml_is_failure_not_abort() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "good.xml", "<?xml version=\"1.0\"?><ok><inner/></ok>");
    write(dir.path(), "bad.xml", "<?xml version=\"1.0\"?><open></close>");
    write(dir.path(), "empty.xml", "<?xml version=\"1.0\"?>");
    write(dir.path(), "unclosed.xml", "<?xml version=\"1.0\"?>\n<root><child>");
    write(dir.path(), "prose.xml", "<?xml version=\"1.0\"?>\nnot markup at all");
    write(dir.path(), "two_roots.xml", "<?xml version=\"1.0\"?>\n<a/><b/>");

    let mut sink = CollectSink::default();
    let summary = scan_xml(dir.path(), &ScanOpts::with_threads(2), &mut sink).unwrap();

    let v = variants(&sink);
    assert_eq!(v["good.xml"], "success");
    assert_eq!(v["bad.xml"], "failure");
    assert_eq!(v["empty.xml"], "empty");
    assert_eq!(v["unclosed.xml"], "failure");
    assert_eq!(v["prose.xml"], "failure");
    assert_eq!(v["two_roots.xml"], "failure");
    assert_eq!(summary.failures, 4);
    assert_eq!(summary.successes, 1);
    assert_eq!(summary.empties, 1);
}

#[test]
fn test_one_failing_analysis_is_isolated() {
    let dir = tempfile::tempdir().unwrap();
    for i in 0..10 {
        write(dir.path(), &format!("f{i}.xml"), "<?xml version=\"1.0\"?><a/>");
    }
    let analyzer = |path: &Path| -> anyhow::Result<Outcome<TagSet>> {
        if file_name(path) == "f3.xml" {
            anyhow::bail!("cannot analyze f3");
        }
        XmlTagAnalyzer::tags(path).map(Outcome::Found)
    };
    let mut sink = CollectSink::default();
    let summary = run(
        dir.path(),
        &analyzer,
        looks_like_xml,
        &ScanOpts::with_threads(4),
        &mut sink,
    )
    .unwrap();

    assert_eq!(summary.reported(), 10);
    assert_eq!(summary.failures, 1);
    let v = variants(&sink);
    assert_eq!(v["f3.xml"], "failure");
    assert_eq!(v.values().filter(|k| **k == "success").count(), 9);
}

#[test]
fn test_panicking_analysis_is_isolated() {
    let dir = tempfile::tempdir().unwrap();
    for i in 0..6 {
        write(dir.path(), &format!("f{i}.xml"), "<?xml version=\"1.0\"?><a/>");
    }
    let analyzer = |path: &Path| -> anyhow::Result<Outcome<TagSet>> {
        if file_name(path) == "f0.xml" {
            panic!("analyzer bug");
        }
        Ok(Outcome::Nothing)
    };
    let mut sink = CollectSink::default();
    // Single worker: the same thread must survive the panic and finish the rest.
    let summary = run(
        dir.path(),
        &analyzer,
        looks_like_xml,
        &ScanOpts::with_threads(1),
        &mut sink,
    )
    .unwrap();

    assert_eq!(summary.reported(), 6);
    let v = variants(&sink);
    assert_eq!(v["f0.xml"], "failure");
    assert_eq!(v.values().filter(|k| **k == "empty").count(), 5);
}

#[test]
fn test_same_set_across_runs() {
    let dir = tempfile::tempdir().unwrap();
    for i in 0..60 {
        let body = if i % 4 == 0 {
            "<?xml version=\"1.0\"?>".to_string()
        } else if i % 9 == 0 {
            "<?xml version=\"1.0\"?><a></b>".to_string()
        } else {
            format!("<?xml version=\"1.0\"?><t{i}/>")
        };
        write(dir.path(), &format!("f{i}.xml"), &body);
    }
    let mut first = CollectSink::default();
    let mut second = CollectSink::default();
    scan_xml(dir.path(), &ScanOpts::with_threads(6), &mut first).unwrap();
    scan_xml(dir.path(), &ScanOpts::with_threads(3), &mut second).unwrap();
    assert_eq!(variants(&first), variants(&second));
    assert_eq!(first.records.len(), 60);
}

#[test]
fn test_exclude_and_hidden_files() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "keep.xml", "<?xml version=\"1.0\"?><k/>");
    write(dir.path(), "skip.bak", "<?xml version=\"1.0\"?><s/>");
    write(dir.path(), "vendor/inner.xml", "<?xml version=\"1.0\"?><v/>");
    write(dir.path(), "._fork.xml", "<?xml version=\"1.0\"?><f/>");
    write(dir.path(), ".tagscan.toml", "<?xml version=\"1.0\"?>");

    let opts = ScanOpts {
        exclude: vec!["*.bak".to_string(), "vendor".to_string()],
        ..ScanOpts::with_threads(2)
    };
    let mut sink = CollectSink::default();
    let summary = scan_xml(dir.path(), &opts, &mut sink).unwrap();
    assert_eq!(summary.dispatched, 1);
    assert_eq!(file_name(sink.records[0].result.path()), "keep.xml");
}

#[test]
fn test_config_errors_before_start() {
    let dir = scenario_dir();
    let calls = AtomicUsize::new(0);
    let analyzer = |_: &Path| -> anyhow::Result<Outcome<TagSet>> {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(Outcome::Nothing)
    };
    let mut sink = CollectSink::default();

    let err = run(
        dir.path(),
        &analyzer,
        looks_like_xml,
        &ScanOpts::with_threads(0),
        &mut sink,
    )
    .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ConfigError>(),
        Some(ConfigError::ThreadCount { got: 0, .. })
    ));

    let missing = dir.path().join("missing");
    let err = run(
        &missing,
        &analyzer,
        looks_like_xml,
        &ScanOpts::with_threads(2),
        &mut sink,
    )
    .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ConfigError>(),
        Some(ConfigError::MissingRoot(_))
    ));

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(sink.records.is_empty());
}

#[test]
fn test_empty_directory() {
    let dir = tempfile::tempdir().unwrap();
    let mut sink = CollectSink::default();
    let summary = scan_xml(dir.path(), &ScanOpts::default(), &mut sink).unwrap();
    assert_eq!(summary, tagscan::ScanSummary::default());
}

#[test]
fn test_cancel_before_start_dispatches_nothing() {
    let dir = scenario_dir();
    let cancel = Arc::new(AtomicBool::new(true));
    let opts = ScanOpts {
        cancel: Some(Arc::clone(&cancel)),
        ..ScanOpts::with_threads(2)
    };
    let mut sink = CollectSink::default();
    let summary = scan_xml(dir.path(), &opts, &mut sink).unwrap();
    assert!(summary.cancelled);
    assert_eq!(summary.dispatched, 0);
    assert!(sink.records.is_empty());
}

#[test]
fn test_panicking_predicate_reaches_caller() {
    let dir = scenario_dir();
    let root = dir.path().to_path_buf();
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let outcome = panic::catch_unwind(panic::AssertUnwindSafe(|| {
            let mut sink = CollectSink::<TagSet>::default();
            run(
                &root,
                &XmlTagAnalyzer,
                |_: &[u8]| -> bool { panic!("bad predicate") },
                &ScanOpts::with_threads(2),
                &mut sink,
            )
        }));
        let _ = tx.send(outcome.is_err());
    });
    // The run must not hang on blocked workers; the panic surfaces on the calling thread.
    let panicked = rx
        .recv_timeout(Duration::from_secs(10))
        .expect("run did not return after the predicate panicked");
    assert!(panicked);
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_is_skipped() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "ok.xml", "<?xml version=\"1.0\"?><ok/>");
    let locked = write(dir.path(), "locked.xml", "<?xml version=\"1.0\"?><no/>");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
    // root can read anything; nothing to test then.
    if fs::File::open(&locked).is_ok() {
        return;
    }

    let mut sink = CollectSink::default();
    let summary = scan_xml(dir.path(), &ScanOpts::with_threads(2), &mut sink).unwrap();
    assert_eq!(summary.dispatched, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(file_name(sink.records[0].result.path()), "ok.xml");
}

#[test]
fn test_closure_sink_sees_every_result() {
    let dir = scenario_dir();
    let seen: Mutex<Vec<String>> = Mutex::new(Vec::new());
    let mut sink = |record: &ResultRecord<TagSet>| -> anyhow::Result<()> {
        seen.lock().unwrap().push(file_name(record.result.path()));
        Ok(())
    };
    scan_xml(dir.path(), &ScanOpts::with_threads(2), &mut sink).unwrap();
    let mut seen = seen.into_inner().unwrap();
    seen.sort();
    assert_eq!(seen, vec!["a.xml".to_string(), "b.xml".to_string()]);
}

#[test]
fn test_failing_sink_does_not_stall() {
    let dir = tempfile::tempdir().unwrap();
    for i in 0..10 {
        write(dir.path(), &format!("f{i}.xml"), "<?xml version=\"1.0\"?><a/>");
    }
    let mut sink = |_: &ResultRecord<TagSet>| -> anyhow::Result<()> {
        anyhow::bail!("output closed")
    };
    let summary = scan_xml(dir.path(), &ScanOpts::with_threads(3), &mut sink).unwrap();
    assert_eq!(summary.reported(), 10);
}

#[test]
fn test_text_renderer_output() {
    let dir = scenario_dir();
    let mut sink = TextRenderer::new(Vec::new(), true);
    scan_xml(dir.path(), &ScanOpts::with_threads(2), &mut sink).unwrap();
    let out = String::from_utf8(sink.into_inner()).unwrap();

    assert!(out.contains("a.xml is an XML file that uses the following tags:\n\tfoo\n"));
    assert!(out.contains("b.xml is an XML file that don't use tags\n"));
    assert!(!out.contains("c.txt"));
    for line in out.lines().filter(|l| !l.starts_with('\t')) {
        let (label, _) = line.split_once(": ").unwrap();
        assert!(label == "1" || label == "2");
    }
}

#[test]
fn test_json_renderer_output() {
    let dir = scenario_dir();
    let mut sink = JsonRenderer::new(Vec::new());
    scan_xml(dir.path(), &ScanOpts::with_threads(2), &mut sink).unwrap();
    let out = String::from_utf8(sink.into_inner()).unwrap();

    let mut kinds: BTreeMap<String, serde_json::Value> = BTreeMap::new();
    for line in out.lines() {
        let v: serde_json::Value = serde_json::from_str(line).unwrap();
        let name = file_name(Path::new(v["path"].as_str().unwrap()));
        kinds.insert(name, v);
    }
    assert_eq!(kinds.len(), 2);
    assert_eq!(kinds["a.xml"]["kind"], "success");
    assert_eq!(kinds["a.xml"]["payload"], serde_json::json!(["foo"]));
    assert_eq!(kinds["b.xml"]["kind"], "empty");
}
