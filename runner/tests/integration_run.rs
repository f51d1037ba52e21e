use engine::persist::{save_index, save_meta, IndexPaths, MetaFile, INDEX_VERSION};
use engine::{Experiment, ExperimentConfig, Strategy};
use runner::{evaluate, normalized_qrels_path, prepare_index, read_queries, run_to_file, sweep};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const COLLECTION: &str = "\
.I 1
.T
wing design
.A
smith
.B
j. ae. 1
.W
the wing generates lift at low speed
.I 2
.T
engine test
.W
the engine provides thrust
.I 3
.T
shock waves
.W
supersonic flow over a blunt body produces shock waves
";

const QUERIES: &str = "\
.I 001
.W
wing lift
.I 004
.W
???
.I 008
.W
shock waves in supersonic flow
";

fn write_cran(dir: &Path) {
    fs::write(dir.join("cran.all.1400"), COLLECTION).unwrap();
    fs::write(dir.join("cran.qry"), QUERIES).unwrap();
    fs::write(dir.join("cranqrel"), "1 1 2\n3 3 1\n").unwrap();
}

#[test]
fn run_writes_trec_lines_for_each_searchable_query() {
    let dir = tempdir().unwrap();
    write_cran(dir.path());
    let experiment = Experiment::new(ExperimentConfig::default()).unwrap();
    let index = prepare_index(&experiment, dir.path(), None).unwrap();
    let queries = read_queries(dir.path()).unwrap();
    assert_eq!(queries.len(), 3);

    let output = dir.path().join("runs/baseline.txt");
    let summary = run_to_file(&experiment, &index, &queries, &output).unwrap();
    assert_eq!(summary.run_tag, "run_english");
    assert_eq!(summary.queries, 3);
    assert_eq!(summary.queries_with_hits, 2);

    let text = fs::read_to_string(&output).unwrap();
    let lines: Vec<Vec<&str>> = text.lines().map(|l| l.split(' ').collect()).collect();
    assert_eq!(lines.len(), summary.entries);
    assert!(lines.iter().all(|l| l.len() == 6 && l[1] == "Q0" && l[5] == "run_english"));
    assert!(lines.iter().all(|l| l[0] != "2"));
    assert_eq!(&lines[0][..4], &["1", "Q0", "1", "1"]);
    let first_q3 = lines.iter().find(|l| l[0] == "3").unwrap();
    assert_eq!(first_q3[2], "3");
    assert_eq!(first_q3[3], "1");
}

#[test]
fn persisted_index_gives_the_same_run() {
    let dir = tempdir().unwrap();
    write_cran(dir.path());
    let experiment = Experiment::new(ExperimentConfig::for_strategy(Strategy::Rocchio)).unwrap();
    let built = prepare_index(&experiment, dir.path(), None).unwrap();

    let index_dir = dir.path().join("index");
    let paths = IndexPaths::new(&index_dir);
    save_index(&paths, &built).unwrap();
    let meta = MetaFile {
        num_docs: built.num_docs(),
        created_at: "2024-01-01T00:00:00Z".into(),
        version: INDEX_VERSION,
        strategy: "rocchio".into(),
        analyzers: built.analyzers().to_string(),
    };
    save_meta(&paths, &meta).unwrap();
    let loaded = prepare_index(&experiment, dir.path(), Some(&index_dir)).unwrap();

    let queries = read_queries(dir.path()).unwrap();
    let a = dir.path().join("a.txt");
    let b = dir.path().join("b.txt");
    run_to_file(&experiment, &built, &queries, &a).unwrap();
    run_to_file(&experiment, &loaded, &queries, &b).unwrap();
    assert_eq!(fs::read_to_string(a).unwrap(), fs::read_to_string(b).unwrap());
}

#[test]
fn prebuilt_index_must_match_the_experiment_analyzer() {
    let dir = tempdir().unwrap();
    write_cran(dir.path());
    let config = ExperimentConfig { analyzer: Some("standard".into()), ..ExperimentConfig::default() };
    let standard = Experiment::new(config).unwrap();
    let built = prepare_index(&standard, dir.path(), None).unwrap();
    let paths = IndexPaths::new(dir.path().join("index"));
    save_index(&paths, &built).unwrap();
    let meta = MetaFile {
        num_docs: built.num_docs(),
        created_at: "2024-01-01T00:00:00Z".into(),
        version: INDEX_VERSION,
        strategy: "baseline".into(),
        analyzers: built.analyzers().to_string(),
    };
    save_meta(&paths, &meta).unwrap();
    let queries = read_queries(dir.path()).unwrap();

    let english = Experiment::new(ExperimentConfig::default()).unwrap();
    let loaded = prepare_index(&english, dir.path(), Some(&paths.root)).unwrap();
    let output = dir.path().join("english.txt");
    let err = run_to_file(&english, &loaded, &queries, &output).unwrap_err();
    assert!(err.to_string().contains("default=standard"));
    assert!(!output.exists());

    let output = dir.path().join("standard.txt");
    let summary = run_to_file(&standard, &loaded, &queries, &output).unwrap();
    assert_eq!(summary.run_tag, "run_standard");
    let text = fs::read_to_string(&output).unwrap();
    assert!(!text.is_empty());
    assert!(text.lines().all(|l| l.ends_with(" run_standard")));
}

#[test]
fn sweep_writes_one_file_per_parameter_pair() {
    let dir = tempdir().unwrap();
    write_cran(dir.path());
    let base = ExperimentConfig::default();
    let experiment = Experiment::new(base.clone()).unwrap();
    let index = prepare_index(&experiment, dir.path(), None).unwrap();
    let queries = read_queries(dir.path()).unwrap();

    let out = dir.path().join("sweep");
    let summaries = sweep(&base, &[0.8, 1.2], &[0.4, 0.75], &index, &queries, &out).unwrap();
    assert_eq!(summaries.len(), 4);
    for name in ["bm25_0.8_0.4.txt", "bm25_0.8_0.75.txt", "bm25_1.2_0.4.txt", "bm25_1.2_0.75.txt"] {
        assert!(out.join(name).is_file(), "{name}");
    }
    let text = fs::read_to_string(out.join("bm25_1.2_0.75.txt")).unwrap();
    assert!(text.lines().all(|l| l.ends_with(" run_bm25_1.2_0.75")));
}

#[test]
fn sweep_rejects_out_of_range_b() {
    let dir = tempdir().unwrap();
    write_cran(dir.path());
    let base = ExperimentConfig::default();
    let index = prepare_index(&Experiment::new(base.clone()).unwrap(), dir.path(), None).unwrap();
    let queries = read_queries(dir.path()).unwrap();
    assert!(sweep(&base, &[1.2], &[1.5], &index, &queries, &dir.path().join("sweep")).is_err());
}

#[test]
fn missing_collection_is_reported() {
    let dir = tempdir().unwrap();
    let experiment = Experiment::new(ExperimentConfig::default()).unwrap();
    let err = prepare_index(&experiment, dir.path(), None).unwrap_err();
    assert!(format!("{err:#}").contains("cran.all.1400"));
}

#[cfg(unix)]
#[test]
fn evaluate_invokes_trec_eval_with_normalized_qrels() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    write_cran(dir.path());
    let run = dir.path().join("run.txt");
    fs::write(&run, "1 Q0 1 1 2.5 t\n").unwrap();

    let script = dir.path().join("fake_trec_eval.sh");
    fs::write(&script, "#!/bin/sh\necho \"args $*\"\ncat \"$3\"\n").unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
    let out = evaluate(&script, dir.path(), &run, &["-m".to_string(), "map".to_string()]).unwrap();
    let qrels = normalized_qrels_path(&run);
    assert_eq!(qrels, dir.path().join("run.txt.norm.qrels"));
    assert!(out.starts_with(&format!("args -m map {} {}", qrels.display(), run.display())));
    assert!(out.contains("\n1 0 1 2\n3 0 3 1\n"));

    let qrels_named_run = dir.path().join("bm25.qrels");
    fs::write(&qrels_named_run, "1 Q0 1 1 2.5 t\n").unwrap();
    evaluate(&script, dir.path(), &qrels_named_run, &["-m".to_string(), "map".to_string()]).unwrap();
    assert_eq!(fs::read_to_string(&qrels_named_run).unwrap(), "1 Q0 1 1 2.5 t\n");
    assert!(dir.path().join("bm25.qrels.norm.qrels").is_file());

    let broken = dir.path().join("broken.sh");
    fs::write(&broken, "#!/bin/sh\necho boom >&2\nexit 3\n").unwrap();
    fs::set_permissions(&broken, fs::Permissions::from_mode(0o755)).unwrap();
    let err = evaluate(&broken, dir.path(), &run, &[]).unwrap_err();
    assert!(err.to_string().contains("boom"));
}
