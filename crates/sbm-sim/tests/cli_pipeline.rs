use std::fs;
use std::path::Path;
use std::process::Command;

fn sbm_sim() -> Command {
    Command::new(env!("CARGO_BIN_EXE_sbm-sim"))
}

fn generate(dir: &Path) {
    let status = sbm_sim()
        .args(["generate", "--sizes", "5,5", "--p-in", "0.9", "--p-out", "0.05", "--seed", "3"])
        .arg("--out")
        .arg(dir.join("graph.json"))
        .arg("--partition-out")
        .arg(dir.join("planted.json"))
        .status()
        .unwrap();
    assert!(status.success());
}

#[test]
fn run_writes_summary_and_best_partition() {
    let dir = tempfile::tempdir().unwrap();
    generate(dir.path());
    fs::write(
        dir.path().join("run.yaml"),
        "sweeps: 20\nchains: 2\nseed_policy:\n  master_seed: 9\n",
    )
    .unwrap();

    let out = dir.path().join("out");
    let run = |out: &Path| {
        let status = sbm_sim()
            .arg("run")
            .arg("--config")
            .arg(dir.path().join("run.yaml"))
            .arg("--graph")
            .arg(dir.path().join("graph.json"))
            .arg("--out")
            .arg(out)
            .status()
            .unwrap();
        assert!(status.success());
    };
    run(&out);

    let summary: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("summary.json")).unwrap()).unwrap();
    assert_eq!(summary["chains"].as_array().unwrap().len(), 2);
    assert_eq!(summary["master_seed"], 9);
    let best: Vec<usize> =
        serde_json::from_str(&fs::read_to_string(out.join("best_partition.json")).unwrap())
            .unwrap();
    assert_eq!(best.len(), 10);
    assert!(out.join("config.yaml").exists());

    let again = dir.path().join("again");
    run(&again);
    assert_eq!(
        fs::read_to_string(out.join("summary.json")).unwrap(),
        fs::read_to_string(again.join("summary.json")).unwrap()
    );
}

#[test]
fn entropy_prints_a_breakdown() {
    let dir = tempfile::tempdir().unwrap();
    generate(dir.path());
    let output = sbm_sim()
        .arg("entropy")
        .arg("--graph")
        .arg(dir.path().join("graph.json"))
        .arg("--partition")
        .arg(dir.path().join("planted.json"))
        .arg("--degree-corrected")
        .output()
        .unwrap();
    assert!(output.status.success());
    let breakdown: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(breakdown["adjacency"].as_f64().unwrap().is_finite());
    assert!(breakdown["degrees"].as_f64().unwrap() > 0.0);
}

#[test]
fn exhaustive_writes_its_summary() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("k3.json"),
        sbm_graph::graph_to_json(&sbm_graph::complete_graph(3, false)).unwrap(),
    )
    .unwrap();
    let out = dir.path().join("exhaustive.json");
    let status = sbm_sim()
        .arg("exhaustive")
        .arg("--graph")
        .arg(dir.path().join("k3.json"))
        .args(["--max-blocks", "3"])
        .arg("--out")
        .arg(&out)
        .status()
        .unwrap();
    assert!(status.success());
    let summary: sbm_mcmc::ExhaustiveSummary =
        serde_json::from_str(&fs::read_to_string(out).unwrap()).unwrap();
    assert_eq!(summary.states, 5);
    assert_eq!(summary.argmin.len(), 3);
}

#[test]
fn missing_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    generate(dir.path());
    let output = sbm_sim()
        .arg("run")
        .arg("--config")
        .arg(dir.path().join("absent.yaml"))
        .arg("--graph")
        .arg(dir.path().join("graph.json"))
        .arg("--out")
        .arg(dir.path().join("out"))
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("config-read"));
}
