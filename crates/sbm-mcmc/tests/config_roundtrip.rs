use std::fs;

use sbm_mcmc::{AlgorithmConfig, DegreeDlKind, LadderConfig, RunConfig};

#[test]
fn yaml_round_trip_through_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.yaml");

    let mut config = RunConfig::default();
    config.sweeps = 250;
    config.chains = 4;
    config.model.degree_corrected = true;
    config.model.entropy.degree_dl_kind = DegreeDlKind::Uniform;
    config.proposal.max_blocks = Some(5);
    config.algorithm = AlgorithmConfig::MergeSplit {
        launch_sweeps: 3,
        split_merge_moves: 0,
    };
    config.ladder = Some(LadderConfig::default());
    config.seed_policy.label = Some("nightly".to_string());

    fs::write(&path, config.to_yaml_string().unwrap()).unwrap();
    let loaded = RunConfig::load(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn omitted_fields_take_defaults() {
    let yaml = r#"
sweeps: 10
model:
  degree_corrected: true
  entropy:
    degree_dl_kind: ent
algorithm:
  type: multicanonical
  s_min: 10.0
  s_max: 90.0
"#;
    let config = RunConfig::from_yaml_str(yaml).unwrap();
    assert_eq!(config.sweeps, 10);
    assert_eq!(config.chains, 1);
    assert!(config.model.entropy.partition_dl);
    assert_eq!(config.model.entropy.degree_dl_kind, DegreeDlKind::Ent);
    let schedule = config.wang_landau_schedule().unwrap();
    assert_eq!(schedule.check_interval, 100);
    match config.algorithm {
        AlgorithmConfig::Multicanonical { bins, .. } => assert_eq!(bins, 100),
        other => panic!("unexpected algorithm {other:?}"),
    }
}

#[test]
fn invalid_values_are_rejected() {
    let err = RunConfig::from_yaml_str("proposal:\n  epsilon: 1.5\n").unwrap_err();
    assert_eq!(err.code(), "invalid-probability");

    let err = RunConfig::from_yaml_str("chains: 0\n").unwrap_err();
    assert_eq!(err.code(), "invalid-chains");

    let err = RunConfig::from_yaml_str(
        "algorithm:\n  type: multicanonical\n  s_min: 5.0\n  s_max: 1.0\n",
    )
    .unwrap_err();
    assert_eq!(err.code(), "invalid-range");

    let err = RunConfig::from_yaml_str(
        "ladder: {}\nalgorithm:\n  type: multicanonical\n  s_min: 0.0\n  s_max: 1.0\n",
    )
    .unwrap_err();
    assert_eq!(err.code(), "ladder-unsupported");

    let err = RunConfig::from_yaml_str("sweeps: [1, 2]\n").unwrap_err();
    assert_eq!(err.code(), "config-parse");

    let dir = tempfile::tempdir().unwrap();
    let err = RunConfig::load(&dir.path().join("missing.yaml")).unwrap_err();
    assert_eq!(err.code(), "config-read");
}
