use std::io::Write;
use std::time::Duration;

use logsum_bench::{BenchConfig, BenchError, Harness, Outcome, Profiler, ProfileReport};
use logsum_core::{find_variant, InputSequence, SumError, Variant, VARIANTS};

fn quick_config(replications: usize) -> BenchConfig {
    BenchConfig {
        n: 2_000,
        replications,
        warmup: 0,
        ..Default::default()
    }
}

#[test]
fn test_run_records_requested_replications() {
    let harness = Harness::new(quick_config(12)).unwrap();
    let input = InputSequence::range(2_000).unwrap();
    let report = harness.run(&VARIANTS, &input);

    assert_eq!(report.entries.len(), VARIANTS.len());
    for entry in &report.entries {
        let m = entry.measurement().expect("every variant succeeds on 1..=n");
        assert_eq!(m.replications(), 12, "{}", entry.name);
        let summed: Duration = m.samples.iter().map(|s| s.elapsed).sum();
        assert_eq!(m.total(), summed, "{}", entry.name);
        assert!(m.min() <= m.median() && m.median() <= m.max());
    }
}

#[test]
fn test_run_ranks_by_mean() {
    let harness = Harness::new(quick_config(5)).unwrap();
    let input = InputSequence::range(2_000).unwrap();
    let report = harness.run(&VARIANTS, &input);

    let means: Vec<Duration> = report
        .entries
        .iter()
        .map(|e| e.measurement().unwrap().mean())
        .collect();
    assert!(means.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(report.entries[0].rank, Some(1));
    assert_eq!(report.entries[0].relative, Some(1.0));
    assert!(report.entries.iter().all(|e| e.relative.unwrap() >= 1.0));
}

#[test]
fn test_failing_variant_does_not_abort_run() {
    let broken = Variant {
        name: "broken",
        expression: "always fails",
        func: |_| {
            Err(SumError::Domain {
                index: 0,
                value: -1.0,
            })
        },
    };
    let variants = [
        *find_variant("iterative").unwrap(),
        broken,
        *find_variant("filled_sign").unwrap(),
    ];
    let harness = Harness::new(quick_config(3)).unwrap();
    let input = InputSequence::range(100).unwrap();
    let report = harness.run(&variants, &input);

    assert_eq!(report.entries.len(), 3);
    assert_eq!(report.entries[2].name, "broken");
    assert!(matches!(
        report.get("broken").unwrap().outcome,
        Outcome::Failed(SumError::Domain { .. })
    ));
    assert!(report.get("iterative").unwrap().measurement().is_some());
    assert!(report.get("filled_sign").unwrap().measurement().is_some());
}

#[test]
fn test_agreement_across_all_variants() {
    let harness = Harness::new(quick_config(2)).unwrap();
    let input = InputSequence::random(5_000, 10_000, 11).unwrap();
    let report = harness.run(&VARIANTS, &input);
    let agreement = report.agreement("iterative", 1e-9).unwrap();
    assert_eq!(agreement.reference, "iterative");
    assert!(agreement.is_ok(), "{:?}", agreement);
}

#[test]
fn test_agreement_flags_wrong_variant() {
    let wrong = Variant {
        name: "wrong",
        expression: "42",
        func: |_| Ok(42.0),
    };
    let variants = [*find_variant("iterative").unwrap(), wrong];
    let harness = Harness::new(quick_config(1)).unwrap();
    let input = InputSequence::range(10).unwrap();
    let agreement = harness
        .run(&variants, &input)
        .agreement("iterative", 1e-9)
        .unwrap();
    assert_eq!(agreement.disagreeing, vec!["wrong"]);
}

#[test]
fn test_config_file_round_trip() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{ "n": 64, "replications": 4, "variants": ["naive_sign", "recycled"], "seed": 3 }}"#
    )
    .unwrap();

    let config = BenchConfig::from_path(file.path()).unwrap();
    assert_eq!(config.n, 64);
    assert_eq!(config.seed, Some(3));

    let input = config.build_input().unwrap();
    let variants = config.selected_variants().unwrap();
    let report = Harness::new(config).unwrap().run(&variants, &input);
    assert_eq!(report.entries.len(), 2);
    assert_eq!(report.render_csv().lines().count(), 3);
}

#[test]
fn test_missing_config_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = BenchConfig::from_path(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, BenchError::Io(_)));
}

#[test]
fn test_profile_attributes_time_to_sign_construction() {
    let input = InputSequence::range(100_000).unwrap();
    let variant = find_variant("naive_sign").unwrap();
    let report = Profiler::new(Duration::from_micros(50))
        .profile_variant(variant, input.as_slice(), 30)
        .unwrap();

    assert!(report.sample_count > 0, "sampler took no samples");
    let outer = report.get("naive_sign").expect("outer frame sampled");
    assert!(outer.total_pct > 99.0);

    let replicate = report.get("replicate").expect("replicate frame sampled");
    assert_eq!(
        report.frames[0].frame, "replicate",
        "replicate should dominate self time: {:?}",
        report.frames
    );
    assert!(
        replicate.self_pct > 50.0,
        "replicate self share {:.1}%",
        replicate.self_pct
    );
    assert!(replicate.total_samples <= outer.total_samples);

    let self_sum: usize = report.frames.iter().map(|f| f.self_samples).sum();
    assert_eq!(self_sum, report.sample_count);
}

#[test]
fn test_profile_variant_rejects_bad_input() {
    let variant = find_variant("naive_sign").unwrap();
    let err = Profiler::default()
        .profile_variant(variant, &[1.0, 0.0], 10)
        .unwrap_err();
    assert!(matches!(err, BenchError::Sum(ref e) if e.is_domain()), "{err:?}");
}

#[test]
fn test_nested_profile_is_refused() {
    let profiler = Profiler::new(Duration::from_micros(20));
    let mut inner = None;
    let outer = profiler
        .profile(1, || {
            inner = Some(profiler.profile(1, || {}));
        })
        .unwrap();
    assert!(matches!(inner, Some(Err(BenchError::Profile(_)))));
    assert_eq!(outer.sample_count, 0);
}

#[test]
fn test_profile_of_arbitrary_closure_without_frames() {
    let report: ProfileReport = Profiler::new(Duration::from_micros(20))
        .profile(3, || {
            std::thread::sleep(Duration::from_millis(1));
        })
        .unwrap();
    assert_eq!(report.sample_count, 0);
    assert!(report.frames.is_empty());
}
