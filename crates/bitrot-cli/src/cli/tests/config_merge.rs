//! Tests for merging command-line overrides into the config.

use super::parse;
use bitrot_core::config::BitrotConfig;
use bitrot_core::FlaggedPolicy;

#[test]
fn no_flags_keeps_config() {
    let cfg = BitrotConfig {
        chunk_size: 4096,
        jobs: 2,
        keep_last_good: true,
        fail_on_flagged: true,
    };
    let merged = parse(&["bitrot", "s.csv"]).merge_config(cfg.clone());
    assert_eq!(merged, cfg);
}

#[test]
fn flags_override_config() {
    let merged = parse(&[
        "bitrot",
        "s.csv",
        "--jobs",
        "6",
        "--chunk-size",
        "512",
        "--keep-last-good",
        "--fail-on-flagged",
    ])
    .merge_config(BitrotConfig::default());
    assert_eq!(merged.jobs, 6);
    assert_eq!(merged.chunk_size, 512);
    assert!(merged.fail_on_flagged);
    assert_eq!(merged.flagged_policy(), FlaggedPolicy::KeepLastGood);
}

#[test]
fn negated_flags_turn_off_config_switches() {
    let cfg = BitrotConfig {
        keep_last_good: true,
        fail_on_flagged: true,
        ..BitrotConfig::default()
    };
    let merged = parse(&["bitrot", "s.csv", "--no-keep-last-good", "--no-fail-on-flagged"])
        .merge_config(cfg);
    assert!(!merged.keep_last_good);
    assert!(!merged.fail_on_flagged);
    assert_eq!(merged.flagged_policy(), FlaggedPolicy::Advance);
}

#[test]
fn last_of_a_flag_pair_wins() {
    let merged = parse(&[
        "bitrot",
        "s.csv",
        "--no-fail-on-flagged",
        "--fail-on-flagged",
        "--keep-last-good",
        "--no-keep-last-good",
    ])
    .merge_config(BitrotConfig::default());
    assert!(merged.fail_on_flagged);
    assert!(!merged.keep_last_good);
}
