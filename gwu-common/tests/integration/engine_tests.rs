//! Update and verification against real processes.

#![cfg(unix)]

use gwu_common::{
    BestEffort, ChecksumPolicy, FileEncoding, GradlewRunner, LauncherDigest, ReleaseDescriptor,
    UpdateEngine, UpdateError, VerificationStep, WrapperConfig,
};
use sha2::{Digest, Sha256};

use super::common::fixtures::WRAPPER_PROPERTIES;
use super::common::{TestProject, assert_contains, assert_only_keys_changed, process_lock};

fn release(version: &str) -> ReleaseDescriptor {
    ReleaseDescriptor {
        version: version.to_string(),
        full_checksum: "a".repeat(64),
        bin_checksum: "b".repeat(64),
        wrapper_checksum: format!("{:x}", Sha256::digest(b"launcher")),
    }
}

#[test]
fn test_update_then_verify_with_matching_wrapper() {
    crate::test_log!("TEST START: test_update_then_verify_with_matching_wrapper");
    let _lock = process_lock();

    let project = TestProject::new(WRAPPER_PROPERTIES)
        .with_launcher_jar(b"launcher")
        .with_gradlew_stub("6.7", 0);
    let mut config = WrapperConfig::load(project.properties_path()).unwrap();
    let before = project.properties();

    let runner = GradlewRunner;
    let engine = UpdateEngine::new(&runner, ChecksumPolicy::Pin);
    let report = engine.update(&mut config, &release("6.7")).unwrap();
    crate::test_log!("Report: {:?}", report);

    assert_eq!(report.previous_version, "6.6.1");
    assert_eq!(report.launcher_refresh, BestEffort::Completed);
    assert_eq!(report.launcher_digest, LauncherDigest::Matches);

    let after = project.properties();
    assert_only_keys_changed(&before, &after, &["distributionUrl", "distributionSha256Sum"]);
    assert_contains(
        &after,
        "distributionUrl=https\\://services.gradle.org/distributions/gradle-6.7-bin.zip\n",
    );
    assert_contains(&after, &format!("distributionSha256Sum={}\n", "b".repeat(64)));

    VerificationStep::new(&runner).verify(&config).unwrap();

    let calls = project.gradlew_calls();
    assert_eq!(
        calls,
        vec![
            format!(
                "wrapper --gradle-version 6.7 --distribution-type bin --gradle-distribution-sha256-sum {}",
                "b".repeat(64)
            ),
            "--version".to_string(),
        ]
    );
}

#[test]
fn test_preserved_checksum_survives_launcher_regeneration() {
    crate::test_log!("TEST START: test_preserved_checksum_survives_launcher_regeneration");
    let _lock = process_lock();

    let properties = format!("{WRAPPER_PROPERTIES}distributionSha256Sum=feedface\n");
    let project = TestProject::new(&properties)
        .with_launcher_jar(b"launcher")
        .with_regenerating_gradlew_stub("6.7");
    let mut config = WrapperConfig::load(project.properties_path()).unwrap();

    let runner = GradlewRunner;
    let report = UpdateEngine::new(&runner, ChecksumPolicy::Preserve)
        .update(&mut config, &release("6.7"))
        .unwrap();
    crate::test_log!("Report: {:?}", report);
    assert_eq!(report.launcher_refresh, BestEffort::Completed);

    let after = project.properties();
    crate::test_log!("Regenerated properties:\n{}", after);
    assert_contains(&after, "distributionSha256Sum=feedface\n");
    assert_contains(
        &after,
        "distributionUrl=https\\://services.gradle.org/distributions/gradle-6.7-bin.zip\n",
    );
    assert_eq!(
        project.gradlew_calls()[0],
        "wrapper --gradle-version 6.7 --distribution-type bin \
         --gradle-distribution-sha256-sum feedface"
    );

    let reloaded = WrapperConfig::load(project.properties_path()).unwrap();
    assert_eq!(reloaded.distribution_checksum.as_deref(), Some("feedface"));
    VerificationStep::new(&runner).verify(&reloaded).unwrap();
}

#[test]
fn test_update_keeps_latin1_file_bytes() {
    crate::test_log!("TEST START: test_update_keeps_latin1_file_bytes");
    let _lock = process_lock();

    let project = TestProject::new(WRAPPER_PROPERTIES).with_gradlew_stub("6.7", 0);
    let mut bytes = b"# Wrapper f\xfcr CI\n".to_vec();
    bytes.extend_from_slice(WRAPPER_PROPERTIES.as_bytes());
    std::fs::write(project.properties_path(), &bytes).unwrap();

    let mut config = WrapperConfig::load(project.properties_path()).unwrap();
    assert_eq!(config.encoding(), FileEncoding::Latin1);

    let runner = GradlewRunner;
    UpdateEngine::new(&runner, ChecksumPolicy::Pin)
        .update(&mut config, &release("6.7"))
        .unwrap();

    let written = std::fs::read(project.properties_path()).unwrap();
    assert!(written.starts_with(b"# Wrapper f\xfcr CI\n"));
    assert!(String::from_utf8(written).is_err());
    assert_eq!(config.encoding(), FileEncoding::Latin1);
    assert_eq!(config.version(), "6.7");
    VerificationStep::new(&runner).verify(&config).unwrap();
}

#[test]
fn test_verify_detects_stale_wrapper() {
    crate::test_log!("TEST START: test_verify_detects_stale_wrapper");
    let _lock = process_lock();

    let project = TestProject::new(WRAPPER_PROPERTIES).with_gradlew_stub("6.6.0", 0);
    let mut config = WrapperConfig::load(project.properties_path()).unwrap();

    let runner = GradlewRunner;
    UpdateEngine::new(&runner, ChecksumPolicy::Preserve)
        .update(&mut config, &release("6.7"))
        .unwrap();

    let err = VerificationStep::new(&runner).verify(&config).unwrap_err();
    crate::test_log!("Error: {}", err);
    match err {
        UpdateError::VersionMismatch { expected, reported } => {
            assert_eq!(expected, "6.7");
            assert_eq!(reported.as_deref(), Some("6.6.0"));
        }
        other => panic!("unexpected error: {other}"),
    }
    // No launcher jar, so the wrapper task never ran.
    assert_eq!(project.gradlew_calls(), vec!["--version"]);
}

#[test]
fn test_failed_launcher_refresh_keeps_update() {
    crate::test_log!("TEST START: test_failed_launcher_refresh_keeps_update");
    let _lock = process_lock();

    let project = TestProject::new(WRAPPER_PROPERTIES)
        .with_launcher_jar(b"an older launcher")
        .with_gradlew_stub("6.7", 1);
    let mut config = WrapperConfig::load(project.properties_path()).unwrap();

    let runner = GradlewRunner;
    let report = UpdateEngine::new(&runner, ChecksumPolicy::Preserve)
        .update(&mut config, &release("6.7"))
        .unwrap();

    match &report.launcher_refresh {
        BestEffort::Failed(reason) => assert_contains(reason, "wrapper task exited 1"),
        other => panic!("unexpected refresh outcome: {other:?}"),
    }
    assert!(matches!(report.launcher_digest, LauncherDigest::Differs { .. }));
    assert_contains(&project.properties(), "gradle-6.7-bin.zip");
    VerificationStep::new(&runner).verify(&config).unwrap();
}

#[test]
fn test_non_executable_wrapper_is_execution_failure() {
    crate::test_log!("TEST START: test_non_executable_wrapper_is_execution_failure");
    let _lock = process_lock();

    let project = TestProject::new(WRAPPER_PROPERTIES).write_gradlew("#!/bin/sh\nexit 0\n", 0o644);
    let config = WrapperConfig::load(project.properties_path()).unwrap();

    let err = VerificationStep::new(&GradlewRunner).verify(&config).unwrap_err();
    assert!(matches!(err, UpdateError::ExecutionFailure { .. }));
    assert_eq!(err.code().code_string(), "GWU-E202");
}

#[test]
fn test_missing_wrapper_script_is_execution_failure() {
    crate::test_log!("TEST START: test_missing_wrapper_script_is_execution_failure");

    let project = TestProject::new(WRAPPER_PROPERTIES);
    let config = WrapperConfig::load(project.properties_path()).unwrap();

    let err = VerificationStep::new(&GradlewRunner).verify(&config).unwrap_err();
    assert!(matches!(err, UpdateError::ExecutionFailure { .. }));
}
