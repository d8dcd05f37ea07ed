//! Properties rewriting over generated wrapper files.

use gwu_common::{
    ChecksumPolicy, CommandOutput, DistType, ReleaseDescriptor, UpdateEngine, WrapperConfig,
    WrapperRunner,
};
use proptest::prelude::*;
use std::path::Path;

use super::common::assert_only_keys_changed;

const OWNED_KEYS: [&str; 2] = ["distributionUrl", "distributionSha256Sum"];

/// Never invoked: `target_config` does not touch the launcher.
struct NoRunner;

impl WrapperRunner for NoRunner {
    fn run(&self, _project_dir: &Path, _args: &[&str]) -> gwu_common::errors::Result<CommandOutput> {
        panic!("target_config must not run the wrapper");
    }
}

fn version() -> impl Strategy<Value = String> {
    prop_oneof![
        (1u32..10, 0u32..20).prop_map(|(major, minor)| format!("{major}.{minor}")),
        (1u32..10, 0u32..20, 1u32..5).prop_map(|(ma, mi, p)| format!("{ma}.{mi}.{p}")),
        (1u32..10, 1u32..5).prop_map(|(major, rc)| format!("{major}.0-rc-{rc}")),
    ]
}

fn dist_type() -> impl Strategy<Value = DistType> {
    prop_oneof![Just(DistType::Bin), Just(DistType::All)]
}

/// Lines that neither the updater nor the parser treat specially.
fn unrelated_line() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z][a-zA-Z0-9.]{0,12}=[a-zA-Z0-9/_.-]{0,20}"
            .prop_filter("owned key", |line| {
                !OWNED_KEYS.iter().any(|key| line.starts_with(&format!("{key}=")))
            }),
        "#[ a-zA-Z0-9:]{0,30}",
        "![ a-zA-Z0-9]{0,20}",
        Just(String::new()),
    ]
}

#[derive(Debug, Clone)]
struct GeneratedWrapper {
    text: String,
    version: String,
    dist_type: DistType,
    had_checksum: bool,
}

fn wrapper_file() -> impl Strategy<Value = GeneratedWrapper> {
    (
        prop::collection::vec(unrelated_line(), 0..8),
        prop::collection::vec(unrelated_line(), 0..8),
        version(),
        dist_type(),
        any::<bool>(),
        any::<bool>(),
        prop_oneof![Just("\n"), Just("\r\n")],
    )
        .prop_map(|(head, tail, version, dist_type, escaped, checksum, eol)| {
            let scheme = if escaped { "https\\:" } else { "https:" };
            let mut lines = head;
            lines.push(format!(
                "distributionUrl={scheme}//services.gradle.org/distributions/gradle-{version}-{dist_type}.zip"
            ));
            if checksum {
                lines.push(format!("distributionSha256Sum={}", "0".repeat(64)));
            }
            lines.extend(tail);
            let mut text = lines.join(eol);
            text.push_str(eol);
            GeneratedWrapper {
                text,
                version,
                dist_type,
                had_checksum: checksum,
            }
        })
}

fn release(version: &str) -> ReleaseDescriptor {
    ReleaseDescriptor {
        version: version.to_string(),
        full_checksum: "a".repeat(64),
        bin_checksum: "b".repeat(64),
        wrapper_checksum: String::new(),
    }
}

fn policy() -> impl Strategy<Value = ChecksumPolicy> {
    prop_oneof![
        Just(ChecksumPolicy::Pin),
        Just(ChecksumPolicy::Preserve),
        Just(ChecksumPolicy::Remove),
    ]
}

proptest! {
    #[test]
    fn unchanged_config_serializes_to_its_source(wrapper in wrapper_file()) {
        let config = WrapperConfig::parse("gradle/wrapper/gradle-wrapper.properties", wrapper.text.clone()).unwrap();
        prop_assert_eq!(config.version(), wrapper.version.as_str());
        prop_assert_eq!(config.dist_type(), wrapper.dist_type);
        prop_assert_eq!(config.serialize(), wrapper.text);
    }

    #[test]
    fn update_touches_only_owned_lines(
        wrapper in wrapper_file(),
        target in version(),
        policy in policy(),
    ) {
        let config = WrapperConfig::parse("gradle/wrapper/gradle-wrapper.properties", wrapper.text.clone()).unwrap();
        let engine = UpdateEngine::new(&NoRunner, policy);
        let release = release(&target);
        let next = engine.target_config(&config, &release).unwrap();
        let after = next.serialize();

        assert_only_keys_changed(&wrapper.text, &after, &OWNED_KEYS);

        let reparsed = WrapperConfig::parse("gradle/wrapper/gradle-wrapper.properties", after).unwrap();
        prop_assert_eq!(reparsed.version(), target.as_str());
        prop_assert_eq!(reparsed.dist_type(), wrapper.dist_type);

        let expected_checksum = match policy {
            ChecksumPolicy::Pin => release.checksum_for(wrapper.dist_type).map(str::to_string),
            ChecksumPolicy::Preserve => wrapper.had_checksum.then(|| "0".repeat(64)),
            ChecksumPolicy::Remove => None,
        };
        prop_assert_eq!(reparsed.distribution_checksum, expected_checksum);
    }
}
