pub fn assert_contains(haystack: &str, needle: &str) {
    assert!(
        haystack.contains(needle),
        "Expected to find '{needle}' in output, got: {haystack}"
    );
}

/// Assert that `after` equals `before` once lines for `keys` are ignored.
pub fn assert_only_keys_changed(before: &str, after: &str, keys: &[&str]) {
    let owned = |line: &&str| {
        keys.iter().any(|key| {
            line.strip_prefix(key)
                .is_some_and(|rest| rest.starts_with(['=', ':', ' ', '\t']))
        })
    };
    let untouched_before: Vec<&str> = before.split_inclusive('\n').filter(|l| !owned(l)).collect();
    let untouched_after: Vec<&str> = after.split_inclusive('\n').filter(|l| !owned(l)).collect();
    assert_eq!(
        untouched_before, untouched_after,
        "Lines other than {keys:?} changed.\n--- before\n{before}\n--- after\n{after}"
    );
}
