//! Branch names, commit messages and pull request text.

/// Identity used for every commit the updater makes.
pub const COMMITTER_NAME: &str = "gradle-update-robot";
pub const COMMITTER_EMAIL: &str = "gradle-update-robot@regolo.cc";

const BRANCH_PREFIX: &str = "gradlew-update-";

/// Subject line plus optional body paragraph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitMessage {
    pub subject: String,
    pub body: Option<String>,
}

/// Working branch for an update to `version`.
pub fn branch_name(version: &str) -> String {
    format!("{BRANCH_PREFIX}{version}")
}

pub fn release_notes_url(version: &str) -> String {
    format!("https://docs.gradle.org/{version}/release-notes.html")
}

fn title(target: &str, source: Option<&str>) -> String {
    match source {
        Some(source) => format!("Update Gradle Wrapper from {source} to {target}."),
        None => format!("Update Gradle Wrapper to {target}."),
    }
}

pub fn commit_message(source: &str, target: &str) -> CommitMessage {
    CommitMessage {
        subject: title(target, Some(source)),
        body: Some(format!("Read the release notes: {}", release_notes_url(target))),
    }
}

/// Title of the pull request. `source` is known only when a single wrapper
/// was updated.
pub fn pull_request_title(target: &str, source: Option<&str>) -> String {
    title(target, source)
}

pub fn pull_request_body(target: &str, source: Option<&str>) -> String {
    format!(
        "{}\n\nRead the release notes: {}\n\n---\n\n\
         This pull request was opened by Gradle Wrapper Updater.",
        title(target, source),
        release_notes_url(target)
    )
}
