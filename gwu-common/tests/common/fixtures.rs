//! Throwaway Gradle projects for integration tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, OnceLock};
use tempfile::TempDir;

pub const WRAPPER_PROPERTIES: &str = "distributionBase=GRADLE_USER_HOME\n\
                                      distributionPath=wrapper/dists\n\
                                      distributionUrl=https\\://services.gradle.org/distributions/gradle-6.6.1-bin.zip\n\
                                      zipStoreBase=GRADLE_USER_HOME\n\
                                      zipStorePath=wrapper/dists\n";

/// Serializes tests that write and then execute scripts.
///
/// A script written while another thread forks can fail to exec with
/// "text file busy" because the child briefly holds the write handle.
pub fn process_lock() -> MutexGuard<'static, ()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A project directory containing `gradle/wrapper/gradle-wrapper.properties`.
pub struct TestProject {
    pub dir: TempDir,
}

impl TestProject {
    pub fn new(properties: &str) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let wrapper_dir = dir.path().join("gradle").join("wrapper");
        fs::create_dir_all(&wrapper_dir).expect("Failed to create wrapper dir");
        fs::write(wrapper_dir.join("gradle-wrapper.properties"), properties)
            .expect("Failed to write properties");
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn properties_path(&self) -> PathBuf {
        self.root()
            .join("gradle")
            .join("wrapper")
            .join("gradle-wrapper.properties")
    }

    pub fn properties(&self) -> String {
        fs::read_to_string(self.properties_path()).expect("Failed to read properties")
    }

    pub fn with_launcher_jar(self, bytes: &[u8]) -> Self {
        fs::write(
            self.root().join("gradle").join("wrapper").join("gradle-wrapper.jar"),
            bytes,
        )
        .expect("Failed to write launcher jar");
        self
    }

    /// Install a `gradlew` that reports `reported` for `--version`, exits
    /// with `wrapper_exit` for the `wrapper` task, and appends its arguments
    /// to `gradlew.calls`.
    #[cfg(unix)]
    pub fn with_gradlew_stub(self, reported: &str, wrapper_exit: i32) -> Self {
        let script = format!(
            "#!/bin/sh\n\
             echo \"$*\" >> \"$(dirname \"$0\")/gradlew.calls\"\n\
             if [ \"$1\" = \"--version\" ]; then\n\
             \x20 printf '\\n------------------------------------------------------------\\n'\n\
             \x20 printf 'Gradle %s\\n' '{reported}'\n\
             \x20 printf '------------------------------------------------------------\\n'\n\
             \x20 exit 0\n\
             fi\n\
             echo 'wrapper task exited {wrapper_exit}' >&2\n\
             exit {wrapper_exit}\n"
        );
        self.write_gradlew(&script, 0o755)
    }

    /// Install a `gradlew` whose `wrapper` task regenerates the properties
    /// file from its arguments the way Gradle does: `distributionSha256Sum`
    /// is only written when `--gradle-distribution-sha256-sum` is passed.
    #[cfg(unix)]
    pub fn with_regenerating_gradlew_stub(self, reported: &str) -> Self {
        let script = format!(
            r#"#!/bin/sh
dir="$(dirname "$0")"
echo "$*" >> "$dir/gradlew.calls"
if [ "$1" = "--version" ]; then
  printf 'Gradle %s\n' '{reported}'
  exit 0
fi
version=""
type="bin"
sum=""
while [ $# -gt 0 ]; do
  case "$1" in
    --gradle-version) version="$2"; shift ;;
    --distribution-type) type="$2"; shift ;;
    --gradle-distribution-sha256-sum) sum="$2"; shift ;;
  esac
  shift
done
props="$dir/gradle/wrapper/gradle-wrapper.properties"
printf 'distributionBase=GRADLE_USER_HOME\n' > "$props"
printf 'distributionPath=wrapper/dists\n' >> "$props"
if [ -n "$sum" ]; then
  printf 'distributionSha256Sum=%s\n' "$sum" >> "$props"
fi
printf 'distributionUrl=https\\://services.gradle.org/distributions/gradle-%s-%s.zip\n' "$version" "$type" >> "$props"
printf 'zipStoreBase=GRADLE_USER_HOME\n' >> "$props"
printf 'zipStorePath=wrapper/dists\n' >> "$props"
"#
        );
        self.write_gradlew(&script, 0o755)
    }

    /// Install a `gradlew` with the given body and permission bits.
    #[cfg(unix)]
    pub fn write_gradlew(self, body: &str, mode: u32) -> Self {
        use std::os::unix::fs::PermissionsExt;

        let path = self.root().join("gradlew");
        fs::write(&path, body).expect("Failed to write gradlew");
        fs::set_permissions(&path, fs::Permissions::from_mode(mode))
            .expect("Failed to chmod gradlew");
        self
    }

    /// Argument lines recorded by the stub, one per invocation.
    pub fn gradlew_calls(&self) -> Vec<String> {
        fs::read_to_string(self.root().join("gradlew.calls"))
            .map(|calls| calls.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }
}
