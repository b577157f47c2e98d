//! Environment delta engine.
//!
//! Turns the variables a pixi activation would produce into the minimal set a
//! trampoline needs to replay that activation for a single executable: the
//! directories to prepend to `PATH`, and the remaining variables to set.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::error::ExposeError;

/// Name of the PATH-like variable.
pub const PATH_VAR: &str = "PATH";

/// Variable naming the root of the activated environment.
pub const ACTIVE_PREFIX_VAR: &str = "CONDA_PREFIX";

/// Prefixes of pixi's own bookkeeping variables. Leaking these into a
/// downstream process makes it look like it is still inside `pixi shell`.
pub const RESERVED_PREFIXES: &[&str] = &["PIXI_"];

/// Separator between entries of a PATH-like value.
#[cfg(windows)]
pub const PATH_LIST_SEPARATOR: char = ';';
#[cfg(not(windows))]
pub const PATH_LIST_SEPARATOR: char = ':';

/// Snapshot of the invoking process's own environment.
///
/// Taken once at startup and passed in explicitly so the engine never reads
/// process state mid-computation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AmbientEnvironment {
    path: String,
}

impl AmbientEnvironment {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_process() -> Self {
        Self::new(std::env::var(PATH_VAR).unwrap_or_default())
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Variables reported by `pixi shell-hook` for one environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedEnvironment {
    variables: BTreeMap<String, String>,
}

impl CapturedEnvironment {
    pub fn new(variables: BTreeMap<String, String>) -> Self {
        Self { variables }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.variables.get(name).map(String::as_str)
    }

    pub fn variables(&self) -> &BTreeMap<String, String> {
        &self.variables
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for CapturedEnvironment {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::new(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// What a trampoline needs to recreate an activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentDelta {
    pub active_prefix: PathBuf,
    pub path_delta: Vec<String>,
    pub environment: BTreeMap<String, String>,
}

impl EnvironmentDelta {
    /// Derive the delta for `environment_name` from its captured activation.
    pub fn compute(
        captured: &CapturedEnvironment,
        ambient: &AmbientEnvironment,
        excluded: Option<&BTreeSet<String>>,
        environment_name: &str,
    ) -> Result<Self, ExposeError> {
        let active_prefix = captured
            .get(ACTIVE_PREFIX_VAR)
            .filter(|prefix| !prefix.is_empty())
            .ok_or_else(|| ExposeError::MissingExpectedOutput {
                variable: ACTIVE_PREFIX_VAR.to_string(),
                environment: environment_name.to_string(),
            })?;

        let hook_path = captured.get(PATH_VAR).unwrap_or_default();

        Ok(Self {
            active_prefix: PathBuf::from(active_prefix),
            path_delta: path_diff(hook_path, ambient.path()),
            environment: filter_variables(captured, excluded),
        })
    }

    /// Location of the real executable for `name`.
    pub fn executable_path(&self, name: &str) -> PathBuf {
        executable_path(&self.active_prefix, name)
    }
}

pub fn executable_path(active_prefix: &Path, name: &str) -> PathBuf {
    active_prefix.join("bin").join(name)
}

/// Directories the activation put in front of the ambient `PATH`.
///
/// When `hook_path` ends with `ambient_path` on an entry boundary, only the
/// part before it is kept. Otherwise the activation rewrote the ambient
/// entries and the whole of `hook_path` is returned, preferring extra
/// directories over dropping one. Empty segments are discarded and order is
/// preserved.
///
/// This is stricter than a plain trailing-substring match: a suffix that
/// starts in the middle of an entry does not count. `X:YA:B` against `A:B`
/// yields `[X, YA, B]`, never a truncated `[X, Y]`.
pub fn path_diff(hook_path: &str, ambient_path: &str) -> Vec<String> {
    let region = match hook_path.strip_suffix(ambient_path) {
        Some(prefix) if on_entry_boundary(prefix, ambient_path) => prefix,
        _ => hook_path,
    };

    region
        .split(PATH_LIST_SEPARATOR)
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

fn on_entry_boundary(prefix: &str, ambient_path: &str) -> bool {
    prefix.is_empty()
        || ambient_path.is_empty()
        || prefix.ends_with(PATH_LIST_SEPARATOR)
        || ambient_path.starts_with(PATH_LIST_SEPARATOR)
}

/// Whether `name` must be kept out of the published environment.
pub fn is_suppressed(name: &str, excluded: Option<&BTreeSet<String>>) -> bool {
    name == PATH_VAR
        || RESERVED_PREFIXES
            .iter()
            .any(|prefix| name.starts_with(prefix))
        || excluded.is_some_and(|set| set.contains(name))
}

/// Captured variables minus `PATH`, reserved prefixes and `excluded`.
pub fn filter_variables(
    captured: &CapturedEnvironment,
    excluded: Option<&BTreeSet<String>>,
) -> BTreeMap<String, String> {
    captured
        .variables()
        .iter()
        .filter(|(name, _)| !is_suppressed(name, excluded))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::suffix("X:Y:A:B", "A:B", &["X", "Y"])]
    #[case::no_suffix("Z:Q", "A:B", &["Z", "Q"])]
    #[case::identical("A:B", "A:B", &[])]
    #[case::empty_ambient("X:Y", "", &["X", "Y"])]
    #[case::empty_segments("X::Y:A:B", "A:B", &["X", "Y"])]
    #[case::reordered("X:B:A", "A:B", &["X", "B", "A"])]
    #[case::partial_entry("X:YA:B", "A:B", &["X", "YA", "B"])]
    #[case::empty_hook("", "A:B", &[])]
    fn path_diff_cases(#[case] hook: &str, #[case] ambient: &str, #[case] expected: &[&str]) {
        assert_eq!(path_diff(hook, ambient), expected);
    }

    #[test]
    fn path_diff_keeps_order_and_duplicates() {
        assert_eq!(
            path_diff("/p/bin:/q/bin:/p/bin:/usr/bin", "/usr/bin"),
            vec!["/p/bin", "/q/bin", "/p/bin"]
        );
    }

    #[test]
    fn filter_removes_path_reserved_and_excluded() {
        let captured: CapturedEnvironment = [
            ("PATH", "/x:/usr/bin"),
            ("PIXI_FOO", "x"),
            ("HOME", "/h"),
            ("FOO", "1"),
        ]
        .into_iter()
        .collect();
        let excluded: BTreeSet<String> = ["HOME".to_string()].into();

        let env = filter_variables(&captured, Some(&excluded));
        assert_eq!(env, BTreeMap::from([("FOO".to_string(), "1".to_string())]));
    }

    #[test]
    fn filter_without_exclusions_keeps_everything_else() {
        let captured: CapturedEnvironment =
            [("PATH", "/x"), ("PIXI_PROJECT_ROOT", "/p"), ("HOME", "/h")]
                .into_iter()
                .collect();

        let env = filter_variables(&captured, None);
        assert_eq!(env.keys().collect::<Vec<_>>(), vec!["HOME"]);
    }

    #[test]
    fn compute_builds_delta() {
        let captured: CapturedEnvironment = [
            ("PATH", "/env/bin:/usr/bin:/bin"),
            ("CONDA_PREFIX", "/env"),
            ("PIXI_ENVIRONMENT_NAME", "default"),
        ]
        .into_iter()
        .collect();
        let ambient = AmbientEnvironment::new("/usr/bin:/bin");

        let delta = EnvironmentDelta::compute(&captured, &ambient, None, "default").unwrap();
        assert_eq!(delta.active_prefix, PathBuf::from("/env"));
        assert_eq!(delta.path_delta, vec!["/env/bin"]);
        assert_eq!(
            delta.environment,
            BTreeMap::from([("CONDA_PREFIX".to_string(), "/env".to_string())])
        );
        assert_eq!(delta.executable_path("rg"), PathBuf::from("/env/bin/rg"));
    }

    #[test]
    fn compute_requires_active_prefix() {
        let captured: CapturedEnvironment = [("PATH", "/x")].into_iter().collect();
        let err = EnvironmentDelta::compute(&captured, &AmbientEnvironment::default(), None, "docs")
            .unwrap_err();

        match err {
            ExposeError::MissingExpectedOutput {
                variable,
                environment,
            } => {
                assert_eq!(variable, ACTIVE_PREFIX_VAR);
                assert_eq!(environment, "docs");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn compute_rejects_empty_active_prefix() {
        let captured: CapturedEnvironment = [("CONDA_PREFIX", "")].into_iter().collect();
        assert!(
            EnvironmentDelta::compute(&captured, &AmbientEnvironment::default(), None, "default")
                .is_err()
        );
    }
}
