use serde::Deserialize;
use serde_yaml::Value;
use std::collections::BTreeSet;

use crate::error::ExposeError;
use crate::stage::repository_name;

/// Environment name meaning "no explicit selection".
pub const DEFAULT_ENVIRONMENT: &str = "default";

/// Loosely-typed description of one exposure request.
///
/// This is what arrives from action inputs or a manifest table before any
/// validation. `apps` and `exclude-env-vars` stay as raw YAML values so the
/// sequence checks can report the field that was malformed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RawEntry {
    #[serde(default)]
    pub git: Option<String>,
    #[serde(default, rename = "ref")]
    pub reference: Option<String>,
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default)]
    pub apps: Option<Value>,
    #[serde(default)]
    pub exclude_env_vars: Option<Value>,
}

impl RawEntry {
    /// Build from named text inputs, where list inputs hold YAML source.
    ///
    /// Empty strings are treated as absent, matching how CI runners pass unset
    /// inputs.
    pub fn from_inputs(
        git: Option<&str>,
        reference: Option<&str>,
        environment: Option<&str>,
        apps: Option<&str>,
        exclude_env_vars: Option<&str>,
    ) -> Result<Self, ExposeError> {
        Ok(Self {
            git: non_empty(git).map(str::to_string),
            reference: non_empty(reference).map(str::to_string),
            environment: non_empty(environment).map(str::to_string),
            apps: non_empty(apps).map(|s| parse_yaml("apps", s)).transpose()?,
            exclude_env_vars: non_empty(exclude_env_vars)
                .map(|s| parse_yaml("exclude-env-vars", s))
                .transpose()?,
        })
    }
}

/// A validated exposure request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    repository: String,
    revision: Option<String>,
    environment: String,
    executables: Vec<String>,
    excluded_variables: Option<BTreeSet<String>>,
}

impl Entry {
    pub fn repository(&self) -> &str {
        &self.repository
    }

    pub fn revision(&self) -> Option<&str> {
        self.revision.as_deref()
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Whether a specific environment was requested.
    pub fn has_explicit_environment(&self) -> bool {
        self.environment != DEFAULT_ENVIRONMENT
    }

    pub fn executables(&self) -> &[String] {
        &self.executables
    }

    pub fn excluded_variables(&self) -> Option<&BTreeSet<String>> {
        self.excluded_variables.as_ref()
    }

    /// Names listed more than once; later occurrences supersede earlier ones.
    pub fn duplicate_executables(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        let mut duplicates = BTreeSet::new();
        for name in &self.executables {
            if !seen.insert(name.as_str()) {
                duplicates.insert(name.as_str());
            }
        }
        duplicates.into_iter().collect()
    }
}

impl TryFrom<RawEntry> for Entry {
    type Error = ExposeError;

    fn try_from(raw: RawEntry) -> Result<Self, Self::Error> {
        let repository = raw
            .git
            .filter(|git| !git.trim().is_empty())
            .ok_or_else(|| ExposeError::validation("git", "input is required"))?;
        repository_name(&repository)?;

        let executables = match raw.apps {
            None | Some(Value::Null) => {
                return Err(ExposeError::validation("apps", "input is required"))
            }
            Some(value) => string_sequence("apps", value)?,
        };
        if executables.is_empty() {
            return Err(ExposeError::validation(
                "apps",
                "must list at least one executable",
            ));
        }
        for name in &executables {
            validate_executable_name(name)?;
        }

        let excluded_variables = match raw.exclude_env_vars {
            None | Some(Value::Null) => None,
            Some(value) => Some(
                string_sequence("exclude-env-vars", value)?
                    .into_iter()
                    .collect(),
            ),
        };

        Ok(Self {
            repository,
            revision: raw.reference.filter(|r| !r.is_empty()),
            environment: raw
                .environment
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string()),
            executables,
            excluded_variables,
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_yaml(field: &'static str, source: &str) -> Result<Value, ExposeError> {
    serde_yaml::from_str(source)
        .map_err(|err| ExposeError::validation(field, format!("not valid YAML: {err}")))
}

fn string_sequence(field: &'static str, value: Value) -> Result<Vec<String>, ExposeError> {
    let Value::Sequence(items) = value else {
        return Err(ExposeError::validation(field, "must be a list"));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(idx, item)| match item {
            Value::String(s) => Ok(s),
            Value::Number(n) => Ok(n.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            other => Err(ExposeError::validation(
                field,
                format!("item {idx} must be a string, found {other:?}"),
            )),
        })
        .collect()
}

/// Reject names that would address a file outside the bin directory.
pub(crate) fn validate_executable_name(name: &str) -> Result<(), ExposeError> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains(std::path::MAIN_SEPARATOR);
    if invalid {
        return Err(ExposeError::validation(
            "apps",
            format!("'{name}' is not a plain executable name"),
        ));
    }
    Ok(())
}
