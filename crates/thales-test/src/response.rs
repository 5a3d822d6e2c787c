//! Response wrapper and path assertions.

use serde::de::{DeserializeOwned, Error as _};
use serde_json::Value;
use thales_core::{ExecutionResult, ResponseError};

use crate::error::TesterError;

/// The result of an executed request.
#[derive(Debug, Clone)]
pub struct TesterResponse {
    result: ExecutionResult,
}

impl TesterResponse {
    pub(crate) fn new(result: ExecutionResult) -> Self {
        Self { result }
    }

    /// Returns the response data.
    pub fn data(&self) -> Option<&Value> {
        self.result.data.as_ref()
    }

    /// Returns the response errors.
    pub fn errors(&self) -> &[ResponseError] {
        &self.result.errors
    }

    /// Returns the full execution result.
    pub fn result(&self) -> &ExecutionResult {
        &self.result
    }

    /// Consumes the response, returning the execution result.
    pub fn into_result(self) -> ExecutionResult {
        self.result
    }

    /// Selects a value inside `data`.
    ///
    /// Paths are field names joined with `.`, with `[n]` for list items, such
    /// as `project.releases[0].version`. An empty path selects `data` itself.
    pub fn path(&self, path: &str) -> PathSpec<'_> {
        PathSpec {
            path: path.to_string(),
            value: self.data().and_then(|data| resolve(data, path)),
        }
    }

    /// Asserts that the response has no errors.
    ///
    /// # Panics
    ///
    /// Panics if any error is present.
    pub fn assert_no_errors(&self) -> &Self {
        assert!(
            self.result.errors.is_empty(),
            "Expected no errors, got: {:?}",
            self.result.errors
        );
        self
    }

    /// Asserts the number of errors.
    ///
    /// # Panics
    ///
    /// Panics if the count differs.
    pub fn assert_error_count(&self, expected: usize) -> &Self {
        assert_eq!(
            self.result.errors.len(),
            expected,
            "Expected {} errors, got: {:?}",
            expected,
            self.result.errors
        );
        self
    }
}

/// A value selected from response data by path.
#[derive(Debug, Clone)]
pub struct PathSpec<'a> {
    path: String,
    value: Option<&'a Value>,
}

impl<'a> PathSpec<'a> {
    /// Returns the path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns true when a value exists at the path. `null` counts as a value.
    pub fn exists(&self) -> bool {
        self.value.is_some()
    }

    /// Returns the value at the path.
    pub fn value(&self) -> Option<&'a Value> {
        self.value
    }

    /// Deserializes the value at the path.
    ///
    /// # Errors
    ///
    /// Returns [`TesterError::Decode`] when no value exists or it does not
    /// match `T`.
    pub fn entity<T: DeserializeOwned>(&self) -> Result<T, TesterError> {
        let value = self
            .value
            .ok_or_else(|| serde_json::Error::custom(format!("no value at path '{}'", self.path)))?;
        Ok(T::deserialize(value)?)
    }

    /// Asserts that a value exists at the path.
    ///
    /// # Panics
    ///
    /// Panics if no value exists.
    pub fn assert_exists(&self) -> &Self {
        assert!(self.exists(), "No value at path '{}'", self.path);
        self
    }

    /// Asserts that the value at the path equals `expected`.
    ///
    /// # Panics
    ///
    /// Panics if no value exists or it differs.
    pub fn assert_value_eq(&self, expected: &Value) -> &Self {
        let actual = self
            .value
            .unwrap_or_else(|| panic!("No value at path '{}'", self.path));
        assert_eq!(actual, expected, "Value at path '{}'", self.path);
        self
    }
}

fn resolve<'a>(data: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = data;
    if path.is_empty() {
        return Some(current);
    }

    for part in path.split('.') {
        let (name, mut rest) = part.find('[').map_or((part, ""), |i| part.split_at(i));
        if !name.is_empty() {
            current = current.get(name)?;
        }
        while let Some(index) = rest.strip_prefix('[') {
            let end = index.find(']')?;
            current = current.get(index[..end].parse::<usize>().ok()?)?;
            rest = &index[end + 1..];
        }
        if !rest.is_empty() {
            return None;
        }
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    fn response() -> TesterResponse {
        TesterResponse::new(ExecutionResult::from_data(json!({
            "project": {
                "name": "thales",
                "releases": [
                    { "version": "0.1.0", "tags": ["first"] },
                    { "version": "0.2.0", "tags": [] }
                ],
                "license": null
            }
        })))
    }

    #[test]
    fn test_resolve_paths() {
        let response = response();
        response.path("project.name").assert_value_eq(&json!("thales"));
        response.path("project.releases[1].version").assert_value_eq(&json!("0.2.0"));
        response.path("project.releases[0].tags[0]").assert_value_eq(&json!("first"));
        assert!(response.path("project.license").exists());
        assert!(!response.path("project.missing").exists());
        assert!(!response.path("project.releases[9]").exists());
        assert!(!response.path("project.releases[x]").exists());
        assert!(!response.path("project.releases[0]junk").exists());
        assert!(response.path("").value().unwrap().get("project").is_some());
    }

    #[test]
    fn test_entity() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Release {
            version: String,
            tags: Vec<String>,
        }

        let response = response();
        let releases: Vec<Release> = response.path("project.releases").entity().unwrap();
        assert_eq!(releases.len(), 2);
        assert_eq!(releases[0].version, "0.1.0");

        let err = response.path("project.nothing").entity::<Release>().unwrap_err();
        assert!(err.to_string().contains("project.nothing"));
    }

    #[test]
    fn test_no_data() {
        let response = TesterResponse::new(ExecutionResult::from_errors(vec![ResponseError::new(
            "boom",
        )]));
        assert!(response.data().is_none());
        assert!(!response.path("anything").exists());
        response.assert_error_count(1);
    }

    #[test]
    #[should_panic(expected = "Expected no errors")]
    fn test_assert_no_errors_panics() {
        TesterResponse::new(ExecutionResult::from_errors(vec![ResponseError::new("boom")]))
            .assert_no_errors();
    }
}
