use thiserror::Error;

/// An environment variable required by the application is not set, or is blank.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Missing environment variable: {0}")]
pub struct MissingEnvVarError(pub String);

/// Reads an environment variable, returning a structured error if it's missing.
///
/// A variable that is set but contains only whitespace is reported as missing.
///
/// # Arguments
/// * `name` - The name of the environment variable to read.
pub fn get_env_var(name: &str) -> Result<String, MissingEnvVarError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(MissingEnvVarError(name.to_string())),
    }
}

/// Reads an optional environment variable. Unset and blank both yield `None`.
pub fn get_optional_env_var(name: &str) -> Option<String> {
    get_env_var(name).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_variable_is_missing() {
        let err = get_env_var("SHARED_UTILS_TEST_SURELY_UNSET_VARIABLE").unwrap_err();
        assert_eq!(
            err,
            MissingEnvVarError("SHARED_UTILS_TEST_SURELY_UNSET_VARIABLE".to_string())
        );
        assert_eq!(
            err.to_string(),
            "Missing environment variable: SHARED_UTILS_TEST_SURELY_UNSET_VARIABLE"
        );
    }

    #[test]
    fn optional_variable_maps_missing_to_none() {
        assert_eq!(get_optional_env_var("SHARED_UTILS_TEST_SURELY_UNSET_VARIABLE"), None);
    }

    #[test]
    fn path_is_usually_set() {
        // PATH is present in every environment the test suite runs in.
        assert!(get_env_var("PATH").is_ok());
    }
}
