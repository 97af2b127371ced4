//! Environment variable naming and lookup.

use crate::field::FieldPath;
use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

/// Derive the environment variable name for a field path.
///
/// `.` and `[` become `_`, `]` is dropped, a non-empty prefix is joined with
/// `_`, and the whole key is uppercased:
/// `loggers[0].log_level` with prefix `myapp` is `MYAPP_LOGGERS_0_LOG_LEVEL`.
pub fn format_env_key(path: &str, prefix: &str) -> String {
    let mut key = String::with_capacity(prefix.len() + path.len() + 1);
    if !prefix.is_empty() {
        key.push_str(prefix);
        key.push('_');
    }
    for c in path.chars() {
        match c {
            '.' | '[' => key.push('_'),
            ']' => {}
            c => key.push(c),
        }
    }
    key.to_uppercase()
}

/// Environment key for a structured path.
pub fn env_key_for(path: &FieldPath, prefix: &str) -> String {
    format_env_key(&path.to_string(), prefix)
}

/// A source of environment variables.
pub trait EnvSource: Send + Sync {
    /// The value of `key`, or `None` when unset. An empty value is present.
    fn var(&self, key: &str) -> Option<String>;
}

/// The process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        // Non-unicode values are treated as unset.
        std::env::var(key).ok()
    }
}

impl<S: BuildHasher + Send + Sync> EnvSource for HashMap<String, String, S> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl EnvSource for BTreeMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_env_key() {
        assert_eq!(format_env_key("loggers[0].log_level", ""), "LOGGERS_0_LOG_LEVEL");
        assert_eq!(
            format_env_key("loggers[0].log_level", "myapp"),
            "MYAPP_LOGGERS_0_LOG_LEVEL"
        );
        assert_eq!(format_env_key("port", "App"), "APP_PORT");
        assert_eq!(format_env_key("a.b[12].c", ""), "A_B_12_C");
    }

    #[test]
    fn test_env_key_for_path() {
        let path = FieldPath::root().child("spec").child("containers").index(1).child("image");
        assert_eq!(env_key_for(&path, ""), "SPEC_CONTAINERS_1_IMAGE");
    }

    #[test]
    fn test_map_source_distinguishes_empty_from_unset() {
        let mut env = HashMap::new();
        env.insert("EMPTY".to_string(), String::new());
        assert_eq!(env.var("EMPTY"), Some(String::new()));
        assert_eq!(env.var("MISSING"), None);
    }

    #[test]
    fn test_process_env() {
        // SAFETY: the variable name is unique to this test.
        unsafe { std::env::set_var("LAYERCFG_ENV_TEST_PROCESS", "on") };
        assert_eq!(ProcessEnv.var("LAYERCFG_ENV_TEST_PROCESS"), Some("on".to_string()));
        assert_eq!(ProcessEnv.var("LAYERCFG_ENV_TEST_UNSET_VARIABLE"), None);
    }
}
