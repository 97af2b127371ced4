//! Per-field resolution: environment overlay, required check, default.

use crate::coerce::Coercer;
use crate::env::{EnvSource, env_key_for};
use crate::error::{FieldError, FieldErrors};
use crate::field::Field;
use crate::kind::Kind;
use tracing::debug;

/// Resolves flattened fields against the environment and their annotations.
pub struct Resolver<'r> {
    coercer: &'r Coercer,
    env: Option<EnvOverlay<'r>>,
}

struct EnvOverlay<'r> {
    prefix: &'r str,
    source: &'r dyn EnvSource,
}

impl<'r> Resolver<'r> {
    pub fn new(coercer: &'r Coercer) -> Self {
        Self {
            coercer,
            env: None,
        }
    }

    /// Overlay variables from `source`, named with `prefix`.
    pub fn with_env(mut self, prefix: &'r str, source: &'r dyn EnvSource) -> Self {
        self.env = Some(EnvOverlay { prefix, source });
        self
    }

    /// Resolve every field, collecting one error per failing path.
    pub fn resolve<'a>(&self, fields: impl IntoIterator<Item = Field<'a>>) -> Result<(), FieldErrors> {
        let mut errs = FieldErrors::new();
        for mut field in fields {
            if let Err(err) = self.resolve_field(&mut field) {
                errs.insert(field.path().to_string(), err);
            }
        }
        if errs.is_empty() { Ok(()) } else { Err(errs) }
    }

    pub fn resolve_field(&self, field: &mut Field<'_>) -> Result<(), FieldError> {
        let default = field.default_literal();
        if field.required() && default.is_some() {
            return Err(FieldError::Conflict);
        }

        if let Some(env) = &self.env {
            let key = env_key_for(field.path(), env.prefix);
            if let Some(raw) = env.source.var(&key) {
                let parsed = self
                    .coercer
                    .coerce(&field.kind(), &raw)
                    .map_err(|source| FieldError::Env {
                        key: key.clone(),
                        source,
                    })?;
                field
                    .set(parsed)
                    .map_err(|source| FieldError::Env { key: key.clone(), source })?;
                debug!(path = %field.path(), key = %key, "set from environment");
            }
        }

        if field.required() && field.is_zero() {
            return Err(FieldError::Required);
        }

        if let Some(literal) = default {
            if field.is_zero() {
                let kind = field.kind();
                if kind == Kind::Bool {
                    return Err(FieldError::DefaultOnBool);
                }
                let parsed = self
                    .coercer
                    .coerce(&kind, literal)
                    .map_err(|source| FieldError::Default { source })?;
                field
                    .set(parsed)
                    .map_err(|source| FieldError::Default { source })?;
                debug!(path = %field.path(), default = literal, "applied default");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Config;
    use crate::error::CoerceError;
    use crate::flatten::{Section, Walker};
    use std::collections::HashMap;
    use std::time::Duration;

    #[derive(Debug, Default, Config)]
    struct Logger {
        #[config(name = "log_level", default = "info")]
        level: String,
        #[config(required)]
        sink: String,
    }

    #[derive(Debug, Default, Config)]
    struct App {
        #[config(default = "10")]
        workers: u32,
        #[config(default = "1m")]
        timeout: Duration,
        debug: bool,
        loggers: Vec<Logger>,
        ports: Vec<u16>,
    }

    fn run(app: &mut App, env: &HashMap<String, String>, prefix: &str) -> Result<(), FieldErrors> {
        let coercer = Coercer::default();
        let resolver = Resolver::new(&coercer).with_env(prefix, env);
        resolver.resolve(app.fields(&Walker::new("config")))
    }

    #[test]
    fn test_defaults_fill_zero_fields_only() {
        let mut app = App {
            workers: 5,
            ..Default::default()
        };
        run(&mut app, &HashMap::new(), "").unwrap();
        assert_eq!(app.workers, 5);
        assert_eq!(app.timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_required_reports_indexed_path() {
        let mut app = App {
            loggers: vec![
                Logger {
                    sink: "stdout".into(),
                    ..Default::default()
                },
                Logger::default(),
            ],
            ..Default::default()
        };
        let errs = run(&mut app, &HashMap::new(), "").unwrap_err();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs.get("loggers[1].sink"), Some(&FieldError::Required));
        assert_eq!(app.loggers[0].level, "info");
        assert_eq!(app.loggers[1].level, "info");
    }

    #[test]
    fn test_env_overrides_and_satisfies_required() {
        let mut app = App {
            workers: 3,
            loggers: vec![Logger::default()],
            ..Default::default()
        };
        let env = HashMap::from([
            ("MYAPP_WORKERS".to_string(), "8".to_string()),
            ("MYAPP_DEBUG".to_string(), "true".to_string()),
            ("MYAPP_PORTS".to_string(), "[80, 443]".to_string()),
            ("MYAPP_LOGGERS_0_SINK".to_string(), "stderr".to_string()),
            ("MYAPP_LOGGERS_0_LOG_LEVEL".to_string(), "warn".to_string()),
        ]);
        run(&mut app, &env, "myapp").unwrap();
        assert_eq!(app.workers, 8);
        assert!(app.debug);
        assert_eq!(app.ports, vec![80, 443]);
        assert_eq!(app.loggers[0].sink, "stderr");
        assert_eq!(app.loggers[0].level, "warn");
    }

    #[test]
    fn test_env_parse_failure_names_key() {
        let mut app = App::default();
        let env = HashMap::from([("PORTS".to_string(), "80,-1".to_string())]);
        let errs = run(&mut app, &env, "").unwrap_err();
        match errs.get("ports") {
            Some(FieldError::Env { key, source }) => {
                assert_eq!(key, "PORTS");
                assert!(matches!(source, CoerceError::InvalidUint { .. }));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[derive(Debug, Default, Config)]
    struct Broken {
        #[config(required, default = "x")]
        both: String,
        #[config(default = "true")]
        flag: bool,
        #[config(default = "true")]
        maybe: Option<bool>,
        #[config(default = "abc")]
        count: i32,
    }

    #[test]
    fn test_annotation_failures_aggregate() {
        let mut broken = Broken::default();
        let coercer = Coercer::default();
        let errs = Resolver::new(&coercer)
            .resolve(broken.fields(&Walker::new("config")))
            .unwrap_err();
        assert_eq!(errs.get("both"), Some(&FieldError::Conflict));
        assert_eq!(errs.get("flag"), Some(&FieldError::DefaultOnBool));
        assert!(matches!(errs.get("count"), Some(FieldError::Default { .. })));
        assert!(!errs.contains("maybe"));
        assert_eq!(broken.maybe, Some(true));
        assert!(errs.to_string().starts_with(
            "both: field cannot have both a required validation and a default value, count: "
        ));
    }

    #[test]
    fn test_bool_set_from_env_despite_default_restriction() {
        let mut broken = Broken {
            both: String::new(),
            ..Default::default()
        };
        let env = HashMap::from([("FLAG".to_string(), "true".to_string())]);
        let coercer = Coercer::default();
        let errs = Resolver::new(&coercer)
            .with_env("", &env)
            .resolve(broken.fields(&Walker::new("config")))
            .unwrap_err();
        assert!(broken.flag);
        assert!(!errs.contains("flag"));
    }
}
