//! Environment overlay through the public loader API.

use layercfg::{Config, Error, FieldError, Loader};
use std::collections::HashMap;
use std::time::Duration;
use tempfile::TempDir;

fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[derive(Debug, Default, Config)]
struct Items {
    a: Vec<Item>,
}

#[derive(Debug, Default, Config)]
struct Item {
    #[config(required)]
    b: String,
    #[config(default = 5)]
    c: i64,
}

#[test]
fn test_sequence_elements_set_by_env() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("config.yaml"), "a:\n  - b: boo\n  - b: boo\n").unwrap();

    let mut items = Items::default();
    Loader::new()
        .dirs([temp.path()])
        .use_env("")
        .env_source(env(&[("A_0_B", "b0"), ("A_1_B", "b1"), ("A_0_C", "9000")]))
        .load(&mut items)
        .unwrap();

    assert_eq!(items.a.len(), 2);
    assert_eq!(items.a[0].b, "b0");
    assert_eq!(items.a[1].b, "b1");
    assert_eq!(items.a[0].c, 9000);
    assert_eq!(items.a[1].c, 5);
}

#[test]
fn test_env_cannot_grow_a_sequence_of_sections() {
    let mut items = Items::default();
    Loader::new()
        .ignore_file()
        .use_env("")
        .env_source(env(&[("A_0_B", "b0")]))
        .load(&mut items)
        .unwrap();
    assert!(items.a.is_empty());
}

#[derive(Debug, Default, Config)]
struct Outer {
    #[config(flatten)]
    inner: Inner,
    #[config(flatten, name = "cc")]
    counter: Counter,
}

#[derive(Debug, Default, Config)]
struct Inner {
    b: String,
}

#[derive(Debug, Default, Config)]
struct Counter {
    d: Option<i32>,
}

#[test]
fn test_flattened_sections_set_by_env() {
    let mut outer = Outer::default();
    Loader::new()
        .ignore_file()
        .use_env("")
        .env_source(env(&[("B", "flattened"), ("CC_D", "7")]))
        .load(&mut outer)
        .unwrap();
    assert_eq!(outer.inner.b, "flattened");
    assert_eq!(outer.counter.d, Some(7));
}

#[test]
fn test_flattened_fields_read_from_parent_table() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("config.toml"), "b = \"top\"\n\n[cc]\nd = 3\n").unwrap();

    let mut outer = Outer::default();
    Loader::new()
        .file("config.toml")
        .dirs([temp.path()])
        .strict()
        .load(&mut outer)
        .unwrap();
    assert_eq!(outer.inner.b, "top");
    assert_eq!(outer.counter.d, Some(3));
}

#[derive(Debug, Default, Config)]
struct Service {
    #[config(default = "localhost")]
    host: String,
    port: u16,
    debug: bool,
    #[config(default = "30s")]
    timeout: Duration,
    tags: Vec<String>,
}

#[test]
fn test_env_beats_file_and_defaults() {
    let temp = TempDir::new().unwrap();
    std::fs::write(
        temp.path().join("config.yaml"),
        "host: file.example\nport: 80\ntimeout: 10s\n",
    )
    .unwrap();

    let mut service = Service::default();
    Loader::new()
        .dirs([temp.path()])
        .use_env("svc")
        .env_source(env(&[
            ("SVC_PORT", "8080"),
            ("SVC_DEBUG", "true"),
            ("SVC_TAGS", "[a,b , c]"),
        ]))
        .load(&mut service)
        .unwrap();

    assert_eq!(service.host, "file.example");
    assert_eq!(service.port, 8080);
    assert!(service.debug);
    assert_eq!(service.timeout, Duration::from_secs(10));
    assert_eq!(service.tags, vec!["a", "b", "c"]);
}

#[test]
fn test_empty_env_value_overrides() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("config.yaml"), "host: file.example\n").unwrap();

    let mut service = Service::default();
    Loader::new()
        .dirs([temp.path()])
        .use_env("svc")
        .env_source(env(&[("SVC_HOST", "")]))
        .load(&mut service)
        .unwrap();
    // An empty value is present, so the default then fills the zero string.
    assert_eq!(service.host, "localhost");
}

#[test]
fn test_env_parse_failure_is_field_error() {
    let mut service = Service::default();
    let err = Loader::new()
        .ignore_file()
        .use_env("svc")
        .env_source(env(&[("SVC_PORT", "eighty"), ("SVC_TIMEOUT", "soon")]))
        .load(&mut service)
        .unwrap_err();

    let errs = match err {
        Error::Fields(errs) => errs,
        other => panic!("expected field errors, got {:?}", other),
    };
    assert_eq!(errs.len(), 2);
    assert!(matches!(
        errs.get("port"),
        Some(FieldError::Env { key, .. }) if key == "SVC_PORT"
    ));
    assert!(matches!(
        errs.get("timeout"),
        Some(FieldError::Env { key, .. }) if key == "SVC_TIMEOUT"
    ));
}

#[test]
fn test_env_disabled_by_default() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("config.yaml"), "port: 80\n").unwrap();

    let mut service = Service::default();
    Loader::new()
        .dirs([temp.path()])
        .env_source(env(&[("PORT", "9999")]))
        .load(&mut service)
        .unwrap();
    assert_eq!(service.port, 80);
}

#[derive(Debug, Default, Config)]
struct ProcessService {
    port: u16,
    #[config(default = "fallback")]
    name: String,
}

#[test]
fn test_process_environment_is_the_default_source() {
    // SAFETY: the variable name is unique to this test.
    unsafe { std::env::set_var("LAYERCFG_IT_PROCESS_PORT", "7070") };

    let mut service = ProcessService::default();
    Loader::new()
        .ignore_file()
        .use_env("layercfg_it_process")
        .load(&mut service)
        .unwrap();
    assert_eq!(service.port, 7070);
    assert_eq!(service.name, "fallback");
}
