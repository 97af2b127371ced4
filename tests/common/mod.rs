//! Shared fixtures for integration tests.
//!
//! Each fixture exists in YAML, JSON and TOML with the same logical content
//! and is written into a fresh temporary directory by the test that uses it.

#![allow(dead_code)]

use layercfg::Config;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

pub const FORMATS: [&str; 3] = ["yaml", "json", "toml"];

#[derive(Debug, Default, PartialEq, Config)]
pub struct Pod {
    #[config(name = "apiVersion", default = "v1")]
    pub api_version: String,
    #[config(required)]
    pub kind: String,
    pub metadata: Metadata,
    pub spec: Spec,
}

#[derive(Debug, Default, PartialEq, Config)]
pub struct Metadata {
    pub name: String,
    #[config(default = "[dev,staging,prod]")]
    pub environments: Vec<String>,
    #[config(required)]
    pub master: bool,
    #[config(name = "maxPercentUtil", default = "0.5")]
    pub max_percent_util: Option<f64>,
    #[config(default = "10s")]
    pub retry: Duration,
}

#[derive(Debug, Default, PartialEq, Config)]
pub struct Spec {
    pub containers: Vec<Container>,
    pub volumes: Vec<Option<Volume>>,
}

#[derive(Debug, Default, PartialEq, Config)]
pub struct Container {
    #[config(required)]
    pub name: String,
    #[config(required)]
    pub image: String,
    pub command: Vec<String>,
    pub env: Vec<EnvVar>,
    pub ports: Vec<Port>,
    pub resources: Resources,
    #[config(name = "volumeMounts")]
    pub volume_mounts: Vec<VolumeMount>,
}

#[derive(Debug, Default, PartialEq, Config)]
pub struct EnvVar {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Default, PartialEq, Config)]
pub struct Port {
    #[config(name = "containerPort", required)]
    pub container_port: u16,
}

#[derive(Debug, Default, PartialEq, Config)]
pub struct Resources {
    pub limits: Limits,
    pub requests: Option<Requests>,
}

#[derive(Debug, Default, PartialEq, Config)]
pub struct Limits {
    pub cpu: String,
}

#[derive(Debug, Default, PartialEq, Config)]
pub struct Requests {
    #[config(default = "64Mi")]
    pub memory: String,
    #[config(default = "250m")]
    pub cpu: Option<String>,
}

#[derive(Debug, Default, PartialEq, Config)]
pub struct VolumeMount {
    #[config(name = "mountPath", required)]
    pub mount_path: String,
    #[config(required)]
    pub name: String,
}

#[derive(Debug, Default, PartialEq, Config)]
pub struct Volume {
    #[config(required)]
    pub name: String,
    #[config(name = "configMap")]
    pub config_map: Option<ConfigMap>,
}

#[derive(Debug, Default, PartialEq, Config)]
pub struct ConfigMap {
    #[config(required)]
    pub name: String,
    #[config(required)]
    pub items: Vec<Item>,
}

#[derive(Debug, Default, PartialEq, Config)]
pub struct Item {
    #[config(required)]
    pub key: String,
    #[config(required)]
    pub path: String,
}

/// The value every valid pod fixture resolves to.
pub fn valid_pod() -> Pod {
    Pod {
        api_version: "v1".into(),
        kind: "Pod".into(),
        metadata: Metadata {
            name: "redis".into(),
            environments: vec!["dev".into(), "staging".into(), "prod".into()],
            master: true,
            max_percent_util: Some(0.5),
            retry: Duration::from_secs(10),
        },
        spec: Spec {
            containers: vec![Container {
                name: "redis".into(),
                image: "redis:5.0.4".into(),
                command: vec!["redis-server".into(), "/redis-master/redis.conf".into()],
                env: vec![EnvVar {
                    name: "MASTER".into(),
                    value: "true".into(),
                }],
                ports: vec![Port {
                    container_port: 6379,
                }],
                resources: Resources {
                    limits: Limits { cpu: "0.1".into() },
                    // Allocated during loading and filled from defaults.
                    requests: Some(Requests {
                        memory: "64Mi".into(),
                        cpu: Some("250m".into()),
                    }),
                },
                volume_mounts: vec![
                    VolumeMount {
                        mount_path: "/redis-master-data".into(),
                        name: "data".into(),
                    },
                    VolumeMount {
                        mount_path: "/redis-master".into(),
                        name: "config".into(),
                    },
                ],
            }],
            volumes: vec![
                Some(Volume {
                    name: "data".into(),
                    config_map: Some(ConfigMap {
                        name: "redis-data".into(),
                        items: vec![Item {
                            key: "dump".into(),
                            path: "dump.rdb".into(),
                        }],
                    }),
                }),
                Some(Volume {
                    name: "config".into(),
                    config_map: Some(ConfigMap {
                        name: "example-redis-config".into(),
                        items: vec![Item {
                            key: "redis-config".into(),
                            path: "redis.conf".into(),
                        }],
                    }),
                }),
            ],
        },
    }
}

pub const VALID_POD_YAML: &str = r#"
kind: Pod
metadata:
  name: redis
  master: true
spec:
  containers:
    - name: redis
      image: redis:5.0.4
      command:
        - redis-server
        - /redis-master/redis.conf
      env:
        - name: MASTER
          value: "true"
      ports:
        - containerPort: 6379
      resources:
        limits:
          cpu: "0.1"
      volumeMounts:
        - mountPath: /redis-master-data
          name: data
        - mountPath: /redis-master
          name: config
  volumes:
    - name: data
      configMap:
        name: redis-data
        items:
          - key: dump
            path: dump.rdb
    - name: config
      configMap:
        name: example-redis-config
        items:
          - key: redis-config
            path: redis.conf
"#;

pub const VALID_POD_JSON: &str = r#"{
  "kind": "Pod",
  "metadata": {"name": "redis", "master": true},
  "spec": {
    "containers": [{
      "name": "redis",
      "image": "redis:5.0.4",
      "command": ["redis-server", "/redis-master/redis.conf"],
      "env": [{"name": "MASTER", "value": "true"}],
      "ports": [{"containerPort": 6379}],
      "resources": {"limits": {"cpu": "0.1"}},
      "volumeMounts": [
        {"mountPath": "/redis-master-data", "name": "data"},
        {"mountPath": "/redis-master", "name": "config"}
      ]
    }],
    "volumes": [
      {"name": "data", "configMap": {"name": "redis-data", "items": [{"key": "dump", "path": "dump.rdb"}]}},
      {"name": "config", "configMap": {"name": "example-redis-config", "items": [{"key": "redis-config", "path": "redis.conf"}]}}
    ]
  }
}"#;

pub const VALID_POD_TOML: &str = r#"
kind = "Pod"

[metadata]
name = "redis"
master = true

[[spec.containers]]
name = "redis"
image = "redis:5.0.4"
command = ["redis-server", "/redis-master/redis.conf"]
env = [{ name = "MASTER", value = "true" }]
ports = [{ containerPort = 6379 }]
resources = { limits = { cpu = "0.1" } }
volumeMounts = [
  { mountPath = "/redis-master-data", name = "data" },
  { mountPath = "/redis-master", name = "config" },
]

[[spec.volumes]]
name = "data"
configMap = { name = "redis-data", items = [{ key = "dump", path = "dump.rdb" }] }

[[spec.volumes]]
name = "config"
configMap = { name = "example-redis-config", items = [{ key = "redis-config", path = "redis.conf" }] }
"#;

/// Missing: `kind`, `metadata.master`, `spec.containers[0].image`,
/// `spec.volumes[0].configMap.items` and `spec.volumes[1].name`.
pub const INVALID_POD_YAML: &str = r#"
metadata:
  name: redis
spec:
  containers:
    - name: redis
  volumes:
    - name: data
      configMap:
        name: redis-data
    - configMap:
        name: example-redis-config
        items:
          - key: redis-config
            path: redis.conf
"#;

pub const INVALID_POD_JSON: &str = r#"{
  "metadata": {"name": "redis"},
  "spec": {
    "containers": [{"name": "redis"}],
    "volumes": [
      {"name": "data", "configMap": {"name": "redis-data"}},
      {"configMap": {"name": "example-redis-config", "items": [{"key": "redis-config", "path": "redis.conf"}]}}
    ]
  }
}"#;

pub const INVALID_POD_TOML: &str = r#"
[metadata]
name = "redis"

[[spec.containers]]
name = "redis"

[[spec.volumes]]
name = "data"
configMap = { name = "redis-data" }

[[spec.volumes]]
configMap = { name = "example-redis-config", items = [{ key = "redis-config", path = "redis.conf" }] }
"#;

pub fn valid_pod_source(format: &str) -> &'static str {
    match format {
        "yaml" => VALID_POD_YAML,
        "json" => VALID_POD_JSON,
        "toml" => VALID_POD_TOML,
        other => panic!("unknown format {}", other),
    }
}

pub fn invalid_pod_source(format: &str) -> &'static str {
    match format {
        "yaml" => INVALID_POD_YAML,
        "json" => INVALID_POD_JSON,
        "toml" => INVALID_POD_TOML,
        other => panic!("unknown format {}", other),
    }
}

/// `host` and `logger.log_level` only.
pub fn server_source(format: &str) -> &'static str {
    match format {
        "yaml" => "host: \"0.0.0.0\"\nlogger:\n  log_level: debug\n",
        "json" => r#"{"host": "0.0.0.0", "logger": {"log_level": "debug"}}"#,
        "toml" => "host = \"0.0.0.0\"\n\n[logger]\nlog_level = \"debug\"\n",
        other => panic!("unknown format {}", other),
    }
}

/// Write `content` as `dir/name` and return the file name.
pub fn write_fixture(dir: &Path, name: &str, content: &str) -> String {
    std::fs::write(dir.join(name), content).expect("Failed to write fixture");
    name.to_string()
}

/// A temp dir holding `<stem>.<format>` with `content`.
pub fn fixture_dir(stem: &str, format: &str, content: &str) -> (TempDir, String) {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let name = write_fixture(temp.path(), &format!("{}.{}", stem, format), content);
    (temp, name)
}
