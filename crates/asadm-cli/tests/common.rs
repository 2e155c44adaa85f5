//! Shared fixture for CLI integration tests: a two node snapshot and a
//! config path inside a temp dir.
#![allow(dead_code)]

use assert_cmd::Command;
use serde_json::{Value, json};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub fn sample_snapshot() -> Value {
    json!({
        "stats": {
            "service_stats": {
                "n1": {"cluster_size": "2", "stat_read_reqs": "10"},
                "n2": {"cluster_size": "2"},
            },
            "namespace_stats": {
                "n1": {"test": {
                    "master_objects": "4",
                    "memory_used_bytes": "512",
                    "effective_replication_factor": "2",
                }},
                "n2": {"test": {
                    "master_objects": "6",
                    "memory_used_bytes": "256",
                    "effective_replication_factor": "2",
                }},
            },
            "namespace_configs": {
                "n1": {"test": {"memory-size": "1024", "repl-factor": "2"}},
                "n2": {"test": {"memory-size": "1024", "repl-factor": "2"}},
            },
        },
        "metadata": {
            "server_build": {"n1": "6.2.0.3", "n2": "6.2.0.3"},
            "server_version": {"n1": "E-6.2.0.3", "n2": "E-6.2.0.3"},
            "cluster_name": {"n1": "prod", "n2": "prod"},
        },
        "histograms": {
            "objsz": {
                "n1": {"test": "units=bytes:hist-width=100:bucket-width=1:buckets=0,4,0,2"},
                "n2": {"test": "units=bytes:hist-width=100:bucket-width=1:buckets=0,1,5,0"},
            },
        },
    })
}

pub struct TestFixture {
    _temp_dir: TempDir,
    snapshot_path: PathBuf,
    config_path: PathBuf,
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl TestFixture {
    pub fn new() -> Self {
        Self::with_snapshot(sample_snapshot())
    }

    pub fn with_snapshot(snapshot: Value) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let snapshot_path = temp_dir.path().join("snapshot.json");
        let config_path = temp_dir.path().join("asadm").join("config.toml");

        fs::write(&snapshot_path, snapshot.to_string()).expect("Failed to write snapshot");

        Self {
            _temp_dir: temp_dir,
            snapshot_path,
            config_path,
        }
    }

    pub fn config_path(&self) -> &PathBuf {
        &self.config_path
    }

    pub fn write_config(&self, content: &str) {
        fs::create_dir_all(self.config_path.parent().unwrap()).expect("Failed to create config dir");
        fs::write(&self.config_path, content).expect("Failed to write config");
    }

    /// `asadm` pointed at the fixture snapshot and config, colors off.
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("asadm").expect("Failed to find asadm binary");
        cmd.arg("--snapshot")
            .arg(&self.snapshot_path)
            .arg("--config")
            .arg(&self.config_path)
            .arg("--color")
            .arg("never")
            .env_remove("RUST_LOG")
            .env_remove("ASADM_CONFIG")
            .env_remove("ASADM_SNAPSHOT");
        cmd
    }

    pub fn json(&self, args: &[&str]) -> Value {
        let output = self
            .command()
            .args(args)
            .arg("--format")
            .arg("json")
            .output()
            .expect("Failed to run asadm");
        assert!(
            output.status.success(),
            "asadm {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).expect("stdout is not JSON")
    }
}
