use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const KUBECONFIG: &str = "\
apiVersion: v1
kind: Config
current-context: lab
clusters:
- name: lab
  cluster:
    server: https://127.0.0.1:6443
contexts:
- name: lab
  context:
    cluster: lab
    user: admin
users:
- name: admin
  user:
    token: secret
";

fn home(with_kubeconfig: bool) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    if with_kubeconfig {
        std::fs::create_dir_all(dir.path().join(".kube")).unwrap();
        std::fs::write(dir.path().join(".kube/config"), KUBECONFIG).unwrap();
    }
    dir
}

fn cluster_manager(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("cluster-manager").unwrap();
    cmd.env("HOME", home)
        .env_remove("RUST_LOG")
        .env_remove("CLUSTER_MANAGER_FORMAT")
        .env_remove("CLUSTER_MANAGER_CONTEXT")
        .env_remove("CLUSTER_MANAGER_KUBECTL")
        .env_remove("CLUSTER_MANAGER_TIMEOUT");
    cmd
}

#[test]
fn no_command_prints_usage_and_fails() {
    let home = home(false);
    cluster_manager(home.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Usage:"));
}

#[test]
fn missing_kubeconfig_fails_even_for_help() {
    let home = home(false);
    cluster_manager(home.path())
        .arg("help")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("configuration error"))
        .stderr(predicate::str::contains("kubeconfig not found"));
}

#[test]
fn missing_home_is_config_error() {
    let home = home(true);
    cluster_manager(home.path())
        .env_remove("HOME")
        .arg("info")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("HOME is not set"));
}

#[test]
fn help_prints_usage() {
    let home = home(true);
    cluster_manager(home.path())
        .arg("help")
        .assert()
        .success()
        .stdout(predicate::str::contains("scale <ns> <name> <n>"))
        .stdout(predicate::str::contains("logs <ns> <pod> [n]"));
}

#[test]
fn unknown_command_is_usage_error() {
    let home = home(true);
    cluster_manager(home.path())
        .args(["--kubectl", "/nonexistent/kubectl", "frobnicate"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("unknown command \"frobnicate\""))
        .stderr(predicate::str::contains("info, health, scale, restart, backup, logs, help"))
        .stderr(predicate::str::contains("failed to run").not());
}

#[test]
fn unknown_option_is_usage_error() {
    let home = home(true);
    cluster_manager(home.path())
        .args(["--bogus", "info"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("usage error"))
        .stderr(predicate::str::contains("--bogus"))
        .stderr(predicate::str::contains("info, health, scale, restart, backup, logs, help"));
}

#[test]
fn stray_value_before_command_is_usage_error() {
    let home = home(true);
    cluster_manager(home.path())
        .arg("-1")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("usage error"))
        .stderr(predicate::str::contains("info, health, scale, restart, backup, logs, help"));
}

#[test]
fn bad_timeout_from_env_is_usage_error() {
    let home = home(true);
    cluster_manager(home.path())
        .env("CLUSTER_MANAGER_TIMEOUT", "abc")
        .arg("help")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("usage error"));
}

#[test]
fn help_ignores_extra_arguments() {
    let home = home(true);
    cluster_manager(home.path())
        .args(["help", "scale"])
        .assert()
        .success()
        .stdout(predicate::str::contains("scale <ns> <name> <n>"));
}

#[test]
fn logs_without_pod_never_runs_kubectl() {
    let home = home(true);
    cluster_manager(home.path())
        .args(["--kubectl", "/nonexistent/kubectl", "logs", "ns"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("usage: logs <ns> <pod> [n]"))
        .stderr(predicate::str::contains("failed to run").not());
}

#[test]
fn unreachable_binary_is_transport_error() {
    let home = home(true);
    cluster_manager(home.path())
        .args(["--kubectl", "/nonexistent/kubectl", "restart", "ns", "web"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("restart ns/web: failed to run"));
}

#[cfg(unix)]
mod fake_kubectl {
    use std::os::unix::fs::PermissionsExt;

    use super::*;

    const NODES: &str = r#"{"apiVersion":"v1","kind":"List","items":[
{"apiVersion":"v1","kind":"Node","metadata":{"name":"cp1"},"status":{"conditions":[{"type":"Ready","status":"True"}]}},
{"apiVersion":"v1","kind":"Node","metadata":{"name":"w1"},"status":{"conditions":[{"type":"Ready","status":"False"}]}}
]}"#;

    const PODS: &str = r#"{"apiVersion":"v1","kind":"List","items":[
{"apiVersion":"v1","kind":"Pod","metadata":{"name":"etcd-cp1","namespace":"kube-system"},"status":{"phase":"Running"}},
{"apiVersion":"v1","kind":"Pod","metadata":{"name":"web-1","namespace":"shop"},"status":{"phase":"Pending"}}
]}"#;

    const STORE_PENDING_FIRST: &str = r#"{"apiVersion":"v1","kind":"List","items":[
{"apiVersion":"v1","kind":"Pod","metadata":{"name":"etcd-cp1","namespace":"kube-system"},"status":{"phase":"Pending"}},
{"apiVersion":"v1","kind":"Pod","metadata":{"name":"etcd-cp2","namespace":"kube-system"},"status":{"phase":"Running"}}
]}"#;

    /// Writes a shell script standing in for kubectl. It appends its argv to
    /// `calls.log` and answers a handful of invocations. `FAKE_STORE` and
    /// `FAKE_SERVICES` switch some answers.
    fn install(dir: &Path) -> PathBuf {
        let script = format!(
            r#"#!/bin/sh
echo "$@" >> "{log}"
case "$*" in
  *"get nodes"*) cat <<'EOF'
{NODES}
EOF
  ;;
  *"get pods"*"-l component=etcd"*)
    case "$FAKE_STORE" in
      none) echo '{{"items":[]}}' ;;
      pending-first) cat <<'EOF'
{STORE_PENDING_FIRST}
EOF
      ;;
      *) cat <<'EOF'
{PODS}
EOF
      ;;
    esac
  ;;
  *"get pods -n traefik"*) echo 'error: You must be logged in to the server' >&2; exit 1 ;;
  *"get pods"*) cat <<'EOF'
{PODS}
EOF
  ;;
  *"get services"*)
    if [ "$FAKE_SERVICES" = garbage ]; then echo 'No resources found'; else echo '{{"items":[]}}'; fi
  ;;
  *"deployment ghost"*) echo 'Error from server (NotFound): deployments.apps "ghost" not found' >&2; exit 1 ;;
  *"scale deployment"*) echo "deployment.apps/web-app scaled" ;;
  *"exec"*) echo "Snapshot saved at /tmp/backup.db" ;;
  *"logs slow"*) sleep 5 ;;
  *"logs"*) printf 'first\nsecond\n' ;;
esac
"#,
            log = dir.join("calls.log").display(),
        );
        let path = dir.join("kubectl");
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn calls(dir: &Path) -> String {
        std::fs::read_to_string(dir.join("calls.log")).unwrap_or_default()
    }

    #[test]
    fn scale_passes_replicas_and_kubeconfig() {
        let home = home(true);
        let kubectl = install(home.path());
        cluster_manager(home.path())
            .arg("--kubectl")
            .arg(&kubectl)
            .args(["scale", "ns", "web-app", "3"])
            .assert()
            .success()
            .stdout("Successfully scaled deployment ns/web-app to 3 replicas\n");

        let log = calls(home.path());
        assert!(log.contains("scale deployment web-app -n ns --replicas=3"), "{log}");
        assert!(log.contains("--kubeconfig="), "{log}");
    }

    #[test]
    fn missing_deployment_is_not_found() {
        let home = home(true);
        let kubectl = install(home.path());
        cluster_manager(home.path())
            .arg("--kubectl")
            .arg(&kubectl)
            .args(["restart", "ns", "ghost"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("deployment not found: ns/ghost"));
    }

    #[test]
    fn health_report() {
        let home = home(true);
        let kubectl = install(home.path());
        cluster_manager(home.path())
            .arg("--kubectl")
            .arg(&kubectl)
            .args(["--critical-namespaces", "kube-system,traefik", "health"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Node Health: 1/2 nodes ready"))
            .stdout(predicate::str::contains("Pod Health: 1/2 pods running"))
            .stdout(predicate::str::contains("Namespace kube-system: 1/1 pods ready"))
            .stdout(predicate::str::contains("Namespace traefik: unavailable"));
    }

    #[test]
    fn info_as_json_lines() {
        let home = home(true);
        let kubectl = install(home.path());
        let output = cluster_manager(home.path())
            .arg("--kubectl")
            .arg(&kubectl)
            .args(["--format", "json", "info"])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();

        let sections: Vec<serde_json::Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(sections.len(), 4);
        assert_eq!(sections[0]["section"], "context");
        assert_eq!(sections[0]["context"], "lab");
        assert_eq!(sections[1]["kind"], "node");
        assert_eq!(sections[1]["items"][0]["name"], "cp1");
        assert_eq!(sections[2]["kind"], "pod");
        assert_eq!(sections[3]["kind"], "service");
    }

    #[test]
    fn backup_locates_store_pod_then_snapshots() {
        let home = home(true);
        let kubectl = install(home.path());
        cluster_manager(home.path())
            .arg("--kubectl")
            .arg(&kubectl)
            .arg("backup")
            .assert()
            .success()
            .stdout(predicate::str::contains("kube-system/etcd-cp1: /tmp/backup.db"));

        let log = calls(home.path());
        let lines: Vec<&str> = log.lines().collect();
        assert_eq!(lines.len(), 2, "{log}");
        assert!(lines[0].contains("get pods -n kube-system -l component=etcd -o json"));
        assert!(lines[1].contains("exec -n kube-system etcd-cp1 -- etcdctl snapshot save /tmp/backup.db"));
    }

    #[test]
    fn backup_without_store_pod_is_not_found() {
        let home = home(true);
        let kubectl = install(home.path());
        cluster_manager(home.path())
            .arg("--kubectl")
            .arg(&kubectl)
            .env("FAKE_STORE", "none")
            .arg("backup")
            .assert()
            .code(1)
            .stderr(predicate::str::contains("store pod not found"));

        let log = calls(home.path());
        assert_eq!(log.lines().count(), 1, "{log}");
        assert!(!log.contains("exec"), "{log}");
    }

    #[test]
    fn backup_prefers_running_store_pod() {
        let home = home(true);
        let kubectl = install(home.path());
        cluster_manager(home.path())
            .arg("--kubectl")
            .arg(&kubectl)
            .env("FAKE_STORE", "pending-first")
            .arg("backup")
            .assert()
            .success()
            .stdout(predicate::str::contains("kube-system/etcd-cp2: /tmp/backup.db"));

        let log = calls(home.path());
        let exec = log.lines().find(|l| l.contains("exec")).unwrap_or_default();
        assert!(exec.contains("exec -n kube-system etcd-cp2 --"), "{log}");
    }

    #[test]
    fn undecodable_listing_names_full_command() {
        let home = home(true);
        let kubectl = install(home.path());
        cluster_manager(home.path())
            .arg("--kubectl")
            .arg(&kubectl)
            .env("FAKE_SERVICES", "garbage")
            .arg("info")
            .assert()
            .code(1)
            .stderr(predicate::str::contains(format!(
                "unexpected output from `{}",
                kubectl.display()
            )))
            .stderr(predicate::str::contains("--kubeconfig="))
            .stderr(predicate::str::contains("get services --all-namespaces -o json"));
    }

    #[test]
    fn logs_are_forwarded() {
        let home = home(true);
        let kubectl = install(home.path());
        cluster_manager(home.path())
            .arg("--kubectl")
            .arg(&kubectl)
            .args(["logs", "shop", "web-1", "2"])
            .assert()
            .success()
            .stdout("Showing last 2 lines of logs for shop/web-1\nfirst\nsecond\n");
        assert!(calls(home.path()).contains("logs web-1 -n shop --tail=2"));
    }

    #[test]
    fn hung_call_times_out() {
        let home = home(true);
        let kubectl = install(home.path());
        cluster_manager(home.path())
            .arg("--kubectl")
            .arg(&kubectl)
            .args(["--timeout", "1", "logs", "ns", "slow"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("timed out after 1s"));
    }
}
