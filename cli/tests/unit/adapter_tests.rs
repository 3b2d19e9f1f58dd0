//! Infrastructure adapters driven through a recording `CommandRunner`.

#![allow(clippy::expect_used)]

use std::time::Duration;

use tfcheck_cli::application::ports::{
    ConfigStore, CredentialApi, Provisioner, RemoteHost, RemoteShell,
};
use tfcheck_cli::domain::error::{ProvisionError, RetryError};
use tfcheck_cli::infra::aws::AwsKeyPairs;
use tfcheck_cli::infra::config::YamlConfigStore;
use tfcheck_cli::infra::ssh::SshCli;
use tfcheck_cli::infra::terraform::TerraformCli;
use tfcheck_common::ProvisioningOptions;

use crate::mocks::{RecordingRunner, err_output, ok_output, sample_key_pair};

const TLS_TIMEOUT: &[u8] =
    b"Error: Failed to install provider\n\nError installing provider \"aws\": net/http: TLS handshake timeout";

fn terraform(runner: &RecordingRunner) -> TerraformCli<RecordingRunner> {
    TerraformCli::new(runner.clone(), "terraform")
        .with_timeouts(Duration::from_secs(600), Duration::from_secs(30))
}

// ── TerraformCli ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_init_and_apply_runs_both_commands_in_automation_mode() {
    let runner = RecordingRunner::new();
    let opts = ProvisioningOptions::new("/work/tf").with_var("key_pair_name", "k1");

    terraform(&runner)
        .init_and_apply(&opts)
        .await
        .expect("apply should pass");

    let calls = runner.recorded();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].program, "terraform");
    assert_eq!(calls[0].args[..2], ["-chdir=/work/tf", "init"]);
    assert_eq!(calls[1].args[1], "apply");
    assert!(calls[1].args.contains(&"key_pair_name=k1".to_string()));
    for call in &calls {
        assert_eq!(call.env.get("TF_IN_AUTOMATION").map(String::as_str), Some("1"));
        assert_eq!(call.timeout, Duration::from_secs(600));
    }
}

#[tokio::test(start_paused = true)]
async fn test_transient_apply_failure_is_retried() {
    let runner = RecordingRunner::with_outputs([
        ok_output(b""),
        err_output(TLS_TIMEOUT),
        ok_output(b"Apply complete!"),
    ]);
    let opts = ProvisioningOptions::new("/work/tf").with_default_retryable_errors();

    terraform(&runner)
        .init_and_apply(&opts)
        .await
        .expect("second apply attempt succeeds");

    let commands: Vec<String> = runner.recorded().into_iter().map(|c| c.args[1].clone()).collect();
    assert_eq!(commands, ["init", "apply", "apply"]);
}

#[tokio::test(start_paused = true)]
async fn test_transient_failure_gives_up_after_max_retries() {
    let runner = RecordingRunner::with_outputs([
        err_output(TLS_TIMEOUT),
        err_output(TLS_TIMEOUT),
        err_output(TLS_TIMEOUT),
        err_output(TLS_TIMEOUT),
    ]);
    let opts = ProvisioningOptions::new("/work/tf").with_default_retryable_errors();

    let err = terraform(&runner)
        .init_and_apply(&opts)
        .await
        .expect_err("init never recovers");

    assert!(err.downcast_ref::<RetryError>().is_some(), "got: {err:#}");
    assert_eq!(runner.recorded().len(), 4);
}

#[tokio::test]
async fn test_non_retryable_failure_stops_immediately() {
    let runner = RecordingRunner::with_outputs([
        ok_output(b""),
        err_output(b"Error: Reference to undeclared input variable"),
    ]);
    let opts = ProvisioningOptions::new("/work/tf").with_default_retryable_errors();

    let err = terraform(&runner)
        .init_and_apply(&opts)
        .await
        .expect_err("bad definitions");

    match err.downcast_ref::<ProvisionError>() {
        Some(ProvisionError::CommandFailed { command, code, stderr }) => {
            assert_eq!(command, "apply");
            assert_eq!(*code, 1);
            assert!(stderr.contains("undeclared input variable"));
        }
        other => panic!("expected CommandFailed, got {other:?}"),
    }
    assert_eq!(runner.recorded().len(), 2);
}

#[tokio::test]
async fn test_destroy_repeats_vars() {
    let runner = RecordingRunner::new();
    let opts = ProvisioningOptions::new("/work/tf").with_var("key_pair_name", "k1");

    terraform(&runner).destroy(&opts).await.expect("destroy");

    let calls = runner.recorded();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].args[1], "destroy");
    assert!(calls[0].args.contains(&"-auto-approve".to_string()));
    assert!(calls[0].args.contains(&"key_pair_name=k1".to_string()));
}

#[tokio::test]
async fn test_output_is_trimmed_and_uses_command_timeout() {
    let runner = RecordingRunner::with_outputs([ok_output(b"http://alb-123.elb.amazonaws.com\n")]);
    let opts = ProvisioningOptions::new("/work/tf");

    let value = terraform(&runner)
        .output(&opts, "alb_url")
        .await
        .expect("output");

    assert_eq!(value, "http://alb-123.elb.amazonaws.com");
    let calls = runner.recorded();
    assert_eq!(calls[0].args, ["-chdir=/work/tf", "output", "-no-color", "-raw", "alb_url"]);
    assert_eq!(calls[0].timeout, Duration::from_secs(30));
}

#[tokio::test]
async fn test_unknown_output_is_output_missing() {
    let runner = RecordingRunner::with_outputs([err_output(
        b"Error: Output \"alb_url\" not found\n\nThe output variable requested could not be found in the state file.",
    )]);
    let opts = ProvisioningOptions::new("/work/tf");

    let err = terraform(&runner)
        .output(&opts, "alb_url")
        .await
        .expect_err("no such output");
    assert!(matches!(
        err.downcast_ref::<ProvisionError>(),
        Some(ProvisionError::OutputMissing { key, .. }) if key == "alb_url"
    ));
}

#[tokio::test]
async fn test_empty_output_is_output_missing() {
    let runner = RecordingRunner::with_outputs([ok_output(b"  \n")]);
    let err = terraform(&runner)
        .output(&ProvisioningOptions::new("/work/tf"), "ssh_ip_address")
        .await
        .expect_err("empty output");
    assert!(matches!(
        err.downcast_ref::<ProvisionError>(),
        Some(ProvisionError::OutputMissing { .. })
    ));
}

// ── AwsKeyPairs ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_delete_key_pair_passes_region_and_name() {
    let runner = RecordingRunner::new();
    let keys = AwsKeyPairs::new(runner.clone(), "aws", "ssh-keygen");

    keys.delete_key_pair(&sample_key_pair("terratest-ssh-key-1", "ap-northeast-1"))
        .await
        .expect("delete");

    let calls = runner.recorded();
    assert_eq!(calls[0].program, "aws");
    assert_eq!(
        calls[0].args,
        [
            "ec2",
            "delete-key-pair",
            "--region",
            "ap-northeast-1",
            "--key-name",
            "terratest-ssh-key-1"
        ]
    );
}

#[tokio::test]
async fn test_deleting_an_absent_key_pair_succeeds() {
    let runner = RecordingRunner::with_outputs([err_output(
        b"An error occurred (InvalidKeyPair.NotFound) when calling the DeleteKeyPair operation",
    )]);
    let keys = AwsKeyPairs::new(runner, "aws", "ssh-keygen");

    keys.delete_key_pair(&sample_key_pair("gone", "ap-northeast-1"))
        .await
        .expect("already deleted counts as deleted");
}

#[tokio::test]
async fn test_other_delete_failures_are_reported() {
    let runner = RecordingRunner::with_outputs([err_output(
        b"An error occurred (UnauthorizedOperation) when calling the DeleteKeyPair operation",
    )]);
    let keys = AwsKeyPairs::new(runner, "aws", "ssh-keygen");

    let err = keys
        .delete_key_pair(&sample_key_pair("k", "ap-northeast-1"))
        .await
        .expect_err("permission denied");
    assert!(format!("{err:#}").contains("UnauthorizedOperation"));
}

#[tokio::test]
async fn test_failed_keygen_aborts_before_import() {
    let runner = RecordingRunner::with_outputs([err_output(b"ssh-keygen: unknown key type")]);
    let keys = AwsKeyPairs::new(runner.clone(), "aws", "ssh-keygen");

    keys.create_and_import_key_pair("ap-northeast-1", "k")
        .await
        .expect_err("keygen failed");

    let calls = runner.recorded();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].program, "ssh-keygen");
}

// ── SshCli ────────────────────────────────────────────────────────────────────

fn host() -> RemoteHost {
    RemoteHost {
        hostname: "203.0.113.7".to_string(),
        user: "ec2-user".to_string(),
        key_pair: sample_key_pair("k", "ap-northeast-1"),
    }
}

#[tokio::test]
async fn test_ssh_returns_stdout() {
    let runner = RecordingRunner::with_outputs([ok_output(b"Hello!!!")]);
    let shell = SshCli::new(runner.clone(), "ssh", Duration::from_secs(10));

    let out = shell
        .execute(&host(), "echo -n 'Hello!!!'")
        .await
        .expect("ssh");

    assert_eq!(out, "Hello!!!");
    let calls = runner.recorded();
    assert_eq!(calls[0].program, "ssh");
    let n = calls[0].args.len();
    assert_eq!(calls[0].args[n - 2..], ["ec2-user@203.0.113.7", "echo -n 'Hello!!!'"]);
    assert!(calls[0].args.contains(&"BatchMode=yes".to_string()));
}

#[tokio::test]
async fn test_ssh_non_zero_exit_is_an_error() {
    let runner = RecordingRunner::with_outputs([err_output(
        b"ssh: connect to host 203.0.113.7 port 22: Connection refused",
    )]);
    let shell = SshCli::new(runner, "ssh", Duration::from_secs(10));

    let err = shell
        .execute(&host(), "echo -n 'Hello!!!'")
        .await
        .expect_err("connection refused");
    let msg = err.to_string();
    assert!(msg.contains("ec2-user@203.0.113.7"), "got: {msg}");
    assert!(msg.contains("Connection refused"), "got: {msg}");
}

// ── YamlConfigStore ───────────────────────────────────────────────────────────

#[test]
fn test_missing_config_file_yields_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = YamlConfigStore::with_path(dir.path().join("config.yaml"));
    let config = store.load().expect("defaults");
    assert_eq!(config.retry.attempts, 30);
    assert_eq!(config.ssh.user, "ec2-user");
}

#[test]
fn test_partial_config_overrides_only_given_keys() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "retry:\n  attempts: 5\nssh:\n  region: us-east-1\n").expect("write");

    let config = YamlConfigStore::with_path(path).load().expect("load");
    assert_eq!(config.retry.attempts, 5);
    assert_eq!(config.retry.delay_secs, 5);
    assert_eq!(config.ssh.region, "us-east-1");
    assert_eq!(config.http.output, "alb_url");
}

#[test]
fn test_invalid_config_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "retry:\n  attempts: 0\n").expect("write");

    let err = YamlConfigStore::with_path(path).load().expect_err("zero attempts");
    assert!(format!("{err:#}").contains("retry.attempts"));
}

#[test]
fn test_unparseable_config_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "retry: [not, a, map").expect("write");

    assert!(YamlConfigStore::with_path(path).load().is_err());
}
