//! `FileStateStore` behaviour against a real temp directory.

#![allow(clippy::expect_used)]

use tfcheck_cli::application::ports::StateStore;
use tfcheck_cli::domain::error::PersistenceError;
use tfcheck_cli::infra::state::FileStateStore;
use tfcheck_common::{EC2_KEY_PAIR, KeyPair, ProvisioningOptions, TERRAFORM_OPTIONS};

use crate::mocks::sample_key_pair;

#[tokio::test]
async fn test_value_survives_a_new_store_instance() {
    let dir = tempfile::tempdir().expect("tempdir");
    let saved = sample_key_pair("terratest-ssh-key-1", "ap-northeast-1");
    FileStateStore::new(dir.path())
        .save(EC2_KEY_PAIR, &saved)
        .await
        .expect("save");

    let loaded: KeyPair = FileStateStore::new(dir.path())
        .load(EC2_KEY_PAIR)
        .await
        .expect("load");
    assert_eq!(loaded, saved);
    assert!(dir.path().join(".test-data/Ec2KeyPair.json").exists());
}

#[tokio::test]
async fn test_save_replaces_previous_value() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FileStateStore::new(dir.path());
    store
        .save(TERRAFORM_OPTIONS, &ProvisioningOptions::new("/a"))
        .await
        .expect("first save");
    store
        .save(
            TERRAFORM_OPTIONS,
            &ProvisioningOptions::new("/b").with_var("key_pair_name", "k"),
        )
        .await
        .expect("second save");

    let loaded: ProvisioningOptions = store.load(TERRAFORM_OPTIONS).await.expect("load");
    assert_eq!(loaded.terraform_dir, std::path::PathBuf::from("/b"));
    assert_eq!(loaded.vars.len(), 1);
}

#[tokio::test]
async fn test_missing_key_is_a_persistence_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FileStateStore::new(dir.path());
    let err = store
        .load::<KeyPair>(EC2_KEY_PAIR)
        .await
        .expect_err("nothing saved");
    assert!(matches!(
        err.downcast_ref::<PersistenceError>(),
        Some(PersistenceError::Missing { .. })
    ));
    assert!(!store.exists(EC2_KEY_PAIR).await.expect("exists"));
}

#[tokio::test]
async fn test_path_like_keys_are_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FileStateStore::new(dir.path());
    assert!(store.save("../escape", &1u32).await.is_err());
    assert!(store.save("", &1u32).await.is_err());
    assert!(!dir.path().join("escape.json").exists());
}

#[tokio::test]
async fn test_corrupt_file_fails_to_parse() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FileStateStore::new(dir.path());
    std::fs::create_dir_all(store.dir()).expect("mkdir");
    std::fs::write(store.dir().join("Ec2KeyPair.json"), "{ not json").expect("write");

    let err = store
        .load::<KeyPair>(EC2_KEY_PAIR)
        .await
        .expect_err("corrupt file");
    assert!(err.downcast_ref::<PersistenceError>().is_none());
    assert!(format!("{err:#}").contains("parsing state file"));
}

#[tokio::test]
async fn test_clear_removes_one_key() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FileStateStore::new(dir.path());
    store.save(EC2_KEY_PAIR, &sample_key_pair("k", "r")).await.expect("save");
    store
        .save(TERRAFORM_OPTIONS, &ProvisioningOptions::new(dir.path()))
        .await
        .expect("save");

    store.clear(EC2_KEY_PAIR).await.expect("clear");
    store.clear(EC2_KEY_PAIR).await.expect("clearing twice is fine");

    assert!(!store.exists(EC2_KEY_PAIR).await.expect("exists"));
    assert!(store.exists(TERRAFORM_OPTIONS).await.expect("exists"));
}

#[tokio::test]
async fn test_clean_removes_the_directory() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FileStateStore::new(dir.path());
    store.save(EC2_KEY_PAIR, &sample_key_pair("k", "r")).await.expect("save");
    assert!(store.dir().is_dir());

    store.clean().await.expect("clean");
    assert!(!store.dir().exists());
    store.clean().await.expect("cleaning twice is fine");
}

#[cfg(unix)]
#[tokio::test]
async fn test_state_files_are_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().expect("tempdir");
    let store = FileStateStore::new(dir.path());
    store.save(EC2_KEY_PAIR, &sample_key_pair("k", "r")).await.expect("save");

    let path = store.path_for(EC2_KEY_PAIR).expect("valid key");
    let mode = std::fs::metadata(&path).expect("metadata").permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}
