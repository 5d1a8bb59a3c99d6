use super::*;
use std::fs;
use tempfile::tempdir;

#[tokio::test]
async fn test_init_then_validate() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bounty-warden.toml");
    let path_str = path.to_str().unwrap().to_string();

    execute(ConfigCommands::Init {
        path: Some(path_str.clone()),
    })
    .await
    .unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("schemaVersion = 1"));
    assert!(content.contains("Issue Issuer Specification"));

    execute(ConfigCommands::Validate {
        path: Some(path_str),
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_init_refuses_to_overwrite() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bounty-warden.toml");
    fs::write(&path, "schemaVersion = 1\n").unwrap();

    let result = execute(ConfigCommands::Init {
        path: Some(path.to_str().unwrap().to_string()),
    })
    .await;

    assert!(matches!(result, Err(CliError::ConfigError(_))));
    assert_eq!(fs::read_to_string(&path).unwrap(), "schemaVersion = 1\n");
}

#[tokio::test]
async fn test_validate_rejects_unsupported_schema() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bounty-warden.toml");
    fs::write(&path, "schemaVersion = 2\n").unwrap();

    let result = execute(ConfigCommands::Validate {
        path: Some(path.to_str().unwrap().to_string()),
    })
    .await;

    assert!(matches!(result, Err(CliError::ConfigError(ref m)) if m.contains("schema")));
}

#[tokio::test]
async fn test_validate_missing_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("missing.toml");

    let result = execute(ConfigCommands::Validate {
        path: Some(path.to_str().unwrap().to_string()),
    })
    .await;

    assert!(matches!(result, Err(CliError::ConfigError(_))));
}
