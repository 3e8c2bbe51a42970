use poeflip::AppCommand;
use poeflip::core::Unit;
use serde_json::Value;

mod test_utils {
    use std::path::{Path, PathBuf};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub async fn create_ninja_mock_server(league: &str, mock_response: &str) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/data/currencyoverview"))
            .and(query_param("league", league))
            .and(query_param("type", "Currency"))
            .respond_with(ResponseTemplate::new(200).set_body_string(mock_response))
            .mount(&mock_server)
            .await;

        mock_server
    }

    /// Writes a config file under `dir` pointing the app at `base_url` and
    /// at a data directory shared by every config in the same `dir`.
    pub fn write_config(dir: &Path, base_url: &str, league: &str, file_name: &str) -> PathBuf {
        let data_path = dir.join("data");
        let config_path = dir.join(file_name);
        let config_content = format!(
            r#"
league: "{league}"
providers:
  ninja:
    base_url: "{base_url}"
data_path: "{}"
"#,
            data_path.display()
        );
        std::fs::write(&config_path, config_content).expect("Failed to write config file");
        config_path
    }
}

const NINJA_RESPONSE: &str = r#"{
    "lines": [
        {"currencyTypeName": "Divine Orb", "chaosEquivalent": 180.5},
        {"currencyTypeName": "Orb of Fusing", "chaosEquivalent": 0.5}
    ]
}"#;

fn add_args(item: &str, buy: &str) -> poeflip::AddArgs {
    poeflip::AddArgs {
        item: item.to_string(),
        buy: buy.to_string(),
        unit: Unit::Chaos,
        quantity: "1".to_string(),
        sell: None,
        sell_unit: None,
        group: None,
    }
}

fn read_export(path: &std::path::Path) -> Value {
    let text = std::fs::read_to_string(path).expect("Failed to read export file");
    serde_json::from_str(&text).expect("Export file is not valid JSON")
}

#[test_log::test(tokio::test)]
async fn test_full_flow_add_rate_and_summary() {
    let dir = tempfile::tempdir().unwrap();
    let mock_server = test_utils::create_ninja_mock_server("Standard", NINJA_RESPONSE).await;
    let config_path =
        test_utils::write_config(dir.path(), &mock_server.uri(), "Standard", "config.yaml");
    let config_path = config_path.to_str().unwrap();

    poeflip::run_command(
        AppCommand::Add(add_args("Mageblood", "2 * 180")),
        Some(config_path),
    )
    .await
    .expect("add failed");

    poeflip::run_command(AppCommand::Rate { refresh: true }, Some(config_path))
        .await
        .expect("rate failed");

    poeflip::run_command(AppCommand::Summary, Some(config_path))
        .await
        .expect("summary failed");
}

#[test_log::test(tokio::test)]
async fn test_stored_rate_survives_feed_outage() {
    let dir = tempfile::tempdir().unwrap();
    let mock_server = test_utils::create_ninja_mock_server("Standard", NINJA_RESPONSE).await;
    let online_config =
        test_utils::write_config(dir.path(), &mock_server.uri(), "Standard", "online.yaml");

    poeflip::run_command(
        AppCommand::Rate { refresh: true },
        Some(online_config.to_str().unwrap()),
    )
    .await
    .expect("rate fetch failed");

    // Same data directory, unreachable feed: the stored rate carries over
    let offline_config =
        test_utils::write_config(dir.path(), "http://127.0.0.1:9", "Standard", "offline.yaml");

    poeflip::run_command(
        AppCommand::Rate { refresh: true },
        Some(offline_config.to_str().unwrap()),
    )
    .await
    .expect("stored rate should back the refresh during an outage");
}

#[test_log::test(tokio::test)]
async fn test_export_and_import_round_trip() {
    let source_dir = tempfile::tempdir().unwrap();
    let mock_server = test_utils::create_ninja_mock_server("Standard", NINJA_RESPONSE).await;
    let source_config = test_utils::write_config(
        source_dir.path(),
        &mock_server.uri(),
        "Standard",
        "config.yaml",
    );
    let source_config = source_config.to_str().unwrap();

    let mut grouped = add_args("Fusing bulk", "0.1 + 0.2");
    grouped.group = Some("bulk".to_string());
    poeflip::run_command(AppCommand::Add(grouped), Some(source_config))
        .await
        .unwrap();
    poeflip::run_command(
        AppCommand::Add(add_args("Mageblood", "450")),
        Some(source_config),
    )
    .await
    .unwrap();

    let dump = source_dir.path().join("dump.json");
    poeflip::run_command(
        AppCommand::Export {
            path: dump.to_str().unwrap().to_string(),
        },
        Some(source_config),
    )
    .await
    .expect("export failed");

    let doc = read_export(&dump);
    let transactions = doc["data"]["transactions"].as_array().unwrap();
    assert_eq!(transactions.len(), 2);
    // Expression input was evaluated and stored rounded
    assert_eq!(transactions[0]["buyPrice"], Value::from(0.3));
    assert_eq!(transactions[0]["group"], Value::from("bulk"));

    // Import into a fresh data directory and export again
    let target_dir = tempfile::tempdir().unwrap();
    let target_config = test_utils::write_config(
        target_dir.path(),
        &mock_server.uri(),
        "Standard",
        "config.yaml",
    );
    let target_config = target_config.to_str().unwrap();

    poeflip::run_command(
        AppCommand::Import {
            path: dump.to_str().unwrap().to_string(),
        },
        Some(target_config),
    )
    .await
    .expect("import failed");

    let second_dump = target_dir.path().join("dump2.json");
    poeflip::run_command(
        AppCommand::Export {
            path: second_dump.to_str().unwrap().to_string(),
        },
        Some(target_config),
    )
    .await
    .expect("second export failed");

    let second_doc = read_export(&second_dump);
    assert_eq!(second_doc["data"]["transactions"], doc["data"]["transactions"]);
    assert_eq!(
        second_doc["data"]["transactionGroups"],
        doc["data"]["transactionGroups"]
    );
}

#[test_log::test(tokio::test)]
async fn test_complete_moves_transaction_to_completed_ledger() {
    let dir = tempfile::tempdir().unwrap();
    let mock_server = test_utils::create_ninja_mock_server("Standard", NINJA_RESPONSE).await;
    let config_path =
        test_utils::write_config(dir.path(), &mock_server.uri(), "Standard", "config.yaml");
    let config_path = config_path.to_str().unwrap();

    poeflip::run_command(
        AppCommand::Add(add_args("Mageblood", "360")),
        Some(config_path),
    )
    .await
    .unwrap();

    poeflip::run_command(
        AppCommand::Complete(poeflip::CompleteArgs {
            id: 1,
            sell: "450".to_string(),
            unit: None,
            quantity: None,
        }),
        Some(config_path),
    )
    .await
    .expect("complete failed");

    let dump = dir.path().join("dump.json");
    poeflip::run_command(
        AppCommand::Export {
            path: dump.to_str().unwrap().to_string(),
        },
        Some(config_path),
    )
    .await
    .unwrap();

    let doc = read_export(&dump);
    assert_eq!(doc["data"]["transactions"].as_array().unwrap().len(), 0);
    let completed = doc["data"]["completedTransactions"].as_array().unwrap();
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0]["sellPrice"], Value::from(450.0));
    assert!(completed[0]["completedAt"].is_string());
}
