use chrono::NaiveDate;
use sqs_datasource::{ColumnFormat, DatasourceError, SourceConfig};

const QUEUE_URL: &str = "https://sqs.eu-west-1.amazonaws.com/123456789012/orders";

#[test]
fn test_config_from_json() {
    let raw = format!(
        r#"{{"key":"AKIDEXAMPLE","secret":"s3cr3t","region":"eu-west-1","sqs":{{"url":"{QUEUE_URL}"}}}}"#
    );
    let config = SourceConfig::from_json(&raw).unwrap();

    assert_eq!(config.region, "eu-west-1");
    assert_eq!(config.queue_url(), QUEUE_URL);
    assert_eq!(config.access_key(), Some("AKIDEXAMPLE"));
    assert_eq!(config.secret_key(), Some("s3cr3t"));
}

#[test]
fn test_config_without_credentials_is_valid() {
    let config = SourceConfig::new("eu-west-1", QUEUE_URL);

    assert!(config.validate().is_ok());
    assert_eq!(config.access_key(), None);
}

#[test]
fn test_config_rejects_empty_region() {
    let err = SourceConfig::new("  ", QUEUE_URL).validate().unwrap_err();
    assert!(matches!(err, DatasourceError::ConfigError(_)));
}

#[test]
fn test_config_rejects_bad_queue_url() {
    assert!(SourceConfig::new("eu-west-1", "orders").validate().is_err());
    assert!(
        SourceConfig::new("eu-west-1", "ftp://example.com/orders")
            .validate()
            .is_err()
    );
}

#[test]
fn test_config_rejects_half_credentials() {
    let mut config = SourceConfig::new("eu-west-1", QUEUE_URL);
    config.key = Some("AKIDEXAMPLE".to_string());

    assert!(config.validate().is_err());
}

#[test]
fn test_config_missing_sqs_block_fails() {
    let err = SourceConfig::from_json(r#"{"region":"eu-west-1"}"#).unwrap_err();
    assert!(err.to_string().contains("config parse"));
}

#[test]
fn test_default_columns_and_overrides() {
    let raw = format!(
        r#"{{"region":"eu-west-1","sqs":{{"url":"{QUEUE_URL}"}},"columns":{{"date":{{"name":"date","format":"%d.%m.%Y"}}}}}}"#
    );
    let config = SourceConfig::from_json(&raw).unwrap();
    let columns = config.columns();

    assert_eq!(columns["datetime"].format, "%Y-%m-%d %H:%M:%S");
    assert_eq!(columns["timestamp"].format, "%Y-%m-%d %H:%M:%S");
    assert_eq!(columns["time"].format, "%H:%M:%S");
    assert_eq!(columns["date"].format, "%d.%m.%Y");
}

#[test]
fn test_config_rejects_invalid_column_format() {
    let mut config = SourceConfig::new("eu-west-1", QUEUE_URL);
    config
        .columns
        .insert("date".to_string(), ColumnFormat::new("date", "%Q"));

    assert!(config.validate().is_err());
}

#[test]
fn test_column_format_renders_timestamp() {
    let ts = NaiveDate::from_ymd_opt(2024, 3, 9)
        .unwrap()
        .and_hms_opt(7, 5, 1)
        .unwrap();

    assert_eq!(
        ColumnFormat::new("datetime", "%Y-%m-%d %H:%M:%S").format(&ts).unwrap(),
        "2024-03-09 07:05:01"
    );
    assert_eq!(ColumnFormat::new("date", "%Y-%m-%d").format(&ts).unwrap(), "2024-03-09");
    assert_eq!(ColumnFormat::new("time", "%H:%M:%S").format(&ts).unwrap(), "07:05:01");
}
