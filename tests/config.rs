use assay_enrich::config::{ConfigLoader, ConfigOverrides};
use assay_enrich::error::EnrichError;
use assert_matches::assert_matches;

#[test]
fn resolve_from_json_file() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("enrich.json");
    std::fs::write(
        &path,
        r#"{
            "input": "clusters.csv",
            "label_column": "target_seq_label_2",
            "flush_every": 25
        }"#,
    )
    .unwrap();

    let resolved = ConfigLoader::resolve(
        Some(path.to_str().unwrap()),
        ConfigOverrides::default(),
    )
    .unwrap();
    assert_eq!(resolved.input, "clusters.csv");
    assert_eq!(resolved.label_column, "target_seq_label_2");
    assert_eq!(resolved.flush_every, 25);
    assert_eq!(resolved.smiles_column, "SMILES");
}

#[test]
fn missing_config_file_is_fatal() {
    let err = ConfigLoader::resolve(Some("does-not-exist.json"), ConfigOverrides::default())
        .unwrap_err();
    assert_matches!(err, EnrichError::ConfigRead(_));
}

#[test]
fn malformed_config_is_fatal() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("enrich.json");
    std::fs::write(&path, "{not json").unwrap();
    let err = ConfigLoader::resolve(
        Some(path.to_str().unwrap()),
        ConfigOverrides::default(),
    )
    .unwrap_err();
    assert_matches!(err, EnrichError::ConfigParse(_));
}
