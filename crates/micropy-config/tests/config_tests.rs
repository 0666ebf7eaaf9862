use micropy_config::{Config, DictSource, Error, JsonSource};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde::Deserialize;
use serde_json::{Value, json};
use std::fs;
use tempfile::TempDir;

#[derive(Debug, Deserialize, PartialEq)]
struct Toggles {
    vscode: bool,
    pylint: bool,
}

#[test]
fn test_mutation_is_written_before_return() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("micropy.json");
    let mut config = Config::json(&path, json!({"name": "demo", "stubs": {}})).unwrap();

    config.add("stubs/esp32-micropython-1.11.0", json!("1.2.0")).unwrap();

    let on_disk: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(
        on_disk,
        json!({"name": "demo", "stubs": {"esp32-micropython-1.11.0": "1.2.0"}})
    );
}

#[test]
fn test_reload_sees_previous_writes() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("micropy.json");
    {
        let mut config = Config::json(&path, json!({})).unwrap();
        config.add("config/vscode", json!(true)).unwrap();
        config.add("config/pylint", json!(false)).unwrap();
    }

    let config = Config::json(&path, json!({"config": {"vscode": false, "pylint": true}})).unwrap();
    let toggles: Toggles = config.get_as("config").unwrap();
    assert_eq!(
        toggles,
        Toggles {
            vscode: true,
            pylint: false
        }
    );
}

#[test]
fn test_key_order_preserved_on_disk() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("micropy.json");
    let mut config = Config::json(&path, json!({"name": "demo"})).unwrap();
    config.add("stubs", json!({})).unwrap();
    config.add("config", json!({})).unwrap();
    config.add("packages", json!({})).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    let name = text.find("\"name\"").unwrap();
    let stubs = text.find("\"stubs\"").unwrap();
    let packages = text.find("\"packages\"").unwrap();
    assert!(name < stubs && stubs < packages);
}

#[test]
fn test_invalid_file_reports_invalid() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("micropy.json");
    fs::write(&path, "\"just a string\"").unwrap();

    let err = Config::json(&path, json!({})).unwrap_err();
    assert!(matches!(err, Error::Invalid { .. }));
}

#[test]
fn test_dict_source_with_existing_content() {
    let config = Config::new(
        DictSource::with_content(json!({"paths": ["a"]})),
        json!({"paths": [], "datadir": null}),
    )
    .unwrap();
    assert_eq!(config.get("paths", Value::Null), json!(["a"]));
    assert!(config.exists());
}

#[test]
fn test_rooted_view_shares_semantics() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("micropy.json");
    let mut config = Config::json(&path, json!({"packages": {"picoweb": "*"}}))
        .unwrap()
        .with_root("packages");

    config.add("blynklib", json!("^0.2")).unwrap();
    assert_eq!(config.raw(), json!({"picoweb": "*", "blynklib": "^0.2"}));

    let reopened = Config::new(JsonSource::new(&path), json!({})).unwrap();
    assert_eq!(
        reopened.get("packages/blynklib", Value::Null),
        json!("^0.2")
    );
}

#[test]
fn test_pop_missing_key_is_noop() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("micropy.json");
    let mut config = Config::json(&path, json!({"a": 1})).unwrap();
    let prior = config.pop("missing").unwrap();
    assert_eq!(prior, json!({"a": 1}));
    assert!(!path.exists());
}

proptest! {
    #[test]
    fn test_set_then_reload_roundtrips(
        key in "[a-z]{1,8}",
        value in prop_oneof![
            any::<i64>().prop_map(Value::from),
            any::<bool>().prop_map(Value::from),
            "[ -~]{0,16}".prop_map(Value::from),
        ],
    ) {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("micropy.json");

        let mut config = Config::json(&path, json!({})).unwrap();
        config.set(&key, value.clone()).unwrap();

        let reloaded = Config::json(&path, json!({})).unwrap();
        prop_assert_eq!(reloaded.get(&key, Value::Null), value);
    }
}
