//! End-to-end scenarios across the stub, config, template and project crates
//!
//! Each scenario builds real stub packages and repository documents on disk
//! and drives the public APIs the `micropy` binary uses.

use std::fs;
use std::thread;
use std::time::Duration;

use micropy_config::Config;
use micropy_fs::ServiceLog;
use micropy_project::{
    Error, PackageFetcher, PackagesModule, Project, Requirement, Result, StubsModule,
    TemplatesModule,
};
use micropy_stubs::{DeviceStub, StubManager, StubRepository};
use micropy_templates::{BUILTIN_KEYS, CheckMode};
use micropy_test_utils::project::TestProject;
use micropy_test_utils::repo::{micropy_document, micropython_document};
use micropy_test_utils::stubs::{device_stub, firmware_stub};
use pretty_assertions::assert_eq;
use serde_json::json;

/// Package index that has nothing to offer.
#[derive(Debug)]
struct Offline;

impl PackageFetcher for Offline {
    fn fetch(&self, requirement: &Requirement) -> Result<Vec<u8>> {
        Err(Error::PackageNotFound {
            name: requirement.name.clone(),
        })
    }
}

fn repository_from_disk(tp: &TestProject) -> StubRepository {
    let first = tp.root().join("micropy-source.json");
    let second = tp.root().join("micropython-source.json");
    fs::write(&first, micropy_document().to_string()).unwrap();
    fs::write(&second, micropython_document().to_string()).unwrap();
    StubRepository::from_sources(
        &[
            first.to_string_lossy().into_owned(),
            second.to_string_lossy().into_owned(),
        ],
        ServiceLog::new("repository"),
    )
    .unwrap()
}

fn open_manager(tp: &TestProject) -> StubManager {
    StubManager::new(tp.stubs_root(), StubRepository::default(), ServiceLog::new("stubs")).unwrap()
}

fn new_project(tp: &TestProject, name: &str, manager: StubManager, stubs: Vec<DeviceStub>) -> Project {
    Project::new(tp.project(), Some(name), ServiceLog::new("project"))
        .unwrap()
        .with_module(StubsModule::new(manager, stubs, ServiceLog::new("stubs-module")))
        .with_module(PackagesModule::new(Offline, ServiceLog::new("packages")))
        .with_module(PackagesModule::dev(ServiceLog::new("dev-packages")))
        .with_module(
            TemplatesModule::new(BUILTIN_KEYS, ServiceLog::new("templates"))
                .unwrap()
                .with_check_mode(CheckMode::Off),
        )
}

fn extra_paths(tp: &TestProject) -> Vec<String> {
    serde_json::from_value(tp.read_json(".vscode/settings.json")["python.analysis.extraPaths"].clone())
        .unwrap()
}

#[test]
fn scenario_empty_project() {
    let tp = TestProject::new();
    let mut project = new_project(&tp, "NewProject", open_manager(&tp), vec![]);
    assert!(!project.exists());

    project.create().unwrap();

    assert!(project.exists());
    assert_eq!(
        tp.read_json("micropy.json"),
        json!({
            "name": "NewProject",
            "stubs": {},
            "packages": {},
            "dev-packages": {"micropy-cli": "*"},
            "config": {"vscode": true, "pylint": true}
        })
    );
}

#[test]
fn scenario_two_devices_one_firmware() {
    let tp = TestProject::new();
    let sources = tp.sources();
    firmware_stub(&sources.join("micropython"), "micropython");
    device_stub(&sources.join("esp32"), "esp32", "1.11.0", "micropython");
    device_stub(&sources.join("esp8266"), "esp8266", "1.11.0", "micropython");

    let mut manager = open_manager(&tp);
    manager.add(sources.to_str().unwrap(), false).unwrap();
    assert_eq!(manager.firmware().count(), 1);
    assert_eq!(manager.devices().count(), 2);
    assert!(manager.devices().all(|d| d.firmware().is_some()));

    let stubs = manager.devices().cloned().collect();
    let mut project = new_project(&tp, "Blinky", manager, stubs);
    project.create().unwrap();

    let paths = extra_paths(&tp);
    assert_eq!(paths.len(), 3);
    assert_eq!(
        paths,
        vec![
            ".micropy/esp32-micropython-1.11.0",
            ".micropy/esp8266-micropython-1.11.0",
            ".micropy/micropython/frozen",
        ]
    );
}

#[test]
fn scenario_repository_search() {
    let tp = TestProject::new();
    let repository = repository_from_disk(&tp);
    assert_eq!(repository.len(), 7);

    assert_eq!(repository.search("stub", false).len(), 4);
    assert_eq!(repository.search("stub", true).len(), 7);
    assert_eq!(repository.search("STUB", false).len(), 4);

    let entry = repository.resolve_package("micropython-esp32-stubs").unwrap();
    assert_eq!(entry.version(), "1.19.1");
}

#[test]
fn scenario_local_editable_package() {
    let tp = TestProject::new();
    let mut project = new_project(&tp, "Blinky", open_manager(&tp), vec![]);
    project.create().unwrap();

    project.add_package("-e ./src/lib/mycustom", false).unwrap();

    assert_eq!(
        tp.read_json("micropy.json")["packages"]["mycustom"],
        json!("-e ./src/lib/mycustom")
    );
    assert!(extra_paths(&tp).contains(&"src/lib/mycustom".to_string()));
}

#[test]
fn scenario_reinstall_and_force() {
    let tp = TestProject::new();
    let src = tp.sources().join("esp32");
    device_stub(&src, "esp32", "1.11.0", "micropython");
    let mut manager = open_manager(&tp);
    let first = manager.add(src.to_str().unwrap(), false).unwrap();

    let again = manager.add(src.to_str().unwrap(), false).unwrap();
    assert_eq!(first, again);
    assert_eq!(manager.len(), 1);

    let installed = tp.stubs_root().join("esp32-micropython-1.11.0/machine.py");
    let before = fs::metadata(&installed).unwrap().modified().unwrap();
    thread::sleep(Duration::from_millis(20));
    fs::write(src.join("machine.py"), "def freq(hz=None): ...\n").unwrap();

    manager.add(src.to_str().unwrap(), true).unwrap();

    assert_eq!(manager.len(), 1);
    assert!(fs::metadata(&installed).unwrap().modified().unwrap() > before);
}

#[test]
fn scenario_dev_package_dispatch() {
    let tp = TestProject::new();
    let mut project = new_project(&tp, "Blinky", open_manager(&tp), vec![]);
    project.create().unwrap();

    assert!(project.add_package("foo", true).unwrap());

    let manifest = tp.read_json("micropy.json");
    assert_eq!(manifest["dev-packages"], json!({"micropy-cli": "*", "foo": "*"}));
    assert_eq!(manifest["packages"], json!({}));
    tp.assert_file_contains("dev-requirements.txt", "foo");
}

#[test]
fn manifest_survives_reload() {
    let tp = TestProject::new();
    let mut project = new_project(&tp, "Blinky", open_manager(&tp), vec![]);
    project.create().unwrap();
    project.add_package("bar", true).unwrap();
    drop(project);

    let config = Config::json(tp.project().join("micropy.json"), json!({})).unwrap();
    assert_eq!(config.get("dev-packages/bar", json!(null)), json!("*"));
    assert_eq!(config.get("name", json!(null)), json!("Blinky"));
}

#[test]
fn template_update_preserves_user_settings() {
    let tp = TestProject::new();
    let sources = tp.sources();
    firmware_stub(&sources.join("micropython"), "micropython");
    device_stub(&sources.join("esp32"), "esp32", "1.11.0", "micropython");
    let mut manager = open_manager(&tp);
    manager.add(sources.to_str().unwrap(), false).unwrap();

    let mut project = new_project(&tp, "Blinky", manager, vec![]);
    project.create().unwrap();

    let settings_path = tp.project().join(".vscode/settings.json");
    let mut settings = tp.read_json(".vscode/settings.json");
    settings["editor.tabSize"] = json!(2);
    fs::write(&settings_path, serde_json::to_string_pretty(&settings).unwrap()).unwrap();

    project.add_stub("esp32-micropython-1.11.0", false).unwrap();

    let updated = tp.read_json(".vscode/settings.json");
    assert_eq!(updated["editor.tabSize"], json!(2));
    assert!(
        extra_paths(&tp).contains(&".micropy/esp32-micropython-1.11.0".to_string()),
        "{updated}"
    );
}
