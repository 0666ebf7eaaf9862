//! On-disk stub package fixtures.

use serde_json::{Value, json};
use std::fs;
use std::path::Path;

fn write_json(path: &Path, value: &Value) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
}

/// Descriptor of a device stub named `<sysname>-<firmware>-<version>`.
pub fn device_info(sysname: &str, version: &str, firmware: &str) -> Value {
    json!({
        "firmware": {
            "sysname": sysname,
            "version": version,
            "name": firmware,
            "machine": format!("{sysname} module"),
        },
        "stubber": {"version": "1.3.0"},
        "modules": [{"file": "machine.py", "module": "machine"}]
    })
}

/// Device stub with its files at the package root (no `stubs/` or
/// `frozen/` subtree).
pub fn device_stub(path: &Path, sysname: &str, version: &str, firmware: &str) {
    write_json(&path.join("info.json"), &device_info(sysname, version, firmware));
    fs::write(path.join("machine.py"), "def freq(): ...\n").unwrap();
}

/// Device stub with separate `stubs/` and `frozen/` subtrees.
pub fn device_stub_with_trees(path: &Path, sysname: &str, version: &str, firmware: &str) {
    write_json(&path.join("info.json"), &device_info(sysname, version, firmware));
    fs::create_dir_all(path.join("stubs")).unwrap();
    fs::create_dir_all(path.join("frozen")).unwrap();
    fs::write(path.join("stubs/machine.py"), "def freq(): ...\n").unwrap();
    fs::write(path.join("frozen/upip.py"), "def install(): ...\n").unwrap();
}

/// Firmware stub with a `frozen/` subtree.
pub fn firmware_stub(path: &Path, firmware: &str) {
    write_json(
        &path.join("info.json"),
        &json!({"firmware": firmware, "repo": format!("{firmware}/{firmware}")}),
    );
    fs::create_dir_all(path.join("frozen")).unwrap();
    fs::write(path.join("frozen/ntptime.py"), "def settime(): ...\n").unwrap();
}

/// Unpacked PyPI stub distribution (a `PKG-INFO` file, no `info.json`).
pub fn dist_stub(path: &Path, name: &str, version: &str, requires: &[&str]) {
    fs::create_dir_all(path).unwrap();
    let mut pkg_info = format!("Metadata-Version: 2.1\nName: {name}\nVersion: {version}\n");
    for req in requires {
        pkg_info.push_str(&format!("Requires-Dist: {req}\n"));
    }
    fs::write(path.join("PKG-INFO"), pkg_info).unwrap();
    fs::write(path.join("machine.pyi"), "def freq() -> int: ...\n").unwrap();
}
