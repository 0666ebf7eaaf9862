//! Repository source documents.

use serde_json::{Value, json};

/// A micropy-schema document: 3 packages across 2 names.
pub fn micropy_document() -> Value {
    json!({
        "repository": {
            "name": "micropy-stubs",
            "source": "https://example.com/micropy-stubs/packages"
        },
        "packages": [
            {"name": "esp32-Stubs", "type": "device", "sha256sum": "aa11", "version": "1.0.0"},
            {"name": "esp32-Stubs", "type": "device", "sha256sum": "bb22", "version": "1.1.0"},
            {"name": "micropython-firmware-stubs", "type": "firmware", "sha256sum": "cc33", "version": "1.0.0"}
        ]
    })
}

/// A micropython-schema document: 4 packages across 2 names.
pub fn micropython_document() -> Value {
    json!({
        "repository": {
            "name": "micropython-stubs",
            "source": "https://example.com/micropython-stubs/index.json"
        },
        "packages": {
            "micropython-esp32-stubs": ["1.17.0", "1.18.0", "1.19.1"],
            "micropython-RP2-stubs": ["1.19.1"]
        }
    })
}
