//! JSON-schema validation of stub descriptors
//!
//! Both schemas ship inside the binary. A descriptor is checked against
//! the device schema first and the firmware schema second.

use jsonschema::Validator;
use micropy_fs::NormalizedPath;
use serde_json::Value;

use crate::stub::{StubKind, read_info};
use crate::{Error, Result};

const DEVICE_SCHEMA: &str = include_str!("../schemas/device.json");
const FIRMWARE_SCHEMA: &str = include_str!("../schemas/firmware.json");

/// Classifies `info.json` descriptors as device or firmware stubs.
pub struct StubValidator {
    device: Validator,
    firmware: Validator,
}

impl std::fmt::Debug for StubValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StubValidator").finish_non_exhaustive()
    }
}

fn compile(source: &str) -> Result<Validator> {
    let schema: Value = serde_json::from_str(source)?;
    jsonschema::validator_for(&schema).map_err(|e| Error::Schema(e.to_string()))
}

impl StubValidator {
    pub fn new() -> Result<Self> {
        Ok(Self {
            device: compile(DEVICE_SCHEMA)?,
            firmware: compile(FIRMWARE_SCHEMA)?,
        })
    }

    /// Validate the `info.json` inside the package directory at `path`.
    pub fn validate(&self, path: &NormalizedPath) -> Result<StubKind> {
        let info = read_info(path)?;
        self.validate_info(path, &info)
    }

    /// Validate an already loaded descriptor belonging to `path`.
    pub fn validate_info(&self, path: &NormalizedPath, info: &Value) -> Result<StubKind> {
        if self.device.is_valid(info) {
            return Ok(StubKind::Device);
        }
        if self.firmware.is_valid(info) {
            return Ok(StubKind::Firmware);
        }
        let errors = self
            .device
            .iter_errors(info)
            .map(|e| format!("device: {e}"))
            .chain(
                self.firmware
                    .iter_errors(info)
                    .map(|e| format!("firmware: {e}")),
            )
            .collect();
        Err(Error::StubValidation {
            path: path.to_native(),
            errors,
        })
    }

    /// Whether `path` holds a valid stub package.
    pub fn is_valid(&self, path: &NormalizedPath) -> bool {
        self.validate(path).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn validator() -> StubValidator {
        StubValidator::new().unwrap()
    }

    #[test]
    fn test_device_descriptor() {
        let info = json!({
            "firmware": {"sysname": "esp32", "version": "1.11.0", "name": "micropython"},
            "stubber": {"version": "1.2.0"},
            "modules": [{"file": "machine.py", "module": "machine"}]
        });
        let kind = validator().validate_info(&"/x".into(), &info).unwrap();
        assert_eq!(kind, StubKind::Device);
    }

    #[test]
    fn test_firmware_descriptor() {
        let info = json!({"firmware": "micropython", "repo": "micropython/micropython"});
        let kind = validator().validate_info(&"/x".into(), &info).unwrap();
        assert_eq!(kind, StubKind::Firmware);
    }

    #[test]
    fn test_invalid_descriptor_reports_both_schemas() {
        let info = json!({"firmware": {"sysname": "esp32"}});
        let err = validator().validate_info(&"/x".into(), &info).unwrap_err();
        match err {
            Error::StubValidation { errors, .. } => {
                assert!(errors.iter().any(|e| e.starts_with("device:")));
                assert!(errors.iter().any(|e| e.starts_with("firmware:")));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
