//! Stub package model
//!
//! A stub package is a directory holding an `info.json` descriptor and two
//! optional subtrees, `stubs/` and `frozen/`. Either subtree falls back to
//! the package root when absent.
//!
//! Two shapes exist:
//!
//! - [`DeviceStub`]: the API surface of one device, firmware and version
//! - [`FirmwareStub`]: the frozen modules of a firmware image, shared by
//!   many device stubs
//!
//! Equality and hashing are by derived name.

use std::hash::{Hash, Hasher};

use micropy_fs::{MicropyPath, NormalizedPath, io};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Error, Result};

/// Which `info.json` shape a package carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StubKind {
    Device,
    Firmware,
}

/// `firmware` object of a device stub descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceFirmware {
    pub sysname: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firmware: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StubberInfo {
    pub version: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Descriptor of a device stub.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub firmware: DeviceFirmware,
    pub stubber: StubberInfo,
    #[serde(default)]
    pub modules: Vec<Value>,
}

/// Descriptor of a firmware stub.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirmwareInfo {
    pub firmware: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub devices: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modules: Vec<Value>,
}

/// Collapse runs of whitespace into single dashes.
pub fn dashed(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join("-")
}

fn subtree(root: &NormalizedPath, dir: MicropyPath) -> NormalizedPath {
    let candidate = root.join(dir.as_str());
    if candidate.is_dir() {
        candidate
    } else {
        root.clone()
    }
}

/// Read and parse `<path>/info.json`.
pub fn read_info(path: &NormalizedPath) -> Result<Value> {
    let info_path = path.join(MicropyPath::StubInfo.as_str());
    if !info_path.is_file() {
        return Err(Error::StubIntegrity {
            path: path.to_native(),
        });
    }
    let text = io::read_text(&info_path)?;
    serde_json::from_str(&text).map_err(|e| Error::Metadata {
        path: info_path.to_native(),
        message: e.to_string(),
    })
}

fn decode<T: serde::de::DeserializeOwned>(path: &NormalizedPath, info: &Value) -> Result<T> {
    serde_json::from_value(info.clone()).map_err(|e| Error::Metadata {
        path: path.join(MicropyPath::StubInfo.as_str()).to_native(),
        message: e.to_string(),
    })
}

/// A firmware stub.
#[derive(Debug, Clone)]
pub struct FirmwareStub {
    name: String,
    path: NormalizedPath,
    info: FirmwareInfo,
}

impl FirmwareStub {
    pub fn new(path: impl Into<NormalizedPath>, info: FirmwareInfo) -> Self {
        Self {
            name: dashed(&info.firmware),
            path: path.into(),
            info,
        }
    }

    pub fn load(path: impl Into<NormalizedPath>) -> Result<Self> {
        let path = path.into();
        let info = decode(&path, &read_info(&path)?)?;
        Ok(Self::new(path, info))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &NormalizedPath {
        &self.path
    }

    pub fn info(&self) -> &FirmwareInfo {
        &self.info
    }

    pub fn repo(&self) -> Option<&str> {
        self.info.repo.as_deref()
    }

    pub fn frozen(&self) -> NormalizedPath {
        subtree(&self.path, MicropyPath::FrozenDir)
    }

    pub fn stubs(&self) -> NormalizedPath {
        subtree(&self.path, MicropyPath::StubsDir)
    }

    /// The same firmware addressed through another path, e.g. a symlink.
    pub fn relocate(&self, path: impl Into<NormalizedPath>) -> Self {
        Self {
            path: path.into(),
            ..self.clone()
        }
    }
}

impl PartialEq for FirmwareStub {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for FirmwareStub {}

impl Hash for FirmwareStub {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl std::fmt::Display for FirmwareStub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// A device stub, optionally bound to its firmware.
#[derive(Debug, Clone)]
pub struct DeviceStub {
    name: String,
    path: NormalizedPath,
    info: DeviceInfo,
    firmware: Option<FirmwareStub>,
}

impl DeviceStub {
    pub fn new(path: impl Into<NormalizedPath>, info: DeviceInfo) -> Self {
        let name = Self::derive_name(&info);
        Self {
            name,
            path: path.into(),
            info,
            firmware: None,
        }
    }

    pub fn load(path: impl Into<NormalizedPath>) -> Result<Self> {
        let path = path.into();
        let info = decode(&path, &read_info(&path)?)?;
        Ok(Self::new(path, info))
    }

    /// `<name>` if declared, else `<sysname>-<firmware>-<version>`, or
    /// `<sysname>-<version>` when the firmware is unknown.
    fn derive_name(info: &DeviceInfo) -> String {
        if let Some(name) = info.name.as_deref()
            && !name.trim().is_empty()
        {
            return dashed(name);
        }
        let sysname = dashed(&info.firmware.sysname);
        let version = normalize_version(&info.firmware.version);
        match firmware_name_of(info) {
            Some(firmware) => format!("{sysname}-{firmware}-{version}"),
            None => format!("{sysname}-{version}"),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &NormalizedPath {
        &self.path
    }

    pub fn info(&self) -> &DeviceInfo {
        &self.info
    }

    pub fn sysname(&self) -> &str {
        &self.info.firmware.sysname
    }

    /// Firmware version, without a leading `v`.
    pub fn version(&self) -> String {
        normalize_version(&self.info.firmware.version)
    }

    /// Version of the stubber that produced this package.
    pub fn stub_version(&self) -> &str {
        &self.info.stubber.version
    }

    /// Name of the firmware stub this device requires, if declared.
    pub fn firmware_name(&self) -> Option<String> {
        firmware_name_of(&self.info)
    }

    pub fn firmware(&self) -> Option<&FirmwareStub> {
        self.firmware.as_ref()
    }

    pub fn set_firmware(&mut self, firmware: Option<FirmwareStub>) {
        self.firmware = firmware;
    }

    pub fn stubs(&self) -> NormalizedPath {
        subtree(&self.path, MicropyPath::StubsDir)
    }

    pub fn frozen(&self) -> NormalizedPath {
        subtree(&self.path, MicropyPath::FrozenDir)
    }

    /// The same stub addressed through another path, e.g. a symlink.
    pub fn relocate(&self, path: impl Into<NormalizedPath>) -> Self {
        Self {
            path: path.into(),
            ..self.clone()
        }
    }
}

fn firmware_name_of(info: &DeviceInfo) -> Option<String> {
    info.firmware
        .firmware
        .as_deref()
        .or(info.firmware.name.as_deref())
        .map(dashed)
        .filter(|name| !name.is_empty())
}

fn normalize_version(version: &str) -> String {
    let version = version.trim();
    version
        .strip_prefix('v')
        .unwrap_or(version)
        .to_string()
}

impl PartialEq for DeviceStub {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for DeviceStub {}

impl Hash for DeviceStub {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl std::fmt::Display for DeviceStub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Any installed stub package.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Stub {
    Device(DeviceStub),
    Firmware(FirmwareStub),
}

impl Stub {
    /// Build a stub of `kind` from an already validated descriptor.
    pub fn from_info(path: impl Into<NormalizedPath>, kind: StubKind, info: &Value) -> Result<Self> {
        let path = path.into();
        Ok(match kind {
            StubKind::Device => Self::Device(DeviceStub::new(path.clone(), decode(&path, info)?)),
            StubKind::Firmware => {
                Self::Firmware(FirmwareStub::new(path.clone(), decode(&path, info)?))
            }
        })
    }

    /// Derived name of a descriptor, without schema validation.
    pub fn peek_name(info: &Value) -> Option<String> {
        if let Ok(device) = serde_json::from_value::<DeviceInfo>(info.clone()) {
            return Some(DeviceStub::derive_name(&device));
        }
        serde_json::from_value::<FirmwareInfo>(info.clone())
            .ok()
            .map(|firmware| dashed(&firmware.firmware))
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Device(stub) => stub.name(),
            Self::Firmware(stub) => stub.name(),
        }
    }

    pub fn path(&self) -> &NormalizedPath {
        match self {
            Self::Device(stub) => stub.path(),
            Self::Firmware(stub) => stub.path(),
        }
    }

    pub fn kind(&self) -> StubKind {
        match self {
            Self::Device(_) => StubKind::Device,
            Self::Firmware(_) => StubKind::Firmware,
        }
    }

    pub fn as_device(&self) -> Option<&DeviceStub> {
        match self {
            Self::Device(stub) => Some(stub),
            Self::Firmware(_) => None,
        }
    }

    pub fn into_device(self) -> Option<DeviceStub> {
        match self {
            Self::Device(stub) => Some(stub),
            Self::Firmware(_) => None,
        }
    }

    pub fn as_firmware(&self) -> Option<&FirmwareStub> {
        match self {
            Self::Firmware(stub) => Some(stub),
            Self::Device(_) => None,
        }
    }
}

impl std::fmt::Display for Stub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
