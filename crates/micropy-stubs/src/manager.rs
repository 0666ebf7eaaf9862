//! The installed-stubs registry
//!
//! [`StubManager`] exclusively owns a resource directory with one
//! subdirectory per installed stub package, named after the stub. Device
//! and firmware stubs are tracked in two disjoint sets; device stubs are
//! bound to their firmware whenever it is installed.
//!
//! Projects never receive copies of stub bytes. They get
//! [`StubManager::resolve_subresource`] views: directory symlinks inside
//! the project data directory pointing back into the resource directory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use micropy_fs::{MicropyPath, NormalizedPath, ServiceLog, io};
use serde_json::Value;
use walkdir::WalkDir;

use crate::dist::{self, DistMetadata};
use crate::fetch::{NoProgress, Progress};
use crate::locate::{self, LocalLocator, Locator, RemoteLocator, RepoLocator};
use crate::repository::StubRepository;
use crate::stub::{DeviceStub, FirmwareStub, Stub, StubKind, read_info};
use crate::validate::StubValidator;
use crate::{Error, Result};

/// Bucket name for device stubs whose firmware is not installed.
pub const UNKNOWN_FIRMWARE: &str = "Unknown";

/// Nested `add` calls (firmware by name, sibling distributions) run one
/// level deep and never resolve firmware remotely themselves.
const TOP_LEVEL: u8 = 0;
const NESTED: u8 = 1;

struct Descriptor {
    info: Value,
    dist: Option<DistMetadata>,
}

pub struct StubManager {
    resource: NormalizedPath,
    validator: StubValidator,
    repository: StubRepository,
    locators: Vec<Box<dyn Locator>>,
    devices: BTreeMap<String, DeviceStub>,
    firmware: BTreeMap<String, FirmwareStub>,
    progress: Box<dyn Progress>,
    log: ServiceLog,
}

impl std::fmt::Debug for StubManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StubManager")
            .field("resource", &self.resource)
            .field("devices", &self.devices.keys().collect::<Vec<_>>())
            .field("firmware", &self.firmware.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

fn locators_for(repository: &StubRepository, log: &ServiceLog) -> Vec<Box<dyn Locator>> {
    vec![
        Box::new(RepoLocator::new(repository.clone(), log.child("repo"))),
        Box::new(RemoteLocator::new(log.child("remote"))),
        Box::new(LocalLocator),
    ]
}

impl StubManager {
    /// Open (creating if needed) the resource directory and load every
    /// stub already installed there.
    pub fn new(
        resource: impl Into<NormalizedPath>,
        repository: StubRepository,
        log: ServiceLog,
    ) -> Result<Self> {
        let resource = resource.into();
        let native = resource.to_native();
        std::fs::create_dir_all(&native).map_err(|e| micropy_fs::Error::io(&native, e))?;

        let mut manager = Self {
            locators: locators_for(&repository, &log),
            resource: resource.clone(),
            validator: StubValidator::new()?,
            repository,
            devices: BTreeMap::new(),
            firmware: BTreeMap::new(),
            progress: Box::new(NoProgress),
            log,
        };
        manager.load_from(&native)?;
        Ok(manager)
    }

    pub fn with_progress(mut self, progress: impl Progress + 'static) -> Self {
        self.progress = Box::new(progress);
        self
    }

    pub fn resource(&self) -> &NormalizedPath {
        &self.resource
    }

    pub fn repository(&self) -> &StubRepository {
        &self.repository
    }

    pub fn set_repository(&mut self, repository: StubRepository) {
        self.locators = locators_for(&repository, &self.log);
        self.repository = repository;
    }

    /// Classify the package at `path`.
    pub fn validate(&self, path: &Path) -> Result<StubKind> {
        self.validator.validate(&NormalizedPath::new(path))
    }

    pub fn is_valid(&self, path: &Path) -> bool {
        self.validate(path).is_ok()
    }

    /// Installed device stubs, by name.
    pub fn devices(&self) -> impl Iterator<Item = &DeviceStub> {
        self.devices.values()
    }

    /// Installed firmware stubs, by name.
    pub fn firmware(&self) -> impl Iterator<Item = &FirmwareStub> {
        self.firmware.values()
    }

    /// Number of installed device stubs.
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&DeviceStub> {
        self.devices.get(name)
    }

    pub fn get_firmware(&self, name: &str) -> Option<&FirmwareStub> {
        self.firmware.get(name)
    }

    /// Any installed stub called `name`.
    pub fn lookup(&self, name: &str) -> Option<Stub> {
        self.devices
            .get(name)
            .cloned()
            .map(Stub::Device)
            .or_else(|| self.firmware.get(name).cloned().map(Stub::Firmware))
    }

    /// The installed stub living at `path`.
    pub fn find_by_path(&self, path: &Path) -> Option<Stub> {
        let path = NormalizedPath::new(path);
        self.devices
            .values()
            .find(|s| *s.path() == path)
            .cloned()
            .map(Stub::Device)
            .or_else(|| {
                self.firmware
                    .values()
                    .find(|s| *s.path() == path)
                    .cloned()
                    .map(Stub::Firmware)
            })
    }

    /// Whether a stub with this name is installed.
    pub fn contains(&self, name: &str) -> bool {
        self.devices.contains_key(name) || self.firmware.contains_key(name)
    }

    /// Install a stub from a repository name, archive URL, archive file
    /// or directory.
    ///
    /// Returns one stub per installed package; a location holding several
    /// packages installs each of them. Installing an already present stub
    /// returns it untouched unless `force` is set, in which case the
    /// on-disk tree is replaced.
    pub fn add(&mut self, location: &str, force: bool) -> Result<Vec<Stub>> {
        self.add_at(location, force, TOP_LEVEL)
    }

    fn add_at(&mut self, location: &str, force: bool, depth: u8) -> Result<Vec<Stub>> {
        let located = locate::locate(&self.locators, location, self.progress.as_mut())?;
        let mut packages = find_packages(located.path());
        if packages.len() > 1 {
            // Firmware first, so device stubs in the same bundle bind to it.
            packages.sort_by_key(|p| !matches!(self.validate(p), Ok(StubKind::Firmware)));
            self.log.info(format_args!(
                "{location} contains {} stub packages",
                packages.len()
            ));
            let mut installed = Vec::with_capacity(packages.len());
            for package in packages {
                installed.extend(self.install(&package, force, depth)?);
            }
            return Ok(installed);
        }
        let root = packages
            .into_iter()
            .next()
            .unwrap_or_else(|| located.path().to_path_buf());
        self.install(&root, force, depth)
    }

    /// Strictly register a package already inside the resource directory.
    pub fn insert(&mut self, path: &Path) -> Result<Stub> {
        let package = NormalizedPath::new(path);
        let info = read_info(&package)?;
        if let Some(name) = Stub::peek_name(&info)
            && self.contains(&name)
        {
            return Err(Error::StubExists { name });
        }
        let kind = self.validator.validate_info(&package, &info)?;
        let stub = Stub::from_info(package, kind, &info)?;
        Ok(self.register(stub, NESTED))
    }

    /// Read the package's `info.json`. Distributions whose `info.json` is
    /// missing, unreadable or invalid get one synthesized from `PKG-INFO`.
    fn read_descriptor(&self, package: &NormalizedPath) -> Result<Descriptor> {
        let failure = match read_info(package) {
            Ok(info) => match self.validator.validate_info(package, &info) {
                Ok(_) => return Ok(Descriptor { info, dist: None }),
                Err(e) => e,
            },
            Err(e @ (Error::StubIntegrity { .. } | Error::Metadata { .. })) => e,
            Err(e) => return Err(e),
        };
        if !dist::is_distribution(package) {
            return Err(failure);
        }
        let meta = DistMetadata::load(package)?;
        self.log.debug(format_args!(
            "synthesizing info.json for distribution {} {} ({failure})",
            meta.name, meta.version
        ));
        Ok(Descriptor {
            info: meta.to_info(),
            dist: Some(meta),
        })
    }

    fn install(&mut self, path: &Path, force: bool, depth: u8) -> Result<Vec<Stub>> {
        if !force && let Some(existing) = self.find_by_path(path) {
            return Ok(vec![existing]);
        }

        let package = NormalizedPath::new(path);
        let descriptor = self.read_descriptor(&package)?;

        if let Some(name) = Stub::peek_name(&descriptor.info)
            && !force
            && let Some(existing) = self.lookup(&name)
        {
            self.log.info(format_args!("{name} is already installed"));
            return Ok(vec![existing]);
        }

        if let Some(meta) = &descriptor.dist
            && depth == TOP_LEVEL
        {
            for required in meta.required_stubs() {
                if let Err(e) = self.add_at(&required, false, NESTED) {
                    self.log
                        .warn(format_args!("could not install {required}: {e}"));
                }
            }
        }

        let kind = self.validator.validate_info(&package, &descriptor.info)?;
        let staged = Stub::from_info(package.clone(), kind, &descriptor.info)?;
        // Packages already directly under the resource root stay in place.
        let dest = if package.parent().as_ref() == Some(&self.resource) {
            package.clone()
        } else {
            self.resource.join(staged.name())
        };

        if dest != package {
            if let Some(previous) = self.remove(staged.name())? {
                self.log
                    .info(format_args!("replacing installed stub {previous}"));
            }
            // Leftovers from an interrupted install are not registered.
            io::remove_path(&dest.to_native())?;
            io::copy_dir(path, &dest.to_native())?;
            if descriptor.dist.is_some() {
                let mut text = serde_json::to_string_pretty(&descriptor.info)?;
                text.push('\n');
                io::write_text(&dest.join(MicropyPath::StubInfo.as_str()), &text)?;
            }
        } else {
            self.unregister(staged.name());
        }

        let stub = Stub::from_info(dest, kind, &descriptor.info)?;
        let stub = self.register(stub, depth);
        self.log.success(format_args!("installed {stub}"));
        Ok(vec![stub])
    }

    fn register(&mut self, stub: Stub, depth: u8) -> Stub {
        match stub {
            Stub::Firmware(firmware) => {
                for device in self.devices.values_mut() {
                    if device.firmware().is_none()
                        && device.firmware_name().as_deref() == Some(firmware.name())
                    {
                        device.set_firmware(Some(firmware.clone()));
                    }
                }
                self.firmware
                    .insert(firmware.name().to_string(), firmware.clone());
                Stub::Firmware(firmware)
            }
            Stub::Device(mut device) => {
                self.bind_firmware(&mut device, depth);
                self.devices
                    .insert(device.name().to_string(), device.clone());
                Stub::Device(device)
            }
        }
    }

    fn unregister(&mut self, name: &str) -> Option<Stub> {
        if let Some(device) = self.devices.remove(name) {
            return Some(Stub::Device(device));
        }
        let firmware = self.firmware.remove(name)?;
        for device in self.devices.values_mut() {
            if device.firmware() == Some(&firmware) {
                device.set_firmware(None);
            }
        }
        Some(Stub::Firmware(firmware))
    }

    /// Bind `stub` to its firmware.
    ///
    /// Looks the firmware up among installed stubs first and installs it
    /// by name otherwise. Failure to install leaves the stub without
    /// firmware.
    pub fn resolve_firmware(&mut self, stub: &mut DeviceStub) {
        self.bind_firmware(stub, TOP_LEVEL);
    }

    fn bind_firmware(&mut self, stub: &mut DeviceStub, depth: u8) {
        let Some(name) = stub.firmware_name() else {
            return;
        };
        if let Some(firmware) = self.firmware.get(&name) {
            stub.set_firmware(Some(firmware.clone()));
            return;
        }
        if depth != TOP_LEVEL {
            self.log
                .warn(format_args!("firmware {name} for {stub} is not installed"));
            return;
        }
        match self.add_at(&name, false, NESTED) {
            Ok(installed) => {
                let firmware = installed.iter().find_map(|s| s.as_firmware()).cloned();
                if firmware.is_none() {
                    self.log
                        .warn(format_args!("{name} did not resolve to a firmware stub"));
                }
                stub.set_firmware(firmware);
            }
            Err(e) => {
                self.log
                    .warn(format_args!("could not resolve firmware {name} for {stub}: {e}"));
                stub.set_firmware(None);
            }
        }
    }

    /// Load every stub package found directly under `dir`.
    ///
    /// Firmware stubs load before device stubs regardless of directory
    /// order, so devices bind to firmware found in the same directory.
    /// Firmware is only looked up, never installed remotely.
    pub fn load_from(&mut self, dir: &Path) -> Result<Vec<Stub>> {
        let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)
            .map_err(|e| micropy_fs::Error::io(dir, e))?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .collect();
        entries.sort();

        let mut firmware = Vec::new();
        let mut devices = Vec::new();
        for path in entries {
            match self.validate(&path) {
                Ok(StubKind::Firmware) => firmware.push(path),
                Ok(StubKind::Device) => devices.push(path),
                Err(e) => self
                    .log
                    .warn(format_args!("skipping {}: {e}", path.display())),
            }
        }

        let mut loaded = Vec::with_capacity(firmware.len() + devices.len());
        for path in firmware.into_iter().chain(devices) {
            loaded.extend(self.install(&path, false, NESTED)?);
        }
        self.log.debug(format_args!(
            "loaded {} stubs from {}",
            loaded.len(),
            dir.display()
        ));
        Ok(loaded)
    }

    /// Uninstall the stub called `name`, deleting its managed directory.
    pub fn remove(&mut self, name: &str) -> Result<Option<Stub>> {
        let removed = self.unregister(name);
        if let Some(stub) = &removed
            && stub.path().starts_with(&self.resource)
        {
            io::remove_path(&stub.path().to_native())?;
        }
        Ok(removed)
    }

    /// Device stubs grouped by firmware name.
    ///
    /// Every installed firmware gets a group; device stubs without an
    /// installed firmware are collected under [`UNKNOWN_FIRMWARE`].
    pub fn iter_by_firmware(&self) -> Vec<(String, Vec<&DeviceStub>)> {
        let mut groups: Vec<(String, Vec<&DeviceStub>)> = self
            .firmware
            .values()
            .map(|firmware| {
                let devices = self
                    .devices
                    .values()
                    .filter(|d| d.firmware() == Some(firmware))
                    .collect();
                (firmware.name().to_string(), devices)
            })
            .collect();
        let unknown: Vec<&DeviceStub> = self
            .devices
            .values()
            .filter(|d| d.firmware().is_none())
            .collect();
        if !unknown.is_empty() {
            groups.push((UNKNOWN_FIRMWARE.to_string(), unknown));
        }
        groups
    }

    /// Link each stub (and its firmware) into `data_dir`.
    ///
    /// Returns the stubs re-addressed through their links. Existing links
    /// are left alone.
    pub fn resolve_subresource(
        &self,
        stubs: &[DeviceStub],
        data_dir: &Path,
    ) -> Result<Vec<DeviceStub>> {
        let data_dir = NormalizedPath::new(data_dir);
        stubs
            .iter()
            .map(|stub| {
                let managed = self.get(stub.name()).unwrap_or(stub);
                let link = self.link(managed.path(), &data_dir, managed.name())?;
                let mut linked = managed.relocate(link);
                let firmware = managed
                    .firmware()
                    .map(|fw| {
                        let link = self.link(fw.path(), &data_dir, fw.name())?;
                        Ok::<_, Error>(fw.relocate(link))
                    })
                    .transpose()?;
                linked.set_firmware(firmware);
                Ok(linked)
            })
            .collect()
    }

    fn link(
        &self,
        target: &NormalizedPath,
        data_dir: &NormalizedPath,
        name: &str,
    ) -> Result<NormalizedPath> {
        let link = data_dir.join(name);
        if io::link_dir(&target.to_native(), &link.to_native())? {
            self.log.debug(format_args!("linked {link} -> {target}"));
        }
        Ok(link)
    }
}

/// Directories under `root` that carry their own `info.json`.
fn find_packages(root: &Path) -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = WalkDir::new(root)
        .max_depth(3)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && e.file_name() == MicropyPath::StubInfo.as_str())
        .filter_map(|e| e.path().parent().map(Path::to_path_buf))
        .collect();
    found.sort();
    found
}
