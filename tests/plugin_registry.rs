/*
 *  tests/plugin_registry.rs
 *
 *  Aura Live
 *  (c) 2020-26 Stuart Hunter
 *
 *  Registry behaviour against in-process fake plugin libraries
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

//! The fake loader maps file stems to behaviours. Plugins are ordinary
//! `extern "C"` functions over the real ABI records, so everything past
//! `LibraryLoader::open` runs exactly as it would for a shared library.

use std::collections::HashMap;
use std::env::consts::DLL_SUFFIX;
use std::ffi::{CStr, c_char};
use std::fs;
use std::path::{Path, PathBuf};
use std::ptr;
use std::sync::{Mutex, MutexGuard};

use aura_live::config::Config;
use aura_live::plugin::ffi::{
    AuraObjectInstance, AuraPluginDesc, AuraPluginVTable, PluginEntryFn, RawPropertyList, StaticStr,
};
use aura_live::plugin::{LibraryLoader, PluginLibrary};
use aura_live::property::{Bounded, Property, PropertyValue};
use aura_live::{AuraError, AuraLive, PluginError, PluginKind, PluginRegistry};

// ============================================================================
// Event log shared by the fakes
// ============================================================================

static EVENTS: Mutex<Vec<String>> = Mutex::new(Vec::new());
static SERIAL: Mutex<()> = Mutex::new(());

fn record(event: impl Into<String>) {
    EVENTS.lock().unwrap_or_else(|e| e.into_inner()).push(event.into());
}

fn events() -> Vec<String> {
    EVENTS.lock().unwrap_or_else(|e| e.into_inner()).clone()
}

/// Serialise tests and start each with an empty event log
fn exclusive() -> MutexGuard<'static, ()> {
    let guard = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    EVENTS.lock().unwrap_or_else(|e| e.into_inner()).clear();
    guard
}

fn position(events: &[String], event: &str) -> usize {
    events
        .iter()
        .position(|e| e == event)
        .unwrap_or_else(|| panic!("no {event} in {events:?}"))
}

// ============================================================================
// Fake plugins
// ============================================================================

#[repr(C)]
struct FakeObject {
    instance: AuraObjectInstance,
    _properties: RawPropertyList,
}

// Plugin A: elements colour + gradient, full capability set except
// property_changed; only colour can be created
static A_TYPES: [StaticStr; 3] = [StaticStr(c"colour".as_ptr()), StaticStr(c"gradient".as_ptr()), StaticStr::NULL];
static A_DESC: AuraPluginDesc = AuraPluginDesc {
    name: c"Plugin A".as_ptr(),
    author: c"Tests".as_ptr(),
    description: c"colour and gradient".as_ptr(),
    version: c"1.0.0".as_ptr(),
    plugin_type: 0,
    object_types: StaticStr::list(&A_TYPES),
};

unsafe extern "C" fn a_describe() -> *const AuraPluginDesc {
    &A_DESC
}

unsafe extern "C" fn a_unload() {
    record("unload:a");
}

unsafe extern "C" fn a_create(object_type: *const c_char) -> *mut AuraObjectInstance {
    let name = unsafe { CStr::from_ptr(object_type) };
    if name != c"colour" {
        return ptr::null_mut();
    }

    let width = Property::new("width", PropertyValue::Integer(Bounded::new(0, 100, 50).unwrap()));
    let properties = RawPropertyList::new([&width]).unwrap();
    let object = Box::new(FakeObject {
        instance: AuraObjectInstance {
            plugin_type: 0,
            object_type: c"colour".as_ptr(),
            properties: properties.as_ptr(),
        },
        _properties: properties,
    });
    record("create:a");
    Box::into_raw(object) as *mut AuraObjectInstance
}

unsafe extern "C" fn a_destroy(object: *mut AuraObjectInstance) {
    drop(unsafe { Box::from_raw(object as *mut FakeObject) });
    record("destroy:a");
}

static A_VTABLE: AuraPluginVTable = AuraPluginVTable {
    get_description: Some(a_describe),
    unload: Some(a_unload),
    create: Some(a_create),
    destroy: Some(a_destroy),
    property_changed: None,
};

unsafe extern "C" fn a_entry() -> *const AuraPluginVTable {
    &A_VTABLE
}

// Plugin B: element colour only, description and nothing else
static B_TYPES: [StaticStr; 2] = [StaticStr(c"colour".as_ptr()), StaticStr::NULL];
static B_DESC: AuraPluginDesc = AuraPluginDesc {
    name: c"Plugin B".as_ptr(),
    author: c"Tests".as_ptr(),
    description: ptr::null(),
    version: c"2.0.0".as_ptr(),
    plugin_type: 0,
    object_types: StaticStr::list(&B_TYPES),
};

unsafe extern "C" fn b_describe() -> *const AuraPluginDesc {
    &B_DESC
}

static B_VTABLE: AuraPluginVTable = AuraPluginVTable {
    get_description: Some(b_describe),
    unload: None,
    create: None,
    destroy: None,
    property_changed: None,
};

unsafe extern "C" fn b_entry() -> *const AuraPluginVTable {
    &B_VTABLE
}

// Plugin X: source twitter
static X_TYPES: [StaticStr; 2] = [StaticStr(c"twitter".as_ptr()), StaticStr::NULL];
static X_DESC: AuraPluginDesc = AuraPluginDesc {
    name: c"Plugin X".as_ptr(),
    author: ptr::null(),
    description: ptr::null(),
    version: c"0.0.1".as_ptr(),
    plugin_type: 1,
    object_types: StaticStr::list(&X_TYPES),
};

unsafe extern "C" fn x_describe() -> *const AuraPluginDesc {
    &X_DESC
}

unsafe extern "C" fn x_unload() {
    record("unload:x");
}

static X_VTABLE: AuraPluginVTable = AuraPluginVTable {
    get_description: Some(x_describe),
    unload: Some(x_unload),
    create: None,
    destroy: None,
    property_changed: None,
};

unsafe extern "C" fn x_entry() -> *const AuraPluginVTable {
    &X_VTABLE
}

// Plugin D: lists the same element type twice
static D_TYPES: [StaticStr; 3] = [StaticStr(c"echo".as_ptr()), StaticStr(c"echo".as_ptr()), StaticStr::NULL];
static D_DESC: AuraPluginDesc = AuraPluginDesc {
    name: c"Plugin D".as_ptr(),
    author: ptr::null(),
    description: ptr::null(),
    version: c"0.2.0".as_ptr(),
    plugin_type: 0,
    object_types: StaticStr::list(&D_TYPES),
};

unsafe extern "C" fn d_describe() -> *const AuraPluginDesc {
    &D_DESC
}

static D_VTABLE: AuraPluginVTable = AuraPluginVTable {
    get_description: Some(d_describe),
    unload: None,
    create: None,
    destroy: None,
    property_changed: None,
};

unsafe extern "C" fn d_entry() -> *const AuraPluginVTable {
    &D_VTABLE
}

// Broken plugins
unsafe extern "C" fn null_entry() -> *const AuraPluginVTable {
    ptr::null()
}

unsafe extern "C" fn should_not_unload() {
    record("unload:broken");
}

static NO_DESCRIBE_VTABLE: AuraPluginVTable = AuraPluginVTable {
    get_description: None,
    unload: Some(should_not_unload),
    create: None,
    destroy: None,
    property_changed: None,
};

unsafe extern "C" fn no_describe_entry() -> *const AuraPluginVTable {
    &NO_DESCRIBE_VTABLE
}

unsafe extern "C" fn null_describe() -> *const AuraPluginDesc {
    ptr::null()
}

static NULL_DESCRIBE_VTABLE: AuraPluginVTable = AuraPluginVTable {
    get_description: Some(null_describe),
    unload: Some(should_not_unload),
    create: None,
    destroy: None,
    property_changed: None,
};

unsafe extern "C" fn null_describe_entry() -> *const AuraPluginVTable {
    &NULL_DESCRIBE_VTABLE
}

static BAD_KIND_DESC: AuraPluginDesc = AuraPluginDesc {
    name: c"Bad Kind".as_ptr(),
    author: ptr::null(),
    description: ptr::null(),
    version: ptr::null(),
    plugin_type: 9,
    object_types: ptr::null(),
};

unsafe extern "C" fn bad_kind_describe() -> *const AuraPluginDesc {
    &BAD_KIND_DESC
}

static BAD_KIND_VTABLE: AuraPluginVTable = AuraPluginVTable {
    get_description: Some(bad_kind_describe),
    unload: None,
    create: None,
    destroy: None,
    property_changed: None,
};

unsafe extern "C" fn bad_kind_entry() -> *const AuraPluginVTable {
    &BAD_KIND_VTABLE
}

// ============================================================================
// Fake library backend
// ============================================================================

#[derive(Clone, Copy)]
enum Behaviour {
    Plugin(PluginEntryFn),
    NoEntryPoint,
    Corrupt,
}

struct FakeLoader {
    libraries: HashMap<String, Behaviour>,
}

impl FakeLoader {
    fn new(libraries: &[(&str, Behaviour)]) -> Self {
        Self {
            libraries: libraries.iter().map(|(stem, b)| (stem.to_string(), *b)).collect(),
        }
    }
}

struct FakeLibrary {
    stem: String,
    behaviour: Behaviour,
}

fn stem(path: &Path) -> String {
    path.file_stem().unwrap().to_string_lossy().into_owned()
}

impl LibraryLoader for FakeLoader {
    fn open(&self, path: &Path) -> Result<Box<dyn PluginLibrary>, PluginError> {
        let stem = stem(path);
        record(format!("open:{stem}"));
        match self.libraries.get(&stem) {
            None | Some(Behaviour::Corrupt) => {
                Err(PluginError::LoadFailed(format!("{}: invalid ELF header", path.display())))
            }
            Some(behaviour) => Ok(Box::new(FakeLibrary { stem, behaviour: *behaviour })),
        }
    }
}

// SAFETY: every behaviour holds a function written against the plugin ABI
unsafe impl PluginLibrary for FakeLibrary {
    fn entry_point(&self) -> Result<PluginEntryFn, PluginError> {
        match self.behaviour {
            Behaviour::Plugin(entry) => Ok(entry),
            _ => Err(PluginError::MissingEntryPoint("undefined symbol: aura_plugin_load".into())),
        }
    }
}

impl Drop for FakeLibrary {
    fn drop(&mut self) {
        record(format!("close:{}", self.stem));
    }
}

/// Create empty files named `<path><DLL_SUFFIX>` (or verbatim if the name
/// already has an extension) under `root`
fn touch(root: &Path, names: &[&str]) {
    for name in names {
        let file = if Path::new(name).extension().is_some() {
            root.join(name)
        } else {
            root.join(format!("{name}{DLL_SUFFIX}"))
        };
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(file, b"").unwrap();
    }
}

fn plugin_name(registry: &PluginRegistry, kind: PluginKind, object_type: &str) -> Option<String> {
    registry
        .plugin_for(kind, object_type)
        .map(|p| p.description().name.clone())
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn test_discovery_loads_valid_and_skips_invalid() {
    let _guard = exclusive();
    let root = tempfile::tempdir().unwrap();
    touch(
        root.path(),
        &["a", "nested/x", "corrupt", "noentry", "nullentry", "nodescribe", "nulldescribe", "badkind", "readme.txt"],
    );

    let loader = FakeLoader::new(&[
        ("a", Behaviour::Plugin(a_entry)),
        ("x", Behaviour::Plugin(x_entry)),
        ("corrupt", Behaviour::Corrupt),
        ("noentry", Behaviour::NoEntryPoint),
        ("nullentry", Behaviour::Plugin(null_entry)),
        ("nodescribe", Behaviour::Plugin(no_describe_entry)),
        ("nulldescribe", Behaviour::Plugin(null_describe_entry)),
        ("badkind", Behaviour::Plugin(bad_kind_entry)),
    ]);

    let registry = PluginRegistry::open_with(root.path(), &loader).unwrap();
    assert_eq!(registry.len(), 2);

    let log = events();
    assert!(!log.iter().any(|e| e == "open:readme"));
    // every rejected library is closed during the scan, never unloaded
    for broken in ["noentry", "nullentry", "nodescribe", "nulldescribe", "badkind"] {
        assert!(log.contains(&format!("close:{broken}")), "{broken} left open: {log:?}");
    }
    assert!(!log.iter().any(|e| e == "close:corrupt"));
    assert!(!log.iter().any(|e| e == "unload:broken"));
    assert!(!log.iter().any(|e| e == "close:a" || e == "close:x"));

    let names: Vec<&str> = registry.descriptions().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["Plugin A", "Plugin X"]);
    assert_eq!(registry.plugin_paths().count(), 2);
}

#[test]
fn test_index_answers_by_kind_and_type() {
    let _guard = exclusive();
    let root = tempfile::tempdir().unwrap();
    touch(root.path(), &["a", "x"]);
    let loader = FakeLoader::new(&[("a", Behaviour::Plugin(a_entry)), ("x", Behaviour::Plugin(x_entry))]);

    let registry = PluginRegistry::open_with(root.path(), &loader).unwrap();

    assert_eq!(plugin_name(&registry, PluginKind::Element, "colour").as_deref(), Some("Plugin A"));
    assert_eq!(plugin_name(&registry, PluginKind::Element, "gradient").as_deref(), Some("Plugin A"));
    assert_eq!(plugin_name(&registry, PluginKind::Source, "colour"), None);
    assert_eq!(plugin_name(&registry, PluginKind::Source, "twitter").as_deref(), Some("Plugin X"));

    assert_eq!(registry.object_types_for(PluginKind::Element), ["colour", "gradient"]);
    assert_eq!(registry.object_types_for(PluginKind::Source), ["twitter"]);
    assert!(registry.object_types_for(PluginKind::Layout).is_empty());
}

#[test]
fn test_later_plugin_wins_duplicate_type() {
    let _guard = exclusive();
    let root = tempfile::tempdir().unwrap();
    touch(root.path(), &["1-a", "2-b"]);
    let loader = FakeLoader::new(&[("1-a", Behaviour::Plugin(a_entry)), ("2-b", Behaviour::Plugin(b_entry))]);

    let registry = PluginRegistry::open_with(root.path(), &loader).unwrap();

    assert_eq!(registry.len(), 2);
    assert_eq!(plugin_name(&registry, PluginKind::Element, "colour").as_deref(), Some("Plugin B"));
    assert_eq!(plugin_name(&registry, PluginKind::Element, "gradient").as_deref(), Some("Plugin A"));
    assert_eq!(registry.object_types_for(PluginKind::Element), ["colour", "gradient"]);
}

#[test]
fn test_type_listed_twice_is_indexed_once() {
    let _guard = exclusive();
    let root = tempfile::tempdir().unwrap();
    touch(root.path(), &["d"]);
    let loader = FakeLoader::new(&[("d", Behaviour::Plugin(d_entry))]);

    let registry = PluginRegistry::open_with(root.path(), &loader).unwrap();

    assert_eq!(registry.len(), 1);
    assert_eq!(registry.object_types_for(PluginKind::Element), ["echo"]);
    assert_eq!(plugin_name(&registry, PluginKind::Element, "echo").as_deref(), Some("Plugin D"));
}

#[cfg(unix)]
#[test]
fn test_symlinked_plugin_is_never_loaded() {
    let _guard = exclusive();
    let outside = tempfile::tempdir().unwrap();
    touch(outside.path(), &["a"]);
    let root = tempfile::tempdir().unwrap();
    std::os::unix::fs::symlink(
        outside.path().join(format!("a{DLL_SUFFIX}")),
        root.path().join(format!("a{DLL_SUFFIX}")),
    )
    .unwrap();
    std::os::unix::fs::symlink(outside.path(), root.path().join("linked-dir")).unwrap();

    let loader = FakeLoader::new(&[("a", Behaviour::Plugin(a_entry))]);
    let registry = PluginRegistry::open_with(root.path(), &loader).unwrap();

    assert!(registry.is_empty());
    assert!(registry.plugin_for(PluginKind::Element, "colour").is_none());
    assert!(events().is_empty());
}

#[test]
fn test_teardown_unloads_before_close() {
    let _guard = exclusive();
    let root = tempfile::tempdir().unwrap();
    touch(root.path(), &["a", "b", "x"]);
    let loader = FakeLoader::new(&[
        ("a", Behaviour::Plugin(a_entry)),
        ("b", Behaviour::Plugin(b_entry)),
        ("x", Behaviour::Plugin(x_entry)),
    ]);

    let registry = PluginRegistry::open_with(root.path(), &loader).unwrap();
    assert_eq!(registry.len(), 3);
    drop(registry);

    let log = events();
    assert_eq!(log.iter().filter(|e| *e == "unload:a").count(), 1);
    assert_eq!(log.iter().filter(|e| *e == "unload:x").count(), 1);
    assert!(position(&log, "unload:a") < position(&log, "close:a"));
    assert!(position(&log, "unload:x") < position(&log, "close:x"));
    // b has no unload capability and is simply closed
    position(&log, "close:b");
}

#[test]
fn test_borrowed_plugin_never_unloads() {
    let _guard = exclusive();
    let root = tempfile::tempdir().unwrap();
    touch(root.path(), &["a"]);
    let loader = FakeLoader::new(&[("a", Behaviour::Plugin(a_entry))]);
    let registry = PluginRegistry::open_with(root.path(), &loader).unwrap();

    let plugin = registry.plugin_for(PluginKind::Element, "colour").unwrap();
    assert_eq!(plugin.description().name, "Plugin A");
    let width = Property::new("width", PropertyValue::Integer(Bounded::new(0, 100, 10).unwrap()));
    assert!(plugin.property_changed(&width));
    let object = plugin.create_object(PluginKind::Element, "colour").unwrap();
    object.release();
    drop(registry.create_object(PluginKind::Element, "colour"));

    assert!(!events().iter().any(|e| e == "unload:a"));

    drop(registry);
    let log = events();
    assert_eq!(log.iter().filter(|e| *e == "unload:a").count(), 1);
    assert!(position(&log, "destroy:a") < position(&log, "unload:a"));
    assert!(position(&log, "unload:a") < position(&log, "close:a"));
}

#[test]
fn test_missing_root_is_fatal() {
    let _guard = exclusive();
    let loader = FakeLoader::new(&[]);
    let err = PluginRegistry::open_with("/nonexistent/path", &loader).err().unwrap();

    assert!(matches!(err, AuraError::BadPluginDir { .. }));
    assert_eq!(err.code(), 3);
    assert!(events().is_empty());
}

#[test]
fn test_good_bad_and_broken_tree() {
    let _guard = exclusive();
    let dir = tempfile::tempdir().unwrap();
    let plugins = dir.path().join("plugins");
    touch(&plugins, &["a/good", "bad.txt", "broken"]);
    let loader = FakeLoader::new(&[
        ("good", Behaviour::Plugin(a_entry)),
        ("broken", Behaviour::Plugin(no_describe_entry)),
    ]);

    let registry = PluginRegistry::open_with(&plugins, &loader).unwrap();

    assert_eq!(registry.len(), 1);
    assert!(!events().iter().any(|e| e == "open:bad"));
    assert_eq!(registry.object_types_for(PluginKind::Element), ["colour", "gradient"]);
    assert_eq!(plugin_name(&registry, PluginKind::Element, "colour").as_deref(), Some("Plugin A"));
    assert!(registry.plugin_for(PluginKind::Source, "colour").is_none());
    assert_eq!(
        registry.plugin_paths().collect::<Vec<_>>(),
        vec![plugins.join(format!("a/good{DLL_SUFFIX}")).as_path()]
    );
}

#[test]
fn test_objects_route_back_to_their_plugin() {
    let _guard = exclusive();
    let root = tempfile::tempdir().unwrap();
    touch(root.path(), &["a"]);
    let loader = FakeLoader::new(&[("a", Behaviour::Plugin(a_entry))]);
    let registry = PluginRegistry::open_with(root.path(), &loader).unwrap();

    // advertised but declined, and the wrong kind never reaches the plugin
    assert!(registry.create_object(PluginKind::Element, "gradient").is_none());
    assert!(registry.create_object(PluginKind::Source, "colour").is_none());
    assert!(registry.create_object(PluginKind::Element, "text").is_none());

    let mut object = registry.create_object(PluginKind::Element, "colour").unwrap();
    assert_eq!(object.kind(), PluginKind::Element);
    assert_eq!(object.object_type(), "colour");
    assert_eq!(object.property("width").unwrap().as_integer().unwrap().value(), 50);

    // no property_changed capability: always accepted
    let width = Property::new("width", PropertyValue::Integer(Bounded::new(0, 100, 75).unwrap()));
    assert_eq!(object.update_property(width), Ok(true));
    assert_eq!(object.property("width").unwrap().as_integer().unwrap().value(), 75);

    drop(object);
    drop(registry);

    let log = events();
    assert_eq!(log.iter().filter(|e| *e == "create:a").count(), 1);
    assert_eq!(log.iter().filter(|e| *e == "destroy:a").count(), 1);
    assert!(position(&log, "destroy:a") < position(&log, "unload:a"));
}

#[test]
fn test_application_reports_inventory() {
    let _guard = exclusive();
    let root = tempfile::tempdir().unwrap();
    touch(root.path(), &["a", "x"]);
    let loader = FakeLoader::new(&[("a", Behaviour::Plugin(a_entry)), ("x", Behaviour::Plugin(x_entry))]);
    let cfg = Config {
        plugins_path: Some(PathBuf::from(root.path())),
        ..Default::default()
    };

    let aura = AuraLive::init_with(&cfg, &loader).unwrap();
    let inventory = aura.inventory();
    assert_eq!(inventory.len(), 2);
    assert_eq!(inventory[0].0, PluginKind::Element);
    assert_eq!(inventory[0].1, ["colour", "gradient"]);
    assert_eq!(inventory[1].0, PluginKind::Source);
    assert_eq!(inventory[1].1, ["twitter"]);

    assert!(matches!(AuraLive::init_with(&cfg, &loader), Err(AuraError::InstanceExists)));
    drop(aura);

    assert!(events().contains(&"unload:a".to_string()));
    assert!(AuraLive::init_with(&cfg, &loader).is_ok());
}
