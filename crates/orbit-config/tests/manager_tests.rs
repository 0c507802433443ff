//! Configuration Manager Tests

use orbit_config::{apply_conf, ConfigError, ConfigurationManager};
use orbit_core::{CycleSource, TaskContext, Value};
use orbit_test_utils::*;

const FIXTURE_CONF: &str = "\
prop2: 10
--- name:fast
prop1:
  a: 1
";

fn manager() -> ConfigurationManager {
    ConfigurationManager::new(fixture_loader())
}

#[test]
fn test_load_dir_skips_unknown_models() {
    let dir = conf_dir();
    write_fixture_conf(&dir, FIXTURE_CONF);
    write_conf(&dir, "unknown::Model.yml", "prop2: 1\n");
    write_conf(&dir, "notes.txt", "not a configuration");

    let mut manager = manager();
    let changed = manager.load_dir(dir.path()).unwrap();
    assert_eq!(changed.len(), 1);
    assert_eq!(changed[FIXTURE_MODEL], vec!["default", "fast"]);
    assert_eq!(manager.model_names(), vec![FIXTURE_MODEL]);
}

#[test]
fn test_load_dir_requires_directory() {
    let dir = conf_dir();
    let file = write_fixture_conf(&dir, FIXTURE_CONF);
    assert!(matches!(
        manager().load_dir(&file),
        Err(ConfigError::NotADirectory(_))
    ));
}

#[test]
fn test_load_file_requires_file() {
    let dir = conf_dir();
    let missing = dir.path().join("missing.yml");
    assert!(matches!(
        manager().load_file(&missing, Some(FIXTURE_MODEL)),
        Err(ConfigError::NotAFile(_))
    ));
}

#[test]
fn test_load_file_for_unknown_model() {
    let dir = conf_dir();
    let file = write_conf(&dir, "other.yml", "prop2: 1\n");
    let err = manager().load_file(&file, None).unwrap_err();
    assert!(matches!(err, ConfigError::Model(_)));
}

#[test]
fn test_requested_names_default_to_default_section() {
    let dir = conf_dir();
    write_fixture_conf(&dir, FIXTURE_CONF);
    let mut manager = manager();
    manager.load_dir(dir.path()).unwrap();

    assert_eq!(
        manager.resolve_requested_names(FIXTURE_MODEL, &[]),
        vec!["default"]
    );
    let conf = manager.resolve(FIXTURE_MODEL, &[], false).unwrap();
    assert_eq!(conf["prop2"], Value::Int(10));
}

#[test]
fn test_requested_names_use_only_section() {
    let dir = conf_dir();
    write_fixture_conf(&dir, "--- name:only\nprop2: 3\n");
    let mut manager = manager();
    manager.load_dir(dir.path()).unwrap();

    assert_eq!(manager.resolve_requested_names(FIXTURE_MODEL, &[]), vec!["only"]);
}

#[test]
fn test_apply_through_manager() {
    let dir = conf_dir();
    write_fixture_conf(&dir, FIXTURE_CONF);
    let mut manager = manager();
    manager.load_dir(dir.path()).unwrap();

    let mut task = fixture_task("task");
    let names = vec!["default".to_string(), "fast".to_string()];
    let applied = manager.apply(&mut task, &names, false).unwrap();
    assert_eq!(applied, names);
    assert_eq!(task.property("prop1").unwrap(), &prop1(1, 42));
    assert_eq!(task.property("prop2").unwrap(), &Value::Int(10));
}

#[test]
fn test_apply_without_configuration() {
    let manager = manager();
    let mut source = TaskContext::new("source", CycleSource::new());

    assert!(manager.apply(&mut source, &[], false).unwrap().is_empty());
    let err = manager
        .apply(&mut source, &["fast".to_string()], false)
        .unwrap_err();
    assert!(matches!(err, ConfigError::NoModelConfiguration(_)));
}

#[test]
fn test_resolve_without_configuration() {
    let manager = manager();

    assert!(manager.resolve(FIXTURE_MODEL, &[], false).unwrap().is_empty());
    assert!(manager
        .resolve(FIXTURE_MODEL, &["default".to_string()], false)
        .unwrap()
        .is_empty());
    assert!(matches!(
        manager.resolve(FIXTURE_MODEL, &["fast".to_string()], false),
        Err(ConfigError::NoModelConfiguration(model)) if model == FIXTURE_MODEL
    ));
}

#[test]
fn test_save_extracts_and_appends() {
    let dir = conf_dir();
    let mut manager = manager();
    let mut task = fixture_task("saved_task");
    task.write_property("prop2", 7).unwrap();

    let file = manager.save(&task, dir.path(), None).unwrap();
    assert_eq!(file, dir.path().join(format!("{FIXTURE_MODEL}.yml")));
    assert!(manager.get(FIXTURE_MODEL).unwrap().has_section("saved_task"));

    let mut reloaded = self::manager();
    reloaded.load_dir(dir.path()).unwrap();
    let conf = reloaded
        .resolve(FIXTURE_MODEL, &["saved_task".to_string()], false)
        .unwrap();
    assert_eq!(conf["prop2"], Value::Int(7));
}

#[test]
fn test_apply_conf_helper() {
    let dir = conf_dir();
    let mut task = fixture_task("task");
    assert!(!apply_conf(&mut task, dir.path(), &["default"], false).unwrap());
    assert_eq!(task.property("prop2").unwrap(), &Value::Int(84));

    write_fixture_conf(&dir, FIXTURE_CONF);
    assert!(apply_conf(&mut task, dir.path(), &["default"], false).unwrap());
    assert_eq!(task.property("prop2").unwrap(), &Value::Int(10));
}
