//! Task Configurations Tests

use orbit_config::{read_task_conf, ConfigError, TaskConfigurations};
use orbit_core::{TaskHandle, Value};
use orbit_test_utils::*;
use pretty_assertions::assert_eq;

const SECTIONS: &str = "\
--- name:default
prop2: 10
--- name:fast
prop1:
  a: 1
--- name:slow
prop1:
  a: 2
prop3: slow
";

fn loaded(text: &str) -> TaskConfigurations {
    let mut confs = TaskConfigurations::new(fixture_model());
    confs.load_from_str(text, "test.yml").unwrap();
    confs
}

#[test]
fn test_sections_are_loaded_in_order() {
    let confs = loaded(SECTIONS);
    assert_eq!(confs.section_names(), vec!["default", "fast", "slow"]);
    assert_eq!(confs.get("default").unwrap()["prop2"], Value::Int(10));
}

#[test]
fn test_reloading_identical_file_changes_nothing() {
    let mut confs = loaded(SECTIONS);
    let changed = confs.load_from_str(SECTIONS, "test.yml").unwrap();
    assert!(changed.is_empty());

    let changed = confs
        .load_from_str("--- name:fast\nprop1:\n  a: 3\n", "test.yml")
        .unwrap();
    assert_eq!(changed, vec!["fast"]);
}

#[test]
fn test_merge_partial_structs() {
    let confs = loaded("--- name:a\nprop1:\n  a: 1\n--- name:b\nprop1:\n  b: 2\n");
    let conf = confs.conf(&["a", "b"], false).unwrap();
    assert_eq!(conf["prop1"], prop1(1, 2));
}

#[test]
fn test_conflict_requires_override() {
    let confs = loaded(SECTIONS);
    let err = confs.conf(&["fast", "slow"], false).unwrap_err();
    assert!(matches!(err, ConfigError::MergeConflict { ref path, .. } if path == ".prop1.a"));

    let conf = confs.conf(&["fast", "slow"], true).unwrap();
    assert_eq!(conf["prop1"], Value::structure([("a", Value::Int(2))]));
    assert_eq!(conf["prop3"], Value::from("slow"));
}

#[test]
fn test_merge_option_extends_existing_section() {
    let confs = loaded("--- name:default\nprop2: 10\n--- name:default merge:true\nprop3: more\n");
    let default = confs.get("default").unwrap();
    assert_eq!(default["prop2"], Value::Int(10));
    assert_eq!(default["prop3"], Value::from("more"));
}

#[test]
fn test_section_without_merge_replaces_existing() {
    let confs = loaded("--- name:default\nprop2: 10\n--- name:default\nprop3: other\n");
    let default = confs.get("default").unwrap();
    assert!(!default.contains_key("prop2"));
    assert_eq!(default["prop3"], Value::from("other"));
}

#[test]
fn test_chain_merges_listed_sections_before_body() {
    let text = format!("{SECTIONS}--- name:combined chain:default,fast\nprop3: combined\n");
    let confs = loaded(&text);
    let combined = confs.get("combined").unwrap();
    assert_eq!(combined["prop2"], Value::Int(10));
    assert_eq!(combined["prop1"], Value::structure([("a", Value::Int(1))]));
    assert_eq!(combined["prop3"], Value::from("combined"));
}

#[test]
fn test_chain_places_body_at_its_own_position() {
    let text = format!("{SECTIONS}--- name:tuned chain:tuned,fast\nprop1:\n  a: 5\n  b: 6\n");
    let confs = loaded(&text);
    assert_eq!(confs.get("tuned").unwrap()["prop1"], prop1(1, 6));
}

#[test]
fn test_chain_with_unknown_section() {
    let mut confs = TaskConfigurations::new(fixture_model());
    let err = confs
        .load_from_str("--- name:tuned chain:nope\nprop2: 1\n", "test.yml")
        .unwrap_err();
    assert!(matches!(err.root(), ConfigError::UnknownSection(name) if name == "nope"));
}

#[test]
fn test_numeric_strings_with_units() {
    let confs = loaded("prop2: 2.5.km.round\n");
    assert_eq!(confs.get("default").unwrap()["prop2"], Value::Int(2500));
}

#[test]
fn test_unknown_property_in_file() {
    let mut confs = TaskConfigurations::new(fixture_model());
    let err = confs.load_from_str("prop9: 1\n", "test.yml").unwrap_err();
    assert!(matches!(
        err.root(),
        ConfigError::UnknownProperty { property, .. } if property == "prop9"
    ));
    assert!(err.to_string().contains("while loading section default of test.yml"));
}

#[test]
fn test_malformed_header_reports_line() {
    let mut confs = TaskConfigurations::new(fixture_model());
    let err = confs
        .load_from_str("prop2: 1\n--- name:fast merge\n", "test.yml")
        .unwrap_err();
    assert!(matches!(err, ConfigError::Header { line: 2, .. }));
}

#[test]
fn test_conf_as_values_fills_unset_fields() {
    let confs = loaded(SECTIONS);
    let values = confs.conf_as_values(&["fast"], false).unwrap();
    assert_eq!(values["prop1"], prop1(1, 0));
}

#[test]
fn test_apply_keeps_unconfigured_fields() {
    let confs = loaded(SECTIONS);
    let mut task = fixture_task("task");
    confs.apply(&mut task, &["default", "fast"], false).unwrap();

    assert_eq!(task.property("prop1").unwrap(), &prop1(1, 42));
    assert_eq!(task.property("prop2").unwrap(), &Value::Int(10));
    assert_eq!(task.property("prop3").unwrap(), &Value::from("42"));
}

#[test]
fn test_apply_writes_with_one_timestamp() {
    let confs = loaded(SECTIONS);
    let mut task = fixture_task("task");
    confs.apply(&mut task, &["slow"], false).unwrap();

    let props = task.properties();
    let t1 = props.get("prop1").unwrap().last_write();
    let t3 = props.get("prop3").unwrap().last_write();
    assert!(t1.is_some());
    assert_eq!(t1, t3);
    assert_eq!(props.get("prop2").unwrap().last_write(), None);
}

#[test]
fn test_apply_missing_default_is_noop() {
    let confs = loaded("--- name:fast\nprop2: 1\n");
    let mut task = fixture_task("task");
    confs.apply(&mut task, &["default"], false).unwrap();
    assert_eq!(task.property("prop2").unwrap(), &Value::Int(84));
}

#[test]
fn test_apply_missing_section_fails() {
    let confs = loaded(SECTIONS);
    let mut task = fixture_task("task");
    let err = confs.apply(&mut task, &["default", "medium"], false).unwrap_err();
    assert!(matches!(err, ConfigError::NoConfiguration { ref sections, .. } if sections == "default, medium"));
}

#[test]
fn test_extract_stores_current_properties() {
    let mut confs = TaskConfigurations::new(fixture_model());
    let mut task = fixture_task("task");
    task.write_property("prop2", 7).unwrap();

    assert!(confs.extract("current", &task, false).unwrap());
    assert!(!confs.extract("current", &task, false).unwrap());
    assert_eq!(confs.get("current").unwrap(), &read_task_conf(&task));
}

#[test]
fn test_save_writes_documented_section() {
    let dir = conf_dir();
    let mut confs = TaskConfigurations::new(fixture_model());
    confs.extract("saved", &fixture_task("task"), false).unwrap();

    let (_, file) = confs.save("saved", dir.path()).unwrap();
    assert_eq!(file, dir.path().join("process::Test.yml"));

    let text = std::fs::read_to_string(&file).unwrap();
    assert!(text.starts_with("--- name:saved\n"));
    assert!(text.contains("# a struct property\nprop1:\n"));
    assert!(text.contains("# no documentation available for this property\nprop2: 84"));
    assert!(text.contains("# a string property\n# spanning two lines\nprop3:"));
}

#[test]
fn test_save_then_load_round_trip() {
    let dir = conf_dir();
    let file = dir.path().join("nested").join("task.yml");
    let mut task = fixture_task("task");
    task.write_property("prop1", prop1(5, 6)).unwrap();

    let mut confs = TaskConfigurations::new(fixture_model());
    confs.extract("first", &task, false).unwrap();
    confs.save("first", &file).unwrap();
    task.write_property("prop3", "changed").unwrap();
    confs.extract("second", &task, false).unwrap();
    confs.save("second", &file).unwrap();

    let mut reloaded = TaskConfigurations::new(fixture_model());
    let changed = reloaded.load_from_yaml(&file).unwrap();
    assert_eq!(changed, vec!["first", "second"]);
    assert_eq!(reloaded.get("first"), confs.get("first"));
    assert_eq!(reloaded.get("second").unwrap()["prop3"], Value::from("changed"));
}

#[test]
fn test_resolved_sections() {
    let confs = loaded(SECTIONS);
    let resolved = confs.resolved_sections().unwrap();
    let names: Vec<&str> = resolved.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, vec!["default", "fast", "slow"]);
    assert_eq!(resolved[0].1["prop2"], Value::Int(10));
}

#[test]
fn test_applied_task_summary_shows_values() {
    let confs = loaded(SECTIONS);
    let mut task = fixture_task("task");
    confs.apply(&mut task, &["default"], false).unwrap();
    assert!(TaskHandle::summary(&task).contains("prop2"));
}
