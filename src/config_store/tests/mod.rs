//! Unit tests for config_store module
//! No filesystem, timing, or external dependencies.

#![allow(clippy::panic, clippy::unwrap_used)]


use std::path::Path;

use crate::config_store::{ConfigError, ConfigPath, FileEvent, FileEventKinds, Value, parse_document};

fn parse(text: &str) -> Value {
    parse_document(text, Path::new("test.yml")).unwrap()
}

#[test]
fn empty_document_parses_to_empty_mapping() {
    assert_eq!(parse(""), Value::empty_mapping());
    assert_eq!(parse("   \n\n"), Value::empty_mapping());
    assert_eq!(parse("# only a comment\n"), Value::empty_mapping());
}

#[test]
fn parses_nested_document() {
    let tree = parse(
        r#"
server:
  host: localhost
  port: 8080
  ratio: 0.5
  tls: false
  peers:
    - a
    - b
"#,
    );

    let server = tree.as_mapping().unwrap()["server"].as_mapping().unwrap();
    assert_eq!(server["host"], Value::from("localhost"));
    assert_eq!(server["port"], Value::Integer(8080));
    assert_eq!(server["ratio"], Value::Float(0.5));
    assert_eq!(server["tls"], Value::Bool(false));
    assert_eq!(
        server["peers"],
        Value::Sequence(vec![Value::from("a"), Value::from("b")])
    );
}

#[test]
fn non_string_keys_are_stringified() {
    let tree = parse("1: one\ntrue: yes-key\n");
    let map = tree.as_mapping().unwrap();

    assert_eq!(map["1"], Value::from("one"));
    assert_eq!(map["true"], Value::from("yes-key"));
}

#[test]
fn non_mapping_root_is_accepted() {
    assert_eq!(
        parse("- a\n- b\n"),
        Value::Sequence(vec![Value::from("a"), Value::from("b")])
    );
    assert_eq!(parse("just a string"), Value::from("just a string"));
}

#[test]
fn invalid_yaml_is_a_parse_error() {
    let result = parse_document("foo: [unclosed\n", Path::new("broken.yml"));

    match result {
        Err(ConfigError::Parse { path, .. }) => assert_eq!(path, Path::new("broken.yml")),
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn bare_string_path_is_a_single_key() {
    let path = ConfigPath::from("server.port");

    assert_eq!(path.len(), 1);
    assert_eq!(path.keys(), ["server.port".to_string()]);
}

#[test]
fn path_conversions_preserve_key_order() {
    let expected = vec!["a".to_string(), "b".to_string(), "c".to_string()];

    assert_eq!(ConfigPath::from(["a", "b", "c"]).keys(), expected.as_slice());
    assert_eq!(ConfigPath::from(vec!["a", "b", "c"]).keys(), expected.as_slice());
    assert_eq!(ConfigPath::from(&["a", "b", "c"][..]).keys(), expected.as_slice());
    assert_eq!(ConfigPath::from(expected.clone()).keys(), expected.as_slice());
    assert_eq!(ConfigPath::from(["a", "b", "c"]).to_string(), "a.b.c");
}

#[test]
fn value_deserializes_into_typed_struct() {
    #[derive(serde::Deserialize, Debug, PartialEq)]
    struct Server {
        host: String,
        port: u16,
    }

    let tree = parse("host: example.org\nport: 443\n");
    let server: Server = tree.deserialize_into(&ConfigPath::default()).unwrap();

    assert_eq!(
        server,
        Server {
            host: "example.org".to_string(),
            port: 443
        }
    );
}

#[test]
fn value_type_mismatch_reports_path() {
    let value = Value::from("not a number");
    let err = value
        .deserialize_into::<u32>(&ConfigPath::from(["limits", "max"]))
        .unwrap_err();

    match err {
        ConfigError::TypeMismatch { path, .. } => assert_eq!(path, "limits.max"),
        other => panic!("expected type mismatch, got {other:?}"),
    }
}

#[test]
fn file_event_kinds_map_from_notify() {
    use notify::{
        EventKind,
        event::{AccessKind, CreateKind, DataChange, ModifyKind, RemoveKind, RenameMode},
    };

    assert_eq!(
        FileEventKinds::from_notify(&EventKind::Modify(ModifyKind::Data(DataChange::Any))),
        FileEventKinds::MODIFIED
    );
    assert_eq!(
        FileEventKinds::from_notify(&EventKind::Modify(ModifyKind::Name(RenameMode::Any))),
        FileEventKinds::RENAMED
    );
    assert_eq!(
        FileEventKinds::from_notify(&EventKind::Create(CreateKind::File)),
        FileEventKinds::CREATED
    );
    assert_eq!(
        FileEventKinds::from_notify(&EventKind::Remove(RemoveKind::File)),
        FileEventKinds::REMOVED
    );
    assert!(FileEventKinds::from_notify(&EventKind::Access(AccessKind::Any)).is_empty());
}

#[test]
fn file_event_concerns_matching_file_name() {
    let source = Path::new("/srv/app/config/app.yml");

    assert!(FileEvent::new("/srv/app/config/app.yml", FileEventKinds::MODIFIED).concerns(source));
    assert!(!FileEvent::new("/srv/app/config/other.yml", FileEventKinds::MODIFIED).concerns(source));

    let pathless = FileEvent {
        paths: Vec::new(),
        kinds: FileEventKinds::MODIFIED,
    };
    assert!(pathless.concerns(source));
}

#[test]
fn error_not_found_is_recognized() {
    let err = ConfigError::NotFound {
        path: "missing".to_string(),
    };
    assert!(err.is_not_found());
    assert!(!ConfigError::EmptyPath.is_not_found());
    assert_eq!(err.to_string(), "no config value at 'missing'");
}
