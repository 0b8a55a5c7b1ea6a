//! Configuration-driven ranking tests.

use std::io::Write;

use visor::config::Loader;
use visor::{Error, Level, json};

/// A ranking loaded from TOML drives delegates and records.
#[tokio::test]
async fn file_ranking_drives_records() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[ranking]
levels = ["guest", "member", "moderator"]
"#
    )
    .unwrap();

    let config = Loader::new("MAPCFG").load(Some(file.path()), None).unwrap();
    let mut comment = config.record("comment").unwrap();
    comment.field("body").always().passthrough();
    comment
        .field("ip")
        .accessor("restrictToModerator")
        .unwrap()
        .passthrough();

    let source = json!({ "body": "hi", "ip": "10.0.0.1" });
    let guest = comment.serialize(&Level::from("guest"), &source).await.unwrap();
    assert_eq!(guest, json!({ "body": "hi" }));

    let moderator = comment
        .serialize(&Level::from("moderator"), &source)
        .await
        .unwrap();
    assert_eq!(moderator, json!({ "body": "hi", "ip": "10.0.0.1" }));
}

/// Canonical accessors stay off on a configured custom ranking.
#[test]
fn configured_custom_ranking_rejects_canonical_accessors() {
    let config = Loader::new("MAPCFG2").load(None, Some("a,b")).unwrap();
    let mut delegate = config.delegate("x").unwrap();
    assert!(matches!(
        delegate.when_private().err(),
        Some(Error::UnsupportedDefaultAccessor { .. })
    ));
}

/// An empty ranking override is a configuration error.
#[test]
fn empty_ranking_rejected() {
    let err = Loader::new("MAPCFG3").load(None, Some(" , ")).unwrap_err();
    assert!(err.is_configuration());
    assert!(err.to_string().contains("at least one level"));
}
