//! Generated and canonical accessor tests.

use visor::{Error, FieldMapperDelegate, MapperKind, Ranking};

fn three_levels() -> Ranking {
    Ranking::new(["low", "medium", "high"]).unwrap()
}

/// A custom ranking generates three accessors per level.
#[test]
fn custom_ranking_generates_accessors() {
    let delegate = FieldMapperDelegate::with_ranking("x", three_levels());
    let mut names: Vec<&str> = delegate.accessor_names().collect();
    names.sort_unstable();

    let mut expected = vec![
        "whenLow",
        "whenMedium",
        "whenHigh",
        "restrictToLow",
        "restrictToMedium",
        "restrictToHigh",
        "atOrAboveLow",
        "atOrAboveMedium",
        "atOrAboveHigh",
    ];
    expected.sort_unstable();
    assert_eq!(names, expected);
}

/// `restrictToMedium` behaves like `restrict_to("medium")`.
#[test]
fn generated_accessor_matches_selection() {
    let mut delegate = FieldMapperDelegate::with_ranking("x", three_levels());
    let selector = delegate.accessor("restrictToMedium").unwrap();
    assert_eq!(selector.selection().sole_index(), Some(1));
    selector.passthrough();

    assert!(delegate.slot("low").unwrap().is_denied());
    assert!(delegate.slot("high").unwrap().is_denied());
    assert_eq!(
        delegate.mapper("medium").unwrap().kind(),
        MapperKind::Passthrough
    );
}

/// Canonical accessors refuse to run on a custom ranking.
#[test]
fn canonical_accessors_rejected_on_custom_ranking() {
    let mut delegate = FieldMapperDelegate::with_ranking("x", three_levels());
    for result in [
        delegate.when_public().err(),
        delegate.when_private().err(),
        delegate.restrict_to_public().err(),
        delegate.restrict_to_private().err(),
        delegate.at_or_above_public().err(),
        delegate.at_or_above_private().err(),
    ] {
        assert!(matches!(
            result,
            Some(Error::UnsupportedDefaultAccessor { .. })
        ));
    }
}

/// A custom ranking equal to the canonical one is still a custom ranking.
#[test]
fn canonical_accessors_rejected_on_explicit_canonical_ranking() {
    let mut delegate = FieldMapperDelegate::with_ranking("x", Ranking::default());
    assert!(matches!(
        delegate.default_accessor("whenPrivate").err(),
        Some(Error::UnsupportedDefaultAccessor { ref accessor }) if accessor == "whenPrivate"
    ));
    assert!(delegate.accessor("whenPrivate").is_ok());
}

/// Canonical accessors work on a default-ranking delegate.
#[test]
fn canonical_accessors_on_default_ranking() {
    let mut delegate = FieldMapperDelegate::new("x");
    delegate.when_private().unwrap().passthrough();

    assert!(delegate.slot("public").unwrap().is_denied());
    assert!(delegate.mapper("private").is_some());
}

/// Names outside the canonical table are unknown, not unsupported.
#[test]
fn unknown_default_accessor() {
    let mut delegate = FieldMapperDelegate::new("x");
    assert!(matches!(
        delegate.default_accessor("whenAdmin").err(),
        Some(Error::UnknownAccessor(_))
    ));
}
