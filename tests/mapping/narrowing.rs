//! Selection and narrowing tests.
//!
//! Verifies which slots each builder chain grants or denies, and that
//! shared mappers are shared by reference.

use std::sync::Arc;

use visor::{
    BoxFuture, Error, FieldMapperDelegate, Level, MapperKind, Ranking, Result, Transform,
    TransformerRef, Value, json,
};

/// Returns the nested instance untouched.
struct Identity;

impl Transform for Identity {
    fn name(&self) -> &str {
        "identity"
    }

    fn transform<'a>(
        &'a self,
        _level: &'a Level,
        instance: &'a Value,
    ) -> BoxFuture<'a, Result<Value>> {
        Box::pin(std::future::ready(Ok(instance.clone())))
    }
}

fn identity() -> TransformerRef {
    TransformerRef::direct(Arc::new(Identity))
}

fn three_levels() -> Ranking {
    Ranking::new(["low", "medium", "high"]).unwrap()
}

fn kinds(delegate: &FieldMapperDelegate) -> Vec<Option<MapperKind>> {
    delegate
        .ranking()
        .iter()
        .map(|level| delegate.mapper(level).map(|m| m.kind()))
        .collect()
}

fn bound(level: &str) -> Option<MapperKind> {
    Some(MapperKind::SubTransform {
        level: Level::from(level),
    })
}

/// `always().build(..)` installs one custom mapper on every level.
#[test]
fn always_custom_shares_one_mapper() {
    let mut delegate = FieldMapperDelegate::with_ranking("score", three_levels());
    delegate.always().build(|_, _, _| Ok(json!(0)));

    let first = delegate.mapper("low").unwrap().clone();
    for level in ["low", "medium", "high"] {
        let mapper = delegate.mapper(level).unwrap();
        assert_eq!(mapper.kind(), MapperKind::Custom);
        assert!(Arc::ptr_eq(mapper, &first));
    }
}

/// A sub-transform at an explicit level is one mapper shared by every slot.
#[test]
fn fixed_sub_transform_shares_one_mapper() {
    let mut delegate = FieldMapperDelegate::new("author");
    delegate
        .always()
        .sub_transform_at(identity(), "private")
        .unwrap();

    let public = delegate.mapper("public").unwrap();
    let private = delegate.mapper("private").unwrap();
    assert!(Arc::ptr_eq(public, private));
    assert_eq!(public.kind(), bound("private").unwrap());
}

/// Without an explicit level every slot gets its own mapper bound to that slot's level.
#[test]
fn cascading_sub_transform_binds_each_level() {
    let mut delegate = FieldMapperDelegate::with_ranking("author", three_levels());
    delegate.always().sub_transform(identity());

    assert_eq!(
        kinds(&delegate),
        [bound("low"), bound("medium"), bound("high")]
    );
    let low = delegate.mapper("low").unwrap();
    let high = delegate.mapper("high").unwrap();
    assert!(!Arc::ptr_eq(low, high));
}

/// A cascading sub-transform ignores the `when` level and fills every slot.
#[test]
fn when_sub_transform_fills_every_slot() {
    let mut delegate = FieldMapperDelegate::with_ranking("author", three_levels());
    delegate.when("medium").sub_transform(identity());
    assert_eq!(delegate.granted_levels().len(), 3);
}

/// Cutoff narrowing still applies after a sub-transform populated every slot.
#[test]
fn at_or_above_narrows_sub_transform() {
    let mut delegate = FieldMapperDelegate::with_ranking("author", three_levels());
    delegate.at_or_above("medium").unwrap().sub_transform(identity());

    assert_eq!(kinds(&delegate), [None, bound("medium"), bound("high")]);
}

/// Sole narrowing of a cascade keeps the selected level's own bound mapper.
#[test]
fn restrict_to_narrows_cascading_sub_transform() {
    let mut delegate = FieldMapperDelegate::with_ranking("author", three_levels());
    delegate.restrict_to("medium").unwrap().sub_transform(identity());

    assert_eq!(kinds(&delegate), [None, bound("medium"), None]);
}

/// Sole narrowing keeps only the selected level's fixed sub-transform.
#[test]
fn restrict_to_narrows_fixed_sub_transform() {
    let mut delegate = FieldMapperDelegate::with_ranking("author", three_levels());
    delegate
        .restrict_to("high")
        .unwrap()
        .sub_transform_at(identity(), "low")
        .unwrap();

    assert_eq!(kinds(&delegate), [None, None, bound("low")]);
}

/// `restrict_to(private)` on the canonical ranking denies public.
#[test]
fn restrict_to_private_passthrough() {
    let mut delegate = FieldMapperDelegate::new("email");
    delegate.restrict_to("private").unwrap().passthrough();

    assert!(delegate.slot("public").unwrap().is_denied());
    assert_eq!(
        delegate.mapper("private").unwrap().kind(),
        MapperKind::Passthrough
    );
}

/// An explicit sub-transform level must belong to the ranking.
#[test]
fn fixed_sub_transform_unknown_level_fails() {
    let mut delegate = FieldMapperDelegate::new("author");
    let result = delegate.always().sub_transform_at(identity(), "admin");
    assert!(matches!(
        result.err(),
        Some(Error::UnknownPermissionLevel { ref level }) if level == "admin"
    ));
    assert!(delegate.granted_levels().is_empty());
}

/// Later chains override earlier ones only where they write.
#[test]
fn chains_compose() {
    let mut delegate = FieldMapperDelegate::with_ranking("bio", three_levels());
    delegate.at_or_above("medium").unwrap().passthrough();
    delegate.when("low").build(|_, _, _| Ok(json!("hidden")));

    assert_eq!(
        kinds(&delegate),
        [
            Some(MapperKind::Custom),
            Some(MapperKind::Passthrough),
            Some(MapperKind::Passthrough)
        ]
    );
}
