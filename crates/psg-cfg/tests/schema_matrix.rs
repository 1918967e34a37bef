use proptest::prelude::*;
use psg_cfg::{
    psg, BoolField, Catalog, CfgError, Element, Field, FloatField, IntField, ListField, Model,
    NumberFormat, ParseOptions, Quantity, RootConfig, StrField, Unit, UnknownTokenPolicy, Value,
};

fn toy() -> RootConfig {
    let inner = Model::builder("inner", "IN")
        .field(Field::new("flag", "FLAG", BoolField::new()))
        .build()
        .unwrap();
    let outer = Model::builder("outer", "OUT")
        .model(inner)
        .field(Field::new("count", "COUNT", IntField::new()).with_default(3))
        .field(Field::new("label", "LABEL", StrField::new()).required())
        .build()
        .unwrap();
    RootConfig::new(vec![outer]).unwrap()
}

// -----------------------------------------------------------------------------
// Schema assembly
// -----------------------------------------------------------------------------

#[test]
fn duplicate_qualified_keys_are_rejected_matrix() {
    let nested = Model::builder("star", "STAR")
        .field(Field::new("distance", "DISTANCE", FloatField::new()))
        .build()
        .unwrap();
    let err = Model::builder("target", "OBJECT")
        .model(nested)
        .field(Field::new("star_distance", "STAR-DISTANCE", FloatField::new()))
        .build()
        .unwrap_err();
    assert_eq!(
        err,
        CfgError::DuplicateSchemaKey {
            key: "OBJECT-STAR-DISTANCE".into()
        }
    );

    let a = Model::builder("a", "SURFACE")
        .field(Field::new("t", "TEMPERATURE", FloatField::new()))
        .build()
        .unwrap();
    let b = Model::builder("b", "SURFACE-TEMPERATURE")
        .field(Field::new("t", "", FloatField::new()))
        .build()
        .unwrap();
    assert!(matches!(
        RootConfig::new(vec![a, b]),
        Err(CfgError::DuplicateSchemaKey { .. })
    ));
}

#[test]
fn invalid_default_fails_build_matrix() {
    let err = Model::builder("m", "M")
        .field(Field::new("n", "N", IntField::new()).with_default("three"))
        .build()
        .unwrap_err();
    assert!(matches!(err, CfgError::InvalidValue { .. }));
}

// -----------------------------------------------------------------------------
// Null policy and defaults
// -----------------------------------------------------------------------------

#[test]
fn required_and_default_fields_matrix() {
    let mut cfg = toy();
    assert_eq!(
        cfg.to_text(),
        Err(CfgError::MissingRequiredField {
            key: "OUT-LABEL".into()
        })
    );

    cfg.set("outer.label", "x").unwrap();
    assert_eq!(cfg.to_text().unwrap(), b"OUT-COUNT=3\nOUT-LABEL=x");

    cfg.set("outer.inner.flag", true).unwrap();
    cfg.set("outer.count", 9).unwrap();
    assert_eq!(
        cfg.to_text().unwrap(),
        b"OUT-IN-FLAG=Y\nOUT-COUNT=9\nOUT-LABEL=x"
    );

    let mut back = toy();
    back.read_text(b"OUT-LABEL=y", &ParseOptions::default()).unwrap();
    assert_eq!(back.get("outer.count"), Some(&Value::Int(3)));
    assert_eq!(back.get("outer.inner.flag"), None);

    let err = back.read_text(b"OUT-COUNT=1", &ParseOptions::default()).unwrap_err();
    assert_eq!(
        err.leaves(),
        vec![&CfgError::MissingRequiredField {
            key: "OUT-LABEL".into()
        }]
    );
}

#[test]
fn unset_and_clear_matrix() {
    let mut cfg = toy();
    cfg.set("outer.label", "x").unwrap();
    cfg.unset("outer.count").unwrap();
    assert_eq!(cfg.to_text().unwrap(), b"OUT-LABEL=x");
    cfg.clear();
    assert!(cfg.is_empty());
    assert!(matches!(cfg.unset("outer.missing"), Err(CfgError::UnknownField { .. })));
    assert!(matches!(cfg.set("nowhere.x", 1), Err(CfgError::UnknownField { .. })));
}

// -----------------------------------------------------------------------------
// Catalog policy
// -----------------------------------------------------------------------------

#[test]
fn passthrough_tokens_survive_round_trip_matrix() {
    let catalog = Catalog::psg().with_token_policy(UnknownTokenPolicy::Passthrough);
    let mut cfg = psg::root(&catalog).unwrap();
    cfg.read_text(b"OBJECT=Dwarf", &ParseOptions::default()).unwrap();
    assert_eq!(cfg.get("target.object"), Some(&Value::Token("Dwarf".into())));
    assert_eq!(cfg.to_text().unwrap(), b"OBJECT=Dwarf");

    let strict = RootConfig::from_text(b"OBJECT=Dwarf");
    assert!(strict.is_err());
}

#[test]
fn catalog_without_entries_cannot_build_schema_matrix() {
    let err = psg::root(&Catalog::new()).unwrap_err();
    assert!(matches!(err, CfgError::MissingCatalogEntry { .. }));
}

// -----------------------------------------------------------------------------
// Properties
// -----------------------------------------------------------------------------

proptest! {
    #[test]
    fn quantities_round_trip_through_text(km in 1.0f64..1.0e6, deg in -360.0f64..360.0) {
        let mut cfg = RootConfig::psg().unwrap();
        cfg.set("target.diameter", Quantity::new(km * 1000.0, Unit::parse("m").unwrap())).unwrap();
        cfg.set("target.season", Quantity::new(deg, Unit::parse("deg").unwrap())).unwrap();
        let bytes = cfg.to_text().unwrap();
        let back = RootConfig::from_text(&bytes).unwrap();
        prop_assert_eq!(&back, &cfg);
        prop_assert_eq!(back.to_text().unwrap(), bytes);
    }

    #[test]
    fn float_lists_round_trip(values in prop::collection::vec(-1.0e6f64..1.0e6, 0..8)) {
        let mut cfg = RootConfig::new(vec![
            Model::builder("m", "M")
                .field(Field::new(
                    "xs",
                    "XS",
                    ListField::new(Element::Float(NumberFormat::Scientific(3))),
                ))
                .build()
                .unwrap(),
        ])
        .unwrap();
        cfg.set("m.xs", Value::List(values.iter().copied().map(Value::Float).collect())).unwrap();
        let bytes = cfg.to_text().unwrap();
        let mut back = RootConfig::new(vec![cfg.model("m").unwrap().clone()]).unwrap();
        back.clear();
        back.read_text(&bytes, &ParseOptions::default()).unwrap();
        prop_assert_eq!(back.get("m.xs").and_then(Value::as_list).map(<[Value]>::len), Some(values.len()));
        prop_assert_eq!(back.to_text().unwrap(), bytes);
    }
}
