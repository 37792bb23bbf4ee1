use pir_core::ir::{
    Attribute, AttributeKind, AttributeMeta, CollectionAttribute, Computability, ElementType,
    NestedAttributeObject, NestedCollectionAttribute, ScalarAttribute, SingleNestedAttribute,
    StaticDefault,
};
use pir_core::transform::{merge_attributes, merge_element_types};

fn meta(computability: Computability, description: Option<&str>) -> AttributeMeta {
    let mut meta = AttributeMeta::new(computability);
    meta.description = description.map(str::to_string);
    meta
}

fn string(name: &str, computability: Computability, description: Option<&str>) -> Attribute {
    Attribute::new(
        name,
        AttributeKind::String(ScalarAttribute::new(meta(computability, description))),
    )
}

fn names(attributes: &[Attribute]) -> Vec<&str> {
    attributes.iter().map(|a| a.name.as_str()).collect()
}

#[test]
fn first_non_empty_description_wins() {
    let merged = merge_attributes(
        vec![string("id", Computability::Required, Some(""))],
        [
            vec![string("id", Computability::Computed, Some("B"))],
            vec![string("id", Computability::Computed, Some("C"))],
        ],
    );
    assert_eq!(merged[0].description(), Some("B"));
}

#[test]
fn target_keeps_computability_and_default() {
    let mut with_default = ScalarAttribute::new(meta(Computability::ComputedOptional, None));
    with_default.default = Some(StaticDefault {
        value: "a".to_string(),
    });
    let target = vec![Attribute::new("mode", AttributeKind::String(with_default))];

    let mut other = ScalarAttribute::new(meta(Computability::Computed, Some("The mode")));
    other.default = Some(StaticDefault {
        value: "b".to_string(),
    });
    let source = vec![Attribute::new("mode", AttributeKind::String(other))];

    let merged = merge_attributes(target, [source]);
    match &merged[0].kind {
        AttributeKind::String(mode) => {
            assert_eq!(mode.meta.computability, Computability::ComputedOptional);
            assert_eq!(mode.meta.description.as_deref(), Some("The mode"));
            assert_eq!(mode.default.as_ref().map(|d| d.value.as_str()), Some("a"));
        }
        other => panic!("expected string, got {}", other.variant_name()),
    }
}

#[test]
fn unmatched_names_append_in_source_order() {
    let merged = merge_attributes(
        vec![string("a", Computability::Required, None)],
        [
            vec![string("b", Computability::Computed, None)],
            vec![
                string("c", Computability::Computed, None),
                string("a", Computability::Computed, None),
            ],
        ],
    );
    assert_eq!(names(&merged), ["a", "b", "c"]);
}

#[test]
fn empty_sources_leave_target_unchanged() {
    let target = vec![string("a", Computability::Required, Some("x"))];
    let merged = merge_attributes(target.clone(), [Vec::new(), Vec::new()]);
    assert_eq!(merged, target);
}

#[test]
fn nested_attributes_merge_recursively() {
    let owner = |attributes: Vec<Attribute>, description: Option<&str>| {
        Attribute::new(
            "owner",
            AttributeKind::SingleNested(SingleNestedAttribute {
                meta: meta(Computability::Computed, description),
                attributes,
            }),
        )
    };
    let merged = merge_attributes(
        vec![owner(vec![string("name", Computability::Required, None)], None)],
        [vec![owner(
            vec![
                string("email", Computability::Computed, None),
                string("name", Computability::Computed, Some("Owner name")),
            ],
            Some("The owner"),
        )]],
    );

    assert_eq!(merged[0].description(), Some("The owner"));
    let nested = merged[0].kind.nested_attributes().unwrap();
    assert_eq!(names(nested), ["name", "email"]);
    assert_eq!(nested[0].computability(), Computability::Required);
    assert_eq!(nested[0].description(), Some("Owner name"));
}

#[test]
fn list_nested_members_merge_recursively() {
    let rules = |attributes: Vec<Attribute>| {
        Attribute::new(
            "rules",
            AttributeKind::ListNested(NestedCollectionAttribute {
                meta: meta(Computability::ComputedOptional, None),
                nested_object: NestedAttributeObject { attributes },
            }),
        )
    };
    let merged = merge_attributes(
        vec![rules(vec![string("port", Computability::Required, None)])],
        [vec![rules(vec![string("id", Computability::Computed, None)])]],
    );
    assert!(Attribute::find(&merged, "rules.port").is_some());
    assert!(Attribute::find(&merged, "rules.id").is_some());
}

#[test]
fn list_of_object_elements_union_fields() {
    let target = ElementType::list(ElementType::Object(vec![
        ("id".to_string(), ElementType::String),
        ("size".to_string(), ElementType::Int64),
    ]));
    let source = ElementType::list(ElementType::Object(vec![
        ("size".to_string(), ElementType::String),
        ("color".to_string(), ElementType::String),
    ]));

    assert_eq!(
        merge_element_types(target, source),
        ElementType::list(ElementType::Object(vec![
            ("id".to_string(), ElementType::String),
            ("size".to_string(), ElementType::Int64),
            ("color".to_string(), ElementType::String),
        ]))
    );
}

#[test]
fn collection_attributes_merge_element_types() {
    let tags = |element_type: ElementType| {
        Attribute::new(
            "tags",
            AttributeKind::Set(CollectionAttribute {
                meta: meta(Computability::Optional, None),
                element_type,
            }),
        )
    };
    let merged = merge_attributes(
        vec![tags(ElementType::Object(vec![(
            "key".to_string(),
            ElementType::String,
        )]))],
        [vec![tags(ElementType::Object(vec![(
            "value".to_string(),
            ElementType::String,
        )]))]],
    );
    assert_eq!(
        merged[0].kind.element_type(),
        Some(&ElementType::Object(vec![
            ("key".to_string(), ElementType::String),
            ("value".to_string(), ElementType::String),
        ]))
    );
}

#[test]
fn variant_mismatch_keeps_target() {
    let target = vec![string("count", Computability::Required, None)];
    let source = vec![Attribute::new(
        "count",
        AttributeKind::Int64(ScalarAttribute::new(meta(
            Computability::Computed,
            Some("How many"),
        ))),
    )];
    let merged = merge_attributes(target.clone(), [source]);
    // a mismatched source contributes nothing, not even its description
    assert_eq!(merged, target);
}
