use crate::ir::{Attribute, AttributeKind, AttributeMeta, ElementType};

/// Two sources disagreed on the shape of the same attribute. The
/// higher-priority shape was kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeMismatch {
    pub path: String,
    pub target: &'static str,
    pub source: &'static str,
}

/// Fold priority-ordered attribute lists into `target`.
///
/// Matched names keep the target's position; unmatched names are appended
/// in encounter order. Only missing descriptions are filled from lower
/// priority sources. Shape mismatches keep the target unchanged.
pub fn merge_attributes<I>(target: Vec<Attribute>, sources: I) -> Vec<Attribute>
where
    I: IntoIterator<Item = Vec<Attribute>>,
{
    merge_attributes_with(target, sources, |_| {})
}

/// Like [`merge_attributes`], reporting each shape mismatch to `on_mismatch`.
pub fn merge_attributes_with<I, F>(
    mut target: Vec<Attribute>,
    sources: I,
    mut on_mismatch: F,
) -> Vec<Attribute>
where
    I: IntoIterator<Item = Vec<Attribute>>,
    F: FnMut(&MergeMismatch),
{
    for source in sources {
        merge_list(&mut target, source, "", &mut on_mismatch);
    }
    target
}

/// Structural union of two element types; any pairing other than
/// same-variant peers keeps `target`.
pub fn merge_element_types(mut target: ElementType, source: ElementType) -> ElementType {
    merge_element_type(&mut target, source, "", &mut |_: &MergeMismatch| {});
    target
}

type Observer<'o> = dyn FnMut(&MergeMismatch) + 'o;

fn merge_list(
    target: &mut Vec<Attribute>,
    source: Vec<Attribute>,
    prefix: &str,
    observer: &mut Observer<'_>,
) {
    for attribute in source {
        match target.iter_mut().find(|t| t.name == attribute.name) {
            Some(existing) => {
                let path = join(prefix, &attribute.name);
                merge_attribute(existing, attribute, &path, observer);
            }
            None => target.push(attribute),
        }
    }
}

fn merge_attribute(
    target: &mut Attribute,
    source: Attribute,
    path: &str,
    observer: &mut Observer<'_>,
) {
    let target_variant = target.kind.variant_name();
    let source_variant = source.kind.variant_name();
    if target_variant != source_variant {
        observer(&MergeMismatch {
            path: path.to_string(),
            target: target_variant,
            source: source_variant,
        });
        return;
    }

    fill_description(target.kind.meta_mut(), source.kind.meta());

    match (&mut target.kind, source.kind) {
        (AttributeKind::SingleNested(t), AttributeKind::SingleNested(s)) => {
            merge_list(&mut t.attributes, s.attributes, path, observer);
        }
        (AttributeKind::ListNested(t), AttributeKind::ListNested(s))
        | (AttributeKind::SetNested(t), AttributeKind::SetNested(s))
        | (AttributeKind::MapNested(t), AttributeKind::MapNested(s)) => {
            merge_list(
                &mut t.nested_object.attributes,
                s.nested_object.attributes,
                path,
                observer,
            );
        }
        (AttributeKind::List(t), AttributeKind::List(s))
        | (AttributeKind::Set(t), AttributeKind::Set(s))
        | (AttributeKind::Map(t), AttributeKind::Map(s)) => {
            merge_element_type(&mut t.element_type, s.element_type, path, observer);
        }
        _ => {}
    }
}

fn merge_element_type(
    target: &mut ElementType,
    source: ElementType,
    path: &str,
    observer: &mut Observer<'_>,
) {
    match (target, source) {
        (ElementType::List(t), ElementType::List(s))
        | (ElementType::Set(t), ElementType::Set(s))
        | (ElementType::Map(t), ElementType::Map(s)) => {
            merge_element_type(t.as_mut(), *s, path, observer);
        }
        (ElementType::Object(fields), ElementType::Object(source_fields)) => {
            for (name, element_type) in source_fields {
                match fields.iter_mut().find(|(existing, _)| *existing == name) {
                    Some((_, existing)) => {
                        let path = join(path, &name);
                        merge_element_type(existing, element_type, &path, observer);
                    }
                    None => fields.push((name, element_type)),
                }
            }
        }
        (t, s) if t.variant_name() != s.variant_name() => observer(&MergeMismatch {
            path: path.to_string(),
            target: t.variant_name(),
            source: s.variant_name(),
        }),
        _ => {}
    }
}

/// First non-empty description wins.
fn fill_description(target: &mut AttributeMeta, source: &AttributeMeta) {
    let Some(description) = source.description.as_deref().filter(|d| !d.is_empty()) else {
        return;
    };
    if target.description.as_deref().is_none_or(str::is_empty) {
        target.description = Some(description.to_string());
    }
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}
