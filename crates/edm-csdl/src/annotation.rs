//! Annotation and annotation group parsers

use crate::Result;
use crate::de::{CsdlDeserialize, Deserializer, FieldTable, dispatch};
use edm_model::annotation::{
    AnnotationExpression, AnnotationsGroupExt, V3AnnotationsGroup, V4AnnotationsGroup,
};
use edm_model::{Annotation, AnnotationsGroup};

pub(crate) static ANNOTATION_FIELDS: &FieldTable<Annotation> = &[
    ("Term", |de, a| {
        a.term = de.read_string()?;
        Ok(())
    }),
    ("Qualifier", |de, a| {
        a.qualifier = Some(de.read_string()?);
        Ok(())
    }),
];

/// Any field besides the term and qualifier is the annotation's expression.
/// Only the first one is kept; nested annotations are not expressions.
impl CsdlDeserialize for Annotation {
    const CONSTRUCT: &'static str = "Annotation";

    fn deserialize(de: &mut Deserializer<'_>) -> Result<Self> {
        let mut annotation = Annotation::default();
        de.read_object(Self::CONSTRUCT, |de, field| {
            if dispatch(ANNOTATION_FIELDS, de, field, &mut annotation)? {
                return Ok(true);
            }
            if field == "Annotation" || annotation.expression.is_some() {
                return Ok(false);
            }
            let value = de.capture_raw()?;
            annotation.expression = Some(AnnotationExpression {
                kind: field.to_string(),
                value,
            });
            Ok(true)
        })?;
        Ok(annotation)
    }
}

pub(crate) static ANNOTATIONS_GROUP_FIELDS: &FieldTable<AnnotationsGroup> = &[
    ("Target", |de, g| {
        g.target = de.read_string()?;
        Ok(())
    }),
    ("Qualifier", |de, g| {
        g.qualifier = Some(de.read_string()?);
        Ok(())
    }),
];

pub(crate) static V3_ANNOTATIONS_GROUP_FIELDS: &FieldTable<V3AnnotationsGroup> = &[
    ("ValueAnnotation", |de, g| {
        g.value_annotations.push(de.parse()?);
        Ok(())
    }),
    ("TypeAnnotation", |de, g| {
        g.type_annotations.push(de.parse()?);
        Ok(())
    }),
];

pub(crate) static V4_ANNOTATIONS_GROUP_FIELDS: &FieldTable<V4AnnotationsGroup> =
    &[("Annotation", |de, g| {
        g.annotations.push(de.parse()?);
        Ok(())
    })];

impl CsdlDeserialize for AnnotationsGroup {
    const CONSTRUCT: &'static str = "Annotations";

    fn deserialize(de: &mut Deserializer<'_>) -> Result<Self> {
        let mut group = AnnotationsGroup::new(de.version());
        de.read_object(Self::CONSTRUCT, |de, field| {
            if dispatch(ANNOTATIONS_GROUP_FIELDS, de, field, &mut group)? {
                return Ok(true);
            }
            match &mut group.ext {
                AnnotationsGroupExt::V3(v3) => dispatch(V3_ANNOTATIONS_GROUP_FIELDS, de, field, v3),
                AnnotationsGroupExt::V4(v4) => dispatch(V4_ANNOTATIONS_GROUP_FIELDS, de, field, v4),
            }
        })?;
        Ok(group)
    }
}
