//! Root document, data services and reference parsers

use crate::de::{CsdlDeserialize, Deserializer, FieldTable, dispatch};
use crate::{Error, Result};
use edm_model::document::{RootDocumentExt, V4RootDocument};
use edm_model::{DataServices, Include, IncludeAnnotations, Reference, RootDocument};

pub(crate) static INCLUDE_FIELDS: &FieldTable<Include> = &[
    ("Namespace", |de, i| {
        i.namespace = de.read_string()?;
        Ok(())
    }),
    ("Alias", |de, i| {
        i.alias = Some(de.read_string()?);
        Ok(())
    }),
];

impl CsdlDeserialize for Include {
    const CONSTRUCT: &'static str = "Include";

    fn deserialize(de: &mut Deserializer<'_>) -> Result<Self> {
        let mut include = Include::default();
        de.read_object(Self::CONSTRUCT, |de, field| {
            dispatch(INCLUDE_FIELDS, de, field, &mut include)
        })?;
        Ok(include)
    }
}

pub(crate) static INCLUDE_ANNOTATIONS_FIELDS: &FieldTable<IncludeAnnotations> = &[
    ("TermNamespace", |de, i| {
        i.term_namespace = de.read_string()?;
        Ok(())
    }),
    ("Qualifier", |de, i| {
        i.qualifier = Some(de.read_string()?);
        Ok(())
    }),
    ("TargetNamespace", |de, i| {
        i.target_namespace = Some(de.read_string()?);
        Ok(())
    }),
];

impl CsdlDeserialize for IncludeAnnotations {
    const CONSTRUCT: &'static str = "IncludeAnnotations";

    fn deserialize(de: &mut Deserializer<'_>) -> Result<Self> {
        let mut include = IncludeAnnotations::default();
        de.read_object(Self::CONSTRUCT, |de, field| {
            dispatch(INCLUDE_ANNOTATIONS_FIELDS, de, field, &mut include)
        })?;
        Ok(include)
    }
}

pub(crate) static REFERENCE_FIELDS: &FieldTable<Reference> = &[
    ("Uri", |de, r| {
        r.uri = de.read_string()?;
        Ok(())
    }),
    ("Include", |de, r| {
        r.includes.push(de.parse()?);
        Ok(())
    }),
    ("IncludeAnnotations", |de, r| {
        r.include_annotations.push(de.parse()?);
        Ok(())
    }),
    ("Annotation", |de, r| {
        r.annotation = Some(de.parse()?);
        Ok(())
    }),
];

impl CsdlDeserialize for Reference {
    const CONSTRUCT: &'static str = "Reference";

    fn deserialize(de: &mut Deserializer<'_>) -> Result<Self> {
        let mut reference = Reference::default();
        de.read_object(Self::CONSTRUCT, |de, field| {
            dispatch(REFERENCE_FIELDS, de, field, &mut reference)
        })?;
        Ok(reference)
    }
}

pub(crate) static DATA_SERVICES_FIELDS: &FieldTable<DataServices> = &[
    ("DataServiceVersion", |de, d| {
        d.data_service_version = Some(de.read_string()?);
        Ok(())
    }),
    ("MaxDataServiceVersion", |de, d| {
        d.max_data_service_version = Some(de.read_string()?);
        Ok(())
    }),
    ("Schema", |de, d| {
        d.schemas.push(de.parse()?);
        Ok(())
    }),
];

impl CsdlDeserialize for DataServices {
    const CONSTRUCT: &'static str = "DataServices";

    fn deserialize(de: &mut Deserializer<'_>) -> Result<Self> {
        let mut data_services = DataServices::default();
        de.read_object(Self::CONSTRUCT, |de, field| {
            dispatch(DATA_SERVICES_FIELDS, de, field, &mut data_services)
        })?;
        Ok(data_services)
    }
}

pub(crate) static ROOT_DOCUMENT_FIELDS: &FieldTable<RootDocument> = &[("Version", |de, r| {
    r.version = de.read_string()?;
    Ok(())
})];

pub(crate) static V4_ROOT_DOCUMENT_FIELDS: &FieldTable<V4RootDocument> =
    &[("Reference", |de, r| {
        r.references.push(de.parse()?);
        Ok(())
    })];

impl CsdlDeserialize for RootDocument {
    const CONSTRUCT: &'static str = "Edmx";

    /// `DataServices` is required; a later occurrence replaces an earlier one.
    fn deserialize(de: &mut Deserializer<'_>) -> Result<Self> {
        let mut root = RootDocument::new(de.version());
        let mut has_data_services = false;

        de.read_object(Self::CONSTRUCT, |de, field| {
            if field == "DataServices" {
                root.data_services = de.parse()?;
                has_data_services = true;
                return Ok(true);
            }
            if dispatch(ROOT_DOCUMENT_FIELDS, de, field, &mut root)? {
                return Ok(true);
            }
            match &mut root.ext {
                RootDocumentExt::V3 => Ok(false),
                RootDocumentExt::V4(v4) => dispatch(V4_ROOT_DOCUMENT_FIELDS, de, field, v4),
            }
        })?;

        if !has_data_services {
            return Err(Error::MissingElement {
                path: Self::CONSTRUCT.to_string(),
                element: DataServices::CONSTRUCT.to_string(),
            });
        }
        Ok(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::XmlTokenizer;
    use edm_model::ProtocolVersion;

    fn parse_xml(xml: &str, version: ProtocolVersion) -> Result<RootDocument> {
        let mut tokens = XmlTokenizer::new(xml.as_bytes());
        let mut de = Deserializer::new(&mut tokens, version);
        de.parse()
    }

    const WITH_REFERENCE: &str = r#"<edmx:Edmx Version="4.0" xmlns:edmx="http://docs.oasis-open.org/odata/ns/edmx">
        <edmx:Reference Uri="https://oasis-tcs.github.io/odata-vocabularies/vocabularies/Org.OData.Core.V1.xml">
            <edmx:Include Namespace="Org.OData.Core.V1" Alias="Core"/>
            <edmx:IncludeAnnotations TermNamespace="Org.OData.Core.V1" Qualifier="Tablet"/>
        </edmx:Reference>
        <edmx:DataServices>
            <Schema Namespace="Trip"/>
        </edmx:DataServices>
    </edmx:Edmx>"#;

    #[test]
    fn test_v4_root_keeps_references() {
        let root = parse_xml(WITH_REFERENCE, ProtocolVersion::V4).unwrap();
        assert_eq!(root.version, "4.0");
        assert_eq!(root.protocol_version(), ProtocolVersion::V4);
        let reference = &root.references()[0];
        assert_eq!(reference.includes[0].alias.as_deref(), Some("Core"));
        assert_eq!(
            reference.include_annotations[0].qualifier.as_deref(),
            Some("Tablet")
        );
        assert_eq!(root.schemas()[0].namespace, "Trip");
    }

    #[test]
    fn test_v3_root_ignores_references() {
        let root = parse_xml(WITH_REFERENCE, ProtocolVersion::V3).unwrap();
        assert!(root.references().is_empty());
        assert_eq!(root.schemas().len(), 1);
    }

    #[test]
    fn test_missing_data_services() {
        let result = parse_xml(r#"<Edmx Version="1.0"></Edmx>"#, ProtocolVersion::V3);
        assert!(matches!(
            result,
            Err(Error::MissingElement { ref element, .. }) if element == "DataServices"
        ));
    }

    #[test]
    fn test_service_versions() {
        let root = parse_xml(
            r#"<Edmx Version="1.0"><DataServices DataServiceVersion="3.0" MaxDataServiceVersion="3.0">
                <Schema Namespace="A"/><Schema Namespace="B"/>
            </DataServices></Edmx>"#,
            ProtocolVersion::V3,
        )
        .unwrap();
        assert_eq!(root.data_services.data_service_version.as_deref(), Some("3.0"));
        assert_eq!(root.schemas().len(), 2);
    }
}
