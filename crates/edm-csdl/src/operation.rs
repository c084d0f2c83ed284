//! Parsers for operations, their parameters and V4 type definitions

use crate::Result;
use crate::de::{CsdlDeserialize, Deserializer, FieldTable, dispatch};
use edm_model::schema::{Parameter, ReturnType};
use edm_model::{Action, Function, TypeDefinition};

pub(crate) static PARAMETER_FIELDS: &FieldTable<Parameter> = &[
    ("Name", |de, p| {
        p.name = de.read_string()?;
        Ok(())
    }),
    ("Type", |de, p| {
        p.type_name = de.read_string()?;
        Ok(())
    }),
    ("Nullable", |de, p| {
        p.nullable = de.read_bool()?;
        Ok(())
    }),
    ("MaxLength", |de, p| {
        p.max_length = Some(de.read_parsed("MaxLength")?);
        Ok(())
    }),
    ("Precision", |de, p| {
        p.precision = Some(de.read_parsed("Precision")?);
        Ok(())
    }),
    ("Scale", |de, p| {
        p.scale = Some(de.read_parsed("Scale")?);
        Ok(())
    }),
    ("SRID", |de, p| {
        p.srid = Some(de.read_string()?);
        Ok(())
    }),
    ("Mode", |de, p| {
        p.mode = Some(de.read_string()?);
        Ok(())
    }),
];

impl CsdlDeserialize for Parameter {
    const CONSTRUCT: &'static str = "Parameter";

    fn deserialize(de: &mut Deserializer<'_>) -> Result<Self> {
        let mut parameter = Parameter::default();
        de.read_object(Self::CONSTRUCT, |de, field| {
            dispatch(PARAMETER_FIELDS, de, field, &mut parameter)
        })?;
        Ok(parameter)
    }
}

pub(crate) static RETURN_TYPE_FIELDS: &FieldTable<ReturnType> = &[
    ("Type", |de, r| {
        r.type_name = de.read_string()?;
        Ok(())
    }),
    ("Nullable", |de, r| {
        r.nullable = de.read_bool()?;
        Ok(())
    }),
    ("MaxLength", |de, r| {
        r.max_length = Some(de.read_parsed("MaxLength")?);
        Ok(())
    }),
    ("Precision", |de, r| {
        r.precision = Some(de.read_parsed("Precision")?);
        Ok(())
    }),
    ("Scale", |de, r| {
        r.scale = Some(de.read_parsed("Scale")?);
        Ok(())
    }),
    ("SRID", |de, r| {
        r.srid = Some(de.read_string()?);
        Ok(())
    }),
];

impl CsdlDeserialize for ReturnType {
    const CONSTRUCT: &'static str = "ReturnType";

    fn deserialize(de: &mut Deserializer<'_>) -> Result<Self> {
        let mut return_type = ReturnType::default();
        de.read_object(Self::CONSTRUCT, |de, field| {
            dispatch(RETURN_TYPE_FIELDS, de, field, &mut return_type)
        })?;
        Ok(return_type)
    }
}

pub(crate) static ACTION_FIELDS: &FieldTable<Action> = &[
    ("Name", |de, a| {
        a.name = de.read_string()?;
        Ok(())
    }),
    ("IsBound", |de, a| {
        a.is_bound = de.read_bool()?;
        Ok(())
    }),
    ("EntitySetPath", |de, a| {
        a.entity_set_path = Some(de.read_string()?);
        Ok(())
    }),
    ("Parameter", |de, a| {
        a.parameters.push(de.parse()?);
        Ok(())
    }),
    ("ReturnType", |de, a| {
        a.return_type = Some(de.parse()?);
        Ok(())
    }),
    ("Annotation", |de, a| {
        a.annotation = Some(de.parse()?);
        Ok(())
    }),
];

impl CsdlDeserialize for Action {
    const CONSTRUCT: &'static str = "Action";

    fn deserialize(de: &mut Deserializer<'_>) -> Result<Self> {
        let mut action = Action::default();
        de.read_object(Self::CONSTRUCT, |de, field| {
            dispatch(ACTION_FIELDS, de, field, &mut action)
        })?;
        Ok(action)
    }
}

pub(crate) static FUNCTION_FIELDS: &FieldTable<Function> = &[
    ("Name", |de, f| {
        f.name = de.read_string()?;
        Ok(())
    }),
    ("IsBound", |de, f| {
        f.is_bound = de.read_bool()?;
        Ok(())
    }),
    ("IsComposable", |de, f| {
        f.is_composable = de.read_bool()?;
        Ok(())
    }),
    ("EntitySetPath", |de, f| {
        f.entity_set_path = Some(de.read_string()?);
        Ok(())
    }),
    ("Parameter", |de, f| {
        f.parameters.push(de.parse()?);
        Ok(())
    }),
    ("ReturnType", |de, f| {
        f.return_type = Some(de.parse()?);
        Ok(())
    }),
    ("Annotation", |de, f| {
        f.annotation = Some(de.parse()?);
        Ok(())
    }),
];

impl CsdlDeserialize for Function {
    const CONSTRUCT: &'static str = "Function";

    fn deserialize(de: &mut Deserializer<'_>) -> Result<Self> {
        let mut function = Function::default();
        de.read_object(Self::CONSTRUCT, |de, field| {
            dispatch(FUNCTION_FIELDS, de, field, &mut function)
        })?;
        Ok(function)
    }
}

pub(crate) static TYPE_DEFINITION_FIELDS: &FieldTable<TypeDefinition> = &[
    ("Name", |de, t| {
        t.name = de.read_string()?;
        Ok(())
    }),
    ("UnderlyingType", |de, t| {
        t.underlying_type = de.read_string()?;
        Ok(())
    }),
    ("MaxLength", |de, t| {
        t.max_length = Some(de.read_parsed("MaxLength")?);
        Ok(())
    }),
    ("Precision", |de, t| {
        t.precision = Some(de.read_parsed("Precision")?);
        Ok(())
    }),
    ("Scale", |de, t| {
        t.scale = Some(de.read_parsed("Scale")?);
        Ok(())
    }),
    ("SRID", |de, t| {
        t.srid = Some(de.read_string()?);
        Ok(())
    }),
    ("Unicode", |de, t| {
        t.unicode = de.read_bool()?;
        Ok(())
    }),
    ("Annotation", |de, t| {
        t.annotation = Some(de.parse()?);
        Ok(())
    }),
];

impl CsdlDeserialize for TypeDefinition {
    const CONSTRUCT: &'static str = "TypeDefinition";

    fn deserialize(de: &mut Deserializer<'_>) -> Result<Self> {
        let mut definition = TypeDefinition::default();
        de.read_object(Self::CONSTRUCT, |de, field| {
            dispatch(TYPE_DEFINITION_FIELDS, de, field, &mut definition)
        })?;
        Ok(definition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::JsonTokenizer;
    use edm_model::ProtocolVersion;
    use edm_model::types::MaxLength;

    fn parse_json<T: CsdlDeserialize>(json: &str) -> T {
        let mut tokens = JsonTokenizer::parse_str(json).unwrap();
        let mut de = Deserializer::new(&mut tokens, ProtocolVersion::V4);
        de.parse().unwrap()
    }

    #[test]
    fn test_function_with_parameters() {
        let function: Function = parse_json(
            r#"{
                "Name": "NearestAirport",
                "IsBound": true,
                "IsComposable": "true",
                "Parameter": [
                    {"Name": "lat", "Type": "Edm.Double", "Nullable": false},
                    {"Name": "lon", "Type": "Edm.Double", "Nullable": false}
                ],
                "ReturnType": {"Type": "Trip.Airport", "Nullable": false}
            }"#,
        );
        assert!(function.is_bound);
        assert!(function.is_composable);
        assert_eq!(function.parameters.len(), 2);
        assert!(!function.parameters[1].nullable);
        let return_type = function.return_type.unwrap();
        assert_eq!(return_type.type_name, "Trip.Airport");
        assert!(!return_type.nullable);
    }

    #[test]
    fn test_action_defaults() {
        let action: Action = parse_json(r#"{"Name": "ResetDataSource"}"#);
        assert!(!action.is_bound);
        assert!(action.parameters.is_empty());
        assert!(action.return_type.is_none());
    }

    #[test]
    fn test_type_definition_facets() {
        let definition: TypeDefinition = parse_json(
            r#"{"Name": "Name", "UnderlyingType": "Edm.String", "MaxLength": 64, "Unicode": false}"#,
        );
        assert_eq!(definition.underlying_type, "Edm.String");
        assert_eq!(definition.max_length, Some(MaxLength::Length(64)));
        assert!(!definition.unicode);
    }
}
