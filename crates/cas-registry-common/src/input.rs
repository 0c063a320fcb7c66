//! Caller input for creating descriptors.
//!
//! Inputs can be built directly, or parsed from a loosely typed JSON argument
//! object that uses the same parameter names as the CAS provisioning modules
//! (`entityID`, `service_id`, `attributes`, ...). Required strings must be
//! present, strings, and non-empty. An `evaluationOrder` argument is accepted
//! and ignored: the evaluation order of an argument-built descriptor is always
//! its numeric id.

use serde_json::{Map, Value};

use crate::{attribute::AttributeMapping, ValidationError};

/// Input for a generic CAS service.
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct ServiceInput {
    /// Service URL or pattern (`entityID`).
    pub service_id: String,
    /// Display name (`service_name`).
    pub name: Option<String>,
    /// Free text (`service_description`).
    pub description: String,
    /// Released attribute names, in order (`allowed_attributes`).
    pub allowed_attributes: Vec<String>,
    /// Opt-in matching priority. When `None` the evaluation order is the
    /// numeric id. Never set from an argument object.
    pub evaluation_order_override: Option<i64>,
    /// Caller chosen id (`service_id`). Synthesized when absent or empty.
    pub id: Option<String>,
}

/// Input for a SAML service provider.
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct SamlServiceInput {
    /// SAML entity ID (`entityID`).
    pub entity_id: String,
    /// Display name (`service_name`).
    pub name: Option<String>,
    /// Free text (`service_description`).
    pub description: String,
    /// SP metadata location (`metadata_location`).
    pub metadata_location: String,
    /// Required NameID format (`required_NameId_Format`).
    pub required_name_id_format: String,
    /// Principal attribute used as NameID (`nameID_Attribute`).
    pub name_id_attribute: String,
    /// Logical attribute name → attribute URI (`attributes`).
    pub attributes: AttributeMapping,
    /// Opt-in matching priority. When `None` the evaluation order is the
    /// numeric id. Never set from an argument object.
    pub evaluation_order_override: Option<i64>,
    /// Caller chosen id (`service_id`). Synthesized when absent or empty.
    pub id: Option<String>,
}

/// Either descriptor shape's input.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum DescriptorInput {
    /// Generic CAS service.
    Cas(ServiceInput),
    /// SAML service provider.
    Saml(SamlServiceInput),
}

impl DescriptorInput {
    /// The caller chosen id, if any.
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Cas(input) => input.id.as_deref(),
            Self::Saml(input) => input.id.as_deref(),
        }
    }
}

impl From<ServiceInput> for DescriptorInput {
    fn from(value: ServiceInput) -> Self {
        Self::Cas(value)
    }
}

impl From<SamlServiceInput> for DescriptorInput {
    fn from(value: SamlServiceInput) -> Self {
        Self::Saml(value)
    }
}

impl ServiceInput {
    /// Parse and type-check an argument object.
    pub fn from_args(args: &Value) -> Result<Self, ValidationError> {
        let mut args = Args::new(args)?;

        let service_id = args.required_str("entityID");
        let description = args.required_str("service_description");
        let name = args.optional_str("service_name");
        let id = args.optional_id("service_id");
        let allowed_attributes = args.string_list("allowed_attributes");
        args.finish()?;

        Ok(Self {
            service_id,
            name,
            description,
            allowed_attributes: allowed_attributes?,
            evaluation_order_override: None,
            id,
        })
    }
}

impl SamlServiceInput {
    /// Parse and type-check an argument object.
    pub fn from_args(args: &Value) -> Result<Self, ValidationError> {
        let mut args = Args::new(args)?;

        let entity_id = args.required_str("entityID");
        let description = args.required_str("service_description");
        let required_name_id_format = args.required_str("required_NameId_Format");
        let name_id_attribute = args.required_str("nameID_Attribute");
        let metadata_location = args.required_str("metadata_location");
        let name = args.optional_str("service_name");
        let id = args.optional_id("service_id");
        let attributes = args.string_map("attributes");
        args.finish()?;

        Ok(Self {
            entity_id,
            name,
            description,
            metadata_location,
            required_name_id_format,
            name_id_attribute,
            attributes: attributes?,
            evaluation_order_override: None,
            id,
        })
    }
}

/// Collects every missing or mistyped parameter before failing, so the caller
/// sees the whole list at once.
struct Args<'a> {
    map: &'a Map<String, Value>,
    invalid: Vec<String>,
}

impl<'a> Args<'a> {
    fn new(args: &'a Value) -> Result<Self, ValidationError> {
        match args {
            Value::Object(map) => Ok(Self {
                map,
                invalid: vec![],
            }),
            _ => Err(ValidationError::InvalidAttributes {
                param: "arguments",
                expected: "an object",
            }),
        }
    }

    fn present(&self, param: &str) -> Option<&'a Value> {
        self.map.get(param).filter(|value| !value.is_null())
    }

    fn required_str(&mut self, param: &str) -> String {
        match self.present(param) {
            Some(Value::String(value)) if !value.is_empty() => value.clone(),
            _ => {
                self.invalid.push(param.to_string());
                String::new()
            }
        }
    }

    fn optional_str(&mut self, param: &str) -> Option<String> {
        match self.present(param)? {
            Value::String(value) => Some(value.clone()),
            _ => {
                self.invalid.push(param.to_string());
                None
            }
        }
    }

    /// Ids may be given as strings or bare integers.
    fn optional_id(&mut self, param: &str) -> Option<String> {
        match self.present(param)? {
            Value::String(value) => Some(value.clone()),
            Value::Number(value) if value.is_u64() => Some(value.to_string()),
            _ => {
                self.invalid.push(param.to_string());
                None
            }
        }
    }

    fn string_list(&self, param: &'static str) -> Result<Vec<String>, ValidationError> {
        let Some(value) = self.present(param) else {
            return Ok(vec![]);
        };
        let invalid = ValidationError::InvalidAttributes {
            param,
            expected: "a list of strings",
        };
        let Value::Array(items) = value else {
            return Err(invalid);
        };

        items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect::<Option<Vec<_>>>()
            .ok_or(invalid)
    }

    fn string_map(&self, param: &'static str) -> Result<AttributeMapping, ValidationError> {
        let Some(value) = self.present(param) else {
            return Ok(AttributeMapping::default());
        };
        let invalid = ValidationError::InvalidAttributes {
            param,
            expected: "a mapping of strings",
        };
        let Value::Object(pairs) = value else {
            return Err(invalid);
        };

        let mut mapping = AttributeMapping::default();
        for (name, uri) in pairs {
            let Value::String(uri) = uri else {
                return Err(invalid);
            };
            mapping.insert(name.clone(), uri.clone());
        }
        Ok(mapping)
    }

    fn finish(self) -> Result<(), ValidationError> {
        if self.invalid.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::MissingOrInvalid(self.invalid))
        }
    }
}
