//! CAS registered service descriptors, as persisted in a JSON service registry.

use serde::{Deserialize, Serialize};

use crate::{
    attribute::{JavaArrayList, JavaHashMap, SamlReleaseAttributes},
    id::ServiceId,
    input::{DescriptorInput, SamlServiceInput, ServiceInput},
    ValidationError,
};

/// A descriptor file's content. The variant is the `@class` discriminator.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
#[serde(tag = "@class")]
pub enum ServiceDescriptor {
    /// Generic CAS relying party.
    #[serde(rename = "org.apereo.cas.services.CasRegisteredService")]
    Cas(CasService),

    /// SAML2 service provider.
    #[serde(rename = "org.apereo.cas.support.saml.services.SamlRegisteredService")]
    Saml(SamlService),
}

/// Generic CAS service.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct CasService {
    pub service_id: String,
    pub name: Option<String>,
    pub id: ServiceId,
    pub evaluation_order: i64,
    pub description: String,
    pub attribute_release_policy: AttributeReleasePolicy,
}

/// SAML service provider. Field order follows what CAS itself writes.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct SamlService {
    pub service_id: String,
    pub name: Option<String>,
    pub id: ServiceId,
    pub evaluation_order: i64,
    pub metadata_location: String,
    pub description: String,
    pub required_name_id_format: String,
    pub attribute_name_formats: JavaHashMap,
    pub username_attribute_provider: UsernameAttributeProvider,
    pub attribute_value_types: JavaHashMap,
    pub attribute_release_policy: AttributeReleasePolicy,
}

/// Which attributes are released to the relying party.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
#[serde(tag = "@class")]
pub enum AttributeReleasePolicy {
    /// Release exactly the listed attributes, unmodified.
    #[serde(rename = "org.apereo.cas.services.ReturnAllowedAttributeReleasePolicy")]
    ReturnAllowed {
        /// Released attribute names.
        #[serde(rename = "allowedAttributes")]
        allowed_attributes: JavaArrayList,
    },
}

impl AttributeReleasePolicy {
    /// The released attribute names, in order.
    pub fn allowed_attributes(&self) -> &[String] {
        match self {
            Self::ReturnAllowed { allowed_attributes } => &allowed_attributes.0,
        }
    }
}

/// Where the SAML NameID value comes from.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
#[serde(tag = "@class")]
pub enum UsernameAttributeProvider {
    /// Use a principal attribute.
    #[serde(rename = "org.apereo.cas.services.PrincipalAttributeRegisteredServiceUsernameProvider")]
    PrincipalAttribute {
        /// Name of the principal attribute.
        #[serde(rename = "usernameAttribute")]
        username_attribute: String,
    },
}

impl ServiceDescriptor {
    /// The registry-unique id.
    pub fn id(&self) -> &ServiceId {
        match self {
            Self::Cas(svc) => &svc.id,
            Self::Saml(svc) => &svc.id,
        }
    }

    /// The relying party pattern or SAML entity ID.
    pub fn service_id(&self) -> &str {
        match self {
            Self::Cas(svc) => &svc.service_id,
            Self::Saml(svc) => &svc.service_id,
        }
    }

    /// Matching priority.
    pub fn evaluation_order(&self) -> i64 {
        match self {
            Self::Cas(svc) => svc.evaluation_order,
            Self::Saml(svc) => svc.evaluation_order,
        }
    }

    /// The released attribute names, in order.
    pub fn allowed_attributes(&self) -> &[String] {
        match self {
            Self::Cas(svc) => svc.attribute_release_policy.allowed_attributes(),
            Self::Saml(svc) => svc.attribute_release_policy.allowed_attributes(),
        }
    }

    /// Pretty-printed JSON with two-space indentation.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Parse a descriptor file's content.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Build the descriptor for `input`, stamped with the resolved `id`.
pub fn build(input: &DescriptorInput, id: ServiceId) -> Result<ServiceDescriptor, ValidationError> {
    match input {
        DescriptorInput::Cas(input) => build_cas(input, id).map(ServiceDescriptor::Cas),
        DescriptorInput::Saml(input) => build_saml(input, id).map(ServiceDescriptor::Saml),
    }
}

/// Build a generic CAS service. The attribute list is copied in order.
pub fn build_cas(input: &ServiceInput, id: ServiceId) -> Result<CasService, ValidationError> {
    require_non_empty(&[
        ("entityID", &input.service_id),
        ("service_description", &input.description),
    ])?;

    Ok(CasService {
        service_id: input.service_id.clone(),
        name: input.name.clone(),
        evaluation_order: input.evaluation_order_override.unwrap_or(id.value()),
        id,
        description: input.description.clone(),
        attribute_release_policy: AttributeReleasePolicy::ReturnAllowed {
            allowed_attributes: JavaArrayList(input.allowed_attributes.clone()),
        },
    })
}

/// Build a SAML service provider, deriving the release structures from the
/// attribute mapping.
pub fn build_saml(input: &SamlServiceInput, id: ServiceId) -> Result<SamlService, ValidationError> {
    require_non_empty(&[
        ("entityID", &input.entity_id),
        ("service_description", &input.description),
        ("required_NameId_Format", &input.required_name_id_format),
        ("nameID_Attribute", &input.name_id_attribute),
        ("metadata_location", &input.metadata_location),
    ])?;

    let SamlReleaseAttributes {
        name_formats,
        value_types,
        allowed,
    } = SamlReleaseAttributes::derive(&input.attributes);

    Ok(SamlService {
        service_id: input.entity_id.clone(),
        name: input.name.clone(),
        evaluation_order: input.evaluation_order_override.unwrap_or(id.value()),
        id,
        metadata_location: input.metadata_location.clone(),
        description: input.description.clone(),
        required_name_id_format: input.required_name_id_format.clone(),
        attribute_name_formats: name_formats,
        username_attribute_provider: UsernameAttributeProvider::PrincipalAttribute {
            username_attribute: input.name_id_attribute.clone(),
        },
        attribute_value_types: value_types,
        attribute_release_policy: AttributeReleasePolicy::ReturnAllowed {
            allowed_attributes: JavaArrayList(allowed),
        },
    })
}

fn require_non_empty(fields: &[(&str, &String)]) -> Result<(), ValidationError> {
    let missing: Vec<String> = fields
        .iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(param, _)| param.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::MissingOrInvalid(missing))
    }
}
