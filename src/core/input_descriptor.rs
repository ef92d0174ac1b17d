use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use serde_json_path::JsonPath;

use super::credential_format::{ClaimFormatMap, CredentialType};

/// Input Descriptors are objects used to describe the information a Verifier requires of a Holder.
///
/// See: [https://identity.foundation/presentation-exchange/spec/v2.0.0/#input-descriptor-object](https://identity.foundation/presentation-exchange/spec/v2.0.0/#input-descriptor-object)
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct InputDescriptor {
    id: String,
    #[serde(default)]
    constraints: Constraints,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    purpose: Option<String>,
    #[serde(default, skip_serializing_if = "ClaimFormatMap::is_empty")]
    format: ClaimFormatMap,
}

impl InputDescriptor {
    /// Return the id of the input descriptor.
    pub fn id(&self) -> &str {
        self.id.as_str()
    }

    /// Credential types required by this descriptor.
    ///
    /// These are the `const` values of `contains` filters, as in
    /// `{"path": ["$.type"], "filter": {"type": "array", "contains": {"const": "VerifiableId"}}}`.
    pub fn required_types(&self) -> Vec<CredentialType> {
        let Ok(path) = JsonPath::parse("$.fields[*].filter.contains.const") else {
            return Vec::new();
        };
        let Ok(constraints) = serde_json::to_value(&self.constraints) else {
            return Vec::new();
        };

        path.query(&constraints)
            .all()
            .into_iter()
            .filter_map(Json::as_str)
            .map(ToOwned::to_owned)
            .collect()
    }
}

/// Constraints are objects used to describe the constraints that a Holder must satisfy to
/// fulfill an Input Descriptor.
#[derive(Clone, Default, Debug, Serialize, Deserialize, PartialEq)]
pub struct Constraints {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    fields: Vec<ConstraintsField>,
}

/// A single field constraint: a set of JSONPath expressions and an optional JSON schema filter.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ConstraintsField {
    path: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    purpose: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<Json>,
}
