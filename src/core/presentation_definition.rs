use super::credential_format::{ClaimFormatMap, CredentialType};
use super::input_descriptor::*;

use serde::{Deserialize, Serialize};

/// A presentation definition is a JSON object that describes the information a Verifier requires of a Holder.
///
/// For more information, see: [https://identity.foundation/presentation-exchange/spec/v2.0.0/#presentation-definition](https://identity.foundation/presentation-exchange/spec/v2.0.0/#presentation-definition)
#[derive(Clone, Default, Debug, Serialize, Deserialize, PartialEq)]
pub struct PresentationDefinition {
    id: String,
    input_descriptors: Vec<InputDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    purpose: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<ClaimFormatMap>,
}

impl PresentationDefinition {
    /// Return the id of the presentation definition.
    pub fn id(&self) -> &String {
        &self.id
    }

    /// Return the input descriptors of the presentation definition.
    pub fn input_descriptors(&self) -> &Vec<InputDescriptor> {
        &self.input_descriptors
    }

    /// Input descriptor ids, in definition order.
    pub fn input_descriptor_ids(&self) -> Vec<String> {
        self.input_descriptors
            .iter()
            .map(|d| d.id().to_owned())
            .collect()
    }

    /// Every credential type required across all input descriptors, in definition order.
    pub fn required_types(&self) -> Vec<CredentialType> {
        self.input_descriptors
            .iter()
            .flat_map(InputDescriptor::required_types)
            .collect()
    }
}
