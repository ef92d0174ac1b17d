use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use super::{credential_format::ClaimFormatDesignation, object::TypedParameter};

/// A DescriptorMapId is a unique identifier for a DescriptorMap.
pub type DescriptorMapId = String;

/// Presentation Submissions express how the inputs presented as proofs to a Verifier are
/// provided in accordance with the requirements specified in a
/// [PresentationDefinition](super::presentation_definition::PresentationDefinition).
///
/// For more information, see: [https://identity.foundation/presentation-exchange/spec/v2.0.0/#presentation-submission](https://identity.foundation/presentation-exchange/spec/v2.0.0/#presentation-submission)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PresentationSubmission {
    id: uuid::Uuid,
    definition_id: DescriptorMapId,
    descriptor_map: Vec<DescriptorMap>,
}

impl TypedParameter for PresentationSubmission {
    const KEY: &'static str = "presentation_submission";
}

impl PresentationSubmission {
    pub fn new(
        id: uuid::Uuid,
        definition_id: DescriptorMapId,
        descriptor_map: Vec<DescriptorMap>,
    ) -> Self {
        Self {
            id,
            definition_id,
            descriptor_map,
        }
    }

    /// Submission for a single `jwt_vp` whose credentials are nested as one chain.
    ///
    /// The outer entry points at the whole presentation (`$`) and carries the first descriptor
    /// id. Level `i` of the chain maps `$.vp.verifiableCredential[i]` to `descriptor_ids[i]`.
    pub fn nested_chain(definition_id: DescriptorMapId, descriptor_ids: &[String]) -> Self {
        let inner = descriptor_ids
            .iter()
            .enumerate()
            .map(|(i, id)| DescriptorMap::credential_entry(id, i))
            .collect();
        let outer_id = descriptor_ids.first().cloned().unwrap_or_default();

        let descriptor_map = DescriptorMap::new(outer_id, ClaimFormatDesignation::JwtVp, "$")
            .with_nested_chain(inner);

        Self::new(uuid::Uuid::new_v4(), definition_id, vec![descriptor_map])
    }

    /// Submission with one `jwt_vp` entry per input descriptor, each nesting exactly one `jwt_vc`.
    ///
    /// Entry `i` maps `$.vp.verifiableCredential[i]` to `descriptor_ids[i]`.
    pub fn per_descriptor(definition_id: DescriptorMapId, descriptor_ids: &[String]) -> Self {
        let descriptor_map = descriptor_ids
            .iter()
            .enumerate()
            .map(|(i, id)| {
                DescriptorMap::new(id.clone(), ClaimFormatDesignation::JwtVp, "$")
                    .with_nested_chain(vec![DescriptorMap::credential_entry(id, i)])
            })
            .collect();

        Self::new(uuid::Uuid::new_v4(), definition_id, descriptor_map)
    }

    /// Return the id of the presentation submission.
    pub fn id(&self) -> &uuid::Uuid {
        &self.id
    }

    /// Return the definition id of the presentation submission.
    pub fn definition_id(&self) -> &String {
        &self.definition_id
    }

    /// Return the descriptor map of the presentation submission.
    pub fn descriptor_map(&self) -> &Vec<DescriptorMap> {
        &self.descriptor_map
    }
}

impl TryFrom<Json> for PresentationSubmission {
    type Error = anyhow::Error;

    fn try_from(raw: Json) -> Result<Self, Self::Error> {
        serde_json::from_value(raw).map_err(Into::into)
    }
}

impl From<PresentationSubmission> for Json {
    fn from(value: PresentationSubmission) -> Self {
        serde_json::json!({
            "id": value.id,
            "definition_id": value.definition_id,
            "descriptor_map": value.descriptor_map,
        })
    }
}

/// Descriptor Maps describe the information a Holder provides to a Verifier.
///
/// Entries are immutable once built: nesting produces a new value rather than mutating a
/// shared one.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DescriptorMap {
    pub id: DescriptorMapId,
    pub format: ClaimFormatDesignation,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path_nested: Option<Box<DescriptorMap>>,
}

impl DescriptorMap {
    pub fn new(
        id: impl Into<DescriptorMapId>,
        format: impl Into<ClaimFormatDesignation>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            format: format.into(),
            path: path.into(),
            path_nested: None,
        }
    }

    fn credential_entry(id: &str, index: usize) -> Self {
        Self::new(
            id,
            ClaimFormatDesignation::JwtVc,
            format!("$.vp.verifiableCredential[{index}]"),
        )
    }

    /// Fold `entries` into a chain hanging below `self`, preserving order:
    /// `entries[0]` becomes the direct child, `entries[1]` its child, and so on.
    pub fn with_nested_chain(self, entries: Vec<DescriptorMap>) -> Self {
        let chain = entries.into_iter().rev().fold(None, |inner, entry| {
            Some(Box::new(DescriptorMap {
                path_nested: inner,
                ..entry
            }))
        });

        DescriptorMap {
            path_nested: chain,
            ..self
        }
    }

    /// Depth of the `path_nested` chain below this entry.
    pub fn nesting_depth(&self) -> usize {
        std::iter::successors(self.path_nested.as_deref(), |d| d.path_nested.as_deref()).count()
    }

    /// The entries of the `path_nested` chain, outermost first.
    pub fn nested_entries(&self) -> Vec<&DescriptorMap> {
        std::iter::successors(self.path_nested.as_deref(), |d| d.path_nested.as_deref()).collect()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn ids(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("descriptor-{i}")).collect()
    }

    #[test]
    fn chain_depth_and_order_follow_selection() {
        for n in 1..=4 {
            let submission = PresentationSubmission::nested_chain("pd".into(), &ids(n));
            assert_eq!(submission.descriptor_map().len(), 1);

            let outer = &submission.descriptor_map()[0];
            assert_eq!(outer.path, "$");
            assert_eq!(outer.format, ClaimFormatDesignation::JwtVp);
            assert_eq!(outer.nesting_depth(), n);

            for (i, entry) in outer.nested_entries().into_iter().enumerate() {
                assert_eq!(entry.path, format!("$.vp.verifiableCredential[{i}]"));
                assert_eq!(entry.id, format!("descriptor-{i}"));
                assert_eq!(entry.format, ClaimFormatDesignation::JwtVc);
            }
        }
    }

    #[test]
    fn per_descriptor_entries() {
        let submission = PresentationSubmission::per_descriptor("pd".into(), &ids(2));
        let value = serde_json::to_value(&submission).unwrap();

        assert_eq!(
            value["descriptor_map"],
            json!([
                {
                    "id": "descriptor-0",
                    "format": "jwt_vp",
                    "path": "$",
                    "path_nested": {
                        "id": "descriptor-0",
                        "format": "jwt_vc",
                        "path": "$.vp.verifiableCredential[0]"
                    }
                },
                {
                    "id": "descriptor-1",
                    "format": "jwt_vp",
                    "path": "$",
                    "path_nested": {
                        "id": "descriptor-1",
                        "format": "jwt_vc",
                        "path": "$.vp.verifiableCredential[1]"
                    }
                }
            ])
        );
    }

    #[test]
    fn building_a_chain_does_not_touch_the_inputs() {
        let entry = DescriptorMap::new("a", "jwt_vc", "$.vp.verifiableCredential[0]");
        let first = DescriptorMap::new("x", "jwt_vp", "$").with_nested_chain(vec![entry.clone()]);
        let second = DescriptorMap::new("y", "jwt_vp", "$").with_nested_chain(vec![entry.clone()]);

        assert!(entry.path_nested.is_none());
        assert_eq!(first.path_nested, second.path_nested);
    }
}
