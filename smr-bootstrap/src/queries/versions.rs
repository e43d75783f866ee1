use serde::{Deserialize, Serialize};
use smr_graphql::{GraphQLQuery, OperationType};

pub struct UpdateVersion;

pub mod update_version {
    use super::*;

    #[derive(Debug, Clone, Default, Serialize)]
    pub struct UpdateVersionInput {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub changelog: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub stability: Option<String>
    }

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        #[serde(rename = "versionId")]
        pub version_id: String,
        pub version: UpdateVersionInput
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Version {
        #[serde(rename = "__typename")]
        pub typename: String,
        pub id: String
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct ResponseData {
        #[serde(rename = "updateVersion")]
        pub update_version: Version
    }
}

impl GraphQLQuery for UpdateVersion {
    type Variables = update_version::Variables;
    type ResponseData = update_version::ResponseData;

    const QUERY: &'static str = r#"
        mutation UpdateVersion($versionId: VersionID!, $version: UpdateVersion!) {
            updateVersion(versionId: $versionId, version: $version) {
                __typename
                id
            }
        }
    "#;
    const OPERATION_NAME: &'static str = "UpdateVersion";
    const OPERATION_TYPE: OperationType = OperationType::Mutation;
}
