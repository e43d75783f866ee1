use serde::{Deserialize, Serialize};
use smr_graphql::{FileUpload, GraphQLQuery, OperationType, Upload};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModAuthor {
    #[serde(rename = "__typename")]
    pub typename: String,
    pub role: String,
    pub user_id: String
}

pub struct GetMod;

pub mod get_mod {
    use super::*;

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        #[serde(rename = "modId")]
        pub mod_id: String
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Mod {
        #[serde(rename = "__typename")]
        pub typename: String,
        pub id: String,
        pub name: String,
        pub short_description: String,
        pub logo: Option<String>,
        pub downloads: i64,
        pub views: i64,
        pub approved: bool,
        pub authors: Vec<ModAuthor>
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct ResponseData {
        #[serde(rename = "getMod")]
        pub get_mod: Option<Mod>
    }
}

impl GraphQLQuery for GetMod {
    type Variables = get_mod::Variables;
    type ResponseData = get_mod::ResponseData;

    const QUERY: &'static str = r#"
        query GetMod($modId: ModID!) {
            getMod(modId: $modId) {
                __typename
                id
                name
                short_description
                logo
                downloads
                views
                approved
                authors {
                    __typename
                    role
                    user_id
                }
            }
        }
    "#;
    const OPERATION_NAME: &'static str = "GetMod";
    const OPERATION_TYPE: OperationType = OperationType::Query;
}

pub struct GetMods;

pub mod get_mods {
    use super::*;

    #[derive(Debug, Clone, Default, Serialize)]
    pub struct ModFilter {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub limit: Option<i64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub offset: Option<i64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub search: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub order_by: Option<String>
    }

    #[derive(Debug, Clone, Default, Serialize)]
    pub struct Variables {
        pub filter: Option<ModFilter>
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct ModSummary {
        #[serde(rename = "__typename")]
        pub typename: String,
        pub id: String,
        pub name: String,
        pub short_description: String,
        pub logo: Option<String>,
        pub downloads: i64
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Mods {
        #[serde(rename = "__typename")]
        pub typename: String,
        pub count: i64,
        pub mods: Vec<ModSummary>
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct ResponseData {
        #[serde(rename = "getMods")]
        pub get_mods: Mods
    }
}

impl GraphQLQuery for GetMods {
    type Variables = get_mods::Variables;
    type ResponseData = get_mods::ResponseData;

    const QUERY: &'static str = r#"
        query GetMods($filter: ModFilter) {
            getMods(filter: $filter) {
                __typename
                count
                mods {
                    __typename
                    id
                    name
                    short_description
                    logo
                    downloads
                }
            }
        }
    "#;
    const OPERATION_NAME: &'static str = "GetMods";
    const OPERATION_TYPE: OperationType = OperationType::Query;
}

/// Replace the logo of a mod. The logo is sent as a multipart file.
pub struct UpdateModLogo;

pub mod update_mod_logo {
    use super::*;

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        #[serde(rename = "modId")]
        pub mod_id: String,
        pub logo: Upload
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Mod {
        #[serde(rename = "__typename")]
        pub typename: String,
        pub id: String,
        pub logo: Option<String>
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct ResponseData {
        #[serde(rename = "updateMod")]
        pub update_mod: Mod
    }
}

impl GraphQLQuery for UpdateModLogo {
    type Variables = update_mod_logo::Variables;
    type ResponseData = update_mod_logo::ResponseData;

    const QUERY: &'static str = r#"
        mutation UpdateModLogo($modId: ModID!, $logo: Upload!) {
            updateMod(modId: $modId, mod: { logo: $logo }) {
                __typename
                id
                logo
            }
        }
    "#;
    const OPERATION_NAME: &'static str = "UpdateModLogo";
    const OPERATION_TYPE: OperationType = OperationType::Mutation;

    fn uploads(variables: &Self::Variables) -> Vec<FileUpload> {
        vec![FileUpload::new("variables.logo", variables.logo.clone())]
    }
}
