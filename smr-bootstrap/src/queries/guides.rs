use serde::{Deserialize, Serialize};
use smr_graphql::{GraphQLQuery, OperationType};

pub struct GetGuides;

pub mod get_guides {
    use super::*;

    #[derive(Debug, Clone, Default, Serialize)]
    pub struct GuideFilter {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub limit: Option<i64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub offset: Option<i64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub search: Option<String>
    }

    #[derive(Debug, Clone, Default, Serialize)]
    pub struct Variables {
        pub filter: Option<GuideFilter>
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Guide {
        #[serde(rename = "__typename")]
        pub typename: String,
        pub id: String,
        pub name: String,
        pub short_description: String,
        pub views: i64
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Guides {
        #[serde(rename = "__typename")]
        pub typename: String,
        pub count: i64,
        pub guides: Vec<Guide>
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct ResponseData {
        #[serde(rename = "getGuides")]
        pub get_guides: Guides
    }
}

impl GraphQLQuery for GetGuides {
    type Variables = get_guides::Variables;
    type ResponseData = get_guides::ResponseData;

    const QUERY: &'static str = r#"
        query GetGuides($filter: GuideFilter) {
            getGuides(filter: $filter) {
                __typename
                count
                guides {
                    __typename
                    id
                    name
                    short_description
                    views
                }
            }
        }
    "#;
    const OPERATION_NAME: &'static str = "GetGuides";
    const OPERATION_TYPE: OperationType = OperationType::Query;
}
