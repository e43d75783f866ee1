//! The operations the site runs.

use serde::{Deserialize, Serialize};
use smr_graphql::{GraphQLQuery, OperationType};

mod guides;
mod mods;
mod versions;

pub use guides::{get_guides, GetGuides};
pub use mods::{get_mod, get_mods, update_mod_logo, GetMod, GetMods, UpdateModLogo};
pub use versions::{update_version, UpdateVersion};

/// A mutation that takes a single id and returns whether it worked.
macro_rules! id_mutation {
    ($(#[$meta:meta])* $module:ident :: $name:ident, $field:tt, $argument:tt, $id_type:tt) => {
        $(#[$meta])*
        pub mod $module {
            use super::*;

            pub struct $name;

            #[derive(Debug, Clone, Serialize)]
            pub struct Variables {
                #[serde(rename = $argument)]
                pub id: String
            }

            #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
            pub struct ResponseData {
                #[serde(rename = $field)]
                pub result: bool
            }

            impl GraphQLQuery for $name {
                type Variables = Variables;
                type ResponseData = ResponseData;

                const QUERY: &'static str = concat!(
                    "mutation ", stringify!($name), "($", $argument, ": ", $id_type, "!) { ",
                    $field, "(", $argument, ": $", $argument, ") }"
                );
                const OPERATION_NAME: &'static str = stringify!($name);
                const OPERATION_TYPE: OperationType = OperationType::Mutation;
            }
        }

        pub use $module::$name;
    };
}

id_mutation!(delete_mod::DeleteMod, "deleteMod", "modId", "ModID");
id_mutation!(approve_mod::ApproveMod, "approveMod", "modId", "ModID");
id_mutation!(deny_mod::DenyMod, "denyMod", "modId", "ModID");
id_mutation!(delete_guide::DeleteGuide, "deleteGuide", "guideId", "GuideID");
id_mutation!(approve_version::ApproveVersion, "approveVersion", "versionId", "VersionID");
id_mutation!(deny_version::DenyVersion, "denyVersion", "versionId", "VersionID");
id_mutation!(delete_version::DeleteVersion, "deleteVersion", "versionId", "VersionID");
id_mutation!(
    /// Remove an SML release from the list of known versions.
    delete_sml_version::DeleteSMLVersion,
    "deleteSMLVersion",
    "smlVersionId",
    "SMLVersionID"
);
