use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::generator::camel_case;

/// Every resource type the v3 API exposes and the generator knows how to emit.
///
/// The variant order is the order `all` walks the catalogue in.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectType {
    #[value(name = "adversary_assets")]
    AdversaryAssets,
    #[value(name = "artifacts")]
    Artifacts,
    #[value(name = "artifact_types")]
    ArtifactTypes,
    #[value(name = "cases")]
    Cases,
    #[value(name = "case_attributes")]
    CaseAttributes,
    #[value(name = "groups")]
    Groups,
    #[value(name = "group_attributes")]
    GroupAttributes,
    #[value(name = "indicators")]
    Indicators,
    #[value(name = "indicator_attributes")]
    IndicatorAttributes,
    #[value(name = "notes")]
    Notes,
    #[value(name = "owners")]
    Owners,
    #[value(name = "owner_roles")]
    OwnerRoles,
    #[value(name = "security_labels")]
    SecurityLabels,
    #[value(name = "system_roles")]
    SystemRoles,
    #[value(name = "tags")]
    Tags,
    #[value(name = "tasks")]
    Tasks,
    #[value(name = "users")]
    Users,
    #[value(name = "user_groups")]
    UserGroups,
    #[value(name = "victims")]
    Victims,
    #[value(name = "victim_assets")]
    VictimAssets,
    #[value(name = "victim_attributes")]
    VictimAttributes,
    #[value(name = "workflow_events")]
    WorkflowEvents,
    #[value(name = "workflow_templates")]
    WorkflowTemplates,
}

impl ObjectType {
    pub const ALL: [ObjectType; 23] = [
        ObjectType::AdversaryAssets,
        ObjectType::Artifacts,
        ObjectType::ArtifactTypes,
        ObjectType::Cases,
        ObjectType::CaseAttributes,
        ObjectType::Groups,
        ObjectType::GroupAttributes,
        ObjectType::Indicators,
        ObjectType::IndicatorAttributes,
        ObjectType::Notes,
        ObjectType::Owners,
        ObjectType::OwnerRoles,
        ObjectType::SecurityLabels,
        ObjectType::SystemRoles,
        ObjectType::Tags,
        ObjectType::Tasks,
        ObjectType::Users,
        ObjectType::UserGroups,
        ObjectType::Victims,
        ObjectType::VictimAssets,
        ObjectType::VictimAttributes,
        ObjectType::WorkflowEvents,
        ObjectType::WorkflowTemplates,
    ];

    /// Plural snake_case name, also the directory name of the generated module.
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::AdversaryAssets => "adversary_assets",
            ObjectType::Artifacts => "artifacts",
            ObjectType::ArtifactTypes => "artifact_types",
            ObjectType::Cases => "cases",
            ObjectType::CaseAttributes => "case_attributes",
            ObjectType::Groups => "groups",
            ObjectType::GroupAttributes => "group_attributes",
            ObjectType::Indicators => "indicators",
            ObjectType::IndicatorAttributes => "indicator_attributes",
            ObjectType::Notes => "notes",
            ObjectType::Owners => "owners",
            ObjectType::OwnerRoles => "owner_roles",
            ObjectType::SecurityLabels => "security_labels",
            ObjectType::SystemRoles => "system_roles",
            ObjectType::Tags => "tags",
            ObjectType::Tasks => "tasks",
            ObjectType::Users => "users",
            ObjectType::UserGroups => "user_groups",
            ObjectType::Victims => "victims",
            ObjectType::VictimAssets => "victim_assets",
            ObjectType::VictimAttributes => "victim_attributes",
            ObjectType::WorkflowEvents => "workflow_events",
            ObjectType::WorkflowTemplates => "workflow_templates",
        }
    }

    /// Singular snake_case name used for generated file names.
    pub fn singular(&self) -> &'static str {
        match self {
            ObjectType::AdversaryAssets => "adversary_asset",
            ObjectType::Artifacts => "artifact",
            ObjectType::ArtifactTypes => "artifact_type",
            ObjectType::Cases => "case",
            ObjectType::CaseAttributes => "case_attribute",
            ObjectType::Groups => "group",
            ObjectType::GroupAttributes => "group_attribute",
            ObjectType::Indicators => "indicator",
            ObjectType::IndicatorAttributes => "indicator_attribute",
            ObjectType::Notes => "note",
            ObjectType::Owners => "owner",
            ObjectType::OwnerRoles => "owner_role",
            ObjectType::SecurityLabels => "security_label",
            ObjectType::SystemRoles => "system_role",
            ObjectType::Tags => "tag",
            ObjectType::Tasks => "task",
            ObjectType::Users => "user",
            ObjectType::UserGroups => "user_group",
            ObjectType::Victims => "victim",
            ObjectType::VictimAssets => "victim_asset",
            ObjectType::VictimAttributes => "victim_attribute",
            ObjectType::WorkflowEvents => "workflow_event",
            ObjectType::WorkflowTemplates => "workflow_template",
        }
    }

    /// `Indicators`, `VictimAssets`, ...
    pub fn camel_plural(&self) -> String {
        camel_case(self.as_str())
    }

    /// `Indicator`, `VictimAsset`, ...
    pub fn camel_singular(&self) -> String {
        camel_case(self.singular())
    }

    /// Path of the collection endpoint relative to the API server.
    pub fn api_endpoint(&self) -> &'static str {
        match self {
            ObjectType::AdversaryAssets => "/v3/groups/adversaryAssets",
            ObjectType::Artifacts => "/v3/artifacts",
            ObjectType::ArtifactTypes => "/v3/artifactTypes",
            ObjectType::Cases => "/v3/cases",
            ObjectType::CaseAttributes => "/v3/caseAttributes",
            ObjectType::Groups => "/v3/groups",
            ObjectType::GroupAttributes => "/v3/groupAttributes",
            ObjectType::Indicators => "/v3/indicators",
            ObjectType::IndicatorAttributes => "/v3/indicatorAttributes",
            ObjectType::Notes => "/v3/notes",
            ObjectType::Owners => "/v3/security/owners",
            ObjectType::OwnerRoles => "/v3/security/ownerRoles",
            ObjectType::SecurityLabels => "/v3/securityLabels",
            ObjectType::SystemRoles => "/v3/security/systemRoles",
            ObjectType::Tags => "/v3/tags",
            ObjectType::Tasks => "/v3/tasks",
            ObjectType::Users => "/v3/security/users",
            ObjectType::UserGroups => "/v3/security/userGroups",
            ObjectType::Victims => "/v3/victims",
            ObjectType::VictimAssets => "/v3/victimAssets",
            ObjectType::VictimAttributes => "/v3/victimAttributes",
            ObjectType::WorkflowEvents => "/v3/workflowEvents",
            ObjectType::WorkflowTemplates => "/v3/workflowTemplates",
        }
    }

    /// Module path (relative to `src/`) that holds this type's generated directory.
    pub fn module_path(&self) -> &'static str {
        match self {
            ObjectType::Owners
            | ObjectType::OwnerRoles
            | ObjectType::SystemRoles
            | ObjectType::Users
            | ObjectType::UserGroups => "v3/security",
            _ => "v3",
        }
    }

    /// Rust path of the generated module, e.g. `crate::v3::security::users`.
    pub fn rust_module(&self) -> String {
        format!(
            "crate::{}::{}",
            self.module_path().replace('/', "::"),
            self.as_str()
        )
    }

    /// Resolve a schema model name (`IndicatorsModel`, `Tag`, `UserModel`) to an
    /// object type. The boolean is `true` when the name is the plural (collection)
    /// form.
    pub fn from_model_name(name: &str) -> Option<(ObjectType, bool)> {
        let base = name.strip_suffix("Model").unwrap_or(name);
        ObjectType::ALL.iter().find_map(|t| {
            if t.camel_plural() == base {
                Some((*t, true))
            } else if t.camel_singular() == base {
                Some((*t, false))
            } else {
                None
            }
        })
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ObjectType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown object type: {s}"))
    }
}
