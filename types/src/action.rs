//! Action kinds and identity attributes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of civic action a claim describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    /// A message delivered to an elected representative. Requires a delivery proof.
    CongressionalMessage,
    /// Attendance at a protest, town hall, or other in-person action.
    DirectAction,
    /// Organizing work within a community (canvassing, phone banks, meetings).
    CommunityOrganizing,
    /// Public advocacy for a specific policy position.
    PolicyAdvocacy,
    /// Authoring a reusable message template.
    TemplateCreation,
}

impl ActionKind {
    pub const ALL: [ActionKind; 5] = [
        Self::CongressionalMessage,
        Self::DirectAction,
        Self::CommunityOrganizing,
        Self::PolicyAdvocacy,
        Self::TemplateCreation,
    ];

    /// Whether verification of this kind needs a message-delivery receipt.
    pub fn requires_delivery_proof(&self) -> bool {
        matches!(self, Self::CongressionalMessage)
    }

    /// Stable one-byte discriminant used in hash derivations.
    pub fn code(&self) -> u8 {
        match self {
            Self::CongressionalMessage => 0,
            Self::DirectAction => 1,
            Self::CommunityOrganizing => 2,
            Self::PolicyAdvocacy => 3,
            Self::TemplateCreation => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CongressionalMessage => "congressional_message",
            Self::DirectAction => "direct_action",
            Self::CommunityOrganizing => "community_organizing",
            Self::PolicyAdvocacy => "policy_advocacy",
            Self::TemplateCreation => "template_creation",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An identity predicate the identity provider can attest to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IdentityAttribute {
    /// Holder is of voting age.
    Adult,
    /// Holder is a citizen of the jurisdiction.
    Citizen,
    /// Holder resides in the represented district.
    Resident,
}

impl IdentityAttribute {
    pub const ALL: [IdentityAttribute; 3] = [Self::Adult, Self::Citizen, Self::Resident];

    pub fn code(&self) -> u8 {
        match self {
            Self::Adult => 0,
            Self::Citizen => 1,
            Self::Resident => 2,
        }
    }
}

impl fmt::Display for IdentityAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Adult => "adult",
            Self::Citizen => "citizen",
            Self::Resident => "resident",
        };
        f.write_str(s)
    }
}
