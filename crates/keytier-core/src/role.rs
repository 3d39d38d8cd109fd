//! # Role Hierarchy — Single Source of Truth
//!
//! Defines the `Role` enum with the five tiers of the distribution
//! hierarchy and the static edge table of permitted parent→child pairs.
//! This is the ONE definition used across the entire workspace. Every
//! `match` on `Role` must be exhaustive — adding a tier forces every
//! consumer to handle it at compile time.
//!
//! ## Security Invariant
//!
//! A single strict parser prevents the loose-role-string defect class
//! (`"super_admin"` vs `"super-admin"` spellings drifting apart and
//! silently producing empty query results). Non-canonical spellings are
//! rejected at the boundary, never normalized.
//!
//! The edge table is consulted by both transfer authorization and
//! directory queries, so the hierarchy shape is written down in exactly
//! one place.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::CoreError;

/// A tier in the distribution hierarchy.
///
/// Keys flow strictly downward: a super-admin mints them, each tier
/// transfers to the tier directly below, and a retailer finally binds a
/// key to an end user. There are no lateral or upward movements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Mints keys and holds revocation authority.
    SuperAdmin,
    /// First distribution tier below the super-admin.
    SuperDistributor,
    /// Second distribution tier.
    Distributor,
    /// Final distribution tier; provisions keys to end users.
    Retailer,
    /// Consumer of a provisioned key. Not a distribution participant.
    EndUser,
}

/// One permitted parent→child edge in the hierarchy.
///
/// `link_field` is the name of the field on a child's directory record
/// that references its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HierarchyEdge {
    /// Role of the parent participant.
    pub parent: Role,
    /// Role of the child participant.
    pub child: Role,
    /// Field on the child record naming the parent.
    pub link_field: &'static str,
}

/// All permitted parent→child edges, top to bottom.
///
/// The final edge (retailer → end user) is the provisioning edge: keys
/// cross it by being consumed, not transferred.
pub const HIERARCHY_EDGES: &[HierarchyEdge] = &[
    HierarchyEdge {
        parent: Role::SuperAdmin,
        child: Role::SuperDistributor,
        link_field: "super_admin_id",
    },
    HierarchyEdge {
        parent: Role::SuperDistributor,
        child: Role::Distributor,
        link_field: "super_distributor_id",
    },
    HierarchyEdge {
        parent: Role::Distributor,
        child: Role::Retailer,
        link_field: "distributor_id",
    },
    HierarchyEdge {
        parent: Role::Retailer,
        child: Role::EndUser,
        link_field: "retailer_id",
    },
];

impl Role {
    /// Returns all five roles in hierarchy order.
    pub fn all() -> &'static [Role] {
        &[
            Self::SuperAdmin,
            Self::SuperDistributor,
            Self::Distributor,
            Self::Retailer,
            Self::EndUser,
        ]
    }

    /// Returns the snake_case string identifier for this role.
    ///
    /// This must match the serde serialization format.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SuperAdmin => "super_admin",
            Self::SuperDistributor => "super_distributor",
            Self::Distributor => "distributor",
            Self::Retailer => "retailer",
            Self::EndUser => "end_user",
        }
    }

    /// The role directly below this one, if any.
    pub fn child(&self) -> Option<Role> {
        HIERARCHY_EDGES
            .iter()
            .find(|e| e.parent == *self)
            .map(|e| e.child)
    }

    /// The role directly above this one, if any.
    pub fn parent(&self) -> Option<Role> {
        HIERARCHY_EDGES
            .iter()
            .find(|e| e.child == *self)
            .map(|e| e.parent)
    }

    /// Field on this role's directory record naming its parent, if any.
    pub fn link_field(&self) -> Option<&'static str> {
        HIERARCHY_EDGES
            .iter()
            .find(|e| e.child == *self)
            .map(|e| e.link_field)
    }

    /// Whether this role may transfer keys to `to`.
    ///
    /// Transfers are legal only along a hierarchy edge whose child is a
    /// distribution tier. The retailer → end-user edge is excluded: keys
    /// reach end users through provisioning, not transfer.
    pub fn can_transfer_to(&self, to: Role) -> bool {
        to != Role::EndUser
            && HIERARCHY_EDGES
                .iter()
                .any(|e| e.parent == *self && e.child == to)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    /// Parse a role from its canonical snake_case identifier.
    ///
    /// Strict: accepts exactly the identifiers produced by
    /// [`Role::as_str()`]. Hyphenated, spaced, or cased variants are
    /// rejected with [`CoreError::UnknownRole`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "super_admin" => Ok(Self::SuperAdmin),
            "super_distributor" => Ok(Self::SuperDistributor),
            "distributor" => Ok(Self::Distributor),
            "retailer" => Ok(Self::Retailer),
            "end_user" => Ok(Self::EndUser),
            other => Err(CoreError::UnknownRole(other.to_string())),
        }
    }
}
