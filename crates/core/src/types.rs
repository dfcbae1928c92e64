//! Shared identifier and timestamp aliases.

use serde::{Deserialize, Serialize};

/// Stable identity shared by every version of one logical content item.
/// Never reused and never mutated once assigned.
pub type RootId = uuid::Uuid;

/// Identity of a single version snapshot.
pub type VersionId = uuid::Uuid;

/// Organization identifier.
pub type OrganizationId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Valid content kind strings (stored in DB).
pub const KIND_SERVICE: &str = "service";
pub const KIND_CHANNEL: &str = "channel";
pub const KIND_ORGANIZATION: &str = "organization";
pub const KIND_GENERAL_DESCRIPTION: &str = "general_description";
pub const KIND_SERVICE_COLLECTION: &str = "service_collection";

/// All valid content kind strings.
pub const VALID_CONTENT_KINDS: &[&str] = &[
    KIND_SERVICE,
    KIND_CHANNEL,
    KIND_ORGANIZATION,
    KIND_GENERAL_DESCRIPTION,
    KIND_SERVICE_COLLECTION,
];

/// The kinds of content items managed by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Service,
    Channel,
    Organization,
    GeneralDescription,
    ServiceCollection,
}

impl ContentKind {
    /// Convert from a database string value.
    pub fn from_str_value(s: &str) -> Result<Self, String> {
        match s {
            KIND_SERVICE => Ok(Self::Service),
            KIND_CHANNEL => Ok(Self::Channel),
            KIND_ORGANIZATION => Ok(Self::Organization),
            KIND_GENERAL_DESCRIPTION => Ok(Self::GeneralDescription),
            KIND_SERVICE_COLLECTION => Ok(Self::ServiceCollection),
            _ => Err(format!(
                "Invalid content kind '{s}'. Must be one of: {}",
                VALID_CONTENT_KINDS.join(", ")
            )),
        }
    }

    /// Convert to the database string value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Service => KIND_SERVICE,
            Self::Channel => KIND_CHANNEL,
            Self::Organization => KIND_ORGANIZATION,
            Self::GeneralDescription => KIND_GENERAL_DESCRIPTION,
            Self::ServiceCollection => KIND_SERVICE_COLLECTION,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_kind_round_trip() {
        for kind in &[
            ContentKind::Service,
            ContentKind::Channel,
            ContentKind::Organization,
            ContentKind::GeneralDescription,
            ContentKind::ServiceCollection,
        ] {
            assert_eq!(ContentKind::from_str_value(kind.as_str()).unwrap(), *kind);
        }
    }

    #[test]
    fn content_kind_from_str_invalid() {
        let result = ContentKind::from_str_value("webpage");
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("Invalid content kind"));
    }

    #[test]
    fn content_kinds_count() {
        assert_eq!(VALID_CONTENT_KINDS.len(), 5);
    }
}
