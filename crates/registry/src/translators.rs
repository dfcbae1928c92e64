//! Concrete translator definitions for the registry's view shapes.
//!
//! One declarative [`Definition`] per (snapshot, view) pair serves both
//! "add a new item" and "edit an existing item": the dispatch rule is the
//! only place identity is resolved. Snapshots are the typed form of the
//! `content_versions.payload` column.

use std::collections::BTreeMap;
use std::sync::Arc;

use sercat_core::error::CoreError;
use sercat_core::language::{LanguageCache, LanguageCode};
use sercat_core::translate::{CollectionSemantics, Definition, DirectionSupport};
use sercat_core::types::{RootId, VersionId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Snapshot types (payload schema)
// ---------------------------------------------------------------------------

/// One translated text value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalizedText {
    pub language: LanguageCode,
    pub value: String,
}

/// A reference from a service payload to a connected channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelRef {
    pub id: Option<Uuid>,
    pub channel_root_id: RootId,
}

/// Typed form of a service version's payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceSnapshot {
    pub id: Option<VersionId>,
    pub names: Vec<LocalizedText>,
    pub summaries: Vec<LocalizedText>,
    pub keywords: Vec<String>,
    pub channels: Vec<ChannelRef>,
}

/// Typed form of a channel version's payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelSnapshot {
    pub id: Option<VersionId>,
    pub names: Vec<LocalizedText>,
    pub support_email: Option<String>,
}

// ---------------------------------------------------------------------------
// View types
// ---------------------------------------------------------------------------

/// Channel reference as the form layer sees it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelRefView {
    pub id: Option<Uuid>,
    pub channel_root_id: RootId,
}

/// Service edit view: localized dictionaries keyed by language code.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceView {
    pub id: Option<VersionId>,
    pub names: BTreeMap<String, String>,
    pub summaries: BTreeMap<String, String>,
    pub keywords: Vec<String>,
    pub channels: Vec<ChannelRefView>,
}

/// Channel edit view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelView {
    pub id: Option<VersionId>,
    pub names: BTreeMap<String, String>,
    pub support_email: Option<String>,
}

/// Flat listing line for search results; view-only by design.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceListingView {
    pub id: Option<VersionId>,
    pub name_count: usize,
    pub channel_count: usize,
}

// ---------------------------------------------------------------------------
// Payload codec
// ---------------------------------------------------------------------------

/// Decode a version payload into its typed snapshot.
pub fn snapshot_from_payload<S: for<'de> Deserialize<'de>>(
    payload: &serde_json::Value,
) -> Result<S, CoreError> {
    serde_json::from_value(payload.clone()).map_err(|e| CoreError::Mapping(e.to_string()))
}

/// Encode a typed snapshot back into the payload column.
pub fn snapshot_to_payload<S: Serialize>(snapshot: &S) -> Result<serde_json::Value, CoreError> {
    serde_json::to_value(snapshot).map_err(|e| CoreError::Mapping(e.to_string()))
}

// ---------------------------------------------------------------------------
// Definitions
// ---------------------------------------------------------------------------

fn channel_ref_definition() -> Arc<Definition<ChannelRef, ChannelRefView>> {
    Arc::new(
        Definition::new("channel_ref")
            .dispatch(
                "channel_ref.id",
                |v: &ChannelRefView| v.id,
                |s: &mut ChannelRef, id| s.id = Some(id),
                Uuid::new_v4,
            )
            .read_only("channel_ref.view_id", |s: &ChannelRef, t: &mut ChannelRefView| {
                t.id = s.id
            })
            .simple(
                "channel_ref.root",
                |s: &ChannelRef, t: &mut ChannelRefView| t.channel_root_id = s.channel_root_id,
                |t: &ChannelRefView, s: &mut ChannelRef| s.channel_root_id = t.channel_root_id,
            ),
    )
}

/// Edit-form mapping for service versions.
///
/// Channel references use replace semantics: the form always submits the
/// full connection selection.
pub fn service_definition(cache: Arc<LanguageCache>) -> Definition<ServiceSnapshot, ServiceView> {
    Definition::new("service")
        .includes(&["names", "summaries", "channels"])
        .dispatch(
            "service.id",
            |v: &ServiceView| v.id,
            |s: &mut ServiceSnapshot, id| s.id = Some(id),
            Uuid::new_v4,
        )
        .read_only("service.view_id", |s: &ServiceSnapshot, t: &mut ServiceView| {
            t.id = s.id
        })
        .simple(
            "service.keywords",
            |s: &ServiceSnapshot, t: &mut ServiceView| t.keywords = s.keywords.clone(),
            |t: &ServiceView, s: &mut ServiceSnapshot| s.keywords = t.keywords.clone(),
        )
        .localized(
            "service.names",
            Arc::clone(&cache),
            |s: &ServiceSnapshot| s.names.as_slice(),
            |n: &LocalizedText| &n.language,
            |n: &LocalizedText| n.value.clone(),
            |t: &mut ServiceView, dict| t.names = dict,
            |t: &ServiceView| &t.names,
            |language, value| LocalizedText { language, value },
            |s: &mut ServiceSnapshot, entries| s.names = entries,
        )
        .localized(
            "service.summaries",
            cache,
            |s: &ServiceSnapshot| s.summaries.as_slice(),
            |n: &LocalizedText| &n.language,
            |n: &LocalizedText| n.value.clone(),
            |t: &mut ServiceView, dict| t.summaries = dict,
            |t: &ServiceView| &t.summaries,
            |language, value| LocalizedText { language, value },
            |s: &mut ServiceSnapshot, entries| s.summaries = entries,
        )
        .collection(
            "service.channels",
            channel_ref_definition(),
            CollectionSemantics::Replace,
            |s: &ServiceSnapshot| s.channels.as_slice(),
            |t: &mut ServiceView, views| t.channels = views,
            |t: &ServiceView| t.channels.as_slice(),
            |s: &mut ServiceSnapshot, rows| s.channels = rows,
            |row: &ChannelRef, view: &ChannelRefView| row.id.is_some() && row.id == view.id,
        )
}

/// Edit-form mapping for channel versions.
pub fn channel_definition(cache: Arc<LanguageCache>) -> Definition<ChannelSnapshot, ChannelView> {
    Definition::new("channel")
        .includes(&["names"])
        .dispatch(
            "channel.id",
            |v: &ChannelView| v.id,
            |s: &mut ChannelSnapshot, id| s.id = Some(id),
            Uuid::new_v4,
        )
        .read_only("channel.view_id", |s: &ChannelSnapshot, t: &mut ChannelView| {
            t.id = s.id
        })
        .localized(
            "channel.names",
            cache,
            |s: &ChannelSnapshot| s.names.as_slice(),
            |n: &LocalizedText| &n.language,
            |n: &LocalizedText| n.value.clone(),
            |t: &mut ChannelView, dict| t.names = dict,
            |t: &ChannelView| &t.names,
            |language, value| LocalizedText { language, value },
            |s: &mut ChannelSnapshot, entries| s.names = entries,
        )
        .simple(
            "channel.support_email",
            |s: &ChannelSnapshot, t: &mut ChannelView| t.support_email = s.support_email.clone(),
            |t: &ChannelView, s: &mut ChannelSnapshot| s.support_email = t.support_email.clone(),
        )
}

/// Search-listing mapping; inherently one-way.
pub fn service_listing_definition() -> Definition<ServiceSnapshot, ServiceListingView> {
    Definition::new("service_listing")
        .support(DirectionSupport::ViewOnly)
        .read_only("listing.id", |s: &ServiceSnapshot, t: &mut ServiceListingView| {
            t.id = s.id
        })
        .read_only(
            "listing.counts",
            |s: &ServiceSnapshot, t: &mut ServiceListingView| {
                t.name_count = s.names.len();
                t.channel_count = s.channels.len();
            },
        )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use sercat_core::translate::TranslateError;

    fn cache() -> Arc<LanguageCache> {
        Arc::new(LanguageCache::new([
            (LanguageCode::new("fi"), 1),
            (LanguageCode::new("sv"), 2),
            (LanguageCode::new("en"), 3),
        ]))
    }

    fn sample_service() -> ServiceSnapshot {
        ServiceSnapshot {
            id: Some(Uuid::new_v4()),
            names: vec![
                LocalizedText {
                    language: LanguageCode::new("fi"),
                    value: "Kotihoito".into(),
                },
                LocalizedText {
                    language: LanguageCode::new("sv"),
                    value: "Hemvård".into(),
                },
            ],
            summaries: vec![LocalizedText {
                language: LanguageCode::new("fi"),
                value: "Hoitoa kotiin".into(),
            }],
            keywords: vec!["care".into(), "home".into()],
            channels: vec![ChannelRef {
                id: Some(Uuid::new_v4()),
                channel_root_id: Uuid::new_v4(),
            }],
        }
    }

    #[test]
    fn service_view_carries_localized_dictionaries() {
        let snapshot = sample_service();
        let view = service_definition(cache()).to_view(&snapshot).unwrap();
        assert_eq!(view.names.len(), 2);
        assert_eq!(view.names.get("fi").map(String::as_str), Some("Kotihoito"));
        assert_eq!(view.summaries.len(), 1);
        assert_eq!(view.channels.len(), 1);
        assert_eq!(view.keywords, snapshot.keywords);
    }

    #[test]
    fn one_definition_serves_create_and_edit() {
        let definition = service_definition(cache());

        // Create: no identifier on the view; one is minted.
        let mut view = ServiceView::default();
        view.names.insert("fi".into(), "Uusi palvelu".into());
        let created = definition.to_source(&view, None).unwrap();
        assert!(created.id.is_some());

        // Edit: the same definition updates in place.
        let snapshot = sample_service();
        let view = definition.to_view(&snapshot).unwrap();
        let updated = definition.to_source(&view, Some(snapshot.clone())).unwrap();
        assert_eq!(updated.id, snapshot.id);
    }

    #[test]
    fn unchanged_service_round_trip_has_no_drift() {
        let definition = service_definition(cache());
        let snapshot = sample_service();

        let view = definition.to_view(&snapshot).unwrap();
        let first = definition.to_source(&view, Some(snapshot.clone())).unwrap();
        let second = definition
            .to_source(&definition.to_view(&first).unwrap(), Some(first.clone()))
            .unwrap();

        assert_eq!(first.channels.len(), snapshot.channels.len());
        assert_eq!(first.channels[0].id, snapshot.channels[0].id);
        assert_eq!(second, first);
    }

    #[test]
    fn payload_codec_round_trips_through_json() {
        let snapshot = sample_service();
        let payload = snapshot_to_payload(&snapshot).unwrap();
        let decoded: ServiceSnapshot = snapshot_from_payload(&payload).unwrap();
        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn malformed_payload_is_a_mapping_error() {
        let payload = serde_json::json!({"names": 42});
        let result: Result<ServiceSnapshot, CoreError> = snapshot_from_payload(&payload);
        assert!(matches!(result, Err(CoreError::Mapping(_))));
    }

    #[test]
    fn channel_definition_round_trips() {
        let snapshot = ChannelSnapshot {
            id: Some(Uuid::new_v4()),
            names: vec![LocalizedText {
                language: LanguageCode::new("en"),
                value: "Service desk".into(),
            }],
            support_email: Some("desk@example.org".into()),
        };
        let definition = channel_definition(cache());
        let view = definition.to_view(&snapshot).unwrap();
        let written = definition.to_source(&view, Some(snapshot.clone())).unwrap();
        assert_eq!(written, snapshot);
    }

    #[test]
    fn listing_definition_is_view_only() {
        let definition = service_listing_definition();
        let view = definition.to_view(&sample_service()).unwrap();
        assert_eq!(view.name_count, 2);
        assert_eq!(view.channel_count, 1);

        let err = definition
            .to_source(&ServiceListingView::default(), None)
            .expect_err("must fail");
        assert!(matches!(err, TranslateError::DirectionNotSupported { .. }));
    }

    #[test]
    fn unknown_language_in_view_dictionary_fails() {
        let definition = service_definition(cache());
        let mut view = ServiceView::default();
        view.names.insert("xx".into(), "?".into());
        let err = definition.to_source(&view, None).expect_err("must fail");
        assert!(matches!(err, TranslateError::UnknownLanguage(_)));
    }
}
