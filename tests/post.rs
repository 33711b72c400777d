//! Regression test over a realistic API payload: nested records, enums,
//! optional unions, datetimes, and a self-referential forward reference,
//! loaded leniently from a document carrying extra server-side keys.

use std::sync::Arc;

use recast::{
    ConvertError, FieldDef, RecordDef, Shape, TypeScope, TypedValue, from_json,
    from_json_lenient,
};
use serde_json::json;

mod common;
use common::*;

fn declare_post(scope: &TypeScope) -> Arc<RecordDef> {
    let emoji = RecordDef::declare(
        scope,
        "Emoji",
        [],
        [
            FieldDef::new("shortcode", Shape::string()),
            FieldDef::new("url", Shape::string()),
        ],
    );
    let account = RecordDef::declare(
        scope,
        "Account",
        [],
        [
            FieldDef::new("id", Shape::string()),
            FieldDef::new("username", Shape::string()),
            FieldDef::new("bot", Shape::boolean()),
            FieldDef::new("created_at", Shape::DateTime),
            FieldDef::new("followers_count", Shape::int()),
            FieldDef::new("emojis", Shape::seq(Shape::record(emoji))),
        ],
    );
    RecordDef::declare(
        scope,
        "Post",
        [],
        [
            FieldDef::new("id", Shape::string()),
            FieldDef::new("created_at", Shape::DateTime),
            FieldDef::new("account", Shape::record(account)),
            FieldDef::new("visibility", Shape::Enum(privacy_enum())),
            FieldDef::new("sensitive", Shape::boolean()),
            FieldDef::new("content", Shape::string()),
            FieldDef::new("url", Shape::optional(Shape::string())),
            FieldDef::new("language", Shape::optional(Shape::string())),
            FieldDef::new("reblog", Shape::optional(Shape::reference("Post"))),
            FieldDef::new("media_attachments", Shape::seq(Shape::Any)),
        ],
    )
}

fn payload() -> serde_json::Value {
    json!({
        "id": "109958407801025523",
        "created_at": "2023-03-03T08:29:10.291Z",
        "sensitive": false,
        "visibility": "public",
        "language": "en",
        "url": "https://mastodon.example/@dunkyl/109958407801025523",
        "content": "<p>test 4</p>",
        "reblog": null,
        "media_attachments": [],
        "account": {
            "id": "109289749579593700",
            "username": "dunkyl",
            "bot": false,
            "created_at": "2022-11-05T00:00:00.000Z",
            "followers_count": 5,
            "emojis": [],
            // Extra server-side keys the declared shape does not know.
            "noindex": false,
            "roles": []
        },
        // More extra keys at the top level.
        "uri": "https://mastodon.example/users/dunkyl/statuses/109958407801025523",
        "favourited": false,
        "reblogged": false,
        "replies_count": 0
    })
}

#[test]
fn lenient_load_tolerates_extra_server_keys() {
    let scope = TypeScope::new();
    let post = declare_post(&scope);
    let shape = Shape::optional(Shape::record(post));

    let loaded = from_json_lenient(&shape, &payload()).unwrap();
    assert_eq!(loaded.field("content"), Some(&sval("<p>test 4</p>")));
    match loaded.field("visibility") {
        Some(TypedValue::Enum { def, variant }) => {
            assert_eq!(def.name, "Privacy");
            assert_eq!(def.variants[*variant].name, "Public");
        }
        other => panic!("expected enum visibility, got {other:?}"),
    }
    assert_eq!(loaded.field("reblog"), Some(&TypedValue::Null));
    assert_eq!(
        loaded.field("account").and_then(|a| a.field("username")),
        Some(&sval("dunkyl"))
    );
    match loaded.field("created_at") {
        Some(TypedValue::DateTime(dt)) => {
            assert_eq!(dt.timestamp_subsec_millis(), 291);
        }
        other => panic!("expected datetime, got {other:?}"),
    }
}

#[test]
fn strict_load_rejects_the_same_payload() {
    let scope = TypeScope::new();
    let post = declare_post(&scope);
    let shape = Shape::record(post);

    let err = from_json(&shape, &payload()).unwrap_err();
    match err {
        ConvertError::FieldMismatch { unexpected, .. } => {
            assert!(unexpected.contains(&"favourited".to_owned()));
            assert!(unexpected.contains(&"uri".to_owned()));
        }
        other => panic!("expected field mismatch, got {other}"),
    }
}

#[test]
fn nested_reblog_resolves_the_forward_reference() {
    let scope = TypeScope::new();
    let post = declare_post(&scope);
    let shape = Shape::record(post);

    let mut doc = payload();
    // Embed a reblogged post, itself with a null reblog.
    let inner = payload();
    doc["reblog"] = inner;

    let loaded = from_json_lenient(&shape, &doc).unwrap();
    let reblog = loaded.field("reblog").unwrap();
    assert_eq!(reblog.field("content"), Some(&sval("<p>test 4</p>")));
    assert_eq!(reblog.field("reblog"), Some(&TypedValue::Null));
}
