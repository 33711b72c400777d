use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use recast::{
    AsyncCodec, AsyncLoad, ConvertError, CustomDef, DeferredLoad, FieldDef, GatedRegistry, Load,
    LoadContext, RecordDef, Shape, TypeScope, TypedValue, from_json, from_json_async,
    from_json_async_with, from_json_with, registry, to_json,
};
use serde_json::{Value, json};
use tokio::time::sleep;

mod common;
use common::*;

/// Codec whose decode side suspends, standing in for a type that must
/// wait on out-of-band work to materialize.
struct SleepyIntCodec;

#[async_trait]
impl AsyncCodec for SleepyIntCodec {
    async fn decode(&self, value: Value) -> Result<TypedValue, ConvertError> {
        let n = value
            .as_i64()
            .ok_or_else(|| ConvertError::mismatch("int", &value))?;
        sleep(Duration::from_millis(5)).await;
        Ok(TypedValue::Int(n))
    }

    fn encode(&self, inner: &TypedValue) -> Result<Value, ConvertError> {
        match inner {
            TypedValue::Int(n) => Ok(json!(n)),
            other => Err(ConvertError::codec("SleepyInt", format!("unexpected {other:?}"))),
        }
    }
}

fn sleepy_def() -> Arc<CustomDef> {
    CustomDef::with_async("SleepyInt", Arc::new(SleepyIntCodec))
}

#[tokio::test]
async fn async_codec_field_fully_resolves() {
    let sleepy = sleepy_def();
    let scope = TypeScope::new();
    let rec = RecordDef::declare(
        &scope,
        "Holder",
        [],
        [FieldDef::new("async_member", Shape::Custom(sleepy.clone()))],
    );
    let shape = Shape::record(rec);

    let loaded = from_json_async(&shape, &json!({"async_member": 1}))
        .await
        .unwrap();
    assert_eq!(
        loaded.field("async_member"),
        Some(&TypedValue::custom(sleepy.clone(), TypedValue::Int(1)))
    );

    // The resolved value stores back through the codec.
    assert_eq!(to_json(&loaded).unwrap(), json!({"async_member": 1}));
}

#[tokio::test]
async fn sync_entry_point_rejects_suspension() {
    let sleepy = sleepy_def();
    let scope = TypeScope::new();
    let rec = RecordDef::declare(
        &scope,
        "Holder",
        [],
        [FieldDef::new("async_member", Shape::Custom(sleepy))],
    );
    let err = from_json(&Shape::record(rec), &json!({"async_member": 1})).unwrap_err();
    assert!(matches!(err, ConvertError::AsyncInSyncContext), "{err}");
}

#[tokio::test]
async fn async_codecs_resolve_at_any_depth() {
    let sleepy = sleepy_def();
    let shape = Shape::map(Shape::seq(Shape::Custom(sleepy.clone())));
    let loaded = from_json_async(&shape, &json!({"a": [1, 2], "b": [3]}))
        .await
        .unwrap();
    assert_eq!(
        loaded,
        map(vec![
            (
                "a",
                seq(vec![
                    TypedValue::custom(sleepy.clone(), TypedValue::Int(1)),
                    TypedValue::custom(sleepy.clone(), TypedValue::Int(2)),
                ])
            ),
            ("b", seq(vec![TypedValue::custom(sleepy, TypedValue::Int(3))])),
        ])
    );
}

/// Async loader used directly as the dispatch root, the way a caller
/// supplies a one-off converter for a single load.
struct ChainLoader;

#[async_trait]
impl AsyncLoad for ChainLoader {
    fn can_load(&self, shape: &Shape) -> bool {
        matches!(shape, Shape::Seq(_))
    }

    async fn load(
        &self,
        _ctx: &mut LoadContext,
        value: Value,
        _shape: Shape,
    ) -> Result<TypedValue, ConvertError> {
        let items = value
            .as_array()
            .ok_or_else(|| ConvertError::mismatch("seq[float]", &value))?;
        sleep(Duration::from_millis(5)).await;
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            let f = item
                .as_f64()
                .ok_or_else(|| ConvertError::mismatch("float", item))?;
            out.push(TypedValue::Int(f as i64));
        }
        Ok(TypedValue::Seq(out))
    }
}

#[tokio::test]
async fn async_loader_as_root() {
    let root: Arc<dyn Load> = Arc::new(DeferredLoad::new(ChainLoader));
    let shape = Shape::seq(Shape::float());
    let loaded = from_json_async_with(root.clone(), &shape, &json!([3.5, 2.5, 1.5]))
        .await
        .unwrap();
    assert_eq!(loaded, seq(vec![ival(3), ival(2), ival(1)]));

    let err = from_json_with(root, &shape, &json!([3.5])).unwrap_err();
    assert!(matches!(err, ConvertError::AsyncInSyncContext), "{err}");
}

#[tokio::test]
async fn gated_registry_blocks_until_opened() {
    let gated = GatedRegistry::new(registry());
    let root: Arc<dyn Load> = Arc::new(gated.clone());

    let shape = Shape::seq(Shape::int());
    let value = json!([1, 2, 3]);
    let pending = tokio::spawn(async move {
        from_json_async_with(root, &shape, &value).await
    });

    sleep(Duration::from_millis(20)).await;
    assert!(!pending.is_finished(), "conversion must wait for the gate");

    gated.open();
    gated.open(); // idempotent

    let loaded = pending.await.unwrap().unwrap();
    assert_eq!(loaded, seq(vec![ival(1), ival(2), ival(3)]));
}

#[tokio::test]
async fn closed_gate_is_rejected_by_the_sync_entry_point() {
    let gated = GatedRegistry::new(registry());
    let err = from_json_with(
        Arc::new(gated.clone()),
        &Shape::int(),
        &json!(1),
    )
    .unwrap_err();
    assert!(matches!(err, ConvertError::AsyncInSyncContext), "{err}");

    // Once open, the gate delegates synchronously.
    gated.open();
    let loaded = from_json_with(Arc::new(gated), &Shape::int(), &json!(1)).unwrap();
    assert_eq!(loaded, ival(1));
}

#[tokio::test]
async fn open_gate_releases_future_waiters_immediately() {
    let gated = GatedRegistry::new(registry());
    gated.open();
    let loaded = from_json_async_with(Arc::new(gated), &Shape::int(), &json!(5))
        .await
        .unwrap();
    assert_eq!(loaded, ival(5));
}
