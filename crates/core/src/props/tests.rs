use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::{Value, json};
use url::form_urlencoded;

use super::*;
use crate::definition::{ComponentDefinition, PropDefinition, PropType};

fn binding() -> Binding {
	Binding {
		instance_id: Arc::from("inst-1"),
		tag: Arc::from("checkout"),
	}
}

fn definition() -> ComponentDefinition {
	ComponentDefinition::new("checkout")
		.with_url("https://x.example/default")
		.with_env_url("prod", "https://x.example/run")
		.with_prop("amount", PropDefinition::new(PropType::Number))
		.with_prop("label", PropDefinition::new(PropType::String).with_default(json!("Pay")))
		.with_prop("express", PropDefinition::new(PropType::Boolean))
		.with_prop("style", PropDefinition::new(PropType::Object))
		.with_prop("onApprove", PropDefinition::new(PropType::Function))
}

fn query_pairs(query: &str) -> Vec<(String, String)> {
	form_urlencoded::parse(query.as_bytes()).into_owned().collect()
}

#[test]
fn empty_input_yields_every_declared_key() {
	let def = definition();
	let schema = def.schema();
	let props = normalize_props(&schema, &RawProps::new(), None, &binding()).unwrap();

	for key in schema.keys() {
		assert!(props.contains_key(key), "missing normalized key {key}");
	}
	assert_eq!(props["amount"].as_i64(), Some(0));
	assert_eq!(props["label"].as_str(), Some("Pay"));
	assert_eq!(props["express"].as_bool(), Some(false));
	assert!(matches!(props["style"], PropValue::Null));
	assert!(matches!(props["onApprove"], PropValue::Null));
	assert!(props["onClose"].as_function().is_some(), "noop callbacks are filled in");
}

#[test]
fn normalization_is_idempotent() {
	let def = definition();
	let schema = def.schema();
	let raw = RawProps::from([
		("amount".to_string(), PropValue::from(12)),
		("style".to_string(), PropValue::from(json!({"b": 1, "a": [1, 2]}))),
		("onApprove".to_string(), PropValue::from(PropFunction::noop())),
	]);

	let first = normalize_props(&schema, &raw, None, &binding()).unwrap();
	let second = normalize_props(&schema, &raw, Some(&first), &binding()).unwrap();
	assert_eq!(stable_stringify(&first), stable_stringify(&second));
}

#[test]
fn empty_string_falls_back_to_default() {
	let def = definition();
	let raw = RawProps::from([("label".to_string(), PropValue::from(""))]);
	let props = normalize_props(&def.schema(), &raw, None, &binding()).unwrap();
	assert_eq!(props["label"].as_str(), Some("Pay"));
}

#[test]
fn unknown_prop_is_rejected_by_name() {
	let def = definition();
	let raw = RawProps::from([("colour".to_string(), PropValue::from("red"))]);
	let err = normalize_props(&def.schema(), &raw, None, &binding()).unwrap_err();
	match err {
		xframe_runtime::Error::Validation { key, .. } => assert_eq!(key, "colour"),
		other => panic!("expected validation error, got {other:?}"),
	}
}

#[test]
fn mistyped_prop_is_rejected_by_name() {
	let def = definition();
	let raw = RawProps::from([("amount".to_string(), PropValue::from("12"))]);
	let err = normalize_props(&def.schema(), &raw, None, &binding()).unwrap_err();
	assert!(err.to_string().contains("'amount'"));
	assert!(err.to_string().contains("expected number"));
}

#[test]
fn required_prop_without_default_is_rejected() {
	let def = ComponentDefinition::new("w")
		.with_url("https://w.example")
		.with_prop("token", PropDefinition::new(PropType::String).required());
	let err = normalize_props(&def.schema(), &RawProps::new(), None, &binding()).unwrap_err();
	assert!(err.to_string().contains("'token'"));
}

#[test]
fn boolean_query_only_when_true() {
	let def = definition();
	let schema = def.schema();

	let on = normalize_props(
		&schema,
		&RawProps::from([("express".to_string(), PropValue::from(true))]),
		None,
		&binding(),
	)
	.unwrap();
	assert!(query_pairs(&props_to_query(&on, &schema)).contains(&("express".into(), "1".into())));

	let off = normalize_props(
		&schema,
		&RawProps::from([("express".to_string(), PropValue::from(false))]),
		None,
		&binding(),
	)
	.unwrap();
	assert!(!query_pairs(&props_to_query(&off, &schema)).iter().any(|(k, _)| k == "express"));
}

#[test]
fn number_and_object_query_encoding() {
	let def = definition();
	let schema = def.schema();
	let style = json!({"color": "blue", "sizes": [1, 2, 3]});
	let raw = RawProps::from([
		("amount".to_string(), PropValue::from(1250)),
		("style".to_string(), PropValue::from(style.clone())),
		("onApprove".to_string(), PropValue::from(PropFunction::noop())),
	]);
	let props = normalize_props(&schema, &raw, None, &binding()).unwrap();
	let pairs = query_pairs(&props_to_query(&props, &schema));

	assert!(pairs.contains(&("amount".into(), "1250".into())));
	let encoded_style = pairs.iter().find(|(k, _)| k == "style").map(|(_, v)| v).unwrap();
	let decoded: Value = serde_json::from_str(encoded_style).unwrap();
	assert_eq!(decoded, style);
	assert!(!pairs.iter().any(|(k, _)| k.starts_with("on")), "functions never reach the query");
	assert!(!pairs.iter().any(|(k, _)| k == "timeout" || k == "url"));
}

#[test]
fn build_url_prefers_explicit_url_then_env_then_default() {
	let def = definition();
	let schema = def.schema();

	let with_env = normalize_props(
		&schema,
		&RawProps::from([("env".to_string(), PropValue::from("prod"))]),
		None,
		&binding(),
	)
	.unwrap();
	let url = build_url(&def, &with_env).unwrap();
	assert!(url.starts_with("https://x.example/run?"), "{url}");
	assert!(url.contains("env=prod"));

	let explicit = normalize_props(
		&schema,
		&RawProps::from([
			("env".to_string(), PropValue::from("prod")),
			("url".to_string(), PropValue::from("https://override.example/?a=b")),
		]),
		None,
		&binding(),
	)
	.unwrap();
	let url = build_url(&def, &explicit).unwrap();
	assert!(url.starts_with("https://override.example/?a=b&"), "{url}");

	let plain = normalize_props(&schema, &RawProps::new(), None, &binding()).unwrap();
	assert_eq!(build_url(&def, &plain).unwrap(), "https://x.example/default?amount=0&label=Pay");
}

#[test]
fn build_url_fails_without_any_base() {
	let def = ComponentDefinition::new("w").with_env_url("prod", "https://w.example");
	let props = normalize_props(&def.schema(), &RawProps::new(), None, &binding()).unwrap();
	assert!(build_url(&def, &props).unwrap_err().is_configuration());
}

#[test]
fn stable_stringify_ignores_key_order_but_tracks_function_identity() {
	let def = definition();
	let schema = def.schema();
	let f = PropFunction::noop();
	let g = PropFunction::sync(|_| Ok(Value::Null));

	let a = normalize_props(
		&schema,
		&RawProps::from([
			("style".to_string(), PropValue::from(json!({"x": 1, "y": 2}))),
			("onApprove".to_string(), PropValue::from(f.clone())),
		]),
		None,
		&binding(),
	)
	.unwrap();
	let b = normalize_props(
		&schema,
		&RawProps::from([
			("onApprove".to_string(), PropValue::from(f)),
			("style".to_string(), PropValue::from(json!({"y": 2, "x": 1}))),
		]),
		None,
		&binding(),
	)
	.unwrap();
	let c = normalize_props(
		&schema,
		&RawProps::from([
			("style".to_string(), PropValue::from(json!({"x": 1, "y": 2}))),
			("onApprove".to_string(), PropValue::from(g)),
		]),
		None,
		&binding(),
	)
	.unwrap();

	assert_eq!(stable_stringify(&a), stable_stringify(&b));
	assert_ne!(stable_stringify(&a), stable_stringify(&c));
}

#[tokio::test]
async fn functions_are_bound_to_the_instance() {
	let def = definition();
	let f = PropFunction::sync(|inv| Ok(json!(inv.instance_id.as_deref())));
	let raw = RawProps::from([("onApprove".to_string(), PropValue::from(f))]);
	let props = normalize_props(&def.schema(), &raw, None, &binding()).unwrap();

	let out = props["onApprove"].as_function().unwrap().call(vec![]).await.unwrap();
	assert_eq!(out, json!("inst-1"));
}

#[tokio::test]
async fn denodeify_adapts_callback_style() {
	let f = PropFunction::from_callback(|inv, done| {
		let n = inv.arg(0).and_then(Value::as_i64).unwrap_or_default();
		done.resolve(json!(n * 2));
	});
	assert!(f.is_callback_style());

	let plain = f.clone().call(vec![json!(4)]).await.unwrap();
	assert_eq!(plain, Value::Null, "unadapted callback style discards its outcome");

	let adapted = f.denodeify();
	assert!(!adapted.is_callback_style());
	assert_eq!(adapted.call(vec![json!(4)]).await.unwrap(), json!(8));
}

#[tokio::test]
async fn once_runs_at_most_once() {
	let calls = Arc::new(AtomicUsize::new(0));
	let counter = Arc::clone(&calls);
	let f = PropFunction::sync(move |_| {
		counter.fetch_add(1, Ordering::SeqCst);
		Ok(json!("ran"))
	})
	.once();

	assert_eq!(f.call(vec![]).await.unwrap(), json!("ran"));
	assert_eq!(f.call(vec![]).await.unwrap(), Value::Null);
	assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn memoize_caches_per_argument_list() {
	let calls = Arc::new(AtomicUsize::new(0));
	let counter = Arc::clone(&calls);
	let f = PropFunction::sync(move |inv| {
		counter.fetch_add(1, Ordering::SeqCst);
		Ok(inv.arg(0).cloned().unwrap_or_default())
	})
	.memoize();

	assert_eq!(f.call(vec![json!("a")]).await.unwrap(), json!("a"));
	assert_eq!(f.call(vec![json!("a")]).await.unwrap(), json!("a"));
	assert_eq!(f.call(vec![json!("b")]).await.unwrap(), json!("b"));
	assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn decorators_apply_in_fixed_order() {
	let def = PropDefinition::new(PropType::Function).memoize().once().denodeify();
	let f = function::decorate(PropFunction::noop(), &def);
	assert_eq!(f.decorators(), &[Decorator::Denodeify, Decorator::Once, Decorator::Memoize]);
	assert_eq!(f.signature(), "[function#0+denodeify+once+memoize]");
}

#[tokio::test]
async fn renormalizing_keeps_once_state() {
	let def = ComponentDefinition::new("w").with_url("https://w.example");
	let schema = def.schema();
	let calls = Arc::new(AtomicUsize::new(0));
	let counter = Arc::clone(&calls);
	let on_close = PropFunction::sync(move |_| {
		counter.fetch_add(1, Ordering::SeqCst);
		Ok(Value::Null)
	});
	let raw = RawProps::from([("onClose".to_string(), PropValue::from(on_close))]);

	let first = normalize_props(&schema, &raw, None, &binding()).unwrap();
	first["onClose"].as_function().unwrap().call(vec![]).await.unwrap();

	let second = normalize_props(&schema, &raw, Some(&first), &binding()).unwrap();
	second["onClose"].as_function().unwrap().call(vec![]).await.unwrap();
	assert_eq!(calls.load(Ordering::SeqCst), 1);
}
