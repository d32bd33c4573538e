// Integration tests for render, context resolution and surface setup.

mod harness;

use harness::{props, setup, widget};
use xframe::testing::MockHost;
use xframe::{
	ComponentDefinition, Context, Dimensions, HostConfig, LifecycleState, MessageKind, PropValue, RawProps, WindowHost,
	WindowName,
};

#[tokio::test]
async fn test_element_target_selects_iframe_and_env_url() {
	let (mock, host) = setup();
	host.register(
		ComponentDefinition::new("checkout")
			.with_env_url("prod", "https://x.example/run")
			.with_contexts([Context::Iframe, Context::Lightbox]),
	)
	.expect("Failed to register checkout");
	mock.add_element("#container");

	let checkout = host
		.create(
			"checkout",
			props([("timeout", PropValue::from(5000)), ("env", PropValue::from("prod"))]),
		)
		.expect("Failed to create instance");
	checkout
		.render(Some("#container".into()), None)
		.expect("Render should succeed");

	assert_eq!(checkout.context(), Some(Context::Iframe));
	assert_eq!(checkout.url(), "https://x.example/run?env=prod");
	assert_eq!(checkout.state(), LifecycleState::PendingInit);

	let surface = checkout.surface().expect("Surface should be attached");
	let frame = surface.frame.expect("Iframe surface has a frame element");
	assert_eq!(mock.frame_src(&frame).as_deref(), Some("https://x.example/run?env=prod"));
	assert!(checkout.overlay().is_none(), "Iframe renders without overlay");

	checkout.destroy();
}

#[tokio::test]
async fn test_element_target_requires_iframe_context() {
	let (mock, host) = setup();
	host.register(
		ComponentDefinition::new("checkout")
			.with_env_url("prod", "https://x.example/run")
			.with_contexts([Context::Lightbox]),
	)
	.expect("Failed to register checkout");
	mock.add_element("#container");

	let checkout = host
		.create("checkout", props([("env", PropValue::from("prod"))]))
		.expect("Failed to create instance");
	let err = checkout.render(Some("#container".into()), None).unwrap_err();
	assert!(err.is_configuration(), "Expected configuration error, got {err}");
	assert_eq!(mock.open_window_count(), 0);
}

#[tokio::test]
async fn test_render_twice_fails_with_configuration_error() {
	let (mock, host) = setup();
	host.register(widget()).unwrap();
	mock.add_element("#slot");

	let instance = host.create("widget", RawProps::new()).unwrap();
	instance.render(Some("#slot".into()), None).unwrap();

	for context in [None, Some(Context::Popup), Some(Context::Lightbox)] {
		let err = instance.render(None, context).unwrap_err();
		assert!(err.is_configuration(), "Second render must fail: {err}");
	}
	assert_eq!(mock.open_window_count(), 1);
	instance.destroy();
}

#[tokio::test]
async fn test_disallowed_context_leaks_nothing() {
	let (mock, host) = setup();
	host.register(widget().with_contexts([Context::Iframe])).unwrap();
	let elements = mock.element_count();

	let instance = host.create("widget", RawProps::new()).unwrap();
	let err = instance.render(None, Some(Context::Popup)).unwrap_err();

	assert!(err.is_configuration());
	assert_eq!(instance.state(), LifecycleState::Created);
	assert_eq!(mock.open_window_count(), 0);
	assert_eq!(mock.element_count(), elements);
	assert_eq!(mock.listener_count(), 0);
	assert_eq!(mock.observer_count(), 0);
}

#[tokio::test]
async fn test_missing_element_is_configuration_error() {
	let (_mock, host) = setup();
	host.register(widget()).unwrap();

	let instance = host.create("widget", RawProps::new()).unwrap();
	let err = instance.render(Some("#nowhere".into()), None).unwrap_err();
	assert!(err.is_configuration());
	assert!(err.to_string().contains("#nowhere"));
}

#[tokio::test]
async fn test_singleton_rejects_second_live_instance() {
	let (_mock, host) = setup();
	host.register(widget().singleton()).unwrap();

	let first = host.create("widget", RawProps::new()).unwrap();
	let err = host.create("widget", RawProps::new()).unwrap_err();
	assert!(err.is_configuration());

	first.destroy();
	let second = host.create("widget", RawProps::new()).expect("Singleton is free again after destroy");
	second.destroy();
	assert!(host.tracker().is_empty());
}

#[tokio::test]
async fn test_invalid_props_fail_construction() {
	let (_mock, host) = setup();
	host.register(widget()).unwrap();

	let err = host
		.create("widget", props([("colour", PropValue::from("red"))]))
		.unwrap_err();
	assert!(err.is_configuration());
	assert!(err.to_string().contains("colour"));
	assert!(host.tracker().is_empty());
}

#[tokio::test]
async fn test_lightbox_opens_frame_in_container_with_overlay() {
	let (mock, host) = setup();
	let mut definition = widget().with_template("<p>Loading</p>", Some("p { color: grey }".into()));
	definition.overlay_styles = Some(".xframe-overlay { opacity: .5 }".into());
	host.register(definition).unwrap();
	let elements = mock.element_count();

	let instance = host.create("widget", RawProps::new()).unwrap();
	instance.render(None, Some(Context::Lightbox)).unwrap();

	let surface = instance.surface().unwrap();
	assert!(surface.container.is_some());
	assert!(instance.overlay().is_some());
	let window = surface.window.clone();
	assert_eq!(
		mock.document(&window),
		Some(("<p>Loading</p>".to_string(), Some("p { color: grey }".to_string())))
	);
	assert_eq!(mock.window_url(&window).as_deref(), Some("https://w.example/app"));
	// Container, frame, overlay, overlay stylesheet.
	assert_eq!(mock.element_count(), elements + 4);

	instance.destroy();
	assert_eq!(mock.element_count(), elements);
	assert!(mock.is_window_closed(&window));
	assert_eq!(mock.listener_count(), 0);
	assert_eq!(instance.pending_cleanup(), 0);
}

#[tokio::test]
async fn test_default_context_prefers_lightbox_then_popup() {
	let (_mock, host) = setup();
	host.register(widget().with_contexts([Context::Popup, Context::Lightbox])).unwrap();

	let instance = host.create("widget", RawProps::new()).unwrap();
	instance.render(None, None).unwrap();
	assert_eq!(instance.context(), Some(Context::Lightbox));
	instance.destroy();
}

#[tokio::test]
async fn test_popup_is_named_positioned_and_navigated() {
	let (mock, host) = setup();
	host.register(widget().with_dimensions(Dimensions {
		width: 500,
		height: 400,
		x: None,
		y: None,
	}))
	.unwrap();

	let instance = host.create("widget", RawProps::new()).unwrap();
	instance.render(None, Some(Context::Popup)).unwrap();

	let window = instance.window().unwrap();
	assert!(mock.is_popup(&window));
	let geometry = mock.popup_geometry(&window).unwrap();
	assert_eq!((geometry.left, geometry.top), ((1280 - 500) / 2, (800 - 400) / 2));
	assert_eq!(mock.window_url(&window).as_deref(), Some("https://w.example/app"));

	let name = mock.window_name(&window).unwrap();
	let decoded = WindowName::decode(&name).expect("Popup carries an identity name");
	assert_eq!(decoded.id, instance.id());
	assert_eq!(decoded.tag, "widget");
	assert_eq!(decoded.context, Some(Context::Popup));

	// Clicking the overlay focuses the popup.
	let overlay = instance.overlay().unwrap();
	mock.click(&overlay);
	assert_eq!(mock.focused(), vec![window.clone()]);

	instance.destroy();
	assert_eq!(mock.open_window_count(), 0);
	assert_eq!(mock.observer_count(), 0);
}

#[tokio::test]
async fn test_blocked_popup_fails_render_and_tears_down() {
	let (mock, host) = setup();
	host.register(widget()).unwrap();
	mock.block_popups(true);

	let instance = host.create("widget", RawProps::new()).unwrap();
	let err = instance.render(None, Some(Context::Popup)).unwrap_err();

	assert!(err.to_string().contains("blocked"));
	assert!(instance.is_destroyed());
	assert!(host.tracker().is_empty());
	assert_eq!(mock.listener_count(), 0);
	assert!(mock.sent_of(MessageKind::Init).is_empty());
}

#[tokio::test]
async fn test_overlay_click_focus_is_popup_only_and_configurable() {
	let (mock, host) = setup();
	host.register(widget()).unwrap();

	let lightbox = host.create("widget", RawProps::new()).unwrap();
	lightbox.render(None, Some(Context::Lightbox)).unwrap();
	let overlay = lightbox.overlay().unwrap();
	assert_eq!(
		mock.element_html(&overlay).as_deref(),
		Some(r#"<div class="xframe-overlay"></div>"#)
	);
	mock.click(&overlay);
	assert!(mock.focused().is_empty(), "Lightbox overlays do not focus anything");
	lightbox.destroy();

	let host = MockHost::host(&mock).with_config(HostConfig {
		overlay_focuses_popup: false,
		..HostConfig::default()
	});
	host.register(widget()).unwrap();
	let popup = host.create("widget", RawProps::new()).unwrap();
	popup.render(None, Some(Context::Popup)).unwrap();
	mock.click(&popup.overlay().unwrap());
	assert!(mock.focused().is_empty());
	popup.destroy();
}

#[tokio::test]
async fn test_dropping_unrendered_singleton_frees_its_slot() {
	let (mock, host) = setup();
	host.register(widget().singleton()).unwrap();
	mock.add_element("#pay");

	let first = host.create("widget", RawProps::new()).unwrap();
	first.hijack_button("#pay", Some(Context::Popup)).unwrap();
	assert_eq!(mock.observer_count(), 1);
	assert_eq!(host.tracker().len(), 1);

	drop(first);
	assert_eq!(mock.observer_count(), 0);
	assert!(host.tracker().is_empty());

	let second = host
		.create("widget", RawProps::new())
		.expect("Singleton is free once every handle is dropped");
	second.destroy();
}
