//! Tests for platform windows driven through the headless host.

use std::rc::Rc;

use horizon_lattice_win32::host::{HitTestResult, HostCall, NativeCreateParams, ShowCommand};
use horizon_lattice_win32::prelude::*;
use horizon_lattice_win32::{NativeMessage, PlatformError, WindowSystemEvent};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn integration() -> (Rc<HeadlessHost>, PlatformIntegration) {
    init_tracing();
    let host = Rc::new(HeadlessHost::new());
    let integration = PlatformIntegration::new(host.clone(), PlatformOptions::default());
    (host, integration)
}

/// Creates and shows a window. The toolkit window owns the native one, so
/// callers keep it alive for as long as they use the platform window.
fn shown_window(
    integration: &PlatformIntegration,
    attributes: WindowAttributes,
) -> (Rc<ToolkitWindow>, Rc<PlatformWindow>) {
    let window = ToolkitWindow::new(attributes);
    let pw = integration
        .create_platform_window(&window)
        .expect("Failed to create platform window");
    pw.set_visible(integration.context(), true);
    (window, pw)
}

fn normal_attributes() -> WindowAttributes {
    WindowAttributes::default().with_geometry(Rect::new(100, 100, 400, 300))
}

#[test]
fn test_requesting_current_state_is_a_no_op() {
    let (host, integration) = integration();
    let (_window, pw) = shown_window(&integration, normal_attributes());
    host.clear_calls();

    pw.set_window_state(integration.context(), WindowState::Normal);
    assert!(host.calls().is_empty());
    assert_eq!(pw.saved_style(), None);
    assert_eq!(pw.saved_frame_geometry(), None);

    pw.set_window_state(integration.context(), WindowState::Fullscreen);
    let saved = pw.saved_style();
    host.clear_calls();
    pw.set_window_state(integration.context(), WindowState::Fullscreen);
    assert!(host.calls().is_empty());
    assert_eq!(pw.saved_style(), saved);
}

#[test]
fn test_fullscreen_round_trip_restores_style_and_frame() {
    let (host, integration) = integration();
    let ctx = integration.context();
    let (_window, pw) = shown_window(&integration, normal_attributes());
    let handle = pw.handle().unwrap();
    let original_style = host.style(handle);
    let original_frame = pw.frame_geometry(ctx);
    assert_eq!(original_frame, Rect::new(92, 69, 416, 339));

    pw.set_window_state(ctx, WindowState::Fullscreen);
    assert_eq!(pw.visibility(ctx), Visibility::Fullscreen);
    assert_eq!(pw.saved_style(), Some(original_style));
    assert_eq!(pw.saved_frame_geometry(), Some(original_frame));
    let fullscreen_style = host.style(handle);
    assert!(fullscreen_style.contains(WindowStyle::POPUP | WindowStyle::VISIBLE));
    assert!(!fullscreen_style.contains(WindowStyle::THICK_FRAME));
    assert_eq!(host.window_rect(handle).unwrap(), Rect::new(0, 0, 1920, 1080));
    assert_eq!(pw.geometry(), Rect::new(0, 0, 1920, 1080));

    pw.set_window_state(ctx, WindowState::Normal);
    assert_eq!(host.style(handle), original_style);
    assert_eq!(pw.frame_geometry(ctx), original_frame);
    assert_eq!(pw.geometry(), Rect::new(100, 100, 400, 300));
    assert_eq!(pw.visibility(ctx), Visibility::Windowed);
    assert_eq!(pw.saved_style(), None);
    assert_eq!(pw.saved_frame_geometry(), None);
}

#[test]
fn test_fullscreen_reports_new_geometry() {
    let (_host, integration) = integration();
    let (window, pw) = shown_window(&integration, normal_attributes());
    let id = window.id();
    integration.take_events();

    pw.set_window_state(integration.context(), WindowState::Fullscreen);
    let events = integration.take_events();
    assert!(events.contains(&WindowSystemEvent::GeometryChanged {
        window: id,
        geometry: Rect::new(0, 0, 1920, 1080),
    }));
}

#[test]
fn test_dialog_can_be_maximized_without_maximize_button() {
    let (host, integration) = integration();
    let ctx = integration.context();
    let (_window, pw) = shown_window(&integration, WindowAttributes::default().with_flags(WindowType::Dialog));
    let handle = pw.handle().unwrap();

    pw.set_window_state(ctx, WindowState::Maximized);
    assert!(host.is_zoomed(handle));
    assert_eq!(pw.visibility(ctx), Visibility::Maximized);
    assert!(!host.style(handle).contains(WindowStyle::MAXIMIZE_BOX));
}

#[test]
fn test_dialog_decorations() {
    let (host, integration) = integration();
    let window = ToolkitWindow::new(WindowAttributes::default().with_flags(WindowType::Dialog));
    let pw = integration.create_platform_window(&window).unwrap();
    let handle = pw.handle().unwrap();

    let style = host.style(handle);
    assert!(style.contains(WindowStyle::CAPTION | WindowStyle::SYS_MENU | WindowStyle::THICK_FRAME));
    assert!(!style.intersects(WindowStyle::MINIMIZE_BOX | WindowStyle::MAXIMIZE_BOX));
    assert!(host.ex_style(handle).contains(WindowExStyle::CONTEXT_HELP));
    assert!(window.flags().has(WindowHints::CONTEXT_HELP_BUTTON));
}

#[test]
fn test_shrinking_window_exposes_once() {
    let (host, integration) = integration();
    let (_window, pw) = shown_window(&integration, normal_attributes());
    let handle = pw.handle().unwrap();
    host.simulate_paint(handle, Some(Rect::new(0, 0, 400, 300)));
    integration.take_events();

    pw.set_geometry(integration.context(), Rect::new(100, 100, 200, 150));
    let exposes = integration
        .take_events()
        .into_iter()
        .filter(|e| matches!(e, WindowSystemEvent::Expose { region: Some(_), .. }))
        .count();
    assert_eq!(exposes, 1);
    assert_eq!(pw.geometry(), Rect::new(100, 100, 200, 150));
}

#[test]
fn test_opacity_switches_layered_mode() {
    let (host, integration) = integration();
    let ctx = integration.context();
    let (_window, pw) = shown_window(&integration, normal_attributes());
    let handle = pw.handle().unwrap();
    host.clear_calls();

    pw.set_opacity(ctx, 0.5);
    assert!(host.ex_style(handle).contains(WindowExStyle::LAYERED));
    assert!(host.calls().contains(&HostCall::SetLayeredAttributes(handle, 128)));

    host.clear_calls();
    pw.set_opacity(ctx, 1.0);
    assert!(!host.ex_style(handle).contains(WindowExStyle::LAYERED));
    assert!(host.calls().contains(&HostCall::Invalidate(handle)));
    assert_eq!(pw.opacity(), 1.0);
}

#[test]
fn test_creation_failure_leaves_window_unrealized() {
    let (host, integration) = integration();
    host.set_fail_create(true);
    let window = ToolkitWindow::new(normal_attributes());

    assert!(integration.create_platform_window(&window).is_none());
    assert_eq!(window.native_handle(), None);
    assert_eq!(integration.context().window_count(), 0);
}

#[test]
fn test_foreign_window_survives_integration() {
    let (host, integration) = integration();
    let handle = host
        .create_window(&NativeCreateParams {
            class_name: "ExternalClass".into(),
            title: "External".into(),
            style: WindowStyle::OVERLAPPED_WINDOW,
            ex_style: WindowExStyle::empty(),
            x: Some(10),
            y: Some(10),
            width: Some(200),
            height: Some(100),
            parent: None,
        })
        .unwrap();
    let wrapper =
        ToolkitWindow::new(WindowAttributes::default().with_flags(WindowType::ForeignWindow));
    let foreign = integration.create_foreign_window(&wrapper, handle).unwrap();

    assert!(integration.context().is_foreign_window(handle));
    assert!(!host.send(handle, NativeMessage::EraseBackground));
    assert_eq!(foreign.native_handle(), handle);

    drop(integration);
    assert!(host.is_window(handle));
}

#[test]
fn test_frameless_window_has_no_margins() {
    let (host, integration) = integration();
    let (_window, pw) = shown_window(
        &integration,
        normal_attributes().with_flags(WindowFlags::new(WindowType::Window).with_hints(WindowHints::FRAMELESS)),
    );
    let handle = pw.handle().unwrap();

    assert_eq!(pw.frame_margins(integration.context().host()), Margins::default());
    assert_eq!(host.window_rect(handle).unwrap(), Rect::new(100, 100, 400, 300));
    assert!(!host.style(handle).contains(WindowStyle::CAPTION));
}

#[test]
fn test_minimize_from_show_command() {
    let (host, integration) = integration();
    let ctx = integration.context();
    let (_window, pw) = shown_window(&integration, normal_attributes());
    let handle = pw.handle().unwrap();

    host.show_window(handle, ShowCommand::Minimize);
    assert_eq!(pw.window_state(), WindowState::Minimized);
    assert_eq!(pw.visibility(ctx), Visibility::Minimized);
    assert!(!pw.is_exposed());

    pw.set_window_state(ctx, WindowState::Normal);
    assert_eq!(pw.visibility(ctx), Visibility::Windowed);
    assert_eq!(pw.geometry(), Rect::new(100, 100, 400, 300));
}

#[test]
fn test_options_from_toml() {
    let options = PlatformOptions::from_toml_str(
        r#"
        default_window_width = 320
        has_border_in_fullscreen = true
        application_name = "Demo"
        "#,
    )
    .expect("Failed to parse options");
    assert_eq!(options.default_window_width, 320);
    assert_eq!(options.default_window_height, 160);
    assert!(options.has_border_in_fullscreen);
    assert_eq!(options.application_name, "Demo");

    let err = PlatformOptions::from_toml_str("default_window_width = \"wide\"").unwrap_err();
    assert!(matches!(err, PlatformError::Config(_)));
}

#[test]
fn test_dropping_toolkit_window_destroys_native_window() {
    let (host, integration) = integration();
    let (window, pw) = shown_window(&integration, normal_attributes());
    let handle = pw.handle().expect("Failed to realize window");

    drop(window);
    assert!(!host.is_window(handle));
    assert_eq!(integration.context().window_count(), 0);
    assert_eq!(pw.handle(), None);

    pw.set_visible(integration.context(), true);
    assert!(host.window_handles().is_empty());
}

#[test]
fn test_inactive_fixed_height_window_keeps_border() {
    let (host, integration) = integration();
    let (_window, pw) = shown_window(
        &integration,
        normal_attributes()
            .with_minimum_size(Size::new(200, 300))
            .with_maximum_size(Size::new(800, 300)),
    );
    let handle = pw.handle().expect("Failed to realize window");
    host.set_foreground(None);

    let mut result = HitTestResult::Nowhere;
    let handled = host.send(
        handle,
        NativeMessage::NcHitTest {
            global_pos: Point::new(300, 405),
            result: &mut result,
        },
    );
    assert!(handled);
    assert_eq!(result, HitTestResult::Border);
}
