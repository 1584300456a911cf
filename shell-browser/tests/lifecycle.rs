use pretty_assertions::assert_eq;
use shell_browser::headless::{HeadlessViewFactory, MemoryNamespace};
use shell_browser::{
    BrowserError, BrowserEvent, CallbackError, EVENT_QUEUE_CAPACITY, FolderViewCallback, Guid,
    HostError, IID_SHELL_BROWSER, IID_SHELL_FOLDER_VIEW_CB, ItemIdList, NavigationOutcome,
    NavigationRequest, ServiceProvider, SessionState, ShellBrowser, ShellBrowserCallbacks,
    ViewStage, WindowHandle, sfvm,
};

const CANCELLED: &str = "Cancelled by the user.";

fn setup() -> (ShellBrowser, MemoryNamespace, HeadlessViewFactory) {
    let ns = MemoryNamespace::new("Desktop");
    let factory = HeadlessViewFactory::new();
    let control = WindowHandle::from_raw(0x4_0000).unwrap();
    let browser = ShellBrowser::new(control, ns.clone(), factory.clone());
    (browser, ns, factory)
}

#[test]
fn declined_device_access_shows_placeholder() {
    let (mut browser, ns, factory) = setup();
    let phone = ns.add_folder("Phone").unwrap();
    factory.fail_next_window(HostError::cancelled());

    let outcome = browser.navigate(NavigationRequest::absolute(&phone)).unwrap();
    assert_eq!(outcome, NavigationOutcome::CommittedWithPlaceholder);
    assert_eq!(browser.session().state(), SessionState::Live);
    assert_eq!(browser.session().window(), None);
    assert_eq!(browser.placeholder_text(), Some(CANCELLED));
    assert_eq!(browser.current_folder().unwrap().id(), phone.as_id());

    let ledger = factory.ledger();
    assert_eq!(ledger.live_views, 1);
    assert_eq!(ledger.live_windows, 0);
    assert_eq!(ledger.activations, 1);
    assert_eq!(ledger.empty_text.as_deref(), Some(CANCELLED));

    assert_eq!(
        browser.take_events(),
        vec![
            BrowserEvent::ViewCancelled {
                folder: phone.clone(),
                message: CANCELLED.to_string(),
            },
            BrowserEvent::NavigationComplete { folder: phone },
        ]
    );
}

#[test]
fn placeholder_view_is_replaced_by_the_next_navigation() {
    let (mut browser, ns, factory) = setup();
    let phone = ns.add_folder("Phone").unwrap();
    factory.fail_next_window(HostError::cancelled());
    browser.navigate(NavigationRequest::absolute(&phone)).unwrap();

    browser
        .navigate(NavigationRequest::absolute(ItemIdList::root()))
        .unwrap();
    let ledger = factory.ledger();
    assert_eq!(ledger.live_views, 1);
    assert_eq!(ledger.live_windows, 1);
    assert_eq!(ledger.deactivations, 1);
    assert!(browser.session().window().is_some());
}

#[test]
fn failed_rebuild_reports_lost_view_and_recovers_on_retry() {
    let (mut browser, ns, factory) = setup();
    let docs = ns.add_folder("Documents").unwrap();
    let music = ns.add_folder("Music").unwrap();
    browser.navigate(NavigationRequest::absolute(&docs)).unwrap();
    browser.take_events();

    factory.fail_next_view(HostError::failed("no view for music"));
    factory.fail_next_window(HostError::failed("no window for documents"));
    let err = browser
        .navigate(NavigationRequest::absolute(&music))
        .unwrap_err();
    assert!(matches!(
        err,
        BrowserError::ViewCreation(ref fault) if fault.stage == ViewStage::View
    ));

    assert_eq!(browser.current_folder().unwrap().id(), docs.as_id());
    assert_eq!(browser.session().state(), SessionState::Empty);
    assert_eq!(factory.ledger().live_views, 0);
    assert_eq!(factory.ledger().live_windows, 0);
    match browser.take_events().as_slice() {
        [
            BrowserEvent::ViewLost { folder, message },
            BrowserEvent::NavigationFailed { .. },
        ] => {
            assert_eq!(folder, &docs);
            assert!(message.contains("no window for documents"), "{message}");
        }
        other => panic!("unexpected events: {other:?}"),
    }

    let outcome = browser.navigate(NavigationRequest::absolute(&docs)).unwrap();
    assert_eq!(outcome, NavigationOutcome::Committed);
    assert_eq!(browser.session().state(), SessionState::Live);
    assert_eq!(factory.ledger().live_windows, 1);
    assert_eq!(ns.live_folders(), 1);
}

#[test]
fn undrained_events_stay_bounded() {
    let (mut browser, _ns, _factory) = setup();
    browser
        .navigate(NavigationRequest::absolute(ItemIdList::root()))
        .unwrap();
    let surface = browser.surface().clone();
    for _ in 0..100_000 {
        surface.message(sfvm::SELECTION_CHANGED, 0, 0).unwrap();
    }
    surface.message(sfvm::LIST_REFRESHED, 0, 0).unwrap();

    let events = browser.take_events();
    assert_eq!(events.len(), EVENT_QUEUE_CAPACITY);
    assert_eq!(events.last(), Some(&BrowserEvent::ListRefreshed));
    assert!(
        events[..EVENT_QUEUE_CAPACITY - 1]
            .iter()
            .all(|event| *event == BrowserEvent::SelectionChanged)
    );
}

#[test]
fn activation_fault_restores_the_previous_folder() {
    let (mut browser, ns, factory) = setup();
    let docs = ns.add_folder("Documents").unwrap();
    let music = ns.add_folder("Music").unwrap();
    browser.navigate(NavigationRequest::absolute(&docs)).unwrap();
    browser.take_events();

    factory.fail_next_activation(HostError::failed("activation refused"));
    let err = browser
        .navigate(NavigationRequest::absolute(&music))
        .unwrap_err();
    match err {
        BrowserError::ViewCreation(fault) => assert_eq!(fault.stage, ViewStage::Activation),
        other => panic!("unexpected error: {other:?}"),
    }

    assert_eq!(browser.current_folder().unwrap().id(), docs.as_id());
    assert_eq!(browser.session().state(), SessionState::Live);
    let ledger = factory.ledger();
    assert_eq!(ledger.live_views, 1);
    assert_eq!(ledger.live_windows, 1);
    assert_eq!(ledger.folders, vec![docs]);
    assert_eq!(ns.live_folders(), 1);
    assert!(matches!(
        browser.take_events().as_slice(),
        [BrowserEvent::NavigationFailed { .. }]
    ));
}

#[test]
fn denied_and_revoked_folders_leave_the_view_alone() {
    let (mut browser, ns, factory) = setup();
    let docs = ns.add_folder("Documents").unwrap();
    let secret = ns.add_folder("Secret").unwrap();
    let usb = ns.add_folder("Usb").unwrap();
    ns.deny(&secret);
    ns.revoke(&usb);
    browser.navigate(NavigationRequest::absolute(&docs)).unwrap();
    let window = browser.session().window();
    let transitions = browser.session().transitions();

    for target in [&secret, &usb] {
        assert!(matches!(
            browser.navigate(NavigationRequest::absolute(target)),
            Err(BrowserError::Bind(_))
        ));
        assert_eq!(browser.current_folder().unwrap().id(), docs.as_id());
        assert_eq!(browser.session().window(), window);
        assert_eq!(browser.session().transitions(), transitions);
    }
    assert_eq!(factory.ledger().views_created, 1);

    ns.restore(&usb);
    browser.navigate(NavigationRequest::absolute(&usb)).unwrap();
    assert_eq!(browser.current_folder().unwrap().id(), usb.as_id());
}

#[test]
fn close_and_drop_release_everything() {
    let (mut browser, ns, factory) = setup();
    let docs = ns.add_folder("Documents").unwrap();
    browser.navigate(NavigationRequest::absolute(&docs)).unwrap();

    browser.close();
    let ledger = factory.ledger();
    assert_eq!(ledger.live_views, 0);
    assert_eq!(ledger.live_windows, 0);
    assert_eq!(ledger.deactivations, 1);
    assert_eq!(ns.live_folders(), 0);
    assert_eq!(browser.session().state(), SessionState::Empty);
    assert!(browser.current_folder().is_none());
    assert_eq!(
        browser.navigate(NavigationRequest::absolute(ItemIdList::root())),
        Err(BrowserError::ContextClosed)
    );

    let (mut dropped, ns, factory) = setup();
    dropped
        .navigate(NavigationRequest::absolute(ItemIdList::root()))
        .unwrap();
    drop(dropped);
    assert_eq!(factory.ledger().live_views, 0);
    assert_eq!(factory.ledger().live_windows, 0);
    assert_eq!(ns.live_folders(), 0);
}

#[test]
fn host_messages_are_answered_without_side_effects() {
    let (mut browser, ns, _factory) = setup();
    let docs = ns.add_folder("Documents").unwrap();
    browser.navigate(NavigationRequest::absolute(&docs)).unwrap();
    browser.take_events();
    let transitions = browser.session().transitions();

    let surface = browser.surface().clone();
    assert_eq!(
        surface.message(0x9999, 0, 0),
        Err(CallbackError::NotImplemented)
    );
    assert!(browser.take_events().is_empty());

    assert_eq!(surface.message(sfvm::SELECTION_CHANGED, 0, 0), Ok(0));
    assert_eq!(surface.message(sfvm::LIST_REFRESHED, 0, 0), Ok(0));
    assert_eq!(
        browser.take_events(),
        vec![BrowserEvent::SelectionChanged, BrowserEvent::ListRefreshed]
    );
    assert_eq!(browser.session().transitions(), transitions);
    assert_eq!(browser.current_folder().unwrap().id(), docs.as_id());
}

#[test]
fn service_queries_expose_only_browser_contracts() {
    let (mut browser, _ns, _factory) = setup();
    browser
        .navigate(NavigationRequest::absolute(ItemIdList::root()))
        .unwrap();
    let surface = browser.surface().clone();
    let service = Guid::from_u128(0x4C96BE40_915C_11CF_99D3_00AA004AE837);

    let browser_cap = surface.query_service(service, IID_SHELL_BROWSER).unwrap();
    match browser_cap {
        shell_browser::Capability::Browser(callbacks) => {
            assert_eq!(callbacks.get_window(), Ok(browser.control()));
            assert_eq!(
                callbacks.query_active_shell_view(),
                Ok(browser.session().view_id().unwrap())
            );
        }
        other => panic!("unexpected capability: {other:?}"),
    }
    assert!(matches!(
        surface.query_service(service, IID_SHELL_FOLDER_VIEW_CB),
        Ok(shell_browser::Capability::ViewCallback(_))
    ));

    let unknown = Guid::parse("{00000000-0000-0000-C000-000000000046}").unwrap();
    assert!(matches!(
        surface.query_service(service, unknown),
        Err(CallbackError::NoInterface)
    ));
}

#[test]
fn resize_moves_only_a_real_window() {
    let (mut browser, ns, factory) = setup();
    browser.on_viewport_resized(640, 480);
    assert_eq!(factory.ledger().last_bounds, None);

    let phone = ns.add_folder("Phone").unwrap();
    factory.fail_next_window(HostError::cancelled());
    browser.navigate(NavigationRequest::absolute(&phone)).unwrap();
    browser.on_viewport_resized(800, 600);
    assert_eq!(factory.ledger().last_bounds, None);

    browser
        .navigate(NavigationRequest::absolute(ItemIdList::root()))
        .unwrap();
    browser.on_viewport_resized(1280, 720);
    let bounds = factory.ledger().last_bounds.unwrap();
    assert_eq!((bounds.width, bounds.height), (1280, 720));
}
