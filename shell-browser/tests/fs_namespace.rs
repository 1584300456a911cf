use std::path::PathBuf;

use shell_browser::headless::HeadlessViewFactory;
use shell_browser::{
    BindError, BrowserError, DisplayNameStyle, FsFolder, FsNamespace, ItemIdList,
    NamespaceProvider, NavigationRequest, ShellBrowser, WindowHandle,
};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let mut p = std::env::temp_dir();
    let pid = std::process::id();
    let t = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    p.push(format!("shell-browser-{prefix}-{pid}-{t}"));
    p
}

#[test]
fn directory_tree_maps_to_identifiers() {
    let dir = unique_temp_dir("ids");
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(dir.join("docs").join("reports")).unwrap();

    let ns = FsNamespace::new(&dir).unwrap();
    let reports = ns.id_for_path(dir.join("docs").join("reports")).unwrap();
    assert_eq!(reports, ItemIdList::from_segments(["docs", "reports"]).unwrap());
    assert_eq!(
        ns.path_for_id(reports.as_id()).unwrap(),
        ns.root().join("docs").join("reports")
    );

    let folder = ns.bind(reports.as_id()).unwrap();
    assert_eq!(folder.display_name(DisplayNameStyle::Normal).unwrap(), "reports");
    let fs_folder = folder.as_any().downcast_ref::<FsFolder>().unwrap();
    assert!(!fs_folder.is_symlink());

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn files_and_missing_entries_do_not_bind() {
    let dir = unique_temp_dir("bind");
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("notes.txt"), b"hello").unwrap();

    let ns = FsNamespace::new(&dir).unwrap();
    let file = ItemIdList::from_segments(["notes.txt"]).unwrap();
    let missing = ItemIdList::from_segments(["gone"]).unwrap();
    assert!(matches!(ns.bind(file.as_id()), Err(BindError::NotAFolder(_))));
    assert!(matches!(ns.bind(missing.as_id()), Err(BindError::NotFound(_))));
    assert!(matches!(
        ns.id_for_path(std::env::temp_dir()),
        Err(BindError::NotFound(_))
    ));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn browser_navigates_a_real_directory_tree() {
    let dir = unique_temp_dir("browse");
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(dir.join("music")).unwrap();

    let ns = FsNamespace::new(&dir).unwrap();
    let music = ns.id_for_path(dir.join("music")).unwrap();
    let factory = HeadlessViewFactory::new();
    let control = WindowHandle::from_raw(0x200).unwrap();
    let mut browser = ShellBrowser::new(control, ns, factory.clone());

    browser.navigate(NavigationRequest::absolute(&music)).unwrap();
    assert_eq!(
        browser.current_display_name(DisplayNameStyle::Normal).unwrap(),
        "music"
    );

    let gone = ItemIdList::from_segments(["music", "gone"]).unwrap();
    let err = browser.navigate(NavigationRequest::absolute(&gone)).unwrap_err();
    assert!(matches!(err, BrowserError::Bind(BindError::NotFound(_))));
    assert_eq!(browser.current_folder().unwrap().id(), music.as_id());
    assert_eq!(factory.ledger().live_windows, 1);

    drop(browser);
    assert_eq!(factory.ledger().live_views, 0);
    std::fs::remove_dir_all(&dir).unwrap();
}
