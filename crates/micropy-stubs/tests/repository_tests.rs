use micropy_stubs::StubRepository;
use micropy_test_utils::repo::{micropy_document, micropython_document};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn two_manifest_repo() -> StubRepository {
    StubRepository::default()
        .add_repository(&micropy_document(), "micropy.json")
        .unwrap()
        .add_repository(&micropython_document(), "micropython.json")
        .unwrap()
}

#[test]
fn test_search_latest_per_name() {
    let repo = two_manifest_repo();
    assert_eq!(repo.len(), 7);

    let latest: Vec<String> = repo
        .search("stub", false)
        .iter()
        .map(|e| e.versioned_name())
        .collect();
    assert_eq!(
        latest,
        vec![
            "esp32-Stubs-1.1.0",
            "micropython-RP2-stubs-1.19.1",
            "micropython-esp32-stubs-1.19.1",
            "micropython-firmware-stubs-1.0.0",
        ]
    );
}

#[test]
fn test_search_all_versions() {
    let repo = two_manifest_repo();
    assert_eq!(repo.search("stub", true).len(), 7);
}

#[rstest]
#[case("STUB", 4)]
#[case("esp32", 2)]
#[case("rp2", 1)]
#[case("nothing-matches", 0)]
fn test_search_is_case_insensitive(#[case] query: &str, #[case] expected: usize) {
    assert_eq!(two_manifest_repo().search(query, false).len(), expected);
}

#[test]
fn test_resolve_across_manifests() {
    let repo = two_manifest_repo();

    let entry = repo.resolve_package("micropython-esp32-stubs").unwrap();
    assert_eq!(entry.version(), "1.19.1");
    assert_eq!(entry.repo_name(), "micropython-stubs");

    let pinned = repo
        .resolve_package("micropython-stubs/micropython-esp32-stubs-1.17.0")
        .unwrap();
    assert_eq!(pinned.version(), "1.17.0");
    assert_eq!(
        pinned.url().unwrap().as_str(),
        "https://files.pythonhosted.org/packages/source/m/micropython-esp32-stubs/micropython_esp32_stubs-1.17.0.tar.gz"
    );

    let micropy = repo.resolve_package("micropy-stubs/esp32-Stubs").unwrap();
    assert_eq!(micropy.version(), "1.1.0");
    assert_eq!(micropy.checksum(), Some("bb22"));
}

#[test]
fn test_earlier_snapshots_are_unchanged() {
    let first = StubRepository::default()
        .add_repository(&micropy_document(), "micropy.json")
        .unwrap();
    let entries_before: Vec<String> = first.search("", true).iter().map(|e| e.to_string()).collect();

    let _second = first
        .add_repository(&micropython_document(), "micropython.json")
        .unwrap();

    let entries_after: Vec<String> = first.search("", true).iter().map(|e| e.to_string()).collect();
    assert_eq!(entries_before, entries_after);
    assert_eq!(first.len(), 3);
}

#[test]
fn test_sources_may_be_local_files() {
    let temp = tempfile::TempDir::new().unwrap();
    let source = temp.path().join("source.json");
    std::fs::write(&source, micropy_document().to_string()).unwrap();

    let repo = StubRepository::from_sources(
        &[source.to_string_lossy().into_owned()],
        micropy_fs::ServiceLog::new("test"),
    )
    .unwrap();

    assert!(!repo.is_empty());
    assert_eq!(repo.len(), repo.search("", true).len());
}
