use micropy_fs::{NormalizedPath, io};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_write_atomic_overwrites_existing() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("test.txt");
    fs::write(&file_path, "original").unwrap();

    let path = NormalizedPath::new(&file_path);
    io::write_atomic(&path, b"updated").unwrap();

    assert_eq!(fs::read_to_string(&file_path).unwrap(), "updated");
}

#[test]
fn test_read_text_nonexistent_file() {
    let path = NormalizedPath::new("/nonexistent/file.txt");
    assert!(io::read_text(&path).is_err());
}

#[test]
fn test_copy_dir_recursive() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("src");
    fs::create_dir_all(src.join("stubs/machine")).unwrap();
    fs::write(src.join("info.json"), "{}").unwrap();
    fs::write(src.join("stubs/machine/__init__.py"), "def reset(): ...").unwrap();

    let dest = temp.path().join("dest");
    io::copy_dir(&src, &dest).unwrap();

    assert_eq!(fs::read_to_string(dest.join("info.json")).unwrap(), "{}");
    assert!(dest.join("stubs/machine/__init__.py").is_file());
}

#[cfg(unix)]
#[test]
fn test_link_dir_creates_once() {
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("target");
    fs::create_dir_all(&target).unwrap();
    fs::write(target.join("a.py"), "x = 1").unwrap();

    let link = temp.path().join("proj/.micropy/target");
    assert!(io::link_dir(&target, &link).unwrap());
    assert!(io::is_symlink(&link));
    assert!(link.join("a.py").is_file());

    // Second call leaves the existing link alone
    assert!(!io::link_dir(&target, &link).unwrap());
    assert_eq!(fs::read_link(&link).unwrap(), target);
}

#[cfg(unix)]
#[test]
fn test_remove_path_on_link_keeps_target() {
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("target");
    fs::create_dir_all(&target).unwrap();
    fs::write(target.join("keep.py"), "").unwrap();

    let link = temp.path().join("link");
    io::link_dir(&target, &link).unwrap();
    io::remove_path(&link).unwrap();

    assert!(!link.exists());
    assert!(target.join("keep.py").is_file());
}

#[test]
fn test_remove_path_missing_is_ok() {
    let temp = TempDir::new().unwrap();
    io::remove_path(&temp.path().join("missing")).unwrap();
}
