//! Backup-then-write against real files.

use std::fs;
use tempfile::TempDir;
use text_patcher::{
    backup_path_for, substitute_first, write_with_backup, write_with_backup_to, Document,
    PatchError, Pattern,
};

const SALARY_ADMIN: &str = "export default function SalaryAdmin() {\n  return (\n    <Table />\n  );\n}\n";

#[test]
fn test_backup_holds_original_and_target_holds_new() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("SalaryAdmin.tsx");
    fs::write(&path, SALARY_ADMIN).unwrap();

    let doc = Document::load(&path).unwrap();
    let result = substitute_first(&doc, &Pattern::literal("<Table />").unwrap(), "<Grid />").unwrap();
    let outcome = write_with_backup(&path, result.document.as_str()).unwrap();

    assert_eq!(outcome.backup, dir.path().join("SalaryAdmin.tsx.bak"));
    assert_eq!(outcome.bytes_written, result.document.len());
    assert_eq!(fs::read_to_string(&outcome.backup).unwrap(), SALARY_ADMIN);
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        SALARY_ADMIN.replace("<Table />", "<Grid />")
    );
}

#[test]
fn test_second_write_refreshes_backup() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("SalaryAdmin.tsx");
    fs::write(&path, "v1").unwrap();

    write_with_backup(&path, "v2").unwrap();
    write_with_backup(&path, "v3").unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "v3");
    assert_eq!(
        fs::read_to_string(backup_path_for(&path, ".bak")).unwrap(),
        "v2"
    );
}

#[test]
fn test_missing_target_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("Gone.tsx");

    let err = write_with_backup(&path, "new").unwrap_err();

    assert!(matches!(err, PatchError::NotFound { .. }));
    assert!(!path.exists());
    assert!(!dir.path().join("Gone.tsx.bak").exists());
}

#[test]
fn test_unwritable_backup_location_leaves_target() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("SalaryAdmin.tsx");
    fs::write(&path, SALARY_ADMIN).unwrap();
    let backup = dir.path().join("no-such-dir").join("SalaryAdmin.tsx.bak");

    let err = write_with_backup_to(&path, &backup, "new").unwrap_err();

    assert!(matches!(err, PatchError::BackupFailed { .. }));
    assert_eq!(fs::read_to_string(&path).unwrap(), SALARY_ADMIN);
}

#[test]
fn test_custom_backup_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("SalaryAdmin.tsx");
    fs::write(&path, SALARY_ADMIN).unwrap();
    let backup = backup_path_for(&path, ".orig");

    write_with_backup_to(&path, &backup, "").unwrap();

    assert_eq!(backup, dir.path().join("SalaryAdmin.tsx.orig"));
    assert_eq!(fs::read_to_string(&backup).unwrap(), SALARY_ADMIN);
    assert_eq!(fs::read_to_string(&path).unwrap(), "");
}

#[test]
fn test_load_rejects_invalid_utf8() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("binary.dat");
    fs::write(&path, [0xff, 0xfe, 0x00, 0x41]).unwrap();

    assert!(matches!(
        Document::load(&path),
        Err(PatchError::InvalidUtf8 { .. })
    ));
}

#[test]
fn test_backup_cannot_replace_target() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("SalaryAdmin.tsx");
    fs::write(&path, SALARY_ADMIN).unwrap();

    let err = write_with_backup_to(&path, &backup_path_for(&path, ""), "NEW").unwrap_err();

    assert!(matches!(err, PatchError::BackupFailed { .. }));
    assert_eq!(fs::read_to_string(&path).unwrap(), SALARY_ADMIN);
}

#[cfg(unix)]
#[test]
fn test_read_only_directory_is_write_failed() {
    use std::os::unix::fs::PermissionsExt;

    let locked = TempDir::new().unwrap();
    let backups = TempDir::new().unwrap();
    let path = locked.path().join("SalaryAdmin.tsx");
    fs::write(&path, SALARY_ADMIN).unwrap();
    let backup = backups.path().join("SalaryAdmin.tsx.bak");
    fs::set_permissions(locked.path(), fs::Permissions::from_mode(0o555)).unwrap();

    // Privileged users ignore directory permissions
    if fs::write(locked.path().join("write-check"), "").is_ok() {
        fs::set_permissions(locked.path(), fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let result = write_with_backup_to(&path, &backup, "replaced");
    fs::set_permissions(locked.path(), fs::Permissions::from_mode(0o755)).unwrap();

    assert!(matches!(result, Err(PatchError::WriteFailed { .. })));
    assert_eq!(fs::read_to_string(&backup).unwrap(), SALARY_ADMIN);
    assert_eq!(fs::read_to_string(&path).unwrap(), SALARY_ADMIN);
}

#[cfg(unix)]
#[test]
fn test_executable_bit_survives_patch() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("deploy.sh");
    fs::write(&path, "echo hi\n").unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();

    let doc = Document::load(&path).unwrap();
    let result = substitute_first(&doc, &Pattern::literal("hi").unwrap(), "bye").unwrap();
    let outcome = write_with_backup(&path, result.document.as_str()).unwrap();

    let mode = |p: &std::path::Path| fs::metadata(p).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode(&path), 0o755);
    assert_eq!(mode(&outcome.backup), 0o755);
    assert_eq!(fs::read_to_string(&path).unwrap(), "echo bye\n");
}
