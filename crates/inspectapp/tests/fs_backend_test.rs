use inspectapp::model::{NcrReport, RemarkReport};
use inspectapp::store::attachments::{AttachmentStore, FsAttachments};
use inspectapp::store::backend::StorageBackend;
use inspectapp::store::fs_backend::FsBackend;
use inspectapp::store::RecordStore;
use std::fs;
use tempfile::TempDir;

fn setup() -> (TempDir, RecordStore<FsBackend>) {
    let dir = TempDir::new().unwrap();
    let store = RecordStore::with_backend(FsBackend::new(dir.path().to_path_buf()));
    (dir, store)
}

fn leftover_tmp_files(dir: &std::path::Path) -> Vec<String> {
    fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .filter(|name| name.ends_with(".tmp"))
        .collect()
}

#[test]
fn test_fs_backend_missing_collection_reads_none() {
    let (_dir, store) = setup();
    assert_eq!(store.backend().read_collection("ncr_reports").unwrap(), None);
    assert!(store.load::<NcrReport>().is_empty());
}

#[test]
fn test_fs_backend_atomic_write_artifacts() {
    let (dir, store) = setup();
    store
        .add(RemarkReport {
            status: "Open".into(),
            ..Default::default()
        })
        .unwrap();

    let path = dir.path().join("remark_inspections.json");
    assert!(path.exists());
    assert!(leftover_tmp_files(dir.path()).is_empty());
}

#[test]
fn test_fs_backend_writes_pretty_utf8() {
    let (dir, store) = setup();
    store
        .add(NcrReport {
            status: "Открыто".into(),
            ..Default::default()
        })
        .unwrap();

    let on_disk = fs::read_to_string(dir.path().join("ncr_reports.json")).unwrap();
    assert!(on_disk.starts_with("[\n"));
    assert!(on_disk.contains("\"NCR_Status\": \"Открыто\""));
}

#[test]
fn test_fs_backend_creates_missing_data_dir() {
    let dir = TempDir::new().unwrap();
    let nested = dir.path().join("a/b");
    let store = RecordStore::with_backend(FsBackend::new(nested.clone()));
    store.add(RemarkReport::default()).unwrap();
    assert!(nested.join("remark_inspections.json").exists());
}

#[test]
fn test_corrupt_collection_is_moved_aside() {
    let (dir, store) = setup();
    let path = dir.path().join("ncr_reports.json");
    fs::write(&path, "[{\"id\": 1, \"NCR_Number\": ").unwrap();

    assert!(store.load::<NcrReport>().is_empty());
    assert!(!path.exists());

    let aside: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .filter(|name| name.starts_with("ncr_reports.json.corrupt-"))
        .collect();
    assert_eq!(aside.len(), 1);
    let preserved = fs::read_to_string(dir.path().join(&aside[0])).unwrap();
    assert!(preserved.contains("NCR_Number"));

    let added = store.add(NcrReport::default()).unwrap();
    assert_eq!(added.meta.id, 1);
}

#[test]
fn test_existing_files_with_legacy_keys_load() {
    let (dir, store) = setup();
    fs::write(
        dir.path().join("ncr_reports.json"),
        r#"[
  {
    "id": 4,
    "created_at": "2025-02-11T10:00:00.123456",
    "NCR_Number": "TSFS-AGMK-NCR-0004",
    "NCR_Status": "Открыто",
    "photos": [],
    "signed_scan_url": null,
    "signed_scan_uploaded_at": null,
    "signed_scan_uploaded_by": null,
    "inspector_id": 3,
    "inspector_name": "Said",
    "site_comment": "kept"
  }
]"#,
    )
    .unwrap();

    let ncr = store.get::<NcrReport>(4).unwrap();
    assert_eq!(ncr.number, "TSFS-AGMK-NCR-0004");

    store.update(4, ncr).unwrap();
    let on_disk = fs::read_to_string(dir.path().join("ncr_reports.json")).unwrap();
    assert!(on_disk.contains("\"site_comment\": \"kept\""));
    assert!(on_disk.contains("\"updated_at\""));
    assert!(on_disk.contains("\"created_at\": \"2025-02-11T10:00:00.123456\""));
}

#[test]
fn test_fs_attachments_round_trip() {
    let dir = TempDir::new().unwrap();
    let uploads = dir.path().join("uploads/ncr_photos");
    let files = FsAttachments::new(uploads.clone());

    assert!(!files.exists("ncr_1_1.jpg"));
    files.save("ncr_1_1.jpg", b"jpeg bytes").unwrap();
    assert!(files.exists("ncr_1_1.jpg"));
    assert_eq!(fs::read(uploads.join("ncr_1_1.jpg")).unwrap(), b"jpeg bytes");
    assert!(leftover_tmp_files(&uploads).is_empty());

    files.delete("ncr_1_1.jpg").unwrap();
    files.delete("ncr_1_1.jpg").unwrap();
    assert!(!files.exists("ncr_1_1.jpg"));
}

#[test]
fn test_fs_attachments_failed_rename_cleans_up() {
    let dir = TempDir::new().unwrap();
    let uploads = dir.path().join("uploads");
    let occupied = uploads.join("ncr_1_1.jpg");
    fs::create_dir_all(&occupied).unwrap();
    fs::write(occupied.join("keep"), b"x").unwrap();

    let files = FsAttachments::new(uploads.clone());
    assert!(files.save("ncr_1_1.jpg", b"jpeg bytes").is_err());
    assert!(leftover_tmp_files(&uploads).is_empty());
    assert!(occupied.join("keep").exists());
}

#[test]
fn test_fs_attachments_refuse_path_names() {
    let dir = TempDir::new().unwrap();
    let files = FsAttachments::new(dir.path().join("uploads"));
    assert!(files.save("../escape.jpg", b"x").is_err());
    assert!(!dir.path().join("escape.jpg").exists());
}
