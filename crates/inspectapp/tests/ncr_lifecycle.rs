use flate2::read::GzDecoder;
use inspectapp::commands::export::ExportSelection;
use inspectapp::commands::list::RecordFilter;
use inspectapp::commands::{Fields, MessageLevel};
use inspectapp::init::initialize;
use inspectapp::model::{NcrReport, NCR_CLOSED_STATUS};
use inspectapp::store::attachments::IncomingFile;
use std::fs;
use std::io::Read;
use tempfile::TempDir;

fn fields(pairs: &[(&str, &str)]) -> Fields {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn ncr_lifecycle_on_disk() {
    let dir = TempDir::new().unwrap();
    let ctx = initialize(dir.path(), Some(dir.path().join("data"))).unwrap();
    let api = &ctx.api;
    let data = dir.path().join("data");

    let created = api
        .ncr_create(
            &fields(&[
                ("NCR_Status", "Открыто"),
                ("Contractor", "Enter Engineering"),
                ("NCR_Description", "Rebar cover below design"),
            ]),
            &[],
            "Madiyar",
        )
        .unwrap();
    let ncr = &created.records[0];
    assert_eq!(ncr.number, "TSFS-AGMK-NCR-0001");
    assert!(ncr.photos.is_empty());
    assert!(created
        .messages
        .iter()
        .any(|m| m.level == MessageLevel::Warning));

    let id = ncr.meta.id;
    let with_photos = api
        .ncr_add_photos(
            id,
            &[
                IncomingFile::new("DSC_0001.jpg", b"one".to_vec()),
                IncomingFile::new("scan/detail.png", b"two".to_vec()),
            ],
        )
        .unwrap();
    assert_eq!(
        with_photos.records[0].photos,
        vec![format!("ncr_{}_1.jpg", id), format!("ncr_{}_2.png", id)]
    );
    let uploads = data.join("uploads/ncr_photos");
    assert_eq!(
        fs::read(uploads.join(format!("ncr_{}_2.png", id))).unwrap(),
        b"two"
    );

    let refused = api.ncr_close(id, "Madiyar").unwrap_err();
    assert!(refused.is_precondition());

    api.ncr_update(id, &Fields::new(), Some("https://share/ncr-0001.pdf"), "Madiyar")
        .unwrap();
    let closed = api.ncr_close(id, "Madiyar").unwrap();
    assert_eq!(closed.records[0].status, NCR_CLOSED_STATUS);

    // Everything above went through the files on disk.
    let raw = fs::read_to_string(data.join("ncr_reports.json")).unwrap();
    let stored: Vec<NcrReport> = serde_json::from_str(&raw).unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].closed_by.as_deref(), Some("Madiyar"));
    assert_eq!(
        stored[0].signed_scan_url.as_deref(),
        Some("https://share/ncr-0001.pdf")
    );

    api.ncr_delete(id).unwrap();
    assert!(!uploads.join(format!("ncr_{}_1.jpg", id)).exists());
    assert_eq!(api.ncr_next_number(), "TSFS-AGMK-NCR-0001");
}

#[test]
fn config_file_changes_prefix_and_export_dir() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("data");
    fs::create_dir_all(&data).unwrap();
    fs::write(
        data.join("inspect.toml"),
        "ncr_prefix = \"SITE-B-NCR-\"\nexport_dir = \"reports\"\n",
    )
    .unwrap();

    let ctx = initialize(dir.path(), Some(data.clone())).unwrap();
    assert_eq!(ctx.config.ncr_prefix, "SITE-B-NCR-");
    assert_eq!(ctx.api.ncr_next_number(), "SITE-B-NCR-0001");

    ctx.api.ncr_create(&Fields::new(), &[], "Said").unwrap();
    let exported = ctx
        .api
        .export::<NcrReport>(&ExportSelection::Filtered(RecordFilter::default()))
        .unwrap();
    let path = &exported.paths[0];
    assert!(path.starts_with(data.join("reports")));

    let mut archive = tar::Archive::new(GzDecoder::new(fs::File::open(path).unwrap()));
    let mut names = Vec::new();
    for entry in archive.entries().unwrap() {
        let mut entry = entry.unwrap();
        names.push(entry.path().unwrap().to_string_lossy().to_string());
        let mut body = String::new();
        entry.read_to_string(&mut body).unwrap();
        assert!(body.contains("SITE-B-NCR-0001"));
    }
    names.sort();
    assert_eq!(
        names,
        vec!["ncr_reports/ncr_reports.json", "ncr_reports/ncr_reports.tsv"]
    );
}
