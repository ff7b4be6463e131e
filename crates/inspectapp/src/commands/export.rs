use crate::commands::list::{select, Filterable, RecordFilter};
use crate::commands::{CmdMessage, CmdResult};
use crate::error::{InspectError, Result};
use crate::model::{Author, CivilInspection, DailyReport, GeodeticInspection, NcrReport, RemarkReport};
use crate::store::backend::StorageBackend;
use crate::store::RecordStore;
use chrono::Local;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

/// A record kind that can be flattened to one spreadsheet row.
pub trait Tabular: Filterable {
    const COLUMNS: &'static [&'static str];

    /// One value per entry of [`COLUMNS`](Self::COLUMNS).
    fn row(&self) -> Vec<String>;
}

/// Which records an export covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportSelection {
    Filtered(RecordFilter),
    Single(u64),
}

impl Default for ExportSelection {
    fn default() -> Self {
        ExportSelection::Filtered(RecordFilter::default())
    }
}

fn inspector(author: &Author) -> String {
    author.inspector_name.clone().unwrap_or_default()
}

impl Tabular for GeodeticInspection {
    const COLUMNS: &'static [&'static str] = &[
        "ID",
        "Project",
        "Major object",
        "Work package",
        "Inspection date",
        "Object",
        "Section",
        "Work",
        "Quantity (project)",
        "Quantity (actual)",
        "Picket from",
        "Picket to",
        "Inspector",
        "Decision",
        "Comments",
        "Status",
        "Created by",
        "Created at",
    ];

    fn row(&self) -> Vec<String> {
        vec![
            self.meta.id.to_string(),
            self.project.clone(),
            self.major_object.clone(),
            self.work_package.clone(),
            self.inspection_date.clone(),
            self.object.clone(),
            self.section.clone(),
            self.work_name.clone(),
            self.quantity_project.clone(),
            self.quantity_actual.clone(),
            self.picket_from.clone(),
            self.picket_to.clone(),
            self.inspector_name_field.clone(),
            self.decision.clone(),
            self.deviation_comments.clone(),
            self.status.clone(),
            inspector(&self.author),
            self.meta.created_at.clone(),
        ]
    }
}

impl Tabular for CivilInspection {
    const COLUMNS: &'static [&'static str] = &[
        "ID",
        "Project",
        "Major object",
        "Work package",
        "Object",
        "Section",
        "Work",
        "Work description",
        "Laboratory no.",
        "Quantity",
        "Marking",
        "RFI no.",
        "Picket from",
        "Picket to",
        "RFI status",
        "Inspection date",
        "Inspector",
        "Decision",
        "Comments",
        "Executive no.",
        "Status",
        "Created by",
        "Created at",
    ];

    fn row(&self) -> Vec<String> {
        vec![
            self.meta.id.to_string(),
            self.project.clone(),
            self.major_object.clone(),
            self.work_package.clone(),
            self.object.clone(),
            self.section.clone(),
            self.work_name.clone(),
            self.work_description.clone(),
            self.laboratory_number.clone(),
            self.quantity.clone(),
            self.marking.clone(),
            self.rfi_number.clone(),
            self.picket_from.clone(),
            self.picket_to.clone(),
            self.rfi_status.clone(),
            self.inspection_date.clone(),
            self.inspector_name_field.clone(),
            self.decision.clone(),
            self.deviation_comments.clone(),
            self.executive_number.clone(),
            self.status.clone(),
            inspector(&self.author),
            self.meta.created_at.clone(),
        ]
    }
}

impl Tabular for NcrReport {
    const COLUMNS: &'static [&'static str] = &[
        "ID",
        "NCR number",
        "Project",
        "Contractor",
        "Supervision",
        "Discipline",
        "Major object",
        "Drawing",
        "Location",
        "Procedure",
        "Description",
        "Grade",
        "Priority",
        "Issued",
        "Corrective actions",
        "Planned close",
        "Actual close",
        "Measures",
        "Inspector",
        "Status",
        "Photos",
        "Signed scan",
        "Closed at",
        "Closed by",
        "Created by",
        "Created at",
    ];

    fn row(&self) -> Vec<String> {
        vec![
            self.meta.id.to_string(),
            self.number.clone(),
            self.project.clone(),
            self.contractor.clone(),
            self.technical_supervisor_company.clone(),
            self.discipline.clone(),
            self.major_object.clone(),
            self.draw_number.clone(),
            self.location.clone(),
            self.procedure.clone(),
            self.description.clone(),
            self.grade.clone(),
            self.priority.clone(),
            self.inspection_date.clone(),
            self.correction_acts.clone(),
            self.closed_date_plan.clone(),
            self.closed_date_actual.clone(),
            self.measures.clone(),
            self.inspector_name_field.clone(),
            self.status.clone(),
            self.photos.join(", "),
            self.signed_scan_url.clone().unwrap_or_default(),
            self.closed_at.clone().unwrap_or_default(),
            self.closed_by.clone().unwrap_or_default(),
            inspector(&self.author),
            self.meta.created_at.clone(),
        ]
    }
}

impl Tabular for RemarkReport {
    const COLUMNS: &'static [&'static str] = &[
        "ID",
        "Discipline",
        "Major object",
        "Remark",
        "Normative reference",
        "Inspection date",
        "Contractor contact",
        "Inspector",
        "Planned close",
        "Actual close",
        "Reason for rejection",
        "Status",
        "Created by",
        "Created at",
    ];

    fn row(&self) -> Vec<String> {
        vec![
            self.meta.id.to_string(),
            self.discipline.clone(),
            self.major_object.clone(),
            self.remark_description.clone(),
            self.link_to_normative.clone(),
            self.inspection_date.clone(),
            self.responsible_person_cont.clone(),
            self.inspector_name_field.clone(),
            self.closed_date_plan.clone(),
            self.closed_date_actual.clone(),
            self.reason_for_reject.clone(),
            self.status.clone(),
            inspector(&self.author),
            self.meta.created_at.clone(),
        ]
    }
}

// The tables and photos of a daily report only travel in the JSON member.
impl Tabular for DailyReport {
    const COLUMNS: &'static [&'static str] = &[
        "ID",
        "Report date",
        "Project",
        "Location",
        "Author",
        "Shift",
        "Weather",
        "Personnel",
        "Material placement",
        "Remarks",
        "Photos",
        "Filed by",
        "Created at",
    ];

    fn row(&self) -> Vec<String> {
        vec![
            self.meta.id.to_string(),
            self.report_date.clone(),
            self.project_name.clone(),
            self.location.clone(),
            self.author.clone(),
            self.shift.clone(),
            self.weather.clone(),
            self.personnel.clone(),
            self.material_placement.clone(),
            self.remarks.clone(),
            self.photos_data.len().to_string(),
            inspector(&self.filed_by),
            self.meta.created_at.clone(),
        ]
    }
}

fn cell(value: &str) -> String {
    value.replace(['\t', '\r', '\n'], " ")
}

/// Header row plus one line per record.
pub fn to_tsv<T: Tabular>(records: &[T]) -> String {
    let mut out = T::COLUMNS.join("\t");
    out.push('\n');
    for record in records {
        let row: Vec<String> = record.row().iter().map(|v| cell(v)).collect();
        out.push_str(&row.join("\t"));
        out.push('\n');
    }
    out
}

/// Write `<collection>/<collection>.tsv` and `<collection>/<collection>.json`
/// as a gzipped tar stream.
pub fn write_archive<T: Tabular, W: Write>(writer: W, records: &[T]) -> Result<()> {
    let enc = GzEncoder::new(writer, Compression::default());
    let mut tar = tar::Builder::new(enc);
    let mtime = Local::now().timestamp().max(0) as u64;

    let tsv = to_tsv(records);
    let json = serde_json::to_string_pretty(records)?;
    for (ext, content) in [("tsv", tsv), ("json", json)] {
        let entry_name = format!("{0}/{0}.{1}", T::COLLECTION, ext);
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_mtime(mtime);
        header.set_cksum();

        tar.append_data(&mut header, entry_name, content.as_bytes())
            .map_err(InspectError::Io)?;
    }

    let enc = tar.into_inner().map_err(InspectError::Io)?;
    enc.finish().map_err(InspectError::Io)?;
    Ok(())
}

pub fn run<T: Tabular, B: StorageBackend>(
    store: &RecordStore<B>,
    selection: &ExportSelection,
    out_dir: &Path,
) -> Result<CmdResult<T>> {
    let records = match selection {
        ExportSelection::Filtered(filter) => select(store.load::<T>(), filter),
        ExportSelection::Single(id) => vec![store
            .get::<T>(*id)
            .ok_or_else(|| InspectError::not_found(T::COLLECTION, *id))?],
    };

    let mut result = CmdResult::default();
    if records.is_empty() {
        result.add_message(CmdMessage::info("Nothing to export."));
        return Ok(result);
    }

    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    let filename = match selection {
        ExportSelection::Single(id) => format!("{}_{}_{}.tar.gz", T::COLLECTION, id, stamp),
        ExportSelection::Filtered(_) => format!("{}_{}.tar.gz", T::COLLECTION, stamp),
    };
    fs::create_dir_all(out_dir).map_err(InspectError::Io)?;
    let path = out_dir.join(filename);
    let file = File::create(&path).map_err(InspectError::Io)?;
    write_archive(file, &records)?;
    tracing::info!(collection = T::COLLECTION, count = records.len(), path = %path.display(), "exported");

    result.add_message(CmdMessage::success(format!(
        "Exported {} record(s) to {}",
        records.len(),
        path.display()
    )));
    Ok(result.with_records(records).with_paths(vec![path]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RecordMeta;
    use crate::store::mem_backend::MemBackend;
    use flate2::read::GzDecoder;
    use std::collections::BTreeMap;
    use std::io::Read;
    use tempfile::tempdir;

    fn unpack(bytes: &[u8]) -> BTreeMap<String, String> {
        let mut archive = tar::Archive::new(GzDecoder::new(bytes));
        let mut members = BTreeMap::new();
        for entry in archive.entries().unwrap() {
            let mut entry = entry.unwrap();
            let name = entry.path().unwrap().to_string_lossy().to_string();
            let mut content = String::new();
            entry.read_to_string(&mut content).unwrap();
            members.insert(name, content);
        }
        members
    }

    fn remark(id: u64, status: &str, description: &str) -> RemarkReport {
        RemarkReport {
            meta: RecordMeta {
                id,
                created_at: format!("2025-03-0{}T08:00:00.000000", id),
                updated_at: None,
            },
            status: status.into(),
            remark_description: description.into(),
            ..Default::default()
        }
    }

    #[test]
    fn columns_and_rows_line_up() {
        assert_eq!(GeodeticInspection::default().row().len(), GeodeticInspection::COLUMNS.len());
        assert_eq!(CivilInspection::default().row().len(), CivilInspection::COLUMNS.len());
        assert_eq!(NcrReport::default().row().len(), NcrReport::COLUMNS.len());
        assert_eq!(RemarkReport::default().row().len(), RemarkReport::COLUMNS.len());
        assert_eq!(DailyReport::default().row().len(), DailyReport::COLUMNS.len());
    }

    #[test]
    fn tsv_flattens_tabs_and_newlines() {
        let tsv = to_tsv(&[remark(1, "Open", "line one\nline\ttwo")]);
        let lines: Vec<&str> = tsv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("ID\tDiscipline"));
        assert!(lines[1].contains("line one line two"));
    }

    #[test]
    fn archive_holds_tsv_and_json() {
        let mut bytes = Vec::new();
        write_archive(&mut bytes, &[remark(1, "Open", "Кабель не закреплён")]).unwrap();

        let members = unpack(&bytes);
        let tsv = &members["remark_inspections/remark_inspections.tsv"];
        assert!(tsv.contains("Кабель не закреплён"));
        let json: serde_json::Value =
            serde_json::from_str(&members["remark_inspections/remark_inspections.json"]).unwrap();
        assert_eq!(json[0]["Status"], "Open");
    }

    #[test]
    fn run_writes_a_filtered_archive() {
        let dir = tempdir().unwrap();
        let store = RecordStore::with_backend(MemBackend::new());
        store
            .save(&[remark(1, "Open", "a"), remark(2, "Closed", "b"), remark(3, "Open", "c")])
            .unwrap();

        let selection = ExportSelection::Filtered(RecordFilter {
            status: Some("Open".into()),
            ..Default::default()
        });
        let result = run::<RemarkReport, _>(&store, &selection, &dir.path().join("exports")).unwrap();

        assert_eq!(result.records.len(), 2);
        let path = &result.paths[0];
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("remark_inspections_"));
        assert!(name.ends_with(".tar.gz"));

        let members = unpack(&fs::read(path).unwrap());
        let tsv = &members["remark_inspections/remark_inspections.tsv"];
        assert_eq!(tsv.lines().count(), 3);
    }

    #[test]
    fn run_single_names_the_id() {
        let dir = tempdir().unwrap();
        let store = RecordStore::with_backend(MemBackend::new());
        store.save(&[remark(1, "Open", "a"), remark(2, "Open", "b")]).unwrap();

        let result = run::<RemarkReport, _>(&store, &ExportSelection::Single(2), dir.path()).unwrap();
        let name = result.paths[0].file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("remark_inspections_2_"));
        assert_eq!(result.records.len(), 1);

        let missing = run::<RemarkReport, _>(&store, &ExportSelection::Single(9), dir.path());
        assert!(missing.unwrap_err().is_not_found());
    }

    #[test]
    fn nothing_to_export_writes_nothing() {
        let dir = tempdir().unwrap();
        let store = RecordStore::with_backend(MemBackend::new());
        let result =
            run::<NcrReport, _>(&store, &ExportSelection::default(), &dir.path().join("out")).unwrap();
        assert!(result.paths.is_empty());
        assert!(!dir.path().join("out").exists());
    }
}
