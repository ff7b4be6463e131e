//! # Record Kinds
//!
//! Every collection holds one explicit record type. The JSON layout of each type
//! matches the historical data files key for key, so existing `*.json` collections
//! load unchanged:
//!
//! - [`RecordMeta`] (`id`, `created_at`, `updated_at`) is flattened into the object.
//! - [`Author`] (`inspector_id`, `inspector_name`) is flattened likewise.
//! - Any key the type does not know about is kept in `extra` and written back
//!   verbatim on save.
//!
//! Timestamps are local ISO-8601 strings with microseconds, which keeps them
//! lexicographically ordered.

use chrono::Local;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::InspectError;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// The only NCR status the lifecycle treats specially.
pub const NCR_CLOSED_STATUS: &str = "Закрыто";

/// Current local time in the stored timestamp format.
pub fn timestamp() -> String {
    Local::now()
        .naive_local()
        .format(TIMESTAMP_FORMAT)
        .to_string()
}

/// Store-managed identity and timestamps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMeta {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Who filed the record. Set from the acting inspector on creation, never from form input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    #[serde(default)]
    pub inspector_id: Option<u64>,
    #[serde(default)]
    pub inspector_name: Option<String>,
}

impl Author {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            inspector_id: None,
            inspector_name: Some(name.into()),
        }
    }
}

/// A record type bound to its collection.
pub trait Record: Serialize + DeserializeOwned + Clone + Default + fmt::Debug {
    /// Collection name; also the stem of the backing file.
    const COLLECTION: &'static str;
    /// Short human label used in messages.
    const LABEL: &'static str;

    fn meta(&self) -> &RecordMeta;
    fn meta_mut(&mut self) -> &mut RecordMeta;
    fn author(&self) -> &Author;
    fn author_mut(&mut self) -> &mut Author;

    /// One-line summary for listings.
    fn summary(&self) -> String;

    fn id(&self) -> u64 {
        self.meta().id
    }
}

/// Record kinds without a lifecycle of their own: any field may be set by the
/// generic create/replace/merge commands. NCRs are excluded.
pub trait PlainRecord: Record {}

impl PlainRecord for GeodeticInspection {}
impl PlainRecord for CivilInspection {}
impl PlainRecord for RemarkReport {}
impl PlainRecord for DailyReport {}

macro_rules! impl_record {
    ($ty:ty, $collection:expr, $label:expr, |$s:ident| $summary:expr) => {
        impl Record for $ty {
            const COLLECTION: &'static str = $collection;
            const LABEL: &'static str = $label;

            fn meta(&self) -> &RecordMeta {
                &self.meta
            }

            fn meta_mut(&mut self) -> &mut RecordMeta {
                &mut self.meta
            }

            fn author(&self) -> &Author {
                &self.author
            }

            fn author_mut(&mut self) -> &mut Author {
                &mut self.author
            }

            fn summary(&self) -> String {
                let $s = self;
                $summary
            }
        }
    };
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeodeticInspection {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub project: String,
    pub major_object: String,
    pub work_package: String,
    pub inspection_date: String,
    pub object: String,
    pub section: String,
    pub work_name: String,
    pub quantity_project: String,
    pub quantity_actual: String,
    pub picket_from: String,
    pub picket_to: String,
    pub inspector_name_field: String,
    pub decision: String,
    pub deviation_comments: String,
    pub status: String,
    #[serde(flatten)]
    pub author: Author,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl_record!(
    GeodeticInspection,
    "geodetic_inspections",
    "Geodetic inspection",
    |s| format!("{} {} {}", s.inspection_date, s.object, s.work_name)
);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CivilInspection {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub project: String,
    pub major_object: String,
    pub work_package: String,
    pub object: String,
    pub section: String,
    pub work_name: String,
    pub work_description: String,
    pub laboratory_number: String,
    pub quantity: String,
    pub marking: String,
    #[serde(rename = "RFI_number")]
    pub rfi_number: String,
    pub picket_from: String,
    pub picket_to: String,
    #[serde(rename = "RFI_status")]
    pub rfi_status: String,
    pub inspection_date: String,
    pub inspector_name_field: String,
    pub decision: String,
    pub deviation_comments: String,
    pub executive_number: String,
    pub status: String,
    #[serde(flatten)]
    pub author: Author,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl_record!(
    CivilInspection,
    "civil_inspections",
    "Civil inspection",
    |s| format!("{} {} RFI {}", s.inspection_date, s.work_name, s.rfi_number)
);

/// Nonconformance report.
///
/// The three `signed_scan_*` fields form one group: they are only ever set
/// together ([`NcrReport::set_signed_scan`]) or cleared together
/// ([`NcrReport::clear_signed_scan`]).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NcrReport {
    #[serde(flatten)]
    pub meta: RecordMeta,
    #[serde(rename = "NCR_Number")]
    pub number: String,
    #[serde(rename = "Project")]
    pub project: String,
    #[serde(rename = "Contractor")]
    pub contractor: String,
    pub technical_supervisor_company: String,
    #[serde(rename = "Discipline")]
    pub discipline: String,
    pub major_object: String,
    #[serde(rename = "Draw_number")]
    pub draw_number: String,
    #[serde(rename = "Location")]
    pub location: String,
    #[serde(rename = "Procedure")]
    pub procedure: String,
    #[serde(rename = "NCR_Description")]
    pub description: String,
    #[serde(rename = "NCR_grade")]
    pub grade: String,
    pub priority: String,
    pub inspection_date: String,
    #[serde(rename = "Correction_acts")]
    pub correction_acts: String,
    #[serde(rename = "closed_date.plan")]
    pub closed_date_plan: String,
    #[serde(rename = "closed_date.actual")]
    pub closed_date_actual: String,
    #[serde(rename = "Measures")]
    pub measures: String,
    pub inspector_name_field: String,
    #[serde(rename = "NCR_Status")]
    pub status: String,
    pub photos: Vec<String>,
    pub signed_scan_url: Option<String>,
    pub signed_scan_uploaded_at: Option<String>,
    pub signed_scan_uploaded_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_by: Option<String>,
    #[serde(flatten)]
    pub author: Author,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl_record!(NcrReport, "ncr_reports", "NCR", |s| {
    format!("{} [{}] {}", s.number, s.status, s.description)
});

impl NcrReport {
    pub fn is_closed(&self) -> bool {
        is_closed_status(&self.status)
    }

    /// True when a non-blank signed scan link is attached.
    pub fn has_signed_scan(&self) -> bool {
        self.signed_scan_url
            .as_deref()
            .is_some_and(|url| !url.trim().is_empty())
    }

    pub fn set_signed_scan(&mut self, url: &str, actor: &str, at: String) {
        self.signed_scan_url = Some(url.trim().to_string());
        self.signed_scan_uploaded_at = Some(at);
        self.signed_scan_uploaded_by = Some(actor.to_string());
    }

    pub fn clear_signed_scan(&mut self) {
        self.signed_scan_url = None;
        self.signed_scan_uploaded_at = None;
        self.signed_scan_uploaded_by = None;
    }
}

pub fn is_closed_status(status: &str) -> bool {
    status.trim() == NCR_CLOSED_STATUS
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemarkReport {
    #[serde(flatten)]
    pub meta: RecordMeta,
    #[serde(rename = "Discipline")]
    pub discipline: String,
    pub major_object: String,
    pub remark_description: String,
    pub link_to_normative: String,
    pub inspection_date: String,
    pub responsible_person_cont: String,
    pub inspector_name_field: String,
    #[serde(rename = "remark_closed_date.plan")]
    pub closed_date_plan: String,
    #[serde(rename = "remark_closed_date.actual")]
    pub closed_date_actual: String,
    pub reason_for_reject: String,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(flatten)]
    pub author: Author,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl_record!(RemarkReport, "remark_inspections", "Remark", |s| {
    format!("{} [{}] {}", s.inspection_date, s.status, s.remark_description)
});

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EquipmentTable {
    pub names: Vec<String>,
    pub damba: Vec<String>,
    pub vodovod: Vec<String>,
    pub gpp: Vec<String>,
    pub pulpovod: Vec<String>,
    pub raspred: Vec<String>,
    pub total: Vec<String>,
    pub total_site: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorksTable {
    pub areas: Vec<String>,
    pub ch_from: Vec<String>,
    pub ch_to: Vec<String>,
    pub work_types: Vec<String>,
    pub work_descriptions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialsTable {
    pub areas: Vec<String>,
    pub material_types: Vec<String>,
    pub descriptions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityTable {
    pub areas: Vec<String>,
    pub ch_from: Vec<String>,
    pub ch_to: Vec<String>,
    pub work_types: Vec<String>,
    pub descriptions: Vec<String>,
}

/// Inline photo (data URL) with its caption.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhotoNote {
    pub data: String,
    pub caption: String,
}

/// Daily shift report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DailyReport {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub report_date: String,
    pub project_name: String,
    pub location: String,
    pub author: String,
    pub shift: String,
    pub weather: String,
    pub personnel: String,
    pub material_placement: String,
    pub equipment_data: EquipmentTable,
    pub works_data: WorksTable,
    pub materials_data: MaterialsTable,
    pub quality_data: QualityTable,
    pub remarks: String,
    pub photos_data: Vec<PhotoNote>,
    #[serde(flatten)]
    pub filed_by: Author,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record for DailyReport {
    const COLLECTION: &'static str = "daily_reports";
    const LABEL: &'static str = "Daily report";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    // `author` is a report field here; the filing inspector lives in `filed_by`.
    fn author(&self) -> &Author {
        &self.filed_by
    }

    fn author_mut(&mut self) -> &mut Author {
        &mut self.filed_by
    }

    fn summary(&self) -> String {
        format!("{} {} shift {}", self.report_date, self.author, self.shift)
    }
}

/// The record kinds, for dispatch from untyped callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Geodetic,
    Civil,
    Ncr,
    Remark,
    Daily,
}

impl Kind {
    pub const ALL: [Kind; 5] = [
        Kind::Geodetic,
        Kind::Civil,
        Kind::Ncr,
        Kind::Remark,
        Kind::Daily,
    ];

    pub fn collection(self) -> &'static str {
        match self {
            Kind::Geodetic => GeodeticInspection::COLLECTION,
            Kind::Civil => CivilInspection::COLLECTION,
            Kind::Ncr => NcrReport::COLLECTION,
            Kind::Remark => RemarkReport::COLLECTION,
            Kind::Daily => DailyReport::COLLECTION,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Kind::Geodetic => GeodeticInspection::LABEL,
            Kind::Civil => CivilInspection::LABEL,
            Kind::Ncr => NcrReport::LABEL,
            Kind::Remark => RemarkReport::LABEL,
            Kind::Daily => DailyReport::LABEL,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Geodetic => "geodetic",
            Kind::Civil => "civil",
            Kind::Ncr => "ncr",
            Kind::Remark => "remark",
            Kind::Daily => "daily",
        };
        f.write_str(name)
    }
}

impl FromStr for Kind {
    type Err = InspectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "geodetic" | "geo" => Ok(Kind::Geodetic),
            "civil" => Ok(Kind::Civil),
            "ncr" => Ok(Kind::Ncr),
            "remark" | "remarks" => Ok(Kind::Remark),
            "daily" | "daily-report" => Ok(Kind::Daily),
            other => Err(InspectError::Api(format!(
                "Unknown record kind '{}' (expected geodetic, civil, ncr, remark or daily)",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ncr_loads_historical_keys() {
        let raw = json!({
            "id": 7,
            "created_at": "2025-03-01T09:15:00.000000",
            "NCR_Number": "TSFS-AGMK-NCR-0007",
            "NCR_Status": "Открыто",
            "closed_date.plan": "2025-04-01",
            "photos": ["ncr_7_1.jpg"],
            "signed_scan_url": null,
            "signed_scan_uploaded_at": null,
            "signed_scan_uploaded_by": null,
            "inspector_id": 2,
            "inspector_name": "Said Djurabekov",
            "legacy_note": "kept"
        });

        let ncr: NcrReport = serde_json::from_value(raw).unwrap();
        assert_eq!(ncr.meta.id, 7);
        assert_eq!(ncr.number, "TSFS-AGMK-NCR-0007");
        assert_eq!(ncr.closed_date_plan, "2025-04-01");
        assert_eq!(ncr.photos, vec!["ncr_7_1.jpg"]);
        assert_eq!(ncr.author.inspector_id, Some(2));
        assert!(!ncr.has_signed_scan());
        assert_eq!(ncr.extra.get("legacy_note"), Some(&json!("kept")));
        assert!(!ncr.extra.contains_key("id"));
        assert!(!ncr.extra.contains_key("inspector_name"));
    }

    #[test]
    fn unknown_keys_survive_a_round_trip() {
        let raw = json!({"id": 1, "created_at": "x", "Status": "Open", "custom": [1, 2]});
        let remark: RemarkReport = serde_json::from_value(raw).unwrap();
        let back = serde_json::to_value(&remark).unwrap();
        assert_eq!(back["custom"], json!([1, 2]));
        assert_eq!(back["Status"], json!("Open"));
        assert!(back.get("updated_at").is_none());
    }

    #[test]
    fn signed_scan_fields_move_together() {
        let mut ncr = NcrReport::default();
        ncr.set_signed_scan("  https://share/scan.pdf ", "Inspector", "t1".into());
        assert!(ncr.has_signed_scan());
        assert_eq!(ncr.signed_scan_url.as_deref(), Some("https://share/scan.pdf"));
        assert_eq!(ncr.signed_scan_uploaded_by.as_deref(), Some("Inspector"));

        ncr.clear_signed_scan();
        assert_eq!(ncr.signed_scan_url, None);
        assert_eq!(ncr.signed_scan_uploaded_at, None);
        assert_eq!(ncr.signed_scan_uploaded_by, None);
    }

    #[test]
    fn blank_signed_scan_does_not_count() {
        let ncr = NcrReport {
            signed_scan_url: Some("   ".into()),
            ..Default::default()
        };
        assert!(!ncr.has_signed_scan());
    }

    #[test]
    fn daily_report_keeps_author_and_filer_apart() {
        let raw = json!({"id": 3, "author": "Night crew lead", "inspector_name": "Madiyar"});
        let report: DailyReport = serde_json::from_value(raw).unwrap();
        assert_eq!(report.author, "Night crew lead");
        assert_eq!(report.filed_by.inspector_name.as_deref(), Some("Madiyar"));
    }

    #[test]
    fn kind_parsing() {
        assert_eq!("NCR".parse::<Kind>().unwrap(), Kind::Ncr);
        assert_eq!("geo".parse::<Kind>().unwrap(), Kind::Geodetic);
        assert!("weather".parse::<Kind>().is_err());
        assert_eq!(Kind::Remark.collection(), "remark_inspections");
    }

    #[test]
    fn timestamps_sort_lexicographically() {
        let a = timestamp();
        let b = timestamp();
        assert!(b >= a);
        assert_eq!(a.len(), "2025-01-01T00:00:00.000000".len());
    }
}
