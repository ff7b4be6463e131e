//! # NCR Lifecycle
//!
//! Nonconformance reports are the one record kind with state of their own:
//!
//! - **Sequence numbers**: `PREFIX + 4-digit counter`, allocated as the
//!   highest parseable suffix under the prefix plus one. Values that do not
//!   carry the prefix or do not parse are skipped.
//! - **Merge updates**: only supplied, non-blank values overwrite stored ones.
//!   Whitespace-only counts as blank.
//! - **Signed scan**: `signed_scan_url`, `_uploaded_at` and `_uploaded_by` are
//!   set and cleared as one group.
//! - **Close**: `Open → Закрыто` requires a signed scan. Closed is terminal:
//!   the status cannot change again and the scan cannot be removed.
//! - **Photos**: stored as `ncr_<id>_<n><ext>` in the attachment store; the
//!   record keeps only the names.
//!
//! Creation allocates the id, the sequence number and the photo names from one
//! snapshot under the collection lock, and writes the collection once.

use crate::commands::{CmdMessage, CmdResult, Fields};
use crate::error::{InspectError, Result};
use crate::model::{is_closed_status, timestamp, Author, NcrReport, Record, NCR_CLOSED_STATUS};
use crate::store::attachments::{AttachmentStore, IncomingFile};
use crate::store::backend::StorageBackend;
use crate::store::RecordStore;
use serde::Deserialize;

pub const DEFAULT_PREFIX: &str = "TSFS-AGMK-NCR-";

pub const SIGN_ADVISORY: &str =
    "The NCR must be printed, signed by the contractor, and the signed scan link uploaded.";
pub const CLOSE_REQUIRES_SCAN: &str = "Cannot close an NCR without a signed scan.";
pub const CLOSED_IS_FINAL: &str = "A closed NCR cannot change status.";
pub const SCAN_LOCKED: &str = "Cannot remove the signed scan of a closed NCR.";

pub fn sequence_number(prefix: &str, n: u64) -> String {
    format!("{}{:04}", prefix, n)
}

/// The next sequence number after every number in `records` that carries `prefix`.
pub fn next_number_in(records: &[NcrReport], prefix: &str) -> String {
    let next = records
        .iter()
        .filter_map(|r| r.number.strip_prefix(prefix))
        .filter_map(|suffix| suffix.trim().parse::<u64>().ok())
        .filter_map(|n| n.checked_add(1))
        .max()
        .unwrap_or(1);
    sequence_number(prefix, next)
}

/// Computed from the current collection on every call. An unreadable
/// collection reads as empty, giving number 1.
pub fn next_sequence_number<B: StorageBackend>(store: &RecordStore<B>, prefix: &str) -> String {
    next_number_in(&store.load::<NcrReport>(), prefix)
}

/// Caller-editable NCR fields. `None` or blank means "leave unchanged".
///
/// Store-managed fields (number, photos, signed scan, close stamps) are not
/// part of the patch; unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NcrPatch {
    #[serde(rename = "Project")]
    pub project: Option<String>,
    #[serde(rename = "Contractor")]
    pub contractor: Option<String>,
    pub technical_supervisor_company: Option<String>,
    #[serde(rename = "Discipline")]
    pub discipline: Option<String>,
    pub major_object: Option<String>,
    #[serde(rename = "Draw_number")]
    pub draw_number: Option<String>,
    #[serde(rename = "Location")]
    pub location: Option<String>,
    #[serde(rename = "Procedure")]
    pub procedure: Option<String>,
    #[serde(rename = "NCR_Description")]
    pub description: Option<String>,
    #[serde(rename = "NCR_grade")]
    pub grade: Option<String>,
    pub priority: Option<String>,
    pub inspection_date: Option<String>,
    #[serde(rename = "Correction_acts")]
    pub correction_acts: Option<String>,
    #[serde(rename = "closed_date.plan")]
    pub closed_date_plan: Option<String>,
    #[serde(rename = "closed_date.actual")]
    pub closed_date_actual: Option<String>,
    #[serde(rename = "Measures")]
    pub measures: Option<String>,
    pub inspector_name_field: Option<String>,
    #[serde(rename = "NCR_Status")]
    pub status: Option<String>,
}

fn overwrite(target: &mut String, value: &Option<String>) {
    if let Some(value) = value {
        if !value.trim().is_empty() {
            *target = value.clone();
        }
    }
}

impl NcrPatch {
    pub fn from_fields(fields: &Fields) -> Result<Self> {
        let value = serde_json::to_value(fields)?;
        serde_json::from_value(value)
            .map_err(|e| InspectError::Api(format!("Invalid NCR fields: {}", e)))
    }

    /// The new status, if the patch sets one.
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref().filter(|s| !s.trim().is_empty())
    }

    pub fn apply(&self, ncr: &mut NcrReport) {
        overwrite(&mut ncr.project, &self.project);
        overwrite(&mut ncr.contractor, &self.contractor);
        overwrite(
            &mut ncr.technical_supervisor_company,
            &self.technical_supervisor_company,
        );
        overwrite(&mut ncr.discipline, &self.discipline);
        overwrite(&mut ncr.major_object, &self.major_object);
        overwrite(&mut ncr.draw_number, &self.draw_number);
        overwrite(&mut ncr.location, &self.location);
        overwrite(&mut ncr.procedure, &self.procedure);
        overwrite(&mut ncr.description, &self.description);
        overwrite(&mut ncr.grade, &self.grade);
        overwrite(&mut ncr.priority, &self.priority);
        overwrite(&mut ncr.inspection_date, &self.inspection_date);
        overwrite(&mut ncr.correction_acts, &self.correction_acts);
        overwrite(&mut ncr.closed_date_plan, &self.closed_date_plan);
        overwrite(&mut ncr.closed_date_actual, &self.closed_date_actual);
        overwrite(&mut ncr.measures, &self.measures);
        overwrite(&mut ncr.inspector_name_field, &self.inspector_name_field);
        overwrite(&mut ncr.status, &self.status);
    }
}

fn photo_name(id: u64, n: u64, extension: &str) -> String {
    format!("ncr_{}_{}{}", id, n, extension)
}

/// The numeric suffix of a stored photo name for `id`, if it has one.
fn photo_number(id: u64, name: &str) -> Option<u64> {
    let rest = name.strip_prefix(&format!("ncr_{}_", id))?;
    let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}

fn photo_base(ncr: &NcrReport) -> u64 {
    let highest = ncr
        .photos
        .iter()
        .filter_map(|name| photo_number(ncr.id(), name))
        .max()
        .unwrap_or(0);
    highest.max(ncr.photos.len() as u64)
}

fn photo_slot(base: u64, index: usize) -> Result<u64> {
    (index as u64)
        .checked_add(1)
        .and_then(|offset| base.checked_add(offset))
        .ok_or_else(|| InspectError::Store(format!("Photo numbering exhausted after {}", base)))
}

/// Store each named incoming file, returning the stored names in order.
/// On failure the files already stored by this call are removed again.
fn store_photos<A: AttachmentStore>(
    files: &A,
    id: u64,
    base: u64,
    incoming: &[IncomingFile],
) -> Result<Vec<String>> {
    let mut stored = Vec::new();
    for (index, file) in incoming
        .iter()
        .filter(|f| !f.name.trim().is_empty())
        .enumerate()
    {
        let saved = photo_slot(base, index)
            .map(|n| photo_name(id, n, &file.extension()))
            .and_then(|name| files.save(&name, &file.bytes).map(|_| name));
        let name = match saved {
            Ok(name) => name,
            Err(e) => {
                discard_photos(files, &stored);
                return Err(e);
            }
        };
        stored.push(name);
    }
    Ok(stored)
}

fn discard_photos<A: AttachmentStore>(files: &A, names: &[String]) {
    for name in names {
        if let Err(e) = files.delete(name) {
            tracing::warn!(photo = %name, error = %e, "could not remove photo");
        }
    }
}

pub fn create<B: StorageBackend, A: AttachmentStore>(
    store: &RecordStore<B>,
    files: &A,
    prefix: &str,
    patch: &NcrPatch,
    photos: &[IncomingFile],
    author: &Author,
) -> Result<CmdResult<NcrReport>> {
    // A new NCR has no signed scan, so it cannot start out closed.
    if patch.status().is_some_and(is_closed_status) {
        return Err(InspectError::Precondition(CLOSE_REQUIRES_SCAN.to_string()));
    }

    let mut stored: Vec<String> = Vec::new();
    let inserted = store.insert_with(|existing: &[NcrReport], id| {
        let mut ncr = NcrReport::default();
        patch.apply(&mut ncr);
        ncr.number = next_number_in(existing, prefix);
        ncr.author = author.clone();
        stored = store_photos(files, id, 0, photos)?;
        ncr.photos = stored.clone();
        Ok(ncr)
    });

    let ncr = match inserted {
        Ok(ncr) => ncr,
        Err(e) => {
            discard_photos(files, &stored);
            return Err(e);
        }
    };

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!("NCR {} created", ncr.number)));
    result.add_message(CmdMessage::warning(SIGN_ADVISORY));
    Ok(result.with_records(vec![ncr]))
}

/// Overlay `patch` onto the stored NCR. A non-blank `signed_scan_url` attaches
/// the signed scan first, so one call can attach the scan and close.
pub fn merge_update<B: StorageBackend>(
    store: &RecordStore<B>,
    id: u64,
    patch: &NcrPatch,
    signed_scan_url: Option<&str>,
    actor: &str,
) -> Result<CmdResult<NcrReport>> {
    let scan = signed_scan_url.map(str::trim).filter(|url| !url.is_empty());
    let mut closed_now = false;

    let ncr = store.patch(id, |ncr: &mut NcrReport| {
        let was_closed = ncr.is_closed();
        if let Some(status) = patch.status() {
            if was_closed && !is_closed_status(status) {
                return Err(InspectError::Precondition(CLOSED_IS_FINAL.to_string()));
            }
        }

        let now = timestamp();
        if let Some(url) = scan {
            ncr.set_signed_scan(url, actor, now.clone());
        }
        patch.apply(ncr);

        if !was_closed && ncr.is_closed() {
            if !ncr.has_signed_scan() {
                return Err(InspectError::Precondition(CLOSE_REQUIRES_SCAN.to_string()));
            }
            ncr.status = NCR_CLOSED_STATUS.to_string();
            ncr.closed_at = Some(now);
            ncr.closed_by = Some(actor.to_string());
            closed_now = true;
        }
        Ok(())
    })?;

    let mut result = CmdResult::default();
    if closed_now {
        result.add_message(CmdMessage::success(format!("NCR {} closed", ncr.number)));
    } else {
        result.add_message(CmdMessage::success(format!("NCR {} updated", ncr.number)));
        if !ncr.has_signed_scan() {
            result.add_message(CmdMessage::warning(SIGN_ADVISORY));
        }
    }
    Ok(result.with_records(vec![ncr]))
}

pub fn close<B: StorageBackend>(
    store: &RecordStore<B>,
    id: u64,
    actor: &str,
) -> Result<CmdResult<NcrReport>> {
    let current = store
        .get::<NcrReport>(id)
        .ok_or_else(|| InspectError::not_found(NcrReport::COLLECTION, id))?;
    if current.is_closed() {
        let mut result = CmdResult::default();
        result.add_message(CmdMessage::info(format!(
            "NCR {} is already closed",
            current.number
        )));
        return Ok(result.with_records(vec![current]));
    }

    let ncr = store.patch(id, |ncr: &mut NcrReport| {
        if !ncr.has_signed_scan() {
            return Err(InspectError::Precondition(CLOSE_REQUIRES_SCAN.to_string()));
        }
        ncr.status = NCR_CLOSED_STATUS.to_string();
        ncr.closed_at = Some(timestamp());
        ncr.closed_by = Some(actor.to_string());
        Ok(())
    })?;

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!("NCR {} closed", ncr.number)));
    Ok(result.with_records(vec![ncr]))
}

pub fn remove_signed_scan<B: StorageBackend>(
    store: &RecordStore<B>,
    id: u64,
) -> Result<CmdResult<NcrReport>> {
    let ncr = store.patch(id, |ncr: &mut NcrReport| {
        if ncr.is_closed() {
            return Err(InspectError::Precondition(SCAN_LOCKED.to_string()));
        }
        ncr.clear_signed_scan();
        Ok(())
    })?;

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "Signed scan removed from NCR {}",
        ncr.number
    )));
    Ok(result.with_records(vec![ncr]))
}

/// Store `incoming` and append the names to the NCR's photo list.
pub fn add_photos<B: StorageBackend, A: AttachmentStore>(
    store: &RecordStore<B>,
    files: &A,
    id: u64,
    incoming: &[IncomingFile],
) -> Result<CmdResult<NcrReport>> {
    let mut stored: Vec<String> = Vec::new();
    let patched = store.patch(id, |ncr: &mut NcrReport| {
        stored = store_photos(files, id, photo_base(ncr), incoming)?;
        ncr.photos.extend(stored.iter().cloned());
        Ok(())
    });

    let ncr = match patched {
        Ok(ncr) => ncr,
        Err(e) => {
            discard_photos(files, &stored);
            return Err(e);
        }
    };

    let mut result = CmdResult::default();
    if stored.is_empty() {
        result.add_message(CmdMessage::info("No photos to add"));
    } else {
        result.add_message(CmdMessage::success(format!(
            "{} photo(s) added to NCR {}",
            stored.len(),
            ncr.number
        )));
    }
    Ok(result.with_records(vec![ncr]).with_paths(
        stored.iter().map(|name| files.path(name)).collect(),
    ))
}

/// Remove `filename` from the photo list and delete the stored file. A name
/// that is not listed is a no-op.
pub fn remove_photo<B: StorageBackend, A: AttachmentStore>(
    store: &RecordStore<B>,
    files: &A,
    id: u64,
    filename: &str,
) -> Result<CmdResult<NcrReport>> {
    let current = store
        .get::<NcrReport>(id)
        .ok_or_else(|| InspectError::not_found(NcrReport::COLLECTION, id))?;

    let mut result = CmdResult::default();
    if !current.photos.iter().any(|p| p == filename) {
        result.add_message(CmdMessage::info(format!(
            "{} is not attached to NCR {}",
            filename, current.number
        )));
        return Ok(result.with_records(vec![current]));
    }

    let ncr = store.patch(id, |ncr: &mut NcrReport| {
        ncr.photos.retain(|p| p != filename);
        Ok(())
    })?;

    if files.exists(filename) {
        if let Err(e) = files.delete(filename) {
            tracing::warn!(photo = filename, error = %e, "photo file not deleted");
            result.add_message(CmdMessage::warning(format!(
                "Photo unlinked, but the file could not be deleted: {}",
                e
            )));
        }
    }
    result.add_message(CmdMessage::success(format!(
        "Photo {} removed from NCR {}",
        filename, ncr.number
    )));
    Ok(result.with_records(vec![ncr]))
}

/// Delete the NCR and its stored photos.
pub fn delete<B: StorageBackend, A: AttachmentStore>(
    store: &RecordStore<B>,
    files: &A,
    id: u64,
) -> Result<CmdResult<NcrReport>> {
    let removed = store.delete::<NcrReport>(id)?;

    let mut result = CmdResult::default();
    for name in &removed.photos {
        if let Err(e) = files.delete(name) {
            tracing::warn!(photo = %name, error = %e, "photo file not deleted");
            result.add_message(CmdMessage::warning(format!(
                "Photo {} could not be deleted: {}",
                name, e
            )));
        }
    }
    let label = if removed.number.is_empty() {
        format!("#{}", id)
    } else {
        removed.number.clone()
    };
    result.add_message(CmdMessage::success(format!("NCR {} deleted", label)));
    Ok(result.with_records(vec![removed]))
}

/// Form defaults taken from the most recently stored NCR.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NcrDefaults {
    pub contractor: String,
    pub technical_supervisor_company: String,
}

pub fn last_ncr_defaults<B: StorageBackend>(store: &RecordStore<B>) -> NcrDefaults {
    store
        .load::<NcrReport>()
        .last()
        .map(|ncr| NcrDefaults {
            contractor: ncr.contractor.clone(),
            technical_supervisor_company: ncr.technical_supervisor_company.clone(),
        })
        .unwrap_or_default()
}
