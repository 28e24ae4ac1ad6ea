//! Evidence commands - Attach and delete step-2 files

use std::io::Write;
use std::path::Path;

use crate::errors::{CaseError, Result};
use crate::machine::StepMachine;
use crate::repository::CaseRepository;
use crate::schemas::EvidenceUpload;

fn open_error(file: &Path, e: std::io::Error) -> CaseError {
    if e.kind() == std::io::ErrorKind::NotFound {
        CaseError::FileNotFound(format!("File not found: {}", file.display()))
    } else {
        CaseError::Io(e)
    }
}

/// Read a file from disk into an upload, guessing its MIME type from the name.
///
/// Files larger than `max_bytes` are rejected before they are read.
pub fn read_upload(file: &Path, max_bytes: u64) -> Result<EvidenceUpload> {
    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let size = std::fs::metadata(file).map_err(|e| open_error(file, e))?.len();
    if size > max_bytes {
        return Err(CaseError::Validation(format!(
            "{} exceeds the maximum size of {} bytes",
            name, max_bytes
        )));
    }
    let bytes = std::fs::read(file).map_err(|e| open_error(file, e))?;
    let mime = EvidenceUpload::guess_mime(&name);
    Ok(EvidenceUpload::new(name, mime, bytes))
}

pub async fn attach<R: CaseRepository>(
    machine: &StepMachine<R>,
    case_id: u64,
    file: &Path,
    description: Option<&str>,
    out: &mut impl Write,
) -> Result<()> {
    let upload = read_upload(file, machine.config().max_evidence_bytes)?;
    let evidence = machine.attach_evidence(case_id, upload, description).await?;
    writeln!(
        out,
        "Attached {} to case {} as evidence #{} ({})",
        evidence.original_name, case_id, evidence.evidence_id, evidence.path
    )?;
    Ok(())
}

pub async fn delete<R: CaseRepository>(
    machine: &StepMachine<R>,
    case_id: u64,
    evidence_id: u64,
    out: &mut impl Write,
) -> Result<()> {
    machine.delete_evidence(case_id, evidence_id).await?;
    writeln!(out, "Deleted evidence #{} of case {}", evidence_id, case_id)?;
    Ok(())
}
