use crate::config::EngineSettings;
use crate::error::{LedgerError, Result};
use crate::migration::ensure_all;
use crate::schema::{Store, YearRecord};
use chrono::{DateTime, SecondsFormat, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportMeta {
    pub version: String,
    /// ISO-8601 timestamp of the export.
    pub export_date: String,
    pub app_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportData<'a> {
    pub years: &'a BTreeMap<i32, YearRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportEnvelope<'a> {
    pub meta: ExportMeta,
    pub data: ExportData<'a>,
}

/// Wraps the store's years in the versioned export envelope. Every pair is brought
/// to the current shape first.
pub fn export_envelope<'a>(
    store: &'a mut Store,
    settings: &EngineSettings,
    now: DateTime<Utc>,
) -> ExportEnvelope<'a> {
    ensure_all(store);
    ExportEnvelope {
        meta: ExportMeta {
            version: settings.export_version.clone(),
            export_date: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            app_name: settings.app_name.clone(),
        },
        data: ExportData {
            years: &store.years,
        },
    }
}

pub fn export_json(store: &mut Store, settings: &EngineSettings, now: DateTime<Utc>) -> Result<String> {
    let envelope = export_envelope(store, settings, now);
    info!(
        "Exporting {} years (format {})",
        envelope.data.years.len(),
        envelope.meta.version
    );
    Ok(serde_json::to_string_pretty(&envelope)?)
}

/// Which layout an import file used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportFormat {
    /// `meta` + `data` envelope, with the version it declared.
    Enveloped { version: Option<String> },
    /// A bare store with `years` at the top level.
    Legacy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub format: ImportFormat,
    pub years: usize,
    pub pairs: usize,
}

/// Decodes an import file into a replacement store without touching the live one.
///
/// A null `meta` counts as absent. A null `years` inside the envelope imports as an
/// empty ledger.
pub fn parse_import(text: &str) -> Result<(Store, ImportFormat)> {
    let document: Value = serde_json::from_str(text)?;

    let meta = document.get("meta").filter(|meta| !meta.is_null());
    let data = document
        .get("data")
        .filter(|data| data.get("years").is_some());
    let legacy_years = document.get("years").filter(|years| !years.is_null());

    let (payload, format) = match (meta, data) {
        (Some(meta), Some(data)) => {
            let version = meta
                .get("version")
                .and_then(Value::as_str)
                .map(str::to_string);
            (data.clone(), ImportFormat::Enveloped { version })
        }
        _ if legacy_years.is_some() => (document.clone(), ImportFormat::Legacy),
        _ => return Err(LedgerError::UnrecognizedImportShape),
    };

    let store: Store = serde_json::from_value(payload)?;
    Ok((store, format))
}

/// Replaces `store` with the contents of an import file and migrates every pair.
/// On any error the live store is left as it was.
pub fn import_json(store: &mut Store, text: &str) -> Result<ImportSummary> {
    let (mut imported, format) = parse_import(text)?;
    match &format {
        ImportFormat::Enveloped { version } => info!(
            "Importing file version {}",
            version.as_deref().unwrap_or("unknown")
        ),
        ImportFormat::Legacy => info!("Importing legacy file without envelope"),
    }

    ensure_all(&mut imported);
    let summary = ImportSummary {
        format,
        years: imported.years.len(),
        pairs: imported.pairs().len(),
    };
    *store = imported;
    Ok(summary)
}
