//! Archive and response fixtures

use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use std::io::{Cursor, Read, Write};

/// Entries of the sample archive, in archive order
pub const SAMPLE_ENTRIES: &[(&str, &[u8])] = &[
    ("Reports/aqc823.pdf", b"%PDF-1.4 first salary report"),
    ("Reports/aci23s.pdf", b"%PDF-1.4 second salary report"),
    ("notes.txt", b"quarterly numbers attached"),
];

/// Build a zip archive holding `entries`
pub fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in entries {
        writer
            .start_file(*name, zip::write::FileOptions::default())
            .expect("start zip entry");
        writer.write_all(data).expect("write zip entry");
    }
    writer.finish().expect("finish zip").into_inner()
}

/// Read every entry of a zip archive back as `(name, contents)`
pub fn read_zip(bytes: &[u8]) -> Vec<(String, Vec<u8>)> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).expect("valid zip archive");
    (0..archive.len())
        .map(|i| {
            let mut entry = archive.by_index(i).expect("zip entry");
            let mut data = Vec::new();
            entry.read_to_end(&mut data).expect("read zip entry");
            (entry.name().to_string(), data)
        })
        .collect()
}

pub fn in_one_hour() -> DateTime<Utc> {
    Utc::now() + chrono::Duration::hours(1)
}

/// Creation response pointing at the mock server under job `job_id`
pub fn creation_body(base: &str, job_id: &str, expires_at: DateTime<Utc>) -> Value {
    json!({
        "download_url": format!("{base}/2.0/zip_downloads/{job_id}/content"),
        "status_url": format!("{base}/2.0/zip_downloads/{job_id}/status"),
        "expires_at": expires_at.to_rfc3339(),
        "name_conflicts": [
            [
                {"id": "100", "type": "file", "original_name": "salary.pdf", "download_name": "aqc823.pdf"},
                {"id": "200", "type": "file", "original_name": "salary.pdf", "download_name": "aci23s.pdf"}
            ]
        ]
    })
}

/// Status response in `state` for a two-item job
pub fn status_body(state: &str) -> Value {
    json!({
        "total_count": 2,
        "downloaded_count": if state == "succeeded" { 2 } else { 0 },
        "skipped_count": 0,
        "skipped_file_count": 0,
        "skipped_folder_count": 0,
        "state": state
    })
}

/// Creation request body the client is expected to send
pub fn expected_request(name: &str) -> Value {
    json!({
        "items": [
            {"id": "466239504569", "type": "file"},
            {"id": "466239504580", "type": "folder"}
        ],
        "download_file_name": name
    })
}
