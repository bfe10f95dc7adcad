use axum::http::HeaderMap;
use bytes::Bytes;

/// A file pulled out of a multipart body.
#[derive(Debug)]
pub struct Upload {
    pub filename: String,
    pub data: Bytes,
}

/// Reads the file part named `field_name` from a `multipart/form-data` body.
pub async fn read_file_field(
    headers: &HeaderMap,
    body: Bytes,
    field_name: &str,
) -> Result<Upload, String> {
    let boundary = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .and_then(|ct| multer::parse_boundary(ct).ok())
        .ok_or_else(|| "Expected a multipart/form-data upload".to_string())?;

    let stream = futures_util::stream::once(async { Ok::<_, std::io::Error>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Multipart error: {e}"))?
    {
        if field.name() != Some(field_name) {
            continue;
        }

        let filename = field
            .file_name()
            .map(base_name)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| format!("Field '{field_name}' is not a file"))?;

        let data = field
            .bytes()
            .await
            .map_err(|e| format!("Field read error: {e}"))?;

        return Ok(Upload { filename, data });
    }

    Err(format!("Missing '{field_name}' field"))
}

/// Drops any directory part a client put in the filename.
fn base_name(name: &str) -> String {
    name.rsplit(['/', '\\']).next().unwrap_or(name).trim().to_string()
}

pub fn is_docx(filename: &str) -> bool {
    filename.to_lowercase().ends_with(".docx")
}
