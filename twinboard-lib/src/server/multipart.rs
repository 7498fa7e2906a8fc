//! `multipart/form-data` request parsing.

use crate::error::UploadError;

/// One part of a form submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormPart {
    /// Form field name.
    pub name: String,
    /// Client-side file name, for file parts.
    pub file_name: Option<String>,
    /// Declared content type of the part.
    pub content_type: Option<String>,
    /// Raw part body.
    pub data: Vec<u8>,
}

impl FormPart {
    /// Returns the body as text, replacing invalid UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }
}

/// Extracts the boundary from a `multipart/form-data` Content-Type value.
///
/// Returns `None` for any other media type.
pub fn boundary(content_type: &str) -> Option<String> {
    let mut params = content_type.split(';');
    let media_type = params.next()?.trim();
    if !media_type.eq_ignore_ascii_case("multipart/form-data") {
        return None;
    }
    params
        .filter_map(|param| param.trim().split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("boundary"))
        .map(|(_, value)| value.trim().trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}

/// Parses a form body into its parts, in order.
pub fn parse(body: &[u8], boundary: &str) -> Result<Vec<FormPart>, UploadError> {
    let delimiter = format!("--{}", boundary).into_bytes();
    let mut closing = b"\r\n".to_vec();
    closing.extend_from_slice(&delimiter);

    let mut pos = find(body, &delimiter, 0)
        .ok_or_else(|| UploadError::Multipart("boundary not found".to_string()))?
        + delimiter.len();
    let mut parts = Vec::new();

    loop {
        let rest = &body[pos..];
        if rest.starts_with(b"--") {
            return Ok(parts);
        }
        if !rest.starts_with(b"\r\n") {
            return Err(UploadError::Multipart("malformed boundary line".to_string()));
        }
        let header_start = pos + 2;
        let header_end = find(body, b"\r\n\r\n", header_start)
            .ok_or_else(|| UploadError::Multipart("unterminated part headers".to_string()))?;
        let headers = std::str::from_utf8(&body[header_start..header_end])
            .map_err(|_| UploadError::Multipart("part headers are not UTF-8".to_string()))?;

        let data_start = header_end + 4;
        let data_end = find(body, &closing, data_start)
            .ok_or_else(|| UploadError::Multipart("missing closing boundary".to_string()))?;

        parts.push(part_from_headers(headers, body[data_start..data_end].to_vec())?);
        pos = data_end + closing.len();
    }
}

fn part_from_headers(headers: &str, data: Vec<u8>) -> Result<FormPart, UploadError> {
    let mut name = None;
    let mut file_name = None;
    let mut content_type = None;

    for line in headers.split("\r\n") {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        if key.eq_ignore_ascii_case("content-disposition") {
            for param in value.split(';').skip(1) {
                let Some((param_key, param_value)) = param.trim().split_once('=') else {
                    continue;
                };
                let param_value = param_value.trim().trim_matches('"').to_string();
                match param_key.trim().to_ascii_lowercase().as_str() {
                    "name" => name = Some(param_value),
                    "filename" => file_name = Some(param_value),
                    _ => {}
                }
            }
        } else if key.eq_ignore_ascii_case("content-type") {
            content_type = Some(value.trim().to_string());
        }
    }

    let name = name.ok_or_else(|| UploadError::Multipart("part without a name".to_string()))?;
    Ok(FormPart {
        name,
        file_name,
        content_type,
        data,
    })
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from > haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|offset| from + offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = "--XyZ\r\n\
        Content-Disposition: form-data; name=\"name\"\r\n\
        \r\n\
        Press 7\r\n\
        --XyZ\r\n\
        Content-Disposition: form-data; name=\"file\"; filename=\"press.json\"\r\n\
        Content-Type: application/json\r\n\
        \r\n\
        {\"fields\":[]}\r\n\
        --XyZ--\r\n";

    #[test]
    fn test_boundary_from_content_type() {
        assert_eq!(
            boundary("multipart/form-data; boundary=XyZ").as_deref(),
            Some("XyZ")
        );
        assert_eq!(
            boundary("Multipart/Form-Data; charset=utf-8; boundary=\"a b\"").as_deref(),
            Some("a b")
        );
        assert_eq!(boundary("application/json"), None);
        assert_eq!(boundary("multipart/form-data"), None);
    }

    #[test]
    fn test_parse_fields_and_file() {
        let parts = parse(BODY.as_bytes(), "XyZ").unwrap();
        assert_eq!(parts.len(), 2);

        assert_eq!(parts[0].name, "name");
        assert_eq!(parts[0].file_name, None);
        assert_eq!(parts[0].text(), "Press 7");

        assert_eq!(parts[1].name, "file");
        assert_eq!(parts[1].file_name.as_deref(), Some("press.json"));
        assert_eq!(parts[1].content_type.as_deref(), Some("application/json"));
        assert_eq!(parts[1].data, br#"{"fields":[]}"#);
    }

    #[test]
    fn test_parse_keeps_binary_bytes() {
        let mut body = b"--b\r\nContent-Disposition: form-data; name=\"f\"\r\n\r\n".to_vec();
        body.extend_from_slice(&[0xff, 0x00, b'\r', b'\n', 0xfe]);
        body.extend_from_slice(b"\r\n--b--\r\n");
        let parts = parse(&body, "b").unwrap();
        assert_eq!(parts[0].data, vec![0xff, 0x00, b'\r', b'\n', 0xfe]);
    }

    #[test]
    fn test_parse_rejects_truncated_body() {
        let body = "--b\r\nContent-Disposition: form-data; name=\"f\"\r\n\r\nabc";
        assert!(matches!(
            parse(body.as_bytes(), "b"),
            Err(UploadError::Multipart(_))
        ));
    }
}
