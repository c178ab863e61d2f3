//! Multipart body → [`UploadRequest`].

use std::convert::Infallible;

use base64::Engine;
use bytes::Bytes;

use crate::error::BadRequest;

/// File name used when the image part carries none.
pub const DEFAULT_FILE_NAME: &str = "image.jpg";

const IMAGE_FIELD: &str = "image";
const USERNAME_FIELD: &str = "username";

/// How the body bytes are encoded on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BodyEncoding {
    #[default]
    Raw,
    Base64,
}

impl BodyEncoding {
    /// Read the encoding from a `Content-Transfer-Encoding` header value.
    pub fn from_header(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.trim().eq_ignore_ascii_case("base64") => BodyEncoding::Base64,
            _ => BodyEncoding::Raw,
        }
    }
}

/// Request body as received, before decoding.
#[derive(Debug, Clone)]
pub struct RawBody {
    pub bytes: Bytes,
    pub encoding: BodyEncoding,
}

impl RawBody {
    pub fn raw(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
            encoding: BodyEncoding::Raw,
        }
    }

    pub fn base64(text: impl Into<Bytes>) -> Self {
        Self {
            bytes: text.into(),
            encoding: BodyEncoding::Base64,
        }
    }

    fn decode(self) -> Result<Bytes, BadRequest> {
        match self.encoding {
            BodyEncoding::Raw => Ok(self.bytes),
            BodyEncoding::Base64 => base64::engine::general_purpose::STANDARD
                .decode(self.bytes.trim_ascii())
                .map(Bytes::from)
                .map_err(|e| BadRequest::MalformedBody(format!("invalid base64 body: {}", e))),
        }
    }
}

/// An image upload ready to forward upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub image: Bytes,
    pub file_name: String,
    /// Content type declared on the image part, if any.
    pub content_type: Option<String>,
    pub username: String,
}

/// Parse a `multipart/form-data` body into an [`UploadRequest`].
///
/// The image is checked before the username, so a body missing both reports
/// [`BadRequest::MissingImage`]. When a field repeats, the last one wins.
pub async fn parse_upload(
    content_type: Option<&str>,
    body: RawBody,
) -> Result<UploadRequest, BadRequest> {
    let content_type = content_type
        .filter(|ct| ct.to_ascii_lowercase().contains("multipart/form-data"))
        .ok_or(BadRequest::MissingContentType)?;

    let boundary = multer::parse_boundary(content_type)
        .map_err(|e| BadRequest::MalformedBody(e.to_string()))?;
    let bytes = body.decode()?;

    let stream = futures_util::stream::once(async move { Ok::<Bytes, Infallible>(bytes) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut image: Option<(Bytes, Option<String>, Option<String>)> = None;
    let mut username: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| BadRequest::MalformedBody(e.to_string()))?
    {
        match field.name() {
            Some(IMAGE_FIELD) => {
                let file_name = field.file_name().map(str::to_string);
                let part_type = field.content_type().map(|mime| mime.to_string());
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| BadRequest::MalformedBody(e.to_string()))?;
                image = Some((data, file_name, part_type));
            }
            Some(USERNAME_FIELD) => {
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| BadRequest::MalformedBody(e.to_string()))?;
                let text = String::from_utf8(data.to_vec()).map_err(|_| {
                    BadRequest::MalformedBody("username is not valid UTF-8".to_string())
                })?;
                username = Some(text);
            }
            _ => {}
        }
    }

    let (image, file_name, content_type) = image
        .filter(|(data, _, _)| !data.is_empty())
        .ok_or(BadRequest::MissingImage)?;
    let username = username
        .filter(|name| !name.trim().is_empty())
        .ok_or(BadRequest::MissingUsername)?;

    Ok(UploadRequest {
        image,
        file_name: file_name
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| DEFAULT_FILE_NAME.to_string()),
        content_type,
        username,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOUNDARY: &str = "----gatewayboundary";

    fn content_type() -> String {
        format!("multipart/form-data; boundary={}", BOUNDARY)
    }

    fn body(parts: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
        let mut out = Vec::new();
        for (name, file_name, data) in parts {
            out.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            match file_name {
                Some(file) => {
                    out.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: image/png\r\n\r\n",
                            name, file
                        )
                        .as_bytes(),
                    );
                }
                None => out.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                ),
            }
            out.extend_from_slice(data);
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        out
    }

    #[tokio::test]
    async fn test_extracts_image_and_username() {
        let raw = body(&[
            ("image", Some("hero.png"), b"\x89PNG\r\n\x1a\n"),
            ("username", None, b"budi"),
        ]);
        let upload = parse_upload(Some(&content_type()), RawBody::raw(raw))
            .await
            .unwrap();

        assert_eq!(upload.image.as_ref(), b"\x89PNG\r\n\x1a\n");
        assert_eq!(upload.file_name, "hero.png");
        assert_eq!(upload.content_type.as_deref(), Some("image/png"));
        assert_eq!(upload.username, "budi");
    }

    #[tokio::test]
    async fn test_default_file_name() {
        let raw = body(&[("image", Some(""), b"data"), ("username", None, b"budi")]);
        let upload = parse_upload(Some(&content_type()), RawBody::raw(raw))
            .await
            .unwrap();
        assert_eq!(upload.file_name, DEFAULT_FILE_NAME);
    }

    #[tokio::test]
    async fn test_base64_body() {
        let raw = body(&[("image", Some("a.jpg"), b"jpeg"), ("username", None, b"sari")]);
        let encoded = base64::engine::general_purpose::STANDARD.encode(raw);
        let upload = parse_upload(Some(&content_type()), RawBody::base64(encoded))
            .await
            .unwrap();
        assert_eq!(upload.image.as_ref(), b"jpeg");
        assert_eq!(upload.username, "sari");
    }

    #[tokio::test]
    async fn test_rejects_non_multipart() {
        let err = parse_upload(Some("application/json"), RawBody::raw("{}"))
            .await
            .unwrap_err();
        assert_eq!(err, BadRequest::MissingContentType);

        let err = parse_upload(None, RawBody::raw("")).await.unwrap_err();
        assert_eq!(err, BadRequest::MissingContentType);
    }

    #[tokio::test]
    async fn test_missing_image_reported_first() {
        let raw = body(&[("other", None, b"x")]);
        let err = parse_upload(Some(&content_type()), RawBody::raw(raw))
            .await
            .unwrap_err();
        assert_eq!(err, BadRequest::MissingImage);
    }

    #[tokio::test]
    async fn test_empty_image_is_missing() {
        let raw = body(&[("image", Some("a.png"), b""), ("username", None, b"budi")]);
        let err = parse_upload(Some(&content_type()), RawBody::raw(raw))
            .await
            .unwrap_err();
        assert_eq!(err, BadRequest::MissingImage);
    }

    #[tokio::test]
    async fn test_missing_or_blank_username() {
        let raw = body(&[("image", Some("a.png"), b"data")]);
        let err = parse_upload(Some(&content_type()), RawBody::raw(raw))
            .await
            .unwrap_err();
        assert_eq!(err, BadRequest::MissingUsername);

        let raw = body(&[("image", Some("a.png"), b"data"), ("username", None, b"  ")]);
        let err = parse_upload(Some(&content_type()), RawBody::raw(raw))
            .await
            .unwrap_err();
        assert_eq!(err, BadRequest::MissingUsername);
    }

    #[tokio::test]
    async fn test_non_utf8_username_is_malformed() {
        let raw = body(&[
            ("image", Some("a.png"), b"data"),
            ("username", None, b"bu\xff\xfedi"),
        ]);
        let err = parse_upload(Some(&content_type()), RawBody::raw(raw))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            BadRequest::MalformedBody("username is not valid UTF-8".to_string())
        );
    }

    #[tokio::test]
    async fn test_utf8_username_is_kept() {
        let raw = body(&[
            ("image", Some("a.png"), b"data"),
            ("username", None, "Dewi Ayu \u{1F600}".as_bytes()),
        ]);
        let upload = parse_upload(Some(&content_type()), RawBody::raw(raw))
            .await
            .unwrap();
        assert_eq!(upload.username, "Dewi Ayu \u{1F600}");
    }

    #[tokio::test]
    async fn test_missing_boundary_is_malformed() {
        let err = parse_upload(Some("multipart/form-data"), RawBody::raw("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, BadRequest::MalformedBody(_)));
    }

    #[tokio::test]
    async fn test_truncated_body_is_malformed() {
        let raw = format!(
            "--{}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"a.png\"\r\n\r\nabc",
            BOUNDARY
        );
        let err = parse_upload(Some(&content_type()), RawBody::raw(raw))
            .await
            .unwrap_err();
        assert!(matches!(err, BadRequest::MalformedBody(_)));
    }

    #[tokio::test]
    async fn test_invalid_base64_is_malformed() {
        let err = parse_upload(Some(&content_type()), RawBody::base64("***"))
            .await
            .unwrap_err();
        assert!(matches!(err, BadRequest::MalformedBody(_)));
    }

    #[test]
    fn test_encoding_from_header() {
        assert_eq!(BodyEncoding::from_header(Some("BASE64")), BodyEncoding::Base64);
        assert_eq!(BodyEncoding::from_header(Some("binary")), BodyEncoding::Raw);
        assert_eq!(BodyEncoding::from_header(None), BodyEncoding::Raw);
    }
}
