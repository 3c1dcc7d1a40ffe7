use std::path::Path;

use base64::{engine::general_purpose, Engine as _};

const FALLBACK_MIME: &str = "image/jpeg";

pub fn detect_image_mime(data: &[u8]) -> &'static str {
    infer::get(data)
        .map(|kind| kind.mime_type())
        .filter(|mime| mime.starts_with("image/"))
        .unwrap_or(FALLBACK_MIME)
}

pub fn encode_reference_image(data: &[u8]) -> String {
    let encoded = general_purpose::STANDARD.encode(data);
    format!("data:{};base64,{}", detect_image_mime(data), encoded)
}

pub async fn load_reference_image(path: &Path) -> std::io::Result<String> {
    let data = tokio::fs::read(path).await?;
    Ok(encode_reference_image(&data))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    #[test]
    fn png_bytes_are_sniffed() {
        let url = encode_reference_image(PNG_HEADER);
        assert!(url.starts_with("data:image/png;base64,iVBORw0KGgo"));
    }

    #[test]
    fn unknown_bytes_default_to_jpeg() {
        assert_eq!(encode_reference_image(b"hi"), "data:image/jpeg;base64,aGk=");
        assert_eq!(detect_image_mime(b"%PDF-1.7"), FALLBACK_MIME);
    }
}
