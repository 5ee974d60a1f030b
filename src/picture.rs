//! 画像ファイルの選択
//!
//! 先頭バイトのマジックナンバーで画像形式を判定する。デコードはしない。

use crate::error::{PicWitnessError, Result};
use image::ImageFormat;
use std::path::Path;

/// バイト列の画像形式を判定
pub fn detect_format(bytes: &[u8]) -> Result<ImageFormat> {
    if bytes.is_empty() {
        return Err(PicWitnessError::NotAPicture("empty file".to_string()));
    }

    image::guess_format(bytes).map_err(|_| {
        PicWitnessError::NotAPicture(format!("unrecognized format ({} bytes)", bytes.len()))
    })
}

/// ファイルを読み込み、画像であることを確認して返す
pub async fn read_picture(path: &Path) -> Result<Vec<u8>> {
    if !path.is_file() {
        return Err(PicWitnessError::FileNotFound(path.display().to_string()));
    }

    let bytes = tokio::fs::read(path).await?;
    let format = detect_format(&bytes)
        .map_err(|_| PicWitnessError::NotAPicture(path.display().to_string()))?;
    tracing::debug!(path = %path.display(), ?format, size = bytes.len(), "画像を読み込みました");

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
    const JPEG_HEADER: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];

    #[test]
    fn test_detect_png() {
        assert_eq!(detect_format(PNG_HEADER).unwrap(), ImageFormat::Png);
    }

    #[test]
    fn test_detect_jpeg() {
        assert_eq!(detect_format(JPEG_HEADER).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn test_detect_rejects_text() {
        let result = detect_format(b"hello, this is not a picture");
        assert!(matches!(result, Err(PicWitnessError::NotAPicture(_))));
    }

    #[test]
    fn test_detect_rejects_empty() {
        assert!(matches!(detect_format(&[]), Err(PicWitnessError::NotAPicture(_))));
    }

    #[tokio::test]
    async fn test_read_picture_missing_file() {
        let result = read_picture(Path::new("/nonexistent/picture.png")).await;
        assert!(matches!(result, Err(PicWitnessError::FileNotFound(_))));
    }
}
