// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Input image loading and normalisation.
//!
//! Two on-disk forms are accepted: binary PGM ("P5") with dimensions
//! matching the configured input plane, or a raw file of exactly
//! `height·width` intensity bytes. Either way the result is a host-side
//! `f32` array with intensities scaled to `[0, 1]`.

use crate::NetworkError;
use std::path::Path;

/// Loads a grayscale image and normalises it to `[0, 1]` (intensity / 255).
///
/// # Errors
/// Returns [`NetworkError::ImageLoad`] when the file cannot be read, is
/// neither a binary PGM nor a raw `height·width` byte array, or has
/// dimensions other than the expected ones.
pub fn load_normalized(
    path: &Path,
    height: usize,
    width: usize,
) -> Result<Vec<f32>, NetworkError> {
    let bytes = std::fs::read(path).map_err(|e| NetworkError::ImageLoad {
        path: path.display().to_string(),
        detail: e.to_string(),
    })?;

    let pixels = if bytes.starts_with(b"P5") {
        parse_pgm(&bytes, path, height, width)?
    } else if bytes.len() == height * width {
        bytes
    } else {
        return Err(NetworkError::ImageLoad {
            path: path.display().to_string(),
            detail: format!(
                "expected binary PGM or raw {height}x{width} intensity bytes, got {} bytes",
                bytes.len(),
            ),
        });
    };

    Ok(pixels.iter().map(|&b| f32::from(b) / 255.0).collect())
}

/// Parses a binary PGM (P5) payload and returns its pixel bytes.
fn parse_pgm(
    bytes: &[u8],
    path: &Path,
    height: usize,
    width: usize,
) -> Result<Vec<u8>, NetworkError> {
    let fail = |detail: String| NetworkError::ImageLoad {
        path: path.display().to_string(),
        detail,
    };

    let mut pos = 2; // Past the "P5" magic.
    let next_token = |pos: &mut usize| -> Result<usize, NetworkError> {
        // Skip whitespace and '#' comment lines.
        loop {
            while *pos < bytes.len() && bytes[*pos].is_ascii_whitespace() {
                *pos += 1;
            }
            if *pos < bytes.len() && bytes[*pos] == b'#' {
                while *pos < bytes.len() && bytes[*pos] != b'\n' {
                    *pos += 1;
                }
            } else {
                break;
            }
        }
        let start = *pos;
        while *pos < bytes.len() && bytes[*pos].is_ascii_digit() {
            *pos += 1;
        }
        if start == *pos {
            return Err(fail("truncated PGM header".to_string()));
        }
        std::str::from_utf8(&bytes[start..*pos])
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| fail("invalid PGM header token".to_string()))
    };

    let pgm_width = next_token(&mut pos)?;
    let pgm_height = next_token(&mut pos)?;
    let max_val = next_token(&mut pos)?;

    if pgm_width != width || pgm_height != height {
        return Err(fail(format!(
            "PGM is {pgm_width}x{pgm_height}, expected {width}x{height}"
        )));
    }
    if max_val == 0 || max_val > 255 {
        return Err(fail(format!("unsupported PGM max value {max_val}")));
    }

    // A single whitespace byte separates the header from the raster.
    pos += 1;
    let expected = height * width;
    if bytes.len() < pos + expected {
        return Err(fail(format!(
            "PGM raster truncated: {} bytes after header, expected {expected}",
            bytes.len().saturating_sub(pos),
        )));
    }

    Ok(bytes[pos..pos + expected].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_file(name: &str, contents: &[u8]) -> PathBuf {
        let path = std::env::temp_dir().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_raw_bytes_normalised() {
        let path = temp_file("convnet_rt_img_raw.bin", &[0u8, 51, 102, 255]);
        let pixels = load_normalized(&path, 2, 2).unwrap();
        assert_eq!(pixels.len(), 4);
        assert!((pixels[0] - 0.0).abs() < 1e-6);
        assert!((pixels[1] - 0.2).abs() < 1e-6);
        assert!((pixels[3] - 1.0).abs() < 1e-6);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_pgm_with_comment() {
        let mut data = b"P5\n# test image\n3 2\n255\n".to_vec();
        data.extend_from_slice(&[10, 20, 30, 40, 50, 60]);
        let path = temp_file("convnet_rt_img.pgm", &data);

        let pixels = load_normalized(&path, 2, 3).unwrap();
        assert_eq!(pixels.len(), 6);
        assert!((pixels[5] - 60.0 / 255.0).abs() < 1e-6);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_pgm_dimension_mismatch() {
        let mut data = b"P5\n4 4\n255\n".to_vec();
        data.extend_from_slice(&[0; 16]);
        let path = temp_file("convnet_rt_img_dims.pgm", &data);

        let result = load_normalized(&path, 2, 2);
        assert!(matches!(result, Err(NetworkError::ImageLoad { .. })));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_wrong_raw_size() {
        let path = temp_file("convnet_rt_img_short.bin", &[1, 2, 3]);
        let result = load_normalized(&path, 2, 2);
        assert!(matches!(result, Err(NetworkError::ImageLoad { .. })));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_missing_file() {
        let result = load_normalized(Path::new("/nonexistent/img.pgm"), 2, 2);
        assert!(matches!(result, Err(NetworkError::ImageLoad { .. })));
    }

    #[test]
    fn test_truncated_pgm_raster() {
        let mut data = b"P5\n2 2\n255\n".to_vec();
        data.extend_from_slice(&[1, 2]); // Two bytes short.
        let path = temp_file("convnet_rt_img_trunc.pgm", &data);

        let result = load_normalized(&path, 2, 2);
        assert!(matches!(result, Err(NetworkError::ImageLoad { .. })));
        std::fs::remove_file(&path).ok();
    }
}
