//! PNG encoding of composited RGBA frames (color type 6, 8-bit).

use std::io::Write;

/// PNG file signature.
const SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Encode RGBA pixel data (4 bytes per pixel, row-major) as a PNG.
pub fn create_png(pixels: &[u8], width: u32, height: u32) -> Result<Vec<u8>, String> {
    let expected = width as usize * height as usize * 4;
    if pixels.len() != expected {
        return Err(format!(
            "{width}x{height} RGBA needs {expected} bytes, got {}",
            pixels.len()
        ));
    }
    if width == 0 || height == 0 {
        return Err(format!("cannot encode empty {width}x{height} image"));
    }

    let mut png = Vec::new();
    png.extend_from_slice(&SIGNATURE);

    let mut ihdr = Vec::with_capacity(13);
    ihdr.extend_from_slice(&width.to_be_bytes());
    ihdr.extend_from_slice(&height.to_be_bytes());
    ihdr.push(8); // bit depth
    ihdr.push(6); // color type (RGBA)
    ihdr.push(0); // compression method
    ihdr.push(0); // filter method
    ihdr.push(0); // interlace method
    write_chunk(&mut png, b"IHDR", &ihdr);

    let idat = deflate_scanlines(pixels, width as usize, height as usize)
        .map_err(|e| format!("IDAT compression failed: {e}"))?;
    write_chunk(&mut png, b"IDAT", &idat);

    write_chunk(&mut png, b"IEND", &[]);
    Ok(png)
}

/// Length, type, data, CRC over type and data.
fn write_chunk(png: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    png.extend_from_slice(chunk_type);
    png.extend_from_slice(data);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);
    png.extend_from_slice(&hasher.finalize().to_be_bytes());
}

/// Prefix each scanline with filter type 0 and zlib-compress.
fn deflate_scanlines(pixels: &[u8], width: usize, height: usize) -> std::io::Result<Vec<u8>> {
    let row_bytes = width * 4;
    let mut raw = Vec::with_capacity(height * (1 + row_bytes));
    for row in pixels.chunks_exact(row_bytes) {
        raw.push(0);
        raw.extend_from_slice(row);
    }

    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::fast());
    encoder.write_all(&raw)?;
    encoder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::ZlibDecoder;
    use std::io::Read;

    fn chunk_at(png: &[u8], offset: usize) -> (&[u8], &[u8], u32) {
        let len = u32::from_be_bytes(png[offset..offset + 4].try_into().unwrap()) as usize;
        let kind = &png[offset + 4..offset + 8];
        let data = &png[offset + 8..offset + 8 + len];
        let crc = u32::from_be_bytes(png[offset + 8 + len..offset + 12 + len].try_into().unwrap());
        (kind, data, crc)
    }

    #[test]
    fn test_structure_and_crc() {
        let pixels = vec![10u8, 20, 30, 255, 40, 50, 60, 255];
        let png = create_png(&pixels, 2, 1).unwrap();
        assert_eq!(&png[..8], &SIGNATURE);

        let (kind, data, crc) = chunk_at(&png, 8);
        assert_eq!(kind, b"IHDR");
        assert_eq!(&data[..8], &[0, 0, 0, 2, 0, 0, 0, 1]);
        assert_eq!(data[9], 6);
        assert_eq!(crc, crc32fast::hash(&[kind, data].concat()));

        assert_eq!(&png[png.len() - 12..png.len() - 8], &[0, 0, 0, 0]);
        assert_eq!(&png[png.len() - 8..png.len() - 4], b"IEND");
    }

    #[test]
    fn test_idat_inflates_to_filtered_scanlines() {
        let pixels: Vec<u8> = (0..2 * 2 * 4).map(|i| i as u8).collect();
        let png = create_png(&pixels, 2, 2).unwrap();
        let ihdr_end = 8 + 12 + 13;
        let (kind, data, _) = chunk_at(&png, ihdr_end);
        assert_eq!(kind, b"IDAT");

        let mut raw = Vec::new();
        ZlibDecoder::new(data).read_to_end(&mut raw).unwrap();
        assert_eq!(raw.len(), 2 * (1 + 8));
        assert_eq!(raw[0], 0);
        assert_eq!(&raw[1..9], &pixels[..8]);
        assert_eq!(raw[9], 0);
        assert_eq!(&raw[10..], &pixels[8..]);
    }

    #[test]
    fn test_rejects_bad_length() {
        assert!(create_png(&[0u8; 7], 2, 1).is_err());
        assert!(create_png(&[], 0, 0).is_err());
    }
}
