//! Sprite decoding and kitty graphics escape sequences.

use std::io::Cursor;

use base64::{engine::general_purpose, Engine as _};
use image::{GenericImageView, ImageFormat};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Terminal cells are roughly twice as tall as they are wide.
const CELL_ASPECT: f32 = 2.0;
const CHUNK_SIZE: usize = 4096;
const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

/// A decoded image ready for the kitty protocol: base64 PNG plus its pixel size.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Sprite {
    pub payload: String,
    pub width: u32,
    pub height: u32,
}

/// Decode image bytes. PNGs pass through untouched, anything else the
/// `image` crate reads is re-encoded as PNG.
pub fn decode_sprite(bytes: &[u8]) -> Result<Sprite, String> {
    let image = image::load_from_memory(bytes).map_err(|err| err.to_string())?;
    let (width, height) = image.dimensions();
    let payload = if bytes.starts_with(PNG_MAGIC) {
        general_purpose::STANDARD.encode(bytes)
    } else {
        let mut png = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|err| err.to_string())?;
        general_purpose::STANDARD.encode(&png)
    };
    Ok(Sprite {
        payload,
        width,
        height,
    })
}

/// Transmit-and-display sequence for `sprite` scaled to `cols` x `rows`
/// cells, chunked the way kitty requires.
pub fn kitty_sequence(sprite: &Sprite, cols: u16, rows: u16, id: u32) -> Result<String, String> {
    let payload = sprite.payload.as_bytes();
    let chunks: Vec<&[u8]> = payload.chunks(CHUNK_SIZE).collect();
    let mut sequence = String::new();
    for (index, chunk) in chunks.iter().enumerate() {
        let more = u8::from(index + 1 < chunks.len());
        let data = std::str::from_utf8(chunk).map_err(|err| err.to_string())?;
        if index == 0 {
            let mut params = format!(
                "f=100,s={},v={},a=T,t=d,i={id},q=2",
                sprite.width, sprite.height
            );
            if cols > 0 {
                params.push_str(&format!(",c={cols}"));
            }
            if rows > 0 {
                params.push_str(&format!(",r={rows}"));
            }
            sequence.push_str(&format!("\x1b_G{params},m={more};{data}\x1b\\"));
        } else {
            sequence.push_str(&format!("\x1b_Gm={more};{data}\x1b\\"));
        }
    }
    Ok(sequence)
}

/// Largest cell box inside `max_cols` x `max_rows` that keeps the aspect ratio.
pub fn sprite_fit(sprite: &Sprite, max_cols: u16, max_rows: u16) -> (u16, u16) {
    if max_cols == 0 || max_rows == 0 || sprite.height == 0 {
        return (max_cols, max_rows);
    }
    let ratio = sprite.width as f32 / sprite.height as f32;
    let cols_for_rows = ratio * max_rows as f32 * CELL_ASPECT;
    if cols_for_rows <= max_cols as f32 {
        return ((cols_for_rows.round() as u16).max(1), max_rows);
    }
    let rows_for_cols = max_cols as f32 / (ratio * CELL_ASPECT);
    (max_cols, (rows_for_cols.round() as u16).clamp(1, max_rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use pretty_assertions::assert_eq;

    fn encoded(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
        let image = RgbaImage::from_pixel(width, height, Rgba([240, 80, 48, 255]));
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), format)
            .unwrap();
        bytes
    }

    #[test]
    fn png_passes_through() {
        let bytes = encoded(96, 48, ImageFormat::Png);
        let sprite = decode_sprite(&bytes).unwrap();
        assert_eq!((sprite.width, sprite.height), (96, 48));
        assert_eq!(
            general_purpose::STANDARD.decode(&sprite.payload).unwrap(),
            bytes
        );
    }

    #[test]
    fn other_formats_become_png() {
        let sprite = decode_sprite(&encoded(8, 8, ImageFormat::Bmp)).unwrap();
        let png = general_purpose::STANDARD.decode(&sprite.payload).unwrap();
        assert!(png.starts_with(PNG_MAGIC));
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(decode_sprite(b"<html>404</html>").is_err());
    }

    #[test]
    fn long_payloads_are_chunked() {
        let sprite = Sprite {
            payload: "A".repeat(CHUNK_SIZE + 10),
            width: 96,
            height: 96,
        };
        let sequence = kitty_sequence(&sprite, 12, 6, 7).unwrap();
        let parts: Vec<&str> = sequence.split("\x1b\\").filter(|s| !s.is_empty()).collect();
        assert_eq!(parts.len(), 2);
        assert!(parts[0].starts_with("\x1b_Gf=100,s=96,v=96,a=T,t=d,i=7,q=2,c=12,r=6,m=1;"));
        assert_eq!(parts[1], format!("\x1b_Gm=0;{}", "A".repeat(10)));
    }

    #[test]
    fn fit_keeps_aspect_ratio() {
        let square = Sprite {
            payload: String::new(),
            width: 96,
            height: 96,
        };
        assert_eq!(sprite_fit(&square, 40, 8), (16, 8));
        assert_eq!(sprite_fit(&square, 10, 8), (10, 5));
    }
}
