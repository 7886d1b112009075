//! Raster rendering of a finished symbol: quiet-zone padding and per-module
//! pixel expansion, then encoding as PPM (binary P6) or PNG.

use byteorder::{BigEndian, WriteBytesExt};

use crate::encoder::Symbol;
use crate::error::Result;

/// Light border width, in modules, surrounding the rendered symbol.
fn quiet_zone_modules(dim: usize) -> usize {
    dim / 5
}

/// Expand a symbol's module matrix into a `side x side` grid of booleans
/// (`true` = dark), including the quiet zone, at `pixels_per_module` pixels
/// per module.
fn rasterize(symbol: &Symbol, pixels_per_module: u32) -> (usize, Vec<bool>) {
    let ppm = pixels_per_module as usize;
    let quiet_zone = quiet_zone_modules(symbol.dim);
    let modules_per_side = symbol.dim + 2 * quiet_zone;
    let side = modules_per_side * ppm;

    let mut pixels = vec![false; side * side];
    for row in 0..modules_per_side {
        for col in 0..modules_per_side {
            let dark = row >= quiet_zone
                && col >= quiet_zone
                && row < quiet_zone + symbol.dim
                && col < quiet_zone + symbol.dim
                && symbol.matrix.is_set(row - quiet_zone, col - quiet_zone);

            if !dark {
                continue;
            }
            for pr in 0..ppm {
                for pc in 0..ppm {
                    pixels[(row * ppm + pr) * side + (col * ppm + pc)] = true;
                }
            }
        }
    }

    (side, pixels)
}

/// Write `symbol` as a binary PPM (P6) image, black modules on white.
pub fn write_ppm<W: std::io::Write>(symbol: &Symbol, pixels_per_module: u32, mut w: W) -> Result<()> {
    let (side, pixels) = rasterize(symbol, pixels_per_module);

    write!(w, "P6\n{side} {side}\n255\n")?;
    let mut row_buf = Vec::with_capacity(side * 3);
    for row in 0..side {
        row_buf.clear();
        for col in 0..side {
            let v = if pixels[row * side + col] { 0u8 } else { 255u8 };
            row_buf.extend_from_slice(&[v, v, v]);
        }
        w.write_all(&row_buf)?;
    }
    Ok(())
}

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// A PNG writer that mirrors an ISOBMFF-style chunk writer: each chunk is a
/// 4-byte big-endian length, 4-byte type, payload, then a CRC-32 over
/// type+payload.
struct PngWriter {
    data: Vec<u8>,
}

impl PngWriter {
    fn new() -> Self {
        let mut data = Vec::new();
        data.extend_from_slice(&PNG_SIGNATURE);
        Self { data }
    }

    fn write_chunk(&mut self, typ: &[u8; 4], payload: &[u8]) {
        self.data.write_u32::<BigEndian>(payload.len() as u32).unwrap();

        let mut hasher = crc32fast::Hasher::new();
        hasher.update(typ);
        hasher.update(payload);
        let crc = hasher.finalize();

        self.data.extend_from_slice(typ);
        self.data.extend_from_slice(payload);
        self.data.write_u32::<BigEndian>(crc).unwrap();
    }

    fn finalize(self) -> Vec<u8> {
        self.data
    }
}

/// Wrap `raw` (zlib-uncompressed DEFLATE: stored blocks only) with the
/// 2-byte zlib header and trailing Adler-32 checksum.
fn zlib_wrap(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len() + 32);
    out.push(0x78); // CMF: 32K window, deflate
    out.push(0x01); // FLG: no preset dictionary, fastest level, checksum-valid

    // DEFLATE stored blocks, each up to 65535 bytes, final block marked BFINAL.
    let mut offset = 0;
    if raw.is_empty() {
        out.push(0x01); // BFINAL=1, BTYPE=00 (stored), empty block
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0xFFFFu16.to_le_bytes());
    }
    while offset < raw.len() {
        let remaining = raw.len() - offset;
        let chunk_len = remaining.min(0xFFFF);
        let is_final = offset + chunk_len == raw.len();
        out.push(is_final as u8);
        out.extend_from_slice(&(chunk_len as u16).to_le_bytes());
        out.extend_from_slice(&(!(chunk_len as u16)).to_le_bytes());
        out.extend_from_slice(&raw[offset..offset + chunk_len]);
        offset += chunk_len;
    }

    let adler = adler32(raw);
    out.extend_from_slice(&adler.to_be_bytes());
    out
}

fn adler32(data: &[u8]) -> u32 {
    const MOD_ADLER: u32 = 65521;
    let mut a = 1u32;
    let mut b = 0u32;
    for &byte in data {
        a = (a + byte as u32) % MOD_ADLER;
        b = (b + a) % MOD_ADLER;
    }
    (b << 16) | a
}

/// Write `symbol` as a PNG: 8-bit grayscale, no interlacing, a single IDAT
/// carrying an uncompressed (stored) zlib stream.
pub fn write_png<W: std::io::Write>(symbol: &Symbol, pixels_per_module: u32, mut w: W) -> Result<()> {
    let (side, pixels) = rasterize(symbol, pixels_per_module);

    let mut png = PngWriter::new();

    let mut ihdr = Vec::with_capacity(13);
    ihdr.write_u32::<BigEndian>(side as u32).unwrap();
    ihdr.write_u32::<BigEndian>(side as u32).unwrap();
    ihdr.push(8); // bit depth
    ihdr.push(0); // color type: grayscale
    ihdr.push(0); // compression method
    ihdr.push(0); // filter method
    ihdr.push(0); // interlace method
    png.write_chunk(b"IHDR", &ihdr);

    // Each scanline is prefixed with a filter-type byte (0 = none).
    let mut raw = Vec::with_capacity(side * (side + 1));
    for row in 0..side {
        raw.push(0);
        for col in 0..side {
            raw.push(if pixels[row * side + col] { 0 } else { 255 });
        }
    }

    let idat = zlib_wrap(&raw);
    png.write_chunk(b"IDAT", &idat);
    png.write_chunk(b"IEND", &[]);

    w.write_all(&png.finalize())?;
    Ok(())
}
