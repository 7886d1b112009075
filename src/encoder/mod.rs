//! The symbol encoder: version selection, data bitstream assembly, block
//! splitting and Reed-Solomon interleaving, functional-pattern and data
//! placement, mask selection, and format/version metadata — the end-to-end
//! pipeline from `(payload, level)` to a finished module matrix.

mod format;
mod layout;
mod mask;

use crate::bitmatrix::BitMatrix;
use crate::bitstream::BitWriter;
use crate::error::{Error, Result};
use crate::gf256;
use crate::tables;

/// Error-correction level, in the order the standard assigns format bits:
/// L=01, M=00, Q=11, H=10.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EccLevel {
    L,
    M,
    Q,
    H,
}

impl EccLevel {
    /// Index into the `[level][version]` tables.
    pub(crate) fn index(self) -> usize {
        match self {
            EccLevel::L => 0,
            EccLevel::M => 1,
            EccLevel::Q => 2,
            EccLevel::H => 3,
        }
    }

    /// The 2-bit code used in format information.
    pub(crate) fn format_bits(self) -> u32 {
        match self {
            EccLevel::L => 0b01,
            EccLevel::M => 0b00,
            EccLevel::Q => 0b11,
            EccLevel::H => 0b10,
        }
    }
}

/// A finished QR symbol: its module matrix and side length.
pub struct Symbol {
    pub matrix: BitMatrix,
    pub dim: usize,
}

/// Encode `payload` at the given error-correction level into a complete,
/// masked QR symbol.
pub fn encode(payload: &[u8], level: EccLevel) -> Result<Symbol> {
    if payload.is_empty() {
        return Err(Error::EmptyPayload);
    }

    let version = select_version(level, payload.len())?;
    let dim = 4 * version + 17;

    let data_bytes = assemble_data_bitstream(payload, level, version);
    let codewords = split_and_interleave(&data_bytes, level, version)?;

    let mut matrix = BitMatrix::new(dim);
    let mut reserved = BitMatrix::new(dim);

    layout::draw_functional_patterns(&mut matrix, &mut reserved, version, dim);
    layout::place_data(&mut matrix, &reserved, dim, &codewords);

    mask::select_and_apply_mask(&mut matrix, &reserved, dim, level);

    Ok(Symbol { matrix, dim })
}

fn select_version(level: EccLevel, payload_len: usize) -> Result<usize> {
    for version in 1..=40usize {
        if tables::capacity(level, version) as usize >= payload_len {
            return Ok(version);
        }
    }
    Err(Error::PayloadTooLarge { level, len: payload_len })
}

/// Build the mode indicator + length + payload + terminator + padding
/// bitstream, exactly `TOTAL_DATA_CODEWORDS[level][version]` bytes long.
fn assemble_data_bitstream(payload: &[u8], level: EccLevel, version: usize) -> Vec<u8> {
    let total_data_bits = tables::total_data_codewords(level, version) as usize * 8;
    let mut w = BitWriter::with_capacity(total_data_bits / 8);

    w.append(0b0100, 4); // byte mode
    let count_bits = if version <= 9 { 8 } else { 16 };
    w.append(payload.len() as u32, count_bits);
    for &byte in payload {
        w.append(byte as u32, 8);
    }

    let terminator_bits = (total_data_bits - w.n_bits()).min(4);
    w.append(0, terminator_bits);

    let pad_to_byte = (8 - w.n_bits() % 8) % 8;
    w.append(0, pad_to_byte);

    let mut pad_byte = 0xECu32;
    while w.n_bits() < total_data_bits {
        w.append(pad_byte, 8);
        pad_byte ^= 0xEC ^ 0x11;
    }

    w.into_bytes()
}

/// Split `data` into its Reed-Solomon blocks, compute correction codewords
/// for each, and interleave data and correction codewords column-major by
/// block into the final codeword stream.
fn split_and_interleave(data: &[u8], level: EccLevel, version: usize) -> Result<Vec<u8>> {
    let n = tables::total_blocks(level, version) as usize;
    let e = tables::corr_codewords_per_block(level, version) as usize;
    let total_all = tables::total_available_modules(version) as usize / 8;
    let total_data = tables::total_data_codewords(level, version) as usize;

    if data.len() != total_data {
        return Err(Error::InvariantViolated(format!(
            "assembled data bitstream has {} bytes, expected {total_data}",
            data.len()
        )));
    }

    let long_count = total_all % n;
    let short_count = n - long_count;
    let short_len = total_all / n - e;
    let long_len = short_len + 1;

    let gen = gf256::generator_poly(e);
    let mut out = vec![0u8; total_all];

    let mut block_start = 0usize;
    for i in 0..n {
        let block_len = if i < short_count { short_len } else { long_len };
        let corr = gf256::correction_codewords(&gen, data, block_start, block_len, e);

        for j in 0..block_len {
            let out_idx = if j == short_len {
                i + j * n - short_count
            } else {
                i + j * n
            };
            out[out_idx] = data[block_start + j];
        }
        for j in 0..e {
            out[total_data + i + j * n] = corr[j];
        }

        block_start += block_len;
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_selection_picks_smallest_fit() {
        assert_eq!(select_version(EccLevel::L, 5).unwrap(), 1);
        assert_eq!(select_version(EccLevel::L, 17).unwrap(), 1);
        assert_eq!(select_version(EccLevel::L, 18).unwrap(), 2);
        assert_eq!(select_version(EccLevel::L, 2953).unwrap(), 40);
    }

    #[test]
    fn version_selection_fails_past_capacity() {
        assert!(matches!(
            select_version(EccLevel::L, 2954),
            Err(Error::PayloadTooLarge { .. })
        ));
    }

    #[test]
    fn empty_payload_is_rejected() {
        assert!(matches!(encode(&[], EccLevel::L), Err(Error::EmptyPayload)));
    }

    #[test]
    fn data_bitstream_has_exact_codeword_length() {
        let bytes = assemble_data_bitstream(b"HELLO", EccLevel::L, 1);
        assert_eq!(bytes.len(), tables::total_data_codewords(EccLevel::L, 1) as usize);
    }

    #[test]
    fn data_bitstream_exact_capacity_has_no_padding_past_terminator() {
        // 17 bytes exactly fills version 1-L's 17-byte capacity: mode(4) + count(8) +
        // 17*8 payload bits = 148 bits, with 4 data codewords * 8 = 152 total bits
        // leaving exactly 4 bits for the terminator and nothing else.
        let payload = [b'A'; 17];
        let bytes = assemble_data_bitstream(&payload, EccLevel::L, 1);
        assert_eq!(bytes.len(), tables::total_data_codewords(EccLevel::L, 1) as usize);
    }

    #[test]
    fn split_and_interleave_uses_every_codeword_once_v40() {
        let payload = vec![b'A'; 2953];
        let version = select_version(EccLevel::L, payload.len()).unwrap();
        assert_eq!(version, 40);
        assert_eq!(tables::total_blocks(EccLevel::L, 40), 25);
        assert_eq!(tables::corr_codewords_per_block(EccLevel::L, 40), 30);

        let data = assemble_data_bitstream(&payload, EccLevel::L, version);
        let out = split_and_interleave(&data, EccLevel::L, version).unwrap();
        assert_eq!(out.len(), tables::total_available_modules(version) as usize / 8);
    }

    #[test]
    fn hello_version1_smoke() {
        let symbol = encode(b"HELLO", EccLevel::L).unwrap();
        assert_eq!(symbol.dim, 21);
    }
}
