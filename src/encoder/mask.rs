//! Data-mask selection: the eight mask predicates, the four penalty rules
//! (N1-N4), and the apply/score/revert loop that picks the mask minimizing
//! total penalty.

use crate::bitmatrix::BitMatrix;

use super::format;
use super::EccLevel;

/// The eight mask predicates. `true` means "flip this module".
fn predicate(mask_id: u8, row: usize, col: usize) -> bool {
    match mask_id {
        0 => (row + col) % 2 == 0,
        1 => row % 2 == 0,
        2 => col % 3 == 0,
        3 => (row + col) % 3 == 0,
        4 => (row / 2 + col / 3) % 2 == 0,
        5 => (row * col) % 2 + (row * col) % 3 == 0,
        6 => ((row * col) % 2 + (row * col) % 3) % 2 == 0,
        7 => ((row + col) % 2 + (row * col) % 3) % 2 == 0,
        _ => unreachable!("mask id out of range"),
    }
}

/// Flip every non-reserved module for which `predicate` holds.
fn apply(matrix: &mut BitMatrix, reserved: &BitMatrix, dim: usize, mask_id: u8) {
    for row in 0..dim {
        for col in 0..dim {
            if !reserved.is_set(row, col) && predicate(mask_id, row, col) {
                matrix.toggle(row, col);
            }
        }
    }
}

/// N1: runs of 5 or more same-colored modules in a single row or column,
/// `3 + (run_length - 5)` each.
fn penalty_n1(matrix: &BitMatrix, dim: usize) -> u32 {
    let mut total = 0u32;

    let mut score_line = |get: &dyn Fn(usize) -> bool| {
        let mut run = 1usize;
        let mut prev = get(0);
        for i in 1..dim {
            let cur = get(i);
            if cur == prev {
                run += 1;
            } else {
                if run >= 5 {
                    total += 3 + (run - 5) as u32;
                }
                run = 1;
                prev = cur;
            }
        }
        if run >= 5 {
            total += 3 + (run - 5) as u32;
        }
    };

    for row in 0..dim {
        score_line(&|col| matrix.is_set(row, col));
    }
    for col in 0..dim {
        score_line(&|row| matrix.is_set(row, col));
    }

    total
}

/// N2: each 2x2 block of uniform color scores 3, counted with overlap (every
/// top-left corner in `0..dim-1` x `0..dim-1` is its own block).
fn penalty_n2(matrix: &BitMatrix, dim: usize) -> u32 {
    let mut total = 0u32;
    for row in 0..dim - 1 {
        for col in 0..dim - 1 {
            let c = matrix.is_set(row, col);
            if matrix.is_set(row, col + 1) == c
                && matrix.is_set(row + 1, col) == c
                && matrix.is_set(row + 1, col + 1) == c
            {
                total += 3;
            }
        }
    }
    total
}

/// N3: the finder-like 1:1:3:1:1 light:dark:light ratio pattern, preceded or
/// followed by four modules of light, scored 40 per occurrence. Checked at
/// every integer scale `r` for which the full padded pattern still fits the
/// symbol, since a symbol can carry scaled-up look-alikes of the finder
/// silhouette as readily as the unit-scale one.
fn penalty_n3(matrix: &BitMatrix, dim: usize) -> u32 {
    let mut total = 0u32;

    // dark=true, light=false
    let core_units = [true, false, true, true, true, false, true];

    let mut r = 1usize;
    while 11 * r <= dim {
        let mut core = Vec::with_capacity(7 * r);
        for &u in &core_units {
            core.extend(std::iter::repeat(u).take(r));
        }
        let light_pad: Vec<bool> = std::iter::repeat(false).take(4 * r).collect();

        let mut leading = light_pad.clone();
        leading.extend(core.iter().copied());
        let mut trailing = core.clone();
        trailing.extend(light_pad.iter().copied());

        let patterns = [leading, trailing];
        let plen = 11 * r;

        let mut scan_line = |get: &dyn Fn(usize) -> bool| {
            let line: Vec<bool> = (0..dim).map(|i| get(i)).collect();
            if line.len() < plen {
                return;
            }
            for start in 0..=line.len() - plen {
                for pattern in &patterns {
                    if line[start..start + plen] == pattern[..] {
                        total += 40;
                    }
                }
            }
        };

        for row in 0..dim {
            scan_line(&|col| matrix.is_set(row, col));
        }
        for col in 0..dim {
            scan_line(&|row| matrix.is_set(row, col));
        }

        r += 1;
    }

    total
}

/// N4: `10 * |p - 50| / 5` where `p` is the truncated percentage of dark
/// modules.
fn penalty_n4(matrix: &BitMatrix, dim: usize) -> u32 {
    let total = dim * dim;
    let dark = matrix.count_set();
    let percent = (dark * 100 / total) as i64;
    let dev = (percent - 50).unsigned_abs() as u32;
    10 * dev / 5
}

fn total_penalty(matrix: &BitMatrix, dim: usize) -> u32 {
    penalty_n1(matrix, dim) + penalty_n2(matrix, dim) + penalty_n3(matrix, dim) + penalty_n4(matrix, dim)
}

/// Try all 8 masks, keep the one with lowest total penalty (ties favor the
/// smaller id), apply it permanently, and write the final format information.
pub fn select_and_apply_mask(matrix: &mut BitMatrix, reserved: &BitMatrix, dim: usize, level: EccLevel) {
    let mut best_id = 0u8;
    let mut best_penalty = u32::MAX;

    for mask_id in 0..8u8 {
        apply(matrix, reserved, dim, mask_id);
        // The format-info cells sit inside the scored area, so each trial's
        // penalty must reflect that trial's own format bits, not whatever
        // the previous trial (or the dummy reservation pass) left behind.
        format::place(matrix, &mut reserved.clone(), dim, level, mask_id);
        let penalty = total_penalty(matrix, dim);
        apply(matrix, reserved, dim, mask_id); // revert

        if penalty < best_penalty {
            best_penalty = penalty;
            best_id = mask_id;
        }
    }

    apply(matrix, reserved, dim, best_id);
    format::place(matrix, &mut reserved.clone(), dim, level, best_id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmatrix::BitMatrix;

    #[test]
    fn predicate_is_deterministic_and_covers_all_eight() {
        for id in 0..8u8 {
            let _ = predicate(id, 3, 5);
        }
    }

    #[test]
    fn all_dark_matrix_has_n1_and_n2_penalties() {
        let dim = 21;
        let mut m = BitMatrix::new(dim);
        for r in 0..dim {
            for c in 0..dim {
                m.set(r, c);
            }
        }
        assert!(penalty_n1(&m, dim) > 0);
        assert!(penalty_n2(&m, dim) > 0);
    }

    #[test]
    fn balanced_checkerboard_has_zero_n4_penalty() {
        let dim = 20; // even, so exactly 50% dark
        let mut m = BitMatrix::new(dim);
        for r in 0..dim {
            for c in 0..dim {
                if (r + c) % 2 == 0 {
                    m.set(r, c);
                }
            }
        }
        assert_eq!(penalty_n4(&m, dim), 0);
    }

    #[test]
    fn n4_scales_with_deviation_from_fifty_percent() {
        // 10x10 grid: filling 40/60/50 whole rows gives exact 40/60/50 percent dark.
        let dim = 10;
        for (dark_rows, expected) in [(4usize, 20u32), (6, 20), (5, 0)] {
            let mut m = BitMatrix::new(dim);
            for r in 0..dark_rows {
                for c in 0..dim {
                    m.set(r, c);
                }
            }
            assert_eq!(penalty_n4(&m, dim), expected, "dark_rows={dark_rows}");
        }
    }

    #[test]
    fn n1_penalty_steps_at_run_length_five() {
        for (run, expected) in [(4usize, 0u32), (5, 3), (6, 4)] {
            // Row 0: a dark run of exactly `run`, then a 4-cell light run,
            // then a single dark cell, so no segment other than the one
            // under test ever reaches length 5. Checkerboard everywhere else
            // so no other row or column forms a run longer than 2.
            let dim = run + 5;
            let mut m = BitMatrix::new(dim);
            for r in 1..dim {
                for c in 0..dim {
                    if (r + c) % 2 == 0 {
                        m.set(r, c);
                    }
                }
            }
            for c in 0..run {
                m.set(0, c);
            }
            m.set(0, run + 4);
            assert_eq!(penalty_n1(&m, dim), expected, "run={run}");
        }
    }

    #[test]
    fn n3_scores_an_isolated_finder_like_row() {
        let dim = 21;
        let mut m = BitMatrix::new(dim);
        // dark,light,dark,dark,dark,light,dark then 4 light modules trailing,
        // starting at column 0: exactly one r=1 occurrence of the pattern.
        let core = [true, false, true, true, true, false, true];
        for (i, &dark) in core.iter().enumerate() {
            m.set_to(0, i, dark);
        }
        // columns 7..11 already light (matrix starts all-clear): satisfies the
        // trailing 4-light-module requirement.
        assert_eq!(penalty_n3(&m, dim), 40);
    }

    #[test]
    fn select_and_apply_mask_completes_and_writes_format_info() {
        let version = 1;
        let dim = 21;
        let mut matrix = BitMatrix::new(dim);
        let mut reserved = BitMatrix::new(dim);
        super::super::layout::draw_functional_patterns(&mut matrix, &mut reserved, version, dim);

        // Recompute the winning mask id the same way select_and_apply_mask
        // does, so the test can check the format bits it should have written.
        let mut best_id = 0u8;
        let mut best_penalty = u32::MAX;
        for mask_id in 0..8u8 {
            apply(&mut matrix, &reserved, dim, mask_id);
            format::place(&mut matrix, &mut reserved.clone(), dim, EccLevel::L, mask_id);
            let penalty = total_penalty(&matrix, dim);
            apply(&mut matrix, &reserved, dim, mask_id);
            if penalty < best_penalty {
                best_penalty = penalty;
                best_id = mask_id;
            }
        }

        select_and_apply_mask(&mut matrix, &reserved, dim, EccLevel::L);

        let expected = format::compute(EccLevel::L, best_id);
        assert_eq!(matrix.is_set(8, 7), (expected >> 8) & 1 != 0);
        assert_eq!(matrix.dim(), dim);
    }
}
