//! Precomputed attack lookups
//!
//! All the tables are generated by the build script, so there is no runtime initialization.

use crate::bitboard::Bitboard;
use crate::geometry::{self, Direction};
use crate::types::{Color, Coord};

#[inline]
const fn bb(val: u64) -> Bitboard {
    Bitboard::from_raw(val)
}

include!(concat!(env!("OUT_DIR"), "/near_attacks.rs"));

struct MagicEntry {
    mask: Bitboard,
    post_mask: Bitboard,
    magic: u64,
    shift: u32,
    offset: usize,
}

#[cfg_attr(all(target_arch = "x86_64", target_feature = "bmi2"), allow(dead_code))]
mod magic {
    use super::*;

    include!(concat!(env!("OUT_DIR"), "/magic.rs"));

    #[inline]
    fn lookup(entry: &MagicEntry, table: &[Bitboard], occupied: Bitboard) -> Bitboard {
        let idx = (occupied & entry.mask).as_raw().wrapping_mul(entry.magic) >> entry.shift;
        unsafe { *table.get_unchecked(entry.offset + idx as usize) & entry.post_mask }
    }

    #[inline]
    pub fn rook(coord: Coord, occupied: Bitboard) -> Bitboard {
        let entry = unsafe { MAGIC_ROOK.get_unchecked(coord.index()) };
        lookup(entry, &MAGIC_LOOKUP_ROOK, occupied)
    }

    #[inline]
    pub fn bishop(coord: Coord, occupied: Bitboard) -> Bitboard {
        let entry = unsafe { MAGIC_BISHOP.get_unchecked(coord.index()) };
        lookup(entry, &MAGIC_LOOKUP_BISHOP, occupied)
    }
}

#[cfg(all(target_arch = "x86_64", target_feature = "bmi2"))]
mod pext {
    use super::*;
    use std::arch::x86_64::_pext_u64;

    struct PextEntry {
        mask: Bitboard,
        offset: usize,
    }

    include!(concat!(env!("OUT_DIR"), "/pext.rs"));

    #[inline]
    fn lookup(entry: &PextEntry, table: &[Bitboard], occupied: Bitboard) -> Bitboard {
        unsafe {
            let idx = _pext_u64(occupied.as_raw(), entry.mask.as_raw());
            *table.get_unchecked(entry.offset + idx as usize)
        }
    }

    #[inline]
    pub fn rook(coord: Coord, occupied: Bitboard) -> Bitboard {
        let entry = unsafe { PEXT_ROOK.get_unchecked(coord.index()) };
        lookup(entry, &PEXT_LOOKUP_ROOK, occupied)
    }

    #[inline]
    pub fn bishop(coord: Coord, occupied: Bitboard) -> Bitboard {
        let entry = unsafe { PEXT_BISHOP.get_unchecked(coord.index()) };
        lookup(entry, &PEXT_LOOKUP_BISHOP, occupied)
    }
}

#[cfg(all(target_arch = "x86_64", target_feature = "bmi2"))]
use pext as sliders;

#[cfg(not(all(target_arch = "x86_64", target_feature = "bmi2")))]
use magic as sliders;

#[inline]
pub fn king(coord: Coord) -> Bitboard {
    unsafe { *KING_ATTACKS.get_unchecked(coord.index()) }
}

#[inline]
pub fn knight(coord: Coord) -> Bitboard {
    unsafe { *KNIGHT_ATTACKS.get_unchecked(coord.index()) }
}

/// Squares attacked by a pawn of color `color` standing on `coord`
#[inline]
pub fn pawn(color: Color, coord: Coord) -> Bitboard {
    match color {
        Color::White => unsafe { *WHITE_PAWN_ATTACKS.get_unchecked(coord.index()) },
        Color::Black => unsafe { *BLACK_PAWN_ATTACKS.get_unchecked(coord.index()) },
    }
}

#[inline]
pub fn rook(coord: Coord, occupied: Bitboard) -> Bitboard {
    sliders::rook(coord, occupied)
}

#[inline]
pub fn bishop(coord: Coord, occupied: Bitboard) -> Bitboard {
    sliders::bishop(coord, occupied)
}

#[inline]
pub fn queen(coord: Coord, occupied: Bitboard) -> Bitboard {
    rook(coord, occupied) | bishop(coord, occupied)
}

/// Union of the squares attacked by all the pawns of color `color` in `pawns`
#[inline]
pub fn pawns(color: Color, pawns: Bitboard) -> Bitboard {
    pawns.shift(geometry::pawn_left(color)) | pawns.shift(geometry::pawn_right(color))
}

/// Union of the squares attacked by all the knights in `knights`
#[inline]
pub fn knights(knights: Bitboard) -> Bitboard {
    let l1 = knights.shift(Direction::West);
    let l2 = l1.shift(Direction::West);
    let r1 = knights.shift(Direction::East);
    let r2 = r1.shift(Direction::East);
    let h1 = l1 | r1;
    let h2 = l2 | r2;
    h1.shl(16) | h1.shr(16) | h2.shl(8) | h2.shr(8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{File, Rank};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn slow_slider(coord: Coord, occupied: Bitboard, dirs: &[Direction]) -> Bitboard {
        let mut res = Bitboard::EMPTY;
        for dir in dirs {
            let mut p = coord;
            while let Some(new_p) = p.shift(dir.file_step(), dir.rank_step()) {
                res.set(new_p);
                if occupied.has(new_p) {
                    break;
                }
                p = new_p;
            }
        }
        res
    }

    const ROOK_DIRS: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];

    const BISHOP_DIRS: [Direction; 4] = [
        Direction::NorthEast,
        Direction::NorthWest,
        Direction::SouthEast,
        Direction::SouthWest,
    ];

    #[test]
    fn test_near() {
        let e4 = Coord::from_parts(File::E, Rank::R4);
        assert_eq!(king(e4).len(), 8);
        assert_eq!(knight(e4).len(), 8);
        assert_eq!(king(Coord::from_index(0)).len(), 3);
        assert_eq!(knight(Coord::from_index(0)).len(), 2);
        assert_eq!(
            pawn(Color::White, e4),
            Bitboard::EMPTY
                .with2(File::D, Rank::R5)
                .with2(File::F, Rank::R5)
        );
        assert_eq!(
            pawn(Color::Black, e4),
            Bitboard::EMPTY
                .with2(File::D, Rank::R3)
                .with2(File::F, Rank::R3)
        );
        assert_eq!(
            pawn(Color::White, Coord::from_parts(File::A, Rank::R2)),
            Bitboard::EMPTY.with2(File::B, Rank::R3)
        );
    }

    #[test]
    fn test_batched() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            let set = Bitboard::from_raw(rng.gen::<u64>() & rng.gen::<u64>());
            let mut expected_knights = Bitboard::EMPTY;
            let mut expected_white = Bitboard::EMPTY;
            let mut expected_black = Bitboard::EMPTY;
            for c in set {
                expected_knights |= knight(c);
                expected_white |= pawn(Color::White, c);
                expected_black |= pawn(Color::Black, c);
            }
            assert_eq!(knights(set), expected_knights);
            assert_eq!(pawns(Color::White, set), expected_white);
            assert_eq!(pawns(Color::Black, set), expected_black);
        }
    }

    #[test]
    fn test_sliders() {
        let mut rng = StdRng::seed_from_u64(1234);
        for c in Coord::iter() {
            for _ in 0..100 {
                let occupied = Bitboard::from_raw(rng.gen::<u64>() & rng.gen::<u64>());
                assert_eq!(rook(c, occupied), slow_slider(c, occupied, &ROOK_DIRS));
                assert_eq!(bishop(c, occupied), slow_slider(c, occupied, &BISHOP_DIRS));
                assert_eq!(
                    queen(c, occupied),
                    rook(c, occupied) | bishop(c, occupied)
                );
            }
            assert_eq!(rook(c, Bitboard::EMPTY).len(), 14);
        }
    }

    #[test]
    fn test_magic_fallback() {
        // The magic path is always compiled, check it even when PEXT is used.
        let mut rng = StdRng::seed_from_u64(99);
        for c in Coord::iter() {
            let occupied = Bitboard::from_raw(rng.gen::<u64>());
            assert_eq!(magic::rook(c, occupied), slow_slider(c, occupied, &ROOK_DIRS));
            assert_eq!(
                magic::bishop(c, occupied),
                slow_slider(c, occupied, &BISHOP_DIRS)
            );
        }
    }

    #[test]
    fn test_blocked() {
        let d4 = Coord::from_parts(File::D, Rank::R4);
        let occupied = Bitboard::EMPTY
            .with2(File::D, Rank::R6)
            .with2(File::F, Rank::R4)
            .with2(File::B, Rank::R2)
            .with2(File::F, Rank::R6);
        assert_eq!(
            rook(d4, occupied),
            Bitboard::EMPTY
                .with2(File::D, Rank::R5)
                .with2(File::D, Rank::R6)
                .with2(File::E, Rank::R4)
                .with2(File::F, Rank::R4)
                .with2(File::D, Rank::R3)
                .with2(File::D, Rank::R2)
                .with2(File::D, Rank::R1)
                .with2(File::C, Rank::R4)
                .with2(File::B, Rank::R4)
                .with2(File::A, Rank::R4)
        );
        assert_eq!(bishop(d4, occupied).len(), 2 + 3 + 3 + 2);
    }
}
