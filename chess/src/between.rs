use crate::bitboard::Bitboard;
use crate::types::Coord;

#[inline]
const fn bb(val: u64) -> Bitboard {
    Bitboard::from_raw(val)
}

include!(concat!(env!("OUT_DIR"), "/between.rs"));

/// Squares strictly between `src` and `dst`
///
/// Empty if the squares don't lie on a common rank, file or diagonal, or if they are adjacent.
#[inline]
pub fn strict(src: Coord, dst: Coord) -> Bitboard {
    unsafe { *BETWEEN.get_unchecked(src.index()).get_unchecked(dst.index()) }
}
