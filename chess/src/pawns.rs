use crate::bitboard::Bitboard;
use crate::geometry;
use crate::types::Color;

#[inline]
pub fn advance_forward(c: Color, b: Bitboard) -> Bitboard {
    b.shift(geometry::pawn_forward(c))
}

#[inline]
pub fn advance_left(c: Color, b: Bitboard) -> Bitboard {
    b.shift(geometry::pawn_left(c))
}

#[inline]
pub fn advance_right(c: Color, b: Bitboard) -> Bitboard {
    b.shift(geometry::pawn_right(c))
}
