use crate::geometry::Direction;
use crate::types::{Coord, File, Rank};
use derive_more::{BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign, Not};
use std::fmt;
use std::iter::IntoIterator;

#[derive(
    Default,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    BitAnd,
    BitAndAssign,
    BitOr,
    BitOrAssign,
    BitXor,
    BitXorAssign,
    Not,
)]
pub struct Bitboard(u64);

impl Bitboard {
    pub const EMPTY: Bitboard = Bitboard(0);

    pub const fn from_raw(val: u64) -> Bitboard {
        Bitboard(val)
    }

    pub const fn from_coord(coord: Coord) -> Bitboard {
        Bitboard(1_u64 << coord.index())
    }

    pub const fn with(self, coord: Coord) -> Bitboard {
        Bitboard(self.0 | (1_u64 << coord.index()))
    }

    pub const fn with2(self, file: File, rank: Rank) -> Bitboard {
        self.with(Coord::from_parts(file, rank))
    }

    pub const fn without(self, coord: Coord) -> Bitboard {
        Bitboard(self.0 & !(1_u64 << coord.index()))
    }

    pub const fn shl(self, by: usize) -> Bitboard {
        Bitboard(self.0 << by)
    }

    pub const fn shr(self, by: usize) -> Bitboard {
        Bitboard(self.0 >> by)
    }

    pub fn deposit_bits(&self, mut x: u64) -> Bitboard {
        let mut res: u64 = 0;
        let mut msk = self.0;
        while msk != 0 {
            let bit = msk & msk.wrapping_neg();
            if (x & 1) != 0 {
                res |= bit;
            }
            msk ^= bit;
            x >>= 1;
        }
        Bitboard(res)
    }

    pub fn set(&mut self, coord: Coord) {
        *self = self.with(coord);
    }

    pub fn unset(&mut self, coord: Coord) {
        *self = self.without(coord);
    }

    pub const fn has(&self, coord: Coord) -> bool {
        ((self.0 >> coord.index()) & 1) != 0
    }

    pub const fn as_raw(&self) -> u64 {
        self.0
    }

    pub const fn len(&self) -> u32 {
        self.0.count_ones()
    }

    /// Lowest set square
    pub const fn first(&self) -> Option<Coord> {
        if self.0 == 0 {
            return None;
        }
        Some(unsafe { Coord::from_index_unchecked(self.0.trailing_zeros() as usize) })
    }

    /// Highest set square
    pub const fn last(&self) -> Option<Coord> {
        if self.0 == 0 {
            return None;
        }
        Some(unsafe { Coord::from_index_unchecked(63 - self.0.leading_zeros() as usize) })
    }

    /// Removes the lowest set square and returns it
    pub fn pop_first(&mut self) -> Option<Coord> {
        let res = self.first()?;
        self.0 &= self.0.wrapping_sub(1);
        Some(res)
    }

    /// Mirrors the bitboard vertically, so a1 becomes a8
    pub const fn flip_ranks(self) -> Bitboard {
        Bitboard(self.0.swap_bytes())
    }

    /// Rotates the bitboard by 180 degrees, so a1 becomes h8
    pub const fn rotate_180(self) -> Bitboard {
        Bitboard(self.0.reverse_bits())
    }

    /// Moves every square one step in the given direction, dropping the squares that leave the board
    pub const fn shift(self, dir: Direction) -> Bitboard {
        const NOT_FILE_A: u64 = !0x0101010101010101;
        const NOT_FILE_H: u64 = !0x8080808080808080;
        Bitboard(match dir {
            Direction::North => self.0 << 8,
            Direction::South => self.0 >> 8,
            Direction::East => (self.0 << 1) & NOT_FILE_A,
            Direction::West => (self.0 >> 1) & NOT_FILE_H,
            Direction::NorthEast => (self.0 << 9) & NOT_FILE_A,
            Direction::NorthWest => (self.0 << 7) & NOT_FILE_H,
            Direction::SouthEast => (self.0 >> 7) & NOT_FILE_A,
            Direction::SouthWest => (self.0 >> 9) & NOT_FILE_H,
        })
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub const fn is_nonempty(&self) -> bool {
        self.0 != 0
    }
}

impl From<Bitboard> for u64 {
    fn from(b: Bitboard) -> u64 {
        b.0
    }
}

impl From<u64> for Bitboard {
    fn from(u: u64) -> Bitboard {
        Bitboard(u)
    }
}

impl fmt::Debug for Bitboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "Bitboard({})", self)
    }
}

impl fmt::Display for Bitboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        for rank in (0..8).rev() {
            let row = ((self.0 >> (rank * 8)) & 0xff) as u8;
            write!(f, "{:08b}", row.reverse_bits())?;
            if rank != 0 {
                write!(f, "/")?;
            }
        }
        Ok(())
    }
}

pub struct Iter(u64);

impl Iterator for Iter {
    type Item = Coord;

    fn next(&mut self) -> Option<Coord> {
        if self.0 == 0 {
            return None;
        }
        let bit = self.0.trailing_zeros();
        self.0 &= self.0.wrapping_sub(1_u64);
        unsafe { Some(Coord::from_index_unchecked(bit as usize)) }
    }
}

impl IntoIterator for Bitboard {
    type Item = Coord;
    type IntoIter = Iter;

    fn into_iter(self) -> Iter {
        Iter(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iter() {
        let bb = Bitboard::EMPTY
            .with(Coord::from_parts(File::A, Rank::R4))
            .with(Coord::from_parts(File::E, Rank::R2))
            .with(Coord::from_parts(File::F, Rank::R3));
        assert_eq!(
            bb.into_iter().collect::<Vec<_>>(),
            vec![
                Coord::from_parts(File::E, Rank::R2),
                Coord::from_parts(File::F, Rank::R3),
                Coord::from_parts(File::A, Rank::R4),
            ],
        );
    }

    #[test]
    fn test_scan() {
        let mut bb = Bitboard::from_raw(0x8000_0000_0010_0002);
        assert_eq!(bb.first(), Some(Coord::from_index(1)));
        assert_eq!(bb.last(), Some(Coord::from_index(63)));
        assert_eq!(bb.pop_first(), Some(Coord::from_index(1)));
        assert_eq!(bb.pop_first(), Some(Coord::from_index(20)));
        assert_eq!(bb.len(), 1);
        assert_eq!(bb.pop_first(), Some(Coord::from_index(63)));
        assert_eq!(bb.pop_first(), None);
        assert_eq!(Bitboard::EMPTY.last(), None);
    }

    #[test]
    fn test_flip() {
        let a1 = Coord::from_parts(File::A, Rank::R1);
        let c2 = Coord::from_parts(File::C, Rank::R2);
        let bb = Bitboard::from_coord(a1).with(c2);
        assert_eq!(
            bb.flip_ranks(),
            Bitboard::from_coord(a1.flipped_rank()).with(c2.flipped_rank())
        );
        assert_eq!(
            bb.rotate_180(),
            Bitboard::from_coord(Coord::from_parts(File::H, Rank::R8))
                .with(Coord::from_parts(File::F, Rank::R7))
        );
    }

    #[test]
    fn test_shift() {
        let a4 = Coord::from_parts(File::A, Rank::R4);
        let h4 = Coord::from_parts(File::H, Rank::R4);
        let bb = Bitboard::from_coord(a4).with(h4);
        assert_eq!(
            bb.shift(Direction::East),
            Bitboard::from_coord(Coord::from_parts(File::B, Rank::R4))
        );
        assert_eq!(
            bb.shift(Direction::West),
            Bitboard::from_coord(Coord::from_parts(File::G, Rank::R4))
        );
        assert_eq!(
            bb.shift(Direction::NorthEast),
            Bitboard::from_coord(Coord::from_parts(File::B, Rank::R5))
        );
        assert_eq!(
            bb.shift(Direction::SouthWest),
            Bitboard::from_coord(Coord::from_parts(File::G, Rank::R3))
        );
        assert_eq!(bb.shift(Direction::North), bb.shl(8));
        let top = Bitboard::from_coord(Coord::from_parts(File::D, Rank::R8));
        assert_eq!(top.shift(Direction::North), Bitboard::EMPTY);
        assert_eq!(top.shift(Direction::NorthWest), Bitboard::EMPTY);
    }

    #[test]
    fn test_deposit() {
        let mask = Bitboard::from_raw(0b1011_0000);
        assert_eq!(mask.deposit_bits(0b101), Bitboard::from_raw(0b1001_0000));
        assert_eq!(mask.deposit_bits(0b111), mask);
    }

    #[test]
    fn test_bitops() {
        let ca = Coord::from_parts(File::A, Rank::R4);
        let cb = Coord::from_parts(File::E, Rank::R2);
        let cc = Coord::from_parts(File::F, Rank::R3);

        let bb1 = Bitboard::EMPTY.with(ca).with(cb);
        let bb2 = Bitboard::EMPTY.with(cb).with(cc);
        assert_eq!(bb1 & bb2, Bitboard::EMPTY.with(cb));
        assert_eq!(bb1 | bb2, Bitboard::EMPTY.with(ca).with(cb).with(cc));
        assert_eq!(bb1 ^ bb2, Bitboard::EMPTY.with(ca).with(cc));

        assert_eq!((!bb1).into_iter().count(), 62);
        assert_eq!((!bb1).len(), 62);
    }

    #[test]
    fn test_format() {
        let bb = Bitboard::EMPTY
            .with(Coord::from_parts(File::A, Rank::R4))
            .with(Coord::from_parts(File::E, Rank::R2))
            .with(Coord::from_parts(File::F, Rank::R3))
            .with(Coord::from_parts(File::H, Rank::R8));
        assert_eq!(
            bb.to_string(),
            "00000001/00000000/00000000/00000000/10000000/00000100/00001000/00000000"
        );
    }
}
