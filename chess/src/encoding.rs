//! External numberings of cells
//!
//! The board always stores [`Cell`]s. Other programs number pieces differently, so a board can be
//! converted into a [`Snapshot`] with cells encoded as plain bytes, and back.

use crate::board::RawBoard;
use crate::types::{CastlingRights, Cell, Color, Coord, Piece};

use std::fmt;
use std::marker::PhantomData;

use thiserror::Error;

/// Mapping between [`Cell`] and its numeric code
pub trait CellEncoding {
    /// Code of the empty cell
    const EMPTY: u8;

    fn encode(cell: Cell) -> u8;

    /// Returns `None` if `code` doesn't denote any cell
    fn decode(code: u8) -> Option<Cell>;
}

/// Numbering used by Polyglot opening books
///
/// Black pieces get even codes and white pieces get odd codes, in the order of pawn, knight,
/// bishop, rook, queen and king. So, black pawn is 0, white pawn is 1 and white king is 11.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Polyglot;

/// Numbering common among engines: white pieces are 0 to 5, black pieces are 6 to 11
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Engine;

impl CellEncoding for Polyglot {
    const EMPTY: u8 = 12;

    #[inline]
    fn encode(cell: Cell) -> u8 {
        match (cell.color(), cell.piece()) {
            (Some(c), Some(p)) => {
                (2 * p.index()) as u8
                    + match c {
                        Color::White => 1,
                        Color::Black => 0,
                    }
            }
            _ => Self::EMPTY,
        }
    }

    #[inline]
    fn decode(code: u8) -> Option<Cell> {
        match code {
            Self::EMPTY => Some(Cell::EMPTY),
            0..=11 => {
                let color = match code & 1 {
                    1 => Color::White,
                    _ => Color::Black,
                };
                Some(Cell::from_parts(color, Piece::from_index((code >> 1) as usize)))
            }
            _ => None,
        }
    }
}

impl CellEncoding for Engine {
    const EMPTY: u8 = 12;

    #[inline]
    fn encode(cell: Cell) -> u8 {
        match cell.is_empty() {
            true => Self::EMPTY,
            false => (cell.index() - 1) as u8,
        }
    }

    #[inline]
    fn decode(code: u8) -> Option<Cell> {
        match code {
            Self::EMPTY => Some(Cell::EMPTY),
            0..=11 => Some(Cell::from_index(code as usize + 1)),
            _ => None,
        }
    }
}

/// Error converting [`Snapshot`] into [`RawBoard`]
#[derive(Debug, Clone, Error, Eq, PartialEq)]
#[error("bad cell code {code} at {coord}")]
pub struct DecodeError {
    pub coord: Coord,
    pub code: u8,
}

/// Unvalidated board with the cells encoded by `E`
///
/// Apart from the cells, the fields have the same meaning as in [`RawBoard`].
pub struct Snapshot<E> {
    pub cells: [u8; 64],
    pub side: Color,
    pub castling: CastlingRights,
    pub ep_square: Option<Coord>,
    pub move_counter: u16,
    pub move_number: u16,
    _encoding: PhantomData<E>,
}

impl<E: CellEncoding> Snapshot<E> {
    #[inline]
    pub fn get(&self, c: Coord) -> u8 {
        self.cells[c.index()]
    }

    /// Re-encodes the cells with encoding `F`
    pub fn convert<F: CellEncoding>(&self) -> Result<Snapshot<F>, DecodeError> {
        Ok(Snapshot::from(RawBoard::try_from(self)?))
    }
}

impl<E: CellEncoding> From<RawBoard> for Snapshot<E> {
    fn from(raw: RawBoard) -> Self {
        Self::from(&raw)
    }
}

impl<E: CellEncoding> From<&RawBoard> for Snapshot<E> {
    fn from(raw: &RawBoard) -> Self {
        let mut cells = [E::EMPTY; 64];
        for (dst, src) in cells.iter_mut().zip(raw.cells.iter()) {
            *dst = E::encode(*src);
        }
        Snapshot {
            cells,
            side: raw.side,
            castling: raw.castling,
            ep_square: raw.ep_square,
            move_counter: raw.move_counter,
            move_number: raw.move_number,
            _encoding: PhantomData,
        }
    }
}

impl<E: CellEncoding> TryFrom<&Snapshot<E>> for RawBoard {
    type Error = DecodeError;

    fn try_from(s: &Snapshot<E>) -> Result<Self, Self::Error> {
        let mut res = RawBoard::empty();
        for coord in Coord::iter() {
            let code = s.get(coord);
            let cell = E::decode(code).ok_or(DecodeError { coord, code })?;
            res.put(coord, cell);
        }
        res.side = s.side;
        res.castling = s.castling;
        res.ep_square = s.ep_square;
        res.move_counter = s.move_counter;
        res.move_number = s.move_number;
        Ok(res)
    }
}

impl<E: CellEncoding> TryFrom<Snapshot<E>> for RawBoard {
    type Error = DecodeError;

    fn try_from(s: Snapshot<E>) -> Result<Self, Self::Error> {
        RawBoard::try_from(&s)
    }
}

// Manual impls, as derives would require `E` to implement the traits as well

impl<E> Clone for Snapshot<E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for Snapshot<E> {}

impl<E> PartialEq for Snapshot<E> {
    fn eq(&self, other: &Self) -> bool {
        self.cells == other.cells
            && self.side == other.side
            && self.castling == other.castling
            && self.ep_square == other.ep_square
            && self.move_counter == other.move_counter
            && self.move_number == other.move_number
    }
}

impl<E> Eq for Snapshot<E> {}

impl<E> fmt::Debug for Snapshot<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot")
            .field("cells", &self.cells)
            .field("side", &self.side)
            .field("castling", &self.castling)
            .field("ep_square", &self.ep_square)
            .field("move_counter", &self.move_counter)
            .field("move_number", &self.move_number)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::position::Position;
    use crate::types::{File, Rank};

    #[test]
    fn test_codes() {
        let wp = Cell::from_parts(Color::White, Piece::Pawn);
        let bp = Cell::from_parts(Color::Black, Piece::Pawn);
        let wk = Cell::from_parts(Color::White, Piece::King);
        let bq = Cell::from_parts(Color::Black, Piece::Queen);

        assert_eq!(Polyglot::encode(bp), 0);
        assert_eq!(Polyglot::encode(wp), 1);
        assert_eq!(Polyglot::encode(bq), 8);
        assert_eq!(Polyglot::encode(wk), 11);
        assert_eq!(Polyglot::encode(Cell::EMPTY), 12);

        assert_eq!(Engine::encode(wp), 0);
        assert_eq!(Engine::encode(wk), 5);
        assert_eq!(Engine::encode(bp), 6);
        assert_eq!(Engine::encode(bq), 10);
        assert_eq!(Engine::encode(Cell::EMPTY), 12);

        for cell in Cell::iter() {
            assert_eq!(Polyglot::decode(Polyglot::encode(cell)), Some(cell));
            assert_eq!(Engine::decode(Engine::encode(cell)), Some(cell));
        }
        assert_eq!(Polyglot::decode(13), None);
        assert_eq!(Engine::decode(255), None);
    }

    #[test]
    fn test_snapshot() {
        let p = Position::from_fen(
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        )
        .unwrap();
        let poly: Snapshot<Polyglot> = p.state().into();
        let engine: Snapshot<Engine> = poly.convert().unwrap();

        let e1 = Coord::from_parts(File::E, Rank::R1);
        let e7 = Coord::from_parts(File::E, Rank::R7);
        assert_eq!(poly.get(e1), 11);
        assert_eq!(engine.get(e1), 5);
        assert_eq!(poly.get(e7), 8);
        assert_eq!(engine.get(e7), 10);

        let a = Position::from_state(RawBoard::try_from(poly).unwrap()).unwrap();
        let b = Position::from_state(RawBoard::try_from(engine).unwrap()).unwrap();
        assert_eq!(a.board(), p.board());
        assert_eq!(b.board(), p.board());
        assert_eq!(a.hash(), b.hash());
        assert_eq!(engine.convert::<Polyglot>().unwrap(), poly);
    }

    #[test]
    fn test_bad_code() {
        let mut s: Snapshot<Engine> = Board::initial().raw().into();
        let d4 = Coord::from_parts(File::D, Rank::R4);
        s.cells[d4.index()] = 42;
        assert_eq!(
            RawBoard::try_from(s),
            Err(DecodeError { coord: d4, code: 42 })
        );
    }
}
