use super::uci;
use crate::bitboard::Bitboard;
use crate::board::Board;
use crate::types::{CastlingSide, Cell, Color, Coord, Piece};
use crate::{attack, castling, generic, geometry, movegen, zobrist};

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Move kind
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MoveKind {
    /// Any move which is not listed below, including the null move
    Normal = 0,
    /// Pawn promotion (either non-capture or capture)
    Promotion = 1,
    /// En passant capture
    Enpassant = 2,
    /// Castling, encoded as the king capturing its own rook
    Castling = 3,
}

/// Target piece for promotion
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PromotePiece {
    Knight = 0,
    Bishop = 1,
    Rook = 2,
    Queen = 3,
}

impl PromotePiece {
    pub const ALL: [PromotePiece; 4] = [
        PromotePiece::Knight,
        PromotePiece::Bishop,
        PromotePiece::Rook,
        PromotePiece::Queen,
    ];
}

impl From<PromotePiece> for Piece {
    #[inline]
    fn from(p: PromotePiece) -> Self {
        match p {
            PromotePiece::Knight => Piece::Knight,
            PromotePiece::Bishop => Piece::Bishop,
            PromotePiece::Rook => Piece::Rook,
            PromotePiece::Queen => Piece::Queen,
        }
    }
}

impl TryFrom<Piece> for PromotePiece {
    type Error = ();

    #[inline]
    fn try_from(p: Piece) -> Result<Self, Self::Error> {
        match p {
            Piece::Knight => Ok(PromotePiece::Knight),
            Piece::Bishop => Ok(PromotePiece::Bishop),
            Piece::Rook => Ok(PromotePiece::Rook),
            Piece::Queen => Ok(PromotePiece::Queen),
            _ => Err(()),
        }
    }
}

/// Chess move packed into 16 bits
///
/// Bits 0 to 5 contain the destination square, bits 6 to 11 contain the source square, bits
/// 12 and 13 contain the promotion piece (as [`PromotePiece`]) and bits 14 and 15 contain the
/// [`MoveKind`].
///
/// Castling is stored as the king moving onto the square of its own rook. Use [`Move::uci()`] to
/// get the conventional notation where the king moves two squares.
///
/// There are two special values. [`Move::NONE`] (all zero bits) means "no move" and is never
/// produced by the move generator. [`Move::NULL`] is the null move, which just passes the turn
/// to the opponent.
///
/// A move doesn't know the position it belongs to. The move generator produces only legal moves;
/// applying any other move to a board is a contract violation and leaves the board in an
/// unspecified (but memory-safe) state.
#[derive(Default, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Move(u16);

/// Error indicating that move is invalid
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum ValidateError {
    /// Move is not legal
    #[error("move is not legal")]
    NotLegal,
}

impl Move {
    /// "No move" marker
    pub const NONE: Move = Move(0);

    /// Null move
    pub const NULL: Move = Move(65);

    #[inline]
    const fn pack(kind: MoveKind, src: Coord, dst: Coord, promote: PromotePiece) -> Move {
        Move(
            (dst.index() as u16)
                | ((src.index() as u16) << 6)
                | ((promote as u16) << 12)
                | ((kind as u16) << 14),
        )
    }

    /// Creates a move which is not a promotion, en passant or castling
    #[inline]
    pub const fn normal(src: Coord, dst: Coord) -> Move {
        Move::pack(MoveKind::Normal, src, dst, PromotePiece::Knight)
    }

    #[inline]
    pub const fn promotion(src: Coord, dst: Coord, promote: PromotePiece) -> Move {
        Move::pack(MoveKind::Promotion, src, dst, promote)
    }

    /// Creates an en passant capture, `dst` is the square where the capturing pawn lands
    #[inline]
    pub const fn enpassant(src: Coord, dst: Coord) -> Move {
        Move::pack(MoveKind::Enpassant, src, dst, PromotePiece::Knight)
    }

    /// Creates a castling move from the king square `king` to the rook square `rook`
    #[inline]
    pub const fn castling(king: Coord, rook: Coord) -> Move {
        Move::pack(MoveKind::Castling, king, rook, PromotePiece::Knight)
    }

    /// Creates a castling move made by `color` with side `side`
    #[inline]
    pub const fn from_castling(color: Color, side: CastlingSide) -> Move {
        Move::castling(castling::king_src(color), castling::rook_src(color, side))
    }

    #[inline]
    pub const fn from_raw(raw: u16) -> Move {
        Move(raw)
    }

    #[inline]
    pub const fn raw(&self) -> u16 {
        self.0
    }

    /// Returns the move kind
    #[inline]
    pub const fn kind(&self) -> MoveKind {
        match self.0 >> 14 {
            0 => MoveKind::Normal,
            1 => MoveKind::Promotion,
            2 => MoveKind::Enpassant,
            _ => MoveKind::Castling,
        }
    }

    /// Returns the move source square
    #[inline]
    pub const fn src(&self) -> Coord {
        unsafe { Coord::from_index_unchecked(((self.0 >> 6) & 63) as usize) }
    }

    /// Returns the move destination square
    ///
    /// For castling, this is the square of the rook.
    #[inline]
    pub const fn dst(&self) -> Coord {
        unsafe { Coord::from_index_unchecked((self.0 & 63) as usize) }
    }

    /// Returns the piece to promote if the move is a promotion
    #[inline]
    pub const fn promote(&self) -> Option<PromotePiece> {
        if !matches!(self.kind(), MoveKind::Promotion) {
            return None;
        }
        Some(match (self.0 >> 12) & 3 {
            0 => PromotePiece::Knight,
            1 => PromotePiece::Bishop,
            2 => PromotePiece::Rook,
            _ => PromotePiece::Queen,
        })
    }

    #[inline]
    pub const fn is_null(&self) -> bool {
        self.0 == Move::NULL.0
    }

    #[inline]
    pub const fn is_none(&self) -> bool {
        self.0 == Move::NONE.0
    }

    /// Returns the castling side if the move is castling
    #[inline]
    pub fn castling_side(&self) -> Option<CastlingSide> {
        if self.kind() != MoveKind::Castling {
            return None;
        }
        Some(match self.dst().file() > self.src().file() {
            true => CastlingSide::King,
            false => CastlingSide::Queen,
        })
    }

    /// Creates a move from the UCI string `s` if `b` is the position preceding this move
    ///
    /// The returned move is **not** guaranteed to be legal.
    #[inline]
    pub fn from_uci(s: &str, b: &Board) -> Result<Move, uci::RawParseError> {
        Ok(uci::Move::from_str(s)?.into_move(b))
    }

    /// Same as [`Move::from_uci()`], but the returned move is guaranteed to be legal
    pub fn from_uci_legal(s: &str, b: &Board) -> Result<Move, uci::ParseError> {
        let res = uci::Move::from_str(s)?.into_move(b);
        res.validate(b)?;
        Ok(res)
    }

    /// Returns `true` if the move is legal in position `b`
    ///
    /// The null move is never legal.
    #[inline]
    pub fn is_legal(&self, b: &Board) -> bool {
        movegen::is_legal(b, *self)
    }

    /// Validates whether this move is legal from position `b`
    #[inline]
    pub fn validate(&self, b: &Board) -> Result<(), ValidateError> {
        match self.is_legal(b) {
            true => Ok(()),
            false => Err(ValidateError::NotLegal),
        }
    }

    /// Converts this move into a parsed UCI representation
    #[inline]
    pub fn uci(&self) -> uci::Move {
        (*self).into()
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        if self.is_none() {
            return write!(f, "Move(none)");
        }
        write!(f, "Move({})", self.uci())
    }
}

impl fmt::Display for Move {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        self.uci().fmt(f)
    }
}

fn update_castling(b: &mut Board, change: Bitboard) {
    if (change & castling::ALL_SRCS).is_empty() {
        return;
    }

    let mut rights = b.r.castling;
    for c in [Color::White, Color::Black] {
        for s in CastlingSide::ALL {
            if (change & castling::srcs(c, s)).is_nonempty() {
                rights.unset(c, s);
            }
        }
    }

    if rights != b.r.castling {
        b.hash ^= zobrist::castling(b.r.castling) ^ zobrist::castling(rights);
        b.r.castling = rights;
    }
}

#[inline]
fn reset_enpassant(b: &mut Board) {
    if let Some(p) = b.r.ep_square.take() {
        b.hash ^= zobrist::enpassant(p.file());
    }
}

#[inline]
fn do_move_piece(b: &mut Board, cell: Cell, src: Coord, dst: Coord) {
    b.toggle_piece(cell, src);
    b.toggle_piece(cell, dst);
    b.r.put(src, Cell::EMPTY);
    b.r.put(dst, cell);
}

#[inline]
fn do_make_pawn_double<C: generic::Color>(b: &mut Board, src: Coord) {
    let ep = unsafe { src.add_unchecked(geometry::pawn_forward_delta(C::COLOR)) };
    // The square is remembered only if some enemy pawn is able to capture.
    if (attack::pawn(C::COLOR, ep) & b.piece2(C::COLOR.inv(), Piece::Pawn)).is_nonempty() {
        b.r.ep_square = Some(ep);
        b.hash ^= zobrist::enpassant(ep.file());
    }
}

#[inline]
fn do_make_castling<C: generic::Color>(b: &mut Board, mv: Move) {
    let side = match mv.dst().file() > mv.src().file() {
        true => CastlingSide::King,
        false => CastlingSide::Queen,
    };
    let king = Cell::from_parts(C::COLOR, Piece::King);
    let rook = Cell::from_parts(C::COLOR, Piece::Rook);
    let king_dst = castling::king_dst(C::COLOR, side);
    let rook_dst = castling::rook_dst(C::COLOR, side);
    b.toggle_piece(king, mv.src());
    b.toggle_piece(rook, mv.dst());
    b.toggle_piece(king, king_dst);
    b.toggle_piece(rook, rook_dst);
    b.r.put(mv.src(), Cell::EMPTY);
    b.r.put(mv.dst(), Cell::EMPTY);
    b.r.put(king_dst, king);
    b.r.put(rook_dst, rook);
}

fn do_make_move<C: generic::Color>(b: &mut Board, mv: Move) {
    let src = mv.src();
    let dst = mv.dst();
    let src_cell = b.get(src);
    let dst_cell = b.get(dst);
    let pawn = Cell::from_parts(C::COLOR, Piece::Pawn);

    reset_enpassant(b);

    let is_capture = match mv.kind() {
        MoveKind::Castling => false,
        MoveKind::Enpassant => true,
        MoveKind::Normal | MoveKind::Promotion => dst_cell.is_occupied(),
    };
    if is_capture || src_cell == pawn {
        b.r.move_counter = 0;
    } else {
        b.r.move_counter += 1;
    }

    match mv.kind() {
        MoveKind::Normal => {
            if dst_cell.is_occupied() {
                b.toggle_piece(dst_cell, dst);
            }
            do_move_piece(b, src_cell, src, dst);
            if src_cell == pawn && src.index().abs_diff(dst.index()) == 16 {
                do_make_pawn_double::<C>(b, src);
            }
        }
        MoveKind::Promotion => {
            let promote = Cell::from_parts(C::COLOR, Piece::from(mv.promote().unwrap_or(PromotePiece::Queen)));
            if dst_cell.is_occupied() {
                b.toggle_piece(dst_cell, dst);
            }
            b.toggle_piece(pawn, src);
            b.toggle_piece(promote, dst);
            b.r.put(src, Cell::EMPTY);
            b.r.put(dst, promote);
        }
        MoveKind::Enpassant => {
            let taken_pos = unsafe { dst.add_unchecked(-geometry::pawn_forward_delta(C::COLOR)) };
            b.toggle_piece(Cell::from_parts(C::COLOR.inv(), Piece::Pawn), taken_pos);
            b.r.put(taken_pos, Cell::EMPTY);
            do_move_piece(b, pawn, src, dst);
        }
        MoveKind::Castling => do_make_castling::<C>(b, mv),
    }

    update_castling(b, Bitboard::from_coord(src) | Bitboard::from_coord(dst));
    finish_move::<C>(b, mv);
}

fn do_make_null_move<C: generic::Color>(b: &mut Board) {
    reset_enpassant(b);
    b.r.move_counter += 1;
    finish_move::<C>(b, Move::NULL);
}

#[inline]
fn finish_move<C: generic::Color>(b: &mut Board, mv: Move) {
    b.r.side = C::COLOR.inv();
    b.hash ^= zobrist::MOVE_SIDE;
    if C::COLOR == Color::Black {
        b.r.move_number += 1;
    }
    b.last_move = mv;
    b.update_caches();

    #[cfg(feature = "selftest")]
    b.self_check();
}

/// Makes the move `mv` on the board `b`
///
/// The move must be legal in `b`, for example, obtained from the move generator. The legality
/// is not verified here, use [`Make`](super::Make) or [`Move::validate()`] if it's not known.
///
/// The null move is applied via [`make_null_move_unchecked()`] instead.
pub fn make_move_unchecked(b: &mut Board, mv: Move) {
    debug_assert!(!mv.is_none() && !mv.is_null(), "cannot apply {:?} as a regular move", mv);
    match b.r.side {
        Color::White => do_make_move::<generic::White>(b, mv),
        Color::Black => do_make_move::<generic::Black>(b, mv),
    }
}

/// Passes the turn to the opponent without moving any piece
///
/// The side to move must not be in check.
pub fn make_null_move_unchecked(b: &mut Board) {
    debug_assert!(!b.is_check(), "null move while in check");
    match b.r.side {
        Color::White => do_make_null_move::<generic::White>(b),
        Color::Black => do_make_null_move::<generic::Black>(b),
    }
}
