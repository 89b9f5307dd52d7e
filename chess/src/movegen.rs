//! Legal move generation
//!
//! Moves are generated legal right away: pins, checks and attacked squares are taken from the
//! masks which [`Board`] keeps for the side to move, so no move needs to be tried and taken back.

use crate::bitboard::Bitboard;
use crate::board::Board;
use crate::moves::{Move, PromotePiece};
use crate::types::{CastlingSide, Color, Coord, Piece};
use crate::{attack, bitboard_consts, castling, generic, geometry, pawns};

use std::convert::Infallible;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};
use std::slice;

use arrayvec::ArrayVec;

fn do_cell_attackers<C: generic::Color>(b: &Board, coord: Coord) -> Bitboard {
    // Pawn attacks are traced back from the target, so the attack map of the opposite color is used
    let pawn_attacks = attack::pawn(C::COLOR.inv(), coord);
    (b.piece2(C::COLOR, Piece::Pawn) & pawn_attacks)
        | (b.piece2(C::COLOR, Piece::King) & attack::king(coord))
        | (b.piece2(C::COLOR, Piece::Knight) & attack::knight(coord))
        | (attack::bishop(coord, b.all) & b.piece_diag(C::COLOR))
        | (attack::rook(coord, b.all) & b.piece_line(C::COLOR))
}

/// Returns `true` if the square `coord` is attacked by any piece of color `color`
pub fn is_cell_attacked(b: &Board, coord: Coord, color: Color) -> bool {
    cell_attackers(b, coord, color).is_nonempty()
}

/// Returns all the pieces of color `color` which attack the square `coord`
pub fn cell_attackers(b: &Board, coord: Coord, color: Color) -> Bitboard {
    match color {
        Color::White => do_cell_attackers::<generic::White>(b, coord),
        Color::Black => do_cell_attackers::<generic::Black>(b, coord),
    }
}

/// Subset of legal moves to generate
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum GenType {
    /// All the legal moves
    All,
    /// Pawn moves, including en passant and promotions
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    /// King moves, including castling
    King,
    /// Moves which capture a piece, including en passant
    ///
    /// These are obtained by filtering all the legal moves, so this is slower than generating
    /// all the moves.
    Capture,
}

trait MaybeMovePush {
    type Err;

    fn push(&mut self, m: Move) -> Result<(), Self::Err>;
}

/// List of moves with capacity large enough to hold all the legal moves in any position
#[derive(Default, Debug, Clone, Eq, PartialEq)]
pub struct MoveList(ArrayVec<Move, 256>);

impl Deref for MoveList {
    type Target = ArrayVec<Move, 256>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for MoveList {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<'a> IntoIterator for &'a MoveList {
    type Item = &'a Move;
    type IntoIter = slice::Iter<'a, Move>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a mut MoveList {
    type Item = &'a mut Move;
    type IntoIter = slice::IterMut<'a, Move>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter_mut()
    }
}

impl MoveList {
    pub fn new() -> MoveList {
        MoveList(ArrayVec::new())
    }
}

/// Destination for the generated moves
pub trait MovePush {
    fn push(&mut self, m: Move);
}

impl<const N: usize> MovePush for ArrayVec<Move, N> {
    fn push(&mut self, m: Move) {
        self.push(m);
    }
}

impl MovePush for MoveList {
    fn push(&mut self, m: Move) {
        self.0.push(m);
    }
}

impl MovePush for Vec<Move> {
    fn push(&mut self, m: Move) {
        self.push(m);
    }
}

impl<T: MovePush> MaybeMovePush for T {
    type Err = Infallible;

    fn push(&mut self, m: Move) -> Result<(), Self::Err> {
        <Self as MovePush>::push(self, m);
        Ok(())
    }
}

struct UnsafeMoveList(MoveList);

impl UnsafeMoveList {
    /// The caller must only push the moves of a single position, as there are never more than
    /// 218 legal moves
    unsafe fn new() -> UnsafeMoveList {
        UnsafeMoveList(MoveList::new())
    }
}

impl MovePush for UnsafeMoveList {
    fn push(&mut self, m: Move) {
        unsafe {
            self.0.push_unchecked(m);
        }
    }
}

struct CaptureFilter<'a, P> {
    board: &'a Board,
    inner: &'a mut P,
}

impl<'a, P: MaybeMovePush> MaybeMovePush for CaptureFilter<'a, P> {
    type Err = P::Err;

    fn push(&mut self, mv: Move) -> Result<(), Self::Err> {
        match self.board.is_capture(mv) {
            true => self.inner.push(mv),
            false => Ok(()),
        }
    }
}

struct MoveGenImpl<'a, P, C> {
    board: &'a Board,
    dst: &'a mut P,
    _c: PhantomData<C>,
}

impl<'a, P: MaybeMovePush, C: generic::Color> MoveGenImpl<'a, P, C> {
    fn new(board: &'a Board, dst: &'a mut P, _c: C) -> Self {
        MoveGenImpl {
            board,
            dst,
            _c: PhantomData,
        }
    }

    #[inline]
    fn targets(&self) -> Bitboard {
        !self.board.color(C::COLOR) & self.board.check_mask
    }

    fn add_pawn_moves(&mut self, targets: Bitboard, delta: isize) -> Result<(), P::Err> {
        let promote = bitboard_consts::rank(geometry::promote_dst_rank(C::COLOR));
        for dst in targets & !promote {
            let src = unsafe { dst.add_unchecked(-delta) };
            self.dst.push(Move::normal(src, dst))?;
        }
        for dst in targets & promote {
            let src = unsafe { dst.add_unchecked(-delta) };
            for p in PromotePiece::ALL {
                self.dst.push(Move::promotion(src, dst, p))?;
            }
        }
        Ok(())
    }

    fn gen_pawn(&mut self) -> Result<(), P::Err> {
        let b = self.board;
        let pawns = b.piece2(C::COLOR, Piece::Pawn);
        let mask = b.check_mask;

        // Captures. Pawns pinned along a line can never capture, and pawns pinned along a diagonal
        // can capture only on this diagonal.
        let capturers = pawns & !b.pin_line;
        let free = capturers & !b.pin_diag;
        let pinned = capturers & b.pin_diag;
        let enemy = b.color(C::COLOR.inv()) & mask;
        let left = (pawns::advance_left(C::COLOR, free)
            | (pawns::advance_left(C::COLOR, pinned) & b.pin_diag))
            & enemy;
        let right = (pawns::advance_right(C::COLOR, free)
            | (pawns::advance_right(C::COLOR, pinned) & b.pin_diag))
            & enemy;
        self.add_pawn_moves(left, geometry::pawn_left_delta(C::COLOR))?;
        self.add_pawn_moves(right, geometry::pawn_right_delta(C::COLOR))?;

        // Pushes. Pawns pinned along a diagonal can never push.
        let pushers = pawns & !b.pin_diag;
        let free = pushers & !b.pin_line;
        let pinned = pushers & b.pin_line;
        let empty = !b.all;
        let single = (pawns::advance_forward(C::COLOR, free)
            | (pawns::advance_forward(C::COLOR, pinned) & b.pin_line))
            & empty;
        let double_mid = single & bitboard_consts::rank(geometry::double_move_mid_rank(C::COLOR));
        let double = pawns::advance_forward(C::COLOR, double_mid) & empty & mask;
        let fwd = geometry::pawn_forward_delta(C::COLOR);
        self.add_pawn_moves(single & mask, fwd)?;
        for dst in double {
            let src = unsafe { dst.add_unchecked(-2 * fwd) };
            self.dst.push(Move::normal(src, dst))?;
        }

        self.gen_enpassant()
    }

    fn gen_enpassant(&mut self) -> Result<(), P::Err> {
        let b = self.board;
        let ep = match b.r.ep_square {
            Some(ep) => ep,
            None => return Ok(()),
        };
        let captured = unsafe { ep.add_unchecked(-geometry::pawn_forward_delta(C::COLOR)) };
        let ep_bb = Bitboard::from_coord(ep);
        let captured_bb = Bitboard::from_coord(captured);
        if (b.check_mask & (ep_bb | captured_bb)).is_empty() {
            return Ok(());
        }

        let them = C::COLOR.inv();
        let king = b.king_pos(C::COLOR);
        let candidates =
            attack::pawn(them, ep) & b.piece2(C::COLOR, Piece::Pawn) & !b.pin_line;
        // Each of the two candidates is verified on its own, as removing two pawns from the same
        // rank may reveal an attack which is not seen as a pin.
        for src in candidates {
            if b.pin_diag.has(src) && !b.pin_diag.has(ep) {
                continue;
            }
            if let Some(king) = king {
                let occupied = (b.all ^ Bitboard::from_coord(src) ^ captured_bb) | ep_bb;
                if (attack::rook(king, occupied) & b.piece_line(them)).is_nonempty()
                    || (attack::bishop(king, occupied) & b.piece_diag(them)).is_nonempty()
                {
                    continue;
                }
            }
            self.dst.push(Move::enpassant(src, ep))?;
        }
        Ok(())
    }

    fn gen_knight(&mut self) -> Result<(), P::Err> {
        let b = self.board;
        let targets = self.targets();
        let knights = b.piece2(C::COLOR, Piece::Knight) & !(b.pin_diag | b.pin_line);
        for src in knights {
            for dst in attack::knight(src) & targets {
                self.dst.push(Move::normal(src, dst))?;
            }
        }
        Ok(())
    }

    #[inline]
    fn do_gen_slider<const IS_DIAG: bool>(&mut self, pieces: Bitboard) -> Result<(), P::Err> {
        let b = self.board;
        let targets = self.targets();
        let (pin_own, pin_other) = match IS_DIAG {
            true => (b.pin_diag, b.pin_line),
            false => (b.pin_line, b.pin_diag),
        };
        for src in pieces & !pin_other {
            let mut attack = match IS_DIAG {
                true => attack::bishop(src, b.all),
                false => attack::rook(src, b.all),
            };
            if pin_own.has(src) {
                attack &= pin_own;
            }
            for dst in attack & targets {
                self.dst.push(Move::normal(src, dst))?;
            }
        }
        Ok(())
    }

    fn gen_bishop(&mut self) -> Result<(), P::Err> {
        self.do_gen_slider::<true>(self.board.piece2(C::COLOR, Piece::Bishop))
    }

    fn gen_rook(&mut self) -> Result<(), P::Err> {
        self.do_gen_slider::<false>(self.board.piece2(C::COLOR, Piece::Rook))
    }

    fn gen_queen(&mut self) -> Result<(), P::Err> {
        let queens = self.board.piece2(C::COLOR, Piece::Queen);
        self.do_gen_slider::<true>(queens)?;
        self.do_gen_slider::<false>(queens)
    }

    fn gen_king(&mut self) -> Result<(), P::Err> {
        let b = self.board;
        let king = match b.king_pos(C::COLOR) {
            Some(king) => king,
            None => return Ok(()),
        };
        for dst in attack::king(king) & !b.color(C::COLOR) & !b.seen {
            self.dst.push(Move::normal(king, dst))?;
        }

        if b.is_check() {
            return Ok(());
        }
        for side in CastlingSide::ALL {
            if b.r.castling.has(C::COLOR, side)
                && (castling::pass(C::COLOR, side) & b.all).is_empty()
                && (castling::king_path(C::COLOR, side) & b.seen).is_empty()
            {
                self.dst.push(Move::from_castling(C::COLOR, side))?;
            }
        }
        Ok(())
    }

    fn gen_all(&mut self) -> Result<(), P::Err> {
        self.gen_king()?;
        // Only the king can move in case of double check
        if self.board.checkers.len() >= 2 {
            return Ok(());
        }
        self.gen_knight()?;
        self.gen_bishop()?;
        self.gen_rook()?;
        self.gen_queen()?;
        self.gen_pawn()
    }

    fn gen(&mut self, ty: GenType) -> Result<(), P::Err> {
        match ty {
            GenType::All => self.gen_all(),
            GenType::Pawn => self.gen_pawn(),
            GenType::Knight => self.gen_knight(),
            GenType::Bishop => self.gen_bishop(),
            GenType::Rook => self.gen_rook(),
            GenType::Queen => self.gen_queen(),
            GenType::King => self.gen_king(),
            // Captures are filtered by the caller
            GenType::Capture => self.gen_all(),
        }
    }
}

fn do_gen_side<P: MaybeMovePush>(b: &Board, ty: GenType, dst: &mut P) -> Result<(), P::Err> {
    match b.r.side {
        Color::White => MoveGenImpl::new(b, dst, generic::White).gen(ty),
        Color::Black => MoveGenImpl::new(b, dst, generic::Black).gen(ty),
    }
}

fn do_gen<P: MaybeMovePush>(b: &Board, ty: GenType, dst: &mut P) -> Result<(), P::Err> {
    match ty {
        GenType::Capture => {
            let mut filter = CaptureFilter { board: b, inner: dst };
            do_gen_side(b, GenType::All, &mut filter)
        }
        _ => do_gen_side(b, ty, dst),
    }
}

/// Appends the legal moves of type `ty` to `dst`
///
/// Moves are appended in no particular order.
pub fn gen_legal_into<P: MovePush>(b: &Board, ty: GenType, dst: &mut P) {
    let _ = do_gen(b, ty, dst);
}

/// Returns the legal moves of type `ty`
pub fn gen_legal(b: &Board, ty: GenType) -> MoveList {
    let mut res = unsafe { UnsafeMoveList::new() };
    gen_legal_into(b, ty, &mut res);
    res.0
}

pub mod legal {
    //! Shortcuts for [`gen_legal()`](super::gen_legal) and [`gen_legal_into()`](super::gen_legal_into)

    use super::{GenType, MoveList, MovePush};
    use crate::board::Board;

    macro_rules! do_impl {
        ($($(#[$attr:meta])* $name:ident, $name_into:ident => $ty:ident;)*) => {
            $(
                $(#[$attr])*
                pub fn $name_into<P: MovePush>(b: &Board, dst: &mut P) {
                    super::gen_legal_into(b, GenType::$ty, dst);
                }

                $(#[$attr])*
                pub fn $name(b: &Board) -> MoveList {
                    super::gen_legal(b, GenType::$ty)
                }
            )*
        }
    }

    do_impl! {
        /// Generates all the legal moves
        gen_all, gen_all_into => All;
        /// Generates legal captures
        gen_capture, gen_capture_into => Capture;
        /// Generates legal pawn moves
        gen_pawn, gen_pawn_into => Pawn;
        /// Generates legal knight moves
        gen_knight, gen_knight_into => Knight;
        /// Generates legal bishop moves
        gen_bishop, gen_bishop_into => Bishop;
        /// Generates legal rook moves
        gen_rook, gen_rook_into => Rook;
        /// Generates legal queen moves
        gen_queen, gen_queen_into => Queen;
        /// Generates legal king moves
        gen_king, gen_king_into => King;
    }
}

struct ErrOnFirst;

impl MaybeMovePush for ErrOnFirst {
    type Err = ();

    fn push(&mut self, _mv: Move) -> Result<(), ()> {
        Err(())
    }
}

struct ErrOnMatch(Move);

impl MaybeMovePush for ErrOnMatch {
    type Err = ();

    fn push(&mut self, mv: Move) -> Result<(), ()> {
        match mv == self.0 {
            true => Err(()),
            false => Ok(()),
        }
    }
}

/// Returns `true` if the side to move has at least one legal move
pub fn has_legal_moves(b: &Board) -> bool {
    do_gen(b, GenType::All, &mut ErrOnFirst).is_err()
}

/// Returns `true` if `mv` is a legal move in position `b`
///
/// Only the moves of the piece standing on the source square are generated to check this.
pub fn is_legal(b: &Board, mv: Move) -> bool {
    if mv.is_none() || mv.is_null() {
        return false;
    }
    let cell = b.get(mv.src());
    if cell.color() != Some(b.r.side) {
        return false;
    }
    let ty = match cell.piece() {
        Some(Piece::Pawn) => GenType::Pawn,
        Some(Piece::Knight) => GenType::Knight,
        Some(Piece::Bishop) => GenType::Bishop,
        Some(Piece::Rook) => GenType::Rook,
        Some(Piece::Queen) => GenType::Queen,
        Some(Piece::King) => GenType::King,
        None => return false,
    };
    do_gen(b, ty, &mut ErrOnMatch(mv)).is_err()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::MoveKind;
    use crate::types::{File, Rank};
    use std::collections::BTreeSet;

    fn uci_set(ml: &MoveList) -> BTreeSet<String> {
        ml.iter().map(ToString::to_string).collect()
    }

    fn set_of(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_cell_attackers() {
        let b = Board::from_fen("3R3B/8/3R4/1NP1Q3/3p4/1NP5/5B2/3R1K1k w - - 0 1").unwrap();
        assert!(is_cell_attacked(
            &b,
            Coord::from_parts(File::D, Rank::R4),
            Color::White
        ));
        let attackers = Bitboard::EMPTY
            .with(Coord::from_parts(File::D, Rank::R6))
            .with(Coord::from_parts(File::B, Rank::R5))
            .with(Coord::from_parts(File::E, Rank::R5))
            .with(Coord::from_parts(File::B, Rank::R3))
            .with(Coord::from_parts(File::C, Rank::R3))
            .with(Coord::from_parts(File::F, Rank::R2))
            .with(Coord::from_parts(File::D, Rank::R1));
        assert_eq!(
            cell_attackers(&b, Coord::from_parts(File::D, Rank::R4), Color::White),
            attackers
        );
        assert!(!is_cell_attacked(
            &b,
            Coord::from_parts(File::D, Rank::R4),
            Color::Black
        ));

        let b = Board::from_fen("8/8/8/2KPk3/8/8/8/8 w - - 0 1").unwrap();
        assert_eq!(
            cell_attackers(&b, Coord::from_parts(File::D, Rank::R5), Color::White),
            Bitboard::from_coord(Coord::from_parts(File::C, Rank::R5)),
        );
        assert_eq!(
            cell_attackers(&b, Coord::from_parts(File::D, Rank::R5), Color::Black),
            Bitboard::from_coord(Coord::from_parts(File::E, Rank::R5)),
        );
    }

    #[test]
    fn test_initial() {
        let b = Board::initial();
        assert_eq!(legal::gen_all(&b).len(), 20);
        assert_eq!(legal::gen_pawn(&b).len(), 16);
        assert_eq!(legal::gen_knight(&b).len(), 4);
        assert_eq!(legal::gen_king(&b).len(), 0);
        assert_eq!(legal::gen_capture(&b).len(), 0);
        assert!(has_legal_moves(&b));
    }

    #[test]
    fn test_pinned_pawns() {
        let b =
            Board::from_fen("rnbqkbnr/1ppppppp/8/p7/Q1P5/8/PP1PPPPP/RNB1KBNR b KQkq - 1 2").unwrap();
        assert_eq!(b.pin_diag().as_raw(), 0x8040201000000);
        assert_eq!(b.pin_line(), Bitboard::EMPTY);
        assert_eq!(b.pinned(), Bitboard::EMPTY.with2(File::D, Rank::R7));
        let pawns = legal::gen_pawn(&b);
        assert_eq!(pawns.len(), 12);
        assert!(!uci_set(&pawns).contains("d7d6"));
        assert!(!uci_set(&pawns).contains("d7d5"));
    }

    #[test]
    fn test_pinned_pieces() {
        // Rook pinned on a diagonal, queen pinned on a line
        let b = Board::from_fen("7k/8/8/8/1b6/8/3R1B2/q2QK3 w - - 0 1").unwrap();
        assert_eq!(legal::gen_rook(&b).len(), 0);
        assert_eq!(
            uci_set(&legal::gen_queen(&b)),
            set_of(&["d1c1", "d1b1", "d1a1"])
        );
        assert_eq!(legal::gen_bishop(&b).len(), 8);

        let b = Board::from_fen("4q2k/8/8/8/8/8/4B3/4K3 w - - 0 1").unwrap();
        assert_eq!(legal::gen_bishop(&b).len(), 0);
        assert_eq!(b.pin_line().len(), 7);

        let b = Board::from_fen("7k/8/8/8/8/2b5/3B4/4K3 w - - 0 1").unwrap();
        assert_eq!(uci_set(&legal::gen_bishop(&b)), set_of(&["d2c3"]));
    }

    #[test]
    fn test_enpassant_pins() {
        // Capturing would reveal the bishop on the diagonal
        let b = Board::from_fen("5k2/5b2/8/2pP4/2K5/8/8/8 w - c6 0 2").unwrap();
        assert_eq!(b.ep_square(), Some(Coord::from_parts(File::C, Rank::R6)));
        let all = legal::gen_all(&b);
        assert!(all.iter().all(|mv| mv.kind() != MoveKind::Enpassant));
        assert_eq!(
            uci_set(&all),
            set_of(&["c4b3", "c4b5", "c4c3", "c4d3", "c4c5"])
        );

        // Capturing would remove both pawns from the rank between the king and the rook
        let b = Board::from_fen("8/8/8/K2pP2r/8/8/8/4k3 w - d6 0 1").unwrap();
        let all = legal::gen_all(&b);
        assert!(all.iter().all(|mv| mv.kind() != MoveKind::Enpassant));
        assert_eq!(all.len(), 6);

        // The pawn on d5 is pinned, but captures along the pinning diagonal
        let b = Board::from_fen("7k/1b6/8/1PpP4/8/5K2/8/8 w - c6 0 1").unwrap();
        assert!(b.pin_diag().has(Coord::from_parts(File::D, Rank::R5)));
        let ep = legal::gen_pawn(&b)
            .iter()
            .filter(|mv| mv.kind() == MoveKind::Enpassant)
            .map(ToString::to_string)
            .collect::<BTreeSet<_>>();
        assert_eq!(ep, set_of(&["b5c6", "d5c6"]));
    }

    #[test]
    fn test_enpassant_evasion() {
        let b = Board::from_fen("8/8/8/3pP3/2K5/8/8/7k w - d6 0 1").unwrap();
        assert_eq!(b.checkers(), Bitboard::EMPTY.with2(File::D, Rank::R5));
        let all = legal::gen_all(&b);
        assert!(uci_set(&all).contains("e5d6"));
        assert!(!uci_set(&all).contains("e5e6"));
        assert_eq!(all.len(), 9);
        assert_eq!(legal::gen_capture(&b).len(), 2);
    }

    #[test]
    fn test_check_evasions() {
        let b = Board::from_fen("4k3/8/8/8/1b6/8/8/r3K2N w - - 0 1").unwrap();
        assert_eq!(uci_set(&legal::gen_all(&b)), set_of(&["e1e2", "e1f2"]));

        // Single check by a rook: block, capture or step aside
        let b = Board::from_fen("4r2k/8/8/8/8/8/3B1N2/R3K3 w Q - 0 1").unwrap();
        assert_eq!(
            uci_set(&legal::gen_all(&b)),
            set_of(&["d2e3", "f2e4", "e1d1", "e1f1"])
        );
    }

    #[test]
    fn test_castling() {
        let b = Board::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let all = legal::gen_all(&b);
        assert_eq!(all.len(), 26);
        assert!(uci_set(&all).contains("e1g1"));
        assert!(uci_set(&all).contains("e1c1"));

        let b = Board::from_fen("4k3/8/8/8/8/8/5r2/R3K2R w KQ - 0 1").unwrap();
        assert_eq!(
            uci_set(&legal::gen_king(&b)),
            set_of(&["e1d1", "e1f2", "e1c1"])
        );

        // The b1 square may be attacked, but not the squares the king passes
        let b = Board::from_fen("1r2k3/8/8/8/8/8/8/R3K3 w Q - 0 1").unwrap();
        assert!(uci_set(&legal::gen_king(&b)).contains("e1c1"));
        let b = Board::from_fen("2r1k3/8/8/8/8/8/8/R3K3 w Q - 0 1").unwrap();
        assert!(!uci_set(&legal::gen_king(&b)).contains("e1c1"));

        // No castling out of check
        let b = Board::from_fen("4r1k1/8/8/8/8/8/8/R3K2R w KQ - 0 1").unwrap();
        assert!(legal::gen_king(&b)
            .iter()
            .all(|mv| mv.kind() != MoveKind::Castling));
    }

    #[test]
    fn test_promote() {
        let b = Board::from_fen("1b1b1K2/2P5/8/8/7k/8/8/8 w - - 0 1").unwrap();
        let pawns = legal::gen_pawn(&b);
        assert_eq!(pawns.len(), 12);
        assert!(pawns.iter().all(|mv| mv.kind() == MoveKind::Promotion));
        assert_eq!(legal::gen_capture(&b).len(), 8);
    }

    #[test]
    fn test_kiwipete() {
        let b = Board::from_fen(
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        )
        .unwrap();
        let all = legal::gen_all(&b);
        assert_eq!(all.len(), 48);
        assert_eq!(legal::gen_capture(&b).len(), 8);
        let sum: usize = [
            GenType::Pawn,
            GenType::Knight,
            GenType::Bishop,
            GenType::Rook,
            GenType::Queen,
            GenType::King,
        ]
        .into_iter()
        .map(|ty| gen_legal(&b, ty).len())
        .sum();
        assert_eq!(sum, 48);
        for mv in &all {
            assert!(is_legal(&b, *mv));
        }
    }

    #[test]
    fn test_into() {
        let b = Board::initial();
        let mut v = Vec::new();
        legal::gen_all_into(&b, &mut v);
        legal::gen_knight_into(&b, &mut v);
        assert_eq!(v.len(), 24);

        let mut a = ArrayVec::<Move, 32>::new();
        gen_legal_into(&b, GenType::Knight, &mut a);
        assert_eq!(a.len(), 4);
    }

    #[test]
    fn test_no_moves() {
        let b = Board::from_fen("rn1q1bnr/ppp1kB1p/3p2p1/3NN3/4P3/8/PPPP1PPP/R1BbK2R b KQ - 2 7")
            .unwrap();
        assert!(legal::gen_all(&b).is_empty());
        assert!(!has_legal_moves(&b));
        assert!(b.checkers().is_nonempty());

        let b = Board::from_fen("7K/8/5n2/5n2/8/8/7k/8 w - - 0 1").unwrap();
        assert!(legal::gen_all(&b).is_empty());
        assert!(b.checkers().is_empty());
    }
}
