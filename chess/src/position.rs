//! Position with the history of moves
//!
//! [`Position`] keeps a copy of every previous board on a stack, so undoing a move just restores
//! the previous board wholesale.

use crate::board::{self, Board, RawBoard};
use crate::movegen::{self, GenType, MoveList, MovePush};
use crate::moves::{self, uci, Move};
use crate::bitboard::Bitboard;
use crate::types::{CastlingRights, Cell, Color, Coord, DrawReason, Outcome};

use std::fmt;

use log::trace;
use thiserror::Error;

/// Maximum number of moves which may be stored in the history of [`Position`]
pub const MAX_HISTORY: usize = 1024;

/// Error parsing a space-separated list of UCI moves
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("cannot parse UCI move #{}: {}", .pos + 1, .source)]
pub struct UciListParseError {
    /// Zero-based index of the bad move in the list
    pub pos: usize,
    pub source: uci::ParseError,
}

/// Board together with the previous positions
#[derive(Debug, Clone)]
pub struct Position {
    board: Board,
    history: Vec<Board>,
}

impl Position {
    /// Creates a position with empty history from board `b`
    pub fn new(b: Board) -> Position {
        trace!("new position {}", b.raw());
        Position {
            board: b,
            history: Vec::with_capacity(MAX_HISTORY),
        }
    }

    pub fn initial() -> Position {
        Position::new(Board::initial())
    }

    pub fn from_fen(fen: &str) -> Result<Position, board::FenParseError> {
        Ok(Position::new(Board::from_fen(fen)?))
    }

    /// Rebuilds a position from a snapshot obtained with [`Position::state()`]
    pub fn from_state(state: RawBoard) -> Result<Position, board::ValidateError> {
        Ok(Position::new(Board::try_from(state)?))
    }

    /// Creates a position from board `b` and plays the UCI moves from `uci_list` on it
    pub fn from_uci_list(b: Board, uci_list: &str) -> Result<Position, UciListParseError> {
        let mut res = Position::new(b);
        res.push_uci_list(uci_list)?;
        Ok(res)
    }

    #[inline]
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Returns the snapshot of the current position
    ///
    /// The history is not included in the snapshot.
    #[inline]
    pub fn state(&self) -> RawBoard {
        *self.board.raw()
    }

    /// Number of moves made since the position was created
    #[inline]
    pub fn len(&self) -> usize {
        self.history.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Makes the move `mv`
    ///
    /// The move must be legal, for example, obtained from [`Position::legals()`].
    ///
    /// # Panics
    ///
    /// Panics if the history already contains [`MAX_HISTORY`] moves.
    pub fn do_move(&mut self, mv: Move) {
        self.push_history();
        moves::make_move_unchecked(&mut self.board, mv);
    }

    /// Passes the turn to the opponent
    ///
    /// The side to move must not be in check.
    ///
    /// # Panics
    ///
    /// Panics if the history already contains [`MAX_HISTORY`] moves.
    pub fn do_null_move(&mut self) {
        self.push_history();
        moves::make_null_move_unchecked(&mut self.board);
    }

    fn push_history(&mut self) {
        assert!(
            self.history.len() < MAX_HISTORY,
            "history overflow: more than {} moves",
            MAX_HISTORY
        );
        self.history.push(self.board);
    }

    /// Takes back the last move and returns it
    ///
    /// # Panics
    ///
    /// Panics if there are no moves to undo.
    pub fn undo_move(&mut self) -> Move {
        let mv = self.board.last_move();
        self.board = match self.history.pop() {
            Some(b) => b,
            None => panic!("no moves to undo"),
        };
        mv
    }

    /// Returns the legal moves of type `ty`
    #[inline]
    pub fn legals(&self, ty: GenType) -> MoveList {
        movegen::gen_legal(&self.board, ty)
    }

    /// Appends the legal moves of type `ty` to `dst`
    #[inline]
    pub fn gen_legals<P: MovePush>(&self, ty: GenType, dst: &mut P) {
        movegen::gen_legal_into(&self.board, ty, dst);
    }

    /// Parses a UCI move and makes it, if it's legal
    pub fn push_uci(&mut self, s: &str) -> Result<(), uci::ParseError> {
        let mv = Move::from_uci_legal(s, &self.board)?;
        self.do_move(mv);
        Ok(())
    }

    /// Makes the moves from a space-separated list of UCI moves
    ///
    /// If some move fails, the moves before it remain applied.
    pub fn push_uci_list(&mut self, uci_list: &str) -> Result<(), UciListParseError> {
        for (pos, token) in uci_list.split_ascii_whitespace().enumerate() {
            self.push_uci(token)
                .map_err(|source| UciListParseError { pos, source })?;
        }
        Ok(())
    }

    #[inline]
    pub fn hash(&self) -> u64 {
        self.board.zobrist_hash()
    }

    #[inline]
    pub fn fen(&self) -> String {
        self.board.as_fen()
    }

    #[inline]
    pub fn side(&self) -> Color {
        self.board.side()
    }

    #[inline]
    pub fn checkers(&self) -> Bitboard {
        self.board.checkers()
    }

    #[inline]
    pub fn is_check(&self) -> bool {
        self.board.is_check()
    }

    #[inline]
    pub fn castling(&self) -> CastlingRights {
        self.board.castling()
    }

    #[inline]
    pub fn ep_square(&self) -> Option<Coord> {
        self.board.ep_square()
    }

    #[inline]
    pub fn piece_on(&self, c: Coord) -> Cell {
        self.board.get(c)
    }

    #[inline]
    pub fn is_capture(&self, mv: Move) -> bool {
        self.board.is_capture(mv)
    }

    #[inline]
    pub fn is_legal(&self, mv: Move) -> bool {
        movegen::is_legal(&self.board, mv)
    }

    /// Returns the last move made, or [`Move::NONE`] if there were no moves
    #[inline]
    pub fn last_move(&self) -> Move {
        match self.history.is_empty() {
            true => Move::NONE,
            false => self.board.last_move(),
        }
    }

    /// Iterates over the moves made, from the earliest to the latest
    pub fn moves(&self) -> impl Iterator<Item = Move> + '_ {
        self.history
            .iter()
            .skip(1)
            .chain(std::iter::once(&self.board))
            .take(self.history.len())
            .map(|b| b.last_move())
    }

    /// Returns how many times the current position occurred before
    ///
    /// Positions are compared by hash. Only the positions after the last capture or pawn move
    /// with the same side to move are considered.
    pub fn repetition_count(&self) -> usize {
        let limit = (self.board.raw().move_counter as usize).min(self.history.len());
        let hash = self.board.zobrist_hash();
        (2..=limit)
            .step_by(2)
            .filter(|&back| self.history[self.history.len() - back].zobrist_hash() == hash)
            .count()
    }

    /// Returns `true` if the current position occurred at least `count` times before
    #[inline]
    pub fn is_repetition(&self, count: usize) -> bool {
        self.repetition_count() >= count
    }

    /// Calculates the current outcome, including draws by threefold repetition
    pub fn calc_outcome(&self) -> Option<Outcome> {
        if let Some(outcome) = self.board.calc_outcome() {
            return Some(outcome);
        }
        if self.is_repetition(2) {
            return Some(Outcome::Draw(DrawReason::Repeat3));
        }
        None
    }

    /// Wraps the position to display its moves as a space-separated UCI list
    pub fn uci_list(&self) -> UciList<'_> {
        UciList(self)
    }
}

impl Default for Position {
    fn default() -> Self {
        Position::initial()
    }
}

impl From<Board> for Position {
    fn from(b: Board) -> Self {
        Position::new(b)
    }
}

impl PartialEq for Position {
    fn eq(&self, other: &Self) -> bool {
        self.board == other.board
            && self.history.len() == other.history.len()
            && self.moves().eq(other.moves())
    }
}

impl Eq for Position {}

pub struct UciList<'a>(&'a Position);

impl<'a> fmt::Display for UciList<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        for (i, m) in self.0.moves().enumerate() {
            if i != 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", m)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{File, Piece, Rank, WinReason};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::cell::Cell as StdCell;

    thread_local! {
        static RECORDS: StdCell<usize> = StdCell::new(0);
    }

    /// Forwards to `env_logger` and counts the records emitted by the current thread
    struct CountingLogger(env_logger::Logger);

    impl log::Log for CountingLogger {
        fn enabled(&self, _: &log::Metadata<'_>) -> bool {
            true
        }

        fn log(&self, record: &log::Record<'_>) {
            RECORDS.with(|r| r.set(r.get() + 1));
            self.0.log(record);
        }

        fn flush(&self) {
            self.0.flush();
        }
    }

    fn init_logger() {
        let inner = env_logger::builder().is_test(true).build();
        if log::set_boxed_logger(Box::new(CountingLogger(inner))).is_ok() {
            log::set_max_level(log::LevelFilter::Trace);
        }
    }

    fn records() -> usize {
        RECORDS.with(|r| r.get())
    }

    fn perft(p: &mut Position, depth: usize) -> u64 {
        if depth == 0 {
            return 1;
        }
        let moves = p.legals(GenType::All);
        if depth == 1 {
            return moves.len() as u64;
        }
        let mut res = 0;
        for mv in &moves {
            p.do_move(*mv);
            res += perft(p, depth - 1);
            p.undo_move();
        }
        res
    }

    const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

    #[test]
    fn test_perft_initial() {
        let mut p = Position::initial();
        assert_eq!(perft(&mut p, 1), 20);
        assert_eq!(perft(&mut p, 2), 400);
        assert_eq!(perft(&mut p, 3), 8902);
        assert!(p.is_empty());
        assert_eq!(p.board(), &Board::initial());
    }

    #[test]
    fn test_perft_kiwipete() {
        let mut p = Position::from_fen(KIWIPETE).unwrap();
        assert_eq!(perft(&mut p, 1), 48);
        assert_eq!(perft(&mut p, 2), 2039);
        assert_eq!(perft(&mut p, 3), 97862);
    }

    #[test]
    fn test_perft_tricky() {
        // Discovered checks, en passant pins and promotions
        for (fen, depth, count) in [
            ("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1", 4, 43238),
            (
                "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
                3,
                9467,
            ),
            ("rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8", 3, 62379),
            (
                "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10",
                2,
                2079,
            ),
        ] {
            let mut p = Position::from_fen(fen).unwrap();
            assert_eq!(perft(&mut p, depth), count, "fen: {}", fen);
        }
    }

    #[test]
    #[ignore]
    fn test_perft_deep() {
        let mut p = Position::initial();
        assert_eq!(perft(&mut p, 4), 197281);
        assert_eq!(perft(&mut p, 5), 4865609);
        assert_eq!(perft(&mut p, 6), 119060324);

        let mut p = Position::from_fen(KIWIPETE).unwrap();
        assert_eq!(perft(&mut p, 4), 4085603);
    }

    #[test]
    fn test_random_playouts() {
        init_logger();
        let mut rng = StdRng::seed_from_u64(42);
        for fen in [
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            KIWIPETE,
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
        ] {
            for _ in 0..20 {
                let mut p = Position::from_fen(fen).unwrap();
                let start = *p.board();
                let mut boards = vec![start];
                for _ in 0..200 {
                    let moves = p.legals(GenType::All);
                    if moves.is_empty() {
                        break;
                    }
                    let mv = moves[rng.gen_range(0..moves.len())];
                    assert!(p.is_legal(mv));
                    p.do_move(mv);
                    p.board().self_check();
                    assert_eq!(p.hash(), p.state().zobrist_hash());
                    let reparsed = Position::from_fen(&p.fen()).unwrap();
                    assert_eq!(reparsed.fen(), p.fen());
                    assert_eq!(reparsed.hash(), p.hash());
                    boards.push(*p.board());
                }
                while !p.is_empty() {
                    let expected = boards.pop().unwrap();
                    let b = p.board();
                    assert_eq!(b, &expected);
                    assert_eq!(b.zobrist_hash(), expected.zobrist_hash());
                    assert_eq!(b.checkers(), expected.checkers());
                    assert_eq!(b.check_mask(), expected.check_mask());
                    assert_eq!(b.pin_diag(), expected.pin_diag());
                    assert_eq!(b.pin_line(), expected.pin_line());
                    assert_eq!(b.seen(), expected.seen());
                    assert_eq!(b.last_move(), expected.last_move());
                    p.undo_move();
                }
                assert_eq!(p.board(), &start);
                assert_eq!(p.hash(), start.zobrist_hash());
            }
        }
    }

    #[test]
    fn test_no_logs_on_moves() {
        init_logger();
        let before = records();
        let mut p = Position::from_fen(KIWIPETE).unwrap();
        assert!(records() > before);

        let before = records();
        for _ in 0..10 {
            p.push_uci_list("d2c1 a6b7 c1d2 b7a6").unwrap();
            let mut moves = Vec::new();
            p.gen_legals(GenType::All, &mut moves);
            assert_eq!(p.legals(GenType::All).len(), moves.len());
            p.do_null_move();
            p.undo_move();
            for _ in 0..4 {
                p.undo_move();
            }
        }
        assert!(p.is_empty());
        assert_eq!(records(), before);
    }

    #[test]
    fn test_undo() {
        let mut p = Position::initial();
        p.push_uci_list("e2e4 c7c5 g1f3").unwrap();
        assert_eq!(p.len(), 3);
        assert_eq!(p.last_move().to_string(), "g1f3");
        assert_eq!(p.uci_list().to_string(), "e2e4 c7c5 g1f3");
        assert_eq!(p.undo_move().to_string(), "g1f3");
        assert_eq!(p.undo_move().to_string(), "c7c5");
        assert_eq!(
            p.fen(),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"
        );
        assert_eq!(p.undo_move().to_string(), "e2e4");
        assert_eq!(p, Position::initial());
        assert_eq!(p.last_move(), Move::NONE);
    }

    #[test]
    #[should_panic]
    fn test_undo_empty() {
        let mut p = Position::initial();
        p.undo_move();
    }

    #[test]
    #[should_panic]
    fn test_overflow() {
        let mut p = Position::initial();
        for _ in 0..=MAX_HISTORY / 4 {
            p.push_uci_list("g1f3 g8f6 f3g1 f6g8").unwrap();
        }
    }

    #[test]
    fn test_uci_list_error() {
        let mut p = Position::initial();
        let err = p.push_uci_list("e2e4 e7e5 e1e3 d7d5").unwrap_err();
        assert_eq!(err.pos, 2);
        assert_eq!(p.len(), 2);
        assert_eq!(err.to_string(), "cannot parse UCI move #3: invalid move: move is not legal");

        assert!(Position::from_uci_list(Board::initial(), "e2e4 e7e5 g1f3").is_ok());
    }

    #[test]
    fn test_null_move() {
        let mut p = Position::initial();
        p.push_uci("e2e4").unwrap();
        assert!(p.ep_square().is_none());
        p.push_uci("d7d5").unwrap();
        p.push_uci("e4e5").unwrap();
        p.push_uci("f7f5").unwrap();
        assert_eq!(p.ep_square(), Some(Coord::from_parts(File::F, Rank::R6)));
        let hash = p.hash();

        p.do_null_move();
        assert_eq!(p.side(), Color::Black);
        assert_eq!(p.ep_square(), None);
        assert_eq!(p.last_move(), Move::NULL);
        assert_eq!(p.hash(), p.state().zobrist_hash());
        assert_ne!(p.hash(), hash);

        p.undo_move();
        assert_eq!(p.hash(), hash);
        assert_eq!(p.ep_square(), Some(Coord::from_parts(File::F, Rank::R6)));
    }

    #[test]
    fn test_repetition() {
        let mut p = Position::initial();
        assert_eq!(p.repetition_count(), 0);
        p.push_uci_list("g1f3 g8f6 f3g1 f6g8").unwrap();
        assert_eq!(p.repetition_count(), 1);
        assert!(!p.is_repetition(2));
        assert_eq!(p.calc_outcome(), None);
        p.push_uci_list("g1f3 g8f6 f3g1").unwrap();
        assert_eq!(p.repetition_count(), 1);
        p.push_uci("f6g8").unwrap();
        assert_eq!(p.repetition_count(), 2);
        assert_eq!(p.calc_outcome(), Some(Outcome::Draw(DrawReason::Repeat3)));

        // A pawn move makes the earlier positions unreachable
        let mut p = Position::initial();
        p.push_uci_list("g1f3 g8f6 f3g1 f6g8 e2e4 e7e5 g1f3 g8f6 f3g1 f6g8").unwrap();
        assert_eq!(p.repetition_count(), 1);
    }

    #[test]
    fn test_outcome() {
        let mut p = Position::initial();
        p.push_uci_list("f2f3 e7e5 g2g4 d8h4").unwrap();
        assert!(p.legals(GenType::All).is_empty());
        assert!(p.checkers().is_nonempty());
        assert_eq!(
            p.calc_outcome(),
            Some(Outcome::Win {
                side: Color::Black,
                reason: WinReason::Checkmate
            })
        );

        let p = Position::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        assert!(p.legals(GenType::All).is_empty());
        assert!(p.checkers().is_empty());
        assert_eq!(p.calc_outcome(), Some(Outcome::Draw(DrawReason::Stalemate)));
    }

    #[test]
    fn test_state() {
        let p = Position::from_fen(KIWIPETE).unwrap();
        let state = p.state();
        let q = Position::from_state(state).unwrap();
        assert_eq!(q.hash(), p.hash());
        assert_eq!(q.fen(), KIWIPETE);
        assert_eq!(
            q.piece_on(Coord::from_parts(File::E, Rank::R5)),
            Cell::from_parts(Color::White, Piece::Knight)
        );
        assert_eq!(q.castling(), CastlingRights::FULL);
        assert!(q.is_capture(Move::from_uci("e5f7", q.board()).unwrap()));
        assert!(!q.is_capture(Move::from_uci("e1g1", q.board()).unwrap()));
    }
}
