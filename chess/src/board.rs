//! Board and related things

use crate::bitboard::Bitboard;
use crate::moves::{Make, Move, MoveKind};
use crate::types::{
    self, CastlingRights, CastlingSide, Cell, Color, Coord, DrawReason, File, Outcome, Piece, Rank,
    WinReason,
};
use crate::{attack, between, bitboard_consts, geometry, movegen, zobrist};

use std::fmt::{self, Display};
use std::hash::{Hash, Hasher};
use std::num::ParseIntError;
use std::str::FromStr;

use log::{debug, trace};
use thiserror::Error;

/// Board validation error
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum ValidateError {
    /// Invalid enpassant coordinate specified (i.e. it is located on an invalid rank)
    #[error("invalid enpassant position {0}")]
    InvalidEnpassant(Coord),
    /// Too many pieces of given color
    ///
    /// No more than 16 pieces of each color is allowed.
    #[error("too many pieces of color {0:?}")]
    TooManyPieces(Color),
    /// One of the sides has more than one king
    #[error("more than one king of color {0:?}")]
    TooManyKings(Color),
    /// There is a pawn on the 1th or on the 8th rank
    #[error("invalid pawn position {0}")]
    InvalidPawn(Coord),
    /// Opponent's king is under attack
    #[error("opponent's king is attacked")]
    OpponentKingAttacked,
}

/// Error parsing the first part of FEN (i.e. the positions of pieces on the board)
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum CellsParseError {
    /// Rank is too large
    #[error("too many items in rank {0}")]
    RankOverflow(Rank),
    /// Rank is too small
    #[error("not enough items in rank {0}")]
    RankUnderflow(Rank),
    /// Too many ranks
    #[error("too many ranks")]
    Overflow,
    /// Not enough ranks
    #[error("not enough ranks")]
    Underflow,
    /// Unexpected character
    #[error("unexpected char {0:?}")]
    UnexpectedChar(char),
}

/// Error parsing [`RawBoard`] from FEN
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum RawFenParseError {
    /// FEN contains non-ASCII characters
    #[error("non-ASCII data in FEN")]
    NonAscii,
    /// FEN doesn't have board part
    #[error("board not specified")]
    NoBoard,
    /// Error parsing board from FEN
    #[error("bad board: {0}")]
    Board(#[from] CellsParseError),
    /// FEN doesn't have move side part
    #[error("no move side")]
    NoMoveSide,
    /// Error parsing move side from FEN
    #[error("bad move side: {0}")]
    MoveSide(#[from] types::ColorParseError),
    /// FEN doesn't have castling rights part
    #[error("no castling rights")]
    NoCastling,
    /// Error parsing castling rights from FEN
    #[error("bad castling rights: {0}")]
    Castling(#[from] types::CastlingRightsParseError),
    /// FEN doesn't have enpassant part
    #[error("no enpassant")]
    NoEnpassant,
    /// Error parsing enpassant from FEN
    #[error("bad enpassant: {0}")]
    Enpassant(#[from] types::CoordParseError),
    /// Enpassant rank is invalid
    #[error("invalid enpassant rank {0}")]
    InvalidEnpassantRank(Rank),
    /// Error parsing move counter
    #[error("bad move counter: {0}")]
    MoveCounter(ParseIntError),
    /// Error parsing move number
    #[error("bad move number: {0}")]
    MoveNumber(ParseIntError),
    /// FEN contains extra data
    #[error("extra data in FEN")]
    ExtraData,
}

/// Error parsing [`Board`] from FEN
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum FenParseError {
    /// Board cannot be parsed
    #[error("cannot parse fen: {0}")]
    Fen(#[from] RawFenParseError),
    /// Board was parsed, but it's invalid
    #[error("invalid position: {0}")]
    Valid(#[from] ValidateError),
}

/// Raw chess board
///
/// Raw board contains all the necessary information about the chess position. But, unlike [`Board`],
/// it is not validated and may contain an invalid position.
///
/// Raw board can be used to build or edit the position programmatically. After changing the necessary
/// fields, it must be converted to [`Board`] via [`Board::try_from()`].
///
/// # Example
///
/// ```
/// # use ferrochess::{RawBoard, Board, File, Rank, Color, Piece, Cell, CastlingRights};
/// #
/// let mut raw = RawBoard {
///     cells: [Default::default(); 64],
///     side: Color::White,
///     castling: CastlingRights::EMPTY,
///     ep_square: None,
///     move_counter: 10,
///     move_number: 42,
/// };
/// raw.put2(File::B, Rank::R2, Cell::from_parts(Color::White, Piece::King));
/// raw.put2(File::D, Rank::R5, Cell::from_parts(Color::Black, Piece::King));
///
/// let board: Board = raw.try_into().unwrap();
/// assert_eq!(board.as_fen(), "8/8/8/3k4/8/8/1K6/8 w - - 10 42");
/// ```
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct RawBoard {
    /// Contents of the board
    ///
    /// The indices in this array are the indices of coordinates, so `cells[0]` is a1 and
    /// `cells[63]` is h8.
    pub cells: [Cell; 64],
    /// Side to move
    pub side: Color,
    /// Castling rights
    pub castling: CastlingRights,
    /// En passant target square
    ///
    /// This is the square passed over by the pawn which has just made a double move, i.e. the
    /// square where the capturing pawn lands.
    pub ep_square: Option<Coord>,
    /// Number of half-moves without pawn moves or captures
    pub move_counter: u16,
    /// Move number
    ///
    /// Note that this is move number, not half-move number. It is incremented after each
    /// move by Black.
    pub move_number: u16,
}

impl RawBoard {
    /// Returns an empty `RawBoard`
    ///
    /// Does the same as [`RawBoard::default()`], except that this function is `const`.
    #[inline]
    pub const fn empty() -> RawBoard {
        RawBoard {
            cells: [Cell::EMPTY; 64],
            side: Color::White,
            castling: CastlingRights::EMPTY,
            ep_square: None,
            move_counter: 0,
            move_number: 1,
        }
    }

    /// Returns a board with the initial position
    pub fn initial() -> RawBoard {
        let mut res = RawBoard {
            castling: CastlingRights::FULL,
            ..RawBoard::empty()
        };
        for file in File::iter() {
            res.put2(file, Rank::R2, Cell::from_parts(Color::White, Piece::Pawn));
            res.put2(file, Rank::R7, Cell::from_parts(Color::Black, Piece::Pawn));
        }
        for (color, rank) in [(Color::White, Rank::R1), (Color::Black, Rank::R8)] {
            res.put2(File::A, rank, Cell::from_parts(color, Piece::Rook));
            res.put2(File::B, rank, Cell::from_parts(color, Piece::Knight));
            res.put2(File::C, rank, Cell::from_parts(color, Piece::Bishop));
            res.put2(File::D, rank, Cell::from_parts(color, Piece::Queen));
            res.put2(File::E, rank, Cell::from_parts(color, Piece::King));
            res.put2(File::F, rank, Cell::from_parts(color, Piece::Bishop));
            res.put2(File::G, rank, Cell::from_parts(color, Piece::Knight));
            res.put2(File::H, rank, Cell::from_parts(color, Piece::Rook));
        }
        res
    }

    /// Parses a board from FEN
    ///
    /// Does the same as [`RawBoard::from_str`]. It is recommended to use this function instead of
    /// `from_str()` for better readability.
    #[inline]
    pub fn from_fen(fen: &str) -> Result<RawBoard, RawFenParseError> {
        RawBoard::from_str(fen)
    }

    /// Returns the contents of the square with coordinate `c`
    #[inline]
    pub fn get(&self, c: Coord) -> Cell {
        unsafe { *self.cells.get_unchecked(c.index()) }
    }

    /// Returns the contents of the square with file `file` and rank `rank`
    #[inline]
    pub fn get2(&self, file: File, rank: Rank) -> Cell {
        self.get(Coord::from_parts(file, rank))
    }

    /// Puts `cell` to the square with coordinate `c`
    #[inline]
    pub fn put(&mut self, c: Coord, cell: Cell) {
        unsafe {
            *self.cells.get_unchecked_mut(c.index()) = cell;
        }
    }

    /// Puts `cell` to the square with file `file` and rank `rank`
    #[inline]
    pub fn put2(&mut self, file: File, rank: Rank, cell: Cell) {
        self.put(Coord::from_parts(file, rank), cell);
    }

    /// Computes Zobrist hash of the board from scratch
    ///
    /// Note that Zobrist hash doesn't contain move counter and move number, so it can be used
    /// to detect draw by repetitions.
    ///
    /// By contrast, implementation of [`Hash`] trait includes move counter and move number into
    /// the hash.
    pub fn zobrist_hash(&self) -> u64 {
        let mut hash = match self.side {
            Color::White => zobrist::MOVE_SIDE,
            Color::Black => 0,
        };
        if let Some(p) = self.ep_square {
            hash ^= zobrist::enpassant(p.file());
        }
        hash ^= zobrist::castling(self.castling);
        for (i, cell) in self.cells.iter().enumerate() {
            if cell.is_occupied() {
                hash ^= zobrist::pieces(*cell, Coord::from_index(i));
            }
        }
        hash
    }

    /// Returns the square of the pawn which can be captured en passant
    #[inline]
    pub fn ep_source(&self) -> Option<Coord> {
        let p = self.ep_square?;
        Some(Coord::from_parts(
            p.file(),
            geometry::enpassant_src_rank(self.side),
        ))
    }

    /// Converts the board into a FEN string
    ///
    /// Does the same as `RawBoard::to_string()`. It is recommended to use this function instead of
    /// `to_string()` for better readability.
    #[inline]
    pub fn as_fen(&self) -> String {
        self.to_string()
    }
}

impl Default for RawBoard {
    #[inline]
    fn default() -> RawBoard {
        RawBoard::empty()
    }
}

/// Board that contains a valid position
///
/// This board always contains a valid chess position. It is used for literally every chess operation:
/// move generation, making and validating moves, verifying for check and checkmate.
///
/// It contains a [`RawBoard`] alongside with bitboards, the incrementally updated Zobrist hash and
/// a few masks derived from the position (checkers, check mask, pins and squares attacked by the
/// opponent). The masks are always computed for the side to move and are refreshed after every
/// change, so the board is a plain value which can be freely copied.
///
/// A board may lack the king of some color. Such boards are useful for setting up test positions,
/// but the game cannot end in a checkmate on them.
#[derive(Debug, Copy, Clone)]
pub struct Board {
    pub(crate) r: RawBoard,
    pub(crate) hash: u64,
    pub(crate) colors: [Bitboard; Color::COUNT],
    pub(crate) all: Bitboard,
    pub(crate) pieces: [Bitboard; Cell::COUNT],
    pub(crate) last_move: Move,
    pub(crate) checkers: Bitboard,
    pub(crate) check_mask: Bitboard,
    pub(crate) pin_diag: Bitboard,
    pub(crate) pin_line: Bitboard,
    pub(crate) seen: Bitboard,
}

impl Board {
    /// Returns a board with the initial position
    pub fn initial() -> Board {
        RawBoard::initial().try_into().unwrap()
    }

    /// Parses a board from FEN
    ///
    /// Does the same as [`Board::from_str`]. It is recommended to use this function instead of
    /// `from_str()` for better readability.
    pub fn from_fen(fen: &str) -> Result<Board, FenParseError> {
        Board::from_str(fen)
    }

    /// Returns a view over the raw board
    #[inline]
    pub fn raw(&self) -> &RawBoard {
        &self.r
    }

    /// Returns the contents of the square with coordinate `c`
    #[inline]
    pub fn get(&self, c: Coord) -> Cell {
        self.r.get(c)
    }

    /// Returns the contents of the square with file `file` and rank `rank`
    #[inline]
    pub fn get2(&self, file: File, rank: Rank) -> Cell {
        self.r.get2(file, rank)
    }

    /// Returns side to move
    #[inline]
    pub fn side(&self) -> Color {
        self.r.side
    }

    /// Returns current castling rights
    #[inline]
    pub fn castling(&self) -> CastlingRights {
        self.r.castling
    }

    /// Returns the en passant target square
    ///
    /// The square is present only if some pawn of the side to move stands next to the pawn which
    /// has just made a double move.
    #[inline]
    pub fn ep_square(&self) -> Option<Coord> {
        self.r.ep_square
    }

    /// Returns the bitboard over all the pieces with color `c`
    #[inline]
    pub fn color(&self, c: Color) -> Bitboard {
        unsafe { *self.colors.get_unchecked(c.index()) }
    }

    /// Returns the bitboard over all the pieces on the board
    #[inline]
    pub fn occupied(&self) -> Bitboard {
        self.all
    }

    /// Returns the bitboard over all the cells equal to `c`
    ///
    /// **Note**: when `c` is an empty cell, the function just returns an empty bitboard,
    /// not the bitboard over all the empty cells.
    #[inline]
    pub fn piece(&self, c: Cell) -> Bitboard {
        unsafe { *self.pieces.get_unchecked(c.index()) }
    }

    /// Returns the bitboard over all the pieces of color `c` and kind `p`
    #[inline]
    pub fn piece2(&self, c: Color, p: Piece) -> Bitboard {
        self.piece(Cell::from_parts(c, p))
    }

    #[inline]
    pub(crate) fn piece_diag(&self, c: Color) -> Bitboard {
        self.piece2(c, Piece::Bishop) | self.piece2(c, Piece::Queen)
    }

    #[inline]
    pub(crate) fn piece_line(&self, c: Color) -> Bitboard {
        self.piece2(c, Piece::Rook) | self.piece2(c, Piece::Queen)
    }

    /// Returns the position of the king of color `c`, if there is any
    #[inline]
    pub fn king_pos(&self, c: Color) -> Option<Coord> {
        self.piece2(c, Piece::King).first()
    }

    /// Returns the Zobrist hash of the position
    ///
    /// Unlike [`RawBoard::zobrist_hash`], this function just returns the incrementally updated
    /// value and doesn't try to recalculate the hash from scratch.
    #[inline]
    pub fn zobrist_hash(&self) -> u64 {
        self.hash
    }

    /// Returns the move which led to this position
    ///
    /// It is equal to [`Move::NONE`] if the board was not obtained by making a move.
    #[inline]
    pub fn last_move(&self) -> Move {
        self.last_move
    }

    /// Returns all the pieces that give check currently
    #[inline]
    pub fn checkers(&self) -> Bitboard {
        self.checkers
    }

    /// Returns the squares where a piece other than king must move to resolve the check
    ///
    /// All the squares are allowed when there is no check, and no squares are allowed in case
    /// of double check.
    #[inline]
    pub fn check_mask(&self) -> Bitboard {
        self.check_mask
    }

    /// Returns the union of diagonal pin lines (including the pinning pieces)
    #[inline]
    pub fn pin_diag(&self) -> Bitboard {
        self.pin_diag
    }

    /// Returns the union of horizontal and vertical pin lines (including the pinning pieces)
    #[inline]
    pub fn pin_line(&self) -> Bitboard {
        self.pin_line
    }

    /// Returns all the pinned pieces of the side to move
    #[inline]
    pub fn pinned(&self) -> Bitboard {
        (self.pin_diag | self.pin_line) & self.color(self.r.side)
    }

    /// Returns the squares attacked by the opponent, as if the king of the side to move was
    /// absent from the board
    #[inline]
    pub fn seen(&self) -> Bitboard {
        self.seen
    }

    /// Returns `true` if the current side is in check
    #[inline]
    pub fn is_check(&self) -> bool {
        self.checkers.is_nonempty()
    }

    /// Returns `true` if the move captures a piece, including en passant
    ///
    /// Castling is never a capture, though it is encoded as the king moving onto its own rook.
    #[inline]
    pub fn is_capture(&self, mv: Move) -> bool {
        match mv.kind() {
            MoveKind::Enpassant => true,
            MoveKind::Castling => false,
            MoveKind::Normal | MoveKind::Promotion => self.get(mv.dst()).is_occupied(),
        }
    }

    /// Convenience alias for [`moves::Make::make`](crate::moves::Make::make)
    pub fn make_move<M: Make>(&self, m: M) -> Result<Self, M::Err> {
        m.make(self)
    }

    /// Returns `true` if the current side has at least one legal move
    #[inline]
    pub fn has_legal_moves(&self) -> bool {
        movegen::has_legal_moves(self)
    }

    #[inline]
    pub(crate) fn toggle_piece(&mut self, cell: Cell, c: Coord) {
        let bb = Bitboard::from_coord(c);
        unsafe {
            *self.pieces.get_unchecked_mut(cell.index()) ^= bb;
        }
        if let Some(color) = cell.color() {
            self.colors[color.index()] ^= bb;
        }
        self.hash ^= zobrist::pieces(cell, c);
    }

    fn attacked_by(&self, c: Color, occupied: Bitboard) -> Bitboard {
        let mut res = attack::pawns(c, self.piece2(c, Piece::Pawn))
            | attack::knights(self.piece2(c, Piece::Knight));
        for src in self.piece_diag(c) {
            res |= attack::bishop(src, occupied);
        }
        for src in self.piece_line(c) {
            res |= attack::rook(src, occupied);
        }
        if let Some(king) = self.king_pos(c) {
            res |= attack::king(king);
        }
        res
    }

    /// Recomputes all the derived masks for the current side to move
    pub(crate) fn update_caches(&mut self) {
        let us = self.r.side;
        let them = us.inv();
        let our_king = self.piece2(us, Piece::King);
        self.all = self.colors[0] | self.colors[1];
        self.seen = self.attacked_by(them, self.all ^ our_king);
        self.checkers = Bitboard::EMPTY;
        self.check_mask = bitboard_consts::FULL;
        self.pin_diag = Bitboard::EMPTY;
        self.pin_line = Bitboard::EMPTY;

        let king = match our_king.first() {
            Some(king) => king,
            None => return,
        };

        self.checkers = movegen::cell_attackers(self, king, them);
        self.check_mask = match self.checkers.len() {
            0 => bitboard_consts::FULL,
            1 => {
                let checker = unsafe { self.checkers.first().unwrap_unchecked() };
                between::strict(king, checker) | self.checkers
            }
            _ => Bitboard::EMPTY,
        };

        let own = self.color(us);
        let enemy = self.color(them);
        for sniper in attack::bishop(king, enemy) & self.piece_diag(them) {
            let line = between::strict(king, sniper).with(sniper);
            if (line & own).len() == 1 {
                self.pin_diag |= line;
            }
        }
        for sniper in attack::rook(king, enemy) & self.piece_line(them) {
            let line = between::strict(king, sniper).with(sniper);
            if (line & own).len() == 1 {
                self.pin_line |= line;
            }
        }
    }

    /// Verifies that all the incrementally updated data agrees with the one computed from scratch
    ///
    /// # Panics
    ///
    /// Panics if the board is inconsistent. This must never happen unless an illegal move was
    /// applied.
    pub fn self_check(&self) {
        let fresh = match Board::try_from(self.r) {
            Ok(b) => b,
            Err(e) => panic!("board {} is invalid: {}", self.r, e),
        };
        assert_eq!(fresh.r, self.r);
        assert_eq!(fresh.hash, self.hash, "hash mismatch on {}", self.r);
        assert_eq!(fresh.colors, self.colors);
        assert_eq!(fresh.all, self.all);
        assert_eq!(fresh.pieces, self.pieces);
        assert_eq!(fresh.checkers, self.checkers);
        assert_eq!(fresh.check_mask, self.check_mask);
        assert_eq!(fresh.pin_diag, self.pin_diag);
        assert_eq!(fresh.pin_line, self.pin_line);
        assert_eq!(fresh.seen, self.seen);
    }

    /// Returns `true` if the position is guaranteed to be drawn because of insufficient material, regardless
    /// of the players' moves
    ///
    /// Currently, such positions include:
    ///
    /// - king vs king
    /// - king + single minor piece vs king
    /// - kings and bishops of the same color
    ///
    /// Note that king + knight vs king + knight is not considered a draw, as one of the sides can intentionally
    /// corner itself, allowing its opponent to win.
    pub fn is_insufficient_material(&self) -> bool {
        let all_without_kings = self.all
            ^ (self.piece2(Color::White, Piece::King) | self.piece2(Color::Black, Piece::King));

        // If we have pieces on both white and black squares, then no draw occurs. This cutoff
        // optimizes the function in most positions.
        if (all_without_kings & bitboard_consts::CELLS_WHITE).is_nonempty()
            && (all_without_kings & bitboard_consts::CELLS_BLACK).is_nonempty()
        {
            return false;
        }

        // Two kings only
        if all_without_kings.is_empty() {
            return true;
        }

        // King vs king + knight
        let knights =
            self.piece2(Color::White, Piece::Knight) | self.piece2(Color::Black, Piece::Knight);
        if all_without_kings == knights && knights.len() == 1 {
            return true;
        }

        // Kings and bishops of the same cell color. Note that we checked above that all the pieces
        // have the same cell color, so we just need to ensure that all the pieces are bishops.
        let bishops =
            self.piece2(Color::White, Piece::Bishop) | self.piece2(Color::Black, Piece::Bishop);
        all_without_kings == bishops
    }

    /// Calculates the current outcome on the board
    ///
    /// This function ignores draws by repetition, as [`Board`] doesn't remember the previous
    /// positions. Use [`Position::calc_outcome()`](crate::position::Position::calc_outcome) to
    /// consider such draws.
    ///
    /// Checkmate and stalemate take precedence over all the other outcomes.
    #[inline]
    pub fn calc_outcome(&self) -> Option<Outcome> {
        if !self.has_legal_moves() {
            return if self.is_check() {
                Some(Outcome::Win {
                    side: self.r.side.inv(),
                    reason: WinReason::Checkmate,
                })
            } else {
                Some(Outcome::Draw(DrawReason::Stalemate))
            };
        }

        self.calc_draw_simple().map(Outcome::Draw)
    }

    /// Calculates the current outcome on the board, considering only draws by insufficient material
    /// and by the 50 move rule
    #[inline]
    pub fn calc_draw_simple(&self) -> Option<DrawReason> {
        if self.is_insufficient_material() {
            return Some(DrawReason::InsufficientMaterial);
        }
        if self.r.move_counter >= 100 {
            return Some(DrawReason::Moves50);
        }
        None
    }

    /// Converts the board into a FEN string
    ///
    /// Does the same as `Board::to_string()`. It is recommended to use this function instead of
    /// `to_string()` for better readability.
    #[inline]
    pub fn as_fen(&self) -> String {
        self.to_string()
    }
}

impl PartialEq for Board {
    #[inline]
    fn eq(&self, other: &Board) -> bool {
        self.r == other.r
    }
}

impl Eq for Board {}

impl Hash for Board {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.r.hash(state)
    }
}

fn fix_enpassant(raw: &mut RawBoard) -> Result<(), ValidateError> {
    let p = match raw.ep_square {
        Some(p) => p,
        None => return Ok(()),
    };
    if p.rank() != geometry::enpassant_dst_rank(raw.side) {
        return Err(ValidateError::InvalidEnpassant(p));
    }

    let fwd = geometry::pawn_forward_delta(raw.side);
    let pawn = p.add(-fwd);
    let src = p.add(fwd);
    let our_pawn = Cell::from_parts(raw.side, Piece::Pawn);
    let has_capturer = attack::pawn(raw.side.inv(), p)
        .into_iter()
        .any(|c| raw.get(c) == our_pawn);
    if raw.get(pawn) != Cell::from_parts(raw.side.inv(), Piece::Pawn)
        || raw.get(p).is_occupied()
        || raw.get(src).is_occupied()
        || !has_capturer
    {
        debug!("dropping en passant square {} as nothing can capture", p);
        raw.ep_square = None;
    }
    Ok(())
}

fn fix_castling(raw: &mut RawBoard) {
    let before = raw.castling;
    for color in [Color::White, Color::Black] {
        let rank = geometry::castling_rank(color);
        if raw.get2(File::E, rank) != Cell::from_parts(color, Piece::King) {
            raw.castling.unset_color(color);
        }
        if raw.get2(File::A, rank) != Cell::from_parts(color, Piece::Rook) {
            raw.castling.unset(color, CastlingSide::Queen);
        }
        if raw.get2(File::H, rank) != Cell::from_parts(color, Piece::Rook) {
            raw.castling.unset(color, CastlingSide::King);
        }
    }
    if raw.castling != before {
        debug!(
            "dropping castling rights {} -> {} as the pieces are not in place",
            before, raw.castling
        );
    }
}

impl TryFrom<RawBoard> for Board {
    type Error = ValidateError;

    fn try_from(mut raw: RawBoard) -> Result<Board, ValidateError> {
        fix_enpassant(&mut raw)?;
        fix_castling(&mut raw);

        // Calculate bitboards
        let mut colors = [Bitboard::EMPTY; Color::COUNT];
        let mut pieces = [Bitboard::EMPTY; Cell::COUNT];
        for (idx, cell) in raw.cells.iter().enumerate() {
            let coord = Coord::from_index(idx);
            if let Some(color) = cell.color() {
                colors[color.index()].set(coord);
                pieces[cell.index()].set(coord);
            }
        }

        // Check TooManyPieces, TooManyKings
        for color in [Color::White, Color::Black] {
            if colors[color.index()].len() > 16 {
                return Err(ValidateError::TooManyPieces(color));
            }
            if pieces[Cell::from_parts(color, Piece::King).index()].len() > 1 {
                return Err(ValidateError::TooManyKings(color));
            }
        }

        // Check InvalidPawn
        let pawns = pieces[Cell::from_parts(Color::White, Piece::Pawn).index()]
            | pieces[Cell::from_parts(Color::Black, Piece::Pawn).index()];
        const BAD_PAWN_POSES: Bitboard = Bitboard::from_raw(0xff000000000000ff);
        if let Some(bad) = (pawns & BAD_PAWN_POSES).first() {
            return Err(ValidateError::InvalidPawn(bad));
        }

        let mut res = Board {
            r: raw,
            hash: raw.zobrist_hash(),
            colors,
            all: colors[0] | colors[1],
            pieces,
            last_move: Move::NONE,
            checkers: Bitboard::EMPTY,
            check_mask: bitboard_consts::FULL,
            pin_diag: Bitboard::EMPTY,
            pin_line: Bitboard::EMPTY,
            seen: Bitboard::EMPTY,
        };

        // Check OpponentKingAttacked
        if let Some(king) = res.king_pos(raw.side.inv()) {
            if movegen::is_cell_attacked(&res, king, raw.side) {
                return Err(ValidateError::OpponentKingAttacked);
            }
        }

        res.update_caches();
        trace!("validated board {}", res.r);
        Ok(res)
    }
}

impl TryFrom<&RawBoard> for Board {
    type Error = ValidateError;

    fn try_from(raw: &RawBoard) -> Result<Board, ValidateError> {
        (*raw).try_into()
    }
}

// FEN lists rank 8 first
#[inline]
fn rank_from_top(row: usize) -> Rank {
    Rank::from_index(7 - row)
}

fn parse_cells(s: &str) -> Result<[Cell; 64], CellsParseError> {
    type Error = CellsParseError;

    let mut file = 0_usize;
    let mut row = 0_usize;
    let mut cells = [Cell::EMPTY; 64];
    for b in s.bytes() {
        match b {
            b'1'..=b'8' => {
                let add = (b - b'0') as usize;
                if file + add > 8 {
                    return Err(Error::RankOverflow(rank_from_top(row)));
                }
                file += add;
            }
            b'/' => {
                if file < 8 {
                    return Err(Error::RankUnderflow(rank_from_top(row)));
                }
                row += 1;
                file = 0;
                if row >= 8 {
                    return Err(Error::Overflow);
                }
            }
            _ => {
                if file >= 8 {
                    return Err(Error::RankOverflow(rank_from_top(row)));
                }
                let cell = match Cell::from_char(b as char) {
                    Some(cell) if cell.is_occupied() => cell,
                    _ => return Err(Error::UnexpectedChar(b as char)),
                };
                cells[(7 - row) * 8 + file] = cell;
                file += 1;
            }
        };
    }

    if file < 8 {
        return Err(Error::RankUnderflow(rank_from_top(row)));
    }
    if row < 7 {
        return Err(Error::Underflow);
    }

    Ok(cells)
}

fn parse_ep_square(s: &str, side: Color) -> Result<Option<Coord>, RawFenParseError> {
    if s == "-" {
        return Ok(None);
    }
    let enpassant = Coord::from_str(s)?;
    if enpassant.rank() != geometry::enpassant_dst_rank(side) {
        return Err(RawFenParseError::InvalidEnpassantRank(enpassant.rank()));
    }
    Ok(Some(enpassant))
}

impl FromStr for RawBoard {
    type Err = RawFenParseError;

    fn from_str(s: &str) -> Result<RawBoard, Self::Err> {
        type Error = RawFenParseError;

        if !s.is_ascii() {
            return Err(Error::NonAscii);
        }
        let mut iter = s.split(' ').fuse();

        let cells = parse_cells(iter.next().ok_or(Error::NoBoard)?)?;
        let side = Color::from_str(iter.next().ok_or(Error::NoMoveSide)?)?;
        let castling = CastlingRights::from_str(iter.next().ok_or(Error::NoCastling)?)?;
        let ep_square = parse_ep_square(iter.next().ok_or(Error::NoEnpassant)?, side)?;
        let move_counter = match iter.next() {
            Some(s) => u16::from_str(s).map_err(Error::MoveCounter)?,
            None => 0,
        };
        let move_number = match iter.next() {
            Some(s) => u16::from_str(s).map_err(Error::MoveNumber)?,
            None => 1,
        };

        if iter.next().is_some() {
            return Err(Error::ExtraData);
        }

        Ok(RawBoard {
            cells,
            side,
            castling,
            ep_square,
            move_counter,
            move_number,
        })
    }
}

impl FromStr for Board {
    type Err = FenParseError;

    fn from_str(s: &str) -> Result<Board, Self::Err> {
        Ok(RawBoard::from_str(s)?.try_into()?)
    }
}

fn format_cells(cells: &[Cell; 64], f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
    for row in 0..8 {
        if row != 0 {
            write!(f, "/")?;
        }
        let rank = rank_from_top(row);
        let mut empty = 0;
        for file in File::iter() {
            let cell = cells[Coord::from_parts(file, rank).index()];
            if cell.is_empty() {
                empty += 1;
                continue;
            }
            if empty != 0 {
                write!(f, "{}", (b'0' + empty) as char)?;
                empty = 0;
            }
            write!(f, "{}", cell)?;
        }
        if empty != 0 {
            write!(f, "{}", (b'0' + empty) as char)?;
        }
    }
    Ok(())
}

impl Display for RawBoard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        format_cells(&self.cells, f)?;
        write!(f, " {} {}", self.side, self.castling)?;
        match self.ep_square {
            Some(p) => write!(f, " {}", p)?,
            None => write!(f, " -")?,
        };
        write!(f, " {} {}", self.move_counter, self.move_number)?;
        Ok(())
    }
}

impl Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        self.r.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::make::Uci;
    use crate::types::{DrawReason, Outcome, WinReason};
    use std::mem;

    #[test]
    fn test_size() {
        assert_eq!(mem::size_of::<RawBoard>(), 72);
    }

    #[test]
    fn test_initial() {
        const INI_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

        assert_eq!(RawBoard::initial().to_string(), INI_FEN);
        assert_eq!(Board::initial().to_string(), INI_FEN);
        assert_eq!(RawBoard::from_str(INI_FEN), Ok(RawBoard::initial()));
        assert_eq!(Board::from_str(INI_FEN), Ok(Board::initial()));

        let b = Board::initial();
        assert_eq!(
            b.get(Coord::from_index(0)),
            Cell::from_parts(Color::White, Piece::Rook)
        );
        assert_eq!(
            b.get(Coord::from_index(60)),
            Cell::from_parts(Color::Black, Piece::King)
        );
        assert_eq!(b.color(Color::White).as_raw(), 0xffff);
        assert_eq!(b.color(Color::Black).as_raw(), 0xffff << 48);
        assert_eq!(b.checkers(), Bitboard::EMPTY);
        assert_eq!(b.check_mask(), bitboard_consts::FULL);
        assert_eq!(b.pinned(), Bitboard::EMPTY);
        assert_eq!(b.last_move(), Move::NONE);
        assert_eq!(b.zobrist_hash(), b.raw().zobrist_hash());
        assert_eq!(
            b.seen(),
            bitboard_consts::rank(Rank::R6)
                | bitboard_consts::rank(Rank::R7)
                | (bitboard_consts::rank(Rank::R8) & !Bitboard::from_raw(0x8100000000000000))
        );
        b.self_check();
    }

    #[test]
    fn test_midgame() {
        const FEN: &str = "1rq1r1k1/1p3ppp/pB3n2/3ppP2/Pbb1P3/1PN2B2/2P2QPP/R1R4K w - - 1 21";

        let board = Board::from_fen(FEN).unwrap();
        assert_eq!(board.as_fen(), FEN);
        assert_eq!(
            board.get2(File::B, Rank::R4),
            Cell::from_parts(Color::Black, Piece::Bishop)
        );
        assert_eq!(
            board.get2(File::F, Rank::R2),
            Cell::from_parts(Color::White, Piece::Queen)
        );
        assert_eq!(
            board.king_pos(Color::White),
            Some(Coord::from_parts(File::H, Rank::R1))
        );
        assert_eq!(
            board.king_pos(Color::Black),
            Some(Coord::from_parts(File::G, Rank::R8))
        );
        assert_eq!(board.side(), Color::White);
        assert_eq!(board.castling(), CastlingRights::EMPTY);
        assert_eq!(board.ep_square(), None);
        assert_eq!(board.raw().move_counter, 1);
        assert_eq!(board.raw().move_number, 21);
    }

    #[test]
    fn test_fixes() {
        const FEN: &str = "r1bq1b1r/ppppkppp/2n2n2/4p3/2B1P3/5N2/PPPP1PPP/RNBQK1R1 w KQkq c6 6 5";

        let raw = RawBoard::from_fen(FEN).unwrap();
        assert_eq!(raw.castling, CastlingRights::FULL);
        assert_eq!(raw.ep_square, Some(Coord::from_parts(File::C, Rank::R6)));
        assert_eq!(raw.ep_source(), Some(Coord::from_parts(File::C, Rank::R5)));
        assert_eq!(raw.as_fen(), FEN);

        let board: Board = raw.try_into().unwrap();
        assert_eq!(
            board.castling(),
            CastlingRights::EMPTY.with(Color::White, CastlingSide::Queen)
        );
        assert_eq!(board.ep_square(), None);
        assert_eq!(
            board.as_fen(),
            "r1bq1b1r/ppppkppp/2n2n2/4p3/2B1P3/5N2/PPPP1PPP/RNBQK1R1 w Q - 6 5"
        );
        assert_eq!(board.zobrist_hash(), board.raw().zobrist_hash());
    }

    #[test]
    fn test_enpassant_kept() {
        const FEN: &str = "rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3";
        let board = Board::from_fen(FEN).unwrap();
        assert_eq!(board.ep_square(), Some(Coord::from_parts(File::F, Rank::R6)));
        assert_eq!(board.as_fen(), FEN);

        assert_eq!(
            RawBoard::from_fen("rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f3 0 3"),
            Err(RawFenParseError::InvalidEnpassantRank(Rank::R3))
        );

        let mut raw = RawBoard::from_fen(FEN).unwrap();
        raw.ep_square = Some(Coord::from_parts(File::F, Rank::R3));
        assert_eq!(
            Board::try_from(raw),
            Err(ValidateError::InvalidEnpassant(Coord::from_parts(
                File::F,
                Rank::R3
            )))
        );
    }

    #[test]
    fn test_invalid() {
        assert_eq!(
            Board::from_fen("8/8/8/8/8/8/8/Kk6 w - - 0 1"),
            Err(FenParseError::Valid(ValidateError::OpponentKingAttacked))
        );
        assert_eq!(
            Board::from_fen("4k3/8/8/8/8/8/8/KK6 w - - 0 1"),
            Err(FenParseError::Valid(ValidateError::TooManyKings(
                Color::White
            )))
        );
        assert_eq!(
            Board::from_fen("P3k3/8/8/8/8/8/8/K7 w - - 0 1"),
            Err(FenParseError::Valid(ValidateError::InvalidPawn(
                Coord::from_parts(File::A, Rank::R8)
            )))
        );
        assert_eq!(
            Board::from_fen("4k3/8/8/8/PPPPPPPP/PPPPPPPP/PPPPPPPP/K7 w - - 0 1"),
            Err(FenParseError::Valid(ValidateError::TooManyPieces(
                Color::White
            )))
        );
        assert_eq!(
            RawBoard::from_fen("4k3/8/8/8/8/8/8/K6 w - - 0 1"),
            Err(RawFenParseError::Board(CellsParseError::RankUnderflow(
                Rank::R1
            )))
        );
        assert_eq!(
            RawBoard::from_fen("4k3/9/8/8/8/8/8/K7 w - - 0 1"),
            Err(RawFenParseError::Board(CellsParseError::UnexpectedChar('9')))
        );
        assert_eq!(
            RawBoard::from_fen("4k3/8/8/8/8/8/K7 w - - 0 1"),
            Err(RawFenParseError::Board(CellsParseError::Underflow))
        );
        assert_eq!(
            RawBoard::from_fen("4k3/8/8/8/8/8/8/K7 w - - 0 1 x"),
            Err(RawFenParseError::ExtraData)
        );
    }

    #[test]
    fn test_kingless() {
        let b = Board::from_fen("8/8/8/3r4/8/8/8/8 w - - 0 1").unwrap();
        assert_eq!(b.king_pos(Color::White), None);
        assert_eq!(b.checkers(), Bitboard::EMPTY);
        assert_eq!(b.check_mask(), bitboard_consts::FULL);
        assert!(!b.has_legal_moves());
        assert_eq!(b.calc_outcome(), Some(Outcome::Draw(DrawReason::Stalemate)));
    }

    #[test]
    fn test_caches() {
        let b = Board::from_fen("4r1k1/8/8/8/1b6/8/3N4/4K3 w - - 0 1").unwrap();
        let e1 = Coord::from_parts(File::E, Rank::R1);
        let e8 = Coord::from_parts(File::E, Rank::R8);
        assert_eq!(b.checkers(), Bitboard::from_coord(e8));
        assert_eq!(b.check_mask(), between::strict(e1, e8).with(e8));
        assert_eq!(
            b.pin_diag(),
            Bitboard::EMPTY
                .with2(File::D, Rank::R2)
                .with2(File::C, Rank::R3)
                .with2(File::B, Rank::R4)
        );
        assert_eq!(b.pin_line(), Bitboard::EMPTY);
        assert_eq!(b.pinned(), Bitboard::EMPTY.with2(File::D, Rank::R2));
        assert!(b.seen().has(e1));
        assert!(b.seen().has(Coord::from_parts(File::E, Rank::R2)));
        assert!(b.seen().has(Coord::from_parts(File::D, Rank::R2)));
        assert!(!b.seen().has(Coord::from_parts(File::D, Rank::R1)));

        let b = Board::from_fen("4k3/8/8/8/1b6/8/8/r3K2N w - - 0 1").unwrap();
        assert_eq!(b.checkers().len(), 2);
        assert_eq!(b.check_mask(), Bitboard::EMPTY);
    }

    #[test]
    fn test_seen() {
        let b = Board::initial();
        for c in Coord::iter() {
            let expected = match c.rank() {
                Rank::R6 | Rank::R7 => true,
                Rank::R8 => c.file() != File::A && c.file() != File::H,
                _ => false,
            };
            assert_eq!(b.seen().has(c), expected, "{}", c);
        }

        // After a move the mask describes the attacks of the new opponent
        let b = b.make_move(Uci("e2e4")).unwrap();
        assert_eq!(b.side(), Color::Black);
        for c in Coord::iter() {
            assert_eq!(b.seen().has(c), movegen::is_cell_attacked(&b, c, Color::White));
        }
        assert!(b.seen().has(Coord::from_parts(File::D, Rank::R5)));
        assert!(b.seen().has(Coord::from_parts(File::H, Rank::R5)));
        assert!(!b.seen().has(Coord::from_parts(File::E, Rank::R5)));

        // Squares behind the king on a checking line count as attacked
        let b = Board::from_fen("k7/8/8/8/8/8/8/r3K3 w - - 0 1").unwrap();
        assert!(b.is_check());
        assert!(b.seen().has(Coord::from_parts(File::F, Rank::R1)));
        assert!(!movegen::is_cell_attacked(&b, Coord::from_parts(File::F, Rank::R1), Color::Black));
    }

    #[test]
    fn test_draw_simple() {
        assert_eq!(Board::initial().calc_draw_simple(), None);

        let b = Board::from_fen("7K/8/5n2/8/8/8/7k/8 w - - 0 1").unwrap();
        assert_eq!(
            b.calc_draw_simple(),
            Some(DrawReason::InsufficientMaterial)
        );

        let b = Board::from_fen("NNK4k/8/8/8/8/8/8/8 w - - 100 80").unwrap();
        assert_eq!(b.calc_draw_simple(), Some(DrawReason::Moves50));

        // Mate and stalemate are not considered here
        let b = Board::from_fen("7K/8/5n2/5n2/8/8/7k/8 w - - 0 1").unwrap();
        assert!(!b.has_legal_moves());
        assert_eq!(b.calc_draw_simple(), None);
        let b = Board::from_fen("R5k1/5ppp/8/8/8/8/8/6K1 b - - 120 70").unwrap();
        assert!(!b.has_legal_moves());
        assert_eq!(b.calc_draw_simple(), Some(DrawReason::Moves50));
        assert_eq!(
            b.calc_outcome(),
            Some(Outcome::Win {
                side: Color::White,
                reason: WinReason::Checkmate
            })
        );
    }

    #[test]
    fn test_incomplete() {
        assert_eq!(
            RawBoard::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR"),
            Err(RawFenParseError::NoMoveSide)
        );

        assert_eq!(
            RawBoard::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w"),
            Err(RawFenParseError::NoCastling)
        );

        assert_eq!(
            RawBoard::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq"),
            Err(RawFenParseError::NoEnpassant)
        );

        let raw =
            RawBoard::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq -").unwrap();
        assert_eq!(raw.move_counter, 0);
        assert_eq!(raw.move_number, 1);

        let raw =
            RawBoard::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 10").unwrap();
        assert_eq!(raw.move_counter, 10);
        assert_eq!(raw.move_number, 1);
    }

    #[test]
    fn test_outcome() {
        let b = Board::initial();
        assert_eq!(b.calc_outcome(), None);

        let b = Board::from_fen("rn1qkbnr/ppp2B1p/3p2p1/4N3/4P3/2N5/PPPP1PPP/R1BbK2R b KQkq - 0 6")
            .unwrap();
        assert_eq!(b.calc_outcome(), None);

        let b = Board::from_fen("rn1q1bnr/ppp1kB1p/3p2p1/3NN3/4P3/8/PPPP1PPP/R1BbK2R b KQ - 2 7")
            .unwrap();
        assert!(!b.has_legal_moves());
        assert!(b.is_check());
        assert_eq!(
            b.calc_outcome(),
            Some(Outcome::Win {
                side: Color::White,
                reason: WinReason::Checkmate
            })
        );

        let b = Board::from_fen("7K/8/5n2/5n2/8/8/7k/8 w - - 0 1").unwrap();
        assert!(!b.has_legal_moves());
        assert!(!b.is_check());
        assert_eq!(b.calc_outcome(), Some(Outcome::Draw(DrawReason::Stalemate)));

        let b = Board::from_fen("7K/8/5n2/8/8/8/7k/8 w - - 0 1").unwrap();
        assert_eq!(
            b.calc_outcome(),
            Some(Outcome::Draw(DrawReason::InsufficientMaterial))
        );

        let b = Board::from_fen("7K/8/5b2/8/8/8/7k/8 w - - 0 1").unwrap();
        assert_eq!(
            b.calc_outcome(),
            Some(Outcome::Draw(DrawReason::InsufficientMaterial))
        );

        let b = Board::from_fen("2K4k/8/8/8/B1B5/1B1B4/B1B5/1B1B4 w - - 0 1").unwrap();
        assert_eq!(
            b.calc_outcome(),
            Some(Outcome::Draw(DrawReason::InsufficientMaterial))
        );

        let b = Board::from_fen("BBK4k/8/8/8/8/8/8/8 w - - 0 1").unwrap();
        assert_eq!(b.calc_outcome(), None);

        let b = Board::from_fen("NNK4k/8/8/8/8/8/8/8 w - - 0 1").unwrap();
        assert_eq!(b.calc_outcome(), None);

        let b = Board::from_fen("NNK4k/8/8/8/8/8/8/8 w - - 99 80").unwrap();
        assert_eq!(b.calc_outcome(), None);

        let b = Board::from_fen("NNK4k/8/8/8/8/8/8/8 w - - 100 80").unwrap();
        assert_eq!(b.calc_outcome(), Some(Outcome::Draw(DrawReason::Moves50)));

        let b = Board::from_fen("NNK4k/8/8/8/8/8/8/8 w - - 150 90").unwrap();
        assert_eq!(b.calc_outcome(), Some(Outcome::Draw(DrawReason::Moves50)));
    }
}
