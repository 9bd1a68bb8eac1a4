//! Standard algebraic notation (SAN) and coordinate notation helpers.
//!
//! SAN is what the search prints in priors and principal variations; parsing
//! accepts either SAN (`Nf3`, `exd5`, `O-O`, `e8=Q+`) or coordinate notation
//! (`g1f3`, `e7e8q`) and always resolves against the legal moves of the board.

use chess::{Board, BoardStatus, ChessMove, MoveGen, Piece, Square};

/// Render a legal move in SAN, including `+`/`#` suffixes.
pub fn move_to_san(board: &Board, mv: ChessMove) -> String {
    let from = mv.get_source();
    let to = mv.get_dest();
    let Some(moved_piece) = board.piece_on(from) else {
        return move_to_uci(mv);
    };

    let mut out = String::new();
    let file_delta = to.get_file().to_index() as i32 - from.get_file().to_index() as i32;

    if moved_piece == Piece::King && file_delta.abs() == 2 {
        out.push_str(if file_delta > 0 { "O-O" } else { "O-O-O" });
    } else {
        let is_capture = board.piece_on(to).is_some()
            || (moved_piece == Piece::Pawn && file_delta != 0);

        if moved_piece == Piece::Pawn {
            if is_capture {
                out.push(file_char(from));
            }
        } else {
            out.push(piece_letter(moved_piece));
            out.push_str(&disambiguation(board, mv, moved_piece));
        }

        if is_capture {
            out.push('x');
        }
        out.push_str(&to.to_string());

        if let Some(promotion) = mv.get_promotion() {
            out.push('=');
            out.push(piece_letter(promotion));
        }
    }

    let after = board.make_move_new(mv);
    if after.status() == BoardStatus::Checkmate {
        out.push('#');
    } else if after.checkers().popcnt() > 0 {
        out.push('+');
    }

    out
}

/// Coordinate notation as used by UCI (`e2e4`, `e7e8q`).
#[inline]
pub fn move_to_uci(mv: ChessMove) -> String {
    let mut out = format!("{}{}", mv.get_source(), mv.get_dest());
    if let Some(promotion) = mv.get_promotion() {
        out.push(piece_letter(promotion).to_ascii_lowercase());
    }
    out
}

/// Parse SAN or coordinate notation into one of the board's legal moves.
pub fn parse_move(board: &Board, text: &str) -> Result<ChessMove, String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err("Empty move text".to_owned());
    }

    let cleaned = trim_annotation_suffix(trimmed);
    let normalized_castle = cleaned.replace('0', "O");
    let lowered = cleaned.to_ascii_lowercase();

    let legal_moves: Vec<ChessMove> = MoveGen::new_legal(board).collect();

    if let Some(mv) = legal_moves.iter().find(|mv| move_to_uci(**mv) == lowered) {
        return Ok(*mv);
    }

    let matches: Vec<ChessMove> = legal_moves
        .iter()
        .copied()
        .filter(|mv| trim_annotation_suffix(&move_to_san(board, *mv)) == normalized_castle)
        .collect();

    match matches.as_slice() {
        [mv] => Ok(*mv),
        [] => Err(format!("Not a legal move in this position: {trimmed}")),
        _ => Err(format!("Ambiguous move: {trimmed}")),
    }
}

fn disambiguation(board: &Board, mv: ChessMove, moved_piece: Piece) -> String {
    let from = mv.get_source();
    let rivals: Vec<Square> = MoveGen::new_legal(board)
        .filter(|other| {
            other.get_dest() == mv.get_dest()
                && other.get_source() != from
                && board.piece_on(other.get_source()) == Some(moved_piece)
        })
        .map(|other| other.get_source())
        .collect();

    if rivals.is_empty() {
        return String::new();
    }

    let shares_file = rivals.iter().any(|sq| sq.get_file() == from.get_file());
    let shares_rank = rivals.iter().any(|sq| sq.get_rank() == from.get_rank());

    match (shares_file, shares_rank) {
        (false, _) => file_char(from).to_string(),
        (true, false) => rank_char(from).to_string(),
        (true, true) => from.to_string(),
    }
}

fn trim_annotation_suffix(token: &str) -> &str {
    token.trim_end_matches(|c: char| matches!(c, '+' | '#' | '!' | '?'))
}

#[inline]
fn file_char(square: Square) -> char {
    char::from(b'a' + square.get_file().to_index() as u8)
}

#[inline]
fn rank_char(square: Square) -> char {
    char::from(b'1' + square.get_rank().to_index() as u8)
}

#[inline]
fn piece_letter(piece: Piece) -> char {
    match piece {
        Piece::Pawn => 'P',
        Piece::Knight => 'N',
        Piece::Bishop => 'B',
        Piece::Rook => 'R',
        Piece::Queen => 'Q',
        Piece::King => 'K',
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use chess::{Board, ChessMove, Piece, Square};

    use super::{move_to_san, move_to_uci, parse_move};

    fn board(fen: &str) -> Board {
        Board::from_str(fen).expect("FEN should parse")
    }

    #[test]
    fn renders_quiet_moves_and_captures() {
        let start = Board::default();
        assert_eq!(move_to_san(&start, ChessMove::new(Square::E2, Square::E4, None)), "e4");
        assert_eq!(move_to_san(&start, ChessMove::new(Square::G1, Square::F3, None)), "Nf3");

        let scandi = board("rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2");
        assert_eq!(move_to_san(&scandi, ChessMove::new(Square::E4, Square::D5, None)), "exd5");
    }

    #[test]
    fn renders_castling_promotion_and_mate() {
        let castle = board("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
        assert_eq!(move_to_san(&castle, ChessMove::new(Square::E1, Square::G1, None)), "O-O");
        assert_eq!(move_to_san(&castle, ChessMove::new(Square::E1, Square::C1, None)), "O-O-O");

        let promote = board("8/P6k/8/8/8/8/8/K7 w - - 0 1");
        assert_eq!(
            move_to_san(&promote, ChessMove::new(Square::A7, Square::A8, Some(Piece::Queen))),
            "a8=Q"
        );

        let mate = board("6k1/5ppp/8/8/8/8/8/K3R3 w - - 0 1");
        assert_eq!(move_to_san(&mate, ChessMove::new(Square::E1, Square::E8, None)), "Re8#");
    }

    #[test]
    fn disambiguates_by_file_then_rank() {
        let knights = board("4k3/8/8/8/8/8/8/1N2KN2 w - - 0 1");
        assert_eq!(move_to_san(&knights, ChessMove::new(Square::B1, Square::D2, None)), "Nbd2");

        let rooks = board("4k3/R7/8/8/8/8/8/R3K3 w - - 0 1");
        assert_eq!(move_to_san(&rooks, ChessMove::new(Square::A1, Square::A4, None)), "R1a4");
    }

    #[test]
    fn parses_san_and_coordinate_input() {
        let start = Board::default();
        let e4 = ChessMove::new(Square::E2, Square::E4, None);
        assert_eq!(parse_move(&start, "e4").expect("SAN should parse"), e4);
        assert_eq!(parse_move(&start, "e2e4").expect("UCI should parse"), e4);
        assert_eq!(
            parse_move(&start, " Nf3! ").expect("annotated SAN should parse"),
            ChessMove::new(Square::G1, Square::F3, None)
        );
        assert_eq!(move_to_uci(e4), "e2e4");

        let castle = board("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
        assert_eq!(
            parse_move(&castle, "0-0").expect("zero castling should parse"),
            ChessMove::new(Square::E1, Square::G1, None)
        );
    }

    #[test]
    fn rejects_illegal_and_malformed_input() {
        let start = Board::default();
        assert!(parse_move(&start, "e5").is_err());
        assert!(parse_move(&start, "hello").is_err());
        assert!(parse_move(&start, "").is_err());
    }
}
