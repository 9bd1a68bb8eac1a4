//! Terminal-oriented Unicode board renderer.
//!
//! Squares are drawn with ANSI background colors, ranks and files are
//! labelled, and the board can be shown from either side.

use chess::{Board, Color, File, Piece, Rank, Square};

const LIGHT_SQUARE: &str = "\u{1b}[0;30;107m";
const DARK_SQUARE: &str = "\u{1b}[0;30;47m";
const RESET: &str = "\u{1b}[0m";

/// Render `board` with `perspective`'s pieces at the bottom.
pub fn render_game_state(board: &Board, perspective: Color) -> String {
    let mut out = String::new();

    for row in 0..8usize {
        let rank = match perspective {
            Color::White => 7 - row,
            Color::Black => row,
        };

        out.push_str(&format!(" {LIGHT_SQUARE} {} ", rank + 1));
        for col in 0..8usize {
            let file = match perspective {
                Color::White => col,
                Color::Black => 7 - col,
            };
            let square = Square::make_square(Rank::from_index(rank), File::from_index(file));
            let shade = if (row + col) % 2 == 0 {
                LIGHT_SQUARE
            } else {
                DARK_SQUARE
            };
            out.push_str(shade);
            out.push(piece_glyph(board, square));
            out.push(' ');
        }
        out.push_str(&format!("{LIGHT_SQUARE} {RESET}\n"));
    }

    let files = match perspective {
        Color::White => "a b c d e f g h",
        Color::Black => "h g f e d c b a",
    };
    out.push_str(&format!(" {LIGHT_SQUARE}   {files}  {RESET}\n"));

    out
}

fn piece_glyph(board: &Board, square: Square) -> char {
    match (board.piece_on(square), board.color_on(square)) {
        (Some(piece), Some(color)) => piece_to_unicode(color, piece),
        _ => ' ',
    }
}

fn piece_to_unicode(color: Color, piece: Piece) -> char {
    match (color, piece) {
        (Color::White, Piece::Pawn) => '♙',
        (Color::White, Piece::Knight) => '♘',
        (Color::White, Piece::Bishop) => '♗',
        (Color::White, Piece::Rook) => '♖',
        (Color::White, Piece::Queen) => '♕',
        (Color::White, Piece::King) => '♔',
        (Color::Black, Piece::Pawn) => '♟',
        (Color::Black, Piece::Knight) => '♞',
        (Color::Black, Piece::Bishop) => '♝',
        (Color::Black, Piece::Rook) => '♜',
        (Color::Black, Piece::Queen) => '♛',
        (Color::Black, Piece::King) => '♚',
    }
}
