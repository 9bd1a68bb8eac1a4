//! PGN export for finished games.
//!
//! Serializes a `GameRecord` to PGN text with the seven-tag roster and, for
//! games that did not start from the standard position, `SetUp`/`FEN` tags.

use std::collections::BTreeMap;

use chess::Color;

use crate::game_state::chess_rules::STARTING_POSITION_FEN;
use crate::utils::game_loop::GameRecord;

/// Default headers for `record`; `overrides` replace or extend them.
pub fn write_pgn(record: &GameRecord, overrides: &BTreeMap<String, String>) -> String {
    let mut headers = BTreeMap::<String, String>::new();
    headers.insert("Event".to_owned(), "Plum MCTS Game".to_owned());
    headers.insert("Site".to_owned(), "Local".to_owned());
    headers.insert(
        "Date".to_owned(),
        chrono::Local::now().format("%Y.%m.%d").to_string(),
    );
    headers.insert("Round".to_owned(), "-".to_owned());
    headers.insert("White".to_owned(), "White".to_owned());
    headers.insert("Black".to_owned(), "Black".to_owned());
    headers.insert("Result".to_owned(), normalize_result(&record.result).to_owned());
    headers.insert("Termination".to_owned(), record.end_reason.to_string());

    let initial_fen = record.start.fen();
    if initial_fen != STARTING_POSITION_FEN {
        headers.insert("SetUp".to_owned(), "1".to_owned());
        headers.insert("FEN".to_owned(), initial_fen);
    }

    for (key, value) in overrides {
        headers.insert(key.clone(), value.clone());
    }

    write_pgn_with_headers(record, &headers)
}

pub fn write_pgn_with_headers(record: &GameRecord, headers: &BTreeMap<String, String>) -> String {
    let mut out = String::new();

    for (key, value) in headers {
        out.push_str(&format!("[{} \"{}\"]\n", key, escape_pgn_value(value)));
    }
    out.push('\n');

    let black_first = record.start.board.side_to_move() == Color::Black;
    let mut fullmove = record.start.fullmove_number;
    let mut movetext_parts = Vec::<String>::with_capacity(record.san_moves.len() + 1);

    for (ply, san) in record.san_moves.iter().enumerate() {
        let white_to_move = (ply % 2 == 0) != black_first;
        if white_to_move {
            movetext_parts.push(format!("{fullmove}. {san}"));
        } else if ply == 0 {
            movetext_parts.push(format!("{fullmove}... {san}"));
        } else {
            movetext_parts.push(san.clone());
        }
        if !white_to_move {
            fullmove += 1;
        }
    }

    let result = headers
        .get("Result")
        .map(|x| normalize_result(x))
        .unwrap_or("*");
    movetext_parts.push(result.to_owned());
    out.push_str(&movetext_parts.join(" "));
    out.push('\n');

    out
}

fn is_result_token(token: &str) -> bool {
    matches!(token, "1-0" | "0-1" | "1/2-1/2" | "*")
}

fn normalize_result(result: &str) -> &str {
    if is_result_token(result) {
        result
    } else {
        "*"
    }
}

fn escape_pgn_value(value: &str) -> String {
    value.replace('"', "\\\"")
}
