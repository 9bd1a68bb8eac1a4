//! Self-play and human-vs-engine game loops.
//!
//! Both loops render the position before every move, ask an `Engine` (or the
//! human) for a move, and stop on checkmate, stalemate, insufficient material, threefold
//! repetition, the fifty-move rule or an optional ply cap. Every finished game
//! yields a `GameRecord` that can be exported as PGN.

use std::collections::HashMap;
use std::fmt;
use std::io::{BufRead, Write};
use std::str::FromStr;
use std::thread;
use std::time::Duration;

use chess::{Board, BoardStatus, ChessMove, Color, MoveGen, Piece};
use log::{debug, info};
use rand::prelude::IndexedRandom;

use crate::engines::engine_trait::Engine;
use crate::errors::GameError;
use crate::game_state::chess_rules::is_insufficient_material;
use crate::search::search_config::MoveOptions;
use crate::utils::render_game_state::render_game_state;
use crate::utils::san::{move_to_san, move_to_uci, parse_move};

#[derive(Debug, Clone, Default)]
pub struct GameConfig {
    /// Stop (unfinished) after this many plies.
    pub max_plies: Option<u32>,
    /// Pause before each engine move in interactive games.
    pub move_delay: Duration,
    pub debug: bool,
    pub pick_random: bool,
}

impl GameConfig {
    fn move_options(&self) -> MoveOptions {
        MoveOptions {
            debug: self.debug,
            pick_random: self.pick_random,
        }
    }
}

/// Board plus the move counters the `chess` crate does not track.
#[derive(Debug, Clone, PartialEq)]
pub struct StartPosition {
    pub board: Board,
    pub halfmove_clock: u32,
    pub fullmove_number: u32,
}

impl StartPosition {
    pub fn from_fen(fen: &str) -> Result<Self, GameError> {
        let board = Board::from_str(fen)
            .map_err(|e| GameError::InvalidPosition(format!("{fen}: {e}")))?;
        let fields: Vec<&str> = fen.split_whitespace().collect();
        let halfmove_clock = fields.get(4).and_then(|x| x.parse().ok()).unwrap_or(0);
        let fullmove_number = fields
            .get(5)
            .and_then(|x| x.parse().ok())
            .filter(|n| *n > 0)
            .unwrap_or(1);
        Ok(Self {
            board,
            halfmove_clock,
            fullmove_number,
        })
    }

    /// FEN with this position's move counters.
    pub fn fen(&self) -> String {
        let board_fen = self.board.to_string();
        let placement: Vec<&str> = board_fen.split_whitespace().take(4).collect();
        format!(
            "{} {} {}",
            placement.join(" "),
            self.halfmove_clock,
            self.fullmove_number
        )
    }
}

impl Default for StartPosition {
    fn default() -> Self {
        Self {
            board: Board::default(),
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    Checkmate,
    Stalemate,
    InsufficientMaterial,
    ThreefoldRepetition,
    FiftyMoveRule,
    MaxPlies,
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            EndReason::Checkmate => "checkmate",
            EndReason::Stalemate => "stalemate",
            EndReason::InsufficientMaterial => "insufficient material",
            EndReason::ThreefoldRepetition => "threefold repetition",
            EndReason::FiftyMoveRule => "fifty-move rule",
            EndReason::MaxPlies => "ply limit reached",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone)]
pub struct GameRecord {
    pub start: StartPosition,
    pub final_board: Board,
    pub san_moves: Vec<String>,
    pub end_reason: EndReason,
    /// `1-0`, `0-1`, `1/2-1/2` or `*` for unfinished games.
    pub result: String,
}

/// Position history used for adjudication.
struct GameTracker {
    start: StartPosition,
    board: Board,
    halfmove_clock: u32,
    seen: HashMap<u64, u32>,
    san_moves: Vec<String>,
}

impl GameTracker {
    fn new(start: StartPosition) -> Self {
        let mut seen = HashMap::new();
        seen.insert(start.board.get_hash(), 1);
        Self {
            board: start.board,
            halfmove_clock: start.halfmove_clock,
            start,
            seen,
            san_moves: Vec::new(),
        }
    }

    fn plies(&self) -> u32 {
        self.san_moves.len() as u32
    }

    fn adjudicate(&self, max_plies: Option<u32>) -> Option<(EndReason, &'static str)> {
        match self.board.status() {
            BoardStatus::Checkmate => {
                let result = match self.board.side_to_move() {
                    Color::White => "0-1",
                    Color::Black => "1-0",
                };
                return Some((EndReason::Checkmate, result));
            }
            BoardStatus::Stalemate => return Some((EndReason::Stalemate, "1/2-1/2")),
            BoardStatus::Ongoing => {}
        }

        if is_insufficient_material(&self.board) {
            return Some((EndReason::InsufficientMaterial, "1/2-1/2"));
        }
        if self.seen.get(&self.board.get_hash()).copied().unwrap_or(0) >= 3 {
            return Some((EndReason::ThreefoldRepetition, "1/2-1/2"));
        }
        if self.halfmove_clock >= 100 {
            return Some((EndReason::FiftyMoveRule, "1/2-1/2"));
        }
        if max_plies.is_some_and(|cap| self.plies() >= cap) {
            return Some((EndReason::MaxPlies, "*"));
        }
        None
    }

    fn push(&mut self, mv: ChessMove) -> String {
        let san = move_to_san(&self.board, mv);
        let resets_clock = self.board.piece_on(mv.get_source()) == Some(Piece::Pawn)
            || self.board.piece_on(mv.get_dest()).is_some();
        self.halfmove_clock = if resets_clock {
            0
        } else {
            self.halfmove_clock + 1
        };

        self.board = self.board.make_move_new(mv);
        *self.seen.entry(self.board.get_hash()).or_insert(0) += 1;
        self.san_moves.push(san.clone());
        san
    }

    fn finish(self, end_reason: EndReason, result: &str) -> GameRecord {
        GameRecord {
            start: self.start,
            final_board: self.board,
            san_moves: self.san_moves,
            end_reason,
            result: result.to_owned(),
        }
    }
}

/// Let `engine` play both sides from `start`.
pub fn self_play<E, W>(
    engine: &mut E,
    start: StartPosition,
    config: &GameConfig,
    out: &mut W,
) -> Result<GameRecord, GameError>
where
    E: Engine + ?Sized,
    W: Write,
{
    engine.new_game();
    let mut tracker = GameTracker::new(start);

    let (end_reason, result) = loop {
        if let Some(end) = tracker.adjudicate(config.max_plies) {
            break end;
        }
        write!(out, "\n{}", render_game_state(&tracker.board, Color::White))?;
        let mv = engine_move(engine, &tracker.board, config)?;
        let san = tracker.push(mv);
        writeln!(out, " My move: {san}")?;
    };

    finish_game(tracker, end_reason, result, Color::White, out)
}

/// Human against `engine`. The human picks a color first; malformed or
/// illegal input is re-prompted and never reaches the engine.
pub fn play_interactive<E, R, W>(
    engine: &mut E,
    start: StartPosition,
    config: &GameConfig,
    input: &mut R,
    out: &mut W,
) -> Result<GameRecord, GameError>
where
    E: Engine + ?Sized,
    R: BufRead,
    W: Write,
{
    engine.new_game();
    let user_color = prompt_user_color(input, out)?;
    let mut tracker = GameTracker::new(start);

    let (end_reason, result) = loop {
        if let Some(end) = tracker.adjudicate(config.max_plies) {
            break end;
        }
        write!(out, "\n{}", render_game_state(&tracker.board, user_color))?;

        if tracker.board.side_to_move() == user_color {
            let mv = prompt_user_move(&tracker.board, input, out)?;
            tracker.push(mv);
        } else {
            if !config.move_delay.is_zero() {
                thread::sleep(config.move_delay);
            }
            let mv = engine_move(engine, &tracker.board, config)?;
            let san = tracker.push(mv);
            writeln!(out, " My move: {san}")?;
        }
    };

    finish_game(tracker, end_reason, result, user_color, out)
}

fn engine_move<E: Engine + ?Sized>(
    engine: &mut E,
    board: &Board,
    config: &GameConfig,
) -> Result<ChessMove, GameError> {
    let output = engine.choose_move(board, &config.move_options())?;
    for line in &output.info_lines {
        debug!("{line}");
    }

    let mv = output
        .best_move
        .ok_or_else(|| GameError::MissingEngineMove(engine.name().to_owned()))?;
    if !MoveGen::new_legal(board).any(|legal| legal == mv) {
        return Err(GameError::IllegalEngineMove {
            engine: engine.name().to_owned(),
            mv: move_to_uci(mv),
        });
    }
    Ok(mv)
}

fn finish_game<W: Write>(
    tracker: GameTracker,
    end_reason: EndReason,
    result: &str,
    perspective: Color,
    out: &mut W,
) -> Result<GameRecord, GameError> {
    write!(out, "\n{}", render_game_state(&tracker.board, perspective))?;
    writeln!(out, "Result: {result}")?;
    info!(
        "game over after {} plies: {} ({})",
        tracker.plies(),
        result,
        end_reason
    );
    Ok(tracker.finish(end_reason, result))
}

fn read_trimmed_line<R: BufRead>(input: &mut R) -> Result<String, GameError> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(GameError::InputClosed);
    }
    Ok(line.trim().to_owned())
}

fn prompt_user_color<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> Result<Color, GameError> {
    loop {
        write!(out, "Do you want to be white or black? ")?;
        out.flush()?;
        match read_trimmed_line(input)?.as_str() {
            "white" => return Ok(Color::White),
            "black" => return Ok(Color::Black),
            _ => {}
        }
    }
}

fn prompt_user_move<R: BufRead, W: Write>(
    board: &Board,
    input: &mut R,
    out: &mut W,
) -> Result<ChessMove, GameError> {
    let legal_moves: Vec<ChessMove> = MoveGen::new_legal(board).collect();
    let mut rng = rand::rng();

    loop {
        let san_example = legal_moves
            .choose(&mut rng)
            .map(|mv| move_to_san(board, *mv))
            .unwrap_or_default();
        let uci_example = legal_moves
            .choose(&mut rng)
            .map(|mv| move_to_uci(*mv))
            .unwrap_or_default();
        write!(out, "Your move (e.g. {san_example} or {uci_example}): ")?;
        out.flush()?;

        let text = read_trimmed_line(input)?;
        if text.is_empty() {
            continue;
        }
        match parse_move(board, &text) {
            Ok(mv) => return Ok(mv),
            Err(err) => {
                debug!("rejected user input: {err}");
                writeln!(out, "Illegal move.")?;
            }
        }
    }
}
