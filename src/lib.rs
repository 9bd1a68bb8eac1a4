//! Crate root module declarations for the Plum MCTS chess player.
//!
//! This file exposes the rules seam, the Monte Carlo search core (tree,
//! engines, controller and diagnostics), the engine wrapper used by the game
//! loops, and the terminal/notation utilities so the binary, benches and
//! tests can import stable module paths.

pub mod errors;

pub mod game_state {
    pub mod chess_rules;
}

pub mod search {
    pub mod diagnostics;
    pub mod evaluation;
    pub mod move_selection;
    pub mod principal_variation;
    pub mod puct_engine;
    pub mod search_config;
    pub mod search_controller;
    pub mod search_engine;
    pub mod search_tree;

    #[cfg(test)]
    pub(crate) mod test_support;
}

pub mod engines {
    pub mod engine_mcts;
    pub mod engine_trait;
}

pub mod utils {
    pub mod game_loop;
    pub mod pgn;
    pub mod render_game_state;
    pub mod san;
}
