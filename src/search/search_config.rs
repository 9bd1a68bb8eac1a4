//! Controller configuration and per-call options.

use crate::errors::SearchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionMode {
    /// Most visited child, first one in engine order on ties.
    #[default]
    MostVisited,
    /// Child sampled with probability proportional to its visit count.
    VisitProportional,
}

/// Options passed by the game loop on every `select_move` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MoveOptions {
    pub debug: bool,
    pub pick_random: bool,
}

impl MoveOptions {
    #[inline]
    pub fn selection_mode(&self) -> SelectionMode {
        if self.pick_random {
            SelectionMode::VisitProportional
        } else {
            SelectionMode::MostVisited
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    /// Rollouts per batch.
    pub budget: u32,
    /// Principal variations to report; 0 disables search diagnostics.
    pub pv_lines: usize,
    /// Children listed in the prior preview.
    pub prior_preview_len: usize,
    /// Report PVs every this many rollouts (and on the last one).
    pub pv_report_interval: u32,
    /// Minimum share of root visits the best child needs before the search
    /// stops extending.
    pub min_visit_share: f64,
    /// Cap on extra batches; `None` keeps extending until the share is met.
    pub max_extension_rounds: Option<u32>,
    /// Seed for visit-proportional selection; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            budget: 800,
            pv_lines: 0,
            prior_preview_len: 7,
            pv_report_interval: 100,
            min_visit_share: 0.2,
            max_extension_rounds: None,
            seed: None,
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.budget == 0 {
            return Err(SearchError::InvalidConfig(
                "budget must be at least one rollout".to_owned(),
            ));
        }
        if self.pv_report_interval == 0 {
            return Err(SearchError::InvalidConfig(
                "pv_report_interval must be positive".to_owned(),
            ));
        }
        if !(self.min_visit_share > 0.0 && self.min_visit_share <= 1.0) {
            return Err(SearchError::InvalidConfig(format!(
                "min_visit_share must be in (0, 1], got {}",
                self.min_visit_share
            )));
        }
        Ok(())
    }
}
