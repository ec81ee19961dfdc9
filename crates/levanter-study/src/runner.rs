//! Factor study orchestration.
//!
//! One runner per configuration: sample computation dates, record score
//! histories on sliced universes, build shared forward-return matrices
//! from full data, then run both tracks per factor.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use levanter_data::MarketData;
use levanter_traits::{Date, Factor, Result, Symbol};

use crate::config::FactorStudyConfig;
use crate::event::{run_event_study, EventStudyResult};
use crate::forward::build_return_matrices;
use crate::ic::{analyze_ic, ICDecayCurve, ICResult};
use crate::signals::{default_sweep, detect_signals, SignalDefinition};

/// Per-symbol ordered `(date, score)` observations for one factor.
pub type ScoreHistory = BTreeMap<Symbol, Vec<(Date, f64)>>;

/// Complete study output for one factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorStudyReport {
    /// The factor studied.
    pub factor_name: String,
    /// IC track results, one per valid horizon.
    pub ic_results: Vec<ICResult>,
    /// Mean IC per horizon.
    pub ic_decay: ICDecayCurve,
    /// Event track results, one per `(signal, horizon)` pair.
    pub event_results: Vec<EventStudyResult>,
    /// Computation dates sampled for the run.
    pub n_computation_dates: usize,
    /// Distinct symbols that ever received a score.
    pub n_symbols: usize,
}

/// Factor study driver.
pub struct FactorStudyRunner<'a> {
    config: FactorStudyConfig,
    data: &'a MarketData,
    factors: Vec<Box<dyn Factor>>,
    sweep_overrides: BTreeMap<String, Vec<SignalDefinition>>,
}

impl std::fmt::Debug for FactorStudyRunner<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FactorStudyRunner")
            .field("config", &self.config)
            .field("factors", &self.factors.len())
            .finish_non_exhaustive()
    }
}

impl<'a> FactorStudyRunner<'a> {
    /// Creates a runner over a shared, read-only adapter.
    ///
    /// # Errors
    ///
    /// Returns [`levanter_traits::LevanterError::InvalidConfig`] on a
    /// contradictory configuration.
    pub fn new(config: FactorStudyConfig, data: &'a MarketData) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            data,
            factors: Vec::new(),
            sweep_overrides: BTreeMap::new(),
        })
    }

    /// Registers a factor for the study.
    pub fn add_factor(&mut self, factor: Box<dyn Factor>) {
        self.factors.push(factor);
    }

    /// Overrides the signal sweep for one factor.
    pub fn set_sweep(&mut self, factor_name: impl Into<String>, sweep: Vec<SignalDefinition>) {
        self.sweep_overrides.insert(factor_name.into(), sweep);
    }

    /// Runs the study for every registered factor.
    #[must_use]
    pub fn run(&self) -> Vec<FactorStudyReport> {
        if self.factors.is_empty() {
            warn!("no factors registered");
            return Vec::new();
        }

        let mut dates = self.data.trading_dates();
        if let Some(start) = self.config.start_date {
            dates.retain(|d| *d >= start);
        }
        if let Some(end) = self.config.end_date {
            dates.retain(|d| *d <= end);
        }

        let stride = self.config.computation_freq.stride();
        let computation_dates: Vec<Date> = dates.iter().step_by(stride.max(1)).copied().collect();
        info!(
            freq = %self.config.computation_freq,
            computation_dates = computation_dates.len(),
            "factor study started"
        );

        // Built once, shared across factors
        let return_matrices =
            build_return_matrices(self.data, &computation_dates, &self.config.forward_horizons);

        self.factors
            .iter()
            .map(|factor| self.run_single_factor(factor.as_ref(), &computation_dates, &return_matrices))
            .collect()
    }

    fn run_single_factor(
        &self,
        factor: &dyn Factor,
        computation_dates: &[Date],
        return_matrices: &BTreeMap<usize, crate::forward::ForwardReturns>,
    ) -> FactorStudyReport {
        let meta = factor.meta();
        info!(factor = meta.name, "scoring factor history");

        let mut score_history = ScoreHistory::new();
        for &date in computation_dates {
            let sliced = self.data.slice_to_date(date);
            if sliced.is_empty() {
                continue;
            }
            let scores = factor.compute(&sliced, date);
            for (symbol, score) in scores {
                score_history.entry(symbol).or_default().push((date, score));
            }
        }

        let n_symbols = score_history.len();
        debug!(factor = meta.name, symbols = n_symbols, "score history complete");

        let mut report = FactorStudyReport {
            factor_name: meta.name.to_string(),
            ic_results: Vec::new(),
            ic_decay: ICDecayCurve {
                factor_name: meta.name.to_string(),
                horizons: Vec::new(),
                mean_ics: Vec::new(),
            },
            event_results: Vec::new(),
            n_computation_dates: computation_dates.len(),
            n_symbols,
        };
        if score_history.is_empty() {
            return report;
        }

        let (ic_results, ic_decay) = analyze_ic(
            &meta,
            &score_history,
            return_matrices,
            computation_dates,
            self.config.n_quantiles,
        );
        report.ic_results = ic_results;
        report.ic_decay = ic_decay;

        let sweep = self
            .sweep_overrides
            .get(meta.name)
            .cloned()
            .unwrap_or_else(|| default_sweep(meta.name));
        for signal_def in &sweep {
            let events = detect_signals(&score_history, signal_def);
            if events.is_empty() {
                continue;
            }
            report.event_results.extend(run_event_study(
                meta.name,
                signal_def,
                &events,
                return_matrices,
            ));
        }

        report
    }
}
