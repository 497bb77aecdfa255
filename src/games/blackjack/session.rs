//! A playable Blackjack session.
//!
//! [`BlackjackSession`] is the surface a front end talks to: it owns a table
//! and a learning agent, and exposes the statistics and Q-table for display.
//! With AI mode off the player acts through [`BlackjackSession::step_episode`];
//! with it on only the agent acts. Only the agent's own steps are learned
//! from, while every finished game counts in the statistics.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::games::blackjack::card::{CardSource, UniformCards};
use crate::games::blackjack::hand::BLACKJACK;
use crate::games::blackjack::table::{
    BlackjackAction, BlackjackState, BlackjackTable, TableRules, DEFAULT_DEALER_LIMIT,
};
use crate::mc::agent::{MonteCarloAgent, TrainError};
use crate::mc::config::{ConfigError, EpisodeStats, MCConfig};
use crate::mc::episode::Episode;
use crate::mc::game::{Environment, Outcome, StepError, Transition};
use crate::mc::storage::QSnapshot;

/// Result of one player or agent action.
pub type Step = Transition<BlackjackState>;

/// Session settings.
///
/// Learning parameters sit at the top level of the JSON next to the table
/// settings:
///
/// ```
/// use blackjack_mc::games::blackjack::SessionConfig;
///
/// let config = SessionConfig::from_json_str(r#"{"dealer_limit": 17, "epsilon": 0.05}"#).unwrap();
/// assert_eq!(config.dealer_limit, 17);
/// assert_eq!(config.control.epsilon, 0.05);
/// assert!(!config.ai_enabled);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// The dealer draws while their total is at or below this.
    pub dealer_limit: u8,

    /// Whether the agent may choose actions.
    pub ai_enabled: bool,

    /// Learning parameters.
    #[serde(flatten)]
    pub control: MCConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            dealer_limit: DEFAULT_DEALER_LIMIT,
            ai_enabled: false,
            control: MCConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Builder method: set the dealer's drawing threshold.
    pub fn with_dealer_limit(mut self, dealer_limit: u8) -> Self {
        self.dealer_limit = dealer_limit;
        self
    }

    /// Builder method: enable or disable AI mode.
    pub fn with_ai(mut self, ai_enabled: bool) -> Self {
        self.ai_enabled = ai_enabled;
        self
    }

    /// Builder method: replace the learning parameters.
    pub fn with_control(mut self, control: MCConfig) -> Self {
        self.control = control;
        self
    }

    /// Table rules derived from this configuration.
    pub fn rules(&self) -> TableRules {
        TableRules {
            dealer_limit: self.dealer_limit,
        }
    }

    /// Validate the configuration and return any errors.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dealer_limit > BLACKJACK {
            return Err(ConfigError::InvalidDealerLimit(self.dealer_limit));
        }
        self.control.validate()
    }

    /// Parse and validate a JSON configuration. Missing fields take their
    /// defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }
}

/// Errors returned by [`BlackjackSession`].
#[derive(Debug, Error)]
pub enum SessionError {
    /// The table rejected the action.
    #[error(transparent)]
    Step(#[from] StepError),
    /// The configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Parallel training failed.
    #[error(transparent)]
    Train(#[from] TrainError),
    /// The agent was asked to act while AI mode is off.
    #[error("AI mode is disabled")]
    AiDisabled,
    /// The player tried to act while the agent is playing.
    #[error("AI mode is enabled; the agent is playing")]
    AiEnabled,
}

/// A Blackjack table with a learning agent attached.
pub struct BlackjackSession<C: CardSource = UniformCards> {
    agent: MonteCarloAgent<BlackjackTable<C>>,
    config: SessionConfig,
}

impl BlackjackSession<UniformCards> {
    /// Create a session with random cards, seeded from `config.control.seed`
    /// when set. The first game is dealt immediately.
    pub fn new(config: SessionConfig) -> Result<Self, SessionError> {
        let cards = UniformCards::new(config.control.seed);
        Self::with_card_source(config, cards)
    }

    /// Train on `episodes` games generated in parallel batches.
    ///
    /// The game on the session's own table is left as it is.
    pub fn train_parallel(
        &mut self,
        episodes: u64,
        batch_size: usize,
    ) -> Result<&EpisodeStats, SessionError> {
        self.train_parallel_with_callback(episodes, batch_size, |_| {})
    }

    /// Parallel training with a callback run after every batch.
    pub fn train_parallel_with_callback<F>(
        &mut self,
        episodes: u64,
        batch_size: usize,
        callback: F,
    ) -> Result<&EpisodeStats, SessionError>
    where
        F: FnMut(&EpisodeStats),
    {
        let rules = self.config.rules();
        let make_env = move |seed| BlackjackTable::seeded(seed, rules);
        Ok(self
            .agent
            .train_parallel_with_callback(episodes, batch_size, make_env, callback)?)
    }
}

impl<C: CardSource> BlackjackSession<C> {
    /// Create a session drawing from the given card source.
    pub fn with_card_source(config: SessionConfig, cards: C) -> Result<Self, SessionError> {
        config.validate()?;
        let table = BlackjackTable::new(cards, config.rules());
        let agent = MonteCarloAgent::new(table, config.control.clone());
        Ok(Self { agent, config })
    }

    /// Play the player's action. Rejected while AI mode is on.
    ///
    /// The step is not learned from; a game it finishes is still counted.
    pub fn step_episode(&mut self, action: BlackjackAction) -> Result<Step, SessionError> {
        if self.config.ai_enabled {
            return Err(SessionError::AiEnabled);
        }
        Ok(self.agent.step_unrecorded(action)?)
    }

    /// Play an action given by its numeric code (0 = stick, 1 = hit).
    pub fn step_episode_raw(&mut self, code: u8) -> Result<Step, SessionError> {
        let action = BlackjackAction::try_from(code)?;
        self.step_episode(action)
    }

    /// Let the agent choose and play the next action.
    pub fn auto_step(&mut self) -> Result<Step, SessionError> {
        if !self.config.ai_enabled {
            return Err(SessionError::AiDisabled);
        }
        Ok(self.agent.play_step()?)
    }

    /// Let the agent play until the current game is over.
    ///
    /// Returns immediately if the game is already over.
    pub fn play_episode(&mut self) -> Result<Outcome, SessionError> {
        if !self.config.ai_enabled {
            return Err(SessionError::AiDisabled);
        }
        loop {
            if let Some(outcome) = self.agent.env().outcome() {
                return Ok(outcome);
            }
            self.agent.play_step()?;
        }
    }

    /// Deal the next game once the current one is over.
    ///
    /// A game still in progress is kept.
    pub fn next_episode(&mut self) -> BlackjackState {
        if self.agent.is_terminal() {
            self.agent.begin_episode()
        } else {
            self.agent.state()
        }
    }

    /// Abandon the current game without learning from it and deal a new one.
    pub fn reset_episode(&mut self) -> BlackjackState {
        self.agent.begin_episode()
    }

    /// Train on `episodes` games played on the session's table.
    pub fn train(&mut self, episodes: u64) -> Result<&EpisodeStats, SessionError> {
        Ok(self.agent.train(episodes)?)
    }

    /// Train with a progress callback invoked every `interval` games.
    pub fn train_with_callback<F>(
        &mut self,
        episodes: u64,
        interval: u64,
        callback: F,
    ) -> Result<&EpisodeStats, SessionError>
    where
        F: FnMut(&EpisodeStats),
    {
        Ok(self.agent.train_with_callback(episodes, interval, callback)?)
    }

    /// Play `episodes` games greedily without learning.
    pub fn evaluate_greedy(&mut self, episodes: u64) -> Result<EpisodeStats, SessionError> {
        Ok(self.agent.evaluate_greedy(episodes)?)
    }

    /// Turn AI mode on or off.
    pub fn set_ai_enabled(&mut self, enabled: bool) {
        self.config.ai_enabled = enabled;
    }

    /// Whether AI mode is on.
    pub fn ai_enabled(&self) -> bool {
        self.config.ai_enabled
    }

    /// Current observation.
    pub fn state(&self) -> BlackjackState {
        self.agent.state()
    }

    /// Whether the current game is over.
    pub fn is_terminal(&self) -> bool {
        self.agent.is_terminal()
    }

    /// Outcome of the current game, once it is over.
    pub fn outcome(&self) -> Option<Outcome> {
        self.agent.env().outcome()
    }

    /// Steps taken so far in the current game.
    pub fn current_episode(&self) -> &Episode<BlackjackState, BlackjackAction> {
        self.agent.current_episode()
    }

    /// Copy of the learned action values.
    pub fn q_snapshot(&self) -> QSnapshot<BlackjackState> {
        self.agent.q_snapshot()
    }

    /// Running statistics.
    pub fn stats(&self) -> &EpisodeStats {
        self.agent.stats()
    }

    /// Zero the statistics.
    pub fn reset_stats(&mut self) {
        self.agent.reset_stats();
    }

    /// The table, for rendering hands.
    pub fn table(&self) -> &BlackjackTable<C> {
        self.agent.env()
    }

    /// The learning agent.
    pub fn agent(&self) -> &MonteCarloAgent<BlackjackTable<C>> {
        &self.agent
    }

    /// Session settings.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}
