//! Every-visit Monte Carlo control agent.
//!
//! The agent owns an environment, the Q-table, and the buffer of the episode
//! in progress. Recorded steps are handed to the update rule exactly once,
//! when the episode reaches a terminal state. Actions played from outside
//! through [`MonteCarloAgent::step_unrecorded`] move the environment and
//! count in the statistics but are never learned from.
//!
//! The agent is generic over any environment that implements [`Environment`].

use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info, trace};

use crate::mc::config::{EpisodeStats, MCConfig, ReturnDiscount};
use crate::mc::episode::Episode;
use crate::mc::game::{Action, Environment, Outcome, StateKey, StepError, Transition};
use crate::mc::policy::{greedy_action, EpsilonGreedy};
use crate::mc::storage::{QSnapshot, QTable};

/// Salt mixed into per-episode seeds so the policy stream differs from the
/// environment stream.
const POLICY_SEED_SALT: u64 = 0x5DEE_CE66_D1CE_4E5B;

/// Errors raised by the training loops.
#[derive(Debug, Error)]
pub enum TrainError {
    /// The environment rejected a step.
    #[error(transparent)]
    Step(#[from] StepError),
    /// The worker pool for parallel training could not be created.
    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Apply the every-visit Monte Carlo update for a completed episode.
///
/// Steps are updated in order, and each update reads the current value of
/// its `(state, action)` pair, so a pair visited twice in one episode is
/// moved twice. An empty episode is a no-op.
pub fn update_q<S, A>(
    q: &mut QTable<S>,
    episode: &Episode<S, A>,
    gamma: f64,
    alpha: f64,
    discount: ReturnDiscount,
) where
    S: StateKey,
    A: Action,
{
    let returns = episode.returns(gamma, discount);
    for (step, target) in episode.steps().iter().zip(returns) {
        q.update(step.state, step.action, target, alpha);
    }
}

/// Play the current episode of `env` to completion with `policy`.
///
/// The Q-table is only read. Returns the recorded steps and the outcome.
pub fn generate_episode<E, R>(
    env: &mut E,
    q: &QTable<E::State>,
    policy: &EpsilonGreedy,
    rng: &mut R,
) -> Result<(Episode<E::State, E::Action>, Outcome), StepError>
where
    E: Environment,
    R: Rng + ?Sized,
{
    let mut episode = Episode::new();

    loop {
        if let Some(outcome) = env.outcome() {
            return Ok((episode, outcome));
        }

        let state = env.state();
        let action: E::Action = policy.select(&state, q, rng);
        let transition = env.step(action)?;
        episode.push(state, action, transition.reward);
    }
}

/// Seed of the `index`-th episode generated from `base`.
fn episode_seed(base: u64, index: u64) -> u64 {
    base.wrapping_add(index.wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

/// The Monte Carlo control agent.
///
/// # Example
/// ```ignore
/// use blackjack_mc::mc::{MCConfig, MonteCarloAgent};
///
/// let env = MyTable::new();
/// let mut agent = MonteCarloAgent::new(env, MCConfig::default().with_seed(7));
///
/// // Play and learn from 100,000 episodes
/// agent.train(100_000)?;
///
/// let values = agent.q().get(&some_state);
/// ```
pub struct MonteCarloAgent<E: Environment> {
    /// The environment being learned.
    env: E,

    /// Learning parameters.
    config: MCConfig,

    /// Learned action values.
    q: QTable<E::State>,

    /// Steps of the episode in progress.
    episode: Episode<E::State, E::Action>,

    /// Statistics tracking.
    stats: EpisodeStats,

    /// Random number generator for the policy.
    rng: StdRng,

    /// Episodes handed out to parallel workers so far.
    parallel_offset: u64,
}

impl<E: Environment> MonteCarloAgent<E> {
    /// Create an agent for an environment whose first episode is already dealt.
    ///
    /// If that episode is already terminal it is counted in the statistics.
    pub fn new(env: E, config: MCConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed ^ POLICY_SEED_SALT),
            None => StdRng::from_entropy(),
        };

        let mut stats = EpisodeStats::new();
        if let Some(outcome) = env.outcome() {
            stats.record(outcome);
        }

        Self {
            env,
            config,
            q: QTable::new(),
            episode: Episode::new(),
            stats,
            rng,
            parallel_offset: 0,
        }
    }

    /// Current observation of the environment.
    pub fn state(&self) -> E::State {
        self.env.state()
    }

    /// Whether the current episode is over.
    pub fn is_terminal(&self) -> bool {
        self.env.is_terminal()
    }

    /// Abandon the episode in progress and start a fresh one.
    ///
    /// Steps recorded so far are discarded without touching the Q-table. If
    /// the fresh episode is terminal from the start it is counted right away.
    pub fn begin_episode(&mut self) -> E::State {
        if !self.episode.is_empty() {
            debug!(steps = self.episode.len(), "abandoning episode");
        }
        self.episode.clear();

        let state = self.env.reset();
        if let Some(outcome) = self.env.outcome() {
            self.finish(outcome);
        }
        state
    }

    /// Apply an action chosen outside the agent and record it.
    pub fn step(&mut self, action: E::Action) -> Result<Transition<E::State>, StepError> {
        let state = self.env.state();
        let transition = self.env.step(action)?;
        trace!(?state, action = action.name(), reward = transition.reward, "step");

        self.episode.push(state, action, transition.reward);
        if let Some(outcome) = transition.outcome {
            self.finish(outcome);
        }
        Ok(transition)
    }

    /// Apply an action without recording it for learning.
    ///
    /// If the episode ends here it is counted in the statistics, and any
    /// steps recorded earlier in it are dropped without an update.
    pub fn step_unrecorded(
        &mut self,
        action: E::Action,
    ) -> Result<Transition<E::State>, StepError> {
        let transition = self.env.step(action)?;
        trace!(action = action.name(), reward = transition.reward, "unrecorded step");

        if let Some(outcome) = transition.outcome {
            if !self.episode.is_empty() {
                debug!(steps = self.episode.len(), "dropping recorded steps");
            }
            self.episode.clear();
            self.stats.record(outcome);
            self.stats.states = self.q.num_states();
        }
        Ok(transition)
    }

    /// Sample the policy's action for the current state.
    pub fn select_action(&mut self) -> E::Action {
        let policy = EpsilonGreedy::new(self.config.epsilon);
        let state = self.env.state();
        policy.select(&state, &self.q, &mut self.rng)
    }

    /// Let the policy choose and play one action.
    pub fn play_step(&mut self) -> Result<Transition<E::State>, StepError> {
        let action = self.select_action();
        self.step(action)
    }

    /// Play an episode to completion with the policy.
    ///
    /// Continues the episode in progress, or starts a new one if the current
    /// one is already over.
    pub fn run_episode(&mut self) -> Result<Outcome, StepError> {
        if self.env.is_terminal() {
            self.begin_episode();
        }

        loop {
            if let Some(outcome) = self.env.outcome() {
                return Ok(outcome);
            }
            self.play_step()?;
        }
    }

    /// Train the agent for a number of episodes.
    ///
    /// # Returns
    /// Statistics accumulated so far.
    pub fn train(&mut self, episodes: u64) -> Result<&EpisodeStats, StepError> {
        self.train_with_callback(episodes, u64::MAX, |_| {})
    }

    /// Train with a callback for progress tracking.
    ///
    /// # Arguments
    /// * `episodes` - Number of episodes to run
    /// * `callback_interval` - How often to call the callback
    /// * `callback` - Function called every `callback_interval` episodes
    pub fn train_with_callback<F>(
        &mut self,
        episodes: u64,
        callback_interval: u64,
        mut callback: F,
    ) -> Result<&EpisodeStats, StepError>
    where
        F: FnMut(&EpisodeStats),
    {
        let start_time = Instant::now();
        let elapsed_before = self.stats.elapsed_seconds;
        let interval = callback_interval.max(1);

        for i in 0..episodes {
            self.run_episode()?;

            if (i + 1) % interval == 0 {
                self.refresh_stats(elapsed_before + start_time.elapsed().as_secs_f64());
                callback(&self.stats);
            }
        }

        self.refresh_stats(elapsed_before + start_time.elapsed().as_secs_f64());
        info!(
            episodes,
            played = self.stats.played,
            states = self.stats.states,
            win_rate = self.stats.win_rate(),
            elapsed = self.stats.elapsed_seconds,
            "training finished"
        );

        Ok(&self.stats)
    }

    /// Train on independent episodes generated in parallel.
    ///
    /// Each batch of `batch_size` episodes is played on a rayon pool against
    /// a read-only view of the Q-table; `make_env` builds a freshly dealt
    /// environment from a per-episode seed. Updates are then applied on this
    /// thread one episode at a time, in episode order, so results are
    /// reproducible for a fixed `seed`.
    ///
    /// The agent's own environment is not touched.
    pub fn train_parallel<F>(
        &mut self,
        episodes: u64,
        batch_size: usize,
        make_env: F,
    ) -> Result<&EpisodeStats, TrainError>
    where
        F: Fn(u64) -> E + Sync,
    {
        self.train_parallel_with_callback(episodes, batch_size, make_env, |_| {})
    }

    /// Parallel training with a callback run after every applied batch.
    pub fn train_parallel_with_callback<F, C>(
        &mut self,
        episodes: u64,
        batch_size: usize,
        make_env: F,
        mut callback: C,
    ) -> Result<&EpisodeStats, TrainError>
    where
        F: Fn(u64) -> E + Sync,
        C: FnMut(&EpisodeStats),
    {
        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(threads) = self.config.num_threads {
            builder = builder.num_threads(threads);
        }
        let pool = builder.build()?;

        let start_time = Instant::now();
        let elapsed_before = self.stats.elapsed_seconds;
        let base_seed = match self.config.seed {
            Some(seed) => seed,
            None => self.rng.gen(),
        };
        let policy = EpsilonGreedy::new(self.config.epsilon);
        let batch_size = batch_size.max(1) as u64;

        let mut remaining = episodes;
        while remaining > 0 {
            let batch = remaining.min(batch_size);
            let offset = self.parallel_offset;
            let q = &self.q;

            let results = pool.install(|| {
                (0..batch)
                    .into_par_iter()
                    .map(|i| {
                        let seed = episode_seed(base_seed, offset + i);
                        let mut env = make_env(seed);
                        let mut rng = StdRng::seed_from_u64(seed ^ POLICY_SEED_SALT);
                        generate_episode(&mut env, q, &policy, &mut rng)
                    })
                    .collect::<Result<Vec<_>, StepError>>()
            })?;

            for (episode, outcome) in &results {
                self.apply_episode(episode);
                self.stats.record(*outcome);
            }

            self.parallel_offset += batch;
            remaining -= batch;
            debug!(batch, remaining, states = self.q.num_states(), "parallel batch applied");

            self.refresh_stats(elapsed_before + start_time.elapsed().as_secs_f64());
            callback(&self.stats);
        }

        self.refresh_stats(elapsed_before + start_time.elapsed().as_secs_f64());
        info!(
            episodes,
            played = self.stats.played,
            states = self.stats.states,
            win_rate = self.stats.win_rate(),
            elapsed = self.stats.elapsed_seconds,
            "parallel training finished"
        );

        Ok(&self.stats)
    }

    /// Play episodes greedily without learning.
    ///
    /// Any episode in progress is abandoned. The Q-table and the running
    /// statistics are left untouched; the returned statistics cover only
    /// the evaluation episodes.
    pub fn evaluate_greedy(&mut self, episodes: u64) -> Result<EpisodeStats, StepError> {
        self.episode.clear();
        let mut stats = EpisodeStats::new();

        for _ in 0..episodes {
            self.env.reset();
            let outcome = loop {
                if let Some(outcome) = self.env.outcome() {
                    break outcome;
                }
                let action: E::Action = greedy_action(&self.q.get(&self.env.state()));
                self.env.step(action)?;
            };
            stats.record(outcome);
        }

        stats.states = self.q.num_states();
        Ok(stats)
    }

    /// Apply the update rule for a completed episode.
    pub fn apply_episode(&mut self, episode: &Episode<E::State, E::Action>) {
        update_q(
            &mut self.q,
            episode,
            self.config.gamma,
            self.config.alpha,
            self.config.return_discount,
        );
    }

    fn finish(&mut self, outcome: Outcome) {
        let episode = self.episode.take();
        self.apply_episode(&episode);
        self.stats.record(outcome);
        self.stats.states = self.q.num_states();
        debug!(steps = episode.len(), ?outcome, played = self.stats.played, "episode finished");
    }

    fn refresh_stats(&mut self, elapsed_seconds: f64) {
        self.stats.states = self.q.num_states();
        self.stats.elapsed_seconds = elapsed_seconds;
        self.stats.update_rate();
    }

    /// Steps recorded so far in the current episode.
    pub fn current_episode(&self) -> &Episode<E::State, E::Action> {
        &self.episode
    }

    /// Get reference to the Q-table.
    pub fn q(&self) -> &QTable<E::State> {
        &self.q
    }

    /// Copy of the Q-table for plotting or export.
    pub fn q_snapshot(&self) -> QSnapshot<E::State> {
        self.q.snapshot()
    }

    /// Get current statistics.
    pub fn stats(&self) -> &EpisodeStats {
        &self.stats
    }

    /// Zero the win/loss counters. The Q-table is kept.
    pub fn reset_stats(&mut self) {
        self.stats = EpisodeStats {
            states: self.q.num_states(),
            ..EpisodeStats::new()
        };
    }

    /// Get reference to the environment.
    pub fn env(&self) -> &E {
        &self.env
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &MCConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impl_action;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Lever {
        Pull,
        Hold,
    }

    impl_action!(Lever, [Lever::Pull => "pull", Lever::Hold => "hold"]);

    /// Walk of fixed length: `Hold` wins at the last step, `Pull` loses.
    struct Corridor {
        position: u8,
        length: u8,
        outcome: Option<Outcome>,
    }

    impl Corridor {
        fn new(length: u8) -> Self {
            Self {
                position: 0,
                length,
                outcome: None,
            }
        }
    }

    impl Environment for Corridor {
        type State = u8;
        type Action = Lever;

        fn reset(&mut self) -> u8 {
            self.position = 0;
            self.outcome = None;
            0
        }

        fn state(&self) -> u8 {
            self.position
        }

        fn outcome(&self) -> Option<Outcome> {
            self.outcome
        }

        fn step(&mut self, action: Lever) -> Result<Transition<u8>, StepError> {
            if self.outcome.is_some() {
                return Err(StepError::EpisodeFinished);
            }
            self.position += 1;
            if self.position == self.length {
                self.outcome = Some(match action {
                    Lever::Hold => Outcome::Win,
                    Lever::Pull => Outcome::Loss,
                });
            }
            Ok(Transition {
                state: self.position,
                reward: self.outcome.map_or(0.0, Outcome::reward),
                outcome: self.outcome,
            })
        }
    }

    #[test]
    fn test_update_rule_two_step_episode() {
        let mut q: QTable<char> = QTable::new();
        let episode: Episode<char, Lever> =
            vec![('a', Lever::Hold, 0.0), ('b', Lever::Pull, 1.0)].into_iter().collect();

        update_q(&mut q, &episode, 1.0, 0.5, ReturnDiscount::Shifted);

        assert_eq!(q.value(&'b', Lever::Pull), 0.5);
        assert_eq!(q.value(&'a', Lever::Hold), 0.5);
        assert_eq!(q.value(&'a', Lever::Pull), 0.0);
    }

    #[test]
    fn test_update_rule_revisits_compound() {
        let mut q: QTable<char> = QTable::new();
        let episode: Episode<char, Lever> =
            vec![('s', Lever::Hold, 0.0), ('s', Lever::Hold, 1.0)].into_iter().collect();

        update_q(&mut q, &episode, 1.0, 1.0, ReturnDiscount::Shifted);

        // Both returns are 1.0; with alpha = 1 each update lands on its return.
        assert_eq!(q.value(&'s', Lever::Hold), 1.0);

        let mut q: QTable<char> = QTable::new();
        update_q(&mut q, &episode, 1.0, 0.5, ReturnDiscount::Shifted);

        // 0 -> 0.5 -> 0.75: the second update reads the first one's result.
        assert_eq!(q.value(&'s', Lever::Hold), 0.75);
    }

    #[test]
    fn test_update_rule_discount_conventions_diverge() {
        let episode: Episode<char, Lever> = vec![('s', Lever::Hold, 1.0)].into_iter().collect();

        let mut shifted: QTable<char> = QTable::new();
        update_q(&mut shifted, &episode, 0.5, 1.0, ReturnDiscount::Shifted);
        assert_eq!(shifted.value(&'s', Lever::Hold), 0.5);

        let mut textbook: QTable<char> = QTable::new();
        update_q(&mut textbook, &episode, 0.5, 1.0, ReturnDiscount::Textbook);
        assert_eq!(textbook.value(&'s', Lever::Hold), 1.0);
    }

    #[test]
    fn test_empty_episode_is_noop() {
        let mut q: QTable<char> = QTable::new();
        update_q(&mut q, &Episode::<char, Lever>::new(), 1.0, 0.5, ReturnDiscount::Shifted);
        assert!(q.is_empty());
    }

    #[test]
    fn test_external_steps_update_at_terminal_only() {
        let mut agent = MonteCarloAgent::new(Corridor::new(2), MCConfig::default().with_alpha(1.0));

        agent.step(Lever::Pull).unwrap();
        assert!(agent.q().is_empty());
        assert_eq!(agent.current_episode().len(), 1);

        let transition = agent.step(Lever::Hold).unwrap();
        assert_eq!(transition.outcome, Some(Outcome::Win));
        assert_eq!(agent.q().value(&0, Lever::Pull), 1.0);
        assert_eq!(agent.q().value(&1, Lever::Hold), 1.0);
        assert!(agent.current_episode().is_empty());
        assert_eq!(agent.stats().won, 1);

        assert_eq!(agent.step(Lever::Hold), Err(StepError::EpisodeFinished));
        assert_eq!(agent.stats().played, 1);
    }

    #[test]
    fn test_unrecorded_steps_count_without_learning() {
        let mut agent = MonteCarloAgent::new(Corridor::new(2), MCConfig::default().with_alpha(1.0));

        agent.step_unrecorded(Lever::Hold).unwrap();
        assert!(agent.current_episode().is_empty());

        let transition = agent.step_unrecorded(Lever::Pull).unwrap();
        assert_eq!(transition.outcome, Some(Outcome::Loss));
        assert!(agent.q().is_empty());
        assert_eq!(agent.stats().played, 1);
        assert_eq!(agent.stats().lost, 1);
    }

    #[test]
    fn test_unrecorded_finish_drops_recorded_steps() {
        let mut agent = MonteCarloAgent::new(Corridor::new(2), MCConfig::default().with_alpha(1.0));

        agent.step(Lever::Hold).unwrap();
        agent.step_unrecorded(Lever::Hold).unwrap();

        assert!(agent.q().is_empty());
        assert!(agent.current_episode().is_empty());
        assert_eq!(agent.stats().won, 1);
    }

    #[test]
    fn test_abandoned_episode_leaves_q_untouched() {
        let mut agent = MonteCarloAgent::new(Corridor::new(3), MCConfig::default());
        agent.step(Lever::Hold).unwrap();
        agent.step(Lever::Hold).unwrap();

        assert_eq!(agent.begin_episode(), 0);
        assert!(agent.q().is_empty());
        assert!(agent.current_episode().is_empty());
        assert_eq!(agent.stats().played, 0);
    }

    #[test]
    fn test_training_learns_to_hold() {
        let config = MCConfig::default().with_seed(7).with_alpha(0.1);
        let mut agent = MonteCarloAgent::new(Corridor::new(1), config);

        let stats = agent.train(2_000).unwrap();
        assert_eq!(stats.played, 2_000);
        assert_eq!(stats.won + stats.lost, 2_000);

        let values = agent.q().get(&0);
        assert!(values[Lever::Hold.index()] > values[Lever::Pull.index()]);

        let greedy = agent.evaluate_greedy(100).unwrap();
        assert_eq!(greedy.won, 100);
    }

    #[test]
    fn test_parallel_training_is_reproducible() {
        let run = || {
            let config = MCConfig::default().with_seed(11).with_threads(2).with_alpha(0.1);
            let mut agent = MonteCarloAgent::new(Corridor::new(2), config);
            agent.train_parallel(500, 64, |_| Corridor::new(2)).unwrap();
            (agent.stats().played, agent.stats().won, agent.q_snapshot())
        };

        let (played, won, first) = run();
        let (_, won_again, second) = run();

        assert_eq!(played, 500);
        assert_eq!(won, won_again);
        assert_eq!(first, second);
    }

    #[test]
    fn test_parallel_callback_runs_per_batch() {
        let config = MCConfig::default().with_seed(3).with_threads(2);
        let mut agent = MonteCarloAgent::new(Corridor::new(1), config);

        let mut seen = Vec::new();
        agent
            .train_parallel_with_callback(250, 100, |_| Corridor::new(1), |stats| {
                seen.push(stats.played)
            })
            .unwrap();

        assert_eq!(seen, vec![100, 200, 250]);
    }
}
