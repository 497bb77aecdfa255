//! Training output and export utilities.
//!
//! Writes the learned action values and the two value surfaces to JSON for
//! plotting outside the crate. Nothing reads these files back.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::games::blackjack::card::CardSource;
use crate::games::blackjack::session::{BlackjackSession, SessionConfig};
use crate::games::blackjack::surface::ValueSurface;
use crate::games::blackjack::table::BlackjackState;
use crate::mc::config::EpisodeStats;
use crate::mc::storage::QEntry;

/// Everything learned by a session, ready to serialize.
#[derive(Debug, Clone, Serialize)]
pub struct TrainingOutput {
    /// Run metadata
    pub metadata: TrainingMetadata,
    /// Action values per state, sorted by state
    pub q: Vec<QEntry<BlackjackState>>,
    /// Value surface for hands with a usable Ace
    pub usable_ace: ValueSurface,
    /// Value surface for hands without one
    pub no_usable_ace: ValueSurface,
}

/// Training metadata.
#[derive(Debug, Clone, Serialize)]
pub struct TrainingMetadata {
    /// Settings the session ran with
    pub config: SessionConfig,
    /// Statistics at export time
    pub stats: EpisodeStats,
    /// Seconds since the Unix epoch
    pub timestamp: u64,
}

impl TrainingOutput {
    /// Capture the current state of a session.
    pub fn from_session<C: CardSource>(session: &BlackjackSession<C>) -> Self {
        let snapshot = session.q_snapshot();
        let mut q = snapshot.entries();
        q.sort_by_key(|entry| entry.state);

        Self {
            metadata: TrainingMetadata {
                config: session.config().clone(),
                stats: session.stats().clone(),
                timestamp: unix_timestamp(),
            },
            q,
            usable_ace: snapshot.value_surface(true),
            no_usable_ace: snapshot.value_surface(false),
        }
    }

    /// Save to a JSON file.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())
    }
}

fn unix_timestamp() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
