//! Phrase bank.
//!
//! A phrase is a named group of interchangeable recordings plus an optional
//! radio-signal fallback. Banks are immutable after load and shared by
//! reference through the [`PhraseRegistry`], which the host loads at map
//! start and clears at map change.
//!
//! File format (TOML):
//!
//! ```toml
//! [[phrase]]
//! name = "enemy_count"
//! radio = "enemy_spotted"
//!
//! [[phrase.variant]]
//! sound = "bot/two_enemies.wav"
//! duration = 1.1
//! count = 2
//!
//! [[phrase.variant]]
//! sound = "bot/enemies.wav"
//! duration = 0.9
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use rand::RngCore;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{BotError, Result};
use crate::types::PlaceId;

/// Phrase names the core itself speaks.
pub mod names {
    /// "Me too" / "roger that" after a teammate announced the same plan.
    pub const ACKNOWLEDGE: &str = "acknowledge";
    /// Asking the team to report.
    pub const REPORT_IN: &str = "report_in";
    /// Answering a report request.
    pub const REPORTING_IN: &str = "reporting_in";
    /// Generic yes.
    pub const AFFIRMATIVE: &str = "affirmative";
    /// Enemy count callout.
    pub const ENEMY_COUNT: &str = "enemy_count";
    /// Remaining enemy count callout.
    pub const ENEMIES_REMAINING: &str = "enemies_remaining";
    /// Callout of the speaker's current place.
    pub const PLACE: &str = "place";
    /// The objective item is on the ground.
    pub const FLAG_LOOSE: &str = "flag_loose";
    /// "Follow me."
    pub const FOLLOW_ME: &str = "follow_me";
    /// "Hold this position."
    pub const DEFEND_HERE: &str = "defend_here";
    /// Enemy sniper callout.
    pub const SNIPER_WARNING: &str = "sniper_warning";
    /// Heard an unseen enemy.
    pub const NOISE: &str = "noise";
}

/// Low-bandwidth signal played when no recording is available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RadioSignal {
    /// Yes.
    Affirmative,
    /// No.
    Negative,
    /// Need backup.
    NeedBackup,
    /// Enemy spotted.
    EnemySpotted,
    /// Report in, team.
    ReportIn,
    /// Reporting in.
    ReportingIn,
    /// Follow me.
    FollowMe,
    /// Hold this position.
    HoldPosition,
    /// Go go go.
    GoGoGo,
    /// Sector clear.
    SectorClear,
}

/// One speakable recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhraseSound {
    /// Sound file handle.
    pub sound: String,
    /// Playback length in seconds.
    pub duration: f32,
    /// Only appropriate in this place.
    #[serde(default)]
    pub place: Option<PlaceId>,
    /// Only appropriate for this count.
    #[serde(default)]
    pub count: Option<u32>,
}

impl PhraseSound {
    /// Suitability for a place/count request; `None` if the variant doesn't fit.
    fn score(&self, place: Option<PlaceId>, count: Option<u32>) -> Option<u8> {
        let place_score = match self.place {
            None => 0,
            Some(p) if Some(p) == place => 2,
            Some(_) => return None,
        };
        let count_score = match self.count {
            None => 0,
            Some(c) if Some(c) == count => 1,
            Some(_) => return None,
        };
        Some(place_score + count_score)
    }
}

/// A named group of interchangeable variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phrase {
    /// Name statements refer to.
    pub name: String,
    /// Fallback signal.
    #[serde(default)]
    pub radio: Option<RadioSignal>,
    /// Recordings.
    #[serde(default, rename = "variant")]
    pub variants: Vec<PhraseSound>,
}

impl Phrase {
    /// Pick a variant, preferring place-specific, then count-matching, then
    /// generic recordings. Ties are broken by `rng`.
    pub fn select(
        &self,
        place: Option<PlaceId>,
        count: Option<u32>,
        rng: &mut dyn RngCore,
    ) -> Option<&PhraseSound> {
        let best = self
            .variants
            .iter()
            .filter_map(|v| v.score(place, count))
            .max()?;
        let candidates: Vec<&PhraseSound> = self
            .variants
            .iter()
            .filter(|v| v.score(place, count) == Some(best))
            .collect();
        candidates.choose(rng).copied()
    }
}

#[derive(Debug, Deserialize)]
struct PhraseFile {
    #[serde(default, rename = "phrase")]
    phrases: Vec<Phrase>,
}

/// Immutable set of phrases for one map.
#[derive(Debug, Clone, Default)]
pub struct PhraseBank {
    phrases: HashMap<String, Phrase>,
}

impl PhraseBank {
    /// Parse a bank from TOML.
    ///
    /// # Errors
    /// Returns `BotError::PhraseBank` on a parse error, a duplicate phrase
    /// name or a variant with a non-positive duration.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let file: PhraseFile =
            toml::from_str(toml_str).map_err(|e| BotError::PhraseBank(e.to_string()))?;
        let mut phrases = HashMap::with_capacity(file.phrases.len());
        for phrase in file.phrases {
            if let Some(bad) = phrase.variants.iter().find(|v| v.duration <= 0.0) {
                return Err(BotError::PhraseBank(format!(
                    "phrase '{}' variant '{}' has non-positive duration",
                    phrase.name, bad.sound
                )));
            }
            if phrases.contains_key(&phrase.name) {
                return Err(BotError::PhraseBank(format!(
                    "duplicate phrase '{}'",
                    phrase.name
                )));
            }
            phrases.insert(phrase.name.clone(), phrase);
        }
        Ok(Self { phrases })
    }

    /// Load a bank from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Build a bank from already-constructed phrases. Later duplicates win.
    #[must_use]
    pub fn from_phrases(phrases: impl IntoIterator<Item = Phrase>) -> Self {
        Self {
            phrases: phrases.into_iter().map(|p| (p.name.clone(), p)).collect(),
        }
    }

    /// Look up a phrase.
    ///
    /// # Errors
    /// Returns `BotError::UnknownPhrase` if the bank has no such phrase.
    pub fn get(&self, name: &str) -> Result<&Phrase> {
        self.phrases
            .get(name)
            .ok_or_else(|| BotError::UnknownPhrase(name.to_owned()))
    }

    /// Number of phrases.
    #[must_use]
    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    /// Whether the bank is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }
}

/// Process-wide phrase database with an explicit map lifecycle.
#[derive(Debug, Default)]
pub struct PhraseRegistry {
    current: RwLock<Option<Arc<PhraseBank>>>,
}

impl PhraseRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the bank for the map that is starting.
    pub fn load_for_map(&self, bank: PhraseBank) {
        info!(phrases = bank.len(), "Phrase bank loaded");
        *self.current.write() = Some(Arc::new(bank));
    }

    /// Drop the bank at map change.
    pub fn clear(&self) {
        *self.current.write() = None;
    }

    /// Snapshot of the current bank, if loaded.
    #[must_use]
    pub fn current(&self) -> Option<Arc<PhraseBank>> {
        self.current.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    const BANK: &str = r#"
[[phrase]]
name = "enemy_count"
radio = "enemy_spotted"

[[phrase.variant]]
sound = "two.wav"
duration = 1.0
count = 2

[[phrase.variant]]
sound = "many.wav"
duration = 0.8

[[phrase]]
name = "place"

[[phrase.variant]]
sound = "courtyard.wav"
duration = 0.6
place = 3

[[phrase]]
name = "report_in"
radio = "report_in"
"#;

    #[test]
    fn parses_bank() {
        let bank = PhraseBank::from_toml(BANK).expect("parse");
        assert_eq!(bank.len(), 3);
        assert_eq!(bank.get("report_in").expect("phrase").radio, Some(RadioSignal::ReportIn));
        assert!(matches!(bank.get("nope"), Err(BotError::UnknownPhrase(_))));
    }

    #[test]
    fn selection_prefers_specific_variants() {
        let bank = PhraseBank::from_toml(BANK).expect("parse");
        let mut rng = StdRng::seed_from_u64(1);
        let counts = bank.get("enemy_count").expect("phrase");
        assert_eq!(counts.select(None, Some(2), &mut rng).map(|v| v.sound.as_str()), Some("two.wav"));
        assert_eq!(counts.select(None, Some(5), &mut rng).map(|v| v.sound.as_str()), Some("many.wav"));

        let place = bank.get("place").expect("phrase");
        assert!(place.select(Some(PlaceId(3)), None, &mut rng).is_some());
        assert!(place.select(Some(PlaceId(4)), None, &mut rng).is_none());
    }

    #[test]
    fn rejects_duplicates_and_bad_durations() {
        let dup = "[[phrase]]\nname = \"a\"\n[[phrase]]\nname = \"a\"\n";
        assert!(matches!(PhraseBank::from_toml(dup), Err(BotError::PhraseBank(_))));

        let bad = "[[phrase]]\nname = \"a\"\n[[phrase.variant]]\nsound = \"x\"\nduration = 0.0\n";
        assert!(matches!(PhraseBank::from_toml(bad), Err(BotError::PhraseBank(_))));
    }

    #[test]
    fn registry_lifecycle() {
        let registry = PhraseRegistry::new();
        assert!(registry.current().is_none());
        registry.load_for_map(PhraseBank::from_toml(BANK).expect("parse"));
        assert_eq!(registry.current().map(|b| b.len()), Some(3));
        registry.clear();
        assert!(registry.current().is_none());
    }

    #[test]
    fn loads_from_disk() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        write!(file, "{BANK}").expect("write");
        let bank = PhraseBank::from_file(file.path()).expect("load");
        assert!(!bank.is_empty());
    }
}
