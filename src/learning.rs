use std::collections::VecDeque;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::constants::{
    learning_phase_for, CROWDED_GHOST_COUNT, CROWDED_MOVE_WEIGHT, LEARNING_PHASE_THRESHOLDS,
    MAX_LEARNING_HISTORY, NEARBY_GHOST_RADIUS, SEED_LEARNING_PHASE,
};
use crate::error::LearningStoreError;
use crate::types::{Direction, MoveContext, Tile};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MoveRecord {
    #[serde(rename = "prev_pos")]
    pub previous: Tile,
    #[serde(rename = "current_pos")]
    pub resulting: Tile,
    #[serde(rename = "move_data", default)]
    pub context: MoveContext,
    #[serde(rename = "nearby_ghosts", default)]
    pub nearby_ghosts: u32,
}

#[derive(Clone, Debug)]
pub struct LearningConfig {
    pub thresholds: Vec<u32>,
    pub max_history: usize,
    pub seed_phase: usize,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            thresholds: LEARNING_PHASE_THRESHOLDS.to_vec(),
            max_history: MAX_LEARNING_HISTORY,
            seed_phase: SEED_LEARNING_PHASE,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
struct LearningFile<'a> {
    move_count: u32,
    learning_phase: usize,
    move_history: &'a VecDeque<MoveRecord>,
    corner_count: u32,
    power_pellet_timing: &'a [f64],
    score_milestones: &'a [(u32, i32)],
    #[serde(rename = "LEARNING_PHASE_THRESHOLDS")]
    thresholds: &'a [u32],
}

#[derive(Clone, Debug, Default, Deserialize)]
struct LearningFileRaw {
    #[serde(default)]
    move_count: u32,
    #[serde(default)]
    move_history: Vec<serde_json::Value>,
    #[serde(default)]
    corner_count: u32,
    #[serde(default)]
    power_pellet_timing: Vec<f64>,
    #[serde(default)]
    score_milestones: Vec<(u32, i32)>,
    #[serde(
        rename = "LEARNING_PHASE_THRESHOLDS",
        alias = "learning_phase_thresholds",
        default
    )]
    thresholds: Vec<u32>,
}

#[derive(Clone, Debug)]
pub struct PredictionModel {
    config: LearningConfig,
    move_count: u32,
    learning_phase: usize,
    history: VecDeque<MoveRecord>,
    corner_count: u32,
    power_pellet_timing: Vec<f64>,
    score_milestones: Vec<(u32, i32)>,
}

impl PredictionModel {
    pub fn empty(config: LearningConfig) -> Self {
        let learning_phase = learning_phase_for(0, &config.thresholds);
        Self {
            config,
            move_count: 0,
            learning_phase,
            history: VecDeque::new(),
            corner_count: 0,
            power_pellet_timing: Vec::new(),
            score_milestones: Vec::new(),
        }
    }

    pub fn seeded(config: LearningConfig) -> Self {
        let mut model = Self::empty(config);
        model.reset();
        model
    }

    pub fn open(path: &Path, config: LearningConfig) -> Self {
        let mut model = Self::empty(config);
        match model.load(path) {
            Ok(true) => {
                info!(path = %path.display(), moves = model.move_count, "learning data loaded");
                return model;
            }
            Ok(false) => {
                debug!(path = %path.display(), "no learning data, starting from seed");
            }
            Err(error) => {
                warn!(path = %path.display(), %error, "failed to load learning data, starting from seed");
            }
        }
        model.reset();
        model
    }

    pub fn reset(&mut self) {
        self.history.clear();
        self.corner_count = 0;
        self.power_pellet_timing.clear();
        self.score_milestones.clear();
        for record in seed_history() {
            self.push_record(record);
        }
        self.move_count = self.history.len() as u32;
        self.learning_phase = self
            .config
            .seed_phase
            .min(self.config.thresholds.len().saturating_sub(1));
    }

    pub fn phase(&self) -> usize {
        self.learning_phase
    }

    pub fn move_count(&self) -> u32 {
        self.move_count
    }

    pub fn corner_count(&self) -> u32 {
        self.corner_count
    }

    pub fn history(&self) -> &VecDeque<MoveRecord> {
        &self.history
    }

    pub fn power_pellet_timing(&self) -> &[f64] {
        &self.power_pellet_timing
    }

    pub fn score_milestones(&self) -> &[(u32, i32)] {
        &self.score_milestones
    }

    pub fn thresholds(&self) -> &[u32] {
        &self.config.thresholds
    }

    pub fn record_move(
        &mut self,
        previous: Tile,
        resulting: Tile,
        context: MoveContext,
        ghost_positions: &[Tile],
    ) {
        self.move_count = self.move_count.saturating_add(1);
        let nearby_ghosts = ghost_positions
            .iter()
            .filter(|ghost| ghost.manhattan(resulting) <= NEARBY_GHOST_RADIUS)
            .count() as u32;
        if context.is_corner {
            self.corner_count += 1;
        }
        self.score_milestones.push((self.move_count, context.score));
        truncate_front(&mut self.score_milestones, self.config.max_history);
        self.push_record(MoveRecord {
            previous,
            resulting,
            context,
            nearby_ghosts,
        });
        self.learning_phase = learning_phase_for(self.move_count, &self.config.thresholds);
    }

    pub fn record_power_pellet_interval(&mut self, seconds: f64) {
        if seconds.is_finite() && seconds >= 0.0 {
            self.power_pellet_timing.push(seconds);
            truncate_front(&mut self.power_pellet_timing, self.config.max_history);
        }
    }

    pub fn predict(&self, current: Tile, _ghost_positions: &[Tile]) -> Tile {
        match self.learning_phase {
            0 => self.vote(current, |_| true),
            1 => self.vote(current, |record| record.context.is_corner),
            _ => self
                .history
                .back()
                .map(|record| record.resulting)
                .unwrap_or(current),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), LearningStoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let payload = LearningFile {
            move_count: self.move_count,
            learning_phase: self.learning_phase,
            move_history: &self.history,
            corner_count: self.corner_count,
            power_pellet_timing: &self.power_pellet_timing,
            score_milestones: &self.score_milestones,
            thresholds: &self.config.thresholds,
        };
        let text = serde_json::to_string_pretty(&payload)?;
        fs::write(path, text)?;
        debug!(path = %path.display(), moves = self.move_count, "learning data saved");
        Ok(())
    }

    pub fn load(&mut self, path: &Path) -> Result<bool, LearningStoreError> {
        let text = match fs::read_to_string(path) {
            Ok(value) => value,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(error) => return Err(error.into()),
        };
        let raw: LearningFileRaw = serde_json::from_str(&text)?;

        if !raw.thresholds.is_empty() && raw.thresholds != self.config.thresholds {
            debug!(
                path = %path.display(),
                stored = ?raw.thresholds,
                "stored phase thresholds differ from configuration, keeping configuration"
            );
        }

        self.history.clear();
        for (index, value) in raw.move_history.into_iter().enumerate() {
            match serde_json::from_value::<MoveRecord>(value) {
                Ok(record) => self.push_record(record),
                Err(error) => {
                    warn!(path = %path.display(), index, %error, "skipping malformed move record");
                }
            }
        }
        self.move_count = raw.move_count;
        self.corner_count = raw.corner_count;
        self.power_pellet_timing = raw
            .power_pellet_timing
            .into_iter()
            .filter(|value| value.is_finite() && *value >= 0.0)
            .collect();
        truncate_front(&mut self.power_pellet_timing, self.config.max_history);
        self.score_milestones = raw.score_milestones;
        truncate_front(&mut self.score_milestones, self.config.max_history);
        self.learning_phase = learning_phase_for(self.move_count, &self.config.thresholds);
        Ok(true)
    }

    fn push_record(&mut self, record: MoveRecord) {
        self.history.push_back(record);
        while self.history.len() > self.config.max_history {
            self.history.pop_front();
        }
    }

    fn vote<F>(&self, current: Tile, include: F) -> Tile
    where
        F: Fn(&MoveRecord) -> bool,
    {
        let mut scores: Vec<(Tile, f32)> = Vec::new();
        for record in &self.history {
            if record.previous != current || !include(record) {
                continue;
            }
            let weight = if record.nearby_ghosts >= CROWDED_GHOST_COUNT {
                CROWDED_MOVE_WEIGHT
            } else {
                1.0
            };
            match scores.iter_mut().find(|(tile, _)| *tile == record.resulting) {
                Some((_, score)) => *score += weight,
                None => scores.push((record.resulting, weight)),
            }
        }

        let mut best: Option<(Tile, f32)> = None;
        for (tile, score) in scores {
            if best.map(|(_, best_score)| score > best_score).unwrap_or(true) {
                best = Some((tile, score));
            }
        }
        best.map(|(tile, _)| tile).unwrap_or(current)
    }
}

// Keeps the newest `max` entries.
fn truncate_front<T>(entries: &mut Vec<T>, max: usize) {
    if entries.len() > max {
        entries.drain(..entries.len() - max);
    }
}

fn seed_history() -> Vec<MoveRecord> {
    let step = |from: (i32, i32), to: (i32, i32), dir: Direction, is_corner: bool| MoveRecord {
        previous: from.into(),
        resulting: to.into(),
        context: MoveContext {
            direction: Some(dir),
            is_corner,
            ..MoveContext::default()
        },
        nearby_ghosts: 0,
    };
    vec![
        step((1, 1), (2, 1), Direction::Right, false),
        step((2, 1), (3, 1), Direction::Right, false),
        step((3, 1), (4, 1), Direction::Right, true),
        step((4, 1), (4, 2), Direction::Down, false),
    ]
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    use proptest::prelude::*;

    use super::*;

    fn temp_file(name: &str) -> PathBuf {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        let unique = format!(
            "{}-{}-{}",
            name,
            std::process::id(),
            now.saturating_add(rand::random::<u32>() as u64)
        );
        std::env::temp_dir().join(unique).join("learning_data.json")
    }

    fn ctx(is_corner: bool) -> MoveContext {
        MoveContext {
            is_corner,
            ..MoveContext::default()
        }
    }

    fn config_with(thresholds: Vec<u32>) -> LearningConfig {
        LearningConfig {
            thresholds,
            ..LearningConfig::default()
        }
    }

    #[test]
    fn empty_history_predicts_queried_tile() {
        let frequency = PredictionModel::empty(LearningConfig::default());
        assert_eq!(frequency.phase(), 0);
        assert_eq!(frequency.predict(Tile::new(3, 3), &[]), Tile::new(3, 3));

        let corner = PredictionModel::empty(config_with(vec![0, 0]));
        assert_eq!(corner.phase(), 1);
        assert_eq!(corner.predict(Tile::new(3, 3), &[]), Tile::new(3, 3));

        let recency = PredictionModel::empty(config_with(vec![0, 0, 0]));
        assert_eq!(recency.predict(Tile::new(3, 3), &[]), Tile::new(3, 3));
    }

    #[test]
    fn frequency_vote_discounts_crowded_moves() {
        let mut model = PredictionModel::empty(config_with(vec![0, 1_000]));
        let from = Tile::new(1, 1);
        let crowd = [Tile::new(2, 1), Tile::new(3, 1), Tile::new(2, 2)];
        model.record_move(from, Tile::new(2, 1), ctx(false), &crowd);
        model.record_move(from, Tile::new(2, 1), ctx(false), &crowd);
        model.record_move(from, Tile::new(1, 2), ctx(false), &[]);
        assert_eq!(model.history()[0].nearby_ghosts, 3);
        assert_eq!(model.phase(), 0);
        assert_eq!(model.predict(from, &[]), Tile::new(1, 2));

        for _ in 0..5 {
            model.record_move(from, Tile::new(2, 1), ctx(false), &crowd);
        }
        // 7 * 0.2 = 1.4 now outweighs the single uncrowded move
        assert_eq!(model.predict(from, &[]), Tile::new(2, 1));
    }

    #[test]
    fn frequency_ties_keep_first_seen_tile() {
        let mut model = PredictionModel::empty(config_with(vec![0, 1_000]));
        let from = Tile::new(5, 5);
        model.record_move(from, Tile::new(5, 4), ctx(false), &[]);
        model.record_move(from, Tile::new(6, 5), ctx(false), &[]);
        assert_eq!(model.predict(from, &[]), Tile::new(5, 4));
    }

    #[test]
    fn corner_phase_only_counts_corner_moves() {
        let mut model = PredictionModel::empty(config_with(vec![0, 0, 1_000]));
        let from = Tile::new(4, 4);
        model.record_move(from, Tile::new(5, 4), ctx(false), &[]);
        model.record_move(from, Tile::new(5, 4), ctx(false), &[]);
        model.record_move(from, Tile::new(4, 5), ctx(true), &[]);
        assert_eq!(model.phase(), 1);
        assert_eq!(model.predict(from, &[]), Tile::new(4, 5));
        assert_eq!(model.predict(Tile::new(0, 0), &[]), Tile::new(0, 0));
        assert_eq!(model.corner_count(), 1);
    }

    #[test]
    fn recency_phase_returns_latest_result_anywhere() {
        let mut model = PredictionModel::empty(config_with(vec![0, 0, 0]));
        model.record_move(Tile::new(1, 1), Tile::new(1, 2), ctx(false), &[]);
        model.record_move(Tile::new(7, 7), Tile::new(8, 7), ctx(false), &[]);
        assert_eq!(model.phase(), 2);
        assert_eq!(model.predict(Tile::new(0, 0), &[]), Tile::new(8, 7));
    }

    #[test]
    fn seeded_model_starts_in_corner_phase() {
        let model = PredictionModel::seeded(LearningConfig::default());
        assert_eq!(model.move_count(), 4);
        assert_eq!(model.phase(), 1);
        assert_eq!(model.history().len(), 4);
        assert_eq!(model.predict(Tile::new(3, 1), &[]), Tile::new(4, 1));
        assert_eq!(model.predict(Tile::new(1, 1), &[]), Tile::new(1, 1));
    }

    #[test]
    fn reset_discards_recorded_moves() {
        let mut model = PredictionModel::seeded(LearningConfig::default());
        for step in 0..40 {
            model.record_move(Tile::new(step, 0), Tile::new(step + 1, 0), ctx(true), &[]);
        }
        model.record_power_pellet_interval(2.5);
        assert_eq!(model.phase(), 3);
        model.reset();
        assert_eq!(model.move_count(), 4);
        assert_eq!(model.phase(), 1);
        assert_eq!(model.corner_count(), 0);
        assert!(model.power_pellet_timing().is_empty());
        assert!(model.score_milestones().is_empty());
    }

    #[test]
    fn history_drops_oldest_beyond_cap() {
        let mut model = PredictionModel::empty(LearningConfig {
            max_history: 3,
            ..LearningConfig::default()
        });
        for step in 0..5 {
            model.record_move(Tile::new(step, 0), Tile::new(step + 1, 0), ctx(false), &[]);
        }
        assert_eq!(model.move_count(), 5);
        assert_eq!(model.history().len(), 3);
        assert_eq!(model.history()[0].previous, Tile::new(2, 0));
        assert_eq!(model.score_milestones(), &[(3, 0), (4, 0), (5, 0)]);

        for seconds in [1.0, 2.0, 3.0, 4.0] {
            model.record_power_pellet_interval(seconds);
        }
        assert_eq!(model.power_pellet_timing(), &[2.0, 3.0, 4.0]);
    }

    #[test]
    fn load_trims_side_logs_to_history_cap() {
        let path = temp_file("learning-side-logs");
        let parent = path.parent().expect("parent exists").to_path_buf();
        fs::create_dir_all(&parent).expect("create dir");
        let raw = r#"{
  "move_count": 5,
  "power_pellet_timing": [1.0, 2.0, 3.0],
  "score_milestones": [[1, 10], [2, 20], [3, 30], [4, 40], [5, 50]]
}"#;
        fs::write(&path, raw).expect("write file");

        let mut model = PredictionModel::empty(LearningConfig {
            max_history: 2,
            ..LearningConfig::default()
        });
        assert!(model.load(&path).expect("load learning data"));
        assert_eq!(model.power_pellet_timing(), &[2.0, 3.0]);
        assert_eq!(model.score_milestones(), &[(4, 40), (5, 50)]);

        let _ = fs::remove_dir_all(&parent);
    }

    #[test]
    fn save_then_load_restores_state() {
        let path = temp_file("learning-roundtrip");
        let mut model = PredictionModel::seeded(LearningConfig::default());
        model.record_move(
            Tile::new(4, 2),
            Tile::new(4, 3),
            MoveContext {
                direction: Some(Direction::Down),
                next_direction: Some(Direction::Left),
                is_corner: true,
                score: 30,
            },
            &[Tile::new(4, 4)],
        );
        model.record_power_pellet_interval(1.25);
        model.save(&path).expect("save learning data");

        let mut restored = PredictionModel::empty(LearningConfig::default());
        assert!(restored.load(&path).expect("load learning data"));
        assert_eq!(restored.move_count(), 5);
        assert_eq!(restored.phase(), 1);
        assert_eq!(restored.history(), model.history());
        assert_eq!(restored.corner_count(), 1);
        assert_eq!(restored.power_pellet_timing(), &[1.25]);
        assert_eq!(restored.score_milestones(), &[(5, 30)]);

        if let Some(parent) = path.parent() {
            let _ = fs::remove_dir_all(parent);
        }
    }

    #[test]
    fn missing_file_is_a_quiet_negative() {
        let path = temp_file("learning-missing");
        let mut model = PredictionModel::empty(LearningConfig::default());
        assert!(!model.load(&path).expect("missing file is not an error"));
        assert_eq!(model.move_count(), 0);
    }

    #[test]
    fn corrupt_file_is_reported_and_open_falls_back_to_seed() {
        let path = temp_file("learning-corrupt");
        let parent = path.parent().expect("parent exists").to_path_buf();
        fs::create_dir_all(&parent).expect("create dir");
        fs::write(&path, "{ not json").expect("write file");

        let mut model = PredictionModel::empty(LearningConfig::default());
        assert!(matches!(model.load(&path), Err(LearningStoreError::Parse(_))));

        let opened = PredictionModel::open(&path, LearningConfig::default());
        assert_eq!(opened.move_count(), 4);
        assert_eq!(opened.phase(), 1);

        let _ = fs::remove_dir_all(&parent);
    }

    #[test]
    fn save_failure_is_reported_and_model_is_untouched() {
        let path = temp_file("learning-save-blocked");
        let parent = path.parent().expect("parent exists").to_path_buf();
        fs::create_dir_all(&parent).expect("create dir");
        let blocker = parent.join("not-a-dir");
        fs::write(&blocker, "plain file").expect("write file");

        let model = PredictionModel::seeded(LearningConfig::default());
        let result = model.save(&blocker.join("learning.json"));
        assert!(matches!(result, Err(LearningStoreError::Io(_))));
        assert_eq!(model.move_count(), 4);
        assert_eq!(model.phase(), 1);
        assert_eq!(model.history().len(), 4);

        let _ = fs::remove_dir_all(&parent);
    }

    #[test]
    fn unreadable_path_is_an_io_error_and_open_falls_back_to_seed() {
        let path = temp_file("learning-dir");
        fs::create_dir_all(&path).expect("create dir in place of the file");

        let mut model = PredictionModel::empty(LearningConfig::default());
        assert!(matches!(model.load(&path), Err(LearningStoreError::Io(_))));
        assert_eq!(model.move_count(), 0);

        let opened = PredictionModel::open(&path, LearningConfig::default());
        assert_eq!(opened.move_count(), 4);
        assert_eq!(opened.phase(), 1);

        if let Some(parent) = path.parent() {
            let _ = fs::remove_dir_all(parent);
        }
    }

    #[test]
    fn load_tolerates_missing_fields_and_bad_records() {
        let path = temp_file("learning-partial");
        let parent = path.parent().expect("parent exists").to_path_buf();
        fs::create_dir_all(&parent).expect("create dir");
        let raw = r#"{
  "move_count": 31,
  "learning_phase": 0,
  "move_history": [
    {"prev_pos": [1, 1], "current_pos": [2, 1], "move_data": {"direction": "RIGHT"}},
    {"prev_pos": "broken"},
    {"prev_pos": [2, 1], "current_pos": [3, 1], "move_data": {"is_corner": true}, "nearby_ghosts": 2}
  ],
  "LEARNING_PHASE_THRESHOLDS": [0, 1, 2, 3]
}"#;
        fs::write(&path, raw).expect("write file");

        let mut model = PredictionModel::empty(LearningConfig::default());
        assert!(model.load(&path).expect("load partial file"));
        assert_eq!(model.thresholds(), &LEARNING_PHASE_THRESHOLDS[..]);
        assert_eq!(model.move_count(), 31);
        assert_eq!(model.phase(), 3);
        assert_eq!(model.history().len(), 2);
        assert_eq!(model.history()[1].nearby_ghosts, 2);
        assert_eq!(model.corner_count(), 0);
        assert!(model.power_pellet_timing().is_empty());

        let _ = fs::remove_dir_all(&parent);
    }

    #[test]
    fn save_uses_stable_field_names() {
        let path = temp_file("learning-format");
        let model = PredictionModel::seeded(LearningConfig::default());
        model.save(&path).expect("save learning data");
        let text = fs::read_to_string(&path).expect("read back");
        let value: serde_json::Value = serde_json::from_str(&text).expect("valid json");
        assert_eq!(value["move_count"], 4);
        assert_eq!(value["learning_phase"], 1);
        assert_eq!(value["move_history"][0]["prev_pos"], serde_json::json!([1, 1]));
        assert_eq!(value["move_history"][2]["move_data"]["is_corner"], true);
        assert_eq!(value["LEARNING_PHASE_THRESHOLDS"][1], 5);

        if let Some(parent) = path.parent() {
            let _ = fs::remove_dir_all(parent);
        }
    }

    proptest! {
        #[test]
        fn phase_tracks_move_count_and_never_drops(
            steps in proptest::collection::vec((0i32..6, 0i32..6, any::<bool>()), 1..120),
        ) {
            let mut model = PredictionModel::empty(LearningConfig::default());
            let mut last_phase = model.phase();
            for (x, y, corner) in steps {
                model.record_move(Tile::new(x, y), Tile::new(x + 1, y), ctx(corner), &[]);
                let expected = LEARNING_PHASE_THRESHOLDS
                    .iter()
                    .rposition(|t| model.move_count() >= *t)
                    .unwrap_or(0);
                prop_assert_eq!(model.phase(), expected);
                prop_assert!(model.phase() >= last_phase);
                last_phase = model.phase();
            }
        }
    }
}
