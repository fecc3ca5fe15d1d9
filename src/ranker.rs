// Game-by-game rating engine.
//
// Folds a chronologically ordered stream of game results into per-team
// strength ratings. Games MUST be fed in chronological order: the update
// for each game depends on the ratings both teams carried into it, so a
// reordered stream produces a different (and wrong) trajectory. The caller
// is responsible for ordering; this module only debug-asserts the cheap
// invariants.

use std::collections::HashMap;

/// Ratings are stored as integers in tenths of a display point.
/// Divide by this to get the one-decimal rating shown to users.
pub const RATING_SCALE: i32 = 10;

/// Rating every team starts from when it is first seen.
pub const INITIAL_RATING: i32 = 0;

/// One played game, pre-joined with its tournament/venue metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameResult {
    pub home_team: i64,
    pub away_team: i64,
    pub home_score: i64,
    pub away_score: i64,
    /// Part of a sanctioned tournament bracket (not a standalone bout).
    pub is_tournament: bool,
    /// The home team is the host organization of this game's tournament.
    pub home_hosting: bool,
    /// The away team is the host organization of this game's tournament.
    pub away_hosting: bool,
}

/// Tuning constants for the rating update.
///
/// All of these are in tenths-of-a-point rating units unless noted. The
/// defaults are a starting point, not gospel; they are grouped here so the
/// ladder's behavior can be adjusted without touching the update code.
#[derive(Debug, Clone)]
pub struct RankerConfig {
    /// Rating points (tenths) moved per unit of surprise, before the
    /// tournament multiplier.
    pub base_gain: f64,
    /// Learning-rate multiplier applied to tournament games. Tournaments
    /// sample a team's strength more densely than standalone bouts, so
    /// they weigh heavier by default.
    pub tournament_weight: f64,
    /// Offset (tenths) added to the home side's rating edge when the venue
    /// is a true home venue. See [`Ranker::add_game`] for when it applies.
    pub home_advantage: f64,
    /// Slope of the logistic expected-outcome curve (tenths). An edge of
    /// this size makes the favorite a ~10:1 expected winner, as in Elo.
    pub expected_slope: f64,
    /// Score margin (game points) at which the actual-outcome squash
    /// reaches halfway to saturation. Larger margins keep counting, but
    /// with diminishing effect.
    pub margin_scale: f64,
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self {
            base_gain: 100.0,
            tournament_weight: 1.5,
            home_advantage: 25.0,
            expected_slope: 400.0,
            margin_scale: 30.0,
        }
    }
}

/// Online rating engine. One instance per independent ranking computation;
/// instances share no state.
#[derive(Debug, Clone)]
pub struct Ranker {
    config: RankerConfig,
    ratings: HashMap<i64, i32>,
}

impl Ranker {
    pub fn new() -> Self {
        Self::with_config(RankerConfig::default())
    }

    pub fn with_config(config: RankerConfig) -> Self {
        Self {
            config,
            ratings: HashMap::new(),
        }
    }

    /// Expected home outcome in [0, 1] for a given rating edge (tenths),
    /// where 0.5 means a coin flip.
    fn expected_outcome(&self, edge: f64) -> f64 {
        1.0 / (1.0 + 10f64.powf(-edge / self.config.expected_slope))
    }

    /// Actual home outcome in [0, 1] from the score margin. A tie maps to
    /// 0.5; each additional point of margin adds less than the one before
    /// it, so a blowout cannot dominate the ranking.
    fn actual_outcome(&self, margin: f64) -> f64 {
        0.5 + 0.5 * margin / (margin.abs() + self.config.margin_scale)
    }

    /// Ingest one game and update both teams' ratings.
    ///
    /// Teams are created at [`INITIAL_RATING`] on first mention. The home
    /// side receives the venue offset unless either team hosts the game's
    /// tournament: with a host involved, both teams are guests of the host
    /// organization and the "home" label is bracket bookkeeping, not a
    /// venue edge. The home team gains exactly what the away team loses.
    ///
    /// Precondition: called in chronological game order with two distinct
    /// team ids. Violations are caller data errors, not recoverable here.
    pub fn add_game(&mut self, game: &GameResult) {
        debug_assert_ne!(game.home_team, game.away_team);

        let home = *self
            .ratings
            .entry(game.home_team)
            .or_insert(INITIAL_RATING);
        let away = *self
            .ratings
            .entry(game.away_team)
            .or_insert(INITIAL_RATING);

        let venue = if game.home_hosting || game.away_hosting {
            0.0
        } else {
            self.config.home_advantage
        };
        let edge = f64::from(home - away) + venue;
        let expected = self.expected_outcome(edge);
        let actual = self.actual_outcome((game.home_score - game.away_score) as f64);

        let weight = if game.is_tournament {
            self.config.tournament_weight
        } else {
            1.0
        };
        let delta = (self.config.base_gain * weight * (actual - expected)).round() as i32;

        self.ratings.insert(game.home_team, home + delta);
        self.ratings.insert(game.away_team, away - delta);
    }

    /// Snapshot of every team seen so far, keyed by team id, values in
    /// tenths. Non-destructive: calling this repeatedly without further
    /// games returns identical maps.
    pub fn rankings(&self) -> HashMap<i64, i32> {
        self.ratings.clone()
    }

    /// Current rating for one team, if it has played.
    pub fn rating(&self, team: i64) -> Option<i32> {
        self.ratings.get(&team).copied()
    }
}

impl Default for Ranker {
    fn default() -> Self {
        Self::new()
    }
}
