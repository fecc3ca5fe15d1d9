// Ladder assembly: turns the ranker's ratings map into the ranked,
// filtered list the API serves.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::db::{Database, TeamInfo};
use crate::error::LadderError;
use crate::metrics;
use crate::ranker::{Ranker, RATING_SCALE};

/// Recognized competitive divisions, in display order. The first is the
/// default ladder when no genus is requested.
pub const GENERA: &[&str] = &["Women", "Men", "Open to All"];

/// Recognized regions; the empty string means "any".
pub const REGIONS: &[&str] = &["", "Europe", "Northern America", "Latin America", "Pacific"];

/// One row of the rendered ladder.
#[derive(Debug, Clone, Serialize)]
pub struct LadderEntry {
    pub rank: usize,
    pub team: i64,
    pub name: String,
    pub league: String,
    pub location: String,
    pub website: String,
    pub region: String,
    pub rating: f64,
}

/// Compute the current rankings for one division.
///
/// Streams the ordered game history through a fresh [`Ranker`], then drops
/// teams with no game in the trailing year and none scheduled. Ratings are
/// never altered by the filtering, only hidden. `genus: None` ranks all
/// divisions together.
pub async fn compute_rankings(
    db: &Database,
    genus: Option<&str>,
) -> Result<HashMap<i64, i32>, LadderError> {
    let games = db.ranked_games(genus).await?;
    metrics::GAMES_RANKED_TOTAL.inc_by(games.len() as u64);

    let mut ranker = Ranker::new();
    for game in &games {
        ranker.add_game(game);
    }
    let rankings = ranker.rankings();

    let teams: Vec<i64> = rankings.keys().copied().collect();
    let active = db.active_teams(&teams).await?;
    metrics::LADDER_COMPUTATIONS_TOTAL.inc();

    Ok(retain_active(rankings, &active))
}

/// Restrict a rankings map to the active team set. Pure key filtering.
pub fn retain_active(rankings: HashMap<i64, i32>, active: &HashSet<i64>) -> HashMap<i64, i32> {
    rankings
        .into_iter()
        .filter(|(team, _)| active.contains(team))
        .collect()
}

/// Order teams by rating descending, team id ascending on ties. The tiebreak
/// keeps the ladder stable across runs regardless of map iteration order.
pub fn sort_ladder(rankings: &HashMap<i64, i32>) -> Vec<i64> {
    let mut ladder: Vec<i64> = rankings.keys().copied().collect();
    ladder.sort_by_key(|team| (std::cmp::Reverse(rankings[team]), *team));
    ladder
}

/// Scaled integer rating to the one-decimal display value.
pub fn display_rating(rating: i32) -> f64 {
    f64::from(rating) / f64::from(RATING_SCALE)
}

/// Join the sorted ladder with team metadata and apply the region filter.
/// Ranks are renumbered after filtering so the visible ladder is 1..n.
pub fn build_entries(
    ladder: &[i64],
    rankings: &HashMap<i64, i32>,
    info: &HashMap<i64, TeamInfo>,
    region: &str,
) -> Vec<LadderEntry> {
    let mut entries = Vec::with_capacity(ladder.len());
    let mut rank = 0;
    for &team in ladder {
        let Some(ti) = info.get(&team) else {
            continue;
        };
        if !region.is_empty() && ti.region != region {
            continue;
        }
        rank += 1;
        entries.push(LadderEntry {
            rank,
            team,
            name: ti.name.clone(),
            league: ti.league.clone(),
            location: ti.location.clone(),
            website: ti.website.clone(),
            region: ti.region.clone(),
            rating: display_rating(rankings[&team]),
        });
    }
    entries
}
