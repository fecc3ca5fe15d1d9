// End-to-end ladder tests against an in-memory SQLite database:
// game stream filtering/ordering, rating computation, active-team
// filtering, metadata joins, and table dumps.

use chrono::{Duration, Utc};

use derby_ladder::db::{Database, TeamInfo};
use derby_ladder::ladder;

async fn test_db() -> Database {
    Database::new("sqlite::memory:").await.unwrap()
}

fn team(id: i64, genus: &str, region: &str) -> TeamInfo {
    TeamInfo {
        team: id,
        parent_team: None,
        league: format!("League {id}"),
        name: format!("Team {id}"),
        team_type: "Team".to_string(),
        location: String::new(),
        website: String::new(),
        region: region.to_string(),
        genus: genus.to_string(),
    }
}

fn recent(days_ago: i64) -> String {
    (Utc::now().date_naive() - Duration::days(days_ago))
        .format("%Y-%m-%d")
        .to_string()
}

async fn seed_women_teams(db: &Database, ids: &[i64]) {
    for &id in ids {
        db.add_team(&team(id, "Women", "Europe")).await.unwrap();
    }
}

// ── Ranking stream ───────────────────────────────────────────────────

#[tokio::test]
async fn test_ladder_orders_by_strength() {
    let db = test_db().await;
    seed_women_teams(&db, &[1, 2, 3]).await;

    // 1 crushes 2, 2 crushes 3, all recently.
    db.add_game(&recent(30), "18:00", 1, 2, Some(150), Some(20), None, "WFTDA")
        .await
        .unwrap();
    db.add_game(&recent(20), "18:00", 2, 3, Some(140), Some(30), None, "WFTDA")
        .await
        .unwrap();

    let rankings = ladder::compute_rankings(&db, Some("Women")).await.unwrap();
    assert_eq!(rankings.len(), 3);
    assert_eq!(ladder::sort_ladder(&rankings), vec![1, 2, 3]);
    assert!(rankings[&1] > rankings[&2]);
    assert!(rankings[&2] > rankings[&3]);
}

#[tokio::test]
async fn test_unplayed_games_are_ignored() {
    let db = test_db().await;
    seed_women_teams(&db, &[1, 2, 3]).await;

    db.add_game(&recent(10), "18:00", 1, 2, Some(90), Some(45), None, "WFTDA")
        .await
        .unwrap();
    // Scheduled but not yet played: no scores.
    db.add_game(&recent(-30), "18:00", 1, 3, None, None, None, "WFTDA")
        .await
        .unwrap();

    let rankings = ladder::compute_rankings(&db, Some("Women")).await.unwrap();
    assert!(rankings.contains_key(&1));
    assert!(rankings.contains_key(&2));
    assert!(!rankings.contains_key(&3));
}

#[tokio::test]
async fn test_exhibition_teams_never_ranked() {
    let db = test_db().await;
    seed_women_teams(&db, &[1, 2]).await;
    let mut exhibition = team(9, "Women", "Europe");
    exhibition.team_type = "Exhibition Team".to_string();
    db.add_team(&exhibition).await.unwrap();

    db.add_game(&recent(10), "18:00", 1, 2, Some(90), Some(45), None, "WFTDA")
        .await
        .unwrap();
    db.add_game(&recent(5), "18:00", 1, 9, Some(10), Some(200), None, "WFTDA")
        .await
        .unwrap();

    let rankings = ladder::compute_rankings(&db, Some("Women")).await.unwrap();
    assert!(!rankings.contains_key(&9));
    // The exhibition blowout loss must not have touched team 1 either.
    assert!(rankings[&1] > 0);
}

#[tokio::test]
async fn test_non_wftda_rulesets_excluded() {
    let db = test_db().await;
    seed_women_teams(&db, &[1, 2]).await;

    db.add_game(&recent(10), "18:00", 1, 2, Some(90), Some(45), None, "MRDA")
        .await
        .unwrap();

    let rankings = ladder::compute_rankings(&db, Some("Women")).await.unwrap();
    assert!(rankings.is_empty());
}

#[tokio::test]
async fn test_genus_filter_excludes_cross_division_games() {
    let db = test_db().await;
    seed_women_teams(&db, &[1, 2]).await;
    db.add_team(&team(5, "Men", "Europe")).await.unwrap();

    db.add_game(&recent(10), "18:00", 1, 2, Some(90), Some(45), None, "WFTDA")
        .await
        .unwrap();
    // Cross-division bout: only counts when ranking all divisions together.
    db.add_game(&recent(8), "18:00", 1, 5, Some(80), Some(60), None, "WFTDA")
        .await
        .unwrap();

    let women = ladder::compute_rankings(&db, Some("Women")).await.unwrap();
    assert!(!women.contains_key(&5));

    let all = ladder::compute_rankings(&db, None).await.unwrap();
    assert!(all.contains_key(&5));
}

#[tokio::test]
async fn test_games_stream_in_chronological_order() {
    let db = test_db().await;
    seed_women_teams(&db, &[1, 2]).await;

    // Inserted newest-first; the stream must come back oldest-first.
    db.add_game(&recent(5), "12:00", 1, 2, Some(50), Some(60), None, "WFTDA")
        .await
        .unwrap();
    db.add_game(&recent(50), "12:00", 2, 1, Some(70), Some(10), None, "WFTDA")
        .await
        .unwrap();
    db.add_game(&recent(5), "09:00", 2, 1, Some(30), Some(30), None, "WFTDA")
        .await
        .unwrap();

    let games = db.ranked_games(Some("Women")).await.unwrap();
    assert_eq!(games.len(), 3);
    assert_eq!((games[0].home_team, games[0].home_score), (2, 70));
    assert_eq!((games[1].home_team, games[1].home_score), (2, 30));
    assert_eq!((games[2].home_team, games[2].home_score), (1, 50));
}

#[tokio::test]
async fn test_hosting_flags_join_through() {
    let db = test_db().await;
    seed_women_teams(&db, &[1, 2, 3]).await;
    db.add_tournament(100, "East Coast Extravaganza").await.unwrap();
    db.add_tournament_host(100, 1).await.unwrap();

    let game_id = db
        .add_game(&recent(10), "10:00", 1, 2, Some(90), Some(45), Some(100), "WFTDA")
        .await
        .unwrap();
    db.add_sanctioning(game_id, "WFTDA").await.unwrap();
    db.add_game(&recent(10), "12:00", 2, 1, Some(60), Some(60), Some(100), "WFTDA")
        .await
        .unwrap();
    db.add_game(&recent(9), "12:00", 2, 3, Some(55), Some(65), None, "WFTDA")
        .await
        .unwrap();

    let games = db.ranked_games(Some("Women")).await.unwrap();
    assert_eq!(games.len(), 3);

    // Host playing at home.
    assert!(games[0].is_tournament && games[0].home_hosting && !games[0].away_hosting);
    // Host designated as the away side.
    assert!(games[1].is_tournament && !games[1].home_hosting && games[1].away_hosting);
    // Standalone bout carries no tournament metadata.
    assert!(!games[2].is_tournament && !games[2].home_hosting && !games[2].away_hosting);
}

// ── Active-team filtering ────────────────────────────────────────────

#[tokio::test]
async fn test_stale_teams_filtered_but_still_influence_opponents() {
    let db = test_db().await;
    seed_women_teams(&db, &[1, 2, 3]).await;

    // Team 3's only game is two years old; 1 and 2 played recently.
    db.add_game(&recent(700), "18:00", 1, 3, Some(120), Some(30), None, "WFTDA")
        .await
        .unwrap();
    db.add_game(&recent(30), "18:00", 1, 2, Some(80), Some(70), None, "WFTDA")
        .await
        .unwrap();

    let rankings = ladder::compute_rankings(&db, Some("Women")).await.unwrap();
    assert!(!rankings.contains_key(&3));
    // Team 1's rating still includes the win over the stale team.
    let games = db.ranked_games(Some("Women")).await.unwrap();
    assert_eq!(games.len(), 2);
    assert!(rankings[&1] > rankings[&2]);
}

#[tokio::test]
async fn test_scheduled_future_game_keeps_team_active() {
    let db = test_db().await;
    seed_women_teams(&db, &[1, 2, 3]).await;

    db.add_game(&recent(700), "18:00", 1, 3, Some(120), Some(30), None, "WFTDA")
        .await
        .unwrap();
    db.add_game(&recent(30), "18:00", 1, 2, Some(80), Some(70), None, "WFTDA")
        .await
        .unwrap();
    // Team 3 has a bout on the calendar, so it stays on the ladder.
    db.add_game(&recent(-60), "18:00", 3, 2, None, None, None, "WFTDA")
        .await
        .unwrap();

    let rankings = ladder::compute_rankings(&db, Some("Women")).await.unwrap();
    assert!(rankings.contains_key(&3));
}

// ── Metadata ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_team_info_inherits_parent_league() {
    let db = test_db().await;
    db.add_team(&team(1, "Women", "Europe")).await.unwrap();
    let mut b_team = team(2, "Women", "Europe");
    b_team.parent_team = Some(1);
    b_team.league = String::new();
    db.add_team(&b_team).await.unwrap();

    let info = db.team_info(&[1, 2]).await.unwrap();
    assert_eq!(info[&2].league, "League 1");
    assert_eq!(info[&1].league, "League 1");
}

#[tokio::test]
async fn test_team_info_missing_team_absent() {
    let db = test_db().await;
    db.add_team(&team(1, "Women", "Europe")).await.unwrap();
    let info = db.team_info(&[1, 42]).await.unwrap();
    assert!(info.contains_key(&1));
    assert!(!info.contains_key(&42));
}

// ── Dumps ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_table_dump_returns_rows() {
    let db = test_db().await;
    db.add_team(&team(1, "Women", "Pacific")).await.unwrap();

    let (headers, rows) = db.table_dump("teams").await.unwrap().unwrap();
    assert_eq!(headers[0], "team_id");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][0], "1");
    assert_eq!(rows[0][8], "Women");
}

#[tokio::test]
async fn test_table_dump_rejects_unknown_tables() {
    let db = test_db().await;
    assert!(db.table_dump("sqlite_master").await.unwrap().is_none());
    assert!(db.table_dump("teams; DROP TABLE teams").await.unwrap().is_none());
    assert!(db.table_dump("").await.unwrap().is_none());
}
