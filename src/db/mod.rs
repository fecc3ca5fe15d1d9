// Database access layer (SQLite via sqlx).

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::Row;

use crate::ranker::GameResult;

/// Display metadata for one team. A team belonging to a league through a
/// parent team reports the parent's league.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamInfo {
    pub team: i64,
    pub parent_team: Option<i64>,
    pub league: String,
    pub name: String,
    pub team_type: String,
    pub location: String,
    pub website: String,
    pub region: String,
    pub genus: String,
}

#[derive(Debug, sqlx::FromRow)]
struct TeamInfoRow {
    team_id: i64,
    parent_team: Option<i64>,
    league: String,
    parent_league: String,
    name: String,
    team_type: String,
    location: String,
    website: String,
    region: String,
    genus: String,
}

#[derive(Debug, sqlx::FromRow)]
struct GameRow {
    is_tournament: bool,
    home_hosting: bool,
    away_hosting: bool,
    home_team: i64,
    away_team: i64,
    home_score: i64,
    away_score: i64,
}

/// Tables exposed through the CSV dump endpoint, with their column lists.
/// Acts both as the whitelist and as the CSV headers.
const DUMP_TABLES: &[(&str, &[&str])] = &[
    (
        "teams",
        &[
            "team_id",
            "parent_team",
            "league",
            "name",
            "team_type",
            "location",
            "website",
            "region",
            "genus",
        ],
    ),
    (
        "games",
        &[
            "game_id",
            "day",
            "time",
            "home_team",
            "away_team",
            "home_score",
            "away_score",
            "tournament_id",
            "ruleset",
        ],
    ),
    ("tournaments", &["tournament_id", "name"]),
    ("tournament_hosts", &["tournament_id", "team_id"]),
    ("sanctioning", &["game_id", "body"]),
];

/// Names of all dumpable tables, for the endpoint's fallback listing.
pub fn dump_table_names() -> Vec<&'static str> {
    DUMP_TABLES.iter().map(|(name, _)| *name).collect()
}

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS teams (
                team_id INTEGER PRIMARY KEY,
                parent_team INTEGER REFERENCES teams(team_id),
                league TEXT,
                name TEXT,
                team_type TEXT NOT NULL DEFAULT 'Team',
                location TEXT,
                website TEXT,
                region TEXT,
                genus TEXT
            )
        "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS games (
                game_id INTEGER PRIMARY KEY,
                day TEXT NOT NULL,
                time TEXT NOT NULL DEFAULT '',
                home_team INTEGER NOT NULL REFERENCES teams(team_id),
                away_team INTEGER NOT NULL REFERENCES teams(team_id),
                home_score INTEGER,
                away_score INTEGER,
                tournament_id INTEGER REFERENCES tournaments(tournament_id),
                ruleset TEXT NOT NULL DEFAULT 'WFTDA'
            )
        "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS tournaments (
                tournament_id INTEGER PRIMARY KEY,
                name TEXT NOT NULL
            )
        "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS tournament_hosts (
                tournament_id INTEGER NOT NULL REFERENCES tournaments(tournament_id),
                team_id INTEGER NOT NULL REFERENCES teams(team_id),
                PRIMARY KEY (tournament_id, team_id)
            )
        "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sanctioning (
                game_id INTEGER NOT NULL REFERENCES games(game_id),
                body TEXT NOT NULL
            )
        "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // ── Ranking stream ────────────────────────────────────────────────

    /// Fetch the ordered game stream the ranker folds over: played WFTDA
    /// games between non-exhibition teams, joined with tournament hosting
    /// flags, in chronological order (day, then time, then game id as a
    /// stable tiebreak). `genus` restricts both sides to one division.
    pub async fn ranked_games(&self, genus: Option<&str>) -> Result<Vec<GameResult>, sqlx::Error> {
        let mut query = String::from(
            r#"
            SELECT games.tournament_id IS NOT NULL AS is_tournament,
                   host_h.team_id IS NOT NULL AS home_hosting,
                   host_a.team_id IS NOT NULL AS away_hosting,
                   games.home_team, games.away_team,
                   games.home_score, games.away_score
            FROM games
            JOIN teams AS team_h ON team_h.team_id = games.home_team
            JOIN teams AS team_a ON team_a.team_id = games.away_team
            LEFT JOIN tournament_hosts AS host_h
                ON host_h.tournament_id = games.tournament_id
                AND host_h.team_id = games.home_team
            LEFT JOIN tournament_hosts AS host_a
                ON host_a.tournament_id = games.tournament_id
                AND host_a.team_id = games.away_team
            WHERE team_h.team_type != 'Exhibition Team'
              AND team_a.team_type != 'Exhibition Team'
              AND games.ruleset = 'WFTDA'
              AND games.home_score IS NOT NULL
              AND games.away_score IS NOT NULL
        "#,
        );
        if genus.is_some() {
            query.push_str(" AND team_h.genus = ? AND team_a.genus = ?");
        }
        query.push_str(" ORDER BY games.day, games.time, games.game_id");

        let mut q = sqlx::query_as::<_, GameRow>(&query);
        if let Some(genus) = genus {
            q = q.bind(genus).bind(genus);
        }
        let rows = q.fetch_all(&self.pool).await?;

        Ok(rows
            .into_iter()
            .map(|r| GameResult {
                home_team: r.home_team,
                away_team: r.away_team,
                home_score: r.home_score,
                away_score: r.away_score,
                is_tournament: r.is_tournament,
                home_hosting: r.home_hosting,
                away_hosting: r.away_hosting,
            })
            .collect())
    }

    // ── Team metadata ─────────────────────────────────────────────────

    /// Look up display metadata for a set of teams. Teams with a parent
    /// inherit the parent's league.
    pub async fn team_info(&self, teams: &[i64]) -> Result<HashMap<i64, TeamInfo>, sqlx::Error> {
        if teams.is_empty() {
            return Ok(HashMap::new());
        }
        let placeholders = vec!["?"; teams.len()].join(",");
        let query = format!(
            r#"
            SELECT t.team_id, t.parent_team,
                   COALESCE(t.league, '') AS league,
                   COALESCE(p.league, '') AS parent_league,
                   COALESCE(t.name, '') AS name,
                   t.team_type,
                   COALESCE(t.location, '') AS location,
                   COALESCE(t.website, '') AS website,
                   COALESCE(t.region, '') AS region,
                   COALESCE(t.genus, '') AS genus
            FROM teams t
            LEFT JOIN teams p ON t.parent_team = p.team_id
            WHERE t.team_id IN ({placeholders})
        "#
        );
        let mut q = sqlx::query_as::<_, TeamInfoRow>(&query);
        for team in teams {
            q = q.bind(team);
        }
        let rows = q.fetch_all(&self.pool).await?;

        let mut result = HashMap::with_capacity(rows.len());
        for row in rows {
            let league = if row.parent_team.is_some() {
                row.parent_league
            } else {
                row.league
            };
            result.insert(
                row.team_id,
                TeamInfo {
                    team: row.team_id,
                    parent_team: row.parent_team,
                    league,
                    name: row.name,
                    team_type: row.team_type,
                    location: row.location,
                    website: row.website,
                    region: row.region,
                    genus: row.genus,
                },
            );
        }
        Ok(result)
    }

    /// Teams from the given set with any game (home or away side) dated
    /// within the past year. Future-dated scheduled games also match, which
    /// is what keeps a team with a planned bout on the ladder.
    pub async fn active_teams(&self, teams: &[i64]) -> Result<HashSet<i64>, sqlx::Error> {
        if teams.is_empty() {
            return Ok(HashSet::new());
        }
        let placeholders = vec!["?"; teams.len()].join(",");
        let query = format!(
            r#"
            SELECT DISTINCT team_id FROM (
                SELECT home_team AS team_id, day FROM games
                UNION ALL
                SELECT away_team AS team_id, day FROM games
            )
            WHERE day >= date('now', '-1 year')
              AND team_id IN ({placeholders})
        "#
        );
        let mut q = sqlx::query_scalar::<_, i64>(&query);
        for team in teams {
            q = q.bind(team);
        }
        let rows = q.fetch_all(&self.pool).await?;
        Ok(rows.into_iter().collect())
    }

    // ── Table dumps ───────────────────────────────────────────────────

    /// Dump a whitelisted table as (headers, text rows) for CSV export.
    /// Returns `None` for a table outside the whitelist; the whitelist is
    /// also what keeps the formatted query injection-safe.
    pub async fn table_dump(
        &self,
        table: &str,
    ) -> Result<Option<(Vec<&'static str>, Vec<Vec<String>>)>, sqlx::Error> {
        let Some((name, columns)) = DUMP_TABLES.iter().find(|(name, _)| *name == table) else {
            return Ok(None);
        };
        let select = columns
            .iter()
            .map(|c| format!("CAST({c} AS TEXT) AS {c}"))
            .collect::<Vec<_>>()
            .join(", ");
        let query = format!("SELECT {select} FROM {name}");

        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        let mut data = Vec::with_capacity(rows.len());
        for row in rows {
            let mut record = Vec::with_capacity(columns.len());
            for i in 0..columns.len() {
                let value: Option<String> = row.try_get(i)?;
                record.push(value.unwrap_or_default());
            }
            data.push(record);
        }
        Ok(Some((columns.to_vec(), data)))
    }

    // ── Insert helpers (loaders and tests) ────────────────────────────

    pub async fn add_team(&self, team: &TeamInfo) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO teams (team_id, parent_team, league, name, team_type,
                               location, website, region, genus)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
        )
        .bind(team.team)
        .bind(team.parent_team)
        .bind(&team.league)
        .bind(&team.name)
        .bind(&team.team_type)
        .bind(&team.location)
        .bind(&team.website)
        .bind(&team.region)
        .bind(&team.genus)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn add_game(
        &self,
        day: &str,
        time: &str,
        home_team: i64,
        away_team: i64,
        home_score: Option<i64>,
        away_score: Option<i64>,
        tournament_id: Option<i64>,
        ruleset: &str,
    ) -> Result<i64, sqlx::Error> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO games (day, time, home_team, away_team, home_score,
                               away_score, tournament_id, ruleset)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING game_id
        "#,
        )
        .bind(day)
        .bind(time)
        .bind(home_team)
        .bind(away_team)
        .bind(home_score)
        .bind(away_score)
        .bind(tournament_id)
        .bind(ruleset)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    pub async fn add_tournament(&self, tournament_id: i64, name: &str) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO tournaments (tournament_id, name) VALUES (?, ?)")
            .bind(tournament_id)
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn add_tournament_host(
        &self,
        tournament_id: i64,
        team_id: i64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO tournament_hosts (tournament_id, team_id) VALUES (?, ?)")
            .bind(tournament_id)
            .bind(team_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn add_sanctioning(&self, game_id: i64, body: &str) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO sanctioning (game_id, body) VALUES (?, ?)")
            .bind(game_id)
            .bind(body)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
