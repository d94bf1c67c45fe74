//! Schema definitions and migration runner for SurrealDB.
//!
//! All tables are SCHEMAFULL. UUIDs are stored as strings and double as
//! record keys; enums are stored as strings guarded by ASSERT clauses.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "components_and_scenarios",
        sql: SCHEMA_V1,
    },
    Migration {
        version: 2,
        name: "scenario_resources",
        sql: SCHEMA_V2,
    },
];

// -----------------------------------------------------------------------
// Schema v1: users, scenarios, components and their configurations
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Users
-- =======================================================================
DEFINE TABLE user SCHEMAFULL;
DEFINE FIELD username ON TABLE user TYPE string;
DEFINE FIELD email ON TABLE user TYPE string;
DEFINE FIELD role ON TABLE user TYPE string \
    ASSERT $value IN ['Admin', 'User', 'Guest', 'Download'];
DEFINE FIELD active ON TABLE user TYPE bool DEFAULT true;
DEFINE FIELD created_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_user_username ON TABLE user COLUMNS username UNIQUE;

-- =======================================================================
-- Scenarios
-- =======================================================================
DEFINE TABLE scenario SCHEMAFULL;
DEFINE FIELD name ON TABLE scenario TYPE string;
DEFINE FIELD description ON TABLE scenario TYPE string;
DEFINE FIELD is_locked ON TABLE scenario TYPE bool DEFAULT false;
DEFINE FIELD start_parameters ON TABLE scenario TYPE object FLEXIBLE \
    DEFAULT {};
DEFINE FIELD created_at ON TABLE scenario TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE scenario TYPE datetime \
    DEFAULT time::now();

-- =======================================================================
-- Infrastructure components (keyed by external UUID)
-- =======================================================================
DEFINE TABLE component SCHEMAFULL;
DEFINE FIELD name ON TABLE component TYPE string;
DEFINE FIELD category ON TABLE component TYPE string;
DEFINE FIELD component_type ON TABLE component TYPE string;
DEFINE FIELD location ON TABLE component TYPE string DEFAULT '';
DEFINE FIELD description ON TABLE component TYPE string DEFAULT '';
DEFINE FIELD websocket_url ON TABLE component TYPE string DEFAULT '';
DEFINE FIELD api_url ON TABLE component TYPE string DEFAULT '';
DEFINE FIELD state ON TABLE component TYPE string DEFAULT 'unknown';
DEFINE FIELD uptime ON TABLE component TYPE float DEFAULT 0.0;
DEFINE FIELD managed_externally ON TABLE component TYPE bool \
    DEFAULT false;
DEFINE FIELD manager ON TABLE component TYPE option<string>;
DEFINE FIELD status_update_raw ON TABLE component TYPE any \
    DEFAULT {};
DEFINE FIELD start_parameter_schema ON TABLE component TYPE any \
    DEFAULT {};
DEFINE FIELD create_parameter_schema ON TABLE component TYPE any \
    DEFAULT {};
DEFINE FIELD created_at ON TABLE component TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD state_updated_at ON TABLE component TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_component_state ON TABLE component COLUMNS state;

-- =======================================================================
-- Component configurations (scenario scope, reference a component)
-- =======================================================================
DEFINE TABLE component_configuration SCHEMAFULL;
DEFINE FIELD scenario_id ON TABLE component_configuration TYPE string;
DEFINE FIELD ic_id ON TABLE component_configuration TYPE string;
DEFINE FIELD name ON TABLE component_configuration TYPE string;
DEFINE FIELD start_parameters ON TABLE component_configuration \
    TYPE object FLEXIBLE DEFAULT {};
DEFINE FIELD created_at ON TABLE component_configuration TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE component_configuration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_config_scenario ON TABLE component_configuration \
    COLUMNS scenario_id;
DEFINE INDEX idx_config_ic ON TABLE component_configuration \
    COLUMNS ic_id;

-- =======================================================================
-- Graph Edge Tables (relations)
-- =======================================================================

-- User -> Scenario access
DEFINE TABLE has_access TYPE RELATION SCHEMAFULL;
DEFINE INDEX idx_has_access_pair ON TABLE has_access \
    COLUMNS in, out UNIQUE;
";

// -----------------------------------------------------------------------
// Schema v2: records owned by scenarios and configurations
// -----------------------------------------------------------------------

const SCHEMA_V2: &str = "\
-- =======================================================================
-- Signals (configuration scope)
-- =======================================================================
DEFINE TABLE signal SCHEMAFULL;
DEFINE FIELD config_id ON TABLE signal TYPE string;
DEFINE FIELD name ON TABLE signal TYPE string;
DEFINE FIELD unit ON TABLE signal TYPE string;
DEFINE FIELD signal_index ON TABLE signal TYPE int;
DEFINE FIELD direction ON TABLE signal TYPE string \
    ASSERT $value IN ['In', 'Out'];
DEFINE FIELD scaling_factor ON TABLE signal TYPE float DEFAULT 1.0;
DEFINE INDEX idx_signal_config ON TABLE signal COLUMNS config_id;

-- =======================================================================
-- Dashboards (scenario scope) and widgets (dashboard scope)
-- =======================================================================
DEFINE TABLE dashboard SCHEMAFULL;
DEFINE FIELD scenario_id ON TABLE dashboard TYPE string;
DEFINE FIELD name ON TABLE dashboard TYPE string;
DEFINE FIELD grid ON TABLE dashboard TYPE int DEFAULT 15;

DEFINE TABLE widget SCHEMAFULL;
DEFINE FIELD dashboard_id ON TABLE widget TYPE string;
DEFINE FIELD name ON TABLE widget TYPE string;
DEFINE FIELD widget_type ON TABLE widget TYPE string;
DEFINE FIELD custom_properties ON TABLE widget TYPE object FLEXIBLE \
    DEFAULT {};

-- =======================================================================
-- Files and results (scenario scope)
-- =======================================================================
DEFINE TABLE file SCHEMAFULL;
DEFINE FIELD scenario_id ON TABLE file TYPE string;
DEFINE FIELD name ON TABLE file TYPE string;
DEFINE FIELD content_type ON TABLE file TYPE string;
DEFINE FIELD size ON TABLE file TYPE int DEFAULT 0;
DEFINE FIELD updated_at ON TABLE file TYPE datetime \
    DEFAULT time::now();

DEFINE TABLE simulation_result SCHEMAFULL;
DEFINE FIELD scenario_id ON TABLE simulation_result TYPE string;
DEFINE FIELD description ON TABLE simulation_result TYPE string;
DEFINE FIELD config_snapshots ON TABLE simulation_result TYPE any DEFAULT {};
DEFINE FIELD created_at ON TABLE simulation_result TYPE datetime \
    DEFAULT time::now();
";

// -----------------------------------------------------------------------
// Runner
// -----------------------------------------------------------------------

/// Bring the database up to [`latest_version`].
///
/// Each pending migration runs in its own transaction together with the
/// `_migration` row recording it, so a failed migration leaves no trace
/// and is retried on the next run.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let current = current_version(db).await?;
    for migration in pending(current) {
        apply(db, migration).await?;
    }

    Ok(())
}

/// Highest schema version this build knows about.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map(|m| m.version).unwrap_or(0)
}

async fn current_version<C: Connection>(db: &Surreal<C>) -> Result<u32, DbError> {
    let mut result = db
        .query("SELECT version FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    Ok(records.first().map(|m| m.version).unwrap_or(0))
}

fn pending(current: u32) -> impl Iterator<Item = &'static Migration> {
    MIGRATIONS.iter().filter(move |m| m.version > current)
}

async fn apply<C: Connection>(db: &Surreal<C>, migration: &Migration) -> Result<(), DbError> {
    info!(
        version = migration.version,
        name = migration.name,
        "Applying migration"
    );

    let batch = format!(
        "BEGIN TRANSACTION;\n{}\nCREATE _migration SET version = $version, name = $name;\nCOMMIT TRANSACTION;",
        migration.sql
    );
    db.query(batch)
        .bind(("version", migration.version))
        .bind(("name", migration.name))
        .await?
        .check()
        .map_err(|e| {
            DbError::Migration(format!(
                "v{} ({}): {e}",
                migration.version, migration.name
            ))
        })?;

    Ok(())
}
