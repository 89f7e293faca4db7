//! Database schema migrations

use sqlx::PgPool;

const POSTGRES_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS conferences (
    position    BIGSERIAL,
    id          TEXT PRIMARY KEY,
    sealed_key  BYTEA NOT NULL,
    creator     UUID NOT NULL,
    start_time  BIGINT NOT NULL,
    end_time    BIGINT NOT NULL,
    phase       TEXT NOT NULL DEFAULT 'active',
    clear_value BIGINT,
    created_at  TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX IF NOT EXISTS idx_conferences_position ON conferences (position);

CREATE TABLE IF NOT EXISTS conference_events (
    seq           BIGSERIAL PRIMARY KEY,
    event_id      UUID NOT NULL UNIQUE,
    conference_id TEXT NOT NULL REFERENCES conferences (id),
    kind          TEXT NOT NULL,
    actor         UUID,
    details       JSONB NOT NULL,
    receipt_hash  BYTEA NOT NULL,
    occurred_at   TIMESTAMPTZ NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_conference_events_conference
    ON conference_events (conference_id, seq);
"#;

/// Apply the PostgreSQL schema. Idempotent; safe to run at every startup.
pub async fn run_postgres(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(POSTGRES_SCHEMA).execute(pool).await?;
    Ok(())
}
