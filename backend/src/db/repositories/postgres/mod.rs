//! Postgres repository implementation using Diesel.
//!
//! Blocks are stored relationally (`schedule_blocks` → `schedule_days` →
//! `schedule_slots`) and reassembled into owned trees on read.
//!
//! ## Write atomicity
//!
//! Writes run in one READ COMMITTED transaction. The transaction takes
//! `pg_advisory_xact_lock` on the offering's teacher and room keys before it reads
//! any schedule rows, so detection after the lock sees every committed competitor.
//! Updates first lock the block row with `FOR UPDATE` and merge the patch onto the
//! row they hold. Connection failures go through the retry loop.
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DATABASE_URL` or `PG_DATABASE_URL`: Connection string (required)
//! - `PG_POOL_MAX`: Maximum pool size (default: 10)
//! - `PG_POOL_MIN`: Minimum pool size (default: 1)
//! - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
//! - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)
//! - `PG_MAX_RETRIES`: Maximum retry attempts for transient failures (default: 3)
//! - `PG_RETRY_DELAY_MS`: Initial retry delay in milliseconds (default: 100)

use async_trait::async_trait;
use chrono::Utc;
use diesel::pg::{Pg, PgConnection};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sql_query;
use diesel::sql_types::BigInt;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use log::{info, warn};
use std::collections::HashMap;
use std::time::Duration;
use tokio::task;

use crate::db::models::{BlockQuery, Page};
use crate::api::UpdateBlockRequest;
use crate::db::repository::{
    merge_patch, CatalogRepository, ErrorContext, RepositoryError, RepositoryResult,
    ScheduleRepository,
};
use crate::models::{
    BlockDraft, BlockFields, BlockId, ConflictRecord, CourseOffering, DayId,
    DayPlan, OfferingId, RepeatPolicy, RoomId, ScheduleBlock, ScheduleDay, ScheduleKind,
    ScheduleSlot, ScheduleSlotId, SlotDefinition, SlotNumber, TeacherId, Weekday,
};
use crate::scheduler::{detect_conflicts, CandidateSet};

mod models;
mod schema;

use models::*;
use schema::*;

type PgPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/db/repositories/postgres/migrations");

/// Configuration for connecting to Postgres.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_pool_size: u32,
    /// Minimum number of connections in the pool
    pub min_pool_size: u32,
    /// Connection timeout in seconds
    pub connection_timeout_sec: u64,
    /// Idle connection timeout in seconds
    pub idle_timeout_sec: u64,
    /// Maximum number of retry attempts for transient failures
    pub max_retries: u32,
    /// Initial retry delay in milliseconds (doubles with each retry)
    pub retry_delay_ms: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_pool_size: 10,
            min_pool_size: 1,
            connection_timeout_sec: 30,
            idle_timeout_sec: 600,
            max_retries: 3,
            retry_delay_ms: 100,
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl PostgresConfig {
    /// Reads the connection settings listed in the module docs. Unset or unparsable
    /// values fall back to the defaults.
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("PG_DATABASE_URL"))
            .map_err(|_| "DATABASE_URL or PG_DATABASE_URL must be set".to_string())?;
        let defaults = Self::default();

        Ok(Self {
            database_url,
            max_pool_size: env_or("PG_POOL_MAX", defaults.max_pool_size),
            min_pool_size: env_or("PG_POOL_MIN", defaults.min_pool_size),
            connection_timeout_sec: env_or("PG_CONN_TIMEOUT_SEC", defaults.connection_timeout_sec),
            idle_timeout_sec: env_or("PG_IDLE_TIMEOUT_SEC", defaults.idle_timeout_sec),
            max_retries: env_or("PG_MAX_RETRIES", defaults.max_retries),
            retry_delay_ms: env_or("PG_RETRY_DELAY_MS", defaults.retry_delay_ms),
        })
    }
}

/// Diesel-backed schedule repository with a pooled connection and embedded
/// migrations.
#[derive(Clone, Debug)]
pub struct PostgresRepository {
    pool: PgPool,
    config: PostgresConfig,
}

impl PostgresRepository {
    /// Create a new repository and run pending migrations.
    ///
    /// # Arguments
    /// * `config` - Database configuration
    ///
    /// # Returns
    /// * `Ok(PostgresRepository)` on success
    /// * `Err(RepositoryError)` if connection or migration fails
    pub fn new(config: PostgresConfig) -> RepositoryResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .min_idle(Some(config.min_pool_size))
            .connection_timeout(Duration::from_secs(config.connection_timeout_sec))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_sec)))
            .test_on_check_out(true) // Validate connections before use
            .build(manager)
            .map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("create_pool")
                        .with_details(format!("max_size={}", config.max_pool_size)),
                )
            })?;

        // Run migrations once during initialization
        {
            let mut conn = pool.get().map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("get_connection_for_migrations"),
                )
            })?;
            Self::run_migrations(&mut conn)?;
        }

        Ok(Self { pool, config })
    }

    /// Run pending database migrations.
    fn run_migrations(conn: &mut PgConnection) -> RepositoryResult<()> {
        conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Migration failed: {}", e),
                ErrorContext::new("run_migrations"),
            )
        })?;

        Ok(())
    }

    /// Execute a database operation with automatic retry for transient failures.
    ///
    /// Retries up to `max_retries` times on retryable errors. The closure is re-run
    /// from scratch, so a retried write transaction re-detects conflicts.
    async fn with_conn<T, F>(&self, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + 'static + Clone,
    {
        let pool = self.pool.clone();
        let max_retries = self.config.max_retries;
        let retry_delay_ms = self.config.retry_delay_ms;

        task::spawn_blocking(move || {
            let mut last_error = None;
            let mut retry_delay = Duration::from_millis(retry_delay_ms);

            for attempt in 0..=max_retries {
                if attempt > 0 {
                    std::thread::sleep(retry_delay);
                    retry_delay *= 2; // Exponential backoff
                }

                // Get connection
                let mut conn = match pool.get() {
                    Ok(c) => c,
                    Err(e) => {
                        let err = RepositoryError::connection_with_context(
                            e.to_string(),
                            ErrorContext::new("get_connection")
                                .with_details(format!("attempt={}", attempt + 1))
                                .retryable(),
                        );
                        if attempt < max_retries {
                            last_error = Some(err);
                            continue;
                        }
                        return Err(err);
                    }
                };

                match f.clone()(&mut conn) {
                    Ok(result) => return Ok(result),
                    Err(e) if e.is_retryable() && attempt < max_retries => {
                        warn!("Retrying after transient failure (attempt {}): {}", attempt + 1, e);
                        last_error = Some(e);
                        continue;
                    }
                    Err(e) => return Err(e),
                }
            }

            Err(last_error.unwrap_or_else(|| {
                RepositoryError::internal("Max retries exceeded with no error captured")
            }))
        })
        .await
        .map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Task join error: {}", e),
                ErrorContext::new("spawn_blocking"),
            )
        })?
    }
}

fn map_diesel_error(err: diesel::result::Error) -> RepositoryError {
    RepositoryError::from(err)
}

fn not_found(entity: &str, id: impl ToString, operation: &str) -> RepositoryError {
    let id = id.to_string();
    RepositoryError::not_found_with_context(
        format!("{} {} not found", entity, id),
        ErrorContext::new(operation)
            .with_entity(entity)
            .with_entity_id(id),
    )
}

fn corrupt_row(message: String, block_id: i64) -> RepositoryError {
    RepositoryError::internal_with_context(
        message,
        ErrorContext::new("load_block")
            .with_entity("ScheduleBlock")
            .with_entity_id(block_id),
    )
}

// ==================== Row conversion ====================

fn row_to_offering(row: CourseOfferingRow) -> CourseOffering {
    CourseOffering {
        id: OfferingId::new(row.course_offering_id),
        teacher_id: row.teacher_id.map(TeacherId::new),
        room_id: row.room_id.map(RoomId::new),
        credits: row.credits.and_then(|c| u32::try_from(c).ok()),
    }
}

fn row_to_slot_definition(row: SlotRow) -> RepositoryResult<SlotDefinition> {
    let slot_number = SlotNumber::new(i64::from(row.slot_number)).ok_or_else(|| {
        RepositoryError::internal(format!(
            "Slot catalog row {} has out-of-range slot number {}",
            row.slot_id, row.slot_number
        ))
    })?;
    Ok(SlotDefinition {
        slot_ref_id: row.slot_id,
        slot_number,
        start_time: row.start_time,
        end_time: row.end_time,
    })
}

fn fields_to_row(fields: &BlockFields) -> BlockFieldsRow {
    BlockFieldsRow {
        course_offering_id: fields.course_offering_id.value(),
        kind: fields.kind.as_str().to_string(),
        group_label: fields.group_label.clone(),
        start_date: fields.start_date,
        end_date: fields.end_date,
        repeat_policy: fields.repeat_policy.as_str().to_string(),
        repeat_weeks: fields.repeat_weeks.and_then(|w| i32::try_from(w).ok()),
    }
}

fn row_to_block(
    row: ScheduleBlockRow,
    days: Vec<(ScheduleDayRow, Vec<ScheduleSlotRow>)>,
) -> RepositoryResult<ScheduleBlock> {
    let block_id = row.block_id;
    let kind: ScheduleKind = row
        .kind
        .parse()
        .map_err(|e: String| corrupt_row(e, block_id))?;
    let repeat_policy: RepeatPolicy = row
        .repeat_policy
        .parse()
        .map_err(|e: String| corrupt_row(e, block_id))?;

    let mut schedule_days = Vec::with_capacity(days.len());
    for (day, slot_rows) in days {
        let weekday = Weekday::new(i64::from(day.weekday)).ok_or_else(|| {
            corrupt_row(format!("day {} has weekday {}", day.day_id, day.weekday), block_id)
        })?;
        let mut slots = Vec::with_capacity(slot_rows.len());
        for slot in slot_rows {
            let slot_number = SlotNumber::new(i64::from(slot.slot_number)).ok_or_else(|| {
                corrupt_row(
                    format!("slot {} has number {}", slot.slot_row_id, slot.slot_number),
                    block_id,
                )
            })?;
            slots.push(ScheduleSlot {
                id: ScheduleSlotId::new(slot.slot_row_id),
                slot_number,
                slot_ref_id: slot.slot_ref_id,
            });
        }
        schedule_days.push(ScheduleDay {
            id: DayId::new(day.day_id),
            weekday,
            slots,
        });
    }

    Ok(ScheduleBlock {
        id: BlockId::new(block_id),
        course_offering_id: OfferingId::new(row.course_offering_id),
        kind,
        group_label: row.group_label,
        start_date: row.start_date,
        end_date: row.end_date,
        repeat_policy,
        repeat_weeks: row.repeat_weeks.and_then(|w| u32::try_from(w).ok()),
        days: schedule_days,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

// ==================== Connection-level helpers ====================

fn load_offering(
    conn: &mut PgConnection,
    offering_id: OfferingId,
    operation: &str,
) -> RepositoryResult<CourseOffering> {
    course_offerings::table
        .find(offering_id.value())
        .select(CourseOfferingRow::as_select())
        .first::<CourseOfferingRow>(conn)
        .optional()
        .map_err(map_diesel_error)?
        .map(row_to_offering)
        .ok_or_else(|| not_found("CourseOffering", offering_id, operation))
}

/// Loads the day/slot hierarchy for `rows` with two queries and assembles the trees,
/// preserving the order of `rows`.
fn assemble_blocks(
    conn: &mut PgConnection,
    rows: Vec<ScheduleBlockRow>,
) -> RepositoryResult<Vec<ScheduleBlock>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let block_ids: Vec<i64> = rows.iter().map(|r| r.block_id).collect();

    let day_rows: Vec<ScheduleDayRow> = schedule_days::table
        .filter(schedule_days::block_id.eq_any(&block_ids))
        .order((schedule_days::block_id.asc(), schedule_days::weekday.asc()))
        .select(ScheduleDayRow::as_select())
        .load(conn)
        .map_err(map_diesel_error)?;
    let day_ids: Vec<i64> = day_rows.iter().map(|d| d.day_id).collect();

    let slot_rows: Vec<ScheduleSlotRow> = if day_ids.is_empty() {
        Vec::new()
    } else {
        schedule_slots::table
            .filter(schedule_slots::day_id.eq_any(&day_ids))
            .order((schedule_slots::day_id.asc(), schedule_slots::slot_number.asc()))
            .select(ScheduleSlotRow::as_select())
            .load(conn)
            .map_err(map_diesel_error)?
    };

    let mut slots_by_day: HashMap<i64, Vec<ScheduleSlotRow>> = HashMap::new();
    for slot in slot_rows {
        slots_by_day.entry(slot.day_id).or_default().push(slot);
    }
    let mut days_by_block: HashMap<i64, Vec<(ScheduleDayRow, Vec<ScheduleSlotRow>)>> =
        HashMap::new();
    for day in day_rows {
        let slots = slots_by_day.remove(&day.day_id).unwrap_or_default();
        days_by_block.entry(day.block_id).or_default().push((day, slots));
    }

    rows.into_iter()
        .map(|row| {
            let days = days_by_block.remove(&row.block_id).unwrap_or_default();
            row_to_block(row, days)
        })
        .collect()
}

fn load_block(
    conn: &mut PgConnection,
    block_id: BlockId,
    operation: &str,
) -> RepositoryResult<ScheduleBlock> {
    let row = schedule_blocks::table
        .find(block_id.value())
        .select(ScheduleBlockRow::as_select())
        .first::<ScheduleBlockRow>(conn)
        .optional()
        .map_err(map_diesel_error)?
        .ok_or_else(|| not_found("ScheduleBlock", block_id, operation))?;

    assemble_blocks(conn, vec![row])?
        .pop()
        .ok_or_else(|| not_found("ScheduleBlock", block_id, operation))
}

/// Takes the row lock on a block. Under READ COMMITTED every later statement of the
/// transaction sees the block as the previous lock holder committed it.
fn lock_block_row(conn: &mut PgConnection, block_id: BlockId, operation: &str) -> RepositoryResult<()> {
    schedule_blocks::table
        .find(block_id.value())
        .select(schedule_blocks::block_id)
        .for_update()
        .first::<i64>(conn)
        .optional()
        .map_err(map_diesel_error)?
        .map(|_| ())
        .ok_or_else(|| not_found("ScheduleBlock", block_id, operation))
}

/// Advisory lock keys for an offering's teacher and room, sorted so that concurrent
/// writers always acquire them in the same order.
fn resource_lock_keys(offering: &CourseOffering) -> Vec<i64> {
    let mut keys = Vec::with_capacity(2);
    if let Some(teacher) = offering.teacher_id {
        keys.push(teacher.value().wrapping_mul(2));
    }
    if let Some(room) = offering.room_id {
        keys.push(room.value().wrapping_mul(2).wrapping_add(1));
    }
    keys.sort_unstable();
    keys
}

fn lock_resources(conn: &mut PgConnection, offering: &CourseOffering) -> RepositoryResult<()> {
    for key in resource_lock_keys(offering) {
        sql_query("SELECT pg_advisory_xact_lock($1)")
            .bind::<BigInt, _>(key)
            .execute(conn)
            .map_err(map_diesel_error)?;
    }
    Ok(())
}

/// Runs the detector against every block owned by an offering that shares the
/// teacher or room of `offering`, the offering itself included.
fn conflicts_on(
    conn: &mut PgConnection,
    offering: &CourseOffering,
    days: &[DayPlan],
    ignore_block_id: Option<BlockId>,
) -> RepositoryResult<Vec<ConflictRecord>> {
    let candidate = CandidateSet::from_days(days);
    if candidate.is_empty() {
        return Ok(Vec::new());
    }

    let mut peers_query = course_offerings::table
        .select(CourseOfferingRow::as_select())
        .into_boxed::<Pg>();
    peers_query = match (offering.teacher_id, offering.room_id) {
        (Some(teacher), Some(room)) => peers_query.filter(
            course_offerings::teacher_id
                .eq(teacher.value())
                .or(course_offerings::room_id.eq(room.value())),
        ),
        (Some(teacher), None) => {
            peers_query.filter(course_offerings::teacher_id.eq(teacher.value()))
        }
        (None, Some(room)) => peers_query.filter(course_offerings::room_id.eq(room.value())),
        (None, None) => return Ok(Vec::new()),
    };
    let peers: HashMap<OfferingId, CourseOffering> = peers_query
        .load::<CourseOfferingRow>(conn)
        .map_err(map_diesel_error)?
        .into_iter()
        .map(row_to_offering)
        .map(|o| (o.id, o))
        .collect();
    let peer_ids: Vec<i64> = peers.keys().map(|id| id.value()).collect();

    let rows: Vec<ScheduleBlockRow> = schedule_blocks::table
        .filter(schedule_blocks::course_offering_id.eq_any(&peer_ids))
        .order(schedule_blocks::block_id.asc())
        .select(ScheduleBlockRow::as_select())
        .load(conn)
        .map_err(map_diesel_error)?;
    let blocks = assemble_blocks(conn, rows)?;

    let existing = blocks
        .iter()
        .filter_map(|b| peers.get(&b.course_offering_id).map(|owner| (owner, b)));
    Ok(detect_conflicts(offering, &candidate, existing, ignore_block_id))
}

fn slot_refs(conn: &mut PgConnection) -> RepositoryResult<HashMap<i16, i64>> {
    let rows: Vec<(i16, i64)> = slots::table
        .select((slots::slot_number, slots::slot_id))
        .load(conn)
        .map_err(map_diesel_error)?;
    Ok(rows.into_iter().collect())
}

fn insert_days(conn: &mut PgConnection, block_id: i64, plans: &[DayPlan]) -> RepositoryResult<()> {
    let refs = slot_refs(conn)?;
    for plan in plans {
        let day_id: i64 = diesel::insert_into(schedule_days::table)
            .values(NewScheduleDayRow {
                block_id,
                weekday: i16::from(plan.weekday.value()),
            })
            .returning(schedule_days::day_id)
            .get_result(conn)
            .map_err(map_diesel_error)?;

        let slot_rows: Vec<NewScheduleSlotRow> = plan
            .slots
            .iter()
            .map(|s| {
                let slot_number = i16::from(s.value());
                NewScheduleSlotRow {
                    day_id,
                    slot_number,
                    slot_ref_id: refs.get(&slot_number).copied(),
                }
            })
            .collect();
        if !slot_rows.is_empty() {
            diesel::insert_into(schedule_slots::table)
                .values(&slot_rows)
                .execute(conn)
                .map_err(map_diesel_error)?;
        }
    }
    Ok(())
}

/// Removes slots, then days, of a block. The block row itself is left in place.
fn delete_days(conn: &mut PgConnection, block_id: i64) -> RepositoryResult<()> {
    let day_ids = schedule_days::table
        .filter(schedule_days::block_id.eq(block_id))
        .select(schedule_days::day_id);
    diesel::delete(schedule_slots::table.filter(schedule_slots::day_id.eq_any(day_ids)))
        .execute(conn)
        .map_err(map_diesel_error)?;
    diesel::delete(schedule_days::table.filter(schedule_days::block_id.eq(block_id)))
        .execute(conn)
        .map_err(map_diesel_error)?;
    Ok(())
}

fn reject_conflicts(conflicts: Vec<ConflictRecord>, operation: &str) -> RepositoryError {
    warn!(
        "{} rejected: {} conflicting slot(s)",
        operation,
        conflicts.len()
    );
    RepositoryError::schedule_conflict(conflicts).with_operation(operation)
}

fn filtered_blocks(query: &BlockQuery) -> schedule_blocks::BoxedQuery<'static, Pg> {
    let mut boxed = schedule_blocks::table.into_boxed::<Pg>();
    if let Some(offering_id) = query.offering_id {
        boxed = boxed.filter(schedule_blocks::course_offering_id.eq(offering_id.value()));
    }
    if let Some(kind) = query.kind {
        boxed = boxed.filter(schedule_blocks::kind.eq(kind.as_str()));
    }
    boxed
}

// ==================== Trait implementations ====================

#[async_trait]
impl ScheduleRepository for PostgresRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        self.with_conn(|conn| {
            sql_query("SELECT 1")
                .execute(conn)
                .map(|_| true)
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn list_blocks(&self, query: &BlockQuery) -> RepositoryResult<Page<ScheduleBlock>> {
        let query = query.clone();
        self.with_conn(move |conn| {
            let total: i64 = filtered_blocks(&query)
                .count()
                .get_result(conn)
                .map_err(map_diesel_error)?;
            let rows: Vec<ScheduleBlockRow> = filtered_blocks(&query)
                .order(schedule_blocks::block_id.desc())
                .limit(i64::from(query.limit))
                .offset(i64::try_from(query.offset()).unwrap_or(i64::MAX))
                .select(ScheduleBlockRow::as_select())
                .load(conn)
                .map_err(map_diesel_error)?;
            let items = assemble_blocks(conn, rows)?;
            Ok(Page::new(
                items,
                u64::try_from(total).unwrap_or(0),
                query.page,
                query.limit,
            ))
        })
        .await
    }

    async fn get_block(&self, block_id: BlockId) -> RepositoryResult<ScheduleBlock> {
        self.with_conn(move |conn| load_block(conn, block_id, "get_block"))
            .await
    }

    async fn find_conflicts(
        &self,
        offering_id: OfferingId,
        days: &[DayPlan],
        ignore_block_id: Option<BlockId>,
    ) -> RepositoryResult<Vec<ConflictRecord>> {
        let days = days.to_vec();
        self.with_conn(move |conn| {
            let offering = load_offering(conn, offering_id, "find_conflicts")?;
            conflicts_on(conn, &offering, &days, ignore_block_id)
        })
        .await
    }

    async fn create_block(&self, draft: &BlockDraft) -> RepositoryResult<ScheduleBlock> {
        let draft = draft.clone();
        let block = self
            .with_conn(move |conn| {
                conn.transaction::<_, RepositoryError, _>(|tx| {
                    let offering =
                        load_offering(tx, draft.fields.course_offering_id, "create_block")?;
                    lock_resources(tx, &offering)?;
                    let conflicts = conflicts_on(tx, &offering, &draft.days, None)?;
                    if !conflicts.is_empty() {
                        return Err(reject_conflicts(conflicts, "create_block"));
                    }

                    let block_id: i64 = diesel::insert_into(schedule_blocks::table)
                        .values(fields_to_row(&draft.fields))
                        .returning(schedule_blocks::block_id)
                        .get_result(tx)
                        .map_err(map_diesel_error)?;
                    insert_days(tx, block_id, &draft.days)?;
                    load_block(tx, BlockId::new(block_id), "create_block")
                })
            })
            .await?;

        info!(
            "Created schedule block {} for offering {} ({} day(s), {} slot(s))",
            block.id,
            block.course_offering_id,
            block.days.len(),
            block.periods_per_week()
        );
        Ok(block)
    }

    async fn update_block(
        &self,
        block_id: BlockId,
        patch: &UpdateBlockRequest,
    ) -> RepositoryResult<ScheduleBlock> {
        let patch = patch.clone();
        let block = self
            .with_conn(move |conn| {
                conn.transaction::<_, RepositoryError, _>(|tx| {
                    // Concurrent patches of the same block queue on this row lock.
                    lock_block_row(tx, block_id, "update_block")?;
                    let existing = load_block(tx, block_id, "update_block")?;
                    let update = merge_patch(&existing, &patch)?;

                    let offering_changed =
                        existing.course_offering_id != update.fields.course_offering_id;
                    if offering_changed || update.days.is_some() {
                        let offering =
                            load_offering(tx, update.fields.course_offering_id, "update_block")?;
                        if let Some(days) = &update.days {
                            lock_resources(tx, &offering)?;
                            let conflicts = conflicts_on(tx, &offering, days, Some(block_id))?;
                            if !conflicts.is_empty() {
                                return Err(reject_conflicts(conflicts, "update_block"));
                            }
                        }
                    }

                    diesel::update(schedule_blocks::table.find(block_id.value()))
                        .set((
                            fields_to_row(&update.fields),
                            schedule_blocks::updated_at.eq(Utc::now()),
                        ))
                        .execute(tx)
                        .map_err(map_diesel_error)?;
                    if let Some(days) = &update.days {
                        delete_days(tx, block_id.value())?;
                        insert_days(tx, block_id.value(), days)?;
                    }
                    load_block(tx, block_id, "update_block")
                })
            })
            .await?;

        info!("Updated schedule block {}", block.id);
        Ok(block)
    }

    async fn delete_block(&self, block_id: BlockId) -> RepositoryResult<()> {
        self.with_conn(move |conn| {
            conn.transaction::<_, RepositoryError, _>(|tx| {
                lock_block_row(tx, block_id, "delete_block")?;
                delete_days(tx, block_id.value())?;
                diesel::delete(schedule_blocks::table.find(block_id.value()))
                    .execute(tx)
                    .map_err(map_diesel_error)?;
                Ok(())
            })
        })
        .await?;

        info!("Deleted schedule block {}", block_id);
        Ok(())
    }
}

#[async_trait]
impl CatalogRepository for PostgresRepository {
    async fn get_offering(&self, offering_id: OfferingId) -> RepositoryResult<CourseOffering> {
        self.with_conn(move |conn| load_offering(conn, offering_id, "get_offering"))
            .await
    }

    async fn list_slots(&self) -> RepositoryResult<Vec<SlotDefinition>> {
        self.with_conn(|conn| {
            slots::table
                .order(slots::slot_number.asc())
                .select(SlotRow::as_select())
                .load::<SlotRow>(conn)
                .map_err(map_diesel_error)?
                .into_iter()
                .map(row_to_slot_definition)
                .collect()
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_keys_are_sorted_and_typed() {
        let offering = CourseOffering::new(1).with_teacher(7).with_room(3);
        assert_eq!(resource_lock_keys(&offering), vec![7, 14]);

        let room_only = CourseOffering::new(1).with_room(7);
        let teacher_only = CourseOffering::new(1).with_teacher(7);
        assert_ne!(resource_lock_keys(&room_only), resource_lock_keys(&teacher_only));
        assert!(resource_lock_keys(&CourseOffering::new(1)).is_empty());
    }

    #[test]
    fn test_row_to_block_rejects_unknown_kind() {
        let now = Utc::now();
        let row = ScheduleBlockRow {
            block_id: 1,
            course_offering_id: 2,
            kind: "lecture".to_string(),
            group_label: None,
            start_date: None,
            end_date: None,
            repeat_policy: "weekly".to_string(),
            repeat_weeks: None,
            created_at: now,
            updated_at: now,
        };
        let err = row_to_block(row, Vec::new()).unwrap_err();
        assert_eq!(err.context().entity_id.as_deref(), Some("1"));
    }

    #[test]
    fn test_fields_round_trip_through_row() {
        let fields = BlockFields {
            course_offering_id: OfferingId::new(4),
            kind: ScheduleKind::Exam,
            group_label: Some("B".to_string()),
            start_date: None,
            end_date: None,
            repeat_policy: RepeatPolicy::CustomWeeks,
            repeat_weeks: Some(8),
        };
        let row = fields_to_row(&fields);
        assert_eq!(row.kind, "exam");
        assert_eq!(row.repeat_policy, "custom_weeks");
        assert_eq!(row.repeat_weeks, Some(8));
    }
}
