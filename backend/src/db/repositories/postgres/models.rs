use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use diesel::prelude::*;

use super::schema::{course_offerings, schedule_blocks, schedule_days, schedule_slots, slots};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = course_offerings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CourseOfferingRow {
    pub course_offering_id: i64,
    pub teacher_id: Option<i64>,
    pub room_id: Option<i64>,
    pub credits: Option<i32>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = slots)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SlotRow {
    pub slot_id: i64,
    pub slot_number: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = schedule_blocks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ScheduleBlockRow {
    pub block_id: i64,
    pub course_offering_id: i64,
    pub kind: String,
    pub group_label: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub repeat_policy: String,
    pub repeat_weeks: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Scalar columns written on both insert and update.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = schedule_blocks)]
#[diesel(treat_none_as_null = true)]
pub struct BlockFieldsRow {
    pub course_offering_id: i64,
    pub kind: String,
    pub group_label: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub repeat_policy: String,
    pub repeat_weeks: Option<i32>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = schedule_days)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ScheduleDayRow {
    pub day_id: i64,
    pub block_id: i64,
    pub weekday: i16,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schedule_days)]
pub struct NewScheduleDayRow {
    pub block_id: i64,
    pub weekday: i16,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = schedule_slots)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ScheduleSlotRow {
    pub slot_row_id: i64,
    pub day_id: i64,
    pub slot_number: i16,
    pub slot_ref_id: Option<i64>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schedule_slots)]
pub struct NewScheduleSlotRow {
    pub day_id: i64,
    pub slot_number: i16,
    pub slot_ref_id: Option<i64>,
}
