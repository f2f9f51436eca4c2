use chrono::NaiveTime;

use crate::core::{EntityKind, EntityStore, GymResult};

/// Optional class filter dimensions; an empty value matches everything on
/// that dimension, and the dimensions combine with AND.
#[derive(Debug, Clone, Default)]
pub struct ClassFilter {
    /// Exact instructor match.
    pub instructor: String,
    /// Substring over class name or time.
    pub gender: String,
    /// Substring over class name or time.
    pub level: String,
    /// Exact day-of-week match.
    pub day: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassHit {
    pub class_id: i64,
    pub instructor: String,
    pub classname: String,
    pub time: String,
    pub day: String,
    pub max: i64,
    pub available: i64,
}

/// Filters classes and sorts by (day of week, time of day).
pub fn filter_classes(store: &EntityStore, filter: &ClassFilter) -> GymResult<Vec<ClassHit>> {
    let classes = store.table(EntityKind::Class)?;
    let id = classes.require_column("CLASS_ID")?;
    let instructor = classes.require_column("INSTRUCTOR")?;
    let classname = classes.require_column("CLASSNAME")?;
    let time = classes.require_column("TIME")?;
    let day = classes.require_column("DAY")?;
    let max = classes.require_column("MAX")?;
    let available = classes.require_column("AVAILABLE")?;

    let want_instructor = filter.instructor.to_uppercase();
    let want_gender = filter.gender.to_uppercase();
    let want_level = filter.level.to_uppercase();
    let want_day = filter.day.to_uppercase();

    let mut hits: Vec<ClassHit> = classes
        .rows
        .iter()
        .filter(|r| {
            let name_or_time =
                format!("{} {}", r.get(classname), r.get(time)).to_uppercase();
            (want_instructor.is_empty()
                || r.get(instructor).to_string().to_uppercase() == want_instructor)
                && (want_gender.is_empty() || name_or_time.contains(&want_gender))
                && (want_level.is_empty() || name_or_time.contains(&want_level))
                && (want_day.is_empty() || r.get(day).to_string().to_uppercase() == want_day)
        })
        .map(|r| ClassHit {
            class_id: r.get(id).as_int().unwrap_or(0),
            instructor: r.get(instructor).to_string(),
            classname: r.get(classname).to_string(),
            time: r.get(time).to_string(),
            day: r.get(day).to_string(),
            max: r.get(max).as_int().unwrap_or(0),
            available: r.get(available).as_int().unwrap_or(0),
        })
        .collect();

    hits.sort_by_key(|h| (day_order(&h.day), time_order(&h.time)));
    Ok(hits)
}

/// Monday-first weekday ordering; unrecognized days sort last.
fn day_order(day: &str) -> u8 {
    match day.to_uppercase().get(..3) {
        Some("MON") => 0,
        Some("TUE") => 1,
        Some("WED") => 2,
        Some("THU") => 3,
        Some("FRI") => 4,
        Some("SAT") => 5,
        Some("SUN") => 6,
        _ => 7,
    }
}

/// Minutes past midnight; unparseable times sort last.
fn time_order(time: &str) -> u32 {
    let trimmed = time.trim();
    for fmt in ["%I:%M %p", "%I:%M%p", "%H:%M"] {
        if let Ok(t) = NaiveTime::parse_from_str(trimmed, fmt) {
            return t.signed_duration_since(NaiveTime::MIN).num_minutes() as u32;
        }
    }
    u32::MAX
}
