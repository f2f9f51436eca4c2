use crate::core::{EntityKind, EntityStore, GymResult};

/// One row of a student search result. Absent fields are empty strings,
/// never a null marker.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentHit {
    pub student_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub birthday: String,
    pub active: bool,
}

/// One family grouping from a family search.
#[derive(Debug, Clone, PartialEq)]
pub struct FamilyHit {
    pub family_id: Option<i64>,
    pub last_name: String,
    pub children: i64,
}

/// Case-insensitive prefix search over first/last name. An empty filter
/// matches everything. Results are sorted by (last name, first name),
/// case-folded; ties keep stored row order (stable sort).
pub fn search_student(
    store: &EntityStore,
    first_prefix: &str,
    last_prefix: &str,
) -> GymResult<Vec<StudentHit>> {
    let students = store.table(EntityKind::Student)?;
    let id = students.require_column("STUDENT_ID")?;
    let fname = students.require_column("FNAME")?;
    let lname = students.require_column("LNAME")?;
    let phone = students.require_column("PHONE")?;
    let birthday = students.require_column("BIRTHDAY")?;
    let active = students.require_column("ACTIVE")?;

    let first_prefix = first_prefix.to_uppercase();
    let last_prefix = last_prefix.to_uppercase();

    let mut hits: Vec<StudentHit> = students
        .rows
        .iter()
        .filter(|r| {
            prefix_match(&r.get(fname).to_string(), &first_prefix)
                && prefix_match(&r.get(lname).to_string(), &last_prefix)
        })
        .map(|r| StudentHit {
            student_id: r.get(id).as_int().unwrap_or(0),
            first_name: r.get(fname).to_string(),
            last_name: r.get(lname).to_string(),
            phone: r.get(phone).to_string(),
            birthday: r.get(birthday).to_string(),
            active: r.get(active).as_bool().unwrap_or(true),
        })
        .collect();

    hits.sort_by_key(|h| (h.last_name.to_uppercase(), h.first_name.to_uppercase()));
    Ok(hits)
}

/// Prefix search on last name, grouped by family. Students whose family id
/// cannot be resolved are reported as singleton families with a count of
/// exactly 1, never lumped together.
pub fn search_family(store: &EntityStore, last_prefix: &str) -> GymResult<Vec<FamilyHit>> {
    let students = store.table(EntityKind::Student)?;
    let lname = students.require_column("LNAME")?;
    let family = students.require_column("FAMILY_ID")?;
    let last_prefix = last_prefix.to_uppercase();

    let mut hits: Vec<FamilyHit> = Vec::new();
    let mut seen_families: Vec<i64> = Vec::new();

    for row in &students.rows {
        if !prefix_match(&row.get(lname).to_string(), &last_prefix) {
            continue;
        }
        let family_id = row.get(family).as_int().filter(|id| *id > 0);
        match family_id {
            Some(fid) => {
                if seen_families.contains(&fid) {
                    continue;
                }
                seen_families.push(fid);
                let children = students
                    .rows
                    .iter()
                    .filter(|r| r.get(family).as_int() == Some(fid))
                    .count() as i64;
                hits.push(FamilyHit {
                    family_id: Some(fid),
                    last_name: row.get(lname).to_string(),
                    children,
                });
            }
            None => hits.push(FamilyHit {
                family_id: None,
                last_name: row.get(lname).to_string(),
                children: 1,
            }),
        }
    }

    hits.sort_by_key(|h| h.last_name.to_uppercase());
    Ok(hits)
}

fn prefix_match(value: &str, prefix: &str) -> bool {
    prefix.is_empty() || value.to_uppercase().starts_with(prefix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Row, Value};

    fn seed_students(rows: &[(i64, &str, &str, i64)]) -> EntityStore {
        let mut store = EntityStore::new();
        let table = store.table_mut(EntityKind::Student).unwrap();
        for (id, fname, lname, family) in rows {
            let mut values: Vec<Value> = table
                .columns
                .iter()
                .map(|c| c.data_type.empty_value())
                .collect();
            let set = |values: &mut Vec<Value>, table: &crate::core::EntityTable, col: &str, v: Value| {
                let idx = table.column_index(col).unwrap();
                values[idx] = v;
            };
            set(&mut values, table, "STUDENT_ID", Value::Integer(*id));
            set(&mut values, table, "STUDENTNO", Value::Integer(1000 + id));
            set(&mut values, table, "FNAME", Value::Text((*fname).to_string()));
            set(&mut values, table, "LNAME", Value::Text((*lname).to_string()));
            set(&mut values, table, "FAMILY_ID", Value::Integer(*family));
            table.insert(Row::new(values)).unwrap();
        }
        store
    }

    #[test]
    fn test_prefix_search_sorts_by_last_then_first() {
        let store = seed_students(&[
            (1, "JOAN", "SMITH", 1),
            (2, "JOHN", "DOE", 2),
            (3, "MARY", "ADAMS", 3),
        ]);
        let hits = search_student(&store, "JO", "").unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].last_name, "DOE");
        assert_eq!(hits[1].last_name, "SMITH");
    }

    #[test]
    fn test_empty_filters_are_wildcards() {
        let store = seed_students(&[(1, "A", "Z", 1), (2, "B", "Y", 2)]);
        let hits = search_student(&store, "", "").unwrap();
        assert_eq!(hits.len(), 2);
        // Sorted, not stored, order.
        assert_eq!(hits[0].last_name, "Y");
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let store = seed_students(&[(1, "maria", "lopez", 1)]);
        let hits = search_student(&store, "MA", "LO").unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_family_grouping_and_singletons() {
        let store = seed_students(&[
            (1, "A", "SMITH", 7),
            (2, "B", "SMITH", 7),
            (3, "C", "SMITHERS", 0), // unresolvable family
        ]);
        let hits = search_family(&store, "SMITH").unwrap();
        assert_eq!(hits.len(), 2);
        let family = hits.iter().find(|h| h.family_id == Some(7)).unwrap();
        assert_eq!(family.children, 2);
        let singleton = hits.iter().find(|h| h.family_id.is_none()).unwrap();
        assert_eq!(singleton.children, 1);
    }
}
