use chrono::{NaiveDate, Utc};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};

use crate::models::{AttendanceRecord, Class, ClassRef, Mark, Student, StudentStatus};

const CLASS_COLUMNS: &str = r#"
    SELECT
        c.id,
        c.name,
        c.teacher,
        c.description,
        COUNT(s.id) AS number_of_students,
        c.created_at,
        c.updated_at
    FROM classes c
    LEFT JOIN students s ON s.class_id = c.id
"#;

const STUDENT_COLUMNS: &str = r#"
    SELECT
        s.id,
        s.name,
        s.class_id,
        c.name AS class_name,
        s.email,
        s.status,
        s.created_at,
        s.updated_at
    FROM students s
    JOIN classes c ON c.id = s.class_id
"#;

const ATTENDANCE_COLUMNS: &str = r#"
    SELECT
        a.id,
        a.student_id,
        s.name AS student_name,
        a.class_id,
        c.name AS class_name,
        a.date,
        a.status,
        a.created_at
    FROM attendance a
    JOIN students s ON s.id = a.student_id
    JOIN classes c ON c.id = a.class_id
"#;

// ---- classes ----

pub async fn fetch_classes(db: &SqlitePool) -> Result<Vec<Class>, sqlx::Error> {
    let sql = format!("{CLASS_COLUMNS} GROUP BY c.id ORDER BY c.created_at DESC, c.id DESC");
    sqlx::query_as::<_, Class>(&sql).fetch_all(db).await
}

pub async fn find_class_by_id(db: &SqlitePool, id: i64) -> Result<Option<Class>, sqlx::Error> {
    let sql = format!("{CLASS_COLUMNS} WHERE c.id = ? GROUP BY c.id");
    sqlx::query_as::<_, Class>(&sql)
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn find_class_ref_by_name<'e, E>(
    db: E,
    name: &str,
) -> Result<Option<ClassRef>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, ClassRef>("SELECT id, name FROM classes WHERE name = ?")
        .bind(name)
        .fetch_optional(db)
        .await
}

pub async fn insert_class(
    db: &SqlitePool,
    name: &str,
    teacher: &str,
    description: Option<&str>,
) -> Result<Class, sqlx::Error> {
    let now = Utc::now().to_rfc3339();

    let id = sqlx::query(
        r#"
        INSERT INTO classes (name, teacher, description, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?4)
        "#,
    )
    .bind(name)
    .bind(teacher)
    .bind(description)
    .bind(&now)
    .execute(db)
    .await?
    .last_insert_rowid();

    find_class_by_id(db, id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)
}

pub async fn update_class(
    db: &SqlitePool,
    id: i64,
    name: Option<&str>,
    teacher: Option<&str>,
    description: Option<&str>,
) -> Result<Option<Class>, sqlx::Error> {
    let now = Utc::now().to_rfc3339();

    let affected = sqlx::query(
        r#"
        UPDATE classes
        SET name = COALESCE(?1, name),
            teacher = COALESCE(?2, teacher),
            description = COALESCE(?3, description),
            updated_at = ?4
        WHERE id = ?5
        "#,
    )
    .bind(name)
    .bind(teacher)
    .bind(description)
    .bind(now)
    .bind(id)
    .execute(db)
    .await?
    .rows_affected();

    if affected == 0 {
        return Ok(None);
    }
    find_class_by_id(db, id).await
}

pub async fn count_students_in_class(db: &SqlitePool, class_id: i64) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM students WHERE class_id = ?")
        .bind(class_id)
        .fetch_one(db)
        .await
}

pub async fn delete_class(db: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM classes WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?
        .rows_affected();

    Ok(result > 0)
}

// ---- students ----

pub async fn fetch_students(db: &SqlitePool) -> Result<Vec<Student>, sqlx::Error> {
    let sql = format!("{STUDENT_COLUMNS} ORDER BY s.created_at DESC, s.id DESC");
    sqlx::query_as::<_, Student>(&sql).fetch_all(db).await
}

pub async fn fetch_students_by_class(
    db: &SqlitePool,
    class_name: &str,
) -> Result<Vec<Student>, sqlx::Error> {
    let sql = format!("{STUDENT_COLUMNS} WHERE c.name = ? ORDER BY s.name ASC, s.id ASC");
    sqlx::query_as::<_, Student>(&sql)
        .bind(class_name)
        .fetch_all(db)
        .await
}

pub async fn fetch_active_students(
    db: &SqlitePool,
    class_name: &str,
) -> Result<Vec<Student>, sqlx::Error> {
    let sql = format!(
        "{STUDENT_COLUMNS} WHERE c.name = ? AND s.status = 'Active' ORDER BY s.name ASC, s.id ASC"
    );
    sqlx::query_as::<_, Student>(&sql)
        .bind(class_name)
        .fetch_all(db)
        .await
}

pub async fn find_student_by_id<'e, E>(db: E, id: i64) -> Result<Option<Student>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("{STUDENT_COLUMNS} WHERE s.id = ?");
    sqlx::query_as::<_, Student>(&sql)
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn insert_student(
    db: &SqlitePool,
    name: &str,
    class_id: i64,
    email: Option<&str>,
    status: StudentStatus,
) -> Result<Student, sqlx::Error> {
    let now = Utc::now().to_rfc3339();

    let id = sqlx::query(
        r#"
        INSERT INTO students (name, class_id, email, status, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?5)
        "#,
    )
    .bind(name)
    .bind(class_id)
    .bind(email)
    .bind(status)
    .bind(&now)
    .execute(db)
    .await?
    .last_insert_rowid();

    find_student_by_id(db, id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)
}

pub async fn update_student(
    db: &SqlitePool,
    id: i64,
    name: Option<&str>,
    class_id: Option<i64>,
    email: Option<&str>,
    status: Option<StudentStatus>,
) -> Result<Option<Student>, sqlx::Error> {
    let now = Utc::now().to_rfc3339();

    let affected = sqlx::query(
        r#"
        UPDATE students
        SET name = COALESCE(?1, name),
            class_id = COALESCE(?2, class_id),
            email = COALESCE(?3, email),
            status = COALESCE(?4, status),
            updated_at = ?5
        WHERE id = ?6
        "#,
    )
    .bind(name)
    .bind(class_id)
    .bind(email)
    .bind(status)
    .bind(now)
    .bind(id)
    .execute(db)
    .await?
    .rows_affected();

    if affected == 0 {
        return Ok(None);
    }
    find_student_by_id(db, id).await
}

pub async fn delete_student(db: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM students WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?
        .rows_affected();

    Ok(result > 0)
}

// ---- attendance ----

pub async fn fetch_attendance_for_class_day<'e, E>(
    db: E,
    class_id: i64,
    date: NaiveDate,
) -> Result<Vec<AttendanceRecord>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        "{ATTENDANCE_COLUMNS} WHERE a.class_id = ?1 AND a.date = ?2 ORDER BY s.name ASC, a.student_id ASC"
    );
    sqlx::query_as::<_, AttendanceRecord>(&sql)
        .bind(class_id)
        .bind(date)
        .fetch_all(db)
        .await
}

pub async fn delete_attendance_for_class_day<'e, E>(
    db: E,
    class_id: i64,
    date: NaiveDate,
) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("DELETE FROM attendance WHERE class_id = ?1 AND date = ?2")
        .bind(class_id)
        .bind(date)
        .execute(db)
        .await?;

    Ok(result.rows_affected())
}

/// Writes one mark keyed by `(student_id, date)`. An existing mark for that
/// student and day is taken over by `class_id`, whichever class it belonged to.
/// Writes one mark, but only while the student is still enrolled in `class_id`.
/// Returns `false` when nothing was written.
pub async fn upsert_attendance<'e, E>(
    db: E,
    class_id: i64,
    date: NaiveDate,
    mark: &Mark,
) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let now = Utc::now().to_rfc3339();

    // the WHERE clause keeps SQLite from reading ON CONFLICT as a join constraint
    let affected = sqlx::query(
        r#"
        INSERT INTO attendance (student_id, class_id, date, status, created_at)
        SELECT id, ?2, ?3, ?4, ?5 FROM students
        WHERE id = ?1 AND class_id = ?2
        ON CONFLICT (student_id, date)
        DO UPDATE SET class_id = excluded.class_id,
                      status = excluded.status,
                      created_at = excluded.created_at
        "#,
    )
    .bind(mark.student_id)
    .bind(class_id)
    .bind(date)
    .bind(mark.status)
    .bind(now)
    .execute(db)
    .await?
    .rows_affected();

    Ok(affected > 0)
}

// ---- search ----

#[derive(Debug, Clone, FromRow)]
pub struct SearchRow {
    pub id: i64,
    pub kind: String,
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub created_at: String,
}

pub async fn search(
    db: &SqlitePool,
    query: &str,
    limit: i64,
) -> Result<Vec<SearchRow>, sqlx::Error> {
    let pattern = format!("%{}%", query);

    sqlx::query_as::<_, SearchRow>(
        r#"
        SELECT
            s.id AS id,
            'student' AS kind,
            s.name AS title,
            COALESCE(s.email, 'No email') AS subtitle,
            c.name AS description,
            s.created_at AS created_at
        FROM students s
        JOIN classes c ON c.id = s.class_id
        WHERE s.name LIKE ?1
           OR s.email LIKE ?1
           OR c.name LIKE ?1

        UNION ALL

        SELECT
            c.id,
            'class',
            c.name,
            c.teacher,
            COALESCE(c.description, 'No description'),
            c.created_at
        FROM classes c
        WHERE c.name LIKE ?1
           OR c.teacher LIKE ?1
           OR c.description LIKE ?1

        UNION ALL

        SELECT
            a.id,
            'attendance',
            s.name,
            a.date,
            'Status: ' || a.status,
            a.created_at
        FROM attendance a
        JOIN students s ON s.id = a.student_id
        JOIN classes c ON c.id = a.class_id
        WHERE s.name LIKE ?1
           OR c.name LIKE ?1

        ORDER BY created_at DESC
        LIMIT ?2
        "#,
    )
    .bind(pattern)
    .bind(limit)
    .fetch_all(db)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_in_memory;
    use crate::models::AttendanceStatus;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("date")
    }

    #[tokio::test]
    async fn test_insert_and_fetch_class() {
        let pool = connect_in_memory().await.expect("db");

        let class = insert_class(&pool, "Mathematics 101", "Dr. Johnson", Some("Calculus"))
            .await
            .expect("Failed to insert class");
        assert_eq!(class.name, "Mathematics 101");
        assert_eq!(class.number_of_students, 0);

        insert_student(&pool, "John Doe", class.id, None, StudentStatus::Active)
            .await
            .expect("Failed to insert student");

        let classes = fetch_classes(&pool).await.expect("Failed to fetch classes");
        assert_eq!(classes.len(), 1);
        assert_eq!(classes[0].number_of_students, 1);
    }

    #[tokio::test]
    async fn test_duplicate_class_name_is_unique_violation() {
        let pool = connect_in_memory().await.expect("db");

        insert_class(&pool, "Art", "Ms. Lee", None).await.expect("first");
        let err = insert_class(&pool, "Art", "Mr. Kim", None)
            .await
            .expect_err("duplicate should fail");
        let is_unique = err
            .as_database_error()
            .map(|e| e.is_unique_violation())
            .unwrap_or(false);
        assert!(is_unique);
    }

    #[tokio::test]
    async fn test_update_class_keeps_unset_fields() {
        let pool = connect_in_memory().await.expect("db");
        let class = insert_class(&pool, "Art", "Ms. Lee", Some("Painting"))
            .await
            .expect("insert");

        let updated = update_class(&pool, class.id, None, Some("Mr. Kim"), None)
            .await
            .expect("update")
            .expect("class exists");
        assert_eq!(updated.name, "Art");
        assert_eq!(updated.teacher, "Mr. Kim");
        assert_eq!(updated.description.as_deref(), Some("Painting"));

        let missing = update_class(&pool, 999, Some("X"), None, None)
            .await
            .expect("update");
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_active_students_are_filtered_and_sorted() {
        let pool = connect_in_memory().await.expect("db");
        let class = insert_class(&pool, "Art", "Ms. Lee", None).await.expect("insert");

        insert_student(&pool, "Zed", class.id, None, StudentStatus::Active)
            .await
            .expect("insert");
        insert_student(&pool, "Amy", class.id, None, StudentStatus::Active)
            .await
            .expect("insert");
        insert_student(&pool, "Bob", class.id, None, StudentStatus::Inactive)
            .await
            .expect("insert");

        let active = fetch_active_students(&pool, "Art").await.expect("fetch");
        let names: Vec<&str> = active.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Amy", "Zed"]);
    }

    #[tokio::test]
    async fn test_upsert_moves_mark_between_classes() {
        let pool = connect_in_memory().await.expect("db");
        let math = insert_class(&pool, "Math", "A", None).await.expect("insert");
        let art = insert_class(&pool, "Art", "B", None).await.expect("insert");
        let student = insert_student(&pool, "Amy", math.id, None, StudentStatus::Active)
            .await
            .expect("insert");
        let date = day("2024-01-15");

        let mark = Mark {
            student_id: student.id,
            status: AttendanceStatus::Present,
        };
        assert!(upsert_attendance(&pool, math.id, date, &mark).await.expect("upsert"));

        update_student(&pool, student.id, None, Some(art.id), None, None)
            .await
            .expect("update");
        let mark = Mark {
            student_id: student.id,
            status: AttendanceStatus::Absent,
        };
        assert!(upsert_attendance(&pool, art.id, date, &mark).await.expect("upsert"));

        let in_math = fetch_attendance_for_class_day(&pool, math.id, date)
            .await
            .expect("fetch");
        let in_art = fetch_attendance_for_class_day(&pool, art.id, date)
            .await
            .expect("fetch");
        assert!(in_math.is_empty());
        assert_eq!(in_art.len(), 1);
        assert_eq!(in_art[0].status, AttendanceStatus::Absent);
        assert_eq!(in_art[0].class_name, "Art");
    }

    #[tokio::test]
    async fn test_upsert_skips_student_outside_class() {
        let pool = connect_in_memory().await.expect("db");
        let math = insert_class(&pool, "Math", "A", None).await.expect("insert");
        let art = insert_class(&pool, "Art", "B", None).await.expect("insert");
        let student = insert_student(&pool, "Amy", math.id, None, StudentStatus::Active)
            .await
            .expect("insert");
        let date = day("2024-01-15");
        let mark = Mark {
            student_id: student.id,
            status: AttendanceStatus::Present,
        };

        assert!(!upsert_attendance(&pool, art.id, date, &mark).await.expect("upsert"));
        assert!(!upsert_attendance(&pool, math.id, date, &Mark { student_id: 9999, ..mark })
            .await
            .expect("upsert"));

        let in_art = fetch_attendance_for_class_day(&pool, art.id, date)
            .await
            .expect("fetch");
        assert!(in_art.is_empty());
    }

    #[tokio::test]
    async fn test_deleting_student_cascades_to_attendance() {
        let pool = connect_in_memory().await.expect("db");
        let class = insert_class(&pool, "Math", "A", None).await.expect("insert");
        let student = insert_student(&pool, "Amy", class.id, None, StudentStatus::Active)
            .await
            .expect("insert");
        let date = day("2024-01-15");
        let mark = Mark {
            student_id: student.id,
            status: AttendanceStatus::Present,
        };
        upsert_attendance(&pool, class.id, date, &mark).await.expect("upsert");

        assert!(delete_student(&pool, student.id).await.expect("delete"));

        let records = fetch_attendance_for_class_day(&pool, class.id, date)
            .await
            .expect("fetch");
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_search_spans_students_and_classes() {
        let pool = connect_in_memory().await.expect("db");
        let class = insert_class(&pool, "Physics", "Dr. Curie", None)
            .await
            .expect("insert");
        insert_student(&pool, "Marie Physicist", class.id, Some("m@example.com"), StudentStatus::Active)
            .await
            .expect("insert");

        let rows = search(&pool, "phys", 10).await.expect("search");
        let mut kinds: Vec<&str> = rows.iter().map(|r| r.kind.as_str()).collect();
        kinds.sort();
        assert_eq!(kinds, vec!["class", "student"]);

        let limited = search(&pool, "phys", 1).await.expect("search");
        assert_eq!(limited.len(), 1);
    }
}
