use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, NaiveDate};
use rusqlite::{named_params, Connection, Row};

use crate::config::AppConfig;
use crate::model::{Task, TaskList, Timestamp};
use crate::period::Period;
use crate::store::TaskStore;

const TASK_COLUMNS: &str = "id, list_id, title, description, completed, due_date, \
    reschedule_period, reschedule_base, completed_at, prohibited_months, constraint_tags, \
    created_at, updated_at";

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn initialize(config: &AppConfig) -> Result<Self> {
        let conn = Connection::open(config.db_path()).with_context(|| {
            format!("Failed to open database at {}", config.db_path().display())
        })?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .context("Failed to configure SQLite WAL mode")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys=ON;")
            .context("Failed to enable SQLite foreign keys")?;
        let db = Self { conn };
        db.apply_migrations()?;
        Ok(db)
    }

    fn apply_migrations(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS meta (key TEXT PRIMARY KEY, value TEXT);
             CREATE TABLE IF NOT EXISTS lists (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
             );
             CREATE TABLE IF NOT EXISTS tasks (
                id TEXT PRIMARY KEY,
                list_id TEXT NOT NULL REFERENCES lists(id) ON DELETE CASCADE,
                title TEXT NOT NULL,
                description TEXT,
                completed INTEGER NOT NULL DEFAULT 0,
                due_date TEXT,
                reschedule_period TEXT,
                reschedule_base TEXT NOT NULL DEFAULT 'completed',
                completed_at TEXT,
                prohibited_months TEXT NOT NULL DEFAULT '[]',
                constraint_tags TEXT NOT NULL DEFAULT '[]',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
             );
             CREATE INDEX IF NOT EXISTS idx_tasks_list ON tasks(list_id);
             CREATE INDEX IF NOT EXISTS idx_tasks_due ON tasks(due_date);
             INSERT OR IGNORE INTO meta (key, value) VALUES ('schema_version', '1');
            ",
        )?;
        Ok(())
    }
}

impl TaskStore for Database {
    fn list_lists(&self) -> Result<Vec<TaskList>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, created_at, updated_at FROM lists ORDER BY created_at, id")?;
        let mut rows = stmt.query([])?;
        let mut lists = Vec::new();
        while let Some(row) = rows.next()? {
            lists.push(map_list(row)?);
        }
        Ok(lists)
    }

    fn fetch_list(&self, id: &str) -> Result<Option<TaskList>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, created_at, updated_at FROM lists WHERE id = ? LIMIT 1")?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            Ok(Some(map_list(row)?))
        } else {
            Ok(None)
        }
    }

    fn insert_list(&self, list: &TaskList) -> Result<()> {
        self.conn.execute(
            "INSERT INTO lists (id, name, created_at, updated_at)
             VALUES (:id, :name, :created_at, :updated_at)",
            named_params![
                ":id": &list.id,
                ":name": &list.name,
                ":created_at": list.created_at.to_rfc3339(),
                ":updated_at": list.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn update_list(&self, list: &TaskList) -> Result<bool> {
        let affected = self.conn.execute(
            "UPDATE lists SET name = :name, updated_at = :updated_at WHERE id = :id",
            named_params![
                ":name": &list.name,
                ":updated_at": list.updated_at.to_rfc3339(),
                ":id": &list.id,
            ],
        )?;
        Ok(affected > 0)
    }

    fn delete_list(&self, id: &str) -> Result<bool> {
        let affected = self
            .conn
            .execute("DELETE FROM lists WHERE id = :id", named_params![":id": id])?;
        Ok(affected > 0)
    }

    fn list_tasks(&self, list_id: &str) -> Result<Vec<Task>> {
        let sql = format!(
            "SELECT {} FROM tasks WHERE list_id = ? ORDER BY created_at, id",
            TASK_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([list_id])?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(map_task(row)?);
        }
        Ok(tasks)
    }

    fn fetch_task(&self, id: &str) -> Result<Option<Task>> {
        let sql = format!("SELECT {} FROM tasks WHERE id = ? LIMIT 1", TASK_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            Ok(Some(map_task(row)?))
        } else {
            Ok(None)
        }
    }

    fn insert_task(&self, task: &Task) -> Result<()> {
        insert_task_row(&self.conn, task)
    }

    fn update_task(&self, task: &Task) -> Result<bool> {
        update_task_row(&self.conn, task, RowGuard::Any)
    }

    fn delete_task(&self, id: &str) -> Result<bool> {
        let affected = self
            .conn
            .execute("DELETE FROM tasks WHERE id = :id", named_params![":id": id])?;
        Ok(affected > 0)
    }

    fn commit_completion(&self, updated: &Task, spawned: &Task) -> Result<bool> {
        let tx = self
            .conn
            .unchecked_transaction()
            .context("Failed to begin completion transaction")?;
        if !update_task_row(&tx, updated, RowGuard::StillOpen)? {
            return Ok(false);
        }
        insert_task_row(&tx, spawned)
            .with_context(|| format!("Failed to insert occurrence of task {}", updated.id))?;
        tx.commit().context("Failed to commit completion")?;
        Ok(true)
    }
}

fn insert_task_row(conn: &Connection, task: &Task) -> Result<()> {
    conn.execute(
        "INSERT INTO tasks (
            id, list_id, title, description, completed, due_date, reschedule_period,
            reschedule_base, completed_at, prohibited_months, constraint_tags, created_at, updated_at
        ) VALUES (
            :id, :list_id, :title, :description, :completed, :due_date, :reschedule_period,
            :reschedule_base, :completed_at, :prohibited_months, :constraint_tags, :created_at, :updated_at
        )",
        named_params![
            ":id": &task.id,
            ":list_id": &task.list_id,
            ":title": &task.title,
            ":description": task.description.as_deref(),
            ":completed": task.completed,
            ":due_date": task.due_date,
            ":reschedule_period": task.reschedule_period.map(|p| p.to_string()),
            ":reschedule_base": task.reschedule_base.as_str(),
            ":completed_at": task.completed_at.map(|dt| dt.to_rfc3339()),
            ":prohibited_months": serde_json::to_string(&task.prohibited_months)?,
            ":constraint_tags": serde_json::to_string(&task.constraints)?,
            ":created_at": task.created_at.to_rfc3339(),
            ":updated_at": task.updated_at.to_rfc3339(),
        ],
    )
    .with_context(|| format!("Failed to insert task {}", task.id))?;
    Ok(())
}

/// Which stored rows an update may touch.
#[derive(Clone, Copy)]
enum RowGuard {
    Any,
    /// Only a row that is not completed yet.
    StillOpen,
}

impl RowGuard {
    fn clause(self) -> &'static str {
        match self {
            RowGuard::Any => "",
            RowGuard::StillOpen => " AND completed = 0",
        }
    }
}

fn update_task_row(conn: &Connection, task: &Task, guard: RowGuard) -> Result<bool> {
    let sql = format!(
        "UPDATE tasks SET
                list_id = :list_id,
                title = :title,
                description = :description,
                completed = :completed,
                due_date = :due_date,
                reschedule_period = :reschedule_period,
                reschedule_base = :reschedule_base,
                completed_at = :completed_at,
                prohibited_months = :prohibited_months,
                constraint_tags = :constraint_tags,
                updated_at = :updated_at
             WHERE id = :id{}",
        guard.clause()
    );
    let affected = conn
        .execute(
            &sql,
            named_params![
                ":list_id": &task.list_id,
                ":title": &task.title,
                ":description": task.description.as_deref(),
                ":completed": task.completed,
                ":due_date": task.due_date,
                ":reschedule_period": task.reschedule_period.map(|p| p.to_string()),
                ":reschedule_base": task.reschedule_base.as_str(),
                ":completed_at": task.completed_at.map(|dt| dt.to_rfc3339()),
                ":prohibited_months": serde_json::to_string(&task.prohibited_months)?,
                ":constraint_tags": serde_json::to_string(&task.constraints)?,
                ":updated_at": task.updated_at.to_rfc3339(),
                ":id": &task.id,
            ],
        )
        .with_context(|| format!("Failed to update task {}", task.id))?;
    Ok(affected > 0)
}

fn map_list(row: &Row<'_>) -> Result<TaskList> {
    Ok(TaskList {
        id: row.get(0)?,
        name: row.get(1)?,
        created_at: parse_timestamp(row.get::<_, String>(2)?)?,
        updated_at: parse_timestamp(row.get::<_, String>(3)?)?,
    })
}

fn map_task(row: &Row<'_>) -> Result<Task> {
    let period = match row.get::<_, Option<String>>(6)? {
        Some(raw) if !raw.is_empty() => Some(Period::parse(&raw)?),
        _ => None,
    };
    let completed_at = match row.get::<_, Option<String>>(8)? {
        Some(raw) => Some(parse_timestamp(raw)?),
        None => None,
    };

    Ok(Task {
        id: row.get(0)?,
        list_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        completed: row.get(4)?,
        due_date: row.get::<_, Option<NaiveDate>>(5)?,
        reschedule_period: period,
        reschedule_base: row.get::<_, String>(7)?.parse()?,
        completed_at,
        prohibited_months: serde_json::from_str(&row.get::<_, String>(9)?)
            .context("Malformed prohibited_months column")?,
        constraints: serde_json::from_str(&row.get::<_, String>(10)?)
            .context("Malformed constraint_tags column")?,
        created_at: parse_timestamp(row.get::<_, String>(11)?)?,
        updated_at: parse_timestamp(row.get::<_, String>(12)?)?,
    })
}

fn parse_timestamp(raw: String) -> Result<Timestamp> {
    DateTime::parse_from_rfc3339(&raw)
        .map_err(|e| anyhow!("Failed to parse timestamp '{}': {}", raw, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NewTask, RescheduleBase};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn temp_config() -> (AppConfig, TempDir) {
        let dir = TempDir::new().expect("temp dir");
        let data_dir = dir.path().to_path_buf();
        std::fs::create_dir_all(&data_dir).expect("create data dir");
        let config = AppConfig::from_data_dir(data_dir).expect("config");
        (config, dir)
    }

    fn ts(raw: &str) -> Timestamp {
        DateTime::parse_from_rfc3339(raw).unwrap()
    }

    fn seed_list(db: &Database, name: &str) -> TaskList {
        let list = TaskList::new(name.into(), ts("2024-06-01T09:00:00+02:00"));
        db.insert_list(&list).expect("insert list");
        list
    }

    fn task_in(list: &TaskList, title: &str) -> Task {
        NewTask {
            list_id: list.id.clone(),
            title: title.into(),
            description: Some("Use the blue bucket".into()),
            completed: false,
            due_date: NaiveDate::from_ymd_opt(2024, 6, 20),
            reschedule_period: Some(Period::parse("2w").unwrap()),
            reschedule_base: RescheduleBase::Due,
            prohibited_months: vec![1, 2],
            constraints: vec!["warm day".into(), "after rain".into()],
        }
        .into_task(ts("2024-06-01T09:30:00+02:00"))
    }

    #[test]
    fn task_roundtrip_preserves_fields() {
        let (config, _dir) = temp_config();
        let db = Database::initialize(&config).expect("init db");
        let list = seed_list(&db, "Outdoors");
        let task = task_in(&list, "Wash car");
        db.insert_task(&task).expect("insert task");

        let fetched = db.fetch_task(&task.id).expect("fetch").expect("present");
        assert_eq!(fetched, task);
        assert_eq!(fetched.created_at.offset().local_minus_utc(), 2 * 3600);
        assert_eq!(db.list_tasks(&list.id).expect("list tasks"), vec![task]);
    }

    #[test]
    fn lists_can_be_renamed_and_deleted_with_cascade() {
        let (config, _dir) = temp_config();
        let db = Database::initialize(&config).expect("init db");
        let mut list = seed_list(&db, "Garage");
        let task = task_in(&list, "Sort tools");
        db.insert_task(&task).expect("insert task");

        list.name = "Workshop".into();
        list.updated_at = ts("2024-06-02T09:00:00Z");
        assert!(db.update_list(&list).expect("rename"));
        assert_eq!(db.fetch_list(&list.id).unwrap().unwrap().name, "Workshop");

        assert!(db.delete_list(&list.id).expect("delete list"));
        assert!(db.fetch_task(&task.id).unwrap().is_none());
        assert!(db.list_lists().unwrap().is_empty());
        assert!(!db.delete_list(&list.id).unwrap());
    }

    #[test]
    fn foreign_key_rejects_orphan_tasks() {
        let (config, _dir) = temp_config();
        let db = Database::initialize(&config).expect("init db");
        let ghost = TaskList::new("Ghost".into(), ts("2024-06-01T09:00:00Z"));
        assert!(db.insert_task(&task_in(&ghost, "Haunt")).is_err());
    }

    #[test]
    fn completion_commits_update_and_occurrence_together() {
        let (config, _dir) = temp_config();
        let db = Database::initialize(&config).expect("init db");
        let list = seed_list(&db, "Kitchen");
        let mut original = task_in(&list, "Clean fridge");
        db.insert_task(&original).expect("insert");

        original.completed = true;
        original.completed_at = Some(ts("2024-06-20T18:00:00+02:00"));
        let spawned = task_in(&list, "Clean fridge");
        assert!(db.commit_completion(&original, &spawned).expect("commit"));

        assert!(db.fetch_task(&original.id).unwrap().unwrap().completed);
        assert!(db.fetch_task(&spawned.id).unwrap().is_some());
    }

    #[test]
    fn failed_completion_leaves_no_partial_state() {
        let (config, _dir) = temp_config();
        let db = Database::initialize(&config).expect("init db");
        let list = seed_list(&db, "Kitchen");
        let original = task_in(&list, "Clean fridge");
        db.insert_task(&original).expect("insert");

        let mut completed = original.clone();
        completed.completed = true;
        completed.completed_at = Some(ts("2024-06-20T18:00:00Z"));
        // Reusing the original id makes the occurrence insert collide.
        let mut clash = task_in(&list, "Clean fridge");
        clash.id = original.id.clone();

        assert!(db.commit_completion(&completed, &clash).is_err());
        let stored = db.fetch_task(&original.id).unwrap().unwrap();
        assert!(!stored.completed);
        assert_eq!(db.list_tasks(&list.id).unwrap().len(), 1);
    }

    #[test]
    fn second_completion_of_same_task_is_refused() {
        let (config, _dir) = temp_config();
        let first = Database::initialize(&config).expect("init db");
        let second = Database::initialize(&config).expect("second connection");
        let list = seed_list(&first, "Kitchen");
        let original = task_in(&list, "Clean fridge");
        first.insert_task(&original).expect("insert");

        let mut completed = original.clone();
        completed.completed = true;
        completed.completed_at = Some(ts("2024-06-20T18:00:00Z"));
        let spawned = task_in(&list, "Clean fridge");
        let duplicate = task_in(&list, "Clean fridge");

        assert!(first.commit_completion(&completed, &spawned).expect("first"));
        assert!(!second.commit_completion(&completed, &duplicate).expect("second"));
        assert!(first.fetch_task(&duplicate.id).unwrap().is_none());
        assert_eq!(first.list_tasks(&list.id).unwrap().len(), 2);
    }

    #[test]
    fn due_dates_are_stored_as_iso_days() {
        let (config, _dir) = temp_config();
        let db = Database::initialize(&config).expect("init db");
        let list = seed_list(&db, "Porch");
        let task = task_in(&list, "Sweep steps");
        db.insert_task(&task).expect("insert");

        let raw: String = db
            .conn
            .query_row("SELECT due_date FROM tasks WHERE id = ?", [&task.id], |row| {
                row.get(0)
            })
            .expect("raw due date");
        assert_eq!(raw, "2024-06-20");
    }

    #[test]
    fn update_of_unknown_task_reports_false() {
        let (config, _dir) = temp_config();
        let db = Database::initialize(&config).expect("init db");
        let list = seed_list(&db, "Attic");
        let task = task_in(&list, "Check insulation");
        assert!(!db.update_task(&task).expect("update"));
    }
}
