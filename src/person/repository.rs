//! SQLite access for the `pessoa` table.
//!
//! Every operation opens its own connection and drops it before returning,
//! on success and on error alike. There is no pooling.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use tracing::debug;

use super::types::Person;

/// How long a connection waits on a locked database before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS pessoa (
    nome TEXT,
    sobrenome TEXT,
    cpf TEXT,
    data_nascimento TEXT
)";

const CREATE_CPF_INDEX: &str = "CREATE UNIQUE INDEX IF NOT EXISTS pessoa_cpf_idx ON pessoa (cpf)";

const SELECT_ALL: &str = "SELECT nome, sobrenome, cpf, data_nascimento FROM pessoa";

const SELECT_BY_CPF: &str =
    "SELECT nome, sobrenome, cpf, data_nascimento FROM pessoa WHERE cpf = ?1";

/// Result of an upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// No row had the CPF; a new one was inserted.
    Created,
    /// An existing row was updated in place.
    Updated,
}

/// Person repository bound to a database file.
#[derive(Debug, Clone)]
pub struct PersonRepository {
    path: PathBuf,
}

impl PersonRepository {
    /// Create a repository for the database at `path`.
    /// The file is not touched until the first operation.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Database file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> rusqlite::Result<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(conn)
    }

    /// Create the table and the unique CPF index if they do not exist.
    ///
    /// Fails if an existing table already holds duplicate CPFs.
    pub fn ensure_schema(&self) -> rusqlite::Result<()> {
        let conn = self.connect()?;
        conn.execute(CREATE_TABLE, [])?;
        conn.execute(CREATE_CPF_INDEX, [])?;
        debug!(path = %self.path.display(), "Schema ready");
        Ok(())
    }

    /// All rows.
    pub fn list_all(&self) -> rusqlite::Result<Vec<Person>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(SELECT_ALL)?;
        let rows = stmt.query_map([], person_from_row)?;
        rows.collect()
    }

    /// Rows whose CPF equals `national_id`. Empty when none match.
    pub fn find_by_national_id(&self, national_id: &str) -> rusqlite::Result<Vec<Person>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(SELECT_BY_CPF)?;
        let rows = stmt.query_map(params![national_id], person_from_row)?;
        rows.collect()
    }

    /// Delete rows whose CPF equals `national_id`, returning how many went.
    pub fn delete_by_national_id(&self, national_id: &str) -> rusqlite::Result<usize> {
        let conn = self.connect()?;
        conn.execute("DELETE FROM pessoa WHERE cpf = ?1", params![national_id])
    }

    /// Insert `person`, or update name, surname and birth date of the row
    /// with the same CPF.
    ///
    /// The existence check and the write share one IMMEDIATE transaction, so
    /// two connections upserting the same CPF cannot both insert.
    pub fn upsert(&self, person: &Person) -> rusqlite::Result<UpsertOutcome> {
        let mut conn = self.connect()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let exists = tx
            .query_row(
                "SELECT 1 FROM pessoa WHERE cpf = ?1",
                params![person.national_id],
                |_| Ok(()),
            )
            .optional()?
            .is_some();

        let outcome = if exists {
            tx.execute(
                "UPDATE pessoa SET nome = ?1, sobrenome = ?2, data_nascimento = ?3 WHERE cpf = ?4",
                params![person.name, person.surname, person.birth_date, person.national_id],
            )?;
            UpsertOutcome::Updated
        } else {
            tx.execute(
                "INSERT INTO pessoa (nome, sobrenome, cpf, data_nascimento) VALUES (?1, ?2, ?3, ?4)",
                params![person.name, person.surname, person.national_id, person.birth_date],
            )?;
            UpsertOutcome::Created
        };

        tx.commit()?;
        Ok(outcome)
    }

    /// Insert many rows in one transaction, skipping any whose CPF already
    /// exists. Returns the number inserted.
    pub fn insert_many(&self, people: &[Person]) -> rusqlite::Result<usize> {
        let mut conn = self.connect()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO pessoa (nome, sobrenome, cpf, data_nascimento) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT (cpf) DO NOTHING",
            )?;
            for person in people {
                inserted += stmt.execute(params![
                    person.name,
                    person.surname,
                    person.national_id,
                    person.birth_date
                ])?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    /// Number of rows.
    pub fn count(&self) -> rusqlite::Result<usize> {
        let conn = self.connect()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM pessoa", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

fn person_from_row(row: &Row<'_>) -> rusqlite::Result<Person> {
    Ok(Person {
        name: row.get(0)?,
        surname: row.get(1)?,
        national_id: row.get(2)?,
        birth_date: row.get(3)?,
    })
}
