//! Test run model for recording pipeline outcomes.

use crate::db::connection::DbConnection;
use crate::prelude::*;
use crate::schema::testrun::dsl::*;
use chrono::{DateTime, Utc};
use diesel::associations::HasTable;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stored test run.
#[derive(Debug, Clone, Queryable, Selectable, Identifiable, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::testrun)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TestRunDb {
    /// Unique run ID.
    pub id: Uuid,
    /// URL of the repository that was tested.
    pub source_link: String,
    /// Whether clone, install and test all succeeded.
    pub success: bool,
    /// Fixed success message or the failure reason.
    pub output: String,
    /// When this run was stored.
    pub created_at: DateTime<Utc>,
}

/// Data for recording a new test run.
#[derive(Insertable, PartialEq, Debug, Clone, Deserialize)]
#[diesel(table_name = crate::schema::testrun)]
pub struct TestRunCreate {
    /// URL of the repository that was tested.
    pub source_link: String,
    /// Whether clone, install and test all succeeded.
    pub success: bool,
    /// Fixed success message or the failure reason.
    pub output: String,
}

impl TestRunCreate {
    /// Saves the test run to the database.
    pub fn save(self, connection: &DbConnection) -> Result<TestRunDb> {
        let conn = &mut connection.pool.get()?;
        Ok(diesel::insert_into(testrun)
            .values(&self)
            .returning(TestRunDb::as_returning())
            .get_result(conn)?)
    }
}

impl TestRunDb {
    /// Fetches every stored run in insertion order.
    pub fn fetch_all(connection: &DbConnection) -> Result<Vec<Self>> {
        let conn = &mut connection.pool.get()?;
        Ok(TestRunDb::table()
            .order(seq.asc())
            .select(TestRunDb::as_select())
            .load(conn)?)
    }
}
