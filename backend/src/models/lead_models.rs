use diesel::prelude::*;

use crate::schema::leads;

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = leads)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Lead {
    pub id: String,
    pub created_at: String, // ISO-8601
    pub name: String,
    pub email: String,
    pub phone: String,
    pub message: String,
    pub source: String, // which form/page the lead came from, "web" by default
    pub client_ip: String,
    pub user_agent: String,
}
