use diesel::prelude::*;
use diesel::result::Error as DieselError;

use crate::{models::lead_models::Lead, schema::leads, DbPool};

pub struct LeadRepository {
    pool: DbPool,
}

impl LeadRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    // Insert a new lead
    pub fn create_lead(&self, lead: &Lead) -> Result<(), DieselError> {
        let mut conn = self.pool.get().expect("Failed to get DB connection");
        diesel::insert_into(leads::table)
            .values(lead)
            .execute(&mut conn)?;
        Ok(())
    }

    // Find a lead by its id
    pub fn find_by_id(&self, lead_id: &str) -> Result<Option<Lead>, DieselError> {
        let mut conn = self.pool.get().expect("Failed to get DB connection");
        let lead = leads::table
            .filter(leads::id.eq(lead_id))
            .first::<Lead>(&mut conn)
            .optional()?;
        Ok(lead)
    }
}
