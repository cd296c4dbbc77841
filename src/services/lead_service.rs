use anyhow::{anyhow, Result};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::database::entities::{applications, job_leads};

/// Writable lead fields shared by create and update payloads.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct LeadInput {
    pub company: Option<String>,
    pub job_title: Option<String>,
    pub url: Option<String>,
    pub notes: Option<String>,
}

#[derive(Clone)]
pub struct LeadService {
    db: DatabaseConnection,
}

impl LeadService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// List a user's leads, most recently updated first
    pub async fn list(&self, user_id: &str) -> Result<Vec<job_leads::Model>> {
        let items = job_leads::Entity::find()
            .filter(job_leads::Column::UserId.eq(user_id))
            .order_by_desc(job_leads::Column::UpdatedAt)
            .all(&self.db)
            .await?;
        Ok(items)
    }

    pub async fn get(&self, user_id: &str, id: &str) -> Result<Option<job_leads::Model>> {
        let item = job_leads::Entity::find_by_id(id)
            .filter(job_leads::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?;
        Ok(item)
    }

    pub async fn create(&self, user_id: &str, input: LeadInput) -> Result<job_leads::Model> {
        let lead = job_leads::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            user_id: Set(user_id.to_string()),
            company: Set(input.company),
            job_title: Set(input.job_title),
            url: Set(input.url),
            notes: Set(input.notes),
            state: Set(job_leads::STATE_NEW.to_string()),
            created_at: Set(Utc::now()),
            updated_at: Set(Utc::now()),
        };
        Ok(lead.insert(&self.db).await?)
    }

    pub async fn update(
        &self,
        user_id: &str,
        id: &str,
        input: LeadInput,
    ) -> Result<job_leads::Model> {
        let lead = self
            .get(user_id, id)
            .await?
            .ok_or_else(|| anyhow!("Lead not found"))?;

        let mut active: job_leads::ActiveModel = lead.into();
        if let Some(company) = input.company {
            active.company = Set(Some(company));
        }
        if let Some(job_title) = input.job_title {
            active.job_title = Set(Some(job_title));
        }
        if let Some(url) = input.url {
            active.url = Set(Some(url));
        }
        if let Some(notes) = input.notes {
            active.notes = Set(Some(notes));
        }
        active.updated_at = Set(Utc::now());

        Ok(active.update(&self.db).await?)
    }

    /// Mark a lead as dismissed without deleting it
    pub async fn dismiss(&self, user_id: &str, id: &str) -> Result<job_leads::Model> {
        let lead = self
            .get(user_id, id)
            .await?
            .ok_or_else(|| anyhow!("Lead not found"))?;

        let mut active: job_leads::ActiveModel = lead.into();
        active.state = Set(job_leads::STATE_DISMISSED.to_string());
        active.updated_at = Set(Utc::now());
        Ok(active.update(&self.db).await?)
    }

    /// Convert a lead into an application, carrying its fields over. The
    /// lead stays behind in the converted state.
    pub async fn convert(
        &self,
        user_id: &str,
        id: &str,
    ) -> Result<(job_leads::Model, applications::Model)> {
        let lead = self
            .get(user_id, id)
            .await?
            .ok_or_else(|| anyhow!("Lead not found"))?;
        if lead.state == job_leads::STATE_CONVERTED {
            return Err(anyhow!("Lead has already been converted"));
        }

        let txn = self.db.begin().await?;

        let application = applications::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            user_id: Set(user_id.to_string()),
            status_id: Set(None),
            company: Set(lead.company.clone()),
            job_title: Set(lead.job_title.clone()),
            job_url: Set(lead.url.clone()),
            location: Set(None),
            source: Set(None),
            salary_min: Set(None),
            salary_max: Set(None),
            resume_path: Set(None),
            cover_letter_path: Set(None),
            notes: Set(lead.notes.clone()),
            applied_on: Set(None),
            created_at: Set(Utc::now()),
            updated_at: Set(Utc::now()),
        };
        let application = application.insert(&txn).await?;

        let mut active: job_leads::ActiveModel = lead.into();
        active.state = Set(job_leads::STATE_CONVERTED.to_string());
        active.updated_at = Set(Utc::now());
        let lead = active.update(&txn).await?;

        txn.commit().await?;
        Ok((lead, application))
    }

    pub async fn delete(&self, user_id: &str, id: &str) -> Result<()> {
        let lead = self
            .get(user_id, id)
            .await?
            .ok_or_else(|| anyhow!("Lead not found"))?;

        let result = job_leads::Entity::delete_by_id(lead.id)
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(anyhow!("Lead not found"));
        }
        Ok(())
    }
}
