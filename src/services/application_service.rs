use anyhow::{anyhow, Result};
use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::database::entities::{applications, round_media, rounds, status_events, statuses};

/// Writable application fields shared by create and update payloads.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ApplicationInput {
    pub company: Option<String>,
    pub job_title: Option<String>,
    pub job_url: Option<String>,
    pub location: Option<String>,
    pub source: Option<String>,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
    pub notes: Option<String>,
    pub applied_on: Option<NaiveDate>,
    pub status_id: Option<String>,
}

/// Writable fields for an interview round.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RoundInput {
    pub round_type_id: Option<String>,
    pub sequence: Option<i32>,
    pub scheduled_at: Option<chrono::DateTime<Utc>>,
    pub outcome: Option<String>,
    pub notes: Option<String>,
}

#[derive(Clone)]
pub struct ApplicationService {
    db: DatabaseConnection,
}

impl ApplicationService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// List a user's applications, most recently updated first
    pub async fn list(&self, user_id: &str) -> Result<Vec<applications::Model>> {
        let items = applications::Entity::find()
            .filter(applications::Column::UserId.eq(user_id))
            .order_by_desc(applications::Column::UpdatedAt)
            .all(&self.db)
            .await?;
        Ok(items)
    }

    /// Get one application scoped to its owner
    pub async fn get(&self, user_id: &str, id: &str) -> Result<Option<applications::Model>> {
        let item = applications::Entity::find_by_id(id)
            .filter(applications::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?;
        Ok(item)
    }

    /// Create a new application
    pub async fn create(
        &self,
        user_id: &str,
        input: ApplicationInput,
    ) -> Result<applications::Model> {
        let application = applications::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            user_id: Set(user_id.to_string()),
            status_id: Set(input.status_id),
            company: Set(input.company),
            job_title: Set(input.job_title),
            job_url: Set(input.job_url),
            location: Set(input.location),
            source: Set(input.source),
            salary_min: Set(input.salary_min),
            salary_max: Set(input.salary_max),
            resume_path: Set(None),
            cover_letter_path: Set(None),
            notes: Set(input.notes),
            applied_on: Set(input.applied_on),
            created_at: Set(Utc::now()),
            updated_at: Set(Utc::now()),
        };
        Ok(application.insert(&self.db).await?)
    }

    /// Update fields that were provided, leaving the rest untouched
    pub async fn update(
        &self,
        user_id: &str,
        id: &str,
        input: ApplicationInput,
    ) -> Result<applications::Model> {
        let application = self
            .get(user_id, id)
            .await?
            .ok_or_else(|| anyhow!("Application not found"))?;

        let mut active: applications::ActiveModel = application.into();
        if let Some(company) = input.company {
            active.company = Set(Some(company));
        }
        if let Some(job_title) = input.job_title {
            active.job_title = Set(Some(job_title));
        }
        if let Some(job_url) = input.job_url {
            active.job_url = Set(Some(job_url));
        }
        if let Some(location) = input.location {
            active.location = Set(Some(location));
        }
        if let Some(source) = input.source {
            active.source = Set(Some(source));
        }
        if let Some(salary_min) = input.salary_min {
            active.salary_min = Set(Some(salary_min));
        }
        if let Some(salary_max) = input.salary_max {
            active.salary_max = Set(Some(salary_max));
        }
        if let Some(notes) = input.notes {
            active.notes = Set(Some(notes));
        }
        if let Some(applied_on) = input.applied_on {
            active.applied_on = Set(Some(applied_on));
        }
        active.updated_at = Set(Utc::now());

        Ok(active.update(&self.db).await?)
    }

    /// Delete an application. Rounds, media rows and status events cascade;
    /// stored files are shared blobs and stay behind.
    pub async fn delete(&self, user_id: &str, id: &str) -> Result<()> {
        let application = self
            .get(user_id, id)
            .await?
            .ok_or_else(|| anyhow!("Application not found"))?;

        let result = applications::Entity::delete_by_id(application.id)
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(anyhow!("Application not found"));
        }
        Ok(())
    }

    /// Move an application to a new status, appending a status event so the
    /// history survives later status edits.
    pub async fn change_status(
        &self,
        user_id: &str,
        id: &str,
        status_id: &str,
        note: Option<String>,
    ) -> Result<applications::Model> {
        let application = self
            .get(user_id, id)
            .await?
            .ok_or_else(|| anyhow!("Application not found"))?;

        // The target status must belong to the same user.
        statuses::Entity::find_by_id(status_id)
            .filter(statuses::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or_else(|| anyhow!("Status not found"))?;

        let txn = self.db.begin().await?;

        let mut active: applications::ActiveModel = application.into();
        active.status_id = Set(Some(status_id.to_string()));
        active.updated_at = Set(Utc::now());
        let updated = active.update(&txn).await?;

        let event = status_events::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            application_id: Set(updated.id.clone()),
            status_id: Set(Some(status_id.to_string())),
            note: Set(note),
            occurred_at: Set(Utc::now()),
            created_at: Set(Utc::now()),
        };
        event.insert(&txn).await?;

        txn.commit().await?;
        Ok(updated)
    }

    /// Status history for an application, oldest first
    pub async fn status_history(
        &self,
        user_id: &str,
        id: &str,
    ) -> Result<Vec<status_events::Model>> {
        self.get(user_id, id)
            .await?
            .ok_or_else(|| anyhow!("Application not found"))?;

        let events = status_events::Entity::find()
            .filter(status_events::Column::ApplicationId.eq(id))
            .order_by_asc(status_events::Column::OccurredAt)
            .all(&self.db)
            .await?;
        Ok(events)
    }

    /// List an application's rounds in sequence order
    pub async fn list_rounds(&self, user_id: &str, id: &str) -> Result<Vec<rounds::Model>> {
        self.get(user_id, id)
            .await?
            .ok_or_else(|| anyhow!("Application not found"))?;

        let items = rounds::Entity::find()
            .filter(rounds::Column::ApplicationId.eq(id))
            .order_by_asc(rounds::Column::Sequence)
            .order_by_asc(rounds::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(items)
    }

    /// Add a round to an application. When no sequence is given the round
    /// goes after the current highest.
    pub async fn add_round(
        &self,
        user_id: &str,
        id: &str,
        input: RoundInput,
    ) -> Result<rounds::Model> {
        self.get(user_id, id)
            .await?
            .ok_or_else(|| anyhow!("Application not found"))?;

        let sequence = match input.sequence {
            Some(sequence) => Some(sequence),
            None => {
                let existing = rounds::Entity::find()
                    .filter(rounds::Column::ApplicationId.eq(id))
                    .all(&self.db)
                    .await?;
                let next = existing
                    .iter()
                    .filter_map(|round| round.sequence)
                    .max()
                    .unwrap_or(existing.len() as i32);
                Some(next + 1)
            }
        };

        let round = rounds::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            application_id: Set(id.to_string()),
            round_type_id: Set(input.round_type_id),
            sequence: Set(sequence),
            scheduled_at: Set(input.scheduled_at),
            outcome: Set(input.outcome),
            notes: Set(input.notes),
            created_at: Set(Utc::now()),
            updated_at: Set(Utc::now()),
        };
        Ok(round.insert(&self.db).await?)
    }

    /// Get one round, checking it belongs to the user's application
    pub async fn get_round(&self, user_id: &str, round_id: &str) -> Result<Option<rounds::Model>> {
        let Some(round) = rounds::Entity::find_by_id(round_id).one(&self.db).await? else {
            return Ok(None);
        };
        let owned = self.get(user_id, &round.application_id).await?.is_some();
        Ok(owned.then_some(round))
    }

    pub async fn update_round(
        &self,
        user_id: &str,
        round_id: &str,
        input: RoundInput,
    ) -> Result<rounds::Model> {
        let round = self
            .get_round(user_id, round_id)
            .await?
            .ok_or_else(|| anyhow!("Round not found"))?;

        let mut active: rounds::ActiveModel = round.into();
        if let Some(round_type_id) = input.round_type_id {
            active.round_type_id = Set(Some(round_type_id));
        }
        if let Some(sequence) = input.sequence {
            active.sequence = Set(Some(sequence));
        }
        if let Some(scheduled_at) = input.scheduled_at {
            active.scheduled_at = Set(Some(scheduled_at));
        }
        if let Some(outcome) = input.outcome {
            active.outcome = Set(Some(outcome));
        }
        if let Some(notes) = input.notes {
            active.notes = Set(Some(notes));
        }
        active.updated_at = Set(Utc::now());

        Ok(active.update(&self.db).await?)
    }

    pub async fn delete_round(&self, user_id: &str, round_id: &str) -> Result<()> {
        let round = self
            .get_round(user_id, round_id)
            .await?
            .ok_or_else(|| anyhow!("Round not found"))?;

        rounds::Entity::delete_by_id(round.id).exec(&self.db).await?;
        Ok(())
    }

    /// Media rows attached to a round
    pub async fn list_round_media(
        &self,
        user_id: &str,
        round_id: &str,
    ) -> Result<Vec<round_media::Model>> {
        self.get_round(user_id, round_id)
            .await?
            .ok_or_else(|| anyhow!("Round not found"))?;

        let items = round_media::Entity::find()
            .filter(round_media::Column::RoundId.eq(round_id))
            .order_by_asc(round_media::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(items)
    }
}
