use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(JobLeads::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(JobLeads::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(JobLeads::UserId).string().not_null())
                    .col(ColumnDef::new(JobLeads::Company).string().null())
                    .col(ColumnDef::new(JobLeads::JobTitle).string().null())
                    .col(ColumnDef::new(JobLeads::Url).string().null())
                    .col(ColumnDef::new(JobLeads::Notes).text().null())
                    .col(ColumnDef::new(JobLeads::State).string().not_null().default("new"))
                    .col(ColumnDef::new(JobLeads::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(JobLeads::UpdatedAt).timestamp_with_time_zone().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_job_leads_user_id")
                            .from(JobLeads::Table, JobLeads::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_job_leads_user_id")
                    .table(JobLeads::Table)
                    .col(JobLeads::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(JobLeads::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum JobLeads {
    Table,
    Id,
    UserId,
    Company,
    JobTitle,
    Url,
    Notes,
    State,
    CreatedAt,
    UpdatedAt,
}
