use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create statuses table
        manager
            .create_table(
                Table::create()
                    .table(Statuses::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Statuses::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Statuses::UserId).string().not_null())
                    .col(ColumnDef::new(Statuses::Name).string().not_null())
                    .col(ColumnDef::new(Statuses::Color).string().null())
                    .col(ColumnDef::new(Statuses::SortOrder).integer().not_null().default(0))
                    .col(ColumnDef::new(Statuses::IsTerminal).boolean().not_null().default(false))
                    .col(ColumnDef::new(Statuses::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Statuses::UpdatedAt).timestamp_with_time_zone().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_statuses_user_id")
                            .from(Statuses::Table, Statuses::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create round_types table
        manager
            .create_table(
                Table::create()
                    .table(RoundTypes::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(RoundTypes::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(RoundTypes::UserId).string().not_null())
                    .col(ColumnDef::new(RoundTypes::Name).string().not_null())
                    .col(ColumnDef::new(RoundTypes::SortOrder).integer().not_null().default(0))
                    .col(ColumnDef::new(RoundTypes::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(RoundTypes::UpdatedAt).timestamp_with_time_zone().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_round_types_user_id")
                            .from(RoundTypes::Table, RoundTypes::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create profiles table
        manager
            .create_table(
                Table::create()
                    .table(Profiles::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Profiles::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Profiles::UserId).string().not_null().unique_key())
                    .col(ColumnDef::new(Profiles::Headline).string().null())
                    .col(ColumnDef::new(Profiles::Summary).text().null())
                    .col(ColumnDef::new(Profiles::Phone).string().null())
                    .col(ColumnDef::new(Profiles::Links).json().null())
                    .col(ColumnDef::new(Profiles::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Profiles::UpdatedAt).timestamp_with_time_zone().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_profiles_user_id")
                            .from(Profiles::Table, Profiles::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create applications table. Most columns are nullable so that partial
        // records imported from an archive can still be stored.
        manager
            .create_table(
                Table::create()
                    .table(Applications::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Applications::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Applications::UserId).string().not_null())
                    .col(ColumnDef::new(Applications::StatusId).string().null())
                    .col(ColumnDef::new(Applications::Company).string().null())
                    .col(ColumnDef::new(Applications::JobTitle).string().null())
                    .col(ColumnDef::new(Applications::JobUrl).string().null())
                    .col(ColumnDef::new(Applications::Location).string().null())
                    .col(ColumnDef::new(Applications::Source).string().null())
                    .col(ColumnDef::new(Applications::SalaryMin).integer().null())
                    .col(ColumnDef::new(Applications::SalaryMax).integer().null())
                    .col(ColumnDef::new(Applications::ResumePath).string().null())
                    .col(ColumnDef::new(Applications::CoverLetterPath).string().null())
                    .col(ColumnDef::new(Applications::Notes).text().null())
                    .col(ColumnDef::new(Applications::AppliedOn).date().null())
                    .col(ColumnDef::new(Applications::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Applications::UpdatedAt).timestamp_with_time_zone().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_applications_user_id")
                            .from(Applications::Table, Applications::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_applications_status_id")
                            .from(Applications::Table, Applications::StatusId)
                            .to(Statuses::Table, Statuses::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Create rounds table
        manager
            .create_table(
                Table::create()
                    .table(Rounds::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Rounds::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Rounds::ApplicationId).string().not_null())
                    .col(ColumnDef::new(Rounds::RoundTypeId).string().null())
                    .col(ColumnDef::new(Rounds::Sequence).integer().null())
                    .col(ColumnDef::new(Rounds::ScheduledAt).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(Rounds::Outcome).string().null())
                    .col(ColumnDef::new(Rounds::Notes).text().null())
                    .col(ColumnDef::new(Rounds::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Rounds::UpdatedAt).timestamp_with_time_zone().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rounds_application_id")
                            .from(Rounds::Table, Rounds::ApplicationId)
                            .to(Applications::Table, Applications::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rounds_round_type_id")
                            .from(Rounds::Table, Rounds::RoundTypeId)
                            .to(RoundTypes::Table, RoundTypes::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Create round_media table
        manager
            .create_table(
                Table::create()
                    .table(RoundMedia::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(RoundMedia::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(RoundMedia::RoundId).string().not_null())
                    .col(ColumnDef::new(RoundMedia::Kind).string().not_null())
                    .col(ColumnDef::new(RoundMedia::FilePath).string().not_null())
                    .col(ColumnDef::new(RoundMedia::OriginalName).string().null())
                    .col(ColumnDef::new(RoundMedia::MimeType).string().null())
                    .col(ColumnDef::new(RoundMedia::SizeBytes).big_integer().null())
                    .col(ColumnDef::new(RoundMedia::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(RoundMedia::UpdatedAt).timestamp_with_time_zone().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_round_media_round_id")
                            .from(RoundMedia::Table, RoundMedia::RoundId)
                            .to(Rounds::Table, Rounds::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create status_events table
        manager
            .create_table(
                Table::create()
                    .table(StatusEvents::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(StatusEvents::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(StatusEvents::ApplicationId).string().not_null())
                    .col(ColumnDef::new(StatusEvents::StatusId).string().null())
                    .col(ColumnDef::new(StatusEvents::Note).text().null())
                    .col(ColumnDef::new(StatusEvents::OccurredAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(StatusEvents::CreatedAt).timestamp_with_time_zone().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_status_events_application_id")
                            .from(StatusEvents::Table, StatusEvents::ApplicationId)
                            .to(Applications::Table, Applications::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_status_events_status_id")
                            .from(StatusEvents::Table, StatusEvents::StatusId)
                            .to(Statuses::Table, Statuses::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Create lookup indexes. The (user_id, name) pairs are deliberately
        // not unique: imports append statuses and round types even when a
        // name the user already has comes in from the archive.
        manager
            .create_index(
                Index::create()
                    .name("idx_statuses_user_name")
                    .table(Statuses::Table)
                    .col(Statuses::UserId)
                    .col(Statuses::Name)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_round_types_user_name")
                    .table(RoundTypes::Table)
                    .col(RoundTypes::UserId)
                    .col(RoundTypes::Name)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_applications_user_id")
                    .table(Applications::Table)
                    .col(Applications::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_applications_status_id")
                    .table(Applications::Table)
                    .col(Applications::StatusId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_rounds_application_id")
                    .table(Rounds::Table)
                    .col(Rounds::ApplicationId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_round_media_round_id")
                    .table(RoundMedia::Table)
                    .col(RoundMedia::RoundId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_status_events_application_id")
                    .table(StatusEvents::Table)
                    .col(StatusEvents::ApplicationId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(StatusEvents::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(RoundMedia::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Rounds::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Applications::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Profiles::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(RoundTypes::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Statuses::Table).to_owned())
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
enum Statuses {
    Table,
    Id,
    UserId,
    Name,
    Color,
    SortOrder,
    IsTerminal,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum RoundTypes {
    Table,
    Id,
    UserId,
    Name,
    SortOrder,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Profiles {
    Table,
    Id,
    UserId,
    Headline,
    Summary,
    Phone,
    Links,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Applications {
    Table,
    Id,
    UserId,
    StatusId,
    Company,
    JobTitle,
    JobUrl,
    Location,
    Source,
    SalaryMin,
    SalaryMax,
    ResumePath,
    CoverLetterPath,
    Notes,
    AppliedOn,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Rounds {
    Table,
    Id,
    ApplicationId,
    RoundTypeId,
    Sequence,
    ScheduledAt,
    Outcome,
    Notes,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum RoundMedia {
    Table,
    Id,
    RoundId,
    Kind,
    FilePath,
    OriginalName,
    MimeType,
    SizeBytes,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum StatusEvents {
    Table,
    Id,
    ApplicationId,
    StatusId,
    Note,
    OccurredAt,
    CreatedAt,
}
