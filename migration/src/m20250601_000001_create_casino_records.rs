use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CasinoRecords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CasinoRecords::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CasinoRecords::IdentityKey)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(CasinoRecords::Name).string().not_null())
                    .col(ColumnDef::new(CasinoRecords::RecordType).string().not_null())
                    .col(ColumnDef::new(CasinoRecords::Stats).json().not_null())
                    .col(ColumnDef::new(CasinoRecords::Features).json().not_null())
                    .col(ColumnDef::new(CasinoRecords::Url).string().not_null())
                    .col(
                        ColumnDef::new(CasinoRecords::HasData)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(CasinoRecords::Status)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(ColumnDef::new(CasinoRecords::Message).text().null())
                    .col(ColumnDef::new(CasinoRecords::Heuristic).json().null())
                    .col(
                        ColumnDef::new(CasinoRecords::ScrapedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CasinoRecords::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(CasinoRecords::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CasinoRecords::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum CasinoRecords {
    Table,
    Id,
    IdentityKey,
    Name,
    RecordType,
    Stats,
    Features,
    Url,
    HasData,
    Status,
    Message,
    Heuristic,
    ScrapedAt,
    CreatedAt,
    UpdatedAt,
}
