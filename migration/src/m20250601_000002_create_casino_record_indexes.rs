use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

const IDX_URL_SCRAPED_AT: &str = "idx_casino_records_url_scraped_at";
const IDX_STATUS: &str = "idx_casino_records_status";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 按来源查最新记录
        manager
            .create_index(
                Index::create()
                    .name(IDX_URL_SCRAPED_AT)
                    .table(CasinoRecords::Table)
                    .col(CasinoRecords::Url)
                    .col((CasinoRecords::ScrapedAt, IndexOrder::Desc))
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name(IDX_STATUS)
                    .table(CasinoRecords::Table)
                    .col(CasinoRecords::Status)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name(IDX_STATUS)
                    .table(CasinoRecords::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name(IDX_URL_SCRAPED_AT)
                    .table(CasinoRecords::Table)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum CasinoRecords {
    Table,
    Url,
    ScrapedAt,
    Status,
}
