use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Global tables
        if !manager.has_table("business").await? {
            manager
                .create_table(
                    Table::create()
                        .table(Business::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Business::Guid)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Business::BusinessUid).string().not_null())
                        .col(ColumnDef::new(Business::NotifyUrl).string().not_null())
                        .col(ColumnDef::new(Business::Timestamp).big_integer().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("business_business_uid")
                        .table(Business::Table)
                        .col(Business::BusinessUid)
                        .unique()
                        .if_not_exists()
                        .to_owned(),
                )
                .await?;
        }

        if !manager.has_table("blocks").await? {
            manager
                .create_table(
                    Table::create()
                        .table(Blocks::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Blocks::Hash).string().not_null().primary_key())
                        .col(ColumnDef::new(Blocks::PrevHash).string().not_null())
                        .col(ColumnDef::new(Blocks::Number).big_integer().not_null())
                        .col(ColumnDef::new(Blocks::Timestamp).big_integer().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("blocks_number")
                        .table(Blocks::Table)
                        .col(Blocks::Number)
                        .unique()
                        .if_not_exists()
                        .to_owned(),
                )
                .await?;
        }

        // Template tables, cloned per tenant with
        // CREATE TABLE <base>_<uid> (LIKE <base> INCLUDING ALL)
        if !manager.has_table("address").await? {
            manager
                .create_table(
                    Table::create()
                        .table(Address::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Address::Guid).uuid().not_null().primary_key())
                        .col(ColumnDef::new(Address::Address).string().not_null())
                        .col(
                            ColumnDef::new(Address::AddressType)
                                .small_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Address::PublicKey)
                                .string()
                                .not_null()
                                .default(""),
                        )
                        .col(ColumnDef::new(Address::Timestamp).big_integer().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("address_address")
                        .table(Address::Table)
                        .col(Address::Address)
                        .unique()
                        .if_not_exists()
                        .to_owned(),
                )
                .await?;

            // At most one hot and one cold wallet per tenant
            let conn = manager.get_connection();
            conn.execute_unprepared(
                "CREATE UNIQUE INDEX IF NOT EXISTS address_hot_wallet ON address (address_type) WHERE address_type = 1",
            )
            .await?;
            conn.execute_unprepared(
                "CREATE UNIQUE INDEX IF NOT EXISTS address_cold_wallet ON address (address_type) WHERE address_type = 2",
            )
            .await?;
        }

        if !manager.has_table("vins").await? {
            manager
                .create_table(
                    Table::create()
                        .table(Vins::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Vins::Guid).uuid().not_null().primary_key())
                        .col(ColumnDef::new(Vins::Address).string().not_null())
                        .col(ColumnDef::new(Vins::TxId).string().not_null())
                        .col(ColumnDef::new(Vins::Vout).integer().not_null().default(0))
                        .col(ColumnDef::new(Vins::Script).string().not_null().default(""))
                        .col(ColumnDef::new(Vins::Witness).string().not_null().default(""))
                        .col(
                            ColumnDef::new(Vins::Amount)
                                .decimal_len(78, 0)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Vins::SpendTxHash)
                                .string()
                                .not_null()
                                .default(""),
                        )
                        .col(
                            ColumnDef::new(Vins::SpendBlockHeight)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Vins::IsSpend)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Vins::Timestamp).big_integer().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("vins_tx_id_vout_address")
                        .table(Vins::Table)
                        .col(Vins::TxId)
                        .col(Vins::Vout)
                        .col(Vins::Address)
                        .unique()
                        .if_not_exists()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("vins_address")
                        .table(Vins::Table)
                        .col(Vins::Address)
                        .if_not_exists()
                        .to_owned(),
                )
                .await?;
        }

        if !manager.has_table("vouts").await? {
            manager
                .create_table(
                    Table::create()
                        .table(Vouts::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Vouts::Guid).uuid().not_null().primary_key())
                        .col(ColumnDef::new(Vouts::Address).string().not_null())
                        .col(ColumnDef::new(Vouts::N).integer().not_null().default(0))
                        .col(ColumnDef::new(Vouts::Script).string().not_null().default(""))
                        .col(
                            ColumnDef::new(Vouts::Amount)
                                .decimal_len(78, 0)
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Vouts::Timestamp).big_integer().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("vouts_address")
                        .table(Vouts::Table)
                        .col(Vouts::Address)
                        .if_not_exists()
                        .to_owned(),
                )
                .await?;
        }

        if !manager.has_table("balances").await? {
            manager
                .create_table(
                    Table::create()
                        .table(Balances::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Balances::Guid).uuid().not_null().primary_key())
                        .col(ColumnDef::new(Balances::Address).string().not_null())
                        .col(
                            ColumnDef::new(Balances::AddressType)
                                .small_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Balances::Balance)
                                .decimal_len(78, 0)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Balances::LockBalance)
                                .decimal_len(78, 0)
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Balances::Timestamp).big_integer().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("balances_address")
                        .table(Balances::Table)
                        .col(Balances::Address)
                        .unique()
                        .if_not_exists()
                        .to_owned(),
                )
                .await?;
        }

        if !manager.has_table("deposits").await? {
            manager
                .create_table(
                    Table::create()
                        .table(Deposits::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Deposits::Guid).uuid().not_null().primary_key())
                        .col(
                            ColumnDef::new(Deposits::BlockHash)
                                .string()
                                .not_null()
                                .default(""),
                        )
                        .col(
                            ColumnDef::new(Deposits::BlockNumber)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Deposits::Hash).string().not_null())
                        .col(
                            ColumnDef::new(Deposits::Fee)
                                .decimal_len(78, 0)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Deposits::Status)
                                .small_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Deposits::Timestamp).big_integer().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("deposits_hash")
                        .table(Deposits::Table)
                        .col(Deposits::Hash)
                        .unique()
                        .if_not_exists()
                        .to_owned(),
                )
                .await?;
        }

        if !manager.has_table("transactions").await? {
            manager
                .create_table(
                    Table::create()
                        .table(Transactions::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Transactions::Guid)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Transactions::Hash).string().not_null())
                        .col(
                            ColumnDef::new(Transactions::BlockHash)
                                .string()
                                .not_null()
                                .default(""),
                        )
                        .col(
                            ColumnDef::new(Transactions::BlockNumber)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Transactions::Fee)
                                .decimal_len(78, 0)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Transactions::TxType)
                                .string()
                                .not_null()
                                .default("unknown"),
                        )
                        .col(
                            ColumnDef::new(Transactions::Status)
                                .small_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Transactions::Timestamp)
                                .big_integer()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("transactions_hash")
                        .table(Transactions::Table)
                        .col(Transactions::Hash)
                        .unique()
                        .if_not_exists()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("transactions_block_number")
                        .table(Transactions::Table)
                        .col(Transactions::BlockNumber)
                        .if_not_exists()
                        .to_owned(),
                )
                .await?;
        }

        if !manager.has_table("withdraws").await? {
            manager
                .create_table(
                    Table::create()
                        .table(Withdraws::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Withdraws::Guid)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Withdraws::BlockHash)
                                .string()
                                .not_null()
                                .default(""),
                        )
                        .col(
                            ColumnDef::new(Withdraws::BlockNumber)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Withdraws::Hash)
                                .string()
                                .not_null()
                                .default("0x00"),
                        )
                        .col(
                            ColumnDef::new(Withdraws::Fee)
                                .decimal_len(78, 0)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Withdraws::LockTime)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Withdraws::Version)
                                .string()
                                .not_null()
                                .default("0x00"),
                        )
                        .col(
                            ColumnDef::new(Withdraws::TxSignHex)
                                .string()
                                .not_null()
                                .default(""),
                        )
                        .col(
                            ColumnDef::new(Withdraws::Status)
                                .small_integer()
                                .not_null()
                                .default(3),
                        )
                        .col(ColumnDef::new(Withdraws::Timestamp).big_integer().not_null())
                        .to_owned(),
                )
                .await?;

            // Pending rows share the placeholder hash until broadcast
            manager
                .get_connection()
                .execute_unprepared(
                    "CREATE UNIQUE INDEX IF NOT EXISTS withdraws_hash ON withdraws (hash) WHERE hash <> '0x00'",
                )
                .await?;
        }

        if !manager.has_table("internals").await? {
            manager
                .create_table(
                    Table::create()
                        .table(Internals::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Internals::Guid)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Internals::BlockHash)
                                .string()
                                .not_null()
                                .default(""),
                        )
                        .col(
                            ColumnDef::new(Internals::BlockNumber)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Internals::Hash)
                                .string()
                                .not_null()
                                .default("0x00"),
                        )
                        .col(
                            ColumnDef::new(Internals::Fee)
                                .decimal_len(78, 0)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Internals::TxSignHex)
                                .string()
                                .not_null()
                                .default(""),
                        )
                        .col(
                            ColumnDef::new(Internals::Status)
                                .small_integer()
                                .not_null()
                                .default(3),
                        )
                        .col(ColumnDef::new(Internals::Timestamp).big_integer().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .get_connection()
                .execute_unprepared(
                    "CREATE UNIQUE INDEX IF NOT EXISTS internals_hash ON internals (hash) WHERE hash <> '0x00'",
                )
                .await?;
        }

        if !manager.has_table("child_txs").await? {
            manager
                .create_table(
                    Table::create()
                        .table(ChildTxs::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ChildTxs::Guid)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(ChildTxs::Hash).string().not_null().default(""))
                        .col(ColumnDef::new(ChildTxs::TxId).string().not_null().default(""))
                        .col(
                            ColumnDef::new(ChildTxs::TxIndex)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(ChildTxs::TxType).string().not_null())
                        .col(
                            ColumnDef::new(ChildTxs::FromAddress)
                                .string()
                                .not_null()
                                .default(""),
                        )
                        .col(
                            ColumnDef::new(ChildTxs::ToAddress)
                                .string()
                                .not_null()
                                .default(""),
                        )
                        .col(
                            ColumnDef::new(ChildTxs::Amount)
                                .string()
                                .not_null()
                                .default("0"),
                        )
                        .col(ColumnDef::new(ChildTxs::Timestamp).big_integer().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("child_txs_leg")
                        .table(ChildTxs::Table)
                        .col(ChildTxs::Hash)
                        .col(ChildTxs::TxIndex)
                        .col(ChildTxs::TxType)
                        .col(ChildTxs::FromAddress)
                        .col(ChildTxs::ToAddress)
                        .unique()
                        .if_not_exists()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("child_txs_tx_id")
                        .table(ChildTxs::Table)
                        .col(ChildTxs::TxId)
                        .if_not_exists()
                        .to_owned(),
                )
                .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ChildTxs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Internals::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Withdraws::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Deposits::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Balances::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Vouts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Vins::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Address::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Blocks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Business::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(Iden)]
enum Business {
    Table,
    Guid,
    BusinessUid,
    NotifyUrl,
    Timestamp,
}

#[derive(Iden)]
enum Blocks {
    Table,
    Hash,
    PrevHash,
    Number,
    Timestamp,
}

#[derive(Iden)]
enum Address {
    Table,
    Guid,
    Address,
    AddressType,
    PublicKey,
    Timestamp,
}

#[derive(Iden)]
enum Vins {
    Table,
    Guid,
    Address,
    TxId,
    Vout,
    Script,
    Witness,
    Amount,
    SpendTxHash,
    SpendBlockHeight,
    IsSpend,
    Timestamp,
}

#[derive(Iden)]
enum Vouts {
    Table,
    Guid,
    Address,
    N,
    Script,
    Amount,
    Timestamp,
}

#[derive(Iden)]
enum Balances {
    Table,
    Guid,
    Address,
    AddressType,
    Balance,
    LockBalance,
    Timestamp,
}

#[derive(Iden)]
enum Deposits {
    Table,
    Guid,
    BlockHash,
    BlockNumber,
    Hash,
    Fee,
    Status,
    Timestamp,
}

#[derive(Iden)]
enum Transactions {
    Table,
    Guid,
    Hash,
    BlockHash,
    BlockNumber,
    Fee,
    TxType,
    Status,
    Timestamp,
}

#[derive(Iden)]
enum Withdraws {
    Table,
    Guid,
    BlockHash,
    BlockNumber,
    Hash,
    Fee,
    LockTime,
    Version,
    TxSignHex,
    Status,
    Timestamp,
}

#[derive(Iden)]
enum Internals {
    Table,
    Guid,
    BlockHash,
    BlockNumber,
    Hash,
    Fee,
    TxSignHex,
    Status,
    Timestamp,
}

#[derive(Iden)]
enum ChildTxs {
    Table,
    Guid,
    Hash,
    TxId,
    TxIndex,
    TxType,
    FromAddress,
    ToAddress,
    Amount,
    Timestamp,
}
