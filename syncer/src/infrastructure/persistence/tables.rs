use sea_orm::{ConnectionTrait, DbBackend, Statement};

use crate::infrastructure::persistence::error::DbError;

/// Template tables cloned for every registered tenant
pub const TEMPLATE_TABLES: [&str; 9] = [
    "address",
    "vins",
    "vouts",
    "balances",
    "deposits",
    "transactions",
    "withdraws",
    "internals",
    "child_txs",
];

/// A tenant id is spliced into table names, so it has to stay inside a
/// strict identifier alphabet.
pub fn valid_business_uid(uid: &str) -> bool {
    !uid.is_empty()
        && uid.len() <= 32
        && uid
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Physical table name for a tenant
pub fn tenant_table(base: &str, business_uid: &str) -> String {
    format!("{}_{}", base, business_uid)
}

/// Clone the template tables for a tenant. `LIKE ... INCLUDING ALL`
/// copies columns, defaults and indexes onto the new table.
pub async fn create_tables_from_template<C: ConnectionTrait>(
    conn: &C,
    business_uid: &str,
) -> Result<(), DbError> {
    if !valid_business_uid(business_uid) {
        return Err(DbError::QueryError(format!(
            "invalid business uid: {}",
            business_uid
        )));
    }

    for base in TEMPLATE_TABLES {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (LIKE {} INCLUDING ALL)",
            tenant_table(base, business_uid),
            base
        );
        conn.execute(Statement::from_string(DbBackend::Postgres, sql))
            .await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_identifier_uids() {
        assert!(valid_business_uid("T1"));
        assert!(valid_business_uid("tenant_42"));
    }

    #[test]
    fn rejects_injection_shaped_uids() {
        assert!(!valid_business_uid(""));
        assert!(!valid_business_uid("a; DROP TABLE blocks"));
        assert!(!valid_business_uid("a-b"));
        assert!(!valid_business_uid(&"x".repeat(33)));
    }

    #[test]
    fn tenant_table_joins_with_separator() {
        assert_eq!(tenant_table("vouts", "T1"), "vouts_T1");
    }
}
