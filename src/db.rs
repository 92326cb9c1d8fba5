use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteQueryResult},
};
use uuid::Uuid;

use crate::domain::{
    Account, AccountType, Category, Settings, Transaction, TransactionRecord, TransactionType, User,
};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS users (
        id BLOB PRIMARY KEY,
        email TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL,
        password_hash TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS accounts (
        id BLOB PRIMARY KEY,
        name TEXT NOT NULL,
        type TEXT NOT NULL,
        balance REAL NOT NULL DEFAULT 0,
        currency TEXT NOT NULL DEFAULT 'USD',
        description TEXT,
        sort_order REAL NOT NULL DEFAULT 0,
        deleted_at TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS categories (
        id BLOB PRIMARY KEY,
        name TEXT NOT NULL,
        type TEXT NOT NULL,
        color TEXT,
        icon TEXT,
        sort_order REAL NOT NULL DEFAULT 0,
        deleted_at TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );

    CREATE UNIQUE INDEX IF NOT EXISTS idx_categories_name_type_active
        ON categories (name, type) WHERE deleted_at IS NULL;

    CREATE TABLE IF NOT EXISTS transactions (
        id BLOB PRIMARY KEY,
        account_id BLOB NOT NULL REFERENCES accounts (id),
        category_id BLOB REFERENCES categories (id),
        type TEXT NOT NULL,
        amount REAL NOT NULL,
        description TEXT,
        date TEXT NOT NULL,
        is_reconciled INTEGER NOT NULL DEFAULT 0,
        sort_order REAL NOT NULL DEFAULT 0,
        deleted_at TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions (date);

    CREATE TABLE IF NOT EXISTS settings (
        id TEXT PRIMARY KEY,
        currency TEXT NOT NULL,
        ai_provider TEXT NOT NULL,
        ai_model TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
";

pub async fn create_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    SqlitePoolOptions::new().connect_with(options).await
}

pub async fn init_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA).execute(pool).await?;
    Ok(())
}

pub async fn list_accounts(pool: &SqlitePool) -> Result<Vec<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>(
        "
            SELECT * FROM accounts
            WHERE deleted_at IS NULL
            ORDER BY sort_order
        ",
    )
    .fetch_all(pool)
    .await
}

pub async fn get_account(
    pool: &SqlitePool,
    account_id: Uuid,
) -> Result<Option<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>(
        "
            SELECT * FROM accounts
            WHERE id = ?1 AND deleted_at IS NULL
        ",
    )
    .bind(account_id)
    .fetch_optional(pool)
    .await
}

pub async fn insert_account(
    pool: &SqlitePool,
    account: &Account,
) -> Result<SqliteQueryResult, sqlx::Error> {
    sqlx::query(
        "
            INSERT INTO accounts (
                id,
                name,
                type,
                balance,
                currency,
                description,
                sort_order,
                deleted_at,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        ",
    )
    .bind(account.id)
    .bind(&account.name)
    .bind(account.kind)
    .bind(account.balance)
    .bind(&account.currency)
    .bind(&account.description)
    .bind(account.sort_order)
    .bind(account.deleted_at)
    .bind(account.created_at)
    .bind(account.updated_at)
    .execute(pool)
    .await
}

pub async fn update_account(
    pool: &SqlitePool,
    account: &Account,
) -> Result<SqliteQueryResult, sqlx::Error> {
    sqlx::query(
        "
            UPDATE accounts SET
                name = ?2,
                type = ?3,
                balance = ?4,
                currency = ?5,
                description = ?6,
                sort_order = ?7,
                updated_at = ?8
            WHERE id = ?1
        ",
    )
    .bind(account.id)
    .bind(&account.name)
    .bind(account.kind)
    .bind(account.balance)
    .bind(&account.currency)
    .bind(&account.description)
    .bind(account.sort_order)
    .bind(account.updated_at)
    .execute(pool)
    .await
}

pub async fn soft_delete_account(
    pool: &SqlitePool,
    account_id: Uuid,
    deleted_at: DateTime<Utc>,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "
            UPDATE accounts SET deleted_at = ?2, updated_at = ?2
            WHERE id = ?1 AND deleted_at IS NULL
        ",
    )
    .bind(account_id)
    .bind(deleted_at)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

pub async fn list_categories(pool: &SqlitePool) -> Result<Vec<Category>, sqlx::Error> {
    sqlx::query_as::<_, Category>(
        "
            SELECT * FROM categories
            WHERE deleted_at IS NULL
            ORDER BY sort_order
        ",
    )
    .fetch_all(pool)
    .await
}

pub async fn get_category(
    pool: &SqlitePool,
    category_id: Uuid,
) -> Result<Option<Category>, sqlx::Error> {
    sqlx::query_as::<_, Category>(
        "
            SELECT * FROM categories
            WHERE id = ?1 AND deleted_at IS NULL
        ",
    )
    .bind(category_id)
    .fetch_optional(pool)
    .await
}

pub async fn insert_category(
    pool: &SqlitePool,
    category: &Category,
) -> Result<SqliteQueryResult, sqlx::Error> {
    sqlx::query(
        "
            INSERT INTO categories (
                id,
                name,
                type,
                color,
                icon,
                sort_order,
                deleted_at,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        ",
    )
    .bind(category.id)
    .bind(&category.name)
    .bind(category.kind)
    .bind(&category.color)
    .bind(&category.icon)
    .bind(category.sort_order)
    .bind(category.deleted_at)
    .bind(category.created_at)
    .bind(category.updated_at)
    .execute(pool)
    .await
}

pub async fn update_category(
    pool: &SqlitePool,
    category: &Category,
) -> Result<SqliteQueryResult, sqlx::Error> {
    sqlx::query(
        "
            UPDATE categories SET
                name = ?2,
                type = ?3,
                color = ?4,
                icon = ?5,
                sort_order = ?6,
                updated_at = ?7
            WHERE id = ?1
        ",
    )
    .bind(category.id)
    .bind(&category.name)
    .bind(category.kind)
    .bind(&category.color)
    .bind(&category.icon)
    .bind(category.sort_order)
    .bind(category.updated_at)
    .execute(pool)
    .await
}

pub async fn soft_delete_category(
    pool: &SqlitePool,
    category_id: Uuid,
    deleted_at: DateTime<Utc>,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "
            UPDATE categories SET deleted_at = ?2, updated_at = ?2
            WHERE id = ?1 AND deleted_at IS NULL
        ",
    )
    .bind(category_id)
    .bind(deleted_at)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

// Flat projection of the transaction join. Account columns are non-null
// because account_id is a required reference; category columns are null
// whenever category_id is.
#[derive(sqlx::FromRow)]
struct TransactionJoinRow {
    id: Uuid,
    account_id: Uuid,
    category_id: Option<Uuid>,
    #[sqlx(rename = "type")]
    kind: TransactionType,
    amount: f64,
    description: Option<String>,
    date: DateTime<Utc>,
    is_reconciled: bool,
    sort_order: f64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    account_name: String,
    account_type: AccountType,
    account_balance: f64,
    account_currency: String,
    account_description: Option<String>,
    account_sort_order: f64,
    account_deleted_at: Option<DateTime<Utc>>,
    account_created_at: DateTime<Utc>,
    account_updated_at: DateTime<Utc>,
    category_name: Option<String>,
    category_type: Option<TransactionType>,
    category_color: Option<String>,
    category_icon: Option<String>,
    category_sort_order: Option<f64>,
    category_deleted_at: Option<DateTime<Utc>>,
    category_created_at: Option<DateTime<Utc>>,
    category_updated_at: Option<DateTime<Utc>>,
}

impl From<TransactionJoinRow> for TransactionRecord {
    fn from(row: TransactionJoinRow) -> Self {
        let account = Account {
            id: row.account_id,
            name: row.account_name,
            kind: row.account_type,
            balance: row.account_balance,
            currency: row.account_currency,
            description: row.account_description,
            sort_order: row.account_sort_order,
            deleted_at: row.account_deleted_at,
            created_at: row.account_created_at,
            updated_at: row.account_updated_at,
        };

        let category = match (
            row.category_id,
            row.category_name,
            row.category_type,
            row.category_created_at,
            row.category_updated_at,
        ) {
            (Some(id), Some(name), Some(kind), Some(created_at), Some(updated_at)) => {
                Some(Category {
                    id,
                    name,
                    kind,
                    color: row.category_color,
                    icon: row.category_icon,
                    sort_order: row.category_sort_order.unwrap_or(0.0),
                    deleted_at: row.category_deleted_at,
                    created_at,
                    updated_at,
                })
            }
            _ => None,
        };

        TransactionRecord {
            id: row.id,
            account_id: row.account_id,
            category_id: row.category_id,
            kind: row.kind,
            amount: row.amount,
            description: row.description,
            date: row.date,
            is_reconciled: row.is_reconciled,
            sort_order: row.sort_order,
            created_at: row.created_at,
            updated_at: row.updated_at,
            account,
            category,
        }
    }
}

// Single join-query shape for every transaction read. The joined tables are
// not filtered on deleted_at, so historical rows keep resolving after their
// account or category has been soft-deleted.
const TRANSACTION_JOIN: &str = "
    SELECT
        t.id,
        t.account_id,
        t.category_id,
        t.type,
        t.amount,
        t.description,
        t.date,
        t.is_reconciled,
        t.sort_order,
        t.created_at,
        t.updated_at,
        a.name AS account_name,
        a.type AS account_type,
        a.balance AS account_balance,
        a.currency AS account_currency,
        a.description AS account_description,
        a.sort_order AS account_sort_order,
        a.deleted_at AS account_deleted_at,
        a.created_at AS account_created_at,
        a.updated_at AS account_updated_at,
        c.name AS category_name,
        c.type AS category_type,
        c.color AS category_color,
        c.icon AS category_icon,
        c.sort_order AS category_sort_order,
        c.deleted_at AS category_deleted_at,
        c.created_at AS category_created_at,
        c.updated_at AS category_updated_at
    FROM transactions t
    JOIN accounts a ON a.id = t.account_id
    LEFT JOIN categories c ON c.id = t.category_id
    WHERE t.deleted_at IS NULL
";

pub async fn list_transactions(pool: &SqlitePool) -> Result<Vec<TransactionRecord>, sqlx::Error> {
    let rows =
        sqlx::query_as::<_, TransactionJoinRow>(&format!("{} ORDER BY t.date DESC", TRANSACTION_JOIN))
            .fetch_all(pool)
            .await?;

    Ok(rows.into_iter().map(TransactionRecord::from).collect())
}

pub async fn get_transaction(
    pool: &SqlitePool,
    transaction_id: Uuid,
) -> Result<Option<TransactionRecord>, sqlx::Error> {
    let row = sqlx::query_as::<_, TransactionJoinRow>(&format!("{} AND t.id = ?1", TRANSACTION_JOIN))
        .bind(transaction_id)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(TransactionRecord::from))
}

pub async fn get_transaction_row(
    pool: &SqlitePool,
    transaction_id: Uuid,
) -> Result<Option<Transaction>, sqlx::Error> {
    sqlx::query_as::<_, Transaction>(
        "
            SELECT * FROM transactions
            WHERE id = ?1 AND deleted_at IS NULL
        ",
    )
    .bind(transaction_id)
    .fetch_optional(pool)
    .await
}

pub async fn insert_transaction(
    pool: &SqlitePool,
    transaction: &Transaction,
) -> Result<SqliteQueryResult, sqlx::Error> {
    sqlx::query(
        "
            INSERT INTO transactions (
                id,
                account_id,
                category_id,
                type,
                amount,
                description,
                date,
                is_reconciled,
                sort_order,
                deleted_at,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        ",
    )
    .bind(transaction.id)
    .bind(transaction.account_id)
    .bind(transaction.category_id)
    .bind(transaction.kind)
    .bind(transaction.amount)
    .bind(&transaction.description)
    .bind(transaction.date)
    .bind(transaction.is_reconciled)
    .bind(transaction.sort_order)
    .bind(transaction.deleted_at)
    .bind(transaction.created_at)
    .bind(transaction.updated_at)
    .execute(pool)
    .await
}

pub async fn update_transaction(
    pool: &SqlitePool,
    transaction: &Transaction,
) -> Result<SqliteQueryResult, sqlx::Error> {
    sqlx::query(
        "
            UPDATE transactions SET
                account_id = ?2,
                category_id = ?3,
                type = ?4,
                amount = ?5,
                description = ?6,
                date = ?7,
                is_reconciled = ?8,
                sort_order = ?9,
                updated_at = ?10
            WHERE id = ?1
        ",
    )
    .bind(transaction.id)
    .bind(transaction.account_id)
    .bind(transaction.category_id)
    .bind(transaction.kind)
    .bind(transaction.amount)
    .bind(&transaction.description)
    .bind(transaction.date)
    .bind(transaction.is_reconciled)
    .bind(transaction.sort_order)
    .bind(transaction.updated_at)
    .execute(pool)
    .await
}

pub async fn soft_delete_transaction(
    pool: &SqlitePool,
    transaction_id: Uuid,
    deleted_at: DateTime<Utc>,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "
            UPDATE transactions SET deleted_at = ?2, updated_at = ?2
            WHERE id = ?1 AND deleted_at IS NULL
        ",
    )
    .bind(transaction_id)
    .bind(deleted_at)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

pub async fn list_users(pool: &SqlitePool) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "
            SELECT * FROM users
            ORDER BY created_at
        ",
    )
    .fetch_all(pool)
    .await
}

pub async fn get_user(pool: &SqlitePool, user_id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "
            SELECT * FROM users
            WHERE id = ?1
        ",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub async fn get_user_by_email(
    pool: &SqlitePool,
    email: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "
            SELECT * FROM users
            WHERE email = ?1
        ",
    )
    .bind(email)
    .fetch_optional(pool)
    .await
}

pub async fn insert_user(pool: &SqlitePool, user: &User) -> Result<SqliteQueryResult, sqlx::Error> {
    sqlx::query(
        "
            INSERT INTO users (
                id,
                email,
                name,
                password_hash,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        ",
    )
    .bind(user.id)
    .bind(&user.email)
    .bind(&user.name)
    .bind(&user.password_hash)
    .bind(user.created_at)
    .bind(user.updated_at)
    .execute(pool)
    .await
}

pub async fn update_user(pool: &SqlitePool, user: &User) -> Result<SqliteQueryResult, sqlx::Error> {
    sqlx::query(
        "
            UPDATE users SET
                email = ?2,
                name = ?3,
                updated_at = ?4
            WHERE id = ?1
        ",
    )
    .bind(user.id)
    .bind(&user.email)
    .bind(&user.name)
    .bind(user.updated_at)
    .execute(pool)
    .await
}

pub async fn delete_user(pool: &SqlitePool, user_id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "
            DELETE FROM users
            WHERE id = ?1
        ",
    )
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Idempotent read of the settings singleton. The primary key on the fixed
/// id guards the insert, so concurrent first reads converge on one row.
pub async fn get_or_create_settings(
    pool: &SqlitePool,
    defaults: &Settings,
) -> Result<Settings, sqlx::Error> {
    sqlx::query(
        "
            INSERT INTO settings (
                id,
                currency,
                ai_provider,
                ai_model,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT (id) DO NOTHING
        ",
    )
    .bind(&defaults.id)
    .bind(&defaults.currency)
    .bind(defaults.ai_provider)
    .bind(&defaults.ai_model)
    .bind(defaults.created_at)
    .bind(defaults.updated_at)
    .execute(pool)
    .await?;

    sqlx::query_as::<_, Settings>(
        "
            SELECT * FROM settings
            WHERE id = ?1
        ",
    )
    .bind(&defaults.id)
    .fetch_one(pool)
    .await
}

pub async fn update_settings(
    pool: &SqlitePool,
    settings: &Settings,
) -> Result<SqliteQueryResult, sqlx::Error> {
    sqlx::query(
        "
            UPDATE settings SET
                currency = ?2,
                ai_provider = ?3,
                ai_model = ?4,
                updated_at = ?5
            WHERE id = ?1
        ",
    )
    .bind(&settings.id)
    .bind(&settings.currency)
    .bind(settings.ai_provider)
    .bind(&settings.ai_model)
    .bind(settings.updated_at)
    .execute(pool)
    .await
}
