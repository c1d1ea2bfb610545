//! Database layer — migrations, queries, projections and cursor management.

use std::str::FromStr;

use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqliteConnection, SqlitePool,
};
use tracing::{debug, info};

use crate::errors::Result;
use crate::events::{EventKind, EventRecord, HistoryRow, ProductRow, RegistryEvent, RoleRow};

/// Establish a SQLite connection pool and run pending migrations.
pub async fn init_pool(database_url: &str) -> Result<SqlitePool> {
    let url = if database_url.starts_with("sqlite:") {
        database_url.to_string()
    } else {
        format!("sqlite:{database_url}")
    };

    let options = SqliteConnectOptions::from_str(&url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("Database migrations applied successfully");
    Ok(())
}

// ─────────────────────────────────────────────────────────
// Cursor helpers
// ─────────────────────────────────────────────────────────

/// Read the last-seen ledger from the cursor row.
/// Returns `0` when no cursor has been persisted yet.
pub async fn get_last_ledger(pool: &SqlitePool) -> Result<i64> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT last_ledger FROM indexer_cursor WHERE id = 1")
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|(v,)| v).unwrap_or(0))
}

/// Persist the last-seen ledger (and optionally a pagination cursor string).
pub async fn save_cursor(
    pool: &SqlitePool,
    last_ledger: i64,
    last_cursor: Option<&str>,
) -> Result<()> {
    sqlx::query("UPDATE indexer_cursor SET last_ledger = ?1, last_cursor = ?2 WHERE id = 1")
        .bind(last_ledger)
        .bind(last_cursor)
        .execute(pool)
        .await?;
    Ok(())
}

/// Read back the raw cursor string (used to resume pagination mid-ledger).
pub async fn get_cursor_string(pool: &SqlitePool) -> Result<Option<String>> {
    let row: Option<(Option<String>,)> =
        sqlx::query_as("SELECT last_cursor FROM indexer_cursor WHERE id = 1")
            .fetch_optional(pool)
            .await?;
    Ok(row.and_then(|(v,)| v))
}

// ─────────────────────────────────────────────────────────
// Event writes
// ─────────────────────────────────────────────────────────

/// Persist a batch of decoded events and fold them into the product and
/// role projections, all inside one transaction.
///
/// Events whose RPC id is already stored are ignored and do not touch the
/// projections again, so re-indexing a batch is a no-op. Returns the number
/// of newly stored events.
pub async fn insert_events(pool: &SqlitePool, events: &[RegistryEvent]) -> Result<usize> {
    let mut tx = pool.begin().await?;
    let mut count = 0usize;

    for ev in events {
        let rows_affected = sqlx::query(
            r#"
            INSERT OR IGNORE INTO events
                (event_id, event_type, product_id, actor, target, name, status, location,
                 role, ledger, timestamp, contract_id, tx_hash)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&ev.event_id)
        .bind(&ev.event_type)
        .bind(ev.product_id)
        .bind(&ev.actor)
        .bind(&ev.target)
        .bind(&ev.name)
        .bind(&ev.status)
        .bind(&ev.location)
        .bind(&ev.role)
        .bind(ev.ledger)
        .bind(ev.timestamp)
        .bind(&ev.contract_id)
        .bind(&ev.tx_hash)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if rows_affected == 0 {
            debug!("Skipping already indexed event {}", ev.event_id);
            continue;
        }
        count += rows_affected as usize;
        apply_projection(&mut *tx, ev).await?;
    }

    tx.commit().await?;
    Ok(count)
}

async fn apply_projection(conn: &mut SqliteConnection, ev: &RegistryEvent) -> Result<()> {
    match ev.kind() {
        EventKind::ProductAdded => {
            let Some(product_id) = ev.product_id else {
                return Ok(());
            };
            sqlx::query(
                r#"
                INSERT OR IGNORE INTO products
                    (id, name, location, status, added_by, created_ledger, updated_ledger)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
                "#,
            )
            .bind(product_id)
            .bind(ev.name.as_deref().unwrap_or_default())
            .bind(&ev.location)
            .bind(&ev.status)
            .bind(&ev.actor)
            .bind(ev.ledger)
            .execute(&mut *conn)
            .await?;

            append_history(conn, product_id, ev).await?;
        }
        EventKind::ProductUpdated => {
            let Some(product_id) = ev.product_id else {
                return Ok(());
            };
            sqlx::query(
                r#"
                UPDATE products
                SET    status = ?2, location = ?3, updated_ledger = ?4
                WHERE  id = ?1
                "#,
            )
            .bind(product_id)
            .bind(&ev.status)
            .bind(&ev.location)
            .bind(ev.ledger)
            .execute(&mut *conn)
            .await?;

            append_history(conn, product_id, ev).await?;
        }
        EventKind::RoleAssigned => {
            let (Some(address), Some(role)) = (&ev.target, &ev.role) else {
                return Ok(());
            };
            sqlx::query(
                r#"
                INSERT INTO roles (address, role, assigned_by, ledger)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(address) DO UPDATE
                SET role = excluded.role,
                    assigned_by = excluded.assigned_by,
                    ledger = excluded.ledger
                "#,
            )
            .bind(address)
            .bind(role)
            .bind(&ev.actor)
            .bind(ev.ledger)
            .execute(&mut *conn)
            .await?;
        }
        EventKind::Unknown => {}
    }
    Ok(())
}

/// Both `added` and `updated` write a history row, like the contract does.
async fn append_history(
    conn: &mut SqliteConnection,
    product_id: i64,
    ev: &RegistryEvent,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO product_history
            (product_id, status, location, ledger, timestamp, tx_hash)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(product_id)
    .bind(&ev.status)
    .bind(&ev.location)
    .bind(ev.ledger)
    .bind(ev.timestamp)
    .bind(&ev.tx_hash)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

// ─────────────────────────────────────────────────────────
// Event reads
// ─────────────────────────────────────────────────────────

const EVENT_COLUMNS: &str = "id, event_id, event_type, product_id, actor, target, name, status, location, \
     role, ledger, timestamp, contract_id, tx_hash, created_at";

/// Fetch all events for a given product, ordered by ledger ascending.
pub async fn get_events_for_product(pool: &SqlitePool, product_id: i64) -> Result<Vec<EventRecord>> {
    let sql = format!(
        "SELECT {EVENT_COLUMNS} FROM events WHERE product_id = ?1 ORDER BY ledger ASC, id ASC"
    );
    let rows = sqlx::query_as::<_, EventRecord>(&sql)
        .bind(product_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Fetch all events, ordered by ledger ascending.
pub async fn get_all_events(pool: &SqlitePool) -> Result<Vec<EventRecord>> {
    let sql = format!("SELECT {EVENT_COLUMNS} FROM events ORDER BY ledger ASC, id ASC");
    let rows = sqlx::query_as::<_, EventRecord>(&sql)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

// ─────────────────────────────────────────────────────────
// Projection reads
// ─────────────────────────────────────────────────────────

pub async fn get_products(pool: &SqlitePool) -> Result<Vec<ProductRow>> {
    let rows = sqlx::query_as::<_, ProductRow>(
        r#"
        SELECT id, name, location, status, added_by, created_ledger, updated_ledger
        FROM   products
        ORDER  BY id ASC
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get_product(pool: &SqlitePool, id: i64) -> Result<Option<ProductRow>> {
    let row = sqlx::query_as::<_, ProductRow>(
        r#"
        SELECT id, name, location, status, added_by, created_ledger, updated_ledger
        FROM   products
        WHERE  id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Status changes of a product, oldest first.
pub async fn get_product_history(pool: &SqlitePool, id: i64) -> Result<Vec<HistoryRow>> {
    let rows = sqlx::query_as::<_, HistoryRow>(
        r#"
        SELECT product_id, status, location, ledger, timestamp, tx_hash
        FROM   product_history
        WHERE  product_id = ?1
        ORDER  BY ledger ASC, id ASC
        "#,
    )
    .bind(id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get_role(pool: &SqlitePool, address: &str) -> Result<Option<RoleRow>> {
    let row = sqlx::query_as::<_, RoleRow>(
        "SELECT address, role, assigned_by, ledger FROM roles WHERE address = ?1",
    )
    .bind(address)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// In-memory database; a single connection so every query sees the same file.
    pub(crate) async fn memory_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        run_migrations(&pool).await.unwrap();
        pool
    }

    /// Events get the RPC id format `<toid>-<index>`; `index` separates
    /// several events of one transaction.
    fn event(kind: EventKind, ledger: i64, index: u32) -> RegistryEvent {
        RegistryEvent {
            event_id: format!("{:019}-{index:010}", ledger << 32),
            event_type: kind.as_str().to_string(),
            product_id: None,
            actor: None,
            target: None,
            name: None,
            status: None,
            location: None,
            role: None,
            ledger,
            timestamp: ledger * 5,
            contract_id: "CONTRACT1".to_string(),
            tx_hash: Some(format!("TX{ledger}")),
        }
    }

    pub(crate) fn added(id: i64, name: &str, by: &str, ledger: i64) -> RegistryEvent {
        RegistryEvent {
            product_id: Some(id),
            name: Some(name.to_string()),
            actor: Some(by.to_string()),
            status: Some("In Stock".to_string()),
            location: Some("Warehouse A".to_string()),
            ..event(EventKind::ProductAdded, ledger, 0)
        }
    }

    pub(crate) fn updated(id: i64, status: &str, location: &str, ledger: i64) -> RegistryEvent {
        updated_at(id, status, location, ledger, 0)
    }

    fn updated_at(id: i64, status: &str, location: &str, ledger: i64, index: u32) -> RegistryEvent {
        RegistryEvent {
            product_id: Some(id),
            status: Some(status.to_string()),
            location: Some(location.to_string()),
            ..event(EventKind::ProductUpdated, ledger, index)
        }
    }

    pub(crate) fn role_set(target: &str, role: &str, by: &str, ledger: i64) -> RegistryEvent {
        RegistryEvent {
            target: Some(target.to_string()),
            role: Some(role.to_string()),
            actor: Some(by.to_string()),
            ..event(EventKind::RoleAssigned, ledger, 0)
        }
    }

    #[tokio::test]
    async fn cursor_starts_at_zero_and_persists() {
        let pool = memory_pool().await;
        assert_eq!(get_last_ledger(&pool).await.unwrap(), 0);
        assert_eq!(get_cursor_string(&pool).await.unwrap(), None);

        save_cursor(&pool, 1234, Some("cursor-abc")).await.unwrap();
        assert_eq!(get_last_ledger(&pool).await.unwrap(), 1234);
        assert_eq!(
            get_cursor_string(&pool).await.unwrap().as_deref(),
            Some("cursor-abc")
        );
    }

    #[tokio::test]
    async fn added_event_alone_projects_initial_state() {
        let pool = memory_pool().await;
        insert_events(&pool, &[added(1, "Test Product", "GOPERATOR", 10)])
            .await
            .unwrap();

        let product = get_product(&pool, 1).await.unwrap().expect("product 1");
        assert_eq!(product.name, "Test Product");
        assert_eq!(product.status.as_deref(), Some("In Stock"));
        assert_eq!(product.location.as_deref(), Some("Warehouse A"));
        assert_eq!(product.created_ledger, 10);
        assert_eq!(product.updated_ledger, 10);

        let history = get_product_history(&pool, 1).await.unwrap();
        assert_eq!(
            history,
            vec![HistoryRow {
                product_id: 1,
                status: Some("In Stock".to_string()),
                location: Some("Warehouse A".to_string()),
                ledger: 10,
                timestamp: 50,
                tx_hash: Some("TX10".to_string()),
            }]
        );
    }

    #[tokio::test]
    async fn projection_follows_add_and_update() {
        let pool = memory_pool().await;
        let batch = vec![
            added(1, "Test Product", "GOPERATOR", 10),
            updated(1, "Shipped", "In Transit", 11),
        ];
        assert_eq!(insert_events(&pool, &batch).await.unwrap(), 2);

        let product = get_product(&pool, 1).await.unwrap().expect("product 1");
        assert_eq!(product.name, "Test Product");
        assert_eq!(product.added_by.as_deref(), Some("GOPERATOR"));
        assert_eq!(product.status.as_deref(), Some("Shipped"));
        assert_eq!(product.location.as_deref(), Some("In Transit"));
        assert_eq!(product.created_ledger, 10);
        assert_eq!(product.updated_ledger, 11);

        let history = get_product_history(&pool, 1).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].status.as_deref(), Some("In Stock"));
        assert_eq!(history[1].status.as_deref(), Some("Shipped"));
        assert_eq!(history[1].timestamp, 55);

        assert_eq!(get_events_for_product(&pool, 1).await.unwrap().len(), 2);
        assert!(get_product(&pool, 2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn reinserting_a_batch_is_a_noop() {
        let pool = memory_pool().await;
        let batch = vec![
            added(1, "Test Product", "GOPERATOR", 10),
            updated(1, "Shipped", "In Transit", 11),
        ];
        insert_events(&pool, &batch).await.unwrap();
        assert_eq!(insert_events(&pool, &batch).await.unwrap(), 0);

        assert_eq!(get_all_events(&pool).await.unwrap().len(), 2);
        assert_eq!(get_product_history(&pool, 1).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn two_updates_in_one_transaction_are_both_kept() {
        let pool = memory_pool().await;
        let batch = vec![
            added(1, "Test Product", "GOPERATOR", 10),
            updated_at(1, "Packed", "Dock 3", 12, 0),
            updated_at(1, "Shipped", "In Transit", 12, 1),
        ];
        assert_eq!(insert_events(&pool, &batch).await.unwrap(), 3);

        let product = get_product(&pool, 1).await.unwrap().expect("product 1");
        assert_eq!(product.status.as_deref(), Some("Shipped"));
        assert_eq!(product.location.as_deref(), Some("In Transit"));

        let statuses: Vec<_> = get_product_history(&pool, 1)
            .await
            .unwrap()
            .into_iter()
            .filter_map(|h| h.status)
            .collect();
        assert_eq!(statuses, vec!["In Stock", "Packed", "Shipped"]);

        let events = get_all_events(&pool).await.unwrap();
        assert_eq!(events[1].tx_hash, events[2].tx_hash);
        assert_ne!(events[1].event_id, events[2].event_id);
    }

    #[tokio::test]
    async fn role_projection_keeps_latest_assignment() {
        let pool = memory_pool().await;
        let batch = vec![
            role_set("GUSER", "OPERATOR", "GOWNER", 5),
            role_set("GUSER", "VIEWER", "GMANAGER", 6),
        ];
        insert_events(&pool, &batch).await.unwrap();

        let role = get_role(&pool, "GUSER").await.unwrap().expect("role row");
        assert_eq!(role.role, "VIEWER");
        assert_eq!(role.assigned_by.as_deref(), Some("GMANAGER"));
        assert_eq!(role.ledger, 6);
        assert!(get_role(&pool, "GNOBODY").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn products_are_listed_in_id_order() {
        let pool = memory_pool().await;
        let batch = vec![
            added(2, "Product 2", "GOP", 3),
            added(1, "Product 1", "GOP", 2),
            added(3, "Product 3", "GOP", 4),
        ];
        insert_events(&pool, &batch).await.unwrap();

        let ids: Vec<i64> = get_products(&pool)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
