// region:    --- Imports
use crate::config::Config;
use crate::error::{MarketError, Result};
use crate::query::queries;
use crate::store::{Store, UnitOfWork};
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::sync::Arc;
use tracing::info;

// endregion: --- Imports

mod unit_of_work;

pub use unit_of_work::PgUnitOfWork;

pub struct DatabaseManager {
    pub pool: Arc<PgPool>,
}

impl DatabaseManager {
    /// 데이터베이스 매니저 생성
    pub async fn new(config: &Config) -> Result<Self> {
        let database_url = config
            .database_url
            .as_deref()
            .ok_or_else(|| MarketError::Config("DATABASE_URL 이 설정되지 않았습니다.".to_string()))?;
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .connect(database_url)
            .await?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// 데이터베이스 풀 가져오기
    pub fn get_pool(&self) -> Arc<PgPool> {
        Arc::clone(&self.pool)
    }

    /// 데이터베이스 초기화
    /// reset 이면 전체를 지우고 다시 만들며, 아니면 스키마가 없을 때만 만든다.
    pub async fn initialize_database(&self, reset: bool) -> Result<()> {
        if reset {
            let recreate_db_sql = include_str!("../../sql/00-recreate-db.sql");
            self.execute_multi_query(recreate_db_sql).await?;
            info!("{:<12} --> 기존 스키마 삭제", "Database");
        }

        let (present,): (bool,) = sqlx::query_as(queries::SCHEMA_EXISTS)
            .fetch_one(&*self.pool)
            .await?;
        if present {
            info!("{:<12} --> 스키마가 이미 존재합니다.", "Database");
            return Ok(());
        }

        let create_schema_sql = include_str!("../../sql/01-create-schema.sql");
        self.execute_multi_query(create_schema_sql).await?;
        info!("{:<12} --> 스키마 생성 완료", "Database");
        Ok(())
    }

    /// 여러 쿼리 실행
    async fn execute_multi_query(&self, sql: &str) -> Result<(), sqlx::Error> {
        for query in sql.split(';') {
            let query = query.trim();
            if !query.is_empty() {
                sqlx::query(query).execute(&*self.pool).await?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Store for DatabaseManager {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgUnitOfWork::new(tx)))
    }
}
