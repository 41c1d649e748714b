//! Problem detail view cache
//!
//! Entries are keyed per (problem, user) because the view embeds the user's
//! submission history. Every entry key is also recorded in a per-problem tag
//! set so a submit can drop all views of that problem at once.
//!
//! Entry keys also carry the problem's version, which every invalidation
//! bumps. A reader takes the version before loading from the database, so a
//! view built from rows read before a submit lands under a version nobody
//! reads again.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, RedisError};
use uuid::Uuid;

pub fn detail_key(problem_id: Uuid, user_id: Uuid, version: u64) -> String {
    format!("problem:detail:{}:{}:v{}", problem_id, user_id, version)
}

pub fn version_key(problem_id: Uuid) -> String {
    format!("problem:version:{}", problem_id)
}

pub fn tag_key(problem_id: Uuid) -> String {
    format!("problem:tag:{}", problem_id)
}

/// Cache of serialized problem detail views
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProblemCache: Send + Sync {
    /// Current version of the problem's views, 0 before any invalidation
    async fn version(&self, problem_id: Uuid) -> Result<u64, RedisError>;

    async fn get_detail(
        &self,
        problem_id: Uuid,
        user_id: Uuid,
        version: u64,
    ) -> Result<Option<String>, RedisError>;

    async fn put_detail(
        &self,
        problem_id: Uuid,
        user_id: Uuid,
        version: u64,
        payload: String,
        ttl_secs: u64,
    ) -> Result<(), RedisError>;

    /// Bump the problem's version and drop every cached view tagged with it
    async fn invalidate_problem(&self, problem_id: Uuid) -> Result<(), RedisError>;
}

pub struct RedisProblemCache {
    redis: ConnectionManager,
}

impl RedisProblemCache {
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }
}

#[async_trait]
impl ProblemCache for RedisProblemCache {
    async fn version(&self, problem_id: Uuid) -> Result<u64, RedisError> {
        let mut redis = self.redis.clone();
        let version: Option<u64> = redis.get(version_key(problem_id)).await?;
        Ok(version.unwrap_or(0))
    }

    async fn get_detail(
        &self,
        problem_id: Uuid,
        user_id: Uuid,
        version: u64,
    ) -> Result<Option<String>, RedisError> {
        let mut redis = self.redis.clone();
        redis.get(detail_key(problem_id, user_id, version)).await
    }

    async fn put_detail(
        &self,
        problem_id: Uuid,
        user_id: Uuid,
        version: u64,
        payload: String,
        ttl_secs: u64,
    ) -> Result<(), RedisError> {
        let mut redis = self.redis.clone();
        let key = detail_key(problem_id, user_id, version);
        let tag = tag_key(problem_id);

        let _: () = redis::pipe()
            .atomic()
            .set_ex(&key, payload, ttl_secs)
            .ignore()
            .sadd(&tag, &key)
            .ignore()
            .expire(&tag, ttl_secs as i64)
            .ignore()
            .query_async(&mut redis)
            .await?;

        Ok(())
    }

    async fn invalidate_problem(&self, problem_id: Uuid) -> Result<(), RedisError> {
        let mut redis = self.redis.clone();
        let tag = tag_key(problem_id);

        let (version, keys): (u64, Vec<String>) = redis::pipe()
            .atomic()
            .incr(version_key(problem_id), 1)
            .smembers(&tag)
            .query_async(&mut redis)
            .await?;

        let mut pipe = redis::pipe();
        pipe.atomic();
        for key in &keys {
            pipe.del(key).ignore();
        }
        pipe.del(&tag).ignore();
        let _: () = pipe.query_async(&mut redis).await?;

        tracing::debug!(
            problem_id = %problem_id,
            version,
            entries = keys.len(),
            "Problem cache invalidated"
        );
        Ok(())
    }
}
