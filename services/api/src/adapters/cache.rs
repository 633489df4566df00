//! services/api/src/adapters/cache.rs
//!
//! This module contains the cache adapter, the concrete implementation of
//! the `CounterStore` port backed by Redis. It carries the rate-limit
//! counters, the sound-design artist rotation sets, and prompt ratings.

use async_trait::async_trait;
use muse_core::ports::{CounterStore, PortError, PortResult};
use redis::{aio::ConnectionManager, AsyncCommands};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A cache adapter that implements the `CounterStore` port.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    /// Connects to Redis and wraps the connection in a multiplexed manager
    /// that reconnects on failure.
    pub async fn connect(url: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(url)?;
        let conn = client.get_connection_manager().await?;
        Ok(Self { conn })
    }
}

fn map_err(e: redis::RedisError) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// `CounterStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl CounterStore for RedisCache {
    async fn increment_with_expiry(&self, key: &str, window_secs: u64) -> PortResult<u64> {
        let mut conn = self.conn.clone();
        let count: u64 = conn.incr(key, 1).await.map_err(map_err)?;
        // Only the first increment of a window arms the expiry; the counter
        // then decays on its own schedule no matter how often it is hit.
        if count == 1 {
            let _: () = conn
                .expire(key, window_secs as i64)
                .await
                .map_err(map_err)?;
        }
        Ok(count)
    }

    async fn put_with_expiry(&self, key: &str, value: &str, ttl_secs: u64) -> PortResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.set_ex(key, value, ttl_secs).await.map_err(map_err)?;
        Ok(())
    }

    async fn set_members(&self, key: &str) -> PortResult<Vec<String>> {
        let mut conn = self.conn.clone();
        let members: Vec<String> = conn.smembers(key).await.map_err(map_err)?;
        Ok(members)
    }

    async fn set_add(&self, key: &str, member: &str) -> PortResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.sadd(key, member).await.map_err(map_err)?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> PortResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(key).await.map_err(map_err)?;
        Ok(())
    }

    async fn ping(&self) -> PortResult<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(map_err)?;
        Ok(())
    }
}
