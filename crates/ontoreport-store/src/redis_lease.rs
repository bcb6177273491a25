//! Redis-backed lease: `SET NX PX` to take it, compare-and-delete to release it
use crate::lease::LeaseBackend;
use ontoreport_core::ReportError;
use std::time::Duration;

const RELEASE_SCRIPT: &str = r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
    return redis.call("DEL", KEYS[1])
else
    return 0
end
"#;

pub struct RedisLease {
    client: redis::Client,
}

impl RedisLease {
    pub fn open(url: &str) -> Result<Self, ReportError> {
        let client = redis::Client::open(url).map_err(unavailable)?;
        Ok(Self { client })
    }

    fn connection(&self) -> Result<redis::Connection, ReportError> {
        self.client.get_connection().map_err(unavailable)
    }
}

impl LeaseBackend for RedisLease {
    fn try_acquire(&self, key: &str, token: &str, ttl: Duration) -> Result<bool, ReportError> {
        let mut conn = self.connection()?;
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(token)
            .arg("NX")
            .arg("PX")
            .arg(ttl.as_millis().max(1) as u64)
            .query(&mut conn)
            .map_err(unavailable)?;
        Ok(reply.is_some())
    }

    fn release(&self, key: &str, token: &str) -> Result<(), ReportError> {
        let mut conn = self.connection()?;
        let _: i64 = redis::Script::new(RELEASE_SCRIPT)
            .key(key)
            .arg(token)
            .invoke(&mut conn)
            .map_err(unavailable)?;
        Ok(())
    }
}

fn unavailable(err: redis::RedisError) -> ReportError {
    ReportError::LockUnavailable(err.to_string())
}
