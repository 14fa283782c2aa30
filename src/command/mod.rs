//! Command handlers of the in-memory engine.
//!
//! Every handler runs synchronously against a locked [`Database`] and answers
//! with the reply a Redis server would send, error replies included.

pub mod hash;
pub mod key;
pub mod list;
pub mod set;
pub mod sorted_set;
pub mod string;

use crate::cmd::parse_score;
use crate::resp::RespValue;
use crate::store::Database;

/// Dispatch one command by its upper-cased name.
///
/// Blocking pops are answered in their non-blocking form here (nil when
/// nothing can be popped), which is also how they behave inside a batch.
pub fn dispatch(cmd_name: &str, args: &[RespValue], db: &mut Database) -> RespValue {
    match cmd_name {
        // Connection / database
        "PING" => key::cmd_ping(args),
        "SELECT" => key::cmd_select(args),
        "DBSIZE" => key::cmd_dbsize(db),
        "FLUSHDB" => key::cmd_flushdb(db),

        // Keys
        "DEL" => key::cmd_del(args, db),
        "EXISTS" => key::cmd_exists(args, db),
        "TYPE" => key::cmd_type(args, db),
        "RENAME" => key::cmd_rename(args, db),
        "KEYS" => key::cmd_keys(args, db),

        // Strings
        "GET" => string::cmd_get(args, db),
        "SET" => string::cmd_set(args, db),
        "MGET" => string::cmd_mget(args, db),
        "MSET" => string::cmd_mset(args, db),
        "INCR" => string::cmd_incr(args, db),
        "DECR" => string::cmd_decr(args, db),
        "INCRBY" => string::cmd_incrby(args, db),
        "DECRBY" => string::cmd_decrby(args, db),

        // Lists
        "LPUSH" => list::cmd_lpush(args, db),
        "RPUSH" => list::cmd_rpush(args, db),
        "LPOP" => list::cmd_lpop(args, db),
        "RPOP" => list::cmd_rpop(args, db),
        "LINDEX" => list::cmd_lindex(args, db),
        "LSET" => list::cmd_lset(args, db),
        "LLEN" => list::cmd_llen(args, db),
        "LTRIM" => list::cmd_ltrim(args, db),
        "LRANGE" => list::cmd_lrange(args, db),
        "LREM" => list::cmd_lrem(args, db),
        "BLPOP" => list::cmd_bpop_nowait(args, db, list::End::Left),
        "BRPOP" => list::cmd_bpop_nowait(args, db, list::End::Right),

        // Sets
        "SADD" => set::cmd_sadd(args, db),
        "SREM" => set::cmd_srem(args, db),
        "SPOP" => set::cmd_spop(args, db),
        "SMEMBERS" => set::cmd_smembers(args, db),
        "SISMEMBER" => set::cmd_sismember(args, db),
        "SCARD" => set::cmd_scard(args, db),
        "SUNION" => set::cmd_combine(args, db, set::SetOp::Union),
        "SINTER" => set::cmd_combine(args, db, set::SetOp::Inter),
        "SDIFF" => set::cmd_combine(args, db, set::SetOp::Diff),
        "SUNIONSTORE" => set::cmd_combine_store(args, db, set::SetOp::Union),
        "SINTERSTORE" => set::cmd_combine_store(args, db, set::SetOp::Inter),
        "SDIFFSTORE" => set::cmd_combine_store(args, db, set::SetOp::Diff),

        // Sorted sets
        "ZADD" => sorted_set::cmd_zadd(args, db),
        "ZREM" => sorted_set::cmd_zrem(args, db),
        "ZINCRBY" => sorted_set::cmd_zincrby(args, db),
        "ZRANGE" => sorted_set::cmd_zrange(args, db, false),
        "ZREVRANGE" => sorted_set::cmd_zrange(args, db, true),
        "ZRANK" => sorted_set::cmd_zrank(args, db, false),
        "ZREVRANK" => sorted_set::cmd_zrank(args, db, true),
        "ZSCORE" => sorted_set::cmd_zscore(args, db),
        "ZRANGEBYSCORE" => sorted_set::cmd_zrangebyscore(args, db),
        "ZCARD" => sorted_set::cmd_zcard(args, db),

        // Hashes
        "HSET" => hash::cmd_hset(args, db),
        "HMSET" => hash::cmd_hmset(args, db),
        "HGET" => hash::cmd_hget(args, db),
        "HDEL" => hash::cmd_hdel(args, db),
        "HEXISTS" => hash::cmd_hexists(args, db),
        "HKEYS" => hash::cmd_hkeys(args, db),
        "HVALS" => hash::cmd_hvals(args, db),
        "HGETALL" => hash::cmd_hgetall(args, db),
        "HLEN" => hash::cmd_hlen(args, db),

        _ => {
            let args_preview: Vec<String> = args
                .iter()
                .take(3)
                .filter_map(|a| a.to_string_lossy())
                .map(|s| format!("'{s}'"))
                .collect();
            RespValue::error(format!(
                "ERR unknown command '{}', with args beginning with: {}",
                cmd_name,
                args_preview.join(" ")
            ))
        }
    }
}

/// Commands the engine may have to park until data arrives.
pub fn is_blocking(cmd_name: &str) -> bool {
    matches!(cmd_name, "BLPOP" | "BRPOP")
}

/// Extract string bytes from a RespValue argument.
pub fn arg_to_bytes(arg: &RespValue) -> Option<&[u8]> {
    arg.as_str()
}

/// Extract a UTF-8 string from a RespValue argument.
pub fn arg_to_string(arg: &RespValue) -> Option<String> {
    arg.to_string_lossy()
}

/// Extract an i64 from a RespValue argument.
pub fn arg_to_i64(arg: &RespValue) -> Option<i64> {
    arg.to_string_lossy()?.parse().ok()
}

/// Extract a score from a RespValue argument; NaN is rejected.
pub fn arg_to_f64(arg: &RespValue) -> Option<f64> {
    parse_score(&arg.to_string_lossy()?).filter(|v| !v.is_nan())
}

/// The key argument at `idx`.
pub fn key_arg(args: &[RespValue], idx: usize) -> Result<String, RespValue> {
    args.get(idx)
        .and_then(arg_to_string)
        .ok_or_else(|| RespValue::error("ERR invalid key"))
}

/// Return a WRONGTYPE error.
pub fn wrong_type_error() -> RespValue {
    RespValue::error("WRONGTYPE Operation against a key holding the wrong kind of value")
}

/// Return a wrong number of arguments error.
pub fn wrong_arg_count(cmd: &str) -> RespValue {
    RespValue::error(format!("ERR wrong number of arguments for '{cmd}' command"))
}

pub fn not_an_integer() -> RespValue {
    RespValue::error("ERR value is not an integer or out of range")
}

/// Bulk-string array reply from raw byte slices.
pub fn bulk_array<'a>(items: impl IntoIterator<Item = &'a Vec<u8>>) -> RespValue {
    RespValue::array(items.into_iter().cloned().map(RespValue::bulk_string).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn run(db: &mut Database, parts: &[&str]) -> RespValue {
        let args: Vec<RespValue> = parts[1..].iter().map(|a| RespValue::bulk_string(*a)).collect();
        dispatch(&parts[0].to_ascii_uppercase(), &args, db)
    }

    #[test]
    fn test_unknown_command() {
        let mut db = Database::new();
        let reply = run(&mut db, &["NOPE", "a"]);
        assert_eq!(
            reply,
            RespValue::error("ERR unknown command 'NOPE', with args beginning with: 'a'")
        );
    }

    #[test]
    fn test_wrongtype_across_families() {
        let mut db = Database::new();
        run(&mut db, &["SET", "s", "1"]);
        assert_eq!(run(&mut db, &["LPUSH", "s", "x"]), wrong_type_error());
        assert_eq!(run(&mut db, &["SADD", "s", "x"]), wrong_type_error());
        assert_eq!(run(&mut db, &["HGET", "s", "f"]), wrong_type_error());
        assert_eq!(run(&mut db, &["ZCARD", "s"]), wrong_type_error());
    }

    #[test]
    fn test_arg_helpers() {
        assert_eq!(arg_to_i64(&RespValue::bulk_string("-12")), Some(-12));
        assert_eq!(arg_to_f64(&RespValue::bulk_string("-inf")), Some(f64::NEG_INFINITY));
        assert_eq!(arg_to_f64(&RespValue::bulk_string("nan")), None);
        assert!(key_arg(&[], 0).is_err());
    }
}
