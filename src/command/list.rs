use crate::command::{
    arg_to_bytes, arg_to_f64, arg_to_i64, arg_to_string, bulk_array, key_arg, not_an_integer,
    wrong_arg_count, wrong_type_error,
};
use crate::resp::RespValue;
use crate::store::Database;
use crate::types::RedisValue;
use crate::types::list::RedisList;
use std::time::Duration;

/// Which end of a list a push or pop works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum End {
    Left,
    Right,
}

/// Get the list at `key`, `Ok(None)` if the key is absent.
fn get_list<'a>(db: &'a Database, key: &str) -> Result<Option<&'a RedisList>, RespValue> {
    match db.get(key) {
        Some(RedisValue::List(list)) => Ok(Some(list)),
        Some(_) => Err(wrong_type_error()),
        None => Ok(None),
    }
}

fn get_list_mut<'a>(db: &'a mut Database, key: &str) -> Result<Option<&'a mut RedisList>, RespValue> {
    match db.get_mut(key) {
        Some(RedisValue::List(list)) => Ok(Some(list)),
        Some(_) => Err(wrong_type_error()),
        None => Ok(None),
    }
}

fn get_or_create_list<'a>(db: &'a mut Database, key: &str) -> Result<&'a mut RedisList, RespValue> {
    match db.get(key) {
        Some(RedisValue::List(_)) => {}
        Some(_) => return Err(wrong_type_error()),
        None => db.set(key.to_string(), RedisValue::List(RedisList::new())),
    }
    match db.get_mut(key) {
        Some(RedisValue::List(list)) => Ok(list),
        _ => Err(wrong_type_error()),
    }
}

pub fn cmd_lpush(args: &[RespValue], db: &mut Database) -> RespValue {
    push(args, db, End::Left, "lpush")
}

pub fn cmd_rpush(args: &[RespValue], db: &mut Database) -> RespValue {
    push(args, db, End::Right, "rpush")
}

fn push(args: &[RespValue], db: &mut Database, end: End, name: &str) -> RespValue {
    if args.len() < 2 {
        return wrong_arg_count(name);
    }
    let key = match key_arg(args, 0) {
        Ok(k) => k,
        Err(e) => return e,
    };
    let list = match get_or_create_list(db, &key) {
        Ok(l) => l,
        Err(e) => return e,
    };
    for arg in &args[1..] {
        let value = arg_to_bytes(arg).unwrap_or_default().to_vec();
        match end {
            End::Left => list.lpush(value),
            End::Right => list.rpush(value),
        }
    }
    let len = list.len() as i64;
    db.signal_ready(&key);
    RespValue::integer(len)
}

pub fn cmd_lpop(args: &[RespValue], db: &mut Database) -> RespValue {
    pop(args, db, End::Left, "lpop")
}

pub fn cmd_rpop(args: &[RespValue], db: &mut Database) -> RespValue {
    pop(args, db, End::Right, "rpop")
}

fn pop(args: &[RespValue], db: &mut Database, end: End, name: &str) -> RespValue {
    if args.len() != 1 {
        return wrong_arg_count(name);
    }
    let key = match key_arg(args, 0) {
        Ok(k) => k,
        Err(e) => return e,
    };
    match pop_one(db, &key, end) {
        Ok(Some(value)) => RespValue::bulk_string(value),
        Ok(None) => RespValue::null_bulk_string(),
        Err(e) => e,
    }
}

fn pop_one(db: &mut Database, key: &str, end: End) -> Result<Option<Vec<u8>>, RespValue> {
    let popped = match get_list_mut(db, key)? {
        Some(list) => match end {
            End::Left => list.lpop(),
            End::Right => list.rpop(),
        },
        None => None,
    };
    db.remove_if_empty(key);
    Ok(popped)
}

pub fn cmd_lindex(args: &[RespValue], db: &mut Database) -> RespValue {
    if args.len() != 2 {
        return wrong_arg_count("lindex");
    }
    let key = match key_arg(args, 0) {
        Ok(k) => k,
        Err(e) => return e,
    };
    let Some(index) = arg_to_i64(&args[1]) else {
        return not_an_integer();
    };
    match get_list(db, &key) {
        Ok(Some(list)) => match list.lindex(index) {
            Some(value) => RespValue::bulk_string(value.clone()),
            None => RespValue::null_bulk_string(),
        },
        Ok(None) => RespValue::null_bulk_string(),
        Err(e) => e,
    }
}

pub fn cmd_lset(args: &[RespValue], db: &mut Database) -> RespValue {
    if args.len() != 3 {
        return wrong_arg_count("lset");
    }
    let key = match key_arg(args, 0) {
        Ok(k) => k,
        Err(e) => return e,
    };
    let Some(index) = arg_to_i64(&args[1]) else {
        return not_an_integer();
    };
    let value = arg_to_bytes(&args[2]).unwrap_or_default().to_vec();
    match get_list_mut(db, &key) {
        Ok(Some(list)) => {
            if list.lset(index, value) {
                RespValue::ok()
            } else {
                RespValue::error("ERR index out of range")
            }
        }
        Ok(None) => RespValue::error("ERR no such key"),
        Err(e) => e,
    }
}

pub fn cmd_llen(args: &[RespValue], db: &mut Database) -> RespValue {
    if args.len() != 1 {
        return wrong_arg_count("llen");
    }
    let key = match key_arg(args, 0) {
        Ok(k) => k,
        Err(e) => return e,
    };
    match get_list(db, &key) {
        Ok(list) => RespValue::integer(list.map_or(0, |l| l.len() as i64)),
        Err(e) => e,
    }
}

pub fn cmd_ltrim(args: &[RespValue], db: &mut Database) -> RespValue {
    if args.len() != 3 {
        return wrong_arg_count("ltrim");
    }
    let key = match key_arg(args, 0) {
        Ok(k) => k,
        Err(e) => return e,
    };
    let (Some(start), Some(stop)) = (arg_to_i64(&args[1]), arg_to_i64(&args[2])) else {
        return not_an_integer();
    };
    match get_list_mut(db, &key) {
        Ok(Some(list)) => list.ltrim(start, stop),
        Ok(None) => {}
        Err(e) => return e,
    }
    db.remove_if_empty(&key);
    RespValue::ok()
}

pub fn cmd_lrange(args: &[RespValue], db: &mut Database) -> RespValue {
    if args.len() != 3 {
        return wrong_arg_count("lrange");
    }
    let key = match key_arg(args, 0) {
        Ok(k) => k,
        Err(e) => return e,
    };
    let (Some(start), Some(stop)) = (arg_to_i64(&args[1]), arg_to_i64(&args[2])) else {
        return not_an_integer();
    };
    match get_list(db, &key) {
        Ok(Some(list)) => bulk_array(list.lrange(start, stop)),
        Ok(None) => RespValue::array(vec![]),
        Err(e) => e,
    }
}

pub fn cmd_lrem(args: &[RespValue], db: &mut Database) -> RespValue {
    if args.len() != 3 {
        return wrong_arg_count("lrem");
    }
    let key = match key_arg(args, 0) {
        Ok(k) => k,
        Err(e) => return e,
    };
    let Some(count) = arg_to_i64(&args[1]) else {
        return not_an_integer();
    };
    let value = arg_to_bytes(&args[2]).unwrap_or_default();
    let removed = match get_list_mut(db, &key) {
        Ok(Some(list)) => list.lrem(count, value),
        Ok(None) => 0,
        Err(e) => return e,
    };
    db.remove_if_empty(&key);
    RespValue::integer(removed)
}

/// Keys and timeout of a `BLPOP`/`BRPOP` call. A zero timeout means wait
/// forever and comes back as `None`.
pub fn parse_blocking_args(args: &[RespValue], name: &str) -> Result<(Vec<String>, Option<Duration>), RespValue> {
    if args.len() < 2 {
        return Err(wrong_arg_count(name));
    }
    let (timeout_arg, key_args) = args.split_last().ok_or_else(|| wrong_arg_count(name))?;
    let timeout = arg_to_f64(timeout_arg)
        .filter(|t| t.is_finite())
        .ok_or_else(|| RespValue::error("ERR timeout is not a float or out of range"))?;
    if timeout < 0.0 {
        return Err(RespValue::error("ERR timeout is negative"));
    }
    let keys = key_args.iter().filter_map(arg_to_string).collect();
    // Too large to represent means wait forever, same as 0.
    let timeout = if timeout > 0.0 {
        Duration::try_from_secs_f64(timeout).ok()
    } else {
        None
    };
    Ok((keys, timeout))
}

/// Pop from the first non-empty list among `keys`, answering `[key, value]`.
pub fn try_pop_from_keys(db: &mut Database, keys: &[String], end: End) -> Result<Option<RespValue>, RespValue> {
    for key in keys {
        if let Some(value) = pop_one(db, key, end)? {
            return Ok(Some(RespValue::array(vec![
                RespValue::bulk_string(key.clone()),
                RespValue::bulk_string(value),
            ])));
        }
    }
    Ok(None)
}

/// BLPOP/BRPOP without waiting: nil array when every list is empty.
pub fn cmd_bpop_nowait(args: &[RespValue], db: &mut Database, end: End) -> RespValue {
    let name = match end {
        End::Left => "blpop",
        End::Right => "brpop",
    };
    let keys = match parse_blocking_args(args, name) {
        Ok((keys, _)) => keys,
        Err(e) => return e,
    };
    match try_pop_from_keys(db, &keys, end) {
        Ok(Some(reply)) => reply,
        Ok(None) => RespValue::null_array(),
        Err(e) => e,
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::run;
    use super::*;

    fn strings(items: &[&str]) -> RespValue {
        RespValue::array(items.iter().map(|s| RespValue::bulk_string(*s)).collect())
    }

    #[test]
    fn test_push_pop_and_ready_keys() {
        let mut db = Database::new();
        assert_eq!(run(&mut db, &["RPUSH", "l", "a", "b"]), RespValue::integer(2));
        assert_eq!(run(&mut db, &["LPUSH", "l", "z"]), RespValue::integer(3));
        assert_eq!(db.take_ready_keys(), vec!["l".to_string()]);
        assert_eq!(run(&mut db, &["LRANGE", "l", "0", "-1"]), strings(&["z", "a", "b"]));
        assert_eq!(run(&mut db, &["RPOP", "l"]), RespValue::bulk_string("b"));
        assert_eq!(run(&mut db, &["LPOP", "l"]), RespValue::bulk_string("z"));
        assert_eq!(run(&mut db, &["LPOP", "l"]), RespValue::bulk_string("a"));
        assert!(!db.exists("l"));
        assert_eq!(run(&mut db, &["LPOP", "l"]), RespValue::null_bulk_string());
    }

    #[test]
    fn test_lindex_lset() {
        let mut db = Database::new();
        run(&mut db, &["RPUSH", "l", "a", "b", "c"]);
        assert_eq!(run(&mut db, &["LINDEX", "l", "-1"]), RespValue::bulk_string("c"));
        assert_eq!(run(&mut db, &["LINDEX", "l", "5"]), RespValue::null_bulk_string());
        assert_eq!(run(&mut db, &["LSET", "l", "1", "B"]), RespValue::ok());
        assert_eq!(
            run(&mut db, &["LSET", "l", "9", "x"]),
            RespValue::error("ERR index out of range")
        );
        assert_eq!(
            run(&mut db, &["LSET", "missing", "0", "x"]),
            RespValue::error("ERR no such key")
        );
    }

    #[test]
    fn test_ltrim_lrem() {
        let mut db = Database::new();
        run(&mut db, &["RPUSH", "l", "a", "b", "a", "c", "a"]);
        assert_eq!(run(&mut db, &["LREM", "l", "-1", "a"]), RespValue::integer(1));
        assert_eq!(run(&mut db, &["LRANGE", "l", "0", "-1"]), strings(&["a", "b", "a", "c"]));
        assert_eq!(run(&mut db, &["LREM", "l", "0", "a"]), RespValue::integer(2));
        assert_eq!(run(&mut db, &["LTRIM", "l", "1", "-1"]), RespValue::ok());
        assert_eq!(run(&mut db, &["LRANGE", "l", "0", "-1"]), strings(&["c"]));
        run(&mut db, &["LTRIM", "l", "5", "10"]);
        assert!(!db.exists("l"));
    }

    #[test]
    fn test_bpop_nowait() {
        let mut db = Database::new();
        assert_eq!(run(&mut db, &["BLPOP", "a", "b", "0"]), RespValue::null_array());
        run(&mut db, &["RPUSH", "b", "x", "y"]);
        assert_eq!(run(&mut db, &["BRPOP", "a", "b", "1.5"]), strings(&["b", "y"]));
        assert!(matches!(
            run(&mut db, &["BLPOP", "a", "-1"]),
            RespValue::Error(_)
        ));
    }

    #[test]
    fn test_parse_blocking_args() {
        let args: Vec<RespValue> = ["k1", "k2", "0.25"].iter().map(|a| RespValue::bulk_string(*a)).collect();
        let (keys, timeout) = parse_blocking_args(&args, "blpop").unwrap();
        assert_eq!(keys, vec!["k1".to_string(), "k2".to_string()]);
        assert_eq!(timeout, Some(Duration::from_millis(250)));
        let args = vec![RespValue::bulk_string("k"), RespValue::bulk_string("0")];
        assert_eq!(parse_blocking_args(&args, "blpop").unwrap().1, None);
        // Beyond what a Duration holds: wait forever rather than fail.
        let args = vec![RespValue::bulk_string("k"), RespValue::bulk_string("1e300")];
        assert_eq!(parse_blocking_args(&args, "blpop").unwrap().1, None);
        let args = vec![RespValue::bulk_string("k"), RespValue::bulk_string("-1")];
        assert!(parse_blocking_args(&args, "blpop").is_err());
    }
}
