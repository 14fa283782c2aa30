use crate::command::{arg_to_bytes, arg_to_i64, key_arg, not_an_integer, wrong_arg_count, wrong_type_error};
use crate::resp::RespValue;
use crate::store::Database;
use crate::types::RedisValue;
use crate::types::rstring::RedisString;

pub fn cmd_get(args: &[RespValue], db: &mut Database) -> RespValue {
    if args.len() != 1 {
        return wrong_arg_count("get");
    }
    let key = match key_arg(args, 0) {
        Ok(k) => k,
        Err(e) => return e,
    };
    match db.get(&key) {
        Some(RedisValue::String(s)) => RespValue::bulk_string(s.as_bytes().to_vec()),
        Some(_) => wrong_type_error(),
        None => RespValue::null_bulk_string(),
    }
}

pub fn cmd_set(args: &[RespValue], db: &mut Database) -> RespValue {
    if args.len() != 2 {
        return wrong_arg_count("set");
    }
    let key = match key_arg(args, 0) {
        Ok(k) => k,
        Err(e) => return e,
    };
    let value = match arg_to_bytes(&args[1]) {
        Some(v) => v.to_vec(),
        None => return RespValue::error("ERR invalid value"),
    };
    db.set(key, RedisValue::String(RedisString::new(value)));
    RespValue::ok()
}

pub fn cmd_mget(args: &[RespValue], db: &mut Database) -> RespValue {
    if args.is_empty() {
        return wrong_arg_count("mget");
    }
    // Missing keys and keys of another type both read as nil.
    let values = args
        .iter()
        .map(|arg| {
            let key = arg.to_string_lossy().unwrap_or_default();
            match db.get(&key) {
                Some(RedisValue::String(s)) => RespValue::bulk_string(s.as_bytes().to_vec()),
                _ => RespValue::null_bulk_string(),
            }
        })
        .collect();
    RespValue::array(values)
}

pub fn cmd_mset(args: &[RespValue], db: &mut Database) -> RespValue {
    if args.is_empty() || args.len() % 2 != 0 {
        return wrong_arg_count("mset");
    }
    for pair in args.chunks(2) {
        let (Some(key), Some(value)) = (pair[0].to_string_lossy(), arg_to_bytes(&pair[1])) else {
            return RespValue::error("ERR invalid key or value");
        };
        db.set(key, RedisValue::String(RedisString::new(value.to_vec())));
    }
    RespValue::ok()
}

pub fn cmd_incr(args: &[RespValue], db: &mut Database) -> RespValue {
    if args.len() != 1 {
        return wrong_arg_count("incr");
    }
    incr_by(args, db, 1)
}

pub fn cmd_decr(args: &[RespValue], db: &mut Database) -> RespValue {
    if args.len() != 1 {
        return wrong_arg_count("decr");
    }
    incr_by(args, db, -1)
}

pub fn cmd_incrby(args: &[RespValue], db: &mut Database) -> RespValue {
    if args.len() != 2 {
        return wrong_arg_count("incrby");
    }
    match arg_to_i64(&args[1]) {
        Some(delta) => incr_by(args, db, delta),
        None => not_an_integer(),
    }
}

pub fn cmd_decrby(args: &[RespValue], db: &mut Database) -> RespValue {
    if args.len() != 2 {
        return wrong_arg_count("decrby");
    }
    match arg_to_i64(&args[1]).and_then(i64::checked_neg) {
        Some(delta) => incr_by(args, db, delta),
        None => not_an_integer(),
    }
}

/// Shared body of the INCR family; a missing key counts from 0.
fn incr_by(args: &[RespValue], db: &mut Database, delta: i64) -> RespValue {
    let key = match key_arg(args, 0) {
        Ok(k) => k,
        Err(e) => return e,
    };
    match db.get_mut(&key) {
        Some(RedisValue::String(s)) => match s.incr_by(delta) {
            Ok(n) => RespValue::integer(n),
            Err(msg) => RespValue::error(format!("ERR {msg}")),
        },
        Some(_) => wrong_type_error(),
        None => {
            db.set(key, RedisValue::String(RedisString::from_i64(delta)));
            RespValue::integer(delta)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::run;
    use super::*;

    #[test]
    fn test_get_set() {
        let mut db = Database::new();
        assert_eq!(run(&mut db, &["GET", "k"]), RespValue::null_bulk_string());
        assert_eq!(run(&mut db, &["SET", "k", "v"]), RespValue::ok());
        assert_eq!(run(&mut db, &["GET", "k"]), RespValue::bulk_string("v"));
        assert_eq!(run(&mut db, &["SET", "k"]), wrong_arg_count("set"));
    }

    #[test]
    fn test_incr_family() {
        let mut db = Database::new();
        assert_eq!(run(&mut db, &["INCR", "n"]), RespValue::integer(1));
        assert_eq!(run(&mut db, &["INCRBY", "n", "10"]), RespValue::integer(11));
        assert_eq!(run(&mut db, &["DECR", "n"]), RespValue::integer(10));
        assert_eq!(run(&mut db, &["DECRBY", "n", "4"]), RespValue::integer(6));
        run(&mut db, &["SET", "s", "abc"]);
        assert_eq!(run(&mut db, &["INCR", "s"]), not_an_integer());
    }

    #[test]
    fn test_mget_mset() {
        let mut db = Database::new();
        assert_eq!(run(&mut db, &["MSET", "a", "1", "b", "2"]), RespValue::ok());
        run(&mut db, &["LPUSH", "l", "x"]);
        assert_eq!(
            run(&mut db, &["MGET", "a", "missing", "b", "l"]),
            RespValue::array(vec![
                RespValue::bulk_string("1"),
                RespValue::null_bulk_string(),
                RespValue::bulk_string("2"),
                RespValue::null_bulk_string(),
            ])
        );
        assert_eq!(run(&mut db, &["MSET", "a"]), wrong_arg_count("mset"));
    }
}
