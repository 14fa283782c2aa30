use crate::command::{arg_to_bytes, key_arg, wrong_arg_count, wrong_type_error};
use crate::resp::RespValue;
use crate::store::Database;
use crate::types::RedisValue;
use crate::types::hash::RedisHash;

fn get_hash<'a>(db: &'a Database, key: &str) -> Result<Option<&'a RedisHash>, RespValue> {
    match db.get(key) {
        Some(RedisValue::Hash(h)) => Ok(Some(h)),
        Some(_) => Err(wrong_type_error()),
        None => Ok(None),
    }
}

fn get_or_create_hash<'a>(db: &'a mut Database, key: &str) -> Result<&'a mut RedisHash, RespValue> {
    match db.get(key) {
        Some(RedisValue::Hash(_)) => {}
        Some(_) => return Err(wrong_type_error()),
        None => db.set(key.to_string(), RedisValue::Hash(RedisHash::new())),
    }
    match db.get_mut(key) {
        Some(RedisValue::Hash(h)) => Ok(h),
        _ => Err(wrong_type_error()),
    }
}

/// Store field/value pairs, returning how many fields were new.
fn set_fields(args: &[RespValue], db: &mut Database, name: &str) -> Result<i64, RespValue> {
    if args.len() < 3 || args.len() % 2 != 1 {
        return Err(wrong_arg_count(name));
    }
    let key = key_arg(args, 0)?;
    let hash = get_or_create_hash(db, &key)?;
    let mut added = 0;
    for pair in args[1..].chunks(2) {
        let field = arg_to_bytes(&pair[0]).unwrap_or_default().to_vec();
        let value = arg_to_bytes(&pair[1]).unwrap_or_default().to_vec();
        if hash.set(field, value) {
            added += 1;
        }
    }
    Ok(added)
}

pub fn cmd_hset(args: &[RespValue], db: &mut Database) -> RespValue {
    match set_fields(args, db, "hset") {
        Ok(added) => RespValue::integer(added),
        Err(e) => e,
    }
}

pub fn cmd_hmset(args: &[RespValue], db: &mut Database) -> RespValue {
    match set_fields(args, db, "hmset") {
        Ok(_) => RespValue::ok(),
        Err(e) => e,
    }
}

pub fn cmd_hget(args: &[RespValue], db: &mut Database) -> RespValue {
    if args.len() != 2 {
        return wrong_arg_count("hget");
    }
    let key = match key_arg(args, 0) {
        Ok(k) => k,
        Err(e) => return e,
    };
    let field = arg_to_bytes(&args[1]).unwrap_or_default();
    match get_hash(db, &key) {
        Ok(hash) => match hash.and_then(|h| h.get(field)) {
            Some(value) => RespValue::bulk_string(value.clone()),
            None => RespValue::null_bulk_string(),
        },
        Err(e) => e,
    }
}

pub fn cmd_hdel(args: &[RespValue], db: &mut Database) -> RespValue {
    if args.len() < 2 {
        return wrong_arg_count("hdel");
    }
    let key = match key_arg(args, 0) {
        Ok(k) => k,
        Err(e) => return e,
    };
    let removed = match db.get_mut(&key) {
        Some(RedisValue::Hash(h)) => args[1..]
            .iter()
            .filter(|arg| h.del(arg_to_bytes(arg).unwrap_or_default()))
            .count(),
        Some(_) => return wrong_type_error(),
        None => 0,
    };
    db.remove_if_empty(&key);
    RespValue::integer(removed as i64)
}

pub fn cmd_hexists(args: &[RespValue], db: &mut Database) -> RespValue {
    if args.len() != 2 {
        return wrong_arg_count("hexists");
    }
    let key = match key_arg(args, 0) {
        Ok(k) => k,
        Err(e) => return e,
    };
    let field = arg_to_bytes(&args[1]).unwrap_or_default();
    match get_hash(db, &key) {
        Ok(hash) => RespValue::integer(hash.is_some_and(|h| h.exists(field)) as i64),
        Err(e) => e,
    }
}

/// Shared body of HKEYS / HVALS / HGETALL / HLEN.
fn read_hash(args: &[RespValue], db: &Database, name: &str, render: impl Fn(&RedisHash) -> RespValue) -> RespValue {
    if args.len() != 1 {
        return wrong_arg_count(name);
    }
    let key = match key_arg(args, 0) {
        Ok(k) => k,
        Err(e) => return e,
    };
    match get_hash(db, &key) {
        Ok(Some(hash)) => render(hash),
        Ok(None) => render(&RedisHash::new()),
        Err(e) => e,
    }
}

pub fn cmd_hkeys(args: &[RespValue], db: &mut Database) -> RespValue {
    read_hash(args, db, "hkeys", |h| {
        RespValue::array(h.iter().map(|(f, _)| RespValue::bulk_string(f.clone())).collect())
    })
}

pub fn cmd_hvals(args: &[RespValue], db: &mut Database) -> RespValue {
    read_hash(args, db, "hvals", |h| {
        RespValue::array(h.iter().map(|(_, v)| RespValue::bulk_string(v.clone())).collect())
    })
}

pub fn cmd_hgetall(args: &[RespValue], db: &mut Database) -> RespValue {
    read_hash(args, db, "hgetall", |h| {
        RespValue::array(
            h.iter()
                .flat_map(|(f, v)| [RespValue::bulk_string(f.clone()), RespValue::bulk_string(v.clone())])
                .collect(),
        )
    })
}

pub fn cmd_hlen(args: &[RespValue], db: &mut Database) -> RespValue {
    read_hash(args, db, "hlen", |h| RespValue::integer(h.len() as i64))
}
