use crate::command::{arg_to_i64, arg_to_string, key_arg, wrong_arg_count};
use crate::resp::RespValue;
use crate::store::Database;

pub fn cmd_ping(args: &[RespValue]) -> RespValue {
    match args {
        [] => RespValue::simple_string("PONG"),
        [msg] => msg.clone(),
        _ => wrong_arg_count("ping"),
    }
}

/// The engine has a single keyspace; only database 0 can be selected.
pub fn cmd_select(args: &[RespValue]) -> RespValue {
    if args.len() != 1 {
        return wrong_arg_count("select");
    }
    match arg_to_i64(&args[0]) {
        Some(0) => RespValue::ok(),
        Some(_) => RespValue::error("ERR DB index is out of range"),
        None => RespValue::error("ERR value is not an integer or out of range"),
    }
}

pub fn cmd_dbsize(db: &mut Database) -> RespValue {
    RespValue::integer(db.dbsize() as i64)
}

pub fn cmd_flushdb(db: &mut Database) -> RespValue {
    db.flush();
    RespValue::ok()
}

pub fn cmd_del(args: &[RespValue], db: &mut Database) -> RespValue {
    if args.is_empty() {
        return wrong_arg_count("del");
    }
    let count = args
        .iter()
        .filter_map(arg_to_string)
        .filter(|key| db.del(key))
        .count();
    RespValue::integer(count as i64)
}

pub fn cmd_exists(args: &[RespValue], db: &mut Database) -> RespValue {
    if args.is_empty() {
        return wrong_arg_count("exists");
    }
    let count = args
        .iter()
        .filter_map(arg_to_string)
        .filter(|key| db.exists(key))
        .count();
    RespValue::integer(count as i64)
}

pub fn cmd_type(args: &[RespValue], db: &mut Database) -> RespValue {
    if args.len() != 1 {
        return wrong_arg_count("type");
    }
    let key = match key_arg(args, 0) {
        Ok(k) => k,
        Err(e) => return e,
    };
    RespValue::simple_string(db.key_type(&key).unwrap_or("none"))
}

pub fn cmd_rename(args: &[RespValue], db: &mut Database) -> RespValue {
    if args.len() != 2 {
        return wrong_arg_count("rename");
    }
    let (old, new) = match (key_arg(args, 0), key_arg(args, 1)) {
        (Ok(old), Ok(new)) => (old, new),
        (Err(e), _) | (_, Err(e)) => return e,
    };
    if db.rename(&old, &new) {
        RespValue::ok()
    } else {
        RespValue::error("ERR no such key")
    }
}

pub fn cmd_keys(args: &[RespValue], db: &mut Database) -> RespValue {
    if args.len() != 1 {
        return wrong_arg_count("keys");
    }
    let pattern = match key_arg(args, 0) {
        Ok(p) => p,
        Err(e) => return e,
    };
    RespValue::array(
        db.keys(&pattern)
            .into_iter()
            .map(RespValue::bulk_string)
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::super::tests::run;
    use super::*;

    #[test]
    fn test_del_exists_type() {
        let mut db = Database::new();
        run(&mut db, &["SET", "a", "1"]);
        run(&mut db, &["SADD", "b", "x"]);
        assert_eq!(run(&mut db, &["EXISTS", "a", "b", "c"]), RespValue::integer(2));
        assert_eq!(run(&mut db, &["TYPE", "b"]), RespValue::simple_string("set"));
        assert_eq!(run(&mut db, &["TYPE", "c"]), RespValue::simple_string("none"));
        assert_eq!(run(&mut db, &["DEL", "a", "c"]), RespValue::integer(1));
        assert_eq!(run(&mut db, &["DBSIZE"]), RespValue::integer(1));
    }

    #[test]
    fn test_rename() {
        let mut db = Database::new();
        assert_eq!(
            run(&mut db, &["RENAME", "x", "y"]),
            RespValue::error("ERR no such key")
        );
        run(&mut db, &["SET", "x", "1"]);
        assert_eq!(run(&mut db, &["RENAME", "x", "y"]), RespValue::ok());
        assert_eq!(run(&mut db, &["GET", "y"]), RespValue::bulk_string("1"));
    }

    #[test]
    fn test_keys_and_flush() {
        let mut db = Database::new();
        run(&mut db, &["SET", "user:1", "a"]);
        run(&mut db, &["SET", "user:2", "b"]);
        run(&mut db, &["SET", "other", "c"]);
        assert_eq!(
            run(&mut db, &["KEYS", "user:*"]),
            RespValue::array(vec![
                RespValue::bulk_string("user:1"),
                RespValue::bulk_string("user:2"),
            ])
        );
        assert_eq!(run(&mut db, &["FLUSHDB"]), RespValue::ok());
        assert_eq!(run(&mut db, &["DBSIZE"]), RespValue::integer(0));
    }

    #[test]
    fn test_ping_select() {
        assert_eq!(cmd_ping(&[]), RespValue::simple_string("PONG"));
        assert_eq!(cmd_select(&[RespValue::bulk_string("0")]), RespValue::ok());
        assert!(matches!(
            cmd_select(&[RespValue::bulk_string("3")]),
            RespValue::Error(_)
        ));
    }
}
