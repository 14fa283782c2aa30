use crate::command::{arg_to_bytes, arg_to_string, bulk_array, key_arg, wrong_arg_count, wrong_type_error};
use crate::resp::RespValue;
use crate::store::Database;
use crate::types::RedisValue;
use crate::types::set::RedisSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOp {
    Union,
    Inter,
    Diff,
}

impl SetOp {
    fn name(self) -> &'static str {
        match self {
            SetOp::Union => "sunion",
            SetOp::Inter => "sinter",
            SetOp::Diff => "sdiff",
        }
    }
}

fn get_set<'a>(db: &'a Database, key: &str) -> Result<Option<&'a RedisSet>, RespValue> {
    match db.get(key) {
        Some(RedisValue::Set(set)) => Ok(Some(set)),
        Some(_) => Err(wrong_type_error()),
        None => Ok(None),
    }
}

fn get_set_mut<'a>(db: &'a mut Database, key: &str) -> Result<Option<&'a mut RedisSet>, RespValue> {
    match db.get_mut(key) {
        Some(RedisValue::Set(set)) => Ok(Some(set)),
        Some(_) => Err(wrong_type_error()),
        None => Ok(None),
    }
}

pub fn cmd_sadd(args: &[RespValue], db: &mut Database) -> RespValue {
    if args.len() < 2 {
        return wrong_arg_count("sadd");
    }
    let key = match key_arg(args, 0) {
        Ok(k) => k,
        Err(e) => return e,
    };
    match db.get(&key) {
        Some(RedisValue::Set(_)) => {}
        Some(_) => return wrong_type_error(),
        None => db.set(key.clone(), RedisValue::Set(RedisSet::new())),
    }
    let Ok(Some(set)) = get_set_mut(db, &key) else {
        return wrong_type_error();
    };
    let added = args[1..]
        .iter()
        .filter(|arg| set.add(arg_to_bytes(arg).unwrap_or_default().to_vec()))
        .count();
    RespValue::integer(added as i64)
}

pub fn cmd_srem(args: &[RespValue], db: &mut Database) -> RespValue {
    if args.len() < 2 {
        return wrong_arg_count("srem");
    }
    let key = match key_arg(args, 0) {
        Ok(k) => k,
        Err(e) => return e,
    };
    let removed = match get_set_mut(db, &key) {
        Ok(Some(set)) => args[1..]
            .iter()
            .filter(|arg| set.remove(arg_to_bytes(arg).unwrap_or_default()))
            .count(),
        Ok(None) => 0,
        Err(e) => return e,
    };
    db.remove_if_empty(&key);
    RespValue::integer(removed as i64)
}

pub fn cmd_spop(args: &[RespValue], db: &mut Database) -> RespValue {
    if args.len() != 1 {
        return wrong_arg_count("spop");
    }
    let key = match key_arg(args, 0) {
        Ok(k) => k,
        Err(e) => return e,
    };
    let popped = match get_set_mut(db, &key) {
        Ok(Some(set)) => set.pop(),
        Ok(None) => None,
        Err(e) => return e,
    };
    db.remove_if_empty(&key);
    match popped {
        Some(member) => RespValue::bulk_string(member),
        None => RespValue::null_bulk_string(),
    }
}

pub fn cmd_smembers(args: &[RespValue], db: &mut Database) -> RespValue {
    if args.len() != 1 {
        return wrong_arg_count("smembers");
    }
    let key = match key_arg(args, 0) {
        Ok(k) => k,
        Err(e) => return e,
    };
    match get_set(db, &key) {
        Ok(Some(set)) => bulk_array(set.iter()),
        Ok(None) => RespValue::array(vec![]),
        Err(e) => e,
    }
}

pub fn cmd_sismember(args: &[RespValue], db: &mut Database) -> RespValue {
    if args.len() != 2 {
        return wrong_arg_count("sismember");
    }
    let key = match key_arg(args, 0) {
        Ok(k) => k,
        Err(e) => return e,
    };
    let member = arg_to_bytes(&args[1]).unwrap_or_default();
    match get_set(db, &key) {
        Ok(set) => RespValue::integer(set.is_some_and(|s| s.contains(member)) as i64),
        Err(e) => e,
    }
}

pub fn cmd_scard(args: &[RespValue], db: &mut Database) -> RespValue {
    if args.len() != 1 {
        return wrong_arg_count("scard");
    }
    let key = match key_arg(args, 0) {
        Ok(k) => k,
        Err(e) => return e,
    };
    match get_set(db, &key) {
        Ok(set) => RespValue::integer(set.map_or(0, |s| s.len() as i64)),
        Err(e) => e,
    }
}

/// Fold the sets named by `keys` with `op`; a missing key is an empty set.
fn combine(keys: &[RespValue], db: &Database, op: SetOp) -> Result<RedisSet, RespValue> {
    let empty = RedisSet::new();
    let mut result: Option<RedisSet> = None;
    for arg in keys {
        let key = arg_to_string(arg).unwrap_or_default();
        let set = get_set(db, &key)?.unwrap_or(&empty);
        result = Some(match result {
            None => set.clone(),
            Some(acc) => match op {
                SetOp::Union => acc.union(set),
                SetOp::Inter => acc.intersect(set),
                SetOp::Diff => acc.difference(set),
            },
        });
    }
    Ok(result.unwrap_or_default())
}

pub fn cmd_combine(args: &[RespValue], db: &mut Database, op: SetOp) -> RespValue {
    if args.is_empty() {
        return wrong_arg_count(op.name());
    }
    match combine(args, db, op) {
        Ok(set) => bulk_array(set.iter()),
        Err(e) => e,
    }
}

/// `S*STORE dest key [key ...]`: the destination is replaced, or deleted if
/// the result is empty.
pub fn cmd_combine_store(args: &[RespValue], db: &mut Database, op: SetOp) -> RespValue {
    if args.len() < 2 {
        return wrong_arg_count(&format!("{}store", op.name()));
    }
    let dest = match key_arg(args, 0) {
        Ok(k) => k,
        Err(e) => return e,
    };
    let set = match combine(&args[1..], db, op) {
        Ok(set) => set,
        Err(e) => return e,
    };
    let len = set.len() as i64;
    if set.is_empty() {
        db.del(&dest);
    } else {
        db.set(dest, RedisValue::Set(set));
    }
    RespValue::integer(len)
}

#[cfg(test)]
mod tests {
    use super::super::tests::run;
    use super::*;

    fn sorted_members(reply: RespValue) -> Vec<String> {
        let RespValue::Array(Some(items)) = reply else {
            panic!("expected array, got {reply:?}");
        };
        let mut members: Vec<String> = items.iter().filter_map(|i| i.to_string_lossy()).collect();
        members.sort();
        members
    }

    #[test]
    fn test_sadd_srem_card() {
        let mut db = Database::new();
        assert_eq!(run(&mut db, &["SADD", "s", "a", "b", "a"]), RespValue::integer(2));
        assert_eq!(run(&mut db, &["SCARD", "s"]), RespValue::integer(2));
        assert_eq!(run(&mut db, &["SISMEMBER", "s", "a"]), RespValue::integer(1));
        assert_eq!(run(&mut db, &["SREM", "s", "a", "zz"]), RespValue::integer(1));
        assert_eq!(run(&mut db, &["SPOP", "s"]), RespValue::bulk_string("b"));
        assert!(!db.exists("s"));
        assert_eq!(run(&mut db, &["SPOP", "s"]), RespValue::null_bulk_string());
    }

    #[test]
    fn test_set_algebra() {
        let mut db = Database::new();
        run(&mut db, &["SADD", "a", "1", "2", "3"]);
        run(&mut db, &["SADD", "b", "2", "3", "4"]);
        assert_eq!(sorted_members(run(&mut db, &["SUNION", "a", "b"])), ["1", "2", "3", "4"]);
        assert_eq!(sorted_members(run(&mut db, &["SINTER", "a", "b"])), ["2", "3"]);
        assert_eq!(sorted_members(run(&mut db, &["SDIFF", "a", "b"])), ["1"]);
        assert_eq!(sorted_members(run(&mut db, &["SINTER", "a", "missing"])), Vec::<String>::new());
    }

    #[test]
    fn test_store_variants() {
        let mut db = Database::new();
        run(&mut db, &["SADD", "a", "1", "2"]);
        run(&mut db, &["SADD", "b", "2"]);
        assert_eq!(run(&mut db, &["SDIFFSTORE", "d", "a", "b"]), RespValue::integer(1));
        assert_eq!(sorted_members(run(&mut db, &["SMEMBERS", "d"])), ["1"]);
        assert_eq!(run(&mut db, &["SINTERSTORE", "d", "a", "missing"]), RespValue::integer(0));
        assert!(!db.exists("d"));
    }
}
