use crate::cmd::format_score;
use crate::command::{arg_to_bytes, arg_to_f64, arg_to_i64, arg_to_string, key_arg, not_an_integer, wrong_arg_count, wrong_type_error};
use crate::resp::RespValue;
use crate::store::Database;
use crate::types::RedisValue;
use crate::types::sorted_set::RedisSortedSet;

fn not_a_float() -> RespValue {
    RespValue::error("ERR value is not a valid float")
}

fn get_zset<'a>(db: &'a Database, key: &str) -> Result<Option<&'a RedisSortedSet>, RespValue> {
    match db.get(key) {
        Some(RedisValue::SortedSet(z)) => Ok(Some(z)),
        Some(_) => Err(wrong_type_error()),
        None => Ok(None),
    }
}

fn get_or_create_zset<'a>(db: &'a mut Database, key: &str) -> Result<&'a mut RedisSortedSet, RespValue> {
    match db.get(key) {
        Some(RedisValue::SortedSet(_)) => {}
        Some(_) => return Err(wrong_type_error()),
        None => db.set(key.to_string(), RedisValue::SortedSet(RedisSortedSet::new())),
    }
    match db.get_mut(key) {
        Some(RedisValue::SortedSet(z)) => Ok(z),
        _ => Err(wrong_type_error()),
    }
}

/// Flatten (member, score) pairs into a reply, scores interleaved when asked.
fn pairs_reply(pairs: Vec<(&[u8], f64)>, with_scores: bool) -> RespValue {
    let mut items = Vec::with_capacity(pairs.len() * if with_scores { 2 } else { 1 });
    for (member, score) in pairs {
        items.push(RespValue::bulk_string(member.to_vec()));
        if with_scores {
            items.push(RespValue::bulk_string(format_score(score)));
        }
    }
    RespValue::array(items)
}

/// Parse a trailing `WITHSCORES` flag. `Err` on any other trailing argument.
fn with_scores_flag(rest: &[RespValue]) -> Result<bool, RespValue> {
    match rest {
        [] => Ok(false),
        [flag] if arg_to_string(flag).is_some_and(|f| f.eq_ignore_ascii_case("withscores")) => Ok(true),
        _ => Err(RespValue::error("ERR syntax error")),
    }
}

pub fn cmd_zadd(args: &[RespValue], db: &mut Database) -> RespValue {
    if args.len() < 3 || args.len() % 2 != 1 {
        return wrong_arg_count("zadd");
    }
    let key = match key_arg(args, 0) {
        Ok(k) => k,
        Err(e) => return e,
    };
    // Validate every score before touching the set.
    let mut entries = Vec::with_capacity(args.len() / 2);
    for pair in args[1..].chunks(2) {
        let Some(score) = arg_to_f64(&pair[0]) else {
            return not_a_float();
        };
        entries.push((arg_to_bytes(&pair[1]).unwrap_or_default().to_vec(), score));
    }
    let zset = match get_or_create_zset(db, &key) {
        Ok(z) => z,
        Err(e) => return e,
    };
    let added = entries
        .into_iter()
        .filter(|(member, score)| zset.add(member.clone(), *score))
        .count();
    RespValue::integer(added as i64)
}

pub fn cmd_zrem(args: &[RespValue], db: &mut Database) -> RespValue {
    if args.len() < 2 {
        return wrong_arg_count("zrem");
    }
    let key = match key_arg(args, 0) {
        Ok(k) => k,
        Err(e) => return e,
    };
    let removed = match db.get_mut(&key) {
        Some(RedisValue::SortedSet(z)) => args[1..]
            .iter()
            .filter(|arg| z.remove(arg_to_bytes(arg).unwrap_or_default()))
            .count(),
        Some(_) => return wrong_type_error(),
        None => 0,
    };
    db.remove_if_empty(&key);
    RespValue::integer(removed as i64)
}

pub fn cmd_zincrby(args: &[RespValue], db: &mut Database) -> RespValue {
    if args.len() != 3 {
        return wrong_arg_count("zincrby");
    }
    let key = match key_arg(args, 0) {
        Ok(k) => k,
        Err(e) => return e,
    };
    let Some(delta) = arg_to_f64(&args[1]) else {
        return not_a_float();
    };
    let member = arg_to_bytes(&args[2]).unwrap_or_default().to_vec();
    match get_or_create_zset(db, &key) {
        Ok(zset) => {
            let score = zset.incr_by(member, delta);
            if score.is_nan() {
                return RespValue::error("ERR resulting score is not a number (NaN)");
            }
            RespValue::bulk_string(format_score(score))
        }
        Err(e) => e,
    }
}

/// ZRANGE / ZREVRANGE key start stop [WITHSCORES]
pub fn cmd_zrange(args: &[RespValue], db: &mut Database, reverse: bool) -> RespValue {
    let name = if reverse { "zrevrange" } else { "zrange" };
    if args.len() < 3 {
        return wrong_arg_count(name);
    }
    let key = match key_arg(args, 0) {
        Ok(k) => k,
        Err(e) => return e,
    };
    let (Some(start), Some(stop)) = (arg_to_i64(&args[1]), arg_to_i64(&args[2])) else {
        return not_an_integer();
    };
    let with_scores = match with_scores_flag(&args[3..]) {
        Ok(w) => w,
        Err(e) => return e,
    };
    match get_zset(db, &key) {
        Ok(Some(zset)) => {
            let pairs = if reverse {
                zset.rev_range(start, stop)
            } else {
                zset.range(start, stop)
            };
            pairs_reply(pairs, with_scores)
        }
        Ok(None) => RespValue::array(vec![]),
        Err(e) => e,
    }
}

/// ZRANK / ZREVRANK: nil for an absent member.
pub fn cmd_zrank(args: &[RespValue], db: &mut Database, reverse: bool) -> RespValue {
    if args.len() != 2 {
        return wrong_arg_count(if reverse { "zrevrank" } else { "zrank" });
    }
    let key = match key_arg(args, 0) {
        Ok(k) => k,
        Err(e) => return e,
    };
    let member = arg_to_bytes(&args[1]).unwrap_or_default();
    let rank = match get_zset(db, &key) {
        Ok(Some(zset)) if reverse => zset.rev_rank(member),
        Ok(Some(zset)) => zset.rank(member),
        Ok(None) => None,
        Err(e) => return e,
    };
    match rank {
        Some(r) => RespValue::integer(r as i64),
        None => RespValue::null_bulk_string(),
    }
}

pub fn cmd_zscore(args: &[RespValue], db: &mut Database) -> RespValue {
    if args.len() != 2 {
        return wrong_arg_count("zscore");
    }
    let key = match key_arg(args, 0) {
        Ok(k) => k,
        Err(e) => return e,
    };
    let member = arg_to_bytes(&args[1]).unwrap_or_default();
    match get_zset(db, &key) {
        Ok(zset) => match zset.and_then(|z| z.score(member)) {
            Some(score) => RespValue::bulk_string(format_score(score)),
            None => RespValue::null_bulk_string(),
        },
        Err(e) => e,
    }
}

/// One end of a score interval: `1.5`, `(1.5` (exclusive), `-inf`, `+inf`.
fn parse_score_bound(arg: &RespValue) -> Option<(f64, bool)> {
    let text = arg_to_string(arg)?;
    match text.strip_prefix('(') {
        Some(rest) => arg_to_f64(&RespValue::bulk_string(rest)).map(|v| (v, true)),
        None => arg_to_f64(arg).map(|v| (v, false)),
    }
}

/// ZRANGEBYSCORE key min max [WITHSCORES]
pub fn cmd_zrangebyscore(args: &[RespValue], db: &mut Database) -> RespValue {
    if args.len() < 3 {
        return wrong_arg_count("zrangebyscore");
    }
    let key = match key_arg(args, 0) {
        Ok(k) => k,
        Err(e) => return e,
    };
    let (Some((min, min_excl)), Some((max, max_excl))) =
        (parse_score_bound(&args[1]), parse_score_bound(&args[2]))
    else {
        return RespValue::error("ERR min or max is not a float");
    };
    let with_scores = match with_scores_flag(&args[3..]) {
        Ok(w) => w,
        Err(e) => return e,
    };
    match get_zset(db, &key) {
        Ok(Some(zset)) => {
            let pairs = zset
                .range_by_score(min, max)
                .into_iter()
                .filter(|(_, score)| !(min_excl && *score == min) && !(max_excl && *score == max))
                .collect();
            pairs_reply(pairs, with_scores)
        }
        Ok(None) => RespValue::array(vec![]),
        Err(e) => e,
    }
}

pub fn cmd_zcard(args: &[RespValue], db: &mut Database) -> RespValue {
    if args.len() != 1 {
        return wrong_arg_count("zcard");
    }
    let key = match key_arg(args, 0) {
        Ok(k) => k,
        Err(e) => return e,
    };
    match get_zset(db, &key) {
        Ok(zset) => RespValue::integer(zset.map_or(0, |z| z.len() as i64)),
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
    fn test_zadd_and_ranges() {
        let mut db = Database::new();
        assert_eq!(
            run(&mut db, &["ZADD", "z", "3", "baz", "1", "foo", "2", "bar"]),
            RespValue::integer(3)
        );
        assert_eq!(run(&mut db, &["ZADD", "z", "5", "bar"]), RespValue::integer(0));
        assert_eq!(run(&mut db, &["ZRANGE", "z", "0", "-1"]), strings(&["foo", "baz", "bar"]));
        assert_eq!(run(&mut db, &["ZREVRANGE", "z", "0", "0", "WITHSCORES"]), strings(&["bar", "5"]));
        assert_eq!(run(&mut db, &["ZCARD", "z"]), RespValue::integer(3));
    }

    #[test]
    fn test_rank_score_incr() {
        let mut db = Database::new();
        run(&mut db, &["ZADD", "z", "1", "a", "2", "b"]);
        assert_eq!(run(&mut db, &["ZRANK", "z", "b"]), RespValue::integer(1));
        assert_eq!(run(&mut db, &["ZREVRANK", "z", "b"]), RespValue::integer(0));
        assert_eq!(run(&mut db, &["ZRANK", "z", "nope"]), RespValue::null_bulk_string());
        assert_eq!(run(&mut db, &["ZINCRBY", "z", "2.5", "a"]), RespValue::bulk_string("3.5"));
        assert_eq!(run(&mut db, &["ZSCORE", "z", "a"]), RespValue::bulk_string("3.5"));
        assert_eq!(run(&mut db, &["ZSCORE", "z", "nope"]), RespValue::null_bulk_string());
        assert_eq!(run(&mut db, &["ZADD", "z", "x", "a"]), not_a_float());
    }

    #[test]
    fn test_rangebyscore() {
        let mut db = Database::new();
        run(&mut db, &["ZADD", "z", "1", "a", "2", "b", "3", "c"]);
        assert_eq!(run(&mut db, &["ZRANGEBYSCORE", "z", "2", "+inf"]), strings(&["b", "c"]));
        assert_eq!(run(&mut db, &["ZRANGEBYSCORE", "z", "(1", "(3"]), strings(&["b"]));
        assert_eq!(run(&mut db, &["ZRANGEBYSCORE", "z", "-inf", "1", "WITHSCORES"]), strings(&["a", "1"]));
    }

    #[test]
    fn test_zrem_deletes_empty() {
        let mut db = Database::new();
        run(&mut db, &["ZADD", "z", "1", "a"]);
        assert_eq!(run(&mut db, &["ZREM", "z", "a", "b"]), RespValue::integer(1));
        assert!(!db.exists("z"));
    }
}
