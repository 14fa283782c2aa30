use bytes::Bytes;
use keyview::resp::RespValue;
use keyview::{Client, ClientConfig, Error, Lookup, Selector, TypedView, cmd};
use std::io::{self, BufRead, Write};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(io::stderr)
        .init();

    // Parse command line args
    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = ClientConfig::from_args(&args)?;
    let client = Client::connect(&config).await?;
    if config.memory {
        info!("using in-memory store");
    } else {
        info!("connected to {}", config.addr());
    }

    let stdin = io::stdin();
    let mut reader = stdin.lock();

    loop {
        print!("keyview> ");
        io::stdout().flush()?;

        let mut line = String::new();
        let n = reader.read_line(&mut line)?;
        if n == 0 {
            break; // EOF
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some((command, rest)) = tokens.split_first() else {
            continue;
        };

        let outcome = match (command.to_lowercase().as_str(), rest) {
            ("quit" | "exit", _) => break,
            ("type", [key]) => type_of(&client, key).await,
            ("get", [key]) => show(&client, key).await,
            ("keys", []) => list_keys(&client, "*").await,
            ("keys", [pattern]) => list_keys(&client, pattern).await,
            ("del", [target]) => delete(&client, target).await,
            ("dbsize", []) => client.len().await.map(|n| println!("(integer) {n}")),
            ("raw", [name, args @ ..]) => raw(&client, name, args).await,
            ("help", _) => {
                print_help();
                Ok(())
            }
            _ => {
                println!("(error) unknown or malformed command, try 'help'");
                Ok(())
            }
        };
        if let Err(e) = outcome {
            println!("(error) {e}");
        }
    }

    Ok(())
}

fn print_help() {
    println!("type <key>            type tag of a key");
    println!("get <key|glob>        show the value(s) behind a key or pattern");
    println!("keys [pattern]        list keys");
    println!("del <key|glob>        delete a key or every key matching a pattern");
    println!("dbsize                number of keys");
    println!("raw <command> [args]  send a command as-is");
    println!("quit");
}

fn is_glob(text: &str) -> bool {
    keyview::glob::has_wildcards(text)
}

async fn type_of(client: &Client, key: &str) -> keyview::Result<()> {
    let tag: keyview::KeyType = cmd("TYPE").arg(key).query(&**client.store()).await?;
    println!("{tag}");
    Ok(())
}

async fn list_keys(client: &Client, pattern: &str) -> keyview::Result<()> {
    let keys = client.keys(pattern).await?;
    if keys.is_empty() {
        println!("(empty array)");
    }
    for (i, key) in keys.iter().enumerate() {
        println!("{}) \"{key}\"", i + 1);
    }
    Ok(())
}

async fn delete(client: &Client, target: &str) -> keyview::Result<()> {
    let proxy = client.proxy();
    let selector = if is_glob(target) {
        Selector::glob(target)
    } else {
        Selector::from(target)
    };
    let removed = proxy.delete(selector).await?;
    println!("(integer) {removed}");
    Ok(())
}

async fn show(client: &Client, target: &str) -> keyview::Result<()> {
    let proxy = client.proxy();
    let selector = if is_glob(target) {
        Selector::glob(target)
    } else {
        Selector::from(target)
    };
    match proxy.lookup(selector).await {
        Ok(Lookup::One(view)) => print_view(&view, "").await,
        Ok(Lookup::Many(mut many)) => {
            while let Some(item) = many.next().await {
                let (key, view) = item?;
                println!("{key}:");
                print_view(&view, "   ").await?;
            }
            Ok(())
        }
        Err(Error::NotFound(_)) => {
            println!("(nil)");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

async fn print_view(view: &TypedView, prefix: &str) -> keyview::Result<()> {
    let lossy = |b: &Bytes| String::from_utf8_lossy(b).into_owned();
    match view {
        TypedView::Int(n) => println!("{prefix}(integer) {n}"),
        TypedView::Text(s) => println!("{prefix}\"{s}\""),
        TypedView::List(list) => {
            print_items(prefix, list.to_vec::<Bytes>().await?.iter().map(lossy));
        }
        TypedView::Set(set) => {
            let mut members: Vec<String> = set.members::<Bytes>().await?.iter().map(lossy).collect();
            members.sort();
            print_items(prefix, members.into_iter());
        }
        TypedView::SortedSet(zset) => {
            let items = zset.items::<Bytes>().await?;
            print_items(
                prefix,
                items.iter().map(|(m, score)| format!("{} ({score})", lossy(m))),
            );
        }
        TypedView::Hash(hash) => {
            let mut items = hash.items::<Bytes>().await?;
            items.sort_by(|a, b| a.0.cmp(&b.0));
            print_items(
                prefix,
                items.iter().map(|(f, v)| format!("{f} => {}", lossy(v))),
            );
        }
    }
    Ok(())
}

fn print_items(prefix: &str, items: impl Iterator<Item = String>) {
    let mut any = false;
    for (i, item) in items.enumerate() {
        any = true;
        println!("{prefix}{}) \"{item}\"", i + 1);
    }
    if !any {
        println!("{prefix}(empty)");
    }
}

async fn raw(client: &Client, name: &str, args: &[&str]) -> keyview::Result<()> {
    let reply = client.store().execute(cmd(name).args(args)).await?;
    print_resp_value(&reply, 0);
    Ok(())
}

fn print_resp_value(value: &RespValue, indent: usize) {
    let prefix = " ".repeat(indent);
    match value {
        RespValue::SimpleString(s) => println!("{prefix}{s}"),
        RespValue::Error(s) => println!("{prefix}(error) {s}"),
        RespValue::Integer(n) => println!("{prefix}(integer) {n}"),
        RespValue::BulkString(None) | RespValue::Array(None) => println!("{prefix}(nil)"),
        RespValue::BulkString(Some(data)) => {
            println!("{prefix}\"{}\"", String::from_utf8_lossy(data));
        }
        RespValue::Array(Some(items)) if items.is_empty() => println!("{prefix}(empty array)"),
        RespValue::Array(Some(items)) => {
            for (i, item) in items.iter().enumerate() {
                println!("{prefix}{})", i + 1);
                print_resp_value(item, indent + 3);
            }
        }
    }
}
