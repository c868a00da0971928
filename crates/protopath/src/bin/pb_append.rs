//! `pb-append`: append values to a repeated field of a message.
//!
//! Usage:
//!   pb-append <schema.json> <type> <path> <element>...
//!
//! An existing message may be supplied on stdin as JSON; with empty stdin a
//! new message of `<type>` is created. The resulting message is printed to
//! stdout as JSON and the new array length to stderr.
//!
//! Set `RUST_LOG=debug` to trace registry loading and the append.

use std::io::{self, Read, Write};

use protopath::{AppendCommand, MemoryStore, MessageStore};
use protopath_reflect::codec::json;
use protopath_reflect::{ProtoFactory, TypeRegistry};
use tracing::debug;
use tracing_subscriber::EnvFilter;

const KEY: &[u8] = b"stdin";

fn fail(msg: impl std::fmt::Display) -> ! {
    eprintln!("{msg}");
    std::process::exit(1);
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 4 {
        fail("usage: pb-append <schema.json> <type> <path> <element>...");
    }

    let schema = std::fs::read_to_string(&args[1])
        .unwrap_or_else(|e| fail(format!("cannot read {}: {e}", args[1])));
    let registry = TypeRegistry::from_json_str(&schema).unwrap_or_else(|e| fail(e));
    let pool = registry.build().unwrap_or_else(|e| fail(e));
    debug!(types = pool.len(), "schema loaded");
    let factory = ProtoFactory::new(pool);

    let mut input = Vec::new();
    if let Err(e) = io::stdin().read_to_end(&mut input) {
        fail(e);
    }
    let mut store = MemoryStore::new();
    if !input.iter().all(u8::is_ascii_whitespace) {
        let msg = factory
            .create_from(&args[2], &input)
            .unwrap_or_else(|e| fail(format!("ERR {e}")));
        store.insert(KEY.to_vec(), msg);
    }

    let mut argv: Vec<&[u8]> = vec![&b"pb-append"[..], KEY];
    argv.extend(args[2..].iter().map(|a| a.as_bytes()));
    let len = AppendCommand::new(&factory)
        .execute(&mut store, &argv)
        .unwrap_or_else(|e| fail(e.reply_text()));

    let Some(msg) = store.get(KEY) else {
        fail("ERR no message stored");
    };
    let text = serde_json::to_string_pretty(&json::to_json(msg)).unwrap_or_else(|e| fail(e));
    let mut stdout = io::stdout();
    if let Err(e) = writeln!(stdout, "{text}") {
        fail(e);
    }
    eprintln!("{len}");
}
