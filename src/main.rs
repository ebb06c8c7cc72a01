use anyhow::{Context, Result, bail};
use document_cluster::balancer::service::LoadBalancer;
use document_cluster::server::protocol::{MAX_DOC_SIZE, Request, ResponseSink, TranscriptWriter};
use std::fs;
use std::io::{self, Read as _};

/// One line of the operation script.
enum Operation {
    AddServer { id: u32, cache_size: usize },
    RemoveServer { id: u32 },
    Request(Request),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    let mut enable_vnodes = false;
    let mut script_path: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--vnodes" => {
                enable_vnodes = true;
                i += 1;
            }
            "--help" | "-h" => {
                eprintln!("Usage: {} [--vnodes] [SCRIPT]", args[0]);
                eprintln!("Reads an operation script (SCRIPT file or stdin) and prints");
                eprintln!("the response transcript on stdout. Operations, one per line:");
                eprintln!("  add_server <id> <cache_size>");
                eprintln!("  remove_server <id>");
                eprintln!("  edit \"<doc_name>\" \"<doc_content>\"");
                eprintln!("  get \"<doc_name>\"");
                return Ok(());
            }
            flag if flag.starts_with('-') => bail!("unknown flag {flag:?}; see --help"),
            path => {
                if script_path.is_some() {
                    bail!("more than one script path given");
                }
                script_path = Some(path.to_string());
                i += 1;
            }
        }
    }

    let script = match &script_path {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("reading script {path}"))?
        }
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("reading script from stdin")?;
            buffer
        }
    };

    tracing::info!(vnodes = enable_vnodes, "starting cluster");

    let mut balancer = LoadBalancer::new(enable_vnodes);
    let mut transcript = TranscriptWriter::new(io::stdout().lock());

    for (index, raw_line) in script.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let operation =
            parse_line(line).with_context(|| format!("script line {}: {line}", index + 1))?;
        match operation {
            Operation::AddServer { id, cache_size } => {
                balancer.add_server(id, cache_size, &mut transcript)
            }
            Operation::RemoveServer { id } => balancer.remove_server(id, &mut transcript),
            Operation::Request(request) => {
                if let Some(response) = balancer.forward_request(request, &mut transcript) {
                    transcript.deliver(&response);
                }
            }
        }
    }

    tracing::info!("{}", balancer.describe().trim_end());

    Ok(())
}

fn parse_line(line: &str) -> Result<Operation> {
    let (command, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();
    match command {
        "add_server" => {
            let mut parts = rest.split_whitespace();
            let id = parts
                .next()
                .context("add_server needs a server id")?
                .parse()
                .context("server id must be an unsigned integer")?;
            let cache_size: usize = parts
                .next()
                .context("add_server needs a cache size")?
                .parse()
                .context("cache size must be an unsigned integer")?;
            if cache_size == 0 {
                bail!("cache size must be at least 1");
            }
            if parts.next().is_some() {
                bail!("trailing arguments after add_server");
            }
            Ok(Operation::AddServer { id, cache_size })
        }
        "remove_server" => {
            let mut parts = rest.split_whitespace();
            let id = parts
                .next()
                .context("remove_server needs a server id")?
                .parse()
                .context("server id must be an unsigned integer")?;
            if parts.next().is_some() {
                bail!("trailing arguments after remove_server");
            }
            Ok(Operation::RemoveServer { id })
        }
        "edit" => {
            let (doc_name, rest) = parse_quoted(rest)?;
            let (doc_content, rest) = parse_quoted(rest)?;
            if !rest.trim().is_empty() {
                bail!("trailing arguments after edit");
            }
            if doc_content.len() > MAX_DOC_SIZE {
                bail!("document content exceeds {MAX_DOC_SIZE} bytes");
            }
            Ok(Operation::Request(Request::Edit {
                doc_name,
                doc_content,
            }))
        }
        "get" => {
            let (doc_name, rest) = parse_quoted(rest)?;
            if !rest.trim().is_empty() {
                bail!("trailing arguments after get");
            }
            Ok(Operation::Request(Request::Get { doc_name }))
        }
        other => bail!("unknown operation {other:?}"),
    }
}

/// Splits a leading double-quoted string off `input`, returning the string
/// and the remainder.
fn parse_quoted(input: &str) -> Result<(String, &str)> {
    let input = input.trim_start();
    let Some(inner) = input.strip_prefix('"') else {
        bail!("expected a quoted string");
    };
    let Some(end) = inner.find('"') else {
        bail!("unterminated quoted string");
    };
    Ok((inner[..end].to_string(), &inner[end + 1..]))
}
