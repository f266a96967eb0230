use anyhow::{Context, Result, bail};
use blockwork_config::Config;
use blockwork_engine::{BlockFactory, BlockView, Options, Value};
use std::{env, path::PathBuf, process};

const USAGE: &str = "Usage: blockwork-cli [--config <path>] <type> [data.toml]";

#[derive(Debug, Default, PartialEq)]
struct Args {
    config_path: Option<PathBuf>,
    type_name: String,
    data_path: Option<PathBuf>,
}

fn parse_args(args: &[String]) -> Result<Args> {
    let mut parsed = Args::default();
    let mut positional = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                let path = iter.next().context("--config needs a path")?;
                parsed.config_path = Some(PathBuf::from(path));
            }
            flag if flag.starts_with('-') => bail!("Unknown flag '{flag}'"),
            _ => positional.push(arg.clone()),
        }
    }

    let mut positional = positional.into_iter();
    parsed.type_name = positional.next().context("Missing block type")?;
    parsed.data_path = positional.next().map(PathBuf::from);
    if let Some(extra) = positional.next() {
        bail!("Unexpected argument '{extra}'");
    }

    Ok(parsed)
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from_path(path)
            .with_context(|| format!("Failed to load config file '{}'", path.display()))?
            .with_context(|| format!("Config file '{}' does not exist", path.display())),
        // Without a config file only the core types are available
        None => Ok(Config::load()
            .context("Failed to load config file")?
            .unwrap_or_default()),
    }
}

fn load_data(path: Option<&PathBuf>) -> Result<Value> {
    let Some(path) = path else {
        return Ok(Value::Null);
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read data file '{}'", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse data file '{}'", path.display()))
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => format!("{s:?}"),
        Value::Null => "null".to_string(),
        other => other
            .coerce_to_string()
            .unwrap_or_else(|| other.describe()),
    }
}

/// One line per view, children indented below their parent.
fn render_view(view: &BlockView, depth: usize, lines: &mut Vec<String>) {
    let name = view.var("name").and_then(Value::as_str).unwrap_or_default();
    let block_type = view
        .var("block_prefixes")
        .and_then(Value::as_list)
        .and_then(|prefixes| prefixes.iter().rev().nth(1))
        .and_then(Value::as_str)
        .unwrap_or_default();
    let indent = "  ".repeat(depth);

    if view.children.is_empty() {
        let value = view.var("value").map(format_value).unwrap_or_default();
        lines.push(format!("{indent}{name} ({block_type}) = {value}"));
    } else {
        lines.push(format!("{indent}{name} ({block_type})"));
        for child in view.children.values() {
            render_view(child, depth + 1, lines);
        }
    }
}

fn run(args: &Args, config: &Config) -> Result<Vec<String>> {
    let factory = BlockFactory::from_config(config).context("Failed to register block types")?;
    let data = load_data(args.data_path.as_ref())?;

    log::info!("Building a \"{}\" block", args.type_name);
    let block = factory
        .create(args.type_name.as_str(), data, Options::new())
        .with_context(|| format!("Failed to build a \"{}\" block", args.type_name))?;
    let view = block.create_view().context("Failed to build the view")?;

    let mut lines = Vec::new();
    render_view(&view, 0, &mut lines);
    Ok(lines)
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let args = match parse_args(&args) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("{USAGE}");
            process::exit(1);
        }
    };

    let config = load_config(args.config_path.as_ref())?;

    let level = config.engine.log_level.as_deref().unwrap_or("warn");
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    for line in run(&args, &config)? {
        println!("{line}");
    }
    Ok(())
}
