//! Punto de entrada ("driver").
//!
//! Este módulo expone una CLI mínima sobre el front end: carga archivos,
//! los somete a análisis léxico y, opcionalmente, expande macros.

use anyhow::{self, bail, Context};
use clap::{self, crate_version, value_parser, Arg, ArgAction, Command};
use frontend::{
    error::Diagnostics,
    expand,
    lex::{Lexer, Token},
    source::{Located, Source},
};

use std::{
    path::{Path, PathBuf},
    rc::Rc,
};
use tracing::{debug, info};

fn main() -> anyhow::Result<()> {
    init_tracing();

    // Parsing de CLI
    let args = Command::new("fab front end")
        .version(crate_version!())
        .arg(
            Arg::new("tokens")
                .short('t')
                .long("tokens")
                .action(ArgAction::SetTrue)
                .help("Dump located tokens"),
        )
        .arg(
            Arg::new("macro")
                .short('m')
                .long("macro")
                .value_name("FILE")
                .takes_value(true)
                .value_parser(value_parser!(PathBuf))
                .help("Expand a macro file and print the result"),
        )
        .arg(
            Arg::new("arg")
                .short('a')
                .long("arg")
                .value_name("VALUE")
                .takes_value(true)
                .action(ArgAction::Append)
                .requires("macro")
                .help("Positional macro argument (repeatable)"),
        )
        .arg(
            Arg::new("files")
                .value_name("FILE")
                .multiple_values(true)
                .value_parser(value_parser!(PathBuf))
                .help("Source files to lex"),
        )
        .get_matches();

    let dump = args.get_flag("tokens");

    if let Some(path) = args.get_one::<PathBuf>("macro") {
        let macro_args: Vec<&str> = args
            .get_many::<String>("arg")
            .map(|values| values.map(String::as_str).collect())
            .unwrap_or_default();

        let source = load(path)?;
        let text = match expand::expand(&source, &macro_args) {
            Ok(text) => text,
            Err(error) => {
                eprint!("{}", Diagnostics::from(error).kind("Macro error"));
                bail!("Failed to expand macro: {}", path.display());
            }
        };

        print!("{}", text);
        if dump {
            lex(&Source::new(source.name(), text), true)?;
        }
    }

    let files = args
        .get_many::<PathBuf>("files")
        .into_iter()
        .flatten();

    for path in files {
        let source = load(path)?;
        lex(&source, dump)?;
    }

    Ok(())
}

/// Habilita logging únicamente si `RUST_LOG` está definida.
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
            .with(EnvFilter::from_default_env())
            .init();
    }
}

fn load(path: &Path) -> anyhow::Result<Rc<Source>> {
    Source::load(path).with_context(|| format!("Failed to read: {}", path.display()))
}

fn lex(source: &Rc<Source>, dump: bool) -> anyhow::Result<Vec<Located<Token>>> {
    match Lexer::new(source).try_exhaustive() {
        Ok(tokens) => {
            info!(file = source.name(), tokens = tokens.len(), "lexed");

            if dump {
                for token in &tokens {
                    println!("{}: {}", token.location(), token.val());
                }
            }

            Ok(tokens)
        }

        Err(errors) => {
            debug!(file = source.name(), errors = errors.len(), "lexical errors");
            eprint!("{}", Diagnostics::from(errors).kind("Lexical error"));
            bail!("Failed to lex: {}", source.name())
        }
    }
}
