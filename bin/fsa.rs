use std::process::ExitCode;

use fsa::prelude::*;

use owo_colors::OwoColorize;
use tracing::{debug, error, info, trace};
use tracing_subscriber::{filter, prelude::*};

use clap::{Arg, ArgAction, ArgMatches, Command};

fn output_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("save-to")
                .long("save-to")
                .value_name("JSON")
                .help("write the definition to the given JSON file"),
        )
        .arg(
            Arg::new("emit-dot")
                .long("emit-dot")
                .value_name("FILE")
                .help("write the graphviz representation to the given file"),
        )
        .arg(
            Arg::new("table")
                .long("table")
                .action(ArgAction::SetTrue)
                .help("print the transition table"),
        )
        .arg(
            Arg::new("determinize")
                .long("determinize")
                .action(ArgAction::SetTrue)
                .help("replace the automaton by an equivalent deterministic one"),
        )
        .arg(
            Arg::new("minimize")
                .long("minimize")
                .action(ArgAction::SetTrue)
                .help("replace the automaton by its minimal deterministic equivalent"),
        )
        .arg(
            Arg::new("word")
                .short('w')
                .long("word")
                .action(ArgAction::Append)
                .help("check membership of a word, symbols are separated by commas or given one character each"),
        )
}

fn cli() -> clap::Command {
    Command::new("fsa")
    .about("Builds, reconstructs and validates finite automata")
    .subcommand_required(true)
    .arg(
        Arg::new("verbosity")
        .short('v')
        .long("verbosity")
        .num_args(0..=1)
        .require_equals(true)
        .value_parser(["info", "debug", "trace"])
        .default_missing_value("info")
    )
    .subcommand(output_args(
        Command::new("build")
        .about("builds an automaton from flat arguments")
        .arg(Arg::new("type").long("type").required(true).value_parser(["dfa", "nfa"]))
        .arg(Arg::new("alphabet").long("alphabet").required(true).help("comma separated symbols, e.g. 0,1"))
        .arg(Arg::new("states").long("states").required(true).help("comma separated states, e.g. q0,q1"))
        .arg(Arg::new("initial").long("initial").required(true))
        .arg(Arg::new("final").long("final").default_value("").help("comma separated final states"))
        .arg(
            Arg::new("transitions")
            .long("transitions")
            .num_args(1..)
            .action(ArgAction::Append)
            .help("records of the form state,symbol,target (nfa records may list several targets)")
        )
    ))
    .subcommand(output_args(
        Command::new("import-dot")
        .about("reconstructs an automaton from a graphviz file")
        .arg(Arg::new("file").required(true))
        .arg(
            Arg::new("sentinel")
            .long("sentinel")
            .action(ArgAction::Append)
            .help("additional name of the invisible node that points to the initial state")
        )
    ))
    .subcommand(output_args(
        Command::new("load")
        .about("loads an automaton from a JSON file")
        .arg(Arg::new("file").required(true))
    ))
}

fn setup_logging(matches: &ArgMatches) {
    let level = match matches
        .try_get_one::<String>("verbosity")
        .ok()
        .flatten()
        .map(|m| m.as_str())
    {
        Some("trace") => filter::LevelFilter::TRACE,
        Some("debug") => filter::LevelFilter::DEBUG,
        Some("info") => filter::LevelFilter::INFO,
        _ => filter::LevelFilter::WARN,
    };

    let stderr_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(stderr_log.with_filter(level))
        .init();

    trace!("setup {level} logging");
}

fn string_arg<'a>(matches: &'a ArgMatches, id: &str) -> &'a str {
    matches
        .get_one::<String>(id)
        .map(String::as_str)
        .unwrap_or_default()
}

/// Splits a word into symbols, at commas if there are any and into characters otherwise.
fn parse_word(input: &str) -> Vec<Symbol> {
    if input.contains(',') {
        input.split(',').map(|s| Symbol::from(s.trim())).collect()
    } else {
        input.chars().map(|c| Symbol::new(c.to_string())).collect()
    }
}

fn obtain_definition(name: &str, matches: &ArgMatches) -> Result<Definition, Box<dyn std::error::Error>> {
    Ok(match name {
        "build" => {
            let kind: Kind = string_arg(matches, "type").parse()?;
            FlatDefinition {
                kind,
                alphabet: split_list(string_arg(matches, "alphabet")),
                states: split_list(string_arg(matches, "states")),
                initial: string_arg(matches, "initial").trim().into(),
                final_states: split_list(string_arg(matches, "final")),
                records: matches
                    .get_many::<String>("transitions")
                    .into_iter()
                    .flatten()
                    .cloned()
                    .collect(),
            }
            .build()?
        }
        "import-dot" => {
            let path = string_arg(matches, "file");
            let config = matches
                .get_many::<String>("sentinel")
                .into_iter()
                .flatten()
                .fold(DotConfig::default(), |config, s| config.with_sentinel(s));
            debug!("reconstructing automaton from {path}");
            Definition::from_dot_with(&std::fs::read_to_string(path)?, &config)?
        }
        "load" => codec::load(string_arg(matches, "file"))?,
        _ => unreachable!(),
    })
}

fn run(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let Some((name, sub_matches)) = matches.subcommand() else {
        unreachable!()
    };

    let mut definition = obtain_definition(name, sub_matches)?;
    info!(
        "obtained {} with {} states over {} symbols",
        definition.kind(),
        definition.size(),
        definition.alphabet().len()
    );

    let flag = |id: &str| sub_matches.get_flag(id);
    if flag("determinize") || flag("minimize") {
        let instance = definition.instantiate()?;
        let start = std::time::Instant::now();
        let dfa = match flag("minimize") {
            true => instance.canonicalize(),
            false => instance.to_deterministic(),
        };
        info!("conversion took {}µs", start.elapsed().as_micros());
        definition = dfa.to_definition()?;
    }

    if flag("table") {
        println!("{}", definition.transition_table());
    }

    if let Some(path) = sub_matches.get_one::<String>("save-to") {
        codec::save(&definition, path)?;
        println!("saved {} to {path}", definition.kind());
    }

    if let Some(path) = sub_matches.get_one::<String>("emit-dot") {
        std::fs::write(path, definition.dot_representation())?;
        println!("wrote graph to {path}");
    }

    let words = sub_matches
        .get_many::<String>("word")
        .into_iter()
        .flatten()
        .collect::<Vec<_>>();
    if !words.is_empty() {
        let automaton = definition.instantiate()?;
        for w in words {
            let symbols = parse_word(w);
            if let Some(unknown) = symbols
                .iter()
                .find(|a| !definition.alphabet().contains(*a))
            {
                println!("{w:?}: {} `{unknown}`", "unknown symbol".yellow());
                continue;
            }
            match automaton.accepts(&symbols) {
                true => println!("{w:?}: {}", "accepted".green()),
                false => println!("{w:?}: {}", "rejected".red()),
            }
        }
    }

    Ok(())
}

pub fn main() -> ExitCode {
    let matches = cli().get_matches();

    setup_logging(&matches);

    match run(&matches) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("{}: {e}", "error".red());
            ExitCode::FAILURE
        }
    }
}
