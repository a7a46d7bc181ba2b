//! USDB CLI - command line interface for the USDB toolchain

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use ariadne::{Color, Label, Report, ReportKind, Source};
use clap::{Parser, Subcommand, ValueEnum};

use usdb_codegen::CodegenOptions;
use usdb_driver::{compile_with, CompilerError, Severity};
use usdb_flowchart::{generate_all_flowcharts, layout, Language};
use usdb_translator::translate_c_to_algo;

#[derive(Parser)]
#[command(name = "usdb")]
#[command(about = "USDB Algo to C compiler and companion tools", long_about = None)]
struct Cli {
    /// Log more (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile an Algo file to C
    Compile {
        /// Input file
        file: PathBuf,
        /// Output file, defaults to the input with a .c extension
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Capacity of STRING variables, terminator included
        #[arg(long, default_value_t = 256)]
        string_length: usize,
        /// Leave out the generated banner comment
        #[arg(long)]
        no_header: bool,
    },
    /// Check Algo files without generating code
    Check {
        /// Input file(s)
        files: Vec<PathBuf>,
    },
    /// Print the token stream of an Algo file
    Tokens {
        /// Input file
        file: PathBuf,
    },
    /// Parse an Algo file and output the AST as JSON
    Parse {
        /// Input file
        file: PathBuf,
        /// Pretty print the output
        #[arg(short, long)]
        pretty: bool,
    },
    /// Translate a C file to Algo
    Translate {
        /// Input file
        file: PathBuf,
        /// Directory holding files for local #include directives
        #[arg(long)]
        include_dir: Option<PathBuf>,
        /// Output file, defaults to stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Print the Algo line to C line map on stderr
        #[arg(long)]
        source_map: bool,
    },
    /// Build flowcharts and print them as JSON
    Flowchart {
        /// Input file
        file: PathBuf,
        /// Source language, guessed from the extension when absent
        #[arg(short, long, value_enum)]
        language: Option<LanguageArg>,
        /// Include a layout for every flowchart
        #[arg(long)]
        layout: bool,
        /// Pretty print the output
        #[arg(short, long)]
        pretty: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum LanguageArg {
    Algo,
    C,
}

impl From<LanguageArg> for Language {
    fn from(arg: LanguageArg) -> Self {
        match arg {
            LanguageArg::Algo => Language::Algo,
            LanguageArg::C => Language::C,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let ok = match cli.command {
        Commands::Compile {
            file,
            output,
            string_length,
            no_header,
        } => {
            let options = CodegenOptions {
                string_length,
                emit_header: !no_header,
            };
            cmd_compile(&file, output, &options)
        }
        Commands::Check { files } => cmd_check(&files),
        Commands::Tokens { file } => cmd_tokens(&file),
        Commands::Parse { file, pretty } => cmd_parse(&file, pretty),
        Commands::Translate {
            file,
            include_dir,
            output,
            source_map,
        } => cmd_translate(&file, include_dir.as_deref(), output, source_map),
        Commands::Flowchart {
            file,
            language,
            layout,
            pretty,
        } => cmd_flowchart(&file, language, layout, pretty),
    };

    if !ok {
        std::process::exit(1);
    }
}

fn read_source(file: &Path) -> Option<String> {
    match fs::read_to_string(file) {
        Ok(s) => Some(s),
        Err(e) => {
            eprintln!("Error reading {}: {}", file.display(), e);
            None
        }
    }
}

fn write_output(path: &Path, contents: &str) -> bool {
    match fs::write(path, contents) {
        Ok(()) => true,
        Err(e) => {
            eprintln!("Error writing {}: {}", path.display(), e);
            false
        }
    }
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> Option<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    match json {
        Ok(json) => Some(json),
        Err(e) => {
            eprintln!("Error serializing output: {}", e);
            None
        }
    }
}

fn cmd_compile(file: &Path, output: Option<PathBuf>, options: &CodegenOptions) -> bool {
    let Some(source) = read_source(file) else {
        return false;
    };

    let result = compile_with(&source, options);
    for diagnostic in result.diagnostics() {
        report(&source, file, diagnostic);
    }
    let Some(code) = result.c_code else {
        return false;
    };

    let out_path = output.unwrap_or_else(|| file.with_extension("c"));
    if !write_output(&out_path, &code) {
        return false;
    }
    println!("Compiled to {} ({} lines)", out_path.display(), code.lines().count());
    true
}

fn cmd_check(files: &[PathBuf]) -> bool {
    let mut all_ok = true;

    for file in files {
        let Some(source) = read_source(file) else {
            all_ok = false;
            continue;
        };

        let result = usdb_driver::check(&source);
        for diagnostic in result.diagnostics() {
            report(&source, file, diagnostic);
        }
        if result.success {
            println!(
                "✓ {} - {} warnings",
                file.display(),
                result.warnings.len()
            );
        } else {
            eprintln!("✗ {} - {} errors", file.display(), result.errors.len());
            all_ok = false;
        }
    }

    all_ok
}

fn cmd_tokens(file: &Path) -> bool {
    let Some(source) = read_source(file) else {
        return false;
    };

    let lexed = usdb_lexer::tokenize(&source);
    for token in &lexed.tokens {
        println!(
            "{:>4}:{:<3} {:<16} {}",
            token.location.line,
            token.location.column,
            format!("{:?}", token.kind),
            token.value
        );
    }
    for err in &lexed.errors {
        report(&source, file, &CompilerError::from(err));
    }
    !lexed.has_errors()
}

fn cmd_parse(file: &Path, pretty: bool) -> bool {
    let Some(source) = read_source(file) else {
        return false;
    };

    let output = usdb_parser::parse(&source);
    match (output.ast, output.errors.is_empty()) {
        (Some(program), true) => match to_json(&program, pretty) {
            Some(json) => {
                println!("{}", json);
                true
            }
            None => false,
        },
        _ => {
            for err in &output.errors {
                report(&source, file, &CompilerError::from(err));
            }
            false
        }
    }
}

fn cmd_translate(file: &Path, include_dir: Option<&Path>, output: Option<PathBuf>, source_map: bool) -> bool {
    let Some(source) = read_source(file) else {
        return false;
    };

    let files = match include_dir.map(load_workspace).transpose() {
        Ok(files) => files,
        Err(e) => {
            eprintln!("Error reading include directory: {}", e);
            return false;
        }
    };

    let result = translate_c_to_algo(&source, files.as_ref());
    for warning in &result.warnings {
        eprintln!("warning: {}", warning);
    }
    for err in &result.errors {
        eprintln!("error: {}", err);
    }
    if !result.success {
        return false;
    }

    if source_map {
        for (index, c_line) in result.source_map.iter().enumerate() {
            eprintln!("{} -> {}", index + 1, c_line);
        }
    }

    match output {
        Some(path) => write_output(&path, &result.algo_code),
        None => {
            print!("{}", result.algo_code);
            true
        }
    }
}

/// Every regular file of `dir`, keyed by file name
fn load_workspace(dir: &Path) -> std::io::Result<HashMap<String, String>> {
    let mut files = HashMap::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        match fs::read_to_string(&path) {
            Ok(contents) => {
                files.insert(name.to_string(), contents);
            }
            Err(e) => log::warn!("skipping {}: {}", path.display(), e),
        }
    }
    log::debug!("loaded {} workspace files from {}", files.len(), dir.display());
    Ok(files)
}

fn cmd_flowchart(file: &Path, language: Option<LanguageArg>, with_layout: bool, pretty: bool) -> bool {
    let Some(source) = read_source(file) else {
        return false;
    };

    let language = language.map(Language::from).unwrap_or_else(|| {
        match file.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("c") || ext.eq_ignore_ascii_case("h") => Language::C,
            _ => Language::Algo,
        }
    });

    let output = generate_all_flowcharts(&source, language);
    if let Some(error) = &output.error {
        eprintln!("error: {}", error);
    }

    let json = if with_layout {
        let layouts: BTreeMap<&str, usdb_flowchart::Layout> = output
            .main
            .iter()
            .map(|set| ("main", layout(set)))
            .chain(output.subroutines.iter().map(|(name, set)| (name.as_str(), layout(set))))
            .collect();
        to_json(
            &serde_json::json!({ "flowcharts": &output, "layouts": layouts }),
            pretty,
        )
    } else {
        to_json(&output, pretty)
    };

    match json {
        Some(json) => {
            println!("{}", json);
            output.success
        }
        None => false,
    }
}

fn report(source: &str, file: &Path, diagnostic: &CompilerError) {
    let name = file.to_string_lossy().to_string();
    let (kind, color) = match diagnostic.severity {
        Severity::Error => (ReportKind::Error, Color::Red),
        Severity::Warning => (ReportKind::Warning, Color::Yellow),
    };
    let range = diagnostic.span.byte_range();
    let result = Report::build(kind, name.clone(), range.start)
        .with_message(diagnostic.to_string())
        .with_label(
            Label::new((name.clone(), range))
                .with_message(&diagnostic.message)
                .with_color(color),
        )
        .finish()
        .eprint((name, Source::from(source)));
    if let Err(e) = result {
        log::warn!("could not render diagnostic: {}", e);
        eprintln!("{}", diagnostic);
    }
}
