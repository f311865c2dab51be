use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};
use memmap2::Mmap;

use rox::ast::Stmt;
use rox::ast_printer::AstPrinter;
use rox::error::RoxError;
use rox::interpreter::Interpreter;
use rox::parser::Parser;
use rox::resolver::Resolver;
use rox::scanner::Scanner;
use rox::token::Token;

#[derive(ClapParser, Debug)]
#[command(version, about = "Rox language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize {
        filename: Option<PathBuf>,

        /// Dump the token stream as JSON instead of one token per line
        #[arg(long)]
        json: bool,
    },

    /// Parses input from a file as a single expression and prints its AST
    Parse {
        filename: Option<PathBuf>,

        /// Dump the expression tree as JSON instead of the prefix form
        #[arg(long)]
        json: bool,
    },

    /// Evaluates input from a file as a single expression and prints the result
    Evaluate { filename: Option<PathBuf> },

    /// Runs input from a file as a Rox program
    Run { filename: Option<PathBuf> },

    /// Starts an interactive session sharing one interpreter across lines
    Repl,
}

/// Memory-maps a source file read-only.
fn map_file(filename: PathBuf) -> Result<Mmap> {
    info!("Mapping file: {:?}", filename);

    let file = File::open(&filename).context(format!("Failed to open file {:?}", filename))?;

    // SAFETY: the mapping is read-only and private to this run; sources are
    // not expected to be truncated while the interpreter holds them.
    let mmap =
        unsafe { Mmap::map(&file) }.context(format!("Failed to map file {:?}", filename))?;

    info!("Mapped {} bytes from {:?}", mmap.len(), filename);

    Ok(mmap)
}

/// Scans a whole buffer, reporting lex errors to stderr as they come.
/// Returns every good token plus whether anything failed.
fn scan_all(src: &[u8]) -> (Vec<Token<'_>>, bool) {
    let mut tokens: Vec<Token<'_>> = Vec::new();
    let mut failed = false;

    for token in Scanner::new(src) {
        match token {
            Ok(token) => tokens.push(token),

            Err(e) => {
                failed = true;

                debug!("Scan debug: {}", e);

                eprintln!("{}", e);
            }
        }
    }

    (tokens, failed)
}

/// 65 for static (scan/parse/resolve) failures, 70 for runtime ones.
fn exit_code(error: &RoxError) -> i32 {
    if error.is_static() {
        65
    } else {
        70
    }
}

fn init_logger() -> Result<()> {
    // Create or open the log file
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    // Configure env_logger to write to file with module and source line
    Builder::new()
        .format(|buf, record| {
            // Strip 'rox::' from module path
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("rox::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));

            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug) // Default to Debug, override with RUST_LOG
        .init();

    info!("Logger initialized, writing to app.log");

    Ok(())
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    // Initialize logger only if --log flag is provided
    if args.log {
        init_logger()?;
    } else {
        // Initialize a minimal logger to avoid "no logger" errors
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    match args.commands {
        Commands::Tokenize { filename, json } => match filename {
            Some(filename) => {
                info!("Running Tokenize subcommand");

                let buf = map_file(filename)?;
                let mut tokens: Vec<Token<'_>> = Vec::new();
                let mut tokenized = true;

                for token in Scanner::new(&buf) {
                    match token {
                        Ok(token) => {
                            debug!("Scanned token: {}", token);

                            if json {
                                tokens.push(token);
                            } else {
                                println!("{}", token);
                            }
                        }

                        Err(e) => {
                            tokenized = false;

                            debug!("Tokenization debug: {}", e);

                            eprintln!("{}", e);
                        }
                    }
                }

                if !tokenized {
                    debug!("Tokenization failed, exiting with code 65");

                    std::process::exit(65);
                }

                if json {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&tokens)
                            .context("Failed to serialize tokens")?
                    );
                }

                info!("Tokenization completed successfully");
            }
            None => {
                info!("No filepath provided for Tokenize");

                println!("No input filepath was provided. Exiting...");

                std::process::exit(0);
            }
        },

        Commands::Parse { filename, json } => match filename {
            Some(filename) => {
                info!("Running Parse subcommand");

                let buf = map_file(filename)?;
                let (tokens, lex_failed) = scan_all(&buf);

                if lex_failed {
                    std::process::exit(65);
                }

                let mut parser = Parser::new(&tokens);

                match parser.parse_expression() {
                    Ok(expr) => {
                        info!("Expression parsed successfully");

                        if json {
                            println!(
                                "{}",
                                serde_json::to_string_pretty(&expr)
                                    .context("Failed to serialize expression")?
                            );
                        } else {
                            let printer = AstPrinter;
                            let ast_str = printer.print(&expr);

                            debug!("AST: {}", ast_str);
                            println!("{}", ast_str);
                        }
                    }

                    Err(e) => {
                        debug!("Parse debug: {}", e);
                        eprintln!("{}", e);
                        std::process::exit(exit_code(&e));
                    }
                }

                info!("Parse subcommand completed");
            }
            None => {
                info!("No filepath provided for Parse");
                println!("No input filepath was provided. Exiting...");
                std::process::exit(0);
            }
        },

        Commands::Evaluate { filename } => match filename {
            Some(filename) => {
                info!("Running Evaluate subcommand");

                let buf = map_file(filename)?;
                let (tokens, lex_failed) = scan_all(&buf);

                if lex_failed {
                    std::process::exit(65);
                }

                let mut parser = Parser::new(&tokens);

                match parser.parse_expression() {
                    Ok(expr) => {
                        info!("Expression parsed successfully");

                        let mut interpreter = Interpreter::new();

                        match interpreter.evaluate_expression(&expr) {
                            Ok(value) => {
                                debug!("Evaluated to: {}", value);
                                println!("{}", value);
                            }

                            Err(e) => {
                                debug!("Evaluation debug: {}", e);
                                eprintln!("{}", e);
                                std::process::exit(exit_code(&e));
                            }
                        }
                    }

                    Err(e) => {
                        debug!("Parse debug: {}", e);
                        eprintln!("{}", e);
                        std::process::exit(exit_code(&e));
                    }
                }

                info!("Evaluate subcommand completed");
            }

            None => {
                info!("No filepath provided for Evaluate");
                println!("No input filepath was provided. Exiting...");
                std::process::exit(0);
            }
        },

        Commands::Run { filename } => match filename {
            Some(filename) => {
                info!("Running Run subcommand");

                let buf = map_file(filename)?;

                info!("Provided input:\n{}", String::from_utf8_lossy(&buf));

                let (tokens, lex_failed) = scan_all(&buf);

                let mut program: Vec<Stmt<'_>> = Vec::new();
                let mut parse_failed = false;

                for declaration in Parser::new(&tokens) {
                    match declaration {
                        Ok(stmt) => {
                            debug!("Parsed declaration: {:?}", stmt);

                            program.push(stmt);
                        }

                        Err(e) => {
                            parse_failed = true;

                            debug!("Parse debug: {}", e);

                            eprintln!("{}", e);
                        }
                    }
                }

                if lex_failed || parse_failed {
                    debug!("Static errors while scanning/parsing, exiting with code 65");

                    std::process::exit(65);
                }

                info!("Parsed {} declaration(s)", program.len());

                let mut interpreter = Interpreter::new();
                let mut resolver = Resolver::new(&mut interpreter);

                resolver.resolve(&program);

                let resolve_errors = resolver.into_errors();

                if !resolve_errors.is_empty() {
                    for e in &resolve_errors {
                        eprintln!("{}", e);
                    }

                    debug!("Resolution failed, exiting with code 65");

                    std::process::exit(65);
                }

                match interpreter.interpret(&program) {
                    Ok(()) => {
                        info!("Program executed successfully");
                    }

                    Err(e) => {
                        debug!("Runtime debug: {}", e);
                        eprintln!("{}", e);
                        std::process::exit(exit_code(&e));
                    }
                }
            }

            None => {
                info!("No filepath provided for Run");
                println!("No input filepath was provided. Exiting...");
                std::process::exit(0);
            }
        },

        Commands::Repl => {
            info!("Starting REPL session");

            let mut interpreter = Interpreter::new();
            let stdin = io::stdin();
            let mut line = String::new();

            loop {
                print!("> ");
                io::stdout().flush().context("Failed to flush stdout")?;

                line.clear();

                if stdin
                    .read_line(&mut line)
                    .context("Failed to read from stdin")?
                    == 0
                {
                    break; // EOF
                }

                if line.trim().is_empty() {
                    continue;
                }

                // Each line's source, tokens and tree are leaked on purpose:
                // closures defined on one line must stay callable from later
                // lines, and they borrow all three.
                let source: &'static str = Box::leak(line.clone().into_boxed_str());

                let (tokens, lex_failed) = scan_all(source.as_bytes());

                if lex_failed {
                    continue;
                }

                let tokens: &'static [Token<'static>] = Box::leak(tokens.into_boxed_slice());

                let mut program: Vec<Stmt<'static>> = Vec::new();
                let mut parse_failed = false;

                for declaration in Parser::new(tokens) {
                    match declaration {
                        Ok(stmt) => program.push(stmt),

                        Err(e) => {
                            parse_failed = true;

                            eprintln!("{}", e);
                        }
                    }
                }

                if parse_failed {
                    continue;
                }

                let program: &'static [Stmt<'static>] = Box::leak(program.into_boxed_slice());

                let mut resolver = Resolver::new(&mut interpreter);

                resolver.resolve(program);

                let resolve_errors = resolver.into_errors();

                if !resolve_errors.is_empty() {
                    for e in &resolve_errors {
                        eprintln!("{}", e);
                    }

                    continue;
                }

                if let Err(e) = interpreter.interpret(program) {
                    eprintln!("{}", e);
                }
            }

            info!("REPL session ended");
        }
    }

    Ok(())
}
