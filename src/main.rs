use std::{
    io::{self, Read},
    path::{Path, PathBuf},
};

use astrolabe::{
    StoreConfig,
    cli::{self, CliError, RunOptions, SqlFormat},
};
use clap::{ArgAction, Args, Parser as ClapParser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(ClapParser)]
#[command(name = "qastro")]
#[command(about = "Astrolabe - compile OSM selection chains to SQL and export the result as OSM XML")]
#[command(version)]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ConnectionArgs {
    /// Database host
    #[arg(short = 's', long = "server", env = "PGHOST", default_value = "127.0.0.1")]
    host: String,

    /// Database port
    #[arg(short, long, env = "PGPORT", default_value_t = 5432)]
    port: u16,

    /// Database name
    #[arg(short, long, env = "PGDATABASE", default_value = "osm")]
    database: String,

    /// Database user
    #[arg(short, long, env = "PGUSER")]
    username: Option<String>,

    /// Database password
    #[arg(short = 'w', long, env = "PGPASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Pool size, which also bounds concurrent element look-ups
    #[arg(long, env = "QASTRO_MAX_CONNECTIONS", default_value_t = 15)]
    max_connections: u32,
}

impl From<ConnectionArgs> for StoreConfig {
    fn from(args: ConnectionArgs) -> Self {
        StoreConfig {
            host: args.host,
            port: args.port,
            database: args.database,
            username: args.username,
            password: args.password,
            max_connections: args.max_connections,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program against the database and write OSM XML
    Run {
        /// Astrolabe program file
        input: PathBuf,

        /// Where to write the OSM XML document
        output: PathBuf,

        /// Session id used in view names (random if not given)
        #[arg(long)]
        session: Option<String>,

        #[command(flatten)]
        connection: ConnectionArgs,
    },

    /// Print the SQL a program compiles to
    Sql {
        /// Program file (reads from stdin if not provided)
        input: Option<PathBuf>,

        /// Print the script as JSON
        #[arg(long)]
        json: bool,

        /// Session id used in view names (random if not given)
        #[arg(long)]
        session: Option<String>,
    },

    /// Validate a program without connecting to the database
    Check {
        /// Program file (reads from stdin if not provided)
        input: Option<PathBuf>,
    },

    /// Create the OSM tables if they do not exist
    Init {
        #[command(flatten)]
        connection: ConnectionArgs,
    },

    /// List documentation topics, or show one
    Docs {
        /// Topic name
        topic: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Run {
            input,
            output,
            session,
            connection,
        } => run(input, output, session, connection).await,
        Commands::Sql {
            input,
            json,
            session,
        } => run_sql(input, json, session),
        Commands::Check { input } => run_check(input),
        Commands::Init { connection } => cli::execute_init(&StoreConfig::from(connection)).await,
        Commands::Docs { topic: None } => {
            print!("{}", cli::get_docs_overview());
            Ok(())
        }
        Commands::Docs { topic: Some(topic) } => cli::get_doc_topic(&topic).map(|content| print!("{}", content)),
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

async fn run(
    input: PathBuf,
    output: PathBuf,
    session: Option<String>,
    connection: ConnectionArgs,
) -> Result<(), CliError> {
    let options = RunOptions {
        input,
        output,
        store: connection.into(),
        session,
    };
    let summary = cli::execute_run(&options).await?;
    eprintln!(
        "Wrote {} elements to {}",
        summary.elements,
        options.output.display()
    );
    Ok(())
}

fn run_sql(input: Option<PathBuf>, json: bool, session: Option<String>) -> Result<(), CliError> {
    let text = read_input(input)?;
    let session = session.unwrap_or_else(cli::new_session);
    let format = if json { SqlFormat::Json } else { SqlFormat::Text };
    print!("{}", cli::render_sql(&text, &session, format)?);
    if json {
        println!();
    }
    Ok(())
}

fn run_check(input: Option<PathBuf>) -> Result<(), CliError> {
    let text = read_input(input)?;
    let report = cli::execute_check(&text)?;
    println!(
        "Program is valid: {} calls, {} statements",
        report.calls, report.statements
    );
    Ok(())
}

fn read_input(input: Option<PathBuf>) -> Result<String, CliError> {
    match input {
        Some(path) => cli::read_program(&path),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .map_err(CliError::io(Path::new("<stdin>")))?;
            Ok(buffer)
        }
        None => Err(CliError::NoInput),
    }
}
