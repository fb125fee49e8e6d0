//! Command-line interface for Debian package inspection.
//!
//! This CLI tool lists contents, reads info and control files, and extracts
//! `.deb` packages using the system's dpkg tools.

use clap::{Parser, Subcommand};
use debinspect::{Analyst, AnalystOptions};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::error::Error;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

type CliResult = Result<(), Box<dyn Error>>;

#[derive(Parser)]
#[command(name = "debinspect")]
#[command(version, about = "Inspect Debian packages from the command line", long_about = None)]
struct Cli {
    /// dpkg-deb executable
    #[arg(long, global = true, default_value = "dpkg-deb")]
    dpkg_deb: PathBuf,

    /// dpkg executable
    #[arg(long, global = true, default_value = "dpkg")]
    dpkg: PathBuf,

    /// Time limit for each tool invocation in seconds (0 disables)
    #[arg(long, global = true, default_value = "30")]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the files, directories and links in a package
    Contents {
        /// Package file
        package: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one entry of a package by its installed path
    Entry {
        /// Package file
        package: PathBuf,

        /// Absolute path, with trailing slash for directories
        path: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show package info and control fields
    Info {
        /// Package file
        package: PathBuf,

        /// Print only these fields
        #[arg(long = "field")]
        fields: Vec<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the packaging files from the DEBIAN directory
    Control {
        /// Package file
        package: PathBuf,

        /// Directory to extract control files into (kept afterwards)
        #[arg(long)]
        scratch: Option<PathBuf>,

        /// Print the text of this packaging file
        #[arg(long)]
        file: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Extract a package's filesystem tree
    Extract {
        /// Package file
        package: PathBuf,

        /// Output directory
        #[arg(short, long)]
        out: PathBuf,

        /// Print only the extracted file for this installed path
        #[arg(long)]
        find: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let options = AnalystOptions {
        dpkg_deb: cli.dpkg_deb,
        dpkg: cli.dpkg,
        timeout: (cli.timeout_secs > 0).then(|| Duration::from_secs(cli.timeout_secs)),
        memoize: true,
    };
    tracing::debug!("analyst options: {:?}", options);

    let result = match cli.command {
        Commands::Contents { package, json } => handle_contents(package, options, json).await,
        Commands::Entry {
            package,
            path,
            json,
        } => handle_entry(package, options, path, json).await,
        Commands::Info {
            package,
            fields,
            json,
        } => handle_info(package, options, fields, json).await,
        Commands::Control {
            package,
            scratch,
            file,
            json,
        } => handle_control(package, options, scratch, file, json).await,
        Commands::Extract {
            package,
            out,
            find,
            json,
        } => handle_extract(package, options, out, find, json).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn handle_contents(package: PathBuf, options: AnalystOptions, json: bool) -> CliResult {
    let analyst = Analyst::with_options(package, options);
    let contents = analyst.contents().await?;

    if json {
        return print_json(&*contents);
    }
    for entry in contents.iter() {
        println!("{}", entry);
    }
    Ok(())
}

async fn handle_entry(
    package: PathBuf,
    options: AnalystOptions,
    path: String,
    json: bool,
) -> CliResult {
    let analyst = Analyst::with_options(package, options);
    let contents = analyst.contents().await?;
    let entry = contents
        .find_by_path(&path)
        .ok_or_else(|| format!("no entry {} in {}", path, analyst.package_file().display()))?;

    if json {
        let mut value = serde_json::to_value(entry)?;
        if let (Some(object), Ok(kind)) = (value.as_object_mut(), entry.kind()) {
            object.insert("kind".to_string(), serde_json::to_value(kind)?);
        }
        return print_json(&value);
    }

    println!("path:        {}", entry.path);
    match entry.kind() {
        Ok(kind) => println!("kind:        {:?}", kind),
        Err(e) => println!("kind:        {}", e),
    }
    println!("permissions: {}", entry.permission_string);
    println!("ownership:   {}", entry.ownership);
    println!("size:        {}", entry.size_bytes);
    println!("modified:    {}", entry.modified_at);
    if let Some(target) = &entry.link_target {
        println!("target:      {}", target);
    }
    Ok(())
}

async fn handle_info(
    package: PathBuf,
    options: AnalystOptions,
    fields: Vec<String>,
    json: bool,
) -> CliResult {
    let analyst = Analyst::with_options(package, options);
    let info = analyst.info().await?;

    let names: Vec<String> = if fields.is_empty() {
        info.field_names().into_iter().map(str::to_string).collect()
    } else {
        fields
    };

    if json {
        let values: serde_json::Map<String, serde_json::Value> = names
            .iter()
            .map(|name| {
                let value = info
                    .value(name)
                    .map(serde_json::Value::String)
                    .unwrap_or(serde_json::Value::Null);
                (name.clone(), value)
            })
            .collect();
        return print_json(&values);
    }

    let mut missing = Vec::new();
    for name in &names {
        match info.value(name) {
            Some(value) => println!("{}: {}", name, value),
            None => missing.push(name.as_str()),
        }
    }
    if !missing.is_empty() {
        return Err(format!("fields not present: {}", missing.join(", ")).into());
    }
    Ok(())
}

async fn handle_control(
    package: PathBuf,
    options: AnalystOptions,
    scratch: Option<PathBuf>,
    file: Option<String>,
    json: bool,
) -> CliResult {
    let analyst = Analyst::with_options(package, options);
    let control = match &scratch {
        Some(dir) => analyst.control(dir).await?,
        None => analyst.control_in_temp_dir().await?,
    };

    if let Some(name) = file {
        let text = control
            .file_text(&name)
            .ok_or_else(|| format!("no packaging file named {}", name))?;
        print!("{}", text);
        return Ok(());
    }

    if json {
        return print_json(&control);
    }
    for name in control.filenames() {
        if let Some(packaging_file) = control.get(name) {
            println!("{}  {}", packaging_file.permissions, name);
        }
    }
    Ok(())
}

async fn handle_extract(
    package: PathBuf,
    options: AnalystOptions,
    out: PathBuf,
    find: Option<String>,
    json: bool,
) -> CliResult {
    let analyst = Analyst::with_options(package, options);

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    spinner.set_message(format!("Extracting {}", analyst.package_file().display()));
    spinner.enable_steady_tick(Duration::from_millis(100));
    let result = analyst.extract(&out).await;
    spinner.finish_and_clear();
    let extraction = result?;

    if let Some(pathname) = find {
        let file = extraction
            .find_by_installed_pathname(&pathname)
            .ok_or_else(|| format!("{} was not extracted", pathname))?;
        println!("{}", file.display());
        return Ok(());
    }

    if json {
        return print_json(&extraction);
    }
    for file in extraction.files() {
        println!("{}", file.display());
    }
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
