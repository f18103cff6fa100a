use clap::{Parser, Subcommand};
use kb_site::config::{self, SiteConfig};
use kb_site::pipeline::{Pipeline, Step};
use kb_site::publish::SystemRunner;
use kb_site::{load, notify, output};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "kb-site")]
#[command(about = "Static FAQ site generator fed from a spreadsheet")]
#[command(long_about = "\
Static FAQ site generator fed from a spreadsheet

Each row of the spreadsheet is one question. Rows are grouped into sections
by their category column, in order of first appearance.

Spreadsheet columns:

  category     required   Section heading
  question     required   Entry heading
  answer       required   One paragraph per line
  summary      optional   Bold lead-in
  keywords     optional   Shown under the answer
  ai_summary   optional   Only in the JSON-LD structured data

Output (in the output directory):

  index.html   The page, with JSON-LD FAQPage structured data
  sitemap.xml  One entry for the canonical URL
  robots.txt   Allow-all, points at sitemap.xml

Run 'kb-site gen-config' to generate a documented kb-site.toml.")]
#[command(version)]
struct Cli {
    /// Config file [default: kb-site.toml, used only if present]
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Spreadsheet to read (overrides source.path)
    #[arg(long, global = true)]
    source: Option<PathBuf>,

    /// Output directory (overrides output.dir)
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render the site into the output directory
    Build,
    /// Build, then commit/push and notify crawlers as configured
    Deploy,
    /// Only notify crawlers about the published site
    Notify,
    /// Validate the spreadsheet without writing anything
    Check,
    /// Print a stock kb-site.toml with all options documented
    GenConfig,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let site_config = load_site_config(&cli)?;
    let source = site_config.source.path.clone();
    let runner = SystemRunner;
    let credential = notify::Notifier::new(&site_config.site, &site_config.notify)
        .credential_from_env();
    let pipeline = Pipeline::new(&site_config, &runner).with_credential(credential);

    match cli.command {
        Command::Build => {
            let steps: Vec<Step> = pipeline
                .enabled_steps()
                .into_iter()
                .filter(|s| s.is_file_step())
                .collect();
            pipeline.run(&steps)?;
            println!("==> Build complete: {}", site_config.output.dir.display());
        }
        Command::Deploy => {
            pipeline.run(&pipeline.enabled_steps())?;
            println!("==> Deploy complete: {}", site_config.site.url);
        }
        Command::Notify => {
            pipeline.notify();
        }
        Command::Check => {
            println!("==> Checking {}", source.display());
            let records = load::load(&source, site_config.source.sheet.as_deref())?;
            output::print_load_output(&records, site_config.site.grouping);
            println!("==> Content is valid ({} entries)", records.len());
        }
        Command::GenConfig => unreachable!("handled above"),
    }

    Ok(())
}

/// Load the config file and apply command-line overrides.
///
/// A file named with `--config` must exist; the implicit `kb-site.toml` may
/// be absent.
fn load_site_config(cli: &Cli) -> Result<SiteConfig, config::ConfigError> {
    let mut site_config = match &cli.config {
        Some(path) => config::load_config_file(path)?,
        None => config::load_config(Path::new(config::CONFIG_FILENAME))?,
    };
    if let Some(source) = &cli.source {
        site_config.source.path = source.clone();
    }
    if let Some(output) = &cli.output {
        site_config.output.dir = output.clone();
    }
    Ok(site_config)
}

fn init_tracing(verbose: u8) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match verbose {
        0 => "kb_site=warn",
        1 => "kb_site=info",
        _ => "kb_site=debug",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
