use clap::{Parser, Subcommand};
use file_index::listing::{SortKey, ViewEvent, ViewState};
use file_index::{config, fetch, listing, logging, output, render, scan};
use log::{error, info};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "file-index")]
#[command(about = "JSON file manifest generator and static file list viewer")]
#[command(long_about = "\
JSON file manifest generator and static file list viewer

Indexes the regular files directly inside a directory into a JSON manifest
with sizes, modification times, types, and raw download URLs, then renders
that manifest as a searchable, sortable, paginated HTML file list.

  root/
  ├── config.toml        # Optional overrides (see 'file-index gen-config')
  ├── files.json         # Written by 'generate'
  ├── channels.m3u       # Indexed
  ├── guide.xml.gz       # Indexed
  └── archive/           # Directories are skipped

The download branch comes from config.toml, overridden by GITHUB_REF_NAME
when set. Log verbosity is read from FILE_INDEX_LOG (default: info).")]
#[command(version)]
struct Cli {
    /// Directory to index
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan the root directory and write the JSON manifest
    Generate,
    /// Render a manifest as static HTML pages
    Render(RenderArgs),
    /// Download the configured sources into the root directory
    Fetch {
        /// Remove existing .m3u and .xml.gz files first
        #[arg(long)]
        clean: bool,
    },
    /// Scan and print the result without writing anything
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

#[derive(clap::Args)]
struct RenderArgs {
    /// Manifest path or http(s) URL [default: <root>/<output_file>]
    #[arg(long)]
    manifest: Option<String>,

    /// Output directory for the HTML pages [default: <root>/site]
    #[arg(long)]
    output: Option<PathBuf>,

    /// Only list files whose name contains this text (case-insensitive)
    #[arg(long)]
    search: Option<String>,

    /// Sort order: name, nameDesc, date, dateDesc, size, sizeDesc, type, typeDesc
    #[arg(long)]
    sort: Option<SortKey>,

    /// Files per page
    #[arg(long)]
    page_size: Option<usize>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init()?;

    let result = run(cli);
    if let Err(err) = &result {
        error!("{err}");
    }
    result
}

/// Stock defaults, `<root>/config.toml`, then the branch override from CI.
fn load_site_config(root: &Path) -> Result<config::SiteConfig, config::ConfigError> {
    let mut site_config = config::load_config(root)?;
    site_config
        .hosting
        .apply_ref_override(std::env::var(config::BRANCH_ENV).ok());
    Ok(site_config)
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::Generate => {
            let site_config = load_site_config(&cli.root)?;
            let report = scan::generate(&cli.root, &site_config)?;
            let manifest_path = cli.root.join(&site_config.output_file);
            info!(
                "indexed {} files ({} excluded) into {}",
                report.records.len(),
                report.excluded.len(),
                manifest_path.display()
            );
            output::print_generate_output(&report, &manifest_path);
        }
        Command::Render(args) => {
            let site_config = load_site_config(&cli.root)?;
            let source = args.manifest.unwrap_or_else(|| {
                cli.root
                    .join(&site_config.output_file)
                    .to_string_lossy()
                    .into_owned()
            });
            let output_dir = args.output.unwrap_or_else(|| cli.root.join("site"));
            let timeout = Duration::from_secs(site_config.fetch.timeout_secs);

            let entries = match listing::load_manifest(&source, timeout) {
                Ok(entries) => entries,
                Err(err) => {
                    let page =
                        render::write_error_page(&output_dir, &err.to_string(), &site_config)?;
                    error!("could not load {source}; wrote {}", page.display());
                    return Err(err.into());
                }
            };
            info!("loaded {} records from {source}", entries.len());

            let mut state = ViewState::new(
                args.sort.unwrap_or(site_config.viewer.default_sort),
                args.page_size.unwrap_or(site_config.viewer.default_page_size),
            );
            if let Some(term) = args.search {
                state = listing::reduce(&state, &entries, ViewEvent::Search(term));
            }

            let report = render::write_pages(
                &output_dir,
                &entries,
                &state,
                &site_config,
                chrono::Utc::now(),
            )?;
            output::print_render_output(&report, &output_dir);
        }
        Command::Fetch { clean } => {
            let site_config = load_site_config(&cli.root)?;
            if clean {
                let removed = fetch::clean(&cli.root)?;
                info!("removed {} old playlist files", removed.len());
            }

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_fetch_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let summary = fetch::fetch_all(&cli.root, &site_config.fetch, Some(tx))?;
            printer
                .join()
                .map_err(|_| "fetch progress printer panicked")?;
            output::print_fetch_summary(&summary);

            if !summary.is_success() {
                return Err(format!("{} source(s) failed to download", summary.failed.len()).into());
            }
        }
        Command::Check => {
            println!("==> Checking {}", cli.root.display());
            let site_config = load_site_config(&cli.root)?;
            let report = scan::scan(&cli.root, &site_config)?;
            output::print_scan_output(&report);
            println!("==> Content is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}
