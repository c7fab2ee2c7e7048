//! pdfbinder - Convert folders of Office documents to PDF and bind them.

mod cli;

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::process;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, ProjectCommand};
use pdfbinder::config::{ProjectConfig, ProjectStore};
use pdfbinder::convert::{SofficeRenderer, convert_selected};
use pdfbinder::merge::{PdfAssembler, merge_sources};
use pdfbinder::model::{SourceFile, edit};
use pdfbinder::output::OutputFormatter;
use pdfbinder::scan::{ReconcileReport, expand_inputs, reconcile, scan};
use pdfbinder::PipelineError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(&cli);

    if let Err(err) = run(cli).await {
        eprintln!("Error: {err:#}");
        let code = err
            .downcast_ref::<PipelineError>()
            .map_or(1, PipelineError::exit_code);
        process::exit(code);
    }
}

/// Diagnostics go to stderr; `RUST_LOG` overrides the verbosity flags.
fn init_tracing(cli: &Cli) {
    let default = if cli.verbose {
        "pdfbinder=info"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Cancelled on Ctrl-C; long steps stop at the next file or page.
fn cancel_on_interrupt() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, stopping after the current step");
            child.cancel();
        }
    });
    token
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let formatter = OutputFormatter::new(cli.quiet, cli.verbose);

    let store_path = match cli.store {
        Some(path) => path,
        None => ProjectStore::default_path()?,
    };
    debug!(store = %store_path.display(), "using project store");

    match cli.command {
        Command::Project(command) => run_project(command, store_path, &formatter),
        Command::Scan(args) => {
            let mut store = ProjectStore::open(store_path)?;
            let mut project = store.find(&args.project)?.clone();

            let files = scan(&project.folder, &project.output_root(), project.recursive)?;
            formatter.info(&format!("Found {} documents in {}", files.len(), project.folder.display()));
            formatter.inventory(&files);

            save_inventory(&mut store, &mut project, &files)
        }
        Command::Update(args) => {
            let mut store = ProjectStore::open(store_path)?;
            let mut project = store.find(&args.project)?.clone();

            let report = load_inventory(&project)?;
            formatter.reconcile_report(&report);

            save_inventory(&mut store, &mut project, &report.files)
        }
        Command::List(args) => {
            let mut store = ProjectStore::open(store_path)?;
            let mut project = store.find(&args.project)?.clone();

            let report = load_inventory(&project)?;
            formatter.section(&project.name);
            formatter.inventory(&report.files);

            save_inventory(&mut store, &mut project, &report.files)
        }
        Command::Set(args) => {
            let mut store = ProjectStore::open(store_path)?;
            let mut project = store.find(&args.project)?.clone();
            let mut files = load_inventory(&project)?.files;

            if let Some(pages) = &args.pages {
                files = edit::set_page_range(&files, &args.file, pages)?;
            }
            if args.select || args.deselect {
                files = edit::set_selected(&files, &args.file, args.select)?;
            }
            if let Some(position) = args.position {
                files = edit::move_to(&files, &args.file, position as usize - 1)?;
            }
            formatter.inventory(&files);

            save_inventory(&mut store, &mut project, &files)
        }
        Command::Select(args) => {
            let mut store = ProjectStore::open(store_path)?;
            let mut project = store.find(&args.project)?.clone();

            let files = edit::select(&load_inventory(&project)?.files, args.which.into());
            let selected = files.iter().filter(|f| f.selected).count();
            formatter.info(&format!("{selected} of {} files selected", files.len()));

            save_inventory(&mut store, &mut project, &files)
        }
        Command::Convert(args) => {
            let mut store = ProjectStore::open(store_path)?;
            let mut project = store.find(&args.project)?.clone();
            let files = load_inventory(&project)?.files;

            let selected = files.iter().filter(|f| f.selected).count();
            if selected == 0 {
                formatter.info("Nothing selected");
                return save_inventory(&mut store, &mut project, &files);
            }
            formatter.info(&format!("Converting {selected} files..."));

            let renderer = SofficeRenderer::new(&args.soffice);
            let resolver = project.resolver();
            let cancel = cancel_on_interrupt();
            let report = tokio::task::spawn_blocking(move || {
                convert_selected(&files, &resolver, &renderer, &cancel)
            })
            .await
            .context("conversion task failed")?;

            formatter.conversion_report(&report);
            save_inventory(&mut store, &mut project, &report.files)?;

            if report.cancelled {
                return Err(PipelineError::Cancelled.into());
            }
            let failed = report.failures().count();
            if failed > 0 {
                return Err(PipelineError::other(format!("{failed} of {selected} files failed to convert")).into());
            }
            Ok(())
        }
        Command::Merge(args) => {
            let mut store = ProjectStore::open(store_path)?;
            let mut project = store.find(&args.project)?.clone();
            let files = load_inventory(&project)?.files;

            let sources = merge_sources(&files, &project.resolver())?;
            let output = project.merge_output_path(&chrono::Local::now());
            let page_numbers = args.page_numbers || project.page_numbers;
            formatter.info(&format!("Merging {} documents...", sources.len()));

            let assembler = PdfAssembler::with_cancellation(cancel_on_interrupt());
            let stats = tokio::task::spawn_blocking(move || assembler.merge(&sources, &output, page_numbers))
                .await
                .context("merge task failed")??;
            formatter.merge_summary(&stats);

            project.latest_merged_pdf = Some(stats.output);
            save_inventory(&mut store, &mut project, &files)
        }
        Command::Join(args) => {
            let inputs = expand_inputs(&args.inputs)?;
            formatter.info(&format!("Merging {} PDF files...", inputs.len()));

            let assembler = PdfAssembler::with_cancellation(cancel_on_interrupt());
            let output = args.output;
            let page_numbers = args.page_numbers;
            let stats = tokio::task::spawn_blocking(move || assembler.merge(&inputs, &output, page_numbers))
                .await
                .context("merge task failed")??;
            formatter.merge_summary(&stats);
            Ok(())
        }
    }
}

fn run_project(command: ProjectCommand, store_path: PathBuf, formatter: &OutputFormatter) -> anyhow::Result<()> {
    let mut store = ProjectStore::open(store_path)?;

    match command {
        ProjectCommand::Add(args) => {
            let project = args.to_project()?;
            formatter.success(&format!("Added project '{}'", project.name));
            formatter.project(&project);
            store.add(project)?;
            store.save()?;
        }
        ProjectCommand::List => {
            if store.projects().is_empty() {
                formatter.info("No projects yet. Add one with 'pdfbinder project add'.");
            }
            for project in store.projects() {
                formatter.project(project);
            }
        }
        ProjectCommand::Show(args) => {
            let project = store.find(&args.project)?;
            formatter.project(project);
            if !project.files.is_empty() {
                formatter.info(&format!("  {} documents recorded", project.files.len()));
            }
        }
        ProjectCommand::Remove(args) => {
            let project = store.remove(&args.project)?;
            store.save()?;
            formatter.success(&format!("Removed project '{}'", project.name));
        }
        ProjectCommand::Edit(args) => {
            let mut project = store.find(&args.project)?.clone();
            args.apply(&mut project)?;
            project.touch();
            store.update(project.clone())?;
            store.save()?;
            formatter.success(&format!("Updated project '{}'", project.name));
            formatter.project(&project);
        }
    }

    Ok(())
}

/// Current inventory of a project: a fresh scan reconciled with the
/// recorded one.
fn load_inventory(project: &ProjectConfig) -> pdfbinder::Result<ReconcileReport> {
    reconcile(&project.folder, &project.output_root(), &project.files, project.recursive)
}

fn save_inventory(store: &mut ProjectStore, project: &mut ProjectConfig, files: &[SourceFile]) -> anyhow::Result<()> {
    project.record_inventory(files);
    project.touch();
    store.update(project.clone())?;
    store.save()?;
    Ok(())
}
